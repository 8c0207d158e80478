use std::collections::HashMap;

use blockly::Block;
use blockly::block::mutation::Mutation;

use crate::config::ShapeConfig;

/// The fields and sockets a block type needs to be interpreted.
///
/// Fields and values are required. Statement sockets may be absent (an
/// empty body), but when present must hold exactly one head block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    pub fields: Vec<String>,
    pub values: Vec<String>,
    pub statements: Vec<String>,
}

impl Shape {
    fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    fn value(mut self, name: impl Into<String>) -> Self {
        self.values.push(name.into());
        self
    }

    fn statement(mut self, name: impl Into<String>) -> Self {
        self.statements.push(name.into());
        self
    }

    fn value_if(self, present: bool, name: &str) -> Self {
        if present { self.value(name) } else { self }
    }

    /// `PREFIX0`..`PREFIX{count-1}` value sockets.
    fn numbered_values(self, prefix: &str, count: u32) -> Self {
        (0..count).fold(self, |shape, n| shape.value(format!("{}{}", prefix, n)))
    }
}

impl From<&ShapeConfig> for Shape {
    fn from(config: &ShapeConfig) -> Self {
        Shape {
            fields: config.fields.clone(),
            values: config.values.clone(),
            statements: config.statements.clone(),
        }
    }
}

/// Looks up block shapes: configured ones first, then the built-in table.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    custom: HashMap<String, Shape>,
}

impl ShapeRegistry {
    pub fn new(configs: &[ShapeConfig]) -> Self {
        let custom = configs
            .iter()
            .map(|config| (config.block_type.clone(), Shape::from(config)))
            .collect();
        ShapeRegistry { custom }
    }

    pub fn resolve(&self, block: &Block) -> Option<Shape> {
        self.custom
            .get(&block.block_type)
            .cloned()
            .or_else(|| builtin_shape(&block.block_type, &bounded_mutation(block)))
    }
}

/// The block's mutation with its numbered-socket counts capped by the
/// value sockets the block actually has. Past the last socket present only
/// one missing name is expected, so a huge count cannot blow up the shape.
fn bounded_mutation(block: &Block) -> Mutation {
    let mut mutation = block.mutation_or_default();
    let present = u32::try_from(block.values.len()).unwrap_or(u32::MAX);
    // `elseif_count` clauses need `elseif_count + 1` IF sockets.
    mutation.elseif_count = mutation.elseif_count.min(present);
    mutation.items = mutation.items.min(present.saturating_add(1));
    mutation
}

/// Shapes of the core block types. Mutations decide how many of the
/// numbered or optional sockets a block carries.
pub fn builtin_shape(block_type: &str, mutation: &Mutation) -> Option<Shape> {
    let shape = Shape::default();
    let shape = match block_type {
        "controls_if" => {
            let shape = (0..=mutation.elseif_count).fold(shape, |shape, n| {
                shape.value(format!("IF{}", n)).statement(format!("DO{}", n))
            });
            if mutation.else_count > 0 {
                shape.statement("ELSE")
            } else {
                shape
            }
        }
        "controls_repeat" => shape.field("TIMES").statement("DO"),
        "controls_repeat_ext" => shape.value("TIMES").statement("DO"),
        "controls_whileUntil" => shape.field("MODE").value("BOOL").statement("DO"),
        "controls_for" => shape
            .field("VAR")
            .value("FROM")
            .value("TO")
            .value("BY")
            .statement("DO"),
        "controls_forEach" => shape.field("VAR").value("LIST").statement("DO"),
        "controls_flow_statements" => shape.field("FLOW"),

        "logic_compare" | "logic_operation" => shape.field("OP").value("A").value("B"),
        "logic_negate" => shape.value("BOOL"),
        "logic_boolean" => shape.field("BOOL"),
        "logic_null" => shape,
        "logic_ternary" => shape.value("IF").value("THEN").value("ELSE"),

        "math_number" => shape.field("NUM"),
        "math_arithmetic" => shape.field("OP").value("A").value("B"),
        "math_single" => shape.field("OP").value("NUM"),

        "text" => shape.field("TEXT"),
        "text_print" => shape.value("TEXT"),
        "text_length" => shape.value("VALUE"),
        "text_join" => shape.numbered_values("ADD", mutation.items),

        "variables_get" => shape.field("VAR"),
        "variables_set" => shape.field("VAR").value("VALUE"),

        "lists_create_with" => shape.numbered_values("ADD", mutation.items),
        "lists_length" => shape.value("VALUE"),
        "lists_getIndex" => shape
            .field("MODE")
            .field("WHERE")
            .value("VALUE")
            .value_if(mutation.at, "AT"),
        "lists_setIndex" => shape
            .field("MODE")
            .field("WHERE")
            .value("LIST")
            .value("TO")
            .value_if(mutation.at, "AT"),
        "lists_getSublist" => shape
            .field("WHERE1")
            .field("WHERE2")
            .value("LIST")
            .value_if(mutation.at1, "AT1")
            .value_if(mutation.at2, "AT2"),

        _ => return None,
    };
    Some(shape)
}
