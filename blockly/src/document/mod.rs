use std::fmt;

use quick_xml::escape::escape;

use crate::block::Block;
use crate::block::mutation::Mutation;

/// A decoded block program: the top-level blocks of one workspace.
#[derive(Debug, Clone)]
pub struct Document {
    /// Top-level blocks, each the head of a Next-chain.
    pub blocks: Vec<Block>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of blocks anywhere in the tree.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(count_chain).sum()
    }
}

fn count_chain(head: &Block) -> usize {
    head.chain()
        .map(|block| {
            let nested = block
                .values
                .iter()
                .map(|value| &value.blocks)
                .chain(block.statements.iter().map(|statement| &statement.blocks))
                .flatten()
                .map(count_chain)
                .sum::<usize>();
            1 + nested
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Canonical XML rendering
// ---------------------------------------------------------------------------

const INDENT: &str = "  ";

/// Indentation stops growing past this depth, so a long Next-chain
/// renders in space linear in its length.
const MAX_INDENT: usize = 32;

fn indent(depth: usize) -> String {
    INDENT.repeat(depth.min(MAX_INDENT))
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blocks.is_empty() {
            return writeln!(f, "<xml/>");
        }
        writeln!(f, "<xml>")?;
        for block in &self.blocks {
            write_block(f, block, 1)?;
        }
        writeln!(f, "</xml>")
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

/// Render a block and its Next-chain. Each successor opens inside the
/// `<next>` of the block above it; the closing tags are written once the
/// tail is done.
fn write_block(f: &mut fmt::Formatter<'_>, head: &Block, depth: usize) -> fmt::Result {
    let mut depth = depth;
    let mut open = Vec::new();
    for block in head.chain() {
        let pad = indent(depth);
        write!(f, "{}<block type=\"{}\"", pad, escape(&block.block_type))?;
        if !block.x.is_empty() {
            write!(f, " x=\"{}\"", escape(&block.x))?;
        }
        if !block.y.is_empty() {
            write!(f, " y=\"{}\"", escape(&block.y))?;
        }

        let has_children = block.mutation.is_some()
            || !block.fields.is_empty()
            || !block.values.is_empty()
            || !block.statements.is_empty()
            || block.next.is_some();
        if !has_children {
            writeln!(f, "/>")?;
            break;
        }
        writeln!(f, ">")?;

        let inner = indent(depth + 1);
        if let Some(mutation) = &block.mutation {
            writeln!(f, "{}<mutation{}/>", inner, MutationAttrs(mutation))?;
        }
        for field in &block.fields {
            if field.value.is_empty() {
                writeln!(f, "{}<field name=\"{}\"/>", inner, escape(&field.name))?;
            } else {
                writeln!(
                    f,
                    "{}<field name=\"{}\">{}</field>",
                    inner,
                    escape(&field.name),
                    escape(&field.value)
                )?;
            }
        }
        for value in &block.values {
            write_socket(f, "value", &value.name, &value.blocks, depth + 1)?;
        }
        for statement in &block.statements {
            write_socket(f, "statement", &statement.name, &statement.blocks, depth + 1)?;
        }
        if block.next.is_some() {
            writeln!(f, "{}<next>", inner)?;
            open.push(depth);
            depth += 2;
        } else {
            writeln!(f, "{}</block>", pad)?;
        }
    }
    for depth in open.into_iter().rev() {
        writeln!(f, "{}</next>", indent(depth + 1))?;
        writeln!(f, "{}</block>", indent(depth))?;
    }
    Ok(())
}

fn write_socket(
    f: &mut fmt::Formatter<'_>,
    tag: &str,
    name: &str,
    blocks: &[Block],
    depth: usize,
) -> fmt::Result {
    let pad = indent(depth);
    if blocks.is_empty() {
        return writeln!(f, "{}<{} name=\"{}\"/>", pad, tag, escape(name));
    }
    writeln!(f, "{}<{} name=\"{}\">", pad, tag, escape(name))?;
    for block in blocks {
        write_block(f, block, depth + 1)?;
    }
    writeln!(f, "{}</{}>", pad, tag)
}

/// Non-default mutation attributes, each with a leading space.
struct MutationAttrs<'a>(&'a Mutation);

impl fmt::Display for MutationAttrs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        for (name, set) in [("at", m.at), ("at1", m.at1), ("at2", m.at2)] {
            if set {
                write!(f, " {}=\"true\"", name)?;
            }
        }
        for (name, count) in [
            ("elseif", m.elseif_count),
            ("else", m.else_count),
            ("items", m.items),
        ] {
            if count != 0 {
                write!(f, " {}=\"{}\"", name, count)?;
            }
        }
        if !m.mode.is_empty() {
            write!(f, " mode=\"{}\"", escape(&m.mode))?;
        }
        if m.statement {
            write!(f, " statement=\"true\"")?;
        }
        Ok(())
    }
}
