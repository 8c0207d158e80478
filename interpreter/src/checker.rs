use std::collections::HashSet;

use blockly::{Block, Document, FailureSink};

use crate::config::CheckConfig;
use crate::error::Failure;
use crate::interpreter::Interpreter;
use crate::shape::Shape;

/// Outcome of checking one document.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub failures: Vec<Failure>,
    pub blocks_checked: usize,
    /// The error limit was hit and part of the tree was not examined.
    pub halted: bool,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walk every top-level stack of a document, reading each block the way an
/// evaluator would, and report what is structurally wrong.
pub fn check_document(document: &Document, config: &CheckConfig) -> CheckReport {
    let mut interpreter = Interpreter::new(document.source_id, config);
    for head in &document.blocks {
        if interpreter.halted {
            break;
        }
        interpreter.check_chain(head);
    }

    tracing::debug!(
        blocks_checked = interpreter.blocks_checked,
        failures = interpreter.failures().len(),
        halted = interpreter.halted,
        "structural check finished"
    );
    let blocks_checked = interpreter.blocks_checked;
    let halted = interpreter.halted;
    CheckReport {
        failures: interpreter.into_failures(),
        blocks_checked,
        halted,
    }
}

impl Interpreter {
    /// Check a stack of statements, head first.
    pub fn check_chain(&mut self, head: &Block) {
        for block in head.chain() {
            if !self.proceed() {
                return;
            }
            self.check_block(block);
        }
    }

    /// Check a block plugged into the value socket `socket` of its parent.
    fn check_expression(&mut self, block: &Block, socket: &str) {
        if !self.proceed() {
            return;
        }
        self.enter(block);
        if block.mutation.as_ref().is_some_and(|m| m.statement) {
            self.fail(format!(
                "block '{}' is marked as a statement but is attached to value socket '{}'",
                block.block_type, socket
            ));
        }
        self.leave();
        self.check_block(block);
    }

    fn check_block(&mut self, block: &Block) {
        self.blocks_checked += 1;
        self.enter(block);
        if self.reject_duplicate_names {
            self.check_duplicate_names(block);
        }
        match self.shapes.resolve(block) {
            Some(shape) => self.check_shape(block, &shape),
            None => self.check_unknown(block),
        }
        self.leave();
    }

    fn check_shape(&mut self, block: &Block, shape: &Shape) {
        for name in &shape.fields {
            if !self.proceed() {
                return;
            }
            block.single_field_with_name(self, name);
        }
        for name in &shape.values {
            if !self.proceed() {
                return;
            }
            if let Some(child) = block.single_block_value_with_name(self, name) {
                self.check_expression(child, name);
            }
        }
        for name in &shape.statements {
            if !self.proceed() {
                return;
            }
            // An empty body is serialized as no statement at all.
            if block.statement_with_name(name).is_none() {
                continue;
            }
            if let Some(head) = block.single_block_statement_with_name(self, name) {
                self.check_chain(head);
            }
        }
    }

    fn check_unknown(&mut self, block: &Block) {
        if self.deny_unknown_blocks {
            self.fail(format!("unknown block type '{}'", block.block_type));
        } else {
            tracing::debug!(
                block_type = %block.block_type,
                "no shape for block, walking all sockets"
            );
        }
        for value in &block.values {
            for child in &value.blocks {
                self.check_expression(child, &value.name);
            }
        }
        for statement in &block.statements {
            for head in &statement.blocks {
                self.check_chain(head);
            }
        }
    }

    fn check_duplicate_names(&mut self, block: &Block) {
        let fields: Vec<&str> = block.fields.iter().map(|f| f.name.as_str()).collect();
        let values: Vec<&str> = block.values.iter().map(|v| v.name.as_str()).collect();
        let statements: Vec<&str> = block.statements.iter().map(|s| s.name.as_str()).collect();
        let kinds = [("field", fields), ("value", values), ("statement", statements)];
        for (kind, names) in kinds {
            let mut seen = HashSet::new();
            for name in names {
                if !seen.insert(name) {
                    self.fail(format!(
                        "duplicate {} name '{}'; only the first is used",
                        kind, name
                    ));
                }
            }
        }
    }

    /// Whether the walk may continue; marks the walk halted at the limit.
    fn proceed(&mut self) -> bool {
        if !self.halted && self.limit_reached() {
            tracing::warn!(
                limit = self.error_limit,
                "error limit reached, skipping the rest of the program"
            );
            self.halted = true;
        }
        !self.halted
    }
}
