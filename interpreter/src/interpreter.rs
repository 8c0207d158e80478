use std::ops::Range;

use blockly::{Block, FailureSink};

use crate::config::CheckConfig;
use crate::error::Failure;
use crate::shape::ShapeRegistry;

/// The block currently being examined, for attributing failures.
#[derive(Debug, Clone)]
struct Frame {
    block_type: String,
    span: Range<usize>,
}

/// Walks a decoded document and collects every structural failure.
///
/// This is the failure channel handed to the accessor layer: each reported
/// reason is recorded once, attributed to the innermost block on the stack.
#[derive(Debug)]
pub struct Interpreter {
    pub(crate) source_id: usize,
    pub(crate) shapes: ShapeRegistry,
    pub(crate) error_limit: usize,
    pub(crate) deny_unknown_blocks: bool,
    pub(crate) reject_duplicate_names: bool,
    failures: Vec<Failure>,
    frames: Vec<Frame>,
    pub(crate) blocks_checked: usize,
    pub(crate) halted: bool,
}

impl Interpreter {
    pub fn new(source_id: usize, config: &CheckConfig) -> Self {
        Interpreter {
            source_id,
            shapes: ShapeRegistry::new(&config.blocks),
            error_limit: config.error_limit,
            deny_unknown_blocks: config.deny_unknown_blocks,
            reject_duplicate_names: config.reject_duplicate_names,
            failures: Vec::new(),
            frames: Vec::new(),
            blocks_checked: 0,
            halted: false,
        }
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn has_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    /// True once the configured error limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.error_limit > 0 && self.failures.len() >= self.error_limit
    }

    pub(crate) fn enter(&mut self, block: &Block) {
        self.frames.push(Frame {
            block_type: block.block_type.clone(),
            span: block.span.clone(),
        });
    }

    pub(crate) fn leave(&mut self) {
        self.frames.pop();
    }
}

impl FailureSink for Interpreter {
    fn fail(&mut self, reason: String) {
        let frame = self.frames.last();
        tracing::debug!(
            block_type = frame.map(|f| f.block_type.as_str()),
            %reason,
            "structural failure"
        );
        self.failures.push(Failure {
            reason,
            block_type: frame.map(|f| f.block_type.clone()),
            span: frame.map(|f| f.span.clone()),
            source_id: self.source_id,
        });
    }
}
