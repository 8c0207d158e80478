mod access;
pub mod mutation;
pub mod socket;

use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

use crate::block::mutation::Mutation;
use crate::block::socket::{Field, Statement, Value};

/// One node of a decoded block program.
/// Blocks are immutable once decoded; consumers only read them.
///
/// A Next-chain can be arbitrarily long, so `Clone`, `PartialEq`, `Debug`
/// and `Drop` walk it with a loop instead of recursing through `next`.
pub struct Block {
    /// Type tag selecting the block's semantics (e.g. `controls_if`).
    pub block_type: String,
    /// Horizontal workspace position, verbatim. Empty when absent.
    pub x: String,
    /// Vertical workspace position, verbatim. Empty when absent.
    pub y: String,
    /// Expression sockets, in serialized order.
    pub values: Vec<Value>,
    /// Literal fields, in serialized order.
    pub fields: Vec<Field>,
    /// Statement sockets, in serialized order.
    pub statements: Vec<Statement>,
    /// The block stacked directly below this one.
    pub next: Option<Box<Block>>,
    pub mutation: Option<Mutation>,
    /// Byte span of the `<block>` element in source, for error reporting.
    pub span: Range<usize>,
}

impl Block {
    /// A bare block of the given type with no children.
    pub fn new(block_type: impl Into<String>) -> Self {
        Block {
            block_type: block_type.into(),
            x: String::new(),
            y: String::new(),
            values: Vec::new(),
            fields: Vec::new(),
            statements: Vec::new(),
            next: None,
            mutation: None,
            span: 0..0,
        }
    }

    /// Copy of this block alone, without its successors.
    fn clone_link(&self) -> Block {
        Block {
            block_type: self.block_type.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
            values: self.values.clone(),
            fields: self.fields.clone(),
            statements: self.statements.clone(),
            next: None,
            mutation: self.mutation.clone(),
            span: self.span.clone(),
        }
    }

    /// The block's mutation, or the all-absent default when it has none.
    pub fn mutation_or_default(&self) -> Mutation {
        self.mutation.clone().unwrap_or_default()
    }

    /// Iterate this block followed by every block in its Next-chain.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            current: Some(self),
        }
    }
}

/// Iterator over a Next-chain, head first.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    current: Option<&'a Block>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<&'a Block> {
        let block = self.current?;
        self.current = block.next.as_deref();
        Some(block)
    }
}

impl FusedIterator for Chain<'_> {}

impl Clone for Block {
    fn clone(&self) -> Self {
        let mut rest: Vec<Block> = self.chain().skip(1).map(Block::clone_link).collect();
        let mut next = None;
        while let Some(mut block) = rest.pop() {
            block.next = next;
            next = Some(Box::new(block));
        }
        let mut head = self.clone_link();
        head.next = next;
        head
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.chain().map(Link).eq(other.chain().map(Link))
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.next.is_none() {
            fmt::Debug::fmt(&Link(self), f)
        } else {
            f.debug_list().entries(self.chain().map(Link)).finish()
        }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut block) = next {
            next = block.next.take();
        }
    }
}

/// One block of a chain, compared and printed without its successors.
struct Link<'a>(&'a Block);

impl PartialEq for Link<'_> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.0, other.0);
        a.block_type == b.block_type
            && a.x == b.x
            && a.y == b.y
            && a.values == b.values
            && a.fields == b.fields
            && a.statements == b.statements
            && a.mutation == b.mutation
            && a.span == b.span
    }
}

impl fmt::Debug for Link<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let block = self.0;
        f.debug_struct("Block")
            .field("block_type", &block.block_type)
            .field("x", &block.x)
            .field("y", &block.y)
            .field("values", &block.values)
            .field("fields", &block.fields)
            .field("statements", &block.statements)
            .field("mutation", &block.mutation)
            .field("span", &block.span)
            .finish()
    }
}
