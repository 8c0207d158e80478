use crate::block::Block;

/// A named expression socket. Consumable only when it holds exactly one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub name: String,
    pub blocks: Vec<Block>,
}

/// A named literal attached directly to a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Text payload, captured verbatim (may be empty).
    pub value: String,
}

/// A named statement socket. Its one block is the head of a Next-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub name: String,
    pub blocks: Vec<Block>,
}

impl Value {
    pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Value {
            name: name.into(),
            blocks,
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Statement {
    pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Statement {
            name: name.into(),
            blocks,
        }
    }
}
