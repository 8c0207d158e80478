pub mod block;
pub mod document;
pub mod fail;
pub mod parser;

pub use block::Block;
pub use document::Document;
pub use fail::{FailureSink, StructuralError};
