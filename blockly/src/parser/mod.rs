mod attributes;
pub mod error;
mod mutation;
mod structural;

pub use error::ParseError;
pub use structural::MAX_NESTING;

use crate::Document;

/// Decoder entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Decode the source XML into a complete Document.
    pub fn parse(&self) -> Result<Document, Vec<ParseError>> {
        let blocks = structural::parse_blocks(&self.source, self.file_id)?;
        tracing::debug!(
            file_id = self.file_id,
            top_level = blocks.len(),
            "decoded block document"
        );
        Ok(Document {
            blocks,
            source_id: self.file_id,
        })
    }
}
