use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

/// A structural failure reported while walking a block tree, attributed to
/// the block that was being examined when it was reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Failure {
    pub reason: String,
    /// Type of the block being examined, if any.
    pub block_type: Option<String>,
    pub span: Option<Range<usize>>,
    pub source_id: usize,
}

/// Errors loading a check configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
