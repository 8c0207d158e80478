use thiserror::Error;

/// Receives structural failures found while reading a block tree.
///
/// Accessors report through this and keep going with a safe default, so a
/// single walk can collect every problem in a program.
pub trait FailureSink {
    fn fail(&mut self, reason: String);
}

impl FailureSink for Vec<String> {
    fn fail(&mut self, reason: String) {
        self.push(reason);
    }
}

/// Structural errors in a decoded tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("no field named '{0}'")]
    MissingField(String),
    #[error("no block with value '{0}'")]
    MissingValue(String),
    #[error("no statement with name '{0}'")]
    MissingStatement(String),
    #[error("socket '{socket}' does not have exactly one block attached to it (found {found})")]
    SocketArity { socket: String, found: usize },
}
