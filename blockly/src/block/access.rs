use crate::block::Block;
use crate::block::socket::{Field, Statement, Value};
use crate::fail::{FailureSink, StructuralError};

// Lookups are linear and first-match: with duplicate names, the earliest
// socket in serialized order wins.
impl Block {
    /// The field with the given name, if any. Never reports a failure.
    pub fn field_with_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The text of the field with the given name.
    /// Reports a failure and returns `""` if the field doesn't exist.
    pub fn single_field_with_name(&self, sink: &mut dyn FailureSink, name: &str) -> &str {
        match self.field_with_name(name) {
            Some(field) => &field.value,
            None => {
                report(sink, StructuralError::MissingField(name.to_string()));
                ""
            }
        }
    }

    /// The value socket with the given name, if any. Never reports a failure.
    pub fn value_with_name(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|value| value.name == name)
    }

    /// The one block attached to the named value socket.
    /// Reports a failure if the socket is missing or doesn't hold exactly one block.
    pub fn single_block_value_with_name(
        &self,
        sink: &mut dyn FailureSink,
        name: &str,
    ) -> Option<&Block> {
        let Some(value) = self.value_with_name(name) else {
            report(sink, StructuralError::MissingValue(name.to_string()));
            return None;
        };
        single_block(sink, name, &value.blocks)
    }

    /// The statement socket with the given name, if any. Never reports a failure.
    pub fn statement_with_name(&self, name: &str) -> Option<&Statement> {
        self.statements.iter().find(|statement| statement.name == name)
    }

    /// The head block of the named statement socket.
    /// Reports a failure if the socket is missing or doesn't hold exactly one block.
    pub fn single_block_statement_with_name(
        &self,
        sink: &mut dyn FailureSink,
        name: &str,
    ) -> Option<&Block> {
        let Some(statement) = self.statement_with_name(name) else {
            report(sink, StructuralError::MissingStatement(name.to_string()));
            return None;
        };
        single_block(sink, name, &statement.blocks)
    }
}

fn single_block<'a>(
    sink: &mut dyn FailureSink,
    socket: &str,
    blocks: &'a [Block],
) -> Option<&'a Block> {
    match blocks {
        [block] => Some(block),
        _ => {
            report(
                sink,
                StructuralError::SocketArity {
                    socket: socket.to_string(),
                    found: blocks.len(),
                },
            );
            None
        }
    }
}

fn report(sink: &mut dyn FailureSink, error: StructuralError) {
    tracing::trace!(%error, "structural lookup failed");
    sink.fail(error.to_string());
}
