use thiserror::Error;

/// A KQL compilation failure, from either the lexer or the parser.
///
/// Rendering includes a two-line context: the full query on one line and a
/// caret aligned under the offending byte on the next.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}\n    {kql}\n    {}^", ".".repeat(*.offset))]
pub struct CompileError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Byte offset of the offending position in the query string.
    pub offset: usize,
    /// The original query string.
    pub kql: String,
}

impl CompileError {
    pub(crate) fn new(kql: &str, offset: usize, message: impl Into<String>) -> Self {
        CompileError {
            message: message.into(),
            offset,
            kql: kql.to_string(),
        }
    }
}
