use thiserror::Error;

/// Why a raw document could not be turned into a [`crate::Document`].
///
/// A document that parses but yields zero sections is not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// Not well-formed XML, or no locatable root content (`structuredBody`).
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl ParseFailure {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ParseFailure::MalformedInput(reason.into())
    }
}
