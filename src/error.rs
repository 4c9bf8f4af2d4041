use thiserror::Error;

/// The errors raised by the encoders and the bound search.
///
/// An unsatisfiable instance is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// An encoder produced a malformed formula (e.g. a free variable); this is a bug.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
    /// A solver was unavailable, crashed, or answered outside of its contract.
    #[error("solving failed: {0}")]
    SolvingFailed(String),
}

impl SynthesisError {
    /// Builds a [`SynthesisError::SolvingFailed`] error from an [`anyhow::Error`], keeping its chain of causes.
    pub fn solving_failed(e: anyhow::Error) -> Self {
        SynthesisError::SolvingFailed(format!("{:#}", e))
    }
}
