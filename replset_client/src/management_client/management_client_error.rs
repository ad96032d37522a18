use crate::{error_chain_fmt, SchemaError};

/// Why a submission to the management endpoint did not produce an
/// acknowledgment. None of these are retried automatically; cluster
/// initiation is not idempotent and a blind retry could corrupt the
/// topology state.
#[derive(thiserror::Error)]
pub enum SubmissionError {
    #[error("No management endpoint URL was supplied and a client can't exist without one")]
    MissingUrlError,
    #[error("management endpoint is unreachable: {reason}")]
    Unreachable { reason: String },
    #[error("submission timed out before the endpoint acknowledged")]
    Timeout,
    #[error("management endpoint rejected the topology (status {status}): {reason}")]
    Rejected { status: u16, reason: String },
    #[error("descriptor failed validation before submission")]
    InvalidDescriptor(#[from] SchemaError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}
impl std::fmt::Debug for SubmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
