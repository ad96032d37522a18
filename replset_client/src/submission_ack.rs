use serde::Deserialize;

/// Acknowledgment record returned by the management endpoint after it
/// accepts a topology submission.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SubmissionAck {
    pub identifier: String,
    pub version: u64,
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}
