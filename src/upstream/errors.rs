//! Error types for upstream API clients.

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },
    #[error("failed to parse upstream response")]
    ParseFailed {
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    RequestFailed(#[from] reqwest::Error),
}

impl UpstreamError {
    /// True when the error is a Data API quota rejection, which gets its
    /// own counter so operators can tell quota exhaustion from outages.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Status { body, .. } if body.contains("quotaExceeded"))
    }
}
