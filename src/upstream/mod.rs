//! Upstream API clients: search, stats, LLM translation, and comments.
//!
//! Every client enforces an explicit timeout and maps failure to an
//! [`UpstreamError`] instead of panicking or hanging; the callers decide
//! how soft the failure is.

pub mod comments;
pub mod errors;
pub mod intent;
pub mod json;
pub mod pse;
pub mod youtube;

pub use errors::UpstreamError;

use reqwest::Response;

/// Turn a non-success response into `UpstreamError::Status`, capturing the
/// body for diagnostics (quota errors in particular identify themselves
/// there).
pub(crate) async fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}
