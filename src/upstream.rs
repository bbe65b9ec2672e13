//! Shared plumbing for the HTTP scoring services (chat, embedding,
//! cross-encoder).

use reqwest::StatusCode;

use crate::constants::UPSTREAM_TIMEOUT;

/// Statuses worth retrying: throttling and server-side failures.
pub(crate) fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Transport errors worth retrying.
pub(crate) fn retryable_transport(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Client with the standard upstream timeout applied.
pub(crate) fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()
}
