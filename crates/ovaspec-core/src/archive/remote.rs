//! Fetching archives over HTTP(S).

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::error::{Error, Result};

/// Whether `locator` names a remote archive rather than a local path.
pub fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// Issue a GET for `url` and return the response once a success status has
/// been received. The body is left unread so callers can stream it.
pub fn get(url: &str, timeout: Duration) -> Result<Response> {
    tracing::info!(timeout = ?timeout, "fetching '{url}'");

    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::remote(url, e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::remote(url, e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::remote(
            url,
            format!("returned HTTP error {}", response.status()),
        ));
    }

    tracing::debug!(
        content_length = ?response.content_length(),
        "remote archive responded"
    );
    Ok(response)
}
