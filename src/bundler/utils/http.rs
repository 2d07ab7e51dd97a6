//! HTTP utilities for downloading bundler tools.
//!
//! Used by:
//! - AppImage bundler (downloads appimagetool)
//! - Converter fetching (GitHub release lookups and archives)

use crate::bundler::error::{Error, Result};
use serde::de::DeserializeOwned;

/// GitHub rejects API calls without a user agent.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::GenericError(format!("Failed to build HTTP client: {}", e)))
}

/// Downloads a file from a URL.
///
/// Returns the file contents as a byte vector. Non-2xx responses are errors.
pub async fn download(url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading {}", url);

    let response = client()?
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::GenericError(format!("Download failed: {}", e)))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to read response: {}", e)))?;

    Ok(bytes.to_vec())
}

/// Fetches and deserializes a JSON document.
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T> {
    log::debug!("Fetching {}", url);

    let response = client()?
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::GenericError(format!("Request to {} failed: {}", url, e)))?;

    Ok(response.json::<T>().await?)
}
