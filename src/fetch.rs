//! Fetch worker: one timed GET plus persistence of the raw body
//!
//! Workers run in parallel tasks, so every failure mode is converted into a
//! [`FetchError`] value — nothing may escape as a panic across the worker
//! boundary. Retry policy lives entirely in the scheduler.

use chrono::Utc;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use crate::error::FetchError;
use crate::types::{FilingReference, RawContainer};

/// Fetch one container and persist its body under a fresh temp name
///
/// The absolute URL is the concatenation of `base_url` and the filing's
/// identifier. A non-2xx status, a timeout, and an I/O failure all classify
/// as [`FetchError`] variants. On success the body is written verbatim
/// (bytes, no transcoding) to `<cache_dir>/<uuid>.txt` and the access
/// timestamp is recorded.
pub async fn fetch_one(
    client: &reqwest::Client,
    filing: &FilingReference,
    base_url: &str,
    cache_dir: &Path,
) -> Result<RawContainer, FetchError> {
    let full_url = format!("{}{}", base_url, filing.identifier);
    let url = url::Url::parse(&full_url).map_err(|e| FetchError::InvalidUrl {
        message: format!("{full_url}: {e}"),
    })?;

    debug!(identifier = %filing.identifier, %url, "fetching container");
    let response = client.get(url).send().await.map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(classify)?;
    let accessed = Utc::now();

    // Concurrent workers share the cache directory; "already exists" is success
    tokio::fs::create_dir_all(cache_dir)
        .await
        .map_err(|e| FetchError::Io {
            message: e.to_string(),
        })?;

    let temp_path = cache_dir.join(format!("{}.txt", Uuid::new_v4()));
    tokio::fs::write(&temp_path, &body)
        .await
        .map_err(|e| FetchError::Io {
            message: e.to_string(),
        })?;

    debug!(identifier = %filing.identifier, ?temp_path, bytes = body.len(), "container persisted");
    Ok(RawContainer {
        filing: filing.clone(),
        temp_path,
        accessed,
    })
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            message: e.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            message: e.to_string(),
        }
    } else {
        FetchError::Body {
            message: e.to_string(),
        }
    }
}
