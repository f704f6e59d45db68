//! Temp-container cache lifecycle
//!
//! Raw containers are only needed until decomposition has materialized their
//! documents; afterwards the temp files are deleted. Deletion problems are
//! never fatal — each failed removal gets one delayed retry, then a warning.

use std::time::Duration;
use tracing::{debug, warn};

use crate::types::RawContainer;

/// Delay before the single deletion retry
const PURGE_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Delete the raw temp file behind each container
///
/// Consumes the containers: each temp file is removed at most once, after
/// the caller has finished decomposing. A failed deletion is retried once
/// after a short delay; a second failure is reported as a warning.
pub async fn purge(containers: Vec<RawContainer>) {
    for container in containers {
        if let Err(first) = tokio::fs::remove_file(&container.temp_path).await {
            tokio::time::sleep(PURGE_RETRY_DELAY).await;
            match tokio::fs::remove_file(&container.temp_path).await {
                Ok(()) => {
                    debug!(
                        identifier = %container.filing.identifier,
                        path = ?container.temp_path,
                        "temp container deleted on retry"
                    );
                }
                Err(second) => {
                    warn!(
                        identifier = %container.filing.identifier,
                        path = ?container.temp_path,
                        first_error = %first,
                        error = %second,
                        "failed to delete temp container"
                    );
                }
            }
        }
    }
}
