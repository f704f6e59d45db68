//! Filing downloader facade and chunked pipeline
//!
//! [`FilingDownloader`] owns the configuration, the shared HTTP client, and
//! the event broadcast channel. The batch scheduler lives in
//! [`batch`](crate::batch); this module drives the full pipeline per chunk:
//! download → decompose → rewrite references → purge temp containers.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cache;
use crate::config::Config;
use crate::container;
use crate::error::{Error, Result};
use crate::index::IndexProvider;
use crate::rewrite;
use crate::types::{DocumentRecord, Event, FilingReference, FilingSet};

/// Buffered events per subscriber before lagging
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Main downloader instance (cloneable - all fields are cheaply shareable)
#[derive(Clone)]
pub struct FilingDownloader {
    /// Configuration (wrapped in Arc for sharing across worker tasks)
    pub(crate) config: Arc<Config>,
    /// Shared HTTP client with the configured timeout baked in
    pub(crate) client: reqwest::Client,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl FilingDownloader {
    /// Create a new downloader from a validated configuration
    ///
    /// Builds the shared HTTP client (per-request timeout from
    /// [`NetworkConfig`](crate::config::NetworkConfig)) and the event
    /// channel. Working directories are created lazily when a pipeline runs.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.network.timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: None,
            })?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            client,
            event_tx,
        })
    }

    /// Subscribe to progress events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. A subscriber that falls behind by more than the channel
    /// capacity observes a `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration (cheap Arc clone)
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// send() errs when nobody is listening, which is fine - events are
    /// best-effort progress reporting.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Run the full pipeline over a list of filings
    ///
    /// The list is pre-chunked by `chunk_size` to bound how many raw
    /// containers are held on disk at once. Per chunk: fetch the batch with
    /// retry passes, then — unless raw retention is on — decompose each
    /// container sequentially, rewrite media references across the chunk's
    /// documents, and purge the chunk's temp containers. Containers that fail
    /// to decompose are logged and skipped; the pipeline always makes forward
    /// progress on the rest.
    ///
    /// Returns every document written, the raw manifest when retention is
    /// requested, and the permanently failed identifiers with their reasons.
    pub async fn fetch_filings(&self, filings: Vec<FilingReference>) -> Result<FilingSet> {
        tokio::fs::create_dir_all(self.config.fetch_cache_dir()).await?;
        tokio::fs::create_dir_all(self.config.index_dir()).await?;

        let chunk_size = self.config.batch.chunk_size.max(1);
        let mut set = FilingSet::default();

        for chunk in filings.chunks(chunk_size) {
            let report = self.download_batch(chunk.to_vec()).await;
            set.failures.extend(report.failures);

            if self.config.processing.keep_raw {
                set.raw_containers.extend(report.containers);
                continue;
            }

            let mut chunk_docs: Vec<DocumentRecord> = Vec::new();
            for raw in &report.containers {
                match container::decompose(raw, &self.config).await {
                    Ok(docs) => {
                        self.emit_event(Event::ContainerDecomposed {
                            identifier: raw.filing.identifier.clone(),
                            documents: docs.len(),
                        });
                        chunk_docs.extend(docs);
                    }
                    Err(e) => {
                        warn!(
                            identifier = %raw.filing.identifier,
                            error = %e,
                            "failed to decompose container, skipping"
                        );
                    }
                }
            }

            rewrite::rewrite_references(&chunk_docs).await;
            cache::purge(report.containers).await;
            set.documents.extend(chunk_docs);
        }

        info!(
            documents = set.documents.len(),
            raw = set.raw_containers.len(),
            failures = set.failures.len(),
            "filing pipeline complete"
        );
        Ok(set)
    }

    /// Pull the filing list from an index provider and run the pipeline
    pub async fn fetch_from_index(&self, provider: &dyn IndexProvider) -> Result<FilingSet> {
        let filings = provider.filings().await?;
        self.fetch_filings(filings).await
    }
}
