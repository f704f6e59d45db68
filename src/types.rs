//! Core types for edgar-dl

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::FetchError;

/// One row of the upstream filing index
///
/// Supplied by an [`IndexProvider`](crate::index::IndexProvider) and consumed
/// as-is; no validation beyond field presence. The `identifier` is the path
/// of the container relative to the archive root, e.g.
/// `edgar/data/1645148/0001213900-15-004775.txt`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingReference {
    /// Relative path of the container on the archive server
    pub identifier: String,
    /// Company name as listed in the index
    pub company_name: String,
    /// Date the filing was submitted
    pub date_filed: NaiveDate,
    /// Form type (e.g. "8-K", "10-K")
    pub form_type: String,
    /// Central Index Key of the filer
    pub cik: String,
}

/// One raw fetched container, persisted under a temp name
///
/// Created on fetch success and owned exclusively by the pipeline run that
/// fetched it. Consumed (decomposed, then deleted) unless raw retention is
/// requested, in which case it is handed back to the caller as a manifest row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawContainer {
    /// The filing this container was fetched for
    pub filing: FilingReference,
    /// Location of the raw body inside the fetch-cache directory
    pub temp_path: PathBuf,
    /// When the container was fetched
    pub accessed: DateTime<Utc>,
}

/// One decomposed document extracted from a container
///
/// Fields never change after creation; the file *content* behind `local_path`
/// may later be mutated in place by the reference rewriter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Identifier of the container this document came from
    pub identifier: String,
    /// Sequence token ("0" for the header, else the parsed `<SEQUENCE>` value)
    pub sequence: String,
    /// Declared document type ("SEC Header" for the header record)
    pub doc_type: String,
    /// Filename the document had on the archive server
    pub server_filename: String,
    /// Declared description, when the segment carried one
    pub description: Option<String>,
    /// Resolved, collision-free local path the document was written to
    pub local_path: PathBuf,
}

impl DocumentRecord {
    /// Whether this record is an embedded GRAPHIC attachment
    pub fn is_graphic(&self) -> bool {
        self.doc_type == "GRAPHIC"
    }

    /// Final path component of the local file, as used by the rewriter
    pub fn local_basename(&self) -> &str {
        self.local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }
}

/// Transient result of one fetch attempt, sent from a worker to the collector
#[derive(Debug)]
pub(crate) struct FetchOutcome {
    pub(crate) filing: FilingReference,
    pub(crate) result: std::result::Result<RawContainer, FetchError>,
}

/// A filing that could not be fetched after all retry passes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedFetch {
    /// The filing that failed
    pub filing: FilingReference,
    /// Reason of the last failed attempt
    pub error: FetchError,
}

/// Outcome of one `download_batch` call
///
/// `containers` and `failures` together cover the submitted identifier set
/// exactly, with no duplicates, once the scheduler terminates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Successfully fetched containers, in completion order
    pub containers: Vec<RawContainer>,
    /// Identifiers that still failed after the final pass
    pub failures: Vec<FailedFetch>,
    /// Number of fetch passes executed
    pub passes: u32,
}

/// Accumulated output of the full chunked pipeline
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilingSet {
    /// Every document written by decomposition, across all chunks
    pub documents: Vec<DocumentRecord>,
    /// Raw container manifest (populated only when raw retention is on)
    pub raw_containers: Vec<RawContainer>,
    /// Permanently failed identifiers with their last failure reason
    pub failures: Vec<FailedFetch>,
}

/// Progress events emitted on the broadcast channel
///
/// Rendering is the embedder's concern; when nobody subscribes the events are
/// dropped silently.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// One container was fetched and persisted
    FetchComplete {
        /// Identifier of the fetched container
        identifier: String,
    },
    /// One fetch attempt failed (it may be retried on a later pass)
    FetchFailed {
        /// Identifier of the failed fetch
        identifier: String,
        /// Failure reason
        error: String,
    },
    /// A fetch pass drained
    PassComplete {
        /// 1-based pass counter
        attempt: u32,
        /// Containers fetched so far in this batch
        fetched: usize,
        /// Identifiers still failing after this pass
        failed: usize,
    },
    /// The scheduler is about to sleep before the next pass
    Retrying {
        /// Passes executed so far
        attempt: u32,
        /// Identifiers queued for the next pass
        remaining: usize,
        /// Backoff sleep in seconds
        delay_secs: u64,
    },
    /// One container was decomposed into documents
    ContainerDecomposed {
        /// Identifier of the decomposed container
        identifier: String,
        /// Number of document records produced
        documents: usize,
    },
    /// A `download_batch` call terminated
    BatchComplete {
        /// Total containers fetched
        succeeded: usize,
        /// Total permanent failures
        failed: usize,
    },
}
