//! # edgar-dl
//!
//! Concurrent downloader and document splitter for SEC EDGAR filing archives.
//!
//! The archive serves each filing as one composite text container: an
//! `<SEC-HEADER>` block followed by `<DOCUMENT>` segments that bundle the
//! actual forms, exhibits, and uuencoded GRAPHIC attachments. This crate
//! fetches such containers in concurrent batches with bounded retry,
//! decomposes them into individual local files under collision-safe names,
//! and rewrites media references in the extracted documents to point at the
//! extracted attachments.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Partial failure is normal** - a batch always returns its successes
//!   plus an explicit failure list; disposition is the caller's decision
//! - **Event-driven** - consumers subscribe to progress events, no polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use edgar_dl::{Config, FilingDownloader, FilingReference};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = FilingDownloader::new(Config::default())?;
//!
//!     // Subscribe to progress events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let filings: Vec<FilingReference> = /* from an index provider */
//!     # Vec::new();
//!     let set = downloader.fetch_filings(filings).await?;
//!     println!(
//!         "{} documents extracted, {} filings failed",
//!         set.documents.len(),
//!         set.failures.len()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Acquisition scheduler (batched fetch with retry passes)
pub mod batch;
/// Temp-container cache lifecycle
pub mod cache;
/// Configuration types
pub mod config;
/// Container decomposition into header and document segments
pub mod container;
/// Downloader facade and chunked pipeline
pub mod downloader;
/// Error types
pub mod error;
/// Single-filing fetch worker
pub mod fetch;
/// Filename template resolution and uniquification
pub mod filename;
/// Upstream index provider interface
pub mod index;
/// Media reference rewriting
pub mod rewrite;
/// Core types and events
pub mod types;
/// Legacy uuencode payload decoder
pub mod uuencode;

// Re-export commonly used types
pub use config::{BatchConfig, Config, NetworkConfig, ProcessingConfig, StorageConfig};
pub use downloader::FilingDownloader;
pub use error::{Error, FetchError, ParseError, Result};
pub use index::{IndexProvider, StaticIndex};
pub use types::{
    BatchReport, DocumentRecord, Event, FailedFetch, FilingReference, FilingSet, RawContainer,
};
