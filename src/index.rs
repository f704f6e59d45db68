//! Upstream index provider interface
//!
//! Building and filtering the filing index is an external concern; the
//! pipeline only needs an ordered collection of [`FilingReference`] records.
//! [`IndexProvider`] is the seam, and [`StaticIndex`] is the trivial
//! in-memory implementation for embedding and tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::FilingReference;

/// Source of the filing records to acquire
///
/// Records are consumed as-is; no validation beyond field presence.
#[async_trait]
pub trait IndexProvider: Send + Sync {
    /// Return the ordered collection of filing records to fetch
    async fn filings(&self) -> Result<Vec<FilingReference>>;
}

/// In-memory provider backed by a pre-built list
#[derive(Clone, Debug, Default)]
pub struct StaticIndex {
    filings: Vec<FilingReference>,
}

impl StaticIndex {
    /// Wrap an already-assembled filing list
    pub fn new(filings: Vec<FilingReference>) -> Self {
        Self { filings }
    }
}

#[async_trait]
impl IndexProvider for StaticIndex {
    async fn filings(&self) -> Result<Vec<FilingReference>> {
        Ok(self.filings.clone())
    }
}
