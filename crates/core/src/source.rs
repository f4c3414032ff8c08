// crates/core/src/source.rs
//! Capability trait for the remote spreadsheet collaborator.

use crate::error::SourceError;
use async_trait::async_trait;

/// Read access to the remote multi-tab spreadsheet.
///
/// Any concrete transport satisfying this interface is substitutable; the
/// production implementation (Sheets HTTP client) lives outside this
/// workspace, tests use in-memory fakes.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// All tab names in the remote document, in sheet order.
    async fn list_tab_names(&self) -> Result<Vec<String>, SourceError>;

    /// Ordered rows of one tab, each up to 8 text columns. Short rows are
    /// permitted; the parser pads them.
    async fn fetch_rows(&self, tab: &str) -> Result<Vec<Vec<String>>, SourceError>;
}
