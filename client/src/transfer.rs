//! JSON file import and export.

use quotebook_engine::{ImportSummary, KeyValueStorage};
use std::path::Path;

use crate::book::QuoteBook;
use crate::error::Result;

/// Write every quote to `path` as a pretty JSON array.
pub async fn export_to_file<S: KeyValueStorage>(book: &QuoteBook<S>, path: &Path) -> Result<()> {
    let json = book.export_json()?;
    tokio::fs::write(path, json).await?;
    tracing::info!(path = %path.display(), records = book.store().len(), "Quotes exported");
    Ok(())
}

/// Merge the JSON array in `path` into the book.
///
/// A file that is not a JSON array is rejected without touching the store.
pub async fn import_from_file<S: KeyValueStorage>(
    book: &mut QuoteBook<S>,
    path: &Path,
) -> Result<ImportSummary> {
    let json = tokio::fs::read_to_string(path).await?;
    book.import_json(&json)
}
