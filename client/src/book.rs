//! The quote book: a store plus what is currently displayed.
//!
//! Every user-facing action lives here so that the store change, category
//! refresh, and re-render happen together.

use quotebook_engine::{
    FixedResolution, ImportSummary, KeyValueStorage, LoadSource, MemoryStorage, Presenter,
    QuoteRecord, ReconcileResult, Resolution, ServerWins, Store, View,
};

use crate::config::ConflictPolicy;
use crate::error::Result;

/// Store and presenter for one session.
#[derive(Debug)]
pub struct QuoteBook<S> {
    store: Store<S>,
    presenter: Presenter<MemoryStorage>,
}

impl<S: KeyValueStorage> QuoteBook<S> {
    /// Load the store from `storage` and start a fresh session.
    pub fn open(storage: S) -> Self {
        let store = Store::load(storage);
        tracing::info!(
            records = store.len(),
            source = ?store.load_source(),
            selected = %store.selected(),
            "Loaded quotes"
        );
        if store.load_source() == (LoadSource::Defaults { persisted: false }) {
            tracing::warn!("Default quotes could not be written to storage, retrying on next change");
        }

        Self {
            store,
            presenter: Presenter::new(MemoryStorage::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    /// What is currently displayed.
    pub fn view(&self) -> &View {
        self.presenter.current()
    }

    /// Show the session's last quote, or a random one.
    pub fn restore_view(&mut self) -> Result<&View> {
        Ok(self.presenter.restore(&self.store)?)
    }

    /// Show a random quote under the current filter.
    pub fn show_random(&mut self) -> Result<&View> {
        Ok(self.presenter.show_random(&self.store)?)
    }

    /// Select a category and show a quote from it.
    pub fn select_category(&mut self, category: &str) -> Result<&View> {
        let selected = self.store.select_category(category)?;
        tracing::debug!(selected = %selected, "Category selected");
        Ok(self.presenter.show_random(&self.store)?)
    }

    /// Add a quote and show a random one.
    pub fn add_quote(&mut self, text: &str, category: &str) -> Result<QuoteRecord> {
        let record = self.store.add(text, category)?.clone();
        tracing::info!(id = ?record.id, category = %record.category, "Quote added");
        self.presenter.show_random(&self.store)?;
        Ok(record)
    }

    /// Import JSON text and show a random quote.
    pub fn import_json(&mut self, json: &str) -> Result<ImportSummary> {
        let summary = self.store.import_json(json)?;
        tracing::info!(
            added = summary.added,
            invalid = summary.invalid,
            duplicates = summary.duplicates,
            "Quotes imported"
        );
        self.presenter.show_random(&self.store)?;
        Ok(summary)
    }

    /// Export the store as pretty JSON.
    pub fn export_json(&self) -> Result<String> {
        Ok(self.store.export_json()?)
    }

    /// Merge a remote batch; re-render when anything changed.
    pub fn apply_remote(
        &mut self,
        remote: &[QuoteRecord],
        policy: ConflictPolicy,
    ) -> Result<ReconcileResult> {
        let result = match policy {
            ConflictPolicy::ServerWins => self.store.apply_remote(remote, ServerWins)?,
            ConflictPolicy::KeepLocal => self
                .store
                .apply_remote(remote, FixedResolution(Resolution::KeepLocal))?,
            ConflictPolicy::KeepServer => self
                .store
                .apply_remote(remote, FixedResolution(Resolution::KeepServer))?,
        };

        if result.changed {
            self.presenter.show_random(&self.store)?;
        }
        Ok(result)
    }
}
