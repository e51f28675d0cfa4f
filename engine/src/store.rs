//! Store - the in-memory quote list and its persisted copy.
//!
//! The Store owns the records, the category index derived from them, and the
//! storage they persist to. Every successful mutation is written through to
//! storage immediately. A mutation whose write fails is rolled back, so the
//! in-memory list never runs ahead of what a later load would see.

use crate::{
    error::Result,
    reconcile::{ConflictResolver, ReconcileResult, Reconciler},
    storage::{KeyValueStorage, LAST_CATEGORY_KEY, QUOTES_KEY},
    transfer::{decode_records, export_json, ImportBatch, ImportSummary},
    CategoryFilter, CategoryIndex, QuoteId, QuoteRecord,
};
use serde_json::Value;

/// Where the records of a freshly loaded store came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from storage
    Persisted,
    /// Storage held no list, defaults were used. `persisted` tells whether
    /// writing them back succeeded.
    Defaults { persisted: bool },
}

/// The main store holding all quotes.
#[derive(Debug)]
pub struct Store<S> {
    /// Backing key-value storage
    storage: S,
    /// Records in insertion order
    records: Vec<QuoteRecord>,
    /// Categories derived from `records`, plus the selection
    index: CategoryIndex,
    /// How the records were obtained at load time
    source: LoadSource,
}

impl<S: KeyValueStorage> Store<S> {
    /// Load a store from `storage`.
    ///
    /// Never fails. A missing, unparsable, or non-list payload is replaced by
    /// [`default_quotes`](crate::default_quotes), which are written back
    /// straight away. A list keeps every element that is a valid record.
    /// Elements that are not are skipped.
    pub fn load(storage: S) -> Self {
        let persisted = storage
            .get(QUOTES_KEY)
            .and_then(|json| decode_records(&json).ok());

        let (records, source) = match persisted {
            Some(records) => (records, LoadSource::Persisted),
            None => (
                crate::default_quotes(),
                LoadSource::Defaults { persisted: false },
            ),
        };

        let selected = storage
            .get(LAST_CATEGORY_KEY)
            .map(|value| CategoryFilter::parse(&value))
            .unwrap_or_default();
        let index = CategoryIndex::new(&records, selected);

        let mut store = Self {
            storage,
            records,
            index,
            source,
        };

        if let LoadSource::Defaults { .. } = source {
            // A failed write here is retried by the next mutation
            let persisted = store.save().is_ok();
            store.source = LoadSource::Defaults { persisted };
        }

        store
    }

    /// How the records were obtained.
    pub fn load_source(&self) -> LoadSource {
        self.source
    }

    /// All records in order.
    pub fn records(&self) -> &[QuoteRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by its text.
    pub fn get(&self, text: &str) -> Option<&QuoteRecord> {
        self.records.iter().find(|r| r.text == text)
    }

    /// The category index.
    pub fn categories(&self) -> &CategoryIndex {
        &self.index
    }

    /// The active category filter.
    pub fn selected(&self) -> &CategoryFilter {
        self.index.selected()
    }

    /// Records passing the active filter.
    pub fn filtered(&self) -> impl Iterator<Item = &QuoteRecord> {
        let filter = self.index.selected();
        self.records.iter().filter(move |r| filter.matches(r))
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist the full list.
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.records)?;
        self.storage.set(QUOTES_KEY, json)
    }

    /// Add a quote from raw input.
    ///
    /// Both fields are trimmed and must be non-empty. The quote is always
    /// appended, even when its text is already present.
    pub fn add(&mut self, text: &str, category: &str) -> Result<&QuoteRecord> {
        let record = QuoteRecord::new(text, category)?;
        self.add_record(record)
    }

    /// Add a validated record, assigning the next sequential id if it has none.
    pub fn add_record(&mut self, mut record: QuoteRecord) -> Result<&QuoteRecord> {
        if record.id.is_none() {
            record.id = Some(self.next_id());
        }

        self.records.push(record);
        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }
        self.index.refresh(&self.records);

        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Import an arbitrary decoded value.
    ///
    /// Fails without touching the store unless `value` is an array. Invalid
    /// elements are dropped, and existing records win on a text collision.
    pub fn import_batch(&mut self, value: &Value) -> Result<ImportSummary> {
        let batch = ImportBatch::from_value(value)?;
        self.merge_import(batch)
    }

    /// Import JSON text, see [`import_batch`](Self::import_batch).
    pub fn import_json(&mut self, json: &str) -> Result<ImportSummary> {
        let batch = ImportBatch::from_json(json)?;
        self.merge_import(batch)
    }

    fn merge_import(&mut self, batch: ImportBatch) -> Result<ImportSummary> {
        let (additions, summary) = batch.merge_into(&self.records);
        if additions.is_empty() {
            return Ok(summary);
        }

        let before = self.records.len();
        self.records.extend(additions);
        if let Err(e) = self.save() {
            self.records.truncate(before);
            return Err(e);
        }
        self.index.refresh(&self.records);

        Ok(summary)
    }

    /// Export the full list as pretty JSON.
    pub fn export_json(&self) -> Result<String> {
        export_json(&self.records)
    }

    /// Reconcile a remote batch into the store.
    ///
    /// When the merge changes anything the merged list replaces the current
    /// one, is persisted, and the category index is refreshed. Otherwise the
    /// store is left exactly as it was.
    pub fn apply_remote<R: ConflictResolver>(
        &mut self,
        remote: &[QuoteRecord],
        resolver: R,
    ) -> Result<ReconcileResult> {
        let result = Reconciler::new(resolver).reconcile(&self.records, remote);
        if !result.changed {
            return Ok(result);
        }

        let previous = std::mem::replace(&mut self.records, result.merged.clone());
        if let Err(e) = self.save() {
            self.records = previous;
            return Err(e);
        }
        self.index.refresh(&self.records);

        Ok(result)
    }

    /// Select a category and persist the choice.
    ///
    /// Unknown categories select [`CategoryFilter::All`]. Returns the
    /// selection actually applied.
    pub fn select_category(&mut self, filter: impl Into<CategoryFilter>) -> Result<&CategoryFilter> {
        let selected = self.index.select(filter.into()).clone();
        self.storage
            .set(LAST_CATEGORY_KEY, selected.as_str().to_string())?;
        Ok(self.index.selected())
    }

    fn next_id(&self) -> QuoteId {
        self.records
            .iter()
            .filter_map(|r| r.id)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }
}
