//! Quote selection and rendering.

use crate::{
    error::Result,
    storage::{KeyValueStorage, LAST_QUOTE_KEY},
    CategoryFilter, QuoteRecord, Store,
};
use rand::Rng;
use std::fmt;

/// Shown when the active filter matches nothing.
pub const EMPTY_MESSAGE: &str = "No quotes available for this category.";

/// What the quote display currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    /// A single quote
    Quote(QuoteRecord),
    /// Nothing matched the filter
    #[default]
    Empty,
}

impl View {
    /// The displayed record, if any.
    pub fn quote(&self) -> Option<&QuoteRecord> {
        match self {
            View::Quote(record) => Some(record),
            View::Empty => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Quote(record) => write!(f, "\"{}\" — {}", record.text, record.category),
            View::Empty => f.write_str(EMPTY_MESSAGE),
        }
    }
}

/// Pick a quote uniformly at random among those passing `filter`.
pub fn pick_quote<'a>(records: &'a [QuoteRecord], filter: &CategoryFilter) -> Option<&'a QuoteRecord> {
    let mut rng = rand::thread_rng();
    pick_quote_with_rng(&mut rng, records, filter)
}

/// Pick a quote with a provided RNG.
///
/// Useful for reproducible testing.
pub fn pick_quote_with_rng<'a, R: Rng>(
    rng: &mut R,
    records: &'a [QuoteRecord],
    filter: &CategoryFilter,
) -> Option<&'a QuoteRecord> {
    let eligible: Vec<&QuoteRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    if eligible.is_empty() {
        return None;
    }
    Some(eligible[rng.gen_range(0..eligible.len())])
}

/// Drives the quote display and remembers the last shown quote for the
/// session.
#[derive(Debug)]
pub struct Presenter<S> {
    session: S,
    current: View,
}

impl<S: KeyValueStorage> Presenter<S> {
    /// Create a presenter over session-scoped storage.
    pub fn new(session: S) -> Self {
        Self {
            session,
            current: View::Empty,
        }
    }

    /// What is currently shown.
    pub fn current(&self) -> &View {
        &self.current
    }

    /// The last quote shown this session, if it is still readable.
    pub fn last_shown(&self) -> Option<QuoteRecord> {
        let json = self.session.get(LAST_QUOTE_KEY)?;
        serde_json::from_str(&json).ok()
    }

    /// Show a random quote under the store's active filter.
    pub fn show_random<T: KeyValueStorage>(&mut self, store: &Store<T>) -> Result<&View> {
        let mut rng = rand::thread_rng();
        self.show_random_with_rng(&mut rng, store)
    }

    /// Show a random quote with a provided RNG.
    pub fn show_random_with_rng<T: KeyValueStorage, R: Rng>(
        &mut self,
        rng: &mut R,
        store: &Store<T>,
    ) -> Result<&View> {
        match pick_quote_with_rng(rng, store.records(), store.selected()) {
            Some(record) => self.show(record.clone()),
            None => {
                self.current = View::Empty;
                Ok(&self.current)
            }
        }
    }

    /// Show a specific quote and remember it for the session.
    pub fn show(&mut self, record: QuoteRecord) -> Result<&View> {
        let json = serde_json::to_string(&record)?;
        self.session.set(LAST_QUOTE_KEY, json)?;
        self.current = View::Quote(record);
        Ok(&self.current)
    }

    /// Show the session's last quote, or a random one when there is none.
    pub fn restore<T: KeyValueStorage>(&mut self, store: &Store<T>) -> Result<&View> {
        match self.last_shown() {
            Some(record) => self.show(record),
            None => self.show_random(store),
        }
    }
}
