//! # Quotebook Engine
//!
//! The core of Quotebook: a list of categorized quotes kept in key-value
//! storage, filtered by category, and reconciled against a remote batch with
//! a "server wins" rule.
//!
//! ## Design Principles
//!
//! - **No IO**: persistence goes through the [`KeyValueStorage`] trait, the
//!   network is the host's business
//! - **Deterministic**: reconciliation of the same inputs gives the same output
//! - **Idempotent sync**: merging an already merged batch changes nothing
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`QuoteRecord`] is a trimmed, non-empty `text` and `category`, with an
//! optional numeric `id` and `author`. Merges and imports never introduce a
//! second record with the same text.
//!
//! ### Store
//!
//! The [`Store`] loads from storage (falling back to three default quotes),
//! persists after every mutation, and keeps a [`CategoryIndex`] in step with
//! its records.
//!
//! ### Reconciliation
//!
//! [`reconcile`] puts every remote record first and keeps the local records
//! whose text the remote batch does not carry. A [`ConflictResolver`] can
//! additionally settle records that share an `id` but not a `text`:
//! - [`ServerWins`] - text rule only (default)
//! - [`FixedResolution`] - always keep one side
//! - [`ManualResolver`] - ask a callback, e.g. the user
//!
//! ## Quick Start
//!
//! ```rust
//! use quotebook_engine::{MemoryStorage, QuoteRecord, ServerWins, Store};
//!
//! // 1. Load a store (empty storage yields the default quotes)
//! let mut store = Store::load(MemoryStorage::new());
//! assert_eq!(store.len(), 3);
//!
//! // 2. Add a quote
//! store.add("Simplicity is prerequisite for reliability.", "Craft").unwrap();
//!
//! // 3. Merge a remote batch
//! let remote = vec![QuoteRecord::new("Fetched from the server.", "Server").unwrap()];
//! let result = store.apply_remote(&remote, ServerWins).unwrap();
//! assert!(result.changed);
//! assert_eq!(store.records()[0].category, "Server");
//! ```

pub mod category;
pub mod error;
pub mod presenter;
pub mod reconcile;
pub mod record;
pub mod storage;
pub mod store;
pub mod transfer;

// Re-export main types at crate root
pub use category::{CategoryFilter, CategoryIndex, ALL_CATEGORIES};
pub use error::Error;
pub use presenter::{pick_quote, pick_quote_with_rng, Presenter, View, EMPTY_MESSAGE};
pub use reconcile::{
    reconcile, Conflict, ConflictResolver, FixedResolution, ManualResolver, ReconcileResult,
    Reconciler, Resolution, ServerWins,
};
pub use record::{default_quotes, QuoteRecord};
pub use storage::{KeyValueStorage, MemoryStorage, LAST_CATEGORY_KEY, LAST_QUOTE_KEY, QUOTES_KEY};
pub use store::{LoadSource, Store};
pub use transfer::{ImportBatch, ImportSummary};

/// Type aliases for clarity
pub type Category = String;
pub type QuoteId = u64;
