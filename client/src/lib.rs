//! # Quotebook Client
//!
//! Host runtime around [`quotebook_engine`]: a JSON file for persistent
//! storage, an HTTP remote for fetch and publish, and a sync service that
//! reconciles with the remote on demand and on a timer.
//!
//! ## Modules
//!
//! - [`book`] - store plus current view, one method per user action
//! - [`config`] - environment configuration
//! - [`remote`] - the [`RemoteSource`] seam and its HTTP implementation
//! - [`storage`] - file-backed [`KeyValueStorage`](quotebook_engine::KeyValueStorage)
//! - [`sync`] - single and periodic reconcile cycles, with notifications
//! - [`transfer`] - import from and export to JSON files

pub mod book;
pub mod config;
pub mod error;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod transfer;

pub use book::QuoteBook;
pub use config::{Config, ConfigError, ConflictPolicy, RemoteMapping};
pub use error::{AppError, Result};
pub use remote::{HttpRemote, RemoteSource};
pub use storage::FileStorage;
pub use sync::{SyncEvent, SyncOutcome, SyncService, SYNCED_MESSAGE};
