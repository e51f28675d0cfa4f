//! Quote records, the only domain entity.

use crate::{error::Result, Category, Error, QuoteId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A quote and the category it is filed under.
///
/// `text` and `category` are always trimmed and non-empty when built through
/// [`QuoteRecord::new`] or [`QuoteRecord::from_candidate`]. The optional `id`
/// and `author` are omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// The quote itself
    pub text: String,
    /// Category used for filtering
    pub category: Category,
    /// Numeric id, assigned locally by sequence or carried from the remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuoteId>,
    /// Who said it, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl QuoteRecord {
    /// Create a validated record.
    ///
    /// Both fields are trimmed; either one being empty afterwards is an
    /// [`Error::InvalidInput`].
    pub fn new(text: impl AsRef<str>, category: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        let category = category.as_ref().trim();

        if text.is_empty() {
            return Err(Error::InvalidInput("quote text must not be empty".into()));
        }
        if category.is_empty() {
            return Err(Error::InvalidInput("category must not be empty".into()));
        }

        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
            id: None,
            author: None,
        })
    }

    /// Attach an id.
    pub fn with_id(mut self, id: QuoteId) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach an author. Blank authors are ignored.
    pub fn with_author(mut self, author: impl AsRef<str>) -> Self {
        let author = author.as_ref().trim();
        if !author.is_empty() {
            self.author = Some(author.to_string());
        }
        self
    }

    /// Validate an arbitrary decoded value as a record.
    ///
    /// The value must be an object with string `text` and `category` fields
    /// that are non-empty after trimming. A numeric `id` and a string `author`
    /// are kept when present; anything else about them is ignored.
    pub fn from_candidate(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = object.get("text")?.as_str()?;
        let category = object.get("category")?.as_str()?;

        let mut record = Self::new(text, category).ok()?;
        if let Some(id) = object.get("id").and_then(Value::as_u64) {
            record = record.with_id(id);
        }
        if let Some(author) = object.get("author").and_then(Value::as_str) {
            record = record.with_author(author);
        }
        Some(record)
    }

    /// Whether this record belongs to the given category.
    pub fn in_category(&self, category: &str) -> bool {
        self.category == category
    }
}

/// The records a store starts with when nothing usable is persisted.
pub fn default_quotes() -> Vec<QuoteRecord> {
    [
        (
            "The best way to get started is to quit talking and begin doing.",
            "Motivation",
        ),
        (
            "In the middle of every difficulty lies opportunity.",
            "Inspiration",
        ),
        (
            "Life is what happens when you’re busy making other plans.",
            "Life",
        ),
    ]
    .into_iter()
    .map(|(text, category)| QuoteRecord {
        text: text.to_string(),
        category: category.to_string(),
        id: None,
        author: None,
    })
    .collect()
}
