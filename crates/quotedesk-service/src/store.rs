//! # Quote Book
//!
//! Process-local quote storage with per-quote serialisation.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QuoteBook                                                              │
//! │  └── RwLock<HashMap<quote_id, Arc<Mutex<QuoteEntry>>>>                 │
//! │        │  read lock: clone the entry handle, release                   │
//! │        ▼                                                                │
//! │      Mutex<QuoteEntry>   one writer per quote, others wait             │
//! │        ├── quote         current state                                 │
//! │        ├── version       +1 on every committed change                  │
//! │        └── history       StatusChangeRecord, append-only               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The map lock is never held across an entry lock, so work on different
//! quotes proceeds in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use quotedesk_core::{Quote, StatusChangeRecord};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to one stored quote.
pub type EntryHandle = Arc<Mutex<QuoteEntry>>;

/// One stored quote with its version and audit trail.
#[derive(Debug)]
pub struct QuoteEntry {
    quote: Quote,
    version: u64,
    history: Vec<StatusChangeRecord>,
}

impl QuoteEntry {
    fn new(quote: Quote) -> Self {
        QuoteEntry {
            quote,
            version: 1,
            history: Vec::new(),
        }
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &[StatusChangeRecord] {
        &self.history
    }

    pub fn snapshot(&self) -> QuoteSnapshot {
        QuoteSnapshot {
            quote: self.quote.clone(),
            version: self.version,
        }
    }

    /// Replaces the quote after an edit.
    pub(crate) fn commit_edit(&mut self, quote: Quote) {
        self.quote = quote;
        self.version += 1;
    }

    /// Replaces the quote after a status change and appends its record.
    pub(crate) fn commit_transition(&mut self, quote: Quote, record: StatusChangeRecord) {
        self.quote = quote;
        self.history.push(record);
        self.version += 1;
    }
}

/// A quote as read by a caller, with the version to send back on change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub quote: Quote,
    pub version: u64,
}

/// In-memory quote store.
#[derive(Debug, Default)]
pub struct QuoteBook {
    entries: RwLock<HashMap<String, EntryHandle>>,
    sequence: AtomicU64,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next quote number sequence value, starting at 1.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn insert(&self, quote: Quote) -> EntryHandle {
        let id = quote.id.clone();
        let handle = Arc::new(Mutex::new(QuoteEntry::new(quote)));
        self.entries.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, quote_id: &str) -> Option<EntryHandle> {
        self.entries.read().await.get(quote_id).cloned()
    }

    /// Handles of every stored quote, in no particular order.
    pub async fn handles(&self) -> Vec<EntryHandle> {
        self.entries.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
