//! Knowledge base of real framework API surface.
//!
//! The [`Index`] is immutable once built. Sharing across workers goes through
//! [`KnowledgeBase`], which hands out `Arc` snapshots and replaces the whole
//! index on reload:
//!
//! ```text
//! ingestion ──▶ Vec<KnowledgeEntry> ──▶ Index::build ──▶ KnowledgeBase
//!                                                          │ snapshot()
//!                                         ┌────────────────┼────────────────┐
//!                                         ▼                ▼                ▼
//!                                      worker 1         worker 2   ...   worker N
//! ```
//!
//! A batch holds one snapshot for its whole duration, so a concurrent
//! `reload` never changes the index under an in-flight analysis.

mod entry;
mod fuzzy;
mod index;
mod loader;

pub use entry::{parent_path, root_segment, EntryType, KnowledgeEntry};
pub use fuzzy::{levenshtein, within_distance};
pub use index::{DuplicateEntryError, Index};
pub use loader::{load_entries, parse_entries};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Shared, atomically reloadable handle to the current index.
///
/// Reads never block; a reload swaps in a fully built index.
#[derive(Debug)]
pub struct KnowledgeBase {
    current: ArcSwap<Index>,
    generation: AtomicU64,
}

impl KnowledgeBase {
    pub fn new(index: Index) -> Self {
        let generation = AtomicU64::new(index.generation());
        Self {
            current: ArcSwap::from_pointee(index),
            generation,
        }
    }

    /// Build the initial index from ingested entries.
    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Result<Self, DuplicateEntryError> {
        Ok(Self::new(Index::build(entries)?))
    }

    /// The index every new analysis should use.
    pub fn snapshot(&self) -> Arc<Index> {
        self.current.load_full()
    }

    /// Replace the index with one built from `entries`.
    ///
    /// On error the current index stays in place. Returns the new generation
    /// number; with concurrent reloads the last store wins.
    pub fn reload(&self, entries: Vec<KnowledgeEntry>) -> Result<u64, DuplicateEntryError> {
        let index = Index::build(entries)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let entries = index.len();
        self.current.store(Arc::new(index.with_generation(generation)));
        tracing::info!(generation, entries, "knowledge base reloaded");
        Ok(generation)
    }
}
