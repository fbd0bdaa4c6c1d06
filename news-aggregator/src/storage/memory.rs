use crate::traits::EntryStore;
use crate::types::{Entry, Result, UpsertSummary};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::info;

/// Process-local store with the same link-uniqueness and ordering rules as
/// the `posts` table. Rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryRows>,
}

#[derive(Default)]
struct MemoryRows {
    rows: Vec<Entry>,
    links: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored entry for `link`, if any.
    pub fn get(&self, link: &str) -> Option<Entry> {
        self.lock().rows.iter().find(|e| e.link == link).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRows> {
        // A poisoned guard still holds consistent rows: every mutation is a
        // single push paired with a set insert.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn upsert_all(&self, entries: &[Entry]) -> Result<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        {
            let mut guard = self.lock();
            for entry in entries {
                if guard.links.insert(entry.link.clone()) {
                    guard.rows.push(entry.clone());
                    summary.inserted += 1;
                } else {
                    summary.duplicates += 1;
                }
            }
        }

        info!(
            "Stored {} new entries out of {} total entries ({} duplicates)",
            summary.inserted,
            entries.len(),
            summary.duplicates
        );
        Ok(summary)
    }

    async fn query_recent(&self, n: usize) -> Result<Vec<Entry>> {
        let guard = self.lock();
        let mut indexed: Vec<(usize, &Entry)> = guard.rows.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| ib.cmp(ia))
        });

        Ok(indexed.into_iter().take(n).map(|(_, e)| e.clone()).collect())
    }
}
