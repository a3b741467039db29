use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::models::Snapshot;

/// Per-resource detection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BaselineState {
    /// Registered but never successfully scanned.
    #[default]
    NoBaseline,
    /// Last accepted snapshot.
    Baselined(Snapshot),
}

impl BaselineState {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            BaselineState::NoBaseline => None,
            BaselineState::Baselined(snapshot) => Some(snapshot),
        }
    }
}

pub type BaselineEntry = Arc<Mutex<BaselineState>>;

/// Baselines keyed by resource id, one mutex per entry so updates to a single
/// resource are serialized without blocking other resources.
#[derive(Debug, Default)]
pub struct BaselineStore {
    entries: RwLock<HashMap<String, BaselineEntry>>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `NoBaseline` entry if none exists.
    pub async fn ensure(&self, resource_id: &str) {
        let mut entries = self.entries.write().await;
        entries
            .entry(resource_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(BaselineState::NoBaseline)));
    }

    pub async fn entry(&self, resource_id: &str) -> BaselineEntry {
        let existing = self.entries.read().await.get(resource_id).cloned();
        if let Some(entry) = existing {
            return entry;
        }

        let mut entries = self.entries.write().await;
        Arc::clone(
            entries
                .entry(resource_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(BaselineState::NoBaseline))),
        )
    }

    /// Current baseline snapshot, if the resource has one.
    pub async fn get(&self, resource_id: &str) -> Option<Snapshot> {
        let entry = {
            let entries = self.entries.read().await;
            Arc::clone(entries.get(resource_id)?)
        };
        let state = entry.lock().await;
        state.snapshot().cloned()
    }

    pub async fn contains(&self, resource_id: &str) -> bool {
        self.entries.read().await.contains_key(resource_id)
    }

    pub async fn remove(&self, resource_id: &str) -> bool {
        self.entries.write().await.remove(resource_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
