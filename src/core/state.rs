use tokio::sync::RwLock;

use super::baseline::{BaselineState, BaselineStore};
use crate::models::TrackedResource;
use crate::utils::error::{AppError, Result};

/// Tracked resources plus their baselines.
///
/// Owned by the poll scheduler and handed to the decision engine by reference.
/// Removing a resource and deleting its baseline happen under the same write
/// lock, and [`WatchState::apply`] checks membership under the read lock, so a
/// poll still in flight for a removed resource can never touch its baseline.
#[derive(Debug, Default)]
pub struct WatchState {
    resources: RwLock<Vec<TrackedResource>>,
    baselines: BaselineStore,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource. Returns `false` if it was already tracked.
    pub async fn add(&self, url: &str) -> Result<bool> {
        let resource = TrackedResource::new(url)?;

        let mut resources = self.resources.write().await;
        if resources.iter().any(|r| r.id == resource.id) {
            return Ok(false);
        }

        self.baselines.ensure(&resource.id).await;
        tracing::info!(resource = %resource.id, "Tracking resource");
        resources.push(resource);
        Ok(true)
    }

    /// Stops tracking a resource and drops its baseline in one step.
    pub async fn remove(&self, resource_id: &str) -> Option<TrackedResource> {
        let mut resources = self.resources.write().await;
        let idx = resources.iter().position(|r| r.id == resource_id)?;
        let removed = resources.remove(idx);
        self.baselines.remove(&removed.id).await;
        tracing::info!(resource = %removed.id, "Stopped tracking resource");
        Some(removed)
    }

    /// Removes by 1-based position in [`WatchState::current_resources`].
    pub async fn remove_at(&self, position: usize) -> Result<TrackedResource> {
        let mut resources = self.resources.write().await;
        if position == 0 || position > resources.len() {
            return Err(AppError::NotFound {
                resource: format!("index {}", position),
            });
        }
        let removed = resources.remove(position - 1);
        self.baselines.remove(&removed.id).await;
        tracing::info!(resource = %removed.id, "Stopped tracking resource");
        Ok(removed)
    }

    pub async fn current_resources(&self) -> Vec<TrackedResource> {
        self.resources.read().await.clone()
    }

    pub async fn is_tracked(&self, resource_id: &str) -> bool {
        self.resources.read().await.iter().any(|r| r.id == resource_id)
    }

    pub async fn len(&self) -> usize {
        self.resources.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.resources.read().await.is_empty()
    }

    /// Numbered list of tracked URLs, one per line.
    pub async fn listing(&self) -> String {
        let resources = self.resources.read().await;
        if resources.is_empty() {
            return "No resources tracked".to_string();
        }
        resources
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}", i + 1, r.id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn baselines(&self) -> &BaselineStore {
        &self.baselines
    }

    /// Runs `f` with exclusive access to the resource's baseline, but only if
    /// the resource is still registered. Returns `None` when it is not.
    pub async fn apply<F, R>(&self, resource_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&TrackedResource, &mut BaselineState) -> R,
    {
        let resources = self.resources.read().await;
        let resource = resources.iter().find(|r| r.id == resource_id)?;

        let entry = self.baselines.entry(resource_id).await;
        let mut state = entry.lock().await;
        Some(f(resource, &mut state))
    }
}
