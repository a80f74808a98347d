//! Request id → spreadsheet index.
//!
//! Each extraction gets its own entry, so concurrent requests never hand out
//! each other's files. Capacity is bounded; the oldest entry goes first. The
//! file on disk is left alone when its entry is evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::sink::ArtifactHandle;

#[derive(Default)]
struct Index {
    handles: HashMap<Uuid, ArtifactHandle>,
    order: VecDeque<Uuid>,
}

#[derive(Clone)]
pub struct ArtifactStore {
    inner: Arc<RwLock<Index>>,
    capacity: usize,
}

impl ArtifactStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Index::default())),
            capacity: capacity.max(1),
        }
    }

    /// Register a handle, evicting the oldest entries past capacity.
    pub async fn insert(&self, handle: ArtifactHandle) {
        let mut w = self.inner.write().await;
        let id = handle.request_id;
        if w.handles.insert(id, handle).is_none() {
            w.order.push_back(id);
        }
        while w.order.len() > self.capacity {
            if let Some(old) = w.order.pop_front() {
                w.handles.remove(&old);
                debug!(request_id = %old, "Evicted artifact from download index");
            }
        }
    }

    pub async fn get(&self, request_id: &Uuid) -> Option<ArtifactHandle> {
        self.inner.read().await.handles.get(request_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.handles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new(1000)
    }
}
