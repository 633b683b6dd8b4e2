use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::event;
use uuid::Uuid;

use super::{ArenaHandle, ArenaRunBuilder, ArenaSnapshot, errors::ArenaError};

/// Keeps track of every live arena run by id.
///
/// Cloning the registry shares the same map. All access goes through a
/// single lock, so a concurrent `start` and `stop` of the same id are
/// applied one after the other.
#[derive(Default, Clone)]
pub struct ArenaRegistry {
    runs: Arc<Mutex<HashMap<Uuid, ArenaHandle>>>,
}

impl ArenaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<Uuid, ArenaHandle>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a run. A run already registered under the same id is replaced.
    pub fn register(&self, handle: ArenaHandle) {
        let id = handle.id();
        if let Some(previous) = self.runs().insert(id, handle) {
            // Best effort, the old one may have already finished.
            let _ = previous.stop();
        }
        event!(tracing::Level::DEBUG, run_id = %id, "Registered arena run");
    }

    pub fn get(&self, id: &Uuid) -> Option<ArenaHandle> {
        self.runs().get(id).cloned()
    }

    /// Stop a run and forget it. Returns false when the id is unknown.
    pub fn stop(&self, id: &Uuid) -> bool {
        match self.runs().remove(id) {
            Some(handle) => {
                let _ = handle.stop();
                event!(tracing::Level::DEBUG, run_id = %id, "Removed arena run");
                true
            }
            None => false,
        }
    }

    /// Like `stop`, but marks the run as disconnected.
    pub fn disconnect(&self, id: &Uuid) -> bool {
        match self.runs().remove(id) {
            Some(handle) => {
                let _ = handle.disconnect();
                true
            }
            None => false,
        }
    }

    /// Ids of all registered runs, sorted.
    pub fn list(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.runs().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.runs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs().is_empty()
    }

    /// Build a run, start its scheduler and register it.
    ///
    /// Nothing is registered if the configuration is invalid or there is no
    /// tokio runtime to schedule on.
    pub fn start(&self, builder: ArenaRunBuilder) -> Result<ArenaHandle, ArenaError> {
        let handle = ArenaHandle::new(builder.build()?);
        handle.start()?;
        self.register(handle.clone());
        Ok(handle)
    }

    pub fn get_state(&self, id: &Uuid) -> Result<ArenaSnapshot, ArenaError> {
        self.get(id)
            .map(|handle| handle.get_state())
            .ok_or(ArenaError::RunNotFound(*id))
    }
}
