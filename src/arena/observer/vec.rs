use std::sync::{Arc, Mutex, PoisonError};

use crate::arena::ArenaSnapshot;

use super::{ObserverError, TickObserver};

/// VecObserver is an observer that will append each snapshot to a shared
/// vector.
pub struct VecObserver {
    records: Arc<Mutex<Vec<ArenaSnapshot>>>,
}

impl VecObserver {
    /// Create a new storage for the observer that can be introspected
    /// later.
    pub fn new_storage() -> Arc<Mutex<Vec<ArenaSnapshot>>> {
        Arc::new(Mutex::new(vec![]))
    }

    /// Create a new VecObserver with the provided storage.
    pub fn new(records: Arc<Mutex<Vec<ArenaSnapshot>>>) -> Self {
        Self { records }
    }
}

impl TickObserver for VecObserver {
    fn on_tick(&mut self, snapshot: &ArenaSnapshot) -> Result<(), ObserverError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
        Ok(())
    }
}
