use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::event;

use crate::arena::ArenaSnapshot;

use super::TickObserver;

/// Identifies one observer within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// The observers attached to a run.
///
/// Notification visits every observer in the order they were attached.
/// An observer that returns an error or panics is detached and the rest are
/// still notified.
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<(SubscriptionId, Box<dyn TickObserver>)>,
    next_id: u64,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Box<dyn TickObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Detach one observer. Returns false if it was not attached.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Hand the snapshot to every observer. Returns how many were detached
    /// because they failed.
    pub fn notify(&mut self, snapshot: &ArenaSnapshot) -> usize {
        let before = self.observers.len();
        self.observers.retain_mut(|(id, observer)| {
            match catch_unwind(AssertUnwindSafe(|| observer.on_tick(snapshot))) {
                Ok(Ok(())) => true,
                Ok(Err(error)) => {
                    event!(
                        tracing::Level::WARN,
                        run_id = %snapshot.run_id,
                        subscription = ?id,
                        %error,
                        "Detaching failed observer"
                    );
                    false
                }
                Err(_) => {
                    event!(
                        tracing::Level::WARN,
                        run_id = %snapshot.run_id,
                        subscription = ?id,
                        "Detaching panicked observer"
                    );
                    false
                }
            }
        });
        before - self.observers.len()
    }
}
