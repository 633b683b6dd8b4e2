use crate::arena::ArenaSnapshot;

use super::{ObserverError, TickObserver};

/// An observer that hands every snapshot to a closure. This is the shape
/// most transports want: push the snapshot down a socket or channel and
/// report `Closed` once the other side is gone.
#[derive(Debug, Clone)]
pub struct FnObserver<F> {
    func: F,
}

impl<F: FnMut(&ArenaSnapshot) -> Result<(), ObserverError> + Send> FnObserver<F> {
    /// Create a new `FnObserver` with the provided function that will be
    /// called after each tick.
    pub fn new(f: F) -> Self {
        Self { func: f }
    }
}

impl<F: FnMut(&ArenaSnapshot) -> Result<(), ObserverError> + Send> TickObserver
    for FnObserver<F>
{
    fn on_tick(&mut self, snapshot: &ArenaSnapshot) -> Result<(), ObserverError> {
        (self.func)(snapshot)
    }
}
