use crate::arena::ArenaSnapshot;

use super::{ObserverError, TickObserver};

/// An observer that will always fail to handle a tick.
///
/// This observer is useful for testing that a broken listener doesn't take
/// the run or the other listeners down with it.
pub struct FailingObserver;

impl TickObserver for FailingObserver {
    fn on_tick(&mut self, _snapshot: &ArenaSnapshot) -> Result<(), ObserverError> {
        Err(ObserverError::UnableToRecordTick)
    }
}
