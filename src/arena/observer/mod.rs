//! Observers are how the arena pushes snapshots out after every tick. The
//! transport layer (sockets, polling, ...) attaches one per listener.
mod failing;
mod fn_observer;
mod set;
mod vec;

use thiserror::Error;

use super::ArenaSnapshot;

/// ObserverError is the error type for observer implementations.
#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("Unable to record tick")]
    UnableToRecordTick,
    #[error("The listener went away")]
    Closed,
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}

/// A listener attached to one arena run.
pub trait TickObserver: Send {
    /// This method is called by the run after every tick.
    ///
    /// # Arguments
    /// - `snapshot` - The state of the run after the tick.
    ///
    /// # Returns
    /// - `Ok(())` if the snapshot was handled
    /// - `Err(ObserverError)` if it could not be.
    ///
    /// Returning an error (or panicking) detaches this observer from the
    /// run. Other observers and the run itself carry on.
    fn on_tick(&mut self, snapshot: &ArenaSnapshot) -> Result<(), ObserverError>;
}

pub use failing::FailingObserver;
pub use fn_observer::FnObserver;
pub use set::{ObserverSet, SubscriptionId};
pub use vec::VecObserver;
