use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::event;
use uuid::Uuid;

use super::{
    ArenaRun, ArenaSnapshot, ArenaStatus,
    errors::ArenaError,
    observer::{FnObserver, ObserverError, SubscriptionId, TickObserver},
};

fn lock(run: &Mutex<ArenaRun>) -> MutexGuard<'_, ArenaRun> {
    run.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one scheduled tick. Returns false once the run should no longer be
/// ticked.
fn scheduled_tick(run: &Weak<Mutex<ArenaRun>>) -> bool {
    match run.upgrade() {
        Some(run) => lock(&run).tick().is_ok(),
        None => false,
    }
}

/// A shareable handle to one arena run, with its tick scheduler.
///
/// Observers are called while the run is locked, so an observer must not
/// call back into the same handle.
#[derive(Clone)]
pub struct ArenaHandle {
    id: Uuid,
    run: Arc<Mutex<ArenaRun>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ArenaHandle {
    pub fn new(run: ArenaRun) -> Self {
        Self {
            id: run.id(),
            run: Arc::new(Mutex::new(run)),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> ArenaStatus {
        lock(&self.run).status()
    }

    /// Start the run and schedule a tick every `tick_interval` on the
    /// current tokio runtime.
    pub fn start(&self) -> Result<(), ArenaError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ArenaError::NoRuntime)?;

        let period = {
            let mut run = lock(&self.run);
            run.start()?;
            run.tick_interval()
        };

        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.is_some() {
            return Ok(());
        }

        let weak = Arc::downgrade(&self.run);
        let id = self.id;
        *ticker = Some(runtime.spawn(async move {
            let mut clock = interval(period);
            clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately.
            clock.tick().await;
            loop {
                clock.tick().await;
                if !scheduled_tick(&weak) {
                    break;
                }
            }
            event!(tracing::Level::DEBUG, run_id = %id, "Arena ticker exited");
        }));
        Ok(())
    }

    /// Advance one tick right now, outside the scheduler.
    pub fn tick(&self) -> Result<ArenaSnapshot, ArenaError> {
        lock(&self.run).tick()
    }

    /// The latest snapshot, without advancing.
    pub fn get_state(&self) -> ArenaSnapshot {
        lock(&self.run).snapshot()
    }

    /// Attach an observer. The returned `Subscription` detaches it again.
    pub fn subscribe(&self, observer: Box<dyn TickObserver>) -> Subscription {
        let id = lock(&self.run).subscribe(observer);
        Subscription {
            run: Arc::downgrade(&self.run),
            id,
        }
    }

    /// Call `callback` after every tick until unsubscribed.
    pub fn on_tick<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&ArenaSnapshot) -> Result<(), ObserverError> + Send + 'static,
    {
        self.subscribe(Box::new(FnObserver::new(callback)))
    }

    /// Stop ticking, release the scheduler task and every observer.
    pub fn stop(&self) -> Result<(), ArenaError> {
        self.abort_ticker();
        lock(&self.run).stop()
    }

    /// Same as `stop` for a run whose owner has gone away.
    pub fn disconnect(&self) -> Result<(), ArenaError> {
        self.abort_ticker();
        lock(&self.run).disconnect()
    }

    pub fn is_scheduled(&self) -> bool {
        self.ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn abort_ticker(&self) {
        if let Some(handle) = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

/// Returned from `ArenaHandle::subscribe`. Detaching one subscription never
/// affects the others on the same run.
#[derive(Debug)]
pub struct Subscription {
    run: Weak<Mutex<ArenaRun>>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Detach the observer. Returns false if it was already gone, either
    /// because it failed, the run finished, or the run was dropped.
    pub fn unsubscribe(self) -> bool {
        match self.run.upgrade() {
            Some(run) => lock(&run).unsubscribe(self.id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicU64, Ordering},
        time::Duration,
    };

    use crate::arena::{ArenaRunBuilder, VecObserver};
    use crate::core::GameId;

    use super::*;

    fn handle(interval: Duration) -> ArenaHandle {
        ArenaHandle::new(
            ArenaRunBuilder::default()
                .game(GameId::RockPaperScissors)
                .seed(8)
                .tick_interval(interval)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_start_needs_runtime() {
        let h = handle(Duration::from_millis(10));
        assert_eq!(Err(ArenaError::NoRuntime), h.start());
        assert_eq!(ArenaStatus::Created, h.status());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_ticks_and_stops() {
        let h = handle(Duration::from_millis(10));
        let count = Arc::new(AtomicU64::new(0));
        let inner = count.clone();
        let _sub = h.on_tick(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        h.start().unwrap();
        assert!(h.is_scheduled());
        tokio::time::sleep(Duration::from_millis(105)).await;

        let ticks = count.load(Ordering::SeqCst);
        assert!(ticks >= 5, "only {ticks} ticks");
        assert_eq!(ticks * 10, h.get_state().iteration);

        h.stop().unwrap();
        assert!(!h.is_scheduled());
        let stopped_at = h.get_state().iteration;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(stopped_at, h.get_state().iteration);
        assert_eq!(ArenaStatus::Stopped, h.status());
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_runs() {
        let one = handle(Duration::from_millis(10));
        let two = handle(Duration::from_millis(10));
        one.start().unwrap();
        two.start().unwrap();
        tokio::time::sleep(Duration::from_millis(55)).await;
        one.stop().unwrap();
        let frozen = one.get_state().iteration;
        tokio::time::sleep(Duration::from_millis(55)).await;

        assert_eq!(frozen, one.get_state().iteration);
        assert!(two.get_state().iteration > frozen);
        assert_eq!(ArenaStatus::Running, two.status());
    }

    #[test]
    fn test_unsubscribe_leaves_others() {
        let h = handle(Duration::from_millis(10));
        let first = VecObserver::new_storage();
        let second = VecObserver::new_storage();
        let sub_one = h.subscribe(Box::new(VecObserver::new(first.clone())));
        let _sub_two = h.subscribe(Box::new(VecObserver::new(second.clone())));

        {
            let mut run = lock(&h.run);
            run.start().unwrap();
        }
        h.tick().unwrap();
        assert!(sub_one.unsubscribe());
        h.tick().unwrap();

        assert_eq!(1, first.lock().unwrap().len());
        assert_eq!(2, second.lock().unwrap().len());
    }

    #[test]
    fn test_unsubscribe_after_drop() {
        let h = handle(Duration::from_millis(10));
        let sub = h.on_tick(|_| Ok(()));
        drop(h);
        assert!(!sub.unsubscribe());
    }
}
