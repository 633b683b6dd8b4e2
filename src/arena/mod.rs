//! This is the arena module: two learners repeatedly playing one matrix
//! game, advanced in ticks and watched by observers.
//!
//! # Single Run
//!
//! A run can be driven by hand, all the way down to the tick.
//!
//! ```
//! use matrix_arena::arena::{ArenaRunBuilder, ArenaStatus};
//! use matrix_arena::core::GameId;
//!
//! let mut run = ArenaRunBuilder::default()
//!     .game(GameId::RockPaperScissors)
//!     .seed(42)
//!     .steps_per_tick(25)
//!     .build()
//!     .unwrap();
//!
//! run.start().unwrap();
//! let snapshot = run.tick().unwrap();
//! assert_eq!(25, snapshot.iteration);
//! assert_eq!(ArenaStatus::Running, snapshot.status);
//! ```
//!
//! # Scheduled Runs
//!
//! `ArenaHandle` wraps a run for sharing and ticks it on a tokio interval.
//! `ArenaRegistry` keeps the live handles by id.
//!
//! ```
//! use std::time::Duration;
//!
//! use matrix_arena::arena::{ArenaRegistry, ArenaRunBuilder};
//! use matrix_arena::core::GameId;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = ArenaRegistry::new();
//! let handle = registry
//!     .start(
//!         ArenaRunBuilder::default()
//!             .game(GameId::MatchingPennies)
//!             .tick_interval(Duration::from_millis(5)),
//!     )
//!     .unwrap();
//!
//! let subscription = handle.on_tick(|snapshot| {
//!     println!("{}", snapshot.iteration);
//!     Ok(())
//! });
//! tokio::time::sleep(Duration::from_millis(20)).await;
//!
//! subscription.unsubscribe();
//! assert!(registry.stop(&handle.id()));
//! # });
//! ```
pub mod builder;
pub mod duel;
pub mod errors;
pub mod handle;
pub mod observer;
pub mod registry;
pub mod run;
pub mod stepper;

pub use builder::ArenaRunBuilder;
pub use duel::{Duel, StepOutcome};
pub use errors::ArenaError;
pub use handle::{ArenaHandle, Subscription};
pub use observer::{
    FailingObserver, FnObserver, ObserverError, ObserverSet, SubscriptionId, TickObserver,
    VecObserver,
};
pub use registry::ArenaRegistry;
pub use run::{ArenaRun, ArenaSnapshot, ArenaStatus};
pub use stepper::{Algorithm, FictitiousPlay, Hedge, RegretMatching, Stepper};
