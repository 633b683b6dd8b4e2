use std::time::Duration;

use crate::core::{
    GameId, GameSpec, require_learning_rate, require_nonzero_duration, require_positive,
};

use super::{
    ArenaRun,
    errors::ArenaError,
    observer::{ObserverSet, TickObserver},
    stepper::Hedge,
};

/// # ArenaRunBuilder
///
/// `ArenaRunBuilder` is a builder for a single streamed arena simulation. A
/// game is required, other fields are optional.
///
/// ## Setters
///
/// Each setter will set the optional value to the passed in value. Then
/// return the mutated builder.
///
/// - `seed` defaults to a random seed. Pass one in for a reproducible run.
/// - `learning_rate` defaults to the Hedge default of 0.5.
/// - `steps_per_tick` defaults to 10.
/// - `tick_interval` defaults to 100ms and only matters when the run is
///   scheduled through an `ArenaHandle`.
///
/// ## Examples
///
/// ```
/// use matrix_arena::arena::ArenaRunBuilder;
/// use matrix_arena::core::GameId;
///
/// let mut run = ArenaRunBuilder::default()
///     .game(GameId::RockPaperScissors)
///     .seed(420)
///     .build()
///     .unwrap();
/// run.start().unwrap();
/// let snapshot = run.tick().unwrap();
/// assert_eq!(10, snapshot.iteration);
/// ```
#[derive(Default)]
pub struct ArenaRunBuilder {
    game: Option<GameId>,
    seed: Option<u32>,
    learning_rate: Option<f64>,
    steps_per_tick: Option<usize>,
    tick_interval: Option<Duration>,
    observers: Vec<Box<dyn TickObserver>>,
}

impl ArenaRunBuilder {
    pub const DEFAULT_STEPS_PER_TICK: usize = 10;
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

    /// Set the game for the run created by this builder.
    pub fn game(mut self, game: GameId) -> Self {
        self.game = Some(game);
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn steps_per_tick(mut self, steps_per_tick: usize) -> Self {
        self.steps_per_tick = Some(steps_per_tick);
        self
    }

    pub fn tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = Some(tick_interval);
        self
    }

    /// Set the observers attached from the very first tick.
    pub fn observers(mut self, observers: Vec<Box<dyn TickObserver>>) -> Self {
        self.observers = observers;
        self
    }

    /// Validate everything and create a new `ArenaRun` in the `Created`
    /// state.
    ///
    /// @returns ArenaError if no game was given or a value is invalid.
    pub fn build(self) -> Result<ArenaRun, ArenaError> {
        let game = self.game.ok_or(ArenaError::NeedGame)?;

        let learning_rate = self.learning_rate.unwrap_or(Hedge::DEFAULT_LEARNING_RATE);
        require_learning_rate(learning_rate)?;

        let steps_per_tick = self
            .steps_per_tick
            .unwrap_or(Self::DEFAULT_STEPS_PER_TICK);
        require_positive("stepsPerTick", steps_per_tick)?;

        let tick_interval = self.tick_interval.unwrap_or(Self::DEFAULT_TICK_INTERVAL);
        require_nonzero_duration("tickInterval", tick_interval)?;

        // Without a seed pick a random one, `ArenaRun::seed` reports it.
        let seed = self.seed.unwrap_or_else(rand::random);

        let mut observers = ObserverSet::new();
        for observer in self.observers {
            observers.add(observer);
        }

        Ok(ArenaRun::new(
            GameSpec::get(game),
            seed,
            learning_rate,
            steps_per_tick,
            tick_interval,
            observers,
        ))
    }
}
