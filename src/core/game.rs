use std::{fmt, str::FromStr, sync::LazyLock};

use ndarray::{Array2, ArrayView2, array};

use super::ConfigError;

/// The three games that the library knows how to play.
///
/// The string forms (`rps`, `mp`, `pd`) are part of the external
/// configuration surface and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameId {
    #[cfg_attr(feature = "serde", serde(rename = "rps"))]
    RockPaperScissors,
    #[cfg_attr(feature = "serde", serde(rename = "mp"))]
    MatchingPennies,
    #[cfg_attr(feature = "serde", serde(rename = "pd"))]
    PrisonersDilemma,
}

impl GameId {
    pub const ALL: [GameId; 3] = [
        GameId::RockPaperScissors,
        GameId::MatchingPennies,
        GameId::PrisonersDilemma,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::RockPaperScissors => "rps",
            GameId::MatchingPennies => "mp",
            GameId::PrisonersDilemma => "pd",
        }
    }

    /// Shortcut for `GameSpec::get`.
    pub fn spec(&self) -> &'static GameSpec {
        GameSpec::get(*self)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rps" => Ok(GameId::RockPaperScissors),
            "mp" => Ok(GameId::MatchingPennies),
            "pd" => Ok(GameId::PrisonersDilemma),
            _ => Err(ConfigError::UnknownGame(s.to_string())),
        }
    }
}

/// Which side of the matrix a player sits on. `A` picks rows, `B` picks
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

/// An immutable two player matrix game.
///
/// `payoff_a[i][j]` and `payoff_b[i][j]` are the payoffs when A plays
/// action `i` and B plays action `j`. Seeded reproducibility depends on the
/// exact values and on the action ordering, so neither may change.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSpec {
    pub id: GameId,
    pub actions_a: Vec<&'static str>,
    pub actions_b: Vec<&'static str>,
    pub payoff_a: Array2<f64>,
    pub payoff_b: Array2<f64>,
    pub zero_sum: bool,
    // B's payoffs indexed by [B action][A action]
    payoff_b_t: Array2<f64>,
}

static REGISTRY: LazyLock<[GameSpec; 3]> = LazyLock::new(|| {
    [
        GameSpec::new(
            GameId::RockPaperScissors,
            vec!["Rock", "Paper", "Scissors"],
            vec!["Rock", "Paper", "Scissors"],
            array![[0.0, -1.0, 1.0], [1.0, 0.0, -1.0], [-1.0, 1.0, 0.0]],
            array![[0.0, 1.0, -1.0], [-1.0, 0.0, 1.0], [1.0, -1.0, 0.0]],
            true,
        ),
        GameSpec::new(
            GameId::MatchingPennies,
            vec!["Heads", "Tails"],
            vec!["Heads", "Tails"],
            array![[1.0, -1.0], [-1.0, 1.0]],
            array![[-1.0, 1.0], [1.0, -1.0]],
            true,
        ),
        GameSpec::new(
            GameId::PrisonersDilemma,
            vec!["Cooperate", "Defect"],
            vec!["Cooperate", "Defect"],
            array![[3.0, 0.0], [5.0, 1.0]],
            array![[3.0, 5.0], [0.0, 1.0]],
            false,
        ),
    ]
});

impl GameSpec {
    fn new(
        id: GameId,
        actions_a: Vec<&'static str>,
        actions_b: Vec<&'static str>,
        payoff_a: Array2<f64>,
        payoff_b: Array2<f64>,
        zero_sum: bool,
    ) -> Self {
        let payoff_b_t = payoff_b.t().to_owned();
        Self {
            id,
            actions_a,
            actions_b,
            payoff_a,
            payoff_b,
            zero_sum,
            payoff_b_t,
        }
    }

    /// Look up one of the registered games.
    pub fn get(id: GameId) -> &'static GameSpec {
        let idx = match id {
            GameId::RockPaperScissors => 0,
            GameId::MatchingPennies => 1,
            GameId::PrisonersDilemma => 2,
        };
        &REGISTRY[idx]
    }

    /// All registered games in registry order.
    pub fn all() -> &'static [GameSpec] {
        REGISTRY.as_slice()
    }

    pub fn num_actions(&self, player: Player) -> usize {
        match player {
            Player::A => self.actions_a.len(),
            Player::B => self.actions_b.len(),
        }
    }

    pub fn actions(&self, player: Player) -> &[&'static str] {
        match player {
            Player::A => &self.actions_a,
            Player::B => &self.actions_b,
        }
    }

    /// The payoff matrix seen from `player`'s side: rows are that
    /// player's own actions and columns are the opponent's.
    pub fn payoff_for(&self, player: Player) -> ArrayView2<'_, f64> {
        match player {
            Player::A => self.payoff_a.view(),
            Player::B => self.payoff_b_t.view(),
        }
    }

    /// Realized payoffs `(A, B)` for a joint action.
    pub fn payoff(&self, action_a: usize, action_b: usize) -> (f64, f64) {
        (
            self.payoff_a[[action_a, action_b]],
            self.payoff_b[[action_a, action_b]],
        )
    }

    /// The action index counted by the cooperation metric.
    pub fn cooperative_action(&self) -> usize {
        0
    }

    /// Check the zero-sum flag against the matrices: payoffs must add up to
    /// the same constant for every joint action.
    pub fn is_constant_sum(&self) -> bool {
        let sums = &self.payoff_a + &self.payoff_b;
        let first = sums[[0, 0]];
        sums.iter().all(|s| (s - first).abs() < 1e-12)
    }
}
