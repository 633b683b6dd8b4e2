use thiserror::Error;
use uuid::Uuid;

use crate::core::ConfigError;

#[derive(Error, Debug, PartialEq)]
pub enum ArenaError {
    #[error("A game is required to build an arena run")]
    NeedGame,
    #[error("Arena run {0} not found")]
    RunNotFound(Uuid),
    #[error("Arena run {0} is not running")]
    NotRunning(Uuid),
    #[error("Arena run {0} has already finished")]
    AlreadyFinished(Uuid),
    #[error("Invalid arena configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Scheduling ticks requires a tokio runtime")]
    NoRuntime,
}
