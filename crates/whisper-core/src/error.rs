//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::generation::GenerationError;
use crate::persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("world generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type SimResult<T> = Result<T, SimError>;
