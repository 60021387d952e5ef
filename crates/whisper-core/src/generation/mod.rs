//! Generation - deterministic procedural creation of the forest.

mod forest;

pub use forest::*;

use thiserror::Error;

use crate::components::EntityKind;

/// World parameters that make safe placement impossible.
///
/// These are configuration mistakes; generation fails fast instead of
/// sampling forever.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("world bounds must be a positive finite half-extent, got {0}")]
    InvalidBounds(f32),
    #[error("spawn exclusion radius {radius} covers the whole world (bounds {bounds})")]
    ExclusionCoversWorld { radius: f32, bounds: f32 },
    #[error("collectible margin {margin} leaves no room inside bounds {bounds}")]
    MarginCoversWorld { margin: f32, bounds: f32 },
    #[error("could not place {kind:?} #{index} outside the spawn zone after {attempts} attempts")]
    PlacementExhausted {
        kind: EntityKind,
        index: usize,
        attempts: u32,
    },
}
