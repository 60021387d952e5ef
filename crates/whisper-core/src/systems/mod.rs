//! Systems - per-tick logic over the simulation's owned state

mod player;
mod adversary;
mod progression;
mod cues;

pub use player::*;
pub use adversary::*;
pub use progression::*;
pub use cues::*;
