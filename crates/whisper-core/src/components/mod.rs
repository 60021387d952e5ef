//! Plain data owned by the simulation.
//!
//! Components carry no behavior beyond small helpers - the per-tick
//! rules live in systems.

mod common;
mod player;
mod adversary;
mod world;

pub use common::*;
pub use player::*;
pub use adversary::*;
pub use world::*;
