//! Forest Whisper Core - survival simulation for a seeded night forest
//!
//! The player gathers a fixed number of markers scattered through a
//! procedurally generated forest, then escapes through a gate that opens
//! once every marker is held. A single adversary cycles between lurking,
//! hunting and projecting a harmless illusion; contact with the real thing
//! ends the session.
//!
//! # Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`rng`] | Deterministic xorshift stream |
//! | [`components`] | Plain state: player, adversary, placed entities |
//! | [`config`] | Tuning constants and JSON loading |
//! | [`generation`] | Seeded forest layout |
//! | [`systems`] | Per-tick rules: player, adversary, progression, cues |
//! | [`engine`] | [`Simulation`](engine::Simulation) context and tick order |
//! | [`persistence`] | Snapshots, save slot storage |
//!
//! Everything is synchronous and in-memory. Rendering, audio and storage
//! belong to the host, which feeds input and frame deltas in and reads
//! [`TickReport`](engine::TickReport)s back.
//!
//! # Example
//!
//! ```rust,no_run
//! use whisper_core::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//!
//! loop {
//!     let report = sim.tick(1.0 / 60.0, &PlayerInput::moving(0.0, 1.0));
//!     if report.outcome.is_some() {
//!         break;
//!     }
//! }
//! ```

pub mod rng;
pub mod components;
pub mod config;
pub mod generation;
pub mod systems;
pub mod events;
pub mod clock;
pub mod engine;
pub mod persistence;
pub mod error;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{QualityProfile, SimConfig};
    pub use crate::engine::{Simulation, TickReport};
    pub use crate::error::{SimError, SimResult};
    pub use crate::events::{Cue, Outcome, SimEvent};
    pub use crate::persistence::{LoadOutcome, MemoryStore, SaveFormat, SaveSnapshot, SaveStore};
}
