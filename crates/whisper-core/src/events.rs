//! Events reported by a tick for presentation and audio collaborators.

use serde::{Deserialize, Serialize};

use crate::components::BehaviorState;

/// Terminal result of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Walked through the open gate
    Win,
    /// Touched by the real adversary
    Loss,
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A collectible was picked up
    Collected {
        index: usize,
        /// Running total after this pickup
        count: usize,
        required: usize,
        /// Narrative reveal slot for this pickup
        reveal: usize,
    },
    /// Every collectible is held; the gate is open
    GateActivated,
    /// The adversary rolled a new behavior and respawned
    AdversaryRetargeted { behavior: BehaviorState },
    /// Enough play time passed since the last autosave notification
    AutosaveDue,
    /// A perceptual cue should be played
    Cue(Cue),
    /// The session ended. Reported once.
    Outcome(Outcome),
}

/// Timed perceptual cues derived from simulation state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cue {
    Footstep { gain: f32, rate: f32 },
    Breath { gain: f32 },
    Whisper { gain: f32, rate: f32 },
    Howl { gain: f32, rate: f32 },
}
