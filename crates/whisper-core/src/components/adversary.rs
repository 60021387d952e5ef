//! Adversary components: behavior state, position and the illusion decoy.

use serde::{Deserialize, Serialize};

use super::Vec2;

/// What the adversary is doing this cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Passive: closes in only when the player wanders inside the engagement radius
    #[default]
    Lurking,
    /// Actively pursues the player from the wider pursuit radius
    Hunting,
    /// A harmless decoy is shown while the real adversary stays still
    Illusion,
}

impl BehaviorState {
    /// Whether touching the adversary in this state ends the session
    pub fn is_lethal(self) -> bool {
        self != BehaviorState::Illusion
    }
}

/// The single adversary and its decoy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdversaryState {
    pub position: Vec2,
    pub behavior: BehaviorState,
    /// Simulated time of the next behavior roll
    pub next_transition_time: f32,
    /// Distance to the player as of the last adversary update
    pub proximity: f32,
    /// Decoy position; never collides and is never lethal
    pub decoy_position: Vec2,
    pub decoy_visible: bool,
}

impl AdversaryState {
    pub fn new(position: Vec2, decoy_position: Vec2, next_transition_time: f32) -> Self {
        Self {
            position,
            behavior: BehaviorState::Lurking,
            next_transition_time,
            proximity: FAR_PROXIMITY,
            decoy_position,
            decoy_visible: false,
        }
    }
}

/// Proximity reported before the adversary has been updated once.
pub const FAR_PROXIMITY: f32 = 999.0;
