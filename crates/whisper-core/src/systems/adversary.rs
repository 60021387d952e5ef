//! Adversary system - timed behavior rolls, pursuit, proximity and contact.
//!
//! Every `retarget_interval` seconds one draw picks the next behavior by
//! probability band, then the adversary and its decoy are respawned around
//! the player at different random bearings. Between rolls a lethal
//! adversary closes in while the player is inside its chase radius.

use rand::RngCore;

use crate::components::{AdversaryState, BehaviorState, Vec2};
use crate::config::AdversaryTuning;
use crate::rng::{span, unit};

/// What the adversary system produced this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdversaryStep {
    /// Distance to the player before this tick's pursuit step
    pub proximity: f32,
    /// Set when a behavior roll happened this tick
    pub retargeted: Option<BehaviorState>,
    /// The real adversary touched the player
    pub contact: bool,
}

/// Initial adversary placement: far side of the world, decoy hidden.
pub fn spawn_adversary(bounds: f32, tuning: &AdversaryTuning) -> AdversaryState {
    AdversaryState::new(
        Vec2::new(0.0, -bounds + tuning.initial_inset),
        tuning.initial_decoy,
        tuning.retarget_interval,
    )
}

/// Pick a behavior from a uniform roll in [0, 1).
pub fn behavior_for_roll(roll: f32, tuning: &AdversaryTuning) -> BehaviorState {
    if roll < tuning.illusion_band {
        BehaviorState::Illusion
    } else if roll < tuning.lurking_band {
        BehaviorState::Lurking
    } else {
        BehaviorState::Hunting
    }
}

/// How close the player must be for the adversary to move toward them.
pub fn chase_radius(behavior: BehaviorState, tuning: &AdversaryTuning) -> Option<f32> {
    match behavior {
        BehaviorState::Lurking => Some(tuning.engagement_radius),
        BehaviorState::Hunting => Some(tuning.pursuit_radius.max(tuning.engagement_radius)),
        BehaviorState::Illusion => None,
    }
}

/// Advance the adversary one tick.
///
/// `now` is the simulated time at the end of this tick and
/// `player_position` the player's position after their own update.
pub fn update_adversary(
    adversary: &mut AdversaryState,
    player_position: Vec2,
    now: f32,
    dt: f32,
    tuning: &AdversaryTuning,
    rng: &mut impl RngCore,
) -> AdversaryStep {
    let retargeted = if now > adversary.next_transition_time {
        adversary.next_transition_time = now + tuning.retarget_interval;
        retarget(adversary, player_position, tuning, rng);
        Some(adversary.behavior)
    } else {
        None
    };

    let delta = player_position - adversary.position;
    let distance = delta.length();
    adversary.proximity = distance;

    if let Some(radius) = chase_radius(adversary.behavior, tuning) {
        if distance < radius {
            let velocity = delta * (tuning.speed / distance.max(0.001));
            adversary.position = adversary.position + velocity * dt;
        }
    }

    AdversaryStep {
        proximity: distance,
        retargeted,
        contact: adversary.behavior.is_lethal() && distance < tuning.contact_radius,
    }
}

/// Roll the next behavior and respawn the adversary and decoy around the player.
fn retarget(
    adversary: &mut AdversaryState,
    player_position: Vec2,
    tuning: &AdversaryTuning,
    rng: &mut impl RngCore,
) {
    adversary.behavior = behavior_for_roll(unit(rng), tuning);

    let angle = unit(rng) * std::f32::consts::TAU;
    let distance = span(rng, tuning.respawn_min_distance, tuning.respawn_distance_span);
    adversary.position = player_position + Vec2::from_angle(angle) * distance;

    let decoy_angle = angle + tuning.decoy_angle_offset;
    let decoy_distance =
        distance * span(rng, tuning.decoy_distance_min, tuning.decoy_distance_span);
    adversary.decoy_position = player_position + Vec2::from_angle(decoy_angle) * decoy_distance;
    adversary.decoy_visible = adversary.behavior == BehaviorState::Illusion;

    log::debug!(
        "Adversary retargeted: {:?} at ({:.1}, {:.1}), decoy at ({:.1}, {:.1})",
        adversary.behavior,
        adversary.position.x,
        adversary.position.z,
        adversary.decoy_position.x,
        adversary.decoy_position.z
    );
}
