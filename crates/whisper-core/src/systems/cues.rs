//! Cue scheduler - times footsteps, breathing, whispers and howls.
//!
//! Playback is external; this only decides when a cue fires and how loud.
//! Draws come from a dedicated stream so cue timing never shifts the
//! adversary's behavior rolls.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::CueTuning;
use crate::events::Cue;
use crate::rng::span;

/// Countdown timers for each cue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CueTimers {
    footstep: f32,
    breath: f32,
    whisper: f32,
    howl: f32,
}

/// Simulation values the cue scheduler reads
#[derive(Debug, Clone, Copy)]
pub struct CueInputs {
    pub dt: f32,
    /// `|move.x| + |move.y|` of the sanitized input
    pub move_effort: f32,
    pub stamina: f32,
    pub sanity: f32,
    /// Adversary distance computed this tick
    pub adversary_distance: f32,
}

/// Continuous presentation hints derived from the player's resources
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    /// Opacity of the low-sanity screen overlay
    pub sanity_vignette: f32,
    /// Player is out of breath
    pub breathing: bool,
}

pub fn perception(stamina: f32, sanity: f32, tuning: &CueTuning) -> Perception {
    Perception {
        sanity_vignette: (1.0 - sanity).clamp(0.0, tuning.vignette_max),
        breathing: stamina < tuning.breath_stamina_threshold,
    }
}

/// Advance cue timers and return the cues due this tick.
pub fn update_cues(
    timers: &mut CueTimers,
    inputs: &CueInputs,
    tuning: &CueTuning,
    rng: &mut impl RngCore,
) -> Vec<Cue> {
    let mut cues = Vec::new();
    let dt = inputs.dt;

    if inputs.move_effort > tuning.footstep_input_threshold {
        timers.footstep = (timers.footstep - dt).max(0.0);
        if timers.footstep <= 0.0 {
            timers.footstep = tuning.footstep_interval;
            cues.push(Cue::Footstep {
                gain: span(rng, 0.7, 0.3),
                rate: span(rng, 0.9, 0.2),
            });
        }
    }

    timers.breath = (timers.breath - dt).max(0.0);
    if timers.breath <= 0.0 && inputs.stamina < tuning.breath_stamina_threshold {
        timers.breath = 2.0 - inputs.stamina * 1.2;
        cues.push(Cue::Breath {
            gain: 0.25 + (1.0 - inputs.stamina) * 0.35,
        });
    }

    timers.whisper = (timers.whisper - dt).max(0.0);
    let sanity_loss = 1.0 - inputs.sanity;
    let closeness = tuning.whisper_distance - inputs.adversary_distance;
    if timers.whisper <= 0.0
        && (inputs.adversary_distance < tuning.whisper_distance
            || sanity_loss > tuning.whisper_sanity_loss)
    {
        timers.whisper = 3.5 - (sanity_loss * 3.0 + closeness * 0.08).min(2.5);
        cues.push(Cue::Whisper {
            gain: (0.15 + sanity_loss * 0.4 + closeness * 0.02).clamp(0.1, 0.6),
            rate: span(rng, 0.9, 0.2),
        });
    }

    timers.howl = (timers.howl - dt).max(0.0);
    if timers.howl <= 0.0 && inputs.adversary_distance < tuning.howl_distance {
        timers.howl = span(rng, 3.0, 3.0);
        cues.push(Cue::Howl {
            gain: (1.4 - inputs.adversary_distance / tuning.howl_distance).clamp(0.15, 0.7),
            rate: span(rng, 0.9, 0.2),
        });
    }

    cues
}
