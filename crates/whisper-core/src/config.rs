//! Simulation configuration.
//!
//! Every struct defaults to the tuning of the shipped game and deserializes
//! with `#[serde(default)]`, so a JSON file only needs the fields it overrides.

use std::f32::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::Vec2;
use crate::rng::DEFAULT_SEED;

/// Errors raised while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed world seed. Layouts are never re-randomized across sessions.
    pub seed: u32,
    /// Largest delta-time a single tick may integrate, in seconds
    pub max_step: f32,
    /// Simulated seconds between autosave notifications
    pub autosave_interval: f32,
    /// Look sensitivity multiplier
    pub look_sensitivity: f32,
    pub world: WorldConfig,
    pub player: PlayerTuning,
    pub adversary: AdversaryTuning,
    pub progression: ProgressionTuning,
    pub cues: CueTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_step: 0.033,
            autosave_interval: 30.0,
            look_sensitivity: 1.0,
            world: WorldConfig::default(),
            player: PlayerTuning::default(),
            adversary: AdversaryTuning::default(),
            progression: ProgressionTuning::default(),
            cues: CueTuning::default(),
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Number of collectibles that must be gathered to open the gate
    pub fn required_collectibles(&self) -> usize {
        self.world.collectible_count
    }

    /// Reject values that make the simulation ill-defined.
    ///
    /// Placement feasibility is checked separately by world generation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_step must be positive, got {}",
                self.max_step
            )));
        }
        if !(self.world.bounds.is_finite() && self.world.bounds > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "world bounds must be positive, got {}",
                self.world.bounds
            )));
        }
        if self.world.collectible_count == 0 {
            return Err(ConfigError::Invalid(
                "at least one collectible is required".into(),
            ));
        }
        if !(self.autosave_interval.is_finite() && self.autosave_interval > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "autosave_interval must be positive, got {}",
                self.autosave_interval
            )));
        }
        let adversary = &self.adversary;
        for (name, value) in [
            ("retarget_interval", adversary.retarget_interval),
            ("speed", adversary.speed),
            ("engagement_radius", adversary.engagement_radius),
            ("contact_radius", adversary.contact_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "adversary {} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.adversary.illusion_band <= self.adversary.lurking_band
            && self.adversary.lurking_band <= 1.0)
        {
            return Err(ConfigError::Invalid(
                "adversary probability bands must satisfy illusion <= lurking <= 1".into(),
            ));
        }
        Ok(())
    }

    /// Decorative counts currently configured
    pub fn decor_counts(&self) -> DecorCounts {
        DecorCounts {
            trees: self.world.tree_count,
            rocks: self.world.rock_count,
        }
    }

    /// Apply a decorative density profile, returning the new counts.
    pub fn apply_quality(&mut self, profile: QualityProfile) -> DecorCounts {
        let counts = profile.decor_counts();
        self.world.tree_count = counts.trees;
        self.world.rock_count = counts.rocks;
        counts
    }
}

/// World generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Half-extent of the square world
    pub bounds: f32,
    pub tree_count: usize,
    pub rock_count: usize,
    pub collectible_count: usize,
    /// Decorative entities never spawn closer than this to the origin
    pub spawn_exclusion_radius: f32,
    /// Collectibles stay this far inside the outer bound
    pub collectible_margin: f32,
    /// Distance of the gate from the far (-z) edge
    pub gate_inset: f32,
    pub gate_elevation: f32,
    /// Rejection-sampling cap per decorative entity
    pub max_placement_attempts: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let counts = QualityProfile::Medium.decor_counts();
        Self {
            bounds: 250.0,
            tree_count: counts.trees,
            rock_count: counts.rocks,
            collectible_count: 5,
            spawn_exclusion_radius: 12.0,
            collectible_margin: 30.0,
            gate_inset: 18.0,
            gate_elevation: 2.5,
            max_placement_attempts: 256,
        }
    }
}

impl WorldConfig {
    /// Where the exit gate stands: the far side of the world, behind the
    /// player's initial facing.
    pub fn gate_position(&self) -> Vec2 {
        Vec2::new(0.0, -self.bounds + self.gate_inset)
    }
}

/// Player movement and resource tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub crouch_speed: f32,
    /// Sprint speed only applies above this stamina
    pub sprint_speed_min_stamina: f32,
    /// A sprint press is honoured only above this stamina
    pub sprint_start_min_stamina: f32,
    /// Sprint is forced off at or below this stamina
    pub sprint_cutoff_stamina: f32,
    pub stamina_drain: f32,
    pub stamina_recovery: f32,
    /// Movement input shorter than this counts as standing still
    pub move_deadzone: f32,
    pub yaw_scale: f32,
    pub pitch_scale: f32,
    pub pitch_limit: f32,
    /// Inset from the world bound the player is clamped to
    pub boundary_margin: f32,
    pub repulsion_radius: f32,
    pub repulsion_factor: f32,
    /// Adversary distance at which fear starts draining sanity
    pub fear_distance: f32,
    pub sanity_drain: f32,
    pub torch_mitigation: f32,
    pub sanity_recovery: f32,
    pub initial_yaw: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            walk_speed: 6.0,
            sprint_speed: 9.0,
            crouch_speed: 3.5,
            sprint_speed_min_stamina: 0.25,
            sprint_start_min_stamina: 0.2,
            sprint_cutoff_stamina: 0.02,
            stamina_drain: 0.22,
            stamina_recovery: 0.16,
            move_deadzone: 0.05,
            yaw_scale: 0.0035,
            pitch_scale: 0.0025,
            pitch_limit: 1.0,
            boundary_margin: 2.0,
            repulsion_radius: 8.0,
            repulsion_factor: 0.08,
            fear_distance: 30.0,
            sanity_drain: 0.06,
            torch_mitigation: 0.4,
            sanity_recovery: 0.012,
            initial_yaw: 0.0,
        }
    }
}

/// Adversary behavior tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdversaryTuning {
    /// Seconds between behavior rolls
    pub retarget_interval: f32,
    pub speed: f32,
    /// Lurking adversaries close in only inside this radius
    pub engagement_radius: f32,
    /// Hunting adversaries pursue from this far away
    pub pursuit_radius: f32,
    /// Touching distance that ends the session
    pub contact_radius: f32,
    /// Rolls below this become Illusion
    pub illusion_band: f32,
    /// Rolls below this (and above `illusion_band`) become Lurking
    pub lurking_band: f32,
    pub respawn_min_distance: f32,
    pub respawn_distance_span: f32,
    pub decoy_angle_offset: f32,
    pub decoy_distance_min: f32,
    pub decoy_distance_span: f32,
    /// Initial distance from the far (-z) edge
    pub initial_inset: f32,
    pub initial_decoy: Vec2,
}

impl Default for AdversaryTuning {
    fn default() -> Self {
        Self {
            retarget_interval: 7.5,
            speed: 3.2,
            engagement_radius: 36.0,
            pursuit_radius: 64.0,
            contact_radius: 1.6,
            illusion_band: 0.2,
            lurking_band: 0.7,
            respawn_min_distance: 18.0,
            respawn_distance_span: 24.0,
            decoy_angle_offset: PI * 0.7,
            decoy_distance_min: 0.6,
            decoy_distance_span: 0.5,
            initial_inset: 30.0,
            initial_decoy: Vec2::new(6.0, 6.0),
        }
    }
}

/// Pickup and gate tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub pickup_radius: f32,
    pub gate_entry_radius: f32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            pickup_radius: 1.6,
            gate_entry_radius: 3.2,
        }
    }
}

/// Thresholds for the perceptual cue scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueTuning {
    pub footstep_input_threshold: f32,
    pub footstep_interval: f32,
    pub breath_stamina_threshold: f32,
    pub whisper_distance: f32,
    pub whisper_sanity_loss: f32,
    pub howl_distance: f32,
    pub vignette_max: f32,
}

impl Default for CueTuning {
    fn default() -> Self {
        Self {
            footstep_input_threshold: 0.15,
            footstep_interval: 0.42,
            breath_stamina_threshold: 0.35,
            whisper_distance: 16.0,
            whisper_sanity_loss: 0.3,
            howl_distance: 18.0,
            vignette_max: 0.35,
        }
    }
}

/// Decorative density presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityProfile {
    Low,
    #[default]
    Medium,
    High,
}

/// Decorative entity counts produced by a quality profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorCounts {
    pub trees: usize,
    pub rocks: usize,
}

impl QualityProfile {
    pub fn decor_counts(self) -> DecorCounts {
        match self {
            QualityProfile::Low => DecorCounts {
                trees: 320,
                rocks: 80,
            },
            QualityProfile::Medium => DecorCounts {
                trees: 450,
                rocks: 120,
            },
            QualityProfile::High => DecorCounts {
                trees: 520,
                rocks: 150,
            },
        }
    }

    /// The preset producing exactly these counts, if any.
    pub fn from_counts(counts: DecorCounts) -> Option<Self> {
        [QualityProfile::Low, QualityProfile::Medium, QualityProfile::High]
            .into_iter()
            .find(|profile| profile.decor_counts() == counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.required_collectibles(), 5);
        assert_eq!(config.world.gate_position(), Vec2::new(0.0, -232.0));
    }

    #[test]
    fn test_partial_json_override() {
        let config = SimConfig::from_json_str(
            r#"{ "seed": 7, "world": { "bounds": 100.0 }, "adversary": { "speed": 4.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.world.bounds, 100.0);
        assert_eq!(config.world.tree_count, 450);
        assert_eq!(config.adversary.speed, 4.0);
        assert_eq!(config.adversary.contact_radius, 1.6);
    }

    #[test]
    fn test_invalid_step_rejected() {
        let err = SimConfig::from_json_str(r#"{ "max_step": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_degenerate_adversary_tuning_rejected() {
        let setters: [fn(&mut AdversaryTuning, f32); 4] = [
            |a, v| a.retarget_interval = v,
            |a, v| a.speed = v,
            |a, v| a.engagement_radius = v,
            |a, v| a.contact_radius = v,
        ];
        for set in setters {
            for bad in [f32::NAN, f32::INFINITY, 0.0, -1.0] {
                let mut config = SimConfig::default();
                set(&mut config.adversary, bad);
                assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
            }
        }
    }

    #[test]
    fn test_garbage_json_rejected() {
        let err = SimConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_quality_profiles() {
        let mut config = SimConfig::default();
        let low = config.apply_quality(QualityProfile::Low);
        assert_eq!(low, DecorCounts { trees: 320, rocks: 80 });
        assert_eq!(config.world.tree_count, 320);
        let high = config.apply_quality(QualityProfile::High);
        assert_eq!(high.rocks, 150);
        assert_eq!(config.world.collectible_count, 5);
    }

    #[test]
    fn test_profile_from_counts() {
        let counts = QualityProfile::Low.decor_counts();
        assert_eq!(QualityProfile::from_counts(counts), Some(QualityProfile::Low));
        assert_eq!(
            QualityProfile::from_counts(DecorCounts { trees: 10, rocks: 2 }),
            None
        );
    }
}
