//! Simulation engine - main entry point for running a session
//!
//! [`Simulation`] owns every piece of mutable state and threads it through
//! the systems in a fixed order each tick:
//!
//! 1. player, reading the adversary proximity from the previous tick
//! 2. adversary, against the player's new position (may end in a loss)
//! 3. progression, skipped on a losing tick (may end in a win)
//! 4. cues and the autosave edge
//!
//! Once an outcome is reported the session is frozen.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::components::*;
use crate::config::{DecorCounts, QualityProfile, SimConfig, WorldConfig};
use crate::error::SimResult;
use crate::events::{Outcome, SimEvent};
use crate::generation::{generate_world, GeneratedWorld, GenerationError};
use crate::persistence::{
    decode_snapshot, encode_snapshot, LoadOutcome, SaveFormat, SaveSnapshot, SaveStore, SavedPlayer,
    SAVE_KEY,
};
use crate::rng::{derived_stream, Xorshift32};
use crate::systems::*;

/// Salt for the cue stream derived from the world seed
const CUE_STREAM_SALT: u32 = 0xC0E5_A0D1;

/// Generate a layout for `seed` without starting a session.
pub fn initialize_world(seed: u32, config: &WorldConfig) -> Result<WorldLayout, GenerationError> {
    generate_world(seed, config).map(|generated| generated.layout)
}

/// Everything a tick changed, for presentation collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Step actually integrated after clamping
    pub dt: f32,
    pub player: PlayerState,
    pub adversary: AdversaryState,
    pub collected_count: usize,
    pub gate_active: bool,
    /// Set on the one tick that ends the session
    pub outcome: Option<Outcome>,
    pub events: Vec<SimEvent>,
    pub perception: Perception,
}

/// A single forest session
pub struct Simulation {
    config: SimConfig,
    layout: WorldLayout,
    /// Decorative counts the current layout was generated with
    layout_counts: DecorCounts,
    /// World stream, continued by adversary rolls after generation
    rng: Xorshift32,
    cue_rng: Xorshift32,
    clock: SimClock,
    player: PlayerState,
    adversary: AdversaryState,
    progression: ProgressionState,
    cue_timers: CueTimers,
    next_autosave: f32,
    outcome: Option<Outcome>,
}

impl Simulation {
    /// Validate the configuration and generate the world for `config.seed`.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let seed = config.seed;
        let GeneratedWorld { layout, rng } = generate_world(seed, &config.world)?;

        let sim = Self {
            layout_counts: config.decor_counts(),
            layout,
            rng,
            cue_rng: derived_stream(seed, CUE_STREAM_SALT),
            clock: SimClock::new(config.max_step),
            player: PlayerState::new(Vec2::ZERO, config.player.initial_yaw),
            adversary: spawn_adversary(config.world.bounds, &config.adversary),
            progression: ProgressionState::new(config.required_collectibles()),
            cue_timers: CueTimers::default(),
            next_autosave: config.autosave_interval,
            outcome: None,
            config,
        };
        Ok(sim)
    }

    /// Regenerate the world for `seed` and start a fresh session on it.
    pub fn initialize_world(&mut self, seed: u32) -> SimResult<&WorldLayout> {
        let generated = generate_world(seed, &self.config.world)?;
        self.install_world(seed, generated);
        self.player = PlayerState::new(Vec2::ZERO, self.config.player.initial_yaw);
        self.progression = ProgressionState::new(self.config.required_collectibles());
        Ok(&self.layout)
    }

    /// Advance the simulation by one frame.
    ///
    /// `raw_dt` is clamped to `[0, max_step]` and the input is sanitized, so
    /// any values are accepted.
    pub fn tick(&mut self, raw_dt: f32, input: &PlayerInput) -> TickReport {
        if self.outcome.is_some() {
            return self.report(0.0, None, Vec::new());
        }

        let dt = self.clock.advance(raw_dt);
        let now = self.clock.elapsed();
        let input = input.sanitized();
        let mut events = Vec::new();

        let env = PlayerEnv {
            dt,
            adversary_proximity: self.adversary.proximity,
            look_sensitivity: self.config.look_sensitivity,
            bounds: self.config.world.bounds,
        };
        let player_step = update_player(&mut self.player, &input, &env, &self.config.player);

        let adversary_step = update_adversary(
            &mut self.adversary,
            player_step.position,
            now,
            dt,
            &self.config.adversary,
            &mut self.rng,
        );
        if let Some(behavior) = adversary_step.retargeted {
            events.push(SimEvent::AdversaryRetargeted { behavior });
        }

        let mut outcome = None;
        if adversary_step.contact {
            outcome = Some(Outcome::Loss);
        } else {
            let step = update_progression(
                &mut self.progression,
                &mut self.layout,
                player_step.position,
                &self.config.progression,
            );
            events.extend(step.events);
            if step.reached_gate {
                outcome = Some(Outcome::Win);
            }
        }

        let cue_inputs = CueInputs {
            dt,
            move_effort: input.move_x.abs() + input.move_y.abs(),
            stamina: player_step.stamina,
            sanity: player_step.sanity,
            adversary_distance: adversary_step.proximity,
        };
        let cues = update_cues(&mut self.cue_timers, &cue_inputs, &self.config.cues, &mut self.cue_rng);
        events.extend(cues.into_iter().map(SimEvent::Cue));

        if now >= self.next_autosave {
            self.next_autosave += self.config.autosave_interval;
            log::debug!("Autosave due at t={:.1}s", now);
            events.push(SimEvent::AutosaveDue);
        }

        if let Some(result) = outcome {
            log::info!(
                "Session ended: {:?} at t={:.2}s with {}/{} collected",
                result,
                now,
                self.progression.collected_count(),
                self.progression.required()
            );
            self.outcome = Some(result);
            events.push(SimEvent::Outcome(result));
        }

        self.report(dt, outcome, events)
    }

    fn report(&self, dt: f32, outcome: Option<Outcome>, events: Vec<SimEvent>) -> TickReport {
        TickReport {
            dt,
            player: self.player.clone(),
            adversary: self.adversary.clone(),
            collected_count: self.progression.collected_count(),
            gate_active: self.progression.gate_active(),
            outcome,
            events,
            perception: perception(self.player.stamina, self.player.sanity, &self.config.cues),
        }
    }

    /// Capture the resumable state of the session.
    pub fn serialize_state(&self) -> SaveSnapshot {
        SaveSnapshot {
            collected: self.progression.collected_indices(),
            player: SavedPlayer {
                x: self.player.position.x,
                z: self.player.position.z,
                yaw: self.player.yaw,
                pitch: self.player.pitch,
                stamina: self.player.stamina,
                sanity: self.player.sanity,
                torch_on: self.player.torch_on,
            },
            gate_active: self.progression.gate_active(),
            seed: self.config.seed,
            quality: QualityProfile::from_counts(self.layout_counts),
        }
    }

    /// Replay generation from the snapshot's seed and apply its state.
    ///
    /// On error the session is left untouched.
    pub fn restore_state(&mut self, snapshot: &SaveSnapshot) -> SimResult<&WorldLayout> {
        let mut world = self.config.world.clone();
        if let Some(profile) = snapshot.quality {
            let counts = profile.decor_counts();
            world.tree_count = counts.trees;
            world.rock_count = counts.rocks;
        }
        let generated = generate_world(snapshot.seed, &world)?;

        self.config.world = world;
        self.install_world(snapshot.seed, generated);

        self.progression = ProgressionState::restore(
            self.config.required_collectibles(),
            snapshot.collected.iter().copied(),
        );
        if snapshot.gate_active != self.progression.gate_active() {
            log::warn!(
                "Saved gate flag {} disagrees with {}/{} collected, using {}",
                snapshot.gate_active,
                self.progression.collected_count(),
                self.progression.required(),
                self.progression.gate_active()
            );
        }
        for index in self.progression.collected_indices() {
            self.layout.set_collectible_visible(index, false);
        }

        let saved = finite_player(&snapshot.player);
        let tuning = &self.config.player;
        let limit = (self.config.world.bounds - tuning.boundary_margin).max(0.0);
        let mut player = PlayerState::new(
            Vec2::new(saved.x.clamp(-limit, limit), saved.z.clamp(-limit, limit)),
            saved.yaw.rem_euclid(TAU),
        );
        player.pitch = saved.pitch.clamp(-tuning.pitch_limit, tuning.pitch_limit);
        player.stamina = saved.stamina.clamp(0.0, 1.0);
        player.sanity = saved.sanity.clamp(0.0, 1.0);
        player.torch_on = saved.torch_on;
        self.player = player;

        log::info!(
            "Restored session seed={} collected={}/{} gate={}",
            snapshot.seed,
            self.progression.collected_count(),
            self.progression.required(),
            self.progression.gate_active()
        );
        Ok(&self.layout)
    }

    /// Swap in a freshly generated world and reset per-session state.
    fn install_world(&mut self, seed: u32, generated: GeneratedWorld) {
        self.config.seed = seed;
        self.layout_counts = self.config.decor_counts();
        self.layout = generated.layout;
        self.rng = generated.rng;
        self.cue_rng = derived_stream(seed, CUE_STREAM_SALT);
        self.cue_timers = CueTimers::default();
        self.adversary = spawn_adversary(self.config.world.bounds, &self.config.adversary);
        self.clock.reset();
        self.next_autosave = self.config.autosave_interval;
        self.outcome = None;
    }

    /// Set decorative density for the next generation. The current layout
    /// and all gameplay state are unaffected.
    pub fn set_quality_profile(&mut self, profile: QualityProfile) -> DecorCounts {
        let counts = self.config.apply_quality(profile);
        log::debug!("Quality {:?}: {} trees, {} rocks", profile, counts.trees, counts.rocks);
        counts
    }

    pub fn set_look_sensitivity(&mut self, sensitivity: f32) {
        self.config.look_sensitivity = if sensitivity.is_finite() {
            sensitivity.max(0.0)
        } else {
            1.0
        };
    }

    /// Write the current snapshot under [`SAVE_KEY`].
    pub fn save_to<S: SaveStore + ?Sized>(&self, store: &mut S, format: SaveFormat) -> SimResult<()> {
        let blob = encode_snapshot(&self.serialize_state(), format)?;
        store.set(SAVE_KEY, blob)?;
        log::debug!("Saved session under '{}'", SAVE_KEY);
        Ok(())
    }

    /// Resume from [`SAVE_KEY`] if a readable snapshot is there.
    ///
    /// Absent and undecodable saves leave the session untouched and are
    /// reported through [`LoadOutcome`], not as errors.
    pub fn load_from<S: SaveStore + ?Sized>(&mut self, store: &S) -> SimResult<LoadOutcome> {
        let Some(blob) = store.get(SAVE_KEY)? else {
            log::info!("No save under '{}'", SAVE_KEY);
            return Ok(LoadOutcome::NoSave);
        };
        let snapshot = match decode_snapshot(&blob) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("Failed to load save: {}", err);
                return Ok(LoadOutcome::Unreadable(err.to_string()));
            }
        };
        self.restore_state(&snapshot)?;
        Ok(LoadOutcome::Restored(snapshot))
    }

    pub fn delete_save<S: SaveStore + ?Sized>(&self, store: &mut S) -> SimResult<()> {
        store.delete(SAVE_KEY)?;
        Ok(())
    }

    /// Move the player directly, e.g. for scripted scenarios.
    pub fn place_player(&mut self, position: Vec2) {
        self.player.position = position;
    }

    /// Put the adversary at `position` in `behavior` and restart its retarget timer.
    pub fn place_adversary(&mut self, position: Vec2, behavior: BehaviorState) {
        self.adversary.position = position;
        self.adversary.behavior = behavior;
        self.adversary.decoy_visible = behavior == BehaviorState::Illusion;
        self.adversary.proximity = position.distance(&self.player.position);
        self.adversary.next_transition_time =
            self.clock.elapsed() + self.config.adversary.retarget_interval;
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn adversary(&self) -> &AdversaryState {
        &self.adversary
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    pub fn seed(&self) -> u32 {
        self.config.seed
    }

    /// Simulated seconds since the session (or last restore) started
    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Terminal outcome, once reported
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Replace non-finite saved fields with their defaults. `clamp` passes NaN
/// through, and binary or hand-built snapshots skip the lenient JSON repair.
fn finite_player(saved: &SavedPlayer) -> SavedPlayer {
    let defaults = SavedPlayer::default();
    let pick = |name: &str, value: f32, fallback: f32| {
        if value.is_finite() {
            value
        } else {
            log::warn!("Saved player {} is {}, using {}", name, value, fallback);
            fallback
        }
    };
    SavedPlayer {
        x: pick("x", saved.x, defaults.x),
        z: pick("z", saved.z, defaults.z),
        yaw: pick("yaw", saved.yaw, defaults.yaw),
        pitch: pick("pitch", saved.pitch, defaults.pitch),
        stamina: pick("stamina", saved.stamina, defaults.stamina),
        sanity: pick("sanity", saved.sanity, defaults.sanity),
        torch_on: saved.torch_on,
    }
}
