//! Player system - orientation, movement, stamina and sanity.
//!
//! Per tick, in order:
//! 1. Button actions (torch, crouch, sprint press/release)
//! 2. Yaw/pitch from look deltas
//! 3. Velocity from the move vector rotated by yaw, speed by mode
//! 4. Integrate, clamp to the inner boundary, push out of the spawn zone
//! 5. Stamina drain/recovery and the sprint cut-off
//! 6. Sanity drain from last tick's adversary proximity, constant recovery

use std::f32::consts::TAU;

use crate::components::{MovementMode, PlayerInput, PlayerState, Vec2, FAR_PROXIMITY};
use crate::config::PlayerTuning;

/// Per-tick values the player system reads but does not own
#[derive(Debug, Clone, Copy)]
pub struct PlayerEnv {
    pub dt: f32,
    /// Adversary distance computed on the previous tick
    pub adversary_proximity: f32,
    pub look_sensitivity: f32,
    /// World half-extent
    pub bounds: f32,
}

/// What the player system produced this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStep {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Whether the move input was outside the dead-zone
    pub moving: bool,
    pub stamina: f32,
    pub sanity: f32,
}

/// Advance the player one tick. `input` is expected to be sanitized.
pub fn update_player(
    player: &mut PlayerState,
    input: &PlayerInput,
    env: &PlayerEnv,
    tuning: &PlayerTuning,
) -> PlayerStep {
    apply_actions(player, input, tuning);

    // Orientation
    let sensitivity = env.look_sensitivity.max(0.0);
    player.yaw = (player.yaw - input.look_dx * tuning.yaw_scale * sensitivity).rem_euclid(TAU);
    player.pitch = (player.pitch - input.look_dy * tuning.pitch_scale * sensitivity)
        .clamp(-tuning.pitch_limit, tuning.pitch_limit);

    // Movement
    let move_len = input.move_length();
    let moving = move_len > tuning.move_deadzone;
    let (forward, strafe) = if moving {
        (input.move_y, input.move_x)
    } else {
        (0.0, 0.0)
    };
    let (sin, cos) = player.yaw.sin_cos();
    let direction = Vec2::new(forward * sin + strafe * cos, forward * cos - strafe * sin);
    let velocity = direction * movement_speed(player, tuning);

    let mut position = player.position + velocity * env.dt;
    let limit = (env.bounds - tuning.boundary_margin).max(0.0);
    position.x = position.x.clamp(-limit, limit);
    position.z = position.z.clamp(-limit, limit);
    player.position = repel_from_spawn(position, tuning);

    update_stamina(player, moving, env.dt, tuning);
    update_sanity(player, env.adversary_proximity, env.dt, tuning);

    PlayerStep {
        position: player.position,
        velocity,
        moving,
        stamina: player.stamina,
        sanity: player.sanity,
    }
}

/// Torch and crouch toggles, sprint press/release.
fn apply_actions(player: &mut PlayerState, input: &PlayerInput, tuning: &PlayerTuning) {
    if input.toggle_torch {
        player.torch_on = !player.torch_on;
    }

    if input.toggle_crouch {
        player.mode = if player.is_crouching() {
            MovementMode::Normal
        } else {
            MovementMode::Crouch
        };
    }

    let pressed = input.sprint && !player.sprint_held;
    let released = !input.sprint && player.sprint_held;
    if pressed
        && !player.is_crouching()
        && player.stamina > tuning.sprint_start_min_stamina
    {
        player.mode = MovementMode::Sprint;
    } else if released && player.is_sprinting() {
        player.mode = MovementMode::Normal;
    }
    player.sprint_held = input.sprint;
}

fn movement_speed(player: &PlayerState, tuning: &PlayerTuning) -> f32 {
    match player.mode {
        MovementMode::Crouch => tuning.crouch_speed,
        MovementMode::Sprint if player.stamina > tuning.sprint_speed_min_stamina => {
            tuning.sprint_speed
        }
        _ => tuning.walk_speed,
    }
}

/// Soft push away from the origin, proportional to how deep inside the zone we are.
fn repel_from_spawn(position: Vec2, tuning: &PlayerTuning) -> Vec2 {
    let d = position.length();
    if d < tuning.repulsion_radius && d > 0.0001 {
        let push = (tuning.repulsion_radius - d) * tuning.repulsion_factor;
        position + position * (push / d)
    } else {
        position
    }
}

fn update_stamina(player: &mut PlayerState, moving: bool, dt: f32, tuning: &PlayerTuning) {
    if player.is_sprinting() && moving {
        player.stamina -= dt * tuning.stamina_drain;
    } else {
        player.stamina += dt * tuning.stamina_recovery;
    }
    player.stamina = player.stamina.clamp(0.0, 1.0);
    if player.stamina <= tuning.sprint_cutoff_stamina && player.is_sprinting() {
        player.mode = MovementMode::Normal;
    }
}

/// Closer adversary drains faster; the torch dampens the drain.
fn update_sanity(player: &mut PlayerState, proximity: f32, dt: f32, tuning: &PlayerTuning) {
    let proximity = if proximity.is_finite() {
        proximity
    } else {
        FAR_PROXIMITY
    };
    let fear = (1.0 - proximity / tuning.fear_distance).max(0.0);
    let mitigation = if player.torch_on {
        tuning.torch_mitigation
    } else {
        1.0
    };
    player.sanity -= dt * fear * tuning.sanity_drain * mitigation;
    player.sanity += dt * tuning.sanity_recovery;
    player.sanity = player.sanity.clamp(0.0, 1.0);
}
