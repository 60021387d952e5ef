//! Player components: resources, orientation, movement mode and per-tick input.

use serde::{Deserialize, Serialize};

use super::Vec2;

/// Largest look delta accepted in a single tick, in input units (pixels).
pub const MAX_LOOK_DELTA: f32 = 2000.0;

/// How the player is moving. Sprint and crouch are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    #[default]
    Normal,
    Sprint,
    Crouch,
}

/// Everything about the player the simulation mutates each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vec2,
    pub yaw: f32,
    pub pitch: f32,
    /// 0.0 (exhausted) to 1.0 (rested)
    pub stamina: f32,
    /// 0.0 (broken) to 1.0 (calm)
    pub sanity: f32,
    pub torch_on: bool,
    pub mode: MovementMode,
    /// Sprint button state seen last tick, for press detection
    pub sprint_held: bool,
}

impl PlayerState {
    pub fn new(position: Vec2, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: 0.0,
            stamina: 1.0,
            sanity: 1.0,
            torch_on: false,
            mode: MovementMode::Normal,
            sprint_held: false,
        }
    }

    pub fn is_sprinting(&self) -> bool {
        self.mode == MovementMode::Sprint
    }

    pub fn is_crouching(&self) -> bool {
        self.mode == MovementMode::Crouch
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }
}

/// Input captured by the external controls for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Strafe component, -1 (left) to 1 (right)
    pub move_x: f32,
    /// Forward component, -1 (back) to 1 (forward)
    pub move_y: f32,
    /// Raw horizontal look delta accumulated since the last tick
    pub look_dx: f32,
    /// Raw vertical look delta accumulated since the last tick
    pub look_dy: f32,
    /// Sprint button currently held
    pub sprint: bool,
    /// Crouch button pressed this tick
    pub toggle_crouch: bool,
    /// Torch button pressed this tick
    pub toggle_torch: bool,
}

impl PlayerInput {
    /// Input with only a movement vector
    pub fn moving(move_x: f32, move_y: f32) -> Self {
        Self {
            move_x,
            move_y,
            ..Default::default()
        }
    }

    /// Input with only a look delta
    pub fn looking(look_dx: f32, look_dy: f32) -> Self {
        Self {
            look_dx,
            look_dy,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values instead of rejecting them.
    ///
    /// Non-finite values become zero, the move vector is kept inside the
    /// unit circle and look deltas are capped at [`MAX_LOOK_DELTA`].
    pub fn sanitized(&self) -> Self {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };

        let mut move_x = finite(self.move_x).clamp(-1.0, 1.0);
        let mut move_y = finite(self.move_y).clamp(-1.0, 1.0);
        let len = (move_x * move_x + move_y * move_y).sqrt();
        if len > 1.0 {
            move_x /= len;
            move_y /= len;
        }

        Self {
            move_x,
            move_y,
            look_dx: finite(self.look_dx).clamp(-MAX_LOOK_DELTA, MAX_LOOK_DELTA),
            look_dy: finite(self.look_dy).clamp(-MAX_LOOK_DELTA, MAX_LOOK_DELTA),
            ..*self
        }
    }

    pub fn move_length(&self) -> f32 {
        (self.move_x * self.move_x + self.move_y * self.move_y).sqrt()
    }
}
