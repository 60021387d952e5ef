//! Deterministic xorshift stream used for world layout and adversary decisions.
//!
//! The generator is a 32-bit xorshift (13, 17, 5). Every draw advances the
//! state and the unit value is the new state divided by 2^32, so a given
//! seed and call sequence always yields the same values on every platform.

use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// The world seed every session uses unless configured otherwise.
pub const DEFAULT_SEED: u32 = 1337;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Largest `f32` strictly below 1.0.
const MAX_UNIT_F32: f32 = 1.0 - f32::EPSILON / 2.0;

/// 32-bit xorshift generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Reset the stream. Reseeding with the same value replays the same sequence.
    pub fn set_seed(&mut self, seed: u32) {
        self.state = seed;
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    fn advance(&mut self) -> u32 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        self.state = s;
        s
    }

    /// Next value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.advance() as f64 / TWO_POW_32
    }

    /// Next value in [0, 1), narrowed to `f32`.
    pub fn next_f32(&mut self) -> f32 {
        unit(self)
    }
}

/// Draw a value in [0, 1) from any 32-bit source.
///
/// For [`Xorshift32`] this is exactly the new state divided by 2^32,
/// narrowed to `f32` without rounding up to 1.0.
pub fn unit<R: RngCore + ?Sized>(rng: &mut R) -> f32 {
    ((rng.next_u32() as f64 / TWO_POW_32) as f32).min(MAX_UNIT_F32)
}

/// Uniform value in [-extent, extent).
pub fn symmetric<R: RngCore + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    (unit(rng) * 2.0 - 1.0) * extent
}

/// Uniform value in [base, base + span).
pub fn span<R: RngCore + ?Sized>(rng: &mut R, base: f32, span: f32) -> f32 {
    base + unit(rng) * span
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for Xorshift32 {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.advance() as u64;
        let lo = self.advance() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Xorshift32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Derive an independent stream from a world seed.
///
/// Used for presentation cues so they never consume draws from the
/// stream that drives the adversary.
pub fn derived_stream(seed: u32, salt: u32) -> Xorshift32 {
    let mixed = (seed ^ salt).wrapping_mul(0x9E37_79B9).rotate_left(7);
    // Zero is a fixed point of xorshift.
    Xorshift32::new(if mixed == 0 { salt | 1 } else { mixed })
}
