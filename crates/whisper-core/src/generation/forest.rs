//! Forest generation - scatters trees, rocks and collectibles and places the gate.
//!
//! Every value comes from the supplied stream in a fixed order, so the
//! layout is a pure function of the seed and the [`WorldConfig`]:
//! - trees: x, z (rejected inside the spawn zone), rotation, scale
//! - rocks: x, z (rejected inside the spawn zone), elevation, scale, rotation
//! - collectibles: x, z, elevation
//! - gate: fixed, no draws

use std::f32::consts::TAU;

use rand::RngCore;

use super::GenerationError;
use crate::components::{EntityKind, PlacedEntity, Vec2, WorldLayout};
use crate::config::WorldConfig;
use crate::rng::{span, symmetric, unit, Xorshift32};

/// A freshly generated layout together with the stream that produced it.
///
/// The stream keeps running for the session: adversary decisions draw
/// from it after generation.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    pub layout: WorldLayout,
    pub rng: Xorshift32,
}

/// Reseed a stream to `seed` and generate the world from it.
pub fn generate_world(seed: u32, config: &WorldConfig) -> Result<GeneratedWorld, GenerationError> {
    let mut rng = Xorshift32::new(seed);
    if seed == 0 {
        log::warn!("World seed 0 is a fixed point of xorshift; every draw will be zero");
    }
    let layout = generate_forest(config, seed, &mut rng)?;
    log::info!(
        "Generated forest seed={} trees={} rocks={} collectibles={} fingerprint={:016x}",
        seed,
        config.tree_count,
        config.rock_count,
        config.collectible_count,
        layout.fingerprint()
    );
    Ok(GeneratedWorld { layout, rng })
}

/// Generate a layout from an already seeded stream.
pub fn generate_forest(
    config: &WorldConfig,
    seed: u32,
    rng: &mut impl RngCore,
) -> Result<WorldLayout, GenerationError> {
    validate(config)?;

    let bounds = config.bounds;
    let mut entities =
        Vec::with_capacity(config.tree_count + config.rock_count + config.collectible_count);

    for index in 0..config.tree_count {
        let position = place_outside_spawn(config, EntityKind::Tree, index, rng)?;
        let mut tree = PlacedEntity::new(EntityKind::Tree, position);
        tree.rotation = unit(rng) * TAU;
        tree.scale = span(rng, 0.8, 0.7);
        entities.push(tree);
    }

    for index in 0..config.rock_count {
        let position = place_outside_spawn(config, EntityKind::Rock, index, rng)?;
        let mut rock = PlacedEntity::new(EntityKind::Rock, position);
        rock.elevation = span(rng, 0.5, 0.8);
        rock.scale = span(rng, 0.8, 1.8);
        rock.rotation = unit(rng) * TAU;
        entities.push(rock);
    }

    let inset = bounds - config.collectible_margin;
    for _ in 0..config.collectible_count {
        let x = symmetric(rng, inset);
        let z = symmetric(rng, inset);
        let mut collectible = PlacedEntity::new(EntityKind::Collectible, Vec2::new(x, z));
        collectible.elevation = span(rng, 1.6, 0.5);
        entities.push(collectible);
    }

    let mut gate = PlacedEntity::new(EntityKind::Gate, config.gate_position());
    gate.elevation = config.gate_elevation;

    Ok(WorldLayout::new(seed, bounds, entities, gate))
}

fn validate(config: &WorldConfig) -> Result<(), GenerationError> {
    let bounds = config.bounds;
    if !(bounds.is_finite() && bounds > 0.0) {
        return Err(GenerationError::InvalidBounds(bounds));
    }
    let decorative = config.tree_count + config.rock_count;
    if decorative > 0 && config.spawn_exclusion_radius >= bounds {
        return Err(GenerationError::ExclusionCoversWorld {
            radius: config.spawn_exclusion_radius,
            bounds,
        });
    }
    let margin = config.collectible_margin;
    if !(margin.is_finite() && margin >= 0.0 && margin < bounds) {
        return Err(GenerationError::MarginCoversWorld { margin, bounds });
    }
    Ok(())
}

/// Rejection-sample a point in the world outside the spawn safe-zone.
fn place_outside_spawn(
    config: &WorldConfig,
    kind: EntityKind,
    index: usize,
    rng: &mut impl RngCore,
) -> Result<Vec2, GenerationError> {
    let attempts = config.max_placement_attempts;
    for _ in 0..attempts {
        let x = symmetric(rng, config.bounds);
        let z = symmetric(rng, config.bounds);
        let candidate = Vec2::new(x, z);
        if candidate.length() >= config.spawn_exclusion_radius {
            return Ok(candidate);
        }
    }
    Err(GenerationError::PlacementExhausted {
        kind,
        index,
        attempts,
    })
}
