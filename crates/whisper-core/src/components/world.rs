//! World layout components: placed decorative and gameplay entities.

use serde::{Deserialize, Serialize};

use super::Vec2;

/// Kind of a placed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Tree,
    Rock,
    Collectible,
    Gate,
}

impl EntityKind {
    pub fn is_decorative(self) -> bool {
        matches!(self, EntityKind::Tree | EntityKind::Rock)
    }
}

/// One entity placed by world generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub kind: EntityKind,
    pub position: Vec2,
    /// Height above the ground plane
    pub elevation: f32,
    /// Rotation about the vertical axis, radians
    pub rotation: f32,
    pub scale: f32,
    /// Collected collectibles are hidden; everything else stays visible
    pub visible: bool,
}

impl PlacedEntity {
    pub fn new(kind: EntityKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            elevation: 0.0,
            rotation: 0.0,
            scale: 1.0,
            visible: true,
        }
    }
}

/// Ordered result of one generation pass: trees, rocks, collectibles, gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldLayout {
    pub seed: u32,
    pub bounds: f32,
    entities: Vec<PlacedEntity>,
    /// Slot in `entities` of each collectible, by collectible index
    collectible_slots: Vec<usize>,
    gate_slot: usize,
}

impl WorldLayout {
    /// Assemble a layout. The gate is appended last.
    pub fn new(seed: u32, bounds: f32, mut entities: Vec<PlacedEntity>, gate: PlacedEntity) -> Self {
        let collectible_slots = entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind == EntityKind::Collectible)
            .map(|(slot, _)| slot)
            .collect();
        let gate_slot = entities.len();
        entities.push(gate);
        Self {
            seed,
            bounds,
            entities,
            collectible_slots,
            gate_slot,
        }
    }

    pub fn entities(&self) -> &[PlacedEntity] {
        &self.entities
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    pub fn collectible_count(&self) -> usize {
        self.collectible_slots.len()
    }

    /// Collectibles in index order
    pub fn collectibles(&self) -> impl Iterator<Item = (usize, &PlacedEntity)> + '_ {
        self.collectible_slots
            .iter()
            .enumerate()
            .map(|(index, &slot)| (index, &self.entities[slot]))
    }

    pub fn collectible(&self, index: usize) -> Option<&PlacedEntity> {
        self.collectible_slots
            .get(index)
            .map(|&slot| &self.entities[slot])
    }

    pub fn collectible_position(&self, index: usize) -> Option<Vec2> {
        self.collectible(index).map(|e| e.position)
    }

    /// Hide or show a collectible; other entities never change after generation.
    pub fn set_collectible_visible(&mut self, index: usize, visible: bool) {
        if let Some(&slot) = self.collectible_slots.get(index) {
            self.entities[slot].visible = visible;
        }
    }

    /// Indices of collectibles still visible in the world
    pub fn visible_collectibles(&self) -> Vec<usize> {
        self.collectibles()
            .filter(|(_, e)| e.visible)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn gate(&self) -> &PlacedEntity {
        &self.entities[self.gate_slot]
    }

    /// Stable hash over every placed value's bit pattern.
    ///
    /// Two layouts with equal fingerprints were produced by the same
    /// seed and parameters; handy for logging and harness output.
    pub fn fingerprint(&self) -> u64 {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = FNV_OFFSET;
        let mut mix = |word: u32| {
            for byte in word.to_le_bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(FNV_PRIME);
            }
        };

        mix(self.seed);
        mix(self.bounds.to_bits());
        for e in &self.entities {
            mix(e.kind as u32);
            mix(e.position.x.to_bits());
            mix(e.position.z.to_bits());
            mix(e.elevation.to_bits());
            mix(e.rotation.to_bits());
            mix(e.scale.to_bits());
        }
        hash
    }
}
