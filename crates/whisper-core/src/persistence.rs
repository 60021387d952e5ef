//! Save/Load functionality for persisting session progress
//!
//! A snapshot holds the player's resources and pose, the collected set, the
//! gate flag and the world seed. The world itself is never stored: restoring
//! replays generation from the seed, which reproduces the layout exactly.
//!
//! Two encodings are supported:
//! - JSON text, decoded leniently: missing or malformed fields fall back to
//!   defaults instead of failing the load
//! - bincode binary with a version header, decoded strictly

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::QualityProfile;
use crate::rng::DEFAULT_SEED;

/// Storage key of the single save slot
pub const SAVE_KEY: &str = "forest_whisper_save_v1";

/// Version number for the binary format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Serialization error: {0}")]
    Binary(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Save is not a JSON object")]
    NotAnObject,
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Player fields carried by a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub x: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub stamina: f32,
    pub sanity: f32,
    pub torch_on: bool,
}

impl Default for SavedPlayer {
    fn default() -> Self {
        Self {
            x: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            stamina: 1.0,
            sanity: 1.0,
            torch_on: false,
        }
    }
}

/// Everything needed to resume a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    /// Collected collectible indices, ascending
    pub collected: Vec<usize>,
    pub player: SavedPlayer,
    pub gate_active: bool,
    /// The fixed world seed, not the live stream position
    pub seed: u32,
    /// Decorative preset the layout was generated with. `None` when the
    /// counts came from a custom configuration.
    pub quality: Option<QualityProfile>,
}

impl Default for SaveSnapshot {
    fn default() -> Self {
        Self {
            collected: Vec::new(),
            player: SavedPlayer::default(),
            gate_active: false,
            seed: DEFAULT_SEED,
            quality: None,
        }
    }
}

/// Serializable wrapper for the binary format
#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    snapshot: SaveSnapshot,
}

impl SaveSnapshot {
    pub fn to_json_string(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse JSON text. Fails only when the text is not a JSON object;
    /// individual fields are repaired by [`SaveSnapshot::from_json_value`].
    pub fn from_json_str(text: &str) -> Result<Self, PersistenceError> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(PersistenceError::NotAnObject);
        }
        Ok(Self::from_json_value(&value))
    }

    /// Build a snapshot from any JSON value, substituting defaults for
    /// missing or malformed fields. Accepts the legacy camelCase keys.
    pub fn from_json_value(value: &Value) -> Self {
        let defaults = SavedPlayer::default();
        let player = field(value, &["player"]);

        let collected = match field(value, &["collected", "collectedIndices"]) {
            Some(Value::Array(items)) => {
                let mut indices: Vec<usize> = items
                    .iter()
                    .filter_map(|item| {
                        let index = item.as_u64().and_then(|i| usize::try_from(i).ok());
                        if index.is_none() {
                            log::warn!("Dropping malformed collected index {}", item);
                        }
                        index
                    })
                    .collect();
                indices.sort_unstable();
                indices.dedup();
                indices
            }
            Some(other) => {
                log::warn!("Save field 'collected' is not an array ({}), using empty", other);
                Vec::new()
            }
            None => Vec::new(),
        };

        let player = SavedPlayer {
            x: number(player, &["x"], defaults.x),
            z: number(player, &["z"], defaults.z),
            yaw: number(player, &["yaw"], defaults.yaw),
            pitch: number(player, &["pitch"], defaults.pitch),
            stamina: number(player, &["stamina"], defaults.stamina).clamp(0.0, 1.0),
            sanity: number(player, &["sanity"], defaults.sanity).clamp(0.0, 1.0),
            torch_on: flag(player, &["torch_on", "torchOn"]),
        };

        let seed = match field(value, &["seed", "rngSeed"]) {
            Some(v) => match v.as_u64().and_then(|s| u32::try_from(s).ok()) {
                Some(seed) => seed,
                None => {
                    log::warn!("Save field 'seed' is malformed ({}), using {}", v, DEFAULT_SEED);
                    DEFAULT_SEED
                }
            },
            None => DEFAULT_SEED,
        };

        let quality = match field(value, &["quality"]) {
            None | Some(Value::Null) => None,
            Some(v) => match serde_json::from_value::<QualityProfile>(v.clone()) {
                Ok(profile) => Some(profile),
                Err(_) => {
                    log::warn!("Save field 'quality' is not a known profile ({}), ignoring", v);
                    None
                }
            },
        };

        Self {
            collected,
            player,
            gate_active: flag(Some(value), &["gate_active", "portalActive"]),
            seed,
            quality,
        }
    }

    /// Write the versioned binary form
    pub fn write_binary<W: Write>(&self, writer: W) -> Result<(), PersistenceError> {
        let data = SaveData {
            version: SAVE_VERSION,
            snapshot: self.clone(),
        };
        bincode::serialize_into(writer, &data)?;
        Ok(())
    }

    /// Read the versioned binary form
    pub fn read_binary<R: Read>(reader: R) -> Result<Self, PersistenceError> {
        let data: SaveData = bincode::deserialize_from(reader)?;
        if data.version != SAVE_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: SAVE_VERSION,
                found: data.version,
            });
        }
        Ok(data.snapshot)
    }
}

/// Storage encoding for a snapshot blob
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveFormat {
    #[default]
    Json,
    Binary,
}

/// Encode a snapshot into a storage blob
pub fn encode_snapshot(snapshot: &SaveSnapshot, format: SaveFormat) -> Result<Vec<u8>, PersistenceError> {
    match format {
        SaveFormat::Json => Ok(snapshot.to_json_string()?.into_bytes()),
        SaveFormat::Binary => {
            let mut buffer = Vec::new();
            snapshot.write_binary(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Decode a storage blob, detecting the format. JSON blobs start with `{`.
pub fn decode_snapshot(blob: &[u8]) -> Result<SaveSnapshot, PersistenceError> {
    let first = blob.iter().copied().find(|b| !b.is_ascii_whitespace());
    if first == Some(b'{') {
        let value: Value = serde_json::from_slice(blob)?;
        Ok(SaveSnapshot::from_json_value(&value))
    } else {
        SaveSnapshot::read_binary(blob)
    }
}

/// Opaque keyed blob storage supplied by the host
pub trait SaveStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;
    fn set(&mut self, key: &str, blob: Vec<u8>) -> Result<(), PersistenceError>;
    fn delete(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory store for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl SaveStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, blob: Vec<u8>) -> Result<(), PersistenceError> {
        self.blobs.insert(key.to_string(), blob);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// Result of trying to resume from storage
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A snapshot was found and applied
    Restored(SaveSnapshot),
    /// Nothing saved under the key; the session is untouched
    NoSave,
    /// A blob exists but cannot be decoded at all; the session is untouched
    Unreadable(String),
}

/// First present key among `names` in an object.
fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| value.get(*name))
}

fn number(object: Option<&Value>, names: &[&str], default: f32) -> f32 {
    let Some(raw) = object.and_then(|o| field(o, names)) else {
        return default;
    };
    match raw.as_f64().map(|v| v as f32) {
        Some(v) if v.is_finite() => v,
        _ => {
            log::warn!("Save field '{}' is malformed ({}), using {}", names[0], raw, default);
            default
        }
    }
}

fn flag(object: Option<&Value>, names: &[&str]) -> bool {
    match object.and_then(|o| field(o, names)) {
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            log::warn!("Save field '{}' is not a boolean ({}), using false", names[0], other);
            false
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveSnapshot {
        SaveSnapshot {
            collected: vec![0, 3],
            player: SavedPlayer {
                x: 12.5,
                z: -40.0,
                yaw: 1.25,
                pitch: -0.3,
                stamina: 0.4,
                sanity: 0.75,
                torch_on: true,
            },
            gate_active: false,
            seed: 1337,
            quality: Some(QualityProfile::High),
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let snapshot = sample();
        let text = snapshot.to_json_string().unwrap();
        assert_eq!(SaveSnapshot::from_json_str(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_missing_stamina_defaults_to_full() {
        let snapshot = SaveSnapshot::from_json_str(
            r#"{ "collected": [0, 2], "player": { "x": 3.0, "z": 4.0, "sanity": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(snapshot.collected, vec![0, 2]);
        assert_eq!(snapshot.player.stamina, 1.0);
        assert_eq!(snapshot.player.sanity, 0.5);
        assert!(!snapshot.player.torch_on);
        assert_eq!(snapshot.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_malformed_fields_are_repaired() {
        let snapshot = SaveSnapshot::from_json_str(
            r#"{
                "collected": [1, "two", -3, 1, 4.5, 0],
                "player": { "x": "far", "stamina": null, "sanity": 7.0, "torch_on": 1 },
                "gate_active": "yes",
                "seed": -5,
                "quality": "ultra"
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.collected, vec![0, 1]);
        assert_eq!(snapshot.player.x, 0.0);
        assert_eq!(snapshot.player.stamina, 1.0);
        assert_eq!(snapshot.player.sanity, 1.0);
        assert!(!snapshot.player.torch_on);
        assert!(!snapshot.gate_active);
        assert_eq!(snapshot.seed, DEFAULT_SEED);
        assert_eq!(snapshot.quality, None);
    }

    #[test]
    fn test_legacy_keys_accepted() {
        let snapshot = SaveSnapshot::from_json_str(
            r#"{ "collected": [4], "player": { "torchOn": true, "yaw": 3.1 },
                 "portalActive": true, "rngSeed": 1337 }"#,
        )
        .unwrap();
        assert!(snapshot.player.torch_on);
        assert!(snapshot.gate_active);
        assert_eq!(snapshot.player.yaw, 3.1);
    }

    #[test]
    fn test_non_object_is_error() {
        assert!(matches!(
            SaveSnapshot::from_json_str("[1, 2]"),
            Err(PersistenceError::NotAnObject)
        ));
        assert!(matches!(
            SaveSnapshot::from_json_str("{ nope"),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn test_binary_roundtrip_and_detection() {
        let snapshot = sample();
        let blob = encode_snapshot(&snapshot, SaveFormat::Binary).unwrap();
        assert_eq!(decode_snapshot(&blob).unwrap(), snapshot);

        let text = encode_snapshot(&snapshot, SaveFormat::Json).unwrap();
        assert_eq!(decode_snapshot(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_binary_version_mismatch() {
        let data = SaveData {
            version: SAVE_VERSION + 1,
            snapshot: sample(),
        };
        let blob = bincode::serialize(&data).unwrap();
        assert!(matches!(
            SaveSnapshot::read_binary(&blob[..]),
            Err(PersistenceError::VersionMismatch { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(SAVE_KEY).unwrap(), None);
        store.set(SAVE_KEY, b"{}".to_vec()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(SAVE_KEY).unwrap(), Some(b"{}".to_vec()));
        store.delete(SAVE_KEY).unwrap();
        assert!(store.is_empty());
    }
}
