//! Identity Hashing
//!
//! Provides the two hashes the derived views key on:
//! - Stable player ids derived from GSI steam ids
//! - Coarse spatial keys that de-duplicate near-identical smoke positions

use std::fmt;
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use super::vec3::Vec3;

/// Domain separator for player id derivation.
const PLAYER_ID_DOMAIN: &[u8] = b"gsi-relay-player:";

/// Bucket edge length (world units) of the smoke spatial hash.
pub const SMOKE_BUCKET_SIZE: f32 = 10.0;

/// Stable player identifier.
///
/// Derived from the steam id key of `allplayers`, so the same player gets
/// the same id in every view and across restarts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub i32);

impl PlayerId {
    /// Derive a player id from a steam id string.
    pub fn from_steam_id(steam_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(PLAYER_ID_DOMAIN);
        hasher.update(steam_id.as_bytes());
        let hash = hasher.finalize();

        let mut id = [0u8; 4];
        id.copy_from_slice(&hash[..4]);
        Self(i32::from_le_bytes(id))
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", hex::encode(self.0.to_le_bytes()))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0.to_le_bytes()))
    }
}

/// Bits per axis in a packed [`SmokeKey`].
const CELL_BITS: u32 = 21;

const CELL_MASK: i64 = (1 << CELL_BITS) - 1;

/// Spatial hash bucket of a smoke position.
///
/// Each coordinate is divided by [`SMOKE_BUCKET_SIZE`] and truncated toward
/// zero, then the three cell indices are packed into one integer, 21 bits
/// each. Distinct cells never share a key while every cell index lies in
/// `-2^20..2^20`, i.e. within ten million units of the origin. Float noise
/// between GSI updates lands in the same bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SmokeKey(pub i64);

impl SmokeKey {
    /// Compute the bucket key of a world position.
    pub fn from_position(pos: Vec3) -> Self {
        let cell = |v: f32| (v / SMOKE_BUCKET_SIZE) as i32 as i64 & CELL_MASK;
        let (cx, cy, cz) = (cell(pos.x), cell(pos.y), cell(pos.z));

        Self(cx << (2 * CELL_BITS) | cy << CELL_BITS | cz)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_determinism() {
        let id1 = PlayerId::from_steam_id("76561198000000001");
        let id2 = PlayerId::from_steam_id("76561198000000001");
        assert_eq!(id1, id2);

        let other = PlayerId::from_steam_id("76561198000000002");
        assert_ne!(id1, other);
    }

    #[test]
    fn test_player_id_display_is_hex() {
        let id = PlayerId(0x0403_0201);
        assert_eq!(id.to_string(), "01020304");
    }

    #[test]
    fn test_smoke_key_absorbs_float_noise() {
        let a = SmokeKey::from_position(Vec3::new(100.0, 100.0, 50.0));
        let b = SmokeKey::from_position(Vec3::new(100.2, 100.1, 50.0));
        let c = SmokeKey::from_position(Vec3::new(109.9, 109.9, 59.9));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_smoke_key_separates_buckets() {
        let a = SmokeKey::from_position(Vec3::new(100.0, 100.0, 50.0));
        let b = SmokeKey::from_position(Vec3::new(500.0, 500.0, 50.0));
        let c = SmokeKey::from_position(Vec3::new(110.0, 100.0, 50.0));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_smoke_key_mirrored_cells_differ() {
        // cells (-60, -1, 5) and (-60, 1, -5)
        let a = SmokeKey::from_position(Vec3::new(-605.0, -15.0, 55.0));
        let b = SmokeKey::from_position(Vec3::new(-605.0, 15.0, -55.0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_smoke_key_unique_over_map_range() {
        let mut seen = std::collections::BTreeSet::new();
        for x in -8..8 {
            for y in -8..8 {
                for z in -8..8 {
                    let pos = Vec3::new(x as f32 * 150.0 + 5.0, y as f32 * 150.0 + 5.0, z as f32 * 15.0 + 5.0);
                    assert!(seen.insert(SmokeKey::from_position(pos)), "collision at {:?}", pos);
                }
            }
        }
    }

    #[test]
    fn test_smoke_key_truncates_toward_zero() {
        // -9.9 / 10 truncates to 0, same cell as +9.9
        let neg = SmokeKey::from_position(Vec3::new(-9.9, 0.0, 0.0));
        let pos = SmokeKey::from_position(Vec3::new(9.9, 0.0, 0.0));
        assert_eq!(neg, pos);
    }
}
