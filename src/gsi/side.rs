//! Team side classification shared by every view.

use serde::{Serialize, Deserialize};
use serde_json::Value;

/// Coarse team side.
///
/// Numeric values match the game's own team numbers (2 = T, 3 = CT).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Owner could not be resolved (grenades only).
    Unknown = 0,
    /// Terrorists
    #[default]
    T = 2,
    /// Counter-Terrorists
    CT = 3,
}

impl Side {
    /// Classify a player's `team` field.
    ///
    /// Only the exact string `"CT"` is counter-terrorist. Every other
    /// value, including a missing field, is T: there is no spectator
    /// bucket.
    pub fn classify(team: Option<&Value>) -> Side {
        match team.and_then(Value::as_str) {
            Some("CT") => Side::CT,
            _ => Side::T,
        }
    }

    /// Game team number (0, 2 or 3).
    #[inline]
    pub fn as_int(self) -> i32 {
        self as i32
    }
}
