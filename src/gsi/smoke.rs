//! Smoke Detonation Tracker
//!
//! GSI reports smokes at a low rate with noisy positions and no explicit
//! "popped" event. A smoke is considered detonated once it has stayed
//! put (within [`STATIONARY_DISTANCE`]) for [`STATIONARY_UPDATES`]
//! consecutive heartbeats. Entries are keyed by [`SmokeKey`] so float
//! jitter does not spawn duplicates.
//!
//! The tracker advances at most once per heartbeat: advancing again with
//! the same heartbeat is a no-op, so repeated rebuilds (e.g. on a filter
//! change) never double-count.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::hash::SmokeKey;
use crate::core::vec3::Vec3;
use crate::gsi::radar::SmokeSighting;
use crate::gsi::side::Side;

/// Movement below this (world units) counts as stationary.
pub const STATIONARY_DISTANCE: f32 = 1.0;

/// Consecutive stationary updates before a smoke is detonated.
pub const STATIONARY_UPDATES: u32 = 2;

/// How long a detonated smoke stays on screen.
pub const SMOKE_DURATION: Duration = Duration::from_secs(20);

/// Tracker state of one smoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmokePhase {
    /// Still moving, or not yet stationary long enough.
    Tracking {
        /// Consecutive stationary updates so far.
        stationary: u32,
    },
    /// Came to rest.
    Detonated {
        /// Wall-clock time of the transition.
        at: DateTime<Utc>,
    },
}

#[derive(Clone, Debug)]
struct SmokeEntry {
    position: Vec3,
    previous_position: Vec3,
    owner_side: Side,
    detonated_at: Option<DateTime<Utc>>,
    last_seen: u64,
    stationary_updates: u32,
}

impl SmokeEntry {
    fn phase(&self) -> SmokePhase {
        match self.detonated_at {
            Some(at) => SmokePhase::Detonated { at },
            None => SmokePhase::Tracking {
                stationary: self.stationary_updates,
            },
        }
    }
}

/// Read-only view of one tracked smoke.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmokeStatus {
    /// Spatial bucket.
    pub key: SmokeKey,
    /// Latest position.
    pub position: Vec3,
    /// Position at the previous heartbeat.
    pub previous_position: Vec3,
    /// Side of the thrower.
    pub owner_side: Side,
    /// Tracker state.
    pub phase: SmokePhase,
}

impl SmokeStatus {
    /// Whether the smoke has detonated.
    pub fn is_detonated(&self) -> bool {
        matches!(self.phase, SmokePhase::Detonated { .. })
    }

    /// Time left on the display countdown, `None` while still tracking.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let SmokePhase::Detonated { at } = self.phase else {
            return None;
        };
        let elapsed = (now - at).to_std().unwrap_or(Duration::ZERO);
        Some(SMOKE_DURATION.saturating_sub(elapsed))
    }
}

/// Per-bucket smoke state machine.
#[derive(Debug, Clone, Default)]
pub struct SmokeTracker {
    entries: BTreeMap<SmokeKey, SmokeEntry>,
    last_heartbeat: Option<u64>,
}

impl SmokeTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one heartbeat's smoke sightings.
    ///
    /// Returns `false` (and changes nothing) if this heartbeat was already
    /// applied. Entries not sighted in this heartbeat are dropped.
    pub fn advance(&mut self, heartbeat: u64, sightings: &[SmokeSighting], now: DateTime<Utc>) -> bool {
        if self.last_heartbeat == Some(heartbeat) {
            return false;
        }
        self.last_heartbeat = Some(heartbeat);

        for sighting in sightings {
            let key = SmokeKey::from_position(sighting.position);
            match self.entries.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(SmokeEntry {
                        position: sighting.position,
                        previous_position: sighting.position,
                        owner_side: sighting.owner_side,
                        detonated_at: None,
                        last_seen: heartbeat,
                        stationary_updates: 0,
                    });
                }
                // a second smoke in the same bucket this heartbeat: first wins
                Entry::Occupied(slot) if slot.get().last_seen == heartbeat => {}
                Entry::Occupied(mut slot) => {
                    let entry = slot.get_mut();
                    let moved = sighting.position.distance(entry.position);

                    entry.previous_position = entry.position;
                    entry.position = sighting.position;
                    entry.owner_side = sighting.owner_side;
                    entry.last_seen = heartbeat;

                    if moved < STATIONARY_DISTANCE {
                        entry.stationary_updates = entry.stationary_updates.saturating_add(1);
                        if entry.stationary_updates >= STATIONARY_UPDATES && entry.detonated_at.is_none() {
                            entry.detonated_at = Some(now);
                        }
                    } else {
                        entry.stationary_updates = 0;
                        entry.detonated_at = None;
                    }
                }
            }
        }

        self.entries.retain(|_, entry| entry.last_seen == heartbeat);
        true
    }

    /// Phase of one bucket.
    pub fn phase(&self, key: SmokeKey) -> Option<SmokePhase> {
        self.entries.get(&key).map(SmokeEntry::phase)
    }

    /// Snapshot of all tracked smokes, ordered by key.
    pub fn statuses(&self) -> Vec<SmokeStatus> {
        self.entries
            .iter()
            .map(|(key, entry)| SmokeStatus {
                key: *key,
                position: entry.position,
                previous_position: entry.previous_position,
                owner_side: entry.owner_side,
                phase: entry.phase(),
            })
            .collect()
    }

    /// Number of tracked smokes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
