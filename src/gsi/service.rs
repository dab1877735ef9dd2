//! Ingestion Service State
//!
//! One object owns everything shared between the ingestion worker and
//! the consumers: canonical document, heartbeat, player filter, the
//! published views and the smoke tracker. All of it sits behind a single
//! mutex, so a merge and the view rebuild that follows it are one
//! critical section and no reader ever sees a half-applied update.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use crate::gsi::filter::PlayerFilter;
use crate::gsi::hud::{build_hud_view, HudView};
use crate::gsi::radar::{build_radar_view, RadarBomb, RadarGrenade, RadarPlayer, RadarView};
use crate::gsi::smoke::{SmokeStatus, SmokeTracker};
use crate::gsi::store::CanonicalStateStore;

/// Unlocked service state.
#[derive(Debug, Default)]
pub struct ServiceState {
    store: CanonicalStateStore,
    filter: PlayerFilter,
    hud: HudView,
    radar: RadarView,
    smokes: SmokeTracker,
}

impl ServiceState {
    /// Create state with an initial player filter.
    pub fn new(filter: PlayerFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Merge a validated payload and republish every view.
    ///
    /// Returns the new heartbeat.
    pub fn ingest(&mut self, payload: Map<String, Value>) -> u64 {
        #[cfg(feature = "debug-tracing")]
        debug!(keys = ?payload.keys().collect::<Vec<_>>(), "merging payload");

        let heartbeat = self.store.merge(payload);
        self.rebuild();
        heartbeat
    }

    /// Replace the player filter and rebuild the views from the current
    /// document. The smoke tracker is not advanced (same heartbeat).
    pub fn set_filtered_players(&mut self, list: &str) {
        self.filter.set(list);
        if self.store.has_data() {
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        let doc = self.store.document();
        self.hud = build_hud_view(doc, &self.filter);
        self.radar = build_radar_view(doc, &self.filter);

        let heartbeat = self.store.heartbeat();
        if self.smokes.advance(heartbeat, &self.radar.smoke_sightings, Utc::now()) {
            debug!(heartbeat, smokes = self.smokes.len(), "smoke tracker advanced");
        }
    }

    /// Current heartbeat.
    pub fn heartbeat(&self) -> u64 {
        self.store.heartbeat()
    }

    /// Deep copy of the canonical document, `None` before the first merge.
    pub fn snapshot(&self) -> Option<Value> {
        self.store.has_data().then(|| self.store.snapshot())
    }

    /// Published HUD view.
    pub fn hud_view(&self) -> Option<&HudView> {
        self.store.has_data().then_some(&self.hud)
    }

    /// Published radar view.
    pub fn radar_view(&self) -> Option<&RadarView> {
        self.store.has_data().then_some(&self.radar)
    }

    /// Tracked smokes.
    pub fn smokes(&self) -> Option<Vec<SmokeStatus>> {
        self.store.has_data().then(|| self.smokes.statuses())
    }

    /// `map.name` of the canonical document.
    pub fn map_name(&self) -> Option<String> {
        self.store
            .document()
            .get("map")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Thread-safe handle over [`ServiceState`].
///
/// Every accessor copies out under the lock; callers never hold it.
#[derive(Debug, Default)]
pub struct Service {
    state: Mutex<ServiceState>,
}

impl Service {
    /// Create a service with an initial player filter.
    pub fn new(filter: PlayerFilter) -> Self {
        Self {
            state: Mutex::new(ServiceState::new(filter)),
        }
    }

    /// Lock the state. A poisoned lock is recovered: every mutation leaves
    /// the state structurally valid.
    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge a validated payload and republish every view.
    pub fn ingest(&self, payload: Map<String, Value>) -> u64 {
        self.lock().ingest(payload)
    }

    /// Replace the player filter (`"name1, name2"`).
    pub fn set_filtered_players(&self, list: &str) {
        self.lock().set_filtered_players(list);
    }

    /// Current heartbeat.
    pub fn heartbeat(&self) -> u64 {
        self.lock().heartbeat()
    }

    /// Deep copy of the canonical document.
    pub fn snapshot(&self) -> Option<Value> {
        self.lock().snapshot()
    }

    /// Copy of the HUD view.
    pub fn try_get_hud_view(&self) -> Option<HudView> {
        self.lock().hud_view().cloned()
    }

    /// Copy of the radar players.
    pub fn try_get_radar_players(&self) -> Option<Vec<RadarPlayer>> {
        self.lock().radar_view().map(|r| r.players.clone())
    }

    /// Copy of the radar grenades.
    pub fn try_get_radar_grenades(&self) -> Option<Vec<RadarGrenade>> {
        self.lock().radar_view().map(|r| r.grenades.clone())
    }

    /// Copy of the radar bomb.
    pub fn try_get_radar_bomb(&self) -> Option<RadarBomb> {
        self.lock().radar_view().map(|r| r.bomb.clone())
    }

    /// Copy of the whole radar view.
    pub fn try_get_radar_view(&self) -> Option<RadarView> {
        self.lock().radar_view().cloned()
    }

    /// Tracked smokes.
    pub fn try_get_smokes(&self) -> Option<Vec<SmokeStatus>> {
        self.lock().smokes()
    }

    /// Current map name.
    pub fn try_get_map_name(&self) -> Option<String> {
        self.lock().map_name()
    }
}

// =============================================================================
// TESTS
// =============================================================================
