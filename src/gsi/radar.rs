//! Radar View
//!
//! Positional projection of the canonical document: living players,
//! landed smokes and fire, and the bomb. Also collects every smoke
//! sighting for the detonation tracker.

use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

use crate::core::hash::PlayerId;
use crate::core::value::{as_i32, as_str};
use crate::core::vec3::Vec3;
use crate::gsi::filter::PlayerFilter;
use crate::gsi::side::Side;

/// Bomb state in which the bomb has no position of its own.
pub const BOMB_CARRIED: &str = "carried";

/// A player dot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadarPlayer {
    /// Stable id derived from the steam id.
    pub id: PlayerId,
    /// World position.
    pub position: Vec3,
    /// Horizontal forward vector (for yaw).
    pub forward: [f32; 2],
    /// Team side.
    pub side: Side,
    /// Spectator slot (0-9), -1 when unknown.
    pub observer_slot: i32,
    /// Always true: dead players are not emitted.
    pub alive: bool,
    /// Carries the C4.
    pub has_bomb: bool,
}

/// Kind of an area grenade drawn on the radar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrenadeKind {
    /// Landed smoke.
    Smoke,
    /// Molotov/incendiary fire (one entry per flame).
    Inferno,
}

/// A grenade marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadarGrenade {
    /// Grenade kind.
    pub kind: GrenadeKind,
    /// Side of the thrower, `Unknown` when the owner is not in `allplayers`.
    pub owner_side: Side,
    /// Smoke center or flame position.
    pub position: Vec3,
}

/// Bomb marker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarBomb {
    /// Whether `position` is meaningful.
    pub has_position: bool,
    /// World position.
    pub position: Vec3,
    /// Raw state: carried/dropped/planted/defusing/defused/exploded.
    pub state: String,
}

/// One report of a smoke grenade, airborne or landed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmokeSighting {
    /// Reported position.
    pub position: Vec3,
    /// Side of the thrower.
    pub owner_side: Side,
}

/// Complete radar snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarView {
    /// Living, positioned players.
    pub players: Vec<RadarPlayer>,
    /// Landed smokes and flames.
    pub grenades: Vec<RadarGrenade>,
    /// The bomb.
    pub bomb: RadarBomb,
    /// Every smoke with a position, fed to the detonation tracker.
    pub smoke_sightings: Vec<SmokeSighting>,
}

/// Build the radar view from a canonical document.
pub fn build_radar_view(doc: &Map<String, Value>, filter: &PlayerFilter) -> RadarView {
    let all_players = doc.get("allplayers").and_then(Value::as_object);

    let players = all_players
        .map(|all| {
            all.iter()
                .filter_map(|(steam_id, entry)| parse_player(steam_id, entry, filter))
                .collect()
        })
        .unwrap_or_default();

    let mut view = RadarView {
        players,
        bomb: parse_bomb(doc.get("bomb")),
        ..Default::default()
    };

    if let Some(grenades) = doc.get("grenades").and_then(Value::as_object) {
        for grenade in grenades.values().filter_map(Value::as_object) {
            collect_grenade(grenade, all_players, &mut view);
        }
    }

    view
}

fn parse_position(value: Option<&Value>) -> Option<Vec3> {
    as_str(value).and_then(Vec3::parse_csv)
}

fn parse_player(steam_id: &str, entry: &Value, filter: &PlayerFilter) -> Option<RadarPlayer> {
    let entry = entry.as_object()?;

    if filter.is_filtered(as_str(entry.get("name")).unwrap_or_default()) {
        return None;
    }

    let health = entry.get("state").and_then(|s| as_i32(s.get("health")));
    if health.is_some_and(|h| h <= 0) {
        return None;
    }

    let position = parse_position(entry.get("position"))?;
    let forward = parse_position(entry.get("forward")).unwrap_or(Vec3::ZERO);

    let has_bomb = entry
        .get("weapons")
        .and_then(Value::as_object)
        .is_some_and(|ws| ws.values().any(|w| as_str(w.get("type")) == Some("C4")));

    Some(RadarPlayer {
        id: PlayerId::from_steam_id(steam_id),
        position,
        forward: forward.xy(),
        side: Side::classify(entry.get("team")),
        observer_slot: as_i32(entry.get("observer_slot")).unwrap_or(-1),
        alive: true,
        has_bomb,
    })
}

/// Side of a grenade owner, looked up by steam id. `Unknown` unless the
/// owner is in `allplayers` with a string `team`.
fn owner_side(owner: Option<&Value>, all_players: Option<&Map<String, Value>>) -> Side {
    as_str(owner)
        .and_then(|steam_id| all_players?.get(steam_id))
        .and_then(|p| p.get("team"))
        .filter(|team| team.is_string())
        .map_or(Side::Unknown, |team| Side::classify(Some(team)))
}

fn collect_grenade(
    grenade: &Map<String, Value>,
    all_players: Option<&Map<String, Value>>,
    view: &mut RadarView,
) {
    let kind = as_str(grenade.get("type")).unwrap_or_default();
    let side = owner_side(grenade.get("owner"), all_players);

    match kind {
        "smoke" => {
            let Some(position) = parse_position(grenade.get("position")) else {
                return;
            };
            view.smoke_sightings.push(SmokeSighting { position, owner_side: side });

            let landed = parse_position(grenade.get("velocity")).is_some_and(Vec3::is_zero);
            if landed {
                view.grenades.push(RadarGrenade {
                    kind: GrenadeKind::Smoke,
                    owner_side: side,
                    position,
                });
            }
        }
        "inferno" => {
            let flames = grenade.get("flames").and_then(Value::as_object);
            let positions: Vec<Vec3> = match flames {
                Some(flames) => flames.values().filter_map(|f| parse_position(Some(f))).collect(),
                None => parse_position(grenade.get("position")).into_iter().collect(),
            };
            view.grenades.extend(positions.into_iter().map(|position| RadarGrenade {
                kind: GrenadeKind::Inferno,
                owner_side: side,
                position,
            }));
        }
        _ => {}
    }
}

fn parse_bomb(bomb: Option<&Value>) -> RadarBomb {
    let Some(b) = bomb.and_then(Value::as_object) else {
        return RadarBomb::default();
    };

    let state = as_str(b.get("state")).unwrap_or_default().to_string();
    let position = if state == BOMB_CARRIED {
        None
    } else {
        parse_position(b.get("position"))
    };

    RadarBomb {
        has_position: position.is_some(),
        position: position.unwrap_or_default(),
        state,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn sample() -> Map<String, Value> {
        doc(json!({
            "allplayers": {
                "1": {
                    "name": "Alive", "team": "CT", "observer_slot": 6,
                    "position": "100.00, 200.00, 10.00", "forward": "0.50, -0.86, 0.00",
                    "state": { "health": 80 }
                },
                "2": {
                    "name": "Dead", "team": "T", "observer_slot": 1,
                    "position": "1, 1, 1", "state": { "health": 0 }
                },
                "3": {
                    "name": "Carrier", "team": "TERRORIST", "observer_slot": 2,
                    "position": "-5, -5, 0",
                    "weapons": { "weapon_0": { "name": "weapon_c4", "type": "C4" } }
                },
                "4": { "name": "NoPos", "team": "CT", "position": "garbage" },
                "5": { "name": "COACH1", "team": "CT", "position": "0, 0, 0" },
                "6": { "name": "Coach10", "position": "9, 9, 9" }
            },
            "grenades": {
                "10": { "type": "smoke", "owner": "1", "position": "50, 60, 0", "velocity": "0.00, 0.00, 0.00" },
                "11": { "type": "smoke", "owner": "3", "position": "70, 80, 0", "velocity": "120.0, 3.0, -40.0" },
                "12": { "type": "inferno", "owner": "3",
                        "flames": { "f1": "1, 2, 3", "f2": "4, 5, 6", "f3": "bad" } },
                "13": { "type": "inferno", "owner": "999", "position": "7, 8, 9" },
                "14": { "type": "frag", "owner": "1", "position": "0, 0, 0", "velocity": "0, 0, 0" }
            },
            "bomb": { "state": "dropped", "position": "11, 22, 33" }
        }))
    }

    fn emitted_ids(view: &RadarView) -> Vec<PlayerId> {
        view.players.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_alive_positioned_players_only() {
        let view = build_radar_view(&sample(), &PlayerFilter::parse("Coach1, coach2"));
        let ids = emitted_ids(&view);

        assert!(ids.contains(&PlayerId::from_steam_id("1")));
        assert!(ids.contains(&PlayerId::from_steam_id("3")));
        assert!(!ids.contains(&PlayerId::from_steam_id("2")), "dead player emitted");
        assert!(!ids.contains(&PlayerId::from_steam_id("4")), "unpositioned player emitted");
        assert!(!ids.contains(&PlayerId::from_steam_id("5")), "filtered player emitted");
        assert!(ids.contains(&PlayerId::from_steam_id("6")), "prefix must not filter");
        assert_eq!(view.players.len(), 3);
    }

    #[test]
    fn test_player_fields() {
        let view = build_radar_view(&sample(), &PlayerFilter::new());
        let alive = view
            .players
            .iter()
            .find(|p| p.id == PlayerId::from_steam_id("1"))
            .unwrap();
        assert_eq!(alive.position, Vec3::new(100.0, 200.0, 10.0));
        assert_eq!(alive.forward, [0.5, -0.86]);
        assert_eq!(alive.side, Side::CT);
        assert_eq!(alive.observer_slot, 6);
        assert!(alive.alive);
        assert!(!alive.has_bomb);

        let carrier = view
            .players
            .iter()
            .find(|p| p.id == PlayerId::from_steam_id("3"))
            .unwrap();
        assert!(carrier.has_bomb);
        assert_eq!(carrier.side, Side::T);

        let no_team = view
            .players
            .iter()
            .find(|p| p.id == PlayerId::from_steam_id("6"))
            .unwrap();
        assert_eq!(no_team.side, Side::T);
        assert_eq!(no_team.observer_slot, -1);
    }

    #[test]
    fn test_only_landed_smokes_emitted() {
        let view = build_radar_view(&sample(), &PlayerFilter::new());
        let smokes: Vec<&RadarGrenade> = view
            .grenades
            .iter()
            .filter(|g| g.kind == GrenadeKind::Smoke)
            .collect();

        assert_eq!(smokes.len(), 1);
        assert_eq!(smokes[0].position, Vec3::new(50.0, 60.0, 0.0));
        assert_eq!(smokes[0].owner_side, Side::CT);

        // both smokes are sightings for the tracker
        assert_eq!(view.smoke_sightings.len(), 2);
    }

    #[test]
    fn test_inferno_one_entry_per_flame() {
        let view = build_radar_view(&sample(), &PlayerFilter::new());
        let fire: Vec<&RadarGrenade> = view
            .grenades
            .iter()
            .filter(|g| g.kind == GrenadeKind::Inferno)
            .collect();

        // two valid flames plus one flameless inferno
        assert_eq!(fire.len(), 3);
        assert!(fire.iter().any(|g| g.position == Vec3::new(1.0, 2.0, 3.0) && g.owner_side == Side::T));
        assert!(fire.iter().any(|g| g.position == Vec3::new(4.0, 5.0, 6.0)));
        assert!(fire
            .iter()
            .any(|g| g.position == Vec3::new(7.0, 8.0, 9.0) && g.owner_side == Side::Unknown));
    }

    #[test]
    fn test_owner_without_team_is_unknown() {
        let d = doc(json!({
            "allplayers": {
                "7": { "name": "teamless", "position": "0, 0, 0" },
                "8": { "name": "numeric", "team": 3, "position": "0, 0, 0" }
            },
            "grenades": {
                "20": { "type": "inferno", "owner": "7", "position": "1, 1, 1" },
                "21": { "type": "smoke", "owner": "8", "position": "2, 2, 2", "velocity": "0, 0, 0" }
            }
        }));
        let view = build_radar_view(&d, &PlayerFilter::new());

        assert_eq!(view.grenades.len(), 2);
        assert!(view.grenades.iter().all(|g| g.owner_side == Side::Unknown));
        assert_eq!(view.smoke_sightings[0].owner_side, Side::Unknown);

        // the player rows themselves still default to T
        assert!(view.players.iter().all(|p| p.side == Side::T));
    }

    #[test]
    fn test_other_grenades_ignored() {
        let view = build_radar_view(&sample(), &PlayerFilter::new());
        assert_eq!(view.grenades.len(), 4);
    }

    #[test]
    fn test_dropped_bomb_has_position() {
        let view = build_radar_view(&sample(), &PlayerFilter::new());
        assert!(view.bomb.has_position);
        assert_eq!(view.bomb.position, Vec3::new(11.0, 22.0, 33.0));
        assert_eq!(view.bomb.state, "dropped");
    }

    #[test]
    fn test_carried_bomb_has_no_position() {
        let d = doc(json!({ "bomb": { "state": "carried", "position": "11, 22, 33" } }));
        let view = build_radar_view(&d, &PlayerFilter::new());
        assert!(!view.bomb.has_position);
        assert_eq!(view.bomb.position, Vec3::ZERO);
        assert_eq!(view.bomb.state, "carried");
    }

    #[test]
    fn test_empty_document() {
        let view = build_radar_view(&Map::new(), &PlayerFilter::new());
        assert_eq!(view, RadarView::default());
    }
}
