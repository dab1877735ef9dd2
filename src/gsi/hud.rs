//! HUD View
//!
//! Scoreboard-style projection of the canonical document: two teams,
//! two slot-ordered player columns, round clock and bomb state.
//! Built fresh on every merge; never patched in place.

use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

use crate::core::hash::PlayerId;
use crate::core::value::{as_bool, as_f32_lenient, as_i32, as_str};
use crate::gsi::filter::PlayerFilter;
use crate::gsi::side::Side;

/// Slot used for an empty side when deciding left/right.
const EMPTY_SIDE_SLOT: i32 = 99;

// =============================================================================
// VIEW TYPES
// =============================================================================

/// RGBA display color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Terrorist team color.
    pub const T: Self = Self::rgb(219, 170, 98);
    /// Counter-terrorist team color.
    pub const CT: Self = Self::rgb(125, 168, 198);

    /// Opaque color from RGB.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Team color for a side.
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::CT => Self::CT,
            _ => Self::T,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One team's header record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Display name (fallback when GSI has none).
    pub name: String,
    /// Side this team plays.
    pub side: Side,
    /// Rounds won.
    pub score: i32,
    /// Tactical timeouts left.
    pub timeouts_left: i32,
    /// Display color.
    pub color: Color,
}

impl Default for Team {
    fn default() -> Self {
        Self {
            name: String::new(),
            side: Side::T,
            score: 0,
            timeouts_left: 0,
            color: Color::WHITE,
        }
    }
}

/// A weapon slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Name without the `weapon_` prefix (e.g. `ak47`).
    pub name: String,
    /// Rifles, SMGs, heavies.
    pub is_primary: bool,
    /// Pistols.
    pub is_secondary: bool,
    /// Any grenade.
    pub is_grenade: bool,
    /// The C4.
    pub is_bomb: bool,
    /// Currently held.
    pub is_active: bool,
    /// Rounds in the magazine, -1 when unknown.
    pub ammo_clip: i32,
    /// Reserve rounds, -1 when unknown.
    pub ammo_reserve: i32,
}

/// A player row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HudPlayer {
    /// Stable id derived from the steam id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Spectator slot (0-9), -1 when unknown.
    pub observer_slot: i32,
    /// Health above zero.
    pub is_alive: bool,
    /// The locally observed player.
    pub is_focused: bool,
    /// Team side.
    pub side: Side,
    /// Health points.
    pub health: i32,
    /// Armor points.
    pub armor: i32,
    /// Wears a helmet.
    pub has_helmet: bool,
    /// Carries a defuse kit.
    pub has_defuser: bool,
    /// Carries the C4.
    pub has_bomb: bool,
    /// Money.
    pub money: i32,
    /// Kills this match.
    pub kills: i32,
    /// Deaths this match.
    pub deaths: i32,
    /// Average damage per round (not reported by GSI, always 0).
    pub adr: i32,
    /// Primary weapon.
    pub primary: Option<Weapon>,
    /// Secondary weapon.
    pub secondary: Option<Weapon>,
    /// Best-effort active weapon.
    pub active: Option<Weapon>,
    /// Grenade keys: flashbang, smokegrenade, molotov, hegrenade, decoy.
    pub grenades: Vec<String>,
}

impl HudPlayer {
    fn new(id: PlayerId) -> Self {
        Self {
            id,
            name: String::new(),
            observer_slot: -1,
            is_alive: true,
            is_focused: false,
            side: Side::T,
            health: 100,
            armor: 0,
            has_helmet: false,
            has_defuser: false,
            has_bomb: false,
            money: 0,
            kills: 0,
            deaths: 0,
            adr: 0,
            primary: None,
            secondary: None,
            active: None,
            grenades: Vec::new(),
        }
    }
}

/// Round clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundInfo {
    /// 1-based round number.
    pub number: i32,
    /// Phase string (`live`, `freezetime`, `over`, ...).
    pub phase: String,
    /// Seconds until the phase ends.
    pub time_left: f32,
}

impl Default for RoundInfo {
    fn default() -> Self {
        Self {
            number: 1,
            phase: String::new(),
            time_left: 0.0,
        }
    }
}

/// Bomb status.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BombInfo {
    /// Planted or being defused.
    pub is_planted: bool,
    /// Being defused.
    pub is_defusing: bool,
    /// Countdown seconds (0 when unknown).
    pub countdown_secs: f32,
    /// Raw GSI state string.
    pub state: String,
}

/// Complete HUD snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HudView {
    /// Team drawn on the left.
    pub left_team: Team,
    /// Team drawn on the right.
    pub right_team: Team,
    /// Left column, ordered by observer slot.
    pub left_players: Vec<HudPlayer>,
    /// Right column, ordered by observer slot.
    pub right_players: Vec<HudPlayer>,
    /// Locally observed player, if any.
    pub focused_player_id: Option<PlayerId>,
    /// Round clock.
    pub round: RoundInfo,
    /// Bomb status.
    pub bomb: BombInfo,
}

// =============================================================================
// BUILDER
// =============================================================================

/// Build the HUD view from a canonical document.
///
/// A document without `map` yields `HudView::default()`.
pub fn build_hud_view(doc: &Map<String, Value>, filter: &PlayerFilter) -> HudView {
    let Some(map) = doc.get("map") else {
        return HudView::default();
    };

    let focused_steam_id = doc
        .get("player")
        .and_then(|p| as_str(p.get("steamid")));

    let t_team = parse_team(Side::T, map.get("team_t"));
    let ct_team = parse_team(Side::CT, map.get("team_ct"));

    let mut t_players = Vec::new();
    let mut ct_players = Vec::new();

    if let Some(all) = doc.get("allplayers").and_then(Value::as_object) {
        for (steam_id, entry) in all {
            let Some(player) = parse_player(steam_id, entry, focused_steam_id, filter) else {
                continue;
            };
            match player.side {
                Side::CT => ct_players.push(player),
                _ => t_players.push(player),
            }
        }
    }

    t_players.sort_by_key(|p| p.observer_slot);
    ct_players.sort_by_key(|p| p.observer_slot);

    let t_first = t_players.first().map_or(EMPTY_SIDE_SLOT, |p| p.observer_slot);
    let ct_first = ct_players.first().map_or(EMPTY_SIDE_SLOT, |p| p.observer_slot);

    let (left_team, right_team, left_players, right_players) = if t_first <= ct_first {
        (t_team, ct_team, t_players, ct_players)
    } else {
        (ct_team, t_team, ct_players, t_players)
    };

    let focused_player_id = left_players
        .iter()
        .chain(right_players.iter())
        .find(|p| p.is_focused)
        .map(|p| p.id);

    HudView {
        left_team,
        right_team,
        left_players,
        right_players,
        focused_player_id,
        round: parse_round(map, doc.get("phase_countdowns")),
        bomb: parse_bomb(doc.get("bomb")),
    }
}

fn team_fallback_name(side: Side) -> &'static str {
    match side {
        Side::CT => "Counter-Terrorists",
        _ => "Terrorists",
    }
}

fn parse_team(side: Side, team: Option<&Value>) -> Team {
    let name = as_str(team.and_then(|t| t.get("name")))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| team_fallback_name(side));

    Team {
        name: name.to_string(),
        side,
        score: as_i32(team.and_then(|t| t.get("score"))).unwrap_or(0),
        timeouts_left: as_i32(team.and_then(|t| t.get("timeouts_remaining"))).unwrap_or(0),
        color: Color::for_side(side),
    }
}

fn parse_player(
    steam_id: &str,
    entry: &Value,
    focused_steam_id: Option<&str>,
    filter: &PlayerFilter,
) -> Option<HudPlayer> {
    let entry = entry.as_object()?;

    let mut p = HudPlayer::new(PlayerId::from_steam_id(steam_id));
    p.name = as_str(entry.get("name")).unwrap_or_default().to_string();
    if filter.is_filtered(&p.name) {
        return None;
    }

    p.side = Side::classify(entry.get("team"));
    p.observer_slot = as_i32(entry.get("observer_slot")).unwrap_or(-1);
    p.is_focused = focused_steam_id == Some(steam_id);

    if let Some(stats) = entry.get("match_stats") {
        p.kills = as_i32(stats.get("kills")).unwrap_or(p.kills);
        p.deaths = as_i32(stats.get("deaths")).unwrap_or(p.deaths);
    }

    if let Some(state) = entry.get("state") {
        if let Some(health) = as_i32(state.get("health")) {
            p.health = health;
            p.is_alive = health > 0;
        }
        p.armor = as_i32(state.get("armor")).unwrap_or(p.armor);
        p.money = as_i32(state.get("money")).unwrap_or(p.money);
        p.has_helmet = as_bool(state.get("helmet")).unwrap_or(false);
        p.has_defuser = as_bool(state.get("defusekit")).unwrap_or(false);
    }

    if let Some(weapons) = entry.get("weapons").and_then(Value::as_object) {
        apply_weapons(&mut p, weapons);
    }

    Some(p)
}

/// Classify the weapon list into slots and pick the active weapon.
fn apply_weapons(p: &mut HudPlayer, weapons: &Map<String, Value>) {
    for w in weapons.values() {
        let kind = as_str(w.get("type")).unwrap_or_default();
        let raw_name = as_str(w.get("name")).unwrap_or_default();

        let mut weapon = Weapon {
            name: raw_name.strip_prefix("weapon_").unwrap_or(raw_name).to_string(),
            is_active: as_str(w.get("state")) == Some("active"),
            ammo_clip: as_i32(w.get("ammo_clip")).unwrap_or(-1),
            ammo_reserve: as_i32(w.get("ammo_reserve")).unwrap_or(-1),
            ..Default::default()
        };

        match kind {
            "Grenade" => {
                weapon.is_grenade = true;
                if let Some(key) = grenade_key(raw_name) {
                    p.grenades.push(key.to_string());
                }
            }
            "C4" => {
                weapon.is_bomb = true;
                p.has_bomb = true;
            }
            "Pistol" => {
                weapon.is_secondary = true;
                p.secondary = Some(weapon.clone());
            }
            "Knife" | "" => {}
            _ => {
                weapon.is_primary = true;
                p.primary = Some(weapon.clone());
            }
        }

        // grenades and the bomb have no ammo worth showing
        if weapon.is_active && !weapon.is_grenade && !weapon.is_bomb {
            p.active = Some(weapon);
        }
    }

    if p.active.is_none() {
        p.active = p.primary.clone().or_else(|| p.secondary.clone());
    }
}

fn grenade_key(weapon_name: &str) -> Option<&'static str> {
    match weapon_name {
        "weapon_flashbang" => Some("flashbang"),
        "weapon_smokegrenade" => Some("smokegrenade"),
        "weapon_incgrenade" | "weapon_molotov" => Some("molotov"),
        "weapon_hegrenade" => Some("hegrenade"),
        "weapon_decoy" => Some("decoy"),
        _ => None,
    }
}

fn parse_round(map: &Value, countdowns: Option<&Value>) -> RoundInfo {
    let mut round = RoundInfo::default();

    if let Some(n) = as_i32(map.get("round")) {
        round.number = n + 1;
    }

    if let Some(pc) = countdowns.filter(|v| v.is_object()) {
        if let Some(phase) = as_str(pc.get("phase")) {
            round.phase = phase.to_string();
        }
        if let Some(t) = as_f32_lenient(pc.get("phase_ends_in")) {
            round.time_left = t;
        }
    }

    round
}

fn parse_bomb(bomb: Option<&Value>) -> BombInfo {
    let Some(b) = bomb.filter(|v| v.is_object()) else {
        return BombInfo::default();
    };

    let state = as_str(b.get("state")).unwrap_or_default().to_string();
    BombInfo {
        is_planted: state == "planted" || state == "defusing",
        is_defusing: state == "defusing",
        countdown_secs: as_f32_lenient(b.get("countdown")).unwrap_or(0.0),
        state,
    }
}

// =============================================================================
// TESTS
// =============================================================================
