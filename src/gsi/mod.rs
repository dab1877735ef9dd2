//! Game state: canonical document, player filter, derived views and
//! the smoke tracker.

pub mod filter;
pub mod hud;
pub mod radar;
pub mod service;
pub mod side;
pub mod smoke;
pub mod store;

pub use filter::PlayerFilter;
pub use hud::{build_hud_view, HudView};
pub use radar::{build_radar_view, RadarView};
pub use service::Service;
pub use side::Side;
pub use smoke::{SmokePhase, SmokeStatus, SmokeTracker};
pub use store::CanonicalStateStore;
