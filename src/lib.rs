//! # GSI Relay
//!
//! Local ingestion service for Counter-Strike Game State Integration.
//! The game client POSTs JSON snapshots to `127.0.0.1:<port>/gsi`; the
//! service authenticates them, merges them into one canonical document
//! and republishes HUD and radar views after every accepted update.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          GSI RELAY                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  network/        - Ingestion (worker thread)                 │
//! │  ├── wire.rs     - HTTP/1.1 request reader                   │
//! │  ├── auth.rs     - Pre-shared token check                    │
//! │  ├── protocol.rs - Request validation, status responses      │
//! │  └── server.rs   - Accept loop, start/stop, consumer API     │
//! │                                                              │
//! │  gsi/            - Game state (behind one lock)              │
//! │  ├── store.rs    - Canonical document + heartbeat            │
//! │  ├── filter.rs   - Hidden player names                       │
//! │  ├── hud.rs      - HUD view builder                          │
//! │  ├── radar.rs    - Radar view builder                        │
//! │  ├── smoke.rs    - Smoke detonation tracker                  │
//! │  └── service.rs  - Merge + rebuild, snapshot accessors       │
//! │                                                              │
//! │  core/           - Vec3, stable ids, JSON coercion           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! A merge and the view rebuild that follows it happen under one lock.
//! Readers always get copies of a fully published state, never a view
//! built from a half-merged document.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod gsi;
pub mod network;

// Re-export commonly used types
pub use config::ServerConfig;
pub use core::{PlayerId, SmokeKey, Vec3};
pub use gsi::hud::{BombInfo, Color, HudPlayer, HudView, RoundInfo, Team, Weapon};
pub use gsi::radar::{GrenadeKind, RadarBomb, RadarGrenade, RadarPlayer, RadarView};
pub use gsi::smoke::{SmokePhase, SmokeStatus, SMOKE_DURATION};
pub use gsi::{PlayerFilter, Side};
pub use network::{IngestionServer, ServerError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default loopback port the game client is configured to push to.
pub const DEFAULT_PORT: u16 = 31983;
