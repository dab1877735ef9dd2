//! Server Configuration
//!
//! Everything the ingestion server needs to start, loadable from the
//! environment:
//!
//! | Variable               | Default            |
//! |------------------------|--------------------|
//! | `GSI_PORT`             | `31983`            |
//! | `GSI_AUTH_TOKEN`       | compiled-in token  |
//! | `GSI_FILTERED_PLAYERS` | empty              |

use std::time::Duration;

use tracing::warn;

use crate::network::auth::AuthConfig;
use crate::network::wire::MAX_REQUEST_BYTES;
use crate::DEFAULT_PORT;

/// Default wait on a single accept before the stop flag is rechecked.
pub const DEFAULT_ACCEPT_POLL: Duration = Duration::from_millis(200);


/// Ingestion server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Loopback port to listen on. `0` picks an ephemeral port.
    pub port: u16,
    /// Expected `auth.token`.
    pub auth: AuthConfig,
    /// Comma-separated player names hidden from both views.
    pub filtered_players: String,
    /// Bounded accept wait.
    pub accept_poll: Duration,
    /// When set, a connection that has not delivered a whole request by
    /// then is dropped. Off by default: a stalled client holds the worker.
    pub read_timeout: Option<Duration>,
    /// Cap on the header block and on the declared body length.
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth: AuthConfig::default(),
            filtered_players: String::new(),
            accept_poll: DEFAULT_ACCEPT_POLL,
            read_timeout: None,
            max_request_bytes: MAX_REQUEST_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment. Invalid values fall back to the
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok());
        config.auth = AuthConfig::from_env();
        config
    }

    /// Load the port and filter through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("GSI_PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(e) => warn!(value = %raw, error = %e, "invalid GSI_PORT, using {}", DEFAULT_PORT),
            }
        }
        if let Some(players) = lookup("GSI_FILTERED_PLAYERS") {
            config.filtered_players = players;
        }

        config
    }

    /// Builder-style port override.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder-style token override.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthConfig::new(token);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
