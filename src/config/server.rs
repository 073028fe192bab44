/// Server configuration.
///
/// Scheduling constants are compile-time; network and credential settings
/// are read from the environment at startup.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Period of the global game loop (~60 Hz).
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// How long a disconnected slot is kept for its owner before it is vacated.
pub const RECONNECT_GRACE: Duration = Duration::from_secs(30);

/// How often the server pings each websocket.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// A websocket silent for this long is dropped.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of anonymous room ids, followed by a recyclable numeric suffix.
pub const ROOM_ID_PREFIX: &str = "room-";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;

/// Development fallback, shared with the credential service defaults.
pub const DEFAULT_JWT_SECRET: &str = "my-super-secret-key";

/// Runtime settings resolved from environment variables.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// JSON-lines file receiving finished match results, if set.
    pub match_log: Option<PathBuf>,
}

impl ServerSettings {
    /// Read `PONG_HOST`, `PONG_PORT`, `JWT_SECRET` and `PONG_MATCH_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PONG_PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("[Config] Invalid PONG_PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        Self {
            host: lookup("PONG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            match_log: lookup("PONG_MATCH_LOG")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        }
    }
}
