use rollcall_core::{MatchPolicy, SessionConfig, DEFAULT_MATCH_THRESHOLD};
use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database holding known faces and attendance.
    pub db_path: PathBuf,
    /// Euclidean distance below which a known face matches.
    pub match_threshold: f32,
    /// Which registry entry wins when several qualify.
    pub match_policy: MatchPolicy,
    /// External embedder command; `None` means frames are precomputed descriptors.
    pub pipeline_command: Option<String>,
    /// Upper bound on one run of the external embedder.
    pub pipeline_timeout: Duration,
    /// Serve on the system bus instead of the session bus.
    pub system_bus: bool,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("rollcall");

        let db_path = std::env::var("ROLLCALL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("attendance.db"));

        Self {
            db_path,
            match_threshold: env_parse("ROLLCALL_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD),
            match_policy: env_parse("ROLLCALL_MATCH_POLICY", MatchPolicy::default()),
            pipeline_command: std::env::var("ROLLCALL_PIPELINE_CMD")
                .ok()
                .filter(|cmd| !cmd.trim().is_empty()),
            pipeline_timeout: Duration::from_secs(env_parse("ROLLCALL_PIPELINE_TIMEOUT_SECS", 10)),
            system_bus: std::env::var("ROLLCALL_SYSTEM_BUS")
                .map(|v| v != "0")
                .unwrap_or(false),
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            threshold: self.match_threshold,
            policy: self.match_policy,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok().as_deref(), default)
}

fn parse_or<T: std::str::FromStr>(value: Option<&str>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
