use std::str::FromStr;
use std::time::Duration;

use crate::engine::types::Difficulty;

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Difficulty used when a request does not name one.
    pub default_difficulty: Difficulty,
    /// How long to wait for the search oracle, in milliseconds.
    pub ai_timeout_ms: u64,
    /// Artificial pause before a computer move is shown, in milliseconds.
    pub think_delay_ms: u64,
    /// Path to a UCI engine binary. `None` runs without an oracle.
    pub engine_path: Option<String>,
    /// Seconds per side for new games; 0 means untimed.
    pub clock_seconds: u32,
    pub max_hints: u32,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();

        AppConfig {
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            host: lookup("HOST").unwrap_or(defaults.host),
            default_difficulty: lookup("CHESS_AI_DEFAULT_DIFFICULTY")
                .and_then(|v| Difficulty::from_str_loose(v.trim()))
                .unwrap_or(defaults.default_difficulty),
            ai_timeout_ms: parse_var(&lookup, "CHESS_AI_TIMEOUT")
                .unwrap_or(defaults.ai_timeout_ms),
            think_delay_ms: parse_var(&lookup, "CHESS_AI_THINK_DELAY")
                .unwrap_or(defaults.think_delay_ms),
            engine_path: lookup("CHESS_ENGINE_PATH").filter(|p| !p.trim().is_empty()),
            clock_seconds: parse_var(&lookup, "CHESS_CLOCK_SECONDS")
                .unwrap_or(defaults.clock_seconds),
            max_hints: parse_var(&lookup, "CHESS_MAX_HINTS").unwrap_or(defaults.max_hints),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            default_difficulty: Difficulty::Medium,
            ai_timeout_ms: 3000,
            think_delay_ms: 500,
            engine_path: None,
            clock_seconds: 600,
            max_hints: crate::engine::game::DEFAULT_MAX_HINTS,
        }
    }
}
