//! Configuration
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/ghostedit/config.toml)
//! 3. Built-in defaults (lowest priority)
//!
//! The core pipeline never reads any of this itself; values are resolved
//! here once and passed in as plain arguments.

use serde::Deserialize;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds to wait for the remote endpoint before declaring a network failure
    pub timeout_secs: u64,

    /// How many times to re-read the buffer when it holds no fetch snippet
    pub max_capture_attempts: u32,

    /// Pause between edit cycles, in milliseconds
    pub cycle_pause_ms: u64,

    /// Log level when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_capture_attempts: 3,
            cycle_pause_ms: 1500,
            log_level: "info".to_string(),
        }
    }
}

/// Config file shape - every field optional so partial files merge over defaults
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    timeout_secs: Option<u64>,
    max_capture_attempts: Option<u32>,
    cycle_pause_ms: Option<u64>,
    log_level: Option<String>,
}

impl Config {
    /// Load configuration with full precedence: env > file > defaults
    pub fn from_env() -> Self {
        let mut config = Self::load_file();

        if let Ok(value) = std::env::var("GHOSTEDIT_TIMEOUT_SECS") {
            if let Ok(parsed) = value.parse() {
                config.timeout_secs = parsed;
            }
        }
        if let Ok(value) = std::env::var("GHOSTEDIT_MAX_CAPTURE_ATTEMPTS") {
            if let Ok(parsed) = value.parse() {
                config.max_capture_attempts = parsed;
            }
        }
        if let Ok(value) = std::env::var("GHOSTEDIT_CYCLE_PAUSE_MS") {
            if let Ok(parsed) = value.parse() {
                config.cycle_pause_ms = parsed;
            }
        }
        if let Ok(value) = std::env::var("GHOSTEDIT_LOG_LEVEL") {
            config.log_level = value;
        }

        config
    }

    /// Path of the config file, if a config directory exists on this platform
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ghostedit").join("config.toml"))
    }

    /// Write the default config template on first run so users discover options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        if path.exists() {
            return;
        }
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        if let Err(e) = std::fs::write(&path, Config::default().to_toml()) {
            eprintln!("Warning: could not write config template: {e}");
        }
    }

    /// Defaults merged with whatever the config file provides
    fn load_file() -> Self {
        let defaults = Self::default();
        let Some(path) = Self::config_path() else {
            return defaults;
        };
        let Ok(text) = std::fs::read_to_string(&path) else {
            return defaults;
        };
        match toml::from_str::<FileConfig>(&text) {
            Ok(file) => defaults.merged(file),
            Err(e) => {
                // Tracing is not initialized yet at load time
                eprintln!("Warning: ignoring malformed config {}: {}", path.display(), e);
                defaults
            }
        }
    }

    fn merged(mut self, file: FileConfig) -> Self {
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = file.max_capture_attempts {
            self.max_capture_attempts = v;
        }
        if let Some(v) = file.cycle_pause_ms {
            self.cycle_pause_ms = v;
        }
        if let Some(v) = file.log_level {
            self.log_level = v;
        }
        self
    }

    /// Render the config as a commented TOML template.
    /// Single source of truth for both `--reset` and the first-run template.
    pub fn to_toml(&self) -> String {
        format!(
            r#"# ghostedit configuration
# Values here are overridden by GHOSTEDIT_* environment variables.

# Seconds to wait for the remote endpoint before declaring a network failure
timeout_secs = {timeout_secs}

# How many times to re-read the clipboard when it holds no fetch snippet
max_capture_attempts = {max_capture_attempts}

# Pause between edit cycles, in milliseconds
cycle_pause_ms = {cycle_pause_ms}

# Log level when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
log_level = "{log_level}"
"#,
            timeout_secs = self.timeout_secs,
            max_capture_attempts = self.max_capture_attempts,
            cycle_pause_ms = self.cycle_pause_ms,
            log_level = self.log_level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.max_capture_attempts, 3);
        assert_eq!(config.cycle_pause_ms, 1500);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let file: FileConfig = toml::from_str("timeout_secs = 30").unwrap();
        let config = Config::default().merged(file);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_capture_attempts, 3);
    }

    #[test]
    fn template_round_trips_through_the_file_parser() {
        let rendered = Config::default().to_toml();
        let file: FileConfig = toml::from_str(&rendered).unwrap();
        let config = Config::default().merged(file);
        assert_eq!(config.timeout_secs, Config::default().timeout_secs);
        assert_eq!(config.log_level, Config::default().log_level);
    }
}
