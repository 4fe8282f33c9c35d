//! Configuration management for the Animcalc CLI.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Command-line arguments
//! 2. Environment variables (ANIMCALC_*)
//! 3. Config file (~/.config/animcalc/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Host `serve` binds to.
    #[serde(default = "default_host")]
    pub server_host: String,

    /// Port `serve` and `desktop` bind to.
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Whether to send permissive CORS headers.
    #[serde(default = "default_cors")]
    pub cors: bool,

    /// Host the desktop shell binds to.
    #[serde(default = "default_desktop_host")]
    pub desktop_host: String,

    /// Seconds the desktop shell waits for the server to accept connections.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// Whether the desktop shell opens the page in a browser.
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors() -> bool {
    true
}

fn default_desktop_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ready_timeout_secs() -> u64 {
    10
}

fn default_open_browser() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            cors: default_cors(),
            desktop_host: default_desktop_host(),
            ready_timeout_secs: default_ready_timeout_secs(),
            open_browser: default_open_browser(),
        }
    }
}

impl Config {
    /// Loads configuration from all sources.
    ///
    /// Reports warnings for configuration errors but falls back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration using `config_path` as the file layer.
    pub fn load_from(config_path: &Path) -> Self {
        match Self::figment(config_path).extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("\x1b[33mWarning:\x1b[0m Configuration error, using defaults");
                eprintln!("  Config file: {}", config_path.display());
                eprintln!("  Error: {}", e);
                eprintln!();
                eprintln!("  To fix, edit or delete the config file:");
                eprintln!("    rm {}", config_path.display());
                eprintln!();
                Config::default()
            }
        }
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ANIMCALC_"))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Returns the path to the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("animcalc")
    }

    /// Saves the current configuration to the config file.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Saves the current configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self).map_err(std::io::Error::other)?;

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

/// Prints the current configuration and its sources.
pub fn show_config() {
    let config = Config::load();
    let config_path = Config::config_path();

    println!("Animcalc Configuration");
    println!("======================\n");

    println!("Config file: {}", config_path.display());
    if config_path.exists() {
        println!("Status: Found\n");
    } else {
        println!("Status: Not found (using defaults)\n");
    }

    println!("Current settings:");
    println!("  server_host: {}", config.server_host);
    println!("  server_port: {}", config.server_port);
    println!("  cors: {}", config.cors);
    println!("  desktop_host: {}", config.desktop_host);
    println!("  ready_timeout_secs: {}", config.ready_timeout_secs);
    println!("  open_browser: {}", config.open_browser);

    println!("\nEnvironment variables:");
    println!("  ANIMCALC_SERVER_HOST");
    println!("  ANIMCALC_SERVER_PORT");
    println!("  ANIMCALC_CORS");
    println!("  ANIMCALC_DESKTOP_HOST");
    println!("  ANIMCALC_READY_TIMEOUT_SECS");
    println!("  ANIMCALC_OPEN_BROWSER");
}
