//! services/web/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Name of the scratch file used to prove the save directory is writable.
const WRITE_PROBE_FILE: &str = "tst.f";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
    #[error("Save directory {0} is not usable: {1}")]
    SaveDir(PathBuf, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen_address: SocketAddr,
    /// Where visitors are redirected after a query token is moved into a cookie.
    pub endpoint_url: String,
    /// Writable root for per-user document history. `None` disables `/save`.
    pub save_dir: Option<PathBuf>,
    pub key_path: PathBuf,
    pub static_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let listen_address_str =
            std::env::var("LISTEN_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8888".to_string());
        let listen_address = listen_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("LISTEN_ADDRESS".to_string(), e.to_string())
        })?;

        let endpoint_url = std::env::var("ENDPOINT_URL")
            .map_err(|_| ConfigError::MissingVar("ENDPOINT_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Paths ---
        let save_dir = match std::env::var("SAVE_DIR") {
            Ok(dir) if !dir.is_empty() => Some(verify_save_dir(Path::new(&dir))?),
            _ => None,
        };

        let key_path = std::env::var("KEY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("private_key.json"));
        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));
        let templates_dir = std::env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./templates"));

        Ok(Self {
            listen_address,
            endpoint_url,
            save_dir,
            key_path,
            static_dir,
            templates_dir,
            log_level,
        })
    }
}

/// Checks that `dir` exists, is a directory and accepts new files by writing
/// and removing a probe file.
pub fn verify_save_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    let metadata = std::fs::metadata(dir)
        .map_err(|e| ConfigError::SaveDir(dir.to_path_buf(), e.to_string()))?;
    if !metadata.is_dir() {
        return Err(ConfigError::SaveDir(
            dir.to_path_buf(),
            "not a directory".to_string(),
        ));
    }

    let probe = dir.join(WRITE_PROBE_FILE);
    std::fs::write(&probe, b"").map_err(|e| {
        ConfigError::SaveDir(dir.to_path_buf(), format!("not writable: {}", e))
    })?;
    let _ = std::fs::remove_file(&probe);

    Ok(dir.to_path_buf())
}
