//! Configuration module for RAG-Relay
//!
//! Handles loading settings from YAML files, `.env` files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "RAG_RELAY_SETTINGS_PATH";

/// Candidate settings file locations, in lookup order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/rag-relay/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("rag-relay/settings.yml"));
    }
    paths
}

/// Load a `.env` file into the process environment, returning its path.
///
/// A missing file is normal outside development.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Find the settings file: the explicit path first, then the default locations
pub fn locate() -> Option<PathBuf> {
    std::env::var(SETTINGS_PATH_ENV)
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain(default_paths())
        .find(|p| p.exists())
}

/// Load settings from `path` (or defaults), then apply environment overrides
pub fn load_from(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.merge_env();
    Ok(settings)
}
