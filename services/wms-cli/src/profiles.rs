//! Persisted service profiles.
//!
//! Profiles live in a single YAML file keyed by profile name:
//!
//! ```yaml
//! osm:
//!   url: https://ows.terrestris.de/osm/service
//!   version: 1.1.1
//!   format: image/png
//!   layers: [OSM-WMS]
//!   epsg: 4326
//!   file-name: osm
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Profile used when no name is given on the command line.
pub const DEFAULT_PROFILE: &str = "default";

/// Request settings stored under one profile name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub url: String,
    pub version: String,
    pub format: String,
    /// Layer entries, optionally `layer/style`
    pub layers: Vec<String>,
    /// 0 means "let the server decide"
    pub epsg: u32,
    #[serde(rename = "file-name")]
    pub file_name: String,
}

/// Location of the profile file: `$HOME/wms-config/.wms.yaml`.
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    Ok(home.join("wms-config").join(".wms.yaml"))
}

/// All profiles of one file.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Read the profile file. A missing or empty file yields no profiles.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let profiles = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_profiles(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), profiles = profiles.len(), "Loaded profiles");
        Ok(Self { path, profiles })
    }

    /// Profile `name`, or an empty profile if it is not stored.
    pub fn get(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, name: &str, profile: Profile) {
        self.profiles.insert(name.to_string(), profile);
    }

    /// Write all profiles back, creating the directory and file if needed.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let yaml = serde_yaml::to_string(&self.profiles)?;
        fs::write(&self.path, yaml)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Saved profiles");
        Ok(())
    }
}

fn parse_profiles(contents: &str) -> Result<BTreeMap<String, Profile>> {
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_yaml::from_str(contents)?)
}
