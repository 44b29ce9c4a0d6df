use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConcertError, MergeMode, Result};

/// Top-level configuration for a run. Every field has a default so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Home location, geocoded once per run.
    pub location: String,
    pub radius_miles: f64,
    /// Same-day records closer than this are treated as one show.
    pub merge_eps_miles: f64,
    pub merge_mode: MergeMode,
    pub bands_glob: String,
    pub output_dir: PathBuf,
    /// Upper bound on concurrent event fetches.
    pub workers: usize,
    pub app_id: String,
    pub user_agent: String,
    pub title: String,
    pub template: Option<PathBuf>,
    pub stylesheet: Option<PathBuf>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            location: "New York, NY".to_string(),
            radius_miles: 500.0,
            merge_eps_miles: 0.5,
            merge_mode: MergeMode::Adjacent,
            bands_glob: "data/*.txt".to_string(),
            output_dir: PathBuf::from("reports"),
            workers: 4,
            app_id: "concerts_finder".to_string(),
            user_agent: "concert-finder".to_string(),
            title: "Concerts".to_string(),
            template: None,
            stylesheet: None,
        }
    }
}

impl FinderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.radius_miles.is_finite() && self.radius_miles > 0.0) {
            return Err(ConcertError::Config(format!(
                "radius_miles must be positive, got {}",
                self.radius_miles
            )));
        }
        if !(self.merge_eps_miles.is_finite() && self.merge_eps_miles > 0.0) {
            return Err(ConcertError::Config(format!(
                "merge_eps_miles must be positive, got {}",
                self.merge_eps_miles
            )));
        }
        if self.workers == 0 {
            return Err(ConcertError::Config("workers must be at least 1".into()));
        }
        if self.location.trim().is_empty() {
            return Err(ConcertError::Config("location must not be empty".into()));
        }
        Ok(())
    }
}
