use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clustering::domain::cluster_engine::ConvergenceRule;
use crate::clustering::infrastructure::engine_factory::EngineKind;
use crate::rendering::domain::palette::{Color, PalettePolicy};
use crate::shared::constants::{
    DEFAULT_BOX_THICKNESS, DEFAULT_DISTANCE_THRESHOLD, DEFAULT_MAX_ITERATIONS,
    DEFAULT_PALETTE_SIZE,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed settings file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    #[default]
    Random,
    Fixed,
}

impl std::fmt::Display for PaletteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaletteKind::Random => write!(f, "random"),
            PaletteKind::Fixed => write!(f, "fixed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteSettings {
    pub kind: PaletteKind,
    /// Number of colors generated by the random policy.
    pub size: usize,
    /// Colors used by the fixed policy.
    pub colors: Vec<Color>,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            kind: PaletteKind::Random,
            size: DEFAULT_PALETTE_SIZE,
            colors: Vec::new(),
        }
    }
}

impl PaletteSettings {
    pub fn to_policy(&self) -> PalettePolicy {
        match self.kind {
            PaletteKind::Random => PalettePolicy::Random { size: self.size },
            PaletteKind::Fixed => PalettePolicy::Fixed(self.colors.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub kind: EngineKind,
    /// Worker threads for the snapshot engine; `0` uses every core.
    pub threads: usize,
}

/// Tunables for one clustering run. Missing fields in a settings file
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub threshold: f64,
    pub max_iterations: u32,
    /// Seed for visitation order and tie-breaks; random when unset.
    pub seed: Option<u64>,
    pub convergence: ConvergenceRule,
    pub engine: EngineSettings,
    pub palette: PaletteSettings,
    /// Seed for the random palette, independent of `seed`.
    pub palette_seed: Option<u64>,
    pub box_thickness: u32,
    /// Renumber labels to `0..K` before coloring and reporting.
    pub compact_labels: bool,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DISTANCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: None,
            convergence: ConvergenceRule::default(),
            engine: EngineSettings::default(),
            palette: PaletteSettings::default(),
            palette_seed: None,
            box_thickness: DEFAULT_BOX_THICKNESS,
            compact_labels: false,
        }
    }
}

impl ClusterSettings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceClust").join("settings.json"))
    }

    /// Settings from the default location, or defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_error = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_error)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.box_thickness == 0 {
            return Err(SettingsError::Invalid(
                "box thickness must be at least 1".to_string(),
            ));
        }
        match self.palette.kind {
            PaletteKind::Random if self.palette.size == 0 => Err(SettingsError::Invalid(
                "random palette size must be at least 1".to_string(),
            )),
            PaletteKind::Fixed if self.palette.colors.is_empty() => Err(SettingsError::Invalid(
                "fixed palette needs at least one color".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
