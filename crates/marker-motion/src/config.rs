//! JSON run configuration.

use crate::sequence::{SequenceLayout, SubPixParams};
use crate::tracking::TrackerParams;
use marker_motion_core::CalibrationLayout;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Everything a run can tune. Missing JSON fields take their defaults, so
/// `{}` is a valid configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File names inside the calibration folder.
    pub calibration: CalibrationLayout,
    /// File and directory names inside the sequence folder.
    pub sequence: SequenceLayout,
    /// Sub-pixel refinement of the initial markers.
    pub subpix: SubPixParams,
    pub tracker: TrackerParams,
}

impl PipelineConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
