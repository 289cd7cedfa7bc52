//! JSON configuration and persistence helpers for refinement sessions.

use std::fs;
use std::path::{Path, PathBuf};

use body_metrics_core::PoseFrame;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::calibration::CalibrationStore;
use crate::session::{BodyProfile, SessionOutput, SessionParams, SessionProcessor, SessionReport};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a recorded frame stream (JSON array of frames).
pub fn load_frames_json(path: impl AsRef<Path>) -> Result<Vec<PoseFrame>, IoError> {
    read_json(path)
}

fn default_user_id() -> String {
    "anonymous".to_string()
}

/// Configuration of an offline refinement run over a recorded frame stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub frames_path: String,
    #[serde(default)]
    pub calibration_path: Option<String>,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub params: Option<SessionParams>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl SessionConfig {
    pub fn new(frames_path: impl Into<String>) -> Self {
        Self {
            frames_path: frames_path.into(),
            calibration_path: None,
            user_id: default_user_id(),
            params: None,
            output_path: None,
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("body_profile_{}.json", self.user_id)))
    }

    /// Calibration from the configured file, or the raw-unit fallback.
    pub fn build_calibration(&self) -> CalibrationStore {
        match &self.calibration_path {
            Some(path) => CalibrationStore::load_json_or_fallback(path),
            None => CalibrationStore::default(),
        }
    }

    pub fn build_params(&self) -> SessionParams {
        self.params.clone().unwrap_or_default()
    }

    pub fn build_processor(&self) -> SessionProcessor {
        SessionProcessor::new(self.build_calibration(), self.build_params())
    }

    pub fn load_frames(&self) -> Result<Vec<PoseFrame>, IoError> {
        load_frames_json(&self.frames_path)
    }
}

impl SessionParams {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}

impl BodyProfile {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}

impl SessionReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}

impl SessionOutput {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}
