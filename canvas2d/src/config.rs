use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gl_wrapper::TRIANGLE;

/// Everything a session draws with, loadable from a JSON5 file. Missing
/// fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub clear_color: [f32; 4],
    pub triangle: TriangleConfig,
    pub rectangle: RectangleConfig,
    pub random: RandomConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "canvas2d".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangleConfig {
    /// Three points in pixels.
    pub vertices: [f32; 6],
    pub color: [f32; 4],
}

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            vertices: TRIANGLE,
            color: [1.0, 0.5, 0.2, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleConfig {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [f32; 4],
}

impl Default for RectangleConfig {
    fn default() -> Self {
        Self {
            x: 10.0,
            y: 20.0,
            width: 70.0,
            height: 10.0,
            color: [0.2, 0.6, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    pub count: usize,
    /// Upper bound (exclusive) for x, y, width and height, in pixels.
    pub range: u32,
    pub seed: u64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            count: 50,
            range: 300,
            seed: 0,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::InputError)?;

        Self::from_json5(&text)
    }

    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        json5::from_str(text).map_err(ConfigError::FormatError)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    InputError(std::io::Error),
    #[error("invalid config: {0}")]
    FormatError(json5::Error),
}
