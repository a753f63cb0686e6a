use std::path::PathBuf;

use sb_core::phase::PhaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error("viewport must be non-empty, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
    #[error("template '{0}' has a zero image dimension")]
    ZeroDimension(String),
    #[error("{field} must be a finite, non-negative margin, got {value}")]
    InvalidMargin { field: &'static str, value: f32 },
    #[error("prop template '{name}' has invalid spray radius {radius}")]
    InvalidSprayRadius { name: String, radius: f32 },
    #[error("{role} weapon index {index} is out of range ({count} weapon templates)")]
    WeaponIndex {
        role: &'static str,
        index: usize,
        count: usize,
    },
    #[error("invalid color '{0}' (expected #RRGGBB or #RRGGBBAA)")]
    Color(String),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("sprite '{0}' was not preloaded into the asset cache")]
    NotCached(String),
}
