//! Decoded sprite images keyed by how they were prepared.
//!
//! Images are decoded once at startup, resized and oriented, and kept in CPU
//! memory until the renderer uploads them. Every entry carries both facings:
//! `right` is always the horizontal mirror of `left`. In debug mode nothing is
//! read from disk and entries are `Flat`, drawn as tinted rectangles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::config::SpriteSpec;
use crate::error::AssetError;

#[derive(Debug, Clone)]
pub enum CachedSprite {
    Image { left: RgbaImage, right: RgbaImage },
    Flat,
}

impl CachedSprite {
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Image { left, .. } => Some(left.dimensions()),
            Self::Flat => None,
        }
    }
}

pub struct AssetCache {
    asset_dir: PathBuf,
    debug: bool,
    entries: HashMap<Arc<str>, CachedSprite>,
}

impl AssetCache {
    pub fn new(asset_dir: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            debug,
            entries: HashMap::new(),
        }
    }

    /// Decodes and caches every sprite in `specs`. Already cached keys are skipped.
    pub fn preload<'a>(
        &mut self,
        specs: impl IntoIterator<Item = &'a SpriteSpec>,
    ) -> Result<(), AssetError> {
        for spec in specs {
            self.load(spec)?;
        }
        log::info!(
            "Asset cache holds {} sprites (debug: {})",
            self.len(),
            self.debug
        );
        Ok(())
    }

    pub fn load(&mut self, spec: &SpriteSpec) -> Result<Arc<str>, AssetError> {
        let key: Arc<str> = Arc::from(spec.cache_key());
        if self.entries.contains_key(&key) {
            return Ok(key);
        }

        let sprite = if self.debug {
            CachedSprite::Flat
        } else {
            let path = self.asset_dir.join(&spec.image);
            let (left, right) = orient(decode(&path)?, spec);
            log::debug!("Loaded sprite '{}' ({}x{})", key, left.width(), left.height());
            CachedSprite::Image { left, right }
        };
        self.entries.insert(Arc::clone(&key), sprite);
        Ok(key)
    }

    /// Looks up a preloaded sprite. Entities are only ever built from resolved keys.
    pub fn resolve(&self, spec: &SpriteSpec) -> Result<(Arc<str>, &CachedSprite), AssetError> {
        let key = spec.cache_key();
        self.entries
            .get_key_value(key.as_str())
            .map(|(k, v)| (Arc::clone(k), v))
            .ok_or(AssetError::NotCached(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &CachedSprite)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Background image at its native size, or `None` in debug mode.
    pub fn load_background(&self, file: &str) -> Result<Option<RgbaImage>, AssetError> {
        if self.debug {
            return Ok(None);
        }
        decode(&self.asset_dir.join(file)).map(Some)
    }

    /// Rough CPU-side byte count of every decoded image.
    pub fn byte_size(&self) -> usize {
        self.entries
            .values()
            .map(|sprite| match sprite {
                CachedSprite::Image { left, right } => left.as_raw().len() + right.as_raw().len(),
                CachedSprite::Flat => 0,
            })
            .sum()
    }
}

fn decode(path: &Path) -> Result<RgbaImage, AssetError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| AssetError::Load {
            path: path.to_path_buf(),
            source,
        })
}

/// Applies resize and flip, returning the (left, right) facing pair.
pub fn orient(image: RgbaImage, spec: &SpriteSpec) -> (RgbaImage, RgbaImage) {
    let mut left = if spec.resize && image.dimensions() != (spec.width, spec.height) {
        imageops::resize(&image, spec.width, spec.height, FilterType::Lanczos3)
    } else {
        image
    };
    if spec.flip {
        imageops::flip_horizontal_in_place(&mut left);
    }
    let right = imageops::flip_horizontal(&left);
    (left, right)
}
