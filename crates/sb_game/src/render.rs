//! Turns the world into a sprite batch and the asset cache into GPU textures.
//!
//! Each decoded sprite becomes two textures, one per facing. Debug-mode
//! sprites share a single 1x1 white texture and are tinted with their
//! template color instead.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use sb_render::{BoundTexture, QuadSpec, SpriteBatch, SpritePipeline, Texture};

use crate::assets::{AssetCache, CachedSprite};
use crate::config::Rgba;
use crate::entity::Facing;
use crate::world::World;

pub const WHITE_TEXTURE_KEY: &str = "__white";
pub const BACKGROUND_TEXTURE_KEY: &str = "__background";

#[derive(Debug, Clone)]
enum SpriteDraw {
    Textured { left: Arc<str>, right: Arc<str> },
    Flat,
}

/// Maps cache keys to the texture keys used for each facing.
#[derive(Debug)]
pub struct SpriteKeys {
    entries: HashMap<Arc<str>, SpriteDraw>,
    white: Arc<str>,
}

impl SpriteKeys {
    pub fn from_cache(cache: &AssetCache) -> Self {
        let entries = cache
            .iter()
            .map(|(key, sprite)| {
                let draw = match sprite {
                    CachedSprite::Image { .. } => SpriteDraw::Textured {
                        left: Arc::from(facing_texture_key(key, Facing::Left)),
                        right: Arc::from(facing_texture_key(key, Facing::Right)),
                    },
                    CachedSprite::Flat => SpriteDraw::Flat,
                };
                (Arc::clone(key), draw)
            })
            .collect();
        Self {
            entries,
            white: Arc::from(WHITE_TEXTURE_KEY),
        }
    }

    /// Texture key and tint for a sprite drawn with `facing`.
    fn resolve(&self, sprite_key: &str, facing: Facing, color: Rgba) -> (&str, [f32; 4]) {
        match self.entries.get(sprite_key) {
            Some(SpriteDraw::Textured { left, right }) => {
                let key = match facing {
                    Facing::Left => left,
                    Facing::Right => right,
                };
                (&**key, Rgba::WHITE.0)
            }
            Some(SpriteDraw::Flat) | None => (&*self.white, color.to_linear()),
        }
    }
}

pub fn facing_texture_key(sprite_key: &str, facing: Facing) -> String {
    match facing {
        Facing::Left => format!("{sprite_key}#left"),
        Facing::Right => format!("{sprite_key}#right"),
    }
}

/// Native size of the background image, drawn from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundQuad {
    pub width: f32,
    pub height: f32,
}

/// Rebuilds `batch` for this frame: background first (if any), then every
/// entity in the world's draw order.
pub fn build_frame_batch(
    world: &World,
    keys: &SpriteKeys,
    background: Option<BackgroundQuad>,
    batch: &mut SpriteBatch,
) {
    batch.clear();

    if let Some(bg) = background {
        batch.push_quad(QuadSpec {
            texture_key: BACKGROUND_TEXTURE_KEY,
            center_x: bg.width * 0.5,
            center_y: bg.height * 0.5,
            width: bg.width,
            height: bg.height,
            color: Rgba::WHITE.0,
        });
    }

    for entity in world.draw_order() {
        let (texture_key, color) = keys.resolve(&entity.sprite_key, entity.facing, entity.color);
        batch.push_quad(QuadSpec {
            texture_key,
            center_x: entity.rect.center.x,
            center_y: entity.rect.center.y,
            width: entity.rect.width(),
            height: entity.rect.height(),
            color,
        });
    }
}

/// Uploads every cached sprite (both facings), the white texture and the
/// optional background.
pub fn upload_textures(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    cache: &AssetCache,
    background: Option<&RgbaImage>,
) -> HashMap<Arc<str>, BoundTexture> {
    let mut textures = HashMap::new();

    let white = Texture::from_rgba8(device, queue, &[255, 255, 255, 255], 1, 1, WHITE_TEXTURE_KEY);
    textures.insert(Arc::from(WHITE_TEXTURE_KEY), pipeline.bind(device, white));

    if let Some(image) = background {
        let texture = Texture::from_image(device, queue, image, BACKGROUND_TEXTURE_KEY);
        textures.insert(Arc::from(BACKGROUND_TEXTURE_KEY), pipeline.bind(device, texture));
    }

    for (key, sprite) in cache.iter() {
        let CachedSprite::Image { left, right } = sprite else {
            continue;
        };
        for (facing, image) in [(Facing::Left, left), (Facing::Right, right)] {
            let texture_key = facing_texture_key(key, facing);
            let texture = Texture::from_image(device, queue, image, &texture_key);
            textures.insert(Arc::from(texture_key), pipeline.bind(device, texture));
        }
    }

    log::info!("Uploaded {} textures", textures.len());
    textures
}
