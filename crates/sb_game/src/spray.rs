//! Scatters prop templates into individual prop instances around their center.

use glam::Vec2;
use rand::Rng;

use crate::config::{PropTemplate, SpriteSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct PropInstance {
    pub name: String,
    pub sprite: SpriteSpec,
    pub position: Vec2,
}

/// Exactly `spray_count` instances, each offset independently on both axes by
/// a uniform draw from `[-spray_radius, spray_radius]`.
pub fn spray_props<R: Rng + ?Sized>(template: &PropTemplate, rng: &mut R) -> Vec<PropInstance> {
    let radius = template.spray_radius;
    (0..template.spray_count)
        .map(|index| PropInstance {
            name: format!("{}-{}", template.name, index),
            sprite: template.sprite.clone(),
            position: Vec2::new(
                template.x + rng.random_range(-radius..=radius),
                template.y + rng.random_range(-radius..=radius),
            ),
        })
        .collect()
}

pub fn spray_all<R: Rng + ?Sized>(templates: &[PropTemplate], rng: &mut R) -> Vec<PropInstance> {
    let props: Vec<PropInstance> = templates
        .iter()
        .flat_map(|template| spray_props(template, rng))
        .collect();
    log::info!(
        "Sprayed {} props from {} templates",
        props.len(),
        templates.len()
    );
    props
}
