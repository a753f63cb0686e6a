//! Runtime entities: one struct for every on-screen object, tagged by kind.
//!
//! Behaviour differences between kinds live in data rather than in a type
//! hierarchy: the `BoundaryPolicy` decides what happens at the viewport edge,
//! `phase_speeds` makes an entity react to the environment phase, and a
//! `Shooter` lets an input-driven entity launch projectiles.

use std::sync::Arc;

use glam::Vec2;
use sb_core::input::{InputState, Key};
use sb_core::phase::{Phase, PhaseSpeeds};
use sb_core::rect::{Rect, Viewport};

use crate::assets::AssetCache;
use crate::config::{EntityTemplate, Rgba, SpriteSpec};
use crate::error::AssetError;
use crate::spray::PropInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Weapon,
    Npc,
    Prop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryPolicy {
    /// Clamp to the viewport and reflect the crossing direction component.
    Bounce,
    /// Remove once any edge is `margin` pixels past the viewport.
    Despawn { margin: f32 },
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Only a strictly negative x faces left; zero, `-0.0` and pure vertical
    /// motion face right.
    pub fn from_direction(direction: Vec2) -> Self {
        if direction.x < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Alive,
    Despawn,
}

/// Minimum spacing between shots, measured on the frame clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    cooldown_ms: u64,
    last_shot_ms: Option<u64>,
}

impl Cooldown {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_shot_ms: None,
        }
    }

    pub fn is_ready(&self, now_ms: u64) -> bool {
        match self.last_shot_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.cooldown_ms,
        }
    }

    /// Records a shot at `now_ms` if the cooldown has elapsed.
    pub fn try_fire(&mut self, now_ms: u64) -> bool {
        if !self.is_ready(now_ms) {
            return false;
        }
        self.last_shot_ms = Some(now_ms);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shooter {
    /// Index into the weapon templates.
    pub weapon_index: usize,
    pub cooldown: Cooldown,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub sprite_key: Arc<str>,
    pub color: Rgba,
    pub rect: Rect,
    /// Unit length or zero.
    pub direction: Vec2,
    pub speed: f32,
    pub boundary: BoundaryPolicy,
    pub phase_speeds: Option<PhaseSpeeds>,
    pub facing: Facing,
    pub shooter: Option<Shooter>,
}

impl Entity {
    #[allow(clippy::too_many_arguments)]
    fn spawn(
        id: EntityId,
        kind: EntityKind,
        name: &str,
        sprite: &SpriteSpec,
        center: Vec2,
        direction: Vec2,
        speed: f32,
        boundary: BoundaryPolicy,
        cache: &AssetCache,
    ) -> Result<Self, AssetError> {
        let (sprite_key, cached) = cache.resolve(sprite)?;
        let (width, height) = cached.dimensions().unwrap_or((sprite.width, sprite.height));
        let direction = direction.normalize_or_zero();
        Ok(Self {
            id,
            kind,
            name: name.to_string(),
            sprite_key,
            color: sprite.color,
            rect: Rect::from_center(center, width as f32, height as f32),
            direction,
            speed,
            boundary,
            phase_speeds: None,
            facing: Facing::from_direction(direction),
            shooter: None,
        })
    }

    fn from_template(
        id: EntityId,
        kind: EntityKind,
        template: &EntityTemplate,
        boundary: BoundaryPolicy,
        cache: &AssetCache,
    ) -> Result<Self, AssetError> {
        let mut entity = Self::spawn(
            id,
            kind,
            &template.name,
            &template.sprite,
            Vec2::new(template.x, template.y),
            Vec2::from(template.direction),
            template.speed,
            boundary,
            cache,
        )?;
        entity.phase_speeds = template.phase_speeds;
        Ok(entity)
    }

    pub fn player(
        id: EntityId,
        template: &EntityTemplate,
        shooter: Shooter,
        cache: &AssetCache,
    ) -> Result<Self, AssetError> {
        let mut entity =
            Self::from_template(id, EntityKind::Player, template, BoundaryPolicy::Bounce, cache)?;
        entity.shooter = Some(shooter);
        Ok(entity)
    }

    pub fn npc(id: EntityId, template: &EntityTemplate, cache: &AssetCache) -> Result<Self, AssetError> {
        Self::from_template(id, EntityKind::Npc, template, BoundaryPolicy::Bounce, cache)
    }

    /// A projectile positioned at the template's coordinates; callers move it
    /// to the launch point.
    pub fn weapon(
        id: EntityId,
        template: &EntityTemplate,
        margin: f32,
        cache: &AssetCache,
    ) -> Result<Self, AssetError> {
        Self::from_template(
            id,
            EntityKind::Weapon,
            template,
            BoundaryPolicy::Despawn { margin },
            cache,
        )
    }

    pub fn prop(id: EntityId, instance: &PropInstance, cache: &AssetCache) -> Result<Self, AssetError> {
        Self::spawn(
            id,
            EntityKind::Prop,
            &instance.name,
            &instance.sprite,
            instance.position,
            Vec2::ZERO,
            0.0,
            BoundaryPolicy::Ignore,
            cache,
        )
    }

    pub fn is_input_driven(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Points the entity along the held arrow keys; no keys means standing still.
    pub fn steer(&mut self, input: &InputState) {
        let intent = Vec2::new(
            input.axis(Key::Left, Key::Right),
            input.axis(Key::Up, Key::Down),
        );
        self.direction = intent.normalize_or_zero();
    }

    pub fn update(&mut self, dt: f32, phase: Option<Phase>, viewport: Viewport) -> UpdateOutcome {
        if let (Some(speeds), Some(phase)) = (self.phase_speeds, phase) {
            self.speed = speeds.for_phase(phase);
        }

        self.rect.center += self.direction * self.speed * dt;

        let outcome = match self.boundary {
            BoundaryPolicy::Bounce => {
                self.bounce(viewport);
                UpdateOutcome::Alive
            }
            BoundaryPolicy::Despawn { margin } => {
                if self.is_past_margin(viewport, margin) {
                    UpdateOutcome::Despawn
                } else {
                    UpdateOutcome::Alive
                }
            }
            BoundaryPolicy::Ignore => UpdateOutcome::Alive,
        };

        self.facing = Facing::from_direction(self.direction);
        outcome
    }

    fn bounce(&mut self, viewport: Viewport) {
        if self.rect.left() <= 0.0 {
            self.rect.set_left(0.0);
            self.direction.x *= -1.0;
        }
        if self.rect.right() >= viewport.width {
            self.rect.set_right(viewport.width);
            self.direction.x *= -1.0;
        }
        if self.rect.top() <= 0.0 {
            self.rect.set_top(0.0);
            self.direction.y *= -1.0;
        }
        if self.rect.bottom() >= viewport.height {
            self.rect.set_bottom(viewport.height);
            self.direction.y *= -1.0;
        }
    }

    fn is_past_margin(&self, viewport: Viewport, margin: f32) -> bool {
        self.rect.left() <= -margin
            || self.rect.right() >= viewport.width + margin
            || self.rect.top() <= -margin
            || self.rect.bottom() >= viewport.height + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const VIEWPORT: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };

    fn template(name: &str, width: u32, height: u32, x: f32, y: f32, dir: [f32; 2], speed: f32) -> EntityTemplate {
        EntityTemplate {
            name: name.to_string(),
            sprite: SpriteSpec {
                image: format!("{name}.png"),
                flip: false,
                resize: false,
                width,
                height,
                color: Rgba::WHITE,
            },
            x,
            y,
            direction: dir,
            speed,
            phase_speeds: None,
        }
    }

    fn debug_cache(templates: &[&EntityTemplate]) -> AssetCache {
        let mut cache = AssetCache::new("unused", true);
        cache
            .preload(templates.iter().map(|t| &t.sprite))
            .expect("debug preload never fails");
        cache
    }

    fn npc(t: &EntityTemplate) -> Entity {
        Entity::npc(EntityId(1), t, &debug_cache(&[t])).expect("npc")
    }

    #[test]
    fn construction_requires_cached_sprite() {
        let t = template("ghost", 10, 10, 0.0, 0.0, [1.0, 0.0], 1.0);
        let cache = AssetCache::new("unused", true);
        assert!(matches!(
            Entity::npc(EntityId(1), &t, &cache),
            Err(AssetError::NotCached(_))
        ));
    }

    #[test]
    fn spawn_normalizes_direction_and_uses_template_size() {
        let t = template("goldie", 160, 142, 500.0, 300.0, [1.0, 1.0], 141.0);
        let e = npc(&t);
        assert_relative_eq!(e.direction.length(), 1.0, epsilon = 1e-6);
        assert_eq!(e.rect.width(), 160.0);
        assert_eq!(e.rect.height(), 142.0);
        assert_eq!(e.rect.center, Vec2::new(500.0, 300.0));
        assert_eq!(e.facing, Facing::Right);
    }

    #[test]
    fn straight_line_motion_integrates_direction_times_speed() {
        let t = template("drift", 20, 20, 400.0, 300.0, [0.6, -0.8], 50.0);
        let mut e = npc(&t);
        let dts = [0.016, 0.02, 0.1, 0.5];
        for dt in dts {
            assert_eq!(e.update(dt, None, VIEWPORT), UpdateOutcome::Alive);
        }
        let total: f32 = dts.iter().sum();
        assert_relative_eq!(e.rect.center.x, 400.0 + 0.6 * 50.0 * total, epsilon = 1e-3);
        assert_relative_eq!(e.rect.center.y, 300.0 - 0.8 * 50.0 * total, epsilon = 1e-3);
    }

    #[test]
    fn bounce_scenario_clamps_and_flips_once() {
        let t = template("box", 60, 60, 640.0, 360.0, [1.0, 0.0], 100.0);
        let mut e = npc(&t);
        for _ in 0..6 {
            let _ = e.update(1.0, None, VIEWPORT);
        }
        assert_eq!(e.rect.center.x, 1240.0);
        assert_eq!(e.direction, Vec2::new(1.0, 0.0));

        let _ = e.update(1.0, None, VIEWPORT);
        assert_eq!(e.rect.right(), 1280.0);
        assert_eq!(e.direction, Vec2::new(-1.0, 0.0));
        assert_eq!(e.facing, Facing::Left);

        let _ = e.update(1.0, None, VIEWPORT);
        assert_eq!(e.rect.center.x, 1150.0);
        assert_eq!(e.direction, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn bounce_at_corner_flips_both_components() {
        let t = template("corner", 10, 10, 3.0, 3.0, [-1.0, -1.0], 100.0);
        let mut e = npc(&t);
        let _ = e.update(0.1, None, VIEWPORT);
        assert_eq!(e.rect.left(), 0.0);
        assert_eq!(e.rect.top(), 0.0);
        assert!(e.direction.x > 0.0 && e.direction.y > 0.0);
    }

    #[test]
    fn bounce_keeps_rect_inside_viewport() {
        let t = template("fast", 50, 30, 600.0, 300.0, [0.7, 0.3], 5000.0);
        let mut e = npc(&t);
        for _ in 0..200 {
            let _ = e.update(0.05, None, VIEWPORT);
            assert!(VIEWPORT.contains(&e.rect), "escaped to {:?}", e.rect);
        }
    }

    #[test]
    fn projectile_despawns_past_margin() {
        let t = template("orb", 70, 70, 640.0, 40.0, [0.0, -1.0], 100.0);
        let cache = debug_cache(&[&t]);
        let mut e = Entity::weapon(EntityId(3), &t, 160.0, &cache).expect("weapon");

        // top edge at 5 - 100 = -95, still inside the margin
        assert_eq!(e.update(1.0, None, VIEWPORT), UpdateOutcome::Alive);
        // top edge at -195
        assert_eq!(e.update(1.0, None, VIEWPORT), UpdateOutcome::Despawn);
    }

    #[test]
    fn projectile_ignores_viewport_edges_inside_margin() {
        let t = template("orb", 10, 10, 1275.0, 360.0, [1.0, 0.0], 10.0);
        let cache = debug_cache(&[&t]);
        let mut e = Entity::weapon(EntityId(3), &t, 160.0, &cache).expect("weapon");
        assert_eq!(e.update(1.0, None, VIEWPORT), UpdateOutcome::Alive);
        assert_eq!(e.direction, Vec2::new(1.0, 0.0));
        assert!(e.rect.right() > VIEWPORT.width);
    }

    #[test]
    fn phase_reactive_entity_adopts_phase_speed_before_moving() {
        let mut t = template("fishy", 10, 10, 100.0, 100.0, [1.0, 0.0], 80.0);
        t.phase_speeds = Some(PhaseSpeeds {
            peace: 90.0,
            rogue: 100.0,
            chaos: 700.0,
            frozen: 2.0,
        });
        let mut e = npc(&t);
        let _ = e.update(0.0, None, VIEWPORT);
        assert_eq!(e.speed, 80.0);
        let _ = e.update(0.5, Some(Phase::Chaos), VIEWPORT);
        assert_eq!(e.speed, 700.0);
        assert_relative_eq!(e.rect.center.x, 450.0);
    }

    #[test]
    fn non_reactive_entity_keeps_base_speed() {
        let t = template("plain", 10, 10, 100.0, 100.0, [1.0, 0.0], 80.0);
        let mut e = npc(&t);
        let _ = e.update(0.1, Some(Phase::Frozen), VIEWPORT);
        assert_eq!(e.speed, 80.0);
    }

    #[test]
    fn props_never_move() {
        let t = template("flower", 10, 10, 0.0, 0.0, [0.0, 0.0], 0.0);
        let cache = debug_cache(&[&t]);
        let instance = PropInstance {
            name: "flower-0".to_string(),
            sprite: t.sprite.clone(),
            position: Vec2::new(-500.0, 9000.0),
        };
        let mut e = Entity::prop(EntityId(9), &instance, &cache).expect("prop");
        assert_eq!(e.update(1.0, Some(Phase::Chaos), VIEWPORT), UpdateOutcome::Alive);
        assert_eq!(e.rect.center, Vec2::new(-500.0, 9000.0));
        assert_eq!(e.name, "flower-0");
    }

    #[test]
    fn facing_tie_break_is_right() {
        assert_eq!(Facing::from_direction(Vec2::new(-0.1, 0.0)), Facing::Left);
        assert_eq!(Facing::from_direction(Vec2::ZERO), Facing::Right);
        assert_eq!(Facing::from_direction(Vec2::new(-0.0, 1.0)), Facing::Right);
        assert_eq!(Facing::from_direction(Vec2::new(0.0, -1.0)), Facing::Right);
    }

    #[test]
    fn steering_follows_held_keys() {
        let t = template("buck", 100, 126, 890.0, 540.0, [-0.994, -0.114], 480.0);
        let cache = debug_cache(&[&t]);
        let shooter = Shooter {
            weapon_index: 0,
            cooldown: Cooldown::new(100),
        };
        let mut player = Entity::player(EntityId(1), &t, shooter, &cache).expect("player");
        assert!(player.is_input_driven());

        let mut input = InputState::new();
        player.steer(&input);
        assert_eq!(player.direction, Vec2::ZERO);

        input.key_down(Key::Right);
        input.key_down(Key::Up);
        player.steer(&input);
        assert_relative_eq!(player.direction.x, std::f32::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(player.direction.y, -std::f32::consts::FRAC_1_SQRT_2);

        input.key_down(Key::Left);
        player.steer(&input);
        assert_eq!(player.direction, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn cooldown_gates_shots() {
        let mut cooldown = Cooldown::new(100);
        assert!(cooldown.try_fire(0));
        assert!(!cooldown.try_fire(50));
        assert!(cooldown.try_fire(101));
        assert!(!cooldown.is_ready(150));
        assert!(cooldown.is_ready(201));
    }

    #[test]
    fn zero_cooldown_always_fires() {
        let mut cooldown = Cooldown::new(0);
        assert!(cooldown.try_fire(5));
        assert!(cooldown.try_fire(5));
    }
}
