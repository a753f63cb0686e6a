//! Entity groups and the per-frame update pass.
//!
//! Groups update in a fixed order: props, NPCs, players, weapons. Weapons fired
//! by a player during its update wait in a pending list and join the weapon
//! group after the weapon pass, so a projectile never moves in the frame it
//! was created. Despawned weapons are dropped with `retain_mut` inside that
//! pass.

use glam::Vec2;
use rand::Rng;
use sb_core::input::{InputState, Key};
use sb_core::phase::Phase;
use sb_core::rect::Viewport;

use crate::assets::AssetCache;
use crate::config::GameConfig;
use crate::entity::{Cooldown, Entity, EntityId, Facing, Shooter, UpdateOutcome};
use crate::error::AssetError;
use crate::spray;

pub struct StepContext<'a> {
    pub dt: f32,
    pub now_ms: u64,
    pub phase: Option<Phase>,
    pub input: &'a InputState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub props: usize,
    pub npcs: usize,
    pub players: usize,
    pub weapons: usize,
}

impl WorldStats {
    pub fn total(&self) -> usize {
        self.props + self.npcs + self.players + self.weapons
    }
}

pub struct World {
    viewport: Viewport,
    pub props: Vec<Entity>,
    pub npcs: Vec<Entity>,
    pub players: Vec<Entity>,
    pub weapons: Vec<Entity>,
    /// One ready-built projectile per weapon template; launches clone these.
    weapon_prototypes: Vec<Entity>,
    pending_weapons: Vec<Entity>,
    next_id: u32,
}

impl World {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            props: Vec::new(),
            npcs: Vec::new(),
            players: Vec::new(),
            weapons: Vec::new(),
            weapon_prototypes: Vec::new(),
            pending_weapons: Vec::new(),
            next_id: 1,
        }
    }

    /// Builds every group from the config tables. All sprites must already be
    /// in `cache`.
    pub fn populate<R: Rng + ?Sized>(
        config: &GameConfig,
        cache: &AssetCache,
        rng: &mut R,
    ) -> Result<Self, AssetError> {
        let mut world = Self::new(config.viewport());

        for template in &config.weapons {
            let prototype = Entity::weapon(EntityId(0), template, config.projectile_margin, cache)?;
            world.weapon_prototypes.push(prototype);
        }

        for instance in spray::spray_all(&config.props, rng) {
            let id = world.allocate_id();
            world.props.push(Entity::prop(id, &instance, cache)?);
        }
        for template in &config.npcs {
            let id = world.allocate_id();
            world.npcs.push(Entity::npc(id, template, cache)?);
        }
        for template in &config.players {
            let id = world.allocate_id();
            let shooter = Shooter {
                weapon_index: config.player_weapon_index,
                cooldown: Cooldown::new(config.laser_cooldown_ms),
            };
            world.players.push(Entity::player(id, template, shooter, cache)?);
        }

        for entity in world.npcs.iter().chain(&world.players) {
            if !world.viewport.contains(&entity.rect) {
                log::warn!("'{}' starts outside the viewport at {:?}", entity.name, entity.rect);
            }
        }

        let stats = world.stats();
        log::info!(
            "World populated: {} props, {} npcs, {} players, {} weapon templates",
            stats.props,
            stats.npcs,
            stats.players,
            world.weapon_prototypes.len()
        );
        Ok(world)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Puts a projectile straight into the weapon group, centered on `center`.
    /// `direction` overrides the template's own. Returns `None` for an unknown
    /// weapon index.
    pub fn spawn_weapon(
        &mut self,
        weapon_index: usize,
        center: Vec2,
        direction: Option<Vec2>,
    ) -> Option<EntityId> {
        let weapon = launch(
            &self.weapon_prototypes,
            &mut self.next_id,
            weapon_index,
            center,
            direction,
        )?;
        let id = weapon.id;
        self.weapons.push(weapon);
        Some(id)
    }

    pub fn step(&mut self, ctx: &StepContext<'_>) {
        let viewport = self.viewport;
        update_group(&mut self.props, ctx, viewport);
        update_group(&mut self.npcs, ctx, viewport);

        let fire = ctx.input.is_just_pressed(Key::Fire);
        for player in &mut self.players {
            if player.is_input_driven() {
                player.steer(ctx.input);
            }
            if fire {
                if let Some(shooter) = player.shooter.as_mut() {
                    if shooter.cooldown.try_fire(ctx.now_ms) {
                        match launch(
                            &self.weapon_prototypes,
                            &mut self.next_id,
                            shooter.weapon_index,
                            player.rect.mid_top(),
                            None,
                        ) {
                            Some(weapon) => self.pending_weapons.push(weapon),
                            None => log::warn!(
                                "Player '{}' has no weapon template {}",
                                player.name,
                                shooter.weapon_index
                            ),
                        }
                    }
                }
            }
            let _ = player.update(ctx.dt, ctx.phase, viewport);
        }

        update_group(&mut self.weapons, ctx, viewport);
        self.weapons.append(&mut self.pending_weapons);
    }

    /// Every live entity in draw order: props, NPCs, players, weapons.
    pub fn draw_order(&self) -> impl Iterator<Item = &Entity> {
        self.props
            .iter()
            .chain(&self.npcs)
            .chain(&self.players)
            .chain(&self.weapons)
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            props: self.props.len(),
            npcs: self.npcs.len(),
            players: self.players.len(),
            weapons: self.weapons.len(),
        }
    }
}

fn update_group(group: &mut Vec<Entity>, ctx: &StepContext<'_>, viewport: Viewport) {
    group.retain_mut(|entity| match entity.update(ctx.dt, ctx.phase, viewport) {
        UpdateOutcome::Alive => true,
        UpdateOutcome::Despawn => {
            log::debug!("Despawned {} #{}", entity.name, entity.id.0);
            false
        }
    });
}

fn launch(
    prototypes: &[Entity],
    next_id: &mut u32,
    weapon_index: usize,
    center: Vec2,
    direction: Option<Vec2>,
) -> Option<Entity> {
    let mut weapon = prototypes.get(weapon_index)?.clone();
    weapon.id = EntityId(*next_id);
    *next_id += 1;
    weapon.rect.center = center;
    if let Some(direction) = direction {
        weapon.direction = direction.normalize_or_zero();
        weapon.facing = Facing::from_direction(weapon.direction);
    }
    Some(weapon)
}
