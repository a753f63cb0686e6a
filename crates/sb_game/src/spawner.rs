//! Timer that drops meatballs from above the top edge at random intervals.

use glam::Vec2;
use rand::Rng;
use sb_core::rect::Viewport;

use crate::config::MeatballConfig;

#[derive(Debug, Clone)]
pub struct MeatballSpawner {
    weapon_index: usize,
    margin: f32,
    min_ms: u64,
    range_ms: u64,
    next_spawn_ms: u64,
}

impl MeatballSpawner {
    /// `None` when the config has no meatball weapon.
    pub fn new<R: Rng + ?Sized>(config: &MeatballConfig, now_ms: u64, rng: &mut R) -> Option<Self> {
        let weapon_index = config.weapon_index?;
        let mut spawner = Self {
            weapon_index,
            margin: config.spawn_margin,
            min_ms: config.spawn_min_ms,
            range_ms: config.spawn_range_ms,
            next_spawn_ms: 0,
        };
        spawner.schedule_next(now_ms, rng);
        Some(spawner)
    }

    pub fn weapon_index(&self) -> usize {
        self.weapon_index
    }

    pub fn next_spawn_ms(&self) -> u64 {
        self.next_spawn_ms
    }

    /// Returns a spawn point when the timer has expired, then re-arms with a
    /// fresh random interval. At most one spawn per call.
    pub fn poll<R: Rng + ?Sized>(&mut self, now_ms: u64, viewport: Viewport, rng: &mut R) -> Option<Vec2> {
        if now_ms < self.next_spawn_ms {
            return None;
        }
        let m = self.margin;
        let position = Vec2::new(
            rng.random_range(-m..=viewport.width + m),
            rng.random_range(-2.0 * m..=-m),
        );
        self.schedule_next(now_ms, rng);
        Some(position)
    }

    fn schedule_next<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) {
        self.next_spawn_ms = now_ms
            .saturating_add(self.min_ms)
            .saturating_add(rng.random_range(0..=self.range_ms));
    }
}
