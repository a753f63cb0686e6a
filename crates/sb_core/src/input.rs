//! Keyboard state with both level-triggered and edge-triggered queries.
//!
//! - **Held:** `is_held(key)` is true every frame the key is physically down.
//!   Steering reads this.
//! - **Just pressed:** true only on the frame the press happened. Firing reads
//!   `is_just_pressed` so holding the fire key does not auto-repeat. Releases
//!   are tracked the same way. Transients are cleared by `end_frame()`, which the main loop
//!   calls after the frame's update pass has consumed them.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Fire,
    Escape,
    ToggleOverlay,
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        // OS key repeat delivers extra presses while held; only the first counts.
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    #[cfg(test)]
    fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    /// `+1.0` when only `positive` is held, `-1.0` when only `negative` is held,
    /// `0.0` when neither or both are.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        let pos = if self.is_held(positive) { 1.0 } else { 0.0 };
        let neg = if self.is_held(negative) { 1.0 } else { 0.0 };
        pos - neg
    }

    /// Drops all held keys, e.g. when the window loses focus and key-up events
    /// would otherwise never arrive.
    pub fn release_all(&mut self) {
        for key in self.held.drain() {
            self.just_released.insert(key);
        }
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::Fire);
        assert!(input.is_held(Key::Fire));
        assert!(input.is_just_pressed(Key::Fire));
    }

    #[test]
    fn key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        input.key_up(Key::Left);
        assert!(!input.is_held(Key::Left));
        assert!(input.is_just_released(Key::Left));
    }

    #[test]
    fn repeated_key_down_after_end_frame_is_not_a_new_press() {
        let mut input = InputState::new();
        input.key_down(Key::Fire);
        input.end_frame();
        // OS auto-repeat while the key stays down.
        input.key_down(Key::Fire);
        assert!(input.is_held(Key::Fire));
        assert!(!input.is_just_pressed(Key::Fire));
    }

    #[test]
    fn key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Up);
        assert!(!input.is_just_released(Key::Up));
        assert!(!input.is_held(Key::Up));
    }

    #[test]
    fn end_frame_keeps_held_and_clears_transients() {
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::Fire);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Right));
        assert!(!input.is_just_pressed(Key::Fire));
        assert!(input.is_held(Key::Right));
        assert!(input.is_held(Key::Fire));
    }

    #[test]
    fn axis_combines_opposing_keys() {
        let mut input = InputState::new();
        assert_eq!(input.axis(Key::Left, Key::Right), 0.0);
        input.key_down(Key::Right);
        assert_eq!(input.axis(Key::Left, Key::Right), 1.0);
        input.key_down(Key::Left);
        assert_eq!(input.axis(Key::Left, Key::Right), 0.0);
        input.key_up(Key::Right);
        assert_eq!(input.axis(Key::Left, Key::Right), -1.0);
    }

    #[test]
    fn release_all_reports_every_held_key() {
        let mut input = InputState::new();
        input.key_down(Key::Up);
        input.key_down(Key::Left);
        input.end_frame();
        input.release_all();
        assert!(!input.is_held(Key::Up));
        assert!(!input.is_held(Key::Left));
        assert!(input.is_just_released(Key::Up));
        assert!(input.is_just_released(Key::Left));
    }
}
