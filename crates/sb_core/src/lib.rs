pub mod input;
pub mod phase;
pub mod rect;
pub mod time;

pub use glam::Vec2;
