//! Center-anchored axis-aligned rectangle in screen space (y grows downward).

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub center: Vec2,
    pub half_w: f32,
    pub half_h: f32,
}

impl Rect {
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center,
            half_w: width * 0.5,
            half_h: height * 0.5,
        }
    }

    pub fn width(&self) -> f32 {
        self.half_w * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_h * 2.0
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.half_w
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.half_w
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.half_h
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.half_h
    }

    pub fn set_left(&mut self, x: f32) {
        self.center.x = x + self.half_w;
    }

    pub fn set_right(&mut self, x: f32) {
        self.center.x = x - self.half_w;
    }

    pub fn set_top(&mut self, y: f32) {
        self.center.y = y + self.half_h;
    }

    pub fn set_bottom(&mut self, y: f32) {
        self.center.y = y - self.half_h;
    }

    /// Midpoint of the top edge; projectiles launch from here.
    pub fn mid_top(&self) -> Vec2 {
        Vec2::new(self.center.x, self.top())
    }
}

/// Fixed-size play area anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, rect: &Rect) -> bool {
        rect.left() >= 0.0
            && rect.top() >= 0.0
            && rect.right() <= self.width
            && rect.bottom() <= self.height
    }
}
