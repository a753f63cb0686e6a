//! CPU-side sprite batching.
//!
//! The frame's sprites are appended as quads in draw order. Consecutive quads
//! sharing a texture collapse into one `DrawCall`, so a group of identical
//! props costs a single `draw_indexed`.

use std::sync::Arc;

use crate::vertex::SpriteVertex;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct QuadSpec<'a> {
    pub texture_key: &'a str,
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Default)]
pub struct SpriteBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            draw_calls: Vec::with_capacity(16),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Appends an axis-aligned quad in screen space (y down).
    pub fn push_quad(&mut self, spec: QuadSpec<'_>) {
        let half_w = spec.width * 0.5;
        let half_h = spec.height * 0.5;
        let left = spec.center_x - half_w;
        let right = spec.center_x + half_w;
        let top = spec.center_y - half_h;
        let bottom = spec.center_y + half_h;
        let base_index = self.vertices.len() as u32;

        let corners = [
            ([left, top], [0.0, 0.0]),
            ([right, top], [1.0, 0.0]),
            ([right, bottom], [1.0, 1.0]),
            ([left, bottom], [0.0, 1.0]),
        ];
        self.vertices
            .extend(corners.iter().map(|&(position, tex_coords)| SpriteVertex {
                position,
                tex_coords,
                color: spec.color,
            }));

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        self.push_draw_call(spec.texture_key, draw_start, 6);
    }

    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(texture_key: &str, center_x: f32) -> QuadSpec<'_> {
        QuadSpec {
            texture_key,
            center_x,
            center_y: 10.0,
            width: 4.0,
            height: 2.0,
            color: [1.0; 4],
        }
    }

    #[test]
    fn push_quad_emits_four_vertices_and_six_indices() {
        let mut batch = SpriteBatch::default();
        batch.push_quad(quad("a", 0.0));
        assert_eq!(batch.vertices.len(), 4);
        assert_eq!(batch.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(batch.vertices[0].position, [-2.0, 9.0]);
        assert_eq!(batch.vertices[2].position, [2.0, 11.0]);
        assert_eq!(batch.vertices[0].tex_coords, [0.0, 0.0]);
        assert_eq!(batch.vertices[2].tex_coords, [1.0, 1.0]);
    }

    #[test]
    fn consecutive_same_texture_quads_merge() {
        let mut batch = SpriteBatch::default();
        batch.push_quad(quad("flower", 0.0));
        batch.push_quad(quad("flower", 10.0));
        batch.push_quad(quad("flower", 20.0));
        assert_eq!(batch.draw_calls.len(), 1);
        assert_eq!(batch.draw_calls[0].index_count, 18);
        assert_eq!(batch.quad_count(), 3);
    }

    #[test]
    fn texture_change_starts_new_draw_call() {
        let mut batch = SpriteBatch::default();
        batch.push_quad(quad("a", 0.0));
        batch.push_quad(quad("b", 0.0));
        batch.push_quad(quad("a", 0.0));
        let keys: Vec<&str> = batch.draw_calls.iter().map(|d| &*d.texture_key).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
        assert_eq!(batch.draw_calls[2].index_start, 12);
    }

    #[test]
    fn clear_resets_everything() {
        let mut batch = SpriteBatch::with_capacity(4);
        batch.push_quad(quad("a", 0.0));
        batch.clear();
        assert_eq!(batch.quad_count(), 0);
        assert!(batch.indices.is_empty());
        assert!(batch.draw_calls.is_empty());
    }
}
