use glam::Mat4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed screen-space camera: world units are logical pixels, origin at the
/// top-left corner of the play field, y pointing down.
pub struct ScreenCamera {
    pub viewport: (f32, f32),
}

impl ScreenCamera {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn projection(&self) -> Mat4 {
        // bottom = height, top = 0 flips y so screen-down maps to NDC-down.
        Mat4::orthographic_rh(0.0, self.viewport.0, self.viewport.1, 0.0, -1.0, 1.0)
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn to_ndc(camera: &ScreenCamera, x: f32, y: f32) -> (f32, f32) {
        let clip = camera.projection() * Vec4::new(x, y, 0.0, 1.0);
        (clip.x / clip.w, clip.y / clip.w)
    }

    #[test]
    fn top_left_maps_to_ndc_top_left() {
        let camera = ScreenCamera::new(1280.0, 720.0);
        let (x, y) = to_ndc(&camera, 0.0, 0.0);
        assert!((x + 1.0).abs() < 1e-5);
        assert!((y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn bottom_right_maps_to_ndc_bottom_right() {
        let camera = ScreenCamera::new(1280.0, 720.0);
        let (x, y) = to_ndc(&camera, 1280.0, 720.0);
        assert!((x - 1.0).abs() < 1e-5);
        assert!((y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn center_maps_to_origin() {
        let camera = ScreenCamera::new(1640.0, 860.0);
        let (x, y) = to_ndc(&camera, 820.0, 430.0);
        assert!(x.abs() < 1e-5);
        assert!(y.abs() < 1e-5);
    }
}
