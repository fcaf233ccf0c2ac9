use glam::{Mat4, Vec3};

/// Perspective camera looking at a target point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    /// Camera on the +Z axis at `distance`, looking at the origin
    pub fn new(aspect: f32, distance: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, distance),
            target: Vec3::ZERO,
            fov: 75.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect for a new surface size; zero height is ignored
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_camera_on_z_axis() {
        let cam = PerspectiveCamera::new(1.5, 5.0);
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(cam.distance(), 5.0);
        assert!((cam.fov.to_degrees() - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_view_maps_target_in_front() {
        let cam = PerspectiveCamera::new(1.0, 5.0);
        let p = cam.view_matrix().transform_point3(Vec3::ZERO);
        assert!((p.z + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_height_keeps_aspect() {
        let mut cam = PerspectiveCamera::new(2.0, 5.0);
        cam.set_viewport_size(800, 0);
        assert_eq!(cam.aspect, 2.0);
        cam.set_viewport_size(800, 400);
        assert_eq!(cam.aspect, 2.0);
        cam.set_viewport_size(300, 300);
        assert_eq!(cam.aspect, 1.0);
    }
}
