//! Studio lighting rig used by every viewport

use glam::{Mat4, Vec3};
use shared::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// Light shines from here towards the origin
    pub position: Vec3,
    pub cast_shadow: bool,
    /// Shadow map resolution (square)
    pub shadow_map_size: u32,
}

/// Half extent of the directional light's orthographic shadow volume
pub const SHADOW_CAMERA_EXTENT: f32 = 5.0;
pub const SHADOW_CAMERA_NEAR: f32 = 0.5;
pub const SHADOW_CAMERA_FAR: f32 = 500.0;

impl DirectionalLight {
    /// Light-space transform the shadow map is rendered with: an orthographic
    /// box looking from `position` at the origin
    pub fn shadow_view_projection(&self) -> Mat4 {
        let up = if self.position.normalize_or_zero().abs_diff_eq(Vec3::Y, 1e-4) {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, Vec3::ZERO, up);
        let e = SHADOW_CAMERA_EXTENT;
        let projection =
            Mat4::orthographic_rh_gl(-e, e, -e, e, SHADOW_CAMERA_NEAR, SHADOW_CAMERA_FAR);
        projection * view
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
}

/// The four lights every viewport scene carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub point: PointLight,
    pub hemisphere: HemisphereLight,
}

impl LightRig {
    /// Soft ambient fill, a shadow-casting key light, a rim highlight and a
    /// sky/ground hemisphere for color balance.
    pub fn studio() -> Self {
        Self {
            ambient: AmbientLight {
                color: Color::from_hex(0x404040),
                intensity: 0.6,
            },
            directional: DirectionalLight {
                color: Color::WHITE,
                intensity: 0.8,
                position: Vec3::new(10.0, 10.0, 5.0),
                cast_shadow: true,
                shadow_map_size: 2048,
            },
            point: PointLight {
                color: Color::WHITE,
                intensity: 0.5,
                position: Vec3::new(-10.0, 10.0, -5.0),
            },
            hemisphere: HemisphereLight {
                sky_color: Color::WHITE,
                ground_color: Color::from_hex(0x444444),
                intensity: 0.4,
            },
        }
    }

    pub fn light_count(&self) -> usize {
        4
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::studio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_volume_covers_normalized_asset() {
        let light = LightRig::studio().directional;
        let m = light.shadow_view_projection();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    let p = m.project_point3(Vec3::new(x, y, z));
                    assert!(p.x.abs() < 1.0 && p.y.abs() < 1.0 && p.z.abs() < 1.0);
                }
            }
        }
    }

    #[test]
    fn test_shadow_depth_grows_away_from_light() {
        let light = LightRig::studio().directional;
        let m = light.shadow_view_projection();
        let towards = light.position.normalize();
        let near = m.project_point3(towards);
        let far = m.project_point3(-towards);
        assert!(near.z < far.z);
        assert!(m.project_point3(Vec3::ZERO).truncate().length() < 1e-5);
    }

    #[test]
    fn test_overhead_light_has_valid_view() {
        let light = DirectionalLight {
            position: Vec3::new(0.0, 10.0, 0.0),
            ..LightRig::studio().directional
        };
        assert!(light.shadow_view_projection().is_finite());
    }
}
