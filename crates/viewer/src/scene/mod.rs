//! Scene graph: the loaded asset, lights, background and fog

mod aabb;
mod lights;
mod node;

pub use aabb::Aabb;
pub use lights::{
    AmbientLight, DirectionalLight, HemisphereLight, LightRig, PointLight, SHADOW_CAMERA_EXTENT,
    SHADOW_CAMERA_FAR, SHADOW_CAMERA_NEAR,
};
pub use node::{Geometry, Material, Mesh, MeshId, NodeTransform, SceneNode, Texture, TextureId};

use shared::Color;

/// Largest bounding-box dimension of every loaded asset after normalization
pub const ASSET_TARGET_SIZE: f32 = 2.0;

/// Linear distance fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

/// Everything the renderer draws for one viewport
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    pub fog: Fog,
    pub lights: LightRig,
    /// The single loaded asset, if any
    pub model: Option<SceneNode>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            fog: Fog {
                color: background,
                near: 10.0,
                far: 50.0,
            },
            lights: LightRig::studio(),
            model: None,
        }
    }

    /// Clear `needs_update` on every material after the renderer consumed it
    pub fn clear_dirty(&mut self) {
        if let Some(model) = &mut self.model {
            model.traverse_meshes_mut(&mut |mesh| mesh.material.needs_update = false);
        }
    }
}
