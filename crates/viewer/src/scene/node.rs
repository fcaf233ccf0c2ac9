use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use shared::Color;

use super::aabb::Aabb;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a mesh's GPU resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    pub fn next() -> Self {
        MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of a texture's GPU resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    pub fn next() -> Self {
        TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Decoded RGBA8 image, rows top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Where the texture came from, for diagnostics
    pub source: String,
}

impl Texture {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>, source: impl Into<String>) -> Self {
        Self {
            id: TextureId::next(),
            width,
            height,
            rgba,
            source: source.into(),
        }
    }
}

/// Surface appearance of one mesh.
///
/// Mutations go through the setters so the material is flagged for
/// re-upload; the renderer reads `needs_update` and the viewport clears it
/// after the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub map: Option<Rc<Texture>>,
    pub needs_update: bool,
    /// Bumped on every change
    pub version: u64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            map: None,
            needs_update: false,
            version: 0,
        }
    }
}

impl Material {
    pub fn with_color(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.mark_dirty();
    }

    pub fn set_map(&mut self, texture: Rc<Texture>) {
        self.map = Some(texture);
        self.mark_dirty();
    }

    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
        self.version += 1;
    }
}

/// Triangle geometry in node-local space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    pub fn local_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Interleaved `[pos(3), normal(3), uv(2)]` vertex stream
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.positions.len() * 8);
        for (i, p) in self.positions.iter().enumerate() {
            let n = self.normals.get(i).copied().unwrap_or(Vec3::Y);
            let uv = self.uvs.get(i).copied().unwrap_or(Vec2::ZERO);
            out.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, uv.x, uv.y]);
        }
        out
    }
}

/// Renderable surface: geometry plus its own material
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub id: MeshId,
    pub geometry: Geometry,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            id: MeshId::next(),
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Translation / rotation / scale of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl NodeTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// A node of a loaded asset's scene graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: NodeTransform,
    pub mesh: Option<Mesh>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            ..Default::default()
        }
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Set rotation from XYZ Euler angles in radians
    pub fn set_rotation_euler(&mut self, euler: Vec3) {
        self.transform.rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
    }

    /// Visit every mesh with its transform relative to `parent`'s space
    pub fn visit_meshes<F: FnMut(&Mesh, &Mat4)>(&self, parent: &Mat4, f: &mut F) {
        let world = *parent * self.transform.matrix();
        if let Some(mesh) = &self.mesh {
            f(mesh, &world);
        }
        for child in &self.children {
            child.visit_meshes(&world, f);
        }
    }

    /// Mutable pre-order walk over every mesh in the subtree
    pub fn traverse_meshes_mut<F: FnMut(&mut Mesh)>(&mut self, f: &mut F) {
        if let Some(mesh) = &mut self.mesh {
            f(mesh);
        }
        for child in &mut self.children {
            child.traverse_meshes_mut(f);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit_meshes(&Mat4::IDENTITY, &mut |_, _| count += 1);
        count
    }

    pub fn mesh_ids(&self) -> Vec<MeshId> {
        let mut ids = Vec::new();
        self.visit_meshes(&Mat4::IDENTITY, &mut |m, _| ids.push(m.id));
        ids
    }

    /// Textures referenced by any material in the subtree, deduplicated
    pub fn texture_ids(&self) -> Vec<TextureId> {
        let mut ids = Vec::new();
        self.visit_meshes(&Mat4::IDENTITY, &mut |m, _| {
            if let Some(map) = &m.material.map {
                if !ids.contains(&map.id) {
                    ids.push(map.id);
                }
            }
        });
        ids
    }

    /// Bounds of all mesh vertices in the parent's space (own transform applied)
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        self.visit_meshes(&Mat4::IDENTITY, &mut |mesh, world| {
            if let Some(local) = mesh.geometry.local_bounds() {
                let b = local.transformed(world);
                bounds = Some(match bounds {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        });
        bounds
    }

    /// Uniformly scale so the largest bounding-box dimension equals
    /// `target_size`, then translate so the bounding-box center sits at the
    /// parent origin. Degenerate (zero-size) bounds are only recentered.
    /// Returns false when the subtree has no geometry.
    pub fn fit_to_size(&mut self, target_size: f32) -> bool {
        let Some(bounds) = self.bounding_box() else {
            return false;
        };

        let max_dim = bounds.max_dimension();
        if max_dim > f32::EPSILON && max_dim.is_finite() {
            self.transform.scale *= target_size / max_dim;
        }

        if let Some(scaled) = self.bounding_box() {
            self.transform.translation -= scaled.center();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::box_geometry;
    use approx::assert_relative_eq;

    fn offset_box() -> SceneNode {
        let mut root = SceneNode::group("root");
        let mut child = SceneNode::with_mesh(
            "body",
            Mesh::new(box_geometry(Vec3::new(4.0, 1.0, 2.0)), Material::default()),
        );
        child.transform.translation = Vec3::new(10.0, 5.0, -3.0);
        root.add_child(child);
        root
    }

    #[test]
    fn test_bounding_box_includes_child_transform() {
        let node = offset_box();
        let bb = node.bounding_box().unwrap();
        assert_relative_eq!(bb.center().x, 10.0);
        assert_relative_eq!(bb.center().y, 5.0);
        assert_relative_eq!(bb.size().x, 4.0);
    }

    #[test]
    fn test_fit_to_size_centers_and_scales() {
        let mut node = offset_box();
        assert!(node.fit_to_size(2.0));

        let bb = node.bounding_box().unwrap();
        assert_relative_eq!(bb.max_dimension(), 2.0, epsilon = 1e-5);
        assert_relative_eq!(bb.center().length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_fit_to_size_empty_group() {
        let mut node = SceneNode::group("empty");
        assert!(!node.fit_to_size(2.0));
        assert_eq!(node.transform, NodeTransform::default());
    }

    #[test]
    fn test_material_setters_mark_dirty() {
        let mut m = Material::default();
        assert!(!m.needs_update);
        m.set_color(Color::from_hex(0xff0000));
        assert!(m.needs_update);
        assert_eq!(m.version, 1);
        m.set_map(Rc::new(Texture::new(1, 1, vec![0, 0, 0, 255], "t.png")));
        assert_eq!(m.version, 2);
    }

    #[test]
    fn test_mesh_and_texture_ids() {
        let tex = Rc::new(Texture::new(1, 1, vec![255; 4], "shared.png"));
        let mut root = offset_box();
        let mut second = SceneNode::with_mesh(
            "second",
            Mesh::new(box_geometry(Vec3::ONE), Material::default()),
        );
        second.mesh.as_mut().unwrap().material.map = Some(tex.clone());
        root.children[0].mesh.as_mut().unwrap().material.map = Some(tex.clone());
        root.add_child(second);

        assert_eq!(root.mesh_count(), 2);
        assert_eq!(root.mesh_ids().len(), 2);
        assert_eq!(root.texture_ids(), vec![tex.id]);
    }
}
