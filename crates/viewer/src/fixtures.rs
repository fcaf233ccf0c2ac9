//! Factory functions for test assets and option catalogs.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use shared::{Color, ColorOption, ConfiguratorOptions, MaterialOption, ModelOption};

use crate::scene::{Geometry, Material, Mesh, SceneNode, Texture};

// ── Geometry ────────────────────────────────────────────────────

/// Axis-aligned box centered on the local origin, outward CCW faces
pub fn box_geometry(size: Vec3) -> Geometry {
    let half = size * 0.5;
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut geometry = Geometry::default();
    for (normal, u, v) in faces {
        let base = geometry.positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            geometry.positions.push((normal + u * su + v * sv) * half);
            geometry.normals.push(normal);
            geometry
                .uvs
                .push(Vec2::new((su + 1.0) * 0.5, (sv + 1.0) * 0.5));
        }
        geometry
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    geometry
}

// ── Assets ──────────────────────────────────────────────────────

/// Node holding one box mesh, translated to `position`
pub fn box_node(name: &str, size: Vec3, position: Vec3) -> SceneNode {
    let mut node = SceneNode::with_mesh(
        name,
        Mesh::new(box_geometry(size), Material::with_color(Color::WHITE)),
    );
    node.transform.translation = position;
    node
}

/// Two-mesh asset far from the origin: a 4x1x2 body at (10, 5, -3) with a
/// unit handle on top. Bounds span x 8..12, y 4.5..6.5, z -4..-2.
pub fn offset_product() -> SceneNode {
    let mut root = SceneNode::group("product");
    root.add_child(box_node(
        "body",
        Vec3::new(4.0, 1.0, 2.0),
        Vec3::new(10.0, 5.0, -3.0),
    ));
    root.add_child(box_node("handle", Vec3::ONE, Vec3::new(10.0, 6.0, -3.0)));
    root
}

/// Single unit cube at the origin
pub fn unit_cube() -> SceneNode {
    let mut root = SceneNode::group("cube");
    root.add_child(box_node("cube", Vec3::ONE, Vec3::ZERO));
    root
}

/// Vertex positions of a unit right triangle in the XY plane, as
/// little-endian f32
pub fn triangle_buffer() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    positions.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// glTF document with one red triangle node at `translation`; its buffer
/// (see [`triangle_buffer`]) is read from `buffer_uri`
pub fn triangle_gltf(buffer_uri: &str, translation: [f32; 3]) -> String {
    let len = triangle_buffer().len();
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "tri", "mesh": 0, "translation": [{}, {}, {}] }}],
  "meshes": [{{ "name": "tri", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }}],
  "materials": [{{ "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }} }}],
  "buffers": [{{ "byteLength": {len}, "uri": "{buffer_uri}" }}],
  "bufferViews": [{{ "buffer": 0, "byteOffset": 0, "byteLength": {len} }}],
  "accessors": [{{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }}]
}}"#,
        translation[0], translation[1], translation[2],
    )
}

/// 2x2 texture filled with `rgba`
pub fn solid_texture(source: &str, rgba: [u8; 4]) -> Texture {
    Texture::new(2, 2, rgba.repeat(4), source)
}

// ── Catalogs ────────────────────────────────────────────────────

/// Catalog with three models, three materials and three colors.
///
/// `lamp` has no asset path and `plain` has no texture.
pub fn sample_catalog() -> ConfiguratorOptions {
    let mut models = BTreeMap::new();
    models.insert(
        "chair".to_string(),
        ModelOption {
            name: "Chair".to_string(),
            thumbnail: Some("thumbs/chair.png".to_string()),
            path: Some("models/chair.glb".to_string()),
        },
    );
    models.insert(
        "table".to_string(),
        ModelOption {
            name: "Table".to_string(),
            thumbnail: None,
            path: Some("models/table.glb".to_string()),
        },
    );
    models.insert(
        "lamp".to_string(),
        ModelOption {
            name: "Lamp".to_string(),
            thumbnail: None,
            path: None,
        },
    );

    let mut materials = BTreeMap::new();
    materials.insert(
        "oak".to_string(),
        MaterialOption {
            name: "Oak".to_string(),
            thumbnail: Some("thumbs/oak.png".to_string()),
            texture: Some("textures/oak.jpg".to_string()),
        },
    );
    materials.insert(
        "fabric".to_string(),
        MaterialOption {
            name: "Fabric".to_string(),
            thumbnail: None,
            texture: Some("textures/fabric.png".to_string()),
        },
    );
    materials.insert(
        "plain".to_string(),
        MaterialOption {
            name: "Plain".to_string(),
            thumbnail: None,
            texture: None,
        },
    );

    let mut colors = BTreeMap::new();
    for (key, name, hex) in [
        ("red", "Red", 0xff0000),
        ("navy", "Navy", 0x1f2a44),
        ("white", "White", 0xffffff),
    ] {
        colors.insert(
            key.to_string(),
            ColorOption {
                name: name.to_string(),
                value: Color::from_hex(hex),
            },
        );
    }

    ConfiguratorOptions {
        models,
        materials,
        colors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_geometry_counts() {
        let g = box_geometry(Vec3::ONE);
        assert_eq!(g.vertex_count(), 24);
        assert_eq!(g.triangle_count(), 12);
        assert_eq!(g.uvs.len(), 24);
    }

    #[test]
    fn test_box_geometry_bounds() {
        let bb = box_geometry(Vec3::new(4.0, 1.0, 2.0)).local_bounds().unwrap();
        assert_eq!(bb.min, Vec3::new(-2.0, -0.5, -1.0));
        assert_eq!(bb.max, Vec3::new(2.0, 0.5, 1.0));
    }

    #[test]
    fn test_box_faces_wind_outward() {
        let g = box_geometry(Vec3::splat(2.0));
        for tri in g.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| g.positions[i as usize]);
            let face_normal = (b - a).cross(c - a).normalize();
            assert!(face_normal.dot(g.normals[tri[0] as usize]) > 0.99);
        }
    }

    #[test]
    fn test_offset_product_bounds() {
        let bb = offset_product().bounding_box().unwrap();
        assert_eq!(bb.min, Vec3::new(8.0, 4.5, -4.0));
        assert_eq!(bb.max, Vec3::new(12.0, 6.5, -2.0));
    }
}
