//! glTF / GLB and image decoding into scene nodes and textures

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use base64::Engine;
use glam::{Quat, Vec2, Vec3};
use gltf::image::Format;
use gltf::mesh::Mode;
use shared::Color;
use tracing::warn;

use crate::error::LoadError;
use crate::scene::{Geometry, Material, Mesh, NodeTransform, SceneNode, Texture};

/// Decode `.glb` bytes or a self-contained `.gltf` document
pub fn decode_asset(bytes: &[u8], path: &str) -> Result<SceneNode, LoadError> {
    decode_asset_with(bytes, path, &HashMap::new())
}

/// Files a `.gltf` document references by URI, resolved next to `path`.
/// Empty for `.glb` files and documents with only embedded data.
pub fn external_resources(bytes: &[u8], path: &str) -> Result<Vec<String>, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::decode(path, e))?;
    let buffer_uris = gltf.buffers().filter_map(|b| match b.source() {
        gltf::buffer::Source::Uri(uri) => Some(uri),
        gltf::buffer::Source::Bin => None,
    });
    let image_uris = gltf.images().filter_map(|i| match i.source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri),
        gltf::image::Source::View { .. } => None,
    });

    let mut resources = Vec::new();
    for uri in buffer_uris.chain(image_uris) {
        if uri.starts_with("data:") {
            continue;
        }
        let resolved = resolve_uri(path, uri);
        if !resources.contains(&resolved) {
            resources.push(resolved);
        }
    }
    Ok(resources)
}

/// Decode with the external files already fetched, keyed by the paths
/// [`external_resources`] returned
pub fn decode_asset_with(
    bytes: &[u8],
    path: &str,
    resources: &HashMap<String, Vec<u8>>,
) -> Result<SceneNode, LoadError> {
    let gltf::Gltf { document, mut blob } =
        gltf::Gltf::from_slice(bytes).map_err(|e| LoadError::decode(path, e))?;

    let mut buffers = Vec::new();
    for buffer in document.buffers() {
        let mut data = match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .take()
                .ok_or_else(|| LoadError::decode(path, "missing binary chunk"))?,
            gltf::buffer::Source::Uri(uri) => read_uri(uri, path, resources)?,
        };
        if data.len() < buffer.length() {
            return Err(LoadError::decode(
                path,
                format!("buffer {} is shorter than declared", buffer.index()),
            ));
        }
        // accessors read in 4-byte units
        while data.len() % 4 != 0 {
            data.push(0);
        }
        buffers.push(gltf::buffer::Data(data));
    }

    let images = document
        .images()
        .map(|img| read_image(&img, &buffers, path, resources))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(build_scene(&document, &buffers, &images, path))
}

/// Resolve a relative `uri` against the directory of `base`
pub fn resolve_uri(base: &str, uri: &str) -> String {
    if uri.contains("://") || uri.starts_with('/') {
        return uri.to_string();
    }
    match base.rfind('/') {
        Some(i) => format!("{}{}", &base[..=i], uri),
        None => uri.to_string(),
    }
}

fn read_uri(
    uri: &str,
    path: &str,
    resources: &HashMap<String, Vec<u8>>,
) -> Result<Vec<u8>, LoadError> {
    if let Some(data) = uri.strip_prefix("data:") {
        let (header, payload) = data
            .split_once(',')
            .ok_or_else(|| LoadError::decode(path, "malformed data URI"))?;
        if header.ends_with(";base64") {
            return base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| LoadError::decode(path, e));
        }
        return Ok(payload.as_bytes().to_vec());
    }
    let resolved = resolve_uri(path, uri);
    resources
        .get(&resolved)
        .cloned()
        .ok_or_else(|| LoadError::transport(resolved, "referenced file was not fetched"))
}

fn read_image(
    img: &gltf::Image,
    buffers: &[gltf::buffer::Data],
    path: &str,
    resources: &HashMap<String, Vec<u8>>,
) -> Result<gltf::image::Data, LoadError> {
    let encoded = match img.source() {
        gltf::image::Source::View { view, .. } => {
            let start = view.offset();
            buffers
                .get(view.buffer().index())
                .and_then(|data| data.get(start..start + view.length()))
                .ok_or_else(|| LoadError::decode(path, "image view out of range"))?
                .to_vec()
        }
        gltf::image::Source::Uri { uri, .. } => read_uri(uri, path, resources)?,
    };
    let rgba = image::load_from_memory(&encoded)
        .map_err(|e| LoadError::decode(path, e))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(gltf::image::Data {
        pixels: rgba.into_raw(),
        format: Format::R8G8B8A8,
        width,
        height,
    })
}

/// Import from the filesystem; external buffers resolve relative to `path`
pub fn import_file(path: &Path) -> Result<SceneNode, LoadError> {
    let label = path.display().to_string();
    let (document, buffers, images) = gltf::import(path).map_err(|e| match e {
        gltf::Error::Io(io) => LoadError::transport(label.clone(), io),
        other => LoadError::decode(label.clone(), other),
    })?;
    Ok(build_scene(&document, &buffers, &images, &label))
}

/// Decode PNG / JPEG bytes into an RGBA8 texture
pub fn decode_texture(bytes: &[u8], path: &str) -> Result<Texture, LoadError> {
    let img = image::load_from_memory(bytes).map_err(|e| LoadError::decode(path, e))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Texture::new(width, height, rgba.into_raw(), path))
}

struct ImportContext<'a> {
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
    source: &'a str,
    textures: HashMap<usize, Rc<Texture>>,
}

fn build_scene(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    source: &str,
) -> SceneNode {
    let mut ctx = ImportContext {
        buffers,
        images,
        source,
        textures: HashMap::new(),
    };

    let mut root = SceneNode::group(file_stem(source));
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                root.add_child(convert_node(&node, &mut ctx));
            }
        }
        None => warn!("glTF '{}' has no scenes", source),
    }
    root
}

fn convert_node(node: &gltf::Node, ctx: &mut ImportContext) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut out = SceneNode::group(node.name().unwrap_or_default());
    out.transform = NodeTransform {
        translation: Vec3::from(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from(scale),
    };

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or_default().to_string();
        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != Mode::Triangles {
                warn!(
                    "skipping non-triangle primitive {} of '{}' in {}",
                    i, mesh_name, ctx.source
                );
                continue;
            }
            if let Some(geometry) = read_geometry(&primitive, ctx.buffers) {
                let material = read_material(&primitive.material(), ctx);
                let name = if i == 0 {
                    mesh_name.clone()
                } else {
                    format!("{}_{}", mesh_name, i)
                };
                out.add_child(SceneNode::with_mesh(name, Mesh::new(geometry, material)));
            }
        }
    }

    for child in node.children() {
        out.add_child(convert_node(&child, ctx));
    }
    out
}

fn read_geometry(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<Geometry> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));

    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
    let normals = reader
        .read_normals()
        .map(|it| it.map(Vec3::from).collect())
        .unwrap_or_default();
    let uvs = reader
        .read_tex_coords(0)
        .map(|it| it.into_f32().map(Vec2::from).collect())
        .unwrap_or_default();
    let indices = reader
        .read_indices()
        .map(|it| it.into_u32().collect())
        .unwrap_or_default();

    Some(Geometry {
        positions,
        normals,
        uvs,
        indices,
    })
}

fn read_material(material: &gltf::Material, ctx: &mut ImportContext) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let mut out = Material::with_color(Color::new(
        to_u8(r),
        to_u8(g),
        to_u8(b),
    ));

    if let Some(info) = pbr.base_color_texture() {
        let index = info.texture().source().index();
        if let Some(texture) = image_texture(index, ctx) {
            out.map = Some(texture);
        }
    }
    out
}

fn image_texture(index: usize, ctx: &mut ImportContext) -> Option<Rc<Texture>> {
    if let Some(tex) = ctx.textures.get(&index) {
        return Some(tex.clone());
    }
    let data = ctx.images.get(index)?;
    let Some(rgba) = to_rgba8(data) else {
        warn!(
            "unsupported image format {:?} (image {}) in {}",
            data.format, index, ctx.source
        );
        return None;
    };
    let tex = Rc::new(Texture::new(
        data.width,
        data.height,
        rgba,
        format!("{}#image{}", ctx.source, index),
    ));
    ctx.textures.insert(index, tex.clone());
    Some(tex)
}

fn to_rgba8(data: &gltf::image::Data) -> Option<Vec<u8>> {
    let px = &data.pixels;
    match data.format {
        Format::R8G8B8A8 => Some(px.clone()),
        Format::R8G8B8 => Some(
            px.chunks_exact(3)
                .flat_map(|c| [c[0], c[1], c[2], 255])
                .collect(),
        ),
        Format::R8G8 => Some(
            px.chunks_exact(2)
                .flat_map(|c| [c[0], c[0], c[0], c[1]])
                .collect(),
        ),
        Format::R8 => Some(px.iter().flat_map(|&v| [v, v, v, 255]).collect()),
        _ => None,
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    /// Single red triangle, buffer embedded as a data URI
    fn triangle_gltf(translation: [f32; 3]) -> String {
        let data = base64::engine::general_purpose::STANDARD.encode(fixtures::triangle_buffer());
        fixtures::triangle_gltf(
            &format!("data:application/octet-stream;base64,{data}"),
            translation,
        )
    }

    #[test]
    fn test_decode_embedded_triangle() {
        let json = triangle_gltf([3.0, 0.0, 0.0]);
        let root = decode_asset(json.as_bytes(), "models/tri.gltf").unwrap();

        assert_eq!(root.name, "tri");
        assert_eq!(root.mesh_count(), 1);

        let node = &root.children[0];
        assert_eq!(node.transform.translation, Vec3::new(3.0, 0.0, 0.0));
        let mesh = node.children[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.geometry.vertex_count(), 3);
        assert_eq!(mesh.geometry.triangle_count(), 1);
        assert_eq!(mesh.material.color, Color::from_hex(0xff0000));

        let bb = root.bounding_box().unwrap();
        assert_eq!(bb.min, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(bb.max, Vec3::new(4.0, 1.0, 0.0));
    }

    #[test]
    fn test_external_buffer_resolves_next_to_document() {
        let json = fixtures::triangle_gltf("tri.bin", [0.0; 3]);
        let path = "models/chair.gltf";
        assert_eq!(
            external_resources(json.as_bytes(), path).unwrap(),
            vec!["models/tri.bin"]
        );

        let mut resources = HashMap::new();
        resources.insert("models/tri.bin".to_string(), fixtures::triangle_buffer());
        let root = decode_asset_with(json.as_bytes(), path, &resources).unwrap();
        assert_eq!(root.name, "chair");
        assert_eq!(root.mesh_count(), 1);
    }

    #[test]
    fn test_unfetched_external_buffer_is_transport_error() {
        let json = fixtures::triangle_gltf("tri.bin", [0.0; 3]);
        let err = decode_asset(json.as_bytes(), "models/chair.gltf").unwrap_err();
        assert!(matches!(err, LoadError::Transport { ref path, .. } if path == "models/tri.bin"));
    }

    #[test]
    fn test_embedded_document_has_no_external_resources() {
        let json = triangle_gltf([0.0; 3]);
        assert!(external_resources(json.as_bytes(), "tri.gltf").unwrap().is_empty());
    }

    #[test]
    fn test_short_buffer_is_decode_error() {
        let json = fixtures::triangle_gltf("tri.bin", [0.0; 3]);
        let mut resources = HashMap::new();
        resources.insert("tri.bin".to_string(), vec![0u8; 8]);
        let err = decode_asset_with(json.as_bytes(), "tri.gltf", &resources).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_resolve_uri() {
        assert_eq!(resolve_uri("models/chair.gltf", "chair.bin"), "models/chair.bin");
        assert_eq!(resolve_uri("chair.gltf", "tex/wood.png"), "tex/wood.png");
        assert_eq!(resolve_uri("a/b.gltf", "/assets/c.bin"), "/assets/c.bin");
        assert_eq!(
            resolve_uri("a/b.gltf", "https://cdn.example.com/c.bin"),
            "https://cdn.example.com/c.bin"
        );
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_asset(b"not a model", "bad.glb").unwrap_err();
        assert!(matches!(err, LoadError::Decode { ref path, .. } if path == "bad.glb"));
    }

    #[test]
    fn test_decode_png_texture() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let tex = decode_texture(&png, "wood.png").unwrap();
        assert_eq!((tex.width, tex.height), (2, 3));
        assert_eq!(&tex.rgba[..4], &[10, 20, 30, 255]);
        assert_eq!(tex.source, "wood.png");
    }

    #[test]
    fn test_rgb_expands_to_rgba() {
        let data = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: Format::R8G8B8,
            width: 2,
            height: 1,
        };
        assert_eq!(to_rgba8(&data).unwrap(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
