//! OpenGL / WebGL2 renderer built on glow

use std::collections::HashMap;
use std::rc::Rc;

use glam::{Mat3, Mat4, Vec3};
use glow::HasContext;
use shared::Color;
use tracing::{debug, error};

use crate::backend::{FrameCapture, RenderBackend, Renderer, RendererSettings, ShadowMapKind};
use crate::camera::PerspectiveCamera;
use crate::error::{Result, ViewerError};
use crate::scene::{DirectionalLight, Mesh, MeshId, Scene, SceneNode, Texture, TextureId};

/// Creates [`GlRenderer`]s sharing one GL context
pub struct GlBackend {
    gl: Rc<glow::Context>,
}

impl GlBackend {
    pub fn new(gl: Rc<glow::Context>) -> Self {
        Self { gl }
    }
}

impl RenderBackend for GlBackend {
    fn create_renderer(&self, settings: &RendererSettings) -> Result<Box<dyn Renderer>> {
        Ok(Box::new(GlRenderer::new(self.gl.clone(), *settings)?))
    }
}

// ── GPU handles ──────────────────────────────────────────────

struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: Option<glow::Buffer>,
    /// Index count, or vertex count for non-indexed geometry
    count: i32,
}

/// Depth-only render target of the directional light
struct ShadowMap {
    fbo: glow::Framebuffer,
    depth: glow::Texture,
    size: u32,
}

/// One mesh to draw this frame
struct DrawItem {
    id: MeshId,
    world: Mat4,
    color: Vec3,
    map: Option<Rc<Texture>>,
    cast_shadow: bool,
    receive_shadow: bool,
}

// ── Main GL renderer ─────────────────────────────────────────

pub struct GlRenderer {
    gl: Rc<glow::Context>,
    program: glow::Program,
    shadow_program: glow::Program,
    shadow_map: Option<ShadowMap>,
    settings: RendererSettings,
    /// Surface size in CSS pixels
    size: (u32, u32),
    meshes: HashMap<MeshId, GpuMesh>,
    textures: HashMap<TextureId, glow::Texture>,
    disposed: bool,
}

impl GlRenderer {
    pub fn new(gl: Rc<glow::Context>, settings: RendererSettings) -> Result<Self> {
        let header = if gl.version().is_embedded {
            "#version 300 es\nprecision highp float;\n"
        } else {
            "#version 330 core\n"
        };
        let vert = format!("{header}{MESH_VERT}");
        let frag = format!("{header}{MESH_FRAG}");
        let program = compile_program(&gl, &vert, &frag)?;
        let shadow_vert = format!("{header}{SHADOW_VERT}");
        let shadow_frag = format!("{header}{SHADOW_FRAG}");
        let shadow_program = compile_program(&gl, &shadow_vert, &shadow_frag)?;
        debug!(
            "GL renderer ready (antialias {}, alpha {}, shadows {:?})",
            settings.antialias, settings.alpha, settings.shadow_map
        );
        Ok(Self {
            gl,
            program,
            shadow_program,
            shadow_map: None,
            settings,
            size: (0, 0),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            disposed: false,
        })
    }

    /// Drawing-buffer size in device pixels
    fn buffer_size(&self) -> (i32, i32) {
        let ratio = self.settings.pixel_ratio;
        (
            (self.size.0 as f32 * ratio).round() as i32,
            (self.size.1 as f32 * ratio).round() as i32,
        )
    }

    fn linear(&self, color: Color) -> Vec3 {
        let c = Vec3::from(color.to_rgb_f32());
        if self.settings.srgb_output {
            c.powf(2.2)
        } else {
            c
        }
    }

    fn ensure_mesh(&mut self, mesh: &Mesh) -> Result<()> {
        if !self.meshes.contains_key(&mesh.id) {
            let gpu = upload_mesh(&self.gl, mesh)?;
            self.meshes.insert(mesh.id, gpu);
        }
        Ok(())
    }

    fn ensure_texture(&mut self, texture: &Texture) -> Result<glow::Texture> {
        if let Some(tex) = self.textures.get(&texture.id) {
            return Ok(*tex);
        }
        let tex = upload_texture(&self.gl, texture)?;
        self.textures.insert(texture.id, tex);
        Ok(tex)
    }

    /// Depth target of `size`² texels, recreated when the size changes
    fn ensure_shadow_map(&mut self, size: u32) -> Result<(glow::Framebuffer, glow::Texture)> {
        if let Some(map) = self.shadow_map.as_ref().filter(|m| m.size == size) {
            return Ok((map.fbo, map.depth));
        }
        if let Some(old) = self.shadow_map.take() {
            delete_shadow_map(&self.gl, &old);
        }
        let map = create_shadow_map(&self.gl, size)?;
        debug!("shadow map {}x{} created", size, size);
        let handles = (map.fbo, map.depth);
        self.shadow_map = Some(map);
        Ok(handles)
    }

    /// Render casters into the light's depth map. Returns the depth texture,
    /// or `None` when the light casts no shadow.
    fn shadow_pass(
        &mut self,
        light: &DirectionalLight,
        items: &[DrawItem],
    ) -> Result<Option<glow::Texture>> {
        if !light.cast_shadow || light.shadow_map_size == 0 {
            return Ok(None);
        }
        let (fbo, depth) = self.ensure_shadow_map(light.shadow_map_size)?;
        let size = light.shadow_map_size as i32;
        let gl = self.gl.clone();
        let p = self.shadow_program;

        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.viewport(0, 0, size, size);
            gl.clear(glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.enable(glow::POLYGON_OFFSET_FILL);
            gl.polygon_offset(2.0, 4.0);
            gl.use_program(Some(p));
        }
        set_uniform_mat4(&gl, p, "u_light_view_proj", &light.shadow_view_projection());
        for item in items.iter().filter(|i| i.cast_shadow) {
            let Some(mesh) = self.meshes.get(&item.id) else {
                continue;
            };
            set_uniform_mat4(&gl, p, "u_model", &item.world);
            unsafe { draw_mesh(&gl, mesh) };
        }
        unsafe {
            gl.disable(glow::POLYGON_OFFSET_FILL);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
        Ok(Some(depth))
    }

    fn set_lights(&self, scene: &Scene, camera: &PerspectiveCamera) {
        let gl = &self.gl;
        let p = self.program;
        let lights = &scene.lights;

        set_uniform_vec3(
            gl,
            p,
            "u_ambient",
            &(self.linear(lights.ambient.color) * lights.ambient.intensity),
        );
        set_uniform_vec3(
            gl,
            p,
            "u_dir_color",
            &(self.linear(lights.directional.color) * lights.directional.intensity),
        );
        set_uniform_vec3(
            gl,
            p,
            "u_dir_direction",
            &lights.directional.position.normalize_or_zero(),
        );
        set_uniform_vec3(
            gl,
            p,
            "u_point_color",
            &(self.linear(lights.point.color) * lights.point.intensity),
        );
        set_uniform_vec3(gl, p, "u_point_position", &lights.point.position);
        set_uniform_vec3(
            gl,
            p,
            "u_hemi_sky",
            &(self.linear(lights.hemisphere.sky_color) * lights.hemisphere.intensity),
        );
        set_uniform_vec3(
            gl,
            p,
            "u_hemi_ground",
            &(self.linear(lights.hemisphere.ground_color) * lights.hemisphere.intensity),
        );
        set_uniform_vec3(gl, p, "u_fog_color", &self.linear(scene.fog.color));
        set_uniform_f32(gl, p, "u_fog_near", scene.fog.near);
        set_uniform_f32(gl, p, "u_fog_far", scene.fog.far);
        set_uniform_f32(
            gl,
            p,
            "u_srgb",
            if self.settings.srgb_output { 1.0 } else { 0.0 },
        );
        set_uniform_mat4(gl, p, "u_view", &camera.view_matrix());
        set_uniform_mat4(gl, p, "u_view_proj", &camera.view_projection());
    }
}

impl Renderer for GlRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio > 0.0 {
            self.settings.pixel_ratio = ratio;
        }
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        if self.disposed {
            return Err(ViewerError::Gpu("renderer disposed".to_string()));
        }

        // Upload pass: collect draw items first, GPU resources are created lazily
        let mut items: Vec<DrawItem> = Vec::new();
        if let Some(model) = &scene.model {
            let mut uploads: Vec<Mesh> = Vec::new();
            model.visit_meshes(&Mat4::IDENTITY, &mut |mesh, world| {
                if !self.meshes.contains_key(&mesh.id) {
                    uploads.push(mesh.clone());
                }
                items.push(DrawItem {
                    id: mesh.id,
                    world: *world,
                    color: Vec3::from(mesh.material.color.to_rgb_f32()),
                    map: mesh.material.map.clone(),
                    cast_shadow: mesh.cast_shadow,
                    receive_shadow: mesh.receive_shadow,
                });
            });
            for mesh in &uploads {
                self.ensure_mesh(mesh)?;
            }
        }

        let light = scene.lights.directional;
        let shadow = self.shadow_pass(&light, &items)?;

        let (w, h) = self.buffer_size();
        let bg = scene.background.to_rgb_f32();
        let gl = self.gl.clone();
        let p = self.program;

        unsafe {
            gl.viewport(0, 0, w, h);
            gl.clear_color(bg[0], bg[1], bg[2], 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.use_program(Some(p));
        }
        self.set_lights(scene, camera);

        set_uniform_f32(&gl, p, "u_shadow_enabled", if shadow.is_some() { 1.0 } else { 0.0 });
        set_uniform_f32(
            &gl,
            p,
            "u_shadow_soft",
            if self.settings.shadow_map == ShadowMapKind::Soft { 1.0 } else { 0.0 },
        );
        set_uniform_f32(&gl, p, "u_shadow_texel", 1.0 / light.shadow_map_size.max(1) as f32);
        set_uniform_mat4(&gl, p, "u_light_view_proj", &light.shadow_view_projection());
        unsafe {
            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, shadow);
            let loc = gl.get_uniform_location(p, "u_shadow_map");
            gl.uniform_1_i32(loc.as_ref(), 1);
        }

        for item in items {
            let texture = match &item.map {
                Some(tex) => Some(self.ensure_texture(tex)?),
                None => None,
            };
            let Some(mesh) = self.meshes.get(&item.id) else {
                continue;
            };
            let normal = Mat3::from_mat4(item.world).inverse().transpose();
            let base = if self.settings.srgb_output {
                item.color.powf(2.2)
            } else {
                item.color
            };

            set_uniform_mat4(&gl, p, "u_model", &item.world);
            set_uniform_mat3(&gl, p, "u_normal_matrix", &normal);
            set_uniform_vec3(&gl, p, "u_color", &base);
            set_uniform_f32(&gl, p, "u_has_map", if texture.is_some() { 1.0 } else { 0.0 });
            set_uniform_f32(
                &gl,
                p,
                "u_receive_shadow",
                if item.receive_shadow { 1.0 } else { 0.0 },
            );
            unsafe {
                gl.active_texture(glow::TEXTURE0);
                gl.bind_texture(glow::TEXTURE_2D, texture);
                let loc = gl.get_uniform_location(p, "u_map");
                gl.uniform_1_i32(loc.as_ref(), 0);
                draw_mesh(&gl, mesh);
            }
        }

        unsafe {
            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.disable(glow::DEPTH_TEST);
            gl.use_program(None);
        }
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<FrameCapture> {
        let (w, h) = self.buffer_size();
        if w <= 0 || h <= 0 {
            return Err(ViewerError::Gpu("surface has zero size".to_string()));
        }
        let row = w as usize * 4;
        let mut buf = vec![0u8; row * h as usize];
        unsafe {
            self.gl.read_pixels(
                0,
                0,
                w,
                h,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut buf)),
            );
        }
        // GL rows are bottom-up
        let rgba: Vec<u8> = buf.chunks_exact(row).rev().flatten().copied().collect();
        Ok(FrameCapture {
            width: w as u32,
            height: h as u32,
            rgba,
        })
    }

    fn release_asset(&mut self, asset: &SceneNode) {
        for id in asset.mesh_ids() {
            if let Some(mesh) = self.meshes.remove(&id) {
                delete_mesh(&self.gl, &mesh);
            }
        }
        for id in asset.texture_ids() {
            if let Some(tex) = self.textures.remove(&id) {
                unsafe { self.gl.delete_texture(tex) };
            }
        }
    }

    fn release_texture(&mut self, id: TextureId) {
        if let Some(tex) = self.textures.remove(&id) {
            unsafe { self.gl.delete_texture(tex) };
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for (_, mesh) in self.meshes.drain() {
            delete_mesh(&self.gl, &mesh);
        }
        for (_, tex) in self.textures.drain() {
            unsafe { self.gl.delete_texture(tex) };
        }
        if let Some(map) = self.shadow_map.take() {
            delete_shadow_map(&self.gl, &map);
        }
        unsafe {
            self.gl.delete_program(self.program);
            self.gl.delete_program(self.shadow_program);
        }
    }
}

// ── GPU upload ───────────────────────────────────────────────

fn upload_mesh(gl: &glow::Context, mesh: &Mesh) -> Result<GpuMesh> {
    let vertices = mesh.geometry.interleaved();
    let indices = &mesh.geometry.indices;
    unsafe {
        let vao = gl.create_vertex_array().map_err(ViewerError::Gpu)?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().map_err(ViewerError::Gpu)?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck_cast_slice(&vertices),
            glow::STATIC_DRAW,
        );

        let stride = 8 * 4; // 8 floats * 4 bytes
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // normal: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);
        // uv: location 2
        gl.enable_vertex_attrib_array(2);
        gl.vertex_attrib_pointer_f32(2, 2, glow::FLOAT, false, stride, 6 * 4);

        let ibo = if indices.is_empty() {
            None
        } else {
            let ibo = gl.create_buffer().map_err(ViewerError::Gpu)?;
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck_cast_slice(indices),
                glow::STATIC_DRAW,
            );
            Some(ibo)
        };

        gl.bind_vertex_array(None);

        Ok(GpuMesh {
            vao,
            vbo,
            ibo,
            count: if indices.is_empty() {
                mesh.geometry.vertex_count() as i32
            } else {
                indices.len() as i32
            },
        })
    }
}

fn upload_texture(gl: &glow::Context, texture: &Texture) -> Result<glow::Texture> {
    unsafe {
        let tex = gl.create_texture().map_err(ViewerError::Gpu)?;
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            texture.width as i32,
            texture.height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&texture.rgba)),
        );
        gl.generate_mipmap(glow::TEXTURE_2D);
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR_MIPMAP_LINEAR as i32,
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(tex)
    }
}

fn create_shadow_map(gl: &glow::Context, size: u32) -> Result<ShadowMap> {
    unsafe {
        let depth = gl.create_texture().map_err(ViewerError::Gpu)?;
        gl.bind_texture(glow::TEXTURE_2D, Some(depth));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::DEPTH_COMPONENT24 as i32,
            size as i32,
            size as i32,
            0,
            glow::DEPTH_COMPONENT,
            glow::UNSIGNED_INT,
            glow::PixelUnpackData::Slice(None),
        );
        // hardware depth comparison, bilinear taps between texels
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_COMPARE_MODE,
            glow::COMPARE_REF_TO_TEXTURE as i32,
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_COMPARE_FUNC, glow::LEQUAL as i32);
        gl.bind_texture(glow::TEXTURE_2D, None);

        let fbo = gl.create_framebuffer().map_err(ViewerError::Gpu)?;
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::DEPTH_ATTACHMENT,
            glow::TEXTURE_2D,
            Some(depth),
            0,
        );
        gl.draw_buffers(&[glow::NONE]);
        gl.read_buffer(glow::NONE);
        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);

        let map = ShadowMap { fbo, depth, size };
        if status != glow::FRAMEBUFFER_COMPLETE {
            delete_shadow_map(gl, &map);
            return Err(ViewerError::Gpu(format!(
                "shadow framebuffer incomplete (0x{status:x})"
            )));
        }
        Ok(map)
    }
}

fn delete_shadow_map(gl: &glow::Context, map: &ShadowMap) {
    unsafe {
        gl.delete_framebuffer(map.fbo);
        gl.delete_texture(map.depth);
    }
}

fn delete_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    unsafe {
        gl.delete_vertex_array(mesh.vao);
        gl.delete_buffer(mesh.vbo);
        if let Some(ibo) = mesh.ibo {
            gl.delete_buffer(ibo);
        }
    }
}

// ── Draw calls ───────────────────────────────────────────────

unsafe fn draw_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    gl.bind_vertex_array(Some(mesh.vao));
    match mesh.ibo {
        Some(ibo) => {
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.draw_elements(glow::TRIANGLES, mesh.count, glow::UNSIGNED_INT, 0);
        }
        None => gl.draw_arrays(glow::TRIANGLES, 0, mesh.count),
    }
    gl.bind_vertex_array(None);
}

// ── Shader compilation ───────────────────────────────────────

fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> Result<glow::Program> {
    unsafe {
        let program = gl.create_program().map_err(ViewerError::Gpu)?;

        let vert = gl.create_shader(glow::VERTEX_SHADER).map_err(ViewerError::Gpu)?;
        gl.shader_source(vert, vert_src);
        gl.compile_shader(vert);
        if !gl.get_shader_compile_status(vert) {
            let log = gl.get_shader_info_log(vert);
            error!("Vertex shader error: {log}");
            return Err(ViewerError::Gpu(log));
        }

        let frag = gl.create_shader(glow::FRAGMENT_SHADER).map_err(ViewerError::Gpu)?;
        gl.shader_source(frag, frag_src);
        gl.compile_shader(frag);
        if !gl.get_shader_compile_status(frag) {
            let log = gl.get_shader_info_log(frag);
            error!("Fragment shader error: {log}");
            return Err(ViewerError::Gpu(log));
        }

        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            error!("Program link error: {log}");
            return Err(ViewerError::Gpu(log));
        }

        gl.delete_shader(vert);
        gl.delete_shader(frag);

        Ok(program)
    }
}

// ── Uniform setters ──────────────────────────────────────────

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_mat3(gl: &glow::Context, program: glow::Program, name: &str, mat: &Mat3) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_3_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_vec3(gl: &glow::Context, program: glow::Program, name: &str, v: &Vec3) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_3_f32(loc.as_ref(), v.x, v.y, v.z);
    }
}

fn set_uniform_f32(gl: &glow::Context, program: glow::Program, name: &str, v: f32) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_1_f32(loc.as_ref(), v);
    }
}

// ── Byte cast helper ─────────────────────────────────────────

fn bytemuck_cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

// ── Shaders ──────────────────────────────────────────────────
// Version header is prepended at compile time (GLSL ES 3.00 or 3.30 core).

const MESH_VERT: &str = r#"
uniform mat4 u_view_proj;
uniform mat4 u_view;
uniform mat4 u_model;
uniform mat3 u_normal_matrix;
uniform mat4 u_light_view_proj;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec2 a_uv;

out vec3 v_world;
out vec3 v_normal;
out vec2 v_uv;
out float v_depth;
out vec4 v_light_pos;

void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    v_world = world.xyz;
    v_light_pos = u_light_view_proj * world;
    v_normal = u_normal_matrix * a_normal;
    v_uv = a_uv;
    v_depth = -(u_view * world).z;
    gl_Position = u_view_proj * world;
}
"#;

const MESH_FRAG: &str = r#"
uniform vec3 u_color;
uniform float u_has_map;
uniform sampler2D u_map;

uniform mediump sampler2DShadow u_shadow_map;
uniform float u_shadow_enabled;
uniform float u_shadow_soft;
uniform float u_shadow_texel;
uniform float u_receive_shadow;

uniform vec3 u_ambient;
uniform vec3 u_dir_color;
uniform vec3 u_dir_direction;
uniform vec3 u_point_color;
uniform vec3 u_point_position;
uniform vec3 u_hemi_sky;
uniform vec3 u_hemi_ground;

uniform vec3 u_fog_color;
uniform float u_fog_near;
uniform float u_fog_far;
uniform float u_srgb;

in vec3 v_world;
in vec3 v_normal;
in vec2 v_uv;
in float v_depth;
in vec4 v_light_pos;

out vec4 frag_color;

// 1.0 lit, 0.0 fully shadowed
float shadow_factor() {
    if (u_shadow_enabled < 0.5 || u_receive_shadow < 0.5) {
        return 1.0;
    }
    vec3 p = v_light_pos.xyz / v_light_pos.w * 0.5 + 0.5;
    if (p.x < 0.0 || p.x > 1.0 || p.y < 0.0 || p.y > 1.0 || p.z > 1.0) {
        return 1.0;
    }
    if (u_shadow_soft < 0.5) {
        return texture(u_shadow_map, p);
    }
    // 3x3 PCF
    float sum = 0.0;
    for (int x = -1; x <= 1; x++) {
        for (int y = -1; y <= 1; y++) {
            vec2 offset = vec2(float(x), float(y)) * u_shadow_texel;
            sum += texture(u_shadow_map, vec3(p.xy + offset, p.z));
        }
    }
    return sum / 9.0;
}

void main() {
    vec3 n = normalize(v_normal);
    vec3 base = u_color;
    if (u_has_map > 0.5) {
        vec3 texel = texture(u_map, v_uv).rgb;
        base *= mix(texel, pow(texel, vec3(2.2)), u_srgb);
    }

    vec3 light = u_ambient;
    light += u_dir_color * max(dot(n, u_dir_direction), 0.0) * shadow_factor();
    light += u_point_color * max(dot(n, normalize(u_point_position - v_world)), 0.0);
    light += mix(u_hemi_ground, u_hemi_sky, dot(n, vec3(0.0, 1.0, 0.0)) * 0.5 + 0.5);

    vec3 color = base * light;
    float fog = smoothstep(u_fog_near, u_fog_far, v_depth);
    color = mix(color, u_fog_color, fog);
    color = mix(color, pow(color, vec3(1.0 / 2.2)), u_srgb);
    frag_color = vec4(color, 1.0);
}
"#;

const SHADOW_VERT: &str = r#"
uniform mat4 u_light_view_proj;
uniform mat4 u_model;

layout(location = 0) in vec3 a_position;

void main() {
    gl_Position = u_light_view_proj * u_model * vec4(a_position, 1.0);
}
"#;

// Depth is written by the rasterizer; no color attachment
const SHADOW_FRAG: &str = r#"
out vec4 frag_color;

void main() {
    frag_color = vec4(1.0);
}
"#;
