//! Headless test harness: in-memory renderer, loader, frame scheduler and host.
//!
//! Every capability shares its state with the [`TestHarness`] through
//! `Rc<RefCell<_>>`, so a test can build a viewport from `services()` and
//! then drive loads, frames and resizes while inspecting what the viewport
//! did.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec3;
use shared::{Color, ConfiguratorOptions, ViewerOptions};

use crate::backend::{FrameCapture, RenderBackend, Renderer, RendererSettings};
use crate::camera::PerspectiveCamera;
use crate::configurator::ConfiguratorPanel;
use crate::error::{LoadError, Result, ViewerError};
use crate::host::{FrameHandle, FrameScheduler, ViewerEvent, ViewportHost};
use crate::gltf_import;
use crate::loader::{AssetLoader, AssetSink, TextureSink};
use crate::scene::{MeshId, Scene, SceneNode, Texture, TextureId};
use crate::viewport::{SceneViewport, ViewportServices};

// ── Renderer ────────────────────────────────────────────────────

/// What one rendered frame looked like
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub background: Color,
    pub mesh_count: usize,
    pub camera_position: Vec3,
    /// Material colors of every mesh, in traversal order
    pub mesh_colors: Vec<Color>,
    /// Meshes whose material had a texture
    pub textured_meshes: usize,
    /// Meshes whose material was flagged for re-upload
    pub dirty_meshes: usize,
    /// Meshes drawn into the shadow map
    pub shadow_casters: usize,
    /// Meshes sampling the shadow map
    pub shadow_receivers: usize,
}

#[derive(Debug, Default)]
pub struct RenderLog {
    pub settings: Option<RendererSettings>,
    pub frames: Vec<FrameSummary>,
    pub sizes: Vec<(u32, u32)>,
    pub pixel_ratio: f32,
    pub released: Vec<MeshId>,
    pub released_textures: Vec<TextureId>,
    pub disposed: bool,
}

/// Backend whose renderers draw nothing and record every call
#[derive(Clone)]
pub struct NullBackend {
    available: bool,
    log: Rc<RefCell<RenderLog>>,
}

impl RenderBackend for NullBackend {
    fn create_renderer(&self, settings: &RendererSettings) -> Result<Box<dyn Renderer>> {
        if !self.available {
            return Err(ViewerError::BackendUnavailable(
                "no graphics context".to_string(),
            ));
        }
        self.log.borrow_mut().settings = Some(*settings);
        Ok(Box::new(RecordingRenderer {
            log: self.log.clone(),
            size: (0, 0),
            pixel_ratio: settings.pixel_ratio,
            last_background: None,
        }))
    }
}

pub struct RecordingRenderer {
    log: Rc<RefCell<RenderLog>>,
    size: (u32, u32),
    pixel_ratio: f32,
    last_background: Option<Color>,
}

impl Renderer for RecordingRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.log.borrow_mut().sizes.push((width, height));
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
        self.log.borrow_mut().pixel_ratio = ratio;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.disposed {
            return Err(ViewerError::Gpu("renderer disposed".to_string()));
        }
        let mut summary = FrameSummary {
            background: scene.background,
            mesh_count: 0,
            camera_position: camera.position,
            mesh_colors: Vec::new(),
            textured_meshes: 0,
            dirty_meshes: 0,
            shadow_casters: 0,
            shadow_receivers: 0,
        };
        if let Some(model) = &scene.model {
            model.visit_meshes(&glam::Mat4::IDENTITY, &mut |mesh, _| {
                summary.mesh_count += 1;
                summary.mesh_colors.push(mesh.material.color);
                if mesh.material.map.is_some() {
                    summary.textured_meshes += 1;
                }
                if mesh.material.needs_update {
                    summary.dirty_meshes += 1;
                }
                if mesh.cast_shadow && scene.lights.directional.cast_shadow {
                    summary.shadow_casters += 1;
                }
                if mesh.receive_shadow {
                    summary.shadow_receivers += 1;
                }
            });
        }
        self.last_background = Some(scene.background);
        log.frames.push(summary);
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<FrameCapture> {
        let width = (self.size.0 as f32 * self.pixel_ratio).round() as u32;
        let height = (self.size.1 as f32 * self.pixel_ratio).round() as u32;
        if width == 0 || height == 0 {
            return Err(ViewerError::Gpu("surface has zero size".to_string()));
        }
        let bg = self.last_background.unwrap_or(Color::BLACK);
        Ok(FrameCapture::solid(width, height, [bg.r, bg.g, bg.b, 255]))
    }

    fn release_asset(&mut self, asset: &SceneNode) {
        let mut log = self.log.borrow_mut();
        log.released.extend(asset.mesh_ids());
        log.released_textures.extend(asset.texture_ids());
    }

    fn release_texture(&mut self, id: TextureId) {
        self.log.borrow_mut().released_textures.push(id);
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed = true;
    }
}

// ── Loader ──────────────────────────────────────────────────────

/// Requests waiting for the test to complete them
#[derive(Debug, Default)]
pub struct PendingLoads {
    pub assets: Vec<AssetSink>,
    pub textures: Vec<TextureSink>,
}

/// Loader that parks every request until the test completes it
#[derive(Clone, Default)]
pub struct ManualLoader {
    pending: Rc<RefCell<PendingLoads>>,
}

impl AssetLoader for ManualLoader {
    fn load_asset(&mut self, _path: &str, sink: AssetSink) {
        self.pending.borrow_mut().assets.push(sink);
    }

    fn load_texture(&mut self, _path: &str, sink: TextureSink) {
        self.pending.borrow_mut().textures.push(sink);
    }
}

/// Loader serving in-memory files, completing inside the call. A `.gltf`
/// pulls its referenced buffers and images from the same store, the way the
/// browser loader fetches them.
#[derive(Clone, Default)]
pub struct MemoryLoader {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl MemoryLoader {
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(path.to_string(), bytes.into());
    }

    /// Every path read so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn read(&self, path: &str) -> std::result::Result<Vec<u8>, LoadError> {
        self.requests.borrow_mut().push(path.to_string());
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::transport(path, "404 Not Found"))
    }
}

impl AssetLoader for MemoryLoader {
    fn load_asset(&mut self, path: &str, sink: AssetSink) {
        let result = self.read(path).and_then(|bytes| {
            sink.progress(bytes.len() as u64, Some(bytes.len() as u64));
            let mut resources = HashMap::new();
            for uri in gltf_import::external_resources(&bytes, path)? {
                let data = self.read(&uri)?;
                resources.insert(uri, data);
            }
            gltf_import::decode_asset_with(&bytes, path, &resources)
        });
        sink.complete(result);
    }

    fn load_texture(&mut self, path: &str, sink: TextureSink) {
        sink.complete_bytes(self.read(path));
    }
}

// ── Frames ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct FrameLog {
    next: u32,
    pub requested: usize,
    pub pending: Option<FrameHandle>,
    pub cancelled: Vec<FrameHandle>,
}

/// Scheduler whose frames only run when the test calls `tick`
#[derive(Clone, Default)]
pub struct ManualScheduler {
    log: Rc<RefCell<FrameLog>>,
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut log = self.log.borrow_mut();
        log.next += 1;
        log.requested += 1;
        let handle = FrameHandle(log.next);
        log.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut log = self.log.borrow_mut();
        if log.pending == Some(handle) {
            log.pending = None;
        }
        log.cancelled.push(handle);
    }
}

// ── Host ────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct HostLog {
    pub client_size: (u32, u32),
    pub pixel_ratio: f32,
    pub events: Vec<ViewerEvent>,
    pub listeners_bound: bool,
    pub bind_calls: usize,
}

impl Default for HostLog {
    fn default() -> Self {
        Self {
            client_size: (800, 600),
            pixel_ratio: 1.0,
            events: Vec::new(),
            listeners_bound: false,
            bind_calls: 0,
        }
    }
}

/// Host that records dispatched notifications
#[derive(Clone, Default)]
pub struct RecordingHost {
    log: Rc<RefCell<HostLog>>,
}

impl ViewportHost for RecordingHost {
    fn client_size(&self) -> (u32, u32) {
        self.log.borrow().client_size
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.log.borrow().pixel_ratio
    }

    fn dispatch(&self, event: &ViewerEvent) {
        self.log.borrow_mut().events.push(event.clone());
    }

    fn bind_listeners(&mut self) {
        let mut log = self.log.borrow_mut();
        log.listeners_bound = true;
        log.bind_calls += 1;
    }

    fn unbind_listeners(&mut self) {
        self.log.borrow_mut().listeners_bound = false;
    }
}

// ── Harness ─────────────────────────────────────────────────────

/// Headless test harness with shared handles to all four capabilities
pub struct TestHarness {
    backend: NullBackend,
    loader: ManualLoader,
    scheduler: ManualScheduler,
    host: RecordingHost,
}

impl TestHarness {
    /// Harness with a working renderer and an 800x600 container
    pub fn new() -> Self {
        Self {
            backend: NullBackend {
                available: true,
                log: Rc::default(),
            },
            loader: ManualLoader::default(),
            scheduler: ManualScheduler::default(),
            host: RecordingHost::default(),
        }
    }

    /// Harness whose backend fails to create a renderer
    pub fn without_gpu() -> Self {
        let mut h = Self::new();
        h.backend.available = false;
        h
    }

    /// Fresh capability set sharing this harness's state
    pub fn services(&self) -> ViewportServices {
        ViewportServices {
            backend: Box::new(self.backend.clone()),
            loader: Box::new(self.loader.clone()),
            scheduler: Box::new(self.scheduler.clone()),
            host: Box::new(self.host.clone()),
        }
    }

    /// Capability set using `loader` in place of the manual loader
    pub fn services_with_loader(&self, loader: impl AssetLoader + 'static) -> ViewportServices {
        ViewportServices {
            loader: Box::new(loader),
            ..self.services()
        }
    }

    pub fn viewport(&self, options: ViewerOptions) -> SceneViewport {
        SceneViewport::new(self.services(), options)
    }

    pub fn configurator(&self, options: ConfiguratorOptions) -> ConfiguratorPanel {
        ConfiguratorPanel::new(self.services(), options)
    }

    // ── Loads ─────────────────────────────────────────────────

    pub fn pending_assets(&self) -> Vec<String> {
        self.loader
            .pending
            .borrow()
            .assets
            .iter()
            .map(|s| s.path().to_string())
            .collect()
    }

    pub fn pending_textures(&self) -> Vec<String> {
        self.loader
            .pending
            .borrow()
            .textures
            .iter()
            .map(|s| s.path().to_string())
            .collect()
    }

    fn take_asset(&self, path: &str) -> Option<AssetSink> {
        let mut pending = self.loader.pending.borrow_mut();
        let idx = pending.assets.iter().position(|s| s.path() == path)?;
        Some(pending.assets.remove(idx))
    }

    fn take_texture(&self, path: &str) -> Option<TextureSink> {
        let mut pending = self.loader.pending.borrow_mut();
        let idx = pending.textures.iter().position(|s| s.path() == path)?;
        Some(pending.textures.remove(idx))
    }

    /// Report transfer progress of the oldest pending request for `path`
    pub fn progress(&self, path: &str, loaded: u64, total: Option<u64>) -> bool {
        let pending = self.loader.pending.borrow();
        match pending.assets.iter().find(|s| s.path() == path) {
            Some(sink) => {
                sink.progress(loaded, total);
                true
            }
            None => false,
        }
    }

    /// Complete the oldest pending request for `path` with `asset`
    pub fn complete_asset(&self, path: &str, asset: SceneNode) -> bool {
        match self.take_asset(path) {
            Some(sink) => {
                sink.complete(Ok(asset));
                true
            }
            None => false,
        }
    }

    pub fn fail_asset(&self, path: &str, message: &str) -> bool {
        match self.take_asset(path) {
            Some(sink) => {
                sink.complete(Err(LoadError::transport(path, message)));
                true
            }
            None => false,
        }
    }

    pub fn complete_texture(&self, path: &str, texture: Texture) -> bool {
        match self.take_texture(path) {
            Some(sink) => {
                sink.complete(Ok(texture));
                true
            }
            None => false,
        }
    }

    pub fn fail_texture(&self, path: &str, message: &str) -> bool {
        match self.take_texture(path) {
            Some(sink) => {
                sink.complete(Err(LoadError::transport(path, message)));
                true
            }
            None => false,
        }
    }

    // ── Host ──────────────────────────────────────────────────

    pub fn set_client_size(&self, width: u32, height: u32) {
        self.host.log.borrow_mut().client_size = (width, height);
    }

    pub fn set_pixel_ratio(&self, ratio: f32) {
        self.host.log.borrow_mut().pixel_ratio = ratio;
    }

    pub fn events(&self) -> Vec<ViewerEvent> {
        self.host.log.borrow().events.clone()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.host.log.borrow().events.iter().map(|e| e.name()).collect()
    }

    pub fn clear_events(&self) {
        self.host.log.borrow_mut().events.clear();
    }

    pub fn listeners_bound(&self) -> bool {
        self.host.log.borrow().listeners_bound
    }

    // ── Renderer / frames ─────────────────────────────────────

    pub fn renderer_settings(&self) -> Option<RendererSettings> {
        self.backend.log.borrow().settings
    }

    pub fn frames_rendered(&self) -> usize {
        self.backend.log.borrow().frames.len()
    }

    pub fn last_frame(&self) -> Option<FrameSummary> {
        self.backend.log.borrow().frames.last().cloned()
    }

    pub fn renderer_sizes(&self) -> Vec<(u32, u32)> {
        self.backend.log.borrow().sizes.clone()
    }

    pub fn released_meshes(&self) -> Vec<MeshId> {
        self.backend.log.borrow().released.clone()
    }

    pub fn released_textures(&self) -> Vec<TextureId> {
        self.backend.log.borrow().released_textures.clone()
    }

    pub fn renderer_disposed(&self) -> bool {
        self.backend.log.borrow().disposed
    }

    pub fn frames_requested(&self) -> usize {
        self.scheduler.log.borrow().requested
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.scheduler.log.borrow().pending
    }

    pub fn cancelled_frames(&self) -> Vec<FrameHandle> {
        self.scheduler.log.borrow().cancelled.clone()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_new_harness_viewport_is_active() {
        let h = TestHarness::new();
        let viewport = h.viewport(ViewerOptions::default());
        assert!(viewport.is_active());
        assert!(h.listeners_bound());
        assert_eq!(h.frames_requested(), 1);
        assert_eq!(h.renderer_sizes(), vec![(800, 600)]);
    }

    #[test]
    fn test_without_gpu_is_inert() {
        let h = TestHarness::without_gpu();
        let viewport = h.viewport(ViewerOptions::default());
        assert!(!viewport.is_active());
        assert!(!h.listeners_bound());
        assert_eq!(h.frames_requested(), 0);
        assert!(h.renderer_settings().is_none());
    }

    #[test]
    fn test_complete_unknown_path() {
        let h = TestHarness::new();
        assert!(!h.complete_asset("nothing.glb", fixtures::unit_cube()));
        assert!(!h.fail_texture("nothing.png", "404"));
    }

    #[test]
    fn test_pending_requests_listed() {
        let h = TestHarness::new();
        let mut viewport = h.viewport(ViewerOptions::default());
        viewport.load_asset("a.glb");
        viewport.load_asset("b.glb");
        assert_eq!(h.pending_assets(), vec!["a.glb", "b.glb"]);
    }
}
