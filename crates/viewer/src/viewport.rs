//! SceneViewport: one render surface showing one loaded asset

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec3;
use shared::{Color, ViewerOptions};
use tracing::{debug, error, info, warn};

use crate::backend::{RenderBackend, Renderer, RendererSettings};
use crate::camera::PerspectiveCamera;
use crate::controls::{OrbitControls, PointerInput};
use crate::error::{Result, ViewerError};
use crate::host::{FrameHandle, FrameScheduler, ViewerEvent, ViewportHost};
use crate::loader::{AssetLoader, LoadMessage, LoadQueue, LoadReceiver, LoadToken, TextureSlot};
use crate::scene::{Scene, SceneNode, Texture, ASSET_TARGET_SIZE};
use crate::screenshot;

/// Per-frame hook run while a model is loaded: `(model, timestamp_ms)`
pub type UpdateHook = Box<dyn FnMut(&mut SceneNode, f64)>;

/// Runs after the orbit controls saw a pointer event
pub type PointerHook = Box<dyn FnMut(&PointerInput)>;

/// Platform capabilities a viewport is built from
pub struct ViewportServices {
    pub backend: Box<dyn RenderBackend>,
    pub loader: Box<dyn AssetLoader>,
    pub scheduler: Box<dyn FrameScheduler>,
    pub host: Box<dyn ViewportHost>,
}

/// Capabilities held by an active viewport
struct Runtime {
    renderer: Box<dyn Renderer>,
    loader: Box<dyn AssetLoader>,
    scheduler: Box<dyn FrameScheduler>,
    host: Box<dyn ViewportHost>,
}

/// Interactive 3D view of a single asset.
///
/// All asynchronous work (asset and texture fetches) reports back through a
/// message queue drained by [`SceneViewport::tick`] or
/// [`SceneViewport::poll_loads`]. Each `load_asset` call takes a fresh token
/// and only the completion carrying the latest token is installed.
///
/// When the rendering backend is unavailable the viewport is inert: the
/// failure is logged, no frames are scheduled and every operation is a no-op.
pub struct SceneViewport {
    options: ViewerOptions,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: Option<OrbitControls>,
    runtime: Option<Runtime>,

    queue: LoadQueue,
    inbox: LoadReceiver,
    /// Token of the most recent `load_asset` call
    latest_load: LoadToken,
    /// Token the installed asset was loaded with
    installed: Option<LoadToken>,
    asset_generation: u64,
    texture_generations: HashMap<TextureSlot, u64>,

    update_hook: Option<UpdateHook>,
    pointer_hook: Option<PointerHook>,
    frame: Option<FrameHandle>,
    disposed: bool,
}

impl SceneViewport {
    pub fn new(services: ViewportServices, options: ViewerOptions) -> Self {
        let ViewportServices {
            backend,
            loader,
            mut scheduler,
            mut host,
        } = services;

        let (width, height) = host.client_size();
        let aspect = if height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        let camera = PerspectiveCamera::new(aspect, options.camera_distance);
        let (queue, inbox) = LoadQueue::channel();

        let mut viewport = Self {
            scene: Scene::new(options.background_color),
            camera,
            controls: None,
            runtime: None,
            queue,
            inbox,
            latest_load: LoadToken::default(),
            installed: None,
            asset_generation: 0,
            texture_generations: HashMap::new(),
            update_hook: None,
            pointer_hook: None,
            frame: None,
            disposed: false,
            options,
        };

        let settings = RendererSettings {
            pixel_ratio: host.device_pixel_ratio(),
            ..Default::default()
        };
        let mut renderer = match backend.create_renderer(&settings) {
            Ok(renderer) => renderer,
            Err(e) => {
                error!("3D viewer disabled: {}", e);
                return viewport;
            }
        };
        renderer.set_pixel_ratio(settings.pixel_ratio);
        renderer.set_size(width, height);

        if viewport.options.enable_controls {
            let mut controls = OrbitControls::new(&viewport.camera);
            controls.enable_zoom = viewport.options.enable_zoom;
            controls.enable_pan = viewport.options.enable_pan;
            controls.enable_rotate = viewport.options.enable_rotate;
            controls.auto_rotate = viewport.options.auto_rotate;
            controls.auto_rotate_speed = viewport.options.auto_rotate_speed;
            controls.set_viewport_height(height);
            viewport.controls = Some(controls);
        }

        host.bind_listeners();
        viewport.frame = Some(scheduler.request_frame());
        viewport.runtime = Some(Runtime {
            renderer,
            loader,
            scheduler,
            host,
        });

        if let Some(path) = viewport.options.model_path().map(str::to_string) {
            viewport.load_asset(&path);
        }
        viewport
    }

    // ── Queries ───────────────────────────────────────────────

    /// Whether the backend came up and the viewport has not been disposed
    pub fn is_active(&self) -> bool {
        self.runtime.is_some() && !self.disposed
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_loaded(&self) -> bool {
        self.scene.model.is_some()
    }

    pub fn model(&self) -> Option<&SceneNode> {
        self.scene.model.as_ref()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    /// Number of assets installed so far; changes whenever a load completes
    pub fn asset_generation(&self) -> u64 {
        self.asset_generation
    }

    // ── Loading ───────────────────────────────────────────────

    /// Start fetching `path`. The result is installed on a later tick unless
    /// another `load_asset` call supersedes it first.
    pub fn load_asset(&mut self, path: &str) {
        if self.disposed {
            return;
        }
        let Some(rt) = self.runtime.as_mut() else {
            return;
        };
        self.latest_load = self.latest_load.next();
        info!("loading asset '{}' ({:?})", path, self.latest_load);
        let sink = self.queue.asset_sink(self.latest_load, path);
        rt.loader.load_asset(path, sink);
    }

    /// Fetch a texture for every mesh of the installed asset. Returns false
    /// when there is no asset to apply it to.
    pub fn request_texture(&mut self, slot: TextureSlot, path: &str) -> bool {
        if self.disposed {
            return false;
        }
        let (Some(token), Some(rt)) = (self.installed, self.runtime.as_mut()) else {
            return false;
        };
        let generation = self.texture_generations.entry(slot).or_insert(0);
        *generation += 1;
        debug!("requesting {:?} texture '{}'", slot, path);
        let sink = self.queue.texture_sink(token, slot, *generation, path);
        rt.loader.load_texture(path, sink);
        true
    }

    /// Drain completed loads. Returns the number of messages handled.
    pub fn poll_loads(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.inbox.try_recv() {
            handled += 1;
            if self.disposed {
                continue;
            }
            self.handle_load_message(msg);
        }
        handled
    }

    fn handle_load_message(&mut self, msg: LoadMessage) {
        match msg {
            LoadMessage::Progress {
                token,
                loaded,
                total,
            } => {
                if token != self.latest_load {
                    return;
                }
                if let Some(total) = total.filter(|t| *t > 0) {
                    let percent = (loaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
                    self.emit(ViewerEvent::Progress {
                        percent: percent as f32,
                    });
                }
            }
            LoadMessage::Asset {
                token,
                path,
                result,
            } => {
                if token != self.latest_load {
                    debug!(
                        "discarding stale asset '{}' ({:?}, latest {:?})",
                        path, token, self.latest_load
                    );
                    return;
                }
                match result {
                    Ok(node) => {
                        self.install_asset(node, token);
                        info!("asset '{}' loaded", path);
                        self.emit(ViewerEvent::Loaded);
                    }
                    Err(e) => {
                        error!("error loading 3D model '{}': {}", path, e);
                        self.emit(ViewerEvent::Error {
                            error: e.to_string(),
                        });
                    }
                }
            }
            LoadMessage::Texture {
                token,
                slot,
                generation,
                path,
                result,
            } => {
                let current = self.texture_generations.get(&slot).copied().unwrap_or(0);
                if Some(token) != self.installed || generation != current {
                    debug!("discarding stale {:?} texture '{}'", slot, path);
                    return;
                }
                match result {
                    Ok(texture) => {
                        self.apply_texture(Rc::new(texture));
                    }
                    Err(e) => {
                        warn!("error loading texture '{}': {}", path, e);
                        self.emit(ViewerEvent::Error {
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Swap in a freshly loaded asset: release the old one, normalize size
    /// and position, enable shadows, then request the configured texture.
    fn install_asset(&mut self, mut node: SceneNode, token: LoadToken) {
        if let Some(old) = self.scene.model.take() {
            if let Some(rt) = self.runtime.as_mut() {
                rt.renderer.release_asset(&old);
            }
        }

        if !node.fit_to_size(ASSET_TARGET_SIZE) {
            warn!("asset '{}' has no geometry", node.name);
        }
        node.traverse_meshes_mut(&mut |mesh| {
            mesh.cast_shadow = true;
            mesh.receive_shadow = true;
        });

        self.scene.model = Some(node);
        self.installed = Some(token);
        self.asset_generation += 1;

        if let Some(path) = self.options.texture_path().map(str::to_string) {
            self.request_texture(TextureSlot::Configured, &path);
        }
    }

    // ── Surface appearance ────────────────────────────────────

    /// Assign `texture` to every mesh and release the maps it replaces.
    /// Returns false without a loaded asset.
    pub fn apply_texture(&mut self, texture: Rc<Texture>) -> bool {
        if self.disposed {
            return false;
        }
        let Some(model) = self.scene.model.as_mut() else {
            return false;
        };
        let replaced = model.texture_ids();
        model.traverse_meshes_mut(&mut |mesh| mesh.material.set_map(texture.clone()));
        if let Some(rt) = self.runtime.as_mut() {
            for id in replaced.into_iter().filter(|id| *id != texture.id) {
                rt.renderer.release_texture(id);
            }
        }
        true
    }

    /// Assign `color` to every mesh. Returns false without a loaded asset.
    pub fn apply_color(&mut self, color: Color) -> bool {
        if self.disposed {
            return false;
        }
        let Some(model) = self.scene.model.as_mut() else {
            return false;
        };
        model.traverse_meshes_mut(&mut |mesh| mesh.material.set_color(color));
        true
    }

    pub fn set_background_color(&mut self, color: Color) {
        if self.is_active() {
            self.scene.background = color;
        }
    }

    /// Set the loaded model's rotation from XYZ Euler angles (radians)
    pub fn rotate_to(&mut self, euler: Vec3) {
        if let Some(model) = self.scene.model.as_mut() {
            model.set_rotation_euler(euler);
        }
    }

    // ── Camera controls ───────────────────────────────────────

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        if let Some(controls) = self.controls.as_mut() {
            controls.auto_rotate = enabled;
        }
    }

    pub fn set_auto_rotate_speed(&mut self, speed: f32) {
        if let Some(controls) = self.controls.as_mut() {
            controls.auto_rotate_speed = speed;
        }
    }

    pub fn reset_camera(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.reset(&mut self.camera);
        }
    }

    pub fn zoom_in(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.zoom_in();
            controls.update(&mut self.camera);
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(controls) = self.controls.as_mut() {
            controls.zoom_out();
            controls.update(&mut self.camera);
        }
    }

    // ── Host input ────────────────────────────────────────────

    /// Re-read the container size; a zero-height container is ignored
    pub fn handle_resize(&mut self) {
        if self.disposed {
            return;
        }
        let Some(rt) = self.runtime.as_mut() else {
            return;
        };
        let (width, height) = rt.host.client_size();
        if height == 0 {
            return;
        }
        self.camera.set_viewport_size(width, height);
        rt.renderer.set_size(width, height);
        if let Some(controls) = self.controls.as_mut() {
            controls.set_viewport_height(height);
        }
    }

    pub fn handle_pointer(&mut self, input: PointerInput) {
        if !self.is_active() {
            return;
        }
        if let Some(controls) = self.controls.as_mut() {
            controls.handle_input(&input, &self.camera);
        }
        if let Some(hook) = self.pointer_hook.as_mut() {
            hook(&input);
        }
    }

    pub fn set_update_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut SceneNode, f64) + 'static,
    {
        self.update_hook = Some(Box::new(hook));
    }

    pub fn set_pointer_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&PointerInput) + 'static,
    {
        self.pointer_hook = Some(Box::new(hook));
    }

    // ── Render loop ───────────────────────────────────────────

    /// One display refresh: reschedule, drain loads, advance the controls,
    /// run the update hook, render.
    pub fn tick(&mut self, timestamp_ms: f64) {
        if self.disposed {
            return;
        }
        let Some(rt) = self.runtime.as_mut() else {
            return;
        };
        self.frame = Some(rt.scheduler.request_frame());

        self.poll_loads();

        if let Some(controls) = self.controls.as_mut() {
            controls.update(&mut self.camera);
        }
        if let (Some(hook), Some(model)) = (self.update_hook.as_mut(), self.scene.model.as_mut()) {
            hook(model, timestamp_ms);
        }

        if let Some(rt) = self.runtime.as_mut() {
            if let Err(e) = rt.renderer.render(&self.scene, &self.camera) {
                warn!("render failed: {}", e);
            }
        }
        self.scene.clear_dirty();
    }

    /// Render once and return the surface as a PNG data URI
    pub fn take_screenshot(&mut self) -> Result<String> {
        if self.disposed {
            return Err(ViewerError::Inactive);
        }
        let rt = self.runtime.as_mut().ok_or(ViewerError::Inactive)?;
        rt.renderer.render(&self.scene, &self.camera)?;
        let capture = rt.renderer.read_pixels()?;
        screenshot::png_data_uri(&capture)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Stop the render loop, release GPU resources, remove listeners.
    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(rt) = self.runtime.as_mut() {
            if let Some(frame) = self.frame.take() {
                rt.scheduler.cancel_frame(frame);
            }
            if let Some(model) = &self.scene.model {
                rt.renderer.release_asset(model);
            }
            rt.renderer.dispose();
            rt.host.unbind_listeners();
        }
        if let Some(controls) = self.controls.as_mut() {
            controls.dispose();
        }
        self.inbox.close();
        info!("viewer disposed");
    }

    fn emit(&self, event: ViewerEvent) {
        if let Some(rt) = &self.runtime {
            rt.host.dispatch(&event);
        }
    }
}

impl Drop for SceneViewport {
    fn drop(&mut self) {
        self.dispose();
    }
}
