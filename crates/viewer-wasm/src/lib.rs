// Browser bindings: mounts viewers and configurators into page elements and
// exports them to JavaScript.

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use glam::Vec3;
use product_viewer::{ConfiguratorPanel, PanelView, PointerInput, SceneViewport, ViewportServices};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::{Color, ConfiguratorOptions, OptionKind, ViewerOptions, ViewerOverrides};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlElement};

mod activate;
mod dom;
mod fetch;
mod panel;
mod raf;
mod webgl;
mod widgets;

pub use dom::{DomHost, HostInput, InputQueue};
pub use fetch::FetchLoader;
pub use panel::PanelDom;
pub use raf::{FrameSlot, RafScheduler};
pub use webgl::WebGlBackend;
pub use widgets::{CarouselDom, CompareDom};

/// Initialize WASM module with panic hook and logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    tracing::info!("product viewer initialized");
    if let Err(e) = activate::on_page_ready() {
        tracing::error!("page activation failed: {}", fetch::js_message(&e));
    }
}

fn js_error(e: JsValue) -> JsError {
    JsError::new(&fetch::js_message(&e))
}

/// Plain-object options passed from JavaScript; `undefined` and `null` give
/// the defaults
fn from_js<T: DeserializeOwned + Default>(value: &JsValue) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    let json: String = js_sys::JSON::stringify(value).map_err(js_error)?.into();
    Ok(serde_json::from_str(&json)?)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&e.to_string()))
}

// ── Mounting ─────────────────────────────────────────────────

/// A component the frame loop drives
trait Animated {
    fn frame(&mut self, timestamp_ms: f64);
    fn resize(&mut self);
    fn pointer(&mut self, input: PointerInput);
}

impl Animated for SceneViewport {
    fn frame(&mut self, timestamp_ms: f64) {
        self.tick(timestamp_ms);
    }

    fn resize(&mut self) {
        self.handle_resize();
    }

    fn pointer(&mut self, input: PointerInput) {
        self.handle_pointer(input);
    }
}

struct Mount {
    services: ViewportServices,
    inputs: InputQueue,
    slot: FrameSlot,
}

/// Append a canvas to `container` and build the browser services around it
fn mount(container: &HtmlElement) -> Result<Mount, JsValue> {
    let document = container
        .owner_document()
        .ok_or_else(|| JsValue::from_str("container is not in a document"))?;
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    container.append_child(&canvas)?;

    let inputs = InputQueue::default();
    let slot = FrameSlot::default();
    let services = ViewportServices {
        backend: Box::new(WebGlBackend::new(canvas.clone())),
        loader: Box::new(FetchLoader),
        scheduler: Box::new(RafScheduler::new(slot.clone())?),
        host: Box::new(DomHost::new(container.clone(), canvas, inputs.clone())),
    };
    Ok(Mount {
        services,
        inputs,
        slot,
    })
}

/// Install the frame body: queued input first, then one tick
fn drive<T: Animated + 'static>(component: &Rc<RefCell<T>>, inputs: InputQueue, slot: &FrameSlot) {
    let weak = Rc::downgrade(component);
    *slot.borrow_mut() = Some(Box::new(move |timestamp_ms: f64| {
        let Some(component) = weak.upgrade() else {
            return;
        };
        let mut component = component.borrow_mut();
        for input in inputs.drain() {
            match input {
                HostInput::Resize => component.resize(),
                HostInput::Pointer(input) => component.pointer(input),
            }
        }
        component.frame(timestamp_ms);
    }));
}

// ── ProductViewer ────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct Rotation {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    z: f32,
}

/// Interactive 3D view of one product model
#[wasm_bindgen]
pub struct ProductViewer {
    inner: Rc<RefCell<SceneViewport>>,
}

impl ProductViewer {
    fn mount(container: &HtmlElement, options: ViewerOptions) -> Result<Self, JsValue> {
        let Mount {
            services,
            inputs,
            slot,
        } = mount(container)?;
        let inner = Rc::new(RefCell::new(SceneViewport::new(services, options)));
        drive(&inner, inputs, &slot);
        Ok(Self { inner })
    }
}

#[wasm_bindgen]
impl ProductViewer {
    /// `options` uses the camelCase viewer option names, e.g.
    /// `{ modelPath, autoRotate, backgroundColor }`
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, options: JsValue) -> Result<ProductViewer, JsError> {
        let overrides: ViewerOverrides = from_js(&options)?;
        let options = ViewerOptions::default().merged_with(overrides);
        Self::mount(&container, options).map_err(js_error)
    }

    #[wasm_bindgen(getter, js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.borrow().is_active()
    }

    #[wasm_bindgen(getter, js_name = isLoaded)]
    pub fn is_loaded(&self) -> bool {
        self.inner.borrow().is_loaded()
    }

    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(&self, path: &str) {
        self.inner.borrow_mut().load_asset(path);
    }

    #[wasm_bindgen(js_name = setAutoRotate)]
    pub fn set_auto_rotate(&self, enabled: bool) {
        self.inner.borrow_mut().set_auto_rotate(enabled);
    }

    #[wasm_bindgen(js_name = setAutoRotateSpeed)]
    pub fn set_auto_rotate_speed(&self, speed: f32) {
        self.inner.borrow_mut().set_auto_rotate_speed(speed);
    }

    #[wasm_bindgen(js_name = resetCamera)]
    pub fn reset_camera(&self) {
        self.inner.borrow_mut().reset_camera();
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.inner.borrow_mut().zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.inner.borrow_mut().zoom_out();
    }

    /// `{ x, y, z }` Euler angles in radians
    #[wasm_bindgen(js_name = rotateTo)]
    pub fn rotate_to(&self, rotation: JsValue) -> Result<(), JsError> {
        let r: Rotation = from_js(&rotation)?;
        self.inner.borrow_mut().rotate_to(Vec3::new(r.x, r.y, r.z));
        Ok(())
    }

    /// Hex number (`0xf0f0f0`) or CSS hex string (`"#f0f0f0"`)
    #[wasm_bindgen(js_name = setBackgroundColor)]
    pub fn set_background_color(&self, color: JsValue) -> Result<(), JsError> {
        let json: String = js_sys::JSON::stringify(&color).map_err(js_error)?.into();
        let color: Color = serde_json::from_str(&json)?;
        self.inner.borrow_mut().set_background_color(color);
        Ok(())
    }

    /// PNG data URI of the current frame
    #[wasm_bindgen(js_name = takeScreenshot)]
    pub fn take_screenshot(&self) -> Result<String, JsError> {
        Ok(self.inner.borrow_mut().take_screenshot()?)
    }

    pub fn dispose(&self) {
        self.inner.borrow_mut().dispose();
    }
}

// ── ProductConfigurator ──────────────────────────────────────

struct ConfiguratorState {
    configurator: ConfiguratorPanel,
    panel: PanelDom,
}

impl ConfiguratorState {
    fn select(&mut self, kind: OptionKind, key: &str) {
        self.configurator.select(kind, key);
        self.panel.sync(self.configurator.panel());
    }
}

impl Animated for ConfiguratorState {
    fn frame(&mut self, timestamp_ms: f64) {
        self.configurator.tick(timestamp_ms);
    }

    fn resize(&mut self) {
        self.configurator.handle_resize();
    }

    fn pointer(&mut self, input: PointerInput) {
        self.configurator.handle_pointer(input);
    }
}

/// Option panel plus a viewer showing the selected product
#[wasm_bindgen]
pub struct ProductConfigurator {
    inner: Rc<RefCell<ConfiguratorState>>,
}

impl ProductConfigurator {
    fn mount(container: &HtmlElement, options: ConfiguratorOptions) -> Result<Self, JsValue> {
        let document = container
            .owner_document()
            .ok_or_else(|| JsValue::from_str("container is not in a document"))?;

        // clicks reach the state once it exists
        let state_ref: Rc<OnceCell<Weak<RefCell<ConfiguratorState>>>> = Rc::default();
        let on_select: panel::OnSelect = {
            let state_ref = state_ref.clone();
            Rc::new(move |kind, key| {
                if let Some(state) = state_ref.get().and_then(Weak::upgrade) {
                    state.borrow_mut().select(kind, key);
                }
            })
        };
        let panel = PanelDom::build(&document, &PanelView::build(&options), on_select)?;
        container.append_child(panel.root())?;

        let viewer_container: HtmlElement = document.create_element("div")?.dyn_into()?;
        viewer_container.set_class_name("viewer-container");
        container.append_child(&viewer_container)?;

        let Mount {
            services,
            inputs,
            slot,
        } = mount(&viewer_container)?;
        let configurator = ConfiguratorPanel::new(services, options);
        let inner = Rc::new(RefCell::new(ConfiguratorState {
            configurator,
            panel,
        }));
        let _ = state_ref.set(Rc::downgrade(&inner));
        drive(&inner, inputs, &slot);
        Ok(Self { inner })
    }
}

#[wasm_bindgen]
impl ProductConfigurator {
    /// `options` is the `{ models, materials, colors }` catalog
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, options: JsValue) -> Result<ProductConfigurator, JsError> {
        let options: ConfiguratorOptions = from_js(&options)?;
        Self::mount(&container, options).map_err(js_error)
    }

    #[wasm_bindgen(js_name = selectModel)]
    pub fn select_model(&self, key: &str) {
        self.inner.borrow_mut().select(OptionKind::Model, key);
    }

    #[wasm_bindgen(js_name = selectMaterial)]
    pub fn select_material(&self, key: &str) {
        self.inner.borrow_mut().select(OptionKind::Material, key);
    }

    #[wasm_bindgen(js_name = selectColor)]
    pub fn select_color(&self, key: &str) {
        self.inner.borrow_mut().select(OptionKind::Color, key);
    }

    /// `{ model, material, color }`, unset keys are `null`
    #[wasm_bindgen(js_name = getConfiguration)]
    pub fn get_configuration(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.borrow().configurator.get_configuration())
    }

    /// Configuration plus `screenshot` data URI and ISO-8601 `timestamp`
    #[wasm_bindgen(js_name = exportConfiguration)]
    pub fn export_configuration(&self) -> Result<JsValue, JsError> {
        let export = self.inner.borrow_mut().configurator.export_configuration()?;
        to_js(&export)
    }

    pub fn dispose(&self) {
        self.inner.borrow_mut().configurator.dispose();
    }
}
