//! WebGL2 canvas backend

use std::rc::Rc;

use product_viewer::backend::FrameCapture;
use product_viewer::camera::PerspectiveCamera;
use product_viewer::gl_renderer::GlBackend;
use product_viewer::scene::{Scene, SceneNode, TextureId};
use product_viewer::{RenderBackend, Renderer, RendererSettings, Result, ViewerError};
use tracing::{info, warn};
use web_sys::HtmlCanvasElement;

/// Creates renderers drawing into one canvas element
pub struct WebGlBackend {
    canvas: HtmlCanvasElement,
}

impl WebGlBackend {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }
}

#[cfg(target_arch = "wasm32")]
fn webgl2_context(
    canvas: &HtmlCanvasElement,
    settings: &RendererSettings,
) -> std::result::Result<glow::Context, String> {
    use js_sys::{Object, Reflect};
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::WebGl2RenderingContext;

    use crate::fetch::js_message;

    let attributes = Object::new();
    let set = |key: &str, value: bool| {
        Reflect::set(&attributes, &JsValue::from_str(key), &JsValue::from_bool(value))
            .map_err(|e| js_message(&e))
    };
    set("antialias", settings.antialias)?;
    set("alpha", settings.alpha)?;
    // screenshots read the buffer outside the frame
    set("preserveDrawingBuffer", true)?;

    let context = canvas
        .get_context_with_context_options("webgl2", &attributes)
        .map_err(|e| js_message(&e))?
        .ok_or_else(|| "WebGL2 is not supported by this browser".to_string())?
        .dyn_into::<WebGl2RenderingContext>()
        .map_err(|_| "canvas context is not WebGL2".to_string())?;
    Ok(glow::Context::from_webgl2_context(context))
}

#[cfg(not(target_arch = "wasm32"))]
fn webgl2_context(
    _canvas: &HtmlCanvasElement,
    _settings: &RendererSettings,
) -> std::result::Result<glow::Context, String> {
    Err("WebGL2 needs a wasm32 target".to_string())
}

impl RenderBackend for WebGlBackend {
    fn create_renderer(&self, settings: &RendererSettings) -> Result<Box<dyn Renderer>> {
        let gl = webgl2_context(&self.canvas, settings).map_err(ViewerError::BackendUnavailable)?;
        let inner = GlBackend::new(Rc::new(gl)).create_renderer(settings)?;
        info!("WebGL2 renderer created");
        Ok(Box::new(CanvasRenderer {
            canvas: self.canvas.clone(),
            inner,
            size: (0, 0),
            pixel_ratio: settings.pixel_ratio,
        }))
    }
}

/// Drawing-buffer size for a CSS size at a device pixel ratio
pub fn drawing_buffer_size(css: (u32, u32), pixel_ratio: f32) -> (u32, u32) {
    let scale = |v: u32| (v as f32 * pixel_ratio).round().max(1.0) as u32;
    (scale(css.0), scale(css.1))
}

/// Keeps the canvas element sized with the GL renderer
struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    inner: Box<dyn Renderer>,
    size: (u32, u32),
    pixel_ratio: f32,
}

impl CanvasRenderer {
    fn resize_canvas(&self) {
        let (width, height) = drawing_buffer_size(self.size, self.pixel_ratio);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let style = self.canvas.style();
        let css = [
            ("width", format!("{}px", self.size.0)),
            ("height", format!("{}px", self.size.1)),
            ("display", "block".to_string()),
        ];
        for (property, value) in css {
            if let Err(e) = style.set_property(property, &value) {
                warn!("failed to style canvas: {:?}", e);
            }
        }
    }
}

impl Renderer for CanvasRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.resize_canvas();
        self.inner.set_size(width, height);
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
        self.resize_canvas();
        self.inner.set_pixel_ratio(ratio);
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        self.inner.render(scene, camera)
    }

    fn read_pixels(&mut self) -> Result<FrameCapture> {
        self.inner.read_pixels()
    }

    fn release_asset(&mut self, asset: &SceneNode) {
        self.inner.release_asset(asset)
    }

    fn release_texture(&mut self, id: TextureId) {
        self.inner.release_texture(id)
    }

    fn dispose(&mut self) {
        self.inner.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawing_buffer_size() {
        assert_eq!(drawing_buffer_size((800, 600), 1.0), (800, 600));
        assert_eq!(drawing_buffer_size((800, 600), 2.0), (1600, 1200));
        assert_eq!(drawing_buffer_size((333, 100), 1.5), (500, 150));
        assert_eq!(drawing_buffer_size((0, 0), 2.0), (1, 1));
    }
}
