//! Renderer capability injected into the viewport

use crate::camera::PerspectiveCamera;
use crate::error::Result;
use crate::scene::{Scene, SceneNode, TextureId};

/// Shadow filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowMapKind {
    Basic,
    #[default]
    Soft,
}

/// Options a renderer is created with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    pub antialias: bool,
    /// Transparent clear so the page shows through
    pub alpha: bool,
    pub shadow_map: ShadowMapKind,
    pub srgb_output: bool,
    pub pixel_ratio: f32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            alpha: true,
            shadow_map: ShadowMapKind::Soft,
            srgb_output: true,
            pixel_ratio: 1.0,
        }
    }
}

/// Pixels read back from the render surface
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCapture {
    pub width: u32,
    pub height: u32,
    /// RGBA8, rows top to bottom
    pub rgba: Vec<u8>,
}

impl FrameCapture {
    /// Capture filled with a single color
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            rgba: rgba.iter().copied().cycle().take(len * 4).collect(),
        }
    }
}

/// A live render surface
pub trait Renderer {
    /// Surface size in CSS pixels
    fn set_size(&mut self, width: u32, height: u32);

    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Draw one frame
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()>;

    /// Read the pixels of the last frame
    fn read_pixels(&mut self) -> Result<FrameCapture>;

    /// Free GPU resources held for an asset that is being detached
    fn release_asset(&mut self, asset: &SceneNode);

    /// Free the upload of a texture no material references any more
    fn release_texture(&mut self, id: TextureId);

    /// Free every GPU resource. Further calls are no-ops.
    fn dispose(&mut self);
}

/// Factory for renderers; `create_renderer` fails when the platform has no
/// usable graphics API
pub trait RenderBackend {
    fn create_renderer(&self, settings: &RendererSettings) -> Result<Box<dyn Renderer>>;
}
