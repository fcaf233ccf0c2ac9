// Library crate: platform-independent viewer and configurator core.
// Browser glue (DOM host, fetch loader, WebGL2 canvas) lives in product-viewer-wasm.

pub mod backend;
pub mod camera;
pub mod configurator;
pub mod controls;
pub mod error;
pub mod fixtures;
pub mod gltf_import;
pub mod harness;
pub mod host;
pub mod loader;
pub mod scene;
pub mod screenshot;
pub mod viewport;
pub mod widgets;

#[cfg(feature = "gl")]
pub mod gl_renderer;

pub use backend::{FrameCapture, RenderBackend, Renderer, RendererSettings};
pub use camera::PerspectiveCamera;
pub use configurator::{ConfiguratorPanel, OptionButton, PanelSection, PanelView};
pub use controls::{OrbitControls, PointerButton, PointerInput};
pub use error::{LoadError, Result, ViewerError};
pub use host::{FrameHandle, FrameScheduler, ViewerEvent, ViewportHost};
pub use loader::{AssetLoader, AssetSink, FsLoader, TextureSink, TextureSlot};
pub use viewport::{SceneViewport, ViewportServices};
