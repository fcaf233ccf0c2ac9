//! Declarative activation of page elements once the document is ready

use std::any::Any;
use std::cell::RefCell;

use product_viewer::widgets::CarouselOptions;
use shared::{ConfiguratorOptions, ViewerOptions};
use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::fetch::js_message;
use crate::widgets::{CarouselDom, CompareDom};
use crate::{ProductConfigurator, ProductViewer};

/// Auto-rotate speed of declaratively activated viewers
pub const PAGE_AUTO_ROTATE_SPEED: f32 = 0.5;

thread_local! {
    /// Components activated from markup, alive for the page's lifetime
    static PAGE: RefCell<Vec<Box<dyn Any>>> = RefCell::new(Vec::new());
}

fn keep<T: 'static>(component: T) {
    PAGE.with(|page| page.borrow_mut().push(Box::new(component)));
}

/// Options of a `.product-viewer` element from its `data-model` and
/// `data-texture` attributes
pub fn declared_viewer_options(model: Option<String>, texture: Option<String>) -> ViewerOptions {
    ViewerOptions {
        model_path: model,
        texture_path: texture,
        auto_rotate: true,
        auto_rotate_speed: PAGE_AUTO_ROTATE_SPEED,
        ..Default::default()
    }
}

/// Catalog of a `.product-configurator` element from its `data-config`
/// attribute; absent means an empty catalog
pub fn declared_catalog(config: Option<&str>) -> Result<ConfiguratorOptions, serde_json::Error> {
    ConfiguratorOptions::from_json(config.unwrap_or("{}"))
}

/// Activate now, or on `DOMContentLoaded` while the document is still loading
pub fn on_page_ready() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    if document.ready_state() != "loading" {
        activate_page(&document);
        return Ok(());
    }
    let ready = document.clone();
    let callback = Closure::once_into_js(move || activate_page(&ready));
    document.add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
}

fn elements(document: &Document, selector: &str) -> Vec<Element> {
    match document.query_selector_all(selector) {
        Ok(list) => (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect(),
        Err(e) => {
            warn!("query {} failed: {}", selector, js_message(&e));
            Vec::new()
        }
    }
}

fn activate_page(document: &Document) {
    let mut count = 0;

    for el in elements(document, ".product-viewer") {
        let options =
            declared_viewer_options(el.get_attribute("data-model"), el.get_attribute("data-texture"));
        let Ok(container) = el.dyn_into::<HtmlElement>() else {
            continue;
        };
        match ProductViewer::mount(&container, options) {
            Ok(viewer) => {
                keep(viewer);
                count += 1;
            }
            Err(e) => error!("failed to mount product viewer: {}", js_message(&e)),
        }
    }

    for el in elements(document, ".product-configurator") {
        let options = match declared_catalog(el.get_attribute("data-config").as_deref()) {
            Ok(options) => options,
            Err(e) => {
                error!("invalid data-config: {}", e);
                continue;
            }
        };
        let Ok(container) = el.dyn_into::<HtmlElement>() else {
            continue;
        };
        match ProductConfigurator::mount(&container, options) {
            Ok(configurator) => {
                keep(configurator);
                count += 1;
            }
            Err(e) => error!("failed to mount configurator: {}", js_message(&e)),
        }
    }

    for el in elements(document, ".swiper") {
        match CarouselDom::attach(&el, CarouselOptions::default()) {
            Ok(carousel) => {
                keep(carousel);
                count += 1;
            }
            Err(e) => warn!("failed to attach carousel: {}", js_message(&e)),
        }
    }

    for el in elements(document, ".before-after-slider") {
        match CompareDom::attach(&el) {
            Ok(Some(slider)) => {
                keep(slider);
                count += 1;
            }
            Ok(None) => {}
            Err(e) => warn!("failed to attach comparison slider: {}", js_message(&e)),
        }
    }

    info!("activated {} page components", count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Color;

    #[test]
    fn test_declared_viewer_options() {
        let options = declared_viewer_options(Some("models/chair.glb".into()), None);
        assert_eq!(options.model_path(), Some("models/chair.glb"));
        assert_eq!(options.texture_path(), None);
        assert!(options.auto_rotate);
        assert_eq!(options.auto_rotate_speed, 0.5);
        assert_eq!(options.background_color, ViewerOptions::default().background_color);
    }

    #[test]
    fn test_declared_catalog() {
        assert_eq!(declared_catalog(None).unwrap(), ConfiguratorOptions::default());

        let json = r##"{"colors": {"red": {"name": "Red", "value": "#ff0000"}}}"##;
        let catalog = declared_catalog(Some(json)).unwrap();
        assert!(catalog.models.is_empty());
        assert_eq!(catalog.colors["red"].value, Color::from_hex(0xff0000));

        assert!(declared_catalog(Some("{not json")).is_err());
    }
}
