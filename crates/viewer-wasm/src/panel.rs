//! Configurator option panel rendered as DOM buttons

use std::rc::Rc;

use product_viewer::PanelView;
use shared::OptionKind;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

use crate::dom::Listener;

/// Called with the clicked option
pub type OnSelect = Rc<dyn Fn(OptionKind, &str)>;

/// CSS classes of an option button
pub fn button_class(kind: OptionKind) -> &'static str {
    match kind {
        OptionKind::Color => "config-option color-option",
        OptionKind::Model | OptionKind::Material => "config-option",
    }
}

fn element(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let el = document.create_element(tag)?;
    if !class.is_empty() {
        el.set_class_name(class);
    }
    Ok(el)
}

/// `div.configurator-panel` with one section per non-empty catalog
pub struct PanelDom {
    root: Element,
    buttons: Vec<(OptionKind, String, Element)>,
    _listeners: Vec<Listener>,
}

impl PanelDom {
    pub fn build(document: &Document, view: &PanelView, on_select: OnSelect) -> Result<Self, JsValue> {
        let root = element(document, "div", "configurator-panel")?;
        let mut buttons = Vec::new();
        let mut listeners = Vec::new();

        for section in &view.sections {
            let section_el = element(document, "div", "config-section")?;
            let title = element(document, "h3", "")?;
            title.set_text_content(Some(section.title));
            section_el.append_child(&title)?;

            let grid = element(document, "div", "config-grid")?;
            for option in &section.options {
                let button = element(document, "button", button_class(section.kind))?;
                button.set_attribute(section.kind.data_attribute(), &option.key)?;
                if let Some(swatch) = option.swatch {
                    button.set_attribute("style", &format!("background-color: {}", swatch.to_css()))?;
                }
                if let Some(src) = &option.thumbnail {
                    let img = element(document, "img", "")?;
                    img.set_attribute("src", src)?;
                    img.set_attribute("alt", &option.label)?;
                    button.append_child(&img)?;
                }
                let label = element(document, "span", "")?;
                label.set_text_content(Some(&option.label));
                button.append_child(&label)?;

                let kind = section.kind;
                let key = option.key.clone();
                let select = on_select.clone();
                listeners.push(Listener::new(&button, "click", move |_| select(kind, &key))?);

                grid.append_child(&button)?;
                buttons.push((section.kind, option.key.clone(), button));
            }
            section_el.append_child(&grid)?;
            root.append_child(&section_el)?;
        }

        let panel = Self {
            root,
            buttons,
            _listeners: listeners,
        };
        panel.sync(view);
        Ok(panel)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Mirror the highlighted options onto the `active` class
    pub fn sync(&self, view: &PanelView) {
        for (kind, key, button) in &self.buttons {
            let active = view.active_key(*kind) == Some(key.as_str());
            let _ = button.class_list().toggle_with_force("active", active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_class() {
        assert_eq!(button_class(OptionKind::Model), "config-option");
        assert_eq!(button_class(OptionKind::Material), "config-option");
        assert_eq!(button_class(OptionKind::Color), "config-option color-option");
    }
}
