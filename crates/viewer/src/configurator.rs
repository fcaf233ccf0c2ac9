//! ConfiguratorPanel: model / material / color pickers driving a viewport

use chrono::{DateTime, Utc};
use shared::{
    Color, Configuration, ConfiguratorOptions, ExportedConfiguration, OptionKind, ViewerOptions,
};
use tracing::{debug, warn};

use crate::controls::PointerInput;
use crate::error::Result;
use crate::loader::TextureSlot;
use crate::viewport::{SceneViewport, ViewportServices};

/// One pickable option as shown in the panel
#[derive(Debug, Clone, PartialEq)]
pub struct OptionButton {
    pub key: String,
    pub label: String,
    pub thumbnail: Option<String>,
    /// Background swatch for color options
    pub swatch: Option<Color>,
    pub active: bool,
}

/// A titled grid of options for one catalog
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSection {
    pub kind: OptionKind,
    pub title: &'static str,
    pub options: Vec<OptionButton>,
}

/// View model of the configurator panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelView {
    pub sections: Vec<PanelSection>,
}

impl PanelView {
    /// One section per non-empty catalog, in model, material, color order
    pub fn build(options: &ConfiguratorOptions) -> Self {
        let mut sections = Vec::new();

        if !options.models.is_empty() {
            sections.push(PanelSection {
                kind: OptionKind::Model,
                title: OptionKind::Model.title(),
                options: options
                    .models
                    .iter()
                    .map(|(key, m)| OptionButton {
                        key: key.clone(),
                        label: m.name.clone(),
                        thumbnail: m.thumbnail.clone(),
                        swatch: None,
                        active: false,
                    })
                    .collect(),
            });
        }
        if !options.materials.is_empty() {
            sections.push(PanelSection {
                kind: OptionKind::Material,
                title: OptionKind::Material.title(),
                options: options
                    .materials
                    .iter()
                    .map(|(key, m)| OptionButton {
                        key: key.clone(),
                        label: m.name.clone(),
                        thumbnail: m.thumbnail.clone(),
                        swatch: None,
                        active: false,
                    })
                    .collect(),
            });
        }
        if !options.colors.is_empty() {
            sections.push(PanelSection {
                kind: OptionKind::Color,
                title: OptionKind::Color.title(),
                options: options
                    .colors
                    .iter()
                    .map(|(key, c)| OptionButton {
                        key: key.clone(),
                        label: c.name.clone(),
                        thumbnail: None,
                        swatch: Some(c.value),
                        active: false,
                    })
                    .collect(),
            });
        }
        Self { sections }
    }

    pub fn section(&self, kind: OptionKind) -> Option<&PanelSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Key of the highlighted option of a section
    pub fn active_key(&self, kind: OptionKind) -> Option<&str> {
        self.section(kind)?
            .options
            .iter()
            .find(|o| o.active)
            .map(|o| o.key.as_str())
    }

    /// Highlight exactly the selected option of each section
    pub fn refresh(&mut self, configuration: &Configuration) {
        for section in &mut self.sections {
            let selected = match section.kind {
                OptionKind::Model => configuration.model.as_deref(),
                OptionKind::Material => configuration.material.as_deref(),
                OptionKind::Color => configuration.color.as_deref(),
            };
            for option in &mut section.options {
                option.active = selected == Some(option.key.as_str());
            }
        }
    }
}

/// Product configurator: option catalogs, current selections and the viewport
/// showing the result.
///
/// Selections are independent; no compatibility between them is checked.
pub struct ConfiguratorPanel {
    options: ConfiguratorOptions,
    configuration: Configuration,
    panel: PanelView,
    viewport: SceneViewport,
    /// Asset generation the current selections were last applied to
    applied_generation: u64,
}

impl ConfiguratorPanel {
    pub fn new(services: ViewportServices, options: ConfiguratorOptions) -> Self {
        let viewer_options = ViewerOptions {
            background_color: Color::from_hex(0xf5f5f5),
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            ..Default::default()
        };
        let viewport = SceneViewport::new(services, viewer_options);
        let panel = PanelView::build(&options);
        Self {
            applied_generation: viewport.asset_generation(),
            options,
            configuration: Configuration::default(),
            panel,
            viewport,
        }
    }

    pub fn options(&self) -> &ConfiguratorOptions {
        &self.options
    }

    pub fn panel(&self) -> &PanelView {
        &self.panel
    }

    pub fn viewport(&self) -> &SceneViewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut SceneViewport {
        &mut self.viewport
    }

    // ── Selection ─────────────────────────────────────────────

    /// Select a model; loads its asset when the option names a path
    pub fn select_model(&mut self, key: &str) {
        self.configuration.model = Some(key.to_string());
        match self.options.models.get(key) {
            Some(model) => match model.path.as_deref().filter(|p| !p.is_empty()) {
                Some(path) => {
                    let path = path.to_string();
                    self.viewport.load_asset(&path);
                }
                None => debug!("model '{}' has no asset path", key),
            },
            None => warn!("unknown model option '{}'", key),
        }
        self.panel.refresh(&self.configuration);
    }

    pub fn select_material(&mut self, key: &str) {
        self.configuration.material = Some(key.to_string());
        self.apply_selections();
        self.panel.refresh(&self.configuration);
    }

    pub fn select_color(&mut self, key: &str) {
        self.configuration.color = Some(key.to_string());
        self.apply_selections();
        self.panel.refresh(&self.configuration);
    }

    /// Select by catalog kind, as panel buttons do
    pub fn select(&mut self, kind: OptionKind, key: &str) {
        match kind {
            OptionKind::Model => self.select_model(key),
            OptionKind::Material => self.select_material(key),
            OptionKind::Color => self.select_color(key),
        }
    }

    /// Re-apply the selected material and color to the loaded asset.
    /// No-op until an asset is loaded.
    fn apply_selections(&mut self) {
        if !self.viewport.is_loaded() {
            return;
        }
        self.applied_generation = self.viewport.asset_generation();

        if let Some(key) = &self.configuration.material {
            if let Some(texture) = self
                .options
                .materials
                .get(key)
                .and_then(|m| m.texture.clone())
            {
                self.viewport.request_texture(TextureSlot::Material, &texture);
            }
        }
        if let Some(key) = &self.configuration.color {
            if let Some(color) = self.options.colors.get(key) {
                self.viewport.apply_color(color.value);
            }
        }
    }

    /// Drain viewport loads; a newly installed asset gets the current
    /// selections re-applied
    pub fn poll_loads(&mut self) -> usize {
        let handled = self.viewport.poll_loads();
        if self.viewport.asset_generation() != self.applied_generation {
            self.apply_selections();
        }
        handled
    }

    // ── Snapshot / export ─────────────────────────────────────

    pub fn get_configuration(&self) -> Configuration {
        self.configuration.clone()
    }

    /// Selections plus a screenshot, stamped with the current time
    pub fn export_configuration(&mut self) -> Result<ExportedConfiguration> {
        self.export_configuration_at(Utc::now())
    }

    pub fn export_configuration_at(
        &mut self,
        captured_at: DateTime<Utc>,
    ) -> Result<ExportedConfiguration> {
        let screenshot = self.viewport.take_screenshot()?;
        Ok(ExportedConfiguration::new(
            self.get_configuration(),
            screenshot,
            captured_at,
        ))
    }

    // ── Viewport proxies ──────────────────────────────────────

    pub fn tick(&mut self, timestamp_ms: f64) {
        self.poll_loads();
        self.viewport.tick(timestamp_ms);
    }

    pub fn handle_resize(&mut self) {
        self.viewport.handle_resize();
    }

    pub fn handle_pointer(&mut self, input: PointerInput) {
        self.viewport.handle_pointer(input);
    }

    pub fn dispose(&mut self) {
        self.viewport.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_panel_sections_skip_empty_catalogs() {
        let mut options = fixtures::sample_catalog();
        options.materials.clear();
        let panel = PanelView::build(&options);

        let kinds: Vec<_> = panel.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![OptionKind::Model, OptionKind::Color]);
        assert_eq!(panel.sections[0].title, "Select Model");
        assert_eq!(panel.sections[1].title, "Select Color");
    }

    #[test]
    fn test_panel_empty_catalog_has_no_sections() {
        let panel = PanelView::build(&ConfiguratorOptions::default());
        assert!(panel.sections.is_empty());
    }

    #[test]
    fn test_color_buttons_carry_swatch() {
        let panel = PanelView::build(&fixtures::sample_catalog());
        let colors = panel.section(OptionKind::Color).unwrap();
        assert!(colors.options.iter().all(|o| o.swatch.is_some()));
        let models = panel.section(OptionKind::Model).unwrap();
        assert!(models.options.iter().all(|o| o.swatch.is_none()));
    }

    #[test]
    fn test_refresh_highlights_only_selection() {
        let mut panel = PanelView::build(&fixtures::sample_catalog());
        panel.refresh(&Configuration {
            model: Some("chair".into()),
            material: None,
            color: Some("red".into()),
        });
        assert_eq!(panel.active_key(OptionKind::Model), Some("chair"));
        assert_eq!(panel.active_key(OptionKind::Material), None);
        assert_eq!(panel.active_key(OptionKind::Color), Some("red"));

        let active: usize = panel
            .sections
            .iter()
            .map(|s| s.options.iter().filter(|o| o.active).count())
            .sum();
        assert_eq!(active, 2);
    }
}
