//! Construction options for viewers and configurators

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Color;

fn default_true() -> bool {
    true
}

fn default_background() -> Color {
    Color::from_hex(0xf0f0f0)
}

fn default_camera_distance() -> f32 {
    5.0
}

fn default_auto_rotate_speed() -> f32 {
    1.0
}

/// Viewer construction options, fixed once the viewer is built.
///
/// Missing JSON fields fall back to the defaults below, so a partial object
/// from the page overrides only what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerOptions {
    /// Asset to load at construction
    #[serde(default)]
    pub model_path: Option<String>,
    /// Texture applied to every mesh of each loaded asset
    #[serde(default)]
    pub texture_path: Option<String>,
    #[serde(default = "default_background")]
    pub background_color: Color,
    /// Initial camera distance along +Z
    #[serde(default = "default_camera_distance")]
    pub camera_distance: f32,
    #[serde(default = "default_true")]
    pub auto_rotate: bool,
    #[serde(default = "default_auto_rotate_speed")]
    pub auto_rotate_speed: f32,
    /// Build the orbit controls at all
    #[serde(default = "default_true")]
    pub enable_controls: bool,
    #[serde(default = "default_true")]
    pub enable_zoom: bool,
    #[serde(default = "default_true")]
    pub enable_pan: bool,
    #[serde(default = "default_true")]
    pub enable_rotate: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            model_path: None,
            texture_path: None,
            background_color: default_background(),
            camera_distance: default_camera_distance(),
            auto_rotate: true,
            auto_rotate_speed: default_auto_rotate_speed(),
            enable_controls: true,
            enable_zoom: true,
            enable_pan: true,
            enable_rotate: true,
        }
    }
}

impl ViewerOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Asset path, treating an empty string as absent
    pub fn model_path(&self) -> Option<&str> {
        self.model_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Texture path, treating an empty string as absent
    pub fn texture_path(&self) -> Option<&str> {
        self.texture_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Apply caller overrides on top of these options; overrides win.
    pub fn merged_with(mut self, overrides: ViewerOverrides) -> Self {
        if let Some(v) = overrides.model_path {
            self.model_path = Some(v);
        }
        if let Some(v) = overrides.texture_path {
            self.texture_path = Some(v);
        }
        if let Some(v) = overrides.background_color {
            self.background_color = v;
        }
        if let Some(v) = overrides.camera_distance {
            self.camera_distance = v;
        }
        if let Some(v) = overrides.auto_rotate {
            self.auto_rotate = v;
        }
        if let Some(v) = overrides.auto_rotate_speed {
            self.auto_rotate_speed = v;
        }
        if let Some(v) = overrides.enable_controls {
            self.enable_controls = v;
        }
        if let Some(v) = overrides.enable_zoom {
            self.enable_zoom = v;
        }
        if let Some(v) = overrides.enable_pan {
            self.enable_pan = v;
        }
        if let Some(v) = overrides.enable_rotate {
            self.enable_rotate = v;
        }
        self
    }
}

/// Partial viewer options; every `Some` field replaces the base value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerOverrides {
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub texture_path: Option<String>,
    #[serde(default)]
    pub background_color: Option<Color>,
    #[serde(default)]
    pub camera_distance: Option<f32>,
    #[serde(default)]
    pub auto_rotate: Option<bool>,
    #[serde(default)]
    pub auto_rotate_speed: Option<f32>,
    #[serde(default)]
    pub enable_controls: Option<bool>,
    #[serde(default)]
    pub enable_zoom: Option<bool>,
    #[serde(default)]
    pub enable_pan: Option<bool>,
    #[serde(default)]
    pub enable_rotate: Option<bool>,
}

/// A selectable product model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Asset to load when selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A selectable surface material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Texture applied to every mesh when selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

/// A selectable surface color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorOption {
    pub name: String,
    pub value: Color,
}

/// Which catalog an option belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Model,
    Material,
    Color,
}

impl OptionKind {
    /// Section heading shown above the option grid
    pub fn title(&self) -> &'static str {
        match self {
            OptionKind::Model => "Select Model",
            OptionKind::Material => "Select Material",
            OptionKind::Color => "Select Color",
        }
    }

    /// Attribute carrying the option key on its button, e.g. `data-model`
    pub fn data_attribute(&self) -> &'static str {
        match self {
            OptionKind::Model => "data-model",
            OptionKind::Material => "data-material",
            OptionKind::Color => "data-color",
        }
    }
}

/// Option catalogs for a configurator. Each map may be empty or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguratorOptions {
    #[serde(default)]
    pub models: BTreeMap<String, ModelOption>,
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialOption>,
    #[serde(default)]
    pub colors: BTreeMap<String, ColorOption>,
}

impl ConfiguratorOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_options_defaults_from_empty_json() {
        let opts = ViewerOptions::from_json("{}").unwrap();
        assert_eq!(opts, ViewerOptions::default());
        assert_eq!(opts.background_color, Color::from_hex(0xf0f0f0));
        assert_eq!(opts.camera_distance, 5.0);
        assert!(opts.auto_rotate);
        assert!(opts.model_path().is_none());
    }

    #[test]
    fn test_viewer_options_partial_json_overrides() {
        let opts = ViewerOptions::from_json(
            r#"{"modelPath": "chair.glb", "autoRotateSpeed": 0.5, "enablePan": false}"#,
        )
        .unwrap();
        assert_eq!(opts.model_path(), Some("chair.glb"));
        assert_eq!(opts.auto_rotate_speed, 0.5);
        assert!(!opts.enable_pan);
        assert!(opts.enable_zoom);
    }

    #[test]
    fn test_empty_paths_are_absent() {
        let opts = ViewerOptions {
            model_path: Some(String::new()),
            texture_path: Some(String::new()),
            ..Default::default()
        };
        assert!(opts.model_path().is_none());
        assert!(opts.texture_path().is_none());
    }

    #[test]
    fn test_merged_with_overrides_win() {
        let base = ViewerOptions::default();
        let merged = base.merged_with(ViewerOverrides {
            background_color: Some(Color::from_hex(0xf5f5f5)),
            auto_rotate_speed: Some(0.5),
            ..Default::default()
        });
        assert_eq!(merged.background_color, Color::from_hex(0xf5f5f5));
        assert_eq!(merged.auto_rotate_speed, 0.5);
        assert_eq!(merged.camera_distance, 5.0);
    }

    #[test]
    fn test_configurator_options_json() {
        let json = r##"{
            "models": {"chair": {"name": "Chair", "path": "chair.glb"}},
            "colors": {"red": {"name": "Red", "value": "#ff0000"}, "blue": {"name": "Blue", "value": 255}}
        }"##;
        let opts = ConfiguratorOptions::from_json(json).unwrap();
        assert_eq!(opts.models.len(), 1);
        assert!(opts.materials.is_empty());
        assert_eq!(opts.colors.len(), 2);
        assert_eq!(opts.colors["blue"].value, Color::new(0, 0, 255));
        assert_eq!(opts.models["chair"].thumbnail, None);
    }

    #[test]
    fn test_option_kind_titles() {
        assert_eq!(OptionKind::Model.title(), "Select Model");
        assert_eq!(OptionKind::Color.data_attribute(), "data-color");
        assert_eq!(OptionKind::Material.data_attribute(), "data-material");
    }
}
