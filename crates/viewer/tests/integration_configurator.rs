//! Integration tests for ConfiguratorPanel.

use chrono::{TimeZone, Utc};
use glam::Mat4;
use product_viewer::fixtures;
use product_viewer::harness::TestHarness;
use product_viewer::scene::SceneNode;
use product_viewer::{ConfiguratorPanel, ViewerError};
use shared::{Color, ConfiguratorOptions, OptionKind};

fn mesh_colors(model: &SceneNode) -> Vec<Color> {
    let mut colors = Vec::new();
    model.visit_meshes(&Mat4::IDENTITY, &mut |m, _| colors.push(m.material.color));
    colors
}

fn texture_sources(model: &SceneNode) -> Vec<String> {
    let mut sources = Vec::new();
    model.visit_meshes(&Mat4::IDENTITY, &mut |m, _| {
        if let Some(map) = &m.material.map {
            sources.push(map.source.clone());
        }
    });
    sources
}

/// Configurator with the chair model loaded
fn loaded(h: &TestHarness) -> ConfiguratorPanel {
    let mut cfg = h.configurator(fixtures::sample_catalog());
    cfg.select_model("chair");
    h.complete_asset("models/chair.glb", fixtures::offset_product());
    cfg.tick(16.0);
    assert!(cfg.viewport().is_loaded());
    cfg
}

#[test]
fn test_panel_sections_follow_catalog() {
    let h = TestHarness::new();
    let cfg = h.configurator(fixtures::sample_catalog());
    let panel = cfg.panel();

    let titles: Vec<_> = panel.sections.iter().map(|s| s.title).collect();
    assert_eq!(titles, vec!["Select Model", "Select Material", "Select Color"]);

    let model_keys: Vec<_> = panel.sections[0]
        .options
        .iter()
        .map(|o| o.key.as_str())
        .collect();
    assert_eq!(model_keys, vec!["chair", "lamp", "table"]);
    assert_eq!(
        panel.sections[0].options[0].thumbnail.as_deref(),
        Some("thumbs/chair.png")
    );
    assert!(panel
        .sections
        .iter()
        .flat_map(|s| &s.options)
        .all(|o| !o.active));
}

#[test]
fn test_empty_catalog_builds_viewer_only() {
    let h = TestHarness::new();
    let cfg = h.configurator(ConfiguratorOptions::from_json("{}").unwrap());
    assert!(cfg.panel().sections.is_empty());
    assert!(cfg.viewport().is_active());
}

#[test]
fn test_sub_viewport_options() {
    let h = TestHarness::new();
    let cfg = h.configurator(fixtures::sample_catalog());
    let viewport = cfg.viewport();
    assert_eq!(viewport.scene().background, Color::from_hex(0xf5f5f5));
    let controls = viewport.controls().unwrap();
    assert!(controls.auto_rotate);
    assert_eq!(controls.auto_rotate_speed, 0.5);
    assert!(h.pending_assets().is_empty());
}

#[test]
fn test_select_model_loads_and_highlights() {
    let h = TestHarness::new();
    let mut cfg = h.configurator(fixtures::sample_catalog());
    cfg.select_model("chair");

    assert_eq!(h.pending_assets(), vec!["models/chair.glb"]);
    assert_eq!(cfg.get_configuration().model.as_deref(), Some("chair"));
    assert_eq!(cfg.panel().active_key(OptionKind::Model), Some("chair"));

    cfg.select_model("table");
    assert_eq!(cfg.panel().active_key(OptionKind::Model), Some("table"));
    let active_models = cfg
        .panel()
        .section(OptionKind::Model)
        .unwrap()
        .options
        .iter()
        .filter(|o| o.active)
        .count();
    assert_eq!(active_models, 1);
}

#[test]
fn test_select_model_without_path_or_unknown_key() {
    let h = TestHarness::new();
    let mut cfg = h.configurator(fixtures::sample_catalog());

    cfg.select_model("lamp");
    assert!(h.pending_assets().is_empty());
    assert_eq!(cfg.get_configuration().model.as_deref(), Some("lamp"));

    cfg.select_model("sofa");
    assert!(h.pending_assets().is_empty());
    assert_eq!(cfg.get_configuration().model.as_deref(), Some("sofa"));
    assert_eq!(cfg.panel().active_key(OptionKind::Model), None);
}

#[test]
fn test_color_selected_before_load_is_applied_on_load() {
    let h = TestHarness::new();
    let mut cfg = h.configurator(fixtures::sample_catalog());
    cfg.select_color("navy");
    assert_eq!(cfg.panel().active_key(OptionKind::Color), Some("navy"));

    cfg.select_model("chair");
    h.complete_asset("models/chair.glb", fixtures::offset_product());
    cfg.tick(16.0);

    let model = cfg.viewport().model().unwrap();
    assert_eq!(mesh_colors(model), vec![Color::from_hex(0x1f2a44); 2]);
    assert_eq!(
        h.last_frame().unwrap().mesh_colors,
        vec![Color::from_hex(0x1f2a44); 2]
    );
}

#[test]
fn test_select_color_applies_synchronously() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);
    cfg.select_color("red");
    let model = cfg.viewport().model().unwrap();
    assert_eq!(mesh_colors(model), vec![Color::from_hex(0xff0000); 2]);
    model.visit_meshes(&Mat4::IDENTITY, &mut |m, _| assert!(m.material.needs_update));
}

#[test]
fn test_select_material_fetches_texture() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);
    cfg.select_material("oak");
    assert_eq!(h.pending_textures(), vec!["textures/oak.jpg"]);
    assert_eq!(cfg.panel().active_key(OptionKind::Material), Some("oak"));

    h.complete_texture(
        "textures/oak.jpg",
        fixtures::solid_texture("textures/oak.jpg", [150, 110, 60, 255]),
    );
    cfg.tick(32.0);
    let model = cfg.viewport().model().unwrap();
    assert_eq!(texture_sources(model), vec!["textures/oak.jpg"; 2]);
}

#[test]
fn test_material_without_texture_fetches_nothing() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);
    cfg.select_material("plain");
    assert!(h.pending_textures().is_empty());
    assert_eq!(cfg.get_configuration().material.as_deref(), Some("plain"));
}

#[test]
fn test_superseded_material_texture_is_dropped() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);
    cfg.select_material("oak");
    cfg.select_material("fabric");

    h.complete_texture(
        "textures/fabric.png",
        fixtures::solid_texture("textures/fabric.png", [200, 200, 210, 255]),
    );
    h.complete_texture(
        "textures/oak.jpg",
        fixtures::solid_texture("textures/oak.jpg", [150, 110, 60, 255]),
    );
    cfg.tick(32.0);

    let model = cfg.viewport().model().unwrap();
    assert_eq!(texture_sources(model), vec!["textures/fabric.png"; 2]);
}

#[test]
fn test_model_swap_reapplies_selections() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);
    cfg.select_material("oak");
    cfg.select_color("red");
    h.complete_texture(
        "textures/oak.jpg",
        fixtures::solid_texture("textures/oak.jpg", [150, 110, 60, 255]),
    );

    cfg.select_model("table");
    h.complete_asset("models/table.glb", fixtures::unit_cube());
    cfg.tick(48.0);

    let model = cfg.viewport().model().unwrap();
    assert_eq!(model.mesh_count(), 1);
    assert_eq!(mesh_colors(model), vec![Color::from_hex(0xff0000)]);
    // the color pick re-requested oak for the chair, the swap requested it again
    assert_eq!(h.pending_textures(), vec!["textures/oak.jpg"; 2]);
    assert_eq!(
        cfg.get_configuration(),
        shared::Configuration {
            model: Some("table".into()),
            material: Some("oak".into()),
            color: Some("red".into()),
        }
    );

    // the request made for the chair is stale
    h.complete_texture(
        "textures/oak.jpg",
        fixtures::solid_texture("textures/oak.jpg", [150, 110, 60, 255]),
    );
    cfg.tick(64.0);
    assert!(texture_sources(cfg.viewport().model().unwrap()).is_empty());

    h.complete_texture(
        "textures/oak.jpg",
        fixtures::solid_texture("textures/oak.jpg", [150, 110, 60, 255]),
    );
    cfg.tick(80.0);
    assert_eq!(
        texture_sources(cfg.viewport().model().unwrap()),
        vec!["textures/oak.jpg"]
    );
    assert!(h.pending_textures().is_empty());
}

#[test]
fn test_material_switch_releases_replaced_texture() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);

    cfg.select_material("oak");
    let oak = fixtures::solid_texture("textures/oak.jpg", [150, 110, 60, 255]);
    let oak_id = oak.id;
    h.complete_texture("textures/oak.jpg", oak);
    cfg.tick(32.0);
    assert!(h.released_textures().is_empty());

    cfg.select_material("fabric");
    let fabric = fixtures::solid_texture("textures/fabric.png", [200, 200, 210, 255]);
    let fabric_id = fabric.id;
    h.complete_texture("textures/fabric.png", fabric);
    cfg.tick(48.0);

    assert_eq!(h.released_textures(), vec![oak_id]);
    assert_eq!(cfg.viewport().model().unwrap().texture_ids(), vec![fabric_id]);
}

#[test]
fn test_selections_without_model_are_recorded_only() {
    let h = TestHarness::new();
    let mut cfg = h.configurator(fixtures::sample_catalog());
    cfg.select_material("oak");
    cfg.select_color("white");
    assert!(h.pending_textures().is_empty());
    assert!(!cfg.viewport().is_loaded());
    assert_eq!(cfg.get_configuration().color.as_deref(), Some("white"));
}

#[test]
fn test_export_configuration() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);
    cfg.select_color("red");

    let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let export = cfg.export_configuration_at(at).unwrap();
    assert_eq!(export.timestamp, "2024-05-06T07:08:09.000Z");
    assert!(export.screenshot.starts_with("data:image/png;base64,"));
    assert_eq!(export.configuration.model.as_deref(), Some("chair"));
    assert_eq!(export.configuration.material, None);

    let json: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
    assert_eq!(json["model"], "chair");
    assert_eq!(json["color"], "red");
    assert!(json["material"].is_null());
    assert_eq!(json["timestamp"], "2024-05-06T07:08:09.000Z");
}

#[test]
fn test_export_uses_current_time() {
    let h = TestHarness::new();
    let mut cfg = h.configurator(fixtures::sample_catalog());
    let before = Utc::now();
    let export = cfg.export_configuration().unwrap();
    let stamped = chrono::DateTime::parse_from_rfc3339(&export.timestamp).unwrap();
    assert!(stamped.timestamp_millis() >= before.timestamp_millis());
}

#[test]
fn test_export_without_gpu_fails() {
    let h = TestHarness::without_gpu();
    let mut cfg = h.configurator(fixtures::sample_catalog());
    cfg.select_model("chair");
    assert!(h.pending_assets().is_empty());
    assert!(matches!(
        cfg.export_configuration(),
        Err(ViewerError::Inactive)
    ));
}

#[test]
fn test_dispose_proxies_viewport() {
    let h = TestHarness::new();
    let mut cfg = loaded(&h);
    cfg.dispose();
    assert!(cfg.viewport().is_disposed());
    assert!(h.renderer_disposed());
    assert!(!h.listeners_bound());
}
