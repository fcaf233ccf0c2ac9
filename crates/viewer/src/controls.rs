//! Orbit controls: pointer input -> camera orbit, dolly and pan

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;

/// Dolly factor applied by one `zoom_in` / `zoom_out` step
pub const ZOOM_STEP: f32 = 1.5;

const PITCH_LIMIT: f32 = PI / 2.0 - 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Mouse and touch input in surface pixels
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Down { button: PointerButton, position: Vec2 },
    Move { position: Vec2 },
    Up,
    Wheel { delta_y: f32 },
    TouchStart { touches: Vec<Vec2> },
    TouchMove { touches: Vec<Vec2> },
    TouchEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragMode {
    Rotate,
    Pan,
    Dolly,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    last: Vec2,
}

/// Camera placement captured for `reset`
#[derive(Debug, Clone, Copy)]
struct SavedView {
    target: Vec3,
    position: Vec3,
}

/// Orbit camera controller with damping and auto-rotation.
///
/// Input accumulates deltas; `update` applies them to a camera. With damping
/// enabled only a fraction of each delta is applied per update and the rest
/// decays over the following frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_rotate: bool,
    pub auto_rotate: bool,
    /// 2.0 is one orbit per 30 seconds at 60 frames per second
    pub auto_rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    yaw_delta: f32,
    pitch_delta: f32,
    scale: f32,
    pan_offset: Vec3,
    viewport_height: f32,
    drag: Option<Drag>,
    pinch_distance: Option<f32>,
    saved: SavedView,
    disposed: bool,
}

impl OrbitControls {
    /// Controls orbiting `camera.target`, with the camera's current placement
    /// saved as the reset view
    pub fn new(camera: &PerspectiveCamera) -> Self {
        Self {
            target: camera.target,
            enable_damping: true,
            damping_factor: 0.05,
            enable_zoom: true,
            enable_pan: true,
            enable_rotate: true,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            min_distance: 2.0,
            max_distance: 20.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            viewport_height: 1.0,
            drag: None,
            pinch_distance: None,
            saved: SavedView {
                target: camera.target,
                position: camera.position,
            },
            disposed: false,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether a pointer drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Remember the camera's placement as the `reset` target
    pub fn save_state(&mut self, camera: &PerspectiveCamera) {
        self.target = camera.target;
        self.saved = SavedView {
            target: camera.target,
            position: camera.position,
        };
    }

    /// Restore the saved placement and drop pending motion
    pub fn reset(&mut self, camera: &mut PerspectiveCamera) {
        self.target = self.saved.target;
        camera.target = self.saved.target;
        camera.position = self.saved.position;
        self.clear_motion();
    }

    pub fn zoom_in(&mut self) {
        self.dolly_in(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.dolly_out(ZOOM_STEP);
    }

    /// Move closer: distance divided by `factor` on the next update
    pub fn dolly_in(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale /= factor;
        }
    }

    /// Move away: distance multiplied by `factor` on the next update
    pub fn dolly_out(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    fn auto_rotation_angle(&self) -> f32 {
        TAU / 60.0 / 60.0 * self.auto_rotate_speed
    }

    fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    /// Apply accumulated motion to `camera`. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.disposed {
            return false;
        }
        let before = camera.position;

        let offset = camera.position - self.target;
        let mut radius = offset.length().max(f32::EPSILON);
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();

        if self.auto_rotate && self.drag.is_none() {
            self.yaw_delta -= self.auto_rotation_angle();
        }

        let k = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        yaw += self.yaw_delta * k;
        pitch = (pitch + self.pitch_delta * k).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * k;

        let (sy, cy) = yaw.sin_cos();
        let (sp, cp) = pitch.sin_cos();
        camera.position = self.target + Vec3::new(radius * cp * sy, radius * sp, radius * cp * cy);
        camera.target = self.target;

        if self.enable_damping {
            self.yaw_delta *= 1.0 - k;
            self.pitch_delta *= 1.0 - k;
            self.pan_offset *= 1.0 - k;
        } else {
            self.yaw_delta = 0.0;
            self.pitch_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > 1e-12
    }

    /// Feed one input event. Camera is read for pan direction only.
    pub fn handle_input(&mut self, input: &PointerInput, camera: &PerspectiveCamera) {
        if self.disposed {
            return;
        }
        match input {
            PointerInput::Down { button, position } => {
                let mode = match button {
                    PointerButton::Primary => DragMode::Rotate,
                    PointerButton::Secondary => DragMode::Pan,
                    PointerButton::Middle => DragMode::Dolly,
                };
                if self.mode_enabled(mode) {
                    self.drag = Some(Drag {
                        mode,
                        last: *position,
                    });
                }
            }
            PointerInput::Move { position } => {
                if let Some(drag) = self.drag {
                    let delta = *position - drag.last;
                    self.apply_drag(drag.mode, delta, camera);
                    self.drag = Some(Drag {
                        last: *position,
                        ..drag
                    });
                }
            }
            PointerInput::Up | PointerInput::TouchEnd => {
                self.drag = None;
                self.pinch_distance = None;
            }
            PointerInput::Wheel { delta_y } => {
                if !self.enable_zoom {
                    return;
                }
                if *delta_y < 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if *delta_y > 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            PointerInput::TouchStart { touches } => match touches.as_slice() {
                [one] if self.enable_rotate => {
                    self.drag = Some(Drag {
                        mode: DragMode::Rotate,
                        last: *one,
                    });
                }
                [a, b, ..] => {
                    self.pinch_distance = Some(a.distance(*b));
                    self.drag = Some(Drag {
                        mode: DragMode::Pan,
                        last: (*a + *b) * 0.5,
                    });
                }
                _ => {}
            },
            PointerInput::TouchMove { touches } => match touches.as_slice() {
                [one] => {
                    if let Some(drag) = self.drag.filter(|d| d.mode == DragMode::Rotate) {
                        self.apply_drag(DragMode::Rotate, *one - drag.last, camera);
                        self.drag = Some(Drag {
                            last: *one,
                            ..drag
                        });
                    }
                }
                [a, b, ..] => {
                    let distance = a.distance(*b);
                    if let Some(previous) = self.pinch_distance {
                        if self.enable_zoom && distance > 0.0 && previous > 0.0 {
                            // Fingers apart -> closer
                            self.dolly_in(distance / previous);
                        }
                    }
                    self.pinch_distance = Some(distance);

                    let center = (*a + *b) * 0.5;
                    if let Some(drag) = self.drag {
                        if self.enable_pan {
                            self.pan_by_pixels(center - drag.last, camera);
                        }
                    }
                    self.drag = Some(Drag {
                        mode: DragMode::Pan,
                        last: center,
                    });
                }
                _ => {}
            },
        }
    }

    /// Release input state; further input and updates are ignored
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.drag = None;
        self.pinch_distance = None;
        self.clear_motion();
    }

    fn mode_enabled(&self, mode: DragMode) -> bool {
        match mode {
            DragMode::Rotate => self.enable_rotate,
            DragMode::Pan => self.enable_pan,
            DragMode::Dolly => self.enable_zoom,
        }
    }

    fn apply_drag(&mut self, mode: DragMode, delta: Vec2, camera: &PerspectiveCamera) {
        match mode {
            DragMode::Rotate => {
                let h = self.viewport_height;
                self.yaw_delta -= TAU * delta.x / h * self.rotate_speed;
                self.pitch_delta += TAU * delta.y / h * self.rotate_speed;
            }
            DragMode::Pan => self.pan_by_pixels(delta, camera),
            DragMode::Dolly => {
                if delta.y > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if delta.y < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
        }
    }

    /// Screen-space pan: one viewport height of motion moves the target by
    /// the visible height at the target distance
    fn pan_by_pixels(&mut self, delta: Vec2, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov * 0.5).tan();
        let forward = (-offset).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();

        let h = self.viewport_height;
        let left_amount = 2.0 * delta.x * target_distance / h * self.pan_speed;
        let up_amount = 2.0 * delta.y * target_distance / h * self.pan_speed;
        self.pan_offset += -right * left_amount + up * up_amount;
    }

    fn clear_motion(&mut self) {
        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn setup() -> (OrbitControls, PerspectiveCamera) {
        let camera = PerspectiveCamera::new(1.0, 5.0);
        let mut controls = OrbitControls::new(&camera);
        controls.enable_damping = false;
        controls.set_viewport_height(600);
        (controls, camera)
    }

    #[test]
    fn test_auto_rotate_keeps_distance() {
        let (mut controls, mut camera) = setup();
        controls.auto_rotate = true;
        controls.auto_rotate_speed = 1.0;

        assert!(controls.update(&mut camera));
        assert_relative_eq!(camera.distance(), 5.0, epsilon = 1e-4);
        assert!(camera.position.x.abs() > 0.0);
    }

    #[test]
    fn test_zoom_steps_respect_distance_limits() {
        let (mut controls, mut camera) = setup();

        controls.zoom_in();
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 5.0 / ZOOM_STEP, epsilon = 1e-4);

        for _ in 0..5 {
            controls.zoom_in();
            controls.update(&mut camera);
        }
        assert_relative_eq!(camera.distance(), controls.min_distance, epsilon = 1e-4);

        for _ in 0..10 {
            controls.zoom_out();
            controls.update(&mut camera);
        }
        assert_relative_eq!(camera.distance(), controls.max_distance, epsilon = 1e-4);
    }

    #[test]
    fn test_reset_restores_saved_view() {
        let (mut controls, mut camera) = setup();
        controls.handle_input(
            &PointerInput::Down {
                button: PointerButton::Primary,
                position: Vec2::new(100.0, 100.0),
            },
            &camera,
        );
        controls.handle_input(&PointerInput::Move { position: Vec2::new(250.0, 140.0) }, &camera);
        controls.update(&mut camera);
        assert_ne!(camera.position, Vec3::new(0.0, 0.0, 5.0));

        controls.reset(&mut camera);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn test_disabled_rotate_ignores_drag() {
        let (mut controls, mut camera) = setup();
        controls.enable_rotate = false;
        controls.handle_input(
            &PointerInput::Down {
                button: PointerButton::Primary,
                position: Vec2::ZERO,
            },
            &camera,
        );
        controls.handle_input(&PointerInput::Move { position: Vec2::new(300.0, 0.0) }, &camera);
        assert!(!controls.update(&mut camera));
        assert!(!controls.is_dragging());
    }

    #[test]
    fn test_damping_spreads_motion_over_frames() {
        let (mut controls, mut camera) = setup();
        controls.enable_damping = true;
        controls.handle_input(
            &PointerInput::Down {
                button: PointerButton::Primary,
                position: Vec2::ZERO,
            },
            &camera,
        );
        controls.handle_input(&PointerInput::Move { position: Vec2::new(60.0, 0.0) }, &camera);
        controls.handle_input(&PointerInput::Up, &camera);

        controls.update(&mut camera);
        let first = camera.position;
        controls.update(&mut camera);
        let second = camera.position;
        controls.update(&mut camera);
        let third = camera.position;

        let step1 = first.distance(Vec3::new(0.0, 0.0, 5.0));
        let step2 = second.distance(first);
        let step3 = third.distance(second);
        assert!(step1 > 0.0);
        assert!(step2 < step1);
        assert!(step3 < step2);
    }

    #[test]
    fn test_wheel_zoom_disabled() {
        let (mut controls, mut camera) = setup();
        controls.enable_zoom = false;
        controls.handle_input(&PointerInput::Wheel { delta_y: 120.0 }, &camera);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_pan_moves_target() {
        let (mut controls, mut camera) = setup();
        controls.handle_input(
            &PointerInput::Down {
                button: PointerButton::Secondary,
                position: Vec2::ZERO,
            },
            &camera,
        );
        controls.handle_input(&PointerInput::Move { position: Vec2::new(100.0, 0.0) }, &camera);
        controls.update(&mut camera);
        assert!(controls.target.x < 0.0);
        assert_relative_eq!(camera.distance(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_disposed_controls_are_inert() {
        let (mut controls, mut camera) = setup();
        controls.auto_rotate = true;
        controls.dispose();
        assert!(!controls.update(&mut camera));
        assert!(controls.is_disposed());
    }
}
