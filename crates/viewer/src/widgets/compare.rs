#[derive(Debug, Clone, Copy)]
struct Drag {
    start_x: f32,
    start_left: f32,
}

/// Before/after image comparison handle
#[derive(Debug, Clone)]
pub struct CompareSlider {
    /// Handle position, percent of the container width
    position: f32,
    drag: Option<Drag>,
}

impl Default for CompareSlider {
    fn default() -> Self {
        Self::new(50.0)
    }
}

impl CompareSlider {
    pub fn new(position: f32) -> Self {
        Self {
            position: position.clamp(0.0, 100.0),
            drag: None,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// `handle_left_px` is the handle's current left offset in pixels
    pub fn start_drag(&mut self, x: f32, handle_left_px: f32) {
        self.drag = Some(Drag {
            start_x: x,
            start_left: handle_left_px,
        });
    }

    /// Returns the new position, or `None` when no drag is active
    pub fn drag(&mut self, x: f32, container_width: f32) -> Option<f32> {
        let drag = self.drag?;
        if container_width <= 0.0 {
            return None;
        }
        let dx = x - drag.start_x;
        self.position = ((drag.start_left + dx) / container_width * 100.0).clamp(0.0, 100.0);
        Some(self.position)
    }

    pub fn stop_drag(&mut self) {
        self.drag = None;
    }

    /// Jump to a click inside the container; ignored mid-drag
    pub fn click(&mut self, x_in_container: f32, container_width: f32) -> Option<f32> {
        if self.drag.is_some() || container_width <= 0.0 {
            return None;
        }
        self.position = (x_in_container / container_width * 100.0).clamp(0.0, 100.0);
        Some(self.position)
    }

    /// CSS `left` of the handle
    pub fn handle_left(&self) -> String {
        format!("{}%", self.position)
    }

    /// CSS `clip-path` revealing the "after" image right of the handle
    pub fn clip_path(&self) -> String {
        let p = self.position;
        format!("polygon({p}% 0, 100% 0, 100% 100%, {p}% 100%)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_moves_relative_to_start() {
        let mut s = CompareSlider::default();
        s.start_drag(100.0, 200.0);
        assert_eq!(s.drag(150.0, 500.0), Some(50.0));
        assert_eq!(s.drag(-400.0, 500.0), Some(0.0));
        assert_eq!(s.drag(900.0, 500.0), Some(100.0));
        s.stop_drag();
        assert_eq!(s.drag(150.0, 500.0), None);
    }

    #[test]
    fn test_click_ignored_while_dragging() {
        let mut s = CompareSlider::default();
        assert_eq!(s.click(100.0, 400.0), Some(25.0));
        s.start_drag(0.0, 100.0);
        assert_eq!(s.click(300.0, 400.0), None);
        assert_eq!(s.position(), 25.0);
    }

    #[test]
    fn test_clip_path() {
        let s = CompareSlider::new(30.0);
        assert_eq!(s.clip_path(), "polygon(30% 0, 100% 0, 100% 100%, 30% 100%)");
        assert_eq!(s.handle_left(), "30%");
    }
}
