use serde::{Deserialize, Serialize};

/// Horizontal travel (px) before a drag or swipe changes slide
pub const SWIPE_THRESHOLD: f32 = 50.0;

fn default_delay() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselOptions {
    /// Milliseconds between automatic advances
    #[serde(default = "default_delay")]
    pub autoplay_delay: u32,
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Wrap from the last slide to the first and back
    #[serde(default = "default_true")]
    pub loop_slides: bool,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            autoplay_delay: default_delay(),
            autoplay: true,
            loop_slides: true,
        }
    }
}

/// Slide carousel state
#[derive(Debug, Clone)]
pub struct Carousel {
    options: CarouselOptions,
    current: usize,
    total: usize,
    drag_start: Option<f32>,
    touch_start: Option<f32>,
    last_advance_ms: Option<f64>,
}

impl Carousel {
    pub fn new(total: usize, options: CarouselOptions) -> Self {
        Self {
            options,
            current: 0,
            total,
            drag_start: None,
            touch_start: None,
            last_advance_ms: None,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn options(&self) -> &CarouselOptions {
        &self.options
    }

    pub fn go_to(&mut self, index: usize) {
        if index < self.total {
            self.current = index;
        }
    }

    pub fn next(&mut self) {
        if self.total == 0 {
            return;
        }
        if self.current + 1 < self.total {
            self.current += 1;
        } else if self.options.loop_slides {
            self.current = 0;
        }
    }

    pub fn prev(&mut self) {
        if self.total == 0 {
            return;
        }
        if self.current > 0 {
            self.current -= 1;
        } else if self.options.loop_slides {
            self.current = self.total - 1;
        }
    }

    // ── Mouse drag ────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f32) {
        self.drag_start = Some(x);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// End a drag. Returns true when the slide changed.
    pub fn pointer_up(&mut self, x: f32) -> bool {
        match self.drag_start.take() {
            Some(start) => self.swipe(start - x),
            None => false,
        }
    }

    // ── Touch swipe ───────────────────────────────────────────

    pub fn touch_start(&mut self, x: f32) {
        self.touch_start = Some(x);
    }

    pub fn touch_end(&mut self, x: f32) -> bool {
        match self.touch_start.take() {
            Some(start) => self.swipe(start - x),
            None => false,
        }
    }

    /// Positive travel (moved left) advances, negative goes back
    fn swipe(&mut self, diff: f32) -> bool {
        if diff.abs() <= SWIPE_THRESHOLD {
            return false;
        }
        let before = self.current;
        if diff > 0.0 {
            self.next();
        } else {
            self.prev();
        }
        before != self.current
    }

    /// Advance when the autoplay delay has passed since the last advance.
    /// The first call only starts the clock.
    pub fn autoplay_tick(&mut self, now_ms: f64) -> bool {
        if !self.options.autoplay || self.total < 2 {
            return false;
        }
        let Some(last) = self.last_advance_ms else {
            self.last_advance_ms = Some(now_ms);
            return false;
        };
        if now_ms - last >= self.options.autoplay_delay as f64 {
            self.last_advance_ms = Some(now_ms);
            self.next();
            return true;
        }
        false
    }

    /// `translateX` percentage of every slide
    pub fn slide_offsets(&self) -> Vec<f32> {
        (0..self.total)
            .map(|i| (i as f32 - self.current as f32) * 100.0)
            .collect()
    }

    /// Index of the highlighted pagination dot
    pub fn active_dot(&self) -> Option<usize> {
        (self.total > 0).then_some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_prev_wrap() {
        let mut c = Carousel::new(3, CarouselOptions::default());
        c.prev();
        assert_eq!(c.current(), 2);
        c.next();
        assert_eq!(c.current(), 0);
        c.next();
        c.next();
        assert_eq!(c.current(), 2);
    }

    #[test]
    fn test_no_loop_stops_at_ends() {
        let mut c = Carousel::new(
            2,
            CarouselOptions {
                loop_slides: false,
                ..Default::default()
            },
        );
        c.prev();
        assert_eq!(c.current(), 0);
        c.next();
        c.next();
        assert_eq!(c.current(), 1);
    }

    #[test]
    fn test_go_to_out_of_range_ignored() {
        let mut c = Carousel::new(3, CarouselOptions::default());
        c.go_to(2);
        c.go_to(7);
        assert_eq!(c.current(), 2);
    }

    #[test]
    fn test_drag_threshold() {
        let mut c = Carousel::new(4, CarouselOptions::default());
        c.pointer_down(300.0);
        assert!(!c.pointer_up(260.0));
        assert_eq!(c.current(), 0);

        c.pointer_down(300.0);
        assert!(c.pointer_up(200.0));
        assert_eq!(c.current(), 1);

        c.touch_start(100.0);
        assert!(c.touch_end(220.0));
        assert_eq!(c.current(), 0);
    }

    #[test]
    fn test_pointer_up_without_down() {
        let mut c = Carousel::new(4, CarouselOptions::default());
        assert!(!c.pointer_up(0.0));
        assert!(!c.is_dragging());
    }

    #[test]
    fn test_autoplay_tick() {
        let mut c = Carousel::new(3, CarouselOptions::default());
        assert!(!c.autoplay_tick(1000.0));
        assert!(!c.autoplay_tick(5999.0));
        assert!(c.autoplay_tick(6000.0));
        assert_eq!(c.current(), 1);
        assert!(!c.autoplay_tick(7000.0));
    }

    #[test]
    fn test_slide_offsets() {
        let mut c = Carousel::new(3, CarouselOptions::default());
        c.go_to(1);
        assert_eq!(c.slide_offsets(), vec![-100.0, 0.0, 100.0]);
        assert_eq!(c.active_dot(), Some(1));
        assert_eq!(Carousel::new(0, CarouselOptions::default()).active_dot(), None);
    }
}
