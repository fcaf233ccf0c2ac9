//! Host document capabilities: container size, notifications, frame callbacks

use serde_json::{json, Value};

/// Notification dispatched on the viewer's container
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Loaded,
    Progress { percent: f32 },
    Error { error: String },
}

impl ViewerEvent {
    pub const LOADED: &'static str = "model:loaded";
    pub const PROGRESS: &'static str = "model:progress";
    pub const ERROR: &'static str = "model:error";

    /// DOM event name
    pub fn name(&self) -> &'static str {
        match self {
            ViewerEvent::Loaded => Self::LOADED,
            ViewerEvent::Progress { .. } => Self::PROGRESS,
            ViewerEvent::Error { .. } => Self::ERROR,
        }
    }

    /// Event detail payload, `None` for events without one
    pub fn detail(&self) -> Option<Value> {
        match self {
            ViewerEvent::Loaded => None,
            ViewerEvent::Progress { percent } => Some(json!({ "percent": percent })),
            ViewerEvent::Error { error } => Some(json!({ "error": error })),
        }
    }
}

/// The element a viewport renders into
pub trait ViewportHost {
    /// Container client size in CSS pixels
    fn client_size(&self) -> (u32, u32);

    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Dispatch a notification on the container
    fn dispatch(&self, event: &ViewerEvent);

    /// Start delivering resize and pointer input to the viewport
    fn bind_listeners(&mut self);

    fn unbind_listeners(&mut self);
}

/// Handle of a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

/// Per-refresh callback source
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(ViewerEvent::Loaded.name(), "model:loaded");
        assert_eq!(ViewerEvent::Progress { percent: 10.0 }.name(), "model:progress");
        assert_eq!(
            ViewerEvent::Error {
                error: "boom".into()
            }
            .name(),
            "model:error"
        );
    }

    #[test]
    fn test_event_detail() {
        assert!(ViewerEvent::Loaded.detail().is_none());
        let detail = ViewerEvent::Progress { percent: 50.0 }.detail().unwrap();
        assert_eq!(detail["percent"], 50.0);
        let detail = ViewerEvent::Error {
            error: "404".into(),
        }
        .detail()
        .unwrap();
        assert_eq!(detail["error"], "404");
    }
}
