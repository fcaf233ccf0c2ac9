//! `requestAnimationFrame` frame scheduler

use std::cell::RefCell;
use std::rc::Rc;

use product_viewer::{FrameHandle, FrameScheduler};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// Body run on every animation frame, installed once the component exists
pub type FrameSlot = Rc<RefCell<Option<Box<dyn FnMut(f64)>>>>;

pub struct RafScheduler {
    window: Window,
    callback: Closure<dyn FnMut(f64)>,
}

impl RafScheduler {
    pub fn new(slot: FrameSlot) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            // taken out while it runs
            let body = slot.borrow_mut().take();
            if let Some(mut body) = body {
                body(timestamp);
                slot.borrow_mut().get_or_insert(body);
            }
        });
        Ok(Self { window, callback })
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(id) => FrameHandle(id as u32),
            Err(e) => {
                warn!("requestAnimationFrame failed: {:?}", e);
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0 as i32) {
            warn!("cancelAnimationFrame failed: {:?}", e);
        }
    }
}
