//! DOM side of a viewport: container element, canvas and input listeners

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use product_viewer::{PointerButton, PointerInput, ViewerEvent, ViewportHost};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CustomEvent, CustomEventInit, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent,
    TouchEvent, TouchList, WheelEvent,
};

/// Event listener registered until dropped
pub struct Listener {
    target: EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new<F>(target: &EventTarget, name: &'static str, handler: F) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            name,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.name, self.closure.as_ref().unchecked_ref());
    }
}

/// Input collected by listeners, drained by the frame loop
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    Resize,
    Pointer(PointerInput),
}

#[derive(Clone, Default)]
pub struct InputQueue(Rc<RefCell<Vec<HostInput>>>);

impl InputQueue {
    pub fn push(&self, input: HostInput) {
        self.0.borrow_mut().push(input);
    }

    pub fn drain(&self) -> Vec<HostInput> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// `MouseEvent.button` to orbit button
pub fn pointer_button(button: i16) -> Option<PointerButton> {
    match button {
        0 => Some(PointerButton::Primary),
        1 => Some(PointerButton::Middle),
        2 => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Touch points relative to the element's top-left corner
fn touch_points(list: &TouchList, element: &HtmlElement) -> Vec<Vec2> {
    let rect = element.get_bounding_client_rect();
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(|t| {
            Vec2::new(
                (t.client_x() as f64 - rect.left()) as f32,
                (t.client_y() as f64 - rect.top()) as f32,
            )
        })
        .collect()
}

/// [`ViewportHost`] backed by a container element holding the canvas
pub struct DomHost {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    inputs: InputQueue,
    listeners: Vec<Listener>,
}

impl DomHost {
    pub fn new(container: HtmlElement, canvas: HtmlCanvasElement, inputs: InputQueue) -> Self {
        Self {
            container,
            canvas,
            inputs,
            listeners: Vec::new(),
        }
    }

    /// Push the translated form of every `name` event on `target`
    fn forward<F>(&mut self, target: &EventTarget, name: &'static str, translate: F) -> Result<(), JsValue>
    where
        F: Fn(&Event) -> Option<PointerInput> + 'static,
    {
        let inputs = self.inputs.clone();
        let listener = Listener::new(target, name, move |event: Event| {
            if let Some(input) = translate(&event) {
                inputs.push(HostInput::Pointer(input));
            }
        })?;
        self.listeners.push(listener);
        Ok(())
    }

    fn listen(&mut self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let canvas: EventTarget = self.canvas.clone().into();
        let surface: HtmlElement = self.canvas.clone().into();

        let inputs = self.inputs.clone();
        self.listeners.push(Listener::new(&window, "resize", move |_| {
            inputs.push(HostInput::Resize)
        })?);

        self.forward(&canvas, "mousedown", |event| {
            let e = event.dyn_ref::<MouseEvent>()?;
            Some(PointerInput::Down {
                button: pointer_button(e.button())?,
                position: Vec2::new(e.offset_x() as f32, e.offset_y() as f32),
            })
        })?;
        self.forward(&canvas, "mousemove", |event| {
            let e = event.dyn_ref::<MouseEvent>()?;
            Some(PointerInput::Move {
                position: Vec2::new(e.offset_x() as f32, e.offset_y() as f32),
            })
        })?;
        // drags may end outside the canvas
        self.forward(&window, "mouseup", |_| Some(PointerInput::Up))?;
        self.forward(&canvas, "wheel", |event| {
            let e = event.dyn_ref::<WheelEvent>()?;
            e.prevent_default();
            Some(PointerInput::Wheel {
                delta_y: e.delta_y() as f32,
            })
        })?;

        let el = surface.clone();
        self.forward(&canvas, "touchstart", move |event| {
            let e = event.dyn_ref::<TouchEvent>()?;
            Some(PointerInput::TouchStart {
                touches: touch_points(&e.touches(), &el),
            })
        })?;
        let el = surface;
        self.forward(&canvas, "touchmove", move |event| {
            let e = event.dyn_ref::<TouchEvent>()?;
            e.prevent_default();
            Some(PointerInput::TouchMove {
                touches: touch_points(&e.touches(), &el),
            })
        })?;
        self.forward(&canvas, "touchend", |_| Some(PointerInput::TouchEnd))?;

        self.listeners.push(Listener::new(&canvas, "contextmenu", |event: Event| {
            event.prevent_default()
        })?);
        Ok(())
    }
}

fn dispatch_custom(
    target: &HtmlElement,
    name: &str,
    detail: Option<serde_json::Value>,
) -> Result<(), JsValue> {
    let init = CustomEventInit::new();
    if let Some(detail) = detail {
        let value = detail.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?;
        init.set_detail(&value);
    }
    let event = CustomEvent::new_with_event_init_dict(name, &init)?;
    target.dispatch_event(&event)?;
    Ok(())
}

impl ViewportHost for DomHost {
    fn client_size(&self) -> (u32, u32) {
        (
            self.container.client_width().max(0) as u32,
            self.container.client_height().max(0) as u32,
        )
    }

    fn device_pixel_ratio(&self) -> f32 {
        web_sys::window()
            .map(|w| w.device_pixel_ratio() as f32)
            .unwrap_or(1.0)
    }

    /// Listeners run after the current frame or call returns, so they may call
    /// back into the viewer.
    fn dispatch(&self, event: &ViewerEvent) {
        let container = self.container.clone();
        let name = event.name();
        let detail = event.detail();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = dispatch_custom(&container, name, detail) {
                warn!("failed to dispatch {}: {:?}", name, e);
            }
        });
    }

    fn bind_listeners(&mut self) {
        if let Err(e) = self.listen() {
            warn!("failed to bind viewer listeners: {:?}", e);
        }
    }

    fn unbind_listeners(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_button_mapping() {
        assert_eq!(pointer_button(0), Some(PointerButton::Primary));
        assert_eq!(pointer_button(1), Some(PointerButton::Middle));
        assert_eq!(pointer_button(2), Some(PointerButton::Secondary));
        assert_eq!(pointer_button(3), None);
    }

    #[test]
    fn test_input_queue_drains_in_order() {
        let queue = InputQueue::default();
        queue.push(HostInput::Resize);
        queue.push(HostInput::Pointer(PointerInput::Up));
        assert_eq!(
            queue.drain(),
            vec![HostInput::Resize, HostInput::Pointer(PointerInput::Up)]
        );
        assert!(queue.drain().is_empty());
    }
}
