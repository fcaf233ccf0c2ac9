//! DOM bindings of the page widgets: slide carousel and before/after slider

use std::cell::RefCell;
use std::rc::Rc;

use product_viewer::widgets::{Carousel, CarouselOptions, CompareSlider};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlElement, MouseEvent, TouchEvent, Window};

use crate::dom::Listener;

fn query_html(root: &Element, selector: &str) -> Result<Option<HtmlElement>, JsValue> {
    Ok(root
        .query_selector(selector)?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok()))
}

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = el.style().set_property(property, value) {
        warn!("failed to set {}: {:?}", property, e);
    }
}

/// Horizontal position of a mouse or touch event. `changed` picks
/// `changedTouches`, which is the only list still populated on `touchend`.
fn event_x(event: &Event, changed: bool) -> Option<f32> {
    if let Some(e) = event.dyn_ref::<MouseEvent>() {
        return Some(e.client_x() as f32);
    }
    let e = event.dyn_ref::<TouchEvent>()?;
    let list = if changed {
        e.changed_touches()
    } else {
        e.touches()
    };
    list.item(0).map(|t| t.client_x() as f32)
}

/// `setInterval` registration cleared on drop
struct Interval {
    window: Window,
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    fn new<F: FnMut() + 'static>(window: &Window, period_ms: i32, f: F) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut()>::new(f);
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            period_ms,
        )?;
        Ok(Self {
            window: window.clone(),
            id,
            _callback: callback,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.id);
    }
}

// ── Carousel ──────────────────────────────────────────────────

struct CarouselView {
    carousel: Carousel,
    slides: Vec<HtmlElement>,
    dots: Vec<Element>,
}

impl CarouselView {
    fn render(&self) {
        for (slide, offset) in self.slides.iter().zip(self.carousel.slide_offsets()) {
            set_style(slide, "transform", &format!("translateX({offset}%)"));
        }
        let active = self.carousel.active_dot();
        for (i, dot) in self.dots.iter().enumerate() {
            let _ = dot
                .class_list()
                .toggle_with_force("swiper-pagination-bullet-active", active == Some(i));
        }
    }
}

fn update(view: &RefCell<CarouselView>, f: impl FnOnce(&mut Carousel)) {
    let mut v = view.borrow_mut();
    f(&mut v.carousel);
    v.render();
}

/// A `.swiper` element driven by [`Carousel`]
pub struct CarouselDom {
    _view: Rc<RefCell<CarouselView>>,
    _listeners: Vec<Listener>,
    _autoplay: Option<Interval>,
}

impl CarouselDom {
    pub fn attach(element: &Element, options: CarouselOptions) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let found = element.query_selector_all(".swiper-slide")?;
        let slides: Vec<HtmlElement> = (0..found.length())
            .filter_map(|i| found.item(i))
            .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
            .collect();
        let autoplay = options.autoplay;
        let carousel = Carousel::new(slides.len(), options);
        let view = Rc::new(RefCell::new(CarouselView {
            carousel,
            slides,
            dots: Vec::new(),
        }));

        let mut listeners = Vec::new();

        if let Some(pagination) = query_html(element, ".swiper-pagination")? {
            let total = view.borrow().carousel.total();
            for i in 0..total {
                let dot = document.create_element("span")?;
                dot.set_class_name("swiper-pagination-bullet");
                let v = view.clone();
                listeners.push(Listener::new(&dot, "click", move |_| {
                    update(&v, |c| c.go_to(i))
                })?);
                pagination.append_child(&dot)?;
                view.borrow_mut().dots.push(dot);
            }
        }
        if let Some(prev) = query_html(element, ".swiper-button-prev")? {
            let v = view.clone();
            listeners.push(Listener::new(&prev, "click", move |_| update(&v, |c| c.prev()))?);
        }
        if let Some(next) = query_html(element, ".swiper-button-next")? {
            let v = view.clone();
            listeners.push(Listener::new(&next, "click", move |_| update(&v, |c| c.next()))?);
        }

        let v = view.clone();
        listeners.push(Listener::new(element, "touchstart", move |e: Event| {
            if let Some(x) = event_x(&e, false) {
                v.borrow_mut().carousel.touch_start(x);
            }
        })?);
        let v = view.clone();
        listeners.push(Listener::new(element, "touchend", move |e: Event| {
            if let Some(x) = event_x(&e, true) {
                let mut view = v.borrow_mut();
                if view.carousel.touch_end(x) {
                    view.render();
                }
            }
        })?);
        let v = view.clone();
        listeners.push(Listener::new(element, "mousedown", move |e: Event| {
            if let Some(x) = event_x(&e, false) {
                v.borrow_mut().carousel.pointer_down(x);
            }
        })?);
        let v = view.clone();
        listeners.push(Listener::new(element, "mousemove", move |e: Event| {
            if v.borrow().carousel.is_dragging() {
                e.prevent_default();
            }
        })?);
        let v = view.clone();
        listeners.push(Listener::new(element, "mouseup", move |e: Event| {
            if let Some(x) = event_x(&e, false) {
                let mut view = v.borrow_mut();
                if view.carousel.pointer_up(x) {
                    view.render();
                }
            }
        })?);

        let autoplay = if autoplay {
            let v = view.clone();
            Some(Interval::new(&window, 250, move || {
                let mut view = v.borrow_mut();
                if view.carousel.autoplay_tick(js_sys::Date::now()) {
                    view.render();
                }
            })?)
        } else {
            None
        };

        view.borrow().render();
        debug!("carousel attached with {} slides", view.borrow().carousel.total());
        Ok(Self {
            _view: view,
            _listeners: listeners,
            _autoplay: autoplay,
        })
    }
}

// ── Before/after slider ───────────────────────────────────────

struct CompareView {
    slider: CompareSlider,
    handle: HtmlElement,
    after: HtmlElement,
}

impl CompareView {
    fn render(&self) {
        set_style(&self.handle, "left", &self.slider.handle_left());
        set_style(&self.after, "clip-path", &self.slider.clip_path());
    }
}

/// A `.before-after-slider` element driven by [`CompareSlider`]
pub struct CompareDom {
    _view: Rc<RefCell<CompareView>>,
    _listeners: Vec<Listener>,
}

impl CompareDom {
    /// `None` when the container, handle or after image is missing
    pub fn attach(element: &Element) -> Result<Option<Self>, JsValue> {
        let (Some(container), Some(handle), Some(after)) = (
            query_html(element, ".slider-container")?,
            query_html(element, ".slider-handle")?,
            query_html(element, ".after-image")?,
        ) else {
            return Ok(None);
        };
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let view = Rc::new(RefCell::new(CompareView {
            slider: CompareSlider::default(),
            handle: handle.clone(),
            after,
        }));
        let mut listeners = Vec::new();

        for name in ["mousedown", "touchstart"] {
            let v = view.clone();
            listeners.push(Listener::new(&handle, name, move |e: Event| {
                if let Some(x) = event_x(&e, false) {
                    let mut view = v.borrow_mut();
                    let left = view.handle.offset_left() as f32;
                    view.slider.start_drag(x, left);
                    e.prevent_default();
                }
            })?);
        }
        for name in ["mousemove", "touchmove"] {
            let v = view.clone();
            let container = container.clone();
            listeners.push(Listener::new(&document, name, move |e: Event| {
                let Some(x) = event_x(&e, false) else { return };
                let mut view = v.borrow_mut();
                if view.slider.drag(x, container.offset_width() as f32).is_some() {
                    view.render();
                }
            })?);
        }
        for name in ["mouseup", "touchend"] {
            let v = view.clone();
            listeners.push(Listener::new(&document, name, move |_| {
                v.borrow_mut().slider.stop_drag()
            })?);
        }
        let v = view.clone();
        let target = container.clone();
        listeners.push(Listener::new(&container, "click", move |e: Event| {
            let Some(x) = event_x(&e, false) else { return };
            let rect = target.get_bounding_client_rect();
            let mut view = v.borrow_mut();
            if view
                .slider
                .click(x - rect.left() as f32, rect.width() as f32)
                .is_some()
            {
                view.render();
            }
        })?);

        view.borrow().render();
        Ok(Some(Self {
            _view: view,
            _listeners: listeners,
        }))
    }
}
