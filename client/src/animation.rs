use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement};

use crate::dom;

/// Slow at both ends, the classic page-animation curve.
pub fn swing(t: f64) -> f64 {
    0.5 - (t * std::f64::consts::PI).cos() / 2.0
}

/// Linear progress through `duration` ms, clamped to `0.0..=1.0`.
pub fn progress(start: f64, now: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    ((now - start) / duration).clamp(0.0, 1.0)
}

/// A running frame-by-frame animation. Dropping the handle does not stop it; `cancel` does.
#[derive(Clone)]
pub struct Tween {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    duration: f64,
    start: Cell<Option<f64>>,
    cancelled: Cell<bool>,
    step: RefCell<Box<dyn FnMut(f64)>>,
    done: RefCell<Option<Box<dyn FnOnce()>>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl Inner {
    fn request_frame(&self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let cb_ref = self.callback.borrow();
        if let Some(ref cb) = *cb_ref
            && window.request_animation_frame(cb.as_ref().unchecked_ref()).is_err()
        {
            web_sys::console::warn_1(&"requestAnimationFrame failed".into());
        }
    }

    fn finish(&self) {
        if let Some(done) = self.done.borrow_mut().take() {
            done();
        }
        // Break the callback->inner reference cycle.
        self.callback.borrow_mut().take();
    }
}

impl Tween {
    /// Calls `step` with eased progress each frame for `duration_ms`, then `done` once.
    pub fn start(
        duration_ms: u32,
        ease: fn(f64) -> f64,
        step: impl FnMut(f64) + 'static,
        done: impl FnOnce() + 'static,
    ) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            duration: f64::from(duration_ms),
            start: Cell::new(None),
            cancelled: Cell::new(false),
            step: RefCell::new(Box::new(step)),
            done: RefCell::new(Some(Box::new(done))),
            callback: RefCell::new(None),
        });

        let inner_cb = inner.clone();
        let cb = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
            if inner_cb.cancelled.get() {
                inner_cb.callback.borrow_mut().take();
                return;
            }
            let start = match inner_cb.start.get() {
                Some(start) => start,
                None => {
                    inner_cb.start.set(Some(now));
                    now
                }
            };
            let t = progress(start, now, inner_cb.duration);
            (*inner_cb.step.borrow_mut())(ease(t));
            if t >= 1.0 {
                inner_cb.finish();
            } else {
                inner_cb.request_frame();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        if inner.window.is_some() {
            inner.request_frame();
        } else {
            (*inner.step.borrow_mut())(1.0);
            inner.finish();
        }
        Self { inner }
    }

    /// Stop before the next frame; `done` is not called.
    pub fn cancel(&self) {
        self.inner.cancelled.set(true);
    }
}

fn set_opacity(el: &HtmlElement, opacity: f64) {
    el.style()
        .set_property("opacity", &format!("{opacity:.3}"))
        .ok();
}

/// Show `el` with the given `display` and raise its opacity to 1.
pub fn fade_in(el: &Element, display: &str, duration_ms: u32, done: impl FnOnce() + 'static) -> Option<Tween> {
    let el = el.dyn_ref::<HtmlElement>()?.clone();
    set_opacity(&el, 0.0);
    el.style().set_property("display", display).ok();
    let target = el.clone();
    Some(Tween::start(
        duration_ms,
        swing,
        move |t| set_opacity(&target, t),
        move || {
            el.style().remove_property("opacity").ok();
            done();
        },
    ))
}

/// Lower opacity to 0, then hide `el`.
pub fn fade_out(el: &Element, duration_ms: u32, done: impl FnOnce() + 'static) -> Option<Tween> {
    let el = el.dyn_ref::<HtmlElement>()?.clone();
    let target = el.clone();
    Some(Tween::start(
        duration_ms,
        swing,
        move |t| set_opacity(&target, 1.0 - t),
        move || {
            dom::hide(&el);
            el.style().remove_property("opacity").ok();
            done();
        },
    ))
}

/// Scroll the page so its top lands on `el`.
pub fn scroll_to_element(el: &Element, duration_ms: u32) -> Option<Tween> {
    let window = web_sys::window()?;
    let from = window.scroll_y().ok()?;
    let to = from + el.get_bounding_client_rect().top();
    Some(Tween::start(
        duration_ms,
        swing,
        move |t| window.scroll_to_with_x_and_y(0.0, from + (to - from) * t),
        || {},
    ))
}

#[cfg(test)]
mod tests {
    use super::{progress, swing};

    #[test]
    fn swing_is_symmetric_and_pinned() {
        assert!(swing(0.0).abs() < 1e-9);
        assert!((swing(1.0) - 1.0).abs() < 1e-9);
        assert!((swing(0.5) - 0.5).abs() < 1e-9);
        assert!((swing(0.25) + swing(0.75) - 1.0).abs() < 1e-9);
        assert!(swing(0.1) < 0.1);
    }

    #[test]
    fn progress_clamps_and_handles_zero_duration() {
        assert_eq!(progress(100.0, 100.0, 300.0), 0.0);
        assert_eq!(progress(100.0, 250.0, 300.0), 0.5);
        assert_eq!(progress(100.0, 900.0, 300.0), 1.0);
        assert_eq!(progress(100.0, 50.0, 300.0), 0.0);
        assert_eq!(progress(0.0, 0.0, 0.0), 1.0);
    }
}
