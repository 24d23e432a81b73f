//! Scheduled callbacks owned by a mounted view.
//!
//! Both handles stop on drop, so a view that stores them and is then
//! unmounted stops scheduling work against its removed canvas.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::ui_model::{timer_action, TimerAction};

type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame` loop. The callback receives the frame timestamp.
pub struct AnimationLoop {
    running: Rc<Cell<bool>>,
    pending: Rc<Cell<Option<i32>>>,
    _slot: FrameSlot,
}

impl AnimationLoop {
    pub fn start(mut on_frame: impl FnMut(f64) + 'static) -> Result<Self, String> {
        let window = web_sys::window().ok_or("no window")?;
        let running = Rc::new(Cell::new(true));
        let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let slot: FrameSlot = Rc::new(RefCell::new(None));

        // The closure only holds a weak ref to its own slot; the loop handle
        // owns it.
        let weak = Rc::downgrade(&slot);
        let running_cb = Rc::clone(&running);
        let pending_cb = Rc::clone(&pending);
        let win = window.clone();
        let cb = Closure::wrap(Box::new(move |ts: f64| {
            pending_cb.set(None);
            if !running_cb.get() {
                return;
            }
            on_frame(ts);
            if !running_cb.get() {
                return;
            }
            let Some(slot) = weak.upgrade() else {
                return;
            };
            let next = slot
                .borrow()
                .as_ref()
                .and_then(|cb| win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
            pending_cb.set(next);
        }) as Box<dyn FnMut(f64)>);

        let first = window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map_err(|_| "requestAnimationFrame threw".to_string())?;
        pending.set(Some(first));
        *slot.borrow_mut() = Some(cb);

        Ok(Self {
            running,
            pending,
            _slot: slot,
        })
    }

    /// Idempotent.
    pub fn stop(&self) {
        self.running.set(false);
        if let Some(id) = self.pending.take() {
            if let Some(w) = web_sys::window() {
                let _ = w.cancel_animation_frame(id);
            }
        }
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `setInterval` handle, cleared on drop.
pub struct Interval {
    id: Option<i32>,
    _cb: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn start(period_ms: u32, on_tick: impl FnMut() + 'static) -> Result<Self, String> {
        let window = web_sys::window().ok_or("no window")?;
        let cb = Closure::wrap(Box::new(on_tick) as Box<dyn FnMut()>);
        let id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                period_ms.min(i32::MAX as u32) as i32,
            )
            .map_err(|_| "setInterval threw".to_string())?;
        Ok(Self {
            id: Some(id),
            _cb: cb,
        })
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn clear(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(w) = web_sys::window() {
                w.clear_interval_with_handle(id);
            }
        }
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Everything a mounted view has scheduled. Dropping it stops all of it.
///
/// `run` is the interval that only ticks while a run is active. It is armed
/// when the run starts and cleared when it halts or completes.
#[derive(Default)]
pub struct Scheduled {
    frame: Option<AnimationLoop>,
    run: Option<Interval>,
}

impl Scheduled {
    pub fn on_frame(&mut self, view: &'static str, on_frame: impl FnMut(f64) + 'static) {
        match AnimationLoop::start(on_frame) {
            Ok(l) => self.frame = Some(l),
            Err(e) => tracing::warn!(view, error = %e, "animation loop not started"),
        }
    }

    pub fn run_armed(&self) -> bool {
        self.run.as_ref().is_some_and(Interval::is_active)
    }

    /// Arms or clears the run interval to match `running`.
    pub fn sync_run(
        &mut self,
        view: &'static str,
        running: bool,
        period_ms: u32,
        on_tick: impl FnMut() + 'static,
    ) {
        match timer_action(self.run_armed(), running) {
            TimerAction::Arm => {
                // The previous interval is already cleared, so its closure is
                // not running and can be dropped here.
                self.run = None;
                match Interval::start(period_ms, on_tick) {
                    Ok(i) => self.run = Some(i),
                    Err(e) => tracing::warn!(view, error = %e, "run interval not started"),
                }
            }
            TimerAction::Disarm => self.disarm_run(),
            TimerAction::Keep => {}
        }
    }

    /// Clears the run interval but keeps its closure alive: this is called
    /// from inside that closure when a run completes.
    pub fn disarm_run(&mut self) {
        if let Some(i) = self.run.as_mut() {
            i.clear();
        }
    }

    pub fn stop_all(&mut self) {
        if let Some(l) = self.frame.take() {
            l.stop();
        }
        self.disarm_run();
    }
}
