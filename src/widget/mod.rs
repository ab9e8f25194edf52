//! Browser widget shell
//!
//! Wires the pure session core to two canvases and the document's input
//! events. Deferred work (image loads, the failure-reset timer) captures the
//! session generation when scheduled and is discarded on mismatch; every
//! listener is removed when the widget drops.

mod draw;
mod listeners;
mod loader;

pub use listeners::ListenerGuard;

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{
    CanvasRenderingContext2d, Event, HtmlCanvasElement, HtmlElement, HtmlImageElement, MouseEvent,
    TouchEvent,
};

use crate::config::WidgetConfig;
use crate::provider::ImageProvider;
use crate::session::geometry::place_notch;
use crate::session::state::{SessionEvent, SessionPhase, SessionState};
use loader::PendingLoad;

/// Host notification callbacks, all optional and fire-and-forget
#[derive(Default, Clone)]
pub struct HostCallbacks {
    on_success: Option<Rc<dyn Fn()>>,
    on_fail: Option<Rc<dyn Fn()>>,
    on_refresh: Option<Rc<dyn Fn(bool)>>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires once per successful verification
    pub fn on_success(mut self, f: impl Fn() + 'static) -> Self {
        self.on_success = Some(Rc::new(f));
        self
    }

    /// Fires once per failed attempt
    pub fn on_fail(mut self, f: impl Fn() + 'static) -> Self {
        self.on_fail = Some(Rc::new(f));
        self
    }

    /// Fires whenever a new puzzle is generated; `true` for automatic resets
    pub fn on_refresh(mut self, f: impl Fn(bool) + 'static) -> Self {
        self.on_refresh = Some(Rc::new(f));
        self
    }
}

/// DOM elements the widget renders into
pub struct MountPoint {
    /// Full-size background canvas (photo with the notch hole)
    pub canvas: HtmlCanvasElement,
    /// Piece canvas, absolutely positioned over the background
    pub block: HtmlCanvasElement,
    /// Slider knob the user grabs
    pub handle: HtmlElement,
}

/// Armed failure-reset timeout; cleared on drop
struct FailTimer {
    handle: i32,
    _closure: Closure<dyn FnMut()>,
}

impl Drop for FailTimer {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(self.handle);
        }
    }
}

struct Inner {
    config: WidgetConfig,
    session: SessionState,
    rng: Pcg32,
    provider: Box<dyn ImageProvider>,
    canvas_ctx: CanvasRenderingContext2d,
    block_ctx: CanvasRenderingContext2d,
    block: HtmlCanvasElement,
    handle: HtmlElement,
    callbacks: HostCallbacks,
    pending_load: Option<PendingLoad>,
    fail_timer: Option<FailTimer>,
}

/// The widget instance. Dropping it unregisters all document listeners and
/// cancels any pending load or reset timer.
pub struct SliderCaptcha {
    inner: Rc<RefCell<Inner>>,
    _listeners: Vec<ListenerGuard>,
}

impl SliderCaptcha {
    /// Mount the widget. Fails fast on an undersized canvas; otherwise
    /// registers input listeners and starts loading the first puzzle.
    pub fn mount(
        mount: MountPoint,
        config: WidgetConfig,
        provider: Box<dyn ImageProvider>,
        callbacks: HostCallbacks,
    ) -> Result<Self, JsValue> {
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        mount.canvas.set_width(config.width);
        mount.canvas.set_height(config.height);
        mount.block.set_width(config.width);
        mount.block.set_height(config.height);

        let canvas_ctx = draw::context_2d(&mount.canvas)?;
        let block_ctx = draw::context_2d(&mount.block)?;

        let seed = js_sys::Date::now() as u64;
        let inner = Rc::new(RefCell::new(Inner {
            session: SessionState::new(&config),
            config,
            rng: Pcg32::seed_from_u64(seed),
            provider,
            canvas_ctx,
            block_ctx,
            block: mount.block.clone(),
            handle: mount.handle.clone(),
            callbacks,
            pending_load: None,
            fail_timer: None,
        }));

        let listeners = register_listeners(&inner, &mount)?;
        reset(&inner, true);

        Ok(Self {
            inner,
            _listeners: listeners,
        })
    }

    /// User-initiated refresh; no-op while loading or after a solve
    pub fn refresh(&self) {
        reset(&self.inner, false);
    }

    /// Current session phase, for host inspection
    pub fn phase(&self) -> SessionPhase {
        self.inner.borrow().session.phase()
    }
}

/// Start a new round. Clears both canvases, rewinds the slider, emits the
/// refresh event and kicks off the image load for the new generation.
fn reset(inner: &Rc<RefCell<Inner>>, auto: bool) {
    let generation = {
        let mut g = inner.borrow_mut();
        if g.session.begin_reset(auto).is_none() {
            return;
        }
        let (w, h) = (g.config.width as f64, g.config.height as f64);
        draw::clear_round(&g.canvas_ctx, &g.block, &g.block_ctx, w, h);
        set_left(&g.block, 0.0);
        set_left(&g.handle, 0.0);
        g.session.generation()
    };
    log::info!("captcha round {generation} loading (auto: {auto})");
    emit(inner, SessionEvent::Refresh { auto });
    start_load(inner, generation);
}

fn start_load(inner: &Rc<RefCell<Inner>>, generation: u64) {
    let make_url = {
        let weak = Rc::downgrade(inner);
        move || {
            let Some(inner) = weak.upgrade() else {
                return String::new();
            };
            let mut g = inner.borrow_mut();
            let (w, h) = (g.config.width, g.config.height);
            g.provider.image_url(w, h)
        }
    };
    let on_load = {
        let weak = Rc::downgrade(inner);
        move |image: HtmlImageElement| {
            if let Some(inner) = weak.upgrade() {
                finish_load(&inner, generation, &image);
            }
        }
    };
    let retry_limit = inner.borrow().config.retry_limit;
    match loader::start_load(make_url, retry_limit, on_load) {
        Ok(pending) => inner.borrow_mut().pending_load = Some(pending),
        Err(err) => log::error!("captcha image element creation failed: {err:?}"),
    }
}

/// Image arrived: place the notch, draw both canvases, mark the session
/// ready. A load for a superseded generation is discarded untouched.
fn finish_load(inner: &Rc<RefCell<Inner>>, generation: u64, image: &HtmlImageElement) {
    let mut g = inner.borrow_mut();
    if generation != g.session.generation() {
        log::debug!("discarding image for superseded round {generation}");
        return;
    }
    let (w, h) = (g.config.width as f64, g.config.height as f64);
    let geom = g.config.geometry();
    let notch = place_notch(&mut g.rng, w, h, &geom);
    if let Err(err) =
        draw::render_puzzle(&g.canvas_ctx, &g.block, &g.block_ctx, image, notch, &geom, w, h)
    {
        log::error!("puzzle draw failed: {err:?}");
        return;
    }
    if g.session.puzzle_ready(generation, notch) {
        log::info!("captcha round {generation} ready");
    }
}

/// Arm the post-failure reset. The callback re-checks generation and phase:
/// a manual refresh or an intervening successful re-drag makes it a no-op.
fn schedule_fail_reset(inner: &Rc<RefCell<Inner>>) {
    let generation = inner.borrow().session.generation();
    let weak = Rc::downgrade(inner);
    let closure = Closure::<dyn FnMut()>::new(move || {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let still_failed = {
            let g = inner.borrow();
            g.session.generation() == generation && g.session.phase() == SessionPhase::Failed
        };
        if still_failed {
            reset(&inner, true);
        }
    });

    let delay = inner.borrow().config.fail_reset_delay_ms as i32;
    let Some(window) = web_sys::window() else {
        return;
    };
    match window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay,
        ) {
        Ok(handle) => {
            inner.borrow_mut().fail_timer = Some(FailTimer {
                handle,
                _closure: closure,
            });
        }
        Err(err) => log::error!("failed to schedule auto reset: {err:?}"),
    }
}

fn emit(inner: &Rc<RefCell<Inner>>, event: SessionEvent) {
    let callbacks = inner.borrow().callbacks.clone();
    match event {
        SessionEvent::Refresh { auto } => {
            if let Some(cb) = callbacks.on_refresh {
                cb(auto);
            }
        }
        SessionEvent::Success => {
            if let Some(cb) = callbacks.on_success {
                cb();
            }
        }
        SessionEvent::Fail => {
            if let Some(cb) = callbacks.on_fail {
                cb();
            }
        }
    }
}

fn register_listeners(
    inner: &Rc<RefCell<Inner>>,
    mount: &MountPoint,
) -> Result<Vec<ListenerGuard>, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let mut guards = Vec::new();

    // drag starts on the knob or the piece itself
    let grab_targets: [&web_sys::EventTarget; 2] = [mount.handle.as_ref(), mount.block.as_ref()];
    for target in grab_targets {
        guards.push(ListenerGuard::add(
            target,
            "mousedown",
            drag_start_handler(inner),
        )?);
        guards.push(ListenerGuard::add(
            target,
            "touchstart",
            drag_start_handler(inner),
        )?);
        guards.push(ListenerGuard::add(target, "selectstart", |evt| {
            evt.prevent_default();
        })?);
    }

    // moves and releases are tracked document-wide so drags that leave the
    // widget keep working
    for event in ["mousemove", "touchmove"] {
        guards.push(ListenerGuard::add(
            document.as_ref(),
            event,
            drag_move_handler(inner),
        )?);
    }
    for event in ["mouseup", "touchend"] {
        guards.push(ListenerGuard::add(
            document.as_ref(),
            event,
            drag_end_handler(inner),
        )?);
    }

    Ok(guards)
}

fn drag_start_handler(inner: &Rc<RefCell<Inner>>) -> impl FnMut(Event) + 'static {
    let weak = Rc::downgrade(inner);
    move |evt| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if evt.dyn_ref::<TouchEvent>().is_some() {
            evt.prevent_default();
        }
        let Some(pointer) = pointer_position(&evt, false) else {
            return;
        };
        if inner.borrow_mut().session.drag_start(pointer) {
            log::debug!("drag started at x = {}", pointer.x);
        }
    }
}

fn drag_move_handler(inner: &Rc<RefCell<Inner>>) -> impl FnMut(Event) + 'static {
    let weak = Rc::downgrade(inner);
    move |evt| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        // document-wide listener: bail cheaply unless a drag is in progress
        if inner.borrow().session.phase() != SessionPhase::Dragging {
            return;
        }
        evt.prevent_default();
        let Some(pointer) = pointer_position(&evt, false) else {
            return;
        };
        let frame = inner.borrow_mut().session.drag_move(pointer);
        if let Some(frame) = frame {
            let g = inner.borrow();
            set_left(&g.handle, frame.move_x);
            set_left(&g.block, frame.block_left);
        }
    }
}

fn drag_end_handler(inner: &Rc<RefCell<Inner>>) -> impl FnMut(Event) + 'static {
    let weak = Rc::downgrade(inner);
    move |evt| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if inner.borrow().session.phase() != SessionPhase::Dragging {
            return;
        }
        let Some(pointer) = pointer_position(&evt, true) else {
            return;
        };
        let outcome = inner.borrow_mut().session.drag_end(pointer.x);
        match outcome {
            Some(SessionEvent::Success) => {
                log::info!("captcha solved");
                emit(&inner, SessionEvent::Success);
            }
            Some(SessionEvent::Fail) => {
                log::info!("captcha attempt failed");
                // armed before the callback runs, so a refresh from inside
                // on_fail leaves the timer pointing at a dead generation
                schedule_fail_reset(&inner);
                emit(&inner, SessionEvent::Fail);
            }
            _ => {}
        }
    }
}

/// Pointer position in viewport coordinates. Touch events use the first
/// touch point; once the finger lifted it only exists in `changedTouches`.
fn pointer_position(evt: &Event, ended: bool) -> Option<DVec2> {
    if let Some(touch_evt) = evt.dyn_ref::<TouchEvent>() {
        let touches = if ended {
            touch_evt.changed_touches()
        } else {
            touch_evt.touches()
        };
        let touch = touches.get(0)?;
        Some(DVec2::new(touch.client_x() as f64, touch.client_y() as f64))
    } else {
        let mouse_evt = evt.dyn_ref::<MouseEvent>()?;
        Some(DVec2::new(
            mouse_evt.client_x() as f64,
            mouse_evt.client_y() as f64,
        ))
    }
}

fn set_left(el: &HtmlElement, px: f64) {
    if let Err(err) = el.style().set_property("left", &format!("{px}px")) {
        log::warn!("failed to position slider: {err:?}");
    }
}
