//! Slide Captcha entry point
//!
//! Mounts the demo widget in the browser; the native build drives a scripted
//! drag through the pure session core.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_demo {
    use std::cell::RefCell;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement};

    use slide_captcha::WidgetConfig;
    use slide_captcha::provider::PicsumProvider;
    use slide_captcha::widget::{HostCallbacks, ListenerGuard, MountPoint, SliderCaptcha};

    struct Mounted {
        widget: SliderCaptcha,
        _refresh: ListenerGuard,
    }

    thread_local! {
        static ACTIVE: RefCell<Option<Mounted>> = const { RefCell::new(None) };
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Slide Captcha starting...");

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = element(&document, "captcha-canvas")?;
        let block: HtmlCanvasElement = element(&document, "captcha-block")?;
        let handle: HtmlElement = element(&document, "captcha-handle")?;

        let config = page_config(&document);
        let seed = js_sys::Date::now() as u64;

        let callbacks = HostCallbacks::new()
            .on_refresh(|auto| set_status(if auto { "slide to fit the piece" } else { "refreshed" }))
            .on_success(|| set_status("verified"))
            .on_fail(|| set_status("try again"));

        let widget = SliderCaptcha::mount(
            MountPoint {
                canvas,
                block,
                handle,
            },
            config,
            Box::new(PicsumProvider::new(seed)),
            callbacks,
        )?;

        let refresh_btn: HtmlElement = element(&document, "captcha-refresh")?;
        let refresh = ListenerGuard::add(refresh_btn.as_ref(), "click", |_evt| {
            ACTIVE.with(|active| {
                if let Some(mounted) = active.borrow().as_ref() {
                    mounted.widget.refresh();
                }
            });
        })?;

        ACTIVE.with(|active| {
            *active.borrow_mut() = Some(Mounted {
                widget,
                _refresh: refresh,
            });
        });

        log::info!("Slide Captcha running!");
        Ok(())
    }

    fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
            .dyn_into::<T>()
            .map_err(|_| JsValue::from_str(&format!("#{id} has an unexpected element type")))
    }

    /// Optional page-level config override from `<body data-captcha-config>`
    fn page_config(document: &Document) -> WidgetConfig {
        let Some(json) = document
            .body()
            .and_then(|body| body.get_attribute("data-captcha-config"))
        else {
            return WidgetConfig::default();
        };
        match serde_json::from_str(&json) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("ignoring malformed data-captcha-config: {err}");
                WidgetConfig::default()
            }
        }
    }

    fn set_status(text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("captcha-status"))
        {
            el.set_text_content(Some(text));
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(err) = wasm_demo::run() {
        log::error!("Slide Captcha failed to start: {err:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Slide Captcha (native) starting...");

    println!("\nRunning a scripted session against the core...");
    demo_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn demo_session() {
    use glam::DVec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use slide_captcha::session::{SessionState, place_notch};
    use slide_captcha::{WidgetConfig, travel_scale};

    let config = WidgetConfig::default();
    config.validate().expect("default config is valid");

    let mut session = SessionState::new(&config);
    let mut rng = Pcg32::seed_from_u64(0xCAFE);

    session.begin_reset(true);
    let generation = session.generation();
    let notch = place_notch(
        &mut rng,
        config.width as f64,
        config.height as f64,
        &config.geometry(),
    );
    assert!(session.puzzle_ready(generation, notch));
    println!("notch at ({}, {})", notch.x, notch.y);

    // scripted human-ish drag onto the notch
    session.drag_start(DVec2::ZERO);
    let target = notch.x / travel_scale(config.width as f64);
    for step in 1..=25 {
        let t = step as f64 / 25.0;
        let jitter = (step as f64 * 0.7).sin();
        session.drag_move(DVec2::new(target * t, jitter));
    }
    match session.drag_end(target) {
        Some(event) => println!("✓ verdict: {event:?}"),
        None => println!("gesture ignored"),
    }
}
