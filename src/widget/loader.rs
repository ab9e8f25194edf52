//! Background image loading with retry
//!
//! A failed fetch re-derives the URL and retries up to the configured limit;
//! retries never surface to the host. The caller keeps the returned
//! [`PendingLoad`] alive until the load is superseded; dropping it detaches
//! both callbacks from the image element.

use std::cell::Cell;

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::HtmlImageElement;

/// An in-flight image request
pub struct PendingLoad {
    image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

/// Kick off an image load. `make_url` is invoked once for the initial
/// request and once per retry, so randomized providers re-roll each attempt.
pub fn start_load(
    mut make_url: impl FnMut() -> String + 'static,
    retry_limit: u32,
    mut on_load: impl FnMut(HtmlImageElement) + 'static,
) -> Result<PendingLoad, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some("anonymous"));

    let loaded = image.clone();
    let onload = Closure::<dyn FnMut()>::new(move || on_load(loaded.clone()));
    image.set_onload(Some(onload.as_ref().unchecked_ref()));

    let first_url = make_url();
    let attempts = Cell::new(0u32);
    let retrying = image.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        let tried = attempts.get();
        if tried >= retry_limit {
            log::error!("captcha image failed to load after {tried} retries");
            return;
        }
        attempts.set(tried + 1);
        log::warn!("captcha image failed to load, retrying ({}/{retry_limit})", tried + 1);
        retrying.set_src(&make_url());
    });
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    image.set_src(&first_url);
    Ok(PendingLoad {
        image,
        _onload: onload,
        _onerror: onerror,
    })
}
