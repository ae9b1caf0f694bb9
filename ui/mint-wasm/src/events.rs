//! Event binding.
//!
//! Click handlers spawn the controller's async operations on the browser
//! event loop via `wasm_bindgen_futures::spawn_local`.

use crate::Controller;
use crate::dom::Elements;
use mint_session::Spawner;
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Runs controller background tasks (the mint event pump) with `spawn_local`.
pub struct BrowserSpawner;

impl Spawner for BrowserSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Helper: attach an async click handler that calls into the controller.
macro_rules! on_click_async {
    ($el:expr, $controller:expr, |$ctl:ident| $body:expr) => {{
        let controller = $controller.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let $ctl = controller.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $body.await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements, controller: &Rc<Controller>) -> Result<(), JsValue> {
    on_click_async!(els.connect_btn, controller, |ctl| ctl.connect());
    on_click_async!(els.mint_btn, controller, |ctl| ctl.mint());

    let collection_url = controller.config().collection_url.clone();
    let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
        if let Err(err) = gloo_utils::window().open_with_url_and_target(&collection_url, "_blank") {
            warn!("could not open collection page: {err:?}");
        }
    }) as Box<dyn FnMut(_)>);
    els.collection_btn
        .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
    cb.forget();

    Ok(())
}
