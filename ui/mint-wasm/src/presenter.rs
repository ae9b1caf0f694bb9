//! Renders [`PageView`] into the bound elements; prompts use `window.alert`.

use crate::dom::{self, Elements};
use mint_session::{PageView, Presenter};
use tracing::warn;

pub struct DomPresenter {
    els: Elements,
}

impl DomPresenter {
    pub fn new(els: Elements) -> Self {
        Self { els }
    }
}

impl Presenter for DomPresenter {
    fn render(&self, view: &PageView) {
        let els = &self.els;
        dom::set_visible(&els.connect_btn, view.show_connect);
        dom::set_visible(&els.mint_btn, !view.show_connect);
        els.mint_btn.set_disabled(!view.mint_enabled);
        dom::set_visible(&els.loader, view.show_loader);
        dom::set_text(&els.minted_count, &view.minted_text);
        els.twitter_link.set_href(&view.twitter_url);
        dom::set_text(&els.twitter_link, &view.twitter_text);
    }

    fn notify(&self, message: &str) {
        if let Err(err) = gloo_utils::window().alert_with_message(message) {
            warn!("alert failed: {err:?}");
        }
    }
}
