//! DOM element bindings.
//!
//! All fields are resolved once at startup. Element ids live in `index.html`.

use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlAnchorElement, HtmlButtonElement, HtmlElement};

pub fn by_id(id: &str) -> Option<Element> {
    gloo_utils::document().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn set_visible(el: &HtmlElement, visible: bool) {
    el.set_hidden(!visible);
}

/// All DOM element references used by the mint page.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    pub connect_btn: HtmlButtonElement,
    pub mint_btn: HtmlButtonElement,
    pub loader: HtmlElement,
    pub minted_count: Element,
    pub collection_btn: HtmlButtonElement,
    pub twitter_link: HtmlAnchorElement,
}

macro_rules! get_typed {
    ($ty:ty, $id:expr) => {
        by_id_typed::<$ty>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after the document has loaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            connect_btn: get_typed!(HtmlButtonElement, "connectWalletBtn"),
            mint_btn: get_typed!(HtmlButtonElement, "mintBtn"),
            loader: get_typed!(HtmlElement, "mintLoader"),
            minted_count: get_typed!(Element, "mintedCount"),
            collection_btn: get_typed!(HtmlButtonElement, "viewCollectionBtn"),
            twitter_link: get_typed!(HtmlAnchorElement, "twitterLink"),
        })
    }
}
