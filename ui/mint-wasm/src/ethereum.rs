//! `window.ethereum` as an EIP-1193 transport.
//!
//! Requests go through `ethereum.request({ method, params })`; the returned
//! promise is awaited and its value converted to `serde_json::Value`.

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use mint_chain_client::{ProviderError, ProviderResult};
use mint_chain_rpc::Eip1193Transport;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[derive(Clone)]
pub struct InjectedEthereum {
    ethereum: Option<Object>,
}

impl InjectedEthereum {
    /// Look up the injected provider once, at startup.
    pub fn detect() -> Self {
        let ethereum = Reflect::get(&gloo_utils::window(), &JsValue::from_str("ethereum"))
            .ok()
            .filter(|value| value.is_object())
            .map(|value| value.unchecked_into::<Object>());
        Self { ethereum }
    }

    fn request_fn(ethereum: &Object) -> ProviderResult<Function> {
        Reflect::get(ethereum, &JsValue::from_str("request"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
            .ok_or_else(|| ProviderError::Transport("ethereum.request is not a function".into()))
    }
}

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    params: &'a Value,
}

/// Map a rejected request to the error taxonomy. Wallets reject with an
/// object carrying `code` and `message`.
fn rejection(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|value| value.as_f64());
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => ProviderError::from_rpc(code as i64, message),
        None => ProviderError::Transport(message),
    }
}

#[async_trait(?Send)]
impl Eip1193Transport for InjectedEthereum {
    fn is_available(&self) -> bool {
        self.ethereum.is_some()
    }

    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let ethereum = self.ethereum.as_ref().ok_or(ProviderError::MissingProvider)?;
        let request = Self::request_fn(ethereum)?;

        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let args = RequestArguments {
            method,
            params: &params,
        }
        .serialize(&serializer)
        .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let promise: Promise = request
            .call1(ethereum, &args)
            .map_err(rejection)?
            .dyn_into()
            .map_err(|_| ProviderError::Transport(format!("{method} did not return a promise")))?;
        let result = JsFuture::from(promise).await.map_err(rejection)?;

        if result.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result)
            .map_err(|err| ProviderError::Decode(format!("{method}: {err}")))
    }

    async fn pause(&self, interval: Duration) {
        gloo_timers::future::sleep(interval).await;
    }
}
