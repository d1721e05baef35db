//! WASM utility functions

use crate::error::SyncError;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser
#[wasm_bindgen(js_name = initPanicHook)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Surface a sync error to JavaScript, flagging whether a resync is needed
pub(crate) fn to_js_error(err: SyncError) -> JsValue {
    let prefix = if err.requires_resync() { "resync required: " } else { "" };
    JsValue::from_str(&format!("{}{}", prefix, err))
}
