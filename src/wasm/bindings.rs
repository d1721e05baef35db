//! JavaScript bindings for changesets and client sessions

use super::utils::to_js_error;
use crate::changeset::Changeset;
use crate::history::{Selection, SelectionDirection};
use crate::protocol::{decode_server_message, deserialize_changeset, encode_message, serialize_changeset};
use crate::sync::{ClientSession, SessionConfig};
use wasm_bindgen::prelude::*;

/// JavaScript-friendly wrapper for Changeset
#[wasm_bindgen]
pub struct WasmChangeset {
    inner: Changeset,
}

#[wasm_bindgen]
impl WasmChangeset {
    /// Parse a changeset from its JSON strip array
    #[wasm_bindgen(js_name = fromJSON)]
    pub fn from_json(json: &str) -> Result<WasmChangeset, JsValue> {
        deserialize_changeset(json)
            .map(|inner| WasmChangeset { inner })
            .map_err(to_js_error)
    }

    /// A document holding `text`
    #[wasm_bindgen(js_name = fromText)]
    pub fn from_text(text: &str) -> WasmChangeset {
        Self {
            inner: Changeset::from_text(text),
        }
    }

    /// Export as JSON strip array
    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serialize_changeset(&self.inner).map_err(to_js_error)
    }

    /// Apply `self`, then `next`
    #[wasm_bindgen(js_name = compose)]
    pub fn compose(&self, next: &WasmChangeset) -> Result<WasmChangeset, JsValue> {
        self.inner
            .compose(&next.inner)
            .map(|inner| WasmChangeset { inner })
            .map_err(to_js_error)
    }

    /// Rebase a concurrent changeset so it applies after `self`
    #[wasm_bindgen(js_name = follow)]
    pub fn follow(&self, other: &WasmChangeset) -> WasmChangeset {
        Self {
            inner: self.inner.follow(&other.inner),
        }
    }

    /// The changeset undoing `self` on `base`
    #[wasm_bindgen(js_name = inverse)]
    pub fn inverse(&self, base: &WasmChangeset) -> Result<WasmChangeset, JsValue> {
        self.inner
            .inverse(&base.inner)
            .map(|inner| WasmChangeset { inner })
            .map_err(to_js_error)
    }

    /// Apply to plain text
    #[wasm_bindgen(js_name = apply)]
    pub fn apply(&self, text: &str) -> Result<String, JsValue> {
        self.inner.apply(text).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = followIndex)]
    pub fn follow_index(&self, position: usize) -> usize {
        self.inner.follow_index(position)
    }

    #[wasm_bindgen(js_name = text)]
    pub fn text(&self) -> String {
        self.inner.text()
    }

    #[wasm_bindgen(js_name = length)]
    pub fn length(&self) -> usize {
        self.inner.length()
    }

    #[wasm_bindgen(js_name = requiredLength)]
    pub fn required_length(&self) -> usize {
        self.inner.required_length()
    }

    #[wasm_bindgen(js_name = isIdentity)]
    pub fn is_identity(&self) -> bool {
        self.inner.is_identity()
    }
}

/// JavaScript-friendly wrapper for ClientSession
#[wasm_bindgen]
pub struct WasmSession {
    inner: ClientSession,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session, optionally from a JSON `SessionConfig`
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmSession, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config JSON: {}", e)))?,
            None => SessionConfig::default(),
        };

        Ok(Self {
            inner: ClientSession::new(config),
        })
    }

    /// Replace `start..end` with `text`
    #[wasm_bindgen(js_name = edit)]
    pub fn edit(&mut self, start: usize, end: usize, text: &str) -> Result<(), JsValue> {
        self.inner.edit(start..end, text).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = insert)]
    pub fn insert(&mut self, text: &str) -> Result<(), JsValue> {
        self.inner.insert(text).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = deleteBackward)]
    pub fn delete_backward(&mut self, count: usize) -> Result<(), JsValue> {
        self.inner.delete_backward(count).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = undo)]
    pub fn undo(&mut self) -> Result<bool, JsValue> {
        self.inner.undo().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = redo)]
    pub fn redo(&mut self) -> Result<bool, JsValue> {
        self.inner.redo().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setSelection)]
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let direction = if end < start {
            SelectionDirection::Backward
        } else {
            SelectionDirection::Forward
        };
        self.inner
            .set_selection(Selection::new(start.min(end), start.max(end), direction));
    }

    /// Selection as JSON `{start, end, direction}`
    #[wasm_bindgen(js_name = selection)]
    pub fn selection(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.selection())
            .map_err(|e| JsValue::from_str(&format!("JSON serialization failed: {}", e)))
    }

    /// Handle a JSON server message
    #[wasm_bindgen(js_name = receive)]
    pub fn receive(&mut self, message_json: &str) -> Result<(), JsValue> {
        let message = decode_server_message(message_json).map_err(to_js_error)?;
        self.inner.receive(message).map_err(to_js_error)
    }

    /// The next JSON client message to send, if any
    #[wasm_bindgen(js_name = pollOutbound)]
    pub fn poll_outbound(&mut self) -> Result<Option<String>, JsValue> {
        match self.inner.poll_outbound().map_err(to_js_error)? {
            Some(message) => encode_message(&message).map(Some).map_err(to_js_error),
            None => Ok(None),
        }
    }

    #[wasm_bindgen(js_name = text)]
    pub fn text(&self) -> String {
        self.inner.text()
    }

    #[wasm_bindgen(js_name = revision)]
    pub fn revision(&self) -> u64 {
        self.inner.revision()
    }
}
