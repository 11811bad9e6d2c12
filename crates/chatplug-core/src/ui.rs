//! Native-to-UI push side of the bridge
//!
//! The webview itself lives in the host crate; everything here talks to it
//! through [`UiSurface`]. The webview only accepts script text, so all
//! values are JSON-escaped before being interpolated; structured calls are
//! only possible on the embedded-engine side.

use crate::message::FeedMessage;
use anyhow::Result;

/// One rendered UI surface that can execute script text.
pub trait UiSurface {
    fn evaluate_script(&self, script: &str) -> Result<()>;
}

/// Owns a UI surface and renders native events into script calls against the
/// ambient globals the UI bundle is expected to define. Absent globals and
/// script failures are swallowed and logged; nothing propagates to callers.
pub struct UiBridge {
    surface: Box<dyn UiSurface>,
}

impl UiBridge {
    pub fn new(surface: Box<dyn UiSurface>) -> Self {
        Self { surface }
    }

    /// Execute arbitrary script text in the UI context, fire and forget.
    pub fn push_script(&self, script: &str) {
        if let Err(err) = self.surface.evaluate_script(script) {
            tracing::warn!(error = %err, "ui script evaluation failed");
        }
    }

    /// Forward one chat message to the UI as
    /// `__receiveMessage__({sender, text, timestamp})`. The timestamp is
    /// stringified, matching what the UI bundle has always been handed.
    pub fn push_chat_message(&self, message: &FeedMessage) {
        let payload = serde_json::json!({
            "sender": message.nickname,
            "text": message.message,
            "timestamp": message.created_at.to_string(),
        });

        self.push_script(&format!("globalThis.__receiveMessage__({payload})"));
    }

    /// Parse a feed-shaped JSON message and forward it. Malformed payloads
    /// are dropped with a log line.
    pub fn receive_chat_message(&self, raw: &str) {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) if value.is_object() => {
                match serde_json::from_value::<FeedMessage>(value) {
                    Ok(message) => self.push_chat_message(&message),
                    Err(err) => {
                        tracing::warn!(error = %err, "chat message has unexpected shape");
                    }
                }
            }
            Ok(_) => tracing::warn!("chat message payload is not an object"),
            Err(err) => tracing::warn!(error = %err, "failed to parse chat message"),
        }
    }

    /// Forward an already-serialized outbound message to the UI's
    /// `__sendMessage__` global.
    pub fn forward_send(&self, payload: &str) {
        self.push_script(&format!(
            "globalThis.__sendMessage__({})",
            js_string(payload)
        ));
    }

    /// Re-execute embedded-context console arguments as a console call in
    /// the UI, so both contexts log into the same devtools.
    pub fn forward_console(&self, args: &[serde_json::Value]) {
        let array_json = serde_json::Value::Array(args.to_vec()).to_string();
        self.push_script(&format!(
            "(function() {{\n  console.log(...JSON.parse({}));\n  return true;\n}})();",
            js_string(&array_json)
        ));
    }
}

/// Render a string as a JSON (and therefore JavaScript) string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
