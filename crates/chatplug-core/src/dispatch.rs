//! State-change and error broadcasts into both script contexts
//!
//! Both operations are best-effort and fire-and-forget: a context that never
//! defined the target handler is a no-op, and execution failures are logged
//! and swallowed. The embedded context is always dispatched first, then the
//! UI if one exists, with no interleaving of partial effects.
//!
//! The embedded side goes through the engine's structured call API with
//! typed arguments; only the webview side synthesizes script text, because
//! script text is the only way in.

use crate::engine::ScriptEngineHost;
use crate::ui::{js_string, UiBridge};

pub const RECEIVE_STATE_CHANGE: &str = "__receiveStateChange__";
pub const RECEIVE_ERROR: &str = "__receiveError__";

const UI_STATE_CHANGE_SCRIPT: &str = r#"
(function() {
  if (typeof globalThis.__receiveStateChange__ !== 'function')
    return false;

  globalThis.__receiveStateChange__();
  return true;
})();
"#;

/// Notify both contexts that host state changed, so they can re-hydrate.
pub fn state_change(engine: &ScriptEngineHost, ui: Option<&UiBridge>) {
    if let Err(err) = engine.call_global(RECEIVE_STATE_CHANGE) {
        tracing::warn!(error = %err, "state change dispatch failed in engine context");
    }

    if let Some(ui) = ui {
        ui.push_script(UI_STATE_CHANGE_SCRIPT);
    }
}

/// Deliver an error-like object with `name` and `message` to both contexts.
pub fn error(engine: &ScriptEngineHost, ui: Option<&UiBridge>, name: &str, message: &str) {
    if let Err(err) = engine.call_error_global(RECEIVE_ERROR, name, message) {
        tracing::warn!(error = %err, "error dispatch failed in engine context");
    }

    if let Some(ui) = ui {
        ui.push_script(&ui_error_script(name, message));
    }
}

fn ui_error_script(name: &str, message: &str) -> String {
    format!(
        r#"
(function() {{
  if (typeof globalThis.__receiveError__ !== 'function')
    return false;

  let e = new Error({message});
  e.name = {name};

  globalThis.__receiveError__(e);
  return true;
}})();
"#,
        message = js_string(message),
        name = js_string(name),
    )
}
