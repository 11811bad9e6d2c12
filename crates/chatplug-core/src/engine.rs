//! Embedded script engine host
//!
//! Owns one headless QuickJS context running the application logic that ships
//! with the plugin. The native entry points installed here never execute
//! anything themselves; they parse their arguments and push typed requests
//! onto the shared queue, which the shell drains and routes after every
//! evaluation turn. Script exceptions are contained at this boundary and
//! reduced to log events.

use crate::message::{ContextId, Envelope, HostRequest, RequestQueue};
use anyhow::{anyhow, Result};
use rquickjs::function::{Func, Rest};
use rquickjs::{CatchResultExt, Context, Ctx, Object, Runtime, Value};
use std::path::PathBuf;

/// The application script loaded from the asset root on initialization.
const ENTRY_SCRIPT: &str = "main.js";

/// Writes console operations in the embedded context to the native `__log__`
/// entry point, tagged with the originating level.
const CONSOLE_SHIM: &str = r#"
(function() {
  if (typeof globalThis.console === 'undefined') {
    globalThis.console = {
      log(...args) {
        __log__('[embedded:log]', ...args);
      },
      warn(...args) {
        __log__('[embedded:warn]', ...args);
      },
      error(...args) {
        __log__('[embedded:error]', ...args);
      }
    };
  }
})();
"#;

pub struct ScriptEngineHost {
    runtime: Runtime,
    context: Context,
    asset_dir: PathBuf,
    requests: RequestQueue,
}

impl ScriptEngineHost {
    /// Create the host with a bare context. Nothing is registered or loaded
    /// until [`initialize`](Self::initialize) runs.
    pub fn new(asset_dir: impl Into<PathBuf>, requests: RequestQueue) -> Result<Self> {
        let runtime = Runtime::new().map_err(|err| anyhow!("create script runtime: {err}"))?;
        let context =
            Context::full(&runtime).map_err(|err| anyhow!("create script context: {err}"))?;

        Ok(Self {
            runtime,
            context,
            asset_dir: asset_dir.into(),
            requests,
        })
    }

    /// Replace the context wholesale, register the native entry points,
    /// install the console shim, then load and run the entry script.
    ///
    /// Any global state from a previous context is discarded; the developer
    /// reload path depends on that. A missing entry script leaves the context
    /// live with no application logic loaded.
    pub fn initialize(&mut self) -> Result<()> {
        self.context =
            Context::full(&self.runtime).map_err(|err| anyhow!("create script context: {err}"))?;

        self.install_bindings()?;
        self.evaluate(CONSOLE_SHIM)?;
        self.load_entry_script();
        Ok(())
    }

    /// Run arbitrary script text in the current context, discarding the
    /// result. Exceptions are returned as errors, never raised back into the
    /// context.
    pub fn evaluate(&self, source: &str) -> Result<()> {
        self.context.with(|ctx| {
            ctx.eval::<(), _>(source)
                .catch(&ctx)
                .map_err(|err| anyhow!("script evaluation failed: {err}"))
        })
    }

    /// Invoke a well-known nullary global if the context defines it.
    /// Returns whether a handler was present.
    pub fn call_global(&self, name: &str) -> Result<bool> {
        self.context.with(|ctx| {
            let value: Value = ctx
                .globals()
                .get(name)
                .catch(&ctx)
                .map_err(|err| anyhow!("lookup {name}: {err}"))?;

            let Some(function) = value.as_function() else {
                return Ok(false);
            };

            function
                .call::<_, ()>(())
                .catch(&ctx)
                .map_err(|err| anyhow!("{name} handler failed: {err}"))?;
            Ok(true)
        })
    }

    /// Invoke a well-known global error handler with an error-like object
    /// carrying `name` and `message`. Returns whether a handler was present.
    pub fn call_error_global(
        &self,
        handler: &str,
        error_name: &str,
        error_message: &str,
    ) -> Result<bool> {
        self.context.with(|ctx| {
            let value: Value = ctx
                .globals()
                .get(handler)
                .catch(&ctx)
                .map_err(|err| anyhow!("lookup {handler}: {err}"))?;

            let Some(function) = value.as_function() else {
                return Ok(false);
            };

            let error = Object::new(ctx.clone())
                .catch(&ctx)
                .map_err(|err| anyhow!("create error object: {err}"))?;
            error
                .set("name", error_name)
                .catch(&ctx)
                .map_err(|err| anyhow!("set error name: {err}"))?;
            error
                .set("message", error_message)
                .catch(&ctx)
                .map_err(|err| anyhow!("set error message: {err}"))?;

            function
                .call::<_, ()>((error,))
                .catch(&ctx)
                .map_err(|err| anyhow!("{handler} handler failed: {err}"))?;
            Ok(true)
        })
    }

    fn install_bindings(&self) -> Result<()> {
        let result = self.context.with(|ctx| -> rquickjs::Result<()> {
            let globals = ctx.globals();

            // Generic message send into the router, tagged as engine-origin.
            globals.set(
                "__postNativeMessage__",
                Func::from(native_fn({
                    let queue = self.requests.clone();
                    move |ctx: Ctx<'_>, args: Rest<Value<'_>>| {
                        let Some(event) = args
                            .first()
                            .and_then(|v| v.as_string())
                            .and_then(|s| s.to_string().ok())
                        else {
                            tracing::warn!("ignoring native message without a string event name");
                            return;
                        };

                        let values = args
                            .iter()
                            .skip(1)
                            .map(|arg| js_value_to_json(&ctx, arg))
                            .collect();

                        queue.borrow_mut().push_back(HostRequest::Message(Envelope {
                            origin: ContextId::Engine,
                            event,
                            args: values,
                        }));
                    }
                })),
            )?;

            // Console traffic, serialized as JSON at the boundary.
            globals.set(
                "__log__",
                Func::from(native_fn({
                    let queue = self.requests.clone();
                    move |ctx: Ctx<'_>, args: Rest<Value<'_>>| {
                        let values = args.iter().map(|arg| js_value_to_json(&ctx, arg)).collect();
                        queue.borrow_mut().push_back(HostRequest::Log(values));
                    }
                })),
            )?;

            // Chat send, parsed as `{message, username}` at the boundary.
            globals.set(
                "__sendMessage__",
                Func::from({
                    let queue = self.requests.clone();
                    move |_ctx: Ctx<'_>, args: Rest<Value<'_>>| {
                        let Some(serialized) = args
                            .first()
                            .and_then(|v| v.as_string())
                            .and_then(|s| s.to_string().ok())
                        else {
                            tracing::warn!("ignoring chat send without a string payload");
                            return;
                        };

                        let payload = match serde_json::from_str::<serde_json::Value>(&serialized) {
                            Ok(value) if value.is_object() => value,
                            Ok(_) => {
                                tracing::warn!("chat send payload is not an object");
                                return;
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "failed to parse chat send payload");
                                return;
                            }
                        };

                        let nickname = payload
                            .get("username")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();
                        let message = payload
                            .get("message")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();

                        queue
                            .borrow_mut()
                            .push_back(HostRequest::ChatSend { nickname, message });
                    }
                }),
            )?;

            Ok(())
        });

        result.map_err(|err| anyhow!("register native entry points: {err}"))
    }

    fn load_entry_script(&self) {
        let path = self.asset_dir.join(ENTRY_SCRIPT);
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "entry script not loaded");
                return;
            }
        };

        if let Err(err) = self.evaluate(&source) {
            tracing::error!(path = %path.display(), error = %err, "entry script failed");
        }
    }
}

/// Pin a native-entry closure to a single script lifetime so that its `Ctx`
/// and argument `Value`s share `'js`. Without this, the two parameters are
/// inferred under independent higher-ranked lifetimes, which `js_value_to_json`
/// cannot reconcile.
fn native_fn<F>(f: F) -> F
where
    F: for<'js> Fn(Ctx<'js>, Rest<Value<'js>>),
{
    f
}

/// Serialize a script value through the context's JSON encoder. Anything
/// JSON cannot represent (undefined, functions) becomes null.
fn js_value_to_json<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> serde_json::Value {
    let text = match ctx.json_stringify(value.clone()) {
        Ok(Some(text)) => text.to_string().unwrap_or_default(),
        _ => return serde_json::Value::Null,
    };

    serde_json::from_str(&text).unwrap_or(serde_json::Value::Null)
}
