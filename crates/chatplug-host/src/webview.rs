//! Webview construction and bridge wiring
//!
//! The UI surface is one wry webview. Bundled assets are served over a
//! custom protocol backed by the core resource server; in dev mode the view
//! is pointed straight at the dev server and the resource server is bypassed
//! entirely. Script-to-native traffic arrives through the IPC handler as a
//! JSON `[eventName, ...args]` array and is pushed onto the shell's request
//! queue untouched.

use anyhow::{anyhow, Result};
use chatplug_core::{resources, ContextId, Envelope, HostRequest, RequestQueue, UiSurface};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tao::window::Window;
use wry::http::{header::CONTENT_TYPE, Request, Response, StatusCode};
use wry::{WebView, WebViewBuilder};

/// Installed before any page script runs; defines the single native entry
/// point the UI context gets.
const BRIDGE_SHIM: &str = r#"
(function() {
  globalThis.__postNativeMessage__ = function(eventName, ...args) {
    window.ipc.postMessage(JSON.stringify([eventName, ...args]));
  };
})();
"#;

pub struct WebviewSurface {
    webview: WebView,
}

impl WebviewSurface {
    pub fn new(webview: WebView) -> Self {
        Self { webview }
    }
}

impl UiSurface for WebviewSurface {
    fn evaluate_script(&self, script: &str) -> Result<()> {
        self.webview
            .evaluate_script(script)
            .map_err(|err| anyhow!("webview evaluation failed: {err}"))
    }
}

pub fn build_webview(
    window: &Window,
    queue: RequestQueue,
    asset_root: &Path,
    dev_server_url: Option<&str>,
) -> Result<WebView> {
    let mut builder = WebViewBuilder::new()
        .with_initialization_script(BRIDGE_SHIM)
        .with_ipc_handler(move |message: Request<String>| {
            handle_ipc(&queue, message.body());
        });

    match dev_server_url {
        Some(url) => {
            tracing::info!(url, "loading ui from dev server");
            builder = builder.with_url(url);
        }
        None => {
            let asset_root: PathBuf = asset_root.to_path_buf();
            builder = builder
                .with_custom_protocol("chatplug".into(), move |_id, request| {
                    serve_asset(&asset_root, &request)
                })
                .with_url("chatplug://localhost/");
        }
    }

    builder
        .build(window)
        .map_err(|err| anyhow!("create webview: {err}"))
}

fn handle_ipc(queue: &RequestQueue, body: &str) {
    let values = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Array(values)) => values,
        Ok(_) => {
            tracing::warn!("ignoring non-array bridge message from ui");
            return;
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse bridge message from ui");
            return;
        }
    };

    let mut values = values.into_iter();
    let event = match values.next() {
        Some(serde_json::Value::String(event)) => event,
        _ => {
            tracing::warn!("ignoring bridge message without a string event name");
            return;
        }
    };

    queue.borrow_mut().push_back(HostRequest::Message(Envelope {
        origin: ContextId::Ui,
        event,
        args: values.collect(),
    }));
}

fn serve_asset(asset_root: &Path, request: &Request<Vec<u8>>) -> Response<Cow<'static, [u8]>> {
    let path = request.uri().path();

    match resources::resolve(asset_root, path) {
        Some(resource) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, resource.mime_type)
            .body(Cow::Owned(resource.bytes))
            .unwrap(),
        None => {
            tracing::debug!(path, "asset not found");
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .header(CONTENT_TYPE, "text/plain")
                .body(Cow::Borrowed(&b"not found"[..]))
                .unwrap()
        }
    }
}
