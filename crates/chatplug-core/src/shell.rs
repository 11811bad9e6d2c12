//! The native host the plugin wrapper talks to
//!
//! Owns the embedded script engine, the chat sync poller, and (while an
//! editor window exists) the UI bridge. The audio path is a straight
//! pass-through and the persisted state is a fixed empty tagged container;
//! the real work of this shell is pumping the bridge queue and scheduling
//! feed synchronization.

use crate::config::Config;
use crate::dispatch;
use crate::engine::ScriptEngineHost;
use crate::feed::FeedClient;
use crate::message::{new_request_queue, RequestQueue};
use crate::router::{self, RouteTargets};
use crate::sync::ChatSyncPoller;
use crate::ui::{UiBridge, UiSurface};
use anyhow::Result;
use std::path::PathBuf;

/// Tag wrapped around the (currently empty) persisted settings blob.
const STATE_TAG: &str = "chatplugSettings";

pub struct PluginShell {
    engine: ScriptEngineHost,
    poller: ChatSyncPoller,
    ui: Option<UiBridge>,
    requests: RequestQueue,
}

impl PluginShell {
    pub fn new(config: &Config, asset_dir: impl Into<PathBuf>) -> Result<Self> {
        let requests = new_request_queue();
        let engine = ScriptEngineHost::new(asset_dir, requests.clone())?;
        let feed = FeedClient::new(&config.feed_base_url)?;

        Ok(Self {
            engine,
            poller: ChatSyncPoller::new(feed),
            ui: None,
            requests,
        })
    }

    /// Bring up the embedded script engine. Failures are contained; the
    /// shell stays usable with no application logic loaded.
    pub fn initialize(&mut self) {
        if let Err(err) = self.engine.initialize() {
            tracing::error!(error = %err, "script engine initialization failed");
        }
        self.pump();
    }

    /// Clone of the queue the native entry points push into; the host crate
    /// wires the webview's IPC arrivals into this.
    pub fn request_queue(&self) -> RequestQueue {
        self.requests.clone()
    }

    /// The editor window came up; start pushing into its script context.
    pub fn attach_ui(&mut self, surface: Box<dyn UiSurface>) {
        self.ui = Some(UiBridge::new(surface));
    }

    /// The editor window went away. Anything pushed from now on is dropped.
    pub fn detach_ui(&mut self) {
        self.ui = None;
    }

    pub fn has_ui(&self) -> bool {
        self.ui.is_some()
    }

    /// Drain the bridge queue, routing each request in arrival order.
    /// Handlers may enqueue follow-up requests; those are routed in the same
    /// pass.
    pub fn pump(&mut self) {
        loop {
            let request = self.requests.borrow_mut().pop_front();
            let Some(request) = request else { break };

            let mut targets = RouteTargets {
                engine: &mut self.engine,
                ui: self.ui.as_ref(),
                poller: &mut self.poller,
            };
            router::route(&mut targets, request);
        }
    }

    /// One synchronization tick: pull new feed messages and forward them to
    /// the UI. The cursor advances whether or not a UI is attached.
    pub fn poll_feed(&mut self) {
        let delivered = self.poller.poll();
        router::deliver(self.ui.as_ref(), &delivered);
        self.pump();
    }

    /// Forward one feed-shaped JSON message to the UI's chat handler.
    pub fn handle_chat_message(&self, raw: &str) {
        match &self.ui {
            Some(ui) => ui.receive_chat_message(raw),
            None => tracing::debug!("dropping chat message, no ui attached"),
        }
    }

    /// Run script text in the embedded context.
    pub fn evaluate(&self, source: &str) -> Result<()> {
        self.engine.evaluate(source)
    }

    pub fn dispatch_state_change(&self) {
        dispatch::state_change(&self.engine, self.ui.as_ref());
    }

    pub fn dispatch_error(&self, name: &str, message: &str) {
        dispatch::error(&self.engine, self.ui.as_ref(), name, message);
    }

    /// Newest chat timestamp already delivered.
    pub fn sync_cursor(&self) -> i64 {
        self.poller.cursor()
    }

    /// Serialize plugin state. Nothing beyond the tagged container is
    /// persisted today.
    pub fn get_state(&self) -> Vec<u8> {
        let mut root = serde_json::Map::new();
        root.insert(
            STATE_TAG.to_string(),
            serde_json::Value::Object(serde_json::Map::new()),
        );
        serde_json::Value::Object(root).to_string().into_bytes()
    }

    /// Restore plugin state. Blobs without the expected tag are ignored.
    pub fn set_state(&mut self, data: &[u8]) {
        match serde_json::from_slice::<serde_json::Value>(data) {
            Ok(value) if value.get(STATE_TAG).is_some() => {
                // Nothing is stored in the container yet.
            }
            Ok(_) => tracing::warn!("ignoring state blob without settings tag"),
            Err(err) => tracing::warn!(error = %err, "failed to parse persisted state"),
        }
    }

    /// Audio pass-through. The shell hosts no signal processing.
    pub fn process_block(&mut self, _buffer: &mut [f32]) {}
}
