//! Event-name dispatch for the native bridge
//!
//! The router is the only place that knows what event names mean. Both
//! script contexts feed it through the same queue; the origin tag decides
//! which names are honored. Unknown names are ignored without error; new
//! UI bundles may emit events an older host does not know yet.

use crate::dispatch;
use crate::engine::ScriptEngineHost;
use crate::message::{ContextId, Envelope, HostRequest};
use crate::sync::ChatSyncPoller;
use crate::ui::UiBridge;

pub(crate) struct RouteTargets<'a> {
    pub engine: &'a mut ScriptEngineHost,
    pub ui: Option<&'a UiBridge>,
    pub poller: &'a mut ChatSyncPoller,
}

pub(crate) fn route(targets: &mut RouteTargets<'_>, request: HostRequest) {
    match request {
        HostRequest::Message(envelope) => route_envelope(targets, envelope),
        HostRequest::Log(args) => forward_log(targets.ui, &args),
        HostRequest::ChatSend { nickname, message } => {
            let delivered = targets.poller.send(&nickname, &message);
            deliver(targets.ui, &delivered);
        }
    }
}

/// Forward a batch of freshly synced messages to the UI. With no UI surface
/// attached they are dropped; there is no queue.
pub(crate) fn deliver(ui: Option<&UiBridge>, messages: &[crate::message::FeedMessage]) {
    match ui {
        Some(ui) => {
            for message in messages {
                ui.push_chat_message(message);
            }
        }
        None if !messages.is_empty() => {
            tracing::debug!(count = messages.len(), "dropping chat messages, no ui attached");
        }
        None => {}
    }
}

fn route_envelope(targets: &mut RouteTargets<'_>, envelope: Envelope) {
    match (envelope.origin, envelope.event.as_str()) {
        // The UI finished its own startup; push a full hydration.
        (ContextId::Ui, "ready") => dispatch::state_change(targets.engine, targets.ui),

        // A feed-shaped message (already JSON-encoded) for the UI's chat
        // handler; either context may hand these in.
        (_, "receiveMessage") => {
            let Some(raw) = envelope.args.first().and_then(|v| v.as_str()) else {
                tracing::warn!("receiveMessage without a string payload");
                return;
            };
            match targets.ui {
                Some(ui) => ui.receive_chat_message(raw),
                None => tracing::debug!("dropping chat message, no ui attached"),
            }
        }

        // Development builds only: replace the embedded context wholesale
        // and re-hydrate both sides.
        (ContextId::Ui, "reload") if cfg!(debug_assertions) => {
            if let Err(err) = targets.engine.initialize() {
                tracing::error!(error = %err, "engine reload failed");
            }
            dispatch::state_change(targets.engine, targets.ui);
        }

        // The embedded context hands an outbound payload to the UI's send
        // handler.
        (ContextId::Engine, "sendMessage") => {
            let Some(payload) = envelope.args.first().and_then(|v| v.as_str()) else {
                tracing::warn!("sendMessage without a string payload");
                return;
            };
            match targets.ui {
                Some(ui) => ui.forward_send(payload),
                None => tracing::debug!("dropping send forward, no ui attached"),
            }
        }

        (origin, event) => {
            tracing::trace!(origin = origin.as_str(), event = %event, "ignoring unknown bridge event");
        }
    }
}

fn forward_log(ui: Option<&UiBridge>, args: &[serde_json::Value]) {
    match ui {
        Some(ui) => ui.forward_console(args),
        None => {
            let rendered = serde_json::Value::Array(args.to_vec()).to_string();
            tracing::info!(target: "chatplug::script", "{rendered}");
        }
    }
}
