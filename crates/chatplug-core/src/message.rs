//! Shared message types for the native bridge
//!
//! Both script contexts (the embedded engine and the webview UI) talk to the
//! native layer through the same envelope shape; the native entry points
//! translate their arguments into typed requests before anything is routed.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Which script context a request originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextId {
    Engine,
    Ui,
}

impl ContextId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextId::Engine => "engine",
            ContextId::Ui => "ui",
        }
    }
}

/// A generic `(eventName, args)` message produced by `__postNativeMessage__`
/// in either script context. Never persisted.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: ContextId,
    pub event: String,
    pub args: Vec<serde_json::Value>,
}

/// A request pushed by a native entry point, waiting to be routed.
///
/// Log and chat-send calls are parsed at the native boundary so the router
/// only ever sees typed data.
#[derive(Debug, Clone)]
pub enum HostRequest {
    Message(Envelope),
    Log(Vec<serde_json::Value>),
    ChatSend { nickname: String, message: String },
}

/// Single-threaded queue shared between the native entry points and the
/// shell's pump loop.
pub type RequestQueue = Rc<RefCell<VecDeque<HostRequest>>>;

pub fn new_request_queue() -> RequestQueue {
    Rc::new(RefCell::new(VecDeque::new()))
}

/// A chat message in the shape the remote feed uses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMessage {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: i64,
}
