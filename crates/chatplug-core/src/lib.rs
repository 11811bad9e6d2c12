pub mod config;
pub mod dispatch;
pub mod engine;
pub mod feed;
pub mod message;
pub mod resources;
pub mod router;
pub mod shell;
pub mod sync;
pub mod ui;

// Re-export main types for convenience
pub use config::Config;
pub use engine::ScriptEngineHost;
pub use feed::FeedClient;
pub use message::{new_request_queue, ContextId, Envelope, FeedMessage, HostRequest, RequestQueue};
pub use resources::Resource;
pub use shell::PluginShell;
pub use sync::ChatSyncPoller;
pub use ui::{UiBridge, UiSurface};
