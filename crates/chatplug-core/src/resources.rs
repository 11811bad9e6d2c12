//! Resource serving for the bundled UI
//!
//! Maps webview request paths onto files under the asset root. Bypassed
//! entirely when the UI is pointed at a live development server.

use std::fs;
use std::path::{Component, Path};

/// File contents plus MIME type for one served asset. Computed on demand,
/// never cached.
#[derive(Debug, Clone)]
pub struct Resource {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Resolve a request path against the asset root.
///
/// `"/"` maps to `index.html`; every other path is joined onto the root.
/// Paths that try to step outside the asset root are treated as not found,
/// as are missing or unreadable files.
pub fn resolve(asset_root: &Path, request_path: &str) -> Option<Resource> {
    let relative = if request_path == "/" {
        "index.html"
    } else {
        request_path.trim_start_matches('/')
    };

    // Resolved paths stay inside the asset root
    let relative = Path::new(relative);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        tracing::warn!(path = %request_path, "rejecting asset path outside the asset root");
        return None;
    }

    let full_path = asset_root.join(relative);
    let bytes = fs::read(&full_path).ok()?;

    Some(Resource {
        bytes,
        mime_type: mime_for(&full_path),
    })
}

/// MIME type by file extension; anything unknown is served as a generic
/// octet stream.
pub fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        _ => "application/octet-stream",
    }
}
