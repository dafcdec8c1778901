//! Static file directories served under a URL prefix after a route tree miss.

use std::path::{Path, PathBuf};

use crate::handler::Response;
use crate::segment::percent_decode;

/// `GET /<prefix>/<rest>` → `<root>/<rest>`.
#[derive(Clone, Debug)]
pub struct StaticFiles {
    prefix: String,
    root: PathBuf,
}

impl StaticFiles {
    /// `prefix` is normalized to `/name` (no trailing slash).
    pub fn new(prefix: &str, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: format!("/{}", prefix.trim_matches('/')),
            root: root.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a request path under this prefix. Segments are
    /// percent-decoded first. `None` for other prefixes, the bare prefix, and any
    /// path with `..`, `.`, empty segments or a decoded separator.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let rest = request_path.strip_prefix(&self.prefix)?;
        let rest = rest.strip_prefix('/')?;
        if rest.is_empty() {
            return None;
        }
        let mut file = self.root.clone();
        for raw in rest.split('/') {
            let part = percent_decode(raw);
            if part.is_empty()
                || part == "."
                || part == ".."
                || part.contains('/')
                || part.contains('\\')
                || part.contains('\0')
            {
                return None;
            }
            file.push(part);
        }
        Some(file)
    }

    /// Read the file behind `request_path`. Missing files yield `None` so the
    /// caller can fall through to not-found handling.
    pub async fn serve(&self, request_path: &str) -> Option<Response> {
        let file = self.resolve(request_path)?;
        match tokio::fs::read(&file).await {
            Ok(body) => {
                tracing::debug!(path = %file.display(), "static file");
                Some(Response::new(200, body, Some(content_type(&file))))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "static file unreadable");
                None
            }
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
