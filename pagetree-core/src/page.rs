//! Page handler: a page file composed into the base layout once, at build time.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::handler::{Handler, HandlerRef, Request, Response};
use crate::CoreError;

/// Placeholder in the base layout that receives the page body.
pub const CONTENT_MARKER: &str = "{{content}}";

/// Serves a pre-rendered HTML document.
#[derive(Clone, Debug)]
pub struct PageHandler {
    html: Arc<str>,
}

impl PageHandler {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: Arc::from(html.into()),
        }
    }

    /// Read `page` and compose it into `base` when a layout is given and exists.
    pub fn render(page: &Path, base: Option<&Path>) -> Result<Self, CoreError> {
        let body = std::fs::read_to_string(page)?;
        let layout = match base {
            Some(path) if path.is_file() => Some(std::fs::read_to_string(path)?),
            _ => None,
        };
        Ok(Self::new(compose(layout.as_deref(), &body)))
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_handler(self) -> HandlerRef {
        Arc::new(self)
    }
}

/// Replace the first content marker in `layout` with `page`. A layout without a
/// marker gets the page appended; no layout means the page as-is.
pub fn compose(layout: Option<&str>, page: &str) -> String {
    match layout {
        None => page.to_string(),
        Some(layout) => match layout.find(CONTENT_MARKER) {
            Some(at) => {
                let mut out = String::with_capacity(layout.len() + page.len());
                out.push_str(&layout[..at]);
                out.push_str(page);
                out.push_str(&layout[at + CONTENT_MARKER.len()..]);
                out
            }
            None => format!("{}{}", layout, page),
        },
    }
}

#[async_trait]
impl Handler for PageHandler {
    async fn call(&self, _req: Request) -> Result<Response, CoreError> {
        Ok(Response::html(self.html.as_bytes()))
    }
}
