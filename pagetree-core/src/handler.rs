//! Request handler capability plus the request/response types it works on.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;

use crate::CoreError;

/// Anything that turns a request into a response. Page renderers, not-found
/// pages and API endpoints all implement this.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, req: Request) -> Result<Response, CoreError>;
}

/// Shared handler reference stored in the tree.
pub type HandlerRef = Arc<dyn Handler>;

/// Adapter for async closures; see `handler_fn`.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, CoreError>> + Send,
{
    async fn call(&self, req: Request) -> Result<Response, CoreError> {
        (self.0)(req).await
    }
}

/// Wrap an async closure as a handler:
/// `handler_fn(|req| async move { Ok(Response::text("hi")) })`.
pub fn handler_fn<F, Fut>(f: F) -> HandlerRef
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, CoreError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Capture name → captured segment, filled in after a successful match.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathValues(HashMap<String, String>);

impl PathValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later bindings for the same name replace earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Incoming request as seen by handlers.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: Method,
    /// Path without the query string, as sent by the client.
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub path_values: PathValues,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value bound to `{name}` on the matched route.
    pub fn path_value(&self, name: &str) -> Option<&str> {
        self.path_values.get(name)
    }

    /// First header with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `key=value` pairs of the query string. Empty keys are skipped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .split('&')
            .filter_map(|pair| {
                let mut it = pair.splitn(2, '=');
                let key = it.next()?.trim();
                if key.is_empty() {
                    return None;
                }
                let value = it.next().unwrap_or("").trim();
                Some((key.to_string(), value.to_string()))
            })
            .collect()
    }
}

/// Response produced by a handler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Response {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            status_code,
            body: body.into(),
            content_type: content_type.map(String::from),
        }
    }

    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body, Some("text/html; charset=utf-8"))
    }

    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body, Some("text/plain; charset=utf-8"))
    }

    /// JSON body from a string; rejects text that is not valid JSON.
    pub fn json(body: &str) -> Result<Self, CoreError> {
        let _: serde_json::Value = serde_json::from_str(body)?;
        Ok(Self::new(200, body, Some("application/json")))
    }

    pub fn json_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(200, body, Some("application/json")))
    }

    pub fn bad_request(reason: impl std::fmt::Display) -> Self {
        tracing::warn!(%reason, "400 bad request");
        Self::new(400, format!("400 Error: {}", reason), Some("text/plain; charset=utf-8"))
    }

    pub fn not_found() -> Self {
        Self::new(404, "404 page not found\n", Some("text/plain; charset=utf-8"))
    }

    pub fn internal_error() -> Self {
        Self::new(500, "500 internal server error\n", Some("text/plain; charset=utf-8"))
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Map custom errors to `CoreError::HandlerFailed` inside handlers:
/// `.map_err(IntoCoreError::into_core_error)`.
pub trait IntoCoreError {
    fn into_core_error(self) -> CoreError;
}

impl<E: std::error::Error + Send + Sync + 'static> IntoCoreError for E {
    fn into_core_error(self) -> CoreError {
        CoreError::HandlerFailed(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn closure_handler_sees_path_values() {
        let h = handler_fn(|req: Request| async move {
            let id = req.path_value("id").unwrap_or("?").to_string();
            Ok(Response::text(id))
        });
        let mut req = Request::new(Method::GET, "/item/7");
        req.path_values.insert("id", "7");
        let resp = h.call(req).await.unwrap();
        assert_eq!(resp.body_text(), "7");
        assert_eq!(resp.status_code, 200);
    }

    #[test]
    fn json_response_validates_body() {
        assert!(Response::json(r#"{"ok":true}"#).is_ok());
        assert!(matches!(Response::json("{nope"), Err(CoreError::Json(_))));
    }

    #[test]
    fn query_pairs_and_headers() {
        let mut req = Request::new(Method::GET, "/items").with_header("Content-Type", "text/html");
        req.query = "a=1&b=&=x&c".to_string();
        assert_eq!(
            req.query_pairs(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), String::new()),
                ("c".to_string(), String::new()),
            ]
        );
        assert_eq!(req.header("content-type"), Some("text/html"));
    }

    #[test]
    fn io_errors_become_handler_failures() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into_core_error();
        assert!(matches!(err, CoreError::HandlerFailed(ref m) if m == "disk gone"));
    }
}
