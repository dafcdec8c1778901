//! Request dispatch: closest match, then the node's handler, a static file, the
//! nearest enclosing not-found fallback, or the router-level not-found page.

use std::fmt;

use http::Method;

use crate::handler::{HandlerRef, Request, Response};
use crate::matcher::{MatchLevel, RouteMatch};
use crate::node::NodeId;
use crate::segment::percent_decode;
use crate::statics::StaticFiles;
use crate::tree::Tree;
use crate::CoreError;

/// What the dispatcher decided for a method and path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// Full match on a node serving the method.
    Matched(RouteMatch),
    /// No servable node; `fallback` is the nearest ancestor of the closest node
    /// with a not-found handler and `level` how its path relates to the target.
    Fallback {
        closest: RouteMatch,
        fallback: NodeId,
        level: MatchLevel,
    },
    /// No servable node and no fallback on the path.
    NotFound { closest: RouteMatch },
}

/// Owns the built tree plus router-level pages and static directories.
pub struct Dispatcher {
    tree: Tree,
    not_found: Option<HandlerRef>,
    internal_error: Option<HandlerRef>,
    statics: Vec<StaticFiles>,
}

impl Dispatcher {
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            not_found: None,
            internal_error: None,
            statics: Vec::new(),
        }
    }

    /// Page served when no fallback exists on the path.
    pub fn with_not_found(mut self, handler: HandlerRef) -> Self {
        self.not_found = Some(handler);
        self
    }

    /// Page served (with status 500) when a handler fails.
    pub fn with_internal_error(mut self, handler: HandlerRef) -> Self {
        self.internal_error = Some(handler);
        self
    }

    pub fn with_static_files(mut self, statics: StaticFiles) -> Self {
        self.statics.push(statics);
        self
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        let closest = self.tree.find_closest(path, method);
        if closest.level.is_full() && self.tree.node(closest.node).serves(method) {
            return Resolution::Matched(closest);
        }
        match self.tree.nearest_fallback(closest.node) {
            Some(fallback) => Resolution::Fallback {
                level: self.tree.level_of(fallback, path),
                closest,
                fallback,
            },
            None => Resolution::NotFound { closest },
        }
    }

    /// Serve one request. Never fails: `CoreError::NotFound` from a handler becomes
    /// a 404, any other handler error a 500.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let resolution = self.resolve(&req.method, &req.path);
        let (handler, not_found) = match resolution {
            Resolution::Matched(m) => {
                for capture in &m.captures {
                    req.path_values
                        .insert(capture.name.as_str(), percent_decode(&capture.value));
                }
                tracing::debug!(
                    method = %req.method,
                    path = %req.path,
                    route = %self.tree.pattern(m.node),
                    level = ?m.level,
                    "matched"
                );
                match self.tree.node(m.node).serving(&req.method) {
                    Some(h) => (h.clone(), false),
                    None => return Response::not_found(),
                }
            }
            Resolution::Fallback {
                closest,
                fallback,
                level,
            } => {
                if let Some(resp) = self.serve_static(&req).await {
                    return resp;
                }
                tracing::debug!(
                    method = %req.method,
                    path = %req.path,
                    closest = %self.tree.pattern(closest.node),
                    fallback = %self.tree.pattern(fallback),
                    level = ?level,
                    "not found, using fallback"
                );
                match self.tree.node(fallback).fallback() {
                    Some(h) => (h.clone(), true),
                    None => return Response::not_found(),
                }
            }
            Resolution::NotFound { closest } => {
                if let Some(resp) = self.serve_static(&req).await {
                    return resp;
                }
                tracing::debug!(
                    method = %req.method,
                    path = %req.path,
                    closest = %self.tree.pattern(closest.node),
                    "not found"
                );
                match &self.not_found {
                    Some(h) => (h.clone(), true),
                    None => return Response::not_found(),
                }
            }
        };
        let resp = self.invoke(&handler, req).await;
        if not_found && resp.status_code == 200 {
            resp.with_status(404)
        } else {
            resp
        }
    }

    async fn serve_static(&self, req: &Request) -> Option<Response> {
        if req.method != Method::GET && req.method != Method::HEAD {
            return None;
        }
        for statics in &self.statics {
            if let Some(resp) = statics.serve(&req.path).await {
                return Some(resp);
            }
        }
        None
    }

    async fn invoke(&self, handler: &HandlerRef, req: Request) -> Response {
        let method = req.method.clone();
        let path = req.path.clone();
        match handler.call(req).await {
            Ok(resp) => resp,
            Err(CoreError::NotFound(what)) => {
                tracing::debug!(%method, %path, %what, "handler reported not found");
                Response::not_found()
            }
            Err(e) => {
                tracing::error!(%method, %path, error = %e, "handler failed");
                self.internal_error_page(method, path).await
            }
        }
    }

    async fn internal_error_page(&self, method: Method, path: String) -> Response {
        let Some(page) = &self.internal_error else {
            return Response::internal_error();
        };
        match page.call(Request::new(method, path)).await {
            Ok(resp) => resp.with_status(500),
            Err(e) => {
                tracing::error!(error = %e, "internal error page failed");
                Response::internal_error()
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("nodes", &self.tree.node_count())
            .field("not_found", &self.not_found.is_some())
            .field("internal_error", &self.internal_error.is_some())
            .field("statics", &self.statics)
            .finish()
    }
}
