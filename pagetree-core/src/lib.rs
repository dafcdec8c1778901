//! Pagetree core: route tree, closest-match search, dispatch, filesystem builder, HTTP server.

pub mod builder;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod matcher;
pub mod node;
pub mod page;
pub mod segment;
pub mod statics;
pub mod tree;

pub use builder::{apply_endpoints, Endpoint, FileTreeBuilder, ReservedPages};
pub use config::{ListenAddr, Settings};
pub use dispatch::{Dispatcher, Resolution};
pub use handler::{
    handler_fn, FnHandler, Handler, HandlerRef, IntoCoreError, PathValues, Request, Response,
};
pub use matcher::{Capture, MatchLevel, RouteMatch};
pub use node::{Node, NodeId};
pub use page::PageHandler;
pub use statics::StaticFiles;
pub use tree::Tree;

pub use ::http::Method;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("duplicate route {path}: {endpoint} already registered")]
    DuplicateRoute { path: String, endpoint: String },
    #[error("conflicting wildcard under {path}: {{{existing}}} already present, got {{{attempted}}}")]
    ConflictingWildcard {
        path: String,
        existing: String,
        attempted: String,
    },
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),
    #[error("more than one primary page in {dir}: {name}")]
    AmbiguousRootFile { dir: String, name: String },
    #[error("cannot derive a route from caller file {0:?}")]
    UnknownCaller(String),
    #[error("node {0} does not belong to this tree")]
    UnknownNode(usize),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("handler failed: {0}")]
    HandlerFailed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::handler::{handler_fn, HandlerRef, Response};

    /// Handler answering with a fixed text body.
    pub(crate) fn text(body: &'static str) -> HandlerRef {
        handler_fn(move |_req| async move { Ok(Response::text(body)) })
    }
}
