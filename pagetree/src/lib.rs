//! Pagetree facade: file-routed pages plus registered endpoints on pagetree-core.
//!
//! ```no_run
//! use pagetree::{Application, ListenAddr, Method, Response};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     pagetree::init_logging();
//!     let mut app = Application::from_config(None);
//!     app.register_on_path("/hello/{name}", Method::GET, |req| async move {
//!         let name = req.path_value("name").unwrap_or("world").to_string();
//!         Ok(Response::text(format!("hello {}", name)))
//!     });
//!     app.add_static_files("static");
//!     app.build()?.serve(&ListenAddr::from_env())
//! }
//! ```

pub mod core;
pub mod logging;

pub use crate::core::{
    html_from_files, json_from_file, route_from_file, Application, EndpointFactory, Module,
    Router, RouterHandle,
};
pub use logging::init_logging;
pub use pagetree_core::{
    handler_fn, CoreError, Endpoint, Handler, HandlerRef, IntoCoreError, ListenAddr, MatchLevel,
    Method, PathValues, Request, Response, Settings, Tree,
};
