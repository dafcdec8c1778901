//! Core: Application, Router, Module, file-backed responses.

pub mod app;
pub mod files;
pub mod module;

pub use app::{route_from_file, Application, EndpointFactory, Router, RouterHandle};
pub use files::{html_from_files, json_from_file};
pub use module::Module;
