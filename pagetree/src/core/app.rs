//! Application: collects page settings, endpoints and static dirs, then builds an immutable Router.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use pagetree_core::{
    apply_endpoints, handler_fn, CoreError, Dispatcher, Endpoint, FileTreeBuilder, HandlerRef,
    ListenAddr, Method, Request, Response, Settings, StaticFiles, Tree,
};

use super::module::Module;

/// Endpoint factory run at build time; see `Application::register`.
pub type EndpointFactory = Box<dyn FnOnce(&RouterHandle<'_>) -> Result<Endpoint, CoreError> + Send>;

enum Registration {
    Endpoint(Endpoint),
    Factory(EndpointFactory),
}

/// View of the router under construction passed to endpoint factories.
pub struct RouterHandle<'a> {
    settings: &'a Settings,
    tree: &'a Tree,
}

impl<'a> RouterHandle<'a> {
    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Pages and endpoints installed so far.
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }
}

/// Collects everything a router is built from. Nothing touches the filesystem
/// until `build`.
pub struct Application {
    settings: Settings,
    registrations: Vec<Registration>,
    static_dirs: Vec<String>,
}

impl Application {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            registrations: Vec::new(),
            static_dirs: Vec::new(),
        }
    }

    /// Settings from `config` (or `pagetree.config.json`), defaults when unreadable.
    pub fn from_config(config: Option<&Path>) -> Self {
        Self::new(Settings::load(config))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register an endpoint on an explicit path; `{name}` segments capture.
    pub fn register_on_path<F, Fut>(&mut self, path: &str, method: Method, f: F) -> &mut Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, CoreError>> + Send + 'static,
    {
        self.register_handler(path, method, handler_fn(f))
    }

    /// Register an already built handler.
    pub fn register_handler(&mut self, path: &str, method: Method, handler: HandlerRef) -> &mut Self {
        self.registrations
            .push(Registration::Endpoint(Endpoint::new(path, method, handler)));
        self
    }

    /// Register an endpoint whose path is the caller's file stem with `_` read as
    /// `/`: a call in `users_{id}_comments.rs` registers `/users/{id}/comments`.
    #[track_caller]
    pub fn register_on_file<F, Fut>(&mut self, method: Method, f: F) -> Result<&mut Self, CoreError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, CoreError>> + Send + 'static,
    {
        let path = route_from_file(std::panic::Location::caller().file())?;
        Ok(self.register_on_path(&path, method, f))
    }

    /// Register a factory called during `build` with the router built so far.
    pub fn register<F>(&mut self, factory: F) -> &mut Self
    where
        F: FnOnce(&RouterHandle<'_>) -> Result<Endpoint, CoreError> + Send + 'static,
    {
        self.registrations
            .push(Registration::Factory(Box::new(factory)));
        self
    }

    /// Let a module add its endpoints.
    pub fn mount(&mut self, module: &mut dyn Module) -> Result<&mut Self, CoreError> {
        module.register_into(self)?;
        Ok(self)
    }

    /// Serve `<appRoot>/<dir>` under `/<dir>/`.
    pub fn add_static_files(&mut self, dir: &str) -> &mut Self {
        self.static_dirs.push(dir.trim_matches('/').to_string());
        self
    }

    /// Walk the routes directory, apply registrations in order and freeze the result.
    pub fn build(self) -> Result<Router, CoreError> {
        let builder = FileTreeBuilder::from_settings(&self.settings);
        let mut tree = builder.build()?;
        let reserved = builder.reserved_pages(&self.settings.reserved_dir())?;

        for registration in self.registrations {
            let endpoint = match registration {
                Registration::Endpoint(endpoint) => endpoint,
                Registration::Factory(factory) => factory(&RouterHandle {
                    settings: &self.settings,
                    tree: &tree,
                })?,
            };
            apply_endpoints(&mut tree, [endpoint])?;
        }

        tracing::info!(nodes = tree.node_count(), "route tree built");
        tracing::debug!("\n{}", tree);

        let mut dispatcher = Dispatcher::new(tree);
        if let Some(page) = reserved.not_found {
            dispatcher = dispatcher.with_not_found(page);
        }
        if let Some(page) = reserved.internal_error {
            dispatcher = dispatcher.with_internal_error(page);
        }
        for dir in &self.static_dirs {
            let root = self.settings.app_path(dir);
            tracing::info!(prefix = %dir, root = %root.display(), "static files");
            dispatcher = dispatcher.with_static_files(StaticFiles::new(dir, root));
        }
        Ok(Router {
            settings: self.settings,
            dispatcher: Arc::new(dispatcher),
        })
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("settings", &self.settings)
            .field("registrations", &self.registrations.len())
            .field("static_dirs", &self.static_dirs)
            .finish()
    }
}

/// `/users/{id}/comments` from `.../users_{id}_comments.rs`.
pub fn route_from_file(file: &str) -> Result<String, CoreError> {
    let name = Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CoreError::UnknownCaller(file.to_string()))?;
    let stem = name
        .strip_suffix(".rs")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::UnknownCaller(file.to_string()))?;
    Ok(format!("/{}", stem.replace('_', "/")))
}

/// A built, immutable router. Cheap to clone; clones share the tree.
#[derive(Clone, Debug)]
pub struct Router {
    settings: Settings,
    dispatcher: Arc<Dispatcher>,
}

impl Router {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tree(&self) -> &Tree {
        self.dispatcher.tree()
    }

    /// Dispatch one request without HTTP.
    pub async fn handle(&self, req: Request) -> Response {
        self.dispatcher.dispatch(req).await
    }

    /// Block on a new runtime and serve until ctrl-c.
    pub fn serve(&self, addr: &ListenAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        pagetree_core::http::run(Arc::clone(&self.dispatcher), addr)
    }

    /// Serve on the current runtime.
    pub async fn serve_async(
        &self,
        addr: &ListenAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        pagetree_core::http::serve(Arc::clone(&self.dispatcher), addr.to_addr_string()).await
    }
}
