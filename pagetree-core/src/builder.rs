//! Tree construction: filesystem page walk, then endpoints registered in code.
//!
//! Layout of a routes directory:
//!
//! ```text
//! routes/
//!     index.html        GET /
//!     404.html          fallback for everything under /
//!     _/                reserved: router-level 404.html and 500.html, never routed
//!     users/
//!         users.html    GET /users
//!         {id}/
//!             {id}.html GET /users/{id}
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use http::Method;

use crate::config::Settings;
use crate::handler::HandlerRef;
use crate::node::{Node, NodeId};
use crate::page::PageHandler;
use crate::tree::Tree;
use crate::CoreError;

const PAGE_EXTENSIONS: [&str; 2] = ["html", "tmpl"];
const ROOT_PAGE: &str = "index";
const NOT_FOUND_PAGE: &str = "404";
const INTERNAL_ERROR_PAGE: &str = "500";

/// A route registered in code: path pattern, method and handler.
#[derive(Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: Method,
    pub handler: HandlerRef,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, method: Method, handler: HandlerRef) -> Self {
        Self {
            path: path.into(),
            method,
            handler,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({} {})", self.method, self.path)
    }
}

/// Install endpoints from the root, in order. Stops at the first collision.
pub fn apply_endpoints(
    tree: &mut Tree,
    endpoints: impl IntoIterator<Item = Endpoint>,
) -> Result<(), CoreError> {
    for endpoint in endpoints {
        let id = tree.add_relative(
            tree.root(),
            &endpoint.path,
            endpoint.method.clone(),
            endpoint.handler,
            None,
        )?;
        tracing::info!(method = %endpoint.method, route = %tree.pattern(id), "endpoint");
    }
    Ok(())
}

/// Router-level pages from the reserved directory.
#[derive(Clone, Default)]
pub struct ReservedPages {
    pub not_found: Option<HandlerRef>,
    pub internal_error: Option<HandlerRef>,
}

impl ReservedPages {
    /// Load `404` and `500` pages from `dir`; absent files leave the slot empty.
    pub fn load(dir: &Path, base: Option<&Path>) -> Result<Self, CoreError> {
        let page = |stem: &str| -> Result<Option<HandlerRef>, CoreError> {
            match find_page(dir, stem)? {
                Some(file) => {
                    tracing::info!(file = %file.display(), "reserved page");
                    Ok(Some(PageHandler::render(&file, base)?.into_handler()))
                }
                None => {
                    tracing::debug!(dir = %dir.display(), page = stem, "no reserved page");
                    Ok(None)
                }
            }
        };
        Ok(Self {
            not_found: page(NOT_FOUND_PAGE)?,
            internal_error: page(INTERNAL_ERROR_PAGE)?,
        })
    }
}

impl fmt::Debug for ReservedPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservedPages")
            .field("not_found", &self.not_found.is_some())
            .field("internal_error", &self.internal_error.is_some())
            .finish()
    }
}

/// The single `<stem>.html` / `<stem>.tmpl` in `dir`, if any.
fn find_page(dir: &Path, stem: &str) -> Result<Option<PathBuf>, CoreError> {
    let mut found: Option<PathBuf> = None;
    for ext in PAGE_EXTENSIONS {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if !candidate.is_file() {
            continue;
        }
        if found.is_some() {
            return Err(CoreError::AmbiguousRootFile {
                dir: dir.display().to_string(),
                name: stem.to_string(),
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

/// Builds a `Tree` from a routes directory, one node per directory.
#[derive(Clone, Debug)]
pub struct FileTreeBuilder {
    routes_dir: PathBuf,
    base_template: Option<PathBuf>,
}

impl FileTreeBuilder {
    pub fn new(routes_dir: impl Into<PathBuf>) -> Self {
        Self {
            routes_dir: routes_dir.into(),
            base_template: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.routes_dir()).with_base_template(settings.base_template_path())
    }

    /// Layout every page is composed into. A missing file means pages are served bare.
    pub fn with_base_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_template = Some(path.into());
        self
    }

    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    pub fn base_template(&self) -> Option<&Path> {
        self.base_template.as_deref()
    }

    /// Walk the routes directory. A missing directory yields an empty tree.
    pub fn build(&self) -> Result<Tree, CoreError> {
        let mut tree = Tree::new();
        if !self.routes_dir.is_dir() {
            tracing::warn!(routes = %self.routes_dir.display(), "routes directory not found");
            return Ok(tree);
        }
        let root = tree.root();
        self.walk(&mut tree, root, &self.routes_dir, ROOT_PAGE)?;
        Ok(tree)
    }

    /// Router-level pages from `<routes>/<reserved>`.
    pub fn reserved_pages(&self, reserved_dir: &Path) -> Result<ReservedPages, CoreError> {
        ReservedPages::load(reserved_dir, self.base_template())
    }

    fn walk(&self, tree: &mut Tree, node: NodeId, dir: &Path, primary: &str) -> Result<(), CoreError> {
        // In a directory named `404` the page is only ever the fallback.
        let primary_page = if primary == NOT_FOUND_PAGE {
            None
        } else {
            find_page(dir, primary)?
        };
        if let Some(file) = primary_page {
            let page = PageHandler::render(&file, self.base_template())?;
            tree.set_handler(node, Method::GET, page.into_handler())?;
            tracing::info!(route = %tree.pattern(node), file = %file.display(), "page");
        }
        if let Some(file) = find_page(dir, NOT_FOUND_PAGE)? {
            let page = PageHandler::render(&file, self.base_template())?;
            tree.set_fallback(node, page.into_handler())?;
            tracing::info!(route = %tree.pattern(node), file = %file.display(), "not-found page");
        }

        let mut subdirs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                tracing::warn!(path = %path.display(), "skipping non UTF-8 entry");
                continue;
            };
            if name.starts_with('_') || name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                subdirs.push((name, path));
            }
        }
        subdirs.sort();

        for (name, path) in subdirs {
            let child = tree.add_child(node, Node::new(&name)?)?;
            self.walk(tree, child, &path, &name)?;
        }
        Ok(())
    }
}
