//! Route tree: arena of nodes addressed by `NodeId`, built once at startup.
//!
//! Parents own children through the `children` index lists; the `parent` index is a
//! plain back-reference used for path rendering and fallback lookup.

use std::fmt;

use http::Method;

use crate::handler::HandlerRef;
use crate::node::{Node, NodeId};
use crate::segment::split_route;
use crate::CoreError;

/// N-ary prefix tree over path segments. Node 0 is the root (`/`).
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// # Panics
    ///
    /// If `id` was not issued by this tree. The same holds for the path and
    /// fallback queries below that take a `NodeId`; use `get` to look up ids from
    /// elsewhere.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Child of `parent` with the given literal segment.
    pub fn literal_child(&self, parent: NodeId, segment: &str) -> Option<NodeId> {
        self.find_child(parent, segment, false)
    }

    /// The wildcard child of `parent`, if any. There is at most one.
    pub fn wildcard_child(&self, parent: NodeId) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&id| self.node(id).wildcard)
    }

    fn find_child(&self, parent: NodeId, segment: &str, wildcard: bool) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&id| {
                let child = self.node(id);
                child.wildcard == wildcard && child.segment == segment
            })
    }

    fn check(&self, id: NodeId) -> Result<(), CoreError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(CoreError::UnknownNode(id.0))
        }
    }

    /// Attach a detached node under `parent`.
    ///
    /// If `parent` already has a child with the same segment, the incoming endpoints
    /// and fallback are merged onto it, provided nothing collides; a placeholder is
    /// thereby upgraded in place. Returns the id of the node now holding `child`'s data.
    pub fn add_child(&mut self, parent: NodeId, child: Node) -> Result<NodeId, CoreError> {
        self.check(parent)?;
        if child.segment.is_empty() && !child.wildcard {
            return Err(CoreError::InvalidSegment(child.segment));
        }
        if let Some(existing) = self.find_child(parent, &child.segment, child.wildcard) {
            self.install(existing, child.endpoints, child.fallback)?;
            return Ok(existing);
        }
        if child.wildcard {
            if let Some(other) = self.wildcard_child(parent) {
                return Err(CoreError::ConflictingWildcard {
                    path: self.pattern(parent),
                    existing: self.node(other).segment.clone(),
                    attempted: child.segment,
                });
            }
        }
        let id = NodeId(self.nodes.len());
        let mut child = child;
        child.parent = Some(parent);
        child.children.clear();
        self.nodes.push(child);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Descend from `from` along `rel_path`, creating placeholders for missing
    /// segments, and install `handler` (and `fallback`) on the terminal node.
    /// `"/"` or `""` installs on `from` itself.
    pub fn add_relative(
        &mut self,
        from: NodeId,
        rel_path: &str,
        method: Method,
        handler: HandlerRef,
        fallback: Option<HandlerRef>,
    ) -> Result<NodeId, CoreError> {
        self.check(from)?;
        let mut current = from;
        for segment in split_route(rel_path)? {
            current = match self.find_child(current, &segment.name, segment.wildcard) {
                Some(existing) => existing,
                None => self.add_child(current, Node::from_segment(segment))?,
            };
        }
        self.install(current, vec![(method, handler)], fallback)?;
        Ok(current)
    }

    /// Install a handler on an existing node.
    pub fn set_handler(
        &mut self,
        id: NodeId,
        method: Method,
        handler: HandlerRef,
    ) -> Result<(), CoreError> {
        self.check(id)?;
        self.install(id, vec![(method, handler)], None)
    }

    /// Install a not-found fallback on an existing node.
    pub fn set_fallback(&mut self, id: NodeId, fallback: HandlerRef) -> Result<(), CoreError> {
        self.check(id)?;
        self.install(id, Vec::new(), Some(fallback))
    }

    // All-or-nothing: collisions are checked before anything is written.
    fn install(
        &mut self,
        id: NodeId,
        endpoints: Vec<(Method, HandlerRef)>,
        fallback: Option<HandlerRef>,
    ) -> Result<(), CoreError> {
        let node = self.node(id);
        if let Some((method, _)) = endpoints.iter().find(|(m, _)| node.has_handler(m)) {
            return Err(CoreError::DuplicateRoute {
                path: self.pattern(id),
                endpoint: method.to_string(),
            });
        }
        if fallback.is_some() && node.fallback.is_some() {
            return Err(CoreError::DuplicateRoute {
                path: self.pattern(id),
                endpoint: "not-found fallback".to_string(),
            });
        }
        let node = &mut self.nodes[id.0];
        node.endpoints.extend(endpoints);
        if fallback.is_some() {
            node.fallback = fallback;
        }
        Ok(())
    }

    /// Nodes from the root down to `id` (inclusive). Panics on a foreign `id`.
    pub fn path_from_root(&self, id: NodeId, include_root: bool) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.parent.is_some() || include_root {
                path.push(node_id);
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Number of segments between the root and `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        self.path_from_root(id, false).len()
    }

    /// `/a/b/` style path; wildcards render as their bare capture name.
    pub fn full_path(&self, id: NodeId) -> String {
        self.render_path(id, false)
    }

    /// Like `full_path` but with wildcards braced: `/e/{z}/`.
    pub fn pattern(&self, id: NodeId) -> String {
        self.render_path(id, true)
    }

    fn render_path(&self, id: NodeId, braced: bool) -> String {
        let mut out = String::from("/");
        for node_id in self.path_from_root(id, false) {
            let node = self.node(node_id);
            if braced {
                out.push_str(&node.pattern_segment());
            } else {
                out.push_str(&node.segment);
            }
            out.push('/');
        }
        out
    }

    /// First node on the way from `id` up to the root (inclusive) that has a
    /// not-found fallback. Panics on a foreign `id`.
    pub fn nearest_fallback(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if node.fallback.is_some() {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, level: usize) -> fmt::Result {
        let node = self.node(id);
        if level == 0 {
            write!(f, "/")?;
        } else {
            let spacer = "|   ".repeat(level - 1);
            writeln!(f)?;
            writeln!(f, "{}|", spacer)?;
            write!(f, "{}└── {}/", spacer, node.pattern_segment())?;
        }
        let methods: Vec<&str> = node.methods().map(Method::as_str).collect();
        if !methods.is_empty() {
            write!(f, " [{}]", methods.join(", "))?;
        }
        if node.fallback.is_some() {
            write!(f, " [404 Handler]")?;
        }
        for &child in &node.children {
            self.fmt_node(f, child, level + 1)?;
        }
        Ok(())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.root(), 0)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::text;

    #[test]
    fn add_child_appends_and_links_parent() {
        let mut tree = Tree::new();
        let a = tree
            .add_child(tree.root(), Node::new("a").unwrap())
            .unwrap();
        let b = tree
            .add_child(a, Node::new("b").unwrap().with_handler(Method::GET, text("b")))
            .unwrap();
        assert_eq!(tree.node(b).parent(), Some(a));
        assert_eq!(tree.node(a).children(), &[b]);
        assert_eq!(tree.depth(b), 2);
        assert_eq!(tree.full_path(b), "/a/b/");
        assert_eq!(tree.full_path(tree.root()), "/");
    }

    #[test]
    fn placeholder_is_upgraded_in_place() {
        let mut tree = Tree::new();
        let placeholder = tree
            .add_child(tree.root(), Node::new("a").unwrap())
            .unwrap();
        let upgraded = tree
            .add_child(
                tree.root(),
                Node::new("a")
                    .unwrap()
                    .with_handler(Method::GET, text("a"))
                    .with_fallback(text("a 404")),
            )
            .unwrap();
        assert_eq!(placeholder, upgraded);
        assert!(tree.node(upgraded).has_handler(&Method::GET));
        assert!(tree.node(upgraded).fallback().is_some());
        assert_eq!(tree.node(tree.root()).children().len(), 1);
    }

    #[test]
    fn duplicate_endpoint_is_rejected() {
        let mut tree = Tree::new();
        tree.add_relative(tree.root(), "/a/b", Method::GET, text("1"), None)
            .unwrap();
        let err = tree
            .add_relative(tree.root(), "a/b/", Method::GET, text("2"), None)
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRoute { ref path, .. } if path == "/a/b/"));

        // Same segment, other method: shares the node.
        let post = tree
            .add_relative(tree.root(), "/a/b", Method::POST, text("3"), None)
            .unwrap();
        let methods: Vec<&Method> = tree.node(post).methods().collect();
        assert_eq!(methods, vec![&Method::GET, &Method::POST]);
    }

    #[test]
    fn fallback_merges_onto_handler_bearing_node() {
        let mut tree = Tree::new();
        let a = tree
            .add_child(
                tree.root(),
                Node::new("a").unwrap().with_handler(Method::GET, text("a")),
            )
            .unwrap();
        let merged = tree
            .add_child(tree.root(), Node::new("a").unwrap().with_fallback(text("a 404")))
            .unwrap();
        assert_eq!(merged, a);
        assert!(tree.node(a).has_handler(&Method::GET));
        assert!(tree.node(a).fallback().is_some());
        assert_eq!(tree.node(tree.root()).children(), &[a]);

        // A second GET on the same segment is a collision, and nothing is written.
        let err = tree
            .add_child(
                tree.root(),
                Node::new("a")
                    .unwrap()
                    .with_handler(Method::GET, text("again"))
                    .with_handler(Method::POST, text("post")),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateRoute { ref endpoint, .. } if endpoint == "GET"));
        assert!(!tree.node(a).has_handler(&Method::POST));
    }

    #[test]
    #[should_panic]
    fn foreign_ids_panic_on_lookup() {
        let tree = Tree::new();
        assert!(tree.get(NodeId(7)).is_none());
        tree.full_path(NodeId(7));
    }

    #[test]
    fn second_fallback_is_rejected() {
        let mut tree = Tree::new();
        let a = tree
            .add_child(tree.root(), Node::new("a").unwrap().with_fallback(text("x")))
            .unwrap();
        assert!(matches!(
            tree.set_fallback(a, text("y")),
            Err(CoreError::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn wildcard_siblings_must_share_a_name() {
        let mut tree = Tree::new();
        tree.add_relative(tree.root(), "/e/{z}", Method::GET, text("z"), None)
            .unwrap();
        let same = tree
            .add_relative(tree.root(), "/e/{z}/f", Method::GET, text("f"), None)
            .unwrap();
        assert_eq!(tree.pattern(same), "/e/{z}/f/");
        let err = tree
            .add_relative(tree.root(), "/e/{y}", Method::POST, text("y"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConflictingWildcard { ref existing, ref attempted, .. }
                if existing == "z" && attempted == "y"
        ));
    }

    #[test]
    fn relative_insertion_from_inner_node() {
        let mut tree = Tree::new();
        let users = tree
            .add_relative(tree.root(), "/users", Method::GET, text("users"), None)
            .unwrap();
        let comments = tree
            .add_relative(users, "{id}/comments", Method::GET, text("c"), None)
            .unwrap();
        assert_eq!(tree.full_path(comments), "/users/id/comments/");
        assert_eq!(tree.pattern(comments), "/users/{id}/comments/");
        let root_get = tree
            .add_relative(tree.root(), "/", Method::GET, text("root"), None)
            .unwrap();
        assert_eq!(root_get, tree.root());
    }

    #[test]
    fn empty_segment_and_foreign_ids_are_rejected() {
        let mut tree = Tree::new();
        assert!(matches!(Node::new("/"), Err(CoreError::InvalidSegment(_))));
        assert!(matches!(
            tree.add_child(NodeId(42), Node::new("a").unwrap()),
            Err(CoreError::UnknownNode(42))
        ));
    }

    #[test]
    fn path_from_root_and_nearest_fallback() {
        let mut tree = Tree::new();
        let a = tree
            .add_child(
                tree.root(),
                Node::new("a")
                    .unwrap()
                    .with_handler(Method::GET, text("a"))
                    .with_fallback(text("a 404")),
            )
            .unwrap();
        let c = tree
            .add_relative(a, "b/c", Method::GET, text("c"), None)
            .unwrap();
        let b = tree.node(c).parent().unwrap();

        assert_eq!(tree.path_from_root(c, false), vec![a, b, c]);
        assert_eq!(tree.path_from_root(c, true), vec![tree.root(), a, b, c]);
        assert!(tree.path_from_root(tree.root(), false).is_empty());

        assert_eq!(tree.nearest_fallback(c), Some(a));
        assert_eq!(tree.nearest_fallback(a), Some(a));
        assert_eq!(tree.nearest_fallback(tree.root()), None);
    }

    #[test]
    fn renders_outline() {
        let mut tree = Tree::new();
        tree.set_handler(tree.root(), Method::GET, text("root"))
            .unwrap();
        let a = tree
            .add_child(tree.root(), Node::new("a").unwrap().with_fallback(text("404")))
            .unwrap();
        tree.add_relative(a, "{id}", Method::GET, text("id"), None)
            .unwrap();
        let expected = "/ [GET]\n|\n└── a/ [404 Handler]\n|   |\n|   └── {id}/ [GET]";
        assert_eq!(tree.to_string(), expected);
    }
}
