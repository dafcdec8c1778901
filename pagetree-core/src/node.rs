//! Route tree node: one path segment, its endpoints and its not-found fallback.

use std::fmt;

use http::Method;

use crate::handler::HandlerRef;
use crate::segment::Segment;
use crate::CoreError;

/// Index of a node inside its `Tree`. Only valid for the tree that returned it.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeId(pub(crate) usize);

/// One segment of a route. Detached nodes (built with `Node::new`) carry no parent
/// and no children; they are attached with `Tree::add_child`.
pub struct Node {
    pub(crate) segment: String,
    pub(crate) wildcard: bool,
    /// Handler per method. A `(segment, method)` pair is the unit of duplicate detection.
    pub(crate) endpoints: Vec<(Method, HandlerRef)>,
    pub(crate) fallback: Option<HandlerRef>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    /// Detached node for one raw segment (`"users"`, `"{id}"`).
    /// The empty segment is reserved for the root.
    pub fn new(raw_segment: &str) -> Result<Self, CoreError> {
        let segment = Segment::parse(raw_segment)?;
        if segment.is_root() {
            return Err(CoreError::InvalidSegment(raw_segment.to_string()));
        }
        Ok(Self::from_segment(segment))
    }

    pub(crate) fn from_segment(segment: Segment) -> Self {
        Self {
            segment: segment.name,
            wildcard: segment.wildcard,
            endpoints: Vec::new(),
            fallback: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub(crate) fn root() -> Self {
        Self::from_segment(Segment {
            name: String::new(),
            wildcard: false,
        })
    }

    /// Attach a handler for `method`. A later handler for the same method replaces
    /// the earlier one on a detached node; collisions inside a tree are rejected.
    pub fn with_handler(mut self, method: Method, handler: HandlerRef) -> Self {
        self.endpoints.retain(|(m, _)| *m != method);
        self.endpoints.push((method, handler));
        self
    }

    pub fn with_fallback(mut self, fallback: HandlerRef) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Segment text; the capture name for wildcards, empty for the root.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none() && self.segment.is_empty() && !self.wildcard
    }

    pub fn handler(&self, method: &Method) -> Option<&HandlerRef> {
        self.endpoints
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, h)| h)
    }

    pub fn has_handler(&self, method: &Method) -> bool {
        self.handler(method).is_some()
    }

    /// Handler answering a request for `method`: HEAD is answered by GET when the
    /// node has no HEAD handler of its own.
    pub fn serving(&self, method: &Method) -> Option<&HandlerRef> {
        match self.handler(method) {
            Some(handler) => Some(handler),
            None if *method == Method::HEAD => self.handler(&Method::GET),
            None => None,
        }
    }

    pub fn serves(&self, method: &Method) -> bool {
        self.serving(method).is_some()
    }

    /// Methods this node terminates, in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.endpoints.iter().map(|(m, _)| m)
    }

    pub fn fallback(&self) -> Option<&HandlerRef> {
        self.fallback.as_ref()
    }

    /// Structural placeholder: neither endpoints nor a fallback.
    pub fn is_placeholder(&self) -> bool {
        self.endpoints.is_empty() && self.fallback.is_none()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn pattern_segment(&self) -> String {
        if self.wildcard {
            format!("{{{}}}", self.segment)
        } else {
            self.segment.clone()
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("segment", &self.segment)
            .field("wildcard", &self.wildcard)
            .field("methods", &self.methods().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .field("children", &self.children)
            .field("parent", &self.parent)
            .finish()
    }
}
