//! Closest-match search over the route tree.
//!
//! The search always yields a node: the deepest one reached along any branch,
//! with the root as the floor. Captured wildcard values are returned with the
//! match and never written to the tree, so concurrent requests can share it.

use http::Method;

use crate::node::NodeId;
use crate::segment::split_target;
use crate::tree::Tree;

/// How completely a target path was consumed. Ordered: `NoMatch < PartialMatch < WildMatch < ExactMatch`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum MatchLevel {
    /// The tree diverged before consuming all target segments.
    NoMatch,
    /// A strict prefix of the target was consumed (fallback selection).
    PartialMatch,
    /// Every segment consumed; the path used at least one wildcard.
    WildMatch,
    /// Every segment consumed by literal equality.
    ExactMatch,
}

impl MatchLevel {
    /// `WildMatch` or `ExactMatch`.
    pub fn is_full(self) -> bool {
        self >= MatchLevel::WildMatch
    }
}

/// One wildcard binding on the winning path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Capture {
    pub node: NodeId,
    pub name: String,
    /// The raw (still percent-encoded) target segment.
    pub value: String,
}

/// Result of `Tree::find_closest`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteMatch {
    pub node: NodeId,
    pub level: MatchLevel,
    pub captures: Vec<Capture>,
}

/// Deepest node reached by one branch and how many segments it consumed.
#[derive(Clone, Copy)]
struct Reach {
    depth: usize,
    node: NodeId,
}

impl Tree {
    /// Find the node that best matches `target_path` for `method`.
    ///
    /// Literal children are tried before the wildcard sibling and the branch that
    /// consumes more segments wins. When two branches both consume the whole path,
    /// the one whose terminal serves `method` wins, then the literal one.
    pub fn find_closest(&self, target_path: &str, method: &Method) -> RouteMatch {
        let segments = split_target(target_path);
        let reach = self.search(self.root(), &segments, 0, method);
        let captures: Vec<Capture> = self
            .path_from_root(reach.node, false)
            .into_iter()
            .enumerate()
            .filter(|(_, id)| self.node(*id).is_wildcard())
            .map(|(depth, id)| Capture {
                node: id,
                name: self.node(id).segment().to_string(),
                value: segments[depth].to_string(),
            })
            .collect();
        let level = if reach.depth < segments.len() {
            MatchLevel::NoMatch
        } else if captures.is_empty() {
            MatchLevel::ExactMatch
        } else {
            MatchLevel::WildMatch
        };
        RouteMatch {
            node: reach.node,
            level,
            captures,
        }
    }

    fn search(&self, current: NodeId, segments: &[&str], index: usize, method: &Method) -> Reach {
        let mut best = Reach {
            depth: index,
            node: current,
        };
        let Some(segment) = segments.get(index) else {
            return best;
        };
        let candidates = self
            .literal_child(current, segment)
            .into_iter()
            .chain(self.wildcard_child(current));
        for candidate in candidates {
            let reach = self.search(candidate, segments, index + 1, method);
            let deeper = reach.depth > best.depth;
            let serves_instead = reach.depth == best.depth
                && reach.depth == segments.len()
                && !self.node(best.node).serves(method)
                && self.node(reach.node).serves(method);
            if deeper || serves_instead {
                best = reach;
            }
        }
        best
    }

    /// Classify how the path of `node` relates to `target_path`:
    /// `PartialMatch` when it is a strict prefix, `NoMatch` when it diverges.
    pub fn level_of(&self, node: NodeId, target_path: &str) -> MatchLevel {
        let segments = split_target(target_path);
        let path = self.path_from_root(node, false);
        if path.len() > segments.len() {
            return MatchLevel::NoMatch;
        }
        let mut wild = false;
        for (id, segment) in path.iter().zip(&segments) {
            let n = self.node(*id);
            if n.is_wildcard() {
                wild = true;
            } else if n.segment() != *segment {
                return MatchLevel::NoMatch;
            }
        }
        if path.len() < segments.len() {
            MatchLevel::PartialMatch
        } else if wild {
            MatchLevel::WildMatch
        } else {
            MatchLevel::ExactMatch
        }
    }
}
