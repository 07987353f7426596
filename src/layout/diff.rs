//! Layout reconciliation: diff one pass against the previous one.
//!
//! The reconciler owns the `NodeId -> last rendered position` cache and
//! turns each layout pass into a render diff the host can animate:
//! - entering elements seed from the parent's cached position (else the
//!   triggering source's), so a newly revealed subtree grows out of the
//!   node that was clicked instead of popping in at its final spot
//! - updating elements carry their previous rendered position
//! - exiting keys are reported for removal
//!
//! At the end of every pass the cache is overwritten with the fresh
//! positions of every visible node, so the next pass seeds correctly no
//! matter which node triggers it. Entries for nodes that left the visible
//! set are retained; they are read again if the subtree reappears.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::tidy::LayoutPass;
use crate::tree::NodeId;

/// A cached 2-D position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One node's render instruction for this frame.
#[derive(Debug, Clone, Serialize)]
pub struct NodeFrame {
    pub id: NodeId,
    /// Final position for this frame.
    pub x: f32,
    pub y: f32,
    /// Animation start point. For updating nodes this is the previous
    /// rendered position; for entering nodes it is the seed point.
    pub origin_x: f32,
    pub origin_y: f32,
    /// True when the node was not visible in the previous frame.
    pub entering: bool,
}

/// One link's render instruction, keyed by the child node id.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeFrame {
    pub child: NodeId,
    pub parent: NodeId,
    /// Child endpoint.
    pub x: f32,
    pub y: f32,
    /// Parent endpoint.
    pub parent_x: f32,
    pub parent_y: f32,
    /// Degenerate start point for entering links.
    pub origin_x: f32,
    pub origin_y: f32,
    pub entering: bool,
}

/// The full diff for one frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderDiff {
    pub nodes: Vec<NodeFrame>,
    pub edges: Vec<EdgeFrame>,
    /// Nodes visible last frame but not this one.
    pub removed_nodes: Vec<NodeId>,
    /// Links (by child id) visible last frame but not this one.
    pub removed_edges: Vec<NodeId>,
}

/// Stateful two-pass reconciler.
pub struct Reconciler {
    /// Last rendered position per node. Never pruned while a tree is
    /// loaded: positions of collapsed-away nodes stay useful as future
    /// animation seeds.
    cache: HashMap<NodeId, Point>,
    /// Visible node set of the previous pass.
    shown_nodes: HashSet<NodeId>,
    /// Link set of the previous pass, keyed by child id.
    shown_edges: HashSet<NodeId>,
}

impl Reconciler {
    /// Create an empty reconciler (no previous frame).
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            shown_nodes: HashSet::new(),
            shown_edges: HashSet::new(),
        }
    }

    /// Last rendered position of a node, if it was ever rendered.
    pub fn cached_position(&self, id: NodeId) -> Option<Point> {
        self.cache.get(&id).copied()
    }

    /// Forget everything (new document loaded).
    pub fn clear(&mut self) {
        self.cache.clear();
        self.shown_nodes.clear();
        self.shown_edges.clear();
    }

    /// Diff a fresh layout pass against the previous frame.
    ///
    /// `source` is the node that triggered the re-layout (clicked node,
    /// primary search match, or the root for global actions); its cached
    /// position is the fallback seed for entering elements whose parent has
    /// never been rendered.
    pub fn reconcile(&mut self, source: NodeId, pass: &LayoutPass) -> RenderDiff {
        let fresh: HashMap<NodeId, Point> = pass
            .placements
            .iter()
            .map(|p| (p.id, Point { x: p.x, y: p.y }))
            .collect();
        let parent_of: HashMap<NodeId, NodeId> = pass
            .edges
            .iter()
            .map(|edge| (edge.child, edge.parent))
            .collect();

        // Seed of last resort: the source's cached position, or on a first
        // render its freshly computed one. Guarantees origins are never
        // undefined.
        let source_seed = self
            .cache
            .get(&source)
            .copied()
            .or_else(|| fresh.get(&source).copied())
            .unwrap_or(Point { x: 0.0, y: 0.0 });

        let nodes = pass
            .placements
            .iter()
            .map(|p| {
                let entering = !self.shown_nodes.contains(&p.id);
                let origin = if entering {
                    parent_of
                        .get(&p.id)
                        .and_then(|parent| self.cache.get(parent))
                        .copied()
                        .unwrap_or(source_seed)
                } else {
                    self.cache
                        .get(&p.id)
                        .copied()
                        .unwrap_or(Point { x: p.x, y: p.y })
                };
                NodeFrame {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                    origin_x: origin.x,
                    origin_y: origin.y,
                    entering,
                }
            })
            .collect();

        let edges = pass
            .edges
            .iter()
            .filter_map(|edge| {
                let child = fresh.get(&edge.child)?;
                let parent = fresh.get(&edge.parent)?;
                let entering = !self.shown_edges.contains(&edge.child);
                let origin = if entering {
                    self.cache
                        .get(&edge.parent)
                        .copied()
                        .unwrap_or(source_seed)
                } else {
                    self.cache.get(&edge.child).copied().unwrap_or(*child)
                };
                Some(EdgeFrame {
                    child: edge.child,
                    parent: edge.parent,
                    x: child.x,
                    y: child.y,
                    parent_x: parent.x,
                    parent_y: parent.y,
                    origin_x: origin.x,
                    origin_y: origin.y,
                    entering,
                })
            })
            .collect();

        let new_nodes: HashSet<NodeId> = fresh.keys().copied().collect();
        let new_edges: HashSet<NodeId> = parent_of.keys().copied().collect();

        let mut removed_nodes: Vec<NodeId> =
            self.shown_nodes.difference(&new_nodes).copied().collect();
        removed_nodes.sort();
        let mut removed_edges: Vec<NodeId> =
            self.shown_edges.difference(&new_edges).copied().collect();
        removed_edges.sort();

        // Overwrite the cache with this frame's positions
        for (id, point) in &fresh {
            self.cache.insert(*id, *point);
        }
        self.shown_nodes = new_nodes;
        self.shown_edges = new_edges;

        RenderDiff {
            nodes,
            edges,
            removed_nodes,
            removed_edges,
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tidy::TidyLayout;
    use crate::tree::TreeEngine;

    fn engine() -> TreeEngine {
        TreeEngine::from_json(
            r#"{
                "name": "Root",
                "children": [
                    { "name": "Left", "children": [ { "name": "LL" }, { "name": "LR" } ] },
                    { "name": "Right" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_first_pass_everything_enters_with_finite_origin() {
        let engine = engine();
        let layout = TidyLayout::with_defaults();
        let mut reconciler = Reconciler::new();

        let diff = reconciler.reconcile(engine.root(), &layout.layout(&engine));
        assert_eq!(diff.nodes.len(), 5);
        for frame in &diff.nodes {
            assert!(frame.entering);
            assert!(frame.origin_x.is_finite() && frame.origin_y.is_finite());
        }
        assert!(diff.removed_nodes.is_empty());
    }

    #[test]
    fn test_cache_matches_fresh_positions_after_pass() {
        let engine = engine();
        let layout = TidyLayout::with_defaults();
        let mut reconciler = Reconciler::new();

        let pass = layout.layout(&engine);
        reconciler.reconcile(engine.root(), &pass);

        for placement in &pass.placements {
            let cached = reconciler.cached_position(placement.id).unwrap();
            assert_eq!((cached.x, cached.y), (placement.x, placement.y));
        }
    }

    #[test]
    fn test_collapse_reports_removed_keys() {
        let mut engine = engine();
        let layout = TidyLayout::with_defaults();
        let mut reconciler = Reconciler::new();

        reconciler.reconcile(engine.root(), &layout.layout(&engine));

        let left = crate::tree::NodeId(1);
        engine.toggle(left);
        let diff = reconciler.reconcile(left, &layout.layout(&engine));

        // LL (2) and LR (3) left the visible set, as did their links
        assert_eq!(diff.removed_nodes, vec![NodeId(2), NodeId(3)]);
        assert_eq!(diff.removed_edges, vec![NodeId(2), NodeId(3)]);
        // Remaining nodes are updates, not entries
        assert!(diff.nodes.iter().all(|f| !f.entering));
    }

    #[test]
    fn test_reexpand_seeds_from_parent_cache() {
        let mut engine = engine();
        let layout = TidyLayout::with_defaults();
        let mut reconciler = Reconciler::new();

        reconciler.reconcile(engine.root(), &layout.layout(&engine));

        let left = crate::tree::NodeId(1);
        engine.toggle(left);
        reconciler.reconcile(left, &layout.layout(&engine));
        let left_cached = reconciler.cached_position(left).unwrap();

        engine.toggle(left);
        let diff = reconciler.reconcile(left, &layout.layout(&engine));

        let ll = diff.nodes.iter().find(|f| f.id == NodeId(2)).unwrap();
        assert!(ll.entering);
        // Enters from Left's last rendered position
        assert_eq!((ll.origin_x, ll.origin_y), (left_cached.x, left_cached.y));
    }

    #[test]
    fn test_updating_nodes_animate_from_previous_position() {
        let mut engine = engine();
        let layout = TidyLayout::with_defaults();
        let mut reconciler = Reconciler::new();

        reconciler.reconcile(engine.root(), &layout.layout(&engine));
        let right = crate::tree::NodeId(4);
        let right_before = reconciler.cached_position(right).unwrap();

        // Collapsing Left shifts Right's breadth position
        engine.toggle(NodeId(1));
        let diff = reconciler.reconcile(NodeId(1), &layout.layout(&engine));

        let frame = diff.nodes.iter().find(|f| f.id == right).unwrap();
        assert!(!frame.entering);
        assert_eq!(
            (frame.origin_x, frame.origin_y),
            (right_before.x, right_before.y)
        );
    }

    #[test]
    fn test_edge_frames_connect_fresh_endpoints() {
        let engine = engine();
        let layout = TidyLayout::with_defaults();
        let mut reconciler = Reconciler::new();

        let pass = layout.layout(&engine);
        let diff = reconciler.reconcile(engine.root(), &pass);

        for edge in &diff.edges {
            let child = pass.position_of(edge.child).unwrap();
            let parent = pass.position_of(edge.parent).unwrap();
            assert_eq!((edge.x, edge.y), child);
            assert_eq!((edge.parent_x, edge.parent_y), parent);
        }
    }

    #[test]
    fn test_clear_forgets_previous_frame() {
        let engine = engine();
        let layout = TidyLayout::with_defaults();
        let mut reconciler = Reconciler::new();

        reconciler.reconcile(engine.root(), &layout.layout(&engine));
        reconciler.clear();
        assert!(reconciler.cached_position(engine.root()).is_none());

        let diff = reconciler.reconcile(engine.root(), &layout.layout(&engine));
        assert!(diff.nodes.iter().all(|f| f.entering));
    }
}
