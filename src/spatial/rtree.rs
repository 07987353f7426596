//! R-tree hit testing using the rstar crate.
//!
//! Rebuilt in bulk from the placements of each layout pass; answers "which
//! node did the pointer land on" without a linear scan.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::layout::LayoutPass;
use crate::tree::NodeId;

/// One rendered node position in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlacedNode {
    id: NodeId,
    x: f32,
    y: f32,
}

impl RTreeObject for PlacedNode {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for PlacedNode {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Hit tester over the most recent layout pass.
pub struct HitTester {
    tree: RTree<PlacedNode>,
}

impl HitTester {
    /// Create an empty hit tester.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Rebuild from a layout pass. Bulk loading beats incremental inserts
    /// for a full refresh.
    pub fn rebuild(&mut self, pass: &LayoutPass) {
        let placed: Vec<_> = pass
            .placements
            .iter()
            .map(|p| PlacedNode {
                id: p.id,
                x: p.x,
                y: p.y,
            })
            .collect();
        self.tree = RTree::bulk_load(placed);
    }

    /// The nearest rendered node to a point, if any node is rendered.
    pub fn nearest(&self, x: f32, y: f32) -> Option<NodeId> {
        self.tree.nearest_neighbor(&[x, y]).map(|placed| placed.id)
    }

    /// The nearest rendered node within `max_distance` of a point.
    ///
    /// This is the click hit test: `max_distance` is the node's visual
    /// radius plus slop.
    pub fn node_at(&self, x: f32, y: f32, max_distance: f32) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|placed| placed.distance_2(&[x, y]) <= max_distance_sq)
            .map(|placed| placed.id)
    }

    /// Drop everything (document unloaded or replaced).
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Number of indexed placements.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{EdgePlacement, Placement};

    fn pass() -> LayoutPass {
        LayoutPass {
            placements: vec![
                Placement {
                    id: NodeId(0),
                    x: 0.0,
                    y: 0.0,
                },
                Placement {
                    id: NodeId(1),
                    x: 220.0,
                    y: 0.0,
                },
                Placement {
                    id: NodeId(2),
                    x: 220.0,
                    y: 40.0,
                },
            ],
            edges: vec![
                EdgePlacement {
                    child: NodeId(1),
                    parent: NodeId(0),
                },
                EdgePlacement {
                    child: NodeId(2),
                    parent: NodeId(0),
                },
            ],
        }
    }

    #[test]
    fn test_node_at_with_slop() {
        let mut hits = HitTester::new();
        hits.rebuild(&pass());

        assert_eq!(hits.node_at(218.0, 2.0, 10.0), Some(NodeId(1)));
        assert_eq!(hits.node_at(218.0, 36.0, 10.0), Some(NodeId(2)));
        // Too far from anything
        assert_eq!(hits.node_at(100.0, 100.0, 10.0), None);
    }

    #[test]
    fn test_nearest_unbounded() {
        let mut hits = HitTester::new();
        hits.rebuild(&pass());
        assert_eq!(hits.nearest(500.0, 500.0), Some(NodeId(2)));
    }

    #[test]
    fn test_rebuild_replaces_previous_index() {
        let mut hits = HitTester::new();
        hits.rebuild(&pass());
        assert_eq!(hits.len(), 3);

        let smaller = LayoutPass {
            placements: vec![Placement {
                id: NodeId(0),
                x: 0.0,
                y: 0.0,
            }],
            edges: Vec::new(),
        };
        hits.rebuild(&smaller);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.node_at(220.0, 0.0, 10.0), None);
    }

    #[test]
    fn test_clear() {
        let mut hits = HitTester::new();
        hits.rebuild(&pass());
        hits.clear();
        assert!(hits.is_empty());
        assert_eq!(hits.nearest(0.0, 0.0), None);
    }
}
