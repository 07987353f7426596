//! Tidy tree layout over the currently-visible subtree.
//!
//! Implements the O(n) algorithm from "Improving Walker's Algorithm to Run
//! in Linear Time" (Buchheim, Junger, Leipert, 2002). The layout decides the
//! positions; which nodes participate is decided entirely by the engine's
//! visibility slots — hidden descendants simply do not exist for a pass.
//!
//! Coordinates are left-to-right: x grows with generation depth, y spaces
//! siblings. The breadth axis is computed in abstract units by the two
//! walks, then scaled to pixels and normalized so the topmost node sits at
//! y = 0.

use crate::tree::{NodeId, TreeEngine};

/// Configuration for the tidy tree layout.
#[derive(Debug, Clone)]
pub struct TidyConfig {
    /// Minimum breadth-axis separation between adjacent siblings, in units.
    pub sibling_separation: f32,
    /// Minimum breadth-axis separation between adjacent subtrees, in units.
    pub subtree_separation: f32,
    /// Pixels per breadth unit.
    pub node_spacing: f32,
    /// Pixels per generation along the depth axis.
    pub level_spacing: f32,
}

impl Default for TidyConfig {
    fn default() -> Self {
        Self {
            sibling_separation: 1.0,
            subtree_separation: 2.0,
            node_spacing: 20.0,
            level_spacing: 220.0,
        }
    }
}

/// One positioned visible node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: NodeId,
    /// Depth-axis position (grows with generation).
    pub x: f32,
    /// Breadth-axis position.
    pub y: f32,
}

/// One visible parent→child link, keyed by the child id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePlacement {
    pub child: NodeId,
    pub parent: NodeId,
}

/// Result of one layout pass: exactly the visible set, in pre-order.
#[derive(Debug, Clone, Default)]
pub struct LayoutPass {
    pub placements: Vec<Placement>,
    pub edges: Vec<EdgePlacement>,
}

impl LayoutPass {
    /// Position of a node in this pass, if it was laid out.
    pub fn position_of(&self, id: NodeId) -> Option<(f32, f32)> {
        self.placements
            .iter()
            .find(|p| p.id == id)
            .map(|p| (p.x, p.y))
    }
}

/// Per-node scratch state for the Buchheim walks.
#[derive(Debug)]
struct WalkNode {
    id: NodeId,
    depth: u32,
    parent: Option<usize>,
    children: Vec<usize>,
    prelim: f32,
    modifier: f32,
    thread_left: Option<usize>,
    thread_right: Option<usize>,
    ancestor: usize,
    shift: f32,
    change: f32,
    /// Left-to-right index among siblings.
    number: usize,
}

/// The tidy tree layout engine.
pub struct TidyLayout {
    config: TidyConfig,
}

impl TidyLayout {
    /// Create a layout with the given configuration.
    pub fn new(config: TidyConfig) -> Self {
        Self { config }
    }

    /// Create a layout with default spacing.
    pub fn with_defaults() -> Self {
        Self::new(TidyConfig::default())
    }

    /// The current configuration.
    pub fn config(&self) -> &TidyConfig {
        &self.config
    }

    /// Replace the configuration (host spacing controls).
    pub fn set_config(&mut self, config: TidyConfig) {
        self.config = config;
    }

    /// Lay out the engine's currently-visible subtree.
    pub fn layout(&self, engine: &TreeEngine) -> LayoutPass {
        if engine.node_count() == 0 {
            return LayoutPass::default();
        }

        let mut walker = Walker {
            nodes: Vec::new(),
            sibling_separation: self.config.sibling_separation,
            subtree_separation: self.config.subtree_separation,
        };
        if walker.build(engine, engine.root(), None, 0).is_none() {
            return LayoutPass::default();
        }
        walker.first_walk(0);

        let mut breadth = vec![0.0f32; walker.nodes.len()];
        walker.second_walk(0, 0.0, &mut breadth);

        // Normalize so the topmost node sits at breadth 0
        let min_breadth = breadth.iter().copied().fold(f32::INFINITY, f32::min);

        let placements = walker
            .nodes
            .iter()
            .zip(breadth.iter())
            .map(|(node, &b)| Placement {
                id: node.id,
                x: node.depth as f32 * self.config.level_spacing,
                y: (b - min_breadth) * self.config.node_spacing,
            })
            .collect();

        let edges = walker
            .nodes
            .iter()
            .filter_map(|node| {
                node.parent.map(|parent_idx| EdgePlacement {
                    child: node.id,
                    parent: walker.nodes[parent_idx].id,
                })
            })
            .collect();

        LayoutPass { placements, edges }
    }
}

/// Scratch arena plus separation parameters for one pass.
struct Walker {
    nodes: Vec<WalkNode>,
    sibling_separation: f32,
    subtree_separation: f32,
}

impl Walker {
    /// Pre-order copy of the visible subtree into walk nodes. Ids that don't
    /// resolve (cannot happen for an engine-produced visible set) are
    /// skipped rather than panicking.
    fn build(
        &mut self,
        engine: &TreeEngine,
        id: NodeId,
        parent: Option<usize>,
        number: usize,
    ) -> Option<usize> {
        let node = engine.node(id)?;
        let idx = self.nodes.len();
        self.nodes.push(WalkNode {
            id,
            depth: node.depth,
            parent,
            children: Vec::new(),
            prelim: 0.0,
            modifier: 0.0,
            thread_left: None,
            thread_right: None,
            ancestor: idx,
            shift: 0.0,
            change: 0.0,
            number,
        });

        let visible: Vec<NodeId> = node.slot.visible().to_vec();
        let children: Vec<usize> = visible
            .iter()
            .enumerate()
            .filter_map(|(i, &child)| self.build(engine, child, Some(idx), i))
            .collect();
        self.nodes[idx].children = children;
        Some(idx)
    }

    /// Bottom-up walk assigning preliminary breadth coordinates by merging
    /// subtree contours.
    fn first_walk(&mut self, v: usize) {
        let children = self.nodes[v].children.clone();
        if children.is_empty() {
            self.nodes[v].prelim = 0.0;
            return;
        }

        for &child in &children {
            self.first_walk(child);
        }

        let mut default_ancestor = children[0];
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                let left_sibling = children[i - 1];
                let shift = self.separate(left_sibling, child);
                self.nodes[child].prelim += shift;
                self.nodes[child].modifier += shift;
                default_ancestor = self.apportion(child, left_sibling, default_ancestor);
            }
        }

        self.execute_shifts(v);

        // Center the parent over its first and last child
        let first = self.nodes[children[0]].prelim;
        let last = self.nodes[children[children.len() - 1]].prelim;
        self.nodes[v].prelim = (first + last) / 2.0;
    }

    /// Minimum shift needed so `right`'s subtree clears `left`'s subtree.
    fn separate(&self, left: usize, right: usize) -> f32 {
        let mut left_contour = left;
        let mut right_contour = right;
        let mut left_mod = 0.0f32;
        let mut right_mod = 0.0f32;
        let mut max_shift = 0.0f32;

        loop {
            let left_pos = self.nodes[left_contour].prelim + left_mod;
            let right_pos = self.nodes[right_contour].prelim + right_mod;

            let desired = if self.are_siblings(left_contour, right_contour) {
                self.sibling_separation
            } else {
                self.subtree_separation
            };

            let overlap = left_pos + desired - right_pos;
            if overlap > max_shift {
                max_shift = overlap;
            }

            match (self.next_right(left_contour), self.next_left(right_contour)) {
                (Some(nl), Some(nr)) => {
                    left_mod += self.nodes[left_contour].modifier;
                    right_mod += self.nodes[right_contour].modifier;
                    left_contour = nl;
                    right_contour = nr;
                }
                _ => break,
            }
        }

        max_shift
    }

    fn are_siblings(&self, a: usize, b: usize) -> bool {
        self.nodes[a].parent.is_some() && self.nodes[a].parent == self.nodes[b].parent
    }

    /// Next node on the right contour of a subtree.
    fn next_right(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .children
            .last()
            .copied()
            .or(self.nodes[v].thread_right)
    }

    /// Next node on the left contour of a subtree.
    fn next_left(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .children
            .first()
            .copied()
            .or(self.nodes[v].thread_left)
    }

    /// Resolve overlaps between `v`'s subtree and the subtrees to its left.
    /// This is the linear-time core of the algorithm: contours are walked
    /// via threads instead of full traversals.
    fn apportion(&mut self, v: usize, left_sibling: usize, mut default_ancestor: usize) -> usize {
        let mut inner_right = left_sibling;
        let mut outer_right = left_sibling;
        let mut inner_left = v;
        let mut outer_left = match self.nodes[v].parent {
            Some(parent) => self.nodes[parent].children.first().copied().unwrap_or(v),
            None => v,
        };

        let mut mod_inner_right = self.nodes[inner_right].modifier;
        let mut mod_outer_right = self.nodes[outer_right].modifier;
        let mut mod_inner_left = self.nodes[inner_left].modifier;
        let mut mod_outer_left = self.nodes[outer_left].modifier;

        loop {
            match (self.next_right(inner_right), self.next_left(inner_left)) {
                (Some(ir), Some(il)) => {
                    inner_right = ir;
                    inner_left = il;
                }
                _ => break,
            }
            if let Some(next) = self.next_left(outer_left) {
                outer_left = next;
            }
            if let Some(next) = self.next_right(outer_right) {
                outer_right = next;
            }

            self.nodes[outer_right].ancestor = v;

            let shift = (self.nodes[inner_right].prelim + mod_inner_right)
                - (self.nodes[inner_left].prelim + mod_inner_left)
                + self.subtree_separation;

            if shift > 0.0 {
                let ancestor = self.nodes[v].ancestor;
                let wl = if self.nodes[ancestor].depth <= self.nodes[v].depth {
                    ancestor
                } else {
                    default_ancestor
                };
                self.move_subtree(wl, v, shift);
                mod_inner_left += shift;
                mod_outer_left += shift;
            }

            mod_inner_right += self.nodes[inner_right].modifier;
            mod_inner_left += self.nodes[inner_left].modifier;
            mod_outer_left += self.nodes[outer_left].modifier;
            mod_outer_right += self.nodes[outer_right].modifier;
        }

        if self.next_right(inner_right).is_some() && self.next_right(outer_right).is_none() {
            self.nodes[outer_right].thread_right = self.next_right(inner_right);
            self.nodes[outer_right].modifier += mod_inner_right - mod_outer_right;
        }

        if self.next_left(inner_left).is_some() && self.next_left(outer_left).is_none() {
            self.nodes[outer_left].thread_left = self.next_left(inner_left);
            self.nodes[outer_left].modifier += mod_inner_left - mod_outer_left;
            default_ancestor = v;
        }

        default_ancestor
    }

    /// Shift `wr` and record the spacing change to distribute between it and
    /// `wl`.
    fn move_subtree(&mut self, wl: usize, wr: usize, shift: f32) {
        let subtrees = (self.nodes[wr].number as f32 - self.nodes[wl].number as f32).max(1.0);
        let per_subtree = shift / subtrees;

        self.nodes[wr].change -= per_subtree;
        self.nodes[wr].shift += shift;
        self.nodes[wl].change += per_subtree;
        self.nodes[wr].prelim += shift;
        self.nodes[wr].modifier += shift;
    }

    /// Apply accumulated shifts to space intermediate children evenly.
    fn execute_shifts(&mut self, v: usize) {
        let children = self.nodes[v].children.clone();
        let mut shift = 0.0f32;
        let mut change = 0.0f32;

        for &child in children.iter().rev() {
            self.nodes[child].prelim += shift;
            self.nodes[child].modifier += shift;
            change += self.nodes[child].change;
            shift += self.nodes[child].shift + change;
        }
    }

    /// Top-down walk applying accumulated modifiers.
    fn second_walk(&self, v: usize, modifier_sum: f32, breadth: &mut [f32]) {
        breadth[v] = self.nodes[v].prelim + modifier_sum;
        for &child in &self.nodes[v].children {
            self.second_walk(child, modifier_sum + self.nodes[v].modifier, breadth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::EXPAND_ALL_DEPTH;

    fn engine() -> TreeEngine {
        TreeEngine::from_json(
            r#"{
                "name": "Root",
                "children": [
                    {
                        "name": "Left",
                        "children": [
                            { "name": "LL", "children": [ { "name": "LLL" } ] },
                            { "name": "LR" }
                        ]
                    },
                    { "name": "Right", "children": [ { "name": "RL" } ] }
                ]
            }"#,
        )
        .unwrap()
    }

    fn config() -> TidyConfig {
        TidyConfig {
            sibling_separation: 1.0,
            subtree_separation: 2.0,
            node_spacing: 20.0,
            level_spacing: 100.0,
        }
    }

    #[test]
    fn test_lays_out_exactly_the_visible_set() {
        let mut engine = engine();
        let layout = TidyLayout::new(config());

        let pass = layout.layout(&engine);
        assert_eq!(pass.placements.len(), 7);
        assert_eq!(pass.edges.len(), 6);

        engine.collapse_to_depth(engine.root(), 1);
        let pass = layout.layout(&engine);
        let ids: Vec<NodeId> = pass.placements.iter().map(|p| p.id).collect();
        assert_eq!(ids, engine.visible_nodes());
        assert_eq!(pass.edges.len(), 2);
    }

    #[test]
    fn test_depth_axis_spacing() {
        let engine = engine();
        let pass = TidyLayout::new(config()).layout(&engine);

        for placement in &pass.placements {
            let depth = engine.node(placement.id).unwrap().depth;
            assert!(
                (placement.x - depth as f32 * 100.0).abs() < 0.01,
                "{} should sit at depth slot {}",
                placement.id,
                depth
            );
        }
    }

    #[test]
    fn test_parent_centered_over_children() {
        let engine = engine();
        let pass = TidyLayout::new(config()).layout(&engine);

        // Left (id 1) is centered over LL (id 2) and LR (id 4)
        let (_, left_y) = pass.position_of(NodeId(1)).unwrap();
        let (_, ll_y) = pass.position_of(NodeId(2)).unwrap();
        let (_, lr_y) = pass.position_of(NodeId(4)).unwrap();
        assert!((left_y - (ll_y + lr_y) / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_siblings_do_not_overlap() {
        let engine = engine();
        let cfg = config();
        let pass = TidyLayout::new(cfg.clone()).layout(&engine);

        // Any two nodes on the same depth level keep at least one sibling
        // unit of breadth between them
        let min_gap = cfg.sibling_separation * cfg.node_spacing;
        for a in &pass.placements {
            for b in &pass.placements {
                if a.id != b.id && (a.x - b.x).abs() < 0.01 {
                    assert!(
                        (a.y - b.y).abs() >= min_gap - 0.01,
                        "{} and {} overlap: {} vs {}",
                        a.id,
                        b.id,
                        a.y,
                        b.y
                    );
                }
            }
        }
    }

    #[test]
    fn test_breadth_normalized_to_zero() {
        let engine = engine();
        let pass = TidyLayout::new(config()).layout(&engine);
        let min_y = pass
            .placements
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min);
        assert!(min_y.abs() < 0.01);
    }

    #[test]
    fn test_single_visible_node() {
        let mut engine = engine();
        engine.collapse_subtree(engine.root());
        let pass = TidyLayout::with_defaults().layout(&engine);

        assert_eq!(pass.placements.len(), 1);
        assert_eq!(pass.placements[0].id, engine.root());
        assert_eq!(pass.placements[0].x, 0.0);
        assert_eq!(pass.placements[0].y, 0.0);
        assert!(pass.edges.is_empty());
    }

    #[test]
    fn test_edges_keyed_by_child() {
        let mut engine = engine();
        engine.collapse_to_depth(engine.root(), EXPAND_ALL_DEPTH);
        let pass = TidyLayout::with_defaults().layout(&engine);

        for edge in &pass.edges {
            let child = engine.node(edge.child).unwrap();
            assert_eq!(child.parent, Some(edge.parent));
        }
        // Every visible non-root node contributes exactly one edge
        assert_eq!(pass.edges.len(), pass.placements.len() - 1);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let engine = engine();
        let layout = TidyLayout::new(config());
        let a = layout.layout(&engine);
        let b = layout.layout(&engine);
        assert_eq!(a.placements, b.placements);
    }
}
