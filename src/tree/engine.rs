//! TreeEngine - the tree interaction state machine.
//!
//! The engine owns the node arena built from one loaded document and is the
//! single place visibility slots are mutated. It provides:
//! - Collapse/expand operations (toggle, subtree, depth-limited)
//! - Full-tree search with the auto-expand/select protocol
//! - Selection state (selected node + current query)
//! - Branch derivation for color grouping
//!
//! All operations are idempotent and total: unknown ids and leaf toggles
//! are no-ops, never errors.

use serde::Serialize;

use super::build::{self, LoadError, RawPerson};
use super::node::{NodeId, PersonNode};

/// Sentinel depth meaning "fully expand" for [`TreeEngine::collapse_to_depth`].
///
/// The host's depth selector maps its "expand all" entry to this value.
pub const EXPAND_ALL_DEPTH: u32 = u32::MAX;

/// Selection state: at most one selected node plus the current query.
///
/// Lives beside the node arena, not inside it; it is never serialized with
/// the model and resets on background click or explicit clear.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    /// Currently selected node, if any.
    pub selected: Option<NodeId>,
    /// Current search query, normalized (trimmed, lower-cased). Empty means
    /// no query.
    pub query: String,
}

impl SelectionState {
    /// Reset to the empty state.
    pub fn clear(&mut self) {
        self.selected = None;
        self.query.clear();
    }
}

/// Result of one search pass.
///
/// All matches are flagged for highlighting; only the primary one (first in
/// pre-order) drives auto-expand and view centering.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Every matching node in pre-order.
    pub matches: Vec<NodeId>,
    /// The first pre-order match, now selected and made reachable.
    pub primary: Option<NodeId>,
}

impl SearchOutcome {
    fn empty() -> Self {
        Self {
            matches: Vec::new(),
            primary: None,
        }
    }
}

/// The tree interaction engine.
///
/// Node ids double as indices into the arena, and the arena is stored in
/// pre-order, so a linear scan is a pre-order traversal of the full tree.
pub struct TreeEngine {
    nodes: Vec<PersonNode>,
    selection: SelectionState,
}

impl TreeEngine {
    /// Load a JSON document. Fails atomically: on error no tree exists.
    pub fn from_json(document: &str) -> Result<Self, LoadError> {
        Ok(Self::from_nodes(build::build_from_json(document)?))
    }

    /// Build from an already-decoded raw document.
    pub fn from_raw(raw: &RawPerson) -> Result<Self, LoadError> {
        Ok(Self::from_nodes(build::build_from_raw(raw)?))
    }

    fn from_nodes(nodes: Vec<PersonNode>) -> Self {
        Self {
            nodes,
            selection: SelectionState::default(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The root node id (pre-order slot 0).
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes in the loaded tree.
    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&PersonNode> {
        self.nodes.get(id.0 as usize)
    }

    /// All nodes in pre-order, regardless of visibility.
    pub fn nodes(&self) -> &[PersonNode] {
        &self.nodes
    }

    /// The current selection state.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Select a node (detail panel click). Unknown ids clear the selection.
    pub fn select(&mut self, id: NodeId) {
        self.selection.selected = self.node(id).map(|n| n.id);
    }

    /// Clear selection and query (background click / clear control).
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Pre-order list of the currently-visible node ids.
    ///
    /// This is exactly the set the layout pass positions.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_visible(self.root(), &mut out);
        }
        out
    }

    fn collect_visible(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        if let Some(node) = self.node(id) {
            for &child in node.slot.visible() {
                self.collect_visible(child, out);
            }
        }
    }

    /// Whether a node is currently reachable through visible slots.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let Some(mut node) = self.node(id) else {
            return false;
        };
        while let Some(parent_id) = node.parent {
            let Some(parent) = self.node(parent_id) else {
                return false;
            };
            if !parent.slot.visible().contains(&node.id) {
                return false;
            }
            node = parent;
        }
        true
    }

    /// Branch name for color grouping: the depth-1 ancestor's raw name, or
    /// "ROOT" for the root itself.
    pub fn branch_of(&self, id: NodeId) -> &str {
        let Some(mut node) = self.node(id) else {
            return "ROOT";
        };
        if node.depth == 0 {
            return "ROOT";
        }
        while node.depth > 1 {
            match node.parent.and_then(|p| self.node(p)) {
                Some(parent) => node = parent,
                None => return "ROOT",
            }
        }
        &node.name
    }

    // =========================================================================
    // Collapse / Expand
    // =========================================================================

    /// Toggle one node: hide its immediate children if shown, restore them
    /// if hidden. Descendants keep their own collapse state. No-op on leaves
    /// and unknown ids. Returns whether anything changed.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(id.0 as usize) else {
            return false;
        };
        if node.slot.is_collapsed() {
            node.slot.show();
            true
        } else if node.slot.is_expanded() {
            node.slot.hide();
            true
        } else {
            false
        }
    }

    /// Collapse the whole subtree rooted at `id`: every descendant's visible
    /// children move to the hidden slot, depth-first, the node itself
    /// included. No-op on leaves.
    pub fn collapse_subtree(&mut self, id: NodeId) {
        let children = match self.node(id) {
            Some(node) => node.slot.any().to_vec(),
            None => return,
        };
        for child in children {
            self.collapse_subtree(child);
        }
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.slot.hide();
        }
    }

    /// Expand the whole subtree rooted at `id`: every node's hidden children
    /// return to the visible slot.
    pub fn expand_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.slot.show();
        } else {
            return;
        }
        let children = self
            .node(id)
            .map(|node| node.slot.any().to_vec())
            .unwrap_or_default();
        for child in children {
            self.expand_subtree(child);
        }
    }

    /// Depth-limited collapse: after this, every node with depth below
    /// `target_depth` is expanded and every node at or beyond it is
    /// collapsed. [`EXPAND_ALL_DEPTH`] expands everything.
    ///
    /// This is the steady-state view after any depth-driven UI action, and
    /// it is idempotent.
    pub fn collapse_to_depth(&mut self, id: NodeId, target_depth: u32) {
        if target_depth == EXPAND_ALL_DEPTH {
            self.expand_subtree(id);
            return;
        }
        let Some(node) = self.node(id) else {
            return;
        };
        if node.depth >= target_depth {
            self.collapse_subtree(id);
            return;
        }
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.slot.show();
        }
        let children = self
            .node(id)
            .map(|node| node.slot.any().to_vec())
            .unwrap_or_default();
        for child in children {
            self.collapse_to_depth(child, target_depth);
        }
    }

    /// Walk from `id` to the root restoring hidden children along the path,
    /// so the node becomes reachable. Sibling subtrees keep their collapse
    /// state.
    pub fn expand_ancestors_of(&mut self, id: NodeId) {
        let mut cursor = self.node(id).map(|n| n.id);
        while let Some(cur) = cursor {
            let node = &mut self.nodes[cur.0 as usize];
            node.slot.show();
            cursor = node.parent;
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// All nodes whose raw name or display label contains `query`
    /// (case-insensitive, trimmed), in pre-order, regardless of current
    /// visibility. Empty or whitespace-only queries match nothing.
    pub fn find_matches(&self, query: &str) -> Vec<NodeId> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|node| {
                node.name.to_lowercase().contains(&q) || node.label.to_lowercase().contains(&q)
            })
            .map(|node| node.id)
            .collect()
    }

    /// Run a search and apply the auto-navigation protocol.
    ///
    /// With at least one match: the primary (first pre-order) match gets its
    /// ancestors expanded and becomes the selection. With no match the
    /// selection is cleared and visibility is untouched. An empty query only
    /// clears the stored query so stale highlights go away on the next
    /// render.
    pub fn search(&mut self, query: &str) -> SearchOutcome {
        let q = query.trim().to_lowercase();
        self.selection.query = q.clone();
        if q.is_empty() {
            return SearchOutcome::empty();
        }

        let matches = self.find_matches(&q);
        match matches.first().copied() {
            Some(primary) => {
                self.expand_ancestors_of(primary);
                self.selection.selected = Some(primary);
                SearchOutcome {
                    matches,
                    primary: Some(primary),
                }
            }
            None => {
                self.selection.selected = None;
                SearchOutcome::empty()
            }
        }
    }

    /// Whether a node matches the current query (for highlight styling).
    pub fn matches_current_query(&self, id: NodeId) -> bool {
        if self.selection.query.is_empty() {
            return false;
        }
        self.node(id).is_some_and(|node| {
            node.name.to_lowercase().contains(&self.selection.query)
                || node.label.to_lowercase().contains(&self.selection.query)
        })
    }
}
