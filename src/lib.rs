//! Family Tree Explorer - WASM Engine
//!
//! This module provides the tree interaction and state-management engine
//! behind the family tree explorer. It is compiled to WebAssembly and
//! exposes a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `tree`: node arena, collapse/expand state machine, search, selection
//! - `layout`: tidy tree positions plus enter/update/exit reconciliation
//! - `detail`: selection detail projection for the side panel
//! - `spatial`: R-tree hit testing over rendered placements
//!
//! The host owns the presentation: it draws the frames this engine emits,
//! feeds pointer and control events back in, and applies the viewport
//! transform for centering.

use js_sys::Float32Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod detail;
pub mod layout;
pub mod spatial;
pub mod tree;

use layout::{LayoutPass, Reconciler, RenderDiff, TidyLayout};
use spatial::HitTester;
use tree::{EXPAND_ALL_DEPTH, NodeId, TreeEngine};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"family-tree-wasm ready".into());
}

/// One node's frame entry, decorated with the attributes the host needs
/// for styling (label, branch color key, state classes) so a render needs
/// no follow-up queries.
#[derive(Debug, Clone, Serialize)]
struct SceneNode {
    id: NodeId,
    label: String,
    branch: String,
    x: f32,
    y: f32,
    origin_x: f32,
    origin_y: f32,
    entering: bool,
    selected: bool,
    matched: bool,
    collapsed: bool,
    spouse: bool,
    photo: Option<String>,
}

/// A full frame: decorated nodes, links, and the keys to remove.
#[derive(Debug, Clone, Serialize)]
struct Scene {
    nodes: Vec<SceneNode>,
    edges: Vec<layout::EdgeFrame>,
    removed_nodes: Vec<NodeId>,
    removed_edges: Vec<NodeId>,
}

/// Main entry point for the family tree engine.
///
/// Wraps the internal engine, layout, reconciler and hit tester behind the
/// public API exposed to JavaScript. One instance holds one loaded tree.
#[wasm_bindgen]
pub struct FamilyTreeWasm {
    engine: Option<TreeEngine>,
    layout: TidyLayout,
    reconciler: Reconciler,
    hits: HitTester,
    bounds: Option<[f32; 4]>,
}

#[wasm_bindgen]
impl FamilyTreeWasm {
    /// Create an engine with no tree loaded.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            engine: None,
            layout: TidyLayout::with_defaults(),
            reconciler: Reconciler::new(),
            hits: HitTester::new(),
            bounds: None,
        }
    }

    // =========================================================================
    // Document Loading
    // =========================================================================

    /// Load a JSON hierarchy document, replacing any previous tree.
    ///
    /// Load failure is fatal to the view: the previous tree (if any) is
    /// discarded and the error message is returned for the host's error
    /// state.
    #[wasm_bindgen(js_name = loadJson)]
    pub fn load_json(&mut self, document: &str) -> Result<(), JsValue> {
        self.engine = None;
        self.reconciler.clear();
        self.hits.clear();
        self.bounds = None;

        match TreeEngine::from_json(document) {
            Ok(engine) => {
                self.engine = Some(engine);
                Ok(())
            }
            Err(err) => Err(JsValue::from_str(&err.to_string())),
        }
    }

    /// Whether a tree is currently loaded.
    #[wasm_bindgen(js_name = isLoaded)]
    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// Total number of nodes in the loaded tree.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.engine.as_ref().map_or(0, |engine| engine.node_count())
    }

    /// Number of currently-visible nodes.
    #[wasm_bindgen(js_name = visibleCount)]
    pub fn visible_count(&self) -> u32 {
        self.engine
            .as_ref()
            .map_or(0, |engine| engine.visible_nodes().len() as u32)
    }

    /// Configure layout spacing: pixels per generation along the depth
    /// axis, and pixels per breadth unit between siblings.
    #[wasm_bindgen(js_name = configureLayout)]
    pub fn configure_layout(&mut self, level_spacing: f32, node_spacing: f32) {
        let mut config = self.layout.config().clone();
        config.level_spacing = level_spacing;
        config.node_spacing = node_spacing;
        self.layout.set_config(config);
    }

    // =========================================================================
    // Collapse / Expand
    // =========================================================================

    /// Toggle one node's children (circle click). Returns whether anything
    /// changed; leaves and unknown ids are no-ops.
    #[wasm_bindgen(js_name = toggleNode)]
    pub fn toggle_node(&mut self, id: u32) -> bool {
        self.engine
            .as_mut()
            .is_some_and(|engine| engine.toggle(NodeId(id)))
    }

    /// Collapse the tree to a target generation depth (depth selector).
    /// Everything shallower stays expanded.
    #[wasm_bindgen(js_name = collapseToDepth)]
    pub fn collapse_to_depth(&mut self, depth: u32) {
        if let Some(engine) = self.engine.as_mut() {
            let root = engine.root();
            engine.collapse_to_depth(root, depth);
        }
    }

    /// Expand every node (expand-all control).
    #[wasm_bindgen(js_name = expandAll)]
    pub fn expand_all(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            let root = engine.root();
            engine.collapse_to_depth(root, EXPAND_ALL_DEPTH);
        }
    }

    /// Make a node reachable by expanding its ancestor chain.
    #[wasm_bindgen(js_name = expandAncestors)]
    pub fn expand_ancestors(&mut self, id: u32) {
        if let Some(engine) = self.engine.as_mut() {
            engine.expand_ancestors_of(NodeId(id));
        }
    }

    // =========================================================================
    // Selection & Search
    // =========================================================================

    /// Select a node (label click). An unknown id clears the selection.
    #[wasm_bindgen(js_name = selectNode)]
    pub fn select_node(&mut self, id: u32) {
        if let Some(engine) = self.engine.as_mut() {
            engine.select(NodeId(id));
        }
    }

    /// Clear selection and query (background click or clear button).
    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.clear_selection();
        }
    }

    /// Run a search over the full tree, visible and hidden nodes alike.
    ///
    /// Returns `{ matches: number[], primary: number | null }`. When a
    /// primary match exists its ancestors are already expanded and it is
    /// selected; the host should re-render with the primary as source and
    /// then center on it via `centerTarget`.
    pub fn search(&mut self, query: &str) -> JsValue {
        let Some(engine) = self.engine.as_mut() else {
            return JsValue::NULL;
        };
        let outcome = engine.search(query);
        serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Compute a frame: lay out the visible set, diff it against the
    /// previous frame, and decorate it with styling attributes.
    ///
    /// `source` is the node that triggered the action (clicked node or
    /// primary match); pass `undefined` for global actions to seed from the
    /// root. Also refreshes the hit-test index and the visible bounds.
    pub fn render(&mut self, source: Option<u32>) -> JsValue {
        let Some(engine) = self.engine.as_ref() else {
            return JsValue::NULL;
        };

        let source = source
            .map(NodeId)
            .filter(|&id| engine.node(id).is_some())
            .unwrap_or_else(|| engine.root());

        let pass = self.layout.layout(engine);
        let diff = self.reconciler.reconcile(source, &pass);
        self.hits.rebuild(&pass);
        self.bounds = compute_bounds(&pass);

        let scene = decorate(engine, diff);
        serde_wasm_bindgen::to_value(&scene).unwrap_or(JsValue::NULL)
    }

    /// Bounding box of the last rendered frame as [min_x, min_y, max_x,
    /// max_y], for the host's viewBox.
    #[wasm_bindgen(js_name = visibleBounds)]
    pub fn visible_bounds(&self) -> Option<Float32Array> {
        self.bounds.map(|b| Float32Array::from(&b[..]))
    }

    /// A node's last rendered position as [x, y], for the host's centering
    /// transform after auto-navigation.
    #[wasm_bindgen(js_name = centerTarget)]
    pub fn center_target(&self, id: u32) -> Option<Float32Array> {
        self.reconciler
            .cached_position(NodeId(id))
            .map(|point| Float32Array::from(&[point.x, point.y][..]))
    }

    /// Resolve pointer coordinates to a rendered node id.
    ///
    /// `max_distance` is the node's visual radius plus click slop.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f32, y: f32, max_distance: f32) -> Option<u32> {
        self.hits.node_at(x, y, max_distance).map(|id| id.0)
    }

    // =========================================================================
    // Detail Panel
    // =========================================================================

    /// Project a node into the detail panel view, or `null` for the
    /// placeholder (no selection or unknown id).
    pub fn details(&self, id: Option<u32>) -> JsValue {
        let Some(engine) = self.engine.as_ref() else {
            return JsValue::NULL;
        };
        match detail::project(engine, id.map(NodeId)) {
            Some(view) => serde_wasm_bindgen::to_value(&view).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Detail view of the current selection, or `null`.
    #[wasm_bindgen(js_name = selectedDetails)]
    pub fn selected_details(&self) -> JsValue {
        let Some(engine) = self.engine.as_ref() else {
            return JsValue::NULL;
        };
        self.details(engine.selection().selected.map(|id| id.0))
    }

    /// Branch name of a node, for the host's color table.
    #[wasm_bindgen(js_name = branchOf)]
    pub fn branch_of(&self, id: u32) -> String {
        self.engine.as_ref().map_or_else(
            || "ROOT".to_string(),
            |engine| engine.branch_of(NodeId(id)).to_string(),
        )
    }
}

impl Default for FamilyTreeWasm {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_bounds(pass: &LayoutPass) -> Option<[f32; 4]> {
    if pass.placements.is_empty() {
        return None;
    }
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for p in &pass.placements {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some([min_x, min_y, max_x, max_y])
}

fn decorate(engine: &TreeEngine, diff: RenderDiff) -> Scene {
    let selected = engine.selection().selected;
    let nodes = diff
        .nodes
        .into_iter()
        .filter_map(|frame| {
            let node = engine.node(frame.id)?;
            Some(SceneNode {
                id: frame.id,
                label: node.label.clone(),
                branch: engine.branch_of(frame.id).to_string(),
                x: frame.x,
                y: frame.y,
                origin_x: frame.origin_x,
                origin_y: frame.origin_y,
                entering: frame.entering,
                selected: selected == Some(frame.id),
                matched: engine.matches_current_query(frame.id),
                collapsed: node.slot.is_collapsed(),
                spouse: node.is_spouse(),
                photo: node.photo.clone(),
            })
        })
        .collect();

    Scene {
        nodes,
        edges: diff.edges,
        removed_nodes: diff.removed_nodes,
        removed_edges: diff.removed_edges,
    }
}
