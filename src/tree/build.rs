//! Document ingestion: raw JSON hierarchy → node arena.
//!
//! The source document is a single rooted tree where every entry has a
//! `name` and optionally `notes`, `photo` and `children`. The builder walks
//! it once, assigning ids in pre-order and depths by nesting level, and
//! wires parent back-references during the same walk. A serde-decoded tree
//! is acyclic by construction, so no visited-set guard is needed here.

use serde::Deserialize;
use thiserror::Error;

use super::node::{ChildSlot, NodeId, PersonNode, SpouseRole};

/// Raw document entry as it appears in the JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPerson {
    /// Display name; may carry a `wife:`/`husband:` prefix.
    pub name: String,
    /// Optional free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Optional photo URL.
    #[serde(default)]
    pub photo: Option<String>,
    /// Child entries in document order.
    #[serde(default)]
    pub children: Vec<RawPerson>,
}

/// Errors that make a document unloadable.
///
/// Load failure is fatal to the view: no partial tree is ever produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid family tree document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document has more than {} nodes", u32::MAX)]
    TooManyNodes,
}

/// Parse a JSON document and build the node arena.
///
/// Returns the arena in pre-order (the root is index 0). Every node starts
/// fully expanded; the host applies its preferred initial collapse depth
/// afterwards.
pub fn build_from_json(document: &str) -> Result<Vec<PersonNode>, LoadError> {
    let raw: RawPerson = serde_json::from_str(document)?;
    build_from_raw(&raw)
}

/// Build the node arena from an already-decoded document.
pub fn build_from_raw(raw: &RawPerson) -> Result<Vec<PersonNode>, LoadError> {
    if count_nodes(raw) > u32::MAX as usize {
        return Err(LoadError::TooManyNodes);
    }

    let mut arena = Vec::new();
    push_subtree(raw, None, 0, &mut arena);
    Ok(arena)
}

fn count_nodes(raw: &RawPerson) -> usize {
    1 + raw.children.iter().map(count_nodes).sum::<usize>()
}

/// Pre-order insertion: the node gets the next id, then its children are
/// inserted recursively and linked into its (initially visible) slot.
fn push_subtree(
    raw: &RawPerson,
    parent: Option<NodeId>,
    depth: u32,
    arena: &mut Vec<PersonNode>,
) -> NodeId {
    let id = NodeId(arena.len() as u32);

    let (spouse_role, label) = match SpouseRole::parse(&raw.name) {
        Some((role, stripped)) => (Some(role), stripped.to_string()),
        None => (None, raw.name.clone()),
    };

    arena.push(PersonNode {
        id,
        name: raw.name.clone(),
        label,
        spouse_role,
        notes: raw.notes.clone(),
        photo: raw.photo.clone(),
        depth,
        parent,
        slot: ChildSlot::leaf(),
    });

    let children: Vec<NodeId> = raw
        .children
        .iter()
        .map(|child| push_subtree(child, Some(id), depth + 1, arena))
        .collect();

    if !children.is_empty() {
        arena[id.0 as usize].slot = ChildSlot::Visible(children);
    }

    id
}
