//! Selection detail projection.
//!
//! Turns a selected node's raw attributes into the structured view the
//! detail panel renders. The projection reads whichever slot currently
//! holds a node's children, so collapsing a branch never changes what the
//! panel says about it.

use serde::Serialize;

use crate::tree::{NodeId, PersonNode, TreeEngine};

/// Structured detail view of one selected node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    /// Display name (spouse prefix stripped).
    pub name: String,
    /// "Wife"/"Husband" for spouse nodes, None for person nodes.
    pub role: Option<&'static str>,
    /// Branch name for the color pill.
    pub branch: String,
    /// For spouse nodes: the partner (the parent person's name).
    pub partner: Option<String>,
    /// For person nodes: immediate spouse entries, prefix-stripped.
    pub spouses: Vec<String>,
    /// Children for display purposes: own non-spouse children plus each
    /// spouse entry's children, flattened one level.
    pub children: Vec<String>,
    /// Free-text notes, if recorded.
    pub notes: Option<String>,
    /// Photo URL, if recorded.
    pub photo: Option<String>,
}

/// Project a node into its detail view.
///
/// Returns None for an empty selection or an unknown id; the host renders
/// its placeholder panel in that case.
pub fn project(engine: &TreeEngine, id: Option<NodeId>) -> Option<DetailView> {
    let node = engine.node(id?)?;
    let branch = engine.branch_of(node.id).to_string();

    let view = if node.is_spouse() {
        // Spouse subtrees are flat: their children are the couple's children
        DetailView {
            name: node.label.clone(),
            role: node.spouse_role.map(|role| role.label()),
            branch,
            partner: node
                .parent
                .and_then(|parent| engine.node(parent))
                .map(|parent| parent.name.clone()),
            spouses: Vec::new(),
            children: child_labels(engine, node),
            notes: node.notes.clone(),
            photo: node.photo.clone(),
        }
    } else {
        let mut spouses = Vec::new();
        let mut children = Vec::new();
        for &child_id in node.slot.any() {
            let Some(child) = engine.node(child_id) else {
                continue;
            };
            if child.is_spouse() {
                spouses.push(child.label.clone());
                // A person's children include the ones recorded under the
                // spouse entry
                children.extend(child_labels(engine, child));
            } else {
                children.push(child.label.clone());
            }
        }
        DetailView {
            name: node.label.clone(),
            role: None,
            branch,
            partner: None,
            spouses,
            children,
            notes: node.notes.clone(),
            photo: node.photo.clone(),
        }
    };

    Some(view)
}

fn child_labels(engine: &TreeEngine, node: &PersonNode) -> Vec<String> {
    node.slot
        .any()
        .iter()
        .filter_map(|&child| engine.node(child))
        .map(|child| child.label.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A -> [B, C], B -> [wife: D], D -> [E] (child recorded under the
    /// spouse entry).
    fn engine() -> TreeEngine {
        TreeEngine::from_json(
            r#"{
                "name": "A",
                "children": [
                    {
                        "name": "B",
                        "children": [
                            { "name": "wife: D", "children": [ { "name": "E" } ] }
                        ]
                    },
                    { "name": "C", "notes": "youngest", "photo": "c.jpg" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_selection() {
        let engine = engine();
        assert!(project(&engine, None).is_none());
        assert!(project(&engine, Some(NodeId(999))).is_none());
    }

    #[test]
    fn test_person_without_spouse() {
        let engine = engine();
        let view = project(&engine, Some(NodeId(0))).unwrap();

        assert_eq!(view.name, "A");
        assert_eq!(view.role, None);
        assert!(view.spouses.is_empty());
        assert_eq!(view.children, vec!["B", "C"]);
        assert_eq!(view.partner, None);
    }

    #[test]
    fn test_person_with_spouse_flattens_grandchildren() {
        let engine = engine();
        let view = project(&engine, Some(NodeId(1))).unwrap();

        assert_eq!(view.name, "B");
        assert_eq!(view.spouses, vec!["D"]);
        // E is recorded under the spouse entry but is B's child for display
        assert_eq!(view.children, vec!["E"]);
    }

    #[test]
    fn test_spouse_node_view() {
        let engine = engine();
        let view = project(&engine, Some(NodeId(2))).unwrap();

        assert_eq!(view.name, "D");
        assert_eq!(view.role, Some("Wife"));
        assert_eq!(view.partner.as_deref(), Some("B"));
        assert!(view.spouses.is_empty());
        assert_eq!(view.children, vec!["E"]);
    }

    #[test]
    fn test_projection_ignores_collapse_state() {
        let mut engine = engine();
        let expanded = project(&engine, Some(NodeId(1))).unwrap();

        engine.collapse_subtree(engine.root());
        let collapsed = project(&engine, Some(NodeId(1))).unwrap();
        assert_eq!(expanded, collapsed);
    }

    #[test]
    fn test_optional_attributes_pass_through() {
        let engine = engine();
        let view = project(&engine, Some(NodeId(4))).unwrap();
        assert_eq!(view.notes.as_deref(), Some("youngest"));
        assert_eq!(view.photo.as_deref(), Some("c.jpg"));

        let bare = project(&engine, Some(NodeId(0))).unwrap();
        assert_eq!(bare.notes, None);
        assert_eq!(bare.photo, None);
    }

    #[test]
    fn test_branch_in_view() {
        let engine = engine();
        assert_eq!(project(&engine, Some(NodeId(0))).unwrap().branch, "ROOT");
        assert_eq!(project(&engine, Some(NodeId(2))).unwrap().branch, "B");
    }

    #[test]
    fn test_couple_details_at_shallow_depth() {
        // Tree A -> [B, C], B -> [wife: D], collapsed to depth 2:
        // detail of A shows no spouse, children [B, C]; detail of B shows
        // spouse [D], children []
        let mut engine = TreeEngine::from_json(
            r#"{
                "name": "A",
                "children": [
                    { "name": "B", "children": [ { "name": "wife: D" } ] },
                    { "name": "C" }
                ]
            }"#,
        )
        .unwrap();
        engine.collapse_to_depth(engine.root(), 2);

        let a = project(&engine, Some(NodeId(0))).unwrap();
        assert!(a.spouses.is_empty());
        assert_eq!(a.children, vec!["B", "C"]);

        let b = project(&engine, Some(NodeId(1))).unwrap();
        assert_eq!(b.spouses, vec!["D"]);
        assert!(b.children.is_empty());
    }
}
