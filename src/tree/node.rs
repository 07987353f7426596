//! Node types for the family tree.
//!
//! Each node in the loaded tree has:
//! - A stable unique identifier assigned in pre-order at build time
//! - The raw label from the source document plus parsed spouse role
//! - An immutable generation depth and a parent back-reference
//! - A single child slot that is either visible or hidden as a whole

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable node identifier.
///
/// Ids are assigned once in pre-order when the document is loaded and never
/// change afterwards. They are the reconciliation key for rendered elements.
/// Wraps a u32 for efficient storage and WebAssembly interop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Partner role encoded by a `wife:`/`husband:` name prefix.
///
/// The source documents encode partner relationships as synthetic child
/// entries named `"wife: Jane"` or `"husband: John"`. The prefix is parsed
/// once at build time; names that don't match the grammar are ordinary
/// person nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpouseRole {
    Wife,
    Husband,
}

impl SpouseRole {
    /// Parse a raw name against the spouse-prefix grammar.
    ///
    /// Grammar: `(wife|husband) \s* ":" \s* rest`, case-insensitive.
    /// Returns the role and the display name (prefix stripped, trimmed),
    /// or None for ordinary names.
    pub fn parse(name: &str) -> Option<(SpouseRole, &str)> {
        let trimmed = name.trim_start();
        let (role, rest) = if let Some(rest) = strip_prefix_ignore_case(trimmed, "wife") {
            (SpouseRole::Wife, rest)
        } else if let Some(rest) = strip_prefix_ignore_case(trimmed, "husband") {
            (SpouseRole::Husband, rest)
        } else {
            return None;
        };

        let rest = rest.trim_start();
        let rest = rest.strip_prefix(':')?;
        Some((role, rest.trim()))
    }

    /// Human-readable role label for the detail panel.
    pub fn label(self) -> &'static str {
        match self {
            SpouseRole::Wife => "Wife",
            SpouseRole::Husband => "Husband",
        }
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    // get() rather than slicing: the head may fall inside a multi-byte char
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// The child slot of a node.
///
/// A node's children live in exactly one of two states at any time: shown
/// (`Visible`) or set aside by a collapse (`Hidden`). The same Vec moves
/// between the variants so each descendant's own collapse state survives a
/// collapse/expand round trip. A leaf is `Visible` with an empty Vec; an
/// empty `Hidden` slot is never constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildSlot {
    /// Children currently shown, in document order.
    Visible(Vec<NodeId>),
    /// Children retained while the node is collapsed, in document order.
    Hidden(Vec<NodeId>),
}

impl ChildSlot {
    /// Create an empty (leaf) slot.
    pub fn leaf() -> Self {
        ChildSlot::Visible(Vec::new())
    }

    /// The children currently shown (empty when collapsed or leaf).
    pub fn visible(&self) -> &[NodeId] {
        match self {
            ChildSlot::Visible(children) => children,
            ChildSlot::Hidden(_) => &[],
        }
    }

    /// The children regardless of collapse state.
    pub fn any(&self) -> &[NodeId] {
        match self {
            ChildSlot::Visible(children) | ChildSlot::Hidden(children) => children,
        }
    }

    /// Whether the node shows children right now.
    pub fn is_expanded(&self) -> bool {
        matches!(self, ChildSlot::Visible(children) if !children.is_empty())
    }

    /// Whether the node has children set aside by a collapse.
    pub fn is_collapsed(&self) -> bool {
        matches!(self, ChildSlot::Hidden(_))
    }

    /// Whether the node has no children at all.
    pub fn is_leaf(&self) -> bool {
        self.any().is_empty()
    }

    /// Move visible children into the hidden state. No-op on leaves and on
    /// already-collapsed nodes.
    pub fn hide(&mut self) {
        if let ChildSlot::Visible(children) = self {
            if !children.is_empty() {
                *self = ChildSlot::Hidden(std::mem::take(children));
            }
        }
    }

    /// Restore hidden children to the visible state. No-op when already
    /// visible.
    pub fn show(&mut self) {
        if let ChildSlot::Hidden(children) = self {
            *self = ChildSlot::Visible(std::mem::take(children));
        }
    }
}

/// One person (or spouse) entry in the loaded tree.
///
/// `name`/`depth`/`parent` are immutable after build; only the child slot
/// toggles in response to user actions.
#[derive(Debug, Clone)]
pub struct PersonNode {
    /// Stable id, also this node's index in the engine arena.
    pub id: NodeId,
    /// Raw label from the source document (spouse prefix included).
    pub name: String,
    /// Display label: raw name with any spouse prefix stripped.
    pub label: String,
    /// Parsed spouse role, None for ordinary person nodes.
    pub spouse_role: Option<SpouseRole>,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// Optional photo URL.
    pub photo: Option<String>,
    /// Generation depth, 0 at the root. Immutable.
    pub depth: u32,
    /// Parent back-reference; None only for the root.
    pub parent: Option<NodeId>,
    /// Visible-or-hidden child slot.
    pub slot: ChildSlot,
}

impl PersonNode {
    /// Whether this node is a synthetic spouse entry.
    pub fn is_spouse(&self) -> bool {
        self.spouse_role.is_some()
    }
}
