//! Tree model and interaction state.
//!
//! This module owns the node arena built from the source JSON document and
//! every mutation of collapse/expand visibility. Ids are assigned in
//! pre-order at load time and double as arena indices.

mod build;
mod engine;
mod node;

pub use build::{LoadError, RawPerson, build_from_json};
pub use engine::{EXPAND_ALL_DEPTH, SearchOutcome, SelectionState, TreeEngine};
pub use node::{ChildSlot, NodeId, PersonNode, SpouseRole};
