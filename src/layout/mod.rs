//! Layout computation and frame reconciliation.
//!
//! `tidy` positions the currently-visible subtree; `diff` turns successive
//! passes into enter/update/exit instructions with cached animation seeds.

pub mod diff;
pub mod tidy;

pub use diff::{EdgeFrame, NodeFrame, Point, Reconciler, RenderDiff};
pub use tidy::{EdgePlacement, LayoutPass, Placement, TidyConfig, TidyLayout};
