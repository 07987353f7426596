//! Spatial indexing for O(log n) hit testing.
//!
//! An R-tree over the last layout pass's placements, so a canvas host can
//! resolve pointer coordinates to a node id.

mod rtree;

pub use rtree::HitTester;
