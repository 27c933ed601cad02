//! Compute layer: projection, spatial indexing and query dispatch.
//!
//! This module is independent of how location records are loaded. It
//! provides:
//! - Coordinate validation and parsing
//! - The geodetic projection into a Cartesian embedding
//! - The k-d tree nearest-neighbor index
//! - The parallel batch coordinator

pub mod kdtree;
pub mod parallel;
pub mod projection;
pub mod validation;

pub use kdtree::{KdTree, Neighbor};
pub use parallel::QueryCoordinator;
pub use projection::{project, project_all};
