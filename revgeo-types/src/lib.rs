//! # revgeo-types
//!
//! Core data types shared between the revgeo reverse geocoder and the
//! pipelines that assemble its location tables.
//!
//! - **Point types**: `Coordinate` (geodetic lat/lon), `ProjectedPoint` (Cartesian km)
//! - **Record types**: `LocationRecord` (coordinates plus descriptive attributes)
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use revgeo_types::point::Coordinate;
//! use revgeo_types::record::LocationRecord;
//!
//! let sf = Coordinate::new(37.78674, -122.39222);
//! let record = LocationRecord::new(37.77493, -122.41942)
//!     .with_attribute("name", "San Francisco")
//!     .with_attribute("cc", "US");
//!
//! assert_eq!(record.name(), Some("San Francisco"));
//! assert!(sf.lat > 37.0);
//! ```

pub mod point;
pub mod record;

pub use point::{Coordinate, ProjectedPoint};
pub use record::LocationRecord;
