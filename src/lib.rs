//! Offline reverse geocoding: nearest known place for a coordinate.
//!
//! Records are projected onto the WGS-84 ellipsoid, indexed in a 3-D k-d
//! tree once, and then queried singly or in batches. Batches can be spread
//! over a fixed worker pool; results always come back in input order and
//! are identical to the single-threaded answers.
//!
//! ```rust
//! use revgeo::{Config, Coordinate, Geocoder, LocationRecord};
//!
//! let records = vec![
//!     LocationRecord::new(37.77493, -122.41942).with_attribute("name", "San Francisco"),
//!     LocationRecord::new(41.85003, -87.65005).with_attribute("name", "Chicago"),
//!     LocationRecord::new(48.85341, 2.3488).with_attribute("name", "Paris"),
//! ];
//! let geocoder = Geocoder::new(records, Config::parallel(2))?;
//!
//! let place = geocoder.query_one((37.78674, -122.39222))?;
//! assert_eq!(place.name(), Some("San Francisco"));
//!
//! let places = geocoder.query_many(&[
//!     Coordinate::new(41.852968, -87.725730),
//!     Coordinate::new(48.836364, 2.357422),
//! ])?;
//! assert_eq!(places[0].name(), Some("Chicago"));
//! assert_eq!(places[1].name(), Some("Paris"));
//! # Ok::<(), revgeo::GeocodeError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod geocoder;
pub mod shared;
pub mod table;

#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use builder::GeocoderBuilder;
pub use config::{Config, QueryMode};
pub use error::{GeocodeError, Result};
pub use geocoder::{Geocoder, Nearest};
pub use shared::SharedGeocoder;
pub use table::RecordTable;

pub use compute::{KdTree, Neighbor};

pub use revgeo_types::point::{Coordinate, ProjectedPoint};
pub use revgeo_types::record::LocationRecord;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeocodeError, Geocoder, GeocoderBuilder, Result, SharedGeocoder};

    pub use crate::{Config, QueryMode};

    pub use crate::{Coordinate, LocationRecord, Nearest, RecordTable};
}
