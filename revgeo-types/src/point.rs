use geo::Point;
use serde::{Deserialize, Serialize};

/// A geodetic coordinate in decimal degrees.
///
/// Field order follows the gazetteer convention of latitude first. Note that
/// `geo::Point` stores longitude as `x` and latitude as `y`; the `From`
/// conversions below take care of the swap.
///
/// No range validation is performed here. Out-of-range values are carried
/// through unchanged.
///
/// # Examples
///
/// ```
/// use revgeo_types::point::Coordinate;
/// use geo::Point;
///
/// let paris = Coordinate::new(48.836364, 2.357422);
/// let point: Point = paris.into();
/// assert_eq!(point.x(), 2.357422);
/// assert_eq!(point.y(), 48.836364);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<(f64, f64)> for Coordinate {
    /// Interprets the tuple as `(lat, lon)`.
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lon: point.x(),
        }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(coord: Coordinate) -> Self {
        Point::new(coord.lon, coord.lat)
    }
}

/// A point in the Earth-centered Cartesian embedding, in kilometers.
///
/// Euclidean distance between two projected points approximates surface
/// proximity well enough to rank nearest neighbors. It is a chord length,
/// not a geodesic distance.
///
/// # Examples
///
/// ```
/// use revgeo_types::point::ProjectedPoint;
///
/// let a = ProjectedPoint::new(0.0, 0.0, 0.0);
/// let b = ProjectedPoint::new(3.0, 4.0, 12.0);
/// assert_eq!(a.distance(&b), 13.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component along `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    ///
    /// Panics if `axis > 2`.
    #[inline]
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("ProjectedPoint has 3 axes, got axis {}", axis),
        }
    }

    #[inline]
    pub fn distance_squared(&self, other: &ProjectedPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    #[inline]
    pub fn distance(&self, other: &ProjectedPoint) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<[f64; 3]> for ProjectedPoint {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}
