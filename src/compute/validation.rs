//! Validation and parsing for geodetic coordinates.
//!
//! Only finiteness is checked. Latitude and longitude ranges are not
//! enforced: out-of-range values project to a defined point.

use crate::error::{GeocodeError, Result};
use revgeo_types::point::Coordinate;

/// Validates that both components of a coordinate are finite.
///
/// # Examples
///
/// ```
/// use revgeo::compute::validation::validate_coordinate;
/// use revgeo::Coordinate;
///
/// assert!(validate_coordinate(&Coordinate::new(40.7128, -74.0060)).is_ok());
///
/// // Out of range is fine
/// assert!(validate_coordinate(&Coordinate::new(95.0, 200.0)).is_ok());
///
/// // NaN is not
/// assert!(validate_coordinate(&Coordinate::new(f64::NAN, 0.0)).is_err());
/// ```
pub fn validate_coordinate(coord: &Coordinate) -> Result<()> {
    if coord.is_finite() {
        return Ok(());
    }

    if !coord.lat.is_finite() {
        return Err(GeocodeError::parse("lat", coord.lat));
    }

    Err(GeocodeError::parse("lon", coord.lon))
}

/// Validates a sequence of coordinates, reporting the first bad position.
pub fn validate_coordinates(coords: &[Coordinate]) -> Result<()> {
    for (idx, coord) in coords.iter().enumerate() {
        validate_coordinate(coord).map_err(|e| match e {
            GeocodeError::Parse { field, value } => GeocodeError::Parse {
                field: format!("{} at index {}", field, idx),
                value,
            },
            other => other,
        })?;
    }
    Ok(())
}

/// Parses a single decimal-degree value.
///
/// Surrounding whitespace is ignored. Values that are not numbers, or that
/// parse to NaN or infinity, are rejected.
pub fn parse_degrees(field: &str, raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(GeocodeError::parse(field, raw)),
    }
}

/// Parses a textual `(lat, lon)` pair.
///
/// # Examples
///
/// ```
/// use revgeo::compute::validation::parse_coordinate;
///
/// let coord = parse_coordinate("37.78674", " -122.39222 ").unwrap();
/// assert_eq!(coord.lat, 37.78674);
/// assert_eq!(coord.lon, -122.39222);
///
/// assert!(parse_coordinate("north", "0").is_err());
/// ```
pub fn parse_coordinate(lat: &str, lon: &str) -> Result<Coordinate> {
    Ok(Coordinate::new(
        parse_degrees("lat", lat)?,
        parse_degrees("lon", lon)?,
    ))
}
