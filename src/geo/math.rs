//! Coordinate math: validity, haversine distance and bounds helpers.

use crate::models::{GeoBounds, GeoCoordinates};

use super::GeoError;

/// Mean Earth radius used for haversine distances
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate length of one degree of latitude
pub const METERS_PER_DEGREE_LATITUDE: f64 = 111_320.0;

/// Check that a coordinate is usable.
///
/// Latitude and longitude must be finite and in range; accuracy, when
/// present, must be finite and non-negative. Every other geo function
/// goes through this gate before trusting its input.
pub fn validate_coordinates(coordinates: &GeoCoordinates) -> bool {
    let GeoCoordinates {
        latitude,
        longitude,
        accuracy,
        altitude,
        ..
    } = *coordinates;

    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
        && accuracy.map_or(true, |a| a.is_finite() && a >= 0.0)
        && altitude.map_or(true, f64::is_finite)
}

/// Both corners of the box are valid coordinates
pub fn validate_bounds(bounds: &GeoBounds) -> bool {
    validate_coordinates(&bounds.northeast) && validate_coordinates(&bounds.southwest)
}

/// Haversine great-circle distance in meters
pub fn calculate_distance(a: &GeoCoordinates, b: &GeoCoordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Boundary-inclusive box containment, anti-meridian aware
pub fn is_within_bounds(point: &GeoCoordinates, bounds: &GeoBounds) -> bool {
    let GeoBounds {
        northeast,
        southwest,
    } = bounds;

    if point.latitude < southwest.latitude || point.latitude > northeast.latitude {
        return false;
    }

    if southwest.longitude <= northeast.longitude {
        point.longitude >= southwest.longitude && point.longitude <= northeast.longitude
    } else {
        // Wraps: [sw, 180] ∪ [-180, ne]
        point.longitude >= southwest.longitude || point.longitude <= northeast.longitude
    }
}

/// Center of a box.
///
/// For boxes crossing the date line the longitude is
/// `(sw + ne + 360) / 2`, shifted by -360 when that exceeds 180.
pub fn get_bounds_center(bounds: &GeoBounds) -> GeoCoordinates {
    let GeoBounds {
        northeast,
        southwest,
    } = bounds;

    let longitude = if southwest.longitude <= northeast.longitude {
        (southwest.longitude + northeast.longitude) / 2.0
    } else {
        let lon = (southwest.longitude + northeast.longitude + 360.0) / 2.0;
        if lon > 180.0 {
            lon - 360.0
        } else {
            lon
        }
    };

    GeoCoordinates::unchecked((southwest.latitude + northeast.latitude) / 2.0, longitude)
}

/// Box around `center` reaching `radius_meters` in each direction.
///
/// Latitude is clamped to the poles. Longitude wraps, so a box that
/// reaches past ±180° comes back as a date-line crossing box; a box that
/// would span the whole globe (near the poles) covers every longitude.
pub fn create_bounds_from_radius(
    center: &GeoCoordinates,
    radius_meters: f64,
) -> Result<GeoBounds, GeoError> {
    if !validate_coordinates(center) {
        return Err(GeoError::InvalidCenter);
    }
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(GeoError::InvalidRadius(radius_meters));
    }

    let lat_offset = radius_meters / METERS_PER_DEGREE_LATITUDE;
    let lon_offset =
        radius_meters / (METERS_PER_DEGREE_LATITUDE * center.latitude.to_radians().cos());

    let north = (center.latitude + lat_offset).min(90.0);
    let south = (center.latitude - lat_offset).max(-90.0);

    let (east, west) = if lon_offset.is_finite() && lon_offset < 180.0 {
        (
            wrap_longitude(center.longitude + lon_offset),
            wrap_longitude(center.longitude - lon_offset),
        )
    } else {
        (180.0, -180.0)
    };

    Ok(GeoBounds {
        northeast: GeoCoordinates::unchecked(north, east),
        southwest: GeoCoordinates::unchecked(south, west),
    })
}

/// Bring a longitude back into [-180, 180]
fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}
