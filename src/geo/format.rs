//! Coordinate string formatting and parsing.

use serde::{Deserialize, Serialize};

use super::math::validate_coordinates;
use crate::models::GeoCoordinates;

/// Output notation for [`convert_coordinate_format`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFormat {
    /// `35.681200, 139.767100`
    #[default]
    Decimal,
    /// Degrees, minutes, seconds: `35°40'52.32"N, 139°46'1.56"E`
    Dms,
    /// Degrees, decimal minutes: `35°40.8720'N, 139°46.0260'E`
    Dmm,
}

impl CoordinateFormat {
    /// Look up a format by name, falling back to decimal for anything
    /// unrecognized
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dms" => CoordinateFormat::Dms,
            "dmm" => CoordinateFormat::Dmm,
            _ => CoordinateFormat::Decimal,
        }
    }
}

/// Render `"lat, lon"` with a fixed number of decimals.
///
/// No validation happens here; see [`convert_coordinate_format`].
pub fn format_coordinates(coordinates: &GeoCoordinates, precision: usize) -> String {
    format!(
        "{:.*}, {:.*}",
        precision, coordinates.latitude, precision, coordinates.longitude
    )
}

/// Parse `"lat, lon"`.
///
/// Anything other than exactly two numeric tokens forming a valid
/// coordinate yields `None`.
pub fn parse_coordinates(input: &str) -> Option<GeoCoordinates> {
    let mut parts = input.split(',').map(str::trim);
    let latitude = parts.next()?.parse::<f64>().ok()?;
    let longitude = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let coordinates = GeoCoordinates::unchecked(latitude, longitude);
    validate_coordinates(&coordinates).then_some(coordinates)
}

/// Render coordinates in the requested notation with hemisphere letters.
///
/// Values are rendered as given; check them with
/// [`validate_coordinates`] first, since non-finite input prints `NaN`.
pub fn convert_coordinate_format(coordinates: &GeoCoordinates, format: CoordinateFormat) -> String {
    let GeoCoordinates {
        latitude,
        longitude,
        ..
    } = *coordinates;
    let lat_dir = if latitude >= 0.0 { 'N' } else { 'S' };
    let lon_dir = if longitude >= 0.0 { 'E' } else { 'W' };

    match format {
        CoordinateFormat::Decimal => format_coordinates(coordinates, 6),
        CoordinateFormat::Dms => format!(
            "{}{}, {}{}",
            to_dms(latitude),
            lat_dir,
            to_dms(longitude),
            lon_dir
        ),
        CoordinateFormat::Dmm => format!(
            "{}{}, {}{}",
            to_dmm(latitude),
            lat_dir,
            to_dmm(longitude),
            lon_dir
        ),
    }
}

/// Hundredths of an arc second per degree
const CENTISECONDS_PER_DEGREE: f64 = 360_000.0;

/// Ten-thousandths of an arc minute per degree
const DECIMINUTES_PER_DEGREE: f64 = 600_000.0;

// Both helpers round to the printed precision before splitting, so
// 59.999" carries into the next minute instead of printing 60.00".

fn to_dms(decimal: f64) -> String {
    let total = (decimal.abs() * CENTISECONDS_PER_DEGREE).round();
    let degrees = (total / CENTISECONDS_PER_DEGREE).floor();
    let remainder = total - degrees * CENTISECONDS_PER_DEGREE;
    let minutes = (remainder / 6_000.0).floor();
    let seconds = (remainder - minutes * 6_000.0) / 100.0;

    format!("{}°{}'{:.2}\"", degrees, minutes, seconds)
}

fn to_dmm(decimal: f64) -> String {
    let total = (decimal.abs() * DECIMINUTES_PER_DEGREE).round();
    let degrees = (total / DECIMINUTES_PER_DEGREE).floor();
    let minutes = (total - degrees * DECIMINUTES_PER_DEGREE) / 10_000.0;

    format!("{}°{:.4}'", degrees, minutes)
}
