//! Geo-verification engine.
//!
//! Uses an independently measured coordinate as insurance that a claimed
//! address is physically plausible: coordinate math, confidence scoring
//! and candidate matching.

mod format;
mod index;
mod math;
mod verify;

use thiserror::Error;

pub use format::{
    convert_coordinate_format, format_coordinates, parse_coordinates, CoordinateFormat,
};
pub use index::CandidateIndex;
pub use math::{
    calculate_distance, create_bounds_from_radius, get_bounds_center, is_within_bounds,
    validate_bounds, validate_coordinates, EARTH_RADIUS_METERS, METERS_PER_DEGREE_LATITUDE,
};
pub use verify::{
    calculate_confidence, find_best_matching_address, verify_address_with_geo, verify_batch,
    GeoVerification, VerificationMethod, VerifyOptions, DEFAULT_TOLERANCE_METERS,
};

/// Errors raised when constructing geo values.
///
/// Verification itself never fails; it reports `valid: false` instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Invalid center coordinates")]
    InvalidCenter,

    #[error("Invalid bounds coordinates")]
    InvalidBounds,

    #[error("radius must be a finite, non-negative number of meters, got {0}")]
    InvalidRadius(f64),
}
