//! Coordinate, bounds and geo-address value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{validate_bounds, validate_coordinates, GeoError};
use crate::pid::AddressPid;

/// Where a coordinate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoSource {
    /// GPS device
    Gps,
    /// Generic geocoding service
    Geocoder,
    /// OpenStreetMap Nominatim
    Nominatim,
    /// Typed in by a person
    Manual,
    /// Address database
    Database,
    /// Device location API
    Device,
    Unknown,
}

impl std::fmt::Display for GeoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoSource::Gps => write!(f, "gps"),
            GeoSource::Geocoder => write!(f, "geocoder"),
            GeoSource::Nominatim => write!(f, "nominatim"),
            GeoSource::Manual => write!(f, "manual"),
            GeoSource::Database => write!(f, "database"),
            GeoSource::Device => write!(f, "device"),
            GeoSource::Unknown => write!(f, "unknown"),
        }
    }
}

/// Geographic point (decimal degrees) with optional accuracy radius.
///
/// Values deserialized from the outside are not trusted: every geo
/// function runs them through [`validate_coordinates`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,

    /// Accuracy radius in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<GeoSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl GeoCoordinates {
    /// Create a validated coordinate pair
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        Self::unchecked(latitude, longitude).validated()
    }

    /// Build without validation, e.g. for untrusted observations that
    /// verification should reject rather than error on
    pub fn unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            source: None,
            captured_at: None,
        }
    }

    /// Attach an accuracy radius, re-validating the result
    pub fn with_accuracy(mut self, meters: f64) -> Result<Self, GeoError> {
        self.accuracy = Some(meters);
        self.validated()
    }

    pub fn with_source(mut self, source: GeoSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Pass self through [`validate_coordinates`]
    pub fn validated(self) -> Result<Self, GeoError> {
        if validate_coordinates(&self) {
            Ok(self)
        } else {
            Err(GeoError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl From<GeoCoordinates> for geo_types::Point<f64> {
    fn from(c: GeoCoordinates) -> Self {
        geo_types::Point::new(c.longitude, c.latitude)
    }
}

impl TryFrom<geo_types::Point<f64>> for GeoCoordinates {
    type Error = GeoError;

    fn try_from(point: geo_types::Point<f64>) -> Result<Self, Self::Error> {
        Self::new(point.y(), point.x())
    }
}

/// Latitude/longitude box given by its corners.
///
/// `southwest.longitude > northeast.longitude` is legal and means the box
/// wraps the anti-meridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub northeast: GeoCoordinates,
    pub southwest: GeoCoordinates,
}

impl GeoBounds {
    pub fn new(northeast: GeoCoordinates, southwest: GeoCoordinates) -> Result<Self, GeoError> {
        let bounds = Self {
            northeast,
            southwest,
        };
        if validate_bounds(&bounds) {
            Ok(bounds)
        } else {
            Err(GeoError::InvalidBounds)
        }
    }

    /// Whether the box crosses the ±180° meridian
    pub fn crosses_antimeridian(&self) -> bool {
        self.southwest.longitude > self.northeast.longitude
    }
}

/// An address PID paired with its location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoAddress {
    pub pid: String,

    /// Geographic center point
    pub center: GeoCoordinates,

    /// Area covered by the address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,

    #[serde(default)]
    pub verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl GeoAddress {
    /// Pair a validated PID with a location.
    ///
    /// Fails when the center or either bounds corner is invalid.
    pub fn new(
        pid: &AddressPid,
        center: GeoCoordinates,
        bounds: Option<GeoBounds>,
    ) -> Result<Self, GeoError> {
        if !validate_coordinates(&center) {
            return Err(GeoError::InvalidCenter);
        }
        if let Some(ref b) = bounds {
            if !validate_bounds(b) {
                return Err(GeoError::InvalidBounds);
            }
        }

        Ok(Self {
            pid: pid.pid().to_string(),
            center,
            bounds,
            verified: false,
            verified_at: None,
        })
    }

    /// Copy of this address flagged as verified at `at`
    pub fn mark_verified(&self, at: DateTime<Utc>) -> Self {
        Self {
            verified: true,
            verified_at: Some(at),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(GeoCoordinates::new(91.0, 0.0).is_err());
        assert!(GeoCoordinates::new(0.0, -180.5).is_err());
        assert!(GeoCoordinates::new(f64::NAN, 0.0).is_err());
        assert!(GeoCoordinates::new(90.0, 180.0).is_ok());
    }

    #[test]
    fn test_negative_accuracy_rejected() {
        let c = GeoCoordinates::new(35.0, 139.0).unwrap();
        assert!(c.with_accuracy(-1.0).is_err());
        assert_eq!(c.with_accuracy(12.5).unwrap().accuracy, Some(12.5));
    }

    #[test]
    fn test_point_conversion_swaps_axes() {
        let c = GeoCoordinates::new(35.6812, 139.7671).unwrap();
        let p: geo_types::Point<f64> = c.into();
        assert_eq!(p.x(), 139.7671);
        assert_eq!(p.y(), 35.6812);
        assert_eq!(GeoCoordinates::try_from(p).unwrap(), c);
    }

    #[test]
    fn test_geo_address_requires_valid_geometry() {
        let pid = AddressPid::parse("JP-13-113").unwrap();
        let center = GeoCoordinates::new(35.68, 139.76).unwrap();
        let bad_corner = GeoCoordinates::unchecked(95.0, 139.0);
        let bounds = GeoBounds {
            northeast: bad_corner,
            southwest: center,
        };

        assert!(matches!(
            GeoAddress::new(&pid, GeoCoordinates::unchecked(0.0, 200.0), None),
            Err(GeoError::InvalidCenter)
        ));
        assert!(matches!(
            GeoAddress::new(&pid, center, Some(bounds)),
            Err(GeoError::InvalidBounds)
        ));

        let address = GeoAddress::new(&pid, center, None).unwrap();
        assert_eq!(address.pid, "JP-13-113");
        assert!(!address.verified);
        assert!(address.mark_verified(Utc::now()).verified);
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let c = GeoCoordinates::new(1.0, 2.0)
            .unwrap()
            .with_source(GeoSource::Gps);
        let json = serde_json::to_value(c).unwrap();
        assert_eq!(json["source"], "gps");
        assert!(json.get("accuracy").is_none());
    }
}
