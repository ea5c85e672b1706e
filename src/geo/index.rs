//! Spatial index for picking the best candidate out of many addresses.

use std::f64::consts::FRAC_PI_2;

use rstar::{Envelope, RTree, RTreeObject, AABB};
use tracing::{debug, info};

use super::math::{validate_bounds, validate_coordinates, EARTH_RADIUS_METERS};
use super::verify::{best_of, VerifyOptions};
use crate::models::{GeoAddress, GeoCoordinates};

/// Slack on the search radius so float rounding never drops an edge hit
const SEARCH_PADDING: f64 = 1.01;

/// R-tree entry pointing back into the candidate list
#[derive(Debug, Clone)]
struct IndexedCandidate {
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedCandidate {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedCandidate {
    /// Envelope covers the center and, when valid, the bounds box.
    /// Candidates with an invalid center are not indexed.
    fn new(slot: usize, candidate: &GeoAddress) -> Option<Self> {
        let center = &candidate.center;
        if !validate_coordinates(center) {
            return None;
        }

        let point = [center.longitude, center.latitude];
        let mut envelope = AABB::from_point(point);

        if let Some(bounds) = candidate.bounds.as_ref().filter(|b| validate_bounds(b)) {
            let (west, east) = if bounds.crosses_antimeridian() {
                (-180.0, 180.0)
            } else {
                (bounds.southwest.longitude, bounds.northeast.longitude)
            };
            envelope.merge(&AABB::from_corners(
                [west, bounds.southwest.latitude],
                [east, bounds.northeast.latitude],
            ));
        }

        Some(Self { slot, envelope })
    }
}

/// R-tree over candidate addresses.
///
/// [`CandidateIndex::best_match`] answers the same question as
/// [`super::find_best_matching_address`] without scanning every
/// candidate.
pub struct CandidateIndex {
    candidates: Vec<GeoAddress>,
    tree: RTree<IndexedCandidate>,
}

impl CandidateIndex {
    /// Build the index; candidates with invalid centers are kept but never match
    pub fn build(candidates: Vec<GeoAddress>) -> Self {
        info!(
            "Building candidate index for {} addresses...",
            candidates.len()
        );

        let indexed: Vec<IndexedCandidate> = candidates
            .iter()
            .enumerate()
            .filter_map(|(slot, candidate)| IndexedCandidate::new(slot, candidate))
            .collect();
        let tree = RTree::bulk_load(indexed);

        info!(
            "Candidate index built with {} entries ({} skipped)",
            tree.size(),
            candidates.len() - tree.size()
        );

        Self { candidates, tree }
    }

    /// Closest candidate verifying within tolerance of `observed`
    pub fn best_match(
        &self,
        observed: &GeoCoordinates,
        options: &VerifyOptions,
    ) -> Option<&GeoAddress> {
        if !validate_coordinates(observed) {
            return None;
        }

        let reach = options.tolerance() + observed.accuracy.unwrap_or(0.0);
        let mut slots: Vec<usize> = search_envelopes(observed, reach)
            .iter()
            .flat_map(|envelope| self.tree.locate_in_envelope_intersecting(envelope))
            .map(|entry| entry.slot)
            .collect();

        // Insertion order keeps tie-breaking identical to a linear scan
        slots.sort_unstable();
        slots.dedup();

        debug!(
            "Candidate search within {:.1} m: {} of {} candidates in range",
            reach,
            slots.len(),
            self.len()
        );

        best_of(
            observed,
            slots.into_iter().map(|slot| &self.candidates[slot]),
            options,
        )
    }

    /// All candidates in insertion order
    pub fn candidates(&self) -> &[GeoAddress] {
        &self.candidates
    }

    /// Number of indexed (valid) candidates
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Lon/lat boxes covering every point within `reach_meters` of `center`.
///
/// Two boxes come back when the circle crosses the anti-meridian; a
/// circle around a pole covers every longitude.
fn search_envelopes(center: &GeoCoordinates, reach_meters: f64) -> Vec<AABB<[f64; 2]>> {
    let angular = reach_meters / EARTH_RADIUS_METERS * SEARCH_PADDING;
    let lat_offset = angular.to_degrees();
    let south = (center.latitude - lat_offset).max(-90.0);
    let north = (center.latitude + lat_offset).min(90.0);

    // Widest longitude reach of a small circle: asin(sin(d) / cos(lat))
    let ratio = angular.sin() / center.latitude.to_radians().cos();
    if angular >= FRAC_PI_2 || !ratio.is_finite() || ratio >= 1.0 || north >= 90.0 || south <= -90.0
    {
        return vec![AABB::from_corners([-180.0, south], [180.0, north])];
    }

    let lon_offset = ratio.asin().to_degrees();
    let west = center.longitude - lon_offset;
    let east = center.longitude + lon_offset;

    if west < -180.0 {
        vec![
            AABB::from_corners([west + 360.0, south], [180.0, north]),
            AABB::from_corners([-180.0, south], [east, north]),
        ]
    } else if east > 180.0 {
        vec![
            AABB::from_corners([west, south], [180.0, north]),
            AABB::from_corners([-180.0, south], [east - 360.0, north]),
        ]
    } else {
        vec![AABB::from_corners([west, south], [east, north])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::find_best_matching_address;
    use crate::models::GeoBounds;

    fn coord(latitude: f64, longitude: f64) -> GeoCoordinates {
        GeoCoordinates::unchecked(latitude, longitude)
    }

    fn address(pid: &str, latitude: f64, longitude: f64) -> GeoAddress {
        GeoAddress {
            pid: pid.to_string(),
            center: coord(latitude, longitude),
            bounds: None,
            verified: false,
            verified_at: None,
        }
    }

    /// Grid of candidates spaced ~50 m apart around a point
    fn grid(latitude: f64, longitude: f64) -> Vec<GeoAddress> {
        let step = 0.00045;
        let mut out = Vec::new();
        for i in -5i32..=5 {
            for j in -5i32..=5 {
                let lat = latitude + f64::from(i) * step;
                let lon = longitude + f64::from(j) * step;
                let lon = if lon > 180.0 { lon - 360.0 } else { lon };
                let lon = if lon < -180.0 { lon + 360.0 } else { lon };
                out.push(address(&format!("JP-{}-{}", i + 5, j + 5), lat, lon));
            }
        }
        out
    }

    #[test]
    fn test_matches_linear_scan() {
        let candidates = grid(35.6812, 139.7671);
        let index = CandidateIndex::build(candidates.clone());
        let options = VerifyOptions::default();

        for (dlat, dlon) in [(0.0, 0.0), (0.0002, 0.0001), (-0.0021, 0.0019), (0.01, 0.01)] {
            let observed = coord(35.6812 + dlat, 139.7671 + dlon);
            let linear = find_best_matching_address(&observed, &candidates, &options);
            let indexed = index.best_match(&observed, &options);
            assert_eq!(
                linear.map(|a| a.pid.as_str()),
                indexed.map(|a| a.pid.as_str()),
                "observed {:?}",
                observed
            );
        }
    }

    #[test]
    fn test_matches_across_date_line() {
        let candidates = grid(0.0, 179.9995);
        let index = CandidateIndex::build(candidates.clone());
        let options = VerifyOptions::with_tolerance(150.0);

        for longitude in [179.9999, -179.9999, 179.998, -179.998] {
            let observed = coord(0.0, longitude);
            let linear = find_best_matching_address(&observed, &candidates, &options);
            let indexed = index.best_match(&observed, &options);
            assert!(linear.is_some());
            assert_eq!(linear.map(|a| &a.pid), indexed.map(|a| &a.pid));
        }
    }

    #[test]
    fn test_bounds_only_candidate_is_found() {
        let mut district = address("JP-13-113", 35.66, 139.70);
        district.bounds = Some(GeoBounds {
            northeast: coord(35.70, 139.75),
            southwest: coord(35.64, 139.66),
        });
        let index = CandidateIndex::build(vec![district]);

        let observed = coord(35.69, 139.74);
        let best = index.best_match(&observed, &VerifyOptions::default());
        assert_eq!(best.map(|a| a.pid.as_str()), Some("JP-13-113"));
    }

    #[test]
    fn test_date_line_bounds_candidate_is_found() {
        let mut island = address("FJ-R-01", 0.0, 175.0);
        island.bounds = Some(GeoBounds {
            northeast: coord(10.0, -170.0),
            southwest: coord(-10.0, 170.0),
        });
        let candidates = vec![address("US-HI-1", 20.0, -157.0), island];
        let index = CandidateIndex::build(candidates.clone());
        let options = VerifyOptions::default();

        for longitude in [-175.0, 172.0, 180.0] {
            let observed = coord(0.0, longitude);
            let linear = find_best_matching_address(&observed, &candidates, &options);
            let indexed = index.best_match(&observed, &options);
            assert_eq!(indexed.map(|a| a.pid.as_str()), Some("FJ-R-01"));
            assert_eq!(linear.map(|a| &a.pid), indexed.map(|a| &a.pid));
        }

        assert!(index.best_match(&coord(0.0, -160.0), &options).is_none());
    }

    #[test]
    fn test_invalid_candidates_skipped() {
        let index = CandidateIndex::build(vec![
            address("XX-1", f64::NAN, 0.0),
            address("JP-13", 35.0, 139.0),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.candidates().len(), 2);
        assert!(index
            .best_match(&coord(f64::NAN, 0.0), &VerifyOptions::default())
            .is_none());
    }

    #[test]
    fn test_polar_search_covers_all_longitudes() {
        let envelopes = search_envelopes(&coord(89.9999, 0.0), 1_000.0);
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].lower()[0], -180.0);
        assert_eq!(envelopes[0].upper()[0], 180.0);
    }

    #[test]
    fn test_search_splits_at_date_line() {
        let envelopes = search_envelopes(&coord(0.0, 179.999), 1_000.0);
        assert_eq!(envelopes.len(), 2);
    }
}
