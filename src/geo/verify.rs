//! Geo-insurance: checking a claimed address against an observed point.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::math::{calculate_distance, is_within_bounds, validate_bounds, validate_coordinates};
use crate::models::{GeoAddress, GeoCoordinates};

/// Default tolerance for geo-verification
pub const DEFAULT_TOLERANCE_METERS: f64 = 100.0;

/// Beyond this many tolerances confidence is zero
const CONFIDENCE_CUTOFF: f64 = 3.0;

/// Verification options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    /// Allowed distance between the observed point and the address
    /// center. The observed accuracy radius is added on top when
    /// deciding `within_tolerance`; confidence decays against this
    /// value alone.
    pub tolerance_meters: f64,

    /// Extra bar on center-based verdicts: `valid` also requires
    /// `confidence >= min_confidence`. Zero disables it.
    pub min_confidence: f64,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            tolerance_meters: DEFAULT_TOLERANCE_METERS,
            min_confidence: 0.0,
        }
    }
}

impl VerifyOptions {
    pub fn with_tolerance(tolerance_meters: f64) -> Self {
        Self {
            tolerance_meters,
            ..Default::default()
        }
    }

    /// Tolerance with negative and non-finite values treated as zero
    pub(crate) fn tolerance(&self) -> f64 {
        if self.tolerance_meters.is_finite() {
            self.tolerance_meters.max(0.0)
        } else {
            0.0
        }
    }
}

/// How a verdict was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// Observed point fell inside the address bounds
    Bounds,
    /// Distance to the address center
    Center,
}

/// Result of a geo-verification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoVerification {
    pub valid: bool,
    pub within_tolerance: bool,
    /// Meters from the observed point to the address center; absent
    /// when the input could not be checked at all
    pub distance: Option<f64>,
    /// Score in [0, 1]
    pub confidence: f64,
    pub method: VerificationMethod,
}

impl GeoVerification {
    fn rejected() -> Self {
        Self {
            valid: false,
            within_tolerance: false,
            distance: None,
            confidence: 0.0,
            method: VerificationMethod::Center,
        }
    }
}

/// Confidence for a distance: `exp(-distance / tolerance)`.
///
/// Exactly 1.0 at distance zero and 0 from `3 × tolerance` on.
pub fn calculate_confidence(distance: f64, tolerance: f64) -> f64 {
    if distance <= 0.0 {
        return 1.0;
    }
    if distance >= tolerance * CONFIDENCE_CUTOFF {
        return 0.0;
    }
    (-distance / tolerance).exp().clamp(0.0, 1.0)
}

/// Verify that `observed` supports the claimed address.
///
/// Invalid input never errors: it comes back with `valid: false`,
/// confidence 0 and no distance.
pub fn verify_address_with_geo(
    address: &GeoAddress,
    observed: &GeoCoordinates,
    options: &VerifyOptions,
) -> GeoVerification {
    if !validate_coordinates(observed) || !validate_coordinates(&address.center) {
        debug!("Rejecting verification for {}: invalid coordinates", address.pid);
        return GeoVerification::rejected();
    }

    let distance = calculate_distance(observed, &address.center);

    if let Some(ref bounds) = address.bounds {
        if validate_bounds(bounds) && is_within_bounds(observed, bounds) {
            debug!("{} verified by bounds ({:.1} m from center)", address.pid, distance);
            return GeoVerification {
                valid: true,
                within_tolerance: true,
                distance: Some(distance),
                confidence: 1.0,
                method: VerificationMethod::Bounds,
            };
        }
    }

    let tolerance = options.tolerance();
    let effective_tolerance = tolerance + observed.accuracy.unwrap_or(0.0);
    let within_tolerance = distance <= effective_tolerance;
    let confidence = calculate_confidence(distance, tolerance);
    let valid = within_tolerance && confidence >= options.min_confidence;

    debug!(
        "{} center check: {:.1} m (tolerance {:.1} m), confidence {:.3}, valid={}",
        address.pid, distance, effective_tolerance, confidence, valid
    );

    GeoVerification {
        valid,
        within_tolerance,
        distance: Some(distance),
        confidence,
        method: VerificationMethod::Center,
    }
}

/// Closest candidate that verifies within tolerance.
///
/// Candidates with invalid centers are skipped. Ties keep the earlier
/// candidate.
pub fn find_best_matching_address<'a>(
    observed: &GeoCoordinates,
    candidates: &'a [GeoAddress],
    options: &VerifyOptions,
) -> Option<&'a GeoAddress> {
    if !validate_coordinates(observed) {
        return None;
    }

    best_of(observed, candidates.iter(), options)
}

/// Shared selection rule for linear scans and index lookups
pub(crate) fn best_of<'a>(
    observed: &GeoCoordinates,
    candidates: impl Iterator<Item = &'a GeoAddress>,
    options: &VerifyOptions,
) -> Option<&'a GeoAddress> {
    let mut best: Option<(&GeoAddress, f64)> = None;

    for candidate in candidates {
        if !validate_coordinates(&candidate.center) {
            continue;
        }

        let verdict = verify_address_with_geo(candidate, observed, options);
        let Some(distance) = verdict.distance else {
            continue;
        };
        if !verdict.within_tolerance {
            continue;
        }

        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(candidate, _)| candidate)
}

/// Verify many (address, observation) pairs in parallel
pub fn verify_batch(
    claims: &[(GeoAddress, GeoCoordinates)],
    options: &VerifyOptions,
) -> Vec<GeoVerification> {
    claims
        .par_iter()
        .map(|(address, observed)| verify_address_with_geo(address, observed, options))
        .collect()
}
