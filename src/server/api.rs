//! Request and response shapes for the PID service, plus the work
//! behind each endpoint.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use placeid::geo::{
    find_best_matching_address, verify_address_with_geo, CandidateIndex, GeoVerification,
    VerifyOptions,
};
use placeid::models::{
    GeoAddress, GeoCoordinates, NormalizedAddress, PidComponents, WaybillExtras, WaybillPayload,
};
use placeid::pid::{compare_hierarchy, decode, encode_address, is_parent, EncodeOptions, PidError};
use placeid::waybill::create_waybill_payload;
use placeid::ValidationCache;

/// Candidate lists at least this long are searched through an R-tree
const INDEX_THRESHOLD: usize = 64;

#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    #[serde(flatten)]
    pub address: NormalizedAddress,
    /// Collision counter (1-99)
    #[serde(default)]
    pub collision_counter: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub pid: String,
    pub depth: usize,
    pub components: PidComponents,
}

pub fn execute_encode(request: EncodeRequest) -> Result<EncodeResponse, PidError> {
    let options = EncodeOptions {
        collision_counter: request.collision_counter,
    };
    let pid = encode_address(&request.address, &options)?;
    let components = decode(&pid)?;
    debug!("Encoded {}", pid);

    Ok(EncodeResponse {
        pid,
        depth: components.depth(),
        components,
    })
}

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    pub pid: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CompareResponse {
    /// Number of leading levels the two PIDs share
    pub common_depth: usize,
    pub a_contains_b: bool,
    pub b_contains_a: bool,
}

pub fn execute_compare(params: &CompareParams) -> CompareResponse {
    CompareResponse {
        common_depth: compare_hierarchy(&params.a, &params.b),
        a_contains_b: is_parent(&params.a, &params.b),
        b_contains_a: is_parent(&params.b, &params.a),
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub address: GeoAddress,
    pub observed: GeoCoordinates,
    /// Overrides the server's configured options
    #[serde(default)]
    pub options: Option<VerifyOptions>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    #[serde(flatten)]
    pub verification: GeoVerification,
    /// Whether the claimed PID is structurally valid
    pub pid_valid: bool,
    /// The address stamped as verified; only for a valid PID that passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<GeoAddress>,
}

pub fn execute_verify(
    request: VerifyRequest,
    defaults: &VerifyOptions,
    cache: &ValidationCache,
) -> VerifyResponse {
    let options = request.options.unwrap_or(*defaults);
    let pid_valid = cache.validate(&request.address.pid).valid;
    let verification = verify_address_with_geo(&request.address, &request.observed, &options);
    debug!(
        "Verified {}: pid_valid={} valid={} confidence={:.3}",
        request.address.pid, pid_valid, verification.valid, verification.confidence
    );

    VerifyResponse {
        verification,
        pid_valid,
        address: (pid_valid && verification.valid)
            .then(|| request.address.mark_verified(Utc::now())),
    }
}

#[derive(Debug, Deserialize)]
pub struct NearestRequest {
    pub observed: GeoCoordinates,
    pub candidates: Vec<GeoAddress>,
    #[serde(default)]
    pub options: Option<VerifyOptions>,
}

#[derive(Debug, Serialize)]
pub struct NearestResponse {
    pub best: Option<GeoAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<GeoVerification>,
}

pub fn execute_nearest(request: NearestRequest, defaults: &VerifyOptions) -> NearestResponse {
    let options = request.options.unwrap_or(*defaults);
    let observed = request.observed;

    let best = if request.candidates.len() >= INDEX_THRESHOLD {
        let index = CandidateIndex::build(request.candidates);
        index.best_match(&observed, &options).cloned()
    } else {
        find_best_matching_address(&observed, &request.candidates, &options).cloned()
    };

    let verification = best
        .as_ref()
        .map(|address| verify_address_with_geo(address, &observed, &options));

    NearestResponse { best, verification }
}

#[derive(Debug, Deserialize)]
pub struct WaybillRequest {
    pub waybill_id: String,
    pub pid: String,
    #[serde(flatten)]
    pub extras: WaybillExtras,
}

pub fn execute_waybill(request: WaybillRequest) -> Result<WaybillPayload, PidError> {
    create_waybill_payload(request.waybill_id, &request.pid, request.extras)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(pid: &str, latitude: f64, longitude: f64) -> GeoAddress {
        serde_json::from_value(json!({
            "pid": pid,
            "center": { "latitude": latitude, "longitude": longitude },
        }))
        .unwrap()
    }

    #[test]
    fn test_encode_request() {
        let request: EncodeRequest = serde_json::from_value(json!({
            "countryCode": "jp",
            "admin1": "13",
            "admin2": "113",
            "collision_counter": 2,
        }))
        .unwrap();

        let response = execute_encode(request).unwrap();
        assert_eq!(response.pid, "JP-13-113-C02");
        assert_eq!(response.depth, 3);
    }

    #[test]
    fn test_encode_rejects_bad_counter() {
        let request: EncodeRequest = serde_json::from_value(json!({
            "country_code": "JP",
            "collision_counter": 100,
        }))
        .unwrap();

        let err = execute_encode(request).unwrap_err();
        assert_eq!(err, PidError::InvalidCollisionCounter(100));
    }

    #[test]
    fn test_compare() {
        let response = execute_compare(&CompareParams {
            a: "JP-13".to_string(),
            b: "JP-13-113-01".to_string(),
        });
        assert_eq!(
            response,
            CompareResponse {
                common_depth: 2,
                a_contains_b: true,
                b_contains_a: false,
            }
        );
    }

    #[test]
    fn test_verify_stamps_valid_address() {
        let request: VerifyRequest = serde_json::from_value(json!({
            "address": { "pid": "JP-13-113", "center": { "latitude": 35.6812, "longitude": 139.7671 } },
            "observed": { "latitude": 35.6813, "longitude": 139.7671 },
        }))
        .unwrap();

        let response =
            execute_verify(request, &VerifyOptions::default(), &ValidationCache::new());
        assert!(response.verification.valid);
        assert!(response.pid_valid);
        let address = response.address.unwrap();
        assert!(address.verified);
        assert!(address.verified_at.is_some());
    }

    #[test]
    fn test_verify_far_point() {
        let request: VerifyRequest = serde_json::from_value(json!({
            "address": { "pid": "JP-13-113", "center": { "latitude": 35.6812, "longitude": 139.7671 } },
            "observed": { "latitude": 34.6937, "longitude": 135.5023 },
            "options": { "tolerance_meters": 500.0 },
        }))
        .unwrap();

        let response =
            execute_verify(request, &VerifyOptions::default(), &ValidationCache::new());
        assert!(!response.verification.valid);
        assert!(response.address.is_none());
    }

    #[test]
    fn test_verify_does_not_stamp_invalid_pid() {
        let request: VerifyRequest = serde_json::from_value(json!({
            "address": { "pid": "NOT A PID!!", "center": { "latitude": 35.6812, "longitude": 139.7671 } },
            "observed": { "latitude": 35.6812, "longitude": 139.7671 },
        }))
        .unwrap();

        let cache = ValidationCache::new();
        let response = execute_verify(request, &VerifyOptions::default(), &cache);
        assert!(response.verification.valid);
        assert!(!response.pid_valid);
        assert!(response.address.is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_nearest_small_and_indexed_agree() {
        let observed = GeoCoordinates::new(35.0, 139.0).unwrap();
        let near = candidate("JP-13-1", 35.0003, 139.0);
        let nearer = candidate("JP-13-2", 35.0001, 139.0);

        let small = execute_nearest(
            NearestRequest {
                observed,
                candidates: vec![near.clone(), nearer.clone()],
                options: None,
            },
            &VerifyOptions::default(),
        );
        assert_eq!(small.best.as_ref().map(|a| a.pid.as_str()), Some("JP-13-2"));

        let mut many: Vec<GeoAddress> = (0..INDEX_THRESHOLD)
            .map(|i| candidate(&format!("JP-40-{}", i), 33.0 + i as f64 * 0.01, 130.0))
            .collect();
        many.push(near);
        many.push(nearer);
        let indexed = execute_nearest(
            NearestRequest {
                observed,
                candidates: many,
                options: None,
            },
            &VerifyOptions::default(),
        );
        assert_eq!(indexed.best.map(|a| a.pid), Some("JP-13-2".to_string()));
        assert!(indexed.verification.unwrap().within_tolerance);
    }

    #[test]
    fn test_waybill_request() {
        let request: WaybillRequest = serde_json::from_value(json!({
            "waybill_id": "WB1",
            "pid": "jp-13-113",
            "parcel_size": "S",
        }))
        .unwrap();
        let payload = execute_waybill(request).unwrap();
        assert_eq!(payload.addr_pid, "JP-13-113");
        assert_eq!(payload.extras.parcel_size.as_deref(), Some("S"));

        let bad: WaybillRequest = serde_json::from_value(json!({
            "waybill_id": "WB1",
            "pid": "INVALID",
        }))
        .unwrap();
        assert!(execute_waybill(bad).is_err());
    }
}
