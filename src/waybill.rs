//! Waybill payload builder.

use tracing::warn;

use crate::models::{WaybillExtras, WaybillPayload};
use crate::pid::{validate, PidError};

/// Stamp a PID and parcel metadata into a waybill payload.
///
/// The PID is validated again on every call, whatever the caller checked
/// before. Failure carries every structural issue found.
pub fn create_waybill_payload(
    waybill_id: impl Into<String>,
    pid: &str,
    extras: WaybillExtras,
) -> Result<WaybillPayload, PidError> {
    let validation = validate(pid);
    if !validation.valid {
        warn!(
            "Refusing waybill for invalid PID '{}' ({} issues)",
            pid,
            validation.errors.len()
        );
        return Err(PidError::Invalid(validation.errors));
    }

    Ok(WaybillPayload {
        waybill_id: waybill_id.into(),
        addr_pid: pid.to_ascii_uppercase(),
        extras,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pid::PidErrorCode;

    #[test]
    fn test_payload_uppercases_pid() {
        let payload =
            create_waybill_payload("WB-0001", "jp-13-113-c01", WaybillExtras::default()).unwrap();
        assert_eq!(payload.waybill_id, "WB-0001");
        assert_eq!(payload.addr_pid, "JP-13-113-C01");
    }

    #[test]
    fn test_invalid_pid_lists_issues() {
        let err = create_waybill_payload("WB1", "INVALID", WaybillExtras::default()).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].code, PidErrorCode::InvalidCountryCode);

        let message = err.to_string();
        assert!(message.starts_with("Invalid PID: "), "{}", message);
        assert!(message.contains("ISO 3166-1 alpha-2"), "{}", message);
    }

    #[test]
    fn test_every_issue_reported() {
        let err = create_waybill_payload("WB1", "JPN--113-", WaybillExtras::default()).unwrap_err();
        assert!(err.issues().len() >= 3, "{:?}", err.issues());
    }

    #[test]
    fn test_empty_pid_rejected() {
        let err = create_waybill_payload("WB1", "", WaybillExtras::default()).unwrap_err();
        assert_eq!(err.issues()[0].code, PidErrorCode::EmptyPid);
    }

    #[test]
    fn test_json_shape() {
        let extras = WaybillExtras {
            parcel_weight: Some(1.5),
            parcel_size: Some("M".to_string()),
            carrier_zone: None,
            zkp: None,
            sig: Some("abc".to_string()),
        };
        let payload = create_waybill_payload("WB1", "JP-13-113", extras).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "waybill_id": "WB1",
                "addr_pid": "JP-13-113",
                "parcel_weight": 1.5,
                "parcel_size": "M",
                "sig": "abc",
            })
        );
    }
}
