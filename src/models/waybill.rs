//! Shipping label payload carrying an address PID.

use serde::{Deserialize, Serialize};

/// Optional parcel metadata stamped next to the PID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaybillExtras {
    /// Parcel weight in kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcel_weight: Option<f64>,

    /// Parcel size code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcel_size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_zone: Option<String>,

    /// ZK proof blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zkp: Option<String>,

    /// Signature over the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

/// Waybill payload (QR / label body).
///
/// Built only by [`crate::waybill::create_waybill_payload`], which
/// guarantees `addr_pid` is a structurally valid PID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaybillPayload {
    pub waybill_id: String,

    pub addr_pid: String,

    #[serde(flatten)]
    pub extras: WaybillExtras,
}

impl WaybillPayload {
    /// Compact JSON form used on labels
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
