//! Core data models for PIDs, coordinates and waybills.

pub mod address;
pub mod geo;
pub mod hierarchy;
pub mod waybill;

pub use address::NormalizedAddress;
pub use geo::{GeoAddress, GeoBounds, GeoCoordinates, GeoSource};
pub use hierarchy::{PidComponents, PidLevel};
pub use waybill::{WaybillExtras, WaybillPayload};
