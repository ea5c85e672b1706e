//! Placeid - hierarchical address identifiers with geo-verification
//!
//! This library provides the PID codec, hierarchy utilities, the
//! geo-verification engine and the waybill payload builder shared by
//! the `pid-server` and `pidctl` binaries.

pub mod cache;
pub mod config;
pub mod geo;
pub mod models;
pub mod pid;
pub mod waybill;

pub use cache::ValidationCache;
pub use config::Config;
pub use models::{
    GeoAddress, GeoBounds, GeoCoordinates, NormalizedAddress, PidComponents, PidLevel,
    WaybillExtras, WaybillPayload,
};
pub use pid::{AddressPid, EncodeOptions, PidError};
pub use waybill::create_waybill_payload;
