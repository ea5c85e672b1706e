//! Place ID (PID) codec and hierarchy utilities.
//!
//! A PID encodes the administrative nesting of an address, country
//! first, e.g. `JP-13-113-01-T07-B12-BN02-R342`, with an optional
//! `-C<NN>` suffix separating otherwise identical paths.

mod codec;
mod error;
mod hierarchy;

pub use codec::{
    collision_suffix, decode, encode, encode_address, is_collision_suffix, validate, AddressPid,
    EncodeOptions, PidValidation, MAX_COLLISION_COUNTER, PID_SEPARATOR,
};
pub use error::{PidError, PidErrorCode, PidIssue};
pub use hierarchy::{
    add_collision_counter, compare_hierarchy, depth, extract_path, is_parent,
    remove_collision_counter,
};
