//! Stable, deterministic identity derivation: the mapping from a
//! declarative `Coordinate` to the IDs a tenant API actually expects.

mod bucket;
mod coordinate;
mod external_id;
mod me_id;
mod numeric_id;
mod stable_uuid;

pub use bucket::bucket_name;
pub use coordinate::Coordinate;
pub use external_id::{
  ExternalIdError, generic_external_id, settings_external_id,
};
pub use me_id::is_me_id;
pub use numeric_id::{NumericIdError, decode_numeric_id};
pub use stable_uuid::{DYNATRACE_NAMESPACE, uuid_from_coordinate, uuid_from_string};
