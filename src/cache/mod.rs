//! Cache Module
//!
//! Provides filesystem-backed caching with expiry and optional gzip envelopes.

mod path;
mod record;
mod store;
mod value;


// Re-export public types
pub use path::{path_for_key, transform_key};
pub use record::{
    current_timestamp, is_gzip, resolve_expiry, CacheRecord, NEVER_EXPIRE_SECS,
    RELATIVE_EXPIRY_LIMIT,
};
pub use store::{read, store, FileCache};
pub use value::CacheValue;

// == Public Constants ==
/// Marker file name that `flush` never deletes
pub const KEEP_FILE_NAME: &str = ".keep";
