//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry Cleanup: Removes expired cache files at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
