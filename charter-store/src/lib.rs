//! App install persistence for Charter.
//!
//! A single SQLite table holds the app record created when a license is
//! accepted, together with the raw license document blob (never the
//! parsed form, so resumed installs reparse from source). The UNIQUE
//! slug constraint provides the serialization guarantee duplicate
//! submissions rely on.

mod error;
mod store;

pub use error::{StoreError, StoreResult};
pub use store::Store;
