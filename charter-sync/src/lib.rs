//! License reconciliation engine for the Charter install console.
//!
//! Keeps an installed app's license in step with the licensing authority.
//! The authority is polled over HTTPS at the endpoint named inside the
//! license itself; the response is a complete signed document that must
//! pass the same verification as an operator upload before any field of
//! it is honored.
//!
//! Reconciliation is last-writer-wins on the license sequence: the fetched
//! document replaces the local one only when its sequence is strictly
//! higher. Airgapped deployments skip the fetch entirely and run on the
//! verified local document.
//!
//! # Example
//!
//! ```
//! use charter_license::LicenseVerifier;
//! use charter_sync::{LicenseSyncer, SyncConfig};
//!
//! let syncer = LicenseSyncer::new(LicenseVerifier::default(), SyncConfig::default());
//! ```

mod error;
mod syncer;

pub use error::{SyncError, SyncResult};
pub use syncer::{LicenseSyncer, SyncConfig};
