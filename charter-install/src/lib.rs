//! Install lifecycle driver for the Charter install console.
//!
//! Accepting a license creates the app record and immediately drives the
//! install as far as the deployment allows: online installs materialize
//! manifests from the upstream source in the same invocation, airgap
//! installs park in `AirgapPendingAssets` until the bundle arrives.
//!
//! The deployment machinery sits behind two trait seams,
//! [`Materializer`] and [`RegistryProbe`], so the state machine can be
//! exercised without a cluster.

mod driver;
mod error;
mod registry;
mod upstream;

pub use driver::{AcceptOutcome, InstallDriver, ResumeOutcome};
pub use error::{InstallError, InstallResult};
pub use registry::RegistryProbe;
pub use upstream::{ManifestSet, Materializer};
