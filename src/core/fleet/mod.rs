//! # Fleet Module
//!
//! Runs the scene check across every camera of a fleet.
//!
//! ## How It Works
//! 1. **Resolve** - explicit camera list, or every test snapshot in the store
//! 2. **Bootstrap** - a camera without a reference gets its test snapshot
//!    saved as the reference, no comparison is made
//! 3. **Compare** - reference vs test snapshot, under a per-camera timeout
//! 4. **Report** - outcomes sorted by camera, suspects and failures apart
//!
//! ## Parallelism
//! Cameras are checked on the rayon pool. Each camera's work runs on a helper
//! thread so a hung decode or store read cannot stall the run past the
//! timeout.

mod camera;
mod executor;
mod report;
mod store;

pub use camera::CameraId;
pub use executor::{FleetChecker, FleetCheckerBuilder, FleetConfig, DEFAULT_TIMEOUT};
pub use report::{CameraOutcome, CameraStatus, FleetReport, FleetSummary};
pub use store::{promote_candidate, DirectoryStore, SnapshotStore, DIAGNOSTIC_SUFFIX};
