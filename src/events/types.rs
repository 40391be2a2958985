//! Event type definitions for progress reporting.

use crate::core::comparator::SceneVerdict;
use crate::core::fleet::{CameraId, FleetSummary};
use serde::{Deserialize, Serialize};

/// All events emitted while checking a fleet of cameras
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FleetEvent {
    /// The run has started
    Started { total_cameras: usize },
    /// Work on one camera has started
    CameraStarted { camera: CameraId },
    /// No reference existed, the test snapshot became the reference
    ReferenceBootstrapped { camera: CameraId },
    /// A comparison finished with a verdict
    CameraCompared {
        camera: CameraId,
        verdict: SceneVerdict,
        good_matches: usize,
    },
    /// The camera could not be checked
    CameraFailed { camera: CameraId, reason: String },
    /// The camera did not finish in time
    CameraTimedOut { camera: CameraId, timeout_ms: u64 },
    /// The run finished
    Completed { summary: FleetSummary },
}

impl FleetEvent {
    /// True for events that end the work on one camera
    pub fn finishes_camera(&self) -> bool {
        matches!(
            self,
            FleetEvent::ReferenceBootstrapped { .. }
                | FleetEvent::CameraCompared { .. }
                | FleetEvent::CameraFailed { .. }
                | FleetEvent::CameraTimedOut { .. }
        )
    }
}
