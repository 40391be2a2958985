//! Fleet check execution.

use super::{CameraId, CameraOutcome, CameraStatus, FleetReport, SnapshotStore};
use crate::core::comparator::{ComparatorConfig, MatchResult, SceneComparator};
use crate::error::SceneCheckError;
use crate::events::{null_sender, EventSender, FleetEvent};
use chrono::Local;
use crossbeam_channel::RecvTimeoutError;
use rayon::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default per-camera time limit
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a fleet check
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Comparator settings applied to every camera
    pub comparator: ComparatorConfig,
    /// Time limit for loading and comparing one camera
    pub timeout: Duration,
    /// Check cameras on the rayon pool
    pub parallel: bool,
    /// Write diagnostic images back to the store
    pub save_diagnostics: bool,
    /// Cameras to check (None = every camera in the store)
    pub cameras: Option<Vec<CameraId>>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            comparator: ComparatorConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            parallel: true,
            save_diagnostics: true,
            cameras: None,
        }
    }
}

/// Builder for fleet checks
pub struct FleetCheckerBuilder {
    config: FleetConfig,
    store: Option<Arc<dyn SnapshotStore>>,
}

impl FleetCheckerBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: FleetConfig::default(),
            store: None,
        }
    }

    /// Set the snapshot store
    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the comparator configuration
    pub fn comparator(mut self, config: ComparatorConfig) -> Self {
        self.config.comparator = config;
        self
    }

    /// Set the per-camera time limit
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Check cameras in parallel (default) or one after another
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Save diagnostic images next to the test snapshots
    pub fn save_diagnostics(mut self, save: bool) -> Self {
        self.config.save_diagnostics = save;
        self
    }

    /// Restrict the run to these cameras
    pub fn cameras(mut self, cameras: Option<Vec<CameraId>>) -> Self {
        self.config.cameras = cameras;
        self
    }

    /// Build the checker
    pub fn build(self) -> Result<FleetChecker, SceneCheckError> {
        let store = self.store.ok_or_else(|| {
            SceneCheckError::Config(crate::error::ConfigError::Invalid {
                field: "store",
                reason: "a snapshot store is required".to_string(),
            })
        })?;
        self.config.comparator.validate()?;

        let mut comparator_config = self.config.comparator.clone();
        comparator_config.render_diagnostic = self.config.save_diagnostics;

        Ok(FleetChecker {
            comparator: Arc::new(SceneComparator::new(comparator_config)),
            config: self.config,
            store,
        })
    }
}

impl Default for FleetCheckerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks every camera of a fleet against its reference snapshot
pub struct FleetChecker {
    config: FleetConfig,
    store: Arc<dyn SnapshotStore>,
    comparator: Arc<SceneComparator>,
}

impl FleetChecker {
    /// Create a new checker builder
    pub fn builder() -> FleetCheckerBuilder {
        FleetCheckerBuilder::new()
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Run the check without events
    pub fn run(&self) -> Result<FleetReport, SceneCheckError> {
        self.run_with_events(&null_sender())
    }

    /// Run the check with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<FleetReport, SceneCheckError> {
        let started_at = Local::now();
        let start_time = Instant::now();

        let cameras = match &self.config.cameras {
            Some(cameras) => cameras.clone(),
            None => self.store.list_cameras()?,
        };

        tracing::info!(
            cameras = cameras.len(),
            parallel = self.config.parallel,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "starting fleet check"
        );
        events.send(FleetEvent::Started {
            total_cameras: cameras.len(),
        });

        let outcomes: Vec<CameraOutcome> = if self.config.parallel {
            cameras
                .par_iter()
                .map(|camera| self.check_camera(camera, events))
                .collect()
        } else {
            cameras
                .iter()
                .map(|camera| self.check_camera(camera, events))
                .collect()
        };

        let report = FleetReport::new(
            started_at,
            start_time.elapsed().as_millis() as u64,
            outcomes,
        );
        let summary = report.summary();

        tracing::info!(
            total = summary.total,
            suspect = summary.suspect,
            failed = summary.failed,
            timed_out = summary.timed_out,
            duration_ms = report.duration_ms,
            "fleet check finished"
        );
        events.send(FleetEvent::Completed { summary });

        Ok(report)
    }

    /// Check one camera under the time limit.
    ///
    /// Loading and comparing run on a helper thread. When the limit passes
    /// first, the helper is abandoned and its result dropped. Store writes
    /// happen here, only for results that arrived in time.
    fn check_camera(&self, camera: &CameraId, events: &EventSender) -> CameraOutcome {
        let start_time = Instant::now();
        events.send(FleetEvent::CameraStarted {
            camera: camera.clone(),
        });

        let (sender, receiver) = crossbeam_channel::bounded(1);
        let store = Arc::clone(&self.store);
        let comparator = Arc::clone(&self.comparator);
        let worker_camera = camera.clone();

        let spawned = thread::Builder::new()
            .name(format!("scene-check-{}", camera))
            .spawn(move || {
                let inspection = inspect_camera(store.as_ref(), &comparator, &worker_camera);
                let _ = sender.send(inspection);
            });

        let status = match spawned {
            Err(e) => CameraStatus::Failed {
                reason: format!("could not start worker: {}", e),
            },
            Ok(_) => match receiver.recv_timeout(self.config.timeout) {
                Ok(inspection) => self.settle(camera, inspection),
                Err(RecvTimeoutError::Timeout) => CameraStatus::TimedOut {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                },
                Err(RecvTimeoutError::Disconnected) => CameraStatus::Failed {
                    reason: "worker stopped without a result".to_string(),
                },
            },
        };

        match &status {
            CameraStatus::Bootstrapped => {
                tracing::info!(%camera, "no reference on file, saved test snapshot as reference");
                events.send(FleetEvent::ReferenceBootstrapped {
                    camera: camera.clone(),
                });
            }
            CameraStatus::Compared {
                verdict,
                good_matches,
                ..
            } => {
                tracing::debug!(%camera, %verdict, good_matches, "camera compared");
                events.send(FleetEvent::CameraCompared {
                    camera: camera.clone(),
                    verdict: *verdict,
                    good_matches: *good_matches,
                });
            }
            CameraStatus::Failed { reason } => {
                tracing::warn!(%camera, "camera check failed: {}", reason);
                events.send(FleetEvent::CameraFailed {
                    camera: camera.clone(),
                    reason: reason.clone(),
                });
            }
            CameraStatus::TimedOut { timeout_ms } => {
                tracing::warn!(%camera, timeout_ms, "camera check timed out");
                events.send(FleetEvent::CameraTimedOut {
                    camera: camera.clone(),
                    timeout_ms: *timeout_ms,
                });
            }
        }

        CameraOutcome {
            camera: camera.clone(),
            status,
            duration_ms: start_time.elapsed().as_millis() as u64,
        }
    }
}

/// What the helper thread found for one camera
enum Inspection {
    Done(CameraStatus),
    /// No reference on file; carries the test snapshot
    Unreferenced(Vec<u8>),
    Compared(MatchResult),
}

impl FleetChecker {
    /// Apply the store writes for an inspection that finished in time
    fn settle(&self, camera: &CameraId, inspection: Inspection) -> CameraStatus {
        match inspection {
            Inspection::Done(status) => status,
            Inspection::Unreferenced(candidate) => {
                match self.store.save_reference(camera, &candidate) {
                    Ok(()) => CameraStatus::Bootstrapped,
                    Err(e) => CameraStatus::Failed {
                        reason: e.to_string(),
                    },
                }
            }
            Inspection::Compared(result) => {
                if self.config.save_diagnostics {
                    if let Some(diagnostic) = &result.diagnostic {
                        if let Err(e) = self.store.save_diagnostic(camera, diagnostic) {
                            tracing::warn!(%camera, "could not save diagnostic: {}", e);
                        }
                    }
                }
                CameraStatus::Compared {
                    verdict: result.verdict,
                    good_matches: result.good_matches,
                    suspect_reason: result.suspect_reason,
                }
            }
        }
    }
}

/// Load and compare a single camera. Never writes to the store.
fn inspect_camera(
    store: &dyn SnapshotStore,
    comparator: &SceneComparator,
    camera: &CameraId,
) -> Inspection {
    let failed = |reason: String| Inspection::Done(CameraStatus::Failed { reason });

    let candidate = match store.load_candidate(camera) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return failed("no test snapshot".to_string()),
        Err(e) => return failed(e.to_string()),
    };

    let reference = match store.load_reference(camera) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Inspection::Unreferenced(candidate),
        Err(e) => return failed(e.to_string()),
    };

    match comparator.compare_encoded(&reference, &candidate) {
        Ok(result) => Inspection::Compared(result),
        Err(e) => failed(e.to_string()),
    }
}
