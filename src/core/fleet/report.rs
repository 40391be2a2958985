//! Per-run results.

use super::CameraId;
use crate::core::comparator::{SceneVerdict, SuspectReason};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to one camera during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CameraStatus {
    /// No reference existed; the test snapshot became the reference
    Bootstrapped,
    /// The comparison produced a verdict
    Compared {
        verdict: SceneVerdict,
        good_matches: usize,
        suspect_reason: Option<SuspectReason>,
    },
    /// Snapshots were missing or unusable
    Failed { reason: String },
    /// The camera did not finish within the timeout
    TimedOut { timeout_ms: u64 },
}

impl CameraStatus {
    pub fn is_suspect(&self) -> bool {
        matches!(
            self,
            CameraStatus::Compared {
                verdict: SceneVerdict::Suspect,
                ..
            }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CameraStatus::Failed { .. } | CameraStatus::TimedOut { .. })
    }
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraStatus::Bootstrapped => write!(f, "reference created"),
            CameraStatus::Compared {
                verdict,
                good_matches,
                ..
            } => write!(f, "{} ({} good matches)", verdict, good_matches),
            CameraStatus::Failed { reason } => write!(f, "failed: {}", reason),
            CameraStatus::TimedOut { timeout_ms } => {
                write!(f, "timed out after {:.1}s", *timeout_ms as f64 / 1000.0)
            }
        }
    }
}

/// Result for a single camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraOutcome {
    pub camera: CameraId,
    pub status: CameraStatus,
    /// Wall time spent on this camera
    pub duration_ms: u64,
}

/// Counts per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total: usize,
    pub stable: usize,
    pub suspect: usize,
    pub bootstrapped: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// Results of one fleet check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub duration_ms: u64,
    /// Sorted by camera id
    pub outcomes: Vec<CameraOutcome>,
}

impl FleetReport {
    pub fn new(started_at: DateTime<Local>, duration_ms: u64, mut outcomes: Vec<CameraOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.camera.cmp(&b.camera));
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            duration_ms,
            outcomes,
        }
    }

    /// Cameras whose scene changed
    pub fn suspects(&self) -> impl Iterator<Item = &CameraOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_suspect())
    }

    /// Cameras that could not be checked
    pub fn failures(&self) -> impl Iterator<Item = &CameraOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    pub fn summary(&self) -> FleetSummary {
        let mut summary = FleetSummary {
            total: self.outcomes.len(),
            ..FleetSummary::default()
        };
        for outcome in &self.outcomes {
            match &outcome.status {
                CameraStatus::Bootstrapped => summary.bootstrapped += 1,
                CameraStatus::Compared { verdict, .. } => match verdict {
                    SceneVerdict::Stable => summary.stable += 1,
                    SceneVerdict::Suspect => summary.suspect += 1,
                },
                CameraStatus::Failed { .. } => summary.failed += 1,
                CameraStatus::TimedOut { .. } => summary.timed_out += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, status: CameraStatus) -> CameraOutcome {
        CameraOutcome {
            camera: CameraId::new(id).unwrap(),
            status,
            duration_ms: 5,
        }
    }

    fn compared(verdict: SceneVerdict, good_matches: usize) -> CameraStatus {
        CameraStatus::Compared {
            verdict,
            good_matches,
            suspect_reason: verdict
                .is_suspect()
                .then_some(SuspectReason::TooFewMatches),
        }
    }

    fn sample_report() -> FleetReport {
        FleetReport::new(
            Local::now(),
            100,
            vec![
                outcome("d", CameraStatus::TimedOut { timeout_ms: 60_000 }),
                outcome("b", compared(SceneVerdict::Suspect, 3)),
                outcome("a", compared(SceneVerdict::Stable, 40)),
                outcome("c", CameraStatus::Bootstrapped),
                outcome(
                    "e",
                    CameraStatus::Failed {
                        reason: "no test snapshot".to_string(),
                    },
                ),
            ],
        )
    }

    #[test]
    fn outcomes_are_sorted_by_camera() {
        let report = sample_report();
        let ids: Vec<_> = report.outcomes.iter().map(|o| o.camera.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn summary_counts_each_status() {
        let summary = sample_report().summary();
        assert_eq!(
            summary,
            FleetSummary {
                total: 5,
                stable: 1,
                suspect: 1,
                bootstrapped: 1,
                failed: 1,
                timed_out: 1,
            }
        );
    }

    #[test]
    fn failures_are_never_suspects() {
        let report = sample_report();
        let suspects: Vec<_> = report.suspects().map(|o| o.camera.as_str()).collect();
        let failures: Vec<_> = report.failures().map(|o| o.camera.as_str()).collect();
        assert_eq!(suspects, vec!["b"]);
        assert_eq!(failures, vec!["d", "e"]);
    }

    #[test]
    fn sub_second_timeout_is_not_reported_as_zero() {
        let status = CameraStatus::TimedOut { timeout_ms: 300 };
        assert_eq!(status.to_string(), "timed out after 0.3s");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["timeout_ms"], 300);
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_value(compared(SceneVerdict::Stable, 12)).unwrap();
        assert_eq!(json["status"], "compared");
        assert_eq!(json["good_matches"], 12);
    }
}
