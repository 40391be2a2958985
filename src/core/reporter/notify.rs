//! Suspect camera notifications.

use crate::core::fleet::{CameraStatus, FleetReport};
use crate::error::NotifyError;
use chrono::{DateTime, TimeZone};
use std::io::Write;
use std::sync::Mutex;

/// Delivers the suspect-camera report of a run
pub trait Notifier: Send + Sync {
    fn notify(&self, report: &FleetReport) -> Result<(), NotifyError>;
}

/// Render the chat-style suspect message.
///
/// Returns `None` when no camera is suspect, so nothing gets sent.
///
/// ```text
/// Camera scene check:  Sat Oct 17, 09:30 AM. 
/// gate : suspect (3 good matches)
/// ```
pub fn render_markdown<Tz>(prefix: &str, report: &FleetReport, now: &DateTime<Tz>) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut suspects = report.suspects().peekable();
    suspects.peek()?;

    let mut message = format!("{}:  {}. ", prefix, now.format("%a %b %d, %I:%M %p"));
    for outcome in suspects {
        if let CameraStatus::Compared { good_matches, .. } = outcome.status {
            message.push_str(&format!(
                "\n{} : suspect ({} good matches)",
                outcome.camera, good_matches
            ));
        }
    }
    Some(message)
}

/// Writes the suspect message to any writer (stdout, a file, a pipe to a
/// chat client)
pub struct MarkdownNotifier<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> MarkdownNotifier<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Notifier for MarkdownNotifier<W> {
    fn notify(&self, report: &FleetReport) -> Result<(), NotifyError> {
        let Some(message) = render_markdown(&self.prefix, report, &chrono::Local::now()) else {
            tracing::debug!("no suspect cameras, nothing to send");
            return Ok(());
        };

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(writer, "{}", message)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::{SceneVerdict, SuspectReason};
    use crate::core::fleet::{CameraId, CameraOutcome};
    use chrono::{Local, Utc};

    fn report(statuses: Vec<(&str, CameraStatus)>) -> FleetReport {
        FleetReport::new(
            Local::now(),
            10,
            statuses
                .into_iter()
                .map(|(id, status)| CameraOutcome {
                    camera: CameraId::new(id).unwrap(),
                    status,
                    duration_ms: 1,
                })
                .collect(),
        )
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

    #[test]
    fn message_lists_suspects_in_camera_order() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
        let report = report(vec![
            ("yard", compared(SceneVerdict::Suspect, 7)),
            ("gate", compared(SceneVerdict::Suspect, 3)),
            ("lobby", compared(SceneVerdict::Stable, 80)),
            (
                "roof",
                CameraStatus::Failed {
                    reason: "no test snapshot".to_string(),
                },
            ),
        ]);

        let message = render_markdown("Camera scene check", &report, &now).unwrap();

        assert_eq!(
            message,
            "Camera scene check:  Sat Oct 17, 09:30 AM. \
             \ngate : suspect (3 good matches)\
             \nyard : suspect (7 good matches)"
        );
    }

    #[test]
    fn no_suspects_renders_nothing() {
        let report = report(vec![("lobby", compared(SceneVerdict::Stable, 80))]);
        assert!(render_markdown("x", &report, &Utc::now()).is_none());
    }

    #[test]
    fn notifier_writes_only_when_suspects_exist() {
        let quiet = MarkdownNotifier::new("Check", Vec::new());
        quiet
            .notify(&report(vec![("a", CameraStatus::Bootstrapped)]))
            .unwrap();
        assert!(quiet.into_inner().is_empty());

        let loud = MarkdownNotifier::new("Check", Vec::new());
        loud.notify(&report(vec![("a", compared(SceneVerdict::Suspect, 0))]))
            .unwrap();
        let text = String::from_utf8(loud.into_inner()).unwrap();
        assert!(text.starts_with("Check:  "));
        assert!(text.contains("\na : suspect (0 good matches)\n"));
    }
}
