//! # Reporter Module
//!
//! Shows WHY a camera was flagged and tells someone about it.
//!
//! Operators need to see the evidence before they walk out to a camera:
//! the diagnostic image puts reference and test snapshot side by side with
//! every surviving match drawn in.
//!
//! ## Outputs
//! 1. **Diagnostic image**: side-by-side canvas with matched keypoints
//! 2. **Summary line**: "42 of 310 reference features matched (13.5%)"
//! 3. **Notification**: one message per run listing suspect cameras

mod notify;
mod visualization;

pub use notify::{render_markdown, MarkdownNotifier, Notifier};
pub use visualization::{MatchVisualizer, MAX_CANVAS_PIXELS};
