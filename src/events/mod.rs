//! # Events Module
//!
//! Progress reporting for fleet runs.
//!
//! ## Design
//! Workers emit events through a channel, so the CLI (or any other front
//! end) can show progress without the core knowing about terminals.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let FleetEvent::CameraCompared { camera, verdict, .. } = event {
//!             println!("{}: {}", camera, verdict);
//!         }
//!     }
//! });
//!
//! checker.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::FleetEvent;
