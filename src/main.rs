//! # scene-check CLI
//!
//! Command-line interface for the camera scene checker.
//!
//! ## Usage
//! ```bash
//! scene-check check --root /srv/cameras --notify
//! scene-check pair before.jpg after.jpg --diagnostic matches.jpg
//! ```

mod cli;

use camera_scene_check::Result;

fn main() -> Result<()> {
    cli::run()
}
