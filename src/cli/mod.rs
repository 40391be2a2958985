//! # CLI Module
//!
//! Command-line interface for the camera scene checker.
//!
//! ## Usage
//! ```bash
//! # Check every camera with a test snapshot under the configured root
//! scene-check check
//!
//! # Only two cameras, stricter matching, JSON output
//! scene-check check lobby gate --ratio 0.5 --output json
//!
//! # Print the suspect message for the chat room
//! scene-check check --notify
//!
//! # Look at one camera in detail
//! scene-check compare lobby --verbose
//!
//! # Compare any two image files
//! scene-check pair before.jpg after.jpg --diagnostic matches.jpg
//!
//! # Accept the current view of a moved camera as its new reference
//! scene-check rebaseline lobby
//! ```

use camera_scene_check::core::comparator::{ComparatorConfig, MatchResult, SceneComparator, SceneVerdict};
use camera_scene_check::core::config::MonitorConfig;
use camera_scene_check::core::fleet::{
    promote_candidate, CameraId, CameraStatus, FleetChecker, FleetReport, SnapshotStore,
};
use camera_scene_check::core::reporter::{MarkdownNotifier, MatchVisualizer, Notifier};
use camera_scene_check::error::{Result, StoreError};
use camera_scene_check::events::{EventChannel, FleetEvent};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Camera Scene Check - notice when a camera stops seeing what it should
#[derive(Parser, Debug)]
#[command(name = "scene-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads the config file
#[derive(Args, Debug)]
struct CommonArgs {
    /// Config file (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot root directory (overrides config)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,
}

/// Matching options shared by every comparing command
#[derive(Args, Debug)]
struct MatchArgs {
    /// Ratio-test threshold (lower = stricter, 0-1)
    #[arg(long)]
    ratio: Option<f32>,

    /// Good matches required for a stable scene
    #[arg(long)]
    min_matches: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check cameras against their reference snapshots
    Check {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        matching: MatchArgs,

        /// Per-camera timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Check cameras one at a time
        #[arg(long)]
        sequential: bool,

        /// Do not write <camera>-result.jpg diagnostics
        #[arg(long)]
        no_diagnostics: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Print the suspect-camera message to stdout
        #[arg(long)]
        notify: bool,

        /// Cameras to check (default: all with a test snapshot)
        cameras: Vec<String>,
    },

    /// Compare the stored snapshots of one camera and explain the verdict
    Compare {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        matching: MatchArgs,

        /// Camera to compare
        camera: String,
    },

    /// Compare two image files
    Pair {
        /// Reference image
        reference: PathBuf,

        /// Candidate image
        candidate: PathBuf,

        #[command(flatten)]
        matching: MatchArgs,

        /// Write the side-by-side match image here
        #[arg(short, long)]
        diagnostic: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output (debug logging)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Make the current test snapshots the new references
    Rebaseline {
        #[command(flatten)]
        common: CommonArgs,

        /// Cameras to rebaseline
        #[arg(required = true)]
        cameras: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (suspect camera ids only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            common,
            matching,
            timeout,
            sequential,
            no_diagnostics,
            output,
            notify,
            cameras,
        } => {
            let mut config = load_config(&common)?;
            if let Some(timeout) = timeout {
                config.general.timeout_secs = timeout;
            }
            if sequential {
                config.general.parallel = false;
            }
            run_check(&config, &matching, !no_diagnostics, output, notify, &cameras)
        }
        Commands::Compare {
            common,
            matching,
            camera,
        } => {
            let config = load_config(&common)?;
            run_compare(&config, &matching, &camera, common.verbose)
        }
        Commands::Pair {
            reference,
            candidate,
            matching,
            diagnostic,
            output,
            verbose,
        } => {
            camera_scene_check::init_tracing(verbose, None)?;
            run_pair(
                &reference,
                &candidate,
                &matching,
                diagnostic.as_deref(),
                output,
                verbose,
            )
        }
        Commands::Rebaseline { common, cameras } => {
            let config = load_config(&common)?;
            run_rebaseline(&config, &cameras)
        }
    }
}

/// Load the config file, apply shared overrides, start logging
fn load_config(common: &CommonArgs) -> Result<MonitorConfig> {
    let mut config = MonitorConfig::load(common.config.as_deref())?;
    if let Some(root) = &common.root {
        config.storage.root = root.clone();
    }
    if common.verbose {
        config.general.debugging = true;
    }
    camera_scene_check::init_tracing(
        config.general.debugging,
        config.general.log_file.as_deref(),
    )?;
    Ok(config)
}

fn comparator_config(base: ComparatorConfig, matching: &MatchArgs) -> ComparatorConfig {
    let mut config = base;
    if let Some(ratio) = matching.ratio {
        config = config.match_ratio(ratio);
    }
    if let Some(min) = matching.min_matches {
        config = config.min_good_matches(min);
    }
    config
}

fn parse_cameras(ids: &[String]) -> Result<Vec<CameraId>> {
    ids.iter()
        .map(|id| CameraId::new(id).map_err(Into::into))
        .collect()
}

fn run_check(
    config: &MonitorConfig,
    matching: &MatchArgs,
    save_diagnostics: bool,
    output: OutputFormat,
    notify: bool,
    camera_ids: &[String],
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Camera Scene Check").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let cameras = if camera_ids.is_empty() {
        None
    } else {
        Some(parse_cameras(camera_ids)?)
    };

    let checker = FleetChecker::builder()
        .store(Arc::new(config.store()))
        .comparator(comparator_config(config.comparator_config(), matching))
        .timeout(Duration::from_secs(config.general.timeout_secs))
        .parallel(config.general.parallel)
        .save_diagnostics(save_diagnostics)
        .cameras(cameras)
        .build()?;

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress_clone.as_ref() else {
                continue;
            };
            match &event {
                FleetEvent::Started { total_cameras } => pb.set_length(*total_cameras as u64),
                FleetEvent::CameraStarted { camera } => pb.set_message(camera.to_string()),
                FleetEvent::Completed { .. } => pb.finish_and_clear(),
                _ => {}
            }
            if event.finishes_camera() {
                pb.inc(1);
            }
        }
    });

    let report = checker.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = report?;

    match output {
        OutputFormat::Pretty => print_pretty_report(&term, &report),
        OutputFormat::Json => print_json(&report),
        OutputFormat::Minimal => print_minimal_report(&report),
    }

    if notify {
        MarkdownNotifier::new(config.report.message_prefix.clone(), std::io::stdout())
            .notify(&report)?;
    }

    Ok(())
}

fn print_pretty_report(term: &Term, report: &FleetReport) {
    let summary = report.summary();

    term.write_line(&format!("{} Check Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} cameras checked in {:.1}s",
        style(summary.total).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} stable, {} suspect, {} new references, {} failed, {} timed out",
        style(summary.stable).green(),
        style(summary.suspect).red(),
        style(summary.bootstrapped).cyan(),
        style(summary.failed).yellow(),
        style(summary.timed_out).yellow()
    ))
    .ok();
    term.write_line("").ok();

    for outcome in &report.outcomes {
        let marker = match &outcome.status {
            CameraStatus::Compared {
                verdict: SceneVerdict::Stable,
                ..
            } => style("✓").green().to_string(),
            CameraStatus::Compared {
                verdict: SceneVerdict::Suspect,
                ..
            } => style("✗").red().bold().to_string(),
            CameraStatus::Bootstrapped => style("+").cyan().to_string(),
            CameraStatus::Failed { .. } | CameraStatus::TimedOut { .. } => {
                style("!").yellow().to_string()
            }
        };

        let detail = match &outcome.status {
            CameraStatus::Compared {
                suspect_reason: Some(reason),
                ..
            } => format!("{} - {}", outcome.status, reason),
            status => status.to_string(),
        };

        term.write_line(&format!(
            "  {} {} {}",
            marker,
            style(&outcome.camera).bold(),
            style(detail).dim()
        ))
        .ok();
    }

    if summary.suspect == 0 && summary.total > 0 {
        term.write_line("").ok();
        term.write_line(&format!("  {} All scenes look unchanged", style("✓").green()))
            .ok();
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("could not serialize output: {}", e),
    }
}

fn print_minimal_report(report: &FleetReport) {
    for outcome in report.suspects() {
        println!("{}", outcome.camera);
    }
}

fn run_compare(
    config: &MonitorConfig,
    matching: &MatchArgs,
    camera_id: &str,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    let camera = CameraId::new(camera_id)?;
    let store = config.store();

    let candidate = store
        .load_candidate(&camera)?
        .ok_or_else(|| StoreError::MissingSnapshot {
            camera: camera.to_string(),
        })?;
    let Some(reference) = store.load_reference(&camera)? else {
        term.write_line(&format!(
            "{} {} has no reference yet; run `scene-check check {}` to create one",
            style("!").yellow(),
            style(&camera).bold(),
            camera
        ))
        .ok();
        return Ok(());
    };

    let comparator_config = comparator_config(config.comparator_config(), matching);
    let min_good_matches = comparator_config.min_good_matches;
    let result = SceneComparator::new(comparator_config).compare_encoded(&reference, &candidate)?;

    if let Some(diagnostic) = &result.diagnostic {
        match store.save_diagnostic(&camera, diagnostic) {
            Ok(()) => {
                term.write_line(&format!(
                    "  {} {}",
                    style("Diagnostic:").dim(),
                    store.diagnostic_path(&camera).display()
                ))
                .ok();
            }
            Err(e) => tracing::warn!(%camera, "could not save diagnostic: {}", e),
        }
    }

    print_pretty_result(&term, camera.as_str(), &result, min_good_matches, verbose);
    Ok(())
}

fn run_pair(
    reference_path: &Path,
    candidate_path: &Path,
    matching: &MatchArgs,
    diagnostic_path: Option<&Path>,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let read = |path: &Path| {
        std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    };
    let reference = read(reference_path)?;
    let candidate = read(candidate_path)?;

    let config = comparator_config(ComparatorConfig::new(), matching)
        .render_diagnostic(diagnostic_path.is_some());
    let min_good_matches = config.min_good_matches;
    let result = SceneComparator::new(config).compare_encoded(&reference, &candidate)?;

    if let (Some(path), Some(diagnostic)) = (diagnostic_path, &result.diagnostic) {
        diagnostic
            .save(path)
            .map_err(|e| StoreError::DiagnosticWrite {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
    }

    match output {
        OutputFormat::Pretty => {
            let label = format!(
                "{} vs {}",
                reference_path.display(),
                candidate_path.display()
            );
            print_pretty_result(&Term::stderr(), &label, &result, min_good_matches, verbose);
        }
        OutputFormat::Json => print_json(&result),
        OutputFormat::Minimal => println!("{}", result.verdict),
    }
    Ok(())
}

fn print_pretty_result(
    term: &Term,
    label: &str,
    result: &MatchResult,
    min_good_matches: usize,
    verbose: bool,
) {
    let visualizer = MatchVisualizer::new();
    let verdict = match result.verdict {
        SceneVerdict::Stable => style("STABLE").green().bold(),
        SceneVerdict::Suspect => style("SUSPECT").red().bold(),
    };

    term.write_line(&format!("{} {}", verdict, style(label).bold()))
        .ok();
    term.write_line(&format!(
        "  {}",
        visualizer.threshold_bar(result.good_matches, min_good_matches)
    ))
    .ok();
    if let Some(reason) = result.suspect_reason {
        term.write_line(&format!("  {} {}", style("Reason:").dim(), reason))
            .ok();
    }

    if verbose {
        term.write_line(&format!(
            "  {}",
            visualizer.summarize(result.good_matches, result.reference_keypoints)
        ))
        .ok();
        term.write_line(&format!(
            "  {} reference / {} candidate keypoints",
            result.reference_keypoints, result.candidate_keypoints
        ))
        .ok();
        if result.pixel_identical {
            term.write_line(&format!(
                "  {}",
                style("Images are pixel-identical (newly added camera?)").dim()
            ))
            .ok();
        }
    }
}

fn run_rebaseline(config: &MonitorConfig, camera_ids: &[String]) -> Result<()> {
    let term = Term::stderr();
    let store = config.store();

    for camera in parse_cameras(camera_ids)? {
        promote_candidate(&store, &camera)?;
        term.write_line(&format!(
            "{} {} now uses its current view as reference",
            style("✓").green(),
            style(&camera).bold()
        ))
        .ok();
    }
    Ok(())
}
