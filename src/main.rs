//! Negative Viewer CLI
//!
//! Opens a camera, runs the film-negative preview loop, and optionally
//! saves a still of the last presented frame.

use clap::Parser;
use negative_viewer::{
    capture::{CaptureAcquirer, FacingMode, FileConfig, ManualControls, MediaSource, MockMediaSource},
    collaborators::Collaborators,
    lifecycle::Viewer,
    pump::{PumpState, RefreshScheduler, TickOutcome},
    surface::save_still,
    transform::TransformPolicy,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "negative-viewer", version, about = "Live camera preview with a film-negative filter")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pixel transform to apply.
    #[arg(long, value_enum)]
    policy: Option<TransformPolicy>,

    /// Preferred camera facing.
    #[arg(long, value_enum)]
    facing: Option<FacingMode>,

    /// Stop after presenting this many frames.
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    /// Save a PNG still of the last frame before exiting.
    #[arg(long)]
    still: bool,

    /// Directory for saved stills (overrides the config file).
    #[arg(long)]
    still_dir: Option<PathBuf>,

    /// Manual exposure time, if the camera supports it.
    #[arg(long)]
    exposure: Option<f64>,

    /// Manual focus distance, if the camera supports it.
    #[arg(long)]
    focus: Option<f64>,

    /// Use the synthetic camera instead of real hardware.
    #[cfg(feature = "camera")]
    #[arg(long)]
    mock: bool,

    /// Serve Prometheus metrics on this port.
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Negative Viewer v{}", negative_viewer::VERSION);

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(policy) = args.policy {
        config.transform.policy = policy;
    }
    if let Some(facing) = args.facing {
        config.capture.facing = facing;
    }
    if let Some(dir) = &args.still_dir {
        config.still.output_dir = dir.clone();
    }

    let mut collaborators = Collaborators::from_config(&config.collaborators);
    if !collaborators.is_empty() {
        let mounted = collaborators.mount_all();
        info!(mounted, total = collaborators.len(), "Collaborators mounted");
    }

    let media = media_source(&args, &config);
    let mut viewer = Viewer::new(
        CaptureAcquirer::new(media, config.capture.clone()),
        RefreshScheduler::new(config.pump.refresh_hz),
        config.transform.policy,
        config.pump.clone(),
    );

    let handle = match viewer.start(config.capture.facing) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let interrupt = handle.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupt.cancel();
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    if args.exposure.is_some() || args.focus.is_some() {
        let requested = ManualControls {
            exposure_time: args.exposure,
            focus_distance: args.focus,
        };
        match viewer.apply_controls(&requested) {
            Ok(settings) if settings.is_empty() => warn!("Camera has no manual exposure/focus controls"),
            Ok(settings) => info!(?settings, "Manual controls applied"),
            Err(e) => warn!("Failed to apply manual controls: {}", e),
        }
    }

    #[cfg(feature = "metrics")]
    let metrics = args.metrics_port.and_then(spawn_metrics_server);

    info!("Previewing ({} filter); press Ctrl-C to stop", config.transform.policy);
    let report_every = u64::from(config.pump.refresh_hz);

    while viewer.state() != PumpState::Stopped {
        if let Some(limit) = args.frames {
            if viewer.stats().presented_frames >= limit {
                break;
            }
        }
        match viewer.tick() {
            None => break,
            Some(TickOutcome::TimedOut) => {
                eprintln!("The camera never delivered a frame.");
                break;
            }
            Some(_) => {}
        }

        let stats = viewer.stats();
        if stats.ticks > 0 && stats.ticks % report_every == 0 {
            info!(
                presented = stats.presented_frames,
                skipped = stats.skipped_ticks,
                errors = stats.frame_errors,
                "Preview running"
            );
            #[cfg(feature = "metrics")]
            publish_metrics(metrics.as_deref(), &viewer);
        }
    }

    if args.still {
        match viewer.capture_still() {
            Ok(png) => match save_still(&png, &config.still.output_dir) {
                Ok(path) => println!("Saved still: {}", path.display()),
                Err(e) => eprintln!("Failed to save still: {}", e),
            },
            Err(e) => eprintln!("Still capture failed: {}", e),
        }
    }

    let stopped = viewer.teardown();
    #[cfg(feature = "metrics")]
    publish_metrics(metrics.as_deref(), &viewer);
    let stats = viewer.stats();
    info!(
        "Processed {} ticks: {} frames presented, {} skipped, {} read errors; {} track(s) released",
        stats.ticks, stats.presented_frames, stats.skipped_ticks, stats.frame_errors, stopped
    );

    collaborators.unmount_all();
}

fn media_source(args: &Args, config: &FileConfig) -> Box<dyn MediaSource> {
    #[cfg(feature = "camera")]
    if !args.mock {
        return Box::new(negative_viewer::capture::NativeMediaSource::new(
            config.capture.device_index,
        ));
    }

    let _ = (args, config);
    info!("Using mock camera input");
    Box::new(MockMediaSource::new())
}

#[cfg(feature = "metrics")]
fn publish_metrics<M, S>(
    state: Option<&tokio::sync::RwLock<negative_viewer::metrics::MetricsState>>,
    viewer: &Viewer<M, S>,
) where
    M: MediaSource,
    S: negative_viewer::pump::Scheduler,
{
    if let Some(state) = state {
        state
            .blocking_write()
            .update(&negative_viewer::metrics::MetricsSnapshot::from_viewer(viewer));
    }
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(
    port: u16,
) -> Option<std::sync::Arc<tokio::sync::RwLock<negative_viewer::metrics::MetricsState>>> {
    use negative_viewer::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            return None;
        }
    };
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });

    Some(state)
}
