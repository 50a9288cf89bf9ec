use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};

use photobooth::{
    booth::{LatestFrameSink, LogCountdown, Shutdown, ShutdownToken},
    composition::CaptureMode,
    config::{Config, SourceKind},
    error::ExportError,
    export::{ExportFormat, FileExporter},
    frame::acquire_source,
    FilterRegistry, FilterSelection, Photobooth, PhotoboothError,
};

#[derive(Parser)]
#[command(
    name = "photobooth",
    version,
    about = "Live filtered camera preview and bordered photo captures",
    long_about = "Photobooth shows a mirrored, filtered live preview and captures single photos or three-shot strips with a countdown, framed in a white border and saved as PNG or JPEG."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Overrides shared by every command that reads the camera
#[derive(clap::Args)]
struct SourceArgs {
    /// Filter to apply (none, grayscale, sepia, blur, bright, dark, contrast)
    #[arg(short, long)]
    filter: Option<String>,

    /// Mirror the image horizontally
    #[arg(long)]
    flip: bool,

    /// Frame source: "test-pattern" or a path to an image file
    #[arg(short, long)]
    source: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Count down and capture a photo
    Capture {
        /// Capture mode (single, triple)
        #[arg(short, long)]
        mode: Option<String>,

        #[command(flatten)]
        source: SourceArgs,

        /// Directory photos are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (png, jpeg)
        #[arg(long)]
        format: Option<String>,
    },

    /// Run the live preview for a while
    Preview {
        /// How long to run the preview
        #[arg(long, default_value_t = 5)]
        seconds: u64,

        #[command(flatten)]
        source: SourceArgs,

        /// Save the last previewed frame to this file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// List the available filters
    Filters,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Photobooth v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let outcome = match cli.command {
        Command::Capture { mode, source, output, format } => {
            apply_source_args(&mut config, &source)?;
            if let Some(mode) = mode {
                config.booth.mode = mode.parse::<CaptureMode>()?;
            }
            if let Some(output) = output {
                config.export.output_dir = output;
            }
            if let Some(format) = format {
                config.export.format = format.parse::<ExportFormat>()?;
            }
            capture(config).await
        }
        Command::Preview { seconds, source, snapshot } => {
            apply_source_args(&mut config, &source)?;
            preview(config, Duration::from_secs(seconds), snapshot).await
        }
        Command::Filters => {
            let registry = FilterRegistry::new();
            for filter in registry.available_filters() {
                println!("{:<10} {}", filter, registry.describe(filter));
            }
            Ok(())
        }
    };

    let code = report_outcome(outcome, &mut std::io::stderr());
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Write the single user-facing line for a failed command and pick the exit code
fn report_outcome<W: Write>(outcome: photobooth::Result<()>, out: &mut W) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            debug!("Command failed: {:?}", e);
            // stderr may already be closed; the exit code still reports the failure
            let _ = writeln!(out, "{}", e.user_message());
            1
        }
    }
}

fn apply_source_args(config: &mut Config, args: &SourceArgs) -> Result<()> {
    if let Some(filter) = &args.filter {
        config.booth.filter = filter.parse::<FilterSelection>()?;
    }
    if args.flip {
        config.booth.flip = true;
    }
    match args.source.as_deref() {
        None => {}
        Some("test-pattern") => config.source.kind = SourceKind::TestPattern,
        Some(path) => {
            config.source.kind = SourceKind::Image;
            config.source.path = Some(PathBuf::from(path));
        }
    }
    Ok(())
}

async fn capture(config: Config) -> photobooth::Result<()> {
    let mode = config.booth.mode;
    let mut exporter = FileExporter::from_config(&config.export);
    let source = acquire_source(&config.source)?;
    let mut booth = Photobooth::new(config)?;

    let photo = booth
        .take_photo(mode, source.as_ref(), &mut LogCountdown, &mut exporter, &mut ShutdownToken::never())
        .await?;

    match photo.path {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", photo.filename),
    }
    Ok(())
}

async fn preview(config: Config, duration: Duration, snapshot: Option<PathBuf>) -> photobooth::Result<()> {
    let source = acquire_source(&config.source)?;
    let booth = Photobooth::new(config)?;
    let settings = booth.settings().subscribe();
    let mut render = booth.preview_loop();
    let mut display = LatestFrameSink::new();

    let shutdown = Shutdown::new();
    let token = shutdown.token();

    let (stats, _) = tokio::join!(
        render.run(source.as_ref(), &settings, &mut display, token),
        async {
            tokio::time::sleep(duration).await;
            shutdown.trigger();
        }
    );
    println!("Rendered {} frames ({} skipped)", stats.rendered, stats.failed);

    if let Some(path) = snapshot {
        match display.latest() {
            Some(frame) => {
                frame.save(&path).map_err(|e| ExportError::WriteFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                info!("Snapshot saved to {:?}", path);
            }
            None => return Err(PhotoboothError::generic("no frame was rendered")),
        }
    }
    Ok(())
}
