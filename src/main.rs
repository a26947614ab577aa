//! Glasses overlay application: tracks a face and places the selected frame on it.

use anyhow::{Context, Result};
use clap::Parser;
use framesense::{
    app::{LogRenderer, OverlayApp},
    catalog::Catalog,
    config::Config,
    landmark_source::open_source,
};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Path to the glasses catalog (JSON)
    #[arg(long)]
    catalog: Option<String>,

    /// Identifier of the glasses frame to try on
    #[arg(short, long)]
    select: Option<String>,

    /// Landmark source (mock, replay:<path>)
    #[arg(long)]
    source: Option<String>,

    /// Number of frames to render before exiting
    #[arg(short = 'n', long, default_value = "300")]
    frames: u64,

    /// Viewport width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Smoothing filter (none, exponential[:alpha], moving_average[:window], median[:window])
    #[arg(short, long)]
    filter: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{}", framesense::config::EXAMPLE_CONFIG);
        return Ok(());
    }

    info!("FrameSense glasses overlay");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // Command line overrides
    if let Some(catalog) = args.catalog {
        config.catalog.path = catalog.into();
    }
    if let Some(source) = args.source {
        config.tracking.source = source;
    }
    if let Some(width) = args.width {
        config.display.width = width;
    }
    if let Some(height) = args.height {
        config.display.height = height;
    }
    if let Some(filter) = args.filter {
        config.smoothing.filter = filter;
    }
    if args.select.is_some() {
        config.catalog.default_selection = args.select;
    }
    config.validate().context("Invalid configuration")?;

    let catalog = Catalog::from_file(&config.catalog.path)
        .with_context(|| format!("Failed to load catalog {}", config.catalog.path.display()))?;

    // Create and run application
    let mut app = OverlayApp::new(&config, catalog)?;
    if app.selected().is_none() {
        warn!("No glasses selected; the overlay stays hidden");
    }

    let source_kind = config.source_kind()?;
    app.start_tracking(|| open_source(&source_kind), config.detection_interval());
    info!("Tracking {}", app.status());

    let mut renderer = LogRenderer::new(config.viewport()?);
    app.run(&mut renderer, args.frames, config.frame_interval())?;
    app.shutdown();

    info!("Rendered {} frames", renderer.frames_rendered());
    Ok(())
}
