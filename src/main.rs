// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use quadcam::app::AppModel;
use quadcam::i18n;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "quadcam")]
#[command(about = "Live camera preview with rectangle detection for the COSMIC desktop")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (renders camera and outlines to terminal)
    Terminal,

    /// List available cameras
    List,

    /// Detect rectangles in an image file and print them as JSON
    Detect {
        /// Image to analyse
        image: PathBuf,

        /// Write a copy of the image with the rectangles outlined
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Smallest rectangle, as a fraction of the shorter image side
        #[arg(long)]
        minimum_size: Option<f32>,

        /// Most rectangles to report
        #[arg(long)]
        max: Option<usize>,
    },

    /// Print live detections as JSON lines until Ctrl+C
    Watch {
        /// Camera index to use (from 'quadcam list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Smallest rectangle, as a fraction of the shorter frame side
        #[arg(long)]
        minimum_size: Option<f32>,

        /// Most rectangles to report per frame
        #[arg(long)]
        max: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=quadcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Terminal) => quadcam::terminal::run()?,
        Some(Commands::List) => cli::list_cameras()?,
        Some(Commands::Detect {
            image,
            output,
            minimum_size,
            max,
        }) => cli::detect_image(
            image,
            output,
            cli::DetectionOverrides {
                minimum_size,
                maximum_observations: max,
            },
        )?,
        Some(Commands::Watch {
            camera,
            minimum_size,
            max,
        }) => cli::watch_camera(
            camera,
            cli::DetectionOverrides {
                minimum_size,
                maximum_observations: max,
            },
        )?,
        None => run_gui()?,
    }

    Ok(())
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    // Settings for configuring the application window and iced runtime.
    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(360.0)
            .min_height(180.0),
    );

    // Starts the application's event loop with `()` as the application's flags.
    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}
