mod app;
mod canvas;
mod command;
mod config;
mod engine;
mod error;
mod input;
mod music;
mod render;
mod screen;
mod settings;

use std::io;

use clap::{Parser, Subcommand};

use config::{Animation, BranchingOptions, TriangleFamily, TriangleOptions};
use engine::branching::BranchingEngine;
use engine::triangle::TriangleEngine;
use settings::Settings;

#[derive(Parser)]
#[command(name = "fractalscope")]
#[command(version)]
#[command(
    about = "Terminal generative art: branching-line and nested-triangle fractal animations",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Branching-line fractal growing out from a movable center
    Branching {
        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Generations before the growth restarts from the center (3-12)
        #[arg(short, long, default_value = "4")]
        cap: u32,

        /// Base line length in dots (10-370)
        #[arg(short, long, default_value = "70")]
        line_length: f64,
    },

    /// Nested triangles growing or shrinking around a movable center
    Triangle {
        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Triangle family to start with
        #[arg(short, long, value_enum, default_value_t = TriangleFamily::Equilateral)]
        family: TriangleFamily,

        /// Start with outlined triangles instead of filled ones
        #[arg(short, long)]
        outline: bool,
    },
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Commands::Branching {
            seed,
            cap,
            line_length,
        } => {
            let options = BranchingOptions {
                seed,
                max_iterations: cap.clamp(3, 12),
                line_length: line_length.clamp(10.0, 370.0),
                interval_index: settings
                    .animation
                    .branching_interval
                    .unwrap_or(engine::BRANCH_DEFAULT_INTERVAL),
            };
            app::run(
                Animation::Branching,
                Box::new(BranchingEngine::new(options)),
                settings.music.players,
            )
        }
        Commands::Triangle {
            seed,
            family,
            outline,
        } => {
            let options = TriangleOptions {
                seed,
                family,
                outline,
                interval_index: settings
                    .animation
                    .triangle_interval
                    .unwrap_or(engine::TRIANGLE_DEFAULT_INTERVAL),
            };
            app::run(
                Animation::Triangle,
                Box::new(TriangleEngine::new(options)),
                settings.music.players,
            )
        }
    }
}
