//! microstat command-line interface.
//!
//! Characterize voxel microstructures described by TOML job files:
//! ```sh
//! microstat run job.toml
//! microstat validate job.toml
//! microstat info volume.json
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "microstat")]
#[command(about = "Grain characterization of voxelized polycrystals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Characterize the volume of a job file and write the reports.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides the job file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a job file and its volume without running the passes.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Display information about a JSON voxel volume.
    Info {
        /// Path to the volume file.
        volume: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            let job = config::load_config(&config)?;
            println!("Job: {}", config.display());

            let result = runner::run_job(&job, &config)?;
            println!("Grains: {}", result.grains.active_count());
            for stats in &result.statistics {
                println!(
                    "  phase {} ({}): fraction {:.4}, {} grains counted",
                    stats.phase, stats.structure, stats.summary.fraction, stats.counted_grains
                );
            }

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));
            runner::write_outputs(&result, &job, &out_dir)?;
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let path = runner::volume_path(&job, &config);
            let volume = runner::load_volume(&path)?;
            let max_id = volume.validate(&job.phase_table())?;
            println!("Configuration is valid: {}", config.display());
            println!("Volume is valid: {} (max grain id {})", path.display(), max_id);
            Ok(())
        }
        Commands::Info { volume } => {
            let v = runner::load_volume(&volume)?;
            runner::print_info(&v);
            Ok(())
        }
    }
}
