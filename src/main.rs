use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use log::info;

use evd_sim::simulation::{
    generate_sample_inputs, DetectorMode, OperatingMode, SimConfig, SimWorld, WorldOptions,
    AUDIO_INPUT_FILE, VISION_INPUT_FILE,
};

#[derive(Parser)]
#[command(name = "evd_sim")]
#[command(about = "Emergency vehicle detection and signal preemption simulation")]
struct Cli {
    /// Signal operating mode
    #[arg(long, value_enum, default_value_t = OperatingMode::Evd)]
    mode: OperatingMode,

    /// Source of detection confidences
    #[arg(long, value_enum, default_value_t = DetectorMode::Stub)]
    detector_mode: DetectorMode,

    /// Number of emergency vehicles to generate
    #[arg(long, default_value = "3")]
    num_evs: usize,

    /// Random seed for vehicle generation and detector noise
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Simulated run length in seconds
    #[arg(long, default_value = "120.0")]
    duration_s: f64,

    /// Time step per tick in seconds
    #[arg(long, default_value = "0.5")]
    dt_s: f64,

    /// Directory holding vision.csv and audio.csv
    #[arg(long, default_value = "../inputs")]
    inputs_dir: PathBuf,

    /// Directory for the timeline artifact
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// Generate sample vision.csv and audio.csv, then exit
    #[arg(long)]
    init_inputs: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,evd_sim=info"))
        .init();

    let cli = Cli::parse();

    if cli.init_inputs {
        let inputs = generate_sample_inputs(
            &cli.inputs_dir,
            cli.num_evs,
            cli.duration_s,
            cli.dt_s,
            cli.seed,
        )?;
        println!("[OK] Created sample inputs:");
        println!(" - {}", inputs.vision.display());
        println!(" - {}", inputs.audio.display());
        return Ok(());
    }

    if cli.detector_mode == DetectorMode::Playback && !playback_inputs_present(&cli.inputs_dir) {
        eprintln!(
            "Error: playback mode requires {} and {}.",
            cli.inputs_dir.join(VISION_INPUT_FILE).display(),
            cli.inputs_dir.join(AUDIO_INPUT_FILE).display()
        );
        eprintln!("Tip: run with --init-inputs to generate sample files.");
        std::process::exit(2);
    }

    run_headless(cli)
}

fn playback_inputs_present(inputs_dir: &Path) -> bool {
    inputs_dir.join(VISION_INPUT_FILE).exists() && inputs_dir.join(AUDIO_INPUT_FILE).exists()
}

/// Run the simulation to completion and report the outcome
fn run_headless(cli: Cli) -> Result<()> {
    let options = WorldOptions {
        mode: cli.mode,
        detector_mode: cli.detector_mode,
        num_evs: cli.num_evs,
        seed: cli.seed,
        sim: SimConfig {
            duration_s: cli.duration_s,
            dt_s: cli.dt_s,
            out_dir: cli.out_dir,
        },
        inputs_dir: cli.inputs_dir,
        ..WorldOptions::default()
    };

    info!(
        "Running {}s at {}s per tick",
        options.sim.duration_s, options.sim.dt_s
    );

    let mut world = SimWorld::new(options)?;
    let csv_path = world.run()?;

    let summary = world.summary();
    println!("{summary}");
    println!();
    println!("Outputs:");
    let shown = std::fs::canonicalize(&csv_path).unwrap_or(csv_path);
    println!(" - {}", shown.display());

    Ok(())
}
