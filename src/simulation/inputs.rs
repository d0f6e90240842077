//! Sample recorded-input generation for playback runs
//!
//! Produces vision.csv and audio.csv with a slow upward drift plus small
//! uniform noise, one column per vehicle.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use csv::Writer;
use log::info;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::detector::{AUDIO_INPUT_FILE, TIME_COLUMN, VEHICLE_COLUMN_PREFIX, VISION_INPUT_FILE};
use super::types::clamp01;

/// Audio samples are scaled down relative to vision
const AUDIO_SCALE: f64 = 0.8;

/// Paths of a generated input pair
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInputs {
    pub vision: PathBuf,
    pub audio: PathBuf,
}

/// Write sample vision and audio recordings into `inputs_dir`
pub fn generate_sample_inputs(
    inputs_dir: &Path,
    num_evs: usize,
    duration_s: f64,
    dt_s: f64,
    seed: u64,
) -> Result<SampleInputs> {
    if !dt_s.is_finite() || dt_s <= 0.0 {
        bail!("dt_s must be a positive number, got {dt_s}");
    }
    if !duration_s.is_finite() {
        bail!("duration_s must be finite, got {duration_s}");
    }
    std::fs::create_dir_all(inputs_dir)
        .with_context(|| format!("Failed to create inputs directory {}", inputs_dir.display()))?;

    let vision_path = inputs_dir.join(VISION_INPUT_FILE);
    let audio_path = inputs_dir.join(AUDIO_INPUT_FILE);
    let mut vision = open_writer(&vision_path)?;
    let mut audio = open_writer(&audio_path)?;

    let mut header = vec![TIME_COLUMN.to_string()];
    header.extend((1..=num_evs).map(|id| format!("{VEHICLE_COLUMN_PREFIX}{id}")));
    vision.write_record(&header)?;
    audio.write_record(&header)?;

    let mut vision_rng = StdRng::seed_from_u64(seed);
    let mut audio_rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    let mut step: u64 = 0;
    loop {
        let t = step as f64 * dt_s;
        if t > duration_s + 1e-9 {
            break;
        }
        let vision_row = sample_row(t, &mut vision_rng, num_evs);
        let audio_row: Vec<f64> = sample_row(t, &mut audio_rng, num_evs)
            .into_iter()
            .map(|v| clamp01(v * AUDIO_SCALE))
            .collect();

        vision.write_record(format_row(t, &vision_row))?;
        audio.write_record(format_row(t, &audio_row))?;
        step += 1;
    }

    vision.flush()?;
    audio.flush()?;
    info!(
        "Created sample inputs: {} and {} ({} rows)",
        vision_path.display(),
        audio_path.display(),
        step
    );

    Ok(SampleInputs {
        vision: vision_path,
        audio: audio_path,
    })
}

fn open_writer(path: &Path) -> Result<Writer<File>> {
    Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))
}

fn sample_row(t: f64, rng: &mut StdRng, num_evs: usize) -> Vec<f64> {
    let base = 0.02 + 0.004 * t;
    (0..num_evs)
        .map(|i| {
            let noise: f64 = rng.random_range(-0.03..0.03);
            clamp01(base + i as f64 * 0.01 + noise)
        })
        .collect()
}

fn format_row(t: f64, values: &[f64]) -> Vec<String> {
    std::iter::once(format!("{t:.2}"))
        .chain(values.iter().map(|v| format!("{v:.3}")))
        .collect()
}
