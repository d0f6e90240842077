//! Detection confidence providers
//!
//! Each modality (vision, audio) is backed by a [`ConfidenceSource`]. The
//! [`SensorPair`] factory picks the implementation for both modalities from a
//! [`DetectorMode`] when the world is built.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use rand::RngCore;
use rand_distr::{Distribution, Normal};

use super::types::{clamp01, DetectorMode, Modality, VehicleId};

/// Recorded vision confidences inside the inputs directory
pub const VISION_INPUT_FILE: &str = "vision.csv";
/// Recorded audio confidences inside the inputs directory
pub const AUDIO_INPUT_FILE: &str = "audio.csv";
/// Name of the timestamp column in recorded input files
pub const TIME_COLUMN: &str = "t";
/// Vehicle columns are named by this prefix plus the numeric vehicle id
pub const VEHICLE_COLUMN_PREFIX: &str = "ev";

/// A source of per-vehicle detection confidence in [0, 1]
pub trait ConfidenceSource {
    fn detect(
        &self,
        distance_m: f64,
        time_s: f64,
        vehicle: VehicleId,
        rng: &mut dyn RngCore,
    ) -> f64;

    /// Push an out-of-band confidence value
    /// Returns false for sources that do not accept pushed values
    fn update(&mut self, _confidence: f64) -> bool {
        false
    }
}

/// Shape of a synthetic detector's distance response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StubProfile {
    /// Peak confidence at zero distance
    pub base: f64,
    /// Distance scale of the Gaussian falloff
    pub d0_m: f64,
    /// Standard deviation of the additive noise
    pub noise_sd: f64,
}

impl StubProfile {
    pub fn vision() -> Self {
        Self {
            base: 0.9,
            d0_m: 140.0,
            noise_sd: 0.08,
        }
    }

    /// Audio reaches farther but is weaker and noisier than vision
    pub fn audio() -> Self {
        Self {
            base: 0.85,
            d0_m: 320.0,
            noise_sd: 0.12,
        }
    }
}

/// Synthetic detector: Gaussian falloff with distance plus Gaussian noise
#[derive(Debug, Clone)]
pub struct StubDetector {
    profile: StubProfile,
    noise: Normal<f64>,
}

impl StubDetector {
    pub fn new(profile: StubProfile) -> Result<Self> {
        let noise = Normal::new(0.0, profile.noise_sd)
            .map_err(|e| anyhow!("Invalid stub noise sd {}: {e}", profile.noise_sd))?;
        Ok(Self { profile, noise })
    }

    pub fn profile(&self) -> StubProfile {
        self.profile
    }
}

impl ConfidenceSource for StubDetector {
    fn detect(
        &self,
        distance_m: f64,
        _time_s: f64,
        _vehicle: VehicleId,
        rng: &mut dyn RngCore,
    ) -> f64 {
        let falloff = (-(distance_m / self.profile.d0_m).powi(2)).exp();
        clamp01(self.profile.base * falloff + self.noise.sample(rng))
    }
}

/// Replays recorded confidences as a step function of time
#[derive(Debug, Clone, Default)]
pub struct PlaybackDetector {
    /// Time-ordered (timestamp, confidence) samples per vehicle
    samples: HashMap<VehicleId, Vec<(f64, f64)>>,
}

impl PlaybackDetector {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Input CSV not found: {}", path.display());
        }
        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_csv(reader).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers().context("Missing header row")?.clone();

        let time_index = headers
            .iter()
            .position(|h| h.trim() == TIME_COLUMN)
            .with_context(|| format!("Missing '{TIME_COLUMN}' column"))?;

        // Columns without the vehicle prefix carry no samples
        let vehicle_columns: Vec<(usize, VehicleId)> = headers
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                let id = name.trim().strip_prefix(VEHICLE_COLUMN_PREFIX)?.parse().ok()?;
                Some((index, VehicleId(id)))
            })
            .collect();

        let mut samples: HashMap<VehicleId, Vec<(f64, f64)>> = HashMap::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Bad record at row {}", row + 1))?;
            let time_s = parse_cell(record.get(time_index))
                .with_context(|| format!("Bad timestamp at row {}", row + 1))?;

            for &(index, id) in &vehicle_columns {
                let confidence = parse_cell(record.get(index))
                    .with_context(|| format!("Bad {id} value at row {}", row + 1))?;
                samples.entry(id).or_default().push((time_s, confidence));
            }
        }

        for (id, series) in samples.iter_mut() {
            if series.windows(2).any(|pair| pair[1].0 < pair[0].0) {
                warn!("Recorded samples for {id} are out of time order, sorting");
                series.sort_by(|a, b| a.0.total_cmp(&b.0));
            }
        }

        Ok(Self { samples })
    }

    pub fn vehicle_count(&self) -> usize {
        self.samples.len()
    }

    /// Confidence of the latest sample at or before `time_s`
    pub fn lookup(&self, vehicle: VehicleId, time_s: f64) -> f64 {
        let Some(series) = self.samples.get(&vehicle) else {
            return 0.0;
        };
        let index = series.partition_point(|&(t, _)| t <= time_s);
        if index == 0 {
            return 0.0;
        }
        clamp01(series[index - 1].1)
    }
}

/// Empty cells read as zero
fn parse_cell(cell: Option<&str>) -> Result<f64> {
    let cell = cell.map(str::trim).unwrap_or_default();
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f64>()
        .with_context(|| format!("'{cell}' is not a number"))
}

impl ConfidenceSource for PlaybackDetector {
    fn detect(
        &self,
        _distance_m: f64,
        time_s: f64,
        vehicle: VehicleId,
        _rng: &mut dyn RngCore,
    ) -> f64 {
        self.lookup(vehicle, time_s)
    }
}

/// Holds the most recently pushed confidence for a modality
/// The value is shared by every vehicle
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalDetector {
    last_confidence: f64,
}

impl ExternalDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_confidence(&self) -> f64 {
        self.last_confidence
    }
}

impl ConfidenceSource for ExternalDetector {
    fn detect(
        &self,
        _distance_m: f64,
        _time_s: f64,
        _vehicle: VehicleId,
        _rng: &mut dyn RngCore,
    ) -> f64 {
        self.last_confidence
    }

    fn update(&mut self, confidence: f64) -> bool {
        self.last_confidence = clamp01(confidence);
        true
    }
}

/// The vision and audio sources used by a world
pub struct SensorPair {
    mode: DetectorMode,
    vision: Box<dyn ConfidenceSource>,
    audio: Box<dyn ConfidenceSource>,
}

impl SensorPair {
    /// Build both sources for `mode`
    /// Playback mode reads `vision.csv` and `audio.csv` from `inputs_dir`
    pub fn build(mode: DetectorMode, inputs_dir: &Path) -> Result<Self> {
        let (vision, audio) = match mode {
            DetectorMode::Stub => (
                boxed(StubDetector::new(StubProfile::vision())?),
                boxed(StubDetector::new(StubProfile::audio())?),
            ),
            DetectorMode::Playback => (
                boxed(PlaybackDetector::from_path(&inputs_dir.join(VISION_INPUT_FILE))?),
                boxed(PlaybackDetector::from_path(&inputs_dir.join(AUDIO_INPUT_FILE))?),
            ),
            DetectorMode::External => (
                boxed(ExternalDetector::new()),
                boxed(ExternalDetector::new()),
            ),
        };
        Ok(Self::from_sources(mode, vision, audio))
    }

    pub fn from_sources(
        mode: DetectorMode,
        vision: Box<dyn ConfidenceSource>,
        audio: Box<dyn ConfidenceSource>,
    ) -> Self {
        Self {
            mode,
            vision,
            audio,
        }
    }

    pub fn mode(&self) -> DetectorMode {
        self.mode
    }

    /// Sample (vision, audio) confidence for one vehicle
    pub fn sample(
        &self,
        distance_m: f64,
        time_s: f64,
        vehicle: VehicleId,
        rng: &mut dyn RngCore,
    ) -> (f64, f64) {
        let pv = self.vision.detect(distance_m, time_s, vehicle, rng);
        let pa = self.audio.detect(distance_m, time_s, vehicle, rng);
        (pv, pa)
    }

    /// Only external sources accept pushed values
    pub fn push(&mut self, modality: Modality, confidence: f64) -> Result<()> {
        let source = match modality {
            Modality::Vision => &mut self.vision,
            Modality::Audio => &mut self.audio,
        };
        if !source.update(confidence) {
            bail!(
                "Detector mode '{}' does not accept pushed {modality} confidences",
                self.mode
            );
        }
        Ok(())
    }
}

fn boxed<S: ConfidenceSource + 'static>(source: S) -> Box<dyn ConfidenceSource> {
    Box::new(source)
}
