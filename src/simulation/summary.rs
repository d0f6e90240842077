//! End-of-run statistics

use std::fmt;

use ordered_float::OrderedFloat;

use super::types::{DetectorMode, OperatingMode};
use super::vehicle::EmergencyVehicle;

/// Spread of pass times over the vehicles that made it through
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassTimeStats {
    pub min_s: f64,
    pub median_s: f64,
    pub max_s: f64,
}

impl PassTimeStats {
    pub fn from_times(times: &[f64]) -> Option<Self> {
        let mut sorted: Vec<OrderedFloat<f64>> = times.iter().copied().map(OrderedFloat).collect();
        sorted.sort();

        let (first, last) = (sorted.first()?, sorted.last()?);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1].0 + sorted[mid].0) / 2.0
        } else {
            sorted[mid].0
        };

        Some(Self {
            min_s: first.0,
            median_s: median,
            max_s: last.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub mode: OperatingMode,
    pub detector_mode: DetectorMode,
    pub total: usize,
    pub detected: usize,
    pub passed: usize,
    pub pass_times: Option<PassTimeStats>,
    /// Mean time from detection to passing, over vehicles that did both
    pub mean_detection_to_pass_s: Option<f64>,
}

impl RunSummary {
    pub fn new(
        mode: OperatingMode,
        detector_mode: DetectorMode,
        vehicles: &[EmergencyVehicle],
    ) -> Self {
        let pass_times: Vec<f64> = vehicles.iter().filter_map(|ev| ev.pass_time_s()).collect();

        let latencies: Vec<f64> = vehicles
            .iter()
            .filter_map(|ev| Some(ev.pass_time_s()? - ev.detection_time_s()?))
            .collect();
        let mean_detection_to_pass_s = if latencies.is_empty() {
            None
        } else {
            Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
        };

        Self {
            mode,
            detector_mode,
            total: vehicles.len(),
            detected: vehicles.iter().filter(|ev| ev.is_detected()).count(),
            passed: pass_times.len(),
            pass_times: PassTimeStats::from_times(&pass_times),
            mean_detection_to_pass_s,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {} | Detector: {}", self.mode, self.detector_mode)?;
        write!(
            f,
            "EVs: {}  Detected: {}/{}  Passed: {}/{}",
            self.total, self.detected, self.total, self.passed, self.total
        )?;
        if let Some(stats) = &self.pass_times {
            write!(
                f,
                "\nPass time (s): min={:.1}, median={:.1}, max={:.1}",
                stats.min_s, stats.median_s, stats.max_s
            )?;
        }
        if let Some(latency) = self.mean_detection_to_pass_s {
            write!(f, "\nDetection to pass (s): mean={:.1}", latency)?;
        }
        Ok(())
    }
}
