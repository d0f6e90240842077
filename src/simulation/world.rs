//! Main simulation world that ties everything together
//!
//! Each tick runs detect → schedule → control → move → log over a single
//! intersection. Time is logical and advances in fixed steps.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;

use super::detector::SensorPair;
use super::fusion::FusionThresholds;
use super::intersection::{SignalConfig, SignalController, SignalState};
use super::scheduler::{Scheduler, SchedulerConfig};
use super::summary::RunSummary;
use super::timeline::{self, TimelineRecord, VehicleSnapshot, TIMELINE_FILE};
use super::types::{
    Approach, DetectorMode, Modality, OperatingMode, VehicleId, AMBULANCE, EV_TYPES,
};
use super::vehicle::EmergencyVehicle;

/// Run length, step size and artifact location
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub duration_s: f64,
    pub dt_s: f64,
    pub out_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration_s: 120.0,
            dt_s: 0.5,
            out_dir: PathBuf::from("outputs"),
        }
    }
}

impl SimConfig {
    /// Reject step sizes that would never finish the run
    pub fn validate(&self) -> Result<()> {
        if !self.dt_s.is_finite() || self.dt_s <= 0.0 {
            bail!("dt_s must be a positive number, got {}", self.dt_s);
        }
        if !self.duration_s.is_finite() {
            bail!("duration_s must be finite, got {}", self.duration_s);
        }
        Ok(())
    }
}

/// Everything needed to build a [`SimWorld`]
#[derive(Debug, Clone)]
pub struct WorldOptions {
    pub mode: OperatingMode,
    pub detector_mode: DetectorMode,
    pub num_evs: usize,
    pub seed: u64,
    pub sim: SimConfig,
    /// Directory holding vision.csv and audio.csv for playback
    pub inputs_dir: PathBuf,
    pub signal: SignalConfig,
    pub scheduler: SchedulerConfig,
    pub fusion: FusionThresholds,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Evd,
            detector_mode: DetectorMode::Stub,
            num_evs: 3,
            seed: 7,
            sim: SimConfig::default(),
            inputs_dir: PathBuf::from("../inputs"),
            signal: SignalConfig::default(),
            scheduler: SchedulerConfig::default(),
            fusion: FusionThresholds::default(),
        }
    }
}

/// The simulation world
pub struct SimWorld {
    mode: OperatingMode,
    config: SimConfig,
    controller: SignalController,
    scheduler: Scheduler,
    fusion: FusionThresholds,
    sensors: SensorPair,

    /// All vehicles, in id order
    vehicles: Vec<EmergencyVehicle>,

    /// One record per completed tick
    timeline: Vec<TimelineRecord>,

    /// Simulated time of the next tick
    time_s: f64,
    ticks: u64,

    /// Seeded once at construction; drives vehicle generation and stub noise
    rng: StdRng,
}

impl SimWorld {
    /// Build a world with `num_evs` randomly generated vehicles
    pub fn new(options: WorldOptions) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(options.seed);
        let vehicles = random_vehicles(&mut rng, options.num_evs);
        Self::build(options, vehicles, rng)
    }

    /// Build a world around caller-supplied vehicles
    /// `options.num_evs` is ignored
    pub fn with_vehicles(options: WorldOptions, vehicles: Vec<EmergencyVehicle>) -> Result<Self> {
        let rng = StdRng::seed_from_u64(options.seed);
        Self::build(options, vehicles, rng)
    }

    fn build(options: WorldOptions, vehicles: Vec<EmergencyVehicle>, rng: StdRng) -> Result<Self> {
        options.sim.validate()?;

        let mut seen = HashSet::new();
        for ev in &vehicles {
            if !seen.insert(ev.id) {
                bail!("Duplicate vehicle id {}", ev.id);
            }
            for speed in [ev.speed_free_m_s, ev.speed_blocked_m_s] {
                if !speed.is_finite() || speed < 0.0 {
                    bail!("{} speed must be a non-negative number, got {speed}", ev.id);
                }
            }
        }

        let sensors = SensorPair::build(options.detector_mode, &options.inputs_dir)
            .with_context(|| format!("Failed to set up {} detectors", options.detector_mode))?;

        info!(
            "Built world: mode={} detector={} evs={} seed={}",
            options.mode,
            options.detector_mode,
            vehicles.len(),
            options.seed
        );

        Ok(Self {
            mode: options.mode,
            config: options.sim,
            controller: SignalController::new(options.signal),
            scheduler: Scheduler::new(options.scheduler),
            fusion: options.fusion,
            sensors,
            vehicles,
            timeline: Vec::new(),
            time_s: 0.0,
            ticks: 0,
            rng,
        })
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn detector_mode(&self) -> DetectorMode {
        self.sensors.mode()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn vehicles(&self) -> &[EmergencyVehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&EmergencyVehicle> {
        self.vehicles.iter().find(|ev| ev.id == id)
    }

    pub fn timeline(&self) -> &[TimelineRecord] {
        &self.timeline
    }

    pub fn controller(&self) -> &SignalController {
        &self.controller
    }

    pub fn signal_state(&self) -> SignalState {
        self.controller.state()
    }

    /// Simulated time of the next tick
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Vehicles that have not passed yet
    pub fn active_count(&self) -> usize {
        self.vehicles.iter().filter(|ev| !ev.has_passed()).count()
    }

    /// Push a confidence value from outside the simulation
    /// Only external detectors accept pushed values
    pub fn push_confidence(&mut self, modality: Modality, confidence: f64) -> Result<()> {
        self.sensors.push(modality, confidence)
    }

    /// Run a single tick at the current simulated time
    pub fn tick(&mut self) {
        let now = self.time_s;
        let dt_s = self.config.dt_s;

        self.detect_vehicles(now);

        let ev_mode = self.mode == OperatingMode::Evd;
        if ev_mode {
            if let Some(pick) = self.scheduler.pick(&self.vehicles) {
                self.controller.request_phase_for_ev(pick);
            }
        }

        self.controller.step(dt_s, ev_mode);

        for ev in self.vehicles.iter_mut() {
            let has_green = self.controller.is_green(ev.approach);
            if ev.advance(has_green, dt_s, now) {
                debug!("{} passed at {:.2}s", ev.id, now);
            }
        }

        self.record(now);

        self.ticks += 1;
        self.time_s = self.ticks as f64 * dt_s;
    }

    fn detect_vehicles(&mut self, now: f64) {
        for ev in self.vehicles.iter_mut() {
            if ev.is_detected() || ev.has_passed() {
                continue;
            }
            let (pv, pa) = self.sensors.sample(ev.distance_m, now, ev.id, &mut self.rng);
            let fusion = self.fusion.fuse(pv, pa);
            if fusion.triggered {
                ev.mark_detected(now);
                debug!(
                    "{} detected at {:.2}s, {:.1} m out (pv={:.2} pa={:.2} pf={:.2})",
                    ev.id, now, ev.distance_m, pv, pa, fusion.fused
                );
            }
        }
    }

    fn record(&mut self, now: f64) {
        let state = self.controller.state();
        let record = TimelineRecord {
            time_s: now,
            phase: state.phase,
            subphase: state.subphase,
            active: self.active_count(),
            vehicles: self.vehicles.iter().map(VehicleSnapshot::from).collect(),
        };
        trace!(
            "t={:.2} {}/{} active={}",
            now,
            record.phase,
            record.subphase,
            record.active
        );
        self.timeline.push(record);
    }

    /// Tick until simulated time passes `duration_s`
    /// Returns the number of ticks in the timeline
    pub fn run_ticks(&mut self) -> Result<usize> {
        while self.time_s <= self.config.duration_s {
            self.tick();
        }
        if self.timeline.is_empty() {
            bail!(
                "No timeline generated: duration {}s with step {}s produced zero ticks",
                self.config.duration_s,
                self.config.dt_s
            );
        }
        Ok(self.timeline.len())
    }

    /// Run the whole simulation and write the timeline artifact
    /// Returns the artifact path
    pub fn run(&mut self) -> Result<PathBuf> {
        let ticks = self.run_ticks()?;
        let path = self.write_timeline(&self.config.out_dir)?;
        info!("Simulation complete: {} ticks, timeline at {}", ticks, path.display());
        Ok(path)
    }

    /// Write the timeline to `dir`, creating it if needed
    pub fn write_timeline(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(TIMELINE_FILE);
        timeline::write_csv(&path, &self.timeline)?;
        Ok(path)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::new(self.mode, self.sensors.mode(), &self.vehicles)
    }
}

/// Generate `count` vehicles with ids 1..=count
fn random_vehicles(rng: &mut StdRng, count: usize) -> Vec<EmergencyVehicle> {
    (1..=count)
        .map(|id| {
            let ev_type = *EV_TYPES.choose(rng).unwrap_or(&AMBULANCE);
            let approach = *Approach::ALL.choose(rng).unwrap_or(&Approach::North);
            EmergencyVehicle::new(
                VehicleId(id),
                ev_type,
                approach,
                rng.random_range(280.0..600.0),
                rng.random_range(12.0..18.0),
                rng.random_range(1.5..3.0),
            )
        })
        .collect()
}
