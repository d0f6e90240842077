//! Emergency-vehicle signal preemption simulation
//!
//! This module contains the whole simulation core: detection providers,
//! sensor fusion, the priority scheduler, the signal controller and the
//! world that runs them tick by tick. It has no I/O in the tick loop and can
//! be driven directly from tests.

mod detector;
mod fusion;
mod inputs;
mod intersection;
mod scheduler;
mod summary;
mod timeline;
mod types;
mod vehicle;
mod world;

pub use detector::{
    ConfidenceSource, ExternalDetector, PlaybackDetector, SensorPair, StubDetector, StubProfile,
    AUDIO_INPUT_FILE, TIME_COLUMN, VEHICLE_COLUMN_PREFIX, VISION_INPUT_FILE,
};
pub use fusion::{fuse, noisy_or, FusionResult, FusionThresholds};
pub use inputs::{generate_sample_inputs, SampleInputs};
pub use intersection::{SignalConfig, SignalController, SignalState};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use summary::{PassTimeStats, RunSummary};
pub use timeline::{TimelineRecord, VehicleSnapshot, TIMELINE_FILE};
pub use types::{
    Approach, Detection, DetectorMode, EvType, Modality, OperatingMode, Passage, Phase, Subphase,
    VehicleId, AMBULANCE, EV_TYPES, FIRE_TRUCK, POLICE,
};
pub use vehicle::EmergencyVehicle;
pub use world::{SimConfig, SimWorld, WorldOptions};
