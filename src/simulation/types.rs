//! Core types for the emergency-vehicle preemption simulation
//!
//! Plain value types shared by the detectors, scheduler, controller and world.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// A unique identifier for an emergency vehicle
/// Ids are 1-based and follow generation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev{}", self.0)
    }
}

/// Road approach a vehicle arrives from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Approach {
    North,
    East,
    South,
    West,
}

impl Approach {
    pub const ALL: [Approach; 4] = [
        Approach::North,
        Approach::East,
        Approach::South,
        Approach::West,
    ];

    /// The signal phase that gives this approach right-of-way
    pub fn phase(self) -> Phase {
        match self {
            Approach::North | Approach::South => Phase::NorthSouth,
            Approach::East | Approach::West => Phase::EastWest,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Approach::North => "N",
            Approach::East => "E",
            Approach::South => "S",
            Approach::West => "W",
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which pair of conflicting approaches holds right-of-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    NorthSouth,
    EastWest,
}

impl Phase {
    pub fn opposite(self) -> Phase {
        match self {
            Phase::NorthSouth => Phase::EastWest,
            Phase::EastWest => Phase::NorthSouth,
        }
    }

    pub fn approaches(self) -> [Approach; 2] {
        match self {
            Phase::NorthSouth => [Approach::North, Approach::South],
            Phase::EastWest => [Approach::East, Approach::West],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NorthSouth => f.write_str("NS"),
            Phase::EastWest => f.write_str("EW"),
        }
    }
}

/// Signal state within a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subphase {
    Green,
    Yellow,
    AllRed,
}

impl fmt::Display for Subphase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subphase::Green => f.write_str("GREEN"),
            Subphase::Yellow => f.write_str("YELLOW"),
            Subphase::AllRed => f.write_str("ALL_RED"),
        }
    }
}

/// Kind of emergency vehicle
/// Lower priority weight is served first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvType {
    pub name: &'static str,
    pub priority_weight: f64,
}

pub const AMBULANCE: EvType = EvType {
    name: "AMBULANCE",
    priority_weight: 0.8,
};

pub const FIRE_TRUCK: EvType = EvType {
    name: "FIRE_TRUCK",
    priority_weight: 1.0,
};

pub const POLICE: EvType = EvType {
    name: "POLICE",
    priority_weight: 1.1,
};

pub const EV_TYPES: [EvType; 3] = [AMBULANCE, FIRE_TRUCK, POLICE];

/// Whether the sensors have picked up a vehicle yet
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Detection {
    #[default]
    NotDetected,
    Detected {
        at_s: f64,
    },
}

/// Whether a vehicle has cleared the stop line yet
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Passage {
    #[default]
    EnRoute,
    Passed {
        at_s: f64,
    },
}

/// Sensor modality feeding the fusion step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Vision,
    Audio,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Vision => f.write_str("vision"),
            Modality::Audio => f.write_str("audio"),
        }
    }
}

/// Whether the controller reacts to detected emergency vehicles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OperatingMode {
    /// Fixed-time cycling, no preemption
    Baseline,
    /// Detection-driven preemption
    #[default]
    Evd,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Baseline => f.write_str("baseline"),
            OperatingMode::Evd => f.write_str("evd"),
        }
    }
}

impl FromStr for OperatingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baseline" => Ok(OperatingMode::Baseline),
            "evd" => Ok(OperatingMode::Evd),
            other => bail!("Unknown operating mode: {other}"),
        }
    }
}

/// Where detection confidences come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DetectorMode {
    /// Distance-based synthetic confidences with Gaussian noise
    #[default]
    Stub,
    /// Recorded confidences read from vision.csv and audio.csv
    Playback,
    /// Confidences pushed in by an outside caller
    External,
}

impl fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorMode::Stub => f.write_str("stub"),
            DetectorMode::Playback => f.write_str("playback"),
            DetectorMode::External => f.write_str("external"),
        }
    }
}

impl FromStr for DetectorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stub" => Ok(DetectorMode::Stub),
            "playback" => Ok(DetectorMode::Playback),
            "external" => Ok(DetectorMode::External),
            other => bail!("Unknown detector mode: {other}"),
        }
    }
}

pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
