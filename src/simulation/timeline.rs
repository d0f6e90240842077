//! Per-tick run log and its CSV artifact

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use super::types::{Phase, Subphase, VehicleId};
use super::vehicle::EmergencyVehicle;

/// File name of the run artifact inside the output directory
pub const TIMELINE_FILE: &str = "timeline.csv";

/// One vehicle's state at the end of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub distance_m: f64,
    pub detected: bool,
    pub passed: bool,
}

impl From<&EmergencyVehicle> for VehicleSnapshot {
    fn from(ev: &EmergencyVehicle) -> Self {
        Self {
            id: ev.id,
            distance_m: ev.distance_m,
            detected: ev.is_detected(),
            passed: ev.has_passed(),
        }
    }
}

/// State of the intersection at the end of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRecord {
    pub time_s: f64,
    pub phase: Phase,
    pub subphase: Subphase,
    /// Vehicles that have not passed yet
    pub active: usize,
    pub vehicles: Vec<VehicleSnapshot>,
}

impl TimelineRecord {
    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleSnapshot> {
        self.vehicles.iter().find(|v| v.id == id)
    }
}

/// Column names for a run over `vehicles`
/// The column set stays fixed for the whole run
pub fn header(vehicles: &[VehicleSnapshot]) -> Vec<String> {
    let mut columns = vec![
        "t".to_string(),
        "phase".to_string(),
        "subphase".to_string(),
        "evs_active".to_string(),
    ];
    for v in vehicles {
        columns.push(format!("{}_d", v.id));
        columns.push(format!("{}_det", v.id));
        columns.push(format!("{}_passed", v.id));
    }
    columns
}

fn row(record: &TimelineRecord) -> Vec<String> {
    let mut fields = vec![
        format!("{:.2}", record.time_s),
        record.phase.to_string(),
        record.subphase.to_string(),
        record.active.to_string(),
    ];
    for v in &record.vehicles {
        fields.push(format!("{:.1}", v.distance_m));
        fields.push((v.detected as u8).to_string());
        fields.push((v.passed as u8).to_string());
    }
    fields
}

/// Write `records` as CSV to any writer
pub fn write_records<W: Write>(writer: W, records: &[TimelineRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    if let Some(first) = records.first() {
        writer.write_record(header(&first.vehicles))?;
    }
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `records` to `path`, replacing any existing file
pub fn write_csv(path: &Path, records: &[TimelineRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_records(file, records).with_context(|| format!("Failed to write {}", path.display()))
}
