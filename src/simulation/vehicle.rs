//! Emergency vehicle state and movement
//!
//! Vehicles move along a single approach towards the stop line. Distance is
//! measured to the line and never increases.

use super::types::{Approach, Detection, EvType, Passage, VehicleId};

/// An emergency vehicle approaching the intersection
#[derive(Debug, Clone)]
pub struct EmergencyVehicle {
    pub id: VehicleId,
    pub ev_type: EvType,
    pub approach: Approach,
    pub distance_m: f64,
    /// Speed while the approach has a green signal
    pub speed_free_m_s: f64,
    /// Speed while queued behind a red signal
    pub speed_blocked_m_s: f64,
    detection: Detection,
    passage: Passage,
}

impl EmergencyVehicle {
    pub fn new(
        id: VehicleId,
        ev_type: EvType,
        approach: Approach,
        distance_m: f64,
        speed_free_m_s: f64,
        speed_blocked_m_s: f64,
    ) -> Self {
        Self {
            id,
            ev_type,
            approach,
            distance_m: distance_m.max(0.0),
            speed_free_m_s,
            speed_blocked_m_s,
            detection: Detection::NotDetected,
            passage: Passage::EnRoute,
        }
    }

    pub fn detection(&self) -> Detection {
        self.detection
    }

    pub fn passage(&self) -> Passage {
        self.passage
    }

    pub fn is_detected(&self) -> bool {
        matches!(self.detection, Detection::Detected { .. })
    }

    pub fn has_passed(&self) -> bool {
        matches!(self.passage, Passage::Passed { .. })
    }

    /// Detected and still on the approach
    pub fn is_active_target(&self) -> bool {
        self.is_detected() && !self.has_passed()
    }

    pub fn detection_time_s(&self) -> Option<f64> {
        match self.detection {
            Detection::Detected { at_s } => Some(at_s),
            Detection::NotDetected => None,
        }
    }

    pub fn pass_time_s(&self) -> Option<f64> {
        match self.passage {
            Passage::Passed { at_s } => Some(at_s),
            Passage::EnRoute => None,
        }
    }

    /// Record detection at `time_s`
    /// Returns false if the vehicle was already detected
    pub fn mark_detected(&mut self, time_s: f64) -> bool {
        if self.is_detected() {
            return false;
        }
        self.detection = Detection::Detected { at_s: time_s };
        true
    }

    /// Advance the vehicle by one step
    /// Returns true when this step brought the vehicle across the stop line
    pub fn advance(&mut self, has_green: bool, dt_s: f64, time_s: f64) -> bool {
        if self.has_passed() {
            return false;
        }

        let speed = if has_green {
            self.speed_free_m_s
        } else {
            self.speed_blocked_m_s
        };
        self.distance_m = (self.distance_m - speed * dt_s).max(0.0);

        if self.distance_m <= 0.0 {
            self.passage = Passage::Passed { at_s: time_s };
            return true;
        }
        false
    }
}
