//! Signal controller for the two-phase intersection
//!
//! Standalone state machine over (phase, subphase). Normal operation cycles
//! on a fixed green time; emergency preemption cuts the current green short.

use log::debug;

use super::types::{Approach, Phase, Subphase};
use super::vehicle::EmergencyVehicle;

/// Signal timing in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConfig {
    pub yellow_s: f64,
    pub all_red_s: f64,
    /// Green time used by normal fixed-time cycling
    pub default_cycle_green_s: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            yellow_s: 3.0,
            all_red_s: 1.0,
            default_cycle_green_s: 30.0,
        }
    }
}

/// Snapshot of the signal
/// Replaced as a whole on every transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalState {
    pub phase: Phase,
    pub subphase: Subphase,
    pub time_in_state_s: f64,
}

impl SignalState {
    pub fn new(phase: Phase, subphase: Subphase) -> Self {
        Self {
            phase,
            subphase,
            time_in_state_s: 0.0,
        }
    }
}

/// The intersection's signal controller
#[derive(Debug, Clone)]
pub struct SignalController {
    config: SignalConfig,
    state: SignalState,
    /// Phase to serve at the end of the current clearance interval
    queued_phase: Option<Phase>,
}

impl Default for SignalController {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}

impl SignalController {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            state: SignalState::new(Phase::NorthSouth, Subphase::Green),
            queued_phase: None,
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn queued_phase(&self) -> Option<Phase> {
        self.queued_phase
    }

    /// Approaches served by the current phase
    /// Only meaningful while the subphase is green
    pub fn current_green_approaches(&self) -> [Approach; 2] {
        self.state.phase.approaches()
    }

    /// Whether `approach` may move right now
    pub fn is_green(&self, approach: Approach) -> bool {
        self.state.subphase == Subphase::Green && approach.phase() == self.state.phase
    }

    /// Ask for the phase serving `ev`
    ///
    /// Ends the current green at once when it serves the other phase. Requests
    /// made during yellow or all-red are dropped, not deferred. Returns true
    /// if the request started a preemption.
    pub fn request_phase_for_ev(&mut self, ev: &EmergencyVehicle) -> bool {
        let desired = ev.approach.phase();
        if desired == self.state.phase || self.state.subphase != Subphase::Green {
            return false;
        }

        debug!(
            "Preempting {} green for {} on approach {}",
            self.state.phase, ev.id, ev.approach
        );
        self.transition(self.state.phase, Subphase::Yellow);
        self.queued_phase = Some(desired);
        true
    }

    /// Advance the signal clock by `dt_s`
    /// With `ev_mode` set, green never times out on its own
    pub fn step(&mut self, dt_s: f64, ev_mode: bool) {
        self.state.time_in_state_s += dt_s;
        let SignalState {
            phase,
            subphase,
            time_in_state_s,
        } = self.state;

        match subphase {
            Subphase::Green => {
                if !ev_mode && time_in_state_s >= self.config.default_cycle_green_s {
                    self.transition(phase, Subphase::Yellow);
                    self.queued_phase = Some(phase.opposite());
                }
            }
            Subphase::Yellow => {
                if time_in_state_s >= self.config.yellow_s {
                    self.transition(phase, Subphase::AllRed);
                }
            }
            Subphase::AllRed => {
                if time_in_state_s >= self.config.all_red_s {
                    let next = self.queued_phase.take().unwrap_or(phase.opposite());
                    self.transition(next, Subphase::Green);
                }
            }
        }
    }

    fn transition(&mut self, phase: Phase, subphase: Subphase) {
        debug!(
            "Signal {}/{} -> {}/{}",
            self.state.phase, self.state.subphase, phase, subphase
        );
        self.state = SignalState::new(phase, subphase);
    }
}
