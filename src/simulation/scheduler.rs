//! Priority selection among detected emergency vehicles
//!
//! Shortest-expected-arrival-first: the vehicle with the lowest weighted ETA
//! gets the green.

use std::collections::HashMap;

use ordered_float::OrderedFloat;

use super::types::Approach;
use super::vehicle::EmergencyVehicle;

/// Static scheduler parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Congestion multiplier applied to each approach's ETA
    pub traffic_density: HashMap<Approach, f64>,
    /// Floor for the speed estimate, in m/s
    pub min_speed_m_s: f64,
    /// Fraction of free-flow speed assumed for the ETA estimate
    pub speed_discount: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            traffic_density: HashMap::from([
                (Approach::North, 1.2),
                (Approach::East, 1.0),
                (Approach::South, 1.3),
                (Approach::West, 0.9),
            ]),
            min_speed_m_s: 6.0,
            speed_discount: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Estimated seconds until the vehicle reaches the stop line
    pub fn eta_s(&self, ev: &EmergencyVehicle) -> f64 {
        let speed_estimate = self
            .config
            .min_speed_m_s
            .max(self.config.speed_discount * ev.speed_free_m_s);
        ev.distance_m / speed_estimate
    }

    /// Approaches missing from the density table count as 1.0
    pub fn density(&self, approach: Approach) -> f64 {
        self.config
            .traffic_density
            .get(&approach)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn cost(&self, ev: &EmergencyVehicle) -> f64 {
        self.eta_s(ev) * self.density(ev.approach) + ev.ev_type.priority_weight
    }

    /// Lowest-cost vehicle that is detected and has not passed
    /// On equal cost the earliest vehicle in iteration order wins
    pub fn pick<'a, I>(&self, vehicles: I) -> Option<&'a EmergencyVehicle>
    where
        I: IntoIterator<Item = &'a EmergencyVehicle>,
    {
        vehicles
            .into_iter()
            .filter(|ev| ev.is_active_target())
            .min_by_key(|ev| OrderedFloat(self.cost(ev)))
    }
}
