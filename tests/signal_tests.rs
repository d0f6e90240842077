//! Signal controller state machine tests
//!
//! Covers fixed-time cycling, emergency preemption and the handling of
//! requests that arrive during the clearance interval.

use evd_sim::simulation::{
    Approach, EmergencyVehicle, Phase, SignalConfig, SignalController, Subphase, VehicleId,
    AMBULANCE,
};

fn vehicle_on(approach: Approach) -> EmergencyVehicle {
    EmergencyVehicle::new(VehicleId(1), AMBULANCE, approach, 200.0, 15.0, 2.0)
}

fn step_n(controller: &mut SignalController, n: usize, dt: f64, ev_mode: bool) {
    for _ in 0..n {
        controller.step(dt, ev_mode);
    }
}

#[test]
fn test_initial_state_is_north_south_green() {
    let controller = SignalController::default();
    let state = controller.state();
    assert_eq!(state.phase, Phase::NorthSouth);
    assert_eq!(state.subphase, Subphase::Green);
    assert_eq!(state.time_in_state_s, 0.0);
    assert_eq!(controller.queued_phase(), None);
}

#[test]
fn test_fixed_time_cycle_toggles_phase() {
    let mut controller = SignalController::default();

    step_n(&mut controller, 29, 1.0, false);
    assert_eq!(controller.state().subphase, Subphase::Green);

    // Green times out at 30 s
    controller.step(1.0, false);
    assert_eq!(controller.state().subphase, Subphase::Yellow);
    assert_eq!(controller.state().phase, Phase::NorthSouth);
    assert_eq!(controller.queued_phase(), Some(Phase::EastWest));

    // yellow_s + all_red_s of clearance, sampled every second
    let mut observed = vec![controller.state().subphase];
    for _ in 0..4 {
        controller.step(1.0, false);
        let subphase = controller.state().subphase;
        if observed.last() != Some(&subphase) {
            observed.push(subphase);
        }
    }

    assert_eq!(
        observed,
        vec![Subphase::Yellow, Subphase::AllRed, Subphase::Green]
    );
    assert_eq!(controller.state().phase, Phase::EastWest);
    assert_eq!(controller.state().time_in_state_s, 0.0);
    assert_eq!(controller.queued_phase(), None);
}

#[test]
fn test_ev_mode_suppresses_fixed_time_cycling() {
    let mut controller = SignalController::default();
    step_n(&mut controller, 200, 0.5, true);

    let state = controller.state();
    assert_eq!(state.phase, Phase::NorthSouth);
    assert_eq!(state.subphase, Subphase::Green);
    assert_eq!(state.time_in_state_s, 100.0);
}

#[test]
fn test_preemption_switches_to_requested_phase() {
    let config = SignalConfig::default();
    let mut controller = SignalController::new(config);
    step_n(&mut controller, 5, 1.0, true);
    assert_eq!(controller.state().time_in_state_s, 5.0);

    let started = controller.request_phase_for_ev(&vehicle_on(Approach::East));
    assert!(started);
    assert_eq!(controller.state().subphase, Subphase::Yellow);
    assert_eq!(controller.state().phase, Phase::NorthSouth);
    assert_eq!(controller.state().time_in_state_s, 0.0);
    assert_eq!(controller.queued_phase(), Some(Phase::EastWest));

    step_n(&mut controller, 3, 1.0, true);
    assert_eq!(controller.state().subphase, Subphase::AllRed);

    controller.step(1.0, true);
    assert_eq!(controller.state().phase, Phase::EastWest);
    assert_eq!(controller.state().subphase, Subphase::Green);
    assert_eq!(controller.queued_phase(), None);
}

#[test]
fn test_request_for_current_phase_is_ignored() {
    let mut controller = SignalController::default();
    step_n(&mut controller, 4, 1.0, true);

    assert!(!controller.request_phase_for_ev(&vehicle_on(Approach::South)));
    assert_eq!(controller.state().subphase, Subphase::Green);
    assert_eq!(controller.state().time_in_state_s, 4.0);
}

#[test]
fn test_requests_during_clearance_are_dropped() {
    let mut with_requests = SignalController::default();
    let mut without_requests = SignalController::default();

    // Fixed-time timeout on the north-south green
    step_n(&mut with_requests, 30, 1.0, false);
    step_n(&mut without_requests, 30, 1.0, false);
    assert_eq!(with_requests.state().subphase, Subphase::Yellow);

    for _ in 0..4 {
        for approach in Approach::ALL {
            assert!(!with_requests.request_phase_for_ev(&vehicle_on(approach)));
        }
        with_requests.step(1.0, false);
        without_requests.step(1.0, false);
        assert_eq!(with_requests.state(), without_requests.state());
        assert_eq!(with_requests.queued_phase(), without_requests.queued_phase());
    }

    assert_eq!(with_requests.state().phase, Phase::EastWest);
    assert_eq!(with_requests.state().subphase, Subphase::Green);
}

#[test]
fn test_green_approaches_follow_phase() {
    let mut controller = SignalController::default();
    assert_eq!(
        controller.current_green_approaches(),
        [Approach::North, Approach::South]
    );
    assert!(controller.is_green(Approach::North));
    assert!(!controller.is_green(Approach::East));

    controller.request_phase_for_ev(&vehicle_on(Approach::West));
    // Yellow serves nobody
    assert!(!controller.is_green(Approach::North));
    assert!(!controller.is_green(Approach::West));

    step_n(&mut controller, 4, 1.0, true);
    assert_eq!(
        controller.current_green_approaches(),
        [Approach::East, Approach::West]
    );
    assert!(controller.is_green(Approach::West));
    assert!(!controller.is_green(Approach::South));
}

#[test]
fn test_custom_timings_are_respected() {
    let mut controller = SignalController::new(SignalConfig {
        yellow_s: 2.0,
        all_red_s: 2.0,
        default_cycle_green_s: 10.0,
    });

    step_n(&mut controller, 20, 0.5, false);
    assert_eq!(controller.state().subphase, Subphase::Yellow);
    step_n(&mut controller, 4, 0.5, false);
    assert_eq!(controller.state().subphase, Subphase::AllRed);
    step_n(&mut controller, 4, 0.5, false);
    assert_eq!(controller.state().subphase, Subphase::Green);
    assert_eq!(controller.state().phase, Phase::EastWest);
}
