//! Emergency Vehicle Detection Simulation Library
//!
//! Simulates a two-phase signalized intersection that preempts its cycle for
//! detected emergency vehicles, so a detection-driven mode can be compared
//! against a fixed-time baseline.

pub mod simulation;
