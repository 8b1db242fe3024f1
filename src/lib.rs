//! Per-timestep photovoltaic array electrical simulator.

/// Scenario configuration, presets, and model builders.
pub mod config;
pub mod error;
pub mod interp;
/// DC→AC inverter conversion models.
pub mod inverter;
pub mod io;
/// Single-diode module model, cell temperature, and optical derates.
pub mod module;
pub mod runner;
/// Simulation engine, MPPT coordination, loss ledger, and reporting.
pub mod sim;
pub mod weather;
