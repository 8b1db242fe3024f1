//! Config-driven scenario execution.
//!
//! Builds the full model stack from a [`ScenarioConfig`], runs the engine
//! over synthetic weather, and packages records, the energy report, and the
//! loss ledger into one result.

use std::fmt;

use crate::config::{ConfigError, ScenarioConfig};
use crate::error::SimError;
use crate::sim::engine::Engine;
use crate::sim::losses::LossLedger;
use crate::sim::report::EnergyReport;
use crate::sim::types::StepRecord;

/// Everything a finished run produces.
pub struct SimulationResult {
    pub records: Vec<StepRecord>,
    pub report: EnergyReport,
    pub ledger: LossLedger,
}

/// Failure modes of a scenario run: the config did not build, or the
/// numeric solve gave up mid-run.
#[derive(Debug)]
pub enum RunError {
    Config(ConfigError),
    Sim(SimError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "{e}"),
            RunError::Sim(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Config(e) => Some(e),
            RunError::Sim(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

impl From<SimError> for RunError {
    fn from(e: SimError) -> Self {
        RunError::Sim(e)
    }
}

/// Runs one scenario end to end.
///
/// Builds the module, thermal, optical, and inverter models from the config,
/// then steps the engine over the synthetic weather series. With
/// `print_readable_log` set, prints one line per step.
///
/// # Errors
///
/// Returns [`RunError::Config`] if a config section fails to build and
/// [`RunError::Sim`] if the diode solve diverges during the run.
pub fn run_scenario(
    config: &ScenarioConfig,
    print_readable_log: bool,
) -> Result<SimulationResult, RunError> {
    let sim = config.build_sim();
    let module = config.build_module()?;
    let cell_temp = config.build_cell_temp()?;
    let incidence = config.build_incidence()?;
    let inverter = config.build_inverter()?;
    let subarrays = config.build_subarrays();
    let mut weather = config.build_weather();

    let mut engine = Engine::new(
        sim,
        module,
        inverter,
        cell_temp,
        incidence,
        subarrays,
        config.array.mismatch_sweep,
        config.array.ac_wiring_loss,
    );

    let records = engine.run(|tick| weather.sample(tick), || true)?;

    if print_readable_log {
        for r in &records {
            println!("{r}");
        }
    }

    let report = EnergyReport::from_records(
        &records,
        engine.config().dt_hours,
        engine.mppt_window_count(),
    );
    let ledger = engine.ledger().clone();

    Ok(SimulationResult {
        records,
        report,
        ledger,
    })
}

#[cfg(test)]
mod tests {
    use super::run_scenario;
    use crate::config::ScenarioConfig;
    use crate::io::export::write_csv;

    #[test]
    fn baseline_preset_runs_to_completion() {
        let config = ScenarioConfig::from_preset("baseline").expect("preset exists");
        let result = run_scenario(&config, false).expect("baseline run should succeed");
        assert_eq!(result.records.len(), config.build_sim().total_steps());
        assert!(result.report.net_ac_kwh > 0.0);
    }

    #[test]
    fn same_scenario_and_seed_is_deterministic() {
        let config = ScenarioConfig::from_preset("baseline").expect("preset exists");

        let run_a = run_scenario(&config, false).expect("first run should succeed");
        let run_b = run_scenario(&config, false).expect("second run should succeed");

        let mut out_a = Vec::new();
        write_csv(&run_a.records, &mut out_a).expect("first export should succeed");

        let mut out_b = Vec::new();
        write_csv(&run_b.records, &mut out_b).expect("second export should succeed");

        assert_eq!(out_a, out_b);
    }

    #[test]
    fn ledger_balances_for_every_preset() {
        for &name in ScenarioConfig::PRESETS {
            let config = ScenarioConfig::from_preset(name).expect("preset exists");
            let result = run_scenario(&config, false).expect("preset run should succeed");
            let scale = result.ledger.poa_nominal_wh.max(1.0);
            assert!(
                result.ledger.conservation_error_wh().abs() / scale < 1e-9,
                "preset {name} leaks energy"
            );
        }
    }
}
