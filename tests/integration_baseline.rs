//! Integration tests for the baseline scenario: one subarray, Sandia
//! inverter, NOCT thermal model, one simulated year of synthetic weather.

mod common;

use pv_sim::config::ScenarioConfig;
use pv_sim::io::export::write_csv;
use pv_sim::sim::clock::Clock;

fn run_baseline() -> (ScenarioConfig, Vec<pv_sim::sim::types::StepRecord>, pv_sim::sim::losses::LossLedger) {
    let config = ScenarioConfig::baseline();
    let mut engine = common::build_engine(&config);
    let mut weather = config.build_weather();
    let records = engine
        .run(|tick| weather.sample(tick), || true)
        .expect("baseline run should succeed");
    let ledger = engine.ledger().clone();
    (config, records, ledger)
}

#[test]
fn full_year_produces_one_record_per_step() {
    let (config, records, _) = run_baseline();
    assert_eq!(records.len(), config.build_sim().total_steps());
}

#[test]
fn ac_output_never_exceeds_nameplate() {
    let (config, records, _) = run_baseline();
    let inverter = config.build_inverter().expect("baseline inverter builds");
    let nameplate_w = inverter.ac_rating_w() * inverter.count as f64;
    for r in &records {
        assert!(
            r.ac_power_w <= nameplate_w + 1e-6,
            "AC {} W above nameplate at t={}",
            r.ac_power_w,
            r.timestep
        );
    }
}

#[test]
fn night_steps_draw_the_tare_and_produce_no_dc() {
    let (config, records, _) = run_baseline();
    let tare_w = config.inverter.pntare_w * config.inverter.count as f64;
    let mut night_steps = 0;
    for r in records.iter().filter(|r| r.poa_nominal_w == 0.0) {
        assert_eq!(r.dc_gross_w, 0.0, "dark step t={} made DC power", r.timestep);
        assert!(
            (r.ac_power_w + tare_w).abs() < 1e-9,
            "dark step t={} should draw exactly the tare, got {} W",
            r.timestep,
            r.ac_power_w
        );
        assert!(r.night_tare_loss_w > 0.0);
        night_steps += 1;
    }
    assert!(night_steps > 1000, "a year should contain many dark steps");
}

#[test]
fn daylight_steps_generate() {
    let (_, records, _) = run_baseline();
    let generating = records.iter().filter(|r| r.ac_power_w > 0.0).count();
    assert!(
        generating > 2000,
        "expected thousands of generating steps, got {generating}"
    );
}

#[test]
fn ledger_identities_hold_over_the_full_year() {
    let (_, _, ledger) = run_baseline();
    let scale = ledger.poa_nominal_wh.max(1.0);
    assert!(
        ledger.dc_identity_error_wh().abs() / scale < 1e-9,
        "DC identity off by {} Wh",
        ledger.dc_identity_error_wh()
    );
    assert!(
        ledger.ac_identity_error_wh().abs() / scale < 1e-9,
        "AC identity off by {} Wh",
        ledger.ac_identity_error_wh()
    );
    assert!(
        ledger.conservation_error_wh().abs() / scale < 1e-9,
        "conservation off by {} Wh",
        ledger.conservation_error_wh()
    );
}

#[test]
fn determinism_same_seed_gives_byte_identical_csv() {
    let (_, records_a, _) = run_baseline();
    let (_, records_b, _) = run_baseline();

    let mut out_a = Vec::new();
    write_csv(&records_a, &mut out_a).expect("first export should succeed");
    let mut out_b = Vec::new();
    write_csv(&records_b, &mut out_b).expect("second export should succeed");

    assert_eq!(out_a, out_b);
}

#[test]
fn stronger_irradiance_makes_more_dc_power() {
    let config = ScenarioConfig::baseline();
    let mut engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);

    let dim = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(400.0, 20.0))
        .expect("dim step should solve");
    let bright = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(800.0, 20.0))
        .expect("bright step should solve");

    assert!(bright.dc_gross_w > dim.dc_gross_w);
    assert!(bright.ac_power_w > dim.ac_power_w);
}

#[test]
fn hot_cells_make_less_power_than_cold_cells() {
    let config = ScenarioConfig::baseline();
    let mut engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);

    let cold = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(800.0, 0.0))
        .expect("cold step should solve");
    let hot = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(800.0, 40.0))
        .expect("hot step should solve");

    assert!(hot.cell_temp_c > cold.cell_temp_c);
    assert!(hot.dc_gross_w < cold.dc_gross_w);
}
