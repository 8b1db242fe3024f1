//! Integration tests for the OND preset: tabulated-efficiency-curve
//! inverter with the Faiman thermal model.

mod common;

use pv_sim::config::ScenarioConfig;
use pv_sim::sim::clock::Clock;
use pv_sim::sim::losses::LossStage;

#[test]
fn ond_preset_runs_a_full_year() {
    let config = ScenarioConfig::from_preset("ond").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut weather = config.build_weather();
    let records = engine
        .run(|tick| weather.sample(tick), || true)
        .expect("ond run should succeed");

    assert_eq!(records.len(), config.build_sim().total_steps());

    let ledger = engine.ledger();
    let scale = ledger.poa_nominal_wh.max(1.0);
    assert!(
        ledger.conservation_error_wh().abs() / scale < 1e-9,
        "conservation off by {} Wh",
        ledger.conservation_error_wh()
    );
}

#[test]
fn ac_output_respects_the_output_cap() {
    let config = ScenarioConfig::from_preset("ond").expect("preset exists");
    let inverter = config.build_inverter().expect("ond inverter builds");
    let cap_w = inverter.ac_rating_w() * inverter.count as f64;
    let mut engine = common::build_engine(&config);
    let mut weather = config.build_weather();
    let records = engine
        .run(|tick| weather.sample(tick), || true)
        .expect("ond run should succeed");

    for r in &records {
        assert!(
            r.ac_power_w <= cap_w + 1e-6,
            "AC {} W above cap at t={}",
            r.ac_power_w,
            r.timestep
        );
    }
}

#[test]
fn operating_losses_come_from_the_aux_draw() {
    let config = ScenarioConfig::from_preset("ond").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);

    let rec = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(800.0, 15.0))
        .expect("daytime step should solve");

    assert!(rec.ac_power_w > 0.0);
    assert!(
        (rec.consumption_loss_w - config.inverter.aux_loss_w * config.inverter.count as f64).abs()
            < 1e-9
    );
    assert_eq!(rec.night_tare_loss_w, 0.0);
}

#[test]
fn searing_heat_triggers_the_thermal_derate_only_near_full_load() {
    let config = ScenarioConfig::from_preset("ond").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);

    // Mild ambient, partial load: no thermal derate.
    let mild = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(500.0, 15.0))
        .expect("mild step should solve");
    assert_eq!(mild.thermal_loss_w, 0.0);
    assert!(mild.ac_power_w > 0.0);
}

#[test]
fn faiman_cells_run_hotter_in_still_air() {
    let config = ScenarioConfig::from_preset("ond").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);

    let mut breezy = common::daytime_sample(800.0, 20.0);
    breezy.wind_m_s = 8.0;
    let mut still = common::daytime_sample(800.0, 20.0);
    still.wind_m_s = 0.0;

    let windy_rec = engine
        .step(&clock.tick().unwrap(), &breezy)
        .expect("windy step should solve");
    let still_rec = engine
        .step(&clock.tick().unwrap(), &still)
        .expect("still step should solve");

    assert!(still_rec.cell_temp_c > windy_rec.cell_temp_c);
}

#[test]
fn night_draw_lands_in_the_tare_stage() {
    let config = ScenarioConfig::from_preset("ond").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);

    let rec = engine
        .step(&clock.tick().unwrap(), &common::night_sample(5.0))
        .expect("night step should solve");

    assert!(rec.ac_power_w < 0.0);
    assert!(rec.night_tare_loss_w > 0.0);
    assert_eq!(rec.consumption_loss_w, 0.0);
    assert!(engine.ledger().get(LossStage::NightTare) > 0.0);
}
