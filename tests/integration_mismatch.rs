//! Integration tests for the mismatch preset: two unevenly shaded
//! subarrays sharing one MPPT bus, with the voltage sweep enabled.

mod common;

use pv_sim::config::ScenarioConfig;
use pv_sim::sim::clock::Clock;
use pv_sim::sim::types::DerateFactors;

#[test]
fn mismatch_preset_runs_a_full_year() {
    let config = ScenarioConfig::from_preset("mismatch").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut weather = config.build_weather();
    let records = engine
        .run(|tick| weather.sample(tick), || true)
        .expect("mismatch run should succeed");

    assert_eq!(records.len(), config.build_sim().total_steps());
    for r in &records {
        assert_eq!(r.subarrays.len(), 2, "t={}", r.timestep);
    }

    let ledger = engine.ledger();
    let scale = ledger.poa_nominal_wh.max(1.0);
    assert!(ledger.conservation_error_wh().abs() / scale < 1e-9);
}

#[test]
fn sweep_mode_books_no_separate_clip_loss() {
    let config = ScenarioConfig::from_preset("mismatch").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut weather = config.build_weather();
    let records = engine
        .run(|tick| weather.sample(tick), || true)
        .expect("mismatch run should succeed");

    // The sweep evaluates candidates inside the window only, so the window
    // clamp never fires as its own loss stage.
    for r in &records {
        assert_eq!(r.mppt_clip_loss_w, 0.0, "t={}", r.timestep);
        assert!(!r.mppt_window_exceeded, "t={}", r.timestep);
    }
}

#[test]
fn swept_voltage_stays_inside_the_window() {
    let config = ScenarioConfig::from_preset("mismatch").expect("preset exists");
    let low = config.inverter.mppt_low_v;
    let high = config.inverter.mppt_high_v;
    let mut engine = common::build_engine(&config);
    let mut weather = config.build_weather();
    let records = engine
        .run(|tick| weather.sample(tick), || true)
        .expect("mismatch run should succeed");

    for r in records.iter().filter(|r| r.dc_gross_w > 0.0) {
        assert!(
            (low..=high).contains(&r.mppt_voltage_v),
            "voltage {} V outside window at t={}",
            r.mppt_voltage_v,
            r.timestep
        );
    }
}

#[test]
fn shaded_subarray_produces_less_per_module() {
    let config = ScenarioConfig::from_preset("mismatch").expect("preset exists");
    let mut engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);

    let rec = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(800.0, 20.0))
        .expect("daytime step should solve");

    // The second subarray carries a 25% beam shading loss.
    let clear = &rec.subarrays[0];
    let shaded = &rec.subarrays[1];
    assert!(shaded.gross_dc_w / 3.0 < clear.gross_dc_w / 4.0);
    assert!(shaded.i_sc < clear.i_sc);
}

#[test]
fn sweep_matches_independent_tracking_for_identical_subarrays() {
    // With identical twins, the shared best voltage is each twin's own MPP,
    // so the sweep should land within its grid resolution of the
    // unconstrained optimum.
    let mut config = ScenarioConfig::from_preset("mismatch").expect("preset exists");
    for sub in &mut config.subarrays {
        sub.strings_in_parallel = 4;
        sub.shading_beam_loss = 0.0;
        sub.soiling = 0.0;
        sub.mismatch = 0.0;
        sub.wiring = 0.0;
    }

    let mut swept_engine = common::build_engine(&config);
    let mut clock = Clock::new(8760, 1);
    let swept = swept_engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(800.0, 20.0))
        .expect("swept step should solve");

    config.array.mismatch_sweep = false;
    config.inverter.mppt_low_v = 0.0;
    config.inverter.mppt_high_v = 0.0;
    let mut free_engine = common::build_engine(&config);
    let mut free_clock = Clock::new(8760, 1);
    let free = free_engine
        .step(&free_clock.tick().unwrap(), &common::daytime_sample(800.0, 20.0))
        .expect("free step should solve");

    assert!(
        swept.dc_gross_w > 0.995 * free.dc_gross_w,
        "sweep {} W vs unconstrained {} W",
        swept.dc_gross_w,
        free.dc_gross_w
    );
}

#[test]
fn derate_factors_none_means_lossless_dc_chain() {
    let mut config = ScenarioConfig::baseline();
    config.subarrays[0].soiling = 0.0;
    config.subarrays[0].mismatch = 0.0;
    config.subarrays[0].wiring = 0.0;
    config.subarrays[0].annual_degradation = 0.0;

    let mut engine = common::build_engine(&config);
    assert_eq!(engine.subarrays()[0].derates, DerateFactors::none());

    let mut clock = Clock::new(8760, 1);
    let rec = engine
        .step(&clock.tick().unwrap(), &common::daytime_sample(800.0, 20.0))
        .expect("step should solve");
    assert!((rec.dc_net_w - rec.dc_gross_w).abs() < 1e-9);
}
