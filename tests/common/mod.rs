//! Shared test fixtures for integration tests.

use pv_sim::config::ScenarioConfig;
use pv_sim::sim::engine::Engine;
use pv_sim::sim::types::WeatherSample;

/// Builds an engine from a scenario config, panicking on build errors.
pub fn build_engine(config: &ScenarioConfig) -> Engine {
    Engine::new(
        config.build_sim(),
        config.build_module().expect("module config should build"),
        config.build_inverter().expect("inverter config should build"),
        config.build_cell_temp().expect("thermal config should build"),
        config.build_incidence().expect("optical config should build"),
        config.build_subarrays(),
        config.array.mismatch_sweep,
        config.array.ac_wiring_loss,
    )
}

/// A clear-sky daytime sample with decomposed irradiance components.
pub fn daytime_sample(beam_w_m2: f64, t_ambient_c: f64) -> WeatherSample {
    WeatherSample {
        beam_w_m2,
        diffuse_w_m2: 0.15 * beam_w_m2,
        ground_w_m2: 0.0,
        poa_w_m2: None,
        poa_from_weather_file: false,
        t_ambient_c,
        wind_m_s: 1.5,
        zenith_deg: 30.0,
        incidence_deg: 20.0,
    }
}

/// A night sample: no irradiance, the sun below the horizon.
pub fn night_sample(t_ambient_c: f64) -> WeatherSample {
    WeatherSample {
        beam_w_m2: 0.0,
        diffuse_w_m2: 0.0,
        ground_w_m2: 0.0,
        poa_w_m2: None,
        poa_from_weather_file: false,
        t_ambient_c,
        wind_m_s: 1.0,
        zenith_deg: 110.0,
        incidence_deg: 89.0,
    }
}
