//! Core simulation types: configuration, weather input, subarray state, and
//! step records.

use std::fmt;

/// Hours in one simulated year.
pub const HOURS_PER_YEAR: usize = 8760;

/// Centralized simulation configuration.
///
/// The engine and clock reference this struct for timing parameters,
/// eliminating duplicated `dt_hours` computations.
///
/// # Examples
///
/// ```
/// use pv_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(1, 1, 42, 0.0);
/// assert_eq!(cfg.dt_hours, 1.0);
/// assert_eq!(cfg.steps_per_year(), 8760);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of sub-hourly timesteps per hour.
    pub steps_per_hour: usize,
    /// Number of years to simulate.
    pub years: usize,
    /// Duration of one timestep in hours, derived as `1.0 / steps_per_hour`.
    pub dt_hours: f64,
    /// Master random seed for the synthetic weather driver.
    pub seed: u64,
    /// Site elevation above sea level (m), for the air-mass pressure
    /// correction.
    pub elevation_m: f64,
}

impl SimConfig {
    /// Creates a new simulation configuration.
    ///
    /// # Panics
    ///
    /// Panics if `steps_per_hour` or `years` is zero.
    pub fn new(steps_per_hour: usize, years: usize, seed: u64, elevation_m: f64) -> Self {
        assert!(steps_per_hour > 0, "steps_per_hour must be > 0");
        assert!(years > 0, "years must be > 0");
        Self {
            steps_per_hour,
            years,
            dt_hours: 1.0 / steps_per_hour as f64,
            seed,
            elevation_m,
        }
    }

    /// Number of timesteps in one simulated year.
    pub fn steps_per_year(&self) -> usize {
        HOURS_PER_YEAR * self.steps_per_hour
    }

    /// Total number of timesteps across the whole lifetime run.
    pub fn total_steps(&self) -> usize {
        self.steps_per_year() * self.years
    }
}

/// One timestep of weather input, produced by an external weather source or
/// the synthetic generator.
#[derive(Debug, Clone, Copy)]
pub struct WeatherSample {
    /// Plane-of-array beam component (W/m²).
    pub beam_w_m2: f64,
    /// Plane-of-array sky-diffuse component (W/m²).
    pub diffuse_w_m2: f64,
    /// Plane-of-array ground-reflected component (W/m²).
    pub ground_w_m2: f64,
    /// Direct POA total when the weather source measured it (W/m²);
    /// `None` when POA is the decomposed component sum.
    pub poa_w_m2: Option<f64>,
    /// Whether `poa_w_m2` came straight from a reference-cell measurement,
    /// in which case cover (incidence) effects are already embodied and are
    /// skipped.
    pub poa_from_weather_file: bool,
    /// Ambient dry-bulb temperature (°C).
    pub t_ambient_c: f64,
    /// Wind speed (m/s).
    pub wind_m_s: f64,
    /// Solar zenith angle (deg).
    pub zenith_deg: f64,
    /// Angle of incidence on the collector plane (deg).
    pub incidence_deg: f64,
}

impl WeatherSample {
    /// Total plane-of-array irradiance before any derate (W/m²).
    pub fn poa_total_w_m2(&self) -> f64 {
        self.poa_w_m2
            .unwrap_or(self.beam_w_m2 + self.diffuse_w_m2 + self.ground_w_m2)
    }
}

/// Fixed multiplicative DC-side loss fractions, validated at setup.
///
/// `soiling` applies to irradiance before the module model; the remaining
/// factors apply to DC power after it, in ledger order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerateFactors {
    /// Soiling loss fraction on POA irradiance.
    pub soiling: f64,
    /// Module mismatch loss fraction.
    pub mismatch: f64,
    /// DC wiring and diode loss fraction.
    pub wiring: f64,
    /// Nameplate tolerance loss fraction.
    pub nameplate: f64,
    /// Tracking-system availability loss fraction.
    pub tracking: f64,
    /// DC power-optimizer loss fraction.
    pub dc_optimizer: f64,
}

impl DerateFactors {
    /// No losses.
    pub fn none() -> Self {
        Self {
            soiling: 0.0,
            mismatch: 0.0,
            wiring: 0.0,
            nameplate: 0.0,
            tracking: 0.0,
            dc_optimizer: 0.0,
        }
    }
}

/// One subarray: a block of identical strings tied to the shared inverter
/// MPPT channel.
///
/// Everything except `degradation_factor` is fixed at setup; the
/// degradation scalar mutates once per simulated year at the year boundary.
#[derive(Debug, Clone)]
pub struct Subarray {
    /// Whether this subarray participates in the simulation.
    pub enabled: bool,
    /// Modules connected in series per string.
    pub modules_per_string: usize,
    /// Parallel strings in this subarray.
    pub strings_in_parallel: usize,
    /// Fixed loss fractions.
    pub derates: DerateFactors,
    /// External shading derate on the beam component (fraction of beam
    /// lost). Supplied by the shading collaborator, consumed opaquely.
    pub shading_beam_loss: f64,
    /// Fractional output loss added at each year boundary.
    pub annual_degradation: f64,
    /// Accumulated lifetime multiplier, 1.0 in year zero.
    pub degradation_factor: f64,
}

impl Subarray {
    /// Creates an enabled subarray with the given string layout and no
    /// losses.
    pub fn new(modules_per_string: usize, strings_in_parallel: usize) -> Self {
        Self {
            enabled: true,
            modules_per_string,
            strings_in_parallel,
            derates: DerateFactors::none(),
            shading_beam_loss: 0.0,
            annual_degradation: 0.0,
            degradation_factor: 1.0,
        }
    }

    /// Total module count.
    pub fn module_count(&self) -> usize {
        self.modules_per_string * self.strings_in_parallel
    }

    /// Advances the lifetime-degradation scalar by one year.
    pub fn advance_year(&mut self) {
        self.degradation_factor *= 1.0 - self.annual_degradation;
    }
}

/// Per-subarray solved state for one timestep.
#[derive(Debug, Clone, Copy)]
pub struct SubarrayRecord {
    /// Module terminal voltage (V).
    pub module_voltage_v: f64,
    /// Module terminal current (A).
    pub module_current_a: f64,
    /// Subarray DC power before the DC-side derates (W).
    pub gross_dc_w: f64,
    /// Module conversion efficiency relative to effective irradiance on
    /// the aperture (0 while dark).
    pub efficiency: f64,
    /// Operating cell temperature (°C).
    pub cell_temp_c: f64,
    /// Operating module open-circuit voltage (V).
    pub v_oc: f64,
    /// Operating module short-circuit current (A).
    pub i_sc: f64,
}

/// Complete record of one simulation timestep.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Timestep index within the whole lifetime run.
    pub timestep: usize,
    /// Simulation time within the current year (hours).
    pub time_hr: f64,
    /// Simulated year index, starting at 0.
    pub year: usize,
    /// Gross nominal POA power over all module area, before any derate (W).
    pub poa_nominal_w: f64,
    /// Total DC power at the module terminals (W).
    pub dc_gross_w: f64,
    /// DC power delivered to the inverter after all DC derates (W).
    pub dc_net_w: f64,
    /// Coordinated string operating voltage (V); 0 while dark.
    pub mppt_voltage_v: f64,
    /// AC power out of the inverter bank (W); negative at night.
    pub ac_power_w: f64,
    /// AC power after AC wiring loss (W).
    pub ac_net_w: f64,
    /// Inverter conversion efficiency (0 while off).
    pub inverter_efficiency: f64,
    /// Inverter nameplate/current clipping loss (W).
    pub clip_loss_w: f64,
    /// Inverter operating self-consumption (W).
    pub consumption_loss_w: f64,
    /// Inverter night-tare draw (W).
    pub night_tare_loss_w: f64,
    /// Inverter ambient-temperature derate loss (W).
    pub thermal_loss_w: f64,
    /// Power lost to MPPT-window clamping (W).
    pub mppt_clip_loss_w: f64,
    /// Whether the power-weighted MPPT voltage had to be clamped into the
    /// inverter window this step.
    pub mppt_window_exceeded: bool,
    /// Mean cell temperature over enabled subarrays (°C).
    pub cell_temp_c: f64,
    /// Per-subarray solved state, indexed as configured.
    pub subarrays: Vec<SubarrayRecord>,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>6} y{} ({:>6.1}h) | poa={:>8.1} W  dc={:>8.1} W  ac={:>8.1} W  \
             eff={:.3} | Vmppt={:>6.1} V  Tcell={:>5.1}°C | clip={:.1}  tare={:.1}",
            self.timestep,
            self.year,
            self.time_hr,
            self.poa_nominal_w,
            self.dc_net_w,
            self.ac_power_w,
            self.inverter_efficiency,
            self.mppt_voltage_v,
            self.cell_temp_c,
            self.clip_loss_w,
            self.night_tare_loss_w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_config_basic() {
        let cfg = SimConfig::new(1, 1, 42, 0.0);
        assert_eq!(cfg.steps_per_hour, 1);
        assert_eq!(cfg.years, 1);
        assert_eq!(cfg.dt_hours, 1.0);
        assert_eq!(cfg.steps_per_year(), 8760);
        assert_eq!(cfg.total_steps(), 8760);
    }

    #[test]
    fn sim_config_subhourly_lifetime() {
        let cfg = SimConfig::new(4, 25, 0, 350.0);
        assert_eq!(cfg.dt_hours, 0.25);
        assert_eq!(cfg.steps_per_year(), 35_040);
        assert_eq!(cfg.total_steps(), 876_000);
    }

    #[test]
    #[should_panic]
    fn sim_config_zero_steps_panics() {
        SimConfig::new(0, 1, 0, 0.0);
    }

    #[test]
    #[should_panic]
    fn sim_config_zero_years_panics() {
        SimConfig::new(1, 0, 0, 0.0);
    }

    #[test]
    fn poa_total_prefers_measured_value() {
        let mut w = WeatherSample {
            beam_w_m2: 600.0,
            diffuse_w_m2: 100.0,
            ground_w_m2: 20.0,
            poa_w_m2: None,
            poa_from_weather_file: false,
            t_ambient_c: 20.0,
            wind_m_s: 1.0,
            zenith_deg: 30.0,
            incidence_deg: 20.0,
        };
        assert_eq!(w.poa_total_w_m2(), 720.0);
        w.poa_w_m2 = Some(700.0);
        assert_eq!(w.poa_total_w_m2(), 700.0);
    }

    #[test]
    fn degradation_compounds_per_year() {
        let mut sub = Subarray::new(12, 8);
        sub.annual_degradation = 0.005;
        assert_eq!(sub.degradation_factor, 1.0);
        sub.advance_year();
        sub.advance_year();
        let expected = (1.0 - 0.005_f64) * (1.0 - 0.005);
        assert!((sub.degradation_factor - expected).abs() < 1e-12);
    }

    #[test]
    fn module_count() {
        let sub = Subarray::new(14, 10);
        assert_eq!(sub.module_count(), 140);
    }

    #[test]
    fn step_record_display_does_not_panic() {
        let r = StepRecord {
            timestep: 12,
            time_hr: 12.0,
            year: 0,
            poa_nominal_w: 50_000.0,
            dc_gross_w: 9_500.0,
            dc_net_w: 9_200.0,
            mppt_voltage_v: 430.0,
            ac_power_w: 8_900.0,
            ac_net_w: 8_810.0,
            inverter_efficiency: 0.967,
            clip_loss_w: 0.0,
            consumption_loss_w: 25.0,
            night_tare_loss_w: 0.0,
            thermal_loss_w: 0.0,
            mppt_clip_loss_w: 0.0,
            mppt_window_exceeded: false,
            cell_temp_c: 44.2,
            subarrays: Vec::new(),
        };
        assert!(!format!("{r}").is_empty());
    }
}
