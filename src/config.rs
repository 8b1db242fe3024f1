//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::inverter::{
    EfficiencyCurve, InverterModel, InverterParameters, OndInverter, SandiaInverter,
};
use crate::module::{
    AirMassModel, CellTempModel, IamModel, IncidenceModifier, ModuleNameplate, ModuleParameters,
    Mounting,
};
use crate::sim::types::{DerateFactors, SimConfig, Subarray};
use crate::weather::SyntheticWeather;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and site parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Module nameplate and diode parameters.
    #[serde(default)]
    pub module: ModuleConfig,
    /// Cell-temperature model selection.
    #[serde(default)]
    pub thermal: ThermalConfig,
    /// Incidence-angle and air-mass model selection.
    #[serde(default)]
    pub optical: OpticalConfig,
    /// Inverter conversion model and MPPT window.
    #[serde(default)]
    pub inverter: InverterConfig,
    /// Array-level coordination and AC-side parameters.
    #[serde(default)]
    pub array: ArrayConfig,
    /// Subarray layout and derates.
    #[serde(default = "default_subarrays", rename = "subarray")]
    pub subarrays: Vec<SubarrayConfig>,
    /// Synthetic weather driver parameters.
    #[serde(default)]
    pub weather: WeatherConfig,
}

fn default_subarrays() -> Vec<SubarrayConfig> {
    vec![SubarrayConfig::default()]
}

/// Simulation timing and site parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Sub-hourly timesteps per hour (must be > 0).
    pub steps_per_hour: usize,
    /// Years to simulate (must be > 0).
    pub years: usize,
    /// Master random seed for the weather driver.
    pub seed: u64,
    /// Site elevation above sea level (m).
    pub elevation_m: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps_per_hour: 1,
            years: 1,
            seed: 42,
            elevation_m: 0.0,
        }
    }
}

/// Module nameplate and diode parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    /// Cells in series.
    pub n_series: usize,
    /// Module width (m).
    pub width_m: f64,
    /// Module length (m).
    pub length_m: f64,
    /// Reference maximum-power voltage (V).
    pub v_mp_ref: f64,
    /// Reference maximum-power current (A).
    pub i_mp_ref: f64,
    /// Reference open-circuit voltage (V).
    pub v_oc_ref: f64,
    /// Reference short-circuit current (A).
    pub i_sc_ref: f64,
    /// Reference irradiance (W/m²).
    pub s_ref: f64,
    /// Reference cell temperature (°C).
    pub t_ref: f64,
    /// Series resistance (Ω).
    pub r_s: f64,
    /// Shunt resistance at reference irradiance (Ω).
    pub r_sh_ref: f64,
    /// Shunt resistance in darkness (Ω).
    pub r_sh_0: f64,
    /// Shunt-resistance irradiance exponent.
    pub r_sh_exp: f64,
    /// Short-circuit temperature coefficient (A/°C).
    pub alpha_isc: f64,
    /// Bandgap energy (eV).
    pub e_g_ev: f64,
    /// Diode ideality factor at reference temperature.
    pub n_0: f64,
    /// Ideality temperature coefficient (1/°C).
    pub mu_n: f64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            n_series: 72,
            width_m: 0.992,
            length_m: 1.956,
            v_mp_ref: 37.0,
            i_mp_ref: 8.6,
            v_oc_ref: 46.0,
            i_sc_ref: 9.1,
            s_ref: 1000.0,
            t_ref: 25.0,
            r_s: 0.386,
            r_sh_ref: 20_000.0,
            r_sh_0: 80_000.0,
            r_sh_exp: 5.5,
            alpha_isc: 0.0046,
            e_g_ev: 1.12,
            n_0: 1.0586,
            mu_n: -0.0004,
        }
    }
}

/// Cell-temperature model selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThermalConfig {
    /// Model: `"noct"` or `"faiman"`.
    pub model: String,
    /// NOCT rating (°C).
    pub noct_c: f64,
    /// Mounting: `"rack"` or `"building"`.
    pub mounting: String,
    /// Standoff airflow adjustment added to NOCT (°C).
    pub standoff_adjust_c: f64,
    /// Faiman absorption coefficient.
    pub alpha: f64,
    /// Faiman constant heat-loss term (W/m²K).
    pub u0: f64,
    /// Faiman wind heat-loss term (W·s/m³K).
    pub u1: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            model: "noct".to_string(),
            noct_c: 45.0,
            mounting: "rack".to_string(),
            standoff_adjust_c: 0.0,
            alpha: 0.9,
            u0: 25.0,
            u1: 6.84,
        }
    }
}

/// Incidence-angle and air-mass model selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpticalConfig {
    /// IAM model: `"ashrae"`, `"sandia"`, or `"spline"`.
    pub iam_model: String,
    /// ASHRAE b0 coefficient.
    pub ashrae_b0: f64,
    /// Sandia IAM polynomial coefficients (constant term first).
    pub sandia_iam_coeffs: [f64; 6],
    /// Incidence angles for the spline table (deg, ascending).
    pub iam_angles_deg: Vec<f64>,
    /// Modifier values for the spline table (0 to 1).
    pub iam_values: Vec<f64>,
    /// Air-mass model: `"desoto"` or `"sandia"`.
    pub air_mass_model: String,
    /// Sandia air-mass polynomial coefficients (constant term first).
    pub sandia_am_coeffs: [f64; 5],
}

impl Default for OpticalConfig {
    fn default() -> Self {
        Self {
            iam_model: "ashrae".to_string(),
            ashrae_b0: 0.05,
            sandia_iam_coeffs: [1.0, -2.438e-3, 3.103e-4, -1.246e-5, 2.112e-7, -1.359e-9],
            iam_angles_deg: vec![0.0, 30.0, 50.0, 60.0, 70.0, 80.0, 90.0],
            iam_values: vec![1.0, 0.999, 0.987, 0.962, 0.892, 0.816, 0.0],
            air_mass_model: "desoto".to_string(),
            sandia_am_coeffs: [0.9417, 0.06516, -0.02022, 0.00219, -9.1e-5],
        }
    }
}

/// Inverter conversion model and MPPT window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InverterConfig {
    /// Model: `"sandia"` or `"ond"`.
    pub model: String,
    /// Lower MPPT window edge (V); `low == high == 0` disables the window.
    pub mppt_low_v: f64,
    /// Upper MPPT window edge (V).
    pub mppt_high_v: f64,
    /// Identical inverter units sharing the array.
    pub count: usize,
    /// Sandia: AC nameplate (W).
    pub paco_w: f64,
    /// Sandia: DC power reaching nameplate at nominal voltage (W).
    pub pdco_w: f64,
    /// Sandia: nominal DC voltage (V).
    pub vdco_v: f64,
    /// Sandia: turn-on DC power (W).
    pub pso_w: f64,
    /// Sandia: night tare draw (W).
    pub pntare_w: f64,
    /// Sandia: C0..C3 curve coefficients.
    pub sandia_coeffs: [f64; 4],
    /// OND: nominal AC power (W).
    pub p_nom_conv_w: f64,
    /// OND: maximum AC power (W).
    pub p_max_out_w: f64,
    /// OND: AC power at the second derate breakpoint (W).
    pub p_lim1_w: f64,
    /// OND: nominal DC power (W).
    pub p_nom_dc_w: f64,
    /// OND: DC current limit (A).
    pub i_nom_dc_a: f64,
    /// OND: turn-on DC power (W).
    pub p_seuil_w: f64,
    /// OND: night tare draw (W).
    pub night_loss_w: f64,
    /// OND: operating self-consumption (W).
    pub aux_loss_w: f64,
    /// OND: DC cable voltage drop at nominal power (V).
    pub dv_nom_v: f64,
    /// OND: temperature-derate breakpoints (°C, ascending).
    pub temp_breakpoints_c: [f64; 4],
    /// OND: voltages indexing the efficiency curves (V, ascending).
    pub v_nom_eff_v: [f64; 3],
    /// OND: shared DC-power axis of the efficiency curves (W, ascending).
    pub eff_curve_p_w: Vec<f64>,
    /// OND: one efficiency table per index voltage.
    pub eff_curve_eta: [Vec<f64>; 3],
}

impl Default for InverterConfig {
    fn default() -> Self {
        Self {
            model: "sandia".to_string(),
            mppt_low_v: 250.0,
            mppt_high_v: 600.0,
            count: 1,
            paco_w: 12_500.0,
            pdco_w: 13_000.0,
            vdco_v: 440.0,
            pso_w: 65.0,
            pntare_w: 2.5,
            sandia_coeffs: [-1.0e-6, -2.0e-5, 8.0e-4, -1.5e-4],
            p_nom_conv_w: 12_500.0,
            p_max_out_w: 13_750.0,
            p_lim1_w: 11_000.0,
            p_nom_dc_w: 13_000.0,
            i_nom_dc_a: 32.0,
            p_seuil_w: 60.0,
            night_loss_w: 2.5,
            aux_loss_w: 25.0,
            dv_nom_v: 4.0,
            temp_breakpoints_c: [25.0, 45.0, 55.0, 65.0],
            v_nom_eff_v: [320.0, 420.0, 500.0],
            eff_curve_p_w: vec![
                650.0, 1300.0, 2600.0, 3900.0, 6500.0, 9100.0, 11_700.0, 13_000.0,
            ],
            eff_curve_eta: [
                vec![0.918, 0.952, 0.970, 0.9755, 0.977, 0.9765, 0.975, 0.9735],
                vec![0.921, 0.955, 0.973, 0.9785, 0.980, 0.9795, 0.978, 0.9765],
                vec![0.919, 0.953, 0.971, 0.9765, 0.978, 0.9775, 0.976, 0.9745],
            ],
        }
    }
}

/// Array-level coordination and AC-side parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrayConfig {
    /// Enables the mismatch-aware MPPT voltage sweep.
    pub mismatch_sweep: bool,
    /// AC wiring / transformer loss fraction.
    pub ac_wiring_loss: f64,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            mismatch_sweep: false,
            ac_wiring_loss: 0.01,
        }
    }
}

/// One subarray's layout and derates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubarrayConfig {
    /// Whether this subarray participates.
    pub enabled: bool,
    /// Modules in series per string.
    pub modules_per_string: usize,
    /// Parallel strings.
    pub strings_in_parallel: usize,
    /// Soiling loss fraction on POA.
    pub soiling: f64,
    /// Mismatch loss fraction.
    pub mismatch: f64,
    /// DC wiring loss fraction.
    pub wiring: f64,
    /// Nameplate tolerance loss fraction.
    pub nameplate: f64,
    /// Tracking availability loss fraction.
    pub tracking: f64,
    /// DC optimizer loss fraction.
    pub dc_optimizer: f64,
    /// External shading derate on the beam component.
    pub shading_beam_loss: f64,
    /// Output loss added at each year boundary.
    pub annual_degradation: f64,
}

impl Default for SubarrayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            modules_per_string: 12,
            strings_in_parallel: 4,
            soiling: 0.02,
            mismatch: 0.01,
            wiring: 0.015,
            nameplate: 0.0,
            tracking: 0.0,
            dc_optimizer: 0.0,
            shading_beam_loss: 0.0,
            annual_degradation: 0.005,
        }
    }
}

/// Synthetic weather driver parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Peak clear-sky beam irradiance (W/m²).
    pub peak_beam_w_m2: f64,
    /// Sunrise hour (inclusive).
    pub sunrise_hr: usize,
    /// Sunset hour (exclusive).
    pub sunset_hr: usize,
    /// Cloud noise standard deviation.
    pub noise_std: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            peak_beam_w_m2: 900.0,
            sunrise_hr: 6,
            sunset_hr: 18,
            noise_std: 0.08,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"inverter.mppt_low_v"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: one subarray, Sandia inverter, NOCT
    /// thermal model.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            module: ModuleConfig::default(),
            thermal: ThermalConfig::default(),
            optical: OpticalConfig::default(),
            inverter: InverterConfig::default(),
            array: ArrayConfig::default(),
            subarrays: default_subarrays(),
            weather: WeatherConfig::default(),
        }
    }

    /// Returns the mismatch preset: two unevenly shaded subarrays with the
    /// mismatch voltage sweep enabled.
    pub fn mismatch() -> Self {
        Self {
            array: ArrayConfig {
                mismatch_sweep: true,
                ..ArrayConfig::default()
            },
            subarrays: vec![
                SubarrayConfig::default(),
                SubarrayConfig {
                    strings_in_parallel: 3,
                    shading_beam_loss: 0.25,
                    ..SubarrayConfig::default()
                },
            ],
            ..Self::baseline()
        }
    }

    /// Returns the OND preset: tabulated-curve inverter with the Faiman
    /// thermal model.
    pub fn ond() -> Self {
        Self {
            thermal: ThermalConfig {
                model: "faiman".to_string(),
                ..ThermalConfig::default()
            },
            inverter: InverterConfig {
                model: "ond".to_string(),
                ..InverterConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "mismatch", "ond"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "mismatch" => Ok(Self::mismatch()),
            "ond" => Ok(Self::ond()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Deeper numeric
    /// validation (table monotonicity, derived diode parameters) happens in
    /// the `build_*` constructors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.steps_per_hour == 0 {
            errors.push(ConfigError {
                field: "simulation.steps_per_hour".into(),
                message: "must be > 0".into(),
            });
        }
        if s.years == 0 {
            errors.push(ConfigError {
                field: "simulation.years".into(),
                message: "must be > 0".into(),
            });
        }

        let t = &self.thermal;
        if t.model != "noct" && t.model != "faiman" {
            errors.push(ConfigError {
                field: "thermal.model".into(),
                message: format!("must be \"noct\" or \"faiman\", got \"{}\"", t.model),
            });
        }
        if t.mounting != "rack" && t.mounting != "building" {
            errors.push(ConfigError {
                field: "thermal.mounting".into(),
                message: format!("must be \"rack\" or \"building\", got \"{}\"", t.mounting),
            });
        }
        if t.u0 <= 0.0 {
            errors.push(ConfigError {
                field: "thermal.u0".into(),
                message: "must be > 0".into(),
            });
        }

        let o = &self.optical;
        if !["ashrae", "sandia", "spline"].contains(&o.iam_model.as_str()) {
            errors.push(ConfigError {
                field: "optical.iam_model".into(),
                message: format!(
                    "must be \"ashrae\", \"sandia\", or \"spline\", got \"{}\"",
                    o.iam_model
                ),
            });
        }
        if o.air_mass_model != "desoto" && o.air_mass_model != "sandia" {
            errors.push(ConfigError {
                field: "optical.air_mass_model".into(),
                message: format!(
                    "must be \"desoto\" or \"sandia\", got \"{}\"",
                    o.air_mass_model
                ),
            });
        }

        let inv = &self.inverter;
        if inv.model != "sandia" && inv.model != "ond" {
            errors.push(ConfigError {
                field: "inverter.model".into(),
                message: format!("must be \"sandia\" or \"ond\", got \"{}\"", inv.model),
            });
        }
        if inv.count == 0 {
            errors.push(ConfigError {
                field: "inverter.count".into(),
                message: "must be > 0".into(),
            });
        }
        if inv.mppt_low_v > inv.mppt_high_v {
            errors.push(ConfigError {
                field: "inverter.mppt_low_v".into(),
                message: "must be <= inverter.mppt_high_v".into(),
            });
        }

        if !(0.0..1.0).contains(&self.array.ac_wiring_loss) {
            errors.push(ConfigError {
                field: "array.ac_wiring_loss".into(),
                message: "must be in [0.0, 1.0)".into(),
            });
        }

        if !self.subarrays.iter().any(|s| s.enabled) {
            errors.push(ConfigError {
                field: "subarray".into(),
                message: "at least one subarray must be enabled".into(),
            });
        }
        for (i, sub) in self.subarrays.iter().enumerate() {
            if sub.modules_per_string == 0 || sub.strings_in_parallel == 0 {
                errors.push(ConfigError {
                    field: format!("subarray[{i}].modules_per_string"),
                    message: "string layout counts must be > 0".into(),
                });
            }
            for (name, frac) in [
                ("soiling", sub.soiling),
                ("mismatch", sub.mismatch),
                ("wiring", sub.wiring),
                ("nameplate", sub.nameplate),
                ("tracking", sub.tracking),
                ("dc_optimizer", sub.dc_optimizer),
                ("shading_beam_loss", sub.shading_beam_loss),
                ("annual_degradation", sub.annual_degradation),
            ] {
                if !(0.0..1.0).contains(&frac) {
                    errors.push(ConfigError {
                        field: format!("subarray[{i}].{name}"),
                        message: "loss fractions must be in [0.0, 1.0)".into(),
                    });
                }
            }
        }

        let w = &self.weather;
        if w.sunrise_hr >= w.sunset_hr {
            errors.push(ConfigError {
                field: "weather.sunrise_hr".into(),
                message: "must be < weather.sunset_hr".into(),
            });
        }
        if w.sunset_hr > 24 {
            errors.push(ConfigError {
                field: "weather.sunset_hr".into(),
                message: "must be <= 24".into(),
            });
        }

        errors
    }

    /// Builds the timing configuration.
    pub fn build_sim(&self) -> SimConfig {
        let s = &self.simulation;
        SimConfig::new(s.steps_per_hour, s.years, s.seed, s.elevation_m)
    }

    /// Builds validated module parameters with the derived diode constants.
    ///
    /// # Errors
    ///
    /// Returns the first nameplate constraint violation.
    pub fn build_module(&self) -> Result<ModuleParameters, ConfigError> {
        let m = &self.module;
        ModuleParameters::new(ModuleNameplate {
            n_series: m.n_series,
            width_m: m.width_m,
            length_m: m.length_m,
            v_mp_ref: m.v_mp_ref,
            i_mp_ref: m.i_mp_ref,
            v_oc_ref: m.v_oc_ref,
            i_sc_ref: m.i_sc_ref,
            s_ref: m.s_ref,
            t_ref: m.t_ref,
            r_s: m.r_s,
            r_sh_ref: m.r_sh_ref,
            r_sh_0: m.r_sh_0,
            r_sh_exp: m.r_sh_exp,
            alpha_isc: m.alpha_isc,
            e_g_ev: m.e_g_ev,
            n_0: m.n_0,
            mu_n: m.mu_n,
        })
    }

    /// Builds the cell-temperature model.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown model or mounting selector.
    pub fn build_cell_temp(&self) -> Result<CellTempModel, ConfigError> {
        let t = &self.thermal;
        match t.model.as_str() {
            "noct" => {
                let mounting = match t.mounting.as_str() {
                    "rack" => Mounting::Rack,
                    "building" => Mounting::BuildingIntegrated,
                    other => {
                        return Err(ConfigError {
                            field: "thermal.mounting".into(),
                            message: format!("unknown mounting \"{other}\""),
                        });
                    }
                };
                Ok(CellTempModel::Noct {
                    noct_c: t.noct_c,
                    mounting,
                    standoff_adjust_c: t.standoff_adjust_c,
                })
            }
            "faiman" => Ok(CellTempModel::Faiman {
                alpha: t.alpha,
                u0: t.u0,
                u1: t.u1,
            }),
            other => Err(ConfigError {
                field: "thermal.model".into(),
                message: format!("unknown model \"{other}\""),
            }),
        }
    }

    /// Builds the incidence-angle and air-mass models, fitting the IAM
    /// spline when selected.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for unknown selectors or malformed tables.
    pub fn build_incidence(&self) -> Result<IncidenceModifier, ConfigError> {
        let o = &self.optical;
        let iam = match o.iam_model.as_str() {
            "ashrae" => IamModel::Ashrae { b0: o.ashrae_b0 },
            "sandia" => IamModel::SandiaPoly {
                coeffs: o.sandia_iam_coeffs,
            },
            "spline" => IamModel::from_table(&o.iam_angles_deg, &o.iam_values)?,
            other => {
                return Err(ConfigError {
                    field: "optical.iam_model".into(),
                    message: format!("unknown model \"{other}\""),
                });
            }
        };
        let air_mass = match o.air_mass_model.as_str() {
            "desoto" => AirMassModel::DeSoto,
            "sandia" => AirMassModel::SandiaPoly {
                coeffs: o.sandia_am_coeffs,
            },
            other => {
                return Err(ConfigError {
                    field: "optical.air_mass_model".into(),
                    message: format!("unknown model \"{other}\""),
                });
            }
        };
        Ok(IncidenceModifier { iam, air_mass })
    }

    /// Builds the inverter parameters, fitting OND efficiency splines when
    /// selected.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for unknown selectors, malformed tables, or
    /// invalid ratings.
    pub fn build_inverter(&self) -> Result<InverterParameters, ConfigError> {
        let inv = &self.inverter;
        let model = match inv.model.as_str() {
            "sandia" => InverterModel::Sandia(SandiaInverter::new(
                inv.paco_w,
                inv.pdco_w,
                inv.vdco_v,
                inv.pso_w,
                inv.pntare_w,
                inv.sandia_coeffs,
            )?),
            "ond" => {
                let curves: [EfficiencyCurve; 3] = [0, 1, 2].map(|j| EfficiencyCurve {
                    power_w: inv.eff_curve_p_w.clone(),
                    efficiency: inv.eff_curve_eta[j].clone(),
                });
                InverterModel::Ond(OndInverter::new(
                    inv.p_nom_conv_w,
                    inv.p_max_out_w,
                    inv.p_lim1_w,
                    inv.p_nom_dc_w,
                    inv.i_nom_dc_a,
                    inv.p_seuil_w,
                    inv.night_loss_w,
                    inv.aux_loss_w,
                    inv.dv_nom_v,
                    inv.temp_breakpoints_c,
                    inv.v_nom_eff_v,
                    &curves,
                )?)
            }
            other => {
                return Err(ConfigError {
                    field: "inverter.model".into(),
                    message: format!("unknown model \"{other}\""),
                });
            }
        };
        Ok(InverterParameters {
            mppt_low_v: inv.mppt_low_v,
            mppt_high_v: inv.mppt_high_v,
            count: inv.count,
            model,
        })
    }

    /// Builds the subarray states.
    pub fn build_subarrays(&self) -> Vec<Subarray> {
        self.subarrays
            .iter()
            .map(|s| Subarray {
                enabled: s.enabled,
                modules_per_string: s.modules_per_string,
                strings_in_parallel: s.strings_in_parallel,
                derates: DerateFactors {
                    soiling: s.soiling,
                    mismatch: s.mismatch,
                    wiring: s.wiring,
                    nameplate: s.nameplate,
                    tracking: s.tracking,
                    dc_optimizer: s.dc_optimizer,
                },
                shading_beam_loss: s.shading_beam_loss,
                annual_degradation: s.annual_degradation,
                degradation_factor: 1.0,
            })
            .collect()
    }

    /// Builds the synthetic weather driver.
    pub fn build_weather(&self) -> SyntheticWeather {
        let w = &self.weather;
        SyntheticWeather::new(
            w.peak_beam_w_m2,
            w.sunrise_hr,
            w.sunset_hr,
            w.noise_std,
            self.simulation.steps_per_hour,
            self.simulation.seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_build_cleanly() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).expect("preset loads");
            assert!(cfg.validate().is_empty(), "preset \"{name}\" should validate");
            assert!(cfg.build_module().is_ok(), "preset \"{name}\" module");
            assert!(cfg.build_cell_temp().is_ok(), "preset \"{name}\" thermal");
            assert!(cfg.build_incidence().is_ok(), "preset \"{name}\" optical");
            assert!(cfg.build_inverter().is_ok(), "preset \"{name}\" inverter");
            assert!(!cfg.build_subarrays().is_empty());
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
steps_per_hour = 4
years = 2
seed = 99

[module]
v_mp_ref = 37.0
i_mp_ref = 8.6

[inverter]
model = "ond"
mppt_low_v = 300.0
mppt_high_v = 550.0

[[subarray]]
modules_per_string = 14
strings_in_parallel = 6
shading_beam_loss = 0.1

[[subarray]]
modules_per_string = 14
strings_in_parallel = 4
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.steps_per_hour), Some(4));
        assert_eq!(cfg.as_ref().map(|c| c.subarrays.len()), Some(2));
        assert_eq!(cfg.as_ref().map(|c| &*c.inverter.model), Some("ond"));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
steps_per_hour = 1
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.steps_per_hour), Some(1));
        assert_eq!(cfg.as_ref().map(|c| c.subarrays.len()), Some(1));
    }

    #[test]
    fn validation_catches_zero_steps() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.steps_per_hour = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.steps_per_hour"));
    }

    #[test]
    fn validation_catches_bad_thermal_model() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.thermal.model = "pvsyst".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "thermal.model"));
    }

    #[test]
    fn validation_catches_inverted_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.inverter.mppt_low_v = 700.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "inverter.mppt_low_v"));
    }

    #[test]
    fn validation_catches_all_subarrays_disabled() {
        let mut cfg = ScenarioConfig::baseline();
        for sub in &mut cfg.subarrays {
            sub.enabled = false;
        }
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "subarray"));
    }

    #[test]
    fn validation_catches_out_of_range_derate() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.subarrays[0].soiling = 1.2;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "subarray[0].soiling"));
    }

    #[test]
    fn build_inverter_rejects_broken_ond_table() {
        let mut cfg = ScenarioConfig::ond();
        cfg.inverter.eff_curve_p_w[3] = cfg.inverter.eff_curve_p_w[2];
        assert!(cfg.build_inverter().is_err());
    }

    #[test]
    fn mismatch_preset_enables_the_sweep() {
        let cfg = ScenarioConfig::mismatch();
        assert!(cfg.array.mismatch_sweep);
        assert_eq!(cfg.subarrays.len(), 2);
        assert!(cfg.subarrays[1].shading_beam_loss > 0.0);
    }

    #[test]
    fn spline_iam_builds_from_tables() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.optical.iam_model = "spline".to_string();
        assert!(cfg.build_incidence().is_ok());
    }
}
