//! Module nameplate parameters and the reference diode quantities derived
//! from them at setup.

use crate::config::ConfigError;

/// Boltzmann constant [J/K].
pub const BOLTZMANN: f64 = 1.380_648_52e-23;
/// Elementary charge [C].
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_62e-19;
/// 0 °C in Kelvin.
pub const ZERO_C_IN_K: f64 = 273.15;

/// Single-diode module parameters, validated and frozen at setup.
///
/// The reference diode quantities (`n_vt_ref`, `i_0_ref`, `i_l_ref`) are
/// derived once in [`ModuleParameters::new`] by closed-form regression from
/// the nameplate points; no iteration happens at setup. They replace the
/// lazily-initialized globals a naive port would carry.
#[derive(Debug, Clone)]
pub struct ModuleParameters {
    /// Number of cells in series.
    pub n_series: usize,
    /// Module width (m).
    pub width_m: f64,
    /// Module length (m).
    pub length_m: f64,
    /// Maximum-power voltage at reference conditions (V).
    pub v_mp_ref: f64,
    /// Maximum-power current at reference conditions (A).
    pub i_mp_ref: f64,
    /// Open-circuit voltage at reference conditions (V).
    pub v_oc_ref: f64,
    /// Short-circuit current at reference conditions (A).
    pub i_sc_ref: f64,
    /// Reference irradiance (W/m²), typically 1000.
    pub s_ref: f64,
    /// Reference cell temperature (°C), typically 25.
    pub t_ref: f64,
    /// Series resistance (Ω).
    pub r_s: f64,
    /// Shunt resistance at reference irradiance (Ω).
    pub r_sh_ref: f64,
    /// Shunt resistance at zero irradiance (Ω).
    pub r_sh_0: f64,
    /// Exponential coefficient of the shunt-resistance irradiance law.
    pub r_sh_exp: f64,
    /// Short-circuit current temperature coefficient (A/°C).
    pub alpha_isc: f64,
    /// Bandgap energy (eV).
    pub e_g_ev: f64,
    /// Diode ideality factor at reference temperature.
    pub n_0: f64,
    /// Temperature coefficient of the ideality factor (1/°C).
    pub mu_n: f64,

    /// Thermal voltage times cell count at reference temperature (V).
    pub(crate) n_vt_ref: f64,
    /// Reference diode saturation current (A).
    pub(crate) i_0_ref: f64,
    /// Reference light-generated current (A).
    pub(crate) i_l_ref: f64,
}

/// Raw nameplate inputs to [`ModuleParameters::new`], before derivation.
#[derive(Debug, Clone)]
pub struct ModuleNameplate {
    pub n_series: usize,
    pub width_m: f64,
    pub length_m: f64,
    pub v_mp_ref: f64,
    pub i_mp_ref: f64,
    pub v_oc_ref: f64,
    pub i_sc_ref: f64,
    pub s_ref: f64,
    pub t_ref: f64,
    pub r_s: f64,
    pub r_sh_ref: f64,
    pub r_sh_0: f64,
    pub r_sh_exp: f64,
    pub alpha_isc: f64,
    pub e_g_ev: f64,
    pub n_0: f64,
    pub mu_n: f64,
}

impl ModuleParameters {
    /// Validates the nameplate and derives the reference diode quantities.
    ///
    /// The derivation pins the solved I–V curve to the nameplate at
    /// reference conditions: `I(V_oc_ref) = 0` and `I(0) = I_sc_ref` hold by
    /// construction.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the offending field when a nameplate
    /// value is non-physical (non-positive voltages/currents/resistances,
    /// zero area, Voc not above Vmp, Isc not above Imp).
    pub fn new(np: ModuleNameplate) -> Result<Self, ConfigError> {
        fn positive(field: &str, v: f64) -> Result<(), ConfigError> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(ConfigError {
                    field: format!("module.{field}"),
                    message: format!("must be a positive finite number, got {v}"),
                })
            }
        }

        if np.n_series == 0 {
            return Err(ConfigError {
                field: "module.n_series".into(),
                message: "must be > 0".into(),
            });
        }
        positive("width_m", np.width_m)?;
        positive("length_m", np.length_m)?;
        positive("v_mp_ref", np.v_mp_ref)?;
        positive("i_mp_ref", np.i_mp_ref)?;
        positive("v_oc_ref", np.v_oc_ref)?;
        positive("i_sc_ref", np.i_sc_ref)?;
        positive("s_ref", np.s_ref)?;
        positive("r_s", np.r_s)?;
        positive("r_sh_ref", np.r_sh_ref)?;
        positive("r_sh_0", np.r_sh_0)?;
        positive("n_0", np.n_0)?;
        positive("e_g_ev", np.e_g_ev)?;
        if np.v_oc_ref <= np.v_mp_ref {
            return Err(ConfigError {
                field: "module.v_oc_ref".into(),
                message: "must be greater than v_mp_ref".into(),
            });
        }
        if np.i_sc_ref <= np.i_mp_ref {
            return Err(ConfigError {
                field: "module.i_sc_ref".into(),
                message: "must be greater than i_mp_ref".into(),
            });
        }

        let n_vt_ref = np.n_series as f64 * np.n_0 * BOLTZMANN * (np.t_ref + ZERO_C_IN_K)
            / ELEMENTARY_CHARGE;
        let i_0_ref = (np.i_sc_ref + (np.i_sc_ref * np.r_s - np.v_oc_ref) / np.r_sh_ref)
            / ((np.v_oc_ref / n_vt_ref).exp() - (np.i_sc_ref * np.r_s / n_vt_ref).exp());
        let i_l_ref = i_0_ref * ((np.v_oc_ref / n_vt_ref).exp() - 1.0) + np.v_oc_ref / np.r_sh_ref;

        if !(i_0_ref.is_finite() && i_0_ref > 0.0) || !(i_l_ref.is_finite() && i_l_ref > 0.0) {
            return Err(ConfigError {
                field: "module".into(),
                message: format!(
                    "nameplate regression produced non-physical diode parameters \
                     (I_0ref = {i_0_ref:e}, I_Lref = {i_l_ref:.4})"
                ),
            });
        }

        Ok(Self {
            n_series: np.n_series,
            width_m: np.width_m,
            length_m: np.length_m,
            v_mp_ref: np.v_mp_ref,
            i_mp_ref: np.i_mp_ref,
            v_oc_ref: np.v_oc_ref,
            i_sc_ref: np.i_sc_ref,
            s_ref: np.s_ref,
            t_ref: np.t_ref,
            r_s: np.r_s,
            r_sh_ref: np.r_sh_ref,
            r_sh_0: np.r_sh_0,
            r_sh_exp: np.r_sh_exp,
            alpha_isc: np.alpha_isc,
            e_g_ev: np.e_g_ev,
            n_0: np.n_0,
            mu_n: np.mu_n,
            n_vt_ref,
            i_0_ref,
            i_l_ref,
        })
    }

    /// Module aperture area (m²).
    pub fn area_m2(&self) -> f64 {
        self.width_m * self.length_m
    }

    /// Nameplate conversion efficiency, used to seed the Faiman
    /// cell-temperature passes before a solved efficiency exists.
    pub fn nominal_efficiency(&self) -> f64 {
        self.v_mp_ref * self.i_mp_ref / (self.area_m2() * self.s_ref)
    }
}

/// Nameplate for a representative 72-cell crystalline module, shared by the
/// unit tests across the module-model files.
#[cfg(test)]
pub(crate) fn reference_nameplate() -> ModuleNameplate {
    ModuleNameplate {
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
