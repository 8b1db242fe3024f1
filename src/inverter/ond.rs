//! Tabulated-curve inverter conversion model.
//!
//! Efficiency comes from voltage-indexed cubic-spline curves fitted once at
//! setup. Output is capped by the lower of two independent limits — an
//! ambient-temperature derate interpolated across breakpoints, and a DC
//! current limit — and a DC cable voltage drop is applied before the curve
//! is evaluated. Below the turn-on threshold the inverter draws its night
//! loss.

use crate::config::ConfigError;
use crate::interp::{CubicSpline, check_strictly_increasing, lerp_table};

use super::AcConversion;

/// Number of voltage-indexed efficiency curves.
pub const EFFICIENCY_CURVES: usize = 3;

/// One tabulated efficiency curve: DC power (W) versus efficiency.
#[derive(Debug, Clone)]
pub struct EfficiencyCurve {
    pub power_w: Vec<f64>,
    pub efficiency: Vec<f64>,
}

/// Tabulated inverter parameters with the splines fitted at setup.
#[derive(Debug, Clone)]
pub struct OndInverter {
    /// Nominal AC power (W).
    pub p_nom_conv_w: f64,
    /// Maximum AC power below the first temperature breakpoint (W).
    pub p_max_out_w: f64,
    /// AC power at the `t_lim1_c` breakpoint (W).
    pub p_lim1_w: f64,
    /// Nominal DC power (W).
    pub p_nom_dc_w: f64,
    /// DC current limit (A).
    pub i_nom_dc_a: f64,
    /// DC power required to start inversion (W).
    pub p_seuil_w: f64,
    /// Night tare draw (W).
    pub night_loss_w: f64,
    /// Operating self-consumption (W).
    pub aux_loss_w: f64,
    /// Cable voltage drop at nominal DC power (V).
    pub dv_nom_v: f64,
    /// Temperature-derate breakpoints (°C): full output up to `t_p_max_c`.
    pub t_p_max_c: f64,
    pub t_p_nom_c: f64,
    pub t_lim1_c: f64,
    pub t_lim_abs_c: f64,
    /// Voltages the efficiency curves are indexed by (V), ascending.
    pub v_nom_eff_v: [f64; EFFICIENCY_CURVES],
    splines: Vec<CubicSpline>,
}

impl OndInverter {
    /// Validates the tables and fits the efficiency splines.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for non-monotonic power axes, mismatched
    /// table lengths, unordered index voltages or temperature breakpoints,
    /// or efficiencies outside `[0, 1]`.
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        p_nom_conv_w: f64,
        p_max_out_w: f64,
        p_lim1_w: f64,
        p_nom_dc_w: f64,
        i_nom_dc_a: f64,
        p_seuil_w: f64,
        night_loss_w: f64,
        aux_loss_w: f64,
        dv_nom_v: f64,
        temp_breakpoints_c: [f64; 4],
        v_nom_eff_v: [f64; EFFICIENCY_CURVES],
        curves: &[EfficiencyCurve; EFFICIENCY_CURVES],
    ) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("p_nom_conv_w", p_nom_conv_w),
            ("p_max_out_w", p_max_out_w),
            ("p_nom_dc_w", p_nom_dc_w),
            ("i_nom_dc_a", i_nom_dc_a),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError {
                    field: format!("inverter.{field}"),
                    message: format!("must be a positive finite number, got {value}"),
                });
            }
        }
        let [t_p_max_c, t_p_nom_c, t_lim1_c, t_lim_abs_c] = temp_breakpoints_c;
        check_strictly_increasing(&[0.0, t_p_max_c, t_p_nom_c, t_lim1_c, t_lim_abs_c]).map_err(
            |message| ConfigError {
                field: "inverter.temp_breakpoints_c".into(),
                message,
            },
        )?;
        check_strictly_increasing(&v_nom_eff_v).map_err(|message| ConfigError {
            field: "inverter.v_nom_eff_v".into(),
            message,
        })?;

        let mut splines = Vec::with_capacity(EFFICIENCY_CURVES);
        for (j, curve) in curves.iter().enumerate() {
            if curve.efficiency.iter().any(|e| !(0.0..=1.0).contains(e)) {
                return Err(ConfigError {
                    field: format!("inverter.eff_curve_eta[{j}]"),
                    message: "efficiencies must lie in [0, 1]".into(),
                });
            }
            let spline =
                CubicSpline::fit(&curve.power_w, &curve.efficiency).map_err(|message| {
                    ConfigError {
                        field: format!("inverter.eff_curve_p_w[{j}]"),
                        message,
                    }
                })?;
            splines.push(spline);
        }

        Ok(Self {
            p_nom_conv_w,
            p_max_out_w,
            p_lim1_w,
            p_nom_dc_w,
            i_nom_dc_a,
            p_seuil_w,
            night_loss_w,
            aux_loss_w,
            dv_nom_v,
            t_p_max_c,
            t_p_nom_c,
            t_lim1_c,
            t_lim_abs_c,
            v_nom_eff_v,
            splines,
        })
    }

    /// Maximum AC output allowed at the given ambient temperature,
    /// piecewise-linear across the derate breakpoints.
    fn temp_derate_cap_w(&self, t_ambient_c: f64) -> f64 {
        let temps = [
            0.0,
            self.t_p_max_c,
            self.t_p_nom_c,
            self.t_lim1_c,
            self.t_lim_abs_c,
        ];
        let caps = [
            self.p_max_out_w,
            self.p_max_out_w,
            self.p_nom_conv_w,
            self.p_lim1_w,
            0.0,
        ];
        lerp_table(&temps, &caps, t_ambient_c)
    }

    /// Efficiency at the cable-corrected DC power and voltage, interpolated
    /// between the two curves bracketing the operating voltage.
    fn efficiency_at(&self, p_dc_eff_w: f64, v_dc_eff: f64) -> f64 {
        let lo = if v_dc_eff < self.v_nom_eff_v[1] { 0 } else { 1 };
        let v_lo = self.v_nom_eff_v[lo];
        let v_hi = self.v_nom_eff_v[lo + 1];
        let eta_lo = self.splines[lo].eval(p_dc_eff_w);
        let eta_hi = self.splines[lo + 1].eval(p_dc_eff_w);
        let eta = eta_lo + (eta_hi - eta_lo) * (v_dc_eff - v_lo) / (v_hi - v_lo);
        eta.clamp(0.0, 1.0)
    }

    /// Converts DC power, voltage, and ambient temperature to AC output
    /// plus named losses.
    pub fn ac_power(&self, p_dc_w: f64, v_dc: f64, t_ambient_c: f64) -> AcConversion {
        let part_load_ratio = p_dc_w / self.p_nom_dc_w;
        if p_dc_w <= self.p_seuil_w || v_dc <= 0.0 {
            return AcConversion::night(self.night_loss_w, part_load_ratio);
        }

        // Cable voltage drop scales with part load.
        let dv = self.dv_nom_v * (p_dc_w / self.p_nom_dc_w);
        let v_dc_eff = (v_dc - dv).max(1.0);
        let p_dc_eff = p_dc_w * (v_dc_eff / v_dc);
        if p_dc_eff <= self.p_seuil_w {
            return AcConversion::night(self.night_loss_w, part_load_ratio);
        }

        let efficiency = self.efficiency_at(p_dc_eff, v_dc_eff);
        let mut ac = efficiency * p_dc_eff;

        // Nameplate and DC-current caps first, temperature derate second;
        // the two buckets are ledgered separately.
        let i_dc = p_dc_eff / v_dc_eff;
        let current_cap = v_dc_eff * i_dc.min(self.i_nom_dc_a);
        let hard_cap = self.p_max_out_w.min(current_cap);
        let mut clip_loss_w = 0.0;
        if ac > hard_cap {
            clip_loss_w = ac - hard_cap;
            ac = hard_cap;
        }

        let temp_cap = self.temp_derate_cap_w(t_ambient_c);
        let mut thermal_derate_loss_w = 0.0;
        if ac > temp_cap {
            thermal_derate_loss_w = ac - temp_cap;
            ac = temp_cap;
        }

        // At or past the absolute temperature limit the unit shuts down
        // entirely: it delivers exactly nothing and draws no auxiliary
        // power.
        if temp_cap <= 0.0 {
            return AcConversion {
                ac_power_w: 0.0,
                efficiency: 0.0,
                part_load_ratio: p_dc_eff / self.p_nom_dc_w,
                clip_loss_w,
                consumption_loss_w: 0.0,
                night_tare_loss_w: 0.0,
                thermal_derate_loss_w,
            };
        }

        // Operating self-consumption comes off the delivered output.
        ac -= self.aux_loss_w;

        AcConversion {
            ac_power_w: ac,
            efficiency: if p_dc_w > 0.0 { ac / p_dc_w } else { 0.0 },
            part_load_ratio: p_dc_eff / self.p_nom_dc_w,
            clip_loss_w,
            consumption_loss_w: self.aux_loss_w,
            night_tare_loss_w: 0.0,
            thermal_derate_loss_w,
        }
    }
}
