//! Coefficient-based (Sandia-style) inverter conversion model.
//!
//! AC output is a quadratic in DC power whose three characteristic
//! quantities each carry a linear voltage correction, giving the
//! 4-coefficient polynomial form. Below the turn-on threshold the inverter
//! draws a fixed night tare; above nameplate the output is clipped and the
//! clipped amount logged.

use crate::config::ConfigError;

use super::AcConversion;

/// Sandia inverter coefficients, validated once at setup.
#[derive(Debug, Clone)]
pub struct SandiaInverter {
    /// AC nameplate rating (W).
    pub paco_w: f64,
    /// DC power at which `paco_w` is reached at nominal voltage (W).
    pub pdco_w: f64,
    /// Nominal DC voltage (V).
    pub vdco_v: f64,
    /// DC power required to start inversion (W).
    pub pso_w: f64,
    /// Night tare draw (W).
    pub pntare_w: f64,
    /// Curvature coefficient (1/W).
    pub c0: f64,
    /// Voltage correction on `pdco_w` (1/V).
    pub c1: f64,
    /// Voltage correction on `pso_w` (1/V).
    pub c2: f64,
    /// Voltage correction on `c0` (1/V).
    pub c3: f64,
}

impl SandiaInverter {
    /// Validates the coefficient set.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for non-positive ratings or a turn-on
    /// threshold at or above the DC nameplate.
    pub fn new(
        paco_w: f64,
        pdco_w: f64,
        vdco_v: f64,
        pso_w: f64,
        pntare_w: f64,
        coeffs: [f64; 4],
    ) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("paco_w", paco_w),
            ("pdco_w", pdco_w),
            ("vdco_v", vdco_v),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError {
                    field: format!("inverter.{field}"),
                    message: format!("must be a positive finite number, got {value}"),
                });
            }
        }
        if pso_w < 0.0 || pso_w >= pdco_w {
            return Err(ConfigError {
                field: "inverter.pso_w".into(),
                message: "turn-on threshold must be in [0, pdco_w)".into(),
            });
        }
        if pntare_w < 0.0 {
            return Err(ConfigError {
                field: "inverter.pntare_w".into(),
                message: "night tare must be >= 0".into(),
            });
        }
        let [c0, c1, c2, c3] = coeffs;
        Ok(Self {
            paco_w,
            pdco_w,
            vdco_v,
            pso_w,
            pntare_w,
            c0,
            c1,
            c2,
            c3,
        })
    }

    /// Converts DC power and voltage to AC output plus named losses.
    pub fn ac_power(&self, p_dc_w: f64, v_dc: f64) -> AcConversion {
        let part_load_ratio = p_dc_w / self.pdco_w;
        if p_dc_w <= self.pso_w {
            return AcConversion::night(self.pntare_w, part_load_ratio);
        }

        let dv = v_dc - self.vdco_v;
        let a = self.pdco_w * (1.0 + self.c1 * dv);
        let b = self.pso_w * (1.0 + self.c2 * dv);
        let c = self.c0 * (1.0 + self.c3 * dv);

        let mut ac = (self.paco_w / (a - b) - c * (a - b)) * (p_dc_w - b)
            + c * (p_dc_w - b) * (p_dc_w - b);

        // Operating self-consumption is the gap to the same curve with the
        // turn-on term removed.
        let ac_without_pso = (self.paco_w / a - c * a) * p_dc_w + c * p_dc_w * p_dc_w;
        let consumption_loss_w = (ac_without_pso - ac).max(0.0);

        let mut clip_loss_w = 0.0;
        if ac > self.paco_w {
            clip_loss_w = ac - self.paco_w;
            ac = self.paco_w;
        }

        AcConversion {
            ac_power_w: ac,
            efficiency: if p_dc_w > 0.0 { ac / p_dc_w } else { 0.0 },
            part_load_ratio,
            clip_loss_w,
            consumption_loss_w,
            night_tare_loss_w: 0.0,
            thermal_derate_loss_w: 0.0,
        }
    }
}
