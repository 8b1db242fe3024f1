//! DC→AC inverter conversion models.
//!
//! Two interchangeable variants sit behind one call contract selected at
//! setup: a coefficient/polynomial model ([`sandia::SandiaInverter`]) and a
//! tabulated-efficiency-curve model ([`ond::OndInverter`]).

/// Polynomial/coefficient conversion model.
pub mod sandia;

/// Tabulated-curve conversion model with thermal derate.
pub mod ond;

pub use ond::{EfficiencyCurve, OndInverter};
pub use sandia::SandiaInverter;

/// One inverter conversion result. Losses are reported per inverter unit in
/// watts; the engine scales by the unit count.
///
/// Contract: while delivering power,
/// `ac_power + clip_loss + consumption_loss <= dc input`; while off,
/// `ac_power == -night_tare_loss` exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcConversion {
    /// AC output power (W); negative while the inverter draws its night
    /// tare.
    pub ac_power_w: f64,
    /// Conversion efficiency actually achieved (0 while off).
    pub efficiency: f64,
    /// Part-load ratio, DC input over DC nameplate.
    pub part_load_ratio: f64,
    /// Power lost to the AC nameplate/current cap (W).
    pub clip_loss_w: f64,
    /// Operating self-consumption (W).
    pub consumption_loss_w: f64,
    /// Night-time tare draw (W).
    pub night_tare_loss_w: f64,
    /// Power lost to the ambient-temperature derate (W).
    pub thermal_derate_loss_w: f64,
}

impl AcConversion {
    /// The off-state result: AC output is exactly the negated tare draw.
    pub(crate) fn night(tare_w: f64, part_load_ratio: f64) -> Self {
        Self {
            ac_power_w: -tare_w,
            efficiency: 0.0,
            part_load_ratio,
            clip_loss_w: 0.0,
            consumption_loss_w: 0.0,
            night_tare_loss_w: tare_w,
            thermal_derate_loss_w: 0.0,
        }
    }
}

/// Inverter conversion model plus the shared MPPT channel description.
#[derive(Debug, Clone)]
pub struct InverterParameters {
    /// Lower edge of the MPPT voltage window (V). `low == high == 0` means
    /// the window is unset and subarrays track independently.
    pub mppt_low_v: f64,
    /// Upper edge of the MPPT voltage window (V).
    pub mppt_high_v: f64,
    /// Number of identical inverter units sharing the array.
    pub count: usize,
    /// The conversion model variant.
    pub model: InverterModel,
}

/// Tagged conversion-model variant, dispatched per call without type
/// inspection.
#[derive(Debug, Clone)]
pub enum InverterModel {
    Sandia(SandiaInverter),
    Ond(OndInverter),
}

impl InverterParameters {
    /// Converts DC input to AC output for a single inverter unit.
    pub fn ac_power(&self, p_dc_w: f64, v_dc: f64, t_ambient_c: f64) -> AcConversion {
        match &self.model {
            InverterModel::Sandia(inv) => inv.ac_power(p_dc_w, v_dc),
            InverterModel::Ond(inv) => inv.ac_power(p_dc_w, v_dc, t_ambient_c),
        }
    }

    /// AC nameplate rating of one unit (W).
    pub fn ac_rating_w(&self) -> f64 {
        match &self.model {
            InverterModel::Sandia(inv) => inv.paco_w,
            InverterModel::Ond(inv) => inv.p_max_out_w,
        }
    }

    /// Whether the MPPT voltage window is declared.
    pub fn has_mppt_window(&self) -> bool {
        !(self.mppt_low_v == 0.0 && self.mppt_high_v == 0.0)
    }
}
