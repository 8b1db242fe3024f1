//! Single-diode equivalent-circuit solver.
//!
//! Per timestep the solver scales the reference diode parameters for cell
//! temperature and effective irradiance, finds the implicit open-circuit
//! voltage by Newton iteration, and then either searches the I–V curve for
//! the maximum-power point or evaluates current at a forced operating
//! voltage (the mode used when subarrays share an inverter MPPT input).

use std::fmt;

use super::params::{BOLTZMANN, ELEMENTARY_CHARGE, ModuleParameters, ZERO_C_IN_K};

/// Irradiance below which the module is defined to produce exactly zero
/// output (W/m²). A contract, not an error.
pub const MIN_ACTIVE_IRRADIANCE_W_M2: f64 = 1.0;

/// Newton iteration cap for the implicit voltage/current solves.
const MAX_NEWTON_ITERATIONS: usize = 100;
/// Convergence tolerance on the open-circuit voltage step (V).
const VOC_TOLERANCE_V: f64 = 1e-6;
/// Convergence tolerance on the operating-current step (A).
const CURRENT_TOLERANCE_A: f64 = 1e-8;
/// Golden-section bracket width at which the power search stops (V).
const MPP_BRACKET_TOLERANCE_V: f64 = 1e-4;

const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Solved module state for one timestep. Created and discarded per step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    /// Terminal voltage (V).
    pub voltage_v: f64,
    /// Terminal current (A).
    pub current_a: f64,
    /// Output power (W).
    pub power_w: f64,
    /// Conversion efficiency relative to effective irradiance on the
    /// module aperture.
    pub efficiency: f64,
    /// Cell temperature the point was solved at (°C).
    pub cell_temp_c: f64,
    /// Operating open-circuit voltage (V).
    pub v_oc: f64,
    /// Operating short-circuit current (A).
    pub i_sc: f64,
}

impl OperatingPoint {
    /// The defined all-zero output for irradiance below the activity
    /// threshold.
    pub fn dark(cell_temp_c: f64) -> Self {
        Self {
            voltage_v: 0.0,
            current_a: 0.0,
            power_w: 0.0,
            efficiency: 0.0,
            cell_temp_c,
            v_oc: 0.0,
            i_sc: 0.0,
        }
    }
}

/// Solver failure inside the diode model. Mapped to a run-level error with
/// timestep and subarray context by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DiodeError {
    /// The open-circuit-voltage Newton iteration failed to converge.
    OpenCircuitVoltage { iterations: usize },
    /// The operating-current Newton iteration failed to converge at the
    /// given terminal voltage.
    OperatingCurrent { voltage_v: f64 },
    /// The solved power came out negative or non-finite.
    NonFinitePower { power_w: f64 },
}

impl fmt::Display for DiodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiodeError::OpenCircuitVoltage { iterations } => write!(
                f,
                "open-circuit voltage iteration did not converge within {iterations} steps"
            ),
            DiodeError::OperatingCurrent { voltage_v } => write!(
                f,
                "operating-current iteration did not converge at {voltage_v:.3} V"
            ),
            DiodeError::NonFinitePower { power_w } => {
                write!(f, "solved module power is not physical: {power_w} W")
            }
        }
    }
}

/// Diode parameters scaled to the current cell temperature and irradiance.
struct ScaledDiode {
    /// Modified thermal voltage `n·Ns·k·T/q` (V).
    a: f64,
    i_l: f64,
    i_0: f64,
    r_s: f64,
    r_sh: f64,
}

impl ScaledDiode {
    fn from_conditions(p: &ModuleParameters, s_eff: f64, t_cell_c: f64) -> Self {
        let t_cell_k = t_cell_c + ZERO_C_IN_K;
        let t_ref_k = p.t_ref + ZERO_C_IN_K;
        let n = p.n_0 + p.mu_n * (t_cell_c - p.t_ref);
        let a = p.n_series as f64 * BOLTZMANN * t_cell_k * n / ELEMENTARY_CHARGE;
        let i_l = (s_eff / p.s_ref) * (p.i_l_ref + p.alpha_isc * (t_cell_c - p.t_ref));
        // Arrhenius-type saturation-current scaling with the bandgap energy.
        let e_g_j = p.e_g_ev * ELEMENTARY_CHARGE;
        let i_0 = p.i_0_ref
            * (t_cell_k / t_ref_k).powi(3)
            * (e_g_j / (n * BOLTZMANN) * (1.0 / t_ref_k - 1.0 / t_cell_k)).exp();
        let r_sh = p.r_sh_ref + (p.r_sh_0 - p.r_sh_ref) * (-p.r_sh_exp * s_eff / p.s_ref).exp();
        Self {
            a,
            i_l,
            i_0,
            r_s: p.r_s,
            r_sh,
        }
    }

    /// Newton solve of `I_L - I_0·(e^(V/a) - 1) - V/R_sh = 0`, seeded from
    /// the reference open-circuit voltage.
    fn open_circuit_voltage(&self, v_seed: f64) -> Result<f64, DiodeError> {
        let mut v = v_seed;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let e = (v / self.a).exp();
            let f = self.i_l - self.i_0 * (e - 1.0) - v / self.r_sh;
            let df = -self.i_0 / self.a * e - 1.0 / self.r_sh;
            let step = f / df;
            v -= step;
            if !v.is_finite() || v < 0.0 {
                return Err(DiodeError::OpenCircuitVoltage {
                    iterations: MAX_NEWTON_ITERATIONS,
                });
            }
            if step.abs() < VOC_TOLERANCE_V {
                return Ok(v);
            }
        }
        Err(DiodeError::OpenCircuitVoltage {
            iterations: MAX_NEWTON_ITERATIONS,
        })
    }

    /// Newton solve of the implicit current at terminal voltage `v`.
    fn current_at(&self, v: f64, i_seed: f64) -> Result<f64, DiodeError> {
        let mut i = i_seed;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let v_d = v + i * self.r_s;
            let e = (v_d / self.a).exp();
            let g = self.i_l - self.i_0 * (e - 1.0) - v_d / self.r_sh - i;
            let dg = -self.i_0 * self.r_s / self.a * e - self.r_s / self.r_sh - 1.0;
            let step = g / dg;
            i -= step;
            if !i.is_finite() {
                return Err(DiodeError::OperatingCurrent { voltage_v: v });
            }
            if step.abs() < CURRENT_TOLERANCE_A {
                return Ok(i);
            }
        }
        Err(DiodeError::OperatingCurrent { voltage_v: v })
    }

    /// Golden-section search for the maximum of `P(V) = V·I(V)` over
    /// `[0, V_oc]`. Returns `(voltage, current, power)`.
    fn max_power(&self, v_oc: f64) -> Result<(f64, f64, f64), DiodeError> {
        let mut lo = 0.0;
        let mut hi = v_oc;
        let mut v1 = hi - (hi - lo) * INV_PHI;
        let mut v2 = lo + (hi - lo) * INV_PHI;
        let mut p1 = v1 * self.current_at(v1, 0.9 * self.i_l)?;
        let mut p2 = v2 * self.current_at(v2, 0.9 * self.i_l)?;
        while hi - lo > MPP_BRACKET_TOLERANCE_V {
            if p1 < p2 {
                lo = v1;
                v1 = v2;
                p1 = p2;
                v2 = lo + (hi - lo) * INV_PHI;
                p2 = v2 * self.current_at(v2, 0.9 * self.i_l)?;
            } else {
                hi = v2;
                v2 = v1;
                p2 = p1;
                v1 = hi - (hi - lo) * INV_PHI;
                p1 = v1 * self.current_at(v1, 0.9 * self.i_l)?;
            }
        }
        let v = 0.5 * (lo + hi);
        let i = self.current_at(v, 0.9 * self.i_l)?;
        Ok((v, i, v * i))
    }
}

/// Solves one module operating point.
///
/// With `forced_voltage == None` the module operates at its maximum-power
/// point; otherwise current is evaluated at exactly the given terminal
/// voltage (clamped to zero once `V >= V_oc`).
///
/// # Errors
///
/// Returns a [`DiodeError`] if an iteration diverges or the solved power is
/// negative or non-finite; irradiance below [`MIN_ACTIVE_IRRADIANCE_W_M2`]
/// is not an error and yields the defined all-zero point.
pub fn operating_point(
    params: &ModuleParameters,
    s_eff_w_m2: f64,
    t_cell_c: f64,
    forced_voltage: Option<f64>,
) -> Result<OperatingPoint, DiodeError> {
    if s_eff_w_m2 < MIN_ACTIVE_IRRADIANCE_W_M2 {
        return Ok(OperatingPoint::dark(t_cell_c));
    }

    let diode = ScaledDiode::from_conditions(params, s_eff_w_m2, t_cell_c);
    let v_oc = diode.open_circuit_voltage(params.v_oc_ref)?;
    let i_sc = diode.i_l / (1.0 + diode.r_s / diode.r_sh);

    let (voltage_v, current_a, power_w) = match forced_voltage {
        None => diode.max_power(v_oc)?,
        Some(v) => {
            // Negative current at a forced voltage is clamped, not raised.
            let i = if v >= v_oc {
                0.0
            } else {
                diode.current_at(v, 0.9 * diode.i_l)?.max(0.0)
            };
            (v, i, v * i)
        }
    };

    if !power_w.is_finite() || power_w < 0.0 {
        return Err(DiodeError::NonFinitePower { power_w });
    }

    Ok(OperatingPoint {
        voltage_v,
        current_a,
        power_w,
        efficiency: power_w / (params.area_m2() * s_eff_w_m2),
        cell_temp_c: t_cell_c,
        v_oc,
        i_sc,
    })
}
