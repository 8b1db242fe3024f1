//! Post-hoc energy report computation from simulation results.

use std::fmt;

use super::types::StepRecord;

/// Aggregate production metrics derived from a complete simulation run.
///
/// Computed post-hoc from `Vec<StepRecord>` to ensure consistency between
/// step data and reported metrics.
#[derive(Debug, Clone)]
pub struct EnergyReport {
    /// Net AC energy delivered over the run (kWh).
    pub net_ac_kwh: f64,
    /// Net DC energy delivered to the inverter (kWh).
    pub net_dc_kwh: f64,
    /// Gross nominal POA energy (kWh).
    pub poa_nominal_kwh: f64,
    /// Peak net AC power (W).
    pub peak_ac_w: f64,
    /// Energy lost to inverter clipping (kWh).
    pub clip_loss_kwh: f64,
    /// Hours the inverter delivered power.
    pub generating_hours: f64,
    /// Energy-weighted mean inverter efficiency while delivering.
    pub mean_inverter_efficiency: f64,
    /// Energy-weighted mean cell temperature while generating (°C).
    pub mean_cell_temp_c: f64,
    /// Number of steps where the MPPT voltage had to be clamped into the
    /// inverter window.
    pub mppt_window_count: usize,
}

impl EnergyReport {
    /// Computes all metrics from the complete step record vector.
    ///
    /// # Arguments
    ///
    /// * `records` - Complete simulation step results
    /// * `dt_hours` - Timestep duration in hours
    /// * `mppt_window_count` - Window-clamp warning count from the engine
    pub fn from_records(records: &[StepRecord], dt_hours: f64, mppt_window_count: usize) -> Self {
        let mut net_ac_wh = 0.0;
        let mut net_dc_wh = 0.0;
        let mut poa_wh = 0.0;
        let mut peak_ac = 0.0_f64;
        let mut clip_wh = 0.0;
        let mut generating_hours = 0.0;
        let mut eff_weighted = 0.0;
        let mut temp_weighted = 0.0;
        let mut dc_weight = 0.0;

        for r in records {
            net_ac_wh += r.ac_net_w * dt_hours;
            net_dc_wh += r.dc_net_w * dt_hours;
            poa_wh += r.poa_nominal_w * dt_hours;
            peak_ac = peak_ac.max(r.ac_net_w);
            clip_wh += r.clip_loss_w * dt_hours;
            if r.ac_power_w > 0.0 {
                generating_hours += dt_hours;
                eff_weighted += r.inverter_efficiency * r.dc_net_w * dt_hours;
                temp_weighted += r.cell_temp_c * r.dc_net_w * dt_hours;
                dc_weight += r.dc_net_w * dt_hours;
            }
        }

        Self {
            net_ac_kwh: net_ac_wh / 1000.0,
            net_dc_kwh: net_dc_wh / 1000.0,
            poa_nominal_kwh: poa_wh / 1000.0,
            peak_ac_w: peak_ac,
            clip_loss_kwh: clip_wh / 1000.0,
            generating_hours,
            mean_inverter_efficiency: if dc_weight > 0.0 {
                eff_weighted / dc_weight
            } else {
                0.0
            },
            mean_cell_temp_c: if dc_weight > 0.0 {
                temp_weighted / dc_weight
            } else {
                0.0
            },
            mppt_window_count,
        }
    }
}

impl fmt::Display for EnergyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy Report ---")?;
        writeln!(f, "Net AC energy:        {:.1} kWh", self.net_ac_kwh)?;
        writeln!(f, "Net DC energy:        {:.1} kWh", self.net_dc_kwh)?;
        writeln!(f, "Nominal POA energy:   {:.1} kWh", self.poa_nominal_kwh)?;
        writeln!(f, "Peak AC power:        {:.0} W", self.peak_ac_w)?;
        writeln!(f, "Clipping loss:        {:.1} kWh", self.clip_loss_kwh)?;
        writeln!(f, "Generating hours:     {:.1} h", self.generating_hours)?;
        writeln!(
            f,
            "Mean inverter eff.:   {:.3}",
            self.mean_inverter_efficiency
        )?;
        writeln!(f, "Mean cell temp:       {:.1} °C", self.mean_cell_temp_c)?;
        write!(
            f,
            "MPPT window clamps:   {} steps",
            self.mppt_window_count
        )
    }
}
