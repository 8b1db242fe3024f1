//! CSV export for simulation step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepRecord;

/// Schema v1 column header for CSV telemetry export.
const HEADER: &str = "timestep,year,time_hr,poa_nominal_w,dc_gross_w,dc_net_w,\
                       mppt_voltage_v,ac_power_w,ac_net_w,inverter_efficiency,\
                       cell_temp_c,clip_loss_w,consumption_loss_w,night_tare_loss_w,\
                       thermal_loss_w,mppt_clip_loss_w,window_exceeded";

/// Exports simulation records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step using the schema v1
/// column layout. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes simulation records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows
    for r in records {
        wtr.write_record(&[
            r.timestep.to_string(),
            r.year.to_string(),
            format!("{:.2}", r.time_hr),
            format!("{:.2}", r.poa_nominal_w),
            format!("{:.2}", r.dc_gross_w),
            format!("{:.2}", r.dc_net_w),
            format!("{:.2}", r.mppt_voltage_v),
            format!("{:.2}", r.ac_power_w),
            format!("{:.2}", r.ac_net_w),
            format!("{:.4}", r.inverter_efficiency),
            format!("{:.2}", r.cell_temp_c),
            format!("{:.2}", r.clip_loss_w),
            format!("{:.2}", r.consumption_loss_w),
            format!("{:.2}", r.night_tare_loss_w),
            format!("{:.2}", r.thermal_loss_w),
            format!("{:.2}", r.mppt_clip_loss_w),
            r.mppt_window_exceeded.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
