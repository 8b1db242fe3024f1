//! Simulation engine that orchestrates the per-timestep electrical pipeline.
//!
//! Order per step: optical derates → cell temperature (two passes for
//! Faiman) → MPPT voltage coordination → DC-side derates → inverter
//! conversion → AC wiring, with every stage booked into the loss ledger.

use crate::error::SimError;
use crate::inverter::InverterParameters;
use crate::module::{CellTempModel, IncidenceModifier, ModuleParameters};

use super::clock::{Clock, Tick};
use super::losses::{LossLedger, LossStage};
use super::mppt::{self, CoordinationOutcome, SubarrayChannel};
use super::types::{SimConfig, StepRecord, Subarray, SubarrayRecord, WeatherSample};

/// How often the cooperative cancellation callback is polled (timesteps).
pub const CANCEL_POLL_INTERVAL: usize = 2500;

/// Per-subarray irradiance bookkeeping for one step, all in W/m².
struct EffectiveIrradiance {
    /// After shading, soiling, and optical derates.
    s_eff: f64,
    shading_loss: f64,
    soiling_loss: f64,
    reflection_loss: f64,
}

/// Simulation engine owning the array description and the loss ledger.
///
/// Model variants (cell temperature, incidence, inverter) are selected once
/// at setup; the step loop never inspects types.
pub struct Engine {
    config: SimConfig,
    module: ModuleParameters,
    inverter: InverterParameters,
    cell_temp: CellTempModel,
    incidence: IncidenceModifier,
    subarrays: Vec<Subarray>,
    mismatch_sweep: bool,
    ac_wiring_loss: f64,
    ledger: LossLedger,
    mppt_window_count: usize,
}

impl Engine {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulation timing and site parameters
    /// * `module` - Validated module parameters with derived diode constants
    /// * `inverter` - Inverter conversion model and MPPT window
    /// * `cell_temp` - Cell-temperature correlation
    /// * `incidence` - Incidence-angle and air-mass derate models
    /// * `subarrays` - Subarray layout and derates
    /// * `mismatch_sweep` - Enables the mismatch-aware voltage sweep
    /// * `ac_wiring_loss` - AC-side wiring loss fraction
    ///
    /// # Panics
    ///
    /// Panics if no subarray is enabled.
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        config: SimConfig,
        module: ModuleParameters,
        inverter: InverterParameters,
        cell_temp: CellTempModel,
        incidence: IncidenceModifier,
        subarrays: Vec<Subarray>,
        mismatch_sweep: bool,
        ac_wiring_loss: f64,
    ) -> Self {
        assert!(
            subarrays.iter().any(|s| s.enabled),
            "at least one subarray must be enabled"
        );
        Self {
            config,
            module,
            inverter,
            cell_temp,
            incidence,
            subarrays,
            mismatch_sweep,
            ac_wiring_loss,
            ledger: LossLedger::new(),
            mppt_window_count: 0,
        }
    }

    /// Shading, soiling, and optical derates for one subarray.
    fn effective_irradiance(&self, sub: &Subarray, w: &WeatherSample) -> EffectiveIrradiance {
        let poa_total = w.poa_total_w_m2();

        // Shading hits the beam component when POA is decomposed; a
        // measured POA total is derated as a whole.
        let (beam, rest, shading_loss) = if w.poa_w_m2.is_some() {
            let loss = poa_total * sub.shading_beam_loss;
            (poa_total - loss, 0.0, loss)
        } else {
            let loss = w.beam_w_m2 * sub.shading_beam_loss;
            (
                w.beam_w_m2 - loss,
                w.diffuse_w_m2 + w.ground_w_m2,
                loss,
            )
        };

        let soiling_loss = (beam + rest) * sub.derates.soiling;
        let beam = beam * (1.0 - sub.derates.soiling);
        let rest = rest * (1.0 - sub.derates.soiling);

        // A reference-cell POA measurement already embodies cover effects,
        // so the reflection stage is skipped for it.
        let (s_eff, reflection_loss) = if w.poa_from_weather_file {
            (beam + rest, 0.0)
        } else {
            let am = self
                .incidence
                .air_mass
                .modifier(w.zenith_deg, self.config.elevation_m);
            let iam = self.incidence.iam.modifier(w.incidence_deg);
            let s = am * (beam * iam + rest);
            (s, (beam + rest) - s)
        };

        EffectiveIrradiance {
            s_eff,
            shading_loss,
            soiling_loss,
            reflection_loss,
        }
    }

    /// Cell temperature for one subarray at the given conversion
    /// efficiency.
    fn cell_temperature(&self, s_eff: f64, w: &WeatherSample, efficiency: f64) -> f64 {
        self.cell_temp
            .cell_temp_c(s_eff, w.t_ambient_c, w.wind_m_s, efficiency)
    }

    /// Executes one simulation timestep.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NumericDivergence`] with timestep and subarray
    /// context if the diode solver fails.
    pub fn step(&mut self, tick: &Tick, weather: &WeatherSample) -> Result<StepRecord, SimError> {
        if tick.year_boundary {
            for sub in &mut self.subarrays {
                sub.advance_year();
            }
        }

        let dt = self.config.dt_hours;
        let module_area = self.module.area_m2();
        let enabled: Vec<&Subarray> = self.subarrays.iter().filter(|s| s.enabled).collect();

        let mut poa_nominal_w = 0.0;
        let mut channels = Vec::with_capacity(enabled.len());
        let mut irradiances = Vec::with_capacity(enabled.len());
        for sub in &enabled {
            let area = module_area * sub.module_count() as f64;
            poa_nominal_w += weather.poa_total_w_m2() * area;
            let eff_irr = self.effective_irradiance(sub, weather);
            self.ledger.add(LossStage::Shading, eff_irr.shading_loss * area * dt);
            self.ledger.add(LossStage::Soiling, eff_irr.soiling_loss * area * dt);
            self.ledger
                .add(LossStage::Reflection, eff_irr.reflection_loss * area * dt);
            channels.push(SubarrayChannel {
                s_eff_w_m2: eff_irr.s_eff,
                t_cell_c: self.cell_temperature(
                    eff_irr.s_eff,
                    weather,
                    self.module.nominal_efficiency(),
                ),
                modules_per_string: sub.modules_per_string,
                strings_in_parallel: sub.strings_in_parallel,
            });
            irradiances.push(eff_irr);
        }

        let mut outcome = self.coordinate(tick.index, &channels)?;

        // Faiman couples cell temperature to the module's own efficiency:
        // exactly one more pass with the solved efficiencies, then a final
        // coordination. Bounded by design, not iterated to tolerance.
        if self.cell_temp.needs_second_pass() {
            for (ch, op) in channels.iter_mut().zip(&outcome.points) {
                ch.t_cell_c = self.cell_temperature(ch.s_eff_w_m2, weather, op.efficiency);
            }
            outcome = self.coordinate(tick.index, &channels)?;
        }

        let coordinated_dc_w: f64 = outcome.total_power_w(&channels);
        // Gross DC is what unconstrained tracking would have produced; the
        // window clamp re-appears below as its own ledger stage.
        let dc_gross_w = coordinated_dc_w + outcome.clip_loss_w;

        let s_eff_power_w: f64 = irradiances
            .iter()
            .zip(&enabled)
            .map(|(irr, sub)| irr.s_eff * module_area * sub.module_count() as f64)
            .sum();
        self.ledger.add(
            LossStage::ModuleConversion,
            (s_eff_power_w - dc_gross_w) * dt,
        );
        self.ledger
            .add(LossStage::MpptClipping, outcome.clip_loss_w * dt);
        if outcome.window_exceeded {
            self.mppt_window_count += 1;
        }

        // DC-side derate cascade, per subarray, in ledger order.
        let mut dc_net_w = 0.0;
        let mut subarray_records = Vec::with_capacity(enabled.len());
        let mut cell_temp_sum = 0.0;
        for ((sub, op), ch) in enabled.iter().zip(&outcome.points).zip(&channels) {
            let mut p = op.power_w * sub.module_count() as f64;
            let d = &sub.derates;
            for (stage, frac) in [
                (LossStage::Mismatch, d.mismatch),
                (LossStage::Wiring, d.wiring),
                (LossStage::Nameplate, d.nameplate),
                (LossStage::Tracking, d.tracking),
                (LossStage::DcOptimizer, d.dc_optimizer),
            ] {
                self.ledger.add(stage, p * frac * dt);
                p *= 1.0 - frac;
            }
            self.ledger
                .add(LossStage::Degradation, p * (1.0 - sub.degradation_factor) * dt);
            p *= sub.degradation_factor;
            dc_net_w += p;
            cell_temp_sum += ch.t_cell_c;
            subarray_records.push(SubarrayRecord {
                module_voltage_v: op.voltage_v,
                module_current_a: op.current_a,
                gross_dc_w: op.power_w * sub.module_count() as f64,
                efficiency: op.efficiency,
                cell_temp_c: ch.t_cell_c,
                v_oc: op.v_oc,
                i_sc: op.i_sc,
            });
        }

        // Inverter bank: identical units share the DC input evenly.
        let units = self.inverter.count as f64;
        let conv = self.inverter.ac_power(
            dc_net_w / units,
            outcome.string_voltage_v,
            weather.t_ambient_c,
        );
        let ac_power_w = conv.ac_power_w * units;
        let clip_loss_w = conv.clip_loss_w * units;
        let consumption_loss_w = conv.consumption_loss_w * units;
        let night_tare_loss_w = conv.night_tare_loss_w * units;
        let thermal_loss_w = conv.thermal_derate_loss_w * units;
        // Whatever the named inverter buckets don't account for is curve
        // inefficiency.
        let conversion_loss_w = dc_net_w - ac_power_w - clip_loss_w - consumption_loss_w
            - thermal_loss_w
            - night_tare_loss_w;

        self.ledger
            .add(LossStage::InverterConversion, conversion_loss_w * dt);
        self.ledger.add(LossStage::InverterClipping, clip_loss_w * dt);
        self.ledger
            .add(LossStage::InverterConsumption, consumption_loss_w * dt);
        self.ledger.add(LossStage::NightTare, night_tare_loss_w * dt);
        self.ledger.add(LossStage::ThermalDerate, thermal_loss_w * dt);

        let ac_wiring_loss_w = if ac_power_w > 0.0 {
            ac_power_w * self.ac_wiring_loss
        } else {
            0.0
        };
        self.ledger.add(LossStage::AcWiring, ac_wiring_loss_w * dt);
        let ac_net_w = ac_power_w - ac_wiring_loss_w;

        self.ledger.poa_nominal_wh += poa_nominal_w * dt;
        self.ledger.gross_dc_wh += dc_gross_w * dt;
        self.ledger.net_dc_wh += dc_net_w * dt;
        self.ledger.net_ac_wh += ac_net_w * dt;

        Ok(StepRecord {
            timestep: tick.index,
            time_hr: tick.step_in_year as f64 * dt,
            year: tick.year,
            poa_nominal_w,
            dc_gross_w,
            dc_net_w,
            mppt_voltage_v: outcome.string_voltage_v,
            ac_power_w,
            ac_net_w,
            inverter_efficiency: conv.efficiency,
            clip_loss_w,
            consumption_loss_w,
            night_tare_loss_w,
            thermal_loss_w,
            mppt_clip_loss_w: outcome.clip_loss_w,
            mppt_window_exceeded: outcome.window_exceeded,
            cell_temp_c: cell_temp_sum / enabled.len() as f64,
            subarrays: subarray_records,
        })
    }

    fn coordinate(
        &self,
        timestep: usize,
        channels: &[SubarrayChannel],
    ) -> Result<CoordinationOutcome, SimError> {
        mppt::coordinate(&self.module, &self.inverter, self.mismatch_sweep, channels)
            .map_err(|e| SimError::divergence(timestep, e.subarray, e.source))
    }

    /// Executes the whole lifetime run.
    ///
    /// `weather` supplies one sample per tick; `should_continue` is the
    /// cooperative cancellation callback, polled every
    /// [`CANCEL_POLL_INTERVAL`] timesteps. Cancellation discards all partial
    /// results.
    ///
    /// # Errors
    ///
    /// Propagates the first [`SimError`] from any step, or
    /// [`SimError::Cancelled`].
    pub fn run<W, C>(
        &mut self,
        mut weather: W,
        mut should_continue: C,
    ) -> Result<Vec<StepRecord>, SimError>
    where
        W: FnMut(&Tick) -> WeatherSample,
        C: FnMut() -> bool,
    {
        let mut clock = Clock::new(self.config.steps_per_year(), self.config.years);
        let mut records = Vec::with_capacity(self.config.total_steps());
        while let Some(tick) = clock.tick() {
            if tick.index % CANCEL_POLL_INTERVAL == 0 && !should_continue() {
                return Err(SimError::Cancelled {
                    timestep: tick.index,
                });
            }
            let sample = weather(&tick);
            records.push(self.step(&tick, &sample)?);
        }
        Ok(records)
    }

    /// The accumulated loss ledger.
    pub fn ledger(&self) -> &LossLedger {
        &self.ledger
    }

    /// How many steps clamped the operating voltage into the MPPT window.
    pub fn mppt_window_count(&self) -> usize {
        self.mppt_window_count
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the subarray states (degradation factors advance during a
    /// run).
    pub fn subarrays(&self) -> &[Subarray] {
        &self.subarrays
    }
}
