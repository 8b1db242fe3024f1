//! Energy loss ledger for the DC→AC cascade.
//!
//! Every stage that removes (or, for the night tare, injects) energy books
//! its absolute amount into a named bucket. The ledger reconciles exactly:
//! gross nominal POA energy equals the sum of all named losses plus final
//! net AC energy, within floating-point tolerance.

use std::fmt;

/// Reference quantity a stage's percentage is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossBasis {
    /// Gross nominal plane-of-array energy.
    NominalPoa,
    /// Gross DC energy at the module terminals.
    GrossDc,
    /// Net DC energy delivered to the inverter.
    NetDc,
}

/// One stage of the ordered loss cascade.
///
/// The declaration order is the cascade order; iteration and reporting
/// follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossStage {
    /// External shading derate on the beam component.
    Shading,
    /// Soiling derate on total POA.
    Soiling,
    /// Incidence-angle and air-mass (optical) derates.
    Reflection,
    /// Irradiance not converted by the modules.
    ModuleConversion,
    /// Module mismatch derate.
    Mismatch,
    /// DC wiring and diode derate.
    Wiring,
    /// Nameplate tolerance derate.
    Nameplate,
    /// Tracking-system availability derate.
    Tracking,
    /// DC power-optimizer derate.
    DcOptimizer,
    /// Lifetime degradation factor.
    Degradation,
    /// Power given up by clamping the operating voltage into the MPPT
    /// window.
    MpptClipping,
    /// DC input not converted by the inverter (curve inefficiency).
    InverterConversion,
    /// AC nameplate / DC-current clipping.
    InverterClipping,
    /// Inverter operating self-consumption.
    InverterConsumption,
    /// Inverter night-tare draw.
    NightTare,
    /// Inverter ambient-temperature derate.
    ThermalDerate,
    /// AC wiring / transformer loss.
    AcWiring,
}

impl LossStage {
    /// All stages in cascade order.
    pub const ALL: [LossStage; 17] = [
        LossStage::Shading,
        LossStage::Soiling,
        LossStage::Reflection,
        LossStage::ModuleConversion,
        LossStage::Mismatch,
        LossStage::Wiring,
        LossStage::Nameplate,
        LossStage::Tracking,
        LossStage::DcOptimizer,
        LossStage::Degradation,
        LossStage::MpptClipping,
        LossStage::InverterConversion,
        LossStage::InverterClipping,
        LossStage::InverterConsumption,
        LossStage::NightTare,
        LossStage::ThermalDerate,
        LossStage::AcWiring,
    ];

    fn index(self) -> usize {
        LossStage::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or(0)
    }

    /// Human-readable stage name.
    pub fn label(self) -> &'static str {
        match self {
            LossStage::Shading => "shading",
            LossStage::Soiling => "soiling",
            LossStage::Reflection => "reflection (IAM/AM)",
            LossStage::ModuleConversion => "module conversion",
            LossStage::Mismatch => "mismatch",
            LossStage::Wiring => "DC wiring",
            LossStage::Nameplate => "nameplate",
            LossStage::Tracking => "tracking availability",
            LossStage::DcOptimizer => "DC optimizer",
            LossStage::Degradation => "lifetime degradation",
            LossStage::MpptClipping => "MPPT window clipping",
            LossStage::InverterConversion => "inverter conversion",
            LossStage::InverterClipping => "inverter clipping",
            LossStage::InverterConsumption => "inverter consumption",
            LossStage::NightTare => "inverter night tare",
            LossStage::ThermalDerate => "inverter thermal derate",
            LossStage::AcWiring => "AC wiring",
        }
    }

    /// Reference basis for percentage reporting.
    pub fn basis(self) -> LossBasis {
        match self {
            LossStage::Shading
            | LossStage::Soiling
            | LossStage::Reflection
            | LossStage::ModuleConversion => LossBasis::NominalPoa,
            LossStage::Mismatch
            | LossStage::Wiring
            | LossStage::Nameplate
            | LossStage::Tracking
            | LossStage::DcOptimizer
            | LossStage::Degradation
            | LossStage::MpptClipping => LossBasis::GrossDc,
            _ => LossBasis::NetDc,
        }
    }
}

/// Running energy account over a simulation run. All energies in Wh.
#[derive(Debug, Clone)]
pub struct LossLedger {
    losses_wh: [f64; LossStage::ALL.len()],
    /// Gross nominal POA energy over all module area (Wh).
    pub poa_nominal_wh: f64,
    /// Gross DC energy at the module terminals (Wh).
    pub gross_dc_wh: f64,
    /// Net DC energy delivered to the inverter (Wh).
    pub net_dc_wh: f64,
    /// Final net AC energy after AC wiring (Wh).
    pub net_ac_wh: f64,
}

impl LossLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self {
            losses_wh: [0.0; LossStage::ALL.len()],
            poa_nominal_wh: 0.0,
            gross_dc_wh: 0.0,
            net_dc_wh: 0.0,
            net_ac_wh: 0.0,
        }
    }

    /// Books `energy_wh` against a stage.
    pub fn add(&mut self, stage: LossStage, energy_wh: f64) {
        self.losses_wh[stage.index()] += energy_wh;
    }

    /// Accumulated energy for a stage (Wh).
    pub fn get(&self, stage: LossStage) -> f64 {
        self.losses_wh[stage.index()]
    }

    /// Sum of every named loss (Wh).
    pub fn total_losses_wh(&self) -> f64 {
        self.losses_wh.iter().sum()
    }

    /// `grossDC − Σ(named DC losses) − netDC`; zero when the DC side
    /// reconciles.
    pub fn dc_identity_error_wh(&self) -> f64 {
        let dc_losses: f64 = [
            LossStage::Mismatch,
            LossStage::Wiring,
            LossStage::Nameplate,
            LossStage::Tracking,
            LossStage::DcOptimizer,
            LossStage::Degradation,
            LossStage::MpptClipping,
        ]
        .iter()
        .map(|s| self.get(*s))
        .sum();
        self.gross_dc_wh - dc_losses - self.net_dc_wh
    }

    /// `netDC − Σ(named inverter losses) − Σ(AC-side energy)`; zero when
    /// the AC side reconciles. The night tare enters as extra consumption
    /// beyond the DC input.
    pub fn ac_identity_error_wh(&self) -> f64 {
        let inverter_losses: f64 = [
            LossStage::InverterConversion,
            LossStage::InverterClipping,
            LossStage::InverterConsumption,
            LossStage::NightTare,
            LossStage::ThermalDerate,
            LossStage::AcWiring,
        ]
        .iter()
        .map(|s| self.get(*s))
        .sum();
        self.net_dc_wh - inverter_losses - self.net_ac_wh
    }

    /// `nominalPOA − Σ(all named losses) − netAC`; zero when the whole
    /// cascade conserves energy.
    pub fn conservation_error_wh(&self) -> f64 {
        self.poa_nominal_wh - self.total_losses_wh() - self.net_ac_wh
    }

    fn basis_wh(&self, basis: LossBasis) -> f64 {
        match basis {
            LossBasis::NominalPoa => self.poa_nominal_wh,
            LossBasis::GrossDc => self.gross_dc_wh,
            LossBasis::NetDc => self.net_dc_wh,
        }
    }
}

impl Default for LossLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LossLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Loss Ledger ---")?;
        writeln!(f, "Nominal POA energy:  {:>12.2} kWh", self.poa_nominal_wh / 1000.0)?;
        writeln!(f, "Gross DC energy:     {:>12.2} kWh", self.gross_dc_wh / 1000.0)?;
        writeln!(f, "Net DC energy:       {:>12.2} kWh", self.net_dc_wh / 1000.0)?;
        writeln!(f, "Net AC energy:       {:>12.2} kWh", self.net_ac_wh / 1000.0)?;
        for stage in LossStage::ALL {
            let wh = self.get(stage);
            let basis = self.basis_wh(stage.basis());
            let pct = if basis > 0.0 { 100.0 * wh / basis } else { 0.0 };
            writeln!(
                f,
                "  {:<24} {:>12.2} kWh  ({:>5.2}%)",
                stage.label(),
                wh / 1000.0,
                pct
            )?;
        }
        write!(
            f,
            "Conservation residual: {:.6} Wh",
            self.conservation_error_wh()
        )
    }
}
