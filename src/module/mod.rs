//! Module-level physical models: single-diode electrical solver,
//! cell-temperature correlations, and optical (incidence/air-mass) derates.

/// Cell-temperature correlations (NOCT, Faiman).
pub mod celltemp;
/// Single-diode equivalent-circuit solver.
pub mod diode;
/// Incidence-angle and air-mass irradiance derates.
pub mod incidence;
/// Nameplate parameters and derived reference diode quantities.
pub mod params;

pub use celltemp::{CellTempModel, Mounting};
pub use diode::{DiodeError, MIN_ACTIVE_IRRADIANCE_W_M2, OperatingPoint, operating_point};
pub use incidence::{AirMassModel, IamModel, IncidenceModifier};
pub use params::{ModuleNameplate, ModuleParameters};
