/// Simulation clock for lifetime timestep management.
pub mod clock;
pub mod engine;
/// Loss-ledger stages and reconciliation.
pub mod losses;
/// MPPT voltage coordination across subarrays.
pub mod mppt;
pub mod report;
pub mod types;
