//! Runtime simulation errors.
//!
//! Setup-time problems are [`crate::config::ConfigError`]; this module covers
//! the faults that can only surface inside the timestep loop. They carry the
//! timestep index and subarray identity needed to reproduce the failure.

use std::fmt;

use crate::module::DiodeError;

/// Fatal runtime error raised from inside the timestep loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The single-diode solver diverged or produced a non-physical result.
    NumericDivergence {
        /// Timestep index at which the fault occurred.
        timestep: usize,
        /// Zero-based subarray index.
        subarray: usize,
        /// The underlying solver fault.
        source: DiodeError,
    },
    /// The run was cancelled through the cooperative callback; partial
    /// results are discarded.
    Cancelled {
        /// Timestep index at which cancellation was observed.
        timestep: usize,
    },
}

impl SimError {
    /// Wraps a diode solver fault with its timestep/subarray context.
    pub(crate) fn divergence(timestep: usize, subarray: usize, source: DiodeError) -> Self {
        SimError::NumericDivergence {
            timestep,
            subarray,
            source,
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::NumericDivergence {
                timestep,
                subarray,
                source,
            } => write!(
                f,
                "numeric divergence at timestep {timestep}, subarray {subarray}: {source}"
            ),
            SimError::Cancelled { timestep } => {
                write!(f, "run cancelled at timestep {timestep}")
            }
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_timestep_and_subarray() {
        let e = SimError::divergence(
            4217,
            2,
            DiodeError::OpenCircuitVoltage { iterations: 100 },
        );
        let s = format!("{e}");
        assert!(s.contains("4217"));
        assert!(s.contains("subarray 2"));
    }

    #[test]
    fn cancelled_display() {
        let e = SimError::Cancelled { timestep: 5000 };
        assert!(format!("{e}").contains("cancelled"));
    }
}
