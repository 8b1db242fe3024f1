//! Incidence-angle and air-mass irradiance derates.
//!
//! Both model families are selected once at setup and evaluated per
//! timestep as plain multipliers on the effective irradiance.

use std::f64::consts::PI;

use crate::config::ConfigError;
use crate::interp::{CubicSpline, check_strictly_increasing};

/// DeSoto spectral-correction polynomial coefficients in absolute air mass.
const DESOTO_AM_COEFFS: [f64; 5] = [0.918093, 0.086257, -0.024459, 0.002816, -0.000126];

/// Incidence-angle modifier model, chosen once at setup.
#[derive(Debug, Clone)]
pub enum IamModel {
    /// ASHRAE formula `1 - b0·(1/cosθ - 1)`.
    Ashrae { b0: f64 },
    /// Sandia fifth-order polynomial in the incidence angle (radians).
    SandiaPoly { coeffs: [f64; 6] },
    /// Cubic spline through a user-supplied angle/modifier table.
    Spline { curve: CubicSpline },
}

impl IamModel {
    /// Builds the spline variant, validating the table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for non-ascending angles, mismatched
    /// lengths, or modifier values outside `[0, 1]`.
    pub fn from_table(angles_deg: &[f64], modifiers: &[f64]) -> Result<Self, ConfigError> {
        check_strictly_increasing(angles_deg).map_err(|message| ConfigError {
            field: "optical.iam_angles_deg".into(),
            message,
        })?;
        if modifiers.iter().any(|m| !(0.0..=1.0).contains(m)) {
            return Err(ConfigError {
                field: "optical.iam_values".into(),
                message: "modifiers must lie in [0, 1]".into(),
            });
        }
        let curve = CubicSpline::fit(angles_deg, modifiers).map_err(|message| ConfigError {
            field: "optical.iam_values".into(),
            message,
        })?;
        Ok(IamModel::Spline { curve })
    }

    /// Modifier for the given incidence angle in degrees, clamped to
    /// `[0, 1]`.
    pub fn modifier(&self, inc_angle_deg: f64) -> f64 {
        let theta = inc_angle_deg.to_radians();
        let raw = match self {
            IamModel::Ashrae { b0 } => {
                if inc_angle_deg >= 90.0 {
                    0.0
                } else {
                    1.0 - b0 * (1.0 / theta.cos() - 1.0)
                }
            }
            IamModel::SandiaPoly { coeffs } => coeffs
                .iter()
                .rev()
                .fold(0.0, |acc, c| acc * theta + c),
            IamModel::Spline { curve } => curve.eval(inc_angle_deg),
        };
        raw.clamp(0.0, 1.0)
    }
}

/// Spectral (air-mass) modifier model.
#[derive(Debug, Clone)]
pub enum AirMassModel {
    /// Sandia polynomial with user-supplied coefficients.
    SandiaPoly { coeffs: [f64; 5] },
    /// Fixed DeSoto coefficient set.
    DeSoto,
}

impl AirMassModel {
    /// Modifier for the given solar zenith angle and site elevation.
    pub fn modifier(&self, zenith_deg: f64, elevation_m: f64) -> f64 {
        let coeffs = match self {
            AirMassModel::SandiaPoly { coeffs } => coeffs,
            AirMassModel::DeSoto => &DESOTO_AM_COEFFS,
        };
        let am = absolute_air_mass(zenith_deg, elevation_m);
        let f = coeffs.iter().rev().fold(0.0, |acc, c| acc * am + c);
        f.clamp(0.0, 1.5)
    }
}

/// Kasten–Young absolute air mass with the pressure correction for site
/// elevation. The zenith angle is capped just below the horizon; with the
/// sun actually down, irradiance is zero and the modifier is irrelevant.
fn absolute_air_mass(zenith_deg: f64, elevation_m: f64) -> f64 {
    let z = zenith_deg.clamp(0.0, 89.9);
    let relative = 1.0 / ((z * PI / 180.0).cos() + 0.5057 * (96.080 - z).powf(-1.634));
    relative * (-0.0001184 * elevation_m).exp()
}

/// The per-timestep optical derate stack: IAM times spectral correction.
#[derive(Debug, Clone)]
pub struct IncidenceModifier {
    pub iam: IamModel,
    pub air_mass: AirMassModel,
}

impl IncidenceModifier {
    /// Combined multiplier applied to the decomposed plane-of-array
    /// irradiance.
    pub fn combined(&self, inc_angle_deg: f64, zenith_deg: f64, elevation_m: f64) -> f64 {
        self.iam.modifier(inc_angle_deg) * self.air_mass.modifier(zenith_deg, elevation_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ashrae_is_unity_at_normal_incidence() {
        let iam = IamModel::Ashrae { b0: 0.05 };
        assert!((iam.modifier(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ashrae_decreases_with_angle() {
        let iam = IamModel::Ashrae { b0: 0.05 };
        assert!(iam.modifier(60.0) < iam.modifier(30.0));
        assert!(iam.modifier(30.0) < iam.modifier(0.0));
    }

    #[test]
    fn ashrae_clamps_to_zero_at_grazing_angles() {
        let iam = IamModel::Ashrae { b0: 0.05 };
        assert_eq!(iam.modifier(90.0), 0.0);
        assert_eq!(iam.modifier(89.9), 0.0);
    }

    #[test]
    fn sandia_poly_constant_term_holds_at_zero() {
        let iam = IamModel::SandiaPoly {
            coeffs: [1.0, -0.01, -0.05, 0.0, 0.0, 0.0],
        };
        assert!((iam.modifier(0.0) - 1.0).abs() < 1e-12);
        assert!(iam.modifier(70.0) < 1.0);
    }

    #[test]
    fn spline_table_rejects_unsorted_angles() {
        let err = IamModel::from_table(&[0.0, 50.0, 30.0], &[1.0, 0.9, 0.8]);
        assert!(err.is_err());
    }

    #[test]
    fn spline_table_rejects_out_of_range_modifier() {
        let err = IamModel::from_table(&[0.0, 45.0, 90.0], &[1.0, 1.2, 0.0]);
        assert!(err.is_err());
    }

    #[test]
    fn spline_table_reproduces_knots() {
        let angles = [0.0, 30.0, 60.0, 75.0, 90.0];
        let values = [1.0, 0.999, 0.96, 0.85, 0.0];
        let iam = IamModel::from_table(&angles, &values).expect("valid table");
        for (a, v) in angles.iter().zip(values.iter()) {
            assert!((iam.modifier(*a) - v).abs() < 1e-6, "angle {a}");
        }
    }

    #[test]
    fn desoto_near_unity_at_noon_sea_level() {
        let am = AirMassModel::DeSoto;
        let f = am.modifier(10.0, 0.0);
        assert!((f - 1.0).abs() < 0.02, "modifier {f}");
    }

    #[test]
    fn air_mass_modifier_finite_past_horizon() {
        let am = AirMassModel::DeSoto;
        let f = am.modifier(95.0, 0.0);
        assert!(f.is_finite());
        assert!((0.0..=1.5).contains(&f));
    }

    #[test]
    fn elevation_lowers_the_spectral_modifier_at_moderate_zenith() {
        // The polynomial still rises with air mass around AM 2, and the
        // pressure correction lowers absolute air mass, so altitude shaves
        // a little off the modifier at this zenith.
        let am = AirMassModel::DeSoto;
        let sea = am.modifier(60.0, 0.0);
        let alpine = am.modifier(60.0, 2500.0);
        assert!(alpine < sea);
        assert!(sea - alpine < 0.05, "sea {sea} alpine {alpine}");
    }

    #[test]
    fn combined_multiplier_is_product() {
        let inc = IncidenceModifier {
            iam: IamModel::Ashrae { b0: 0.05 },
            air_mass: AirMassModel::DeSoto,
        };
        let combined = inc.combined(40.0, 50.0, 100.0);
        let expected = inc.iam.modifier(40.0) * inc.air_mass.modifier(50.0, 100.0);
        assert_eq!(combined, expected);
    }
}
