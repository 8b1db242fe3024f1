//! Interpolation helpers: natural cubic splines and piecewise-linear tables.
//!
//! Splines are fitted once at setup from tabulated curves (inverter
//! efficiency, incidence-angle modifiers) and evaluated many times per
//! simulated year, so fitting validates its inputs eagerly and evaluation
//! never fails.

/// Checks that a table axis is strictly increasing.
///
/// # Errors
///
/// Returns a message naming the offending index if two consecutive entries
/// are out of order or equal.
pub fn check_strictly_increasing(xs: &[f64]) -> Result<(), String> {
    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(format!(
                "table axis must be strictly increasing, but entry {} ({}) <= entry {} ({})",
                i,
                xs[i],
                i - 1,
                xs[i - 1]
            ));
        }
    }
    Ok(())
}

/// Piecewise-linear interpolation over a tabulated curve.
///
/// Values outside the table range clamp to the first/last entry. `xs` must
/// be sorted ascending (validated at setup via [`check_strictly_increasing`]).
pub fn lerp_table(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.is_empty() {
        return 0.0;
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }
    // xs[i-1] < x < xs[i] for some interior i
    let i = xs.partition_point(|&xk| xk < x);
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Natural cubic spline fitted once from tabulated points.
///
/// Boundary second derivatives are zero and evaluation outside the fitted
/// range extrapolates linearly with the boundary slope, matching the
/// behavior expected of tabulated efficiency curves near their ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot.
    d2: Vec<f64>,
}

impl CubicSpline {
    /// Fits a natural cubic spline through the given points.
    ///
    /// # Errors
    ///
    /// Returns a message if fewer than two points are given, the axis
    /// lengths differ, the axis is not strictly increasing, or any value is
    /// non-finite.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, String> {
        if xs.len() != ys.len() {
            return Err(format!(
                "curve axes have mismatched lengths ({} vs {})",
                xs.len(),
                ys.len()
            ));
        }
        if xs.len() < 2 {
            return Err("curve needs at least two points".to_string());
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err("curve contains a non-finite value".to_string());
        }
        check_strictly_increasing(xs)?;

        let n = xs.len();
        let mut d2 = vec![0.0; n];
        if n > 2 {
            // Thomas algorithm on the interior knots; natural boundary keeps
            // d2[0] == d2[n-1] == 0.
            let m = n - 2;
            let mut diag = vec![0.0; m];
            let mut rhs = vec![0.0; m];
            let mut upper = vec![0.0; m];
            for i in 0..m {
                let h0 = xs[i + 1] - xs[i];
                let h1 = xs[i + 2] - xs[i + 1];
                diag[i] = 2.0 * (h0 + h1);
                upper[i] = h1;
                rhs[i] =
                    6.0 * ((ys[i + 2] - ys[i + 1]) / h1 - (ys[i + 1] - ys[i]) / h0);
            }
            // Forward sweep (sub-diagonal equals the previous interval width).
            for i in 1..m {
                let h0 = xs[i + 1] - xs[i];
                let w = h0 / diag[i - 1];
                diag[i] -= w * upper[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            d2[m] = rhs[m - 1] / diag[m - 1];
            for i in (0..m - 1).rev() {
                d2[i + 1] = (rhs[i] - upper[i] * d2[i + 2]) / diag[i];
            }
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            d2,
        })
    }

    /// Evaluates the spline at `x`, extrapolating linearly beyond the ends.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x < self.xs[0] {
            return self.ys[0] + self.start_slope(0) * (x - self.xs[0]);
        }
        if x > self.xs[n - 1] {
            let i = n - 2;
            let h = self.xs[i + 1] - self.xs[i];
            let end_slope = self.start_slope(i) + h * (self.d2[i] + self.d2[i + 1]) / 2.0;
            return self.ys[n - 1] + end_slope * (x - self.xs[n - 1]);
        }
        let i = self.xs.partition_point(|&xk| xk < x).clamp(1, n - 1) - 1;
        let h = self.xs[i + 1] - self.xs[i];
        let t = x - self.xs[i];
        self.ys[i]
            + t * self.start_slope(i)
            + t * t * self.d2[i] / 2.0
            + t * t * t * (self.d2[i + 1] - self.d2[i]) / (6.0 * h)
    }

    /// First derivative at the left knot of segment `i`.
    fn start_slope(&self, i: usize) -> f64 {
        let h = self.xs[i + 1] - self.xs[i];
        (self.ys[i + 1] - self.ys[i]) / h - h / 6.0 * (2.0 * self.d2[i] + self.d2[i + 1])
    }
}
