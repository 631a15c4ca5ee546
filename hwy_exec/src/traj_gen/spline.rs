//! # Natural cubic spline
//!
//! Interpolates a set of points with strictly increasing `x` using piecewise cubics whose second
//! derivative is zero at both ends. Outside the knot range the spline continues linearly along the
//! end tangents.

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A natural cubic spline `y = f(x)`.
///
/// Segment `i` is `a[i] + b[i] dx + c[i] dx^2 + d[i] dx^3` with `dx = x - x[i]`.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,

    /// Slope at the last knot, used to extrapolate beyond it.
    end_slope: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SplineError {
    #[error("A spline needs at least 2 points, found {0}")]
    TooFewPoints(usize),

    #[error("Found {num_x} x values but {num_y} y values")]
    LengthMismatch { num_x: usize, num_y: usize },

    #[error("Point {0} is not finite")]
    NonFinite(usize),

    #[error("Point {index} does not have a strictly larger x than the previous point ({x_prev} -> {x})")]
    NotIncreasing { index: usize, x_prev: f64, x: f64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a spline through the given points.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch {
                num_x: x.len(),
                num_y: y.len(),
            });
        }

        let n = x.len();
        if n < 2 {
            return Err(SplineError::TooFewPoints(n));
        }

        for i in 0..n {
            if !x[i].is_finite() || !y[i].is_finite() {
                return Err(SplineError::NonFinite(i));
            }
            if i > 0 && x[i] <= x[i - 1] {
                return Err(SplineError::NotIncreasing {
                    index: i,
                    x_prev: x[i - 1],
                    x: x[i],
                });
            }
        }

        let a = y.to_vec();
        let mut b = vec![0.0; n];
        let mut c = vec![0.0; n];
        let mut d = vec![0.0; n];

        let h: Vec<f64> = (0..n - 1).map(|i| x[i + 1] - x[i]).collect();

        // Tridiagonal system for the quadratic coefficients, solved with the Thomas algorithm.
        // c[0] and c[n - 1] stay at zero for natural end conditions.
        let mut alpha = vec![0.0; n];
        for i in 1..n - 1 {
            alpha[i] = 3.0 / h[i] * (a[i + 1] - a[i]) - 3.0 / h[i - 1] * (a[i] - a[i - 1]);
        }

        let mut mu = vec![0.0; n];
        let mut z = vec![0.0; n];

        for i in 1..n - 1 {
            let l = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l;
            z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l;
        }

        for j in (0..n - 1).rev() {
            c[j] = z[j] - mu[j] * c[j + 1];
            b[j] = (a[j + 1] - a[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
        }

        let last = n - 2;
        let end_slope = b[last] + 2.0 * c[last] * h[last] + 3.0 * d[last] * h[last].powi(2);

        Ok(Self {
            x: x.to_vec(),
            a,
            b,
            c,
            d,
            end_slope,
        })
    }

    /// Evaluate the spline at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();

        if x < self.x[0] {
            return self.a[0] + self.b[0] * (x - self.x[0]);
        }
        if x > self.x[n - 1] {
            return self.a[n - 1] + self.end_slope * (x - self.x[n - 1]);
        }

        let i = self.segment_index(x);
        let dx = x - self.x[i];

        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// First derivative of the spline at `x`.
    #[cfg(test)]
    fn eval_deriv(&self, x: f64) -> f64 {
        let n = self.x.len();

        if x < self.x[0] {
            return self.b[0];
        }
        if x > self.x[n - 1] {
            return self.end_slope;
        }

        let i = self.segment_index(x);
        let dx = x - self.x[i];

        self.b[i] + 2.0 * self.c[i] * dx + 3.0 * self.d[i] * dx.powi(2)
    }

    /// Index of the segment containing `x`, which must lie within the knot range.
    fn segment_index(&self, x: f64) -> usize {
        let i = self.x.partition_point(|k| *k <= x);
        i.saturating_sub(1).min(self.x.len() - 2)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
