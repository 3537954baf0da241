use crate::error::{Result, TracerError};
use crate::real::Real;

/// Piecewise-linear lookup of `beta` at `x` over ascending abscissae `alpha`.
///
/// An exact abscissa returns its sample unchanged. Points outside
/// `[alpha[0], alpha[n-1]]` are extrapolated along the nearest end segment,
/// so callers get a value rather than an error for out-of-range queries.
pub fn interpolate_1d<R: Real>(alpha: &[R], beta: &[R], x: R) -> Result<R> {
    Ok(LinearTable::new(alpha, beta)?.eval(x))
}

/// A checked sample table for repeated [`interpolate_1d`] lookups.
#[derive(Clone, Copy, Debug)]
pub struct LinearTable<'a, R> {
    alpha: &'a [R],
    beta: &'a [R],
}

impl<'a, R: Real> LinearTable<'a, R> {
    /// Needs at least two samples with strictly ascending abscissae.
    pub fn new(alpha: &'a [R], beta: &'a [R]) -> Result<Self> {
        if alpha.len() != beta.len() {
            return Err(TracerError::InterpolationTable(format!(
                "{} abscissae but {} values",
                alpha.len(),
                beta.len()
            )));
        }
        if alpha.len() < 2 {
            return Err(TracerError::InterpolationTable(
                "need at least two samples".to_string(),
            ));
        }
        if alpha.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(TracerError::InterpolationTable(
                "abscissae must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { alpha, beta })
    }

    pub fn eval(&self, x: R) -> R {
        let (alpha, beta) = (self.alpha, self.beta);
        if let Some(i) = alpha.iter().position(|&a| a == x) {
            return beta[i];
        }

        let n = alpha.len();
        let seg = if x < alpha[0] {
            0
        } else if x > alpha[n - 1] {
            n - 2
        } else {
            alpha
                .windows(2)
                .position(|w| x >= w[0] && x <= w[1])
                .unwrap_or(n - 2)
        };
        lerp(alpha[seg], alpha[seg + 1], beta[seg], beta[seg + 1], x)
    }
}

#[inline]
fn lerp<R: Real>(x0: R, x1: R, y0: R, y1: R, x: R) -> R {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_table() {
        assert!(interpolate_1d(&[1.0_f64], &[2.0], 1.0).is_err());
        assert!(interpolate_1d(&[1.0_f64, 2.0], &[2.0], 1.0).is_err());
    }

    #[test]
    fn test_table_reuses_checked_samples() {
        let xs = [0.0_f32, 10.0];
        let zs = [-50.0_f32, -20.0];
        let table = LinearTable::new(&xs, &zs).unwrap();
        assert_eq!(table.eval(0.0), -50.0);
        assert!((table.eval(5.0) + 35.0).abs() < 1e-5);
        assert!((table.eval(20.0) - 10.0).abs() < 1e-4);
    }
}
