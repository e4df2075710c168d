/// Scaled local error of one component.
///
/// `x` is the accepted candidate, `x_prev` the value at the start of the step
/// and `x_tilde` the embedded lower order estimate. The difference is scaled by
/// `abs_tol + rel_tol * max(|x|, |x_prev|)`, so a result <= 1.0 means the
/// component is within tolerance.
pub fn compute_error(x: f64, x_prev: f64, x_tilde: f64, rel_tol: f64, abs_tol: f64) -> f64 {
    let scale = abs_tol + rel_tol * x.abs().max(x_prev.abs());
    (x - x_tilde).abs() / scale
}

/// Root mean square of the scaled component errors.
pub fn rms_error(
    x: &[f64],
    x_prev: &[f64],
    x_tilde: &[f64],
    rel_tol: f64,
    abs_tol: f64,
) -> f64 {
    let n = x.len();
    if n == 0 {
        return 0.0;
    }
    let sum_squared_errors: f64 = x
        .iter()
        .zip(x_prev)
        .zip(x_tilde)
        .map(|((x, x_prev), x_tilde)| compute_error(*x, *x_prev, *x_tilde, rel_tol, abs_tol).powi(2))
        .sum();
    (sum_squared_errors / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-14;

    #[test]
    fn test_error_within_tolerance() {
        // difference equals the scale exactly
        let e = compute_error(1.0, 1.0, 1.0 + 2e-6, 1e-6, 1e-6);
        assert_abs_diff_eq!(e, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_error_uses_largest_magnitude() {
        let e = compute_error(0.5, -2.0, 0.5, 0.1, 0.0);
        assert_abs_diff_eq!(e, 0.0, epsilon = TOL);
        let e = compute_error(0.5, -2.0, 0.6, 0.1, 0.0);
        assert_abs_diff_eq!(e, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rms_error() {
        let x = [1.0, 1.0];
        let prev = [1.0, 1.0];
        let tilde = [1.0 + 3.0, 1.0 - 4.0];
        let e = rms_error(&x, &prev, &tilde, 0.0, 1.0);
        assert_abs_diff_eq!(e, (12.5f64).sqrt(), epsilon = TOL);
        assert_eq!(rms_error(&[], &[], &[], 1.0, 1.0), 0.0);
    }
}
