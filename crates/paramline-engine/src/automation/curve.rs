//! Interpolators for each event shape. All are pure and clamp to their
//! boundary values outside `[t1, t2]`.

/// Straight line from `(t1, v1)` to `(t2, v2)`.
#[inline]
pub fn linear(t1: f64, v1: f64, t2: f64, v2: f64, t: f64) -> f64 {
    if t >= t2 || t2 <= t1 {
        return v2;
    }
    if t <= t1 {
        return v1;
    }
    v1 + (v2 - v1) * (t - t1) / (t2 - t1)
}

/// Both endpoints are non-zero and share a sign, so an exponential segment
/// between them is defined.
#[inline]
pub fn exponential_compatible(v1: f64, v2: f64) -> bool {
    v1 != 0.0 && v2 != 0.0 && v1.is_sign_positive() == v2.is_sign_positive()
}

/// Exponential segment `v1 * (v2 / v1)^((t - t1) / (t2 - t1))`.
///
/// Incompatible endpoints hold `v1` until `t2` and then jump to `v2`.
#[inline]
pub fn exponential(t1: f64, v1: f64, t2: f64, v2: f64, t: f64) -> f64 {
    if t >= t2 || t2 <= t1 {
        return v2;
    }
    if t <= t1 || !exponential_compatible(v1, v2) {
        return v1;
    }
    v1 * (v2 / v1).powf((t - t1) / (t2 - t1))
}

/// Exponential approach from `v0` at `t1` toward `target`, unbounded in time.
#[inline]
pub fn target(t1: f64, v0: f64, target: f64, time_constant: f64, t: f64) -> f64 {
    if t <= t1 {
        return v0;
    }
    target + (v0 - target) * (-(t - t1) / time_constant).exp()
}

/// Samples spread evenly over `[t1, t1 + duration]`, joined linearly.
pub fn curve(values: &[f64], t1: f64, duration: f64, t: f64) -> f64 {
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        return 0.0;
    };
    if t <= t1 || values.len() == 1 {
        return *first;
    }
    if t >= t1 + duration || duration <= 0.0 {
        return *last;
    }
    let position = (t - t1) / duration * (values.len() - 1) as f64;
    let index = (position.floor() as usize).min(values.len() - 2);
    let frac = position - index as f64;
    values[index] + (values[index + 1] - values[index]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn linear_midpoint_and_clamps() {
        assert!(approx(linear(1.0, 10.0, 3.0, 50.0, 2.0), 30.0));
        assert_eq!(linear(1.0, 10.0, 3.0, 50.0, 0.0), 10.0);
        assert_eq!(linear(1.0, 10.0, 3.0, 50.0, 3.0), 50.0);
        assert_eq!(linear(1.0, 10.0, 3.0, 50.0, 9.0), 50.0);
        assert_eq!(linear(2.0, 1.0, 2.0, 7.0, 2.0), 7.0);
    }

    #[test]
    fn exponential_follows_geometric_curve() {
        assert!(approx(exponential(0.0, 5.0, 4.0, 20.0, 2.0), 10.0));
        assert!(approx(exponential(0.0, -1.0, 2.0, -4.0, 1.0), -2.0));
        assert_eq!(exponential(0.0, 5.0, 4.0, 20.0, 4.0), 20.0);
    }

    #[test]
    fn exponential_with_incompatible_endpoints_holds_then_jumps() {
        assert_eq!(exponential(0.0, 0.0, 1.0, 4.0, 0.5), 0.0);
        assert_eq!(exponential(0.0, 2.0, 1.0, -4.0, 0.5), 2.0);
        assert_eq!(exponential(0.0, 2.0, 1.0, -4.0, 1.0), -4.0);
        assert!(!exponential_compatible(0.0, 1.0));
        assert!(!exponential_compatible(-1.0, 1.0));
        assert!(exponential_compatible(-1.0, -0.5));
    }

    #[test]
    fn target_approaches_asymptote() {
        let expected = 100.0 + (0.0 - 100.0) * (-1.0f64).exp();
        assert!(approx(target(0.0, 0.0, 100.0, 2.0, 2.0), expected));
        assert_eq!(target(1.0, 3.0, 100.0, 2.0, 0.5), 3.0);
        assert!(target(0.0, 0.0, 100.0, 0.1, 10.0) > 99.999);
    }

    #[test]
    fn curve_interpolates_between_samples() {
        let values = [0.0, 10.0, 5.0];
        assert_eq!(curve(&values, 1.0, 2.0, 0.0), 0.0);
        assert!(approx(curve(&values, 1.0, 2.0, 1.5), 5.0));
        assert!(approx(curve(&values, 1.0, 2.0, 2.0), 10.0));
        assert!(approx(curve(&values, 1.0, 2.0, 2.5), 7.5));
        assert_eq!(curve(&values, 1.0, 2.0, 3.0), 5.0);
        assert_eq!(curve(&values, 1.0, 2.0, 30.0), 5.0);
    }
}
