//! Normal-distribution helpers for percentile-based loss models

/// Inverse complementary normal: returns `z` with `Q(z) = q`.
///
/// Rational approximation (Abramowitz & Stegun 26.2.23), |error| < 4.5e-4.
/// `q` is clamped to (1e-6, 1 - 1e-6).
pub fn qerfi(q: f64) -> f64 {
    const C0: f64 = 2.515_516_698;
    const C1: f64 = 0.802_853;
    const C2: f64 = 0.010_328;
    const D1: f64 = 1.432_788;
    const D2: f64 = 0.189_269;
    const D3: f64 = 0.001_308;

    let x = 0.5 - q;
    let t = (0.5 - x.abs()).max(1e-6);
    let t = (-2.0 * t.ln()).sqrt();
    let v = t - ((C2 * t + C1) * t + C0) / (((D3 * t + D2) * t + D1) * t + 1.0);
    if x < 0.0 {
        -v
    } else {
        v
    }
}

/// Standard normal quantile for a percentage in (0, 100)
pub fn normal_quantile_percent(percent: f64) -> f64 {
    -qerfi(percent / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_is_zero() {
        assert!(qerfi(0.5).abs() < 1e-3);
        assert!(normal_quantile_percent(50.0).abs() < 1e-3);
    }

    #[test]
    fn test_known_quantiles() {
        assert!((qerfi(0.1) - 1.2816).abs() < 1e-3);
        assert!((normal_quantile_percent(90.0) - 1.2816).abs() < 1e-3);
        assert!((normal_quantile_percent(20.0) + 0.8416).abs() < 1e-3);
    }

    #[test]
    fn test_monotonic() {
        let mut prev = f64::NEG_INFINITY;
        for p in 1..100 {
            let z = normal_quantile_percent(p as f64);
            assert!(z > prev);
            prev = z;
        }
    }
}
