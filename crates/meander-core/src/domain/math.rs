use statrs::function::gamma::ln_gamma;
use std::sync::LazyLock;

/// Factorial logs are table-driven up to this value, `ln_gamma` beyond it.
const FACTLN_TABLE_SIZE: usize = 101;

static FACTLN_TABLE: LazyLock<Vec<f64>> = LazyLock::new(|| {
    let mut table = Vec::with_capacity(FACTLN_TABLE_SIZE);
    let mut acc = 0.0_f64;
    table.push(0.0); // 0! = 1
    for i in 1..FACTLN_TABLE_SIZE {
        acc += (i as f64).ln();
        table.push(acc);
    }
    table
});

/// Natural log clamped to the distribution-support convention: any
/// non-positive argument is `-inf` rather than NaN.
#[inline(always)]
pub fn ln_guard(x: f64) -> f64 {
    if x <= 0.0 {
        f64::NEG_INFINITY
    } else {
        x.ln()
    }
}

/// `log(n!)` for integer-valued arguments. Negative arguments fall outside
/// every support that uses this and map to `-inf`.
pub fn factln(n: i64) -> f64 {
    if n < 0 {
        return f64::NEG_INFINITY;
    }
    if n as usize >= FACTLN_TABLE_SIZE {
        return ln_gamma(n as f64 + 1.0);
    }
    FACTLN_TABLE[n as usize]
}

/// `log C(n, k)` via factorial logs.
#[inline]
pub fn ln_choose(n: i64, k: i64) -> f64 {
    factln(n) - factln(k) - factln(n - k)
}

#[inline(always)]
pub fn logistic(t: f64) -> f64 {
    1.0 / (1.0 + (-t).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ln_guard() {
        assert_eq!(ln_guard(0.0), f64::NEG_INFINITY);
        assert_eq!(ln_guard(-1.5), f64::NEG_INFINITY);
        assert_abs_diff_eq!(ln_guard(std::f64::consts::E), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_factln_small() {
        assert_eq!(factln(0), 0.0);
        assert_eq!(factln(1), 0.0);
        assert_abs_diff_eq!(factln(5), 120.0_f64.ln(), epsilon = 1e-10);
        assert_eq!(factln(-1), f64::NEG_INFINITY);
    }

    #[test]
    fn test_factln_matches_lgamma_past_table() {
        for n in [100_i64, 101, 150, 500] {
            assert_abs_diff_eq!(factln(n), ln_gamma(n as f64 + 1.0), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_ln_choose() {
        // C(10, 3) = 120
        assert_abs_diff_eq!(ln_choose(10, 3), 120.0_f64.ln(), epsilon = 1e-10);
        assert_eq!(ln_choose(3, 5), f64::NEG_INFINITY);
    }

    #[test]
    fn test_logistic() {
        assert_abs_diff_eq!(logistic(0.0), 0.5, epsilon = 1e-12);
        assert!(logistic(20.0) > 0.999);
        assert!(logistic(-20.0) < 0.001);
    }
}
