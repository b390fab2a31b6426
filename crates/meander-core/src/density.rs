//! Log-density kernels for the supported distribution family.
//!
//! Each function computes the log-likelihood of a carrier under its
//! distribution, broadcasting scalar parameters over array-valued carriers
//! and summing elementwise contributions. Arguments outside the support
//! (or invalid parameter domains) yield `-inf`, never an error: the
//! sampler treats such states as certain rejections. A NaN total also
//! collapses to `-inf`.
//!
//! Shape agreement between array arguments is the caller's responsibility;
//! the model validates it at construction, so a mismatch here is a
//! programming error and aborts via slice indexing.

use crate::domain::math::{ln_choose, ln_guard};
use crate::value::Value;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

#[inline(always)]
fn guard(logp: f64) -> f64 {
    if logp.is_nan() { f64::NEG_INFINITY } else { logp }
}

/// Normal distribution parameterized by mean and precision `tau = 1/sigma^2`.
pub fn normal_logp(x: &Value, mu: &Value, tau: &Value) -> f64 {
    let x = x.view();
    let mu = mu.view();
    let tau = tau.view();

    let mut acc = 0.0;
    for i in 0..x.len() {
        let t = tau.at(i);
        if t <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let d = x.at(i) - mu.at(i);
        acc += 0.5 * (0.5 * t / PI).ln() - 0.5 * t * d * d;
    }
    guard(acc)
}

pub fn uniform_logp(x: &Value, lower: &Value, upper: &Value) -> f64 {
    let x = x.view();
    let lower = lower.view();
    let upper = upper.view();

    let mut acc = 0.0;
    for i in 0..x.len() {
        let (lo, hi) = (lower.at(i), upper.at(i));
        let v = x.at(i);
        if v < lo || v > hi {
            return f64::NEG_INFINITY;
        }
        acc -= ln_guard(hi - lo);
    }
    guard(acc)
}

pub fn gamma_logp(x: &Value, alpha: &Value, beta: &Value) -> f64 {
    let x = x.view();
    let alpha = alpha.view();
    let beta = beta.view();

    let mut acc = 0.0;
    for i in 0..x.len() {
        let (a, b) = (alpha.at(i), beta.at(i));
        let v = x.at(i);
        if v < 0.0 || a <= 0.0 || b <= 0.0 {
            return f64::NEG_INFINITY;
        }
        acc += (a - 1.0) * ln_guard(v) - b * v - ln_gamma(a) + a * ln_guard(b);
    }
    guard(acc)
}

pub fn beta_logp(x: &Value, alpha: &Value, beta: &Value) -> f64 {
    let x = x.view();
    let alpha = alpha.view();
    let beta = beta.view();

    let mut acc = 0.0;
    for i in 0..x.len() {
        let (a, b) = (alpha.at(i), beta.at(i));
        let v = x.at(i);
        if v < 0.0 || v > 1.0 || a <= 0.0 || b <= 0.0 {
            return f64::NEG_INFINITY;
        }
        acc += (a - 1.0) * ln_guard(v)
            + (b - 1.0) * ln_guard(1.0 - v)
            + ln_gamma(a + b)
            - ln_gamma(a)
            - ln_gamma(b);
    }
    guard(acc)
}

/// Bernoulli over 0/1 outcomes stored in a real or integer carrier.
pub fn bernoulli_logp(x: &Value, p: &Value) -> f64 {
    let x = x.view();
    let p = p.view();

    let mut acc = 0.0;
    for i in 0..x.len() {
        let pi = p.at(i);
        let v = x.at(i);
        if pi <= 0.0 || pi >= 1.0 || (v != 0.0 && v != 1.0) {
            return f64::NEG_INFINITY;
        }
        acc += v * pi.ln() + (1.0 - v) * (1.0 - pi).ln();
    }
    guard(acc)
}

/// Binomial over integer-valued counts with trial counts `n`.
pub fn binomial_logp(x: &Value, n: &Value, p: &Value) -> f64 {
    let x = x.view();
    let n = n.view();
    let p = p.view();

    let mut acc = 0.0;
    for i in 0..x.len() {
        let pi = p.at(i);
        let (v, ni) = (x.at(i), n.at(i));
        if pi <= 0.0 || pi >= 1.0 || v < 0.0 || v > ni {
            return f64::NEG_INFINITY;
        }
        let k = v.round() as i64;
        let trials = ni.round() as i64;
        acc += v * pi.ln() + (ni - v) * (1.0 - pi).ln() + ln_choose(trials, k);
    }
    guard(acc)
}
