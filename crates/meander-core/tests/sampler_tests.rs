use meander_core::random_provider;
use meander_core::{Dist, Model, SampleConfig, Value};

#[test]
fn posterior_mean_of_normal_location() {
    // 100 draws from N(3, 1); mu ~ Uniform(-10, 10) with the data observed
    // at precision 1. The posterior concentrates on the sample mean.
    random_provider::set_seed(100);
    let data = (0..100)
        .map(|_| random_provider::gaussian(3.0, 1.0))
        .collect::<Vec<f64>>();
    let sample_mean = data.iter().sum::<f64>() / data.len() as f64;

    let mut model = Model::new();
    let mu = model.stochastic(0.0, Dist::uniform(-10.0, 10.0)).unwrap();
    model.observed(data, Dist::normal(mu, 1.0)).unwrap();

    let ratio = model
        .sample(&SampleConfig::new(20_000, 5_000, 2_500, 5).with_seed(101))
        .unwrap();

    assert_eq!(model.history(mu).len(), 4_000);

    let posterior_mean = model.history_mean(mu).unwrap().as_real().unwrap();
    assert!(
        (posterior_mean - sample_mean).abs() < 0.1,
        "posterior mean {} strayed from sample mean {}",
        posterior_mean,
        sample_mean
    );
    assert!((posterior_mean - 3.0).abs() < 0.5);
    assert!(
        ratio > 0.2 && ratio < 0.6,
        "acceptance ratio {} outside tuned range",
        ratio
    );
}

#[test]
fn beta_bernoulli_conjugate_posterior() {
    // p ~ Beta(1, 1) with 7 successes in 10 trials observed; the posterior
    // is Beta(8, 4) with mean 8/12.
    let mut model = Model::new();
    let p = model.stochastic(0.5, Dist::beta(1.0, 1.0)).unwrap();
    model
        .observed(
            vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            Dist::bernoulli(p),
        )
        .unwrap();

    let ratio = model
        .sample(&SampleConfig::new(20_000, 5_000, 2_500, 5).with_seed(7))
        .unwrap();

    let posterior_mean = model.history_mean(p).unwrap().as_real().unwrap();
    assert!(
        (posterior_mean - 8.0 / 12.0).abs() < 0.03,
        "posterior mean {} should be near 2/3",
        posterior_mean
    );
    assert!(ratio > 0.0 && ratio <= 1.0);

    // Every recorded sample stays inside the support.
    for sample in model.history(p) {
        let v = sample.as_real().unwrap();
        assert!(v > 0.0 && v < 1.0);
    }
}

#[test]
fn chain_escapes_zero_support_start() {
    // x ~ Gamma(2, 1) forced to a negative starting point: the joint
    // density is -inf, so the first in-support proposal always wins.
    let mut model = Model::new();
    let x = model.stochastic(1.0, Dist::gamma(2.0, 1.0)).unwrap();
    model.set_value(x, -1.0).unwrap();

    assert_eq!(model.logp(), f64::NEG_INFINITY);

    model
        .sample(&SampleConfig::new(200, 0, 0, 1).with_seed(9))
        .unwrap();

    assert!(model.value(x).as_real().unwrap() > 0.0);
    assert!(model.logp().is_finite());
    assert_eq!(model.history(x).len(), 200);
    assert!(model.history(x).last().unwrap().as_real().unwrap() > 0.0);
}

#[test]
fn thinning_and_burn_in_accounting() {
    let mut model = Model::new();
    let a = model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();
    let b = model.stochastic(0.5, Dist::beta(2.0, 2.0)).unwrap();
    let doubled = model
        .deterministic(
            0.0,
            meander_core::DetRule::closure(move |nodes, out| {
                *out = Value::Real(nodes.real(a) * 2.0);
                Ok(())
            }),
        )
        .unwrap();
    let obs = model.observed(1.0, Dist::normal(a, 1.0)).unwrap();

    model
        .sample(&SampleConfig::new(500, 500, 100, 10).with_seed(21))
        .unwrap();

    // floor(iterations / thin) entries for every unobserved node,
    // deterministic nodes included; none for observed nodes.
    assert_eq!(model.history(a).len(), 50);
    assert_eq!(model.history(b).len(), 50);
    assert_eq!(model.history(doubled).len(), 50);
    assert!(model.history(obs).is_empty());
}

#[test]
fn observed_values_never_move() {
    let data = vec![0.4, 1.6, -0.7, 2.2];

    let mut model = Model::new();
    let mu = model.stochastic(0.0, Dist::uniform(-10.0, 10.0)).unwrap();
    let obs = model.observed(data.clone(), Dist::normal(mu, 1.0)).unwrap();

    model
        .sample(&SampleConfig::new(1_000, 200, 100, 1).with_seed(33))
        .unwrap();

    assert_eq!(model.value(obs), &Value::from(data));
}

#[test]
fn scales_freeze_without_adapt_window() {
    let mut model = Model::new();
    let mu = model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();
    model.observed(vec![0.1, -0.2, 0.3], Dist::normal(mu, 1.0)).unwrap();

    model
        .sample(&SampleConfig::new(2_000, 500, 0, 1).with_seed(13))
        .unwrap();

    // No adaptation ran, so the scale is still its initial value.
    assert_eq!(model.proposal_scale(mu), Some(1.0));
}

#[test]
fn adapted_scales_stay_bounded() {
    // A very tight posterior drives the scale down hard; it must stay
    // positive and finite.
    random_provider::set_seed(44);
    let data = (0..50)
        .map(|_| random_provider::gaussian(0.0, 0.01))
        .collect::<Vec<f64>>();

    let mut model = Model::new();
    let mu = model.stochastic(0.0, Dist::uniform(-1.0, 1.0)).unwrap();
    model.observed(data, Dist::normal(mu, 10_000.0)).unwrap();

    model
        .sample(&SampleConfig::new(2_000, 2_000, 2_000, 1).with_seed(45))
        .unwrap();

    let scale = model.proposal_scale(mu).unwrap();
    assert!(scale >= 1e-12 && scale <= 1e12);
    assert!(scale < 1.0, "tight posterior should have shrunk the scale");
}

#[test]
fn binomial_stochastic_nodes_hold_still() {
    // Binomial-distributed nodes are never proposed, but they keep
    // contributing density and history.
    let mut model = Model::new();
    let k = model.stochastic(4.0, Dist::binomial(10.0, 0.4)).unwrap();
    let mu = model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();

    let ratio = model
        .sample(&SampleConfig::new(500, 100, 0, 1).with_seed(55))
        .unwrap();

    assert_eq!(model.value(k), &Value::Real(4.0));
    assert_eq!(model.history(k).len(), 500);
    assert!(ratio > 0.0);
    let _ = mu;
}
