use meander_core::{DetRule, Dist, Model, SampleConfig, Value};
use meander_error::ErrorCode;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn rejection_restores_the_whole_graph() {
    // A near-degenerate likelihood rejects essentially every proposal, so
    // the chain must end exactly where it started, deterministic node
    // included.
    let mut model = Model::new();
    let x = model
        .stochastic(vec![0.0, 0.0], Dist::normal(0.0, 1e12))
        .unwrap();
    let total = model
        .deterministic(
            0.0,
            DetRule::closure(move |nodes, out| {
                *out = Value::Real(nodes.real_vec(x).sum());
                Ok(())
            }),
        )
        .unwrap();

    let ratio = model
        .sample(&SampleConfig::new(50, 0, 0, 1).with_seed(61))
        .unwrap();

    assert_eq!(ratio, 0.0);
    assert_eq!(model.value(x), &Value::from(vec![0.0, 0.0]));
    assert_eq!(model.value(total), &Value::Real(0.0));
}

#[test]
fn closure_failure_aborts_but_keeps_history() {
    init_tracing();

    let mut model = Model::new();
    let mu = model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();

    let mut calls = 0_usize;
    model.set_update_closure(move |_| {
        calls += 1;
        if calls > 500 {
            Err(meander_error::meander_err!(Update: "deliberate failure"))
        } else {
            Ok(())
        }
    });

    let err = model
        .sample(&SampleConfig::new(1_000, 100, 0, 1).with_seed(3))
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Update);
    assert!(
        !model.history(mu).is_empty(),
        "history recorded before the failure must survive"
    );
}

#[test]
fn hierarchical_precision_is_read_live() {
    // x ~ Normal(0, tau) with tau itself sampled: the joint density read
    // through the table must track tau's current value.
    let mut model = Model::new();
    let tau = model.stochastic(2.0, Dist::gamma(2.0, 2.0)).unwrap();
    let x = model.stochastic(0.3, Dist::normal(0.0, tau)).unwrap();

    let before = model.logp();
    model.set_value(tau, 8.0).unwrap();
    let after = model.logp();

    assert!(before.is_finite() && after.is_finite());
    assert_ne!(before, after);
    let _ = x;
}

#[test]
fn histories_start_empty_and_grow_only_past_burn_in() {
    let mut model = Model::new();
    let mu = model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();

    assert!(model.history(mu).is_empty());

    model
        .sample(&SampleConfig::new(0, 300, 100, 1).with_seed(8))
        .unwrap();
    assert!(
        model.history(mu).is_empty(),
        "burn-in alone must not record history"
    );

    model
        .sample(&SampleConfig::new(120, 0, 0, 1).with_seed(9))
        .unwrap();
    assert_eq!(model.history(mu).len(), 120);
}

#[test]
fn observed_only_model_has_constant_density() {
    let mut model = Model::new();
    model
        .observed(vec![0.5, 1.5], Dist::normal(1.0, 1.0))
        .unwrap();

    let before = model.logp();
    model
        .sample(&SampleConfig::new(25, 5, 0, 1).with_seed(12))
        .unwrap();

    assert_eq!(model.logp(), before);
}
