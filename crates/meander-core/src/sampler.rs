use crate::domain::random_provider;
use crate::graph::NodeId;
use crate::model::Model;
use meander_error::{Result, ensure};
use tracing::{debug, info};

/// Per-node acceptance tallies are inspected every this many iterations
/// inside the adapt window.
const ADAPT_WINDOW: usize = 100;
/// Local acceptance rate below which the proposal scale shrinks.
const LOW_RATE: f64 = 0.2;
/// Local acceptance rate above which the proposal scale grows.
const HIGH_RATE: f64 = 0.5;
const SHRINK: f64 = 0.8;
const GROW: f64 = 1.2;
const MIN_SCALE: f64 = 1e-12;
const MAX_SCALE: f64 = 1e12;

/// Chain schedule: `burn_in + iterations` total steps, proposal scales
/// tuned during the first `adapt` steps, every `thin`-th post-burn-in
/// state recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleConfig {
    /// Steps taken after burn-in; `floor(iterations / thin)` states are
    /// recorded per unobserved node.
    pub iterations: usize,
    pub burn_in: usize,
    /// Adaptation prefix of burn-in; scales are frozen afterwards.
    pub adapt: usize,
    pub thin: usize,
    /// Reseeds the chain's random source for reproducible runs.
    pub seed: Option<u64>,
}

impl SampleConfig {
    pub fn new(iterations: usize, burn_in: usize, adapt: usize, thin: usize) -> Self {
        SampleConfig {
            iterations,
            burn_in,
            adapt,
            thin,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn total(&self) -> usize {
        self.burn_in + self.iterations
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.thin >= 1, InvalidConfig: "thin must be at least 1");
        ensure!(
            self.adapt <= self.burn_in,
            InvalidConfig: "adapt window ({}) cannot exceed burn-in ({})", self.adapt, self.burn_in
        );
        Ok(())
    }
}

/// Where the chain is in its schedule. Transitions are purely
/// iteration-count driven: scales mutate only while `Adapting`, history
/// grows only while `Sampling`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Fresh,
    Adapting,
    BurningIn,
    Sampling,
    Done,
}

/// Component-wise Metropolis-Hastings driver over a [`Model`].
///
/// Each iteration visits every proposable stochastic node in declaration
/// order: snapshot, jump, recompute deterministics, evaluate the joint
/// log-density, then accept or restore. The joint density of the current
/// state is carried between proposals so each proposal costs one model
/// refresh and one density sweep.
pub struct Sampler<'a> {
    model: &'a mut Model,
    config: SampleConfig,
    iteration: usize,
    started: bool,
    logp: f64,
    accepted: usize,
    proposed: usize,
}

impl<'a> Sampler<'a> {
    pub fn new(model: &'a mut Model, config: SampleConfig) -> Self {
        Sampler {
            model,
            config,
            iteration: 0,
            started: false,
            logp: f64::NEG_INFINITY,
            accepted: 0,
            proposed: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if !self.started {
            Phase::Fresh
        } else if self.iteration >= self.config.total() {
            Phase::Done
        } else if self.iteration < self.config.adapt {
            Phase::Adapting
        } else if self.iteration < self.config.burn_in {
            Phase::BurningIn
        } else {
            Phase::Sampling
        }
    }

    /// Accepted proposals over total proposals across the whole run.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }

    /// Runs the configured chain to completion and returns the acceptance
    /// ratio. An update-closure failure aborts the run; history recorded
    /// up to that point stays on the model.
    pub fn run(&mut self) -> Result<f64> {
        self.config.validate()?;
        if let Some(seed) = self.config.seed {
            random_provider::set_seed(seed);
        }

        info!(
            iterations = self.config.iterations,
            burn_in = self.config.burn_in,
            adapt = self.config.adapt,
            thin = self.config.thin,
            nodes = self.model.len(),
            "starting chain"
        );

        self.model.refresh()?;
        self.logp = self.model.logp();
        self.started = true;

        let order = self.model.proposable_ids();
        let total = self.config.total();
        let mut phase = self.phase();

        for i in 0..total {
            self.iteration = i;

            let now = self.phase();
            if now != phase {
                debug!(iteration = i, ?now, "phase transition");
                phase = now;
            }

            self.step(&order)?;

            if i < self.config.adapt && (i + 1) % ADAPT_WINDOW == 0 {
                self.adapt_scales();
            }
            if i >= self.config.burn_in && (i - self.config.burn_in + 1) % self.config.thin == 0 {
                self.record();
            }
        }

        self.iteration = total;
        info!(acceptance = self.acceptance_ratio(), "chain finished");
        Ok(self.acceptance_ratio())
    }

    /// One iteration: a proposal for every proposable node in order.
    fn step(&mut self, order: &[NodeId]) -> Result<()> {
        for &id in order {
            let node = self.model.nodes_mut().get_mut(id);
            node.snapshot();
            node.jump();
            self.model.refresh()?;

            let proposed_logp = self.model.logp();
            // A NaN difference (-inf to -inf) compares false and rejects.
            let accept = random_provider::uniform().ln() < proposed_logp - self.logp;

            if accept {
                self.logp = proposed_logp;
            } else {
                self.model.nodes_mut().get_mut(id).restore();
                // Deterministic nodes were recomputed from the proposed
                // value; bring the whole graph back to the accepted state.
                self.model.refresh()?;
            }

            self.model.nodes_mut().get_mut(id).tally_window(accept);
            self.proposed += 1;
            if accept {
                self.accepted += 1;
            }
        }
        Ok(())
    }

    fn adapt_scales(&mut self) {
        for node in self.model.nodes_mut().iter_mut() {
            let (accepts, steps) = node.drain_window();
            if steps == 0 {
                continue;
            }

            let rate = accepts as f64 / steps as f64;
            if let Some(scale) = node.scale_mut() {
                let before = *scale;
                if rate < LOW_RATE {
                    *scale = (before * SHRINK).clamp(MIN_SCALE, MAX_SCALE);
                } else if rate > HIGH_RATE {
                    *scale = (before * GROW).clamp(MIN_SCALE, MAX_SCALE);
                }

                if *scale != before {
                    debug!(rate, before, after = *scale, "tuned proposal scale");
                }
            }
        }
    }

    fn record(&mut self) {
        for node in self.model.nodes_mut().iter_mut() {
            if !node.is_observed() {
                node.record();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Dist;

    #[test]
    fn test_config_validation() {
        let mut model = Model::new();
        model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();

        let err = model
            .sample(&SampleConfig::new(10, 5, 2, 0))
            .unwrap_err();
        assert_eq!(err.code(), meander_error::ErrorCode::InvalidConfig);

        let err = model
            .sample(&SampleConfig::new(10, 5, 6, 1))
            .unwrap_err();
        assert_eq!(err.code(), meander_error::ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_phase_before_and_after_run() {
        let mut model = Model::new();
        model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();

        let config = SampleConfig::new(20, 10, 5, 1).with_seed(3);
        let mut sampler = Sampler::new(&mut model, config);
        assert_eq!(sampler.phase(), Phase::Fresh);

        sampler.run().unwrap();
        assert_eq!(sampler.phase(), Phase::Done);
    }

    #[test]
    fn test_acceptance_ratio_bounds() {
        let mut model = Model::new();
        model.stochastic(0.0, Dist::normal(0.0, 1.0)).unwrap();

        let ratio = model
            .sample(&SampleConfig::new(200, 100, 0, 1).with_seed(5))
            .unwrap();
        assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn test_empty_model_samples_trivially() {
        let mut model = Model::new();
        let ratio = model
            .sample(&SampleConfig::new(10, 0, 0, 1).with_seed(1))
            .unwrap();
        assert_eq!(ratio, 0.0);
    }
}
