use crate::graph::rule::{DetRule, ModelFn};
use crate::graph::{Dist, Node, NodeId, NodeTable, Param};
use crate::sampler::{SampleConfig, Sampler};
use crate::value::Value;
use meander_error::{Result, ensure};

/// A declared Bayesian model: an ordered table of observed, stochastic,
/// and deterministic nodes plus an optional model-level update closure.
///
/// Declaration order matters twice over: deterministic nodes recompute in
/// the order they were declared, and stochastic nodes are proposed in the
/// order they were declared. A distribution parameter may only reference
/// a node declared before the node that uses it, which makes the graph
/// acyclic by construction.
///
/// # Example
/// ```rust
/// use meander_core::{Dist, Model, SampleConfig};
///
/// let mut model = Model::new();
/// let mu = model.stochastic(0.0, Dist::uniform(-10.0, 10.0)).unwrap();
/// model
///     .observed(vec![2.9, 3.1, 2.8, 3.2], Dist::normal(mu, 1.0))
///     .unwrap();
///
/// let ratio = model
///     .sample(&SampleConfig::new(2_000, 500, 250, 1).with_seed(17))
///     .unwrap();
/// assert!(ratio > 0.0 && ratio <= 1.0);
/// ```
#[derive(Default)]
pub struct Model {
    nodes: NodeTable,
    update: Option<ModelFn>,
}

impl Model {
    pub fn new() -> Self {
        Model {
            nodes: NodeTable::new(),
            update: None,
        }
    }

    /// Declares an observed (constant) node. Observed values never change
    /// during a run and produce no history.
    pub fn observed(&mut self, value: impl Into<Value>, dist: Dist) -> Result<NodeId> {
        let value = value.into();
        self.validate_dist(&value, &dist)?;
        Ok(self.nodes.push(Node::observed(value, dist)))
    }

    /// Declares an unobserved stochastic node with proposal scale 1.0.
    /// Stochastic carriers are real-valued; discrete Bernoulli/Binomial
    /// outcomes live in real carriers holding 0/1 (resp. count) values.
    pub fn stochastic(&mut self, value: impl Into<Value>, dist: Dist) -> Result<NodeId> {
        let value = value.into();
        ensure!(
            value.is_real(),
            Graph: "stochastic node carriers are real-valued, got {:?}", value.kind()
        );
        self.validate_dist(&value, &dist)?;
        Ok(self.nodes.push(Node::stochastic(value, dist)))
    }

    /// Declares a deterministic node recomputed by `rule` on every model
    /// refresh. Integer design matrices supplied as constants are widened
    /// to real storage here, once.
    pub fn deterministic(&mut self, value: impl Into<Value>, rule: DetRule) -> Result<NodeId> {
        let value = value.into();
        let rule = self.validate_rule(&value, widen_design(rule))?;
        Ok(self.nodes.push(Node::deterministic(value, rule)))
    }

    /// Installs the model-level update closure, run after the per-node
    /// rules on every refresh. The closure may read and write any carrier
    /// through the table; a returned error aborts the run.
    pub fn set_update_closure(
        &mut self,
        f: impl FnMut(&mut NodeTable) -> Result<()> + 'static,
    ) {
        self.update = Some(Box::new(f));
    }

    /// Recomputes every deterministic node in declaration order, then runs
    /// the model-level update closure if one is installed. Pure given the
    /// current stochastic values: calling it twice in a row yields
    /// identical deterministic state.
    pub fn refresh(&mut self) -> Result<()> {
        for idx in 0..self.nodes.len() {
            let id = NodeId(idx);
            if !self.nodes.get(id).is_deterministic() {
                continue;
            }

            let mut value = std::mem::take(self.nodes.value_mut(id));
            let mut rule = self.nodes.take_rule(id);
            let outcome = rule.apply(&self.nodes, &mut value);
            self.nodes.put_rule(id, rule);
            *self.nodes.value_mut(id) = value;
            outcome?;
        }

        if let Some(update) = &mut self.update {
            update(&mut self.nodes)?;
        }
        Ok(())
    }

    /// Joint log-density: the sum over all observed and stochastic nodes
    /// of their log-likelihood at current values. A `-inf` summand
    /// short-circuits the total.
    pub fn logp(&self) -> f64 {
        let mut total = 0.0;
        for node in self.nodes.iter() {
            if node.is_deterministic() {
                continue;
            }
            let lp = node.logp(&self.nodes);
            if lp == f64::NEG_INFINITY {
                return f64::NEG_INFINITY;
            }
            total += lp;
        }
        total
    }

    /// Runs the Metropolis-Hastings chain and returns the overall
    /// acceptance ratio. Histories recorded before an aborting error are
    /// preserved on the model.
    pub fn sample(&mut self, config: &SampleConfig) -> Result<f64> {
        Sampler::new(self, config.clone()).run()
    }

    pub fn value(&self, id: NodeId) -> &Value {
        self.nodes.value(id)
    }

    /// Shape-checked carrier write, e.g. to pick a starting point before
    /// sampling.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<Value>) -> Result<()> {
        self.nodes.set(id, value)
    }

    /// Recorded post-burn-in samples for a node; empty for observed nodes.
    pub fn history(&self, id: NodeId) -> &[Value] {
        self.nodes.get(id).history()
    }

    /// Elementwise mean of a node's recorded history.
    pub fn history_mean(&self, id: NodeId) -> Option<Value> {
        self.nodes.get(id).history_mean()
    }

    pub fn proposal_scale(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(id).proposal_scale()
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut NodeTable {
        &mut self.nodes
    }

    /// Stochastic nodes that take part in the proposal loop, in
    /// declaration order.
    pub(crate) fn proposable_ids(&self) -> Vec<NodeId> {
        self.nodes
            .ids()
            .filter(|id| self.nodes.get(*id).proposes())
            .collect()
    }

    fn validate_dist(&self, value: &Value, dist: &Dist) -> Result<()> {
        for param in dist.params() {
            self.validate_param(dist.name(), param, value.len())?;
        }
        Ok(())
    }

    fn validate_param(&self, dist: &str, param: &Param, target_len: usize) -> Result<()> {
        if let Param::Node(id) = param {
            ensure!(
                self.nodes.contains(*id),
                Graph: "{} parameter references node {} before it is declared", dist, id.index()
            );
        }
        let resolved = param.resolve(&self.nodes);
        ensure!(
            resolved.len() == 1 || resolved.len() == target_len,
            Shape: "{} parameter of length {} cannot broadcast over {} elements",
            dist,
            resolved.len(),
            target_len
        );
        Ok(())
    }

    fn validate_rule(&self, value: &Value, rule: DetRule) -> Result<DetRule> {
        match &rule {
            DetRule::Tracked | DetRule::Closure(_) => {}
            DetRule::Linear { x, b } | DetRule::Logistic { x, b } => {
                let (rows, cols) = self.design_dims(rule.name(), x)?;
                let coefs = self.rule_operand(rule.name(), b)?;
                ensure!(
                    coefs.as_real_vec().is_some_and(|v| v.len() == cols),
                    Shape: "{} coefficients must be a real vector of length {}", rule.name(), cols
                );
                ensure!(
                    value.as_real_vec().is_some_and(|v| v.len() == rows),
                    Shape: "{} target must be a real vector of length {}", rule.name(), rows
                );
            }
            DetRule::LinearGrouped { x, b, group } => {
                let (rows, cols) = self.design_dims(rule.name(), x)?;
                let coefs = self.rule_operand(rule.name(), b)?;
                let Some(coefs) = coefs.as_real_mat() else {
                    meander_error::meander_bail!(
                        Shape: "LinearGrouped coefficients must be a real matrix"
                    );
                };
                ensure!(
                    coefs.ncols() == cols,
                    Shape: "LinearGrouped coefficient matrix must have {} columns", cols
                );

                let groups = self.rule_operand(rule.name(), group)?;
                let Some(groups) = groups.as_int_vec() else {
                    meander_error::meander_bail!(
                        Shape: "LinearGrouped group labels must be an integer vector"
                    );
                };
                ensure!(
                    groups.len() == rows,
                    Shape: "LinearGrouped group labels must have one entry per design row"
                );
                let coef_rows = coefs.nrows() as i64;
                ensure!(
                    groups.iter().all(|g| *g >= 0 && *g < coef_rows),
                    Graph: "LinearGrouped group label out of range for {} coefficient rows", coef_rows
                );
                ensure!(
                    value.as_real_vec().is_some_and(|v| v.len() == rows),
                    Shape: "LinearGrouped target must be a real vector of length {}", rows
                );
            }
        }
        Ok(rule)
    }

    fn design_dims(&self, rule: &str, x: &Param) -> Result<(usize, usize)> {
        let design = self.rule_operand(rule, x)?;
        match design.as_real_mat() {
            Some(m) => Ok(m.dim()),
            None => Err(meander_error::meander_err!(
                Shape: "{} design must be a real matrix, got {:?}", rule, design.kind()
            )),
        }
    }

    fn rule_operand<'a>(&'a self, rule: &str, param: &'a Param) -> Result<&'a Value> {
        if let Param::Node(id) = param {
            ensure!(
                self.nodes.contains(*id),
                Graph: "{} operand references node {} before it is declared", rule, id.index()
            );
        }
        Ok(param.resolve(&self.nodes))
    }
}

/// Integer design matrices are accepted for convenience and widened to
/// real storage once, at declaration.
fn widen_design(rule: DetRule) -> DetRule {
    fn widen(param: Param) -> Param {
        match param {
            Param::Const(Value::IntMat(m)) => Param::Const(Value::RealMat(m.mapv(|v| v as f64))),
            other => other,
        }
    }

    match rule {
        DetRule::Linear { x, b } => DetRule::Linear { x: widen(x), b },
        DetRule::Logistic { x, b } => DetRule::Logistic { x: widen(x), b },
        DetRule::LinearGrouped { x, b, group } => DetRule::LinearGrouped {
            x: widen(x),
            b,
            group,
        },
        other => other,
    }
}
