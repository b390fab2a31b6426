use super::rule::DetRule;
use super::table::NodeTable;
use crate::density;
use crate::domain::random_provider;
use crate::value::Value;
use ndarray::{Array1, Array2};
use std::fmt::{self, Debug};

/// Stable handle to a node in the model's table. Nodes are addressed by
/// index; the model owns all storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A distribution argument: either a constant or a reference to another
/// node's carrier. Node references make hierarchical parameterization
/// possible (a prior's precision can itself be a sampled node).
#[derive(Debug)]
pub enum Param {
    Const(Value),
    Node(NodeId),
}

impl Param {
    /// Resolves the parameter against the node table.
    #[inline]
    pub fn resolve<'a>(&'a self, table: &'a NodeTable) -> &'a Value {
        match self {
            Param::Const(value) => value,
            Param::Node(id) => table.value(*id),
        }
    }
}

impl From<NodeId> for Param {
    fn from(id: NodeId) -> Self {
        Param::Node(id)
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Const(value)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Const(Value::Real(v))
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Const(Value::Int(v))
    }
}

impl From<Vec<f64>> for Param {
    fn from(v: Vec<f64>) -> Self {
        Param::Const(Value::from(v))
    }
}

impl From<Vec<i64>> for Param {
    fn from(v: Vec<i64>) -> Self {
        Param::Const(Value::from(v))
    }
}

impl From<Array1<f64>> for Param {
    fn from(v: Array1<f64>) -> Self {
        Param::Const(Value::from(v))
    }
}

impl From<Array2<f64>> for Param {
    fn from(m: Array2<f64>) -> Self {
        Param::Const(Value::from(m))
    }
}

impl From<Array1<i64>> for Param {
    fn from(v: Array1<i64>) -> Self {
        Param::Const(Value::from(v))
    }
}

/// Distribution spec attached to an observed or stochastic node.
#[derive(Debug)]
pub enum Dist {
    Normal { mu: Param, tau: Param },
    Uniform { lower: Param, upper: Param },
    Gamma { alpha: Param, beta: Param },
    Beta { alpha: Param, beta: Param },
    Bernoulli { p: Param },
    Binomial { n: Param, p: Param },
}

impl Dist {
    pub fn normal(mu: impl Into<Param>, tau: impl Into<Param>) -> Self {
        Dist::Normal {
            mu: mu.into(),
            tau: tau.into(),
        }
    }

    pub fn uniform(lower: impl Into<Param>, upper: impl Into<Param>) -> Self {
        Dist::Uniform {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn gamma(alpha: impl Into<Param>, beta: impl Into<Param>) -> Self {
        Dist::Gamma {
            alpha: alpha.into(),
            beta: beta.into(),
        }
    }

    pub fn beta(alpha: impl Into<Param>, beta: impl Into<Param>) -> Self {
        Dist::Beta {
            alpha: alpha.into(),
            beta: beta.into(),
        }
    }

    pub fn bernoulli(p: impl Into<Param>) -> Self {
        Dist::Bernoulli { p: p.into() }
    }

    pub fn binomial(n: impl Into<Param>, p: impl Into<Param>) -> Self {
        Dist::Binomial {
            n: n.into(),
            p: p.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dist::Normal { .. } => "Normal",
            Dist::Uniform { .. } => "Uniform",
            Dist::Gamma { .. } => "Gamma",
            Dist::Beta { .. } => "Beta",
            Dist::Bernoulli { .. } => "Bernoulli",
            Dist::Binomial { .. } => "Binomial",
        }
    }

    pub fn params(&self) -> Vec<&Param> {
        match self {
            Dist::Normal { mu, tau } => vec![mu, tau],
            Dist::Uniform { lower, upper } => vec![lower, upper],
            Dist::Gamma { alpha, beta } => vec![alpha, beta],
            Dist::Beta { alpha, beta } => vec![alpha, beta],
            Dist::Bernoulli { p } => vec![p],
            Dist::Binomial { n, p } => vec![n, p],
        }
    }

    /// Whether a stochastic node with this distribution takes part in the
    /// proposal loop. Binomial-distributed nodes never jump; they still
    /// contribute to the joint density.
    pub fn proposes(&self) -> bool {
        !matches!(self, Dist::Binomial { .. })
    }

    /// Log-density of `x` under this distribution with parameters read
    /// through the node table.
    pub fn logp(&self, x: &Value, table: &NodeTable) -> f64 {
        match self {
            Dist::Normal { mu, tau } => {
                density::normal_logp(x, mu.resolve(table), tau.resolve(table))
            }
            Dist::Uniform { lower, upper } => {
                density::uniform_logp(x, lower.resolve(table), upper.resolve(table))
            }
            Dist::Gamma { alpha, beta } => {
                density::gamma_logp(x, alpha.resolve(table), beta.resolve(table))
            }
            Dist::Beta { alpha, beta } => {
                density::beta_logp(x, alpha.resolve(table), beta.resolve(table))
            }
            Dist::Bernoulli { p } => density::bernoulli_logp(x, p.resolve(table)),
            Dist::Binomial { n, p } => {
                density::binomial_logp(x, n.resolve(table), p.resolve(table))
            }
        }
    }
}

/// What a node is to the sampler: fixed data, a samplable parameter, or a
/// pure function of upstream nodes.
pub enum Role {
    Observed {
        dist: Dist,
    },
    Stochastic {
        dist: Dist,
        /// Proposal jump width, tuned during the adapt window.
        scale: f64,
        /// Accept count and proposal count within the current adapt window.
        window_accepts: usize,
        window_steps: usize,
        /// Pre-proposal scratch, sized to the node's carrier.
        snapshot: Value,
    },
    Deterministic {
        rule: DetRule,
    },
}

impl Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Observed { dist } => write!(f, "Observed({})", dist.name()),
            Role::Stochastic { dist, scale, .. } => {
                write!(f, "Stochastic({}, scale={})", dist.name(), scale)
            }
            Role::Deterministic { rule } => write!(f, "Deterministic({})", rule.name()),
        }
    }
}

/// One vertex of the model graph: a value carrier, a role, and the sample
/// history recorded after burn-in.
pub struct Node {
    value: Value,
    role: Role,
    history: Vec<Value>,
}

impl Node {
    pub(crate) fn observed(value: Value, dist: Dist) -> Self {
        Node {
            value,
            role: Role::Observed { dist },
            history: Vec::new(),
        }
    }

    pub(crate) fn stochastic(value: Value, dist: Dist) -> Self {
        let snapshot = value.clone();
        Node {
            value,
            role: Role::Stochastic {
                dist,
                scale: 1.0,
                window_accepts: 0,
                window_steps: 0,
                snapshot,
            },
            history: Vec::new(),
        }
    }

    pub(crate) fn deterministic(value: Value, rule: DetRule) -> Self {
        Node {
            value,
            role: Role::Deterministic { rule },
            history: Vec::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub(crate) fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    pub fn is_observed(&self) -> bool {
        matches!(self.role, Role::Observed { .. })
    }

    pub fn is_stochastic(&self) -> bool {
        matches!(self.role, Role::Stochastic { .. })
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self.role, Role::Deterministic { .. })
    }

    pub fn dist(&self) -> Option<&Dist> {
        match &self.role {
            Role::Observed { dist } | Role::Stochastic { dist, .. } => Some(dist),
            Role::Deterministic { .. } => None,
        }
    }

    pub fn proposal_scale(&self) -> Option<f64> {
        match &self.role {
            Role::Stochastic { scale, .. } => Some(*scale),
            _ => None,
        }
    }

    /// Whether the sampler proposes jumps for this node.
    pub fn proposes(&self) -> bool {
        match &self.role {
            Role::Stochastic { dist, .. } => dist.proposes(),
            _ => false,
        }
    }

    pub fn history(&self) -> &[Value] {
        &self.history
    }

    pub fn history_mean(&self) -> Option<Value> {
        Value::mean_of(&self.history)
    }

    /// This node's contribution to the joint log-density. Deterministic
    /// nodes carry no density of their own.
    pub fn logp(&self, table: &NodeTable) -> f64 {
        match &self.role {
            Role::Observed { dist } | Role::Stochastic { dist, .. } => {
                dist.logp(&self.value, table)
            }
            Role::Deterministic { .. } => 0.0,
        }
    }

    pub(crate) fn record(&mut self) {
        self.history.push(self.value.clone());
    }

    pub(crate) fn snapshot(&mut self) {
        if let Role::Stochastic { snapshot, .. } = &mut self.role {
            snapshot.copy_from(&self.value);
        }
    }

    pub(crate) fn restore(&mut self) {
        if let Role::Stochastic { snapshot, .. } = &mut self.role {
            self.value.copy_from(snapshot);
        }
    }

    /// Proposes a jump for a stochastic node: an elementwise additive
    /// Gaussian step for continuous distributions, a probabilistic bit
    /// flip for Bernoulli.
    pub(crate) fn jump(&mut self) {
        let Role::Stochastic { dist, scale, .. } = &self.role else {
            return;
        };
        let scale = *scale;

        match dist {
            Dist::Normal { .. } | Dist::Uniform { .. } | Dist::Gamma { .. } | Dist::Beta { .. } => {
                gaussian_jump(&mut self.value, scale)
            }
            Dist::Bernoulli { .. } => bernoulli_jump(&mut self.value, scale),
            Dist::Binomial { .. } => {}
        }
    }

    pub(crate) fn tally_window(&mut self, accepted: bool) {
        if let Role::Stochastic {
            window_accepts,
            window_steps,
            ..
        } = &mut self.role
        {
            *window_steps += 1;
            if accepted {
                *window_accepts += 1;
            }
        }
    }

    /// Drains the adapt-window tallies, returning (accepts, proposals).
    pub(crate) fn drain_window(&mut self) -> (usize, usize) {
        if let Role::Stochastic {
            window_accepts,
            window_steps,
            ..
        } = &mut self.role
        {
            let tallies = (*window_accepts, *window_steps);
            *window_accepts = 0;
            *window_steps = 0;
            tallies
        } else {
            (0, 0)
        }
    }

    pub(crate) fn scale_mut(&mut self) -> Option<&mut f64> {
        match &mut self.role {
            Role::Stochastic { scale, .. } => Some(scale),
            _ => None,
        }
    }
}

fn gaussian_jump(value: &mut Value, scale: f64) {
    match value {
        Value::Real(v) => *v += scale * random_provider::standard_normal(),
        Value::RealVec(arr) => {
            for v in arr.iter_mut() {
                *v += scale * random_provider::standard_normal();
            }
        }
        Value::RealMat(arr) => {
            for v in arr.iter_mut() {
                *v += scale * random_provider::standard_normal();
            }
        }
        // Integer carriers never reach the jump path; stochastic nodes are
        // validated to real shapes at construction.
        _ => {}
    }
}

fn bernoulli_jump(value: &mut Value, scale: f64) {
    // At scale 1 every element flips with probability one half; larger
    // scales flip more often.
    let flip_probability = 1.0 - 0.5_f64.powf(scale);

    let mut toggle = |v: &mut f64| {
        if random_provider::flip(flip_probability) {
            *v = if *v == 0.0 { 1.0 } else { 0.0 };
        }
    };

    match value {
        Value::Real(v) => toggle(v),
        Value::RealVec(arr) => arr.iter_mut().for_each(&mut toggle),
        Value::RealMat(arr) => arr.iter_mut().for_each(&mut toggle),
        _ => {}
    }
}
