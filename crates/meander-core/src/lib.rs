pub mod density;
pub mod domain;
pub mod graph;
pub mod model;
pub mod sampler;
pub mod value;

pub use density::{
    bernoulli_logp, beta_logp, binomial_logp, gamma_logp, normal_logp, uniform_logp,
};
pub use domain::math;
pub use domain::random_provider;
pub use graph::{DetRule, Dist, ModelFn, Node, NodeId, NodeTable, Param, Role, UpdateFn};
pub use model::Model;
pub use sampler::{Phase, SampleConfig, Sampler};
pub use value::{Value, ValueKind, View};

pub mod prelude {
    pub use super::domain::random_provider;
    pub use super::graph::{DetRule, Dist, NodeId, NodeTable, Param};
    pub use super::model::Model;
    pub use super::sampler::{Phase, SampleConfig, Sampler};
    pub use super::value::{Value, ValueKind};
}
