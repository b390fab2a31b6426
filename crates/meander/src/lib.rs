//! A Rust library for Markov chain Monte Carlo sampling of Bayesian
//! graphical models.
//!
//! Declare a model as a graph of observed data, unobserved stochastic
//! parameters, and deterministic transformations, then draw posterior
//! samples with a component-wise Metropolis-Hastings chain that tunes its
//! proposal scales during an adaptation window.
//!
//! ```rust
//! use meander::*;
//!
//! // p ~ Beta(1, 1); seven successes in ten Bernoulli trials observed.
//! let mut model = Model::new();
//! let p = model.stochastic(0.5, Dist::beta(1.0, 1.0)).unwrap();
//! model
//!     .observed(
//!         vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
//!         Dist::bernoulli(p),
//!     )
//!     .unwrap();
//!
//! let acceptance = model
//!     .sample(&SampleConfig::new(4_000, 1_000, 500, 1).with_seed(42))
//!     .unwrap();
//!
//! assert!(acceptance > 0.0);
//! assert_eq!(model.history(p).len(), 4_000);
//! ```

pub use meander_core::*;
pub use meander_error::{ErrorCode, MeanderError, MeanderResult, ResultExt};

pub mod prelude {
    pub use meander_core::prelude::*;
    pub use meander_error::{ErrorCode, MeanderError, MeanderResult, ResultExt};
}
