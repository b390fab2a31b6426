use super::node::Param;
use super::table::NodeTable;
use crate::domain::math;
use crate::value::Value;
use meander_error::Result;
use std::fmt::{self, Debug};

/// Per-node update callback: reads upstream values through the table and
/// writes the node's carrier.
pub type UpdateFn = Box<dyn FnMut(&NodeTable, &mut Value) -> Result<()>>;

/// Model-level update closure: runs after the per-node rules each refresh
/// and may read and write any carrier through the table.
pub type ModelFn = Box<dyn FnMut(&mut NodeTable) -> Result<()>>;

/// How a deterministic node recomputes from its parents.
pub enum DetRule {
    /// Value maintained by the model-level update closure; the node itself
    /// only tracks history.
    Tracked,
    Closure(UpdateFn),
    /// `X . b` into a real vector.
    Linear { x: Param, b: Param },
    /// Row `i` is `X[i, :] . b[group[i], :]`.
    LinearGrouped { x: Param, b: Param, group: Param },
    /// `1 / (1 + exp(-X . b))` elementwise.
    Logistic { x: Param, b: Param },
}

impl DetRule {
    pub fn closure(f: impl FnMut(&NodeTable, &mut Value) -> Result<()> + 'static) -> Self {
        DetRule::Closure(Box::new(f))
    }

    pub fn linear(x: impl Into<Param>, b: impl Into<Param>) -> Self {
        DetRule::Linear {
            x: x.into(),
            b: b.into(),
        }
    }

    pub fn linear_grouped(
        x: impl Into<Param>,
        b: impl Into<Param>,
        group: impl Into<Param>,
    ) -> Self {
        DetRule::LinearGrouped {
            x: x.into(),
            b: b.into(),
            group: group.into(),
        }
    }

    pub fn logistic(x: impl Into<Param>, b: impl Into<Param>) -> Self {
        DetRule::Logistic {
            x: x.into(),
            b: b.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DetRule::Tracked => "Tracked",
            DetRule::Closure(_) => "Closure",
            DetRule::Linear { .. } => "Linear",
            DetRule::LinearGrouped { .. } => "LinearGrouped",
            DetRule::Logistic { .. } => "Logistic",
        }
    }

    /// Recomputes `out` from the current table state. Operand shapes are
    /// validated when the node is declared, so the accessors here state
    /// invariants rather than recoverable conditions.
    pub(crate) fn apply(&mut self, table: &NodeTable, out: &mut Value) -> Result<()> {
        match self {
            DetRule::Tracked => Ok(()),
            DetRule::Closure(f) => f(table, out),
            DetRule::Linear { x, b } => {
                let design = x
                    .resolve(table)
                    .as_real_mat()
                    .expect("linear design matrix is real-valued");
                let coefs = b
                    .resolve(table)
                    .as_real_vec()
                    .expect("linear coefficients are a real vector");
                let Value::RealVec(target) = out else {
                    panic!("linear target is a real vector");
                };

                target.assign(&design.dot(coefs));
                Ok(())
            }
            DetRule::LinearGrouped { x, b, group } => {
                let design = x
                    .resolve(table)
                    .as_real_mat()
                    .expect("grouped design matrix is real-valued");
                let coefs = b
                    .resolve(table)
                    .as_real_mat()
                    .expect("grouped coefficients are a real matrix");
                let groups = group
                    .resolve(table)
                    .as_int_vec()
                    .expect("group labels are an integer vector");
                let Value::RealVec(target) = out else {
                    panic!("grouped linear target is a real vector");
                };

                for (i, g) in groups.iter().enumerate() {
                    target[i] = design.row(i).dot(&coefs.row(*g as usize));
                }
                Ok(())
            }
            DetRule::Logistic { x, b } => {
                let design = x
                    .resolve(table)
                    .as_real_mat()
                    .expect("logistic design matrix is real-valued");
                let coefs = b
                    .resolve(table)
                    .as_real_vec()
                    .expect("logistic coefficients are a real vector");
                let Value::RealVec(target) = out else {
                    panic!("logistic target is a real vector");
                };

                target.assign(&design.dot(coefs).mapv(math::logistic));
                Ok(())
            }
        }
    }
}

impl Debug for DetRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
