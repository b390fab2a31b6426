use ndarray::{Array1, Array2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// The closed set of shapes a model variable can take. A variable keeps its
/// shape (and, for arrays, its dimensions) for the lifetime of a run.
///
/// Discrete Bernoulli/Binomial outcomes conventionally live in the real
/// shapes holding 0/1 (resp. count) values; the integer shapes exist for
/// observed data supplied by the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    Real,
    Int,
    RealVec,
    RealMat,
    IntVec,
    IntMat,
}

/// The storage carrier behind one node: a scalar, vector, or matrix of
/// real or integer values. The model owns exactly one carrier per node.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Real(f64),
    Int(i64),
    RealVec(Array1<f64>),
    RealMat(Array2<f64>),
    IntVec(Array1<i64>),
    IntMat(Array2<i64>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Real(_) => ValueKind::Real,
            Value::Int(_) => ValueKind::Int,
            Value::RealVec(_) => ValueKind::RealVec,
            Value::RealMat(_) => ValueKind::RealMat,
            Value::IntVec(_) => ValueKind::IntVec,
            Value::IntMat(_) => ValueKind::IntMat,
        }
    }

    /// Number of elements in the carrier.
    pub fn len(&self) -> usize {
        match self {
            Value::Real(_) | Value::Int(_) => 1,
            Value::RealVec(v) => v.len(),
            Value::RealMat(m) => m.len(),
            Value::IntVec(v) => v.len(),
            Value::IntMat(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Real(_) | Value::Int(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(
            self,
            Value::Real(_) | Value::RealVec(_) | Value::RealMat(_)
        )
    }

    /// Shape equality: same kind and same dimensions.
    pub fn same_shape(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Real(_), Value::Real(_)) | (Value::Int(_), Value::Int(_)) => true,
            (Value::RealVec(a), Value::RealVec(b)) => a.len() == b.len(),
            (Value::IntVec(a), Value::IntVec(b)) => a.len() == b.len(),
            (Value::RealMat(a), Value::RealMat(b)) => a.dim() == b.dim(),
            (Value::IntMat(a), Value::IntMat(b)) => a.dim() == b.dim(),
            _ => false,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real_vec(&self) -> Option<&Array1<f64>> {
        match self {
            Value::RealVec(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_real_mat(&self) -> Option<&Array2<f64>> {
        match self {
            Value::RealMat(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_int_vec(&self) -> Option<&Array1<i64>> {
        match self {
            Value::IntVec(v) => Some(v),
            _ => None,
        }
    }

    /// Elementwise read-only view used by the density layer. Scalars report
    /// themselves at every index so they broadcast over array arguments.
    pub fn view(&self) -> View<'_> {
        match self {
            Value::Real(v) => View::Scalar(*v),
            Value::Int(v) => View::Scalar(*v as f64),
            Value::RealVec(v) => View::Dense(v.as_slice().expect("vector carrier is contiguous")),
            Value::RealMat(m) => View::Dense(m.as_slice().expect("matrix carrier is contiguous")),
            Value::IntVec(v) => View::Ints(v.as_slice().expect("vector carrier is contiguous")),
            Value::IntMat(m) => View::Ints(m.as_slice().expect("matrix carrier is contiguous")),
        }
    }

    /// Overwrites this carrier in place from another of the same shape.
    /// Array storage is reused rather than reallocated, which keeps the
    /// sampler's snapshot/restore path allocation-free.
    pub fn copy_from(&mut self, src: &Value) {
        match (self, src) {
            (Value::Real(a), Value::Real(b)) => *a = *b,
            (Value::Int(a), Value::Int(b)) => *a = *b,
            (Value::RealVec(a), Value::RealVec(b)) => a.assign(b),
            (Value::RealMat(a), Value::RealMat(b)) => a.assign(b),
            (Value::IntVec(a), Value::IntVec(b)) => a.assign(b),
            (Value::IntMat(a), Value::IntMat(b)) => a.assign(b),
            (dst, src) => *dst = src.clone(),
        }
    }

    /// Elementwise mean over a sequence of same-shape values, e.g. a node's
    /// recorded history. Integer-shaped inputs average into real shapes.
    pub fn mean_of(values: &[Value]) -> Option<Value> {
        let first = values.first()?;
        let n = values.len() as f64;
        let len = first.len();

        let mut acc = vec![0.0_f64; len];
        for value in values {
            let view = value.view();
            for (i, slot) in acc.iter_mut().enumerate() {
                *slot += view.at(i);
            }
        }
        for slot in acc.iter_mut() {
            *slot /= n;
        }

        Some(match first {
            Value::Real(_) | Value::Int(_) => Value::Real(acc[0]),
            Value::RealVec(_) | Value::IntVec(_) => Value::RealVec(Array1::from_vec(acc)),
            Value::RealMat(m) => {
                Value::RealMat(Array2::from_shape_vec(m.dim(), acc).expect("shape preserved"))
            }
            Value::IntMat(m) => {
                Value::RealMat(Array2::from_shape_vec(m.dim(), acc).expect("shape preserved"))
            }
        })
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Real(0.0)
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(v) => write!(f, "Real({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::RealVec(v) => write!(f, "RealVec({:?})", v.as_slice().unwrap_or(&[])),
            Value::RealMat(m) => write!(f, "RealMat({:?})", m.dim()),
            Value::IntVec(v) => write!(f, "IntVec({:?})", v.as_slice().unwrap_or(&[])),
            Value::IntMat(m) => write!(f, "IntMat({:?})", m.dim()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::RealVec(Array1::from_vec(v))
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntVec(Array1::from_vec(v))
    }
}

impl From<Array1<f64>> for Value {
    fn from(v: Array1<f64>) -> Self {
        Value::RealVec(v)
    }
}

impl From<Array2<f64>> for Value {
    fn from(m: Array2<f64>) -> Self {
        Value::RealMat(m)
    }
}

impl From<Array1<i64>> for Value {
    fn from(v: Array1<i64>) -> Self {
        Value::IntVec(v)
    }
}

impl From<Array2<i64>> for Value {
    fn from(m: Array2<i64>) -> Self {
        Value::IntMat(m)
    }
}

/// Borrowed elementwise view over a [`Value`]. `Scalar` broadcasts against
/// any index; the dense variants index their backing slice directly, so an
/// out-of-range access (a shape bug) aborts rather than silently wrapping.
#[derive(Copy, Clone)]
pub enum View<'a> {
    Scalar(f64),
    Dense(&'a [f64]),
    Ints(&'a [i64]),
}

impl View<'_> {
    #[inline(always)]
    pub fn at(&self, i: usize) -> f64 {
        match self {
            View::Scalar(v) => *v,
            View::Dense(s) => s[i],
            View::Ints(s) => s[i] as f64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            View::Scalar(_) => 1,
            View::Dense(s) => s.len(),
            View::Ints(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, View::Scalar(_))
    }
}
