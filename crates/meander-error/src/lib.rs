use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

pub type MeanderResult<T> = Result<T, MeanderError>;
pub type Result<T, E = MeanderError> = std::result::Result<T, E>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidConfig,
    Shape,
    Graph,
    Update,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

#[derive(Debug)]
pub enum MeanderError {
    /// Bad sampler configuration (zero thin, adapt window longer than burn-in, ...).
    InvalidConfig { message: ErrString },
    /// Dimension disagreement caught at model construction.
    Shape { message: ErrString },
    /// Node wiring problem: a parameter referencing an undeclared node, a rule
    /// applied to the wrong carrier shape, and the like.
    Graph { message: ErrString },
    /// A user-supplied update closure failed mid-run.
    Update { message: ErrString },

    Context {
        context: ErrorContext,
        source: Box<MeanderError>,
    },
}

impl MeanderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::Shape { .. } => ErrorCode::Shape,
            Self::Graph { .. } => ErrorCode::Graph,
            Self::Update { .. } => ErrorCode::Update,
            Self::Context { .. } => ErrorCode::Context,
        }
    }

    pub fn with_context(self, msg: impl Into<String>) -> Self {
        MeanderError::Context {
            context: ErrorContext::new(msg),
            source: Box::new(self),
        }
    }
}

impl Display for MeanderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { message } => write!(f, "Invalid configuration: {}", message),
            Self::Shape { message } => write!(f, "Shape mismatch: {}", message),
            Self::Graph { message } => write!(f, "Graph error: {}", message),
            Self::Update { message } => write!(f, "Update error: {}", message),
            Self::Context {
                context, source, ..
            } => write!(f, "{}\nCaused by: {}", context, source),
        }
    }
}

impl std::error::Error for MeanderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ErrorContext {
    message: String,
}

impl ErrorContext {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorContext {}

// Ergonomic Result extensions (context)
pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> MeanderResult<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> MeanderResult<T>;
}

impl<T, E: Into<MeanderError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl Into<String>) -> MeanderResult<T> {
        self.map_err(|e| e.into().with_context(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> MeanderResult<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

// Macros: err, bail, ensure
#[doc(hidden)]
pub mod __private {
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(e: E) -> E {
        e
    }
}

#[macro_export]
macro_rules! meander_err {
    (InvalidConfig: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MeanderError::InvalidConfig { message: format!($fmt, $($arg),*).into() })
    };
    (Shape: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MeanderError::Shape { message: format!($fmt, $($arg),*).into() })
    };
    (Graph: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MeanderError::Graph { message: format!($fmt, $($arg),*).into() })
    };
    (Update: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MeanderError::Update { message: format!($fmt, $($arg),*).into() })
    };
    ($variant:ident: $msg:expr $(,)?) => {{
        // Fallback to Graph with custom message if variant omitted
        $crate::__private::must_use($crate::MeanderError::Graph { message: $msg.into() })
    }};
}

#[macro_export]
macro_rules! meander_bail {
    ($($tt:tt)+) => { return Err($crate::meander_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($tt:tt)+) => {
        if !$cond { $crate::meander_bail!($($tt)+); }
    };
}
