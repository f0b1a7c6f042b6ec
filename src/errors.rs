use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String },

    #[error("Resolution error: {msg}")]
    Resolution { msg: String },

    /// The input tree, or an earlier pass, broke an invariant. Never recovered.
    #[error("Consistency error: {msg}")]
    Consistency { msg: String },

    #[error("Not supported yet: {msg}")]
    NotSupportedYet { msg: String },

    #[error("Unknown pass `{key}`")]
    UnknownPass { key: String },
}

impl TranspileError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax { msg: msg.into() }
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution { msg: msg.into() }
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency { msg: msg.into() }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupportedYet { msg: msg.into() }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupportedYet { .. })
    }
}

pub type Result<T> = std::result::Result<T, TranspileError>;

/// Bail out with a consistency error when `cond` does not hold.
#[macro_export]
macro_rules! ensure_consistent {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::errors::TranspileError::consistency(format!($($arg)+)));
        }
    };
}
