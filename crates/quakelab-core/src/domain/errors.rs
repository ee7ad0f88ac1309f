use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;
pub type ParserResult<T> = EngineResult<T>;

/// Error categories for everything that fails fast with no partial result.
///
/// Numerical degeneracies (NaN/Inf in a signal) and hazard queries outside
/// the grid hull are deliberately not represented here: the former propagate
/// through the solvers unmasked, the latter yield NaN, so downstream
/// consumers can detect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorCategory {
    FormatError,
    ConfigError,
    IoSystemError,
    InternalError,
}

impl EngineErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::FormatError => 2,
            Self::ConfigError => 3,
            Self::IoSystemError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FormatError => "FormatError",
            Self::ConfigError => "ConfigError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Engine error carrying a category, a stable machine-readable code and a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    category: EngineErrorCategory,
    code: &'static str,
    message: String,
}

impl EngineError {
    pub fn new(
        category: EngineErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn format(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EngineErrorCategory::FormatError, code, message)
    }

    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EngineErrorCategory::ConfigError, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EngineErrorCategory::IoSystemError, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(EngineErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> EngineErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.code,
            self.message
        )
    }
}

impl Error for EngineError {}
