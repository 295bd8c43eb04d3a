//! CLI-level errors and exit codes.

use orgtree_core::{HierarchyError, MemberServiceError, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Request was rejected; retrying it unchanged will fail again.
pub const EXIT_REJECTED: i32 = 1;
/// Store or internal failure.
pub const EXIT_FAILURE: i32 = 2;

/// Top-level error printed to the user.
#[derive(Debug)]
pub enum CliError {
    Hierarchy(HierarchyError),
    Member(MemberServiceError),
    Validation(ValidationError),
    /// Settings, logging, or database bootstrap failed.
    Startup { code: &'static str, message: String },
    Output(serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn startup(code: &'static str, message: impl Into<String>) -> Self {
        Self::Startup {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Hierarchy(err) => err.code(),
            Self::Member(err) => err.code(),
            Self::Validation(_) => "validation",
            Self::Startup { code, .. } => *code,
            Self::Output(_) => "output",
        }
    }

    pub fn exit_code(&self) -> i32 {
        let rejected = match self {
            Self::Hierarchy(err) => err.is_validation_class(),
            Self::Member(err) => err.is_validation_class(),
            Self::Validation(_) => true,
            Self::Startup { .. } | Self::Output(_) => false,
        };
        if rejected {
            EXIT_REJECTED
        } else {
            EXIT_FAILURE
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hierarchy(err) => write!(f, "{err}"),
            Self::Member(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Startup { message, .. } => write!(f, "{message}"),
            Self::Output(err) => write!(f, "failed to render output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Hierarchy(err) => Some(err),
            Self::Member(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Startup { .. } => None,
        }
    }
}

impl From<HierarchyError> for CliError {
    fn from(value: HierarchyError) -> Self {
        Self::Hierarchy(value)
    }
}

impl From<MemberServiceError> for CliError {
    fn from(value: MemberServiceError) -> Self {
        Self::Member(value)
    }
}

impl From<ValidationError> for CliError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}
