//! Error type shared across the crate.
//!
//! Every failure carries a [`ErrorKind`] so callers (CLI today, other
//! front-ends later) can react to the *category* without parsing messages:
//!
//! - `Validation` — an input array is malformed (non-finite values, negative power)
//! - `Configuration` — arrays disagree in length, or too few points for the model
//! - `Domain` — a scalar setting is outside its physical range
//! - `Convergence` — the bounded optimizer failed to reach a solution
//! - `Io` — file-level problems while reading/writing datasets and exports
//!
//! All of these are fail-fast: the core never retries, never falls back to a
//! default, and never partially succeeds.

/// Category of failure, used for exit codes and caller-side dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Domain,
    Convergence,
    Io,
}

impl ErrorKind {
    /// Process exit code for the category.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Io => 2,
            ErrorKind::Validation | ErrorKind::Configuration => 3,
            ErrorKind::Domain => 4,
            ErrorKind::Convergence => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain, message)
    }

    pub fn convergence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Convergence, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
