//! Crate-wide error type.
//!
//! Every fallible operation returns `Result<_, AppError>`. The error carries a
//! process exit code (used by the `dcurve` binary) and an [`ErrorKind`] so that
//! library callers can tell a failed fit apart from corrupted plate data.

/// Broad classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The grid search found no parameter set with a finite inflection point.
    FitFailed,
    /// Plate data contradicts itself (e.g. a precomputed stats row is missing).
    InconsistentState,
    /// A fit type label has no registered strategy.
    UnsupportedFitType,
    /// Caller supplied arguments outside the accepted domain.
    InvalidInput,
    /// Reading or writing files in the CLI layer.
    Io,
}

impl ErrorKind {
    fn default_exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidInput | ErrorKind::UnsupportedFitType | ErrorKind::Io => 2,
            ErrorKind::FitFailed => 3,
            ErrorKind::InconsistentState => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.default_exit_code(),
            message: message.into(),
        }
    }

    pub fn fit_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FitFailed, message)
    }

    pub fn inconsistent_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InconsistentState, message)
    }

    pub fn unsupported_fit_type(label: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedFitType,
            format!("Unsupported curve fit type '{label}'."),
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
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
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
