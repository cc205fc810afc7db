// ============================================================================
// 错误类型 - Lint 失败分类
// ============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Fixed message carried by the policy failure.
pub const POLICY_FAILURE_MESSAGE: &str = "All classes must have a toString not from Object";

/// Everything that can abort a lint run.
#[derive(Debug, Error)]
pub enum LintError {
    /// Malformed classpath entry, missing option, unreadable config.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A class whose ancestry never yields a `toString()`.
    #[error("Could not find a toString at all on {class}")]
    InternalConsistency { class: String },

    /// Superclass chain loops back on itself.
    #[error("Cyclic superclass chain detected at {class}")]
    CyclicHierarchy { class: String },

    #[error("Invalid class file {}: {reason}", path.display())]
    ClassFormat { path: PathBuf, reason: String },

    #[error("Failed to parse Java source {}: {reason}", path.display())]
    SourceParse { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-conforming classes found while `toStringRequired` is set.
    #[error("{}", POLICY_FAILURE_MESSAGE)]
    PolicyFailure,
}

impl LintError {
    pub fn config(msg: impl Into<String>) -> Self {
        LintError::Configuration(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LintError::Io { path: path.into(), source }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            LintError::PolicyFailure => 1,
            LintError::Configuration(_) | LintError::Io { .. } => 2,
            LintError::InternalConsistency { .. }
            | LintError::CyclicHierarchy { .. }
            | LintError::ClassFormat { .. }
            | LintError::SourceParse { .. } => 3,
        }
    }
}

pub type LintResult<T> = std::result::Result<T, LintError>;
