use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all artiflow operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ArtiflowError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.artiflow/config.toml for syntax errors"))]
    Config { message: String },

    /// A tool output or document could not be parsed.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Building the dependency tree of one ecosystem failed.
    #[error("Failed building {technology} dependency tree: {message}")]
    TreeBuild { technology: String, message: String },

    /// An environment include/exclude filter rejected its patterns.
    #[error("Environment filter error: {message}")]
    #[diagnostic(help("Patterns are ';'-separated wildcards, e.g. \"*password*;*token*\""))]
    EnvFilter { message: String },

    /// Collecting, merging or assembling build-info failed.
    #[error("Build-info error: {message}")]
    BuildInfo { message: String },

    /// A dependency graph scan failed.
    #[error("Scan failed: {message}")]
    Scan { message: String },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

impl ArtiflowError {
    /// Shorthand for a [`ArtiflowError::TreeBuild`] error.
    pub fn tree_build(technology: impl ToString, message: impl Into<String>) -> Self {
        Self::TreeBuild {
            technology: technology.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience alias for `miette::Result<T>`.
pub type ArtiflowResult<T> = miette::Result<T>;
