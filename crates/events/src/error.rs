//! Error types for event and logging setup.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for event and logging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring logging.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A tracing format name was not recognized.
    #[error("Unknown tracing format: {value}")]
    #[diagnostic(
        code(taskweave::events::invalid_format),
        help("Supported formats: pretty, compact, json")
    )]
    InvalidFormat {
        /// The rejected value.
        value: String,
    },

    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {message}")]
    #[diagnostic(
        code(taskweave::events::tracing_init),
        help("A global subscriber may already be installed, or the filter directive is invalid")
    )]
    TracingInit {
        /// Underlying failure.
        message: String,
    },
}
