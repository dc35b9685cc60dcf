/// Crate-level error types for coderev diagnostics.
use std::path::PathBuf;

/// All errors in coderev carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, mode, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured API key environment variable is unset or empty.
    #[error("api key missing: environment variable `{env_var}` is unset or empty")]
    ApiKeyMissing {
        /// Name of the environment variable expected to hold the key.
        env_var: String,
    },

    /// Checkpoint store exists but one of its rows cannot be parsed.
    #[error("checkpoint corrupt: {}: {reason}", path.display())]
    CheckpointCorrupt {
        /// Path to the unreadable checkpoint store.
        path: PathBuf,
        /// Description of the corruption.
        reason: String,
    },

    /// CSV reading or writing failed.
    #[error("csv: {0}")]
    Csv(
        /// The wrapped CSV error.
        #[from]
        csv::Error,
    ),

    /// The HTTP client could not be constructed.
    #[error("http client: {0}")]
    HttpClient(
        /// The wrapped reqwest error.
        #[from]
        reqwest::Error,
    ),

    /// Configuration was parsed but failed validation.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Which setting is invalid and why.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// The scan root directory does not exist or is not a directory.
    #[error("scan root not found: {}", path.display())]
    RootNotFound {
        /// Path that was expected to be the scan root.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No configured scan mode matches the given name.
    #[error("unknown mode: `{name}`")]
    UnknownMode {
        /// Names of the modes that are configured.
        available: Vec<String>,
        /// Mode name that was not found.
        name: String,
    },

    /// A directory entry could not be visited during enumeration.
    #[error("walk: {0}")]
    Walk(
        /// The wrapped traversal error.
        #[from]
        walkdir::Error,
    ),
}
