use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// File name suffixes eligible for review when the config lists none.
const DEFAULT_EXTENSIONS: [&str; 8] = [
    ".js", ".jsx", ".ts", ".tsx", ".json", ".env", ".html", ".css",
];

/// Directory names pruned from traversal when the config lists none.
const DEFAULT_EXCLUDED_DIRS: [&str; 7] = [
    "node_modules", "build", "dist", ".git", ".next", ".vercel", ".vite",
];

/// File names never reviewed when the config lists none.
const DEFAULT_EXCLUDED_FILES: [&str; 1] = ["package-lock.json"];

/// Instructions sent with every chunk when the config provides none.
const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert software engineer reviewing one file \
from a larger project. Analyze the submitted content for syntax errors, broken imports or \
file references, missing or unused dependencies, incorrect configuration, and security \
problems. For each finding, state the root cause and a concrete fix. If the content has no \
significant problems, say so explicitly.";

/// Analysis service settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    /// Base URL; the client appends `/chat/completions`.
    pub endpoint: String,
    /// Model identifier submitted with every request.
    pub model: String,
    /// Sampling temperature submitted with every request.
    pub temperature: f32,
    /// Per-request timeout for the blocking HTTP client.
    pub timeout: Duration,
}

/// Project configuration loaded from `.coderev.toml`.
/// Every section is optional; defaults reproduce the stock scan behavior.
#[derive(Debug, Clone)]
pub struct Config {
    /// Analysis service settings.
    pub api: ApiConfig,
    /// Path eligibility rules.
    pub filter: FilterConfig,
    /// Named scan modes; `full` and `backend` always exist.
    pub modes: BTreeMap<String, ModeConfig>,
    /// Sleep windows and the optional retry cap.
    pub pacing: PacingConfig,
    /// Chunking and prompt settings.
    pub review: ReviewConfig,
}

/// Path eligibility rules for the walker.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Directory names pruned before descent.
    pub excluded_dirs: Vec<String>,
    /// File names that are never reviewed.
    pub excluded_files: Vec<String>,
    /// Eligible file name suffixes, leading dot included.
    pub extensions: Vec<String>,
}

/// One named scan mode: where to walk and where to checkpoint.
#[derive(Debug, Clone)]
pub struct ModeConfig {
    /// CSV checkpoint store for this mode.
    pub checkpoint: PathBuf,
    /// Directory the walker starts from.
    pub root: PathBuf,
}

/// Sleep windows for pacing and retry, plus the optional attempt cap.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Retries allowed per chunk before it fails as fatal.
    /// Absent means retry forever; rate limiting is expected to clear.
    pub max_attempts: Option<u32>,
    /// Upper bound of the between-chunk pause window.
    pub pause_max: Duration,
    /// Lower bound of the between-chunk pause window.
    pub pause_min: Duration,
    /// Wait after a rate limit when the service suggests none.
    pub rate_limit_fallback: Duration,
    /// Upper bound of the transient-failure wait window.
    pub transient_max: Duration,
    /// Lower bound of the transient-failure wait window.
    pub transient_min: Duration,
}

/// Chunking and prompt settings.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Extra project context appended to the instructions; may be empty.
    pub context: String,
    /// Maximum characters per submitted chunk.
    pub max_chunk_size: usize,
    /// Instructions sent as the system message with every chunk.
    pub system_prompt: String,
}

/// Raw TOML structure for `.coderev.toml`.
#[derive(Debug, Default, serde::Deserialize)]
struct CoderevTomlConfig {
    #[serde(default)]
    api: RawApi,
    #[serde(default)]
    filter: RawFilter,
    #[serde(default)]
    modes: BTreeMap<String, RawMode>,
    #[serde(default)]
    pacing: RawPacing,
    #[serde(default)]
    review: RawReview,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawApi {
    api_key_env: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<f64>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawFilter {
    excluded_dirs: Option<Vec<String>>,
    excluded_files: Option<Vec<String>>,
    extensions: Option<Vec<String>>,
}

#[derive(Debug, serde::Deserialize)]
struct RawMode {
    checkpoint: String,
    root: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawPacing {
    max_attempts: Option<u32>,
    pause_max_secs: Option<f64>,
    pause_min_secs: Option<f64>,
    rate_limit_fallback_secs: Option<f64>,
    transient_max_secs: Option<f64>,
    transient_min_secs: Option<f64>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawReview {
    context: Option<String>,
    max_chunk_size: Option<usize>,
    system_prompt: Option<String>,
}

impl Config {
    /// Load config from `.coderev.toml` in the given root directory.
    /// Returns the built-in defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed — never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::InvalidConfig` if a setting fails validation.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".coderev.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Self::from_raw(CoderevTomlConfig::default());
            },
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: CoderevTomlConfig = toml::from_str(&content)?;
        return Self::from_raw(raw);
    }

    /// Look up a scan mode by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownMode` naming the configured modes.
    pub fn mode(&self, name: &str) -> Result<&ModeConfig, Error> {
        return self.modes.get(name).ok_or_else(|| {
            return Error::UnknownMode {
                available: self.modes.keys().cloned().collect(),
                name: name.to_string(),
            };
        });
    }

    /// Apply defaults to the raw TOML structure and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a zero chunk size, an inverted
    /// sleep window, a negative duration, or an empty mode path.
    fn from_raw(raw: CoderevTomlConfig) -> Result<Self, Error> {
        let api = ApiConfig {
            api_key_env: raw.api.api_key_env.unwrap_or_else(|| return "OPENAI_API_KEY".to_string()),
            endpoint: raw.api.endpoint.unwrap_or_else(|| return "https://api.openai.com/v1".to_string()),
            model: raw.api.model.unwrap_or_else(|| return "gpt-4o".to_string()),
            temperature: raw.api.temperature.unwrap_or(0.2),
            timeout: duration_setting(raw.api.timeout_secs, 60.0, "api.timeout_secs")?,
        };

        let filter = FilterConfig {
            excluded_dirs: raw
                .filter
                .excluded_dirs
                .unwrap_or_else(|| return DEFAULT_EXCLUDED_DIRS.map(String::from).to_vec()),
            excluded_files: raw
                .filter
                .excluded_files
                .unwrap_or_else(|| return DEFAULT_EXCLUDED_FILES.map(String::from).to_vec()),
            extensions: raw
                .filter
                .extensions
                .unwrap_or_else(|| return DEFAULT_EXTENSIONS.map(String::from).to_vec()),
        };

        let pacing = PacingConfig {
            max_attempts: raw.pacing.max_attempts,
            pause_max: duration_setting(raw.pacing.pause_max_secs, 8.0, "pacing.pause_max_secs")?,
            pause_min: duration_setting(raw.pacing.pause_min_secs, 6.0, "pacing.pause_min_secs")?,
            rate_limit_fallback: duration_setting(
                raw.pacing.rate_limit_fallback_secs,
                10.0,
                "pacing.rate_limit_fallback_secs",
            )?,
            transient_max: duration_setting(
                raw.pacing.transient_max_secs,
                15.0,
                "pacing.transient_max_secs",
            )?,
            transient_min: duration_setting(
                raw.pacing.transient_min_secs,
                10.0,
                "pacing.transient_min_secs",
            )?,
        };

        let review = ReviewConfig {
            context: raw.review.context.unwrap_or_default(),
            max_chunk_size: raw.review.max_chunk_size.unwrap_or(3000),
            system_prompt: raw
                .review
                .system_prompt
                .unwrap_or_else(|| return DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        let mut modes = default_modes();
        for (name, mode) in raw.modes {
            if mode.root.is_empty() || mode.checkpoint.is_empty() {
                return Err(Error::InvalidConfig {
                    reason: format!("mode `{name}` needs a nonempty root and checkpoint"),
                });
            }
            modes.insert(
                name,
                ModeConfig {
                    checkpoint: PathBuf::from(mode.checkpoint),
                    root: PathBuf::from(mode.root),
                },
            );
        }

        let config = Self { api, filter, modes, pacing, review };
        config.validate()?;
        return Ok(config);
    }

    /// Reject settings the reviewer cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` naming the offending setting.
    fn validate(&self) -> Result<(), Error> {
        if self.review.max_chunk_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "review.max_chunk_size must be at least 1".to_string(),
            });
        }
        if self.pacing.pause_min > self.pacing.pause_max {
            return Err(Error::InvalidConfig {
                reason: "pacing.pause_min_secs exceeds pacing.pause_max_secs".to_string(),
            });
        }
        if self.pacing.transient_min > self.pacing.transient_max {
            return Err(Error::InvalidConfig {
                reason: "pacing.transient_min_secs exceeds pacing.transient_max_secs".to_string(),
            });
        }
        return Ok(());
    }
}

impl ReviewConfig {
    /// The full instruction text sent as the system message:
    /// the prompt, then a blank line and the project context if any.
    pub fn instructions(&self) -> String {
        if self.context.is_empty() {
            return self.system_prompt.clone();
        }
        return format!("{}\n\n{}", self.system_prompt, self.context);
    }
}

/// The two stock scan modes, matching the original tool's layout.
fn default_modes() -> BTreeMap<String, ModeConfig> {
    let mut modes = BTreeMap::new();
    modes.insert(
        "full".to_string(),
        ModeConfig {
            checkpoint: PathBuf::from("scan_results.csv"),
            root: PathBuf::from("."),
        },
    );
    modes.insert(
        "backend".to_string(),
        ModeConfig {
            checkpoint: PathBuf::from("backend_scan_results.csv"),
            root: PathBuf::from("backend"),
        },
    );
    return modes;
}

/// Convert an optional seconds setting into a `Duration`.
///
/// # Errors
///
/// Returns `Error::InvalidConfig` for negative or non-finite values.
fn duration_setting(value: Option<f64>, default: f64, field: &str) -> Result<Duration, Error> {
    let secs = value.unwrap_or(default);
    return Duration::try_from_secs_f64(secs).map_err(|_err| {
        return Error::InvalidConfig {
            reason: format!("`{field}` must be a non-negative number of seconds"),
        };
    });
}
