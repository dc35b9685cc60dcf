//! Review submission over HTTP: the blocking chat-completion client and
//! the failure taxonomy the retry policy is built on.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::Error;

/// Marker in upstream error text that identifies a transient gateway failure
/// even when the status code alone doesn't.
const BAD_GATEWAY_MARKER: &str = "502";

/// How a single chunk submission failed. The reviewer retries
/// `RateLimited` and `Transient` indefinitely; `Fatal` aborts the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Any other failure. Aborts review of the current file.
    Fatal {
        /// Description of the failure.
        message: String,
    },
    /// The service rejected the submission for pacing reasons.
    RateLimited {
        /// Rate limit description from the service.
        message: String,
        /// Wait suggested by the service, parsed from the error payload.
        suggested_wait: Option<Duration>,
    },
    /// An upstream failure expected to clear on its own.
    Transient {
        /// Description of the failure.
        message: String,
    },
}

/// Submits one chunk of file content to the analysis service.
///
/// An explicitly constructed, injected collaborator — never ambient
/// state — so the reviewer can be driven by a scripted double in tests.
pub trait ReviewClient {
    /// Submit one chunk with the given instructions and return the
    /// service's free-text verdict.
    ///
    /// # Errors
    ///
    /// Returns a `SubmitError` classifying the failure for retry purposes.
    fn submit(&self, chunk_text: &str, instructions: &str) -> Result<String, SubmitError>;
}

/// Blocking HTTP implementation of [`ReviewClient`] against an
/// OpenAI-compatible chat-completion endpoint.
pub struct HttpReviewClient {
    api_key: String,
    endpoint: String,
    http: reqwest::blocking::Client,
    model: String,
    temperature: f32,
    wait_pattern: Regex,
}

impl HttpReviewClient {
    /// Build a client from API settings and a resolved key.
    ///
    /// # Errors
    ///
    /// Returns `Error::HttpClient` if the underlying client cannot be
    /// constructed.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded wait-time regex is invalid (compile-time
    /// invariant).
    pub fn new(config: &ApiConfig, api_key: String) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        // Matches the "try again in 6.5s" marker rate-limit payloads carry.
        let wait_pattern = Regex::new(r"try again in ([0-9]+(?:\.[0-9]+)?)s").expect("valid regex");

        return Ok(Self {
            api_key,
            endpoint: config.endpoint.clone(),
            http,
            model: config.model.clone(),
            temperature: config.temperature,
            wait_pattern,
        });
    }

    /// Sort an HTTP failure status into the submit-error taxonomy.
    fn classify_http_failure(&self, status: reqwest::StatusCode, body: &str) -> SubmitError {
        let message = if body.is_empty() {
            format!("{status}")
        } else {
            format!("{status}: {body}")
        };

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return SubmitError::RateLimited {
                message,
                suggested_wait: self.parse_suggested_wait(body),
            };
        }
        if status.is_server_error() || body.contains(BAD_GATEWAY_MARKER) {
            return SubmitError::Transient { message };
        }
        return SubmitError::Fatal { message };
    }

    /// Extract the service-suggested wait from a rate-limit payload.
    fn parse_suggested_wait(&self, body: &str) -> Option<Duration> {
        let captures = self.wait_pattern.captures(body)?;
        let secs: f64 = captures.get(1)?.as_str().parse().ok()?;
        return Duration::try_from_secs_f64(secs).ok();
    }
}

impl ReviewClient for HttpReviewClient {
    fn submit(&self, chunk_text: &str, instructions: &str) -> Result<String, SubmitError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    content: instructions.to_string(),
                    role: "system".to_string(),
                },
                ChatMessage {
                    content: chunk_text.to_string(),
                    role: "user".to_string(),
                },
            ],
            model: self.model.clone(),
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(self.classify_http_failure(status, &body));
        }

        let parsed: ChatResponse = response.json().map_err(|e| {
            return SubmitError::Fatal {
                message: format!("response decode failed: {e}"),
            };
        })?;

        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(SubmitError::Fatal {
                message: "empty response: no choices returned".to_string(),
            });
        };
        return Ok(choice.message.content);
    }
}

/// Sort a request-level failure (no HTTP status) into the taxonomy.
/// Timeouts and connection failures are expected to clear; everything
/// else aborts the file.
fn classify_request_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() || err.is_connect() {
        return SubmitError::Transient { message: err.to_string() };
    }
    return SubmitError::Fatal { message: err.to_string() };
}

/// Read the API key from the configured environment variable.
///
/// # Errors
///
/// Returns `Error::ApiKeyMissing` if the variable is unset or blank.
pub fn resolve_api_key(env_var: &str) -> Result<String, Error> {
    return match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::ApiKeyMissing { env_var: env_var.to_string() }),
    };
}

/// Chat-completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    model: String,
    temperature: f32,
}

/// One message of a chat-completion request.
#[derive(Debug, Serialize)]
struct ChatMessage {
    content: String,
    role: String,
}

/// Chat-completion response body; only the verdict text is consumed.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

/// The assistant message of a completion choice.
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client_for(endpoint: &str) -> HttpReviewClient {
        let dir = tempfile::tempdir().unwrap();
        let mut api = Config::load(dir.path()).unwrap().api;
        api.endpoint = endpoint.to_string();
        HttpReviewClient::new(&api, "test-key".to_string()).unwrap()
    }

    fn verdict_body(text: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
        .to_string()
    }

    #[test]
    fn successful_response_returns_the_verdict_text() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(verdict_body("Nothing to flag."))
            .create();

        let client = client_for(&server.url());
        let verdict = client.submit("let x = 1;", "review this").unwrap();
        assert_eq!(verdict, "Nothing to flag.");
    }

    #[test]
    fn http_429_maps_to_rate_limited_with_parsed_wait() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("Rate limit reached. Please try again in 6.5s.")
            .create();

        let client = client_for(&server.url());
        let err = client.submit("x", "review").unwrap_err();
        match err {
            SubmitError::RateLimited { suggested_wait, .. } => {
                assert_eq!(suggested_wait, Some(Duration::from_millis(6500)));
            },
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn http_502_maps_to_transient() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(502)
            .with_body("502 Bad Gateway")
            .create();

        let client = client_for(&server.url());
        assert!(matches!(
            client.submit("x", "review").unwrap_err(),
            SubmitError::Transient { .. }
        ));
    }

    #[test]
    fn http_401_maps_to_fatal() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create();

        let client = client_for(&server.url());
        assert!(matches!(
            client.submit("x", "review").unwrap_err(),
            SubmitError::Fatal { .. }
        ));
    }

    #[test]
    fn empty_choices_are_fatal_not_an_empty_verdict() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create();

        let client = client_for(&server.url());
        assert!(matches!(
            client.submit("x", "review").unwrap_err(),
            SubmitError::Fatal { .. }
        ));
    }

    #[test]
    fn suggested_wait_is_absent_when_the_payload_has_no_marker() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("Rate limit reached.")
            .create();

        let client = client_for(&server.url());
        match client.submit("x", "review").unwrap_err() {
            SubmitError::RateLimited { suggested_wait, .. } => {
                assert_eq!(suggested_wait, None);
            },
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }
}
