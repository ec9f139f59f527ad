//! Typed errors: request failures from the HTTP client and config loading/validation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Env(String),
    #[error("config parse: {0}")]
    Parse(String),
    #[error("invalid url for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("duplicate {kind} key: {key}")]
    DuplicateKey { kind: &'static str, key: String },
    #[error("empty href for {kind} key: {key}")]
    EmptyHref { kind: &'static str, key: String },
}

/// The only runtime failure kind: a request did not produce a usable JSON body.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request failed: {method} {url} returned {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },
    #[error("request failed: invalid response body from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("request failed: cannot resolve url '{0}'")]
    Url(String),
    #[error("request failed: no application configured")]
    NoApplication,
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        RequestError::Transport(e.to_string())
    }
}
