//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Locator matched no element: {0}")]
    LocatorNotFound(String),

    #[error("Assertion failed on {what}: expected {expected:?}, got {actual:?}")]
    AssertionFailed {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright bridge error: {0}")]
    Bridge(String),

    #[error("Scenario parse error: {0}")]
    SpecParse(String),

    #[error("Target {url} unreachable after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Build an assertion failure from anything displayable.
    pub fn assertion(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        E2eError::AssertionFailed {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for the failures a scenario can produce against a live page:
    /// missing elements, mismatched observations and engine timeouts.
    pub fn is_scenario_failure(&self) -> bool {
        matches!(
            self,
            E2eError::LocatorNotFound(_) | E2eError::AssertionFailed { .. } | E2eError::Timeout(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
