//! The application under test and the URL states it exposes
//!
//! Pagination lives in the `p` query parameter, the name filter in `f`.
//! Expected URLs are built here so scenarios never concatenate strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

use crate::error::{E2eError, E2eResult};

/// Public instance of the computer database
pub const DEFAULT_TARGET_URL: &str = "https://computer-database.gatling.io/computers";

/// Base URL of the computer list, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn new(base: impl Into<String>) -> E2eResult<Self> {
        let base = base.into();
        let trimmed = base.trim().trim_end_matches('/');
        let parsed = url::Url::parse(trimmed)
            .map_err(|e| E2eError::Config(format!("invalid target url {:?}: {}", base, e)))?;
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(E2eError::Config(format!(
                "target url must not carry a query or fragment: {}",
                base
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn base(&self) -> &str {
        &self.0
    }

    /// Unfiltered list at page `n`; page 0 is the bare base URL
    pub fn page(&self, n: u32) -> String {
        if n == 0 {
            self.0.clone()
        } else {
            format!("{}?p={}", self.0, n)
        }
    }

    /// First page of the list filtered by `term`
    pub fn filtered(&self, term: &str) -> String {
        format!("{}?f={}", self.0, encode(term))
    }

    /// Filtered list at page `n`. Once a filter is active the application
    /// keeps `p` in the URL, including `p=0`.
    pub fn filtered_page(&self, n: u32, term: &str) -> String {
        format!("{}?p={}&f={}", self.0, n, encode(term))
    }

    /// The new-computer form
    pub fn new_form(&self) -> String {
        format!("{}/new", self.0)
    }

    /// Resolve a path relative to the base (`""` is the base itself)
    pub fn join(&self, path: &str) -> String {
        if path.is_empty() {
            self.0.clone()
        } else if path.starts_with('?') || path.starts_with('/') {
            format!("{}{}", self.0, path)
        } else {
            format!("{}/{}", self.0, path)
        }
    }
}

impl Default for TargetUrl {
    fn default() -> Self {
        Self(DEFAULT_TARGET_URL.to_string())
    }
}

impl TryFrom<String> for TargetUrl {
    type Error = E2eError;

    fn try_from(value: String) -> E2eResult<Self> {
        Self::new(value)
    }
}

impl From<TargetUrl> for String {
    fn from(value: TargetUrl) -> Self {
        value.0
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a query value the way a browser submits a GET form
pub fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}
