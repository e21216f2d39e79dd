//! Locators for the computer database pages
//!
//! Every selector the harness touches is defined here and nowhere else, so
//! the contract with the application has a single place to change when its
//! markup does.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// Visible text, matched the way Playwright's unquoted `text=` engine
    /// does: case-insensitive, whitespace-normalised substring, first hit.
    Text(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text(label: impl Into<String>) -> Self {
        Locator::Text(label.into())
    }

    /// Selector string in Playwright's selector syntax
    pub fn to_playwright(&self) -> String {
        match self {
            Locator::Css(css) => css.clone(),
            Locator::Text(text) => format!("text={}", text),
        }
    }

    /// Whether `visible` would be matched by this locator if it were a text
    /// locator. CSS locators never match on text.
    pub fn matches_text(&self, visible: &str) -> bool {
        match self {
            Locator::Css(_) => false,
            Locator::Text(label) => {
                let needle = normalise(label).to_lowercase();
                !needle.is_empty() && normalise(visible).to_lowercase().contains(&needle)
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_playwright())
    }
}

fn normalise(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Filter-by-name text input
pub fn filter_input() -> Locator {
    Locator::css(r#"input[name="f"]"#)
}

/// Button submitting the name filter
pub fn filter_submit() -> Locator {
    Locator::text("Filter by name")
}

/// Link cells of the results table, one per listed computer
pub fn result_links() -> Locator {
    Locator::css("tbody tr td a")
}

/// Flash banner shown after a successful create
pub fn warning_alert() -> Locator {
    Locator::css(".alert-message.warning")
}

/// Submit button of the new-computer form
pub fn form_submit() -> Locator {
    Locator::css(r#"input[type="submit"]"#)
}

/// Fields of the new-computer form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Introduced,
    Discontinued,
    Company,
}

impl FormField {
    pub fn input_name(self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Introduced => "introduced",
            FormField::Discontinued => "discontinued",
            FormField::Company => "company",
        }
    }

    /// `company` is a `<select>`, the others are text inputs
    pub fn is_select(self) -> bool {
        matches!(self, FormField::Company)
    }

    pub fn locator(self) -> Locator {
        let tag = if self.is_select() { "select" } else { "input" };
        Locator::css(format!(r#"{}[name="{}"]"#, tag, self.input_name()))
    }
}
