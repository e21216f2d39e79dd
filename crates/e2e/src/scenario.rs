//! Declarative YAML scenarios
//!
//! A scenario is a named list of harness steps. The runner always opens a
//! fresh page on the target before the first step, so scenarios start from
//! the unfiltered first page.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::harness::NewComputer;
use crate::target::TargetUrl;

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for selecting scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a path relative to the target (empty = the target)
    Navigate {
        #[serde(default)]
        path: String,
    },

    /// Fill the name filter and submit it
    FilterByName { name: String },

    /// Click the first element showing this text
    ClickByLabel { label: String },

    /// Fill the new-computer form
    FillNewComputer { computer: NewComputer },

    /// Submit the new-computer form
    Submit,

    /// Compare the current URL with an expected state
    AssertUrl { expect: UrlExpectation },

    /// Every result link contains this text
    AssertFilteredList { contains: String },

    /// The warning banner reads exactly this text
    AssertAlert { text: String },

    /// Log a message (for debugging)
    Log { message: String },
}

/// Expected URL, expressed against the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlExpectation {
    Named(NamedUrl),
    Raw(RawUrl),
    Query(QueryUrl),
}

/// A literal URL, absolute or relative to the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawUrl {
    pub raw: String,
}

/// The list page with the given query parameters; at least one is required
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryUrl {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedUrl {
    Base,
    NewForm,
}

impl UrlExpectation {
    pub fn resolve(&self, target: &TargetUrl) -> String {
        match self {
            UrlExpectation::Named(NamedUrl::Base) => target.base().to_string(),
            UrlExpectation::Named(NamedUrl::NewForm) => target.new_form(),
            UrlExpectation::Raw(RawUrl { raw }) if raw.contains("://") => raw.clone(),
            UrlExpectation::Raw(RawUrl { raw }) => target.join(raw),
            UrlExpectation::Query(QueryUrl { page, filter }) => match (page, filter) {
                (None, None) => target.base().to_string(),
                (Some(n), None) => target.page(*n),
                (None, Some(term)) => target.filtered(term),
                (Some(n), Some(term)) => target.filtered_page(*n, term),
            },
        }
    }
}

impl Step {
    /// Short label used in logs and step results
    pub fn describe(&self) -> String {
        match self {
            Step::Navigate { path } => format!("navigate:{}", path),
            Step::FilterByName { name } => format!("filter_by_name:{}", name),
            Step::ClickByLabel { label } => format!("click_by_label:{}", label),
            Step::FillNewComputer { computer } => format!("fill_new_computer:{}", computer.name),
            Step::Submit => "submit".to_string(),
            Step::AssertUrl { expect } => format!("assert_url:{:?}", expect),
            Step::AssertFilteredList { contains } => format!("assert_filtered_list:{}", contains),
            Step::AssertAlert { .. } => "assert_alert".to_string(),
            Step::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

const BUILTIN: [(&str, &str); 5] = [
    ("pagination.yaml", include_str!("../scenarios/pagination.yaml")),
    ("filter.yaml", include_str!("../scenarios/filter.yaml")),
    ("filter-pagination.yaml", include_str!("../scenarios/filter-pagination.yaml")),
    ("add-computer.yaml", include_str!("../scenarios/add-computer.yaml")),
    ("add-computer-cancel.yaml", include_str!("../scenarios/add-computer-cancel.yaml")),
];

impl Scenario {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, ordered by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// The scenarios shipped with the crate
    pub fn builtin() -> E2eResult<Vec<Self>> {
        BUILTIN
            .iter()
            .map(|(file, yaml)| {
                Self::from_yaml(yaml).map_err(|e| E2eError::SpecParse(format!("{}: {}", file, e)))
            })
            .collect()
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("scenario name is empty".into()));
        }
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("scenario {} has no steps", self.name)));
        }
        for step in &self.steps {
            match step {
                Step::FilterByName { name } if name.is_empty() => {
                    return Err(E2eError::SpecParse(format!(
                        "scenario {}: filter_by_name needs a non-empty name",
                        self.name
                    )));
                }
                Step::AssertUrl {
                    expect: UrlExpectation::Query(QueryUrl { page: None, filter: None }),
                } => {
                    return Err(E2eError::SpecParse(format!(
                        "scenario {}: assert_url needs page or filter (use `base` for the bare list)",
                        self.name
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
