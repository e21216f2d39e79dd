//! Scenario runner: one fresh page per scenario, first failure ends it

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::error::{E2eError, E2eResult};
use crate::harness::Harness;
use crate::page::{Browser, Page};
use crate::scenario::{Scenario, Step};

/// Result of executing a scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,

    /// The step ended on an error outside the page under test (bridge died,
    /// invalid input) rather than a missing element, mismatch or timeout
    #[serde(default)]
    pub aborted: bool,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,

    /// Failed for a reason other than the application's behaviour
    #[serde(default)]
    pub aborted: bool,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub struct ScenarioRunner {
    config: RunnerConfig,
    harness: Harness,
    browser: Box<dyn Browser>,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig, browser: Box<dyn Browser>) -> Self {
        let harness = Harness::new(config.target.clone());
        Self {
            config,
            harness,
            browser,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Built-in scenarios followed by any found in `scenarios_dir`
    pub fn load_scenarios(&self) -> E2eResult<Vec<Scenario>> {
        let mut scenarios = Scenario::builtin()?;
        if let Some(dir) = &self.config.scenarios_dir {
            scenarios.extend(Scenario::load_all(dir)?);
        }
        Ok(scenarios)
    }

    /// Keep scenarios carrying `tag` and/or named exactly `name`
    pub fn select(scenarios: Vec<Scenario>, tag: Option<&str>, name: Option<&str>) -> Vec<Scenario> {
        let tagged = match tag {
            Some(tag) => Scenario::filter_by_tag(&scenarios, tag)
                .into_iter()
                .cloned()
                .collect(),
            None => scenarios,
        };
        tagged
            .into_iter()
            .filter(|s| name.map_or(true, |n| s.name == n))
            .collect()
    }

    /// Run scenarios, at most `concurrency` at a time. Results keep the
    /// input order.
    pub async fn run_all(&self, scenarios: &[Scenario]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            "Running {} scenario(s) against {} ...",
            scenarios.len(),
            self.config.target
        );

        let results: Vec<ScenarioResult> = stream::iter(scenarios)
            .map(|scenario| self.run_isolated(scenario))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        SuiteResult {
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }

    async fn run_isolated(&self, scenario: &Scenario) -> ScenarioResult {
        let result = match self.run_scenario(scenario).await {
            Ok(result) => result,
            Err(e) => ScenarioResult {
                name: scenario.name.clone(),
                success: false,
                duration_ms: 0,
                steps: vec![],
                aborted: !e.is_scenario_failure(),
                error: Some(e.to_string()),
            },
        };

        if result.success {
            info!("✓ {} ({} ms)", result.name, result.duration_ms);
        } else if result.aborted {
            error!(
                "✗ {} aborted - {}",
                result.name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        } else {
            warn!(
                "✗ {} - {}",
                result.name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        result
    }

    /// Run one scenario on a fresh page. Only failing to obtain a page is an
    /// `Err`; step failures end up in the result.
    pub async fn run_scenario(&self, scenario: &Scenario) -> E2eResult<ScenarioResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let mut page = self.browser.new_page().await?;
        let mut steps = Vec::with_capacity(scenario.steps.len() + 1);

        let open = Step::Navigate { path: String::new() };
        let mut scenario_error = None;
        let mut aborted = false;
        for step in std::iter::once(&open).chain(&scenario.steps) {
            let result = self.execute_step(page.as_mut(), step).await;
            let failed = result.error.clone();
            aborted = result.aborted;
            steps.push(result);
            if failed.is_some() {
                scenario_error = failed;
                break;
            }
        }

        if let Err(e) = page.close().await {
            warn!("Closing page for {} failed: {}", scenario.name, e);
        }

        Ok(ScenarioResult {
            name: scenario.name.clone(),
            success: scenario_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: scenario_error,
            aborted,
        })
    }

    async fn execute_step(&self, page: &mut dyn Page, step: &Step) -> StepResult {
        let start = Instant::now();
        let name = step.describe();
        debug!("Executing step: {}", name);

        let outcome = self.apply(page, step).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        StepResult {
            success: outcome.is_ok(),
            aborted: outcome
                .as_ref()
                .err()
                .map_or(false, |e: &E2eError| !e.is_scenario_failure()),
            error: outcome.err().map(|e| format!("{}: {}", name, e)),
            step: name,
            duration_ms,
        }
    }

    async fn apply(&self, page: &mut dyn Page, step: &Step) -> E2eResult<()> {
        let harness = &self.harness;
        match step {
            Step::Navigate { path } => harness.goto_path(page, path).await,
            Step::FilterByName { name } => harness.filter_by_name(page, name).await,
            Step::ClickByLabel { label } => harness.click_by_label(page, label).await,
            Step::FillNewComputer { computer } => harness.fill_new_computer(page, computer).await,
            Step::Submit => harness.submit_form(page).await,
            Step::AssertUrl { expect } => {
                harness.assert_url(&*page, &expect.resolve(harness.target()))
            }
            Step::AssertFilteredList { contains } => {
                harness.assert_filtered_list(page, contains).await
            }
            Step::AssertAlert { text } => harness.assert_alert_text(page, text).await,
            Step::Log { message } => {
                info!("[SCENARIO LOG] {}", message);
                Ok(())
            }
        }
    }

    /// Write suite results to JSON in the output directory
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
