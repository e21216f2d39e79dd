//! Computer Database E2E Harness
//!
//! Browser tests for the computer database sample application. This crate:
//! - Wraps a page automation capability behind the [`Page`] trait
//! - Drives Playwright through a long-lived Node.js bridge per page
//! - Offers named harness actions and assertions (filter, click a label,
//!   URL and list checks)
//! - Runs declarative YAML scenarios, each on its own isolated page
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ScenarioRunner (Rust)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)  ──steps──▶  Harness  ──primitives──▶ Page │
//! │    ├── filter_by_name { name }        │                     │
//! │    ├── click_by_label { label }       ├── goto / fill       │
//! │    ├── fill_new_computer / submit     ├── click / select    │
//! │    ├── assert_url { expect }          ├── query_all / text  │
//! │    ├── assert_filtered_list           └── current_url       │
//! │    └── assert_alert { text }                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightBrowser ──new_page()──▶ node bridge.js (JSONL)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod locator;
pub mod page;
pub mod playwright;
pub mod probe;
pub mod runner;
pub mod scenario;
pub mod target;

pub use config::RunnerConfig;
pub use error::{E2eError, E2eResult};
pub use harness::{Harness, NewComputer};
pub use locator::Locator;
pub use page::{Browser, ElementRef, Page};
pub use runner::{ScenarioResult, ScenarioRunner, SuiteResult};
pub use scenario::{Scenario, Step};
pub use target::TargetUrl;
