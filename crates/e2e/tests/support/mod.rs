//! In-memory stand-in for the computer database application
//!
//! Renders just enough of the list page and the new-computer form to honour
//! the same URL contract as the hosted instance: `p` for the page, `f` for
//! the filter, `/new` for the form.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdb_e2e::locator::{self, FormField};
use cdb_e2e::{Browser, E2eError, E2eResult, ElementRef, Locator, Page};
use url::form_urlencoded::byte_serialize;
use url::Url;

pub const BASE: &str = "http://computers.test/computers";
pub const PAGE_SIZE: usize = 10;
pub const COMPANIES: [&str; 4] = ["Apple Inc.", "IBM", "Commodore International", "Sony"];

/// Catalogue sorted by name, like the hosted instance
pub fn catalogue() -> Vec<String> {
    let mut names: Vec<String> = [
        "ACE",
        "AN/FSQ-7",
        "ASCI Blue Mountain",
        "ASCI Red",
        "ASCI White",
        "Amiga 500",
        "Amstrad CPC 464",
        "Atari ST",
        "BBC Micro",
        "Commodore 64",
        "IBM PC",
        "IBM PS/2",
        "MacBook Pro (Apple)",
        "Sinclair ZX Spectrum",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for model in [
        "I", "II", "II Plus", "IIc", "IIe", "IIGS", "III", "Lisa", "Macintosh", "Macintosh Plus",
        "Macintosh SE", "Newton", "PowerBook", "Power Mac G4", "Power Mac G5", "eMac",
        "iMac", "Mac mini",
    ] {
        names.push(format!("Apple {}", model));
    }
    for n in 1..=20 {
        names.push(format!("Machine {:03}", n));
    }
    names.sort();
    names
}

#[derive(Debug, Clone, PartialEq)]
enum View {
    List { page: usize, filter: Option<String> },
    NewForm,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
enum Control {
    AddNew,
    FilterButton,
    Row(usize),
    Previous,
    Next,
    Submit,
    Cancel,
}

/// One tab on the fake application; state dies with the page
pub struct FakePage {
    computers: Vec<String>,
    url: String,
    view: View,
    inputs: HashMap<String, String>,
    alert: Option<String>,
    latency: Duration,
    open_pages: Arc<AtomicUsize>,
    pub history: Vec<String>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::with_counter(Arc::new(AtomicUsize::new(0)), Duration::ZERO)
    }

    fn with_counter(open_pages: Arc<AtomicUsize>, latency: Duration) -> Self {
        open_pages.fetch_add(1, Ordering::SeqCst);
        Self {
            computers: catalogue(),
            url: "about:blank".to_string(),
            view: View::Other,
            inputs: HashMap::new(),
            alert: None,
            latency,
            open_pages,
            history: Vec::new(),
        }
    }

    pub fn computers(&self) -> &[String] {
        &self.computers
    }

    fn filtered(&self, filter: Option<&str>) -> Vec<&String> {
        self.computers
            .iter()
            .filter(|name| match filter {
                Some(f) => name.to_lowercase().contains(&f.to_lowercase()),
                None => true,
            })
            .collect()
    }

    fn visible_rows(&self) -> Vec<String> {
        match &self.view {
            View::List { page, filter } => self
                .filtered(filter.as_deref())
                .into_iter()
                .skip(page * PAGE_SIZE)
                .take(PAGE_SIZE)
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Clickable elements with their visible text, in document order
    fn controls(&self) -> Vec<(Control, String)> {
        match &self.view {
            View::List { page, filter } => {
                let mut controls = vec![
                    (Control::AddNew, "Add a new computer".to_string()),
                    (Control::FilterButton, "Filter by name".to_string()),
                ];
                for (i, name) in self.visible_rows().into_iter().enumerate() {
                    controls.push((Control::Row(i), name));
                }
                if *page > 0 {
                    controls.push((Control::Previous, "← Previous".to_string()));
                }
                let total = self.filtered(filter.as_deref()).len();
                if (page + 1) * PAGE_SIZE < total {
                    controls.push((Control::Next, "Next →".to_string()));
                }
                controls
            }
            View::NewForm => vec![
                (Control::Submit, "Create this computer".to_string()),
                (Control::Cancel, "Cancel".to_string()),
            ],
            View::Other => Vec::new(),
        }
    }

    fn inputs_here(&self) -> Vec<&'static str> {
        match self.view {
            View::List { .. } => vec!["f"],
            View::NewForm => vec![
                FormField::Name.input_name(),
                FormField::Introduced.input_name(),
                FormField::Discontinued.input_name(),
            ],
            View::Other => Vec::new(),
        }
    }

    fn list_href(&self, page: usize, filter: Option<&str>) -> String {
        match filter {
            Some(f) => format!("{}?p={}&f={}", BASE, page, encode(f)),
            None if page == 0 => BASE.to_string(),
            None => format!("{}?p={}", BASE, page),
        }
    }

    fn load(&mut self, url: &str) -> E2eResult<()> {
        let parsed = Url::parse(url)
            .map_err(|e| E2eError::Bridge(format!("net::ERR_INVALID_URL {}: {}", url, e)))?;
        let base = Url::parse(BASE).expect("static base url");
        if parsed.host_str() != base.host_str() {
            return Err(E2eError::Timeout(format!("navigating to {}", url)));
        }

        self.view = if parsed.path() == base.path() {
            let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
            View::List {
                page: query.get("p").and_then(|p| p.parse().ok()).unwrap_or(0),
                filter: query.get("f").filter(|f| !f.is_empty()).cloned(),
            }
        } else if parsed.path() == format!("{}/new", base.path()) {
            View::NewForm
        } else {
            View::Other
        };
        self.url = url.to_string();
        self.inputs.clear();
        self.alert = None;
        self.history.push(url.to_string());
        Ok(())
    }

    fn submit(&mut self) -> E2eResult<()> {
        let name = self.inputs.get("name").cloned().unwrap_or_default();
        if name.trim().is_empty() {
            // The form re-renders with a validation error; the URL stays put
            return Ok(());
        }
        self.computers.push(name.clone());
        self.computers.sort();
        self.load(BASE)?;
        self.alert = Some(format!("Done ! Computer {} has been created", name));
        Ok(())
    }

    fn activate(&mut self, control: Control) -> E2eResult<()> {
        if control == Control::Submit {
            return self.submit();
        }
        let href = match (&control, &self.view) {
            (Control::AddNew, _) => format!("{}/new", BASE),
            (Control::FilterButton, _) => {
                let term = self.inputs.get("f").cloned().unwrap_or_default();
                format!("{}?f={}", BASE, encode(&term))
            }
            (Control::Row(i), _) => format!("{}/{}", BASE, i + 1),
            (Control::Previous, View::List { page, filter }) => {
                self.list_href(page - 1, filter.as_deref())
            }
            (Control::Next, View::List { page, filter }) => {
                self.list_href(page + 1, filter.as_deref())
            }
            (Control::Cancel, _) => BASE.to_string(),
            (other, view) => {
                return Err(E2eError::Bridge(format!("{:?} is not on {:?}", other, view)))
            }
        };
        self.load(&href)
    }

    async fn settle(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Drop for FakePage {
    fn drop(&mut self) {
        self.open_pages.fetch_sub(1, Ordering::SeqCst);
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn css_input_name(css: &str) -> Option<&str> {
    css.strip_prefix("input[name=\"")
        .or_else(|| css.strip_prefix("select[name=\""))?
        .strip_suffix("\"]")
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.settle().await;
        self.load(url)
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        let name = match locator {
            Locator::Css(css) => css_input_name(css),
            Locator::Text(_) => None,
        };
        match name {
            Some(name) if self.inputs_here().iter().any(|n| *n == name) => {
                self.inputs.insert(name.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(E2eError::Timeout(format!("fill {}", locator))),
        }
    }

    async fn select_option(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        if *locator != FormField::Company.locator() || self.view != View::NewForm {
            return Err(E2eError::Timeout(format!("select {}", locator)));
        }
        if !COMPANIES.contains(&value) {
            return Err(E2eError::Timeout(format!("option {:?} of {}", value, locator)));
        }
        self.inputs.insert("company".to_string(), value.to_string());
        Ok(())
    }

    async fn click(&mut self, target: &Locator) -> E2eResult<()> {
        self.settle().await;
        let control = match target {
            Locator::Css(_) if *target == locator::form_submit() && self.view == View::NewForm => {
                Some(Control::Submit)
            }
            Locator::Css(_) => None,
            Locator::Text(_) => self
                .controls()
                .into_iter()
                .find(|(_, text)| target.matches_text(text))
                .map(|(control, _)| control),
        };
        match control {
            Some(control) => self.activate(control),
            None => Err(E2eError::LocatorNotFound(target.to_string())),
        }
    }

    async fn query_all(&mut self, target: &Locator) -> E2eResult<Vec<ElementRef>> {
        let count = if *target == locator::result_links() {
            self.visible_rows().len()
        } else if *target == locator::warning_alert() {
            usize::from(self.alert.is_some())
        } else if let Locator::Text(_) = target {
            self.controls().iter().filter(|(_, t)| target.matches_text(t)).count()
        } else {
            0
        };
        Ok((0..count)
            .map(|index| ElementRef { locator: target.clone(), index })
            .collect())
    }

    async fn inner_text(&mut self, element: &ElementRef) -> E2eResult<String> {
        let texts: Vec<String> = if element.locator == locator::result_links() {
            self.visible_rows()
        } else if element.locator == locator::warning_alert() {
            self.alert.iter().cloned().collect()
        } else {
            self.controls()
                .into_iter()
                .map(|(_, t)| t)
                .filter(|t| element.locator.matches_text(t))
                .collect()
        };
        texts
            .get(element.index)
            .cloned()
            .ok_or_else(|| E2eError::LocatorNotFound(format!("{} #{}", element.locator, element.index)))
    }

    fn current_url(&self) -> &str {
        &self.url
    }

    async fn close(&mut self) -> E2eResult<()> {
        Ok(())
    }
}

/// Hands out fresh fake pages and tracks how many are alive
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub open_pages: Arc<AtomicUsize>,
    pub max_open: Arc<AtomicUsize>,
    pub launched: Arc<AtomicUsize>,
    pub latency: Duration,
}

impl FakeBrowser {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        let page = FakePage::with_counter(self.open_pages.clone(), self.latency);
        self.max_open
            .fetch_max(self.open_pages.load(Ordering::SeqCst), Ordering::SeqCst);
        Ok(Box::new(page))
    }
}

/// A browser whose pages can never be created
pub struct UnavailableBrowser;

#[async_trait]
impl Browser for UnavailableBrowser {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        Err(E2eError::PlaywrightNotFound)
    }
}

/// Pages whose automation process is already gone
pub struct DeadBridgeBrowser;

struct DeadPage;

#[async_trait]
impl Page for DeadPage {
    async fn goto(&mut self, _url: &str) -> E2eResult<()> {
        Err(E2eError::Bridge("bridge exited".into()))
    }

    async fn fill(&mut self, _locator: &Locator, _value: &str) -> E2eResult<()> {
        Err(E2eError::Bridge("bridge exited".into()))
    }

    async fn select_option(&mut self, _locator: &Locator, _value: &str) -> E2eResult<()> {
        Err(E2eError::Bridge("bridge exited".into()))
    }

    async fn click(&mut self, _locator: &Locator) -> E2eResult<()> {
        Err(E2eError::Bridge("bridge exited".into()))
    }

    async fn query_all(&mut self, _locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        Err(E2eError::Bridge("bridge exited".into()))
    }

    async fn inner_text(&mut self, _element: &ElementRef) -> E2eResult<String> {
        Err(E2eError::Bridge("bridge exited".into()))
    }

    fn current_url(&self) -> &str {
        ""
    }

    async fn close(&mut self) -> E2eResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Browser for DeadBridgeBrowser {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        Ok(Box::new(DeadPage))
    }
}
