//! The page automation contract the harness consumes
//!
//! Anything that can navigate, fill, click, enumerate elements and report
//! its URL can back a scenario: the Playwright bridge in production, an
//! in-memory application in tests.

use async_trait::async_trait;

use crate::error::E2eResult;
use crate::locator::Locator;

/// Handle to one element of a `query_all` result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub locator: Locator,
    pub index: usize,
}

/// One browser tab inside its own isolated context.
///
/// Every method returns once the engine considers the page settled; callers
/// never poll.
#[async_trait]
pub trait Page: Send {
    async fn goto(&mut self, url: &str) -> E2eResult<()>;

    /// Replace the content of the first matching input
    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()>;

    /// Choose an option of the first matching `<select>` by value or label
    async fn select_option(&mut self, locator: &Locator, value: &str) -> E2eResult<()>;

    /// Activate the first matching element and wait for any navigation
    async fn click(&mut self, locator: &Locator) -> E2eResult<()>;

    /// All elements currently matching, in document order. May be empty.
    async fn query_all(&mut self, locator: &Locator) -> E2eResult<Vec<ElementRef>>;

    /// Visible text of an element returned by `query_all`
    async fn inner_text(&mut self, element: &ElementRef) -> E2eResult<String>;

    /// URL of the page after the last settled action
    fn current_url(&self) -> &str;

    /// Release the browsing context
    async fn close(&mut self) -> E2eResult<()>;
}

/// Source of fresh isolated pages, one per scenario
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>>;
}
