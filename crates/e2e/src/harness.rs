//! Interaction harness
//!
//! Named, human-level actions on the computer database (filter, click a
//! labelled control, create a computer) and the assertions the scenarios
//! make afterwards. Each call is one awaited action; waiting for the page to
//! settle belongs to the [`Page`] implementation, so nothing here retries.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::{self, FormField, Locator};
use crate::page::Page;
use crate::target::TargetUrl;

/// Values for the new-computer form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComputer {
    pub name: String,
    #[serde(default)]
    pub introduced: Option<String>,
    #[serde(default)]
    pub discontinued: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl NewComputer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            introduced: None,
            discontinued: None,
            company: None,
        }
    }

    /// Banner text the application shows once this computer is created
    pub fn created_message(&self) -> String {
        format!("Done ! Computer {} has been created", self.name)
    }
}

/// Harness bound to one target; the page is always passed in explicitly
#[derive(Debug, Clone)]
pub struct Harness {
    target: TargetUrl,
}

impl Harness {
    pub fn new(target: TargetUrl) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &TargetUrl {
        &self.target
    }

    pub async fn goto_target<P: Page + ?Sized>(&self, page: &mut P) -> E2eResult<()> {
        debug!(url = %self.target, "goto target");
        page.goto(self.target.base()).await
    }

    pub async fn goto_path<P: Page + ?Sized>(&self, page: &mut P, path: &str) -> E2eResult<()> {
        let url = self.target.join(path);
        debug!(%url, "goto");
        page.goto(&url).await
    }

    /// Type `name` into the filter box and submit it
    pub async fn filter_by_name<P: Page + ?Sized>(&self, page: &mut P, name: &str) -> E2eResult<()> {
        if name.is_empty() {
            return Err(E2eError::InvalidInput("filter name must not be empty".into()));
        }
        debug!(name, "filter by name");
        page.fill(&locator::filter_input(), name).await?;
        page.click(&locator::filter_submit()).await
    }

    /// Click the first element whose visible text matches `label`
    pub async fn click_by_label<P: Page + ?Sized>(&self, page: &mut P, label: &str) -> E2eResult<()> {
        debug!(label, "click by label");
        page.click(&Locator::text(label)).await
    }

    /// Exact string comparison with the page's current URL
    pub fn assert_url<P: Page + ?Sized>(&self, page: &P, expected: &str) -> E2eResult<()> {
        let actual = page.current_url();
        debug!(expected, actual, "assert url");
        if actual == expected {
            Ok(())
        } else {
            Err(E2eError::assertion("url", expected, actual))
        }
    }

    /// Every result link must contain `expected` (case-sensitive). An empty
    /// result table passes.
    pub async fn assert_filtered_list<P: Page + ?Sized>(
        &self,
        page: &mut P,
        expected: &str,
    ) -> E2eResult<()> {
        let links = page.query_all(&locator::result_links()).await?;
        debug!(expected, rows = links.len(), "assert filtered list");
        for link in &links {
            let text = page.inner_text(link).await?;
            if !text.contains(expected) {
                return Err(E2eError::assertion(
                    format!("result row {}", link.index),
                    format!("text containing {:?}", expected),
                    text,
                ));
            }
        }
        Ok(())
    }

    /// Fill every provided field of the new-computer form
    pub async fn fill_new_computer<P: Page + ?Sized>(
        &self,
        page: &mut P,
        computer: &NewComputer,
    ) -> E2eResult<()> {
        debug!(name = %computer.name, "fill new computer form");
        let fields = [
            (FormField::Name, Some(&computer.name)),
            (FormField::Introduced, computer.introduced.as_ref()),
            (FormField::Discontinued, computer.discontinued.as_ref()),
            (FormField::Company, computer.company.as_ref()),
        ];
        for (field, value) in fields {
            let Some(value) = value else { continue };
            if field.is_select() {
                page.select_option(&field.locator(), value).await?;
            } else {
                page.fill(&field.locator(), value).await?;
            }
        }
        Ok(())
    }

    pub async fn submit_form<P: Page + ?Sized>(&self, page: &mut P) -> E2eResult<()> {
        debug!("submit form");
        page.click(&locator::form_submit()).await
    }

    /// The warning banner must read exactly `expected` (outer whitespace
    /// ignored)
    pub async fn assert_alert_text<P: Page + ?Sized>(
        &self,
        page: &mut P,
        expected: &str,
    ) -> E2eResult<()> {
        let alert = locator::warning_alert();
        let found = page.query_all(&alert).await?;
        let first = found
            .first()
            .ok_or_else(|| E2eError::LocatorNotFound(alert.to_string()))?;
        let text = page.inner_text(first).await?;
        debug!(expected, actual = %text, "assert alert text");
        if text.trim() == expected {
            Ok(())
        } else {
            Err(E2eError::assertion("alert", expected, text.trim()))
        }
    }
}
