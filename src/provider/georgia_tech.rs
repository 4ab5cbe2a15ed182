//! Georgia Tech (Banner detail schedule page) status provider.
//!
//! The class page renders a title row followed by a "Registration
//! Availability" table with `Seats` and `Waitlist Seats` rows, each holding
//! capacity, actual, and remaining counts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::StatusProvider;
use super::html;
use crate::domain::{ClassDetails, ClassUri, SeatCounts};
use crate::error::NotifyError;

const SEATS_LABEL: &str = "seats";
const WAITLIST_LABEL: &str = "waitlist seats";

/// Scrapes Georgia Tech Banner class detail pages.
#[derive(Debug, Clone)]
pub struct GeorgiaTech {
    client: reqwest::Client,
}

impl GeorgiaTech {
    /// School identifier used in the provider registry.
    pub const SCHOOL: &'static str = "georgia_tech";

    /// Creates a provider whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Internal`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("class-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifyError::Internal(format!("building http client: {e}")))?;
        Ok(Self { client })
    }

    /// Parses a class detail page into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Parse`] if the title or a seat count is
    /// missing or not a number.
    pub fn parse_detail_page(page: &str) -> Result<ClassDetails, NotifyError> {
        let name = html::first_th_with_class(page, "ddlabel")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| NotifyError::Parse("class title not found".to_string()))?;

        let rows = html::rows(page);
        let seats = counts(&rows, SEATS_LABEL)?;
        let waitlist = counts(&rows, WAITLIST_LABEL)?;

        Ok(ClassDetails::from_counts(name, seats, waitlist))
    }

    fn validate(uri: &ClassUri) -> Result<Url, NotifyError> {
        let url =
            Url::parse(uri.as_str()).map_err(|e| NotifyError::InvalidUri(format!("{uri}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidUri(format!(
                "{uri}: unsupported scheme {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(NotifyError::InvalidUri(format!("{uri}: missing host")));
        }
        Ok(url)
    }
}

/// Reads capacity and actual counts from the row labelled `label`.
fn counts(rows: &[html::Row], label: &str) -> Result<SeatCounts, NotifyError> {
    let row = rows
        .iter()
        .find(|row| row.label.eq_ignore_ascii_case(label))
        .ok_or_else(|| NotifyError::Parse(format!("{label} row not found")))?;
    let capacity = number(row.cells.first(), label, "capacity")?;
    let used = number(row.cells.get(1), label, "actual")?;
    Ok(SeatCounts::new(capacity, used))
}

fn number(cell: Option<&String>, label: &str, column: &str) -> Result<u32, NotifyError> {
    let text = cell.ok_or_else(|| NotifyError::Parse(format!("{label} {column} cell missing")))?;
    text.trim().parse().map_err(|e| {
        NotifyError::Parse(format!(
            "could not convert {label} {column} text {text:?} to a number: {e}"
        ))
    })
}

#[async_trait]
impl StatusProvider for GeorgiaTech {
    fn school(&self) -> &'static str {
        Self::SCHOOL
    }

    async fn fetch_status(&self, uri: &ClassUri) -> Result<ClassDetails, NotifyError> {
        let url = Self::validate(uri)?;

        let page = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| NotifyError::Fetch(format!("getting {uri}: {e}")))?
            .text()
            .await
            .map_err(|e| NotifyError::Fetch(format!("reading body of {uri}: {e}")))?;

        let details = Self::parse_detail_page(&page)?;
        tracing::debug!(%uri, status = %details.status, "fetched class status");
        Ok(details)
    }
}
