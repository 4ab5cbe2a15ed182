//! Database row model for the `classes` table.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::domain::{ClassDetails, ClassStatus, ClassUri, Event, UserId};
use crate::error::NotifyError;

/// Column list shared by every `SELECT` on `classes`, in [`ClassRow`] order.
pub const CLASS_COLUMNS: &str = "uri, subscribers, name, description, status, \
     seats_total, seats_remaining, waitlist_total, waitlist_remaining, created_at, checked_at";

/// A row of the `classes` table, as decoded by `sqlx::query_as`.
pub type ClassRow = (
    String,
    Vec<String>,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// Converts a row into an [`Event`].
///
/// # Errors
///
/// Returns [`NotifyError::Query`] if a column holds a value the domain
/// model cannot represent (unknown status, negative count, empty id).
pub fn into_event(row: ClassRow) -> Result<Event, NotifyError> {
    let (
        uri,
        subscribers,
        name,
        description,
        status,
        seats_total,
        seats_remaining,
        waitlist_total,
        waitlist_remaining,
        created_at,
        checked_at,
    ) = row;

    let uri = ClassUri::parse(&uri).map_err(corrupt)?;
    let status: ClassStatus = status.parse().map_err(corrupt)?;
    let subscribers = subscribers
        .iter()
        .map(|s| UserId::parse(s))
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(corrupt)?;

    Ok(Event {
        uri,
        subscribers,
        details: ClassDetails {
            name,
            description,
            status,
            seats_total: count(seats_total)?,
            seats_remaining: count(seats_remaining)?,
            waitlist_total: count(waitlist_total)?,
            waitlist_remaining: count(waitlist_remaining)?,
        },
        created_at,
        checked_at,
    })
}

fn count(value: i64) -> Result<u32, NotifyError> {
    u32::try_from(value).map_err(|_| NotifyError::Query(format!("invalid stored count {value}")))
}

fn corrupt(err: NotifyError) -> NotifyError {
    NotifyError::Query(format!("corrupt class row: {err}"))
}
