//! Extra utilities for use elsewhere in the API.

use std::sync::OnceLock;

use regex::Regex;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use crate::error::{PickupError, PickupResult};

pub fn current_time() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Parses a path segment as an id. Anything that isn't a UUID can't name an
/// existing resource, so it is reported as missing rather than malformed.
pub fn parse_id(id: &str, missing: &str) -> PickupResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| PickupError::not_found(missing))
}

/// Parses an event date. The value must carry a time of day; RFC 3339 is
/// preferred, and offset-less `YYYY-MM-DDTHH:MM[:SS]` values are read as UTC.
pub fn parse_event_date(date: &str) -> Option<OffsetDateTime> {
    if !date.contains('T') {
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(date, &Rfc3339) {
        return Some(parsed);
    }

    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    PrimitiveDateTime::parse(date, &with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(date, &without_seconds))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

pub fn format_event_date(date: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday], [month repr:long] [day padding:none] at [hour repr:12 padding:none]:[minute] [period] UTC"
    );
    date.format(&format).unwrap_or_else(|_| date.to_string())
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@([A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+)$").expect("email pattern is valid")
    })
}

/// The lowercased domain of a well-formed email address.
pub fn email_domain(email: &str) -> Option<String> {
    email_pattern()
        .captures(email.trim())
        .and_then(|captures| captures.get(1))
        .map(|domain| domain.as_str().to_ascii_lowercase())
}

/// Treats missing and whitespace-only strings the same way.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
