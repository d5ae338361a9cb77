//! Cache Entry Module
//!
//! Defines the stored HTTP response and its `date`-header based staleness.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use chrono::{DateTime, NaiveDateTime, Utc};

/// IMF-fixdate layout used by the `date` header.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// == Cached Response ==
/// A full HTTP response as held in a cache partition or returned by the network.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers, including `date` when the origin sent one
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl CachedResponse {
    // == Constructor ==
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a response with a `content-type` header.
    pub fn with_body(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(status, body).with_header(header::CONTENT_TYPE, content_type)
    }

    /// Sets a header, silently ignoring values that are not valid header text.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Stamps the `date` header with the given instant.
    pub fn with_date(self, date: DateTime<Utc>) -> Self {
        self.with_header(header::DATE, &format_http_date(date))
    }

    // == Date ==
    /// Returns the storage timestamp carried by the `date` header.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.headers
            .get(header::DATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date)
    }

    // == Is Expired ==
    /// Checks whether the response is older than `max_age` at `now`.
    ///
    /// A response is fresh while strictly younger than `max_age`. Responses
    /// without a usable `date` header never expire.
    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match self.date() {
            Some(date) => {
                let age_ms = (now - date).num_milliseconds();
                age_ms >= 0 && age_ms as u128 >= max_age.as_millis()
            }
            None => false,
        }
    }

    /// True for 2xx statuses, the only ones written to a partition.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Approximate storage footprint: body plus header bytes.
    pub fn size(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        self.body.len() + headers
    }
}

// == Utility Functions ==
/// Formats an instant as an HTTP `date` header value.
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format(HTTP_DATE_FORMAT).to_string()
}

/// Parses an HTTP `date` header value.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
