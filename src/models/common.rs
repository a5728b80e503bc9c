use serde::{Deserialize, Serialize};

// Wire formats for calendar values
time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");
time::serde::format_description!(pub(crate) wall_time, Time, "[hour]:[minute]");

/// Success envelope paired with 2xx responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response for lightweight endpoints (e.g., deletes)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Half-open time range query `[from, to)`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeQuery {
    #[serde(with = "time::serde::rfc3339")]
    pub from: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: time::OffsetDateTime,
}

/// Inclusive date range query, both ends optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    #[serde(default, with = "iso_date::option")]
    pub from: Option<time::Date>,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<time::Date>,
}

/// Normalize an instant to UTC whole seconds, the precision classes are stored with
pub fn normalize_instant(at: time::OffsetDateTime) -> time::OffsetDateTime {
    at.to_offset(time::UtcOffset::UTC)
        .replace_nanosecond(0)
        .unwrap_or(at)
}
