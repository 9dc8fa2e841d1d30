//! Builders for the typed values the current API expects in request bodies.
//!
//! Megaplan wraps dates, intervals and references to other objects in small
//! objects tagged with a `contentType`. These helpers produce them as
//! [`QueryParams`], so they follow the same JSON encoding rule as any other
//! parameter.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::query::{QueryParams, QueryValue};

/// Date-time layout used by the API (`2006-01-02T15:04:05-07:00`).
pub const ISO8601: &str = "%Y-%m-%dT%H:%M:%S%:z";

pub const CONTENT_TYPE_DATE_ONLY: &str = "DateOnly";
pub const CONTENT_TYPE_DATE_TIME: &str = "DateTime";
pub const CONTENT_TYPE_DATE_INTERVAL: &str = "DateInterval";

/// A calendar date as the API encodes it. `month` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateOnly {
    pub content_type: DateOnlyTag,
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

/// Marker serialized as `"DateOnly"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateOnlyTag {
    #[default]
    DateOnly,
}

impl DateOnly {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            content_type: DateOnlyTag::DateOnly,
            day: date.day(),
            month: date.month0(),
            year: date.year(),
        }
    }

    /// The calendar date, or `None` if the fields do not form a valid date.
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.checked_add(1)?, self.day)
    }
}

impl From<DateOnly> for QueryParams {
    fn from(d: DateOnly) -> Self {
        QueryParams::new()
            .with("contentType", CONTENT_TYPE_DATE_ONLY)
            .with("year", d.year)
            .with("month", d.month)
            .with("day", d.day)
    }
}

/// `{"contentType": "DateOnly", "year", "month" (zero-based), "day"}`.
pub fn date_only(date: NaiveDate) -> QueryParams {
    DateOnly::from_date(date).into()
}

/// `{"contentType": "DateTime", "value": "<ISO8601>"}`.
pub fn date_time<Tz: TimeZone>(at: &DateTime<Tz>) -> QueryParams
where
    Tz::Offset: std::fmt::Display,
{
    QueryParams::new()
        .with("contentType", CONTENT_TYPE_DATE_TIME)
        .with("value", at.format(ISO8601).to_string())
}

/// `{"contentType": "DateInterval", "value": <seconds>}`.
///
/// The API counts intervals in whole seconds.
pub fn date_interval(interval: std::time::Duration) -> QueryParams {
    QueryParams::new()
        .with("contentType", CONTENT_TYPE_DATE_INTERVAL)
        .with("value", interval.as_secs())
}

/// Reference to another object: `{"contentType": ..., "id": ...}`.
pub fn entity_ref(content_type: &str, id: impl Into<QueryValue>) -> QueryParams {
    QueryParams::new()
        .with("contentType", content_type)
        .with("id", id)
}

impl QueryParams {
    /// Set `field` to an entity object built by one of this module's helpers.
    pub fn with_entity(self, field: impl Into<String>, entity: QueryParams) -> Self {
        self.with(field, entity)
    }

    /// Set `field` to an array of entities (e.g. a task's auditors).
    /// An empty list leaves the mapping untouched.
    pub fn with_entity_array(
        self,
        field: impl Into<String>,
        entities: impl IntoIterator<Item = QueryParams>,
    ) -> Self {
        let items: Vec<QueryValue> = entities.into_iter().map(QueryValue::Map).collect();
        if items.is_empty() {
            return self;
        }
        self.with(field, QueryValue::List(items))
    }
}

/// One deferred field assignment, applied by [`build_query_params`].
pub type FieldSetter = Box<dyn FnOnce(&mut QueryParams) + Send>;

/// Set `field` to a plain value.
pub fn set_raw_field(field: impl Into<String>, value: impl Into<QueryValue>) -> FieldSetter {
    let (field, value) = (field.into(), value.into());
    Box::new(move |params: &mut QueryParams| params.insert(field, value))
}

/// Set `field` to an entity object.
pub fn set_entity_field(field: impl Into<String>, entity: QueryParams) -> FieldSetter {
    let field = field.into();
    Box::new(move |params: &mut QueryParams| params.insert(field, entity))
}

/// Set `field` to an array of entities. No-op for an empty list.
pub fn set_entity_array(field: impl Into<String>, entities: Vec<QueryParams>) -> FieldSetter {
    let field = field.into();
    Box::new(move |params: &mut QueryParams| {
        if !entities.is_empty() {
            params.insert(field, QueryValue::List(entities.into_iter().map(QueryValue::Map).collect()));
        }
    })
}

/// Apply the setters in order to a fresh mapping. Later setters win.
pub fn build_query_params(setters: impl IntoIterator<Item = FieldSetter>) -> QueryParams {
    let mut params = QueryParams::new();
    for set in setters {
        set(&mut params);
    }
    params
}
