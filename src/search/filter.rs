//! Structured filters: category, tag set (AND) and date range

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Prompt;

/// Inclusive date range; either bound may be open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Filter specification; an absent key means no constraint for that dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl FilterSpec {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_date_range(mut self, start_date: Option<String>, end_date: Option<String>) -> Self {
        self.date_range = Some(DateRange { start_date, end_date });
        self
    }

    /// True when no dimension constrains anything
    pub fn is_unconstrained(&self) -> bool {
        self.category.as_deref().is_none_or(str::is_empty)
            && self.tags.as_ref().is_none_or(Vec::is_empty)
            && self
                .date_range
                .as_ref()
                .is_none_or(|r| bound(&r.start_date).is_none() && bound(&r.end_date).is_none())
    }
}

fn bound(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse an ISO 8601 timestamp: RFC 3339, zone-less date-time (UTC) or bare date (UTC midnight)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Last millisecond of the (UTC) day containing `instant`
fn end_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    let next_day = instant.date_naive().and_time(NaiveTime::MIN) + Duration::days(1);
    Utc.from_utc_datetime(&next_day) - Duration::milliseconds(1)
}

/// Resolved bounds, computed once per filter pass
#[derive(Debug, Clone, Copy, Default)]
struct ResolvedRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    active: bool,
}

impl ResolvedRange {
    fn resolve(range: Option<&DateRange>) -> Self {
        let Some(range) = range else {
            return Self::default();
        };

        let start_raw = bound(&range.start_date);
        let end_raw = bound(&range.end_date);

        let start = start_raw.and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!("Ignoring unparseable start date: {}", raw);
            }
            parsed
        });
        let end = end_raw.and_then(|raw| {
            let parsed = parse_timestamp(raw).map(end_of_day);
            if parsed.is_none() {
                warn!("Ignoring unparseable end date: {}", raw);
            }
            parsed
        });

        Self {
            start,
            end,
            active: start_raw.is_some() || end_raw.is_some(),
        }
    }

    fn admits(&self, prompt: &Prompt) -> bool {
        if !self.active {
            return true;
        }

        let Some(date) = prompt.effective_timestamp().and_then(parse_timestamp) else {
            return false;
        };

        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Apply `filters` to `prompts`, keeping the original order of survivors
pub fn apply_filters<'a>(prompts: &'a [Prompt], filters: &FilterSpec) -> Vec<&'a Prompt> {
    let category = filters.category.as_deref().filter(|c| !c.is_empty());
    let required_tags = filters.tags.as_deref().unwrap_or_default();
    let range = ResolvedRange::resolve(filters.date_range.as_ref());

    prompts
        .iter()
        .filter(|prompt| category.is_none_or(|c| prompt.category == c))
        .filter(|prompt| {
            required_tags
                .iter()
                .all(|tag| prompt.tags.iter().any(|t| t == tag))
        })
        .filter(|prompt| range.admits(prompt))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(id: &str, category: &str, tags: &[&str], updated_at: Option<&str>) -> Prompt {
        Prompt {
            id: id.to_string(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            updated_at: updated_at.map(str::to_string),
            ..Default::default()
        }
    }

    fn ids(prompts: &[&Prompt]) -> Vec<String> {
        prompts.iter().map(|p| p.id.clone()).collect()
    }

    fn sample() -> Vec<Prompt> {
        vec![
            prompt("a", "cat1", &["react", "typescript"], Some("2024-03-01T10:00:00Z")),
            prompt("b", "cat2", &["react"], Some("2024-03-15T23:30:00Z")),
            prompt("c", "cat1", &[], Some("2024-04-01T00:00:00Z")),
            prompt("d", "cat1", &["typescript"], None),
        ]
    }

    #[test]
    fn test_no_filters_keeps_everything_in_order() {
        let prompts = sample();
        let result = apply_filters(&prompts, &FilterSpec::default());
        assert_eq!(ids(&result), vec!["a", "b", "c", "d"]);
        assert!(FilterSpec::default().is_unconstrained());
    }

    #[test]
    fn test_category_filter() {
        let prompts = sample();
        let result = apply_filters(&prompts, &FilterSpec::default().with_category("cat1"));
        assert_eq!(ids(&result), vec!["a", "c", "d"]);

        // Empty category is no constraint
        let result = apply_filters(&prompts, &FilterSpec::default().with_category(""));
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_tags_and_semantics() {
        let prompts = sample();
        let result = apply_filters(&prompts, &FilterSpec::default().with_tags(["react", "typescript"]));
        assert_eq!(ids(&result), vec!["a"]);

        let result = apply_filters(&prompts, &FilterSpec::default().with_tags(["react"]));
        assert_eq!(ids(&result), vec!["a", "b"]);

        let empty: [&str; 0] = [];
        let result = apply_filters(&prompts, &FilterSpec::default().with_tags(empty));
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_date_range_inclusive_end_of_day() {
        let prompts = sample();
        let filters = FilterSpec::default()
            .with_date_range(Some("2024-03-01".to_string()), Some("2024-03-15".to_string()));
        // b at 23:30 on the end day is still inside; d has no date
        assert_eq!(ids(&apply_filters(&prompts, &filters)), vec!["a", "b"]);
    }

    #[test]
    fn test_date_range_open_bounds() {
        let prompts = sample();
        let since = FilterSpec::default().with_date_range(Some("2024-03-02".to_string()), None);
        assert_eq!(ids(&apply_filters(&prompts, &since)), vec!["b", "c"]);

        let until = FilterSpec::default().with_date_range(None, Some("2024-03-01".to_string()));
        assert_eq!(ids(&apply_filters(&prompts, &until)), vec!["a"]);
    }

    #[test]
    fn test_start_is_raw_instant() {
        let prompts = sample();
        let filters =
            FilterSpec::default().with_date_range(Some("2024-03-01T12:00:00Z".to_string()), None);
        assert_eq!(ids(&apply_filters(&prompts, &filters)), vec!["b", "c"]);
    }

    #[test]
    fn test_created_at_fallback_and_unparseable_dates() {
        let prompts = vec![
            Prompt {
                id: "created".to_string(),
                created_at: Some("2024-05-05".to_string()),
                ..Default::default()
            },
            prompt("garbage", "", &[], Some("not a date")),
        ];
        let filters = FilterSpec::default().with_date_range(Some("2024-01-01".to_string()), None);
        assert_eq!(ids(&apply_filters(&prompts, &filters)), vec!["created"]);
    }

    #[test]
    fn test_unparseable_bound_is_open_but_range_still_active() {
        let prompts = sample();
        let filters = FilterSpec::default().with_date_range(Some("someday".to_string()), None);
        // Bound ignored, but undated prompts are still excluded
        assert_eq!(ids(&apply_filters(&prompts, &filters)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2024-03-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00.123+02:00").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("03/01/2024").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_end_of_day() {
        let instant = parse_timestamp("2024-03-15").unwrap();
        let end = end_of_day(instant);
        assert_eq!(end.to_rfc3339(), "2024-03-15T23:59:59.999+00:00");
    }

    #[test]
    fn test_filter_spec_serialization_omits_absent_keys() {
        let json = serde_json::to_string(&FilterSpec::default().with_category("cat1")).unwrap();
        assert_eq!(json, r#"{"category":"cat1"}"#);
    }
}
