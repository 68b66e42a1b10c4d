//! Temporal coverage parsing.
//!
//! Providers describe the period a dataset covers either as a DCMI Period
//! (`name=X; start=2000-01-26; end=2000-02-20;`) or as an unlabelled pair of
//! dates (`2000-01-26,2000-02-20`, `2000-01-26 2000-02-20`, or the ISO 8601
//! interval `2000-01-26/2000-02-20`). [`parse`] accepts both shapes and never
//! fails: anything it cannot understand becomes an empty [`TemporalPeriod`].
//!
//! The catalogue stores coverage dates as `YYYY-MM-DDT00:00:00Z` strings plus
//! an integer sort key, see [`to_catalogue_timestamp`] and [`to_epoch_seconds`].

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use crate::dcmi::parse_components;

lazy_static! {
    static ref DATE_TOKEN: Regex = Regex::new(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?(?:T\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$"
    )
    .unwrap();
    static ref YEAR: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
}

const SECONDS_PER_DAY: i64 = 86_400;

/// A `{start, end}` pair of ISO date strings, either of which may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalPeriod {
    /// Beginning of the period.
    pub start: Option<String>,
    /// End of the period.
    pub end: Option<String>,
}

impl TemporalPeriod {
    /// True when neither bound is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Parse a free-text or DCMI Period coverage string.
///
/// # Examples
///
/// ```
/// use mdingest::temporal::parse;
///
/// let period = parse("name=X; start=2000-01-26; end=2000-02-20; scheme=W3C-DTF;");
/// assert_eq!(period.start.as_deref(), Some("2000-01-26"));
/// assert_eq!(period.end.as_deref(), Some("2000-02-20"));
///
/// let period = parse("2000-01-26");
/// assert_eq!(period.start.as_deref(), Some("2000-01-26"));
/// assert_eq!(period.end, None);
/// ```
#[must_use]
pub fn parse(raw_text: &str) -> TemporalPeriod {
    let text = raw_text.trim();
    if text.is_empty() {
        return TemporalPeriod::default();
    }

    if let Some(components) = parse_components(text) {
        let pick = |key: &str| {
            components
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
        };
        return TemporalPeriod {
            start: pick("start"),
            end: pick("end"),
        };
    }

    let tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    match tokens.as_slice() {
        [start] if is_date(start) => TemporalPeriod {
            start: Some((*start).to_string()),
            end: None,
        },
        [start, end] if is_date(start) && is_date(end) => TemporalPeriod {
            start: Some((*start).to_string()),
            end: Some((*end).to_string()),
        },
        _ => TemporalPeriod::default(),
    }
}

fn is_date(token: &str) -> bool {
    DATE_TOKEN.is_match(token)
}

/// Parse a `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or ISO timestamp into a date.
///
/// Missing month and day default to the first.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_TOKEN.captures(text.trim())?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2).map_or(Some(1), |m| m.as_str().parse().ok())?;
    let day = caps.get(3).map_or(Some(1), |d| d.as_str().parse().ok())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Render a coverage date the way the catalogue stores it.
///
/// ```
/// use mdingest::temporal::to_catalogue_timestamp;
///
/// assert_eq!(to_catalogue_timestamp("2020-01-30").as_deref(), Some("2020-01-30T00:00:00Z"));
/// assert_eq!(to_catalogue_timestamp("1929").as_deref(), Some("1929-01-01T00:00:00Z"));
/// assert_eq!(to_catalogue_timestamp("spring"), None);
/// ```
#[must_use]
pub fn to_catalogue_timestamp(date: &str) -> Option<String> {
    parse_date(date).map(|d| d.format("%Y-%m-%dT00:00:00Z").to_string())
}

/// Seconds between `0001-01-01T00:00:00` and midnight of `date`.
///
/// This is the numeric sort key the catalogue indexes next to the textual
/// coverage dates.
#[must_use]
pub fn to_epoch_seconds(date: &str) -> Option<i64> {
    parse_date(date).map(|d| (i64::from(d.num_days_from_ce()) - 1) * SECONDS_PER_DAY)
}

/// First four-digit year found in `text`.
#[must_use]
pub fn extract_year(text: &str) -> Option<String> {
    YEAR.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: Option<&str>, end: Option<&str>) -> TemporalPeriod {
        TemporalPeriod {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    #[test]
    fn test_dcmi_period() {
        assert_eq!(
            parse("name=X; start=2000-01-26; end=2000-02-20; scheme=W3C-DTF;"),
            period(Some("2000-01-26"), Some("2000-02-20"))
        );
    }

    #[test]
    fn test_dcmi_period_start_only() {
        assert_eq!(
            parse("start=1929;name=Depression"),
            period(Some("1929"), None)
        );
    }

    #[test]
    fn test_dcmi_period_unknown_keys() {
        assert!(parse("name=Bronze Age; scheme=Period").is_empty());
    }

    #[test]
    fn test_unlabelled_comma_pair() {
        assert_eq!(
            parse("2000-01-26,2000-02-20"),
            period(Some("2000-01-26"), Some("2000-02-20"))
        );
    }

    #[test]
    fn test_unlabelled_whitespace_pair() {
        assert_eq!(
            parse(" 2000-01-26   2000-02-20 "),
            period(Some("2000-01-26"), Some("2000-02-20"))
        );
    }

    #[test]
    fn test_iso_interval() {
        assert_eq!(
            parse("2020-01-30/2020-02-10"),
            period(Some("2020-01-30"), Some("2020-02-10"))
        );
    }

    #[test]
    fn test_single_date() {
        assert_eq!(parse("2000-01-26"), period(Some("2000-01-26"), None));
    }

    #[test]
    fn test_unparseable_text_is_empty() {
        assert!(parse("the late Bronze Age").is_empty());
        assert!(parse("").is_empty());
        assert!(parse("2000 2001 2002").is_empty());
    }

    #[test]
    fn test_catalogue_timestamp() {
        assert_eq!(
            to_catalogue_timestamp("2020-01").as_deref(),
            Some("2020-01-01T00:00:00Z")
        );
        assert_eq!(
            to_catalogue_timestamp("2020-01-30T12:30:00Z").as_deref(),
            Some("2020-01-30T00:00:00Z")
        );
        assert_eq!(to_catalogue_timestamp("2020-13-01"), None);
    }

    #[test]
    fn test_epoch_seconds() {
        assert_eq!(to_epoch_seconds("2020-01-30"), Some(63_715_939_200));
        assert_eq!(to_epoch_seconds("0001-01-01"), Some(0));
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("2020-05-12").as_deref(), Some("2020"));
        assert_eq!(extract_year("published in 1999").as_deref(), Some("1999"));
        assert_eq!(extract_year("n.d."), None);
    }
}
