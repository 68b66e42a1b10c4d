//! Profile-driven reader for community JSON APIs.
//!
//! JSON providers share no schema, so each community declares a
//! [`JsonProfile`]: the JSON pointers that identify its records and, per
//! canonical field, the pointers its values are read from. Strings, numbers
//! and arrays of those are accepted; other values are skipped.

use serde_json::Value;

use crate::community::IdentifierRules;
use crate::document::{Document, Field};
use crate::error::ExtractionFailure;
use crate::geometry::{normalize_point, Geometry};

use super::{apply_field, Extraction};

/// Where a community's JSON records keep each field.
#[derive(Debug, Clone, Copy)]
pub struct JsonProfile {
    /// Pointers that must all be present for a document to match.
    pub signature: &'static [&'static str],
    /// Pointers per canonical field, read in order.
    pub fields: &'static [(Field, &'static [&'static str])],
    /// Decimal latitude of a point location.
    pub latitude: Option<&'static str>,
    /// Decimal longitude of a point location.
    pub longitude: Option<&'static str>,
}

/// Reader for community JSON records.
#[derive(Debug, Clone)]
pub struct JsonReader {
    profile: Option<&'static JsonProfile>,
    rules: IdentifierRules,
}

/// Scalar value as text.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Values at `pointer`, flattening one level of arrays.
#[must_use]
pub fn values_at(value: &Value, pointer: &str) -> Vec<String> {
    match value.pointer(pointer) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
        Some(other) => scalar(other).into_iter().collect(),
        None => Vec::new(),
    }
}

impl JsonReader {
    /// Create a reader for the given profile.
    #[must_use]
    pub fn new(profile: Option<&'static JsonProfile>, rules: IdentifierRules) -> Self {
        JsonReader { profile, rules }
    }

    pub(crate) fn extract(&self, value: &Value, doc: &mut Document, log: &mut Extraction<'_>) {
        let Some(profile) = self.profile else {
            return;
        };
        for &(field, pointers) in profile.fields {
            let values: Vec<String> = pointers.iter().flat_map(|p| values_at(value, p)).collect();
            apply_field(doc, field, &values, self.rules, log);
        }

        if let (Some(lat), Some(lon)) = (profile.latitude, profile.longitude) {
            match (values_at(value, lat).first(), values_at(value, lon).first()) {
                (Some(lat), Some(lon)) => match normalize_point(&[lon, lat]) {
                    Ok(point) => doc.geometry = Some(Geometry::Point(point)),
                    Err(failure) => log.record(failure),
                },
                (None, None) => {},
                _ => log.record(ExtractionFailure::new(
                    "geometry",
                    "only one of latitude and longitude is given",
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PROFILE: JsonProfile = JsonProfile {
        signature: &["/id"],
        fields: &[
            (Field::Title, &["/name", "/label"]),
            (Field::Keywords, &["/tags"]),
            (Field::PublicationDate, &["/year"]),
        ],
        latitude: Some("/lat"),
        longitude: Some("/lon"),
    };

    fn read(value: &Value) -> (Document, Vec<ExtractionFailure>) {
        let mut doc = Document::new("j");
        let mut log = Extraction::new("j");
        JsonReader::new(Some(&PROFILE), IdentifierRules::default())
            .extract(value, &mut doc, &mut log);
        (doc, log.into_failures())
    }

    #[test]
    fn test_values_at() {
        let value = json!({"a": ["x", 2, null, {"b": 1}], "n": 3.5, "o": {}});
        assert_eq!(values_at(&value, "/a"), vec!["x", "2"]);
        assert_eq!(values_at(&value, "/n"), vec!["3.5"]);
        assert!(values_at(&value, "/o").is_empty());
        assert!(values_at(&value, "/missing").is_empty());
    }

    #[test]
    fn test_profile_fields() {
        let (doc, failures) = read(&json!({
            "id": 1, "label": "Fallback label", "tags": ["a", "b"], "year": 1911,
            "lat": "43.6", "lon": 1.44
        }));
        assert_eq!(doc.title.as_deref(), Some("Fallback label"));
        assert_eq!(doc.keywords, vec!["a", "b"]);
        assert_eq!(doc.publication_year.as_deref(), Some("1911"));
        let Some(Geometry::Point(p)) = doc.geometry else {
            panic!("expected a point")
        };
        assert_eq!((p.lon(), p.lat()), (1.44, 43.6));
        assert!(failures.is_empty());
    }

    #[test]
    fn test_half_a_coordinate_is_a_failure() {
        let (doc, failures) = read(&json!({"id": 1, "lat": 43.6}));
        assert!(doc.geometry.is_none());
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_without_profile_nothing_is_read() {
        let mut doc = Document::new("j");
        let mut log = Extraction::new("j");
        JsonReader::new(None, IdentifierRules::default())
            .extract(&json!({"name": "x"}), &mut doc, &mut log);
        assert_eq!(doc, Document::new("j"));
    }
}
