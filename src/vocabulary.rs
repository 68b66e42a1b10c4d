//! Controlled vocabularies: discipline mapping, licences and access rights.
//!
//! The discipline table is embedded from `data/disciplines.csv`. Each row maps
//! a source subject term to a hierarchical discipline string. Rows with a
//! community column only apply to that community and take precedence over the
//! global rows for the same keyword.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

const DISCIPLINE_TABLE: &str = include_str!("../data/disciplines.csv");

#[derive(Debug, Deserialize)]
struct DisciplineRow {
    community: String,
    term: String,
    discipline: String,
}

lazy_static! {
    static ref DISCIPLINES: Vec<DisciplineRow> = load_disciplines(DISCIPLINE_TABLE);
    static ref CC_LICENCE: Regex = Regex::new(
        r"(?i)creativecommons\.org/(licenses|publicdomain)/([a-z-]+)/(\d\.\d)"
    )
    .unwrap();
}

/// Rows that do not deserialize are skipped with a warning.
fn load_disciplines(data: &str) -> Vec<DisciplineRow> {
    csv::Reader::from_reader(data.as_bytes())
        .deserialize()
        .filter_map(|row: csv::Result<DisciplineRow>| match row {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(error = %e, "skipping malformed discipline row");
                None
            },
        })
        .collect()
}

fn lookup<'a>(keyword: &str, mut rows: impl Iterator<Item = &'a DisciplineRow>) -> Option<&'a str> {
    let keyword = keyword.trim().to_lowercase();
    rows.find(|row| row.term.to_lowercase() == keyword)
        .map(|row| row.discipline.as_str())
}

/// Map subject keywords to a discipline.
///
/// Keywords are tried in source order; for each keyword the community's own
/// rows are consulted before the global ones. Returns `None` when no keyword
/// is in the table.
///
/// # Examples
///
/// ```
/// use mdingest::vocabulary::map_discipline;
///
/// let keywords = vec![
///     "enzymes".to_string(),
///     "Medicine, Health and Life Sciences".to_string(),
/// ];
/// assert_eq!(
///     map_discipline(&keywords, Some("darus")).as_deref(),
///     Some("Life Sciences; Medicine")
/// );
/// ```
#[must_use]
pub fn map_discipline(keywords: &[String], community: Option<&str>) -> Option<String> {
    for keyword in keywords {
        if let Some(community) = community {
            let own = DISCIPLINES.iter().filter(|r| r.community == community);
            if let Some(found) = lookup(keyword, own) {
                return Some(found.to_string());
            }
        }
        let global = DISCIPLINES.iter().filter(|r| r.community.is_empty());
        if let Some(found) = lookup(keyword, global) {
            return Some(found.to_string());
        }
    }
    None
}

/// Split a hierarchical discipline string into its terms.
///
/// ```
/// use mdingest::vocabulary::discipline_terms;
///
/// assert_eq!(discipline_terms("Life Sciences; Medicine"), vec!["Life Sciences", "Medicine"]);
/// ```
#[must_use]
pub fn discipline_terms(discipline: &str) -> Vec<&str> {
    discipline
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Access is open unless a rights statement declares closed, restricted or
/// embargoed access (the `info:eu-repo/semantics/*Access` terms).
#[must_use]
pub fn is_open_access(rights: &[String]) -> bool {
    !rights.iter().any(|r| {
        let r = r.to_lowercase();
        ["closedaccess", "restrictedaccess", "embargoedaccess"]
            .iter()
            .any(|term| r.contains(term))
    })
}

/// Short label of the first Creative Commons licence URI among `rights`.
///
/// ```
/// use mdingest::vocabulary::licence_label;
///
/// let rights = vec!["https://creativecommons.org/licenses/by-sa/4.0/".to_string()];
/// assert_eq!(licence_label(&rights).as_deref(), Some("CC BY-SA 4.0"));
/// ```
#[must_use]
pub fn licence_label(rights: &[String]) -> Option<String> {
    rights.iter().find_map(|r| {
        let caps = CC_LICENCE.captures(r)?;
        let kind = caps.get(1)?.as_str().to_lowercase();
        let code = caps.get(2)?.as_str().to_uppercase();
        let version = caps.get(3)?.as_str();
        if kind == "publicdomain" {
            Some(if code == "ZERO" {
                format!("CC0 {version}")
            } else {
                format!("CC PDM {version}")
            })
        } else {
            Some(format!("CC {code} {version}"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_table_loads() {
        assert!(DISCIPLINES.len() > 20);
        assert!(DISCIPLINES
            .iter()
            .any(|r| r.term == "Medicine, Health and Life Sciences"));
    }

    #[test]
    fn test_embedded_table_has_no_malformed_rows() {
        let data_rows = DISCIPLINE_TABLE.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
        assert_eq!(DISCIPLINES.len(), data_rows);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let rows = load_disciplines(
            "community,term,discipline\n,Physics,Natural Sciences; Physics\nbroken row\n",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].term, "Physics");
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(
            map_discipline(&strings(&["chemistry"]), None).as_deref(),
            Some("Natural Sciences; Chemistry")
        );
    }

    #[test]
    fn test_community_rows_only_apply_to_their_community() {
        let keywords = strings(&["Neutron scattering"]);
        assert_eq!(
            map_discipline(&keywords, Some("psi")).as_deref(),
            Some("Natural Sciences; Physics; Condensed Matter Physics")
        );
        assert_eq!(map_discipline(&keywords, Some("darus")), None);
        assert_eq!(map_discipline(&keywords, None), None);
    }

    #[test]
    fn test_first_matching_keyword_wins() {
        let keywords = strings(&["unmapped", "Physics", "Chemistry"]);
        assert_eq!(
            map_discipline(&keywords, None).as_deref(),
            Some("Natural Sciences; Physics")
        );
    }

    #[test]
    fn test_open_access() {
        assert!(is_open_access(&[]));
        assert!(is_open_access(&strings(&["info:eu-repo/semantics/openAccess"])));
        assert!(!is_open_access(&strings(&["info:eu-repo/semantics/closedAccess"])));
        assert!(!is_open_access(&strings(&["Embargoedaccess until 2030"])));
    }

    #[test]
    fn test_licence_labels() {
        assert_eq!(
            licence_label(&strings(&["http://creativecommons.org/publicdomain/zero/1.0/"]))
                .as_deref(),
            Some("CC0 1.0")
        );
        assert_eq!(
            licence_label(&strings(&[
                "All rights reserved",
                "https://creativecommons.org/licenses/by/4.0/legalcode"
            ]))
            .as_deref(),
            Some("CC BY 4.0")
        );
        assert_eq!(licence_label(&strings(&["All rights reserved"])), None);
    }
}
