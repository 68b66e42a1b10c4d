//! Identifier role assignment.
//!
//! A record's identifier list mixes DOIs, handles and landing-page URLs in no
//! particular order. Each entry is tested against the DOI pattern, then the
//! handle pattern, then the URL pattern, and takes the first role it matches.
//! Within a role the first matching entry wins, so one entry never fills two
//! roles and a later entry never replaces an earlier one.

use lazy_static::lazy_static;
use regex::Regex;

use crate::community::IdentifierRules;

lazy_static! {
    static ref DOI: Regex =
        Regex::new(r"(?i)^(?:doi:\s*|https?://(?:dx\.)?doi\.org/)?(10\.\d{4,9}/\S+)$").unwrap();
    static ref HANDLE: Regex =
        Regex::new(r"(?i)^(?:hdl:\s*|https?://hdl\.handle\.net/)(\d[\w.]*/\S+)$").unwrap();
    static ref URL: Regex = Regex::new(r"(?i)^https?://\S+$").unwrap();
    static ref FUNDING: Regex = Regex::new(r"info:eu-repo/grantAgreement/\S+").unwrap();
}

const DOI_RESOLVER: &str = "https://doi.org/";
const HANDLE_RESOLVER: &str = "https://hdl.handle.net/";

/// The role an identifier entry plays, with its normalized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierRole {
    /// DOI, as a `https://doi.org/` URL.
    Doi(String),
    /// Handle, as a `https://hdl.handle.net/` URL.
    Pid(String),
    /// Any other HTTP(S) URL, taken as the landing page.
    Source(String),
}

/// DOI, PID and source picked from an identifier list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierRoles {
    /// First DOI.
    pub doi: Option<String>,
    /// First handle.
    pub pid: Option<String>,
    /// First remaining URL.
    pub source: Option<String>,
}

impl IdentifierRoles {
    /// Offer one entry; it fills its role only if that role is still empty.
    pub fn offer(&mut self, entry: &str, rules: IdentifierRules) {
        let (slot, value) = match classify(entry, rules) {
            Some(IdentifierRole::Doi(v)) => (&mut self.doi, v),
            Some(IdentifierRole::Pid(v)) => (&mut self.pid, v),
            Some(IdentifierRole::Source(v)) => (&mut self.source, v),
            None => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// Classify a single identifier entry.
///
/// # Examples
///
/// ```
/// use mdingest::community::IdentifierRules;
/// use mdingest::reader::identifiers::{classify, IdentifierRole};
///
/// let rules = IdentifierRules::default();
/// assert_eq!(
///     classify("doi:10.18419/darus-477", rules),
///     Some(IdentifierRole::Doi("https://doi.org/10.18419/darus-477".to_string()))
/// );
/// assert_eq!(
///     classify("http://hdl.handle.net/11304/abc", rules),
///     Some(IdentifierRole::Pid("https://hdl.handle.net/11304/abc".to_string()))
/// );
/// assert_eq!(classify("ISBN 978-3-16-148410-0", rules), None);
/// ```
#[must_use]
pub fn classify(entry: &str, rules: IdentifierRules) -> Option<IdentifierRole> {
    let entry = entry.trim();

    if let Some(doi) = DOI.captures(entry).and_then(|c| c.get(1)) {
        let doi = doi.as_str();
        if rules.doi_prefix.map_or(true, |prefix| doi.starts_with(prefix)) {
            return Some(IdentifierRole::Doi(format!("{DOI_RESOLVER}{doi}")));
        }
    }

    if let Some(handle) = HANDLE.captures(entry).and_then(|c| c.get(1)) {
        return Some(IdentifierRole::Pid(format!("{HANDLE_RESOLVER}{}", handle.as_str())));
    }
    if rules.handle_prefix.is_some_and(|prefix| entry.starts_with(prefix)) {
        return Some(IdentifierRole::Pid(format!("{HANDLE_RESOLVER}{entry}")));
    }

    if URL.is_match(entry) {
        return Some(IdentifierRole::Source(entry.to_string()));
    }
    None
}

/// Assign roles over a whole identifier list.
#[must_use]
pub fn assign_roles<S: AsRef<str>>(entries: &[S], rules: IdentifierRules) -> IdentifierRoles {
    let mut roles = IdentifierRoles::default();
    for entry in entries {
        roles.offer(entry.as_ref(), rules);
    }
    roles
}

/// True when `value` references a funding agreement
/// (`info:eu-repo/grantAgreement/...`).
#[must_use]
pub fn is_funding_reference(value: &str) -> bool {
    FUNDING.is_match(value)
}
