//! Catalogue serialization.
//!
//! [`CatalogueWriter::serialize`] turns a [`Document`] into the dataset
//! record the catalogue ingests: a few core attributes, a tag list and a flat
//! list of key/value extras. The function is pure; the same document and
//! configuration always give the same record.
//!
//! # Examples
//!
//! ```
//! use mdingest::config::CatalogueConfig;
//! use mdingest::document::Document;
//! use mdingest::writer::CatalogueWriter;
//!
//! let mut doc = Document::new("oai:example.org:1");
//! doc.title = Some("Ocean salinity".to_string());
//! doc.keywords = vec!["oceanography".to_string()];
//!
//! let record = CatalogueWriter::new(CatalogueConfig::default()).serialize(&doc)?;
//! assert_eq!(record.owner_org, "b2find");
//! assert_eq!(record.state, "active");
//! assert_eq!(record.extra("Discipline"), Some("Various"));
//! assert_eq!(record.extra("OpenAccess"), Some("true"));
//! # Ok::<(), mdingest::IngestError>(())
//! ```

use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CatalogueConfig;
use crate::document::Document;
use crate::error::{IngestError, Result};
use crate::temporal;
use crate::vocabulary::{discipline_terms, is_open_access, licence_label};

lazy_static! {
    static ref TAG_FORBIDDEN: Regex = Regex::new(r"[^\w\s.\-]").unwrap();
}

const MIN_TAG_LENGTH: usize = 2;

/// A catalogue tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag text.
    pub name: String,
}

/// A catalogue key/value extra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    /// Extra key, e.g. `PublicationYear`.
    pub key: String,
    /// Extra value.
    pub value: String,
}

/// A dataset record in the catalogue's JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueRecord {
    /// Stable dataset name, a UUID derived from the source identifier.
    pub name: String,
    /// Publishing organization.
    pub owner_org: String,
    /// Dataset title.
    pub title: String,
    /// Dataset state.
    pub state: String,
    /// Tags.
    pub tags: Vec<Tag>,
    /// Extras, in a fixed key order.
    pub extras: Vec<Extra>,
}

impl CatalogueRecord {
    /// Value of the extra with the given key.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// True when a tag with exactly this name exists.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Render the record as catalogue JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Serialization`] if JSON encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| IngestError::Serialization(e.to_string()))
    }
}

/// Dataset name for a source identifier: UUID v5 in the DNS namespace.
///
/// ```
/// use mdingest::writer::dataset_name;
///
/// let name = dataset_name("oai:darus.uni-stuttgart.de:doi:10.18419/darus-477");
/// assert_eq!(name.len(), 36);
/// assert_eq!(&name[14..15], "5");
/// assert_eq!(name, dataset_name("oai:darus.uni-stuttgart.de:doi:10.18419/darus-477"));
/// ```
#[must_use]
pub fn dataset_name(source_identifier: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, source_identifier.as_bytes()).to_string()
}

/// Clean a keyword for use as a catalogue tag.
///
/// Characters other than letters, digits, whitespace, `-`, `_` and `.` become
/// spaces, whitespace is collapsed, and the result is cut to `max_len`
/// characters. Tags shorter than two characters are dropped.
///
/// ```
/// use mdingest::writer::clean_tag;
///
/// assert_eq!(clean_tag("Medicine, Health & Life Sciences", 100).as_deref(),
///            Some("Medicine Health Life Sciences"));
/// assert_eq!(clean_tag("(x)", 100), None);
/// ```
#[must_use]
pub fn clean_tag(keyword: &str, max_len: usize) -> Option<String> {
    let replaced = TAG_FORBIDDEN.replace_all(keyword, " ");
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let tag: String = collapsed.chars().take(max_len).collect();
    let tag = tag.trim_end().to_string();
    (tag.chars().count() >= MIN_TAG_LENGTH).then_some(tag)
}

/// Serializes documents into catalogue records.
#[derive(Debug, Clone, Default)]
pub struct CatalogueWriter {
    config: CatalogueConfig,
    owner_orgs: IndexMap<String, String>,
}

impl CatalogueWriter {
    /// Create a writer.
    #[must_use]
    pub fn new(config: CatalogueConfig) -> Self {
        CatalogueWriter {
            config,
            owner_orgs: IndexMap::new(),
        }
    }

    /// Publish the records of `community` under `org` instead of the
    /// community's own name.
    #[must_use]
    pub fn with_owner_org(mut self, community: impl Into<String>, org: impl Into<String>) -> Self {
        self.owner_orgs.insert(community.into(), org.into());
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &CatalogueConfig {
        &self.config
    }

    /// Map a document to a catalogue record.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Serialization`] when the document has an empty
    /// source identifier or no title.
    pub fn serialize(&self, doc: &Document) -> Result<CatalogueRecord> {
        let source_identifier = doc.source_identifier.trim();
        if source_identifier.is_empty() {
            return Err(IngestError::Serialization(
                "Document has an empty source identifier".to_string(),
            ));
        }
        let title = doc
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                IngestError::Serialization(format!("Document '{source_identifier}' has no title"))
            })?;

        let discipline = doc
            .discipline
            .clone()
            .unwrap_or_else(|| self.config.default_discipline.clone());

        Ok(CatalogueRecord {
            name: dataset_name(source_identifier),
            owner_org: self.owner_org(doc),
            title: title.to_string(),
            state: self.config.state.clone(),
            tags: self.tags(doc, &discipline),
            extras: self.extras(doc, title, &discipline),
        })
    }

    fn owner_org(&self, doc: &Document) -> String {
        match doc.community.as_deref() {
            Some(community) => self
                .owner_orgs
                .get(community)
                .cloned()
                .unwrap_or_else(|| community.to_string()),
            None => self.config.default_owner_org.clone(),
        }
    }

    fn tags(&self, doc: &Document, discipline: &str) -> Vec<Tag> {
        let mut seen = IndexSet::new();
        let mut tags = Vec::new();
        let discipline_terms = if self.config.discipline_tags {
            discipline_terms(discipline)
        } else {
            Vec::new()
        };
        let candidates = doc
            .keywords
            .iter()
            .map(String::as_str)
            .chain(discipline_terms);
        for candidate in candidates {
            let Some(name) = clean_tag(candidate, self.config.max_tag_length) else {
                continue;
            };
            if seen.insert(name.to_lowercase()) {
                tags.push(Tag { name });
            }
        }
        tags
    }

    fn extras(&self, doc: &Document, title: &str, discipline: &str) -> Vec<Extra> {
        let sep = self.config.separator.as_str();
        let join = |values: &[String]| (!values.is_empty()).then(|| values.join(sep));

        let fulltext: Vec<String> = std::iter::once(title.to_string())
            .chain(doc.description.clone())
            .chain(doc.keywords.iter().cloned())
            .chain(doc.resource_type.iter().cloned())
            .collect();

        let begin = doc.temporal_coverage_begin.as_deref();
        let end = doc.temporal_coverage_end.as_deref();
        let epoch_seconds = |date: &str| temporal::to_epoch_seconds(date).map(|s| s.to_string());
        let spatial_coverage = join(&doc.places).or_else(|| doc.geometry.map(|g| g.to_wkt()));

        let entries: [(&str, Option<String>); 26] = [
            ("fulltext", join(&fulltext)),
            ("Discipline", Some(discipline.to_string())),
            ("PublicationYear", doc.publication_year.clone()),
            ("TemporalCoverage:BeginDate", begin.and_then(temporal::to_catalogue_timestamp)),
            ("TemporalCoverage:EndDate", end.and_then(temporal::to_catalogue_timestamp)),
            ("TempCoverageBegin", begin.and_then(epoch_seconds)),
            ("TempCoverageEnd", end.and_then(epoch_seconds)),
            ("OpenAccess", Some(is_open_access(&doc.rights).to_string())),
            ("License", licence_label(&doc.rights)),
            ("FundingReference", join(&doc.funding_reference)),
            ("DOI", doc.doi.clone()),
            ("PID", doc.pid.clone()),
            ("Source", doc.source.clone()),
            ("RelatedIdentifier", join(&doc.related_identifier)),
            ("Creator", join(&doc.creator)),
            ("Publisher", join(&doc.publisher)),
            ("Contributor", join(&doc.contributor)),
            ("Contact", join(&doc.contact)),
            ("Rights", join(&doc.rights)),
            ("Language", join(&doc.language)),
            ("ResourceType", join(&doc.resource_type)),
            ("Format", join(&doc.format)),
            ("Size", join(&doc.size)),
            ("Version", doc.version.clone()),
            ("SpatialCoverage", spatial_coverage),
            ("spatial", doc.geometry.map(|g| g.to_geojson().to_string())),
        ];

        entries
            .into_iter()
            .filter_map(|(key, value)| {
                value.map(|value| Extra {
                    key: key.to_string(),
                    value,
                })
            })
            .collect()
    }
}
