//! Schema readers turning raw documents into [`Document`]s.
//!
//! The reader set is closed: [`DublinCoreReader`], [`DataCiteReader`] and the
//! profile-driven [`JsonReader`]. A [`Reader`] pairs one of them with an
//! optional [`Community`], which refines the base reader: it assigns the
//! discipline, renames source elements, restricts identifier prefixes and may
//! run a post-processing hook.
//!
//! Extraction is best effort per field. A value that cannot be derived is
//! recorded as an [`ExtractionFailure`] on the [`ReadOutcome`] and the field
//! is left empty; only a payload the reader cannot read at all is an error.
//!
//! # Examples
//!
//! ```
//! use mdingest::input::RawDocument;
//! use mdingest::reader::Reader;
//! use mdingest::sniffer::detect;
//!
//! let raw = RawDocument::from_text(
//!     "oai:example.org:7",
//!     r#"<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
//!                   xmlns:dc="http://purl.org/dc/elements/1.1/">
//!          <dc:title>Ice core CO2</dc:title>
//!          <dc:publisher>PANGAEA</dc:publisher>
//!        </oai_dc:dc>"#,
//! )?;
//! let reader = Reader::new(detect(&raw)?);
//! let outcome = reader.parse(&raw)?;
//! assert_eq!(outcome.document.title.as_deref(), Some("Ice core CO2"));
//! assert_eq!(outcome.document.contact, vec!["PANGAEA".to_string()]);
//! # Ok::<(), mdingest::IngestError>(())
//! ```

pub mod datacite;
pub mod dublin_core;
pub mod identifiers;
pub mod json;
mod spatial;

pub use datacite::DataCiteReader;
pub use dublin_core::DublinCoreReader;
pub use json::{JsonProfile, JsonReader};

use tracing::debug;

use crate::community::{Community, IdentifierRules};
use crate::document::{Document, Field};
use crate::error::{ExtractionFailure, IngestError, Result};
use crate::input::{Payload, RawDocument};
use crate::sniffer::{ReaderVariant, SchemaType};
use crate::temporal;
use crate::text::clean_all;
use crate::vocabulary::map_discipline;

/// Result of reading one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// The extracted document.
    pub document: Document,
    /// Fields that could not be derived.
    pub failures: Vec<ExtractionFailure>,
}

/// Collects the non-fatal failures of one reader call.
#[derive(Debug)]
pub(crate) struct Extraction<'a> {
    source: &'a str,
    failures: Vec<ExtractionFailure>,
}

impl<'a> Extraction<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Extraction {
            source,
            failures: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, failure: ExtractionFailure) {
        debug!(
            source = self.source,
            field = failure.field,
            reason = %failure.reason,
            "field extraction failed"
        );
        self.failures.push(failure);
    }

    pub(crate) fn into_failures(self) -> Vec<ExtractionFailure> {
        self.failures
    }
}

/// Store source values for `field` on the document.
///
/// Single-valued fields keep the first value ever stored; sequences grow in
/// source order.
pub(crate) fn apply_field(
    doc: &mut Document,
    field: Field,
    values: &[String],
    rules: IdentifierRules,
    log: &mut Extraction<'_>,
) {
    let values = clean_all(values);
    if values.is_empty() {
        return;
    }
    match field {
        Field::Title => set_once(&mut doc.title, values.into_iter().next()),
        Field::Description => set_once(&mut doc.description, Some(values.join("\n"))),
        Field::Version => set_once(&mut doc.version, values.into_iter().next()),
        Field::Keywords => doc.keywords.extend(values),
        Field::Creator => doc.creator.extend(values),
        Field::Publisher => doc.publisher.extend(values),
        Field::Contributor => doc.contributor.extend(values),
        Field::Contact => doc.contact.extend(values),
        Field::Rights => doc.rights.extend(values),
        Field::Language => doc.language.extend(values),
        Field::ResourceType => doc.resource_type.extend(values),
        Field::Format => doc.format.extend(values),
        Field::Size => doc.size.extend(values),
        Field::Places => doc.places.extend(values),
        Field::PublicationDate => {
            if doc.publication_year.is_none() {
                match values.iter().find_map(|v| temporal::extract_year(v)) {
                    Some(year) => doc.publication_year = Some(year),
                    None => log.record(ExtractionFailure::new(
                        field.name(),
                        format!("no year in '{}'", values[0]),
                    )),
                }
            }
        },
        Field::Identifier => {
            let mut roles = identifiers::IdentifierRoles {
                doi: doc.doi.take(),
                pid: doc.pid.take(),
                source: doc.source.take(),
            };
            for value in &values {
                roles.offer(value, rules);
            }
            doc.doi = roles.doi;
            doc.pid = roles.pid;
            doc.source = roles.source;
        },
        Field::Relation => {
            doc.funding_reference.extend(
                values
                    .iter()
                    .filter(|v| identifiers::is_funding_reference(v))
                    .cloned(),
            );
            doc.related_identifier.extend(values);
        },
        Field::TemporalCoverage => {
            if doc.temporal_coverage_begin.is_some() || doc.temporal_coverage_end.is_some() {
                return;
            }
            match values.iter().map(|v| temporal::parse(v)).find(|p| !p.is_empty()) {
                Some(period) => {
                    doc.temporal_coverage_begin = period.start;
                    doc.temporal_coverage_end = period.end;
                },
                None => log.record(ExtractionFailure::new(
                    field.name(),
                    format!("unrecognized period '{}'", values[0]),
                )),
            }
        },
    }
}

fn set_once(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Base schema reader.
#[derive(Debug, Clone)]
pub enum SchemaReader {
    /// Dublin Core, bare or in an OAI-PMH envelope.
    DublinCore(DublinCoreReader),
    /// DataCite kernel 3 or 4.
    DataCite(DataCiteReader),
    /// Profile-driven community JSON.
    Json(JsonReader),
}

impl SchemaReader {
    /// The schema this reader understands.
    #[must_use]
    pub fn schema(&self) -> SchemaType {
        match self {
            SchemaReader::DublinCore(_) => SchemaType::DublinCore,
            SchemaReader::DataCite(_) => SchemaType::DataCite,
            SchemaReader::Json(_) => SchemaType::CommunityJson,
        }
    }
}

/// A base reader with optional community refinements.
#[derive(Debug, Clone)]
pub struct Reader {
    base: SchemaReader,
    community: Option<&'static Community>,
}

impl Reader {
    /// Build the reader for a classified document.
    ///
    /// A JSON variant without a community profile reads nothing but the
    /// source identifier; the sniffer only yields JSON variants for
    /// communities that declare a profile.
    #[must_use]
    pub fn new(variant: ReaderVariant) -> Self {
        let rules = variant.community.map(|c| c.identifiers).unwrap_or_default();
        let base = match variant.schema {
            SchemaType::DublinCore => {
                SchemaReader::DublinCore(DublinCoreReader::new(variant.community))
            },
            SchemaType::DataCite => SchemaReader::DataCite(DataCiteReader::new(rules)),
            SchemaType::CommunityJson => SchemaReader::Json(JsonReader::new(
                variant.community.and_then(|c| c.json_profile),
                rules,
            )),
        };
        Reader {
            base,
            community: variant.community,
        }
    }

    /// The base reader.
    #[must_use]
    pub fn base(&self) -> &SchemaReader {
        &self.base
    }

    /// The community refining the base reader.
    #[must_use]
    pub fn community(&self) -> Option<&'static Community> {
        self.community
    }

    /// Read one raw document.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Parse`] when the payload is of the wrong kind
    /// for this reader or lacks the schema's root structure. Problems with
    /// individual fields are reported in [`ReadOutcome::failures`] instead.
    pub fn parse(&self, raw: &RawDocument) -> Result<ReadOutcome> {
        let mut doc = Document::new(raw.source_identifier.clone());
        doc.community = self.community.map(|c| c.name.to_string());
        let mut log = Extraction::new(&raw.source_identifier);

        match (&self.base, &raw.payload) {
            (SchemaReader::DublinCore(reader), Payload::Xml(root)) => {
                reader.extract(root, &mut doc, &mut log);
            },
            (SchemaReader::DataCite(reader), Payload::Xml(root)) => {
                reader.extract(root, &mut doc, &mut log)?;
            },
            (SchemaReader::Json(reader), Payload::Json(value)) => {
                reader.extract(value, &mut doc, &mut log);
            },
            (base, _) => {
                return Err(IngestError::Parse(format!(
                    "{} reader cannot read document '{}'",
                    base.schema(),
                    raw.source_identifier
                )))
            },
        }

        if doc.contact.is_empty() {
            doc.contact = doc.publisher.clone();
        }
        self.assign_discipline(&mut doc);
        if let Some(update) = self.community.and_then(|c| c.update) {
            update(&mut doc, raw);
        }

        Ok(ReadOutcome {
            document: doc,
            failures: log.into_failures(),
        })
    }

    fn assign_discipline(&self, doc: &mut Document) {
        let terms: Vec<String> = doc
            .keywords
            .iter()
            .chain(&doc.resource_type)
            .cloned()
            .collect();
        doc.discipline = map_discipline(&terms, self.community.map(|c| c.name))
            .or_else(|| self.community.map(|c| c.discipline.to_string()));
    }
}
