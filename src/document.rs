//! The canonical, schema-agnostic document.
//!
//! Every reader produces a [`Document`] and the catalogue writer consumes it.
//! Absent values are `None` or empty sequences; a document is built by exactly
//! one reader call and is not modified afterwards.

use crate::geometry::Geometry;

/// Canonical representation of one harvested metadata item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    // === Identity ===
    /// Stable identifier of the item at its source.
    pub source_identifier: String,
    /// Community whose reader produced this document.
    pub community: Option<String>,
    /// DOI, rendered as a `https://doi.org/` URL.
    pub doi: Option<String>,
    /// Handle PID, rendered as a `https://hdl.handle.net/` URL.
    pub pid: Option<String>,
    /// Landing page of the item at its source.
    pub source: Option<String>,

    // === Descriptive ===
    /// Main title.
    pub title: Option<String>,
    /// Description or abstract.
    pub description: Option<String>,
    /// Subject keywords in source order.
    pub keywords: Vec<String>,
    /// Discipline from the controlled vocabulary, e.g. `Life Sciences; Medicine`.
    pub discipline: Option<String>,
    /// Resource types (DC type, DataCite `resourceTypeGeneral/resourceType`).
    pub resource_type: Vec<String>,
    /// Formats or MIME types.
    pub format: Vec<String>,
    /// Languages.
    pub language: Vec<String>,
    /// Version string.
    pub version: Option<String>,

    // === Provenance ===
    /// Creators.
    pub creator: Vec<String>,
    /// Publishers.
    pub publisher: Vec<String>,
    /// Contributors.
    pub contributor: Vec<String>,
    /// Contact; the publisher when the source has no explicit contact.
    pub contact: Vec<String>,
    /// Rights statements and licence URIs.
    pub rights: Vec<String>,
    /// Four-digit publication year.
    pub publication_year: Option<String>,

    // === Linkage ===
    /// Related identifiers, duplicates allowed, in source order.
    pub related_identifier: Vec<String>,
    /// Funding agreement references.
    pub funding_reference: Vec<String>,

    // === Spatial ===
    /// Spatial coverage as a point or box.
    pub geometry: Option<Geometry>,
    /// Free-text place names.
    pub places: Vec<String>,

    // === Temporal ===
    /// Start of the temporal coverage.
    pub temporal_coverage_begin: Option<String>,
    /// End of the temporal coverage.
    pub temporal_coverage_end: Option<String>,

    // === Size ===
    /// Free-text extent.
    pub size: Vec<String>,
}

impl Document {
    /// Create an empty document for the given source identifier.
    pub fn new(source_identifier: impl Into<String>) -> Self {
        Document {
            source_identifier: source_identifier.into(),
            ..Default::default()
        }
    }
}

/// Canonical fields a source element can be mapped to.
///
/// Communities use these to rename the source element feeding a field, and
/// JSON profiles to declare where each field lives in a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// [`Document::title`]
    Title,
    /// [`Document::description`]
    Description,
    /// [`Document::keywords`]
    Keywords,
    /// [`Document::creator`]
    Creator,
    /// [`Document::publisher`]
    Publisher,
    /// [`Document::contributor`]
    Contributor,
    /// [`Document::contact`]
    Contact,
    /// [`Document::rights`]
    Rights,
    /// [`Document::language`]
    Language,
    /// [`Document::resource_type`]
    ResourceType,
    /// [`Document::format`]
    Format,
    /// [`Document::size`]
    Size,
    /// [`Document::version`]
    Version,
    /// Source of [`Document::publication_year`].
    PublicationDate,
    /// Identifier list feeding DOI, PID and source.
    Identifier,
    /// Relation list feeding related identifiers and funding references.
    Relation,
    /// [`Document::places`]
    Places,
    /// Source of the temporal coverage bounds.
    TemporalCoverage,
}

impl Field {
    /// Canonical field name used in logs and failure reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Keywords => "keywords",
            Self::Creator => "creator",
            Self::Publisher => "publisher",
            Self::Contributor => "contributor",
            Self::Contact => "contact",
            Self::Rights => "rights",
            Self::Language => "language",
            Self::ResourceType => "resource_type",
            Self::Format => "format",
            Self::Size => "size",
            Self::Version => "version",
            Self::PublicationDate => "publication_year",
            Self::Identifier => "identifier",
            Self::Relation => "related_identifier",
            Self::Places => "places",
            Self::TemporalCoverage => "temporal_coverage",
        }
    }
}
