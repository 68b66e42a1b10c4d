//! Registry of known metadata providers ("communities").
//!
//! A community names the endpoint records are harvested from, the source
//! schema they arrive in, and the refinements its reader applies on top of the
//! base schema reader: the default discipline, identifier-prefix conventions,
//! renamed source elements, the JSON profile for JSON APIs, and an optional
//! post-processing hook.
//!
//! Adding a provider means adding one entry to [`COMMUNITIES`].

use std::fmt;

use crate::document::{Document, Field};
use crate::input::RawDocument;
use crate::reader::json::JsonProfile;
use crate::sniffer::SchemaType;

/// Post-processing applied after the base reader filled the document.
pub type UpdateHook = fn(&mut Document, &RawDocument);

/// Identifier conventions of a community.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifierRules {
    /// Only DOIs under this prefix (e.g. `10.16907`) are accepted as the DOI.
    pub doi_prefix: Option<&'static str>,
    /// Bare handles under this prefix (e.g. `21.T11998/`) are accepted as PID.
    pub handle_prefix: Option<&'static str>,
}

/// A community-specific source element for a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRename {
    /// Canonical field.
    pub field: Field,
    /// Local name of the source element feeding it.
    pub element: &'static str,
}

/// A metadata provider and its reader refinements.
#[derive(Clone, Copy)]
pub struct Community {
    /// Identifier, also used as the catalogue organization.
    pub name: &'static str,
    /// Display name.
    pub label: &'static str,
    /// Harvesting endpoint.
    pub url: &'static str,
    /// Schema the provider delivers.
    pub schema: SchemaType,
    /// OAI-PMH `metadataPrefix`.
    pub oai_metadata_prefix: Option<&'static str>,
    /// OAI-PMH set, for providers sharing an endpoint.
    pub oai_set: Option<&'static str>,
    /// Discipline assigned when no keyword maps to the vocabulary.
    pub discipline: &'static str,
    /// Identifier conventions.
    pub identifiers: IdentifierRules,
    /// Renamed source elements.
    pub renames: &'static [FieldRename],
    /// Field layout for JSON providers.
    pub json_profile: Option<&'static JsonProfile>,
    /// Post-processing hook.
    pub update: Option<UpdateHook>,
}

impl fmt::Debug for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Community")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("schema", &self.schema)
            .field("oai_set", &self.oai_set)
            .field("discipline", &self.discipline)
            .finish_non_exhaustive()
    }
}

impl Community {
    /// Local name of the element feeding `field`, honouring renames.
    #[must_use]
    pub fn element_for(&self, field: Field, default: &'static str) -> &'static str {
        self.renames
            .iter()
            .find(|r| r.field == field)
            .map_or(default, |r| r.element)
    }

    /// True when `url` points at this community's endpoint (and set, if the
    /// endpoint is shared).
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        let (endpoint, query) = url.split_once('?').unwrap_or((url, ""));
        if strip_scheme(endpoint) != strip_scheme(self.url) {
            return false;
        }
        match self.oai_set {
            None => true,
            Some(set) => query
                .split('&')
                .any(|pair| pair.strip_prefix("set=") == Some(set)),
        }
    }
}

fn strip_scheme(url: &str) -> &str {
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    url.trim_end_matches('/')
}

const HERBADROP_PROFILE: JsonProfile = JsonProfile {
    signature: &["/id", "/metadata/basisOfRecord"],
    fields: &[
        (Field::Title, &["/metadata/title", "/metadata/scientificName"]),
        (Field::Keywords, &["/metadata/scientificName", "/metadata/family", "/metadata/genus"]),
        (Field::Description, &["/metadata/description", "/metadata/locality"]),
        (Field::Identifier, &["/identifier", "/pid", "/doi"]),
        (Field::Creator, &["/metadata/recordedBy"]),
        (Field::Publisher, &["/metadata/institutionCode"]),
        (Field::PublicationDate, &["/metadata/eventDate", "/metadata/modified"]),
        (Field::Rights, &["/metadata/license", "/metadata/accessRights"]),
        (Field::Language, &["/metadata/language"]),
        (Field::Format, &["/metadata/format"]),
        (Field::ResourceType, &["/metadata/type", "/metadata/basisOfRecord"]),
        (Field::Places, &["/metadata/country", "/metadata/locality"]),
        (Field::TemporalCoverage, &["/metadata/eventDate"]),
        (Field::Relation, &["/metadata/references"]),
    ],
    latitude: Some("/metadata/decimalLatitude"),
    longitude: Some("/metadata/decimalLongitude"),
};

/// Herbadrop publishes the specimen type as two terms; the catalogue
/// indexes them as one `type|basisOfRecord` resource type.
fn herbadrop_update(doc: &mut Document, raw: &RawDocument) {
    let Some(json) = raw.json() else {
        return;
    };
    let term = |pointer: &str| {
        json.pointer(pointer)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let combined: Vec<&str> = [term("/metadata/type"), term("/metadata/basisOfRecord")]
        .into_iter()
        .flatten()
        .collect();
    if !combined.is_empty() {
        doc.resource_type = vec![combined.join("|")];
    }
}

/// All known communities.
pub static COMMUNITIES: &[Community] = &[
    Community {
        name: "darus",
        label: "DaRUS",
        url: "https://darus.uni-stuttgart.de/oai",
        schema: SchemaType::DataCite,
        oai_metadata_prefix: Some("oai_datacite"),
        oai_set: None,
        discipline: "Various",
        identifiers: IdentifierRules {
            doi_prefix: Some("10.18419"),
            handle_prefix: None,
        },
        renames: &[],
        json_profile: None,
        update: None,
    },
    Community {
        name: "psi",
        label: "Paul Scherrer Institute",
        url: "https://oai.datacite.org/oai",
        schema: SchemaType::DataCite,
        oai_metadata_prefix: Some("oai_datacite"),
        oai_set: Some("ETHZ.PSI"),
        discipline: "Basic Biological and Medical Research",
        identifiers: IdentifierRules {
            doi_prefix: Some("10.16907"),
            handle_prefix: None,
        },
        renames: &[],
        json_profile: None,
        update: None,
    },
    Community {
        name: "slks",
        label: "Slots- og Kulturstyrelsen",
        url: "https://www.kulturarv.dk/ffpublic/oai",
        schema: SchemaType::DublinCore,
        oai_metadata_prefix: Some("oai_dc"),
        oai_set: None,
        discipline: "Humanities and Social Sciences; Humanities; Archaeology",
        identifiers: IdentifierRules {
            doi_prefix: None,
            handle_prefix: None,
        },
        renames: &[FieldRename {
            field: Field::Contact,
            element: "rightsHolder",
        }],
        json_profile: None,
        update: None,
    },
    Community {
        name: "herbadrop",
        label: "Herbadrop",
        url: "https://opendata.cines.fr/herbadrop-api/rest/data/mnhnftp",
        schema: SchemaType::CommunityJson,
        oai_metadata_prefix: None,
        oai_set: None,
        discipline: "Life Sciences; Biology; Botany",
        identifiers: IdentifierRules {
            doi_prefix: None,
            handle_prefix: Some("21.T11998/"),
        },
        renames: &[],
        json_profile: Some(&HERBADROP_PROFILE),
        update: Some(herbadrop_update),
    },
];

/// Look up a community by identifier.
#[must_use]
pub fn find(name: &str) -> Option<&'static Community> {
    COMMUNITIES.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Community whose endpoint `url` points at.
#[must_use]
pub fn by_url(url: &str) -> Option<&'static Community> {
    COMMUNITIES.iter().find(|c| c.matches_url(url))
}
