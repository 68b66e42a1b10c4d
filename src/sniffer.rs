//! Classification of raw documents into reader variants.
//!
//! [`detect`] decides which reader handles a document. The policy is applied in
//! order and the first rule that yields an answer wins:
//!
//! 1. an explicit community on the document,
//! 2. the provider URL, matched against the community endpoints,
//! 3. the content itself: the namespace, declared schema location or name of
//!    the metadata element (unwrapping an OAI-PMH envelope), or for JSON the
//!    field set declared by a community profile.
//!
//! Everything is table driven and stateless, so the same input always
//! classifies the same way.
//!
//! # Examples
//!
//! ```
//! use mdingest::input::RawDocument;
//! use mdingest::sniffer::{detect, SchemaType};
//!
//! let raw = RawDocument::from_text(
//!     "oai:example.org:1",
//!     r#"<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"/>"#,
//! )?;
//! let variant = detect(&raw)?;
//! assert_eq!(variant.schema, SchemaType::DublinCore);
//! assert!(variant.community.is_none());
//! # Ok::<(), mdingest::IngestError>(())
//! ```

use std::fmt;

use tracing::debug;

use crate::community::{self, Community, COMMUNITIES};
use crate::error::{IngestError, Result};
use crate::input::{Payload, RawDocument};
use crate::reader::json::JsonProfile;
use crate::xml::XmlElement;

/// Source schema families with a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    /// Simple or qualified Dublin Core, usually `oai_dc`.
    DublinCore,
    /// DataCite metadata kernel, bare or in an `oai_datacite` wrapper.
    DataCite,
    /// A community-specific JSON API.
    CommunityJson,
}

impl SchemaType {
    /// True for schemas delivered as JSON.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, SchemaType::CommunityJson)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemaType::DublinCore => "dublin_core",
            SchemaType::DataCite => "datacite",
            SchemaType::CommunityJson => "community_json",
        })
    }
}

/// The reader selected for a document.
#[derive(Debug, Clone, Copy)]
pub struct ReaderVariant {
    /// Base schema reader.
    pub schema: SchemaType,
    /// Community refinements, when the document is attributed to one.
    pub community: Option<&'static Community>,
}

impl PartialEq for ReaderVariant {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.community.map(|c| c.name) == other.community.map(|c| c.name)
    }
}

impl Eq for ReaderVariant {}

impl ReaderVariant {
    fn community(community: &'static Community) -> Self {
        ReaderVariant {
            schema: community.schema,
            community: Some(community),
        }
    }
}

/// What a content signature inspects on the metadata element.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Namespace URI starts with the given prefix.
    Namespace(&'static str),
    /// `schemaLocation` attribute mentions the given fragment.
    SchemaLocation(&'static str),
    /// Local element name, for documents without namespaces.
    Root(&'static str),
}

impl Matcher {
    fn matches(self, element: &XmlElement) -> bool {
        match self {
            Matcher::Namespace(prefix) => element
                .namespace
                .as_deref()
                .is_some_and(|ns| ns.starts_with(prefix)),
            Matcher::SchemaLocation(fragment) => element
                .attr("schemaLocation")
                .is_some_and(|loc| loc.contains(fragment)),
            Matcher::Root(name) => element.name == name,
        }
    }
}

/// Content signatures, most specific first.
static XML_SIGNATURES: &[(Matcher, SchemaType)] = &[
    (Matcher::Namespace("http://www.openarchives.org/OAI/2.0/oai_dc/"), SchemaType::DublinCore),
    (Matcher::Namespace("http://purl.org/dc/elements/1.1/"), SchemaType::DublinCore),
    (Matcher::Namespace("http://purl.org/dc/terms/"), SchemaType::DublinCore),
    (Matcher::Namespace("http://datacite.org/schema/kernel-"), SchemaType::DataCite),
    (Matcher::Namespace("http://schema.datacite.org/oai/oai-1.0/"), SchemaType::DataCite),
    (Matcher::SchemaLocation("schema.datacite.org/meta/kernel-"), SchemaType::DataCite),
    (Matcher::SchemaLocation("oai_dc.xsd"), SchemaType::DublinCore),
    (Matcher::Root("oai_datacite"), SchemaType::DataCite),
    (Matcher::Root("resource"), SchemaType::DataCite),
    (Matcher::Root("dc"), SchemaType::DublinCore),
];

/// The metadata element of a record: the first child of an OAI-PMH
/// `metadata` element when the document is wrapped, the root otherwise.
#[must_use]
pub fn metadata_element(root: &XmlElement) -> &XmlElement {
    root.find("metadata")
        .filter(|_| root.name == "OAI-PMH" || root.name == "record")
        .and_then(|metadata| metadata.children.first())
        .unwrap_or(root)
}

fn sniff_xml(root: &XmlElement) -> Option<SchemaType> {
    let element = metadata_element(root);
    XML_SIGNATURES
        .iter()
        .find(|(matcher, _)| matcher.matches(element))
        .map(|(_, schema)| *schema)
}

fn profile_matches(profile: &JsonProfile, value: &serde_json::Value) -> bool {
    !profile.signature.is_empty() && profile.signature.iter().all(|p| value.pointer(p).is_some())
}

fn sniff_json(value: &serde_json::Value) -> Option<&'static Community> {
    COMMUNITIES.iter().find(|c| {
        c.json_profile
            .is_some_and(|profile| profile_matches(profile, value))
    })
}

fn check_payload(variant: ReaderVariant, raw: &RawDocument) -> Result<ReaderVariant> {
    let is_json = matches!(raw.payload, Payload::Json(_));
    if variant.schema.is_json() == is_json {
        Ok(variant)
    } else {
        Err(IngestError::Classification(format!(
            "{} delivers {} but the document is {}",
            variant.community.map_or("source", |c| c.name),
            variant.schema,
            if is_json { "JSON" } else { "XML" }
        )))
    }
}

/// Select the reader variant for a raw document.
///
/// # Errors
///
/// Returns [`IngestError::Classification`] when the document names an
/// unknown community, when its payload does not fit the community's schema,
/// or when no signature matches its content.
pub fn detect(raw: &RawDocument) -> Result<ReaderVariant> {
    detect_as(raw, None)
}

/// Like [`detect`], assuming the `assumed` community when the document
/// names none.
///
/// # Errors
///
/// See [`detect`].
pub fn detect_as(raw: &RawDocument, assumed: Option<&str>) -> Result<ReaderVariant> {
    if let Some(name) = raw.community.as_deref().or(assumed) {
        let community = community::find(name)
            .ok_or_else(|| IngestError::Classification(format!("Unknown community '{name}'")))?;
        debug!(
            source = %raw.source_identifier,
            community = community.name,
            "classified by community"
        );
        return check_payload(ReaderVariant::community(community), raw);
    }

    if let Some(community) = raw.url.as_deref().and_then(community::by_url) {
        debug!(
            source = %raw.source_identifier,
            community = community.name,
            "classified by provider URL"
        );
        return check_payload(ReaderVariant::community(community), raw);
    }

    let variant = match &raw.payload {
        Payload::Xml(root) => sniff_xml(root).map(|schema| ReaderVariant {
            schema,
            community: None,
        }),
        Payload::Json(value) => sniff_json(value).map(ReaderVariant::community),
    };
    match variant {
        Some(variant) => {
            debug!(
                source = %raw.source_identifier,
                schema = %variant.schema,
                "classified by content"
            );
            Ok(variant)
        },
        None => Err(IngestError::Classification(format!(
            "No reader recognizes document '{}'",
            raw.source_identifier
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml(text: &str) -> RawDocument {
        RawDocument::from_text("test", text).unwrap()
    }

    #[test]
    fn test_oai_dc_namespace() {
        let raw = xml(r#"<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"/>"#);
        assert_eq!(detect(&raw).unwrap().schema, SchemaType::DublinCore);
    }

    #[test]
    fn test_datacite_inside_oai_envelope() {
        let raw = xml(
            r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"><GetRecord><record>
               <header><identifier>oai:x:1</identifier></header>
               <metadata><resource xmlns="http://datacite.org/schema/kernel-4"/></metadata>
               </record></GetRecord></OAI-PMH>"#,
        );
        let variant = detect(&raw).unwrap();
        assert_eq!(variant.schema, SchemaType::DataCite);
        assert!(variant.community.is_none());
    }

    #[test]
    fn test_oai_datacite_wrapper() {
        let raw = xml(
            r#"<oai_datacite xmlns="http://schema.datacite.org/oai/oai-1.0/"><payload>
               <resource xmlns="http://datacite.org/schema/kernel-3"/></payload></oai_datacite>"#,
        );
        assert_eq!(detect(&raw).unwrap().schema, SchemaType::DataCite);
    }

    #[test]
    fn test_schema_location() {
        let raw = xml(
            r#"<record xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
               xsi:schemaLocation="http://datacite.org/schema/kernel-4 http://schema.datacite.org/meta/kernel-4/metadata.xsd"/>"#,
        );
        assert_eq!(detect(&raw).unwrap().schema, SchemaType::DataCite);
    }

    #[test]
    fn test_explicit_community_wins_over_content() {
        let raw = xml(r#"<dc xmlns="http://purl.org/dc/elements/1.1/"/>"#).with_community("darus");
        let variant = detect(&raw).unwrap();
        assert_eq!(variant.schema, SchemaType::DataCite);
        assert_eq!(variant.community.map(|c| c.name), Some("darus"));
    }

    #[test]
    fn test_assumed_community_only_when_none_named() {
        let raw = xml(r#"<dc xmlns="http://purl.org/dc/elements/1.1/"/>"#);
        let variant = detect_as(&raw, Some("slks")).unwrap();
        assert_eq!(variant.community.map(|c| c.name), Some("slks"));

        let named = raw.with_community("darus");
        let variant = detect_as(&named, Some("slks")).unwrap();
        assert_eq!(variant.community.map(|c| c.name), Some("darus"));
    }

    #[test]
    fn test_url_classification() {
        let raw = xml("<anything/>").with_url("https://www.kulturarv.dk/ffpublic/oai");
        let variant = detect(&raw).unwrap();
        assert_eq!(variant.schema, SchemaType::DublinCore);
        assert_eq!(variant.community.map(|c| c.name), Some("slks"));
    }

    #[test]
    fn test_json_profile_signature() {
        let raw = RawDocument::from_text(
            "h",
            r#"{"id": "h1", "metadata": {"basisOfRecord": "PRESERVED_SPECIMEN"}}"#,
        )
        .unwrap();
        let variant = detect(&raw).unwrap();
        assert_eq!(variant.schema, SchemaType::CommunityJson);
        assert_eq!(variant.community.map(|c| c.name), Some("herbadrop"));
    }

    #[test]
    fn test_unmatched_is_classification_error() {
        assert!(matches!(
            detect(&xml("<html><body/></html>")),
            Err(IngestError::Classification(_))
        ));
        let json = RawDocument::from_text("j", r#"{"foo": 1}"#).unwrap();
        assert!(matches!(detect(&json), Err(IngestError::Classification(_))));
        let unknown = xml("<dc/>").with_community("nobody");
        assert!(matches!(detect(&unknown), Err(IngestError::Classification(_))));
    }

    #[test]
    fn test_payload_must_fit_community_schema() {
        let raw = RawDocument::from_text("j", r#"{"title": "x"}"#)
            .unwrap()
            .with_community("psi");
        assert!(matches!(detect(&raw), Err(IngestError::Classification(_))));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let raw = xml(r#"<resource xmlns="http://datacite.org/schema/kernel-4"/>"#);
        let first = detect(&raw).unwrap();
        for _ in 0..10 {
            assert_eq!(detect(&raw).unwrap(), first);
        }
    }
}
