//! Dublin Core reader.
//!
//! Reads simple and qualified Dublin Core, bare or wrapped in an OAI-PMH
//! record. Elements are matched by local name, so `dc:`, `dcterms:` and
//! unprefixed elements are treated alike. The element crosswalk:
//!
//! - **title** → `title` (first)
//! - **description** → `description`
//! - **subject** → `keywords`
//! - **identifier** → `doi`, `pid`, `source`
//! - **relation**, **source** → `related_identifier`; relations naming a
//!   grant agreement also → `funding_reference`
//! - **creator**, **publisher**, **contributor**, **rights**, **language**
//! - **type** → `resource_type`, **format** → `format`
//! - **date** → `publication_year`
//! - **extent** → `size`, **hasVersion** → `version`
//! - **spatial**, **coverage** → `geometry`, `places`
//! - **temporal**, `Period`-typed **coverage** → temporal coverage
//!
//! A community may feed a field from another element, e.g. the contact from
//! `rightsHolder`.

use crate::community::{Community, IdentifierRules};
use crate::document::{Document, Field};
use crate::sniffer::metadata_element;
use crate::xml::XmlElement;

use super::{apply_field, spatial, Extraction};

/// Default source element per field.
const CROSSWALK: &[(Field, &str)] = &[
    (Field::Title, "title"),
    (Field::Description, "description"),
    (Field::Keywords, "subject"),
    (Field::Identifier, "identifier"),
    (Field::Relation, "relation"),
    (Field::Creator, "creator"),
    (Field::Publisher, "publisher"),
    (Field::Contributor, "contributor"),
    (Field::PublicationDate, "date"),
    (Field::Rights, "rights"),
    (Field::Language, "language"),
    (Field::ResourceType, "type"),
    (Field::Format, "format"),
    (Field::Size, "extent"),
    (Field::Version, "hasVersion"),
];

/// Reader for Dublin Core records.
#[derive(Debug, Clone, Default)]
pub struct DublinCoreReader {
    community: Option<&'static Community>,
}

impl DublinCoreReader {
    /// Create a reader, optionally refined by a community.
    #[must_use]
    pub fn new(community: Option<&'static Community>) -> Self {
        DublinCoreReader { community }
    }

    fn rules(&self) -> IdentifierRules {
        self.community.map(|c| c.identifiers).unwrap_or_default()
    }

    fn element(&self, field: Field, default: &'static str) -> &'static str {
        self.community
            .map_or(default, |c| c.element_for(field, default))
    }

    pub(crate) fn extract(&self, root: &XmlElement, doc: &mut Document, log: &mut Extraction<'_>) {
        let metadata = metadata_element(root);
        let rules = self.rules();

        for &(field, default) in CROSSWALK {
            let values = metadata.all_texts(self.element(field, default));
            apply_field(doc, field, &values, rules, log);
        }

        // Dublin Core has no contact element; only a rename supplies one.
        let contact = self.element(Field::Contact, "");
        if !contact.is_empty() {
            apply_field(doc, Field::Contact, &metadata.all_texts(contact), rules, log);
        }

        doc.related_identifier.extend(crate::text::clean_all(metadata.texts("source")));

        self.extract_spatial(metadata, doc, log);
        self.extract_temporal(metadata, doc, log);
    }

    fn extract_spatial(&self, metadata: &XmlElement, doc: &mut Document, log: &mut Extraction<'_>) {
        let candidates = spatial::candidates(metadata);
        let found = spatial::find_geometry(&candidates, log);
        let consumed = found.as_ref().map(|(_, element)| *element);
        let places = spatial::places(&candidates, consumed);
        doc.geometry = found.map(|(geometry, _)| geometry);
        apply_field(doc, Field::Places, &places, self.rules(), log);
    }

    fn extract_temporal(
        &self,
        metadata: &XmlElement,
        doc: &mut Document,
        log: &mut Extraction<'_>,
    ) {
        let mut periods = Vec::new();
        collect_periods(metadata, &mut periods);
        apply_field(doc, Field::TemporalCoverage, &periods, self.rules(), log);
    }
}

/// Texts of `temporal` elements and `Period`-typed `coverage` elements, in
/// document order.
fn collect_periods(element: &XmlElement, found: &mut Vec<String>) {
    let is_period = match element.name.as_str() {
        "temporal" => true,
        "coverage" => spatial::scheme(element).as_deref() == Some("period"),
        _ => false,
    };
    if is_period && !element.text().is_empty() {
        found.push(element.text().to_string());
    }
    for child in &element.children {
        collect_periods(child, found);
    }
}
