//! DataCite reader.
//!
//! Reads the DataCite metadata kernel (versions 3 and 4) as a bare `resource`,
//! inside an `oai_datacite` payload or inside an OAI-PMH record.
//!
//! Geolocations are read in both kernel forms: child elements
//! (`pointLongitude`, `westBoundLongitude`, ...) and the kernel 3 text form
//! (`lat lon` for points, `south west north east` for boxes). Points take
//! precedence over boxes.

use crate::community::IdentifierRules;
use crate::document::{Document, Field};
use crate::error::{ExtractionFailure, IngestError, Result};
use crate::geometry::{normalize_bbox, normalize_point, BoxOrder, Geometry};
use crate::xml::XmlElement;

use super::{apply_field, Extraction};

/// Date types describing the period the data covers.
const COVERAGE_DATE_TYPES: &[&str] = &["Collected", "Coverage", "Valid"];

/// Date types usable as publication date when `publicationYear` is missing.
const PUBLICATION_DATE_TYPES: &[&str] = &["Issued", "Available", "Created"];

/// Reader for DataCite records.
#[derive(Debug, Clone, Default)]
pub struct DataCiteReader {
    rules: IdentifierRules,
}

/// `container/item` children with text.
fn list<'a>(resource: &'a XmlElement, container: &str, item: &'a str) -> Vec<&'a XmlElement> {
    resource
        .child(container)
        .map(|c| c.children_named(item).filter(|e| !e.all_text().is_empty()).collect())
        .unwrap_or_default()
}

fn texts(elements: &[&XmlElement]) -> Vec<String> {
    elements.iter().map(|e| e.all_text().to_string()).collect()
}

/// Text of the first direct child `name`, as a zero- or one-element list.
fn child_texts(resource: &XmlElement, name: &str) -> Vec<String> {
    resource.child_text(name).map(str::to_string).into_iter().collect()
}

fn names(resource: &XmlElement, container: &str, item: &str, name: &str) -> Vec<String> {
    resource
        .child(container)
        .map(|c| {
            c.children_named(item)
                .filter_map(|person| person.child_text(name))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn split_tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

impl DataCiteReader {
    /// Create a reader applying the given identifier conventions.
    #[must_use]
    pub fn new(rules: IdentifierRules) -> Self {
        DataCiteReader { rules }
    }

    pub(crate) fn extract(
        &self,
        root: &XmlElement,
        doc: &mut Document,
        log: &mut Extraction<'_>,
    ) -> Result<()> {
        let resource = root
            .find("resource")
            .ok_or_else(|| IngestError::Parse("No DataCite resource element".to_string()))?;
        let rules = self.rules;

        let mut identifiers: Vec<String> = resource
            .children_named("identifier")
            .map(|e| e.text().to_string())
            .collect();
        identifiers.extend(texts(&list(resource, "alternateIdentifiers", "alternateIdentifier")));
        apply_field(doc, Field::Identifier, &identifiers, rules, log);

        let titles = list(resource, "titles", "title");
        let main_titles: Vec<&XmlElement> = titles
            .iter()
            .copied()
            .filter(|t| t.attr("titleType").is_none())
            .chain(titles.iter().copied())
            .collect();
        apply_field(doc, Field::Title, &texts(&main_titles), rules, log);

        let descriptions = list(resource, "descriptions", "description");
        let (abstracts, others): (Vec<&XmlElement>, Vec<&XmlElement>) = descriptions
            .into_iter()
            .partition(|d| d.attr("descriptionType") == Some("Abstract"));
        let ordered: Vec<&XmlElement> = abstracts.into_iter().chain(others).collect();
        apply_field(doc, Field::Description, &texts(&ordered), rules, log);

        let keywords = texts(&list(resource, "subjects", "subject"));
        apply_field(doc, Field::Keywords, &keywords, rules, log);
        let creators = names(resource, "creators", "creator", "creatorName");
        apply_field(doc, Field::Creator, &creators, rules, log);
        apply_field(doc, Field::Publisher, &child_texts(resource, "publisher"), rules, log);

        self.extract_contributors(resource, doc, log);
        self.extract_dates(resource, doc, log);

        apply_field(doc, Field::Language, &child_texts(resource, "language"), rules, log);

        if let Some(resource_type) = resource.child("resourceType") {
            let mut types = Vec::new();
            if let Some(general) = resource_type.attr("resourceTypeGeneral") {
                types.push(general.to_string());
            }
            let specific = resource_type.text();
            if !specific.is_empty() && !types.iter().any(|t| t == specific) {
                types.push(specific.to_string());
            }
            apply_field(doc, Field::ResourceType, &types, rules, log);
        }

        apply_field(doc, Field::Size, &texts(&list(resource, "sizes", "size")), rules, log);
        apply_field(doc, Field::Format, &texts(&list(resource, "formats", "format")), rules, log);
        apply_field(doc, Field::Version, &child_texts(resource, "version"), rules, log);

        if let Some(rights_list) = resource.child("rightsList") {
            let mut rights = Vec::new();
            for entry in rights_list.children_named("rights") {
                if !entry.text().is_empty() {
                    rights.push(entry.text().to_string());
                }
                if let Some(uri) = entry.attr("rightsURI") {
                    rights.push(uri.to_string());
                }
            }
            apply_field(doc, Field::Rights, &rights, rules, log);
        }

        let related = texts(&list(resource, "relatedIdentifiers", "relatedIdentifier"));
        apply_field(doc, Field::Relation, &related, rules, log);
        doc.funding_reference.extend(funding_references(resource));

        self.extract_geolocations(resource, doc, log);
        Ok(())
    }

    fn extract_contributors(
        &self,
        resource: &XmlElement,
        doc: &mut Document,
        log: &mut Extraction<'_>,
    ) {
        let Some(contributors) = resource.child("contributors") else {
            return;
        };
        let mut contacts = Vec::new();
        let mut others = Vec::new();
        for contributor in contributors.children_named("contributor") {
            let Some(name) = contributor.child_text("contributorName") else {
                continue;
            };
            if contributor.attr("contributorType") == Some("ContactPerson") {
                contacts.push(name.to_string());
            } else {
                others.push(name.to_string());
            }
        }
        apply_field(doc, Field::Contact, &contacts, self.rules, log);
        apply_field(doc, Field::Contributor, &others, self.rules, log);
    }

    fn extract_dates(&self, resource: &XmlElement, doc: &mut Document, log: &mut Extraction<'_>) {
        let dates = list(resource, "dates", "date");
        let of_types = |types: &[&str]| -> Vec<String> {
            dates
                .iter()
                .filter(|d| d.attr("dateType").is_some_and(|t| types.iter().any(|ty| *ty == t)))
                .map(|d| d.text().to_string())
                .collect()
        };

        let mut publication: Vec<String> =
            resource.child_text("publicationYear").map(str::to_string).into_iter().collect();
        publication.extend(of_types(PUBLICATION_DATE_TYPES));
        apply_field(doc, Field::PublicationDate, &publication, self.rules, log);

        apply_field(doc, Field::TemporalCoverage, &of_types(COVERAGE_DATE_TYPES), self.rules, log);
    }

    fn extract_geolocations(
        &self,
        resource: &XmlElement,
        doc: &mut Document,
        log: &mut Extraction<'_>,
    ) {
        let Some(locations) = resource.child("geoLocations") else {
            return;
        };
        let locations: Vec<&XmlElement> = locations.children_named("geoLocation").collect();

        let points = locations.iter().filter_map(|l| l.child("geoLocationPoint")).map(read_point);
        let boxes = locations.iter().filter_map(|l| l.child("geoLocationBox")).map(read_box);
        for candidate in points.chain(boxes) {
            match candidate {
                Ok(geometry) => {
                    doc.geometry = Some(geometry);
                    break;
                },
                Err(failure) => log.record(failure),
            }
        }

        let places: Vec<String> = locations
            .iter()
            .flat_map(|l| l.children_named("geoLocationPlace"))
            .map(XmlElement::all_text)
            .filter(|place| !place.is_empty())
            .map(str::to_string)
            .collect();
        apply_field(doc, Field::Places, &places, self.rules, log);
    }
}

fn read_point(point: &XmlElement) -> std::result::Result<Geometry, ExtractionFailure> {
    let lon = point.child_text("pointLongitude");
    let lat = point.child_text("pointLatitude");
    let coordinates = match (lon, lat) {
        (Some(lon), Some(lat)) => vec![lon, lat],
        _ => {
            // kernel 3: "lat lon"
            let mut tokens = split_tokens(point.text());
            tokens.reverse();
            tokens
        },
    };
    normalize_point(&coordinates).map(Geometry::Point)
}

fn read_box(bbox: &XmlElement) -> std::result::Result<Geometry, ExtractionFailure> {
    let limits = [
        bbox.child_text("westBoundLongitude"),
        bbox.child_text("southBoundLatitude"),
        bbox.child_text("eastBoundLongitude"),
        bbox.child_text("northBoundLatitude"),
    ];
    if let [Some(w), Some(s), Some(e), Some(n)] = limits {
        return normalize_bbox(&[w, s, e, n], BoxOrder::WestSouthEastNorth).map(Geometry::Box);
    }
    normalize_bbox(&split_tokens(bbox.text()), BoxOrder::SouthWestNorthEast).map(Geometry::Box)
}

/// Award URIs, or `funder, award number` when a funding reference has no URI.
fn funding_references(resource: &XmlElement) -> Vec<String> {
    let Some(references) = resource.child("fundingReferences") else {
        return Vec::new();
    };
    references
        .children_named("fundingReference")
        .filter_map(|reference| {
            let award = reference.child("awardNumber");
            if let Some(uri) = award.and_then(|a| a.attr("awardURI")) {
                return Some(uri.to_string());
            }
            let award = award.map(XmlElement::text).filter(|t| !t.is_empty())?;
            Some(match reference.child_text("funderName") {
                Some(funder) => format!("{funder}, {award}"),
                None => award.to_string(),
            })
        })
        .collect()
}
