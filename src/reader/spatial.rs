//! Dublin Core spatial coverage.
//!
//! Geometry is looked for among `spatial` and `coverage` elements, trying the
//! encodings in a fixed precedence and keeping the first that yields a valid
//! geometry:
//!
//! | | element | value |
//! |---|---|---|
//! | A | typed `Point` | `lon,lat` or `lon lat` |
//! | B | typed `Point` | `east=..; north=..` |
//! | C | typed `Box` | `S E N W` tokens, or `northlimit=..; southlimit=..; ...` |
//! | D | untyped | `North x, South y, East z, West w` |
//!
//! Type names are compared case-insensitively after the namespace prefix, so
//! `dcterms:POINT`, `dcterms:Point` and `DCTERMS:Box` are all recognized.

use lazy_static::lazy_static;
use regex::Regex;

use crate::dcmi::parse_components;
use crate::error::ExtractionFailure;
use crate::geometry::{normalize_bbox, normalize_point, BoxOrder, Geometry};
use crate::xml::{local_part, XmlElement};

use super::Extraction;

const FIELD: &str = "geometry";

lazy_static! {
    static ref DIRECTION: Regex =
        Regex::new(r"(?i)\b(north|south|east|west)\b\s*[:=]?\s*([+-]?\d+(?:\.\d+)?)").unwrap();
}

type Encoding = fn(&XmlElement) -> Option<Result<Geometry, ExtractionFailure>>;

/// `spatial` and `coverage` elements in document order.
pub(crate) fn candidates(root: &XmlElement) -> Vec<&XmlElement> {
    fn walk<'a>(element: &'a XmlElement, found: &mut Vec<&'a XmlElement>) {
        if element.name == "spatial" || element.name == "coverage" {
            found.push(element);
        }
        for child in &element.children {
            walk(child, found);
        }
    }
    let mut found = Vec::new();
    walk(root, &mut found);
    found
}

/// Local, lowercased name of the element's encoding scheme (`xsi:type`).
pub(crate) fn scheme(element: &XmlElement) -> Option<String> {
    element
        .attr("type")
        .map(|t| local_part(t.trim()).to_ascii_lowercase())
}

/// First geometry among `candidates`, with the element it came from.
///
/// Candidates matching an encoding but holding unusable values are recorded
/// as failures and the search goes on.
pub(crate) fn find_geometry<'a>(
    candidates: &[&'a XmlElement],
    log: &mut Extraction<'_>,
) -> Option<(Geometry, &'a XmlElement)> {
    let encodings: [Encoding; 4] = [bare_point, labelled_point, typed_box, labelled_coverage];
    for encoding in encodings {
        for &element in candidates {
            match encoding(element) {
                Some(Ok(geometry)) => return Some((geometry, element)),
                Some(Err(failure)) => log.record(failure),
                None => {},
            }
        }
    }
    None
}

/// Free-text place names: untyped `spatial` elements other than `consumed`.
pub(crate) fn places(candidates: &[&XmlElement], consumed: Option<&XmlElement>) -> Vec<String> {
    candidates
        .iter()
        .filter(|e| e.name == "spatial" && !e.has_attributes())
        .filter(|e| !consumed.is_some_and(|c| std::ptr::eq(c, **e)))
        .map(|e| e.text().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Two or four decimal numbers and nothing else, e.g. `9.81, 56.30`.
/// Plain integers are left alone since they are usually years.
fn bare_coordinates(text: &str) -> bool {
    let tokens = tokens(text);
    matches!(tokens.len(), 2 | 4)
        && tokens.iter().all(|t| t.parse::<f64>().is_ok())
        && tokens.iter().any(|t| t.contains('.'))
}

fn component<'a>(
    map: &'a indexmap::IndexMap<String, String>,
    key: &str,
    text: &str,
) -> Result<&'a str, ExtractionFailure> {
    map.get(key)
        .map(String::as_str)
        .ok_or_else(|| ExtractionFailure::new(FIELD, format!("missing {key} in '{text}'")))
}

fn components(
    text: &str,
    kind: &str,
) -> Result<indexmap::IndexMap<String, String>, ExtractionFailure> {
    parse_components(text)
        .ok_or_else(|| ExtractionFailure::new(FIELD, format!("malformed DCMI {kind} '{text}'")))
}

/// A: typed point with bare `lon,lat` tokens.
fn bare_point(element: &XmlElement) -> Option<Result<Geometry, ExtractionFailure>> {
    let text = element.text();
    if scheme(element)? != "point" || text.contains('=') {
        return None;
    }
    Some(normalize_point(&tokens(text)).map(Geometry::Point))
}

/// B: typed point with DCMI `east=`/`north=` components.
fn labelled_point(element: &XmlElement) -> Option<Result<Geometry, ExtractionFailure>> {
    let text = element.text();
    if scheme(element)? != "point" || !text.contains('=') {
        return None;
    }
    Some(components(text, "Point").and_then(|map| {
        let east = component(&map, "east", text)?;
        let north = component(&map, "north", text)?;
        normalize_point(&[east, north]).map(Geometry::Point)
    }))
}

/// C: typed box, bare tokens in south, east, north, west order or DCMI limits.
fn typed_box(element: &XmlElement) -> Option<Result<Geometry, ExtractionFailure>> {
    let text = element.text();
    if scheme(element)? != "box" {
        return None;
    }
    if !text.contains('=') {
        return Some(normalize_bbox(&tokens(text), BoxOrder::SouthEastNorthWest).map(Geometry::Box));
    }
    Some(components(text, "Box").and_then(|map| {
        let limits = [
            component(&map, "northlimit", text)?,
            component(&map, "southlimit", text)?,
            component(&map, "eastlimit", text)?,
            component(&map, "westlimit", text)?,
        ];
        normalize_bbox(&limits, BoxOrder::NorthSouthEastWest).map(Geometry::Box)
    }))
}

/// D: untyped coverage naming all four directions.
///
/// Partially labelled text and bare numbers are failures: their axis order
/// cannot be known. Text without any coordinate is not geometric.
fn labelled_coverage(element: &XmlElement) -> Option<Result<Geometry, ExtractionFailure>> {
    if element.has_attributes() {
        return None;
    }
    let text = element.text();
    let mut limits: [Option<&str>; 4] = [None; 4];
    for caps in DIRECTION.captures_iter(text) {
        let (Some(label), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let slot = match label.as_str().to_ascii_lowercase().as_str() {
            "north" => 0,
            "south" => 1,
            "east" => 2,
            _ => 3,
        };
        if limits[slot].is_none() {
            limits[slot] = Some(value.as_str());
        }
    }

    match limits {
        [Some(n), Some(s), Some(e), Some(w)] => {
            Some(normalize_bbox(&[n, s, e, w], BoxOrder::NorthSouthEastWest).map(Geometry::Box))
        },
        [None, None, None, None] if bare_coordinates(text) => Some(Err(ExtractionFailure::new(
            FIELD,
            format!("unlabelled coordinates without declared encoding '{text}'"),
        ))),
        [None, None, None, None] => None,
        _ => Some(Err(ExtractionFailure::new(
            FIELD,
            format!("coverage does not name all four directions '{text}'"),
        ))),
    }
}
