//! Raw metadata documents as handed over by the harvesting layer.
//!
//! The core never fetches anything: it receives already-harvested bytes (or an
//! already-parsed tree) together with whatever the caller knows about the
//! provider. [`RawDocument::from_bytes`] takes care of transport-level
//! decoding (gzip envelope, byte-order mark or XML `encoding` label) and
//! parses the payload into an [`XmlElement`] tree or a JSON value.

use std::borrow::Cow;
use std::io::Read;

use encoding_rs::{Encoding, UTF_8};
use flate2::read::GzDecoder;
use lazy_static::lazy_static;
use regex::bytes::Regex;
use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::xml::{parse_xml, XmlElement};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Gzip envelopes unpacked before the payload must be plain text.
const MAX_GZIP_LAYERS: usize = 3;

lazy_static! {
    static ref XML_ENCODING_LABEL: Regex =
        Regex::new(r#"^\s*<\?xml[^>]*\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap();
}

/// Parsed body of a raw document.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An XML document (Dublin Core, DataCite, possibly inside an OAI-PMH envelope).
    Xml(XmlElement),
    /// A JSON object from a community-specific API.
    Json(Value),
}

/// One harvested metadata item.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Stable identifier of the record at its source (OAI identifier, file stem, ...).
    pub source_identifier: String,
    /// Endpoint the record was harvested from, when known.
    pub url: Option<String>,
    /// Community the caller already attributes this record to, when known.
    pub community: Option<String>,
    /// Parsed content.
    pub payload: Payload,
}

impl RawDocument {
    /// Wrap an already parsed payload.
    pub fn new(source_identifier: impl Into<String>, payload: Payload) -> Self {
        RawDocument {
            source_identifier: source_identifier.into(),
            url: None,
            community: None,
            payload,
        }
    }

    /// Decode and parse harvested bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Parse`] when the bytes cannot be decoded, are
    /// neither XML nor JSON, or are not well-formed, and
    /// [`IngestError::IoError`] when a gzip envelope is corrupt.
    pub fn from_bytes(source_identifier: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let text = decode_bytes(bytes)?;
        Self::from_text(source_identifier, &text)
    }

    /// Parse an already decoded document.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Parse`] when the text is neither well-formed
    /// XML nor JSON.
    pub fn from_text(source_identifier: impl Into<String>, text: &str) -> Result<Self> {
        let trimmed = text.trim_start();
        let payload = match trimmed.chars().next() {
            Some('<') => Payload::Xml(parse_xml(trimmed)?),
            Some('{' | '[') => Payload::Json(
                serde_json::from_str(trimmed)
                    .map_err(|e| IngestError::Parse(format!("Malformed JSON: {e}")))?,
            ),
            Some(c) => {
                return Err(IngestError::Parse(format!(
                    "Document is neither XML nor JSON (starts with {c:?})"
                )))
            },
            None => return Err(IngestError::Parse("Empty document".to_string())),
        };
        Ok(Self::new(source_identifier, payload))
    }

    /// Attach the endpoint the record was harvested from.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach a community the caller already knows the record belongs to.
    #[must_use]
    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = Some(community.into());
        self
    }

    /// The XML tree, if this is an XML document.
    #[must_use]
    pub fn xml(&self) -> Option<&XmlElement> {
        match &self.payload {
            Payload::Xml(root) => Some(root),
            Payload::Json(_) => None,
        }
    }

    /// The JSON value, if this is a JSON document.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Json(value) => Some(value),
            Payload::Xml(_) => None,
        }
    }
}

/// Decode harvested bytes to text.
///
/// A gzip envelope is unpacked first. The character set is taken from a
/// byte-order mark, then from the XML declaration's `encoding` label, and
/// defaults to UTF-8.
///
/// # Errors
///
/// Returns [`IngestError::IoError`] for a corrupt gzip stream and
/// [`IngestError::Parse`] for bytes that are invalid in the detected charset
/// or wrapped in more than three gzip envelopes.
pub fn decode_bytes(bytes: &[u8]) -> Result<String> {
    let mut bytes = Cow::Borrowed(bytes);
    let mut layers = 0;
    while bytes.starts_with(&GZIP_MAGIC) {
        layers += 1;
        if layers > MAX_GZIP_LAYERS {
            return Err(IngestError::Parse(format!(
                "More than {MAX_GZIP_LAYERS} nested gzip envelopes"
            )));
        }
        let mut inflated = Vec::new();
        GzDecoder::new(&bytes[..]).read_to_end(&mut inflated)?;
        bytes = Cow::Owned(inflated);
    }
    let bytes: &[u8] = &bytes;

    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (declared_encoding(bytes).unwrap_or(UTF_8), bytes),
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(IngestError::Parse(format!(
            "Document is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let caps = XML_ENCODING_LABEL.captures(bytes)?;
    // A declaration readable as ASCII rules out UTF-16.
    Encoding::for_label(caps.get(1)?.as_bytes()).map(Encoding::output_encoding)
}
