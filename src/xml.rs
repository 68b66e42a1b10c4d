//! Namespace-aware XML element tree.
//!
//! Harvested XML is read once into an [`XmlElement`] tree using `quick-xml`
//! events. Readers then query the tree by local name, which makes them
//! independent of the prefixes a provider picked (`dc:title`, `oai_dc:title`,
//! a default namespace, or none at all).
//!
//! # Examples
//!
//! ```
//! use mdingest::xml::parse_xml;
//!
//! let root = parse_xml(r#"<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
//!     xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Soil cores</dc:title></oai_dc:dc>"#)?;
//! assert_eq!(root.name, "dc");
//! assert_eq!(root.namespace.as_deref(), Some("http://www.openarchives.org/OAI/2.0/oai_dc/"));
//! assert_eq!(root.texts("title"), vec!["Soil cores".to_string()]);
//! # Ok::<(), mdingest::IngestError>(())
//! ```

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IngestError, Result};

/// An XML element with its attributes, direct text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Namespace prefix as written in the source, if any.
    pub prefix: Option<String>,
    /// Local element name.
    pub name: String,
    /// Resolved namespace URI.
    pub namespace: Option<String>,
    /// Attributes keyed by their qualified name, in document order.
    /// Namespace declarations are not included.
    pub attributes: IndexMap<String, String>,
    /// Direct text and CDATA runs, joined by a single space.
    pub text: String,
    /// Text of this element and all its descendants in document order,
    /// runs joined by a single space. Differs from `text` only for mixed
    /// content such as `Growth of <i>E. coli</i>`.
    pub content: String,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Look up an attribute by qualified (`xsi:type`) or local (`type`) name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.attributes.get(name) {
            return Some(value.as_str());
        }
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == name)
            .map(|(_, value)| value.as_str())
    }

    /// True when the element carries at least one attribute.
    #[must_use]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Trimmed direct text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Trimmed text including inline child markup.
    #[must_use]
    pub fn all_text(&self) -> &str {
        self.content.trim()
    }

    /// First direct child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first direct child with the given local name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlElement::text).filter(|t| !t.is_empty())
    }

    /// All elements in this subtree (self included) with the given local
    /// name, in document order.
    #[must_use]
    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    /// First element in this subtree with the given local name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Non-empty trimmed texts of every element named `name` in this subtree.
    #[must_use]
    pub fn texts(&self, name: &str) -> Vec<String> {
        self.find_all(name)
            .into_iter()
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Like [`XmlElement::texts`], but keeps the text of inline children.
    #[must_use]
    pub fn all_texts(&self, name: &str) -> Vec<String> {
        self.find_all(name)
            .into_iter()
            .map(XmlElement::all_text)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect(name, found);
        }
    }
}

/// The part of a qualified name after the prefix separator.
#[must_use]
pub fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Deepest element nesting accepted by [`parse_xml`].
pub const MAX_DEPTH: usize = 256;

type Scope = Vec<(Option<String>, String)>;

fn resolve(scopes: &[Scope], prefix: Option<&str>) -> Option<String> {
    scopes.iter().rev().find_map(|scope| {
        scope
            .iter()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.clone())
    })
}

fn open_element(start: &BytesStart<'_>, scopes: &mut Vec<Scope>) -> Result<XmlElement> {
    let qname = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let (prefix, name) = match qname.split_once(':') {
        Some((p, local)) => (Some(p.to_string()), local.to_string()),
        None => (None, qname.clone()),
    };

    let mut attributes = IndexMap::new();
    let mut scope = Scope::new();
    for attr in start.attributes() {
        let attr =
            attr.map_err(|e| IngestError::Parse(format!("Invalid attribute in <{qname}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| IngestError::Parse(format!("Invalid attribute value in <{qname}>: {e}")))?
            .into_owned();
        if key == "xmlns" {
            scope.push((None, value));
        } else if let Some(p) = key.strip_prefix("xmlns:") {
            scope.push((Some(p.to_string()), value));
        } else {
            attributes.insert(key, value);
        }
    }
    scopes.push(scope);

    let namespace = resolve(scopes, prefix.as_deref());
    Ok(XmlElement {
        prefix,
        name,
        namespace,
        attributes,
        text: String::new(),
        content: String::new(),
        children: Vec::new(),
    })
}

/// Parse an XML document into its root element.
///
/// # Errors
///
/// Returns [`IngestError::Parse`] when the document is not well-formed,
/// nests elements deeper than [`MAX_DEPTH`] or contains no element.
pub fn parse_xml(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut scopes: Vec<Scope> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            IngestError::Parse(format!(
                "Malformed XML at position {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(start) => {
                check_depth(stack.len() + 1)?;
                let element = open_element(&start, &mut scopes)?;
                stack.push(element);
            },
            Event::Empty(start) => {
                check_depth(stack.len() + 1)?;
                let element = open_element(&start, &mut scopes)?;
                scopes.pop();
                attach(element, &mut stack, &mut root);
            },
            Event::End(_) => {
                scopes.pop();
                if let Some(element) = stack.pop() {
                    attach(element, &mut stack, &mut root);
                }
            },
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| IngestError::Parse(format!("Invalid text content: {e}")))?;
                    append_run(&mut current.text, &text);
                    append_run(&mut current.content, &text);
                }
            },
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    append_run(&mut current.text, &text);
                    append_run(&mut current.content, &text);
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if !stack.is_empty() {
        return Err(IngestError::Parse(format!(
            "Unclosed element <{}>",
            stack.last().map_or("", |e| e.name.as_str())
        )));
    }
    root.ok_or_else(|| IngestError::Parse("Document contains no XML element".to_string()))
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(IngestError::Parse(format!(
            "Elements nested deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

/// Append a text run, separated from earlier runs by one space.
fn append_run(buffer: &mut String, run: &str) {
    let run = run.trim();
    if run.is_empty() {
        return;
    }
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(run);
}

fn attach(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => {
            append_run(&mut parent.content, &element.content);
            parent.children.push(element);
        },
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OAI_RECORD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <GetRecord>
    <record>
      <header><identifier>oai:example.org:1</identifier></header>
      <metadata>
        <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
                   xmlns:dc="http://purl.org/dc/elements/1.1/"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
          <dc:title>Coastal &amp; marine survey</dc:title>
          <dc:subject>ocean</dc:subject>
          <dc:subject>  </dc:subject>
          <dc:subject><![CDATA[salinity <psu>]]></dc:subject>
          <dc:coverage xsi:type="dcterms:Point">east=-1.47; north=-78.82</dc:coverage>
          <dc:rights/>
        </oai_dc:dc>
      </metadata>
    </record>
  </GetRecord>
</OAI-PMH>"#;

    #[test]
    fn test_parse_oai_envelope() {
        let root = parse_xml(OAI_RECORD).unwrap();
        assert_eq!(root.name, "OAI-PMH");
        assert_eq!(
            root.namespace.as_deref(),
            Some("http://www.openarchives.org/OAI/2.0/")
        );
        let dc = root.find("dc").unwrap();
        assert_eq!(dc.prefix.as_deref(), Some("oai_dc"));
        assert_eq!(
            dc.namespace.as_deref(),
            Some("http://www.openarchives.org/OAI/2.0/oai_dc/")
        );
        let title = dc.child("title").unwrap();
        assert_eq!(
            title.namespace.as_deref(),
            Some("http://purl.org/dc/elements/1.1/")
        );
    }

    #[test]
    fn test_text_unescape_and_cdata() {
        let root = parse_xml(OAI_RECORD).unwrap();
        assert_eq!(root.texts("title"), vec!["Coastal & marine survey"]);
        assert_eq!(root.texts("subject"), vec!["ocean", "salinity <psu>"]);
    }

    #[test]
    fn test_attribute_lookup() {
        let root = parse_xml(OAI_RECORD).unwrap();
        let coverage = root.find("coverage").unwrap();
        assert_eq!(coverage.attr("xsi:type"), Some("dcterms:Point"));
        assert_eq!(coverage.attr("type"), Some("dcterms:Point"));
        assert!(coverage.has_attributes());
        assert!(!root.find("rights").unwrap().has_attributes());
    }

    #[test]
    fn test_namespace_declarations_are_not_attributes() {
        let root = parse_xml(r#"<a xmlns="urn:x" xmlns:b="urn:b"><b:c/></a>"#).unwrap();
        assert!(!root.has_attributes());
        assert_eq!(root.children[0].namespace.as_deref(), Some("urn:b"));
    }

    #[test]
    fn test_find_all_document_order() {
        let root = parse_xml("<r><s>1</s><x><s>2</s></x><s>3</s></r>").unwrap();
        let texts: Vec<&str> = root.find_all("s").into_iter().map(XmlElement::text).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_mixed_content_keeps_inline_text() {
        let root = parse_xml(
            "<dc><title>Growth of <i>E. coli</i> in soil</title>\
             <description>First line<br/>second line</description></dc>",
        )
        .unwrap();
        let title = root.child("title").unwrap();
        assert_eq!(title.all_text(), "Growth of E. coli in soil");
        assert_eq!(title.text(), "Growth of in soil");
        assert_eq!(root.all_texts("description"), vec!["First line second line"]);
    }

    #[test]
    fn test_container_content_in_document_order() {
        let root = parse_xml("<r>a<x>b<y>c</y></x>d<![CDATA[e]]></r>").unwrap();
        assert_eq!(root.all_text(), "a b c d e");
        assert_eq!(root.text(), "a d e");
    }

    #[test]
    fn test_nesting_depth_limit() {
        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert!(parse_xml(&nested(MAX_DEPTH)).is_ok());
        assert!(matches!(
            parse_xml(&nested(MAX_DEPTH + 1)),
            Err(IngestError::Parse(_))
        ));
        let empty_leaf = format!("{}<b/>{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert!(matches!(parse_xml(&empty_leaf), Err(IngestError::Parse(_))));
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("dcterms:POINT"), "POINT");
        assert_eq!(local_part("Box"), "Box");
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_xml("<a><b></a>"),
            Err(IngestError::Parse(_))
        ));
        assert!(matches!(parse_xml("<a>"), Err(IngestError::Parse(_))));
        assert!(matches!(parse_xml("just text"), Err(IngestError::Parse(_))));
    }
}
