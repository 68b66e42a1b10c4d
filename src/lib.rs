#![warn(missing_docs)]

//! # mdingest: scholarly metadata normalization
//!
//! Reads harvested research-data metadata (OAI-PMH Dublin Core, DataCite
//! kernel 3/4 XML, community JSON APIs) into one canonical [`Document`] and
//! turns it into a catalogue record for a CKAN-style dataset index.
//!
//! ## Quick Start
//!
//! ```
//! use mdingest::{IngestConfig, Pipeline, RawDocument};
//!
//! # fn main() -> mdingest::Result<()> {
//! let xml = r#"<resource xmlns="http://datacite.org/schema/kernel-4">
//!     <identifier identifierType="DOI">10.18419/darus-477</identifier>
//!     <titles><title>Flow field measurements</title></titles>
//!     <publisher>DaRUS</publisher>
//!     <publicationYear>2020</publicationYear>
//! </resource>"#;
//!
//! let raw = RawDocument::from_text("oai:darus.uni-stuttgart.de:doi:10.18419/darus-477", xml)?
//!     .with_community("darus");
//! let pipeline = Pipeline::new(IngestConfig::default())?;
//! let outcome = pipeline.process(&raw);
//!
//! let record = outcome.record().expect("record");
//! assert_eq!(record.owner_org, "darus");
//! assert_eq!(record.extra("DOI"), Some("https://doi.org/10.18419/darus-477"));
//! assert_eq!(record.extra("PublicationYear"), Some("2020"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`input`]: byte decoding and the [`RawDocument`] handed to readers
//! - [`sniffer`]: reader selection by community, provider URL or content
//! - [`community`]: the registry of harvested communities
//! - [`reader`]: Dublin Core, DataCite and JSON readers
//! - [`document`]: the canonical [`Document`]
//! - [`geometry`] and [`temporal`]: spatial and temporal coverage
//! - [`vocabulary`]: discipline and licence vocabularies
//! - [`writer`]: catalogue record serialization
//! - [`config`]: TOML-backed configuration
//! - [`pipeline`]: per-document and parallel batch processing
//! - [`error`]: error types and result type

pub mod community;
pub mod config;
pub mod dcmi;
pub mod document;
pub mod error;
pub mod geometry;
pub mod input;
pub mod pipeline;
pub mod reader;
pub mod sniffer;
pub mod temporal;
pub mod text;
pub mod vocabulary;
pub mod writer;
pub mod xml;

pub use community::Community;
pub use config::{CatalogueConfig, CommunityOverride, IngestConfig};
pub use document::{Document, Field};
pub use error::{ExtractionFailure, IngestError, Result};
pub use geometry::{BoundingBox, Geometry, Point};
pub use input::{Payload, RawDocument};
pub use pipeline::{BatchReport, DocumentOutcome, Pipeline, Stage};
pub use reader::{ReadOutcome, Reader};
pub use sniffer::{detect, ReaderVariant, SchemaType};
pub use temporal::TemporalPeriod;
pub use writer::{CatalogueRecord, CatalogueWriter};
