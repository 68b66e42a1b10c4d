//! Common test helpers shared across the integration suites.

#![allow(dead_code)]

use std::path::PathBuf;

use mdingest::{IngestConfig, Pipeline, RawDocument};

/// Source identifier used for the DaRUS fixture.
pub const DARUS_ID: &str = "oai:darus.uni-stuttgart.de:doi:10.18419/darus-477";
/// Source identifier used for the SLKS fixture.
pub const SLKS_ID: &str = "oai:kulturarv.dk:fund-og-fortidsminder:1127";
/// Source identifier used for the Herbadrop fixture.
pub const HERBADROP_ID: &str = "2b8a1b1e-51d7-4c54-8d7b-3e2d6f0b1c11";

/// Path of a file under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Raw bytes of a fixture.
pub fn fixture_bytes(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("Could not open test file")
}

/// A fixture decoded into a raw document.
pub fn fixture(id: &str, name: &str) -> RawDocument {
    RawDocument::from_bytes(id, &fixture_bytes(name)).expect("Failed to decode fixture")
}

/// The DaRUS DataCite record, harvested from the DaRUS endpoint.
pub fn darus() -> RawDocument {
    fixture(DARUS_ID, "darus_datacite.xml").with_community("darus")
}

/// The SLKS Dublin Core record, harvested from the SLKS endpoint.
pub fn slks() -> RawDocument {
    fixture(SLKS_ID, "slks_oai_dc.xml").with_url("https://www.kulturarv.dk/ffpublic/oai")
}

/// The Herbadrop specimen, classified by content.
pub fn herbadrop() -> RawDocument {
    fixture(HERBADROP_ID, "herbadrop_specimen.json")
}

/// A pipeline with the default configuration.
pub fn default_pipeline() -> Pipeline {
    Pipeline::new(IngestConfig::default()).expect("default configuration is valid")
}
