//! End-to-end tests from harvested bytes to catalogue records.

mod common;

use common::{darus, default_pipeline, herbadrop, slks, DARUS_ID, HERBADROP_ID, SLKS_ID};
use mdingest::writer::dataset_name;
use mdingest::{
    CatalogueConfig, CommunityOverride, IngestConfig, IngestError, Pipeline, RawDocument, Stage,
};

#[test]
fn test_darus_datacite_record() {
    let outcome = default_pipeline().process(&darus());
    assert_eq!(outcome.stage, Stage::Serialize);
    let record = outcome.record().expect("DaRUS record");

    assert_eq!(record.name, dataset_name(DARUS_ID));
    assert_eq!(record.owner_org, "darus");
    assert_eq!(record.state, "active");
    assert_eq!(record.title, "Enzyme kinetics of alcohol dehydrogenase");
    assert!(record.has_tag("Medicine"));
    assert!(record.has_tag("enzymes"));

    assert_eq!(record.extra("Discipline"), Some("Life Sciences; Medicine"));
    assert_eq!(record.extra("PublicationYear"), Some("2020"));
    assert_eq!(record.extra("TemporalCoverage:BeginDate"), Some("2020-01-30T00:00:00Z"));
    assert_eq!(record.extra("TemporalCoverage:EndDate"), Some("2020-02-14T00:00:00Z"));
    assert_eq!(record.extra("TempCoverageBegin"), Some("63715939200"));
    assert_eq!(record.extra("TempCoverageEnd"), Some("63717235200"));
    assert_eq!(record.extra("OpenAccess"), Some("true"));
    assert_eq!(record.extra("License"), Some("CC BY 4.0"));
    assert_eq!(record.extra("DOI"), Some("https://doi.org/10.18419/darus-477"));
    assert_eq!(record.extra("Contact"), Some("DaRUS"));
}

#[test]
fn test_datacite_without_spatial_has_no_geometry() {
    let record = default_pipeline().process(&darus()).result.expect("record");
    assert!(record.extra("spatial").is_none());
    assert!(record.extra("SpatialCoverage").is_none());
}

#[test]
fn test_slks_dublin_core_record() {
    let outcome = default_pipeline().process(&slks());
    let record = outcome.record().expect("SLKS record");

    assert_eq!(record.name, dataset_name(SLKS_ID));
    assert_eq!(record.owner_org, "slks");
    assert_eq!(record.title, "Gravhøj ved Skanderborg");
    assert_eq!(
        record.extra("Discipline"),
        Some("Humanities and Social Sciences; Humanities; Archaeology")
    );
    assert_eq!(record.extra("PublicationYear"), Some("2014"));
    assert_eq!(record.extra("Contact"), Some("Slots- og Kulturstyrelsen"));
    assert_eq!(
        record.extra("Source"),
        Some("https://www.kulturarv.dk/fundogfortidsminder/Lokalitet/1127/")
    );
    assert_eq!(record.extra("SpatialCoverage"), Some("Skanderborg"));

    let spatial: serde_json::Value =
        serde_json::from_str(record.extra("spatial").expect("spatial extra")).unwrap();
    assert_eq!(spatial["type"], "Point");
    assert_eq!(spatial["coordinates"][0], 9.811246);
    assert_eq!(spatial["coordinates"][1], 56.302585);

    // "Bronze Age" is not a machine-readable period.
    assert!(record.extra("TemporalCoverage:BeginDate").is_none());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].field, "temporal_coverage");
}

#[test]
fn test_herbadrop_json_record() {
    let outcome = default_pipeline().process(&herbadrop());
    let record = outcome.record().expect("Herbadrop record");

    assert_eq!(record.name, dataset_name(HERBADROP_ID));
    assert_eq!(record.owner_org, "herbadrop");
    assert_eq!(record.title, "Gentiana ×marcailhouana Rouy");
    assert!(record.has_tag("Gentianaceae"));
    assert!(record.has_tag("Botany"));

    let fulltext = record.extra("fulltext").expect("fulltext");
    assert!(fulltext.contains("Gentiana ×marcailhouana Rouy"));
    assert!(fulltext.contains("StillImage|PRESERVED_SPECIMEN"));
    assert_eq!(record.extra("ResourceType"), Some("StillImage|PRESERVED_SPECIMEN"));
    assert_eq!(record.extra("Discipline"), Some("Life Sciences; Biology; Botany"));
    assert_eq!(
        record.extra("PID"),
        Some("https://hdl.handle.net/21.T11998/0000-001A-3905-F")
    );
    assert_eq!(record.extra("PublicationYear"), Some("1898"));
    assert_eq!(record.extra("TemporalCoverage:BeginDate"), Some("1898-07-14T00:00:00Z"));
    assert_eq!(record.extra("SpatialCoverage"), Some("France; Pyrénées, Cagire"));
    assert!(outcome.failures.is_empty());
}

#[test]
fn test_record_json_shape() {
    let record = default_pipeline().process(&darus()).result.expect("record");
    let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
    assert_eq!(value["owner_org"], "darus");
    assert!(value["tags"].as_array().unwrap().iter().all(|t| t["name"].is_string()));
    let keys: Vec<&str> = value["extras"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys.first(), Some(&"fulltext"));
    assert!(keys.contains(&"Discipline"));
}

#[test]
fn test_same_input_same_record() {
    let pipeline = default_pipeline();
    let first = pipeline.process(&darus()).result.unwrap();
    let second = pipeline.process(&darus()).result.unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_configured_overrides() {
    let config = IngestConfig::from_toml_str(
        r#"
        [catalogue]
        default_owner_org = "eudat"

        [communities.darus]
        owner_org = "darus-stuttgart"
        discipline = "Life Sciences; Biochemistry"
        "#,
    )
    .unwrap();
    let pipeline = Pipeline::new(config).unwrap();

    let record = pipeline.process(&darus()).result.unwrap();
    assert_eq!(record.owner_org, "darus-stuttgart");
    assert_eq!(record.extra("Discipline"), Some("Life Sciences; Biochemistry"));
    assert!(record.has_tag("Biochemistry"));

    let plain = RawDocument::from_text(
        "oai:example.org:7",
        r#"<dc xmlns="http://purl.org/dc/elements/1.1/"><title>Loose record</title></dc>"#,
    )
    .unwrap();
    let record = pipeline.process(&plain).result.unwrap();
    assert_eq!(record.owner_org, "eudat");
    assert_eq!(record.extra("Discipline"), Some("Various"));
}

#[test]
fn test_tag_length_limit() {
    let config = IngestConfig::default()
        .with_catalogue(CatalogueConfig::default().with_max_tag_length(5));
    let record = Pipeline::new(config).unwrap().process(&darus()).result.unwrap();
    assert!(record.tags.iter().all(|t| t.name.chars().count() <= 5));
}

#[test]
fn test_unknown_community_fails_classification() {
    let raw = common::fixture(DARUS_ID, "darus_datacite.xml").with_community("nobody");
    let outcome = default_pipeline().process(&raw);
    assert_eq!(outcome.stage, Stage::Classify);
    assert!(matches!(outcome.error(), Some(IngestError::Classification(_))));
}

#[test]
fn test_json_for_xml_community_fails_classification() {
    let raw = RawDocument::from_text("x", r#"{"id": 1}"#).unwrap().with_community("darus");
    let outcome = default_pipeline().process(&raw);
    assert_eq!(outcome.stage, Stage::Classify);
}

#[test]
fn test_datacite_community_without_resource_fails_read() {
    let raw = RawDocument::from_text(
        "x",
        r#"<dc xmlns="http://purl.org/dc/elements/1.1/"><title>T</title></dc>"#,
    )
    .unwrap()
    .with_community("darus");
    let outcome = default_pipeline().process(&raw);
    assert_eq!(outcome.stage, Stage::Read);
    assert!(matches!(outcome.error(), Some(IngestError::Parse(_))));
}

#[test]
fn test_batch_of_parsed_documents() {
    let mut documents = vec![
        darus(),
        common::fixture("unknown-community", "darus_datacite.xml").with_community("nobody"),
        slks(),
        RawDocument::from_text("html-page", "<html><body>Not metadata</body></html>").unwrap(),
        herbadrop(),
        RawDocument::from_text("untitled", r#"<dc xmlns="http://purl.org/dc/elements/1.1/"/>"#)
            .unwrap(),
    ];
    for i in 0..40 {
        let xml = format!(
            r#"<dc xmlns="http://purl.org/dc/elements/1.1/"><title>Loose record {i}</title></dc>"#
        );
        documents.push(RawDocument::from_text(format!("loose-{i}"), &xml).unwrap());
    }

    let report = default_pipeline().process_batch(&documents);

    let ids: Vec<&str> = report
        .outcomes
        .iter()
        .map(|o| o.source_identifier.as_str())
        .collect();
    let expected: Vec<&str> = documents.iter().map(|d| d.source_identifier.as_str()).collect();
    assert_eq!(ids, expected);

    assert_eq!(report.outcomes.len(), 46);
    assert_eq!(report.succeeded(), 43);
    assert_eq!(report.failed(), 3);
    let by_stage: Vec<(Stage, usize)> = report.failures_by_stage().into_iter().collect();
    assert_eq!(by_stage, vec![(Stage::Classify, 2), (Stage::Serialize, 1)]);
    assert_eq!(report.field_failures().get("temporal_coverage"), Some(&1));

    let names: Vec<&str> = report.records().map(|r| r.name.as_str()).collect();
    assert_eq!(names[0], dataset_name(DARUS_ID));
    assert_eq!(names[1], dataset_name(SLKS_ID));
    assert_eq!(names[2], dataset_name(HERBADROP_ID));
    assert_eq!(names[3], dataset_name("loose-0"));
}

#[test]
fn test_override_struct_matches_toml() {
    let mut config = IngestConfig::default();
    config.communities.insert(
        "psi".to_string(),
        CommunityOverride {
            owner_org: Some("psi-data".to_string()),
            discipline: None,
        },
    );
    let parsed =
        IngestConfig::from_toml_str("[communities.psi]\nowner_org = \"psi-data\"\n").unwrap();
    assert_eq!(config, parsed);
}
