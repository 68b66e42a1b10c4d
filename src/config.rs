//! Configuration for ingestion and catalogue output.
//!
//! Configuration is explicit: the caller builds an [`IngestConfig`] (in code
//! or from TOML) and hands it to the [`Pipeline`](crate::pipeline::Pipeline).
//! Nothing is read from the environment.
//!
//! # Examples
//!
//! ```
//! use mdingest::config::IngestConfig;
//!
//! let config = IngestConfig::from_toml_str(r#"
//!     community = "darus"
//!
//!     [catalogue]
//!     default_owner_org = "b2find"
//!     default_discipline = "Various"
//!
//!     [communities.psi]
//!     owner_org = "psi-data"
//! "#)?;
//! assert_eq!(config.community.as_deref(), Some("darus"));
//! assert_eq!(config.owner_org_for("psi"), Some("psi-data"));
//! # Ok::<(), mdingest::IngestError>(())
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::community;
use crate::error::{IngestError, Result};

/// Catalogue record defaults and tag rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogueConfig {
    // === Record defaults ===
    /// Organization for documents without a community.
    pub default_owner_org: String,

    /// Discipline for documents whose reader assigned none.
    pub default_discipline: String,

    /// Dataset state.
    pub state: String,

    // === Tags ===
    /// Maximum tag length in characters; longer tags are truncated.
    pub max_tag_length: usize,

    /// Add the discipline terms as tags.
    pub discipline_tags: bool,

    // === Extras ===
    /// Separator for multi-valued extras.
    pub separator: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            default_owner_org: "b2find".to_string(),
            default_discipline: "Various".to_string(),
            state: "active".to_string(),
            max_tag_length: 100,
            discipline_tags: true,
            separator: "; ".to_string(),
        }
    }
}

impl CatalogueConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the organization for unaffiliated documents.
    #[must_use]
    pub fn with_default_owner_org(mut self, org: impl Into<String>) -> Self {
        self.default_owner_org = org.into();
        self
    }

    /// Sets the fallback discipline.
    #[must_use]
    pub fn with_default_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.default_discipline = discipline.into();
        self
    }

    /// Sets the maximum tag length.
    #[must_use]
    pub const fn with_max_tag_length(mut self, length: usize) -> Self {
        self.max_tag_length = length;
        self
    }
}

/// Settings overriding a community's registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommunityOverride {
    /// Organization to publish the community's records under.
    pub owner_org: Option<String>,
    /// Discipline forced onto every record of the community.
    pub discipline: Option<String>,
}

/// Top-level ingestion configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Community assumed for documents that name none.
    pub community: Option<String>,
    /// Catalogue output settings.
    pub catalogue: CatalogueConfig,
    /// Overrides keyed by community identifier.
    pub communities: IndexMap<String, CommunityOverride>,
}

impl IngestConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] for malformed TOML, unknown keys,
    /// unknown community identifiers or a zero tag length.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| IngestError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::IoError`] when the file cannot be read and
    /// [`IngestError::Config`] when its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let names = self.community.iter().chain(self.communities.keys());
        for name in names {
            if community::find(name).is_none() {
                return Err(IngestError::Config(format!("Unknown community '{name}'")));
            }
        }
        if self.catalogue.max_tag_length == 0 {
            return Err(IngestError::Config(
                "catalogue.max_tag_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Assume `community` for documents that name none.
    #[must_use]
    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = Some(community.into());
        self
    }

    /// Replace the catalogue settings.
    #[must_use]
    pub fn with_catalogue(mut self, catalogue: CatalogueConfig) -> Self {
        self.catalogue = catalogue;
        self
    }

    /// Configured organization override for a community.
    #[must_use]
    pub fn owner_org_for(&self, community: &str) -> Option<&str> {
        self.communities
            .get(community)
            .and_then(|o| o.owner_org.as_deref())
    }

    /// Configured discipline override for a community.
    #[must_use]
    pub fn discipline_for(&self, community: &str) -> Option<&str> {
        self.communities
            .get(community)
            .and_then(|o| o.discipline.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert!(config.community.is_none());
        assert_eq!(config.catalogue.default_owner_org, "b2find");
        assert_eq!(config.catalogue.default_discipline, "Various");
        assert_eq!(config.catalogue.state, "active");
        assert_eq!(config.catalogue.max_tag_length, 100);
        assert!(config.catalogue.discipline_tags);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(IngestConfig::from_toml_str("").unwrap(), IngestConfig::default());
    }

    #[test]
    fn test_partial_catalogue_section_keeps_defaults() {
        let config = IngestConfig::from_toml_str("[catalogue]\nmax_tag_length = 40\n").unwrap();
        assert_eq!(config.catalogue.max_tag_length, 40);
        assert_eq!(config.catalogue.separator, "; ");
    }

    #[test]
    fn test_overrides() {
        let config = IngestConfig::from_toml_str(
            "[communities.slks]\ndiscipline = \"Archaeology\"\n",
        )
        .unwrap();
        assert_eq!(config.discipline_for("slks"), Some("Archaeology"));
        assert_eq!(config.owner_org_for("slks"), None);
        assert_eq!(config.discipline_for("darus"), None);
    }

    #[test]
    fn test_invalid_configs() {
        for text in [
            "community = 42",
            "unknown_key = true",
            "community = \"nobody\"",
            "[communities.nobody]\nowner_org = \"x\"",
            "[catalogue]\nmax_tag_length = 0",
        ] {
            assert!(
                matches!(IngestConfig::from_toml_str(text), Err(IngestError::Config(_))),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn test_builders() {
        let config = IngestConfig::new()
            .with_community("psi")
            .with_catalogue(
                CatalogueConfig::new()
                    .with_default_owner_org("eudat")
                    .with_max_tag_length(20),
            );
        assert_eq!(config.community.as_deref(), Some("psi"));
        assert_eq!(config.catalogue.default_owner_org, "eudat");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            IngestConfig::load("/nonexistent/mdingest.toml"),
            Err(IngestError::IoError(_))
        ));
    }
}
