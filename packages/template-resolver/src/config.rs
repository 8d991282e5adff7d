//! Resolver configuration

use serde::Deserialize;

use crate::error::{Error, Result};

/// Knobs for matching and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Tags that act as template elements (hosts of structural directives).
    pub template_tags: Vec<String>,
    /// Compare required selector values against supplied attribute values.
    /// When off, or when a value is not supplied, attribute predicates test presence only.
    pub match_attribute_values: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            template_tags: vec!["ng-template".to_string()],
            match_attribute_values: true,
        }
    }
}

impl ResolverConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Config)
    }

    pub fn is_template_tag(&self, tag: &str) -> bool {
        self.template_tags
            .iter()
            .any(|template_tag| template_tag.eq_ignore_ascii_case(tag))
    }
}
