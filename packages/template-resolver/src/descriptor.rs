//! Metadata descriptors
//!
//! Serde shapes of the external metadata the loading layer hands over, either taken
//! from decorator arguments or from `*.metadata.json` sidecars. Only in-memory JSON is
//! accepted here; reading the files is the caller's job.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::directive::{
    ComponentView, DeclarationId, DeclarationKind, Directive, DirectiveProperty, TemplateSource,
};
use crate::error::{Error, Result};
use crate::selector::Selector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    #[default]
    Directive,
    Component,
}

/// Inputs or outputs as written in metadata.
///
/// The list form holds `"member"` or `"member: bindingName"` entries; the map form maps
/// member names to binding names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertyList {
    List(Vec<String>),
    Map(IndexMap<String, String>),
}

impl Default for PropertyList {
    fn default() -> Self {
        PropertyList::List(Vec::new())
    }
}

impl PropertyList {
    pub fn to_properties(&self) -> Vec<DirectiveProperty> {
        match self {
            PropertyList::List(entries) => entries
                .iter()
                .map(|entry| parse_property_entry(entry))
                .collect(),
            PropertyList::Map(entries) => entries
                .iter()
                .map(|(member, binding)| DirectiveProperty::new(binding.trim(), member.trim()))
                .collect(),
        }
    }
}

/// Splits `"member: binding"` at the first colon; without a colon the member binds under
/// its own name.
fn parse_property_entry(entry: &str) -> DirectiveProperty {
    match entry.split_once(':') {
        Some((member, binding)) if !binding.trim().is_empty() => {
            DirectiveProperty::new(binding.trim(), member.trim())
        }
        Some((member, _)) => DirectiveProperty::unaliased(member.trim()),
        None => DirectiveProperty::unaliased(entry.trim()),
    }
}

/// One declaration as described by external metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: DescriptorKind,
    pub selector: String,
    #[serde(default)]
    pub export_as: Option<String>,
    #[serde(default, alias = "properties")]
    pub inputs: PropertyList,
    #[serde(default, alias = "events")]
    pub outputs: PropertyList,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub template_url: Option<String>,
    #[serde(default)]
    pub style_urls: Vec<String>,
}

impl DirectiveDescriptor {
    /// Parses a JSON array of descriptors.
    pub fn parse_list(json: &str) -> Result<Vec<DirectiveDescriptor>> {
        serde_json::from_str(json).map_err(Error::Descriptor)
    }

    pub fn from_value(value: serde_json::Value) -> Result<DirectiveDescriptor> {
        serde_json::from_value(value).map_err(Error::Descriptor)
    }

    /// A descriptor that names a template is a component even without an explicit kind.
    pub fn is_component(&self) -> bool {
        self.kind == DescriptorKind::Component
            || self.template.is_some()
            || self.template_url.is_some()
    }

    pub fn into_directive(self, id: DeclarationId) -> Result<Directive> {
        let selector = Selector::parse(&self.selector).map_err(|source| Error::MalformedSelector {
            declaration: self.name.clone(),
            source,
        })?;

        let kind = if self.is_component() {
            let template = match (self.template, self.template_url) {
                (Some(inline), _) => Some(TemplateSource::Inline(inline)),
                (None, Some(url)) => Some(TemplateSource::Url(url)),
                (None, None) => None,
            };
            DeclarationKind::Component(ComponentView {
                template,
                style_urls: self.style_urls,
            })
        } else {
            DeclarationKind::Directive
        };

        let mut directive = Directive::new(id, self.name, selector)
            .with_kind(kind)
            .with_inputs(self.inputs.to_properties())
            .with_outputs(self.outputs.to_properties())
            .with_template(self.is_template);
        if let Some(export_as) = self.export_as {
            directive = directive.with_export_as(export_as);
        }
        Ok(directive)
    }
}
