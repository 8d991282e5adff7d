//! Directive metadata model
//!
//! A declaration is a selector plus its template-bindable surface: inputs, outputs and
//! export names. Components are directives that additionally own a view.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::selector::Selector;

/// Suffix that turns an input name into the output name of a two-way binding.
pub const OUTPUT_CHANGE_SUFFIX: &str = "Change";

/// Opaque identity of a declaration, issued by the loading layer.
///
/// The core never looks inside it; two declarations are the same iff their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclarationId(pub u32);

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An input or output as seen from the template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DirectiveProperty {
    /// Name used in template bindings.
    pub name: String,
    /// Name of the backing class member.
    pub member_name: String,
}

impl DirectiveProperty {
    pub fn new(name: impl Into<String>, member_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            member_name: member_name.into(),
        }
    }

    /// A property bound under its own member name.
    pub fn unaliased(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            member_name: name.clone(),
            name,
        }
    }

    pub fn is_aliased(&self) -> bool {
        self.name != self.member_name
    }
}

/// Inputs or outputs of one declaration, keyed by binding name.
/// Uses IndexMap to keep insertion order for deterministic iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertySet {
    entries: IndexMap<String, DirectiveProperty>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Adds a property unless one with the same binding name exists (first write wins).
    /// Returns whether the property was added.
    pub fn insert(&mut self, property: DirectiveProperty) -> bool {
        if self.entries.contains_key(&property.name) {
            return false;
        }
        self.entries.insert(property.name.clone(), property);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveProperty> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectiveProperty> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<DirectiveProperty> for PropertySet {
    fn from_iter<I: IntoIterator<Item = DirectiveProperty>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        for property in iter {
            set.insert(property);
        }
        set
    }
}

/// Where a component's template comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TemplateSource {
    Inline(String),
    Url(String),
}

/// View data only components carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentView {
    pub template: Option<TemplateSource>,
    pub style_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeclarationKind {
    Directive,
    Component(ComponentView),
}

/// One directive or component declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Directive {
    id: DeclarationId,
    name: String,
    kind: DeclarationKind,
    selector: Selector,
    export_as: Option<String>,
    inputs: PropertySet,
    outputs: PropertySet,
    is_template: bool,
}

impl PartialEq for Directive {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Directive {}

impl Directive {
    pub fn new(id: DeclarationId, name: impl Into<String>, selector: Selector) -> Self {
        Self {
            id,
            name: name.into(),
            kind: DeclarationKind::Directive,
            selector,
            export_as: None,
            inputs: PropertySet::new(),
            outputs: PropertySet::new(),
            is_template: false,
        }
    }

    pub fn with_kind(mut self, kind: DeclarationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_export_as(mut self, export_as: impl Into<String>) -> Self {
        self.export_as = Some(export_as.into());
        self
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = DirectiveProperty>) -> Self {
        for input in inputs {
            self.inputs.insert(input);
        }
        self
    }

    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = DirectiveProperty>) -> Self {
        for output in outputs {
            self.outputs.insert(output);
        }
        self
    }

    pub fn with_template(mut self, is_template: bool) -> Self {
        self.is_template = is_template;
        self
    }

    pub fn id(&self) -> DeclarationId {
        self.id
    }

    /// Class name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DeclarationKind {
        &self.kind
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Raw `exportAs` value, absent when not declared.
    pub fn export_as(&self) -> Option<&str> {
        self.export_as.as_deref()
    }

    /// Individual export names; `exportAs` may list several separated by commas.
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.export_as
            .as_deref()
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn is_exported_as(&self, name: &str) -> bool {
        self.export_names().any(|export| export == name)
    }

    pub fn inputs(&self) -> &PropertySet {
        &self.inputs
    }

    pub fn outputs(&self) -> &PropertySet {
        &self.outputs
    }

    /// Whether this is a structural directive applied through a template.
    pub fn is_template(&self) -> bool {
        self.is_template
    }

    pub fn is_component(&self) -> bool {
        matches!(self.kind, DeclarationKind::Component(_))
    }

    pub fn component_view(&self) -> Option<&ComponentView> {
        match &self.kind {
            DeclarationKind::Component(view) => Some(view),
            DeclarationKind::Directive => None,
        }
    }

    /// Inputs paired with their `<input>Change` outputs, in output order.
    pub fn two_way_pairs(&self) -> Vec<(&DirectiveProperty, &DirectiveProperty)> {
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Vec::new();
        }
        self.outputs
            .iter()
            .filter_map(|output| {
                let input_name = output.name.strip_suffix(OUTPUT_CHANGE_SUFFIX)?;
                let input = self.inputs.get(input_name)?;
                Some((input, output))
            })
            .collect()
    }
}
