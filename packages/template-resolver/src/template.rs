//! Template node model
//!
//! The already-parsed template fragment the core works on: elements with raw attributes
//! and children. Attribute names still carry their binding syntax (`[x]`, `(x)`, `*x`...);
//! [`BindingToken::classify`] strips it.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::config::ResolverConfig;
use crate::microsyntax::{parse_template_bindings, TemplateBindings};

static BIND_NAME_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(bind-)|(let-)|(ref-|#)|(on-)|(bindon-))(.*)$").expect("bind name regex is valid")
});

// Group indices for BIND_NAME_REGEXP
const KW_BIND_IDX: usize = 1;
const KW_LET_IDX: usize = 2;
const KW_REF_IDX: usize = 3;
const KW_ON_IDX: usize = 4;
const KW_BINDON_IDX: usize = 5;
const IDENT_KW_IDX: usize = 6;

/// Binding delimiters
struct BindingDelims {
    start: &'static str,
    end: &'static str,
}

const BANANA_BOX_DELIMS: BindingDelims = BindingDelims {
    start: "[(",
    end: ")]",
};
const PROPERTY_DELIMS: BindingDelims = BindingDelims {
    start: "[",
    end: "]",
};
const EVENT_DELIMS: BindingDelims = BindingDelims {
    start: "(",
    end: ")",
};

pub const TEMPLATE_ATTR_PREFIX: &str = "*";

/// Tag of the element a star attribute desugars into.
pub const IMPLICIT_TEMPLATE_TAG: &str = "ng-template";

/// Identity of a template node, issued by the template layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Syntactic kind of a template attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingKind {
    /// `name="value"` or a bare `name`.
    Attribute,
    /// `[name]` or `bind-name`.
    Property,
    /// `(name)` or `on-name`.
    Event,
    /// `[(name)]` or `bindon-name`.
    TwoWay,
    /// `*name`.
    Structural,
    /// `#name` or `ref-name`.
    Reference,
    /// `let-name`.
    Variable,
}

/// A template attribute name with its binding syntax stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BindingToken {
    pub kind: BindingKind,
    pub name: String,
}

impl BindingToken {
    pub fn new(kind: BindingKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Classify a raw attribute name.
    pub fn classify(raw: &str) -> BindingToken {
        if let Some(name) = strip_delims(raw, &BANANA_BOX_DELIMS) {
            return BindingToken::new(BindingKind::TwoWay, name);
        }
        if let Some(name) = strip_delims(raw, &PROPERTY_DELIMS) {
            return BindingToken::new(BindingKind::Property, name);
        }
        if let Some(name) = strip_delims(raw, &EVENT_DELIMS) {
            return BindingToken::new(BindingKind::Event, name);
        }
        if let Some(name) = raw.strip_prefix(TEMPLATE_ATTR_PREFIX) {
            return BindingToken::new(BindingKind::Structural, name);
        }
        if let Some(captures) = BIND_NAME_REGEXP.captures(raw) {
            let ident = captures.get(IDENT_KW_IDX).map_or("", |m| m.as_str());
            let kind = if captures.get(KW_BIND_IDX).is_some() {
                BindingKind::Property
            } else if captures.get(KW_LET_IDX).is_some() {
                BindingKind::Variable
            } else if captures.get(KW_REF_IDX).is_some() {
                BindingKind::Reference
            } else if captures.get(KW_ON_IDX).is_some() {
                BindingKind::Event
            } else if captures.get(KW_BINDON_IDX).is_some() {
                BindingKind::TwoWay
            } else {
                BindingKind::Attribute
            };
            return BindingToken::new(kind, ident);
        }
        BindingToken::new(BindingKind::Attribute, raw)
    }
}

fn strip_delims<'a>(raw: &'a str, delims: &BindingDelims) -> Option<&'a str> {
    raw.strip_prefix(delims.start)?.strip_suffix(delims.end)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateAttribute {
    /// Raw name including binding syntax.
    pub name: String,
    pub value: Option<String>,
}

impl TemplateAttribute {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn token(&self) -> BindingToken {
        BindingToken::classify(&self.name)
    }
}

/// An element of the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateNode {
    pub id: NodeId,
    pub tag: String,
    pub attributes: Vec<TemplateAttribute>,
    pub children: Vec<TemplateNode>,
}

impl TemplateNode {
    pub fn new(id: u32, tag: impl Into<String>) -> Self {
        Self {
            id: NodeId(id),
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute without a value.
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(TemplateAttribute::new(name, None));
        self
    }

    pub fn attr_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .push(TemplateAttribute::new(name, Some(value.into())));
        self
    }

    pub fn child(mut self, child: TemplateNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, raw_name: &str) -> Option<&TemplateAttribute> {
        self.attributes.iter().find(|attr| attr.name == raw_name)
    }

    pub fn is_template_element(&self, config: &ResolverConfig) -> bool {
        config.is_template_tag(&self.tag)
    }

    /// The first star attribute, which turns the element into an implicit template.
    pub fn structural_attribute(&self) -> Option<(BindingToken, &TemplateAttribute)> {
        self.attributes
            .iter()
            .map(|attr| (attr.token(), attr))
            .find(|(token, _)| token.kind == BindingKind::Structural)
    }

    /// Desugared keys and variables of the star attribute, if any.
    pub fn template_bindings(&self) -> Option<TemplateBindings> {
        let (token, attr) = self.structural_attribute()?;
        Some(parse_template_bindings(
            &token.name,
            attr.value.as_deref().unwrap_or(""),
        ))
    }

    /// What directive matching sees of this element. Star attributes belong to the
    /// implicit template and are left out; references and variables never match.
    pub fn element_query(&self) -> ElementQuery {
        let mut query = ElementQuery::new(self.tag.clone());
        for attr in &self.attributes {
            let token = attr.token();
            match token.kind {
                BindingKind::Attribute => {
                    query.insert(token.name, attr.value.clone());
                }
                BindingKind::Property | BindingKind::TwoWay | BindingKind::Event => {
                    query.insert(token.name, None);
                }
                BindingKind::Structural | BindingKind::Reference | BindingKind::Variable => {}
            }
        }
        query
    }

    /// What directive matching sees of the implicit `<ng-template>` a star attribute creates.
    pub fn template_query(&self) -> Option<ElementQuery> {
        let bindings = self.template_bindings()?;
        let mut query = ElementQuery::new(IMPLICIT_TEMPLATE_TAG);
        for key in bindings.keys {
            query.insert(key.name, None);
        }
        Some(query)
    }
}

/// Tag name plus attribute names (and values when known) of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementQuery {
    tag: String,
    attributes: IndexMap<String, Option<String>>,
}

impl ElementQuery {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Builds a query from attribute names only.
    pub fn with_names<I, S>(tag: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Self::new(tag);
        for name in names {
            query.insert(name.into(), None);
        }
        query
    }

    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.insert(name.into(), None);
        self
    }

    pub fn with_attribute_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name.into(), Some(value.into()));
        self
    }

    /// Records an attribute. A repeated name keeps the first entry, value included, so
    /// adding attributes never turns a presence-only match into a value mismatch.
    pub fn insert(&mut self, name: String, value: Option<String>) {
        self.attributes.entry(name).or_insert(value);
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// `None` when the attribute is absent, `Some(None)` when present without a known value.
    pub fn attribute(&self, name: &str) -> Option<Option<&str>> {
        self.attributes.get(name).map(|value| value.as_deref())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}
