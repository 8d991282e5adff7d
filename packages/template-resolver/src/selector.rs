//! Directive Selector Model
//!
//! Parses the CSS-like selector grammar used by directive declarations:
//! comma-separated alternatives, space-separated compounds, and per-compound
//! tag and attribute predicates (`[attr]`, `[attr=value]`, `.class`, `#id`, `:not(...)`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

use crate::error::SelectorError;

/// Regex for tokenizing selectors. Whatever falls between two matches must be whitespace.
static SELECTOR_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(:not\()|(\*|([\.#]?)[-\w]+)|(?:\[([-.\w*\\$]+)(?:=(?:"([^"]*)"|'([^']*)'|([^\]]*)))?\])|(\))|(\s*,\s*)"#)
        .expect("selector regex is valid")
});

static SIMPLE_VALUE_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-\w]+$").expect("simple value regex is valid"));

/// Match groups in the selector regex
#[derive(Debug, Clone, Copy)]
enum SelectorRegexp {
    Not = 1,
    Tag = 2,
    Prefix = 3,
    Attribute = 4,
    AttributeValueDouble = 5,
    AttributeValueSingle = 6,
    AttributeValueUnquoted = 7,
    NotEnd = 8,
    Separator = 9,
}

pub const CLASS_ATTR: &str = "class";
pub const ID_ATTR: &str = "id";
pub const WILDCARD_TAG: &str = "*";

/// One attribute test of a compound selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AttributePredicate {
    name: String,
    value: Option<String>,
    negated: bool,
}

impl AttributePredicate {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            negated: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required value, if the predicate is not a presence-only test.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// `.foo` selectors test membership in the whitespace-separated `class` list.
    pub fn is_class(&self) -> bool {
        self.name == CLASS_ATTR
    }

    /// Whether the predicate names an attribute a binding can target: not negated, and not
    /// a `.class` word test. A presence-only `[class]` still counts.
    pub fn is_bindable(&self) -> bool {
        !self.negated && !(self.is_class() && self.value.is_some())
    }

    fn write_simple(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.value.as_deref() {
            if SIMPLE_VALUE_REGEXP.is_match(value) {
                if self.name == CLASS_ATTR {
                    return write!(f, ".{}", value);
                }
                if self.name == ID_ATTR {
                    return write!(f, "#{}", value);
                }
            }
        }
        let name = escape_attribute(&self.name);
        match self.value.as_deref() {
            None => write!(f, "[{}]", name),
            Some(value) if value.contains('"') => write!(f, "[{}='{}']", name, value),
            Some(value) => write!(f, "[{}=\"{}\"]", name, value),
        }
    }
}

impl fmt::Display for AttributePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, ":not(")?;
            self.write_simple(f)?;
            write!(f, ")")
        } else {
            self.write_simple(f)
        }
    }
}

/// Tag predicate plus attribute predicates that must all hold on the same element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CompoundSelector {
    tag: Option<String>,
    attributes: SmallVec<[AttributePredicate; 4]>,
}

impl CompoundSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_attribute(mut self, predicate: AttributePredicate) -> Self {
        self.attributes.push(predicate);
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// True when the compound constrains the tag name (not absent and not `*`).
    pub fn has_tag_predicate(&self) -> bool {
        matches!(self.tag.as_deref(), Some(tag) if tag != WILDCARD_TAG)
    }

    pub fn attributes(&self) -> &[AttributePredicate] {
        &self.attributes
    }

    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.attributes.is_empty()
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{}", tag)?;
        }
        for attribute in &self.attributes {
            write!(f, "{}", attribute)?;
        }
        Ok(())
    }
}

/// One comma-separated alternative: every compound must match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SelectorAlternative {
    compounds: Vec<CompoundSelector>,
}

impl SelectorAlternative {
    pub fn new(compounds: Vec<CompoundSelector>) -> Self {
        Self { compounds }
    }

    pub fn compounds(&self) -> &[CompoundSelector] {
        &self.compounds
    }
}

impl fmt::Display for SelectorAlternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.compounds.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", compound)?;
        }
        Ok(())
    }
}

/// A parsed directive selector.
///
/// Equality is structural: the source text is kept for diagnostics only.
#[derive(Debug, Clone, Serialize)]
pub struct Selector {
    #[serde(skip)]
    text: String,
    alternatives: Vec<SelectorAlternative>,
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.alternatives == other.alternatives
    }
}

impl Eq for Selector {}

impl Selector {
    /// Builds a selector from already structured alternatives.
    pub fn from_alternatives(alternatives: Vec<SelectorAlternative>) -> Self {
        let mut selector = Self {
            text: String::new(),
            alternatives,
        };
        selector.text = selector.to_string();
        selector
    }

    /// Parse selector text into its alternatives.
    pub fn parse(text: &str) -> Result<Selector, SelectorError> {
        let mut parser = SelectorParser::new(text);
        for cap in SELECTOR_REGEXP.captures_iter(text) {
            let Some(whole) = cap.get(0) else {
                continue;
            };
            parser.gap(whole.start())?;

            if cap.get(SelectorRegexp::Not as usize).is_some() {
                parser.open_not(whole.start())?;
            }

            if let Some(tag_match) = cap.get(SelectorRegexp::Tag as usize) {
                let token = tag_match.as_str();
                let prefix = cap
                    .get(SelectorRegexp::Prefix as usize)
                    .map(|m| m.as_str())
                    .unwrap_or("");
                match prefix {
                    "#" => parser.push_predicate(AttributePredicate::new(
                        ID_ATTR,
                        Some(token[1..].to_string()),
                    )),
                    "." => parser.push_predicate(AttributePredicate::new(
                        CLASS_ATTR,
                        Some(token[1..].to_string()),
                    )),
                    _ => parser.set_tag(token, whole.start())?,
                }
            }

            if let Some(attr_match) = cap.get(SelectorRegexp::Attribute as usize) {
                // An unquoted value mixing both quote kinds has no quoted spelling.
                if let Some(unquoted) = cap.get(SelectorRegexp::AttributeValueUnquoted as usize) {
                    if unquoted.as_str().contains('"') && unquoted.as_str().contains('\'') {
                        return Err(SelectorError::UnexpectedToken {
                            selector: text.to_string(),
                            found: unquoted.as_str().to_string(),
                            offset: unquoted.start(),
                        });
                    }
                }
                let value = cap
                    .get(SelectorRegexp::AttributeValueDouble as usize)
                    .or_else(|| cap.get(SelectorRegexp::AttributeValueSingle as usize))
                    .or_else(|| cap.get(SelectorRegexp::AttributeValueUnquoted as usize))
                    .map(|m| m.as_str().to_string());
                let name = unescape_attribute(attr_match.as_str())?;
                parser.push_predicate(AttributePredicate::new(name, value));
            }

            if cap.get(SelectorRegexp::NotEnd as usize).is_some() {
                parser.close_not(whole.start())?;
            }

            if cap.get(SelectorRegexp::Separator as usize).is_some() {
                parser.separator(whole.start())?;
            }

            parser.last_end = whole.end();
        }
        parser.finish()
    }

    /// The text the selector was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn alternatives(&self) -> &[SelectorAlternative] {
        &self.alternatives
    }

    /// Non-negated attribute names mentioned anywhere in the selector, first occurrence order.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for predicate in self
            .alternatives
            .iter()
            .flat_map(|alt| alt.compounds.iter())
            .flat_map(|compound| compound.attributes.iter())
            .filter(|predicate| predicate.is_bindable())
        {
            if !names.contains(&predicate.name()) {
                names.push(predicate.name());
            }
        }
        names
    }

    /// Concrete tag names (no wildcard) mentioned in the selector.
    pub fn element_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for compound in self.alternatives.iter().flat_map(|alt| alt.compounds.iter()) {
            if let Some(tag) = compound.tag().filter(|_| compound.has_tag_predicate()) {
                if !names.contains(&tag) {
                    names.push(tag);
                }
            }
        }
        names
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", alternative)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

enum NotItem {
    Tag,
    Predicate(AttributePredicate),
}

struct SelectorParser<'a> {
    text: &'a str,
    last_end: usize,
    alternatives: Vec<SelectorAlternative>,
    compounds: Vec<CompoundSelector>,
    current: CompoundSelector,
    /// Items collected inside an open `:not(`, with the offset of the opener.
    not_group: Option<(usize, Vec<NotItem>)>,
}

impl<'a> SelectorParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            last_end: 0,
            alternatives: Vec::new(),
            compounds: Vec::new(),
            current: CompoundSelector::new(),
            not_group: None,
        }
    }

    /// Validates the text between the previous token and the next one.
    fn gap(&mut self, start: usize) -> Result<(), SelectorError> {
        let gap = &self.text[self.last_end..start];
        if gap.is_empty() {
            return Ok(());
        }
        if gap.trim().is_empty() {
            if self.not_group.is_none() {
                self.end_compound();
            }
            return Ok(());
        }
        let offset = self.last_end + (gap.len() - gap.trim_start().len());
        Err(self.unexpected(gap.trim(), offset))
    }

    fn unexpected(&self, found: &str, offset: usize) -> SelectorError {
        for bracket in ['[', ']', '(', ')'] {
            if found.contains(bracket) {
                return SelectorError::UnbalancedBracket {
                    selector: self.text.to_string(),
                    bracket,
                    offset,
                };
            }
        }
        SelectorError::UnexpectedToken {
            selector: self.text.to_string(),
            found: found.to_string(),
            offset,
        }
    }

    fn open_not(&mut self, offset: usize) -> Result<(), SelectorError> {
        if self.not_group.is_some() {
            return Err(SelectorError::NestedNot {
                selector: self.text.to_string(),
            });
        }
        self.not_group = Some((offset, Vec::new()));
        Ok(())
    }

    fn close_not(&mut self, offset: usize) -> Result<(), SelectorError> {
        let Some((_, items)) = self.not_group.take() else {
            return Err(SelectorError::UnbalancedBracket {
                selector: self.text.to_string(),
                bracket: ')',
                offset,
            });
        };
        let mut items = items.into_iter();
        match (items.next(), items.next()) {
            (Some(NotItem::Predicate(predicate)), None) => {
                self.current.attributes.push(predicate.negate());
                Ok(())
            }
            _ => Err(SelectorError::UnsupportedNot {
                selector: self.text.to_string(),
            }),
        }
    }

    fn set_tag(&mut self, tag: &str, offset: usize) -> Result<(), SelectorError> {
        if let Some((_, items)) = self.not_group.as_mut() {
            items.push(NotItem::Tag);
            return Ok(());
        }
        if !self.current.is_empty() {
            return Err(SelectorError::UnexpectedToken {
                selector: self.text.to_string(),
                found: tag.to_string(),
                offset,
            });
        }
        self.current.tag = Some(tag.to_string());
        Ok(())
    }

    fn push_predicate(&mut self, predicate: AttributePredicate) {
        match self.not_group.as_mut() {
            Some((_, items)) => items.push(NotItem::Predicate(predicate)),
            None => self.current.attributes.push(predicate),
        }
    }

    fn separator(&mut self, offset: usize) -> Result<(), SelectorError> {
        if self.not_group.is_some() {
            return Err(SelectorError::UnsupportedNot {
                selector: self.text.to_string(),
            });
        }
        self.end_alternative(offset)
    }

    fn end_compound(&mut self) {
        if !self.current.is_empty() {
            self.compounds.push(std::mem::take(&mut self.current));
        }
    }

    fn end_alternative(&mut self, offset: usize) -> Result<(), SelectorError> {
        self.end_compound();
        if self.compounds.is_empty() {
            return Err(SelectorError::EmptyAlternative {
                selector: self.text.to_string(),
                offset,
            });
        }
        self.alternatives
            .push(SelectorAlternative::new(std::mem::take(&mut self.compounds)));
        Ok(())
    }

    fn finish(mut self) -> Result<Selector, SelectorError> {
        let trailing = &self.text[self.last_end..];
        if !trailing.trim().is_empty() {
            let offset = self.last_end + (trailing.len() - trailing.trim_start().len());
            return Err(self.unexpected(trailing.trim(), offset));
        }
        if let Some((offset, _)) = self.not_group {
            return Err(SelectorError::UnbalancedBracket {
                selector: self.text.to_string(),
                bracket: '(',
                offset,
            });
        }
        if self.alternatives.is_empty() && self.current.is_empty() && self.compounds.is_empty() {
            return Err(SelectorError::Empty);
        }
        let end = self.text.len();
        self.end_alternative(end)?;
        Ok(Selector {
            text: self.text.to_string(),
            alternatives: self.alternatives,
        })
    }
}

/// Unescape `\$` sequences from an attribute selector name.
fn unescape_attribute(attr: &str) -> Result<String, SelectorError> {
    let mut result = String::new();
    let mut escaping = false;

    for ch in attr.chars() {
        if ch == '\\' {
            escaping = true;
            continue;
        }
        if ch == '$' && !escaping {
            return Err(SelectorError::UnescapedDollar {
                attribute: attr.to_string(),
            });
        }
        escaping = false;
        result.push(ch);
    }

    Ok(result)
}

fn escape_attribute(attr: &str) -> String {
    attr.replace('$', "\\$")
}
