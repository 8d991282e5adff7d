//! Selector Matcher
//!
//! Evaluates catalog selectors against one template element at a time. Combinators
//! collapse to AND: every compound of an alternative is tested against the same element.

use rayon::prelude::*;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::catalog::DeclarationCatalog;
use crate::config::ResolverConfig;
use crate::directive::Directive;
use crate::selector::{AttributePredicate, CompoundSelector, Selector, SelectorAlternative};
use crate::template::ElementQuery;

/// A declaration whose selector matched an element.
#[derive(Debug, Clone)]
pub struct DirectiveMatch<'c> {
    directive: &'c Arc<Directive>,
    alternative: usize,
    matched_attributes: SmallVec<[&'c str; 2]>,
}

impl<'c> DirectiveMatch<'c> {
    pub fn directive(&self) -> &'c Arc<Directive> {
        self.directive
    }

    /// Index of the first alternative of the selector that matched.
    pub fn alternative_index(&self) -> usize {
        self.alternative
    }

    pub fn alternative(&self) -> &'c SelectorAlternative {
        &self.directive.selector().alternatives()[self.alternative]
    }

    /// Bindable attribute names the matching alternative tested for.
    pub fn matched_attributes(&self) -> &[&'c str] {
        &self.matched_attributes
    }

    /// The primary matched attribute: the first one the alternative names.
    pub fn matched_attribute(&self) -> Option<&'c str> {
        self.matched_attributes.first().copied()
    }

    pub fn matched_by(&self, attribute: &str) -> bool {
        self.matched_attributes.iter().any(|name| *name == attribute)
    }
}

/// Selector Matcher - matches catalog selectors against template elements
#[derive(Debug, Clone)]
pub struct SelectorMatcher<'c> {
    catalog: &'c DeclarationCatalog,
    config: ResolverConfig,
}

impl<'c> SelectorMatcher<'c> {
    pub fn new(catalog: &'c DeclarationCatalog) -> Self {
        Self::with_config(catalog, ResolverConfig::default())
    }

    pub fn with_config(catalog: &'c DeclarationCatalog, config: ResolverConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &'c DeclarationCatalog {
        self.catalog
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// All declarations matching the element, in catalog order.
    pub fn match_element(&self, query: &ElementQuery) -> Vec<DirectiveMatch<'c>> {
        let matches: Vec<DirectiveMatch<'c>> = self
            .catalog
            .all()
            .filter_map(|directive| self.match_directive(directive, query))
            .collect();
        tracing::trace!(
            tag = query.tag(),
            matches = matches.len(),
            "matched element against catalog"
        );
        matches
    }

    /// Matches a batch of elements in parallel. Results keep the input order.
    pub fn match_elements(&self, queries: &[ElementQuery]) -> Vec<Vec<DirectiveMatch<'c>>> {
        queries
            .par_iter()
            .map(|query| self.match_element(query))
            .collect()
    }

    /// Matches whose selector tested for `attribute`.
    pub fn matches_attribute(&self, query: &ElementQuery, attribute: &str) -> Vec<DirectiveMatch<'c>> {
        self.match_element(query)
            .into_iter()
            .filter(|m| m.matched_by(attribute))
            .collect()
    }

    pub fn match_directive(
        &self,
        directive: &'c Arc<Directive>,
        query: &ElementQuery,
    ) -> Option<DirectiveMatch<'c>> {
        let selector: &'c Selector = directive.selector();
        let (index, alternative) = selector
            .alternatives()
            .iter()
            .enumerate()
            .find(|(_, alternative)| self.alternative_matches(alternative, query))?;

        let mut matched_attributes: SmallVec<[&'c str; 2]> = SmallVec::new();
        for predicate in alternative
            .compounds()
            .iter()
            .flat_map(|compound| compound.attributes())
            .filter(|predicate| predicate.is_bindable())
        {
            if !matched_attributes.contains(&predicate.name()) {
                matched_attributes.push(predicate.name());
            }
        }

        Some(DirectiveMatch {
            directive,
            alternative: index,
            matched_attributes,
        })
    }

    fn alternative_matches(&self, alternative: &SelectorAlternative, query: &ElementQuery) -> bool {
        alternative
            .compounds()
            .iter()
            .all(|compound| compound_matches(compound, query, self.config.match_attribute_values))
    }
}

/// Index of the first alternative of `selector` matching the element, if any.
pub fn match_selector(selector: &Selector, query: &ElementQuery) -> Option<usize> {
    selector.alternatives().iter().position(|alternative| {
        alternative
            .compounds()
            .iter()
            .all(|compound| compound_matches(compound, query, true))
    })
}

/// Whether the tag predicate and every attribute predicate of `compound` hold.
pub fn compound_matches(compound: &CompoundSelector, query: &ElementQuery, compare_values: bool) -> bool {
    if compound.has_tag_predicate() {
        let tag = compound.tag().unwrap_or_default();
        if !tag.eq_ignore_ascii_case(query.tag()) {
            return false;
        }
    }
    compound
        .attributes()
        .iter()
        .all(|predicate| predicate_holds(predicate, query, compare_values))
}

fn predicate_holds(predicate: &AttributePredicate, query: &ElementQuery, compare_values: bool) -> bool {
    let positive = match query.attribute(predicate.name()) {
        None => false,
        Some(actual) => match (predicate.value(), actual) {
            (Some(required), Some(actual)) if compare_values => {
                if predicate.is_class() {
                    actual.split_whitespace().any(|class_name| class_name == required)
                } else {
                    actual == required
                }
            }
            // Value unknown: presence only.
            _ => true,
        },
    };
    positive != predicate.is_negated()
}
