//! Binding Resolver
//!
//! Maps binding tokens found on template elements to the directive members they denote.
//! A name that nothing declares is an ordinary outcome (`Resolution::Unresolved`): templates
//! bind plain DOM properties and attributes all the time.

use std::sync::Arc;

use crate::catalog::DeclarationCatalog;
use crate::config::ResolverConfig;
use crate::directive::{Directive, DirectiveProperty, OUTPUT_CHANGE_SUFFIX};
use crate::matcher::{DirectiveMatch, SelectorMatcher};
use crate::microsyntax::prefixed_key;
use crate::template::{BindingKind, BindingToken, ElementQuery, NodeId, TemplateNode};

/// Input bound by `[name]`, or `None` when the directive has no such input.
pub fn resolve_input<'d>(directive: &'d Directive, name: &str) -> Option<&'d DirectiveProperty> {
    directive.inputs().get(name)
}

/// Output bound by `(name)`.
pub fn resolve_output<'d>(directive: &'d Directive, name: &str) -> Option<&'d DirectiveProperty> {
    directive.outputs().get(name)
}

/// Input/output pair bound by `[(name)]`: input `name` plus output `nameChange`.
pub fn resolve_two_way<'d>(
    directive: &'d Directive,
    name: &str,
) -> Option<(&'d DirectiveProperty, &'d DirectiveProperty)> {
    let input = resolve_input(directive, name)?;
    let output = resolve_output(directive, &format!("{}{}", name, OUTPUT_CHANGE_SUFFIX))?;
    Some((input, output))
}

/// Input a structural keyword binds to: `ngFor` + `of` is `ngForOf`.
pub fn structural_input_name(primary: &str, keyword: &str) -> String {
    prefixed_key(primary, keyword)
}

pub fn resolve_structural_input<'d>(
    directive: &'d Directive,
    primary: &str,
    keyword: &str,
) -> Option<&'d DirectiveProperty> {
    resolve_input(directive, &structural_input_name(primary, keyword))
}

/// A directive member reached from the template.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedProperty<'c> {
    pub directive: &'c Arc<Directive>,
    pub property: &'c DirectiveProperty,
}

impl<'c> ResolvedProperty<'c> {
    fn new(directive: &'c Arc<Directive>, property: &'c DirectiveProperty) -> Self {
        Self {
            directive,
            property,
        }
    }
}

/// What a binding token denotes.
#[derive(Debug, Clone)]
pub enum BindingTarget<'c> {
    Input(ResolvedProperty<'c>),
    Output(ResolvedProperty<'c>),
    TwoWay {
        input: ResolvedProperty<'c>,
        output: ResolvedProperty<'c>,
    },
    /// A declaration whose selector the attribute satisfied.
    Directive(&'c Arc<Directive>),
    /// A declaration exported under the reference's value (`#f="ngForm"`).
    Export(&'c Arc<Directive>),
    /// The element hosting a value-less reference.
    Element(NodeId),
}

impl<'c> BindingTarget<'c> {
    pub fn directive(&self) -> Option<&'c Arc<Directive>> {
        match self {
            BindingTarget::Input(resolved) | BindingTarget::Output(resolved) => Some(resolved.directive),
            BindingTarget::TwoWay { input, .. } => Some(input.directive),
            BindingTarget::Directive(directive) | BindingTarget::Export(directive) => Some(*directive),
            BindingTarget::Element(_) => None,
        }
    }

    pub fn property(&self) -> Option<&'c DirectiveProperty> {
        match self {
            BindingTarget::Input(resolved) | BindingTarget::Output(resolved) => Some(resolved.property),
            BindingTarget::TwoWay { input, .. } => Some(input.property),
            _ => None,
        }
    }
}

/// Outcome of resolving one binding token.
#[derive(Debug, Clone)]
pub enum Resolution<'c> {
    /// Every target the token denotes, in catalog order. Never empty.
    Resolved(Vec<BindingTarget<'c>>),
    Unresolved,
}

impl<'c> Resolution<'c> {
    fn from_targets(targets: Vec<BindingTarget<'c>>) -> Self {
        if targets.is_empty() {
            Resolution::Unresolved
        } else {
            Resolution::Resolved(targets)
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn targets(&self) -> &[BindingTarget<'c>] {
        match self {
            Resolution::Resolved(targets) => targets,
            Resolution::Unresolved => &[],
        }
    }

    pub fn first(&self) -> Option<&BindingTarget<'c>> {
        self.targets().first()
    }

    /// Declarations behind the targets, deduplicated, in order.
    pub fn directives(&self) -> Vec<&'c Arc<Directive>> {
        let mut directives: Vec<&'c Arc<Directive>> = Vec::new();
        for directive in self.targets().iter().filter_map(BindingTarget::directive) {
            if !directives.iter().any(|known| known.id() == directive.id()) {
                directives.push(directive);
            }
        }
        directives
    }
}

/// Resolves binding tokens on template elements against a catalog.
#[derive(Debug, Clone)]
pub struct BindingResolver<'c> {
    matcher: SelectorMatcher<'c>,
}

impl<'c> BindingResolver<'c> {
    pub fn new(catalog: &'c DeclarationCatalog) -> Self {
        Self {
            matcher: SelectorMatcher::new(catalog),
        }
    }

    pub fn with_config(catalog: &'c DeclarationCatalog, config: ResolverConfig) -> Self {
        Self {
            matcher: SelectorMatcher::with_config(catalog, config),
        }
    }

    pub fn matcher(&self) -> &SelectorMatcher<'c> {
        &self.matcher
    }

    /// Resolve the attribute named `raw_name` (binding syntax included) on `element`.
    pub fn resolve_attribute(&self, element: &TemplateNode, raw_name: &str) -> Resolution<'c> {
        let value = element
            .attribute(raw_name)
            .and_then(|attr| attr.value.as_deref());
        self.resolve(element, &BindingToken::classify(raw_name), value)
    }

    /// Resolve a classified token. `value` is the attribute value, needed for references.
    pub fn resolve(&self, element: &TemplateNode, token: &BindingToken, value: Option<&str>) -> Resolution<'c> {
        let resolution = match token.kind {
            BindingKind::Property => self.resolve_property_binding(&element.element_query(), &token.name),
            BindingKind::Event => self.resolve_event_binding(&element.element_query(), &token.name),
            BindingKind::TwoWay => self.resolve_two_way_binding(&element.element_query(), &token.name),
            BindingKind::Attribute => self.resolve_plain_attribute(element, &token.name),
            BindingKind::Structural => self.resolve_structural_attribute(element, &token.name),
            BindingKind::Reference => self.resolve_reference_export(element, value),
            // `let-` declarations are resolved through the scope tree.
            BindingKind::Variable => Resolution::Unresolved,
        };
        tracing::debug!(
            tag = %element.tag,
            kind = ?token.kind,
            name = %token.name,
            resolved = resolution.is_resolved(),
            "resolved binding"
        );
        resolution
    }

    pub fn resolve_property_binding(&self, query: &ElementQuery, name: &str) -> Resolution<'c> {
        Resolution::from_targets(
            self.matcher
                .match_element(query)
                .iter()
                .filter_map(|m| {
                    resolve_input(m.directive(), name)
                        .map(|property| BindingTarget::Input(ResolvedProperty::new(m.directive(), property)))
                })
                .collect(),
        )
    }

    pub fn resolve_event_binding(&self, query: &ElementQuery, name: &str) -> Resolution<'c> {
        Resolution::from_targets(
            self.matcher
                .match_element(query)
                .iter()
                .filter_map(|m| {
                    resolve_output(m.directive(), name)
                        .map(|property| BindingTarget::Output(ResolvedProperty::new(m.directive(), property)))
                })
                .collect(),
        )
    }

    pub fn resolve_two_way_binding(&self, query: &ElementQuery, name: &str) -> Resolution<'c> {
        Resolution::from_targets(
            self.matcher
                .match_element(query)
                .iter()
                .filter_map(|m| {
                    resolve_two_way(m.directive(), name).map(|(input, output)| BindingTarget::TwoWay {
                        input: ResolvedProperty::new(m.directive(), input),
                        output: ResolvedProperty::new(m.directive(), output),
                    })
                })
                .collect(),
        )
    }

    /// A plain attribute selects directives naming it, and also sets a same-named input
    /// (one-time string binding). Structural directives only count on template elements.
    pub fn resolve_plain_attribute(&self, element: &TemplateNode, name: &str) -> Resolution<'c> {
        let on_template = element.is_template_element(self.matcher.config());
        let matches: Vec<DirectiveMatch<'c>> = self
            .matcher
            .match_element(&element.element_query())
            .into_iter()
            .filter(|m| on_template || !m.directive().is_template())
            .collect();

        let mut targets: Vec<BindingTarget<'c>> = matches
            .iter()
            .filter(|m| m.matched_by(name))
            .map(|m| BindingTarget::Directive(m.directive()))
            .collect();
        targets.extend(matches.iter().filter_map(|m| {
            resolve_input(m.directive(), name)
                .map(|property| BindingTarget::Input(ResolvedProperty::new(m.directive(), property)))
        }));
        Resolution::from_targets(targets)
    }

    /// `*name` resolves to the structural directives the implicit template matched through
    /// `name`, then to their `name` input.
    pub fn resolve_structural_attribute(&self, element: &TemplateNode, name: &str) -> Resolution<'c> {
        let Some(query) = element.template_query() else {
            return Resolution::Unresolved;
        };
        let matches = self.structural_matches(&query, name);
        let mut targets: Vec<BindingTarget<'c>> = matches
            .iter()
            .map(|m| BindingTarget::Directive(m.directive()))
            .collect();
        targets.extend(matches.iter().filter_map(|m| {
            resolve_input(m.directive(), name)
                .map(|property| BindingTarget::Input(ResolvedProperty::new(m.directive(), property)))
        }));
        Resolution::from_targets(targets)
    }

    /// Resolve a microsyntax keyword of the element's star attribute, e.g. `of` in
    /// `*ngFor="let item of items"`, to the structural input it sets (`ngForOf`).
    pub fn resolve_structural_keyword(&self, element: &TemplateNode, keyword: &str) -> Resolution<'c> {
        let (Some((token, _)), Some(query)) = (element.structural_attribute(), element.template_query())
        else {
            return Resolution::Unresolved;
        };
        Resolution::from_targets(
            self.structural_matches(&query, &token.name)
                .iter()
                .filter_map(|m| {
                    resolve_structural_input(m.directive(), &token.name, keyword)
                        .map(|property| BindingTarget::Input(ResolvedProperty::new(m.directive(), property)))
                })
                .collect(),
        )
    }

    fn structural_matches(&self, query: &ElementQuery, name: &str) -> Vec<DirectiveMatch<'c>> {
        self.matcher
            .matches_attribute(query, name)
            .into_iter()
            .filter(|m| m.directive().is_template())
            .collect()
    }

    /// `#ref="exportName"` resolves to the matched directive exported under that name;
    /// a bare `#ref` denotes the element's component, or the element itself.
    pub fn resolve_reference_export(&self, element: &TemplateNode, value: Option<&str>) -> Resolution<'c> {
        let matches = self.matcher.match_element(&element.element_query());
        let export_name = value.map(str::trim).filter(|value| !value.is_empty());
        let targets = match export_name {
            Some(export_name) => matches
                .iter()
                .filter(|m| m.directive().is_exported_as(export_name))
                .map(|m| BindingTarget::Export(m.directive()))
                .collect(),
            None => match matches.iter().find(|m| m.directive().is_component()) {
                Some(component) => vec![BindingTarget::Directive(component.directive())],
                None => vec![BindingTarget::Element(element.id)],
            },
        };
        Resolution::from_targets(targets)
    }
}
