#![deny(clippy::all)]

/**
 * Angular Template Resolver
 *
 * Directive selectors, selector matching and binding/reference resolution for Angular
 * templates, the part of template tooling that decides which declaration an element or
 * binding refers to.
 */

// Declarations
pub mod catalog;
pub mod descriptor;
pub mod directive;
pub mod selector;

// Template side
pub mod microsyntax;
pub mod template;

// Resolution
pub mod matcher;
pub mod resolver;
pub mod scope;

pub mod config;
pub mod error;

pub use catalog::{CatalogBuild, CatalogBuilder, DeclarationCatalog};
pub use config::ResolverConfig;
pub use descriptor::DirectiveDescriptor;
pub use directive::{
    ComponentView, DeclarationId, DeclarationKind, Directive, DirectiveProperty, PropertySet, TemplateSource,
};
pub use error::{Error, Result, SelectorError};
pub use matcher::{DirectiveMatch, SelectorMatcher};
pub use resolver::{BindingResolver, BindingTarget, ResolvedProperty, Resolution};
pub use scope::{LocalReference, LocalVariable, ScopeId, ScopeTree};
pub use selector::{AttributePredicate, CompoundSelector, Selector, SelectorAlternative};
pub use template::{BindingKind, BindingToken, ElementQuery, NodeId, TemplateAttribute, TemplateNode};
