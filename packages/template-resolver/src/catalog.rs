//! Declaration catalog
//!
//! The set of declarations visible to one template scope. Built once from whatever the
//! loading layer discovered, then only read.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::descriptor::DirectiveDescriptor;
use crate::directive::{DeclarationId, Directive};
use crate::error::{Error, Result};

/// Immutable, insertion-ordered collection of declarations, unique by identity.
#[derive(Debug, Clone, Default)]
pub struct DeclarationCatalog {
    entries: IndexMap<DeclarationId, Arc<Directive>>,
}

impl DeclarationCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Builds a catalog from descriptors, skipping the ones that fail to convert.
    pub fn from_descriptors<I>(descriptors: I) -> CatalogBuild
    where
        I: IntoIterator<Item = (DeclarationId, DirectiveDescriptor)>,
    {
        let mut builder = CatalogBuilder::new();
        let mut errors = Vec::new();
        for (id, descriptor) in descriptors {
            if let Err(err) = builder.add_descriptor(id, descriptor) {
                errors.push(err);
            }
        }
        CatalogBuild {
            catalog: builder.build(),
            errors,
        }
    }

    /// All declarations in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<Directive>> + '_ {
        self.entries.values()
    }

    pub fn components(&self) -> impl Iterator<Item = &Arc<Directive>> + '_ {
        self.all().filter(|directive| directive.is_component())
    }

    /// Declarations that are not components.
    pub fn directives(&self) -> impl Iterator<Item = &Arc<Directive>> + '_ {
        self.all().filter(|directive| !directive.is_component())
    }

    pub fn get(&self, id: DeclarationId) -> Option<&Arc<Directive>> {
        self.entries.get(&id)
    }

    /// Declarations exporting `name` through `exportAs`.
    pub fn exported_as<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Arc<Directive>> + 'a {
        self.all().filter(move |directive| directive.is_exported_as(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Directive> for DeclarationCatalog {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        let mut builder = CatalogBuilder::new();
        for directive in iter {
            builder.add(directive);
        }
        builder.build()
    }
}

/// Result of building a catalog from descriptors: the usable catalog plus one error per
/// rejected descriptor.
#[derive(Debug)]
pub struct CatalogBuild {
    pub catalog: DeclarationCatalog,
    pub errors: Vec<Error>,
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: IndexMap<DeclarationId, Arc<Directive>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration. A second declaration with an already known id is dropped.
    pub fn add(&mut self, directive: impl Into<Arc<Directive>>) -> bool {
        let directive = directive.into();
        if self.entries.contains_key(&directive.id()) {
            tracing::debug!(
                id = %directive.id(),
                name = directive.name(),
                "duplicate declaration collapsed"
            );
            return false;
        }
        self.entries.insert(directive.id(), directive);
        true
    }

    /// Converts and adds a descriptor. A malformed selector rejects only this declaration.
    pub fn add_descriptor(&mut self, id: DeclarationId, descriptor: DirectiveDescriptor) -> Result<()> {
        match descriptor.into_directive(id) {
            Ok(directive) => {
                self.add(directive);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "skipping declaration");
                Err(err)
            }
        }
    }

    pub fn with(mut self, directive: impl Into<Arc<Directive>>) -> Self {
        self.add(directive);
        self
    }

    pub fn build(self) -> DeclarationCatalog {
        DeclarationCatalog {
            entries: self.entries,
        }
    }
}
