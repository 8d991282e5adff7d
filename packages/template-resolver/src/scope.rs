//! Template scopes
//!
//! References (`#name`, `ref-name`) and variables (`let-name`, microsyntax `let`) live in
//! a tree of scopes: one root per template, plus a child scope for every template element
//! and every star attribute. A name is visible in its scope and all descendant scopes;
//! inner declarations shadow outer ones.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::ResolverConfig;
use crate::microsyntax::IMPLICIT_CONTEXT;
use crate::template::{BindingKind, NodeId, TemplateNode};

/// Index of a scope inside its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(usize);

/// A `#name` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalReference {
    pub name: String,
    /// Element carrying the reference.
    pub node: NodeId,
    /// Export name given as the reference value (`#f="ngForm"`).
    pub export_as: Option<String>,
}

/// A `let-name` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalVariable {
    pub name: String,
    /// Template element (or star-attribute element) declaring the variable.
    pub node: NodeId,
    /// Context property the variable reads.
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    host: Option<NodeId>,
    references: IndexMap<String, LocalReference>,
    variables: IndexMap<String, LocalVariable>,
    children: Vec<ScopeId>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Node that opened the scope; `None` for the root.
    pub fn host(&self) -> Option<NodeId> {
        self.host
    }

    pub fn references(&self) -> impl Iterator<Item = &LocalReference> {
        self.references.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = &LocalVariable> {
        self.variables.values()
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }
}

/// Arena of the scopes of one template.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    node_scopes: HashMap<NodeId, ScopeId>,
    /// Every reference in document order, shadowed ones included.
    document_references: Vec<LocalReference>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree holding only an empty root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            node_scopes: HashMap::new(),
            document_references: Vec::new(),
        }
    }

    /// Derive the scopes of a template from its top-level nodes.
    pub fn build(nodes: &[TemplateNode], config: &ResolverConfig) -> Self {
        let mut tree = Self::new();
        let root = tree.root();
        for node in nodes {
            tree.ingest_node(node, root, config);
        }
        tracing::debug!(
            scopes = tree.scopes.len(),
            references = tree.document_references.len(),
            "built template scopes"
        );
        tree
    }

    fn ingest_node(&mut self, node: &TemplateNode, scope: ScopeId, config: &ResolverConfig) {
        // A star attribute wraps the element in an implicit template: everything else about
        // the element, its references included, happens inside that scope.
        let scope = match node.template_bindings() {
            Some(bindings) => {
                let implicit = self.add_child(scope, node.id);
                for variable in bindings.variables {
                    self.declare_variable(
                        implicit,
                        LocalVariable {
                            name: variable.name,
                            node: node.id,
                            value: variable.value,
                        },
                    );
                }
                implicit
            }
            None => scope,
        };

        self.declare_node_references(node, scope);
        self.node_scopes.insert(node.id, scope);

        if node.is_template_element(config) {
            // References on a template element are in the outer scope; its variables
            // are in the inner one.
            let inner = self.add_child(scope, node.id);
            for attr in &node.attributes {
                let token = attr.token();
                if token.kind == BindingKind::Variable {
                    let value = attr
                        .value
                        .as_deref()
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .unwrap_or(IMPLICIT_CONTEXT);
                    self.declare_variable(
                        inner,
                        LocalVariable {
                            name: token.name,
                            node: node.id,
                            value: value.to_string(),
                        },
                    );
                }
            }
            self.ingest_children(node, inner, config);
        } else {
            self.ingest_children(node, scope, config);
        }
    }

    fn ingest_children(&mut self, node: &TemplateNode, scope: ScopeId, config: &ResolverConfig) {
        for child in &node.children {
            self.ingest_node(child, scope, config);
        }
    }

    fn declare_node_references(&mut self, node: &TemplateNode, scope: ScopeId) {
        for attr in &node.attributes {
            let token = attr.token();
            if token.kind == BindingKind::Reference {
                self.declare_reference(
                    scope,
                    LocalReference {
                        name: token.name,
                        node: node.id,
                        export_as: attr.value.clone().filter(|value| !value.trim().is_empty()),
                    },
                );
            }
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Open a scope nested in `parent`, hosted by `host`.
    pub fn add_child(&mut self, parent: ScopeId, host: NodeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            host: Some(host),
            ..Scope::default()
        });
        self.scopes[parent.0].children.push(id);
        id
    }

    /// Declare a reference. Within one scope the first declaration of a name wins;
    /// returns whether this one was kept.
    pub fn declare_reference(&mut self, scope: ScopeId, reference: LocalReference) -> bool {
        self.document_references.push(reference.clone());
        let references = &mut self.scopes[scope.0].references;
        if references.contains_key(&reference.name) {
            tracing::debug!(name = %reference.name, node = %reference.node, "duplicate reference ignored");
            return false;
        }
        references.insert(reference.name.clone(), reference);
        true
    }

    pub fn declare_variable(&mut self, scope: ScopeId, variable: LocalVariable) -> bool {
        let variables = &mut self.scopes[scope.0].variables;
        if variables.contains_key(&variable.name) {
            tracing::debug!(name = %variable.name, node = %variable.node, "duplicate variable ignored");
            return false;
        }
        variables.insert(variable.name.clone(), variable);
        true
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    pub fn host(&self, scope: ScopeId) -> Option<NodeId> {
        self.scopes[scope.0].host
    }

    /// Scope the bindings of `node` are evaluated in. `None` for nodes not in the tree.
    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    /// Scopes from `scope` out to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |current| self.parent(*current))
    }

    /// Nearest declaration of reference `name`, walking outward from `scope`.
    pub fn resolve_local_reference(&self, scope: ScopeId, name: &str) -> Option<&LocalReference> {
        self.ancestors(scope)
            .find_map(|id| self.scopes[id.0].references.get(name))
    }

    /// Nearest declaration of variable `name`, walking outward from `scope`.
    pub fn resolve_local_variable(&self, scope: ScopeId, name: &str) -> Option<&LocalVariable> {
        self.ancestors(scope)
            .find_map(|id| self.scopes[id.0].variables.get(name))
    }

    /// References visible from `scope`, nearest first, shadowed names dropped.
    pub fn visible_references(&self, scope: ScopeId) -> Vec<&LocalReference> {
        let mut visible: IndexMap<&str, &LocalReference> = IndexMap::new();
        for id in self.ancestors(scope) {
            for reference in self.scopes[id.0].references.values() {
                visible.entry(reference.name.as_str()).or_insert(reference);
            }
        }
        visible.into_values().collect()
    }

    pub fn visible_variables(&self, scope: ScopeId) -> Vec<&LocalVariable> {
        let mut visible: IndexMap<&str, &LocalVariable> = IndexMap::new();
        for id in self.ancestors(scope) {
            for variable in self.scopes[id.0].variables.values() {
                visible.entry(variable.name.as_str()).or_insert(variable);
            }
        }
        visible.into_values().collect()
    }

    /// First reference named `name` anywhere in the template, as a view query sees it.
    pub fn view_child_reference(&self, name: &str) -> Option<&LocalReference> {
        self.document_references
            .iter()
            .find(|reference| reference.name == name)
    }

    /// Distinct reference names of the template, in document order.
    pub fn view_child_candidates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for reference in &self.document_references {
            if !names.contains(&reference.name.as_str()) {
                names.push(&reference.name);
            }
        }
        names
    }
}
