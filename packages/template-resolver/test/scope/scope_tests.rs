/**
 * Scope Tests
 *
 * Reference and variable lookup through nested template scopes
 */

#[cfg(test)]
mod tests {
    use angular_template_resolver::microsyntax::IMPLICIT_CONTEXT;
    use angular_template_resolver::{NodeId, ResolverConfig, ScopeTree, TemplateNode};
    use pretty_assertions::assert_eq;

    fn build(nodes: &[TemplateNode]) -> ScopeTree {
        ScopeTree::build(nodes, &ResolverConfig::default())
    }

    fn scope_of(tree: &ScopeTree, node: u32) -> anyhow::Result<angular_template_resolver::ScopeId> {
        tree.scope_of(NodeId(node))
            .ok_or_else(|| anyhow::anyhow!("node {} has no scope", node))
    }

    #[test]
    fn test_inner_reference_shadows_outer() -> anyhow::Result<()> {
        let nodes = vec![
            TemplateNode::new(1, "div").attr("#ref"),
            TemplateNode::new(2, "ng-template").child(
                TemplateNode::new(3, "span")
                    .attr("#ref")
                    .child(TemplateNode::new(4, "b").attr_value("[title]", "ref.title")),
            ),
            TemplateNode::new(5, "p").attr_value("[title]", "ref.title"),
        ];
        let tree = build(&nodes);

        let inner = scope_of(&tree, 4)?;
        let resolved = tree.resolve_local_reference(inner, "ref");
        assert_eq!(resolved.map(|r| r.node), Some(NodeId(3)));

        let outer = scope_of(&tree, 5)?;
        assert_eq!(tree.resolve_local_reference(outer, "ref").map(|r| r.node), Some(NodeId(1)));
        Ok(())
    }

    #[test]
    fn test_unknown_names_are_unresolved() -> anyhow::Result<()> {
        let nodes = vec![TemplateNode::new(1, "div").attr("#known")];
        let tree = build(&nodes);
        let scope = scope_of(&tree, 1)?;
        assert!(tree.resolve_local_reference(scope, "unknown").is_none());
        assert!(tree.resolve_local_variable(scope, "known").is_none());
        assert!(tree.scope_of(NodeId(99)).is_none());
        Ok(())
    }

    #[test]
    fn test_template_references_stay_in_outer_scope() -> anyhow::Result<()> {
        let nodes = vec![
            TemplateNode::new(1, "ng-template")
                .attr("#loading")
                .attr("let-hero")
                .attr_value("let-i", "index")
                .child(TemplateNode::new(2, "span")),
            TemplateNode::new(3, "div").attr_value("*ngIf", "ready; else loading"),
        ];
        let tree = build(&nodes);

        let sibling = scope_of(&tree, 3)?;
        assert_eq!(tree.resolve_local_reference(sibling, "loading").map(|r| r.node), Some(NodeId(1)));
        assert!(tree.resolve_local_variable(sibling, "hero").is_none());

        let body = scope_of(&tree, 2)?;
        let hero = tree.resolve_local_variable(body, "hero");
        assert_eq!(hero.map(|v| v.value.as_str()), Some(IMPLICIT_CONTEXT));
        assert_eq!(hero.map(|v| v.node), Some(NodeId(1)));
        assert_eq!(tree.resolve_local_variable(body, "i").map(|v| v.value.as_str()), Some("index"));

        // Bindings on the template element itself are evaluated outside it.
        let template = scope_of(&tree, 1)?;
        assert!(tree.resolve_local_variable(template, "hero").is_none());
        Ok(())
    }

    #[test]
    fn test_starred_template_keeps_its_own_variables() -> anyhow::Result<()> {
        let nodes = vec![
            TemplateNode::new(1, "ng-template")
                .attr_value("*ngIf", "ready as state")
                .attr("#body")
                .attr("let-item")
                .child(TemplateNode::new(2, "span")),
            TemplateNode::new(3, "p"),
        ];
        let tree = build(&nodes);

        let span = scope_of(&tree, 2)?;
        assert_eq!(tree.resolve_local_variable(span, "item").map(|v| v.value.as_str()), Some(IMPLICIT_CONTEXT));
        assert_eq!(tree.resolve_local_variable(span, "state").map(|v| v.value.as_str()), Some("ngIf"));
        assert_eq!(tree.resolve_local_reference(span, "body").map(|r| r.node), Some(NodeId(1)));

        // The template element is evaluated inside the implicit template, outside its body.
        let template = scope_of(&tree, 1)?;
        assert!(tree.resolve_local_variable(template, "item").is_none());
        assert!(tree.resolve_local_variable(template, "state").is_some());

        let sibling = scope_of(&tree, 3)?;
        assert!(tree.resolve_local_reference(sibling, "body").is_none());
        assert!(tree.resolve_local_variable(sibling, "state").is_none());
        Ok(())
    }

    #[test]
    fn test_nested_loop_variable_shadows_outer_one() -> anyhow::Result<()> {
        let nodes = vec![TemplateNode::new(1, "ul")
            .attr_value("*ngFor", "let item of groups; index as i")
            .child(
                TemplateNode::new(2, "li")
                    .attr_value("*ngFor", "let item of item.children")
                    .child(TemplateNode::new(3, "span")),
            )];
        let tree = build(&nodes);

        let span = scope_of(&tree, 3)?;
        assert_eq!(tree.resolve_local_variable(span, "item").map(|v| v.node), Some(NodeId(2)));
        assert_eq!(tree.resolve_local_variable(span, "i").map(|v| v.node), Some(NodeId(1)));

        let names: Vec<&str> = tree
            .visible_variables(span)
            .into_iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["item", "i"]);
        Ok(())
    }

    #[test]
    fn test_visible_references_nearest_first() -> anyhow::Result<()> {
        let nodes = vec![
            TemplateNode::new(1, "form").attr_value("#f", "ngForm").child(
                TemplateNode::new(2, "ng-template").child(
                    TemplateNode::new(3, "input")
                        .attr("#f")
                        .attr("#field"),
                ),
            ),
            TemplateNode::new(4, "div").attr("#footer"),
        ];
        let tree = build(&nodes);
        let scope = scope_of(&tree, 3)?;
        let visible: Vec<(&str, NodeId)> = tree
            .visible_references(scope)
            .into_iter()
            .map(|r| (r.name.as_str(), r.node))
            .collect();
        assert_eq!(
            visible,
            vec![("f", NodeId(3)), ("field", NodeId(3)), ("footer", NodeId(4))]
        );

        let outer = tree.resolve_local_reference(tree.root(), "f");
        assert_eq!(outer.and_then(|r| r.export_as.as_deref()), Some("ngForm"));
        Ok(())
    }

    #[test]
    fn test_view_child_references_in_document_order() {
        let nodes = vec![
            TemplateNode::new(1, "textarea").attr("#area"),
            TemplateNode::new(2, "div")
                .attr_value("*ngIf", "open")
                .child(TemplateNode::new(3, "textarea").attr("ref-area2")),
            TemplateNode::new(4, "textarea").attr("#area"),
        ];
        let tree = build(&nodes);
        assert_eq!(tree.view_child_candidates(), vec!["area", "area2"]);
        assert_eq!(tree.view_child_reference("area").map(|r| r.node), Some(NodeId(1)));
        assert_eq!(tree.view_child_reference("area2").map(|r| r.node), Some(NodeId(3)));
        assert!(tree.view_child_reference("area3").is_none());
    }
}
