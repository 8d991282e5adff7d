/**
 * Matcher Tests
 *
 * Selector matching against elements through a catalog
 */

#[cfg(test)]
mod tests {
    use angular_template_resolver::matcher::{match_selector, SelectorMatcher};
    use angular_template_resolver::{DeclarationCatalog, DeclarationId, Directive, ElementQuery, Selector};
    use pretty_assertions::assert_eq;

    fn catalog(entries: &[(&str, &str)]) -> anyhow::Result<DeclarationCatalog> {
        let mut builder = DeclarationCatalog::builder();
        for (i, (name, selector)) in entries.iter().enumerate() {
            builder.add(Directive::new(DeclarationId(i as u32), *name, Selector::parse(selector)?));
        }
        Ok(builder.build())
    }

    fn names(matches: &[angular_template_resolver::DirectiveMatch<'_>]) -> Vec<String> {
        matches.iter().map(|m| m.directive().name().to_string()).collect()
    }

    #[test]
    fn test_attribute_list_selector_needs_every_attribute() -> anyhow::Result<()> {
        let catalog = catalog(&[("NgForOf", "[ngFor][ngForOf]")])?;
        let matcher = SelectorMatcher::new(&catalog);

        let both = ElementQuery::with_names("ng-template", ["ngFor", "ngForOf"]);
        assert_eq!(names(&matcher.match_element(&both)), vec!["NgForOf"]);

        let only_of = ElementQuery::with_names("ng-template", ["ngForOf"]);
        assert!(matcher.match_element(&only_of).is_empty());
        Ok(())
    }

    #[test]
    fn test_selector_list_matches_through_distinct_alternatives() -> anyhow::Result<()> {
        let catalog = catalog(&[("MatButton", "button[mat-icon-button], button[mat-raised-button]")])?;
        let matcher = SelectorMatcher::new(&catalog);

        let icon = matcher.match_element(&ElementQuery::new("button").with_attribute("mat-icon-button"));
        let raised = matcher.match_element(&ElementQuery::new("button").with_attribute("mat-raised-button"));
        assert_eq!(icon.len(), 1);
        assert_eq!(raised.len(), 1);
        assert_eq!(icon[0].alternative_index(), 0);
        assert_eq!(raised[0].alternative_index(), 1);
        assert_eq!(raised[0].matched_attribute(), Some("mat-raised-button"));

        let anchor = ElementQuery::new("a").with_attribute("mat-icon-button");
        assert!(matcher.match_element(&anchor).is_empty());
        Ok(())
    }

    #[test]
    fn test_adding_attributes_never_removes_a_match() -> anyhow::Result<()> {
        let selectors = [
            "[ngModel]",
            "input[type=checkbox][ngModel]",
            "my-customer",
            "[a] [b]",
            ".someClass",
            "button[mat-icon-button], button[mat-raised-button]",
        ];
        let base = ElementQuery::new("input")
            .with_attribute("ngModel")
            .with_attribute_value("type", "checkbox")
            .with_attribute("a")
            .with_attribute("b");
        let extended = base.clone().with_attribute("extra").with_attribute("[unused]");

        for text in selectors {
            let selector = Selector::parse(text)?;
            if match_selector(&selector, &base).is_some() {
                assert!(match_selector(&selector, &extended).is_some(), "{} lost its match", text);
            }
        }
        Ok(())
    }

    #[test]
    fn test_repeated_attribute_does_not_break_presence_match() -> anyhow::Result<()> {
        let selector = Selector::parse("input[type=checkbox]")?;
        let presence = ElementQuery::new("input").with_attribute("type");
        assert_eq!(match_selector(&selector, &presence), Some(0));

        let repeated = presence.clone().with_attribute_value("type", "text");
        assert_eq!(match_selector(&selector, &repeated), Some(0));
        Ok(())
    }

    #[test]
    fn test_presence_only_class_is_a_matched_attribute() -> anyhow::Result<()> {
        let catalog = catalog(&[("Styled", "[class]"), ("Active", "div.active")])?;
        let matcher = SelectorMatcher::new(&catalog);
        let query = ElementQuery::new("div").with_attribute_value("class", "active");
        let matches = matcher.match_element(&query);
        assert_eq!(names(&matches), vec!["Styled", "Active"]);
        assert_eq!(matches[0].matched_attribute(), Some("class"));
        assert!(matches[1].matched_attributes().is_empty());
        Ok(())
    }

    #[test]
    fn test_matches_keep_catalog_order() -> anyhow::Result<()> {
        let catalog = catalog(&[
            ("DefaultValueAccessor", "input:not([type=checkbox])[ngModel]"),
            ("NgModel", "[ngModel]:not([formControlName]):not([formControl])"),
            ("Unrelated", "select"),
            ("MaxLength", "[maxlength][ngModel]"),
        ])?;
        let matcher = SelectorMatcher::new(&catalog);
        let query = ElementQuery::new("input")
            .with_attribute("ngModel")
            .with_attribute_value("maxlength", "5");
        assert_eq!(
            names(&matcher.match_element(&query)),
            vec!["DefaultValueAccessor", "NgModel", "MaxLength"]
        );
        Ok(())
    }

    #[test]
    fn test_matches_attribute_filters_by_matched_name() -> anyhow::Result<()> {
        let catalog = catalog(&[("NgIf", "[ngIf]"), ("NgForOf", "[ngFor][ngForOf]")])?;
        let matcher = SelectorMatcher::new(&catalog);
        let query = ElementQuery::with_names("ng-template", ["ngIf", "ngFor", "ngForOf"]);
        assert_eq!(names(&matcher.matches_attribute(&query, "ngForOf")), vec!["NgForOf"]);
        assert_eq!(names(&matcher.matches_attribute(&query, "ngIf")), vec!["NgIf"]);
        assert!(matcher.matches_attribute(&query, "ngSwitch").is_empty());
        Ok(())
    }

    #[test]
    fn test_batch_matching_keeps_input_order() -> anyhow::Result<()> {
        let catalog = catalog(&[("Customer", "my-customer"), ("Tooltip", "[tooltip]")])?;
        let matcher = SelectorMatcher::new(&catalog);
        let queries: Vec<ElementQuery> = (0..64)
            .map(|i| {
                if i % 2 == 0 {
                    ElementQuery::new("my-customer")
                } else {
                    ElementQuery::new("span").with_attribute("tooltip")
                }
            })
            .collect();

        let results = matcher.match_elements(&queries);
        assert_eq!(results.len(), queries.len());
        for (i, matches) in results.iter().enumerate() {
            let expected = if i % 2 == 0 { "Customer" } else { "Tooltip" };
            assert_eq!(names(matches), vec![expected]);
        }
        Ok(())
    }
}
