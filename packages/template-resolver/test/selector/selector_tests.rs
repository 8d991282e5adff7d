/**
 * Selector Tests
 *
 * Parsing, serialization and rejection of directive selector text
 */

#[cfg(test)]
mod tests {
    use angular_template_resolver::selector::{AttributePredicate, CompoundSelector, Selector, SelectorAlternative};
    use angular_template_resolver::SelectorError;
    use pretty_assertions::assert_eq;

    const SELECTORS: &[&str] = &[
        "div",
        "my-customer",
        "*",
        "[ngModel]",
        "[ngFor][ngForOf]",
        "input[type=checkbox][ngModel]",
        r#"input[type="some value"]"#,
        "[ngModel]:not([formControlName]):not([formControl])",
        ".someClass.class2",
        "#main",
        "div.a#b[c]",
        "button[mat-icon-button], button[mat-raised-button]",
        "form:not([ngNoForm]):not([formGroup]),ngForm,[ngForm]",
        "[a] [b], c",
        r"[\$event]",
        r#"[a=x"y]"#,
        "[a=it's]",
        "[class], .active",
    ];

    #[test]
    fn test_parse_serialize_parse_round_trip() -> anyhow::Result<()> {
        for text in SELECTORS {
            let parsed = Selector::parse(text)?;
            let reparsed = Selector::parse(&parsed.to_string())?;
            assert_eq!(parsed, reparsed, "round trip of {}", text);
        }
        Ok(())
    }

    #[test]
    fn test_source_text_is_kept() -> anyhow::Result<()> {
        let selector: Selector = "[ngFor][ngForOf]".parse()?;
        assert_eq!(selector.text(), "[ngFor][ngForOf]");
        Ok(())
    }

    #[test]
    fn test_selector_list_has_one_alternative_per_entry() -> anyhow::Result<()> {
        let selector = Selector::parse("button[mat-icon-button], button[mat-raised-button]")?;
        let expected = Selector::from_alternatives(vec![
            SelectorAlternative::new(vec![CompoundSelector::new()
                .with_tag("button")
                .with_attribute(AttributePredicate::new("mat-icon-button", None))]),
            SelectorAlternative::new(vec![CompoundSelector::new()
                .with_tag("button")
                .with_attribute(AttributePredicate::new("mat-raised-button", None))]),
        ]);
        assert_eq!(selector, expected);
        assert_eq!(selector.element_names(), vec!["button"]);
        assert_eq!(selector.attribute_names(), vec!["mat-icon-button", "mat-raised-button"]);
        Ok(())
    }

    #[test]
    fn test_negated_names_are_not_bindable() -> anyhow::Result<()> {
        let selector = Selector::parse("[ngModel]:not([formControlName]):not([formControl])")?;
        assert_eq!(selector.attribute_names(), vec!["ngModel"]);
        Ok(())
    }

    #[test]
    fn test_quote_in_unquoted_value_survives_round_trip() -> anyhow::Result<()> {
        let selector = Selector::parse(r#"[a=x"y]"#)?;
        assert_eq!(selector.to_string(), r#"[a='x"y']"#);
        let predicate = &selector.alternatives()[0].compounds()[0].attributes()[0];
        assert_eq!(predicate.value(), Some(r#"x"y"#));
        Ok(())
    }

    #[test]
    fn test_presence_only_class_is_bindable() -> anyhow::Result<()> {
        let selector = Selector::parse("[class], .active")?;
        assert_eq!(selector.attribute_names(), vec!["class"]);
        Ok(())
    }

    #[test]
    fn test_escaped_dollar() -> anyhow::Result<()> {
        let selector = Selector::parse(r"[\$event]")?;
        assert_eq!(selector.attribute_names(), vec!["$event"]);
        assert_eq!(selector.to_string(), r"[\$event]");
        Ok(())
    }

    #[test]
    fn test_malformed_selectors_are_rejected() {
        let malformed = [
            "",
            "[ngFor",
            "ngFor]",
            "div,",
            ", div",
            "a,,b",
            ":not([a]",
            "div)",
            ":not(:not([a]))",
            ":not(.a.b)",
            ":not(div)",
            "[$event]",
            "a > b",
            "[a]div",
            r#"[a=x"y']"#,
        ];
        for text in malformed {
            assert!(Selector::parse(text).is_err(), "{:?} should be rejected", text);
        }
    }

    #[test]
    fn test_malformed_selector_errors() {
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse(":not([a]"),
            Err(SelectorError::UnbalancedBracket { bracket: '(', offset: 0, .. })
        ));
        assert!(matches!(
            Selector::parse(":not(.a.b)"),
            Err(SelectorError::UnsupportedNot { .. })
        ));
        assert!(matches!(
            Selector::parse("[$event]"),
            Err(SelectorError::UnescapedDollar { .. })
        ));
        assert!(matches!(
            Selector::parse(r#"[a=x"y']"#),
            Err(SelectorError::UnexpectedToken { offset: 3, .. })
        ));
        assert!(matches!(
            Selector::parse("a,,b"),
            Err(SelectorError::EmptyAlternative { .. })
        ));
    }
}
