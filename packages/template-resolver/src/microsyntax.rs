//! Structural directive microsyntax
//!
//! Desugars the value of a star attribute into the keys and `let` variables carried by
//! the implicit `<ng-template>`:
//!
//! ```text
//! *ngFor="let item of items; index as i; trackBy: byId"
//!   keys:      ngFor, ngForOf (items), ngForTrackBy (byId)
//!   variables: item = $implicit, i = index
//! ```
//!
//! Expressions are kept as opaque text. Bindings must be separated by `;` or `,`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Context property a `let` variable reads when no value is given.
pub const IMPLICIT_CONTEXT: &str = "$implicit";

static LET_BINDING_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^let\s+([A-Za-z_$][\w$]*)\s*(?:=\s*([A-Za-z_$][\w$.]*))?\s*(.*)$")
        .expect("let binding regex is valid")
});

static KEYED_BINDING_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([A-Za-z_$][\w$]*)\s*:?\s*(.*)$").expect("keyed binding regex is valid")
});

static AS_ALIAS_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(.*?)\s*\bas\s+([A-Za-z_$][\w$]*)\s*$").expect("as alias regex is valid")
});

/// A key of the implicit template, already prefixed with the directive key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateKey {
    pub name: String,
    pub expression: Option<String>,
}

/// A variable introduced by the microsyntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    pub name: String,
    /// Context property the variable reads.
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateBindings {
    pub keys: Vec<TemplateKey>,
    pub variables: Vec<TemplateVariable>,
}

impl TemplateBindings {
    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|key| key.name.as_str())
    }
}

/// Input name for a microsyntax keyword: `ngFor` + `of` gives `ngForOf`.
pub fn prefixed_key(directive_key: &str, keyword: &str) -> String {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => {
            let mut name = String::with_capacity(directive_key.len() + keyword.len());
            name.push_str(directive_key);
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
            name
        }
        None => directive_key.to_string(),
    }
}

/// Parse the value of `*<directive_key>="<value>"`.
pub fn parse_template_bindings(directive_key: &str, value: &str) -> TemplateBindings {
    let mut bindings = TemplateBindings::default();
    let mut directive_expression: Option<String> = None;

    for (index, segment) in split_bindings(value).into_iter().enumerate() {
        let mut rest = segment;

        if let Some(caps) = LET_BINDING_REGEXP.captures(rest) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let context = caps.get(2).map_or(IMPLICIT_CONTEXT, |m| m.as_str());
            bindings.variables.push(TemplateVariable {
                name: name.to_string(),
                value: context.to_string(),
            });
            rest = caps.get(3).map_or("", |m| m.as_str()).trim();
            if rest.is_empty() {
                continue;
            }
        } else if index == 0 {
            // Leading expression binds to the directive key itself.
            let (expression, alias) = split_alias(rest);
            if !expression.is_empty() {
                directive_expression = Some(expression.to_string());
            }
            if let Some(alias) = alias {
                bindings.variables.push(TemplateVariable {
                    name: alias.to_string(),
                    value: directive_key.to_string(),
                });
            }
            continue;
        }

        let Some(caps) = KEYED_BINDING_REGEXP.captures(rest) else {
            tracing::debug!(segment = rest, "unrecognized template binding segment");
            continue;
        };
        let keyword = caps.get(1).map_or("", |m| m.as_str());
        let (expression, alias) = split_alias(caps.get(2).map_or("", |m| m.as_str()));

        match (expression.is_empty(), alias) {
            // `index as i` reads the context property directly.
            (true, Some(alias)) => bindings.variables.push(TemplateVariable {
                name: alias.to_string(),
                value: keyword.to_string(),
            }),
            (_, alias) => {
                let name = prefixed_key(directive_key, keyword);
                if let Some(alias) = alias {
                    bindings.variables.push(TemplateVariable {
                        name: alias.to_string(),
                        value: name.clone(),
                    });
                }
                bindings.keys.push(TemplateKey {
                    name,
                    expression: (!expression.is_empty()).then(|| expression.to_string()),
                });
            }
        }
    }

    bindings.keys.insert(
        0,
        TemplateKey {
            name: directive_key.to_string(),
            expression: directive_expression,
        },
    );
    bindings
}

fn split_alias(text: &str) -> (&str, Option<&str>) {
    match AS_ALIAS_REGEXP.captures(text) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()).trim(),
            caps.get(2).map(|m| m.as_str()),
        ),
        None => (text.trim(), None),
    }
}

/// Splits at top-level `;` and `,`, skipping separators nested in brackets or quotes.
fn split_bindings(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in value.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if ch == '\\' => escaped = true,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                ';' | ',' if depth == 0 => {
                    segments.push(value[start..i].trim());
                    start = i + ch.len_utf8();
                }
                _ => {}
            },
        }
    }
    segments.push(value[start..].trim());
    segments.retain(|segment| !segment.is_empty());
    segments
}
