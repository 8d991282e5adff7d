//! Error types
//!
//! Selector grammar violations are the only hard failure of the core. Everything else
//! (unknown binding names, unresolved references) is a normal negative result and is
//! returned as `None` or `Resolution::Unresolved`.

use thiserror::Error;

/// A selector text that cannot be tokenized into the selector grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,

    #[error("empty alternative at offset {offset} in selector \"{selector}\"")]
    EmptyAlternative { selector: String, offset: usize },

    #[error("unbalanced '{bracket}' at offset {offset} in selector \"{selector}\"")]
    UnbalancedBracket {
        selector: String,
        bracket: char,
        offset: usize,
    },

    #[error("unexpected \"{found}\" at offset {offset} in selector \"{selector}\"")]
    UnexpectedToken {
        selector: String,
        found: String,
        offset: usize,
    },

    #[error("nesting :not in a selector is not allowed: \"{selector}\"")]
    NestedNot { selector: String },

    #[error(":not accepts a single attribute, class or id selector: \"{selector}\"")]
    UnsupportedNot { selector: String },

    #[error(
        "error in attribute selector \"{attribute}\": unescaped \"$\" is not supported, escape it with \"\\$\""
    )]
    UnescapedDollar { attribute: String },
}

/// Errors raised while building declarations or configuration from external input.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed selector on declaration `{declaration}`: {source}")]
    MalformedSelector {
        declaration: String,
        #[source]
        source: SelectorError,
    },

    #[error("invalid metadata descriptor: {0}")]
    Descriptor(#[source] serde_json::Error),

    #[error("invalid resolver configuration: {0}")]
    Config(#[source] serde_json::Error),
}

impl Error {
    /// The selector diagnostic, when this error came from selector parsing.
    pub fn selector_error(&self) -> Option<&SelectorError> {
        match self {
            Error::MalformedSelector { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
