//! Free-text search queries.
//!
//! User input is never passed to the full-text engine verbatim. It is split
//! into alphanumeric tokens, and each token becomes a quoted prefix term, so
//! operators and stray quotes in the input cannot produce a syntax error.

use serde::{Deserialize, Serialize};

/// Upper bound on the number of tokens kept from one query.
pub const MAX_QUERY_TOKENS: usize = 16;

/// Normalised search query.
///
/// # Examples
/// ```
/// use kudoer::domain::SearchQuery;
///
/// let query = SearchQuery::parse("Nalgene \"bottle\"").expect("has tokens");
/// assert_eq!(query.match_expression(), "\"nalgene\"* \"bottle\"*");
/// assert!(SearchQuery::parse("  ?! ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    tokens: Vec<String>,
}

impl SearchQuery {
    /// Tokenise raw input. Returns `None` when no searchable token remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let tokens: Vec<String> = raw
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .take(MAX_QUERY_TOKENS)
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    /// Tokens in input order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Full-text `MATCH` expression: every token as a quoted prefix term,
    /// implicitly AND-ed.
    pub fn match_expression(&self) -> String {
        self.tokens
            .iter()
            .map(|token| format!("\"{token}\"*"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
