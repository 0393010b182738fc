//! Conversions between query text and [`SearchQuery`].

use crate::ast::{RootFields, RootKey, SearchQuery};
use crate::hash::query_hash_from_string;
use crate::lexer::is_word_char;
use crate::parser;
use serde::Deserialize;
use tracing::error;

/// Filter keys emitted by [`build_query_string_from_filters`].
pub const CATEGORY_KEY: &str = "category";
pub const DATE_KEY: &str = "date";

/// Parses `query` and attaches the input text and its hash.
///
/// Parse failures are logged and reported as `None`; callers fall back to the
/// last good query or the raw text.
pub fn build_search_query_json(query: &str, policy_id: Option<&str>) -> Option<SearchQuery> {
    match parser::parse(query) {
        Ok(parsed) => {
            let hash = query_hash_from_string(&format!("{}{}", query, policy_id.unwrap_or_default()));
            Some(SearchQuery::from_parsed(parsed, query, hash))
        }
        Err(e) => {
            error!(%query, error = %e, span = ?e.span, "failed to parse search query");
            None
        }
    }
}

/// Root values of the empty query.
fn default_root_fields() -> RootFields {
    build_search_query_json("", None)
        .map(|query| query.root)
        .unwrap_or_else(RootFields::with_defaults)
}

/// Serializes root keys in their fixed order, taking each value from `partial`
/// when present and from the default query otherwise.
pub fn build_search_query_string(partial: Option<&RootFields>) -> String {
    let defaults = default_root_fields();

    RootKey::ALL
        .into_iter()
        .filter_map(|key| {
            let value = partial
                .and_then(|fields| fields.get(key))
                .filter(|value| !value.is_empty())
                .or_else(|| defaults.get(key))?;
            Some(format!("{}:{}", key.as_str(), quote_value(value)))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical text of `query`, with every root key spelled out.
pub fn normalize_query(query: &str) -> String {
    let normalized = build_search_query_json(query, None);
    build_search_query_string(normalized.as_ref().map(|query| &query.root))
}

/// Values picked in the advanced filters form. Unknown form keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvancedFilters {
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    pub status: Option<String>,
    pub category: Option<Vec<String>>,
    pub date_before: Option<String>,
    pub date_after: Option<String>,
}

/// Quotes a value that would not lex back as a single bare word.
fn quote_value(value: &str) -> String {
    if value.chars().all(is_word_char) {
        value.to_string()
    } else {
        format!("\"{}\"", value)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn build_date_filter_query(filters: &AdvancedFilters) -> String {
    let mut parts = Vec::new();
    if let Some(before) = non_empty(&filters.date_before) {
        parts.push(format!("{}<{}", DATE_KEY, before));
    }
    if let Some(after) = non_empty(&filters.date_after) {
        parts.push(format!("{}>{}", DATE_KEY, after));
    }
    parts.join(" ")
}

/// Builds query text from the advanced filters form. The date range is
/// appended after every other clause.
pub fn build_query_string_from_filters(filters: &AdvancedFilters) -> String {
    let mut parts = Vec::new();

    if let Some(data_type) = non_empty(&filters.data_type) {
        parts.push(format!("{}:{}", RootKey::Type.as_str(), data_type));
    }
    if let Some(status) = non_empty(&filters.status) {
        parts.push(format!("{}:{}", RootKey::Status.as_str(), status));
    }
    if let Some(categories) = filters.category.as_ref().filter(|c| !c.is_empty()) {
        let joined = categories
            .iter()
            .map(|category| quote_value(category))
            .collect::<Vec<_>>()
            .join(",");
        parts.push(format!("{}:{}", CATEGORY_KEY, joined));
    }

    let date_filter = build_date_filter_query(filters);
    if !date_filter.is_empty() {
        parts.push(date_filter);
    }

    parts.join(" ")
}
