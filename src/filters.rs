//! Extraction of per-field predicates from a parsed query.

use crate::ast::{AstNode, Operand, Operator, RootKey, Value};
use crate::parser;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

/// A single `{operator, value}` predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFilter {
    pub operator: Operator,
    pub value: Value,
}

/// Root keys yield one equality predicate; tree fields yield every predicate
/// found, in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldFilter {
    Root(QueryFilter),
    Tree(Vec<QueryFilter>),
}

pub type FilterMap = BTreeMap<String, FieldFilter>;

/// Collects the predicates of the requested `fields` from `query`.
///
/// Returns `None` when the query does not parse. Fields that appear nowhere in
/// the query are absent from the map.
pub fn get_filters<S: AsRef<str>>(query: &str, fields: &[S]) -> Option<FilterMap> {
    let parsed = match parser::parse(query) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(%query, error = %e, "failed to parse search query");
            return None;
        }
    };

    let mut filters = FilterMap::new();

    for field in fields {
        let field = field.as_ref();
        let Some(value) = RootKey::from_name(field).and_then(|key| parsed.root.get(key)) else {
            continue;
        };
        filters.insert(
            field.to_string(),
            FieldFilter::Root(QueryFilter {
                operator: Operator::Eq,
                value: Value::Text(value.to_string()),
            }),
        );
    }

    if let Some(tree) = &parsed.filters {
        traverse(tree, fields, &mut filters);
    }

    Some(filters)
}

/// Depth first: left subtree, right subtree, then the node itself.
fn traverse<S: AsRef<str>>(node: &AstNode, fields: &[S], filters: &mut FilterMap) {
    if let Operand::Node(left) = &node.left {
        traverse(left, fields, filters);
    }
    if let Operand::Node(right) = &node.right {
        traverse(right, fields, filters);
    }

    let (Operand::Field(key), Operand::Value(value)) = (&node.left, &node.right) else {
        return;
    };
    if !fields.iter().any(|field| field.as_ref() == key.as_str()) {
        return;
    }

    let entry = filters
        .entry(key.clone())
        .or_insert_with(|| FieldFilter::Tree(Vec::new()));
    if let FieldFilter::Tree(list) = entry {
        list.push(QueryFilter {
            operator: node.operator,
            value: value.clone(),
        });
    }
}
