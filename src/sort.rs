//! Column-aware ordering of shaped list items.

use crate::sections::{ReportListItem, TransactionListItem};
use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Table columns a search can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Receipt,
    Date,
    Merchant,
    Description,
    From,
    To,
    Category,
    Tag,
    #[serde(rename = "amount")]
    TotalAmount,
    Type,
    Action,
    TaxAmount,
}

impl SortColumn {
    pub const ALL: [SortColumn; 12] = [
        SortColumn::Receipt,
        SortColumn::Date,
        SortColumn::Merchant,
        SortColumn::Description,
        SortColumn::From,
        SortColumn::To,
        SortColumn::Category,
        SortColumn::Tag,
        SortColumn::TotalAmount,
        SortColumn::Type,
        SortColumn::Action,
        SortColumn::TaxAmount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Receipt => "receipt",
            SortColumn::Date => "date",
            SortColumn::Merchant => "merchant",
            SortColumn::Description => "description",
            SortColumn::From => "from",
            SortColumn::To => "to",
            SortColumn::Category => "category",
            SortColumn::Tag => "tag",
            SortColumn::TotalAmount => "amount",
            SortColumn::Type => "type",
            SortColumn::Action => "action",
            SortColumn::TaxAmount => "taxAmount",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// A sortable property value pulled out of a row.
enum SortKey<'a> {
    Text(&'a str),
    Number(i64),
}

/// Pulls the property a column sorts on out of a row. Unsortable columns and
/// unset optional properties yield `None`.
fn sort_key(row: &TransactionListItem, column: SortColumn) -> Option<SortKey<'_>> {
    match column {
        SortColumn::To => Some(SortKey::Text(&row.formatted_to)),
        SortColumn::From => Some(SortKey::Text(&row.formatted_from)),
        SortColumn::Date => Some(SortKey::Text(&row.date)),
        SortColumn::Tag => row.transaction.tag.as_deref().map(SortKey::Text),
        SortColumn::Merchant => Some(SortKey::Text(&row.formatted_merchant)),
        SortColumn::TotalAmount => Some(SortKey::Number(row.formatted_total)),
        SortColumn::Category => row.transaction.category.as_deref().map(SortKey::Text),
        SortColumn::Type => row.transaction.transaction_type.as_deref().map(SortKey::Text),
        SortColumn::Action => row.transaction.action.as_deref().map(SortKey::Text),
        // Description lives inside the comment object
        SortColumn::Description => row.transaction.comment.comment.as_deref().map(SortKey::Text),
        SortColumn::TaxAmount | SortColumn::Receipt => None,
    }
}

pub fn is_sortable(column: SortColumn) -> bool {
    !matches!(column, SortColumn::TaxAmount | SortColumn::Receipt)
}

/// Compares display strings by Unicode collation at secondary strength:
/// accents count, case does not.
pub struct TextCollator {
    collator: Option<Collator>,
}

impl TextCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Secondary);
        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                warn!(error = ?e, "collation data unavailable, comparing lowercased text");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl Default for TextCollator {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_keys(collator: &TextCollator, a: Option<SortKey<'_>>, b: Option<SortKey<'_>>) -> Ordering {
    match (a, b) {
        (Some(SortKey::Text(a)), Some(SortKey::Text(b))) => collator.compare(a, b),
        (Some(SortKey::Number(a)), Some(SortKey::Number(b))) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Stable sort over the rows `has_key` accepts. Rows without a key tie with
/// every other row, so they stay in their slots and the keyed rows are ordered
/// around them.
fn sort_around_gaps<T: Clone>(
    rows: &mut [T],
    has_key: impl Fn(&T) -> bool,
    compare: impl Fn(&T, &T) -> Ordering,
) {
    let slots: Vec<usize> = (0..rows.len()).filter(|&i| has_key(&rows[i])).collect();
    let mut order = slots.clone();
    order.sort_by(|&a, &b| compare(&rows[a], &rows[b]));

    let sorted: Vec<T> = order.iter().map(|&i| rows[i].clone()).collect();
    for (slot, row) in slots.into_iter().zip(sorted) {
        rows[slot] = row;
    }
}

/// Sorts transaction rows in place. Without a column and an order, or for an
/// unsortable column, the rows keep their shaping order.
pub fn sort_transactions(
    rows: &mut [TransactionListItem],
    sort_by: Option<SortColumn>,
    sort_order: Option<SortOrder>,
) {
    let (Some(column), Some(order)) = (sort_by, sort_order) else {
        return;
    };
    if !is_sortable(column) {
        debug!(column = column.as_str(), "column is not sortable");
        return;
    }

    let collator = TextCollator::new();
    sort_around_gaps(
        rows,
        |row| sort_key(row, column).is_some(),
        |a, b| {
            let ordering = compare_keys(&collator, sort_key(a, column), sort_key(b, column));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        },
    );
}

/// Newest report first, by lexical order of the creation timestamp. Rows
/// without one tie.
pub fn sort_reports(rows: &mut [ReportListItem]) {
    sort_around_gaps(
        rows,
        |row| row.created().is_some(),
        |a, b| match (a.created(), b.created()) {
            (Some(a), Some(b)) => b.cmp(a),
            _ => Ordering::Equal,
        },
    );
}
