//! Dispatch from a search result type to its list item, shaper and sorter.

use crate::records::{RecordStore, SearchMetadata};
use crate::sections::{self, ReportListItem, TransactionListItem};
use crate::sort::{self, SortColumn, SortOrder};
use serde::{Deserialize, Serialize};

/// Logical type of a search result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Transaction,
    Report,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Transaction => "transaction",
            DataType::Report => "report",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        SEARCH_TYPES
            .iter()
            .map(|entry| entry.data_type)
            .find(|data_type| data_type.as_str() == name)
    }
}

/// Row component the renderer uses for a result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListItem {
    TransactionListItem,
    ReportListItem,
}

/// Shaped rows of one result type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sections {
    Transactions(Vec<TransactionListItem>),
    Reports(Vec<ReportListItem>),
}

impl Sections {
    pub fn len(&self) -> usize {
        match self {
            Sections::Transactions(rows) => rows.len(),
            Sections::Reports(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_report_list(&self) -> bool {
        matches!(self, Sections::Reports(_))
    }

    pub fn is_transaction_list(&self) -> bool {
        matches!(self, Sections::Transactions(_))
    }

    pub fn should_show_year(&self, reference_year: i32) -> bool {
        match self {
            Sections::Transactions(rows) => sections::transaction_rows_should_show_year(rows, reference_year),
            Sections::Reports(rows) => sections::report_rows_should_show_year(rows, reference_year),
        }
    }
}

pub type GetSections = fn(&RecordStore, &SearchMetadata, i32) -> Sections;
pub type SortSections = fn(&mut Sections, Option<SortColumn>, Option<SortOrder>);

pub struct SearchTypeEntry {
    pub data_type: DataType,
    pub list_item: ListItem,
    pub get_sections: GetSections,
    pub sort_sections: SortSections,
}

fn transaction_sections(store: &RecordStore, metadata: &SearchMetadata, reference_year: i32) -> Sections {
    Sections::Transactions(sections::get_transaction_sections(store, metadata, reference_year))
}

fn report_sections(store: &RecordStore, metadata: &SearchMetadata, reference_year: i32) -> Sections {
    Sections::Reports(sections::get_report_sections(store, metadata, reference_year))
}

fn sort_transaction_sections(data: &mut Sections, sort_by: Option<SortColumn>, sort_order: Option<SortOrder>) {
    if let Sections::Transactions(rows) = data {
        sort::sort_transactions(rows, sort_by, sort_order);
    }
}

// Reports have a single fixed order.
fn sort_report_sections(data: &mut Sections, _sort_by: Option<SortColumn>, _sort_order: Option<SortOrder>) {
    if let Sections::Reports(rows) = data {
        sort::sort_reports(rows);
    }
}

pub static SEARCH_TYPES: [SearchTypeEntry; 2] = [
    SearchTypeEntry {
        data_type: DataType::Transaction,
        list_item: ListItem::TransactionListItem,
        get_sections: transaction_sections,
        sort_sections: sort_transaction_sections,
    },
    SearchTypeEntry {
        data_type: DataType::Report,
        list_item: ListItem::ReportListItem,
        get_sections: report_sections,
        sort_sections: sort_report_sections,
    },
];

fn entry(data_type: DataType) -> &'static SearchTypeEntry {
    match data_type {
        DataType::Transaction => &SEARCH_TYPES[0],
        DataType::Report => &SEARCH_TYPES[1],
    }
}

/// The declared result type, if it is one this crate can shape.
pub fn get_search_type(metadata: &SearchMetadata) -> Option<DataType> {
    DataType::from_name(&metadata.data_type)
}

pub fn get_list_item(data_type: DataType) -> ListItem {
    entry(data_type).list_item
}

pub fn get_sections(
    data_type: DataType,
    store: &RecordStore,
    metadata: &SearchMetadata,
    reference_year: i32,
) -> Sections {
    (entry(data_type).get_sections)(store, metadata, reference_year)
}

pub fn get_sorted_sections(
    data_type: DataType,
    data: &mut Sections,
    sort_by: Option<SortColumn>,
    sort_order: Option<SortOrder>,
) {
    (entry(data_type).sort_sections)(data, sort_by, sort_order)
}

/// True when the snapshot holds no transactions at all.
pub fn is_search_results_empty(store: &RecordStore) -> bool {
    store.transactions().next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Record, Report, Transaction};

    fn store() -> RecordStore {
        RecordStore::new(vec![
            Record::Report(Report {
                report_id: "r1".to_string(),
                created: Some("2024-01-01 00:00:00".to_string()),
                ..Default::default()
            }),
            Record::Transaction(Transaction {
                transaction_id: "t1".to_string(),
                report_id: "r1".to_string(),
                amount: 300,
                created: "2024-01-02".to_string(),
                ..Default::default()
            }),
            Record::Transaction(Transaction {
                transaction_id: "t2".to_string(),
                report_id: "r1".to_string(),
                amount: 100,
                created: "2024-01-03".to_string(),
                ..Default::default()
            }),
        ])
    }

    #[test]
    fn test_table_entries_match_their_type() {
        for entry in &SEARCH_TYPES {
            assert_eq!(super::entry(entry.data_type).data_type, entry.data_type);
        }
        assert_eq!(get_list_item(DataType::Transaction), ListItem::TransactionListItem);
        assert_eq!(get_list_item(DataType::Report), ListItem::ReportListItem);
    }

    #[test]
    fn test_search_type_from_metadata() {
        let mut metadata = SearchMetadata { data_type: "report".to_string(), ..Default::default() };
        assert_eq!(get_search_type(&metadata), Some(DataType::Report));
        metadata.data_type = "chat".to_string();
        assert_eq!(get_search_type(&metadata), None);
    }

    #[test]
    fn test_dispatches_shaping_and_sorting() {
        let store = store();
        let metadata = SearchMetadata::default();

        let mut transactions = get_sections(DataType::Transaction, &store, &metadata, 2024);
        assert!(transactions.is_transaction_list());
        assert_eq!(transactions.len(), 2);
        get_sorted_sections(DataType::Transaction, &mut transactions, Some(SortColumn::TotalAmount), Some(SortOrder::Asc));
        let Sections::Transactions(rows) = &transactions else {
            panic!("Expected transaction sections");
        };
        assert_eq!(rows[0].key_for_list, "t2");

        let mut reports = get_sections(DataType::Report, &store, &metadata, 2024);
        assert!(reports.is_report_list());
        get_sorted_sections(DataType::Report, &mut reports, None, None);
        let Sections::Reports(rows) = &reports else {
            panic!("Expected report sections");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transactions.len(), 2);
        assert!(!reports.should_show_year(2024));
        assert!(reports.should_show_year(2025));
    }

    #[test]
    fn test_mismatched_sections_are_left_alone() {
        let store = store();
        let mut reports = get_sections(DataType::Report, &store, &SearchMetadata::default(), 2024);
        let before = reports.clone();
        get_sorted_sections(DataType::Transaction, &mut reports, Some(SortColumn::Date), Some(SortOrder::Asc));
        assert_eq!(reports, before);
    }

    #[test]
    fn test_results_empty() {
        assert!(!is_search_results_empty(&store()));
        assert!(is_search_results_empty(&RecordStore::new(vec![])));
    }
}
