//! Shapes a [`RecordStore`] snapshot into list items ready for rendering.
//!
//! Two projections exist: flat transaction rows, and report rows that own the
//! transactions filed under them. Both share the per-transaction enrichment and
//! the two whole-result-set flags (merchant column, year in dates).

use crate::records::{
    ColumnsToShow, PersonalDetails, Policy, Record, RecordStore, Report, SearchMetadata, Transaction,
};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Merchant placeholder for a transaction still being scanned.
pub const PARTIAL_TRANSACTION_MERCHANT: &str = "(none)";
/// Merchant placeholder for a money request without a merchant.
pub const DEFAULT_MERCHANT: &str = "Request";

/// The "to" side of a row: a workspace for expense reports, a person otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Counterpart {
    Policy(Policy),
    Person(PersonalDetails),
}

impl Counterpart {
    pub fn formatted_name(&self) -> String {
        match self {
            Counterpart::Policy(policy) => policy.name.clone().unwrap_or_default(),
            Counterpart::Person(person) => person.formatted_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListItem {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub from: Option<PersonalDetails>,
    pub to: Option<Counterpart>,
    pub formatted_from: String,
    pub formatted_to: String,
    pub formatted_total: i64,
    pub formatted_merchant: String,
    pub date: String,
    pub should_show_merchant: bool,
    pub should_show_category: bool,
    pub should_show_tag: bool,
    pub should_show_tax: bool,
    pub should_show_year: bool,
    pub key_for_list: String,
}

/// A report row. `report` is `None` for a shell created because a transaction
/// referenced a report that is not in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListItem {
    #[serde(flatten)]
    pub report: Option<Report>,
    pub key_for_list: String,
    pub from: Option<PersonalDetails>,
    pub to: Option<Counterpart>,
    pub transactions: Vec<TransactionListItem>,
}

impl ReportListItem {
    pub fn is_orphan_shell(&self) -> bool {
        self.report.is_none()
    }

    pub fn created(&self) -> Option<&str> {
        self.report.as_ref()?.created.as_deref()
    }

    fn shell(report_id: &str) -> Self {
        Self {
            report: None,
            key_for_list: report_id.to_string(),
            from: None,
            to: None,
            transactions: Vec::new(),
        }
    }
}

/// Flags decided once per result set and stamped onto every transaction row.
#[derive(Debug, Clone, Copy)]
struct SharedFlags {
    should_show_merchant: bool,
    should_show_year: bool,
    columns: ColumnsToShow,
}

impl SharedFlags {
    fn compute(store: &RecordStore, metadata: &SearchMetadata, reference_year: i32) -> Self {
        Self {
            should_show_merchant: should_show_merchant(store),
            should_show_year: should_show_year(store, reference_year),
            columns: metadata.columns_to_show,
        }
    }
}

pub fn current_year() -> i32 {
    Local::now().year()
}

fn is_placeholder_merchant(merchant: &str) -> bool {
    merchant == PARTIAL_TRANSACTION_MERCHANT || merchant == DEFAULT_MERCHANT
}

/// True iff some transaction has a real merchant worth a column.
pub fn should_show_merchant(store: &RecordStore) -> bool {
    store.transactions().any(|transaction| {
        let merchant = transaction.effective_merchant();
        !merchant.is_empty() && !is_placeholder_merchant(merchant)
    })
}

/// True iff some transaction was created in a year other than `reference_year`.
pub fn should_show_year(store: &RecordStore, reference_year: i32) -> bool {
    store
        .transactions()
        .any(|transaction| is_other_year(transaction.effective_created(), reference_year))
}

pub fn transaction_rows_should_show_year(rows: &[TransactionListItem], reference_year: i32) -> bool {
    rows.iter()
        .any(|row| is_other_year(row.transaction.effective_created(), reference_year))
}

/// Row-level variant that looks at the transactions nested in report rows.
pub fn report_rows_should_show_year(rows: &[ReportListItem], reference_year: i32) -> bool {
    rows.iter()
        .any(|row| transaction_rows_should_show_year(&row.transactions, reference_year))
}

// A date without a readable year counts as another year.
fn is_other_year(date: &str, reference_year: i32) -> bool {
    parse_year(date) != Some(reference_year)
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_year(date: &str) -> Option<i32> {
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(date, format) {
            return Some(datetime.year());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(day.year());
    }
    DateTime::parse_from_rfc3339(date).ok().map(|datetime| datetime.year())
}

fn resolve_to(
    store: &RecordStore,
    is_expense_report: bool,
    policy_id: Option<&str>,
    manager_id: u64,
) -> Option<Counterpart> {
    if is_expense_report {
        policy_id
            .and_then(|id| store.policy(id))
            .cloned()
            .map(Counterpart::Policy)
    } else {
        store.person(manager_id).cloned().map(Counterpart::Person)
    }
}

fn build_transaction_item(
    store: &RecordStore,
    transaction: &Transaction,
    flags: SharedFlags,
) -> TransactionListItem {
    let from = store.person(transaction.account_id).cloned();
    let to = resolve_to(
        store,
        transaction.is_from_expense_report(),
        transaction.policy_id.as_deref(),
        transaction.manager_id,
    );

    let merchant = transaction.effective_merchant();
    let formatted_merchant = if is_placeholder_merchant(merchant) {
        String::new()
    } else {
        merchant.to_string()
    };

    TransactionListItem {
        formatted_from: from.as_ref().map(PersonalDetails::formatted_name).unwrap_or_default(),
        formatted_to: to.as_ref().map(Counterpart::formatted_name).unwrap_or_default(),
        formatted_total: transaction.display_amount(),
        formatted_merchant,
        date: transaction.effective_created().to_string(),
        should_show_merchant: flags.should_show_merchant,
        should_show_category: flags.columns.should_show_category_column,
        should_show_tag: flags.columns.should_show_tag_column,
        should_show_tax: flags.columns.should_show_tax_column,
        should_show_year: flags.should_show_year,
        key_for_list: transaction.transaction_id.clone(),
        from,
        to,
        transaction: transaction.clone(),
    }
}

fn build_report_item(store: &RecordStore, report: &Report) -> ReportListItem {
    ReportListItem {
        key_for_list: report.report_id.clone(),
        from: store.person(report.account_id).cloned(),
        to: resolve_to(
            store,
            report.is_expense_report(),
            report.policy_id.as_deref(),
            report.manager_id,
        ),
        report: Some(report.clone()),
        transactions: Vec::new(),
    }
}

/// Flat transaction projection, in store order.
pub fn get_transaction_sections(
    store: &RecordStore,
    metadata: &SearchMetadata,
    reference_year: i32,
) -> Vec<TransactionListItem> {
    let flags = SharedFlags::compute(store, metadata, reference_year);
    store
        .transactions()
        .map(|transaction| build_transaction_item(store, transaction, flags))
        .collect()
}

/// Report projection.
///
/// Report rows are created first, in store order; transactions are then
/// attached in store order, so a transaction listed before its report still
/// lands in that report's row. A transaction whose report is missing from the
/// snapshot gets a shell row (`report: None`) appended after the real reports.
pub fn get_report_sections(
    store: &RecordStore,
    metadata: &SearchMetadata,
    reference_year: i32,
) -> Vec<ReportListItem> {
    let flags = SharedFlags::compute(store, metadata, reference_year);

    let mut rows: Vec<ReportListItem> = Vec::new();
    let mut index_by_report: HashMap<String, usize> = HashMap::new();

    for record in store.records() {
        let Record::Report(report) = record else {
            continue;
        };
        let row = build_report_item(store, report);
        match index_by_report.get(&report.report_id) {
            Some(&index) => {
                let transactions = std::mem::take(&mut rows[index].transactions);
                rows[index] = ReportListItem { transactions, ..row };
            }
            None => {
                index_by_report.insert(report.report_id.clone(), rows.len());
                rows.push(row);
            }
        }
    }

    for transaction in store.transactions() {
        let item = build_transaction_item(store, transaction, flags);
        let index = match index_by_report.get(&transaction.report_id) {
            Some(&index) => index,
            None => {
                warn!(
                    report_id = %transaction.report_id,
                    transaction_id = %transaction.transaction_id,
                    "transaction references a report missing from the snapshot"
                );
                index_by_report.insert(transaction.report_id.clone(), rows.len());
                rows.push(ReportListItem::shell(&transaction.report_id));
                rows.len() - 1
            }
        };
        rows[index].transactions.push(item);
    }

    rows
}
