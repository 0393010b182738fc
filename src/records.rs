//! Typed view of a fetched search result snapshot.
//!
//! The upstream store is a flat JSON object whose keys are a collection prefix
//! followed by an entity id. That convention is resolved here, once; everything
//! downstream works on [`Record`] variants.

use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

pub const TRANSACTION_PREFIX: &str = "transactions_";
pub const REPORT_PREFIX: &str = "report_";
pub const POLICY_PREFIX: &str = "policy_";
pub const PERSONAL_DETAILS_KEY: &str = "personalDetailsList";

pub const EXPENSE_REPORT_TYPE: &str = "expense";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected store shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(rename = "reportID")]
    pub report_id: String,
    #[serde(rename = "accountID")]
    pub account_id: u64,
    #[serde(rename = "managerID")]
    pub manager_id: u64,
    #[serde(rename = "policyID")]
    pub policy_id: Option<String>,
    pub report_type: Option<String>,
    /// Minor currency units.
    pub amount: i64,
    pub modified_amount: Option<i64>,
    pub currency: Option<String>,
    pub merchant: Option<String>,
    pub modified_merchant: Option<String>,
    pub created: String,
    pub modified_created: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub comment: Comment,
    pub transaction_type: Option<String>,
    pub action: Option<String>,
    pub tax_amount: Option<i64>,
}

impl Transaction {
    pub fn is_from_expense_report(&self) -> bool {
        self.report_type.as_deref() == Some(EXPENSE_REPORT_TYPE)
    }

    /// Modified merchant when set, otherwise the original merchant.
    pub fn effective_merchant(&self) -> &str {
        match self.modified_merchant.as_deref() {
            Some(merchant) if !merchant.is_empty() => merchant,
            _ => self.merchant.as_deref().unwrap_or(""),
        }
    }

    /// Modified creation date when set, otherwise the creation date.
    pub fn effective_created(&self) -> &str {
        match self.modified_created.as_deref() {
            Some(created) if !created.is_empty() => created,
            _ => &self.created,
        }
    }

    /// Expense reports store amounts negated; everything else shows the magnitude.
    /// `i64::MIN` saturates to `i64::MAX`.
    pub fn display_amount(&self) -> i64 {
        let amount = match self.modified_amount {
            Some(modified) if modified != 0 => modified,
            _ => self.amount,
        };
        if self.is_from_expense_report() {
            amount.saturating_neg()
        } else {
            amount.saturating_abs()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "reportID")]
    pub report_id: String,
    #[serde(rename = "accountID")]
    pub account_id: u64,
    #[serde(rename = "managerID")]
    pub manager_id: u64,
    #[serde(rename = "policyID")]
    pub policy_id: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub report_name: Option<String>,
    pub created: Option<String>,
    pub total: i64,
    pub currency: Option<String>,
    pub action: Option<String>,
}

impl Report {
    pub fn is_expense_report(&self) -> bool {
        self.report_type.as_deref() == Some(EXPENSE_REPORT_TYPE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalDetails {
    #[serde(rename = "accountID")]
    pub account_id: u64,
    pub display_name: Option<String>,
    pub login: Option<String>,
    pub avatar: Option<String>,
}

impl PersonalDetails {
    pub fn formatted_name(&self) -> String {
        self.display_name
            .as_deref()
            .or(self.login.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

/// One entity of the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Transaction(Transaction),
    Report(Report),
    Policy(Policy),
    Person(PersonalDetails),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnsToShow {
    pub should_show_category_column: bool,
    pub should_show_tag_column: bool,
    pub should_show_tax_column: bool,
}

/// Per-result-set metadata delivered next to the records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchMetadata {
    #[serde(rename = "type")]
    pub data_type: String,
    pub columns_to_show: ColumnsToShow,
}

/// An immutable snapshot of the search result records, in store order.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    policies: HashMap<String, usize>,
    people: HashMap<u64, usize>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        let mut policies = HashMap::new();
        let mut people = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            match record {
                Record::Policy(policy) => {
                    policies.insert(policy.id.clone(), index);
                }
                Record::Person(person) => {
                    people.insert(person.account_id, index);
                }
                _ => {}
            }
        }
        Self {
            records,
            policies,
            people,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Classifies every top-level key by its collection prefix.
    pub fn from_value(value: serde_json::Value) -> Result<Self, StoreError> {
        let serde_json::Value::Object(map) = value else {
            return Err(StoreError::UnexpectedShape("expected a JSON object".to_string()));
        };

        let mut records = Vec::with_capacity(map.len());
        for (key, value) in map {
            if let Some(id) = key.strip_prefix(TRANSACTION_PREFIX) {
                let mut transaction: Transaction = serde_json::from_value(value)?;
                if transaction.transaction_id.is_empty() {
                    transaction.transaction_id = id.to_string();
                }
                records.push(Record::Transaction(transaction));
            } else if let Some(id) = key.strip_prefix(REPORT_PREFIX) {
                let mut report: Report = serde_json::from_value(value)?;
                if report.report_id.is_empty() {
                    report.report_id = id.to_string();
                }
                records.push(Record::Report(report));
            } else if let Some(id) = key.strip_prefix(POLICY_PREFIX) {
                let mut policy: Policy = serde_json::from_value(value)?;
                policy.id = id.to_string();
                records.push(Record::Policy(policy));
            } else if key == PERSONAL_DETAILS_KEY {
                let people: Map<String, serde_json::Value> = serde_json::from_value(value)?;
                for (account_id, details) in people {
                    let mut person: PersonalDetails = serde_json::from_value(details)?;
                    if person.account_id == 0 {
                        person.account_id = account_id.parse().map_err(|_| {
                            StoreError::UnexpectedShape(format!("invalid account id '{}'", account_id))
                        })?;
                    }
                    records.push(Record::Person(person));
                }
            } else {
                debug!(%key, "ignoring record outside the search collections");
            }
        }

        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.records.iter().filter_map(|record| match record {
            Record::Transaction(transaction) => Some(transaction),
            _ => None,
        })
    }

    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.records.iter().filter_map(|record| match record {
            Record::Report(report) => Some(report),
            _ => None,
        })
    }

    pub fn policy(&self, policy_id: &str) -> Option<&Policy> {
        match self.records.get(*self.policies.get(policy_id)?) {
            Some(Record::Policy(policy)) => Some(policy),
            _ => None,
        }
    }

    pub fn person(&self, account_id: u64) -> Option<&PersonalDetails> {
        match self.records.get(*self.people.get(&account_id)?) {
            Some(Record::Person(person)) => Some(person),
            _ => None,
        }
    }
}
