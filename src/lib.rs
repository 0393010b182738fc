//! Search query engine: parses search query text into a structured query,
//! extracts filter predicates, writes canonical query text back out, and
//! shapes fetched result records into sorted list items.

pub mod ast;
pub mod config;
pub mod filters;
pub mod hash;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod records;
pub mod search_type;
pub mod sections;
pub mod sort;
pub mod token;

pub use ast::{AstNode, Operand, Operator, RootFields, RootKey, SearchQuery, Value};
pub use filters::{get_filters, FieldFilter, FilterMap, QueryFilter};
pub use hash::{query_hash, query_hash_from_string};
pub use parser::{parse, ParseError};
pub use query::{
    build_query_string_from_filters, build_search_query_json, build_search_query_string,
    normalize_query, AdvancedFilters,
};
pub use records::{Record, RecordStore, SearchMetadata, StoreError};
pub use search_type::{get_search_type, get_sections, get_sorted_sections, DataType, Sections};
pub use sections::{ReportListItem, TransactionListItem};
pub use sort::{sort_reports, sort_transactions, SortColumn, SortOrder};
