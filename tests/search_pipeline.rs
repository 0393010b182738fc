use search_engine::records::{RecordStore, SearchMetadata};
use search_engine::search_type::ListItem;
use search_engine::{
    build_query_string_from_filters, build_search_query_json, get_filters, get_search_type, get_sections,
    get_sorted_sections, normalize_query, query_hash_from_string, AdvancedFilters, DataType, FieldFilter,
    Operator, QueryFilter, Sections, SortColumn, SortOrder, Value,
};

const SNAPSHOT: &str = r#"{
    "personalDetailsList": {
        "1": {"accountID": 1, "displayName": "Ada Lovelace", "login": "ada@example.com"},
        "2": {"accountID": 2, "login": "grace@example.com"}
    },
    "policy_P1": {"name": "Acme Inc"},
    "transactions_t3": {
        "transactionID": "t3", "reportID": "R2", "accountID": 1, "managerID": 2,
        "reportType": "iou", "amount": -900, "merchant": "(none)",
        "created": "2024-05-02", "category": "Meals"
    },
    "report_R1": {
        "reportID": "R1", "accountID": 1, "managerID": 2, "policyID": "P1",
        "type": "expense", "created": "2024-04-01 08:00:00"
    },
    "transactions_t1": {
        "transactionID": "t1", "reportID": "R1", "accountID": 1, "managerID": 2, "policyID": "P1",
        "reportType": "expense", "amount": -1500, "merchant": "Blue Bottle",
        "created": "2024-04-02", "category": "travel", "comment": {"comment": "Coffee with client"}
    },
    "transactions_t2": {
        "transactionID": "t2", "reportID": "R1", "accountID": 1, "managerID": 2, "policyID": "P1",
        "reportType": "expense", "amount": -300, "modifiedAmount": -450, "merchant": "Request",
        "created": "2024-04-03", "modifiedCreated": "2023-12-28", "category": "Airfare"
    },
    "report_R2": {
        "reportID": "R2", "accountID": 1, "managerID": 2, "type": "iou", "created": "2024-05-01 08:00:00"
    },
    "transactions_t4": {
        "transactionID": "t4", "reportID": "R404", "accountID": 2, "managerID": 1,
        "reportType": "iou", "amount": 700, "merchant": "Lyft", "created": "2024-06-01"
    },
    "reportActions_R1": {"ignored": true}
}"#;

const YEAR: i32 = 2024;

fn store() -> RecordStore {
    RecordStore::from_json(SNAPSHOT).expect("snapshot parses")
}

fn metadata(data_type: &str) -> SearchMetadata {
    serde_json::from_value(serde_json::json!({
        "type": data_type,
        "columnsToShow": {"shouldShowCategoryColumn": true, "shouldShowTagColumn": false, "shouldShowTaxColumn": false}
    }))
    .expect("metadata parses")
}

#[test]
fn transaction_projection_end_to_end() {
    let store = store();
    let metadata = metadata("transaction");
    let data_type = get_search_type(&metadata).expect("known type");
    assert_eq!(data_type, DataType::Transaction);
    assert_eq!(search_engine::search_type::get_list_item(data_type), ListItem::TransactionListItem);

    let mut sections = get_sections(data_type, &store, &metadata, YEAR);
    let Sections::Transactions(rows) = &sections else {
        panic!("Expected transaction rows");
    };
    let ids: Vec<_> = rows.iter().map(|r| r.key_for_list.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t1", "t2", "t4"]);

    // One real merchant and one past-year date decide for every row
    assert!(rows.iter().all(|r| r.should_show_merchant && r.should_show_year && r.should_show_category));

    let t3 = &rows[0];
    assert_eq!(t3.formatted_merchant, "");
    assert_eq!(t3.formatted_to, "grace@example.com");
    assert_eq!(t3.formatted_total, 900);

    let t2 = &rows[2];
    assert_eq!(t2.formatted_merchant, "");
    assert_eq!(t2.formatted_total, 450);
    assert_eq!(t2.date, "2023-12-28");
    assert_eq!(t2.formatted_to, "Acme Inc");
    assert_eq!(t2.formatted_from, "Ada Lovelace");

    let query = build_search_query_json("sortBy:category sortOrder:asc", None).expect("query parses");
    let sort_by = query.root.sort_by.as_deref().and_then(SortColumn::from_name);
    let sort_order = query.root.sort_order.as_deref().and_then(SortOrder::from_name);
    get_sorted_sections(data_type, &mut sections, sort_by, sort_order);

    let Sections::Transactions(rows) = &sections else {
        panic!("Expected transaction rows");
    };
    let ids: Vec<_> = rows.iter().map(|r| r.key_for_list.as_str()).collect();
    // t4 has no category and keeps its slot
    assert_eq!(ids, vec!["t2", "t3", "t1", "t4"]);
}

#[test]
fn report_projection_end_to_end() {
    let store = store();
    let metadata = metadata("report");
    let mut sections = get_sections(DataType::Report, &store, &metadata, YEAR);
    get_sorted_sections(DataType::Report, &mut sections, Some(SortColumn::Merchant), Some(SortOrder::Asc));

    let Sections::Reports(rows) = &sections else {
        panic!("Expected report rows");
    };
    assert_eq!(rows.len(), 3);

    // Newest first; the orphan shell has no timestamp and keeps its place
    let keys: Vec<_> = rows.iter().map(|r| r.key_for_list.as_str()).collect();
    assert_eq!(keys, vec!["R2", "R1", "R404"]);

    let r1 = &rows[1];
    let ids: Vec<_> = r1.transactions.iter().map(|t| t.key_for_list.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);

    let r2 = &rows[0];
    assert_eq!(r2.transactions.len(), 1);
    assert_eq!(r2.transactions[0].key_for_list, "t3");

    let shell = &rows[2];
    assert!(shell.is_orphan_shell());
    assert_eq!(shell.transactions[0].key_for_list, "t4");
    assert!(sections.should_show_year(YEAR));
}

#[test]
fn query_text_round_trip() {
    let text = "category:eq:Travel,Meals type:expense policyID:P1";
    let query = build_search_query_json(text, Some("P1")).expect("query parses");
    assert_eq!(query.hash, query_hash_from_string(&format!("{text}P1")));

    let filters = get_filters(text, &["type", "category", "tag"]).expect("filters");
    assert_eq!(
        filters["type"],
        FieldFilter::Root(QueryFilter { operator: Operator::Eq, value: Value::Text("expense".to_string()) })
    );
    assert_eq!(
        filters["category"],
        FieldFilter::Tree(vec![
            QueryFilter { operator: Operator::Eq, value: Value::Text("Travel".to_string()) },
            QueryFilter { operator: Operator::Eq, value: Value::Text("Meals".to_string()) },
        ])
    );
    assert!(!filters.contains_key("tag"));

    let normalized = normalize_query(text);
    assert_eq!(normalized, "type:expense status:all sortBy:date sortOrder:desc policyID:P1");
    assert_eq!(normalize_query(&normalized), normalized);
}

#[test]
fn filters_form_feeds_the_parser() {
    let form: AdvancedFilters = serde_json::from_str(
        r#"{"type": "expense", "category": ["Car Rental"], "dateBefore": "2024-01-01", "dateAfter": "2023-01-01"}"#,
    )
    .expect("form parses");
    let text = build_query_string_from_filters(&form);
    assert_eq!(text, r#"type:expense category:"Car Rental" date<2024-01-01 date>2023-01-01"#);

    let filters = get_filters(&text, &["category", "date"]).expect("filters");
    let FieldFilter::Tree(dates) = &filters["date"] else {
        panic!("Expected tree filter for date");
    };
    assert_eq!(dates.iter().map(|d| d.operator).collect::<Vec<_>>(), vec![Operator::Lt, Operator::Gt]);
    assert_eq!(
        filters["category"],
        FieldFilter::Tree(vec![QueryFilter { operator: Operator::Eq, value: Value::Text("Car Rental".to_string()) }])
    );
}

#[test]
fn invalid_query_surfaces_as_none() {
    for text in ["date<", r#"merchant:"unclosed"#, "amount!5", "category:A,", "sortOrder:up"] {
        assert!(build_search_query_json(text, None).is_none(), "query: {text}");
        assert!(get_filters(text, &["category"]).is_none(), "query: {text}");
    }
}
