//! Tests for query encoding and in-memory evaluation

use chrono::NaiveDate;
use serde_json::{json, Value};

use medidash::models::{AppointmentStatus, Role};
use medidash::query::{Direction, QueryBuilder};

fn rows() -> Vec<Value> {
    vec![
        json!({ "id": "a", "full_name": "Ada Lovelace", "visits": 3, "appointment_date": "2025-03-05", "status": "scheduled" }),
        json!({ "id": "b", "full_name": "Alan Turing", "visits": 12, "appointment_date": "2025-03-04", "status": "pending" }),
        json!({ "id": "c", "full_name": "grace hopper", "visits": null, "appointment_date": "2025-03-06", "status": "completed" }),
    ]
}

fn ids(rows: &[Value]) -> Vec<&str> {
    rows.iter().map(|row| row["id"].as_str().unwrap()).collect()
}

#[test]
fn test_params_encode_filters_order_and_paging() {
    let query = QueryBuilder::new()
        .select(&["id", "full_name"])
        .eq("role", Role::SuperAdmin)
        .gte("appointment_date", NaiveDate::from_ymd_opt(2025, 3, 4).unwrap())
        .ilike("full_name", "%ada%")
        .is_null("deleted_at")
        .order_asc("appointment_date")
        .order_desc("appointment_time")
        .limit(10)
        .offset(20);

    let params = query.to_params();

    assert_eq!(
        params,
        vec![
            ("select".to_string(), "id,full_name".to_string()),
            ("role".to_string(), "eq.super_admin".to_string()),
            ("appointment_date".to_string(), "gte.2025-03-04".to_string()),
            ("full_name".to_string(), "ilike.*ada*".to_string()),
            ("deleted_at".to_string(), "is.null".to_string()),
            ("order".to_string(), "appointment_date.asc,appointment_time.desc".to_string()),
            ("limit".to_string(), "10".to_string()),
            ("offset".to_string(), "20".to_string()),
        ]
    );
}

#[test]
fn test_empty_query_selects_everything() {
    assert_eq!(QueryBuilder::new().to_params(), vec![("select".to_string(), "*".to_string())]);
}

#[test]
fn test_in_list_encoding_and_matching() {
    let query = QueryBuilder::new().in_list("status", [AppointmentStatus::Pending, AppointmentStatus::Scheduled]);

    assert_eq!(query.to_params()[1], ("status".to_string(), "in.(pending,scheduled)".to_string()));
    assert_eq!(ids(&query.apply(&rows())), ["a", "b"]);
}

#[test]
fn test_apply_filters_and_sorts() {
    let query = QueryBuilder::new()
        .gte("appointment_date", NaiveDate::from_ymd_opt(2025, 3, 5).unwrap())
        .order("appointment_date", Direction::Descending);

    assert_eq!(ids(&query.apply(&rows())), ["c", "a"]);
}

#[test]
fn test_ilike_ignores_case() {
    let query = QueryBuilder::new().ilike("full_name", "*HOP*");
    assert_eq!(ids(&query.apply(&rows())), ["c"]);

    let query = QueryBuilder::new().like("full_name", "*HOP*");
    assert!(query.apply(&rows()).is_empty());
}

#[test]
fn test_numeric_comparison_skips_nulls() {
    let query = QueryBuilder::new().gt("visits", 5_i64);
    assert_eq!(ids(&query.apply(&rows())), ["b"]);

    let query = QueryBuilder::new().neq("visits", 3_i64);
    assert_eq!(ids(&query.apply(&rows())), ["b"]);
}

#[test]
fn test_nulls_sort_last_ascending() {
    let query = QueryBuilder::new().order_asc("visits");
    assert_eq!(ids(&query.apply(&rows())), ["a", "b", "c"]);

    let query = QueryBuilder::new().order_desc("visits");
    assert_eq!(ids(&query.apply(&rows())), ["c", "b", "a"]);
}

#[test]
fn test_paging_and_projection() {
    let query = QueryBuilder::new().select(&["id"]).order_asc("id").offset(1).limit(1);
    assert_eq!(query.apply(&rows()), vec![json!({ "id": "b" })]);
}

#[test]
fn test_any_of_groups_encode_and_match() {
    let query = QueryBuilder::new()
        .neq("status", "completed")
        .any_of(|q| q.is_null("visits").gte("visits", 10_i64));

    assert_eq!(query.to_params()[2], ("or".to_string(), "(visits.is.null,visits.gte.10)".to_string()));
    assert_eq!(ids(&query.apply(&rows())), ["b"]);

    let open_or_null = QueryBuilder::new().any_of(|q| q.is_null("visits").gte("visits", 10_i64));
    assert_eq!(ids(&open_or_null.apply(&rows())), ["b", "c"]);
}
