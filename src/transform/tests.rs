use std::collections::BTreeMap;

use serde_json::json;

use super::*;
use crate::record::batch_from_json;
use crate::transform::TransformerConfigBuilder;

fn transformer(config: TransformerConfig) -> StandardTransformer {
    StandardTransformer::new(config).unwrap()
}

#[test]
fn test_empty_batch_is_returned_untouched() {
    let out = transformer(TransformerConfig::default())
        .apply(Vec::new())
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_every_record_is_stamped() {
    let batch = batch_from_json(json!([{"id": 1}, {"id": 2}]));
    let out = transformer(TransformerConfig::default())
        .apply(batch)
        .unwrap();

    assert_eq!(out.len(), 2);
    for record in &out {
        let stamp = record[TRANSFORMED_AT_FIELD].as_str().unwrap();
        assert!(
            NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S").is_ok(),
            "bad stamp {stamp}"
        );
    }
}

#[test]
fn test_duplicates_keep_first_occurrence() {
    let batch = batch_from_json(json!([
        {"id": 1, "name": "a"},
        {"id": 2, "name": "b"},
        {"id": 1, "name": "a"},
        {"id": 1, "name": "a", "note": null},
    ]));
    let out = transformer(TransformerConfig::default())
        .apply(batch)
        .unwrap();

    let ids: Vec<i64> = out.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_duplicates_survive_when_disabled() {
    let config = TransformerConfigBuilder::default()
        .drop_duplicates(false)
        .build()
        .unwrap();
    let batch = batch_from_json(json!([{"id": 1}, {"id": 1}]));
    let out = transformer(config).apply(batch).unwrap();
    assert_eq!(out.len(), 2);
}

#[test]
fn test_rename_columns() {
    let mut renames = BTreeMap::new();
    renames.insert("old".to_string(), "new".to_string());
    renames.insert("absent".to_string(), "ignored".to_string());
    let config = TransformerConfigBuilder::default()
        .rename_columns(renames)
        .build()
        .unwrap();

    let batch = batch_from_json(json!([{"old": 5, "keep": true}]));
    let out = transformer(config).apply(batch).unwrap();

    assert_eq!(out[0]["new"], Value::Int(5));
    assert!(!out[0].contains_key("old"));
    assert!(!out[0].contains_key("ignored"));
    assert_eq!(out[0]["keep"], Value::Bool(true));
}

fn renamer(pairs: &[(&str, &str)]) -> StandardTransformer {
    let renames: BTreeMap<String, String> = pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
    let config = TransformerConfigBuilder::default()
        .rename_columns(renames)
        .drop_null_threshold(0.0)
        .build()
        .unwrap();
    transformer(config)
}

#[test]
fn test_rename_chain_reads_original_columns() {
    let out = renamer(&[("a", "b"), ("b", "c")])
        .apply(batch_from_json(json!([{"a": 1, "b": 2}])))
        .unwrap();

    assert_eq!(out[0].get("b"), Some(&Value::Int(1)));
    assert_eq!(out[0].get("c"), Some(&Value::Int(2)));
    assert!(!out[0].contains_key("a"));
}

#[test]
fn test_rename_swap_exchanges_columns() {
    let out = renamer(&[("a", "b"), ("b", "a")])
        .apply(batch_from_json(json!([{"a": 1, "b": 2}])))
        .unwrap();

    assert_eq!(out[0].get("a"), Some(&Value::Int(2)));
    assert_eq!(out[0].get("b"), Some(&Value::Int(1)));
}

#[test]
fn test_rename_keeps_column_positions() {
    let out = renamer(&[("first", "renamed")])
        .apply(batch_from_json(json!([{"first": 1, "second": 2}])))
        .unwrap();

    let columns: Vec<&str> = out[0].keys().map(String::as_str).collect();
    assert_eq!(columns, vec!["renamed", "second", TRANSFORMED_AT_FIELD]);
}

#[test]
fn test_renamed_column_overwrites_existing_target() {
    let out = renamer(&[("a", "b")])
        .apply(batch_from_json(json!([{"b": 2, "a": 1}])))
        .unwrap();

    assert_eq!(out[0].get("b"), Some(&Value::Int(1)));
    assert!(!out[0].contains_key("a"));
}

#[test]
fn test_duplicates_ignore_field_order() {
    let out = transformer(TransformerConfig::default())
        .apply(batch_from_json(json!([
            {"id": 1, "name": "a"},
            {"name": "a", "id": 1},
        ])))
        .unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn test_date_columns_are_normalised() {
    let config = TransformerConfigBuilder::default()
        .date_columns(vec!["ts".to_string()])
        .drop_null_threshold(0.0)
        .drop_duplicates(false)
        .build()
        .unwrap();
    let batch = batch_from_json(json!([
        {"ts": "2024-03-01"},
        {"ts": "2024-03-01 10:20:30"},
        {"ts": "2024-03-01T10:20:30.123456"},
        {"ts": "2024-03-01T12:20:30+02:00"},
        {"ts": "not a date"},
        {"ts": 42},
    ]));
    let out = transformer(config).apply(batch).unwrap();

    let ts: Vec<Value> = out.iter().map(|r| r["ts"].clone()).collect();
    assert_eq!(
        ts,
        vec![
            Value::from("2024-03-01T00:00:00"),
            Value::from("2024-03-01T10:20:30"),
            Value::from("2024-03-01T10:20:30"),
            Value::from("2024-03-01T10:20:30"),
            Value::Null,
            Value::Null,
        ]
    );
}

#[test]
fn test_sparse_columns_are_dropped() {
    let batch = batch_from_json(json!([
        {"id": 1, "sparse": null, "half": 1},
        {"id": 2, "half": null},
        {"id": 3, "sparse": 7, "half": 3},
        {"id": 4, "half": null},
    ]));
    let out = transformer(TransformerConfig::default())
        .apply(batch)
        .unwrap();

    // sparse: 3/4 null > 0.5, half: 2/4 null is not over the threshold
    for record in &out {
        assert!(!record.contains_key("sparse"));
        assert!(record.contains_key("id"));
    }
    assert!(out[0].contains_key("half"));
}

#[test]
fn test_zero_threshold_keeps_sparse_columns() {
    let config = TransformerConfigBuilder::default()
        .drop_null_threshold(0.0)
        .build()
        .unwrap();
    let batch = batch_from_json(json!([{"id": 1, "x": null}, {"id": 2, "x": null}]));
    let out = transformer(config).apply(batch).unwrap();
    assert!(out.iter().all(|r| r.contains_key("x")));
}

#[test]
fn test_custom_functions_run_in_order() {
    let t = transformer(TransformerConfig::default())
        .with_custom("double", |batch: Batch| {
            Ok(batch
                .into_iter()
                .map(|mut r| {
                    let v = r["id"].as_i64().unwrap_or_default();
                    r.insert("id".into(), Value::Int(v * 2));
                    r
                })
                .collect())
        })
        .with_custom("first_only", |mut batch: Batch| {
            batch.truncate(1);
            Ok(batch)
        });

    let out = t
        .apply(batch_from_json(json!([{"id": 3}, {"id": 4}])))
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["id"], Value::Int(6));
    assert!(out[0].contains_key(TRANSFORMED_AT_FIELD));
}

#[test]
fn test_custom_function_error_propagates() {
    let t = transformer(TransformerConfig::default())
        .with_custom("boom", |_batch: Batch| Err("bad column".into()));

    let err = t.apply(batch_from_json(json!([{"id": 1}]))).unwrap_err();
    assert_eq!(err.to_string(), "bad column");
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = TransformerConfigBuilder::default()
        .drop_null_threshold(-0.1)
        .build()
        .unwrap();
    let err = StandardTransformer::new(config).unwrap_err();
    assert!(matches!(err, ETLError::Configuration(_)));
}

#[tokio::test]
async fn test_transformer_trait_delegates_to_apply() {
    let t = transformer(TransformerConfig::default());
    let out = t
        .transform(batch_from_json(json!([{"id": 1}, {"id": 1}])))
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
}
