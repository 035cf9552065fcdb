use etl_pipeline::etl::{ETLPipeline, MemoryExtractor, MemoryLoader, NoopObserver};
use etl_pipeline::record::{Batch, Record, Value, ValueType};
use etl_pipeline::validate::{Constraint, DataValidator, Validator, VALIDATION_ERRORS_FIELD};
use proptest::prelude::*;
use std::sync::Arc;

fn field_value() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        any::<bool>().prop_map(|b| Some(Value::Bool(b))),
        (-1000i64..1000).prop_map(|i| Some(Value::Int(i))),
        (-1000.0f64..1000.0).prop_map(|f| Some(Value::Float(f))),
        "[a-z]{0,6}".prop_map(|s| Some(Value::String(s))),
    ]
}

fn record() -> impl Strategy<Value = Record> {
    (field_value(), field_value(), field_value()).prop_map(|(id, name, score)| {
        let mut record = Record::new();
        for (key, value) in [("id", id), ("name", name), ("score", score)] {
            if let Some(value) = value {
                record.insert(key.to_string(), value);
            }
        }
        record
    })
}

fn batch() -> impl Strategy<Value = Batch> {
    prop::collection::vec(record(), 0..40)
}

fn validator() -> DataValidator {
    DataValidator::new()
        .require_all(["id", "name"])
        .expect_type("id", [ValueType::Int])
        .expect_type("score", [ValueType::Int, ValueType::Float])
        .constrain("score", Constraint::range(Some(0.0), None))
}

proptest! {
    #[test]
    fn partition_conserves_record_count(batch in batch()) {
        let total = batch.len();
        let (valid, invalid) = validator().validate(batch);
        prop_assert_eq!(valid.len() + invalid.len(), total);
    }

    #[test]
    fn invalid_records_carry_reasons(batch in batch()) {
        let (_, invalid) = validator().validate(batch);
        for record in &invalid {
            match record.get(VALIDATION_ERRORS_FIELD) {
                Some(Value::List(reasons)) => prop_assert!(!reasons.is_empty()),
                other => prop_assert!(false, "unexpected reasons {:?}", other),
            }
        }
    }

    #[test]
    fn valid_records_pass_through_unchanged(batch in batch()) {
        let v = validator();
        let expected: Vec<Record> = batch
            .iter()
            .filter(|record| v.check(record).is_empty())
            .cloned()
            .collect();
        let (valid, _) = v.validate(batch);
        prop_assert_eq!(valid, expected);
    }

    #[test]
    fn revalidating_valid_records_is_stable(batch in batch()) {
        let v = validator();
        let (valid, _) = v.validate(batch);
        let count = valid.len();
        let (again, invalid) = v.validate(valid);
        prop_assert_eq!(again.len(), count);
        prop_assert!(invalid.is_empty());
    }

    #[test]
    fn stats_accumulate_across_runs(batch in batch(), runs in 1u64..5) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (valid, invalid) = validator().validate(batch.clone());
        let total = batch.len() as u64;

        let loader = MemoryLoader::new();
        let pipeline = ETLPipeline::new(MemoryExtractor::new(batch))
            .with_validator(validator())
            .with_loader(loader.clone())
            .with_observer(Arc::new(NoopObserver));

        for _ in 0..runs {
            let result = runtime.block_on(pipeline.run());
            prop_assert!(result.success);
            prop_assert_eq!(result.records_loaded, valid.len());
            prop_assert_eq!(result.records_invalid, invalid.len());
        }

        let stats = pipeline.stats();
        prop_assert_eq!(stats.runs, runs);
        prop_assert_eq!(stats.successful_runs, runs);
        prop_assert_eq!(stats.failed_runs, 0);
        prop_assert_eq!(stats.records_processed, total * runs);
        prop_assert_eq!(stats.records_failed, invalid.len() as u64 * runs);
        prop_assert_eq!(loader.len() as u64, valid.len() as u64 * runs);
    }
}
