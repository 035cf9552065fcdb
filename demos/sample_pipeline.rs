//! Runs the full pipeline over generated sample records and prints the
//! run result and lifetime statistics.
//!
//! ```text
//! cargo run --example sample_pipeline
//! RUST_LOG=debug cargo run --example sample_pipeline
//! ```

use chrono::{Duration, Utc};
use etl_pipeline::etl::{ETLPipeline, MemoryExtractor, MemoryLoader, PipelineConfig};
use etl_pipeline::record::{Batch, Record, Value, ValueType};
use etl_pipeline::transform::{StandardTransformer, TransformerConfigBuilder};
use etl_pipeline::validate::DataValidator;

fn sample_data() -> Batch {
    let base = Utc::now();
    (0..100i64)
        .map(|i| {
            let mut record = Record::new();
            record.insert("id".into(), Value::Int(i + 1));
            record.insert("name".into(), Value::from(format!("Record {}", i + 1)));
            record.insert("value".into(), Value::Int(100 + i * 10));
            record.insert(
                "timestamp".into(),
                Value::from((base - Duration::days(i)).to_rfc3339()),
            );
            record.insert("category".into(), Value::from(format!("Category {}", i % 5)));
            let status = if i % 2 == 0 { "active" } else { "inactive" };
            record.insert("status".into(), Value::from(status));
            record
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    etl_pipeline::logging::init("info")?;

    let transformer = StandardTransformer::new(
        TransformerConfigBuilder::default()
            .date_columns(vec!["timestamp".to_string()])
            .build()?,
    )?;

    let validator = DataValidator::new()
        .require_all(["id", "name"])
        .expect_type("id", [ValueType::Int])
        .expect_type("value", [ValueType::Int, ValueType::Float]);

    let loader = MemoryLoader::new();

    let pipeline = ETLPipeline::new(MemoryExtractor::new(sample_data()))
        .with_transformer(transformer)
        .with_validator(validator)
        .with_loader(loader.clone())
        .with_config(PipelineConfig::new("Main ETL Pipeline"));

    let result = pipeline.run().await;

    println!("\n{}", "=".repeat(50));
    println!("Pipeline Execution Results");
    println!("{}", "=".repeat(50));
    println!("Success: {}", result.success);
    println!("Duration: {:.2} seconds", result.duration_secs);
    println!("Records Extracted: {}", result.records_extracted);
    println!("Records Transformed: {}", result.records_transformed);
    println!("Records Validated: {}", result.records_validated);
    println!("Records Loaded: {}", result.records_loaded);
    if result.records_invalid > 0 {
        println!("Records Invalid: {}", result.records_invalid);
    }
    if !result.errors.is_empty() {
        println!("\nErrors: {}", result.errors.len());
        for error in &result.errors {
            println!("  - {}", error.message);
        }
    }
    println!("{}", "=".repeat(50));

    let stats = pipeline.stats();
    println!("\nPipeline Statistics:");
    println!("  Total Runs: {}", stats.runs);
    println!("  Successful: {}", stats.successful_runs);
    println!("  Failed: {}", stats.failed_runs);
    println!("  Records Processed: {}", stats.records_processed);
    println!("  Records Failed: {}", stats.records_failed);

    println!("\nLoaded {} record(s) into memory", loader.len());

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
