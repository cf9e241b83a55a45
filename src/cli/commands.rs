//! CLI command implementations
//!
//! Both commands load the schema description once. `coerce` then streams:
//! each input line is coerced on its own, with its own rejection list, and a
//! bad line never stops the stream.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::observability::{CoercionMetrics, Event};
use crate::schema::{
    coerce_array, load_file, FieldSpec, InvalidAssignment, Object, Options, Record, RejectionLog,
    Schema, Value,
};

use super::args::Command;
use super::config::CoerceConfig;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_requests, write_error, write_response};

/// Dispatch a parsed command
pub fn run_command(command: Command, config: &CoerceConfig) -> CliResult<()> {
    match command {
        Command::Normalize { schema } => normalize(&schema, &mut io::stdout()),
        Command::Coerce {
            schema,
            static_by_default,
            ..
        } => {
            let mut config = config.clone();
            config.static_by_default |= static_by_default;
            let stdin = io::stdin();
            coerce(&schema, &config, stdin.lock(), &mut io::stdout())
        }
    }
}

/// Print the canonical schema as pretty JSON
pub fn normalize<W: Write>(schema_path: &Path, writer: &mut W) -> CliResult<()> {
    let schema = load_file(schema_path)?;
    serde_json::to_writer_pretty(&mut *writer, &schema.to_json())?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Coerce every document from `reader`, one result line per document
pub fn coerce<R: BufRead, W: Write>(
    schema_path: &Path,
    config: &CoerceConfig,
    reader: R,
    writer: &mut W,
) -> CliResult<()> {
    let schema = Arc::new(load_file(schema_path)?);
    let metrics = Arc::new(CoercionMetrics::new());
    let documents = coerce_stream(&schema, config, &metrics, reader, writer)?;

    tracing::info!(
        documents = documents,
        metrics = %metrics.snapshot().to_json(),
        "coercion finished"
    );
    Ok(())
}

/// Coerces a stream of documents and returns how many were read.
pub fn coerce_stream<R: BufRead, W: Write>(
    schema: &Arc<Schema>,
    config: &CoerceConfig,
    metrics: &Arc<CoercionMetrics>,
    reader: R,
    writer: &mut W,
) -> CliResult<usize> {
    let base = config.to_options().with_metrics(Arc::clone(metrics));
    // arrays are coerced as lists of records shaped by the schema
    let element = FieldSpec::object(schema.as_ref().clone());

    let mut count = 0;
    for (line, request) in read_requests(reader).enumerate() {
        count += 1;
        let document = match request {
            Ok(document) => document,
            Err(e) => {
                write_error(writer, e.code_str(), e.message())?;
                continue;
            }
        };

        let log = Arc::new(RejectionLog::new());
        let options = if config.report_invalid {
            base.clone().with_observer(log.clone())
        } else {
            base.clone()
        };

        match coerce_document(document, schema, &element, options) {
            Ok(data) => {
                let rejected: Vec<InvalidAssignment> = log.drain();
                tracing::debug!(
                    event = Event::DocumentCoerced.as_str(),
                    line = line + 1,
                    rejected = rejected.len()
                );
                let rejected = config.report_invalid.then_some(rejected.as_slice());
                write_response(writer, data.to_json(), rejected)?;
            }
            Err(e) => write_error(writer, e.code_str(), e.message())?,
        }
    }

    Ok(count)
}

/// Coerces one document: objects become records, arrays are coerced element
/// by element.
pub fn coerce_document(
    document: Json,
    schema: &Arc<Schema>,
    element: &FieldSpec,
    options: Options,
) -> CliResult<Value> {
    match Value::from(document) {
        Value::Object(object) => Ok(instrument_object(object, schema, options).to_value()),
        Value::Array(mut items) => {
            coerce_array(&mut items, Some(element), "", &options);
            Ok(Value::Array(items))
        }
        other => Err(CliError::new(
            CliErrorCode::IoError,
            format!("Document must be an object or an array, got {}", other.type_name()),
        )),
    }
}

fn instrument_object(object: Object, schema: &Arc<Schema>, options: Options) -> Record {
    Record::construct(object, Arc::clone(schema), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn schema() -> Arc<Schema> {
        Arc::new(
            crate::schema::load_str(r#"{"name": "string", "age": "number", "tags": ["string"]}"#)
                .unwrap(),
        )
    }

    fn run(input: &str, config: &CoerceConfig) -> Vec<Json> {
        let metrics = Arc::new(CoercionMetrics::new());
        let mut out = Vec::new();
        coerce_stream(&schema(), config, &metrics, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_object_document_coerced() {
        let lines = run(
            "{\"name\": 5, \"age\": \"41\", \"tags\": [1, null], \"extra\": true}\n",
            &CoerceConfig::default(),
        );
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(
            lines[0]["data"],
            json!({"name": "5", "age": 41, "tags": ["1"], "extra": true})
        );
        assert_eq!(lines[0]["rejected"][0]["field"], "tags[1]");
    }

    #[test]
    fn test_rejections_are_per_document() {
        let lines = run(
            "{\"age\": \"old\"}\n{\"age\": 3}\n",
            &CoerceConfig::default(),
        );
        assert_eq!(lines[0]["rejected"].as_array().unwrap().len(), 1);
        assert_eq!(lines[1]["rejected"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_array_document_coerced_as_records() {
        let lines = run("[{\"age\": \"2\"}, \"not a record\"]\n", &CoerceConfig::default());
        let data = lines[0]["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["age"], 2.0);
        assert_eq!(lines[0]["rejected"][0]["field"], "[1]");
    }

    #[test]
    fn test_bad_lines_do_not_stop_the_stream() {
        let lines = run("not json\n42\n{\"name\": \"ok\"}\n", &CoerceConfig::default());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["status"], "error");
        assert_eq!(lines[0]["code"], "SCHEMACAST_CLI_IO_ERROR");
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[2]["data"]["name"], "ok");
    }

    #[test]
    fn test_reporting_disabled() {
        let config = CoerceConfig {
            report_invalid: false,
            ..CoerceConfig::default()
        };
        let lines = run("{\"age\": \"old\"}\n", &config);
        assert!(lines[0].get("rejected").is_none());
        assert_eq!(lines[0]["data"]["age"], 0.0);
    }

    #[test]
    fn test_metrics_cover_the_stream() {
        let metrics = Arc::new(CoercionMetrics::new());
        let mut out = Vec::new();
        let count = coerce_stream(
            &schema(),
            &CoerceConfig::default(),
            &metrics,
            "{\"age\": \"x\"}\n{}\n".as_bytes(),
            &mut out,
        )
        .unwrap();
        assert_eq!(count, 2);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_instrumented, 2);
        assert_eq!(snapshot.existing_values_rejected, 1);
    }

    #[test]
    fn test_normalize_prints_canonical_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("person.json");
        fs::write(&path, r#"{"name": "String", "tags": ["Number"]}"#).unwrap();

        let mut out = Vec::new();
        normalize(&path, &mut out).unwrap();
        let printed: Json = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            printed,
            json!({
                "name": {"type": "string"},
                "tags": {"type": "array", "schema": {"type": "number"}}
            })
        );
    }

    #[test]
    fn test_missing_schema_file() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        let err = normalize(&dir.path().join("absent.json"), &mut out).unwrap_err();
        assert_eq!(err.code_str(), "SCHEMACAST_CLI_SCHEMA_ERROR");
    }
}
