//! JSON line I/O for the CLI
//!
//! - Input: one JSON document per line
//! - Output: one JSON object per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use crate::schema::InvalidAssignment;

use super::errors::{CliError, CliResult};

/// Reads JSON documents line by line. Blank lines are skipped; a line that
/// is not valid JSON yields an error for that line only.
pub fn read_requests<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<Value>> {
    reader
        .lines()
        .filter(|line| !matches!(line, Ok(text) if text.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(CliError::from)?;
            serde_json::from_str(&line).map_err(CliError::from)
        })
}

/// Renders a failure for the `rejected` list
pub fn rejection_to_json(failure: &InvalidAssignment) -> Value {
    json!({
        "field": failure.field,
        "value": failure.value.to_json(),
        "expected": failure.expected.to_string(),
        "kind": failure.kind.as_str()
    })
}

/// Write a success line. `rejected` is omitted when reporting is off.
pub fn write_response<W: Write>(
    writer: &mut W,
    data: Value,
    rejected: Option<&[InvalidAssignment]>,
) -> CliResult<()> {
    let mut response = json!({
        "status": "ok",
        "data": data
    });
    if let Some(rejected) = rejected {
        response["rejected"] = Value::Array(rejected.iter().map(rejection_to_json).collect());
    }

    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}

/// Write an error line
pub fn write_error<W: Write>(writer: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = json!({
        "status": "error",
        "code": code,
        "message": message
    });

    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
