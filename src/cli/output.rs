//! Output formatting for CLI commands

use crate::client::{ImportResponseDescriptor, ResponseBody};
use crate::validation::ValidationOutcome;
use anyhow::{Context, Result};
use serde::Serialize;

/// Print data as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Print a response descriptor: status line, then the body
pub fn print_descriptor(descriptor: &ImportResponseDescriptor) -> Result<()> {
    match descriptor {
        ImportResponseDescriptor::Received(response) => {
            println!("HTTP {} ({} ms)", response.status, response.elapsed.as_millis());
            match &response.body {
                ResponseBody::Json(value) => print_json(value)?,
                other => println!("{}", other),
            }
        }
        ImportResponseDescriptor::TransportFailure(failure) => {
            println!("transport failure: {}", failure);
        }
    }
    Ok(())
}

/// Print a validation outcome and, when present, the persisted row
pub fn print_outcome(outcome: &ValidationOutcome) -> Result<()> {
    println!("{}", outcome);
    if let Some(record) = outcome.record() {
        let row: serde_json::Map<String, serde_json::Value> = record
            .row
            .columns()
            .map(|(name, value)| (name.to_string(), serde_json::to_value(value).unwrap_or_default()))
            .collect();
        print_json(&row)?;
    }
    Ok(())
}
