// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fs, path::Path};

use async_trait::async_trait;
use inflector::Inflector as _;
use log::info;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use egov_portal::{Portal, Result};

pub(crate) mod account;
pub(crate) mod doctors;
pub(crate) mod property;
pub(crate) mod registrations;

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, portal: &Portal) -> Result<()>;
}

fn cell(value: &Value) -> String {
    match *value {
        Value::Null => String::new(),
        Value::String(ref s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Prints a list of records as a table and anything else as JSON.
pub(crate) fn print_json(value: &Value) -> Result<()> {
    let rows = value.as_array().filter(|rows| !rows.is_empty() && rows.iter().all(Value::is_object));
    let Some(rows) = rows else {
        println!("{}", serde_json::to_string_pretty(value).map_err(std::io::Error::from)?);
        return Ok(());
    };

    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().filter_map(Value::as_object).flat_map(|row| row.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|column| column.to_title_case()));
    for row in rows {
        builder.push_record(
            columns
                .iter()
                .map(|column| row.get(*column).map(cell).unwrap_or_default()),
        );
    }

    let mut table = builder.build();
    let _ = table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
