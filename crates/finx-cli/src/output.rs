use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    for warning in &result.warnings {
        tracing::warn!("{warning}");
    }

    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&result.data)?
            } else {
                serde_json::to_string(&result.data)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(&result.data)),
    }

    Ok(())
}

/// Arrays of objects become aligned columns; anything else is printed as
/// `key: value` lines.
fn render_table(data: &Value) -> String {
    match data {
        Value::Array(rows) if rows.iter().all(Value::is_object) => render_rows(rows),
        Value::Object(fields) => {
            let width = fields.keys().map(String::len).max().unwrap_or(0);
            let mut out = String::new();
            for (key, value) in fields {
                match value {
                    Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_object) => {
                        out.push_str(&format!("{key}:\n"));
                        out.push_str(&render_rows(rows));
                    }
                    other => out.push_str(&format!("{key:<width$}: {}\n", cell(other))),
                }
            }
            out
        }
        other => format!("{}\n", cell(other)),
    }
}

fn render_rows(rows: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        if let Value::Object(fields) = row {
            for key in fields.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| row[index].len())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, columns.iter().map(|column| column.to_string()), &widths);
    for row in cells {
        push_line(&mut out, row.into_iter(), &widths);
    }
    out
}

fn push_line(out: &mut String, values: impl Iterator<Item = String>, widths: &[usize]) {
    let line = values
        .zip(widths.iter().copied())
        .map(|(value, width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
