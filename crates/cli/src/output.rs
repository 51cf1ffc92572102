use std::collections::BTreeSet;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Print `value` in the selected format. Table mode needs a shape it can
    /// lay out (a list of objects, or one object); anything else falls back
    /// to pretty JSON.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&value)?),
            OutputFormat::Table => match table_of(&value) {
                Some(table) => println!("{table}"),
                None => println!("{}", serde_json::to_string_pretty(&value)?),
            },
        }

        Ok(())
    }
}

/// A list of objects becomes a column-per-key table (keys unioned across
/// rows), a single object becomes a field/value listing.
fn table_of(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let rows: Vec<&Map<String, Value>> =
                items.iter().filter_map(Value::as_object).collect();
            if rows.is_empty() {
                return None;
            }

            let mut columns: BTreeSet<&String> = BTreeSet::new();
            for row in &rows {
                columns.extend(row.keys());
            }

            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|c| c.as_str()));
            for row in &rows {
                builder.push_record(
                    columns
                        .iter()
                        .map(|c| row.get(*c).map(cell).unwrap_or_default()),
                );
            }
            Some(builder.build().with(Style::rounded()).to_string())
        }
        Value::Object(fields) => {
            let mut builder = Builder::default();
            builder.push_record(["field", "value"]);
            for (name, val) in fields {
                builder.push_record([name.clone(), cell(val)]);
            }
            Some(builder.build().with(Style::rounded()).to_string())
        }
        _ => None,
    }
}

/// One table cell. Lists flatten to comma-separated entries so parameter and
/// cause collections stay readable in a fixed-width column.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_renderer_reports_format() {
        assert_eq!(
            OutputRenderer::new(OutputFormat::Yaml).format(),
            OutputFormat::Yaml
        );
    }

    #[test]
    fn test_table_of_rows() {
        let value = json!([
            {"name": "backend-deploy", "status": "success"},
            {"name": "nightly-tests", "status": "failed"}
        ]);

        let table = table_of(&value).unwrap();
        assert!(table.contains("name"));
        assert!(table.contains("status"));
        assert!(table.contains("backend-deploy"));
        assert!(table.contains("failed"));
    }

    #[test]
    fn test_table_of_unions_columns() {
        let value = json!([
            {"name": "backend-deploy", "status": "success"},
            {"name": "nightly-tests", "queue_id": 117}
        ]);

        let table = table_of(&value).unwrap();
        assert!(table.contains("status"));
        assert!(table.contains("queue_id"));
        assert!(table.contains("117"));
    }

    #[test]
    fn test_table_of_single_object() {
        let value = json!({"number": 42, "result": "SUCCESS"});

        let table = table_of(&value).unwrap();
        assert!(table.contains("field"));
        assert!(table.contains("number"));
        assert!(table.contains("SUCCESS"));
    }

    #[test]
    fn test_table_of_rejects_unshapeable_values() {
        assert!(table_of(&json!([])).is_none());
        assert!(table_of(&json!(["one", "two"])).is_none());
        assert!(table_of(&json!("plain")).is_none());
        assert!(table_of(&json!(null)).is_none());
    }

    #[test]
    fn test_cell_scalars() {
        assert_eq!(cell(&json!("staging")), "staging");
        assert_eq!(cell(&json!(42)), "42");
        assert_eq!(cell(&json!(true)), "true");
        assert_eq!(cell(&json!(null)), "");
    }

    #[test]
    fn test_cell_flattens_lists() {
        let value = json!(["TARGET_ENV=staging", "DRY_RUN=false"]);
        assert_eq!(cell(&value), "TARGET_ENV=staging, DRY_RUN=false");
    }

    #[derive(Serialize)]
    struct SampleRow {
        name: String,
        count: i32,
    }

    #[test]
    fn test_render_each_format() {
        let rows = vec![
            SampleRow {
                name: "backend-deploy".to_string(),
                count: 10,
            },
            SampleRow {
                name: "nightly-tests".to_string(),
                count: 3,
            },
        ];

        for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Yaml] {
            assert!(OutputRenderer::new(format).render(&rows).is_ok());
        }
    }
}
