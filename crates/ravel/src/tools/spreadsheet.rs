use std::path::PathBuf;

use ravel_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const FILE_NAME: &str = "agent_report.csv";

#[derive(Deserialize, JsonSchema)]
pub struct SpreadsheetToolParameters {
    #[schemars(description = "Column headers, one per column.")]
    headers: Vec<String>,
    #[schemars(description = "Data rows, each with one value per column.")]
    rows: Vec<Vec<String>>,
}

/// A tool that exports tabular data as a CSV spreadsheet.
///
/// The file is always named `agent_report.csv` and lands in the
/// directory the tool was configured with; the headers become the
/// first row.
pub struct SpreadsheetTool {
    out_path: PathBuf,
    parameter_schema: Value,
}

impl SpreadsheetTool {
    /// Creates a spreadsheet tool writing into `out_dir`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        SpreadsheetTool {
            out_path: out_dir.into().join(FILE_NAME),
            parameter_schema: schema_for!(SpreadsheetToolParameters).to_value(),
        }
    }
}

impl Tool for SpreadsheetTool {
    type Input = SpreadsheetToolParameters;

    fn name(&self) -> &str {
        "write_spreadsheet"
    }

    fn description(&self) -> &str {
        "\
Saves tabular data as a CSV spreadsheet. Pass the column headers and \
the data rows; every row must have one value per column."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SpreadsheetToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let out_path = self.out_path.clone();
        async move {
            let columns = input.headers.len();
            if columns == 0 {
                return Err(ToolError::invalid_input()
                    .with_reason("at least one header is required"));
            }
            if let Some(row) =
                input.rows.iter().find(|row| row.len() != columns)
            {
                return Err(ToolError::invalid_input().with_reason(format!(
                    "a row has {} values but there are {columns} headers",
                    row.len()
                )));
            }

            let data =
                encode_csv(&input.headers, &input.rows).map_err(|err| {
                    ToolError::execution_error()
                        .with_reason(format!("{err}"))
                })?;
            tokio::fs::write(&out_path, data).await.map_err(|err| {
                ToolError::execution_error().with_reason(format!("{err}"))
            })?;
            Ok(format!(
                "Wrote {} data rows to {}",
                input.rows.len(),
                out_path.display()
            ))
        }
    }
}

fn encode_csv(
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.into_inner().map_err(|err| err.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        headers: &[&str],
        rows: &[&[&str]],
    ) -> SpreadsheetToolParameters {
        SpreadsheetToolParameters {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_headers_become_the_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SpreadsheetTool::new(dir.path());
        let result = tool
            .execute(params(
                &["country", "gdp"],
                &[&["US", "27000"], &["DE", "4500"]],
            ))
            .await
            .unwrap();
        assert!(result.starts_with("Wrote 2 data rows"));

        let mut reader =
            csv::Reader::from_path(dir.path().join(FILE_NAME)).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["country", "gdp"])
        );
        let rows: Vec<csv::StringRecord> =
            reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "US");
    }

    #[tokio::test]
    async fn test_ragged_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SpreadsheetTool::new(dir.path());
        let result = tool
            .execute(params(&["a", "b"], &[&["only one"]]))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_headers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SpreadsheetTool::new(dir.path());
        assert!(tool.execute(params(&[], &[])).await.is_err());
    }
}
