use std::path::PathBuf;

use ravel_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const FILE_NAME: &str = "agent_chart.svg";

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 48.0;

#[derive(Deserialize, JsonSchema)]
pub struct ChartToolParameters {
    #[schemars(description = "Chart title.")]
    title: String,
    #[schemars(description = "One label per bar.")]
    labels: Vec<String>,
    #[schemars(description = "Bar values, in the same order as the labels.")]
    values: Vec<f64>,
}

/// A tool that renders numeric data as an SVG bar chart.
///
/// The chart is always written to `agent_chart.svg` in the configured
/// output directory.
pub struct ChartTool {
    out_path: PathBuf,
    parameter_schema: Value,
}

impl ChartTool {
    /// Creates a chart tool writing into `out_dir`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        ChartTool {
            out_path: out_dir.into().join(FILE_NAME),
            parameter_schema: schema_for!(ChartToolParameters).to_value(),
        }
    }
}

impl Tool for ChartTool {
    type Input = ChartToolParameters;

    fn name(&self) -> &str {
        "make_chart"
    }

    fn description(&self) -> &str {
        "\
Renders data as a bar chart image. Pass a title, one label per bar \
and the matching numeric values."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: ChartToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let out_path = self.out_path.clone();
        async move {
            if input.labels.is_empty() {
                return Err(ToolError::invalid_input()
                    .with_reason("at least one bar is required"));
            }
            if input.labels.len() != input.values.len() {
                return Err(ToolError::invalid_input().with_reason(format!(
                    "{} labels but {} values",
                    input.labels.len(),
                    input.values.len()
                )));
            }

            let svg = render_svg(&input.title, &input.labels, &input.values);
            tokio::fs::write(&out_path, svg).await.map_err(|err| {
                ToolError::execution_error().with_reason(format!("{err}"))
            })?;
            Ok(format!(
                "Wrote a bar chart with {} bars to {}",
                input.labels.len(),
                out_path.display()
            ))
        }
    }
}

fn render_svg(title: &str, labels: &[String], values: &[f64]) -> String {
    let plot_width = WIDTH - 2.0 * MARGIN;
    let plot_height = HEIGHT - 2.0 * MARGIN;
    let baseline = HEIGHT - MARGIN;
    let max_value = values.iter().cloned().fold(0.0f64, f64::max).max(1e-9);
    let slot = plot_width / labels.len() as f64;
    let bar_width = slot * 0.8;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    svg.push_str(&format!(
        r#"<text x="{}" y="24" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    ));
    svg.push_str(&format!(
        r#"<line x1="{MARGIN}" y1="{baseline}" x2="{}" y2="{baseline}" stroke="black"/>"#,
        WIDTH - MARGIN
    ));

    for (idx, (label, value)) in labels.iter().zip(values).enumerate() {
        let height = (value.max(0.0) / max_value) * plot_height;
        let x = MARGIN + idx as f64 * slot + (slot - bar_width) / 2.0;
        let y = baseline - height;
        svg.push_str(&format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{height:.1}" fill="steelblue"/>"#
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
            x + bar_width / 2.0,
            baseline + 16.0,
            escape(label)
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_one_rect_per_bar() {
        let svg = render_svg(
            "GDP",
            &["US".to_owned(), "DE".to_owned(), "JP".to_owned()],
            &[27.0, 4.5, 4.2],
        );
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains(">GDP</text>"));
        assert!(svg.contains(">US</text>"));
    }

    #[test]
    fn test_labels_are_escaped() {
        let svg =
            render_svg("a < b & c", &["<x>".to_owned()], &[1.0]);
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("&lt;x&gt;"));
        assert!(!svg.contains("<x>"));
    }

    #[tokio::test]
    async fn test_chart_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ChartTool::new(dir.path());
        let result = tool
            .execute(ChartToolParameters {
                title: "GDP".to_owned(),
                labels: vec!["US".to_owned()],
                values: vec![27.0],
            })
            .await
            .unwrap();
        assert!(result.contains("1 bars"));
        let svg =
            std::fs::read_to_string(dir.path().join(FILE_NAME)).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[tokio::test]
    async fn test_mismatched_lengths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ChartTool::new(dir.path());
        let result = tool
            .execute(ChartToolParameters {
                title: "bad".to_owned(),
                labels: vec!["a".to_owned()],
                values: vec![1.0, 2.0],
            })
            .await;
        assert!(result.is_err());
    }
}
