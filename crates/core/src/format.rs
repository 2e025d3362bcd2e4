//! Pure renderers from reports to text.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use structscope_api::{CodeElement, ScaleReport, SectionExtract, StructureReport};
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub const CSV_HEADER: &str =
    "kind,name,container,visibility,modifiers,start_line,start_column,end_line,end_column";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Table,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Table => "table",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "table" | "text" => Ok(OutputFormat::Table),
            other => Err(AnalysisError::InvalidArgument(format!(
                "unknown format '{other}' (expected json, csv or table)"
            ))),
        }
    }
}

#[derive(Tabled)]
struct ElementRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Visibility")]
    visibility: String,
    #[tabled(rename = "Modifiers")]
    modifiers: String,
    #[tabled(rename = "Lines")]
    lines: String,
}

impl ElementRow {
    fn from_element(e: &CodeElement) -> Self {
        Self {
            kind: e.kind.to_string(),
            name: e.name.clone(),
            container: e.container.clone().unwrap_or_default(),
            visibility: e.visibility.to_string(),
            modifiers: e.modifiers.join(" "),
            lines: if e.span.start_line == e.span.end_line {
                e.span.start_line.to_string()
            } else {
                format!("{}-{}", e.span.start_line, e.span.end_line)
            },
        }
    }
}

pub fn render(report: &StructureReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Csv => Ok(to_csv(&report.elements)),
        OutputFormat::Table => {
            let rows: Vec<_> = report.elements.iter().map(ElementRow::from_element).collect();
            let mut out = format!(
                "{} ({}): {} elements\n",
                report.path, report.language, report.element_count
            );
            if !rows.is_empty() {
                out.push_str(&Table::new(rows).with(Style::psql()).to_string());
                out.push('\n');
            }
            Ok(out)
        }
    }
}

pub fn to_csv(elements: &[CodeElement]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for e in elements {
        let fields = [
            e.kind.as_str().to_string(),
            e.name.clone(),
            e.container.clone().unwrap_or_default(),
            e.visibility.as_str().to_string(),
            e.modifiers.join(" "),
            e.span.start_line.to_string(),
            e.span.start_column.to_string(),
            e.span.end_line.to_string(),
            e.span.end_column.to_string(),
        ];
        let row: Vec<_> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quotes a field when it holds a comma, quote or line break, doubling
/// embedded quotes.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(Tabled)]
struct CallableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Lines")]
    lines: usize,
    #[tabled(rename = "Range")]
    range: String,
}

pub fn render_scale(report: &ScaleReport, format: OutputFormat) -> Result<String> {
    if format != OutputFormat::Table {
        return to_json(report);
    }
    let mut out = String::new();
    out.push_str(&format!("File:     {} ({})\n", report.path, report.language));
    out.push_str(&format!("Size:     {} bytes\n", report.bytes));
    out.push_str(&format!(
        "Lines:    {} total, {} code, {} comment, {} blank\n",
        report.total_lines, report.code_lines, report.comment_lines, report.blank_lines
    ));
    if !report.element_counts.is_empty() {
        let counts: Vec<_> = report
            .element_counts
            .iter()
            .map(|(kind, n)| format!("{kind}={n}"))
            .collect();
        out.push_str(&format!("Elements: {}\n", counts.join(", ")));
    }
    if !report.largest_callables.is_empty() {
        let rows: Vec<_> = report
            .largest_callables
            .iter()
            .map(|c| CallableRow {
                name: c.name.clone(),
                kind: c.kind.to_string(),
                lines: c.lines,
                range: format!("{}-{}", c.span.start_line, c.span.end_line),
            })
            .collect();
        out.push_str(&Table::new(rows).with(Style::psql()).to_string());
        out.push('\n');
    }
    out.push_str(&report.guidance);
    out.push('\n');
    Ok(out)
}

pub fn render_section(section: &SectionExtract, format: OutputFormat) -> Result<String> {
    if format != OutputFormat::Table {
        return to_json(section);
    }
    let mut out = format!(
        "{}:{}-{} (of {})\n",
        section.path, section.start_line, section.end_line, section.total_lines
    );
    out.push_str(&section.content);
    if !section.content.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AnalysisError::Internal(format!("serialization failed: {e}")))
}
