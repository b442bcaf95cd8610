//! Document exporters for result tables.

use std::convert::Infallible;

use evt_core::{ExportTable, Exporter};

use crate::cli::ExportFormat;

/// Renders `table` in the chosen format.
pub fn export(format: ExportFormat, table: &ExportTable) -> String {
    let rendered = match format {
        ExportFormat::Text => TextExporter.export(table),
        ExportFormat::Csv => CsvExporter.export(table),
        ExportFormat::Html => HtmlExporter.export(table),
    };
    match rendered {
        Ok(document) => document,
        Err(never) => match never {},
    }
}

/// Column-aligned plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExporter;

impl Exporter for TextExporter {
    type Output = String;
    type Error = Infallible;

    fn export(&self, table: &ExportTable) -> Result<String, Infallible> {
        let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let mut lines = vec![table.title.clone()];
        lines.extend(table.subtitle.clone());
        lines.push(String::new());
        lines.push(line(&table.headers));
        lines.push(rule.join("  "));
        lines.extend(table.rows.iter().map(|row| line(row)));
        Ok(lines.join("\n") + "\n")
    }
}

/// RFC 4180 CSV: header row, then one line per row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

impl Exporter for CsvExporter {
    type Output = String;
    type Error = Infallible;

    fn export(&self, table: &ExportTable) -> Result<String, Infallible> {
        let mut out = String::new();
        for row in std::iter::once(&table.headers).chain(&table.rows) {
            let fields: Vec<String> = row.iter().map(|c| csv_field(c)).collect();
            out.push_str(&fields.join(","));
            out.push_str("\r\n");
        }
        Ok(out)
    }
}

/// A standalone, printable HTML page.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExporter;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const HTML_STYLE: &str = "body { font-family: sans-serif; padding: 20px; }
h1 { text-align: center; }
h2 { text-align: center; font-weight: normal; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #333; padding: 8px; text-align: center; }
th { background-color: #f2f2f2; }";

impl Exporter for HtmlExporter {
    type Output = String;
    type Error = Infallible;

    fn export(&self, table: &ExportTable) -> Result<String, Infallible> {
        let title = escape_html(&table.title);
        let mut lines = vec![
            "<!DOCTYPE html>".to_string(),
            "<html>".to_string(),
            "<head>".to_string(),
            "<meta charset=\"utf-8\">".to_string(),
            format!("<title>{title}</title>"),
            format!("<style>\n{HTML_STYLE}\n</style>"),
            "</head>".to_string(),
            "<body>".to_string(),
            format!("<h1>{title}</h1>"),
        ];
        if let Some(subtitle) = &table.subtitle {
            lines.push(format!("<h2>{}</h2>", escape_html(subtitle)));
        }
        lines.push("<table>".to_string());
        let headers: String = table
            .headers
            .iter()
            .map(|h| format!("<th>{}</th>", escape_html(h)))
            .collect();
        lines.push(format!("<tr>{headers}</tr>"));
        for row in &table.rows {
            let cells: String = row
                .iter()
                .map(|c| format!("<td>{}</td>", escape_html(c)))
                .collect();
            lines.push(format!("<tr>{cells}</tr>"));
        }
        lines.extend(["</table>", "</body>", "</html>"].map(String::from));
        Ok(lines.join("\n") + "\n")
    }
}
