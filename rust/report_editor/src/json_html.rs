//! JSON report → annotated HTML.
//!
//! A report is a JSON object with two parts: a mapping of section titles to
//! bodies, and a table (row label → column label → cell). Each part is found
//! by name (`sections`, `table`) when that key is present, otherwise by
//! position among the remaining properties. Key order is kept as written.

use crate::config::Locale;
use crate::error::{EditorError, Result};
use crate::escape::escape_html;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static HEADER_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ ]{2,}|,|\t+").expect("static header regex"));

const RTL_BLOCK_STYLE: &str = "text-align: right;";
const TABLE_STYLE: &str = "border-collapse: collapse; width: 100%;";
const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 4px 6px;";
const SPACER: &str = "<p><br></p>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportDocument {
    pub sections: Vec<Section>,
    pub table: Option<ReportTable>,
}

/// Splits a run-together header ("A, B, C", "A  B", "A\tB") into column names.
pub fn split_header(combined: &str) -> Vec<String> {
    HEADER_DELIMITER
        .split(combined)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_sections(value: Option<&Value>) -> Vec<Section> {
    let Some(Value::Object(entries)) = value else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|(title, body)| Section {
            title: title.clone(),
            body: value_text(body),
        })
        .collect()
}

fn parse_table(value: Option<&Value>) -> Option<ReportTable> {
    let Some(Value::Object(rows)) = value else {
        return None;
    };
    let mut row_objects: Vec<(&String, &Map<String, Value>)> = Vec::with_capacity(rows.len());
    for (label, row) in rows {
        match row {
            Value::Object(cells) => row_objects.push((label, cells)),
            _ => {
                debug!("table row {label:?} is not an object; table shape not recognized");
                return None;
            }
        }
    }
    let (_, first) = row_objects.first()?;

    let mut headers: Vec<String> = first.keys().cloned().collect();
    let combined_key = if headers.len() == 1 {
        let combined = headers[0].clone();
        let split = split_header(&combined);
        if split.len() != 1 || split[0] != combined {
            headers = split;
            Some(combined)
        } else {
            None
        }
    } else {
        None
    };

    let rows = row_objects
        .into_iter()
        .map(|(label, cells)| {
            // A single trimmed header keeps the whole value; several take it piecewise.
            let split_values = combined_key
                .as_ref()
                .and_then(|key| cells.get(key))
                .map(|combined| match headers.len() {
                    1 => vec![value_text(combined).trim().to_string()],
                    _ => split_header(&value_text(combined)),
                });
            let cells = headers
                .iter()
                .enumerate()
                .map(|(i, header)| match cells.get(header) {
                    Some(v) => value_text(v),
                    None => split_values
                        .as_ref()
                        .and_then(|values| values.get(i).cloned())
                        .unwrap_or_default(),
                })
                .collect();
            TableRow {
                label: label.clone(),
                cells,
            }
        })
        .collect();

    Some(ReportTable { headers, rows })
}

impl ReportDocument {
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(top) = value else {
            return Err(EditorError::UnrecognizedShape(
                "top-level value is not an object".to_string(),
            ));
        };

        // Named parts win; a missing part takes the next unnamed property in order.
        let mut unnamed = top
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "sections" | "table"))
            .map(|(_, value)| value);
        let sections = top.get("sections").or_else(|| unnamed.next());
        let table = top.get("table").or_else(|| unnamed.next());

        let doc = ReportDocument {
            sections: parse_sections(sections),
            table: parse_table(table),
        };
        if doc.is_empty() {
            return Err(EditorError::UnrecognizedShape(
                "neither sections nor a table were found".to_string(),
            ));
        }
        Ok(doc)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.table.is_none()
    }

    pub fn to_html(&self, locale: Locale) -> String {
        let mut out = String::new();
        for section in &self.sections {
            push_section(&mut out, section);
        }
        if let Some(table) = &self.table {
            push_table(&mut out, table, locale);
        }
        out
    }
}

fn push_section(out: &mut String, section: &Section) {
    out.push_str(SPACER);
    out.push_str(&format!(
        "<h2 dir=\"rtl\" style=\"{RTL_BLOCK_STYLE}\">{}</h2>",
        escape_html(&section.title)
    ));
    out.push_str(&format!(
        "<p dir=\"rtl\" style=\"{RTL_BLOCK_STYLE}\">{}</p>",
        escape_html(&section.body)
    ));
}

fn push_cell(out: &mut String, tag: &str, text: &str) {
    out.push_str(&format!(
        "<{tag} style=\"{CELL_STYLE}\">{}</{tag}>",
        escape_html(text)
    ));
}

fn push_table(out: &mut String, table: &ReportTable, locale: Locale) {
    out.push_str(SPACER);
    out.push_str(&format!("<table dir=\"rtl\" style=\"{TABLE_STYLE}\">"));
    out.push_str("<thead><tr>");
    push_cell(out, "th", locale.row_label());
    for header in &table.headers {
        push_cell(out, "th", header);
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        push_cell(out, "td", &row.label);
        for cell in &row.cells {
            push_cell(out, "td", cell);
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

/// Parses and renders a report in one step.
pub fn json_to_html(text: &str, locale: Locale) -> Result<String> {
    Ok(ReportDocument::parse(text)?.to_html(locale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(text: &str) -> ReportTable {
        ReportDocument::parse(text).unwrap().table.unwrap()
    }

    #[test]
    fn sections_render_in_key_order() {
        let html = json_to_html(r#"{"s": {"A": "x", "B": "y"}}"#, Locale::En).unwrap();
        let a = html.find(">A</h2>").unwrap();
        let x = html.find(">x</p>").unwrap();
        let b = html.find(">B</h2>").unwrap();
        let y = html.find(">y</p>").unwrap();
        assert!(a < x && x < b && b < y);
        assert_eq!(html.matches("<p><br></p>").count(), 2);
        assert_eq!(html.matches("dir=\"rtl\"").count(), 4);
    }

    #[test]
    fn key_order_is_not_alphabetical() {
        let html = json_to_html(r#"{"s": {"Zeta": "1", "Alpha": "2"}}"#, Locale::En).unwrap();
        assert!(html.find("Zeta").unwrap() < html.find("Alpha").unwrap());
    }

    #[test]
    fn table_fills_missing_cells() {
        let table = table_of(
            r#"{"sections": {}, "table": {"r1": {"c1": "1", "c2": "2"}, "r2": {"c1": "3"}}}"#,
        );
        assert_eq!(table.headers, vec!["c1", "c2"]);
        assert_eq!(table.rows[0].label, "r1");
        assert_eq!(table.rows[0].cells, vec!["1", "2"]);
        assert_eq!(table.rows[1].label, "r2");
        assert_eq!(table.rows[1].cells, vec!["3", ""]);
    }

    #[test]
    fn table_html_has_row_header_first() {
        let html = json_to_html(
            r#"{"sections": {}, "table": {"r1": {"c1": "1", "c2": "2"}, "r2": {"c1": "3"}}}"#,
            Locale::En,
        )
        .unwrap();
        let row = html.find(">row</th>").unwrap();
        let c1 = html.find(">c1</th>").unwrap();
        let c2 = html.find(">c2</th>").unwrap();
        assert!(row < c1 && c1 < c2);
        assert!(html.contains("<table dir=\"rtl\""));
        assert!(html.contains(&format!("<td style=\"{CELL_STYLE}\"></td></tr>")));
    }

    #[test]
    fn extra_cells_are_dropped() {
        let table = table_of(r#"{"a": {}, "b": {"r1": {"c1": "1"}, "r2": {"c1": "2", "c9": "9"}}}"#);
        assert_eq!(table.headers, vec!["c1"]);
        assert_eq!(table.rows[1].cells, vec!["2"]);
    }

    #[test]
    fn single_header_is_resplit() {
        assert_eq!(split_header("A, B, C"), vec!["A", "B", "C"]);
        assert_eq!(split_header("A  B\t\tC"), vec!["A", "B", "C"]);
        assert_eq!(split_header("First name"), vec!["First name"]);
        assert_eq!(split_header(" , ,"), Vec::<String>::new());

        let table = table_of(r#"{"a": {}, "b": {"r1": {"A, B, C": "1, 2, 3"}}}"#);
        assert_eq!(table.headers, vec!["A", "B", "C"]);
        assert_eq!(table.rows[0].cells, vec!["1", "2", "3"]);
    }

    #[test]
    fn table_without_sections_still_renders() {
        let doc = ReportDocument::parse(r#"{"table": {"r1": {"c1": 5, "c2": null}}}"#).unwrap();
        assert!(doc.sections.is_empty());
        assert_eq!(doc.table.unwrap().rows[0].cells, vec!["5", ""]);
    }

    #[test]
    fn second_value_of_scalars_is_not_a_table() {
        let doc = ReportDocument::parse(r#"{"a": {"T": "body"}, "b": {"r1": "x"}}"#).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.table.is_none());
    }

    #[test]
    fn flat_object_is_unrecognized() {
        let err = ReportDocument::parse(r#"{"a": 1, "b": "two"}"#).unwrap_err();
        assert!(matches!(err, EditorError::UnrecognizedShape(_)));
        let err = ReportDocument::parse("[1, 2]").unwrap_err();
        assert!(matches!(err, EditorError::UnrecognizedShape(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = json_to_html("{not valid", Locale::En).unwrap_err();
        assert!(matches!(err, EditorError::Json(_)));
    }

    #[test]
    fn titles_and_cells_are_escaped() {
        let html = json_to_html(r#"{"s": {"<b>": "a & b"}}"#, Locale::En).unwrap();
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn default_locale_row_label() {
        let html = json_to_html(r#"{"table": {"r": {"c": "1"}}}"#, Locale::Fa).unwrap();
        assert!(html.contains(">ردیف</th>"));
    }

    #[test]
    fn unnamed_first_property_supplies_sections_beside_named_table() {
        let html = json_to_html(
            r#"{"intro": {"A": "x", "B": "y"}, "table": {"r1": {"c1": "1"}}}"#,
            Locale::En,
        )
        .unwrap();
        let a = html.find(">A</h2>").unwrap();
        let b = html.find(">B</h2>").unwrap();
        let table = html.find("<table").unwrap();
        assert!(a < b && b < table);
        assert!(html.contains(">c1</th>"));
    }

    #[test]
    fn named_sections_with_unnamed_table() {
        let doc = ReportDocument::parse(r#"{"sections": {"T": "b"}, "rows": {"r1": {"c1": "1"}}}"#)
            .unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.table.unwrap().headers, vec!["c1"]);
    }

    #[test]
    fn single_header_is_always_taken_from_the_split() {
        let table = table_of(r#"{"a": {}, "b": {"r1": {"  A  ": " 1 "}}}"#);
        assert_eq!(table.headers, vec!["A"]);
        assert_eq!(table.rows[0].cells, vec!["1"]);

        let table = table_of(r#"{"a": {}, "b": {"r1": {" , ": "x"}}}"#);
        assert!(table.headers.is_empty());
        assert!(table.rows[0].cells.is_empty());

        let table = table_of(r#"{"a": {}, "b": {"r1": {"Total": "1, 2"}}}"#);
        assert_eq!(table.headers, vec!["Total"]);
        assert_eq!(table.rows[0].cells, vec!["1, 2"]);
    }
}
