use crate::domain::models::Client;
use crate::domain::response::SurveyResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fixed column orders. Only surface-exposed fields are exported.
pub const RESPONSE_COLUMNS: [&str; 4] = ["survey_title", "respondent_name", "status", "date"];
pub const CLIENT_COLUMNS: [&str; 6] = ["name", "company", "email", "survey_count", "rating", "status"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Excel => "application/vnd.ms-excel",
            // print-to-PDF flow: the payload is the text the client prints
            ExportFormat::Pdf => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xls",
            ExportFormat::Pdf => "txt",
        }
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "excel" | "xls" | "xlsx" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(()),
        }
    }
}

/// Rendered payload ready to hand to the HTTP layer.
#[derive(Clone, Debug)]
pub struct ExportDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ResponseRow {
    pub survey_title: String,
    pub respondent_name: String,
    pub status: String,
    pub date: String,
}

impl ResponseRow {
    pub fn from_response(response: &SurveyResponse, survey_title: &str) -> Self {
        let date = response.completed_at.unwrap_or(response.started_at);
        ResponseRow {
            survey_title: survey_title.to_string(),
            respondent_name: response.respondent.display_name(),
            status: response.status.as_str().to_string(),
            date: format_timestamp(date),
        }
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.survey_title.clone(),
            self.respondent_name.clone(),
            self.status.clone(),
            self.date.clone(),
        ]
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ClientRow {
    pub name: String,
    pub company: String,
    pub email: String,
    pub survey_count: String,
    pub rating: String,
    pub status: String,
}

impl From<&Client> for ClientRow {
    fn from(client: &Client) -> Self {
        ClientRow {
            name: client.name.clone(),
            company: client.company.clone(),
            email: client.email.clone(),
            survey_count: client.surveys_count.to_string(),
            rating: format!("{:.1}", client.rating),
            status: client.status.as_str().to_string(),
        }
    }
}

impl ClientRow {
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.company.clone(),
            self.email.clone(),
            self.survey_count.clone(),
            self.rating.clone(),
            self.status.clone(),
        ]
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Timestamp lives in the filename only; payloads stay byte-identical for
/// identical input.
pub fn export_filename(prefix: &str, format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "{prefix}_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub fn export_responses(rows: &[ResponseRow], format: ExportFormat) -> ExportDocument {
    match format {
        ExportFormat::Json => json_document(rows),
        _ => {
            let cells: Vec<Vec<String>> = rows.iter().map(ResponseRow::cells).collect();
            tabular_document("Survey responses", &RESPONSE_COLUMNS, &cells, format)
        }
    }
}

pub fn export_clients(rows: &[ClientRow], format: ExportFormat) -> ExportDocument {
    match format {
        ExportFormat::Json => json_document(rows),
        _ => {
            let cells: Vec<Vec<String>> = rows.iter().map(ClientRow::cells).collect();
            tabular_document("Clients", &CLIENT_COLUMNS, &cells, format)
        }
    }
}

fn json_document<T: Serialize>(rows: &[T]) -> ExportDocument {
    // serde keeps struct field order, so the column order is stable
    let bytes = serde_json::to_vec_pretty(rows).unwrap_or_else(|_| b"[]".to_vec());
    ExportDocument {
        bytes,
        content_type: ExportFormat::Json.content_type(),
        extension: ExportFormat::Json.extension(),
    }
}

fn tabular_document(
    title: &str,
    columns: &[&str],
    rows: &[Vec<String>],
    format: ExportFormat,
) -> ExportDocument {
    let bytes = match format {
        ExportFormat::Csv => csv_bytes(columns, rows),
        ExportFormat::Excel => {
            // UTF-8 BOM so spreadsheet imports keep non-ASCII text intact
            let mut bytes = vec![0xEF, 0xBB, 0xBF];
            bytes.extend(csv_bytes(columns, rows));
            bytes
        }
        ExportFormat::Pdf => print_report(title, columns, rows).into_bytes(),
        ExportFormat::Json => unreachable!("json handled by json_document"),
    };

    ExportDocument {
        bytes,
        content_type: format.content_type(),
        extension: format.extension(),
    }
}

/// Every field is double-quote-wrapped; embedded quotes are doubled.
fn csv_bytes(columns: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&csv_line(columns.iter().map(|c| c.to_string())));
    for row in rows {
        out.push_str(&csv_line(row.iter().cloned()));
    }
    out.into_bytes()
}

fn csv_line(cells: impl Iterator<Item = String>) -> String {
    let quoted: Vec<String> = cells
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect();
    format!("{}\n", quoted.join(","))
}

/// Fixed-width text table for the print-to-PDF flow.
fn print_report(title: &str, columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push('\n');
    out.push_str(&print_row(
        &columns.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        &widths,
    ));
    out.push_str(&print_row(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
        &widths,
    ));
    for row in rows {
        out.push_str(&print_row(row, &widths));
    }
    out.push_str(&format!("\n{} record(s)\n", rows.len()));
    out
}

fn print_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<w$}", w = *width))
        .collect();
    format!("{}\n", padded.join("  "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<ClientRow> {
        vec![
            ClientRow {
                name: "Acme \"North\"".to_string(),
                company: "Acme Holding, LLC".to_string(),
                email: "ops@acme.ua".to_string(),
                survey_count: "4".to_string(),
                rating: "4.5".to_string(),
                status: "active".to_string(),
            },
            ClientRow {
                name: "Globex".to_string(),
                company: "Globex".to_string(),
                email: "hello@globex.com".to_string(),
                survey_count: "1".to_string(),
                rating: "3.0".to_string(),
                status: "inactive".to_string(),
            },
        ]
    }

    /// Minimal CSV reader for the round-trip check: all fields are quoted,
    /// embedded quotes are doubled.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut records = Vec::new();
        for line in text.lines() {
            let mut fields = Vec::new();
            let mut current = String::new();
            let mut in_quotes = false;
            let mut chars = line.chars().peekable();
            while let Some(c) = chars.next() {
                match c {
                    '"' if in_quotes && chars.peek() == Some(&'"') => {
                        current.push('"');
                        chars.next();
                    }
                    '"' => in_quotes = !in_quotes,
                    ',' if !in_quotes => {
                        fields.push(std::mem::take(&mut current));
                    }
                    _ => current.push(c),
                }
            }
            fields.push(current);
            records.push(fields);
        }
        records
    }

    #[test]
    fn test_csv_round_trip() {
        let doc = export_clients(&rows(), ExportFormat::Csv);
        let text = String::from_utf8(doc.bytes).unwrap();
        let records = parse_csv(&text);

        assert_eq!(records.len(), 3); // header + 2 rows
        assert_eq!(records[0], CLIENT_COLUMNS.to_vec());
        assert_eq!(records[1][0], "Acme \"North\"");
        assert_eq!(records[1][1], "Acme Holding, LLC");
        assert_eq!(records[2][4], "3.0");
    }

    #[test]
    fn test_csv_fields_are_quoted() {
        let doc = export_clients(&rows(), ExportFormat::Csv);
        let text = String::from_utf8(doc.bytes).unwrap();
        let first_line = text.lines().next().unwrap();
        assert!(first_line.starts_with('"') && first_line.ends_with('"'));
        // comma inside a field must not split the record
        assert!(text.contains("\"Acme Holding, LLC\""));
    }

    #[test]
    fn test_export_is_deterministic() {
        let a = export_clients(&rows(), ExportFormat::Csv);
        let b = export_clients(&rows(), ExportFormat::Csv);
        assert_eq!(a.bytes, b.bytes);

        let a = export_clients(&rows(), ExportFormat::Json);
        let b = export_clients(&rows(), ExportFormat::Json);
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn test_excel_is_csv_with_bom() {
        let excel = export_clients(&rows(), ExportFormat::Excel);
        let csv = export_clients(&rows(), ExportFormat::Csv);
        assert_eq!(&excel.bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&excel.bytes[3..], &csv.bytes[..]);
    }

    #[test]
    fn test_print_report_layout() {
        let doc = export_clients(&rows(), ExportFormat::Pdf);
        let text = String::from_utf8(doc.bytes).unwrap();
        assert!(text.starts_with("Clients\n=======\n"));
        assert!(text.contains("2 record(s)"));
        // header row lists every column
        for column in CLIENT_COLUMNS {
            assert!(text.contains(column));
        }
    }

    #[test]
    fn test_json_keeps_column_order() {
        let doc = export_clients(&rows(), ExportFormat::Json);
        let text = String::from_utf8(doc.bytes).unwrap();
        let name_at = text.find("\"name\"").unwrap();
        let company_at = text.find("\"company\"").unwrap();
        let status_at = text.find("\"status\"").unwrap();
        assert!(name_at < company_at && company_at < status_at);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::try_from("CSV"), Ok(ExportFormat::Csv));
        assert_eq!(ExportFormat::try_from("xlsx"), Ok(ExportFormat::Excel));
        assert_eq!(ExportFormat::try_from("pdf"), Ok(ExportFormat::Pdf));
        assert!(ExportFormat::try_from("docx").is_err());
    }

    #[test]
    fn test_filename_carries_timestamp_not_payload() {
        let now = "2026-08-08T10:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            export_filename("clients", ExportFormat::Csv, now),
            "clients_20260808_103000.csv"
        );
    }
}
