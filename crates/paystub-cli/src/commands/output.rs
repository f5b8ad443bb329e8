//! Rendering of extracted records to the output file.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use paystub_core::models::paydata::{PayData, TABLE_HEADERS};
use tracing::debug;

/// Output format, picked from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty JSON array of records.
    Json,
    /// HTML table; spreadsheet applications open it as a workbook.
    Html,
    Csv,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "json" => Ok(OutputFormat::Json),
            "xls" | "xlsx" | "html" | "htm" => Ok(OutputFormat::Html),
            "csv" => Ok(OutputFormat::Csv),
            other => anyhow::bail!("Unsupported output format: {:?}", other),
        }
    }
}

/// Bare file names are placed in the input directory.
pub fn resolve_output_path(output: &Path, directory: &Path) -> PathBuf {
    let bare = output
        .parent()
        .map(|parent| parent.as_os_str().is_empty())
        .unwrap_or(true);
    if bare && !output.is_absolute() {
        directory.join(output)
    } else {
        output.to_path_buf()
    }
}

/// Records ordered newest check first; undated records last.
fn by_check_date_desc(records: &[PayData]) -> Vec<&PayData> {
    let mut sorted: Vec<&PayData> = records.iter().collect();
    sorted.sort_by_key(|record| Reverse(record.check_date()));
    sorted
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_html(records: &[PayData]) -> String {
    let mut html = String::from("<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n<table>\n<tr>");
    for header in TABLE_HEADERS {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr>\n");
    for record in by_check_date_desc(records) {
        html.push_str("<tr>");
        for cell in record.table_row() {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

pub fn render_csv(records: &[PayData]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TABLE_HEADERS)?;
    for record in by_check_date_desc(records) {
        wtr.write_record(record.table_row())?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub fn render(records: &[PayData], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Html => Ok(render_html(records)),
        OutputFormat::Csv => render_csv(records),
    }
}

/// Replace `path` with the rendered records, creating its directory.
pub fn write_records(path: &Path, records: &[PayData]) -> anyhow::Result<()> {
    let format = OutputFormat::from_path(path)?;
    let content = render(records, format)?;

    if path.exists() {
        fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    debug!("Wrote {} records to {} as {:?}", records.len(), path.display(), format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: &str, date: &str) -> PayData {
        let mut data = PayData::default();
        data.check.check_number = number.into();
        data.check.check_date = date.into();
        data
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.xls")).unwrap(), OutputFormat::Html);
        assert_eq!(OutputFormat::from_path(Path::new("OUT.JSON")).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("a/b.csv")).unwrap(), OutputFormat::Csv);
        assert!(OutputFormat::from_path(Path::new("out.pdf")).is_err());
    }

    #[test]
    fn test_bare_output_goes_to_directory() {
        let dir = Path::new("input");
        assert_eq!(resolve_output_path(Path::new("out.xls"), dir), PathBuf::from("input/out.xls"));
        assert_eq!(resolve_output_path(Path::new("reports/out.xls"), dir), PathBuf::from("reports/out.xls"));
    }

    #[test]
    fn test_rows_sorted_by_check_date_descending() {
        let records = vec![
            record("1", "January 5, 2024"),
            record("2", "undated"),
            record("3", "March 1, 2024"),
        ];
        let csv = render_csv(&records).unwrap();
        let numbers: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(numbers, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_html_escapes_cells() {
        let html = render_html(&[record("<7>", "July 7, 2024")]);
        assert!(html.contains("<th>Check Number</th>"));
        assert!(html.contains("<td>&lt;7&gt;</td>"));
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn test_write_records_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        write_records(&path, &[record("1", "")]).unwrap();
        write_records(&path, &[record("2", ""), record("3", "")]).unwrap();

        let written: Vec<PayData> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].check.check_number, "2");
    }
}
