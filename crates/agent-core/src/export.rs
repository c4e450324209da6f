//! Writes extracted payloads to the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};
use surfpilot_core_types::OutputFormat;
use tracing::info;

use crate::errors::AgentError;

const DEFAULT_TITLE: &str = "extracted_data";
const MAX_SLUG_CHARS: usize = 60;

/// Lowercase, `_`-separated file stem for an output title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;
    for ch in title.chars() {
        if !ch.is_alphanumeric() {
            pending_separator = true;
            continue;
        }
        let separator = pending_separator && !slug.is_empty();
        if slug.chars().count() + usize::from(separator) + 1 > MAX_SLUG_CHARS {
            break;
        }
        if separator {
            slug.push('_');
        }
        pending_separator = false;
        slug.extend(ch.to_lowercase());
    }
    if slug.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        slug
    }
}

#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `data` as `<slug>_<timestamp>.<ext>` and return the path.
    pub fn export(
        &self,
        data: &Value,
        format: OutputFormat,
        title: Option<&str>,
    ) -> Result<PathBuf, AgentError> {
        fs::create_dir_all(&self.output_dir)?;
        let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TITLE);
        let path = self.unique_path(&slugify(title), format.extension());

        let body = match format {
            OutputFormat::Json => {
                let document = json!({
                    "title": title,
                    "exported_at": Utc::now().to_rfc3339(),
                    "count": item_count(data),
                    "data": data,
                });
                serde_json::to_string_pretty(&document)?.into_bytes()
            }
            OutputFormat::Markdown => render_markdown(title, data).into_bytes(),
            OutputFormat::Csv => render_csv(data)?,
        };
        fs::write(&path, body)?;
        info!(path = %path.display(), format = ?format, "Exported extracted data");
        Ok(path)
    }

    fn unique_path(&self, slug: &str, extension: &str) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let base = format!("{slug}_{stamp}");
        let mut candidate = self.output_dir.join(format!("{base}.{extension}"));
        let mut n = 2;
        while candidate.exists() {
            candidate = self.output_dir.join(format!("{base}_{n}.{extension}"));
            n += 1;
        }
        candidate
    }
}

fn item_count(data: &Value) -> usize {
    match data {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::Null => 0,
        _ => 1,
    }
}

/// Markdown rendering: arrays of objects become tables, other arrays bullet lists,
/// objects key/value lists.
pub fn render_markdown(title: &str, data: &Value) -> String {
    let mut out = format!("# {title}\n\n_Exported {}_\n\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    match data {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            out.push_str(&markdown_table(items));
        }
        Value::Array(items) => {
            for item in items {
                out.push_str(&format!("- {}\n", inline(item)));
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                out.push_str(&format!("- **{key}**: {}\n", inline(value)));
            }
        }
        other => {
            out.push_str(&inline(other));
            out.push('\n');
        }
    }
    out
}

/// CSV rendering with a header row. Object keys become columns in first-seen order;
/// anything that is not an object lands in a single `value` column.
pub fn render_csv(data: &Value) -> Result<Vec<u8>, AgentError> {
    let rows: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    };
    let objects: Vec<&Value> = rows.iter().copied().filter(|row| row.is_object()).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    if !objects.is_empty() && objects.len() == rows.len() {
        let columns = union_columns(&objects);
        writer.write_record(&columns)?;
        for row in &objects {
            writer.write_record(columns.iter().map(|column| csv_cell(row.get(*column))))?;
        }
    } else {
        writer.write_record(["value"])?;
        for row in &rows {
            writer.write_record([csv_cell(Some(*row))])?;
        }
    }
    writer.into_inner().map_err(|err| AgentError::Io(err.into_error()))
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn union_columns<'a>(rows: &[&'a Value]) -> Vec<&'a str> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        if let Some(map) = row.as_object() {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }
    columns
}

fn markdown_table(rows: &[Value]) -> String {
    let columns = union_columns(&rows.iter().collect::<Vec<_>>());

    let mut table = format!("| {} |\n", columns.join(" | "));
    table.push_str(&format!("|{}\n", " --- |".repeat(columns.len())));
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| row.get(*column).map(inline).unwrap_or_default().replace('|', "\\|"))
            .collect();
        table.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    table
}

fn inline(value: &Value) -> String {
    match value {
        Value::String(text) => text.replace('\n', " "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Top 10: Rust Jobs (Remote)!"), "top_10_rust_jobs_remote");
        assert_eq!(slugify("  ***  "), "extracted_data");
        assert!(slugify(&"word ".repeat(40)).chars().count() <= MAX_SLUG_CHARS);
    }

    #[test]
    fn markdown_tables_union_columns() {
        let data = json!([
            {"company": "Acme", "title": "Rust Engineer"},
            {"location": "Remote", "title": "SRE | Infra"}
        ]);
        let md = render_markdown("Jobs", &data);
        assert!(md.starts_with("# Jobs\n"));
        assert!(md.contains("| company | title | location |"));
        assert!(md.contains("| --- | --- | --- |"));
        assert!(md.contains("|  | SRE \\| Infra | Remote |"));
    }

    #[test]
    fn markdown_lists_scalars_and_objects() {
        let list = render_markdown("Names", &json!(["a", 2]));
        assert!(list.contains("- a\n- 2\n"));
        let object = render_markdown("Profile", &json!({"name": "Ada"}));
        assert!(object.contains("- **name**: Ada"));
    }

    #[test]
    fn export_writes_json_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path().join("output"));
        let data = json!([{"price": 10}, {"price": 12}]);

        let first = exporter.export(&data, OutputFormat::Json, Some("Prices")).expect("export");
        let second = exporter.export(&data, OutputFormat::Json, Some("Prices")).expect("export");
        assert_ne!(first, second);

        let name = first.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("prices_") && name.ends_with(".json"), "{name}");

        let written: Value = serde_json::from_str(&fs::read_to_string(&first).expect("read")).expect("json");
        assert_eq!(written["count"], 2);
        assert_eq!(written["data"], data);
    }

    #[test]
    fn export_writes_markdown_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Exporter::new(dir.path())
            .export(&json!({"k": "v"}), OutputFormat::Markdown, None)
            .expect("export");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("md"));
        assert!(fs::read_to_string(path).expect("read").starts_with("# extracted_data"));
    }

    #[test]
    fn csv_rows_share_one_header_and_quote_awkward_cells() {
        let data = json!([
            {"title": "Rust Engineer", "company": "Acme, Inc."},
            {"title": "SRE", "tags": ["infra", "oncall"], "remote": true}
        ]);
        let text = String::from_utf8(render_csv(&data).expect("csv")).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "company,title,remote,tags");
        assert_eq!(lines[1], "\"Acme, Inc.\",Rust Engineer,,");
        assert_eq!(lines[2], ",SRE,true,\"[\"\"infra\"\",\"\"oncall\"\"]\"");
    }

    #[test]
    fn csv_of_scalars_uses_a_value_column() {
        let text = String::from_utf8(render_csv(&json!(["a", 2])).expect("csv")).expect("utf8");
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["value", "a", "2"]);
        let single = String::from_utf8(render_csv(&json!({"name": "Ada"})).expect("csv")).expect("utf8");
        assert_eq!(single.lines().collect::<Vec<_>>(), vec!["name", "Ada"]);
    }

    #[test]
    fn export_writes_csv_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Exporter::new(dir.path())
            .export(&json!([{"price": 10}]), OutputFormat::Csv, Some("Prices"))
            .expect("export");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
        let written = fs::read_to_string(path).expect("read");
        assert_eq!(written.lines().collect::<Vec<_>>(), vec!["price", "10"]);
    }
}
