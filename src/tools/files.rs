//! Reading local tabular and JSON files back as text.

use crate::error::{ToolError, ToolResult};
use crate::registry::{required_str, Arguments, InputSpec, Tool, ToolSpec};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::NaiveTime;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

pub const NAME: &str = "file_reader";

/// File formats the reader understands, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Excel,
    Json,
}

impl FileKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".csv" => Some(Self::Csv),
            ".xls" | ".xlsx" => Some(Self::Excel),
            ".json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Lower-cased extension including the leading dot, or an empty string.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

pub struct FileReaderTool {
    spec: ToolSpec,
}

impl FileReaderTool {
    pub fn new() -> Self {
        let spec = ToolSpec::new(
            NAME,
            "Reads a local CSV, Excel (.xlsx/.xls), or JSON file and returns its \
             contents as a UTF-8 string.",
        )
        .input(
            "file_path",
            InputSpec::new("string", "Path to the local file to read."),
        );

        Self { spec }
    }
}

impl Default for FileReaderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FileReaderTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, args: &Arguments) -> ToolResult {
        let file_path = required_str(args, "file_path")?.to_string();
        let path = PathBuf::from(&file_path);
        if !path.exists() {
            return Err(ToolError::FileNotFound(file_path));
        }

        let ext = extension_of(&path);
        let kind = FileKind::from_extension(&ext).ok_or(ToolError::UnsupportedFileType(ext))?;

        let display = file_path.clone();
        tokio::task::spawn_blocking(move || read_file(&path, kind))
            .await
            .map_err(|e| e.to_string())
            .and_then(|result| result)
            .map_err(|message| ToolError::Read {
                path: display,
                message,
            })
    }
}

#[instrument(skip(kind))]
fn read_file(path: &Path, kind: FileKind) -> Result<String, String> {
    debug!("Reading {:?} file", kind);
    match kind {
        FileKind::Csv => read_csv(path),
        FileKind::Excel => read_excel(path),
        FileKind::Json => read_json(path),
    }
}

/// Parse and re-emit a CSV file without an index column.
fn read_csv(path: &Path) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut rows = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        writer.write_record(&record).map_err(|e| e.to_string())?;
        rows += 1;
    }

    if rows == 0 {
        return Err("No columns to parse from file".to_string());
    }

    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// First worksheet of a workbook, rendered as CSV.
fn read_excel(path: &Path) -> Result<String, String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "Workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(render_cell).collect();
        writer.write_record(&cells).map_err(|e| e.to_string())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Dates come back as ISO text; every other cell uses its display form.
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => render_excel_datetime(dt),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        other => other.to_string(),
    }
}

fn render_excel_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        if let Some(duration) = dt.as_duration() {
            let secs = duration.num_seconds();
            return format!(
                "{} days {:02}:{:02}:{:02}",
                secs / 86_400,
                (secs % 86_400) / 3600,
                (secs % 3600) / 60,
                secs % 60
            );
        }
    } else if let Some(datetime) = dt.as_datetime() {
        // Midnight timestamps print as a bare date.
        return if datetime.time() == NaiveTime::MIN {
            datetime.format("%Y-%m-%d").to_string()
        } else {
            datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        };
    }
    dt.as_f64().to_string()
}

/// Parse JSON and pretty-print it with two-space indentation.
fn read_json(path: &Path) -> Result<String, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let value: serde_json::Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn args_for(path: &Path) -> Arguments {
        json!({ "file_path": path.to_string_lossy() })
            .as_object()
            .cloned()
            .unwrap()
    }

    fn write(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_reads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "test.csv", b"name,age\nAda,36\nLinus,54\n");

        let out = FileReaderTool::new().invoke(&args_for(&path)).await.unwrap();
        assert_eq!(out, "name,age\nAda,36\nLinus,54\n");
    }

    #[tokio::test]
    async fn test_quoted_csv_fields_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "quoted.CSV", b"city,note\n\"Paris, FR\",ok\n");

        let out = FileReaderTool::new().invoke(&args_for(&path)).await.unwrap();
        assert_eq!(out, "city,note\n\"Paris, FR\",ok\n");
    }

    #[tokio::test]
    async fn test_empty_csv_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.csv", b"");

        let err = FileReaderTool::new().invoke(&args_for(&path)).await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with(&format!("Error reading {}: ", path.display())));
    }

    #[tokio::test]
    async fn test_json_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "data.json", br#"{"zeta": 1, "alpha": [true, null]}"#);

        let out = FileReaderTool::new().invoke(&args_for(&path)).await.unwrap();
        assert_eq!(
            out,
            "{\n  \"zeta\": 1,\n  \"alpha\": [\n    true,\n    null\n  ]\n}"
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let args = json!({ "file_path": "test.csv_missing" })
            .as_object()
            .cloned()
            .unwrap();
        let result = FileReaderTool::new().invoke(&args).await;
        assert_eq!(
            crate::registry::render(result),
            "File not found: test.csv_missing"
        );
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", b"hello");

        let err = FileReaderTool::new().invoke(&args_for(&path)).await.unwrap_err();
        assert_eq!(err, ToolError::UnsupportedFileType(".txt".to_string()));
        assert_eq!(err.to_string(), "Unsupported file type: .txt");
    }

    #[tokio::test]
    async fn test_corrupt_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "broken.xlsx", b"definitely not a zip archive");

        let err = FileReaderTool::new().invoke(&args_for(&path)).await.unwrap_err();
        assert!(matches!(err, ToolError::Read { .. }));
        assert!(err.to_string().starts_with("Error reading "));
    }

    #[tokio::test]
    async fn test_reads_xlsx_with_dates() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/assets/scores.xlsx");

        let out = FileReaderTool::new().invoke(&args_for(&path)).await.unwrap();
        assert_eq!(
            out,
            "name,score,note,joined\nAda,36,\"Paris, FR\",2024-01-01\nLinus,54.5,plain,2023-06-15\n"
        );
    }

    #[test]
    fn test_render_cell() {
        let date = ExcelDateTime::new(45292.0, calamine::ExcelDateTimeType::DateTime, false);
        assert_eq!(render_cell(&Data::DateTime(date)), "2024-01-01");

        let stamp = ExcelDateTime::new(45292.75, calamine::ExcelDateTimeType::DateTime, false);
        assert_eq!(render_cell(&Data::DateTime(stamp)), "2024-01-01 18:00:00");

        let iso = Data::DateTimeIso("2024-01-01T08:00:00".to_string());
        assert_eq!(render_cell(&iso), "2024-01-01T08:00:00");

        assert_eq!(render_cell(&Data::Float(36.0)), "36");
        assert_eq!(render_cell(&Data::Empty), "");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/B.XLSX")), ".xlsx");
        assert_eq!(extension_of(Path::new("README")), "");
    }
}
