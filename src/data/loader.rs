use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::{LoadError, LoadResult};
use super::model::{CellValue, Column, RawTable};
use super::xlsx::Workbook;

/// Text values read as missing, mirroring the usual spreadsheet/CSV NA markers.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// Where the report table lives inside the file and how to name its columns.
#[derive(Debug, Clone)]
pub struct SheetSpec {
    pub sheet_name: String,
    /// Zero-based row holding the (overridden) header; data starts below it.
    pub header_row: usize,
    /// Names assigned positionally to the columns.
    pub column_names: Vec<String>,
}

impl Default for SheetSpec {
    fn default() -> Self {
        Self {
            sheet_name: "Data".to_string(),
            header_row: 13,
            column_names: Column::names(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the report table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` – the named sheet, header at `spec.header_row`
/// * `.csv`            – the whole file as one sheet, same header offset
/// * `.parquet`        – columns renamed positionally, no header offset
pub fn load_table(path: &Path, spec: &SheetSpec) -> LoadResult<RawTable> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" => load_xlsx(path, spec)?,
        "csv" => load_csv(path, spec)?,
        "parquet" | "pq" => load_parquet(path, spec)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    log::debug!(
        "Loaded {} data rows from {} ({} columns)",
        table.len(),
        path.display(),
        table.columns.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Grid → RawTable
// ---------------------------------------------------------------------------

/// Cut the header row off a sheet grid and bind the column names.
///
/// Fully empty data rows are skipped. The sheet width is the last non-empty
/// column over the header and data rows, and must match the name list.
pub fn table_from_grid(grid: Vec<Vec<CellValue>>, spec: &SheetSpec) -> LoadResult<RawTable> {
    if spec.header_row >= grid.len() {
        return Err(LoadError::HeaderRowOutOfRange {
            header_row: spec.header_row,
            rows: grid.len(),
        });
    }

    let rows: Vec<Vec<CellValue>> = grid
        .into_iter()
        .skip(spec.header_row)
        .map(normalize_row)
        .collect();

    let width = rows.iter().map(|r| used_width(r)).max().unwrap_or(0);
    let expected = spec.column_names.len();
    if width != expected {
        return Err(LoadError::ColumnCountMismatch {
            expected,
            found: width,
        });
    }

    let data = rows
        .into_iter()
        .skip(1)
        .filter(|r| r.iter().any(|c| !c.is_missing()))
        .map(|mut r| {
            r.resize(expected, CellValue::Missing);
            r
        })
        .collect();

    Ok(RawTable {
        columns: spec.column_names.clone(),
        rows: data,
    })
}

fn used_width(row: &[CellValue]) -> usize {
    row.iter().rposition(|c| !c.is_missing()).map_or(0, |i| i + 1)
}

fn normalize_row(row: Vec<CellValue>) -> Vec<CellValue> {
    row.into_iter().map(normalize_cell).collect()
}

/// Map NA marker strings to `Missing`.
fn normalize_cell(cell: CellValue) -> CellValue {
    match cell {
        CellValue::Text(s) if NA_MARKERS.contains(&s.as_str()) => CellValue::Missing,
        other => other,
    }
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

fn load_xlsx(path: &Path, spec: &SheetSpec) -> LoadResult<RawTable> {
    let mut workbook = Workbook::open(path)?;
    log::debug!("Workbook sheets: {:?}", workbook.sheet_names());
    let grid = workbook.read_sheet(&spec.sheet_name)?;
    table_from_grid(grid, spec)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: the file is read as a raw grid, the header row sits at
/// `spec.header_row` like in the workbook export. Every cell is kept as
/// text or number.
fn load_csv(path: &Path, spec: &SheetSpec) -> LoadResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        grid.push(record.iter().map(guess_cell_type).collect());
    }

    table_from_grid(grid, spec)
}

fn csv_error(path: &Path, e: csv::Error) -> LoadError {
    if e.is_io_error() {
        if let csv::ErrorKind::Io(io) = e.into_kind() {
            return LoadError::FileAccess {
                path: path.to_path_buf(),
                source: io,
            };
        }
        return LoadError::malformed("CSV I/O error");
    }
    LoadError::malformed(format!("CSV: {e}"))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) if !v.is_nan() => CellValue::Number(v),
        _ => CellValue::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet export of the report.
///
/// The file's own column names are ignored; columns are bound positionally
/// to `spec.column_names`, so the column count must match exactly.
fn load_parquet(path: &Path, spec: &SheetSpec) -> LoadResult<RawTable> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| LoadError::malformed(format!("reading parquet metadata: {e}")))?;

    let expected = spec.column_names.len();
    let found = builder.schema().fields().len();
    if found != expected {
        return Err(LoadError::ColumnCountMismatch { expected, found });
    }

    let reader = builder
        .build()
        .map_err(|e| LoadError::malformed(format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| LoadError::malformed(format!("reading parquet record batch: {e}")))?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| normalize_cell(extract_cell(col, row)))
                .collect::<Vec<_>>();
            if cells.iter().any(|c| !c.is_missing()) {
                rows.push(cells);
            }
        }
    }

    Ok(RawTable {
        columns: spec.column_names.clone(),
        rows,
    })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Missing;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map_or(CellValue::Missing, |s| CellValue::text(s.value(row))),
        DataType::LargeUtf8 => CellValue::text(col.as_string::<i64>().value(row)),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Missing, |a| CellValue::Number(a.value(row) as f64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Missing, |a| CellValue::Number(a.value(row) as f64)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Missing, |a| CellValue::Number(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Missing, |a| CellValue::Number(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Missing, |a| CellValue::Bool(a.value(row))),
        // Dates, timestamps, dictionaries and the rest render as displayed.
        _ => array_value_to_string(col.as_ref(), row).map_or(CellValue::Missing, CellValue::text),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::error::ErrorKind;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn small_spec(header_row: usize, width: usize) -> SheetSpec {
        SheetSpec {
            sheet_name: "Data".to_string(),
            header_row,
            column_names: (0..width).map(|i| format!("c{i}")).collect(),
        }
    }

    /// Write a one-sheet workbook with inline-string cells.
    fn write_xlsx(path: &Path, sheet_name: &str, rows: &[Vec<&str>]) {
        use zip::write::SimpleFileOptions;

        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        let mut sheet = String::from("<worksheet><sheetData>");
        for (r, row) in rows.iter().enumerate() {
            sheet.push_str(&format!("<row r=\"{}\">", r + 1));
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if value.parse::<f64>().is_ok() {
                    sheet.push_str(&format!("<c r=\"{reference}\"><v>{value}</v></c>"));
                } else {
                    sheet.push_str(&format!(
                        "<c r=\"{reference}\" t=\"inlineStr\"><is><t>{value}</t></is></c>"
                    ));
                }
            }
            sheet.push_str("</row>");
        }
        sheet.push_str("</sheetData></worksheet>");

        let parts = [
            (
                "xl/workbook.xml".to_string(),
                format!(
                    "<workbook xmlns:r=\"r\"><sheets><sheet name=\"{sheet_name}\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels".to_string(),
                "<Relationships><Relationship Id=\"rId1\" Type=\"ws\" Target=\"worksheets/sheet1.xml\"/></Relationships>".to_string(),
            ),
            ("xl/worksheets/sheet1.xml".to_string(), sheet),
        ];
        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn header_row_is_cut_and_names_bound() {
        let grid = vec![
            vec![text("Report")],
            vec![],
            vec![text("x"), text("y"), text("z")],
            vec![text("a"), CellValue::Number(1.0), CellValue::Number(2.0)],
            vec![],
            vec![text("b"), CellValue::Missing, text("N/A")],
        ];
        let table = table_from_grid(grid, &small_spec(2, 3)).unwrap();
        assert_eq!(table.columns, vec!["c0", "c1", "c2"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec![text("b"), CellValue::Missing, CellValue::Missing]);
    }

    #[test]
    fn width_mismatch_is_a_format_error() {
        let grid = vec![vec![text("x"), text("y")], vec![text("a"), text("b")]];
        let err = table_from_grid(grid, &small_spec(0, 3)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ColumnCountMismatch {
                expected: 3,
                found: 2
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn header_past_end_is_a_format_error() {
        let err = table_from_grid(vec![vec![text("x")]], &small_spec(13, 1)).unwrap_err();
        assert!(matches!(err, LoadError::HeaderRowOutOfRange { .. }));
    }

    #[test]
    fn missing_file_is_a_file_access_error() {
        let err = load_table(Path::new("/nonexistent/report.xlsx"), &SheetSpec::default()).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".ods").tempfile().unwrap();
        writeln!(file, "x").unwrap();
        let err = load_table(file.path(), &SheetSpec::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ref e) if e == "ods"));
    }

    #[test]
    fn xlsx_sheet_is_found_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_xlsx(
            &path,
            "Data",
            &[
                vec!["Conversions report"],
                vec!["name", "count"],
                vec!["first", "3"],
                vec!["second", ""],
            ],
        );

        let table = load_table(&path, &small_spec(1, 2)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec![text("first"), CellValue::Number(3.0)]);
        assert_eq!(table.rows[1], vec![text("second"), CellValue::Missing]);

        let mut spec = small_spec(1, 2);
        spec.sheet_name = "Summary".to_string();
        let err = load_table(&path, &spec).unwrap_err();
        assert!(matches!(err, LoadError::SheetNotFound(ref s) if s == "Summary"));
    }

    #[test]
    fn csv_uses_the_same_header_offset() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "Report,\nname,count\nfirst,4\nsecond,n/a\n").unwrap();

        let table = load_table(file.path(), &small_spec(1, 2)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec![text("first"), CellValue::Number(4.0)]);
        assert_eq!(table.rows[1][1], CellValue::Missing);
    }

    #[test]
    fn parquet_columns_bind_positionally() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        use arrow::array::{Date32Array, DictionaryArray};
        use arrow::datatypes::Int32Type;

        let schema = Arc::new(Schema::new(vec![
            Field::new("whatever", DataType::Utf8, true),
            Field::new("n", DataType::Int64, true),
            Field::new("month", DataType::Date32, true),
            Field::new(
                "placement",
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
                true,
            ),
        ]));
        let placements: DictionaryArray<Int32Type> = vec![Some("Sidebar"), Some("Top banner")]
            .into_iter()
            .collect();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("a"), None])),
                Arc::new(Int64Array::from(vec![Some(7), Some(8)])),
                Arc::new(Date32Array::from(vec![Some(19723), Some(19754)])),
                Arc::new(placements),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_table(&path, &small_spec(13, 4)).unwrap();
        assert_eq!(table.columns, vec!["c0", "c1", "c2", "c3"]);
        assert_eq!(
            table.rows[0],
            vec![text("a"), CellValue::Number(7.0), text("2024-01-01"), text("Sidebar")]
        );
        assert_eq!(
            table.rows[1],
            vec![CellValue::Missing, CellValue::Number(8.0), text("2024-02-01"), text("Top banner")]
        );

        let err = load_table(&path, &small_spec(0, 3)).unwrap_err();
        assert!(matches!(err, LoadError::ColumnCountMismatch { .. }));
    }
}
