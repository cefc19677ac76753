//! Minimal `.xlsx` reader: sheet lookup by name and cell values.
//!
//! An `.xlsx` workbook is a zip container of XML parts. Only the parts needed
//! to recover cell values are read:
//!
//! * `xl/workbook.xml` – sheet names and their relationship ids
//! * `xl/_rels/workbook.xml.rels` – relationship id → worksheet part
//! * `xl/sharedStrings.xml` – the shared string table (optional)
//! * `xl/worksheets/sheetN.xml` – the cells themselves
//!
//! Styles are ignored, so date-formatted cells come back as their serial
//! numbers.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::error::{LoadError, LoadResult};
use super::model::CellValue;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// A sheet declared in `xl/workbook.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    pub name: String,
    pub relationship_id: String,
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

/// An opened workbook with its sheet index and shared strings resolved.
pub struct Workbook<R: Read + Seek> {
    archive: ZipArchive<R>,
    sheets: Vec<SheetEntry>,
    targets: HashMap<String, String>,
    shared_strings: Vec<String>,
}

impl Workbook<BufReader<File>> {
    /// Open a workbook from disk.
    pub fn open(path: &Path) -> LoadResult<Self> {
        let file = File::open(path).map_err(|source| LoadError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Workbook<R> {
    pub fn from_reader(reader: R) -> LoadResult<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| LoadError::malformed(format!("not an xlsx container: {e}")))?;

        let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
            .ok_or_else(|| LoadError::malformed(format!("missing {WORKBOOK_PART}")))?;
        let sheets = parse_workbook_sheets(&workbook_xml)?;

        let rels_xml = read_part(&mut archive, WORKBOOK_RELS_PART)?
            .ok_or_else(|| LoadError::malformed(format!("missing {WORKBOOK_RELS_PART}")))?;
        let targets = parse_relationships(&rels_xml)?;

        let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        Ok(Self {
            archive,
            sheets,
            targets,
            shared_strings,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Read a sheet as a dense grid of rows.
    ///
    /// Index 0 is the first sheet row. Rows absent from the XML come back
    /// empty; each row ends at its last stored cell.
    pub fn read_sheet(&mut self, name: &str) -> LoadResult<Vec<Vec<CellValue>>> {
        let entry = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| LoadError::SheetNotFound(name.to_string()))?;

        let target = self
            .targets
            .get(&entry.relationship_id)
            .ok_or_else(|| {
                LoadError::malformed(format!(
                    "no relationship '{}' for sheet '{name}'",
                    entry.relationship_id
                ))
            })?;
        let part = part_path(target);

        let xml = read_part(&mut self.archive, &part)?
            .ok_or_else(|| LoadError::malformed(format!("missing worksheet part {part}")))?;
        parse_worksheet(&xml, &self.shared_strings)
    }
}

/// Read a zip member as UTF-8, `None` if absent.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> LoadResult<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(LoadError::malformed(format!("{name}: {e}"))),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| LoadError::malformed(format!("{name}: {e}")))?;
    Ok(Some(content))
}

/// Resolve a relationship target against the `xl/` folder.
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

// ---------------------------------------------------------------------------
// XML helpers
// ---------------------------------------------------------------------------

fn attr(e: &BytesStart<'_>, key: &[u8]) -> LoadResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(LoadError::malformed)?;
        if attr.key.local_name().as_ref() == key {
            let raw = String::from_utf8_lossy(&attr.value);
            let value = quick_xml::escape::unescape(&raw).map_err(LoadError::malformed)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn push_text(buf: &mut String, raw: &[u8]) -> LoadResult<()> {
    let raw = String::from_utf8_lossy(raw);
    let text = quick_xml::escape::unescape(&raw).map_err(LoadError::malformed)?;
    buf.push_str(&text);
    Ok(())
}

/// Expand an entity reference name (`amp`, `#x41`, ...) to its text.
fn push_entity(buf: &mut String, name: &[u8]) {
    let name = String::from_utf8_lossy(name);
    let resolved = match name.as_ref() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        other => other.strip_prefix('#').and_then(|code| {
            let n = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(n)
        }),
    };
    match resolved {
        Some(c) => buf.push(c),
        None => {
            buf.push('&');
            buf.push_str(&name);
            buf.push(';');
        }
    }
}

// ---------------------------------------------------------------------------
// Part parsers
// ---------------------------------------------------------------------------

/// Sheets declared in `xl/workbook.xml`.
pub fn parse_workbook_sheets(xml: &str) -> LoadResult<Vec<SheetEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(relationship_id)) = (attr(e, b"name")?, attr(e, b"id")?) {
                    sheets.push(SheetEntry {
                        name,
                        relationship_id,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoadError::malformed(format!("{WORKBOOK_PART}: {e}"))),
            _ => {}
        }
    }

    Ok(sheets)
}

/// Relationship id → target from a `.rels` part.
pub fn parse_relationships(xml: &str) -> LoadResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr(e, b"Id")?, attr(e, b"Target")?) {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoadError::malformed(format!("{WORKBOOK_RELS_PART}: {e}"))),
            _ => {}
        }
    }

    Ok(targets)
}

/// The shared string table, rich-text runs concatenated, phonetic runs skipped.
pub fn parse_shared_strings(xml: &str) -> LoadResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_text = true,
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_text => push_text(&mut current, t)?,
            Ok(Event::GeneralRef(ref r)) if in_text => push_entity(&mut current, r),
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoadError::malformed(format!("{SHARED_STRINGS_PART}: {e}"))),
            _ => {}
        }
    }

    Ok(strings)
}

/// A `<c>` element being assembled.
#[derive(Default)]
struct PendingCell {
    column: usize,
    cell_type: Option<String>,
    text: String,
}

impl PendingCell {
    fn finish(self, shared: &[String]) -> LoadResult<CellValue> {
        let raw = self.text;
        let value = match self.cell_type.as_deref() {
            Some("s") => {
                let idx: usize = raw
                    .trim()
                    .parse()
                    .map_err(|_| LoadError::malformed(format!("bad shared string index '{raw}'")))?;
                let s = shared
                    .get(idx)
                    .ok_or_else(|| LoadError::malformed(format!("shared string {idx} out of range")))?;
                CellValue::text(s.clone())
            }
            Some("str") | Some("inlineStr") => CellValue::text(raw),
            Some("b") => CellValue::Bool(raw.trim() == "1"),
            // Error cells (#N/A, #DIV/0!, ...) carry no value.
            Some("e") => CellValue::Missing,
            _ if raw.is_empty() => CellValue::Missing,
            _ => match raw.trim().parse::<f64>() {
                Ok(v) => CellValue::Number(v),
                Err(_) => CellValue::text(raw),
            },
        };
        Ok(value)
    }
}

/// Zero-based column of a cell reference such as `"AB12"`.
pub fn reference_to_column(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let col = letters.iter().fold(0usize, |acc, &b| {
        acc * 26 + (b.to_ascii_uppercase() - b'A' + 1) as usize
    });
    Some(col - 1)
}

/// Cells of a worksheet part as a dense grid (index 0 = sheet row 1).
pub fn parse_worksheet(xml: &str, shared: &[String]) -> LoadResult<Vec<Vec<CellValue>>> {
    let mut reader = Reader::from_str(xml);
    let mut rows: BTreeMap<usize, Vec<CellValue>> = BTreeMap::new();

    let mut row_idx: Option<usize> = None;
    let mut next_col = 0usize;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    row_idx = Some(row_index(e, row_idx)?);
                    next_col = 0;
                }
                b"c" => {
                    cell = Some(start_cell(e, next_col)?);
                }
                b"v" | b"t" if cell.is_some() => in_value = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    row_idx = Some(row_index(e, row_idx)?);
                    next_col = 0;
                }
                // Styled but valueless cell.
                b"c" => {
                    next_col = start_cell(e, next_col)?.column + 1;
                }
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    push_text(&mut c.text, t)?;
                }
            }
            Ok(Event::GeneralRef(ref r)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    push_entity(&mut c.text, r);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let column = pending.column;
                        next_col = column + 1;
                        let value = pending.finish(shared)?;
                        if value.is_missing() {
                            continue;
                        }
                        let row = rows.entry(row_idx.unwrap_or(0)).or_default();
                        if row.len() <= column {
                            row.resize(column + 1, CellValue::Missing);
                        }
                        row[column] = value;
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoadError::malformed(format!("worksheet: {e}"))),
            _ => {}
        }
    }

    let height = rows.keys().next_back().map_or(0, |last| last + 1);
    let mut grid = vec![Vec::new(); height];
    for (idx, row) in rows {
        grid[idx] = row;
    }
    Ok(grid)
}

/// Zero-based index of a `<row>`, falling back to the row after `previous`.
fn row_index(e: &BytesStart<'_>, previous: Option<usize>) -> LoadResult<usize> {
    match attr(e, b"r")? {
        Some(r) => {
            let n: usize = r
                .parse()
                .map_err(|_| LoadError::malformed(format!("bad row number '{r}'")))?;
            n.checked_sub(1)
                .ok_or_else(|| LoadError::malformed("row number 0"))
        }
        None => Ok(previous.map_or(0, |p| p + 1)),
    }
}

fn start_cell(e: &BytesStart<'_>, next_col: usize) -> LoadResult<PendingCell> {
    let column = match attr(e, b"r")? {
        Some(reference) => reference_to_column(&reference)
            .ok_or_else(|| LoadError::malformed(format!("bad cell reference '{reference}'")))?,
        None => next_col,
    };
    Ok(PendingCell {
        column,
        cell_type: attr(e, b"t")?,
        text: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(reference_to_column("A1"), Some(0));
        assert_eq!(reference_to_column("O14"), Some(14));
        assert_eq!(reference_to_column("AA3"), Some(26));
        assert_eq!(reference_to_column("12"), None);
    }

    #[test]
    fn workbook_sheets_and_relationships() {
        let workbook = r#"<?xml version="1.0"?>
            <workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
              <sheets>
                <sheet name="Summary" sheetId="1" r:id="rId1"/>
                <sheet name="Data" sheetId="2" r:id="rId2"/>
              </sheets>
            </workbook>"#;
        let sheets = parse_workbook_sheets(workbook).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].name, "Data");
        assert_eq!(sheets[1].relationship_id, "rId2");

        let rels = r#"<Relationships>
              <Relationship Id="rId1" Type="t" Target="worksheets/sheet1.xml"/>
              <Relationship Id="rId2" Type="t" Target="/xl/worksheets/sheet2.xml"/>
            </Relationships>"#;
        let targets = parse_relationships(rels).unwrap();
        assert_eq!(part_path(&targets["rId1"]), "xl/worksheets/sheet1.xml");
        assert_eq!(part_path(&targets["rId2"]), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn shared_strings_join_rich_runs() {
        let xml = r#"<sst>
              <si><t>Plain</t></si>
              <si><r><t>Rich </t></r><r><t>text</t></r></si>
              <si><t>A &amp; B</t></si>
            </sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["Plain", "Rich text", "A & B"]);
    }

    #[test]
    fn worksheet_cells_by_type() {
        let shared = vec!["Campaign A".to_string()];
        let xml = r#"<worksheet><sheetData>
              <row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1"><v>12.5</v></c></row>
              <row r="3"><c r="B3" t="inlineStr"><is><t>inline</t></is></c><c r="C3" t="b"><v>1</v></c></row>
              <row r="4"><c r="A4" t="e"><v>#N/A</v></c><c r="B4" s="1"/></row>
            </sheetData></worksheet>"#;
        let grid = parse_worksheet(xml, &shared).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid[0],
            vec![
                CellValue::Text("Campaign A".into()),
                CellValue::Missing,
                CellValue::Number(12.5),
            ]
        );
        assert!(grid[1].is_empty());
        assert_eq!(grid[2][1], CellValue::Text("inline".into()));
        assert_eq!(grid[2][2], CellValue::Bool(true));
    }
}
