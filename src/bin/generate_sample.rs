use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const OUTPUT_PATH: &str = "3.3 Lab Reporting CM - Conversions.xlsx";
const HEADER_ROW: usize = 13;

const COLUMNS: [&str; 15] = [
    "Activity Group",
    "Activity Group ID",
    "Activity",
    "Activity ID",
    "Advertiser",
    "Campaign",
    "Site (CM360)",
    "Placement",
    "Month",
    "Total Conversions",
    "Click-through Conversions",
    "View-through Conversions",
    "Total Revenue",
    "Click-through Revenue",
    "View-through Revenue",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: u64) -> u64 {
        (self.next_f64() * n as f64) as u64
    }
}

/// A sheet cell as written to the worksheet XML.
enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn column_letter(idx: usize) -> String {
    let mut n = idx + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn worksheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        let row_no = r + 1;
        xml.push_str(&format!("<row r=\"{row_no}\">"));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{row_no}", column_letter(c));
            match cell {
                Cell::Text(s) => xml.push_str(&format!(
                    "<c r=\"{reference}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    escape(s)
                )),
                Cell::Number(v) => xml.push_str(&format!("<c r=\"{reference}\"><v>{v}</v></c>")),
                Cell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn write_workbook(path: &str, sheet_name: &str, rows: &[Vec<Cell>]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                escape(sheet_name)
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                .to_string(),
        ),
        ("xl/worksheets/sheet1.xml", worksheet_xml(rows)),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("adding {name}"))?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish().context("finishing workbook")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let campaigns = [
        ("Spring Sale", 1.0),
        ("Brand Awareness", 0.4),
        ("Retargeting", 1.6),
        ("Holiday Push", 1.2),
        ("New Product Launch", 0.9),
        ("Loyalty Program", 0.7),
        ("Back to School", 1.1),
        ("Clearance", 0.5),
        ("Newsletter Signup", 0.3),
        ("Premium Upsell", 2.0),
        ("Local Stores", 0.8),
        ("App Install", 0.6),
    ];
    let placements = [
        "Homepage Banner 728x90",
        "Sidebar 300x250",
        "Mobile Interstitial",
        "Video Pre-roll",
        "Native Feed",
    ];
    let months = ["2024-01", "2024-02", "2024-03", "2024-04", "2024-05", "2024-06"];

    // Report preamble, as exported above the data table.
    let mut rows: Vec<Vec<Cell>> = vec![
        vec![Cell::Text("Campaign Manager 360 Report".into())],
        vec![Cell::Text("Report: Lab Reporting CM - Conversions".into())],
        vec![Cell::Text("Date range: 2024-01-01 - 2024-06-30".into())],
    ];
    while rows.len() < HEADER_ROW {
        rows.push(Vec::new());
    }
    rows.push(COLUMNS.iter().map(|c| Cell::Text(c.to_string())).collect());

    let mut n_data = 0;
    for (ci, &(campaign, value_factor)) in campaigns.iter().enumerate() {
        for month in &months {
            for placement in &placements {
                // Not every placement runs every month.
                if rng.next_f64() < 0.35 {
                    continue;
                }
                let click = rng.below(40) as f64;
                let view = rng.below(120) as f64;
                let total = click + view;
                let click_rev = (click * (40.0 + rng.next_f64() * 20.0) * value_factor).round();
                let view_rev = (view * (5.0 + rng.next_f64() * 10.0) * value_factor).round();

                let revenue = if rng.next_f64() < 0.05 {
                    Cell::Text("N/A".into())
                } else {
                    Cell::Number(click_rev + view_rev)
                };
                let placement_cell = if rng.next_f64() < 0.03 {
                    Cell::Empty
                } else {
                    Cell::Text(placement.to_string())
                };

                rows.push(vec![
                    Cell::Text("Purchases".into()),
                    Cell::Number(1000.0),
                    Cell::Text("Checkout Complete".into()),
                    Cell::Number(5000.0 + ci as f64),
                    Cell::Text("Acme Retail".into()),
                    Cell::Text(campaign.to_string()),
                    Cell::Text("Display Network".into()),
                    placement_cell,
                    Cell::Text(month.to_string()),
                    Cell::Number(total),
                    Cell::Number(click),
                    Cell::Number(view),
                    revenue,
                    Cell::Number(click_rev),
                    Cell::Number(view_rev),
                ]);
                n_data += 1;
            }
        }
    }

    write_workbook(OUTPUT_PATH, "Data", &rows)?;

    println!(
        "Wrote {n_data} data rows ({} campaigns, header on row {}) to {OUTPUT_PATH}",
        campaigns.len(),
        HEADER_ROW + 1
    );
    Ok(())
}
