//! Minimal SpreadsheetML writer.
//!
//! Produces a zip package with one worksheet per sheet name, inline strings,
//! numeric cells and merged ranges. Only the parts Excel and LibreOffice
//! require are written.

use crate::config::{column_index, column_letter, ReportConfig};
use crate::error::CubeError;
use crate::model::{CubeRecord, RecordField};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::str::FromStr;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Style index 1 in `cellXfs` is vertically centred.
const STYLE_VCENTER: &str = "1";

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment vertical="center"/></xf></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// A value destined for one cell.
#[derive(Debug, Clone, PartialEq)]
enum CellValue<'a> {
    Blank,
    Number(String),
    Text(&'a str),
}

/// Inclusive span of a merge within one column, in 1-based sheet rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSpan {
    pub column: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl MergeSpan {
    fn reference(&self) -> String {
        let col = column_letter(self.column);
        format!("{col}{}:{col}{}", self.first_row, self.last_row)
    }
}

struct Sheet<'r> {
    name: String,
    rows: Vec<&'r CubeRecord>,
    merges: Vec<MergeSpan>,
}

/// Sheet rows `[first, last]` merged in fixed-size groups from row 2.
///
/// Only complete groups are merged; a trailing remainder is left alone.
pub fn fixed_group_spans(data_rows: usize, group_size: usize) -> Vec<(usize, usize)> {
    if group_size < 2 {
        return Vec::new();
    }
    (0..data_rows / group_size)
        .map(|g| {
            let first = 2 + g * group_size;
            (first, first + group_size - 1)
        })
        .collect()
}

/// Sheet rows `[first, last]` covering each maximal run of equal values, for
/// runs of two or more. `values[0]` sits on sheet row 2.
pub fn equal_run_spans<S: AsRef<str>>(values: &[S]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        while end < values.len() && values[end].as_ref() == values[start].as_ref() {
            end += 1;
        }
        if end - start > 1 {
            spans.push((start + 2, end + 1));
        }
        start = end;
    }
    spans
}

/// Write every record to the raw sheet and split them into one sheet per
/// configured concrete type.
pub fn write_workbook<W: Write + Seek>(
    records: &[CubeRecord],
    config: &ReportConfig,
    writer: W,
) -> Result<(), CubeError> {
    let sheets = plan_sheets(records, config)?;

    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(&content_types_xml(sheets.len())?)?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(&root_rels_xml()?)?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(&workbook_xml(&sheets)?)?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(&workbook_rels_xml(sheets.len())?)?;

    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES_XML.as_bytes())?;

    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(&worksheet_xml(sheet, &config.headers)?)?;
    }

    zip.finish()?;
    Ok(())
}

/// Write the workbook to a file, replacing any existing one.
pub fn save_workbook(
    records: &[CubeRecord],
    config: &ReportConfig,
    path: &Path,
) -> Result<(), CubeError> {
    let file = File::create(path)?;
    write_workbook(records, config, BufWriter::new(file))
}

fn plan_sheets<'r>(
    records: &'r [CubeRecord],
    config: &ReportConfig,
) -> Result<Vec<Sheet<'r>>, CubeError> {
    let merge_columns = config
        .merge_columns
        .iter()
        .map(|c| column_index(c).ok_or_else(|| bad_column(c)))
        .collect::<Result<Vec<_>, _>>()?;
    let pour_column = column_index(&config.pour_location_column)
        .ok_or_else(|| bad_column(&config.pour_location_column))?;

    let mut sheets = Vec::with_capacity(config.concrete_types.len() + 1);
    sheets.push(Sheet {
        name: config.raw_sheet.clone(),
        rows: records.iter().collect(),
        merges: Vec::new(),
    });

    for ty in &config.concrete_types {
        let rows: Vec<&CubeRecord> = records
            .iter()
            .filter(|r| r.concrete_type() == *ty)
            .collect();

        let mut merges = Vec::new();
        for &column in &merge_columns {
            merges.extend(
                fixed_group_spans(rows.len(), config.merge_group_size)
                    .into_iter()
                    .map(|(first_row, last_row)| MergeSpan {
                        column,
                        first_row,
                        last_row,
                    }),
            );
        }
        let locations: Vec<&str> = rows.iter().map(|r| r.pour_location.as_str()).collect();
        merges.extend(
            equal_run_spans(&locations)
                .into_iter()
                .map(|(first_row, last_row)| MergeSpan {
                    column: pour_column,
                    first_row,
                    last_row,
                }),
        );

        sheets.push(Sheet {
            name: ty.name().to_string(),
            rows,
            merges,
        });
    }

    Ok(sheets)
}

fn bad_column(letter: &str) -> CubeError {
    CubeError::Workbook(format!("invalid column letter '{letter}'"))
}

fn cell_value(record: &CubeRecord, field: RecordField) -> CellValue<'_> {
    let raw = record.field(field).trim();
    if raw.is_empty() {
        return CellValue::Blank;
    }
    match field {
        RecordField::MarkNumber => match raw.parse::<i64>() {
            Ok(n) => CellValue::Number(n.to_string()),
            Err(_) => CellValue::Text(raw),
        },
        RecordField::CompressiveStrength => match Decimal::from_str(raw) {
            Ok(d) => CellValue::Number(d.normalize().to_string()),
            Err(_) => CellValue::Text(raw),
        },
        _ => CellValue::Text(raw),
    }
}

fn xml_err<E: std::fmt::Display>(e: E) -> CubeError {
    CubeError::Workbook(e.to_string())
}

fn new_part() -> Result<Writer<Vec<u8>>, CubeError> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_err)?;
    Ok(w)
}

fn start(w: &mut Writer<Vec<u8>>, elem: BytesStart<'_>) -> Result<(), CubeError> {
    w.write_event(Event::Start(elem)).map_err(xml_err)
}

fn empty(w: &mut Writer<Vec<u8>>, elem: BytesStart<'_>) -> Result<(), CubeError> {
    w.write_event(Event::Empty(elem)).map_err(xml_err)
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> Result<(), CubeError> {
    w.write_event(Event::End(BytesEnd::new(name))).map_err(xml_err)
}

fn text(w: &mut Writer<Vec<u8>>, value: &str) -> Result<(), CubeError> {
    w.write_event(Event::Text(BytesText::new(value))).map_err(xml_err)
}

fn content_types_xml(sheet_count: usize) -> Result<Vec<u8>, CubeError> {
    let mut w = new_part()?;
    start(&mut w, BytesStart::new("Types").with_attributes([("xmlns", NS_CONTENT_TYPES)]))?;
    empty(
        &mut w,
        BytesStart::new("Default")
            .with_attributes([("Extension", "rels"), ("ContentType", CT_RELS)]),
    )?;
    empty(
        &mut w,
        BytesStart::new("Default")
            .with_attributes([("Extension", "xml"), ("ContentType", "application/xml")]),
    )?;
    empty(
        &mut w,
        BytesStart::new("Override")
            .with_attributes([("PartName", "/xl/workbook.xml"), ("ContentType", CT_WORKBOOK)]),
    )?;
    empty(
        &mut w,
        BytesStart::new("Override")
            .with_attributes([("PartName", "/xl/styles.xml"), ("ContentType", CT_STYLES)]),
    )?;
    for i in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{i}.xml");
        empty(
            &mut w,
            BytesStart::new("Override")
                .with_attributes([("PartName", part.as_str()), ("ContentType", CT_WORKSHEET)]),
        )?;
    }
    end(&mut w, "Types")?;
    Ok(w.into_inner())
}

fn root_rels_xml() -> Result<Vec<u8>, CubeError> {
    let mut w = new_part()?;
    start(&mut w, BytesStart::new("Relationships").with_attributes([("xmlns", NS_PKG_REL)]))?;
    empty(
        &mut w,
        BytesStart::new("Relationship").with_attributes([
            ("Id", "rId1"),
            ("Type", REL_OFFICE_DOCUMENT),
            ("Target", "xl/workbook.xml"),
        ]),
    )?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

fn workbook_xml(sheets: &[Sheet<'_>]) -> Result<Vec<u8>, CubeError> {
    let mut w = new_part()?;
    start(
        &mut w,
        BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)]),
    )?;
    start(&mut w, BytesStart::new("sheets"))?;
    for (i, sheet) in sheets.iter().enumerate() {
        let id = (i + 1).to_string();
        let rel = format!("rId{id}");
        empty(
            &mut w,
            BytesStart::new("sheet").with_attributes([
                ("name", sheet.name.as_str()),
                ("sheetId", id.as_str()),
                ("r:id", rel.as_str()),
            ]),
        )?;
    }
    end(&mut w, "sheets")?;
    end(&mut w, "workbook")?;
    Ok(w.into_inner())
}

fn workbook_rels_xml(sheet_count: usize) -> Result<Vec<u8>, CubeError> {
    let mut w = new_part()?;
    start(&mut w, BytesStart::new("Relationships").with_attributes([("xmlns", NS_PKG_REL)]))?;
    for i in 1..=sheet_count {
        let id = format!("rId{i}");
        let target = format!("worksheets/sheet{i}.xml");
        empty(
            &mut w,
            BytesStart::new("Relationship").with_attributes([
                ("Id", id.as_str()),
                ("Type", REL_WORKSHEET),
                ("Target", target.as_str()),
            ]),
        )?;
    }
    let styles_id = format!("rId{}", sheet_count + 1);
    empty(
        &mut w,
        BytesStart::new("Relationship").with_attributes([
            ("Id", styles_id.as_str()),
            ("Type", REL_STYLES),
            ("Target", "styles.xml"),
        ]),
    )?;
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

fn worksheet_xml(sheet: &Sheet<'_>, headers: &[String]) -> Result<Vec<u8>, CubeError> {
    // Top-left cells of merged ranges carry the centred style.
    let centred: std::collections::HashSet<(usize, usize)> = sheet
        .merges
        .iter()
        .map(|m| (m.first_row, m.column))
        .collect();

    let mut w = new_part()?;
    start(
        &mut w,
        BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)]),
    )?;
    start(&mut w, BytesStart::new("sheetData"))?;

    start(&mut w, BytesStart::new("row").with_attributes([("r", "1")]))?;
    for (col, header) in headers.iter().enumerate() {
        write_cell(&mut w, 1, col, &CellValue::Text(header), false)?;
    }
    end(&mut w, "row")?;

    for (i, record) in sheet.rows.iter().enumerate() {
        let row = i + 2;
        let r = row.to_string();
        start(&mut w, BytesStart::new("row").with_attributes([("r", r.as_str())]))?;
        for (col, field) in RecordField::ALL.into_iter().enumerate() {
            let value = cell_value(record, field);
            write_cell(&mut w, row, col, &value, centred.contains(&(row, col)))?;
        }
        end(&mut w, "row")?;
    }
    end(&mut w, "sheetData")?;

    if !sheet.merges.is_empty() {
        let count = sheet.merges.len().to_string();
        start(
            &mut w,
            BytesStart::new("mergeCells").with_attributes([("count", count.as_str())]),
        )?;
        for span in &sheet.merges {
            let reference = span.reference();
            empty(
                &mut w,
                BytesStart::new("mergeCell").with_attributes([("ref", reference.as_str())]),
            )?;
        }
        end(&mut w, "mergeCells")?;
    }

    end(&mut w, "worksheet")?;
    Ok(w.into_inner())
}

fn write_cell(
    w: &mut Writer<Vec<u8>>,
    row: usize,
    col: usize,
    value: &CellValue<'_>,
    centred: bool,
) -> Result<(), CubeError> {
    let reference = format!("{}{row}", column_letter(col));
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference.as_str()));
    if centred {
        cell.push_attribute(("s", STYLE_VCENTER));
    }

    match value {
        // A styled blank keeps the alignment on an empty merged cell.
        CellValue::Blank if centred => empty(w, cell),
        CellValue::Blank => Ok(()),
        CellValue::Number(n) => {
            start(w, cell)?;
            start(w, BytesStart::new("v"))?;
            text(w, n)?;
            end(w, "v")?;
            end(w, "c")
        }
        CellValue::Text(s) => {
            cell.push_attribute(("t", "inlineStr"));
            start(w, cell)?;
            start(w, BytesStart::new("is"))?;
            start(w, BytesStart::new("t").with_attributes([("xml:space", "preserve")]))?;
            text(w, s)?;
            end(w, "t")?;
            end(w, "is")?;
            end(w, "c")
        }
    }
}
