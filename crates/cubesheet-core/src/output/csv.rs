use crate::error::CubeError;
use crate::model::{CubeRecord, RecordField};
use std::io::Write;

/// Write records as pipe-delimited lines, no header, fields in column order.
///
/// A `|` or line break inside a value is replaced with a space so that each
/// record stays on one line with exactly seven fields.
pub fn write_pipe_csv<W: Write>(records: &[CubeRecord], mut writer: W) -> Result<(), CubeError> {
    for record in records {
        let line = RecordField::ALL
            .iter()
            .map(|f| sanitize(record.field(*f)))
            .collect::<Vec<_>>()
            .join("|");
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

fn sanitize(value: &str) -> String {
    value.replace(['|', '\n', '\r'], " ")
}
