//! Transcript to `.xlsx` encoder.
//!
//! One worksheet named `ChatOutput`, a `sender,text` header row, then one row
//! per message in transcript order.

use rust_xlsxwriter::{Workbook, XlsxError};
use tracing::{debug, warn};

use crate::errors::ChatError;
use crate::models::Transcript;

pub const EXPORT_FILE_NAME: &str = "ChatOutput.xlsx";
pub const EXPORT_SHEET_NAME: &str = "ChatOutput";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel's per-cell character limit.
pub const MAX_CELL_CHARS: usize = 32_767;

const HEADERS: [&str; 2] = ["sender", "text"];

impl From<XlsxError> for ChatError {
    fn from(e: XlsxError) -> Self {
        ChatError::Export(e.to_string())
    }
}

fn fit_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            warn!(chars = text.chars().count(), "message truncated to fit a spreadsheet cell");
            &text[..cut]
        }
        None => text,
    }
}

/// Encodes the transcript as it is right now. Does not touch the transcript.
pub fn encode_transcript(transcript: &Transcript) -> Result<Vec<u8>, ChatError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string(0, col, header)?;
    }

    let rows = transcript.to_export_rows();
    for (row, entry) in (1u32..).zip(&rows) {
        worksheet.write_string(row, 0, entry.sender)?;
        worksheet.write_string(row, 1, fit_cell(entry.text))?;
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(rows = rows.len(), bytes = bytes.len(), "transcript exported");
    Ok(bytes)
}
