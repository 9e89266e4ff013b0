//! Tabular exports of collected rounds and institution summaries.

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;

use crate::error::ExportError;
use crate::models::{CourseRecord, InstitutionSummary};

pub const DETAIL_SHEET: &str = "rounds";
pub const SUMMARY_SHEET: &str = "institutions";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const DETAIL_HEADERS: [&str; 7] = [
    "institution",
    "course_name",
    "round",
    "start_date",
    "enrollment",
    "fee_per_head",
    "total_fee",
];

const SUMMARY_HEADERS: [&str; 5] = [
    "no",
    "institution",
    "round_count",
    "enrollment_sum",
    "total_fee_sum",
];

/// Serializes rows as CSV with a header line, in the order given. The
/// output starts with a UTF-8 byte order mark so spreadsheet tools pick
/// the right encoding.
pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

/// One line of the institution table, numbered from 1 in the order given.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    no: usize,
    institution: &'a str,
    round_count: usize,
    enrollment_sum: u64,
    total_fee_sum: u64,
}

fn summary_rows(summaries: &[InstitutionSummary]) -> Vec<SummaryRow<'_>> {
    summaries
        .iter()
        .enumerate()
        .map(|(index, summary)| SummaryRow {
            no: index + 1,
            institution: &summary.institution,
            round_count: summary.round_count,
            enrollment_sum: summary.enrollment_sum,
            total_fee_sum: summary.total_fee_sum,
        })
        .collect()
}

/// Institution summaries as CSV, with the same numbered columns as the
/// workbook's institution sheet.
pub fn institutions_to_csv(summaries: &[InstitutionSummary]) -> Result<Vec<u8>, ExportError> {
    to_csv(&summary_rows(summaries))
}

/// Which sheets go into a workbook. At least one must be set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sheets<'a> {
    pub detail: Option<&'a [CourseRecord]>,
    pub institutions: Option<&'a [InstitutionSummary]>,
}

/// Builds one xlsx workbook holding every requested sheet.
pub fn to_xlsx(sheets: Sheets<'_>) -> Result<Vec<u8>, ExportError> {
    if sheets.detail.is_none() && sheets.institutions.is_none() {
        return Err(ExportError::Empty);
    }

    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();

    if let Some(records) = sheets.detail {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(DETAIL_SHEET)?;
        write_detail(worksheet, records, &header)?;
    }
    if let Some(summaries) = sheets.institutions {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SUMMARY_SHEET)?;
        write_summaries(worksheet, summaries, &header)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_headers(
    worksheet: &mut Worksheet,
    headers: &[&str],
    format: &Format,
) -> Result<(), ExportError> {
    for (col, name) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, format)?;
    }
    Ok(())
}

fn write_detail(
    worksheet: &mut Worksheet,
    records: &[CourseRecord],
    header: &Format,
) -> Result<(), ExportError> {
    write_headers(worksheet, &DETAIL_HEADERS, header)?;
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, &record.institution)?;
        worksheet.write_string(row, 1, &record.course_name)?;
        worksheet.write_string(row, 2, &record.round)?;
        worksheet.write_string(row, 3, &record.start_date)?;
        worksheet.write_number(row, 4, record.enrollment as f64)?;
        worksheet.write_number(row, 5, record.fee_per_head as f64)?;
        worksheet.write_number(row, 6, record.total_fee as f64)?;
    }
    Ok(())
}

fn write_summaries(
    worksheet: &mut Worksheet,
    summaries: &[InstitutionSummary],
    header: &Format,
) -> Result<(), ExportError> {
    write_headers(worksheet, &SUMMARY_HEADERS, header)?;
    for summary in summary_rows(summaries) {
        let row = summary.no as u32;
        worksheet.write_number(row, 0, summary.no as f64)?;
        worksheet.write_string(row, 1, summary.institution)?;
        worksheet.write_number(row, 2, summary.round_count as f64)?;
        worksheet.write_number(row, 3, summary.enrollment_sum as f64)?;
        worksheet.write_number(row, 4, summary.total_fee_sum as f64)?;
    }
    Ok(())
}

/// `{stem}_{YYYYMMDD_HHMMSS}.{extension}`
pub fn suggested_filename(stem: &str, extension: &str, generated_at: NaiveDateTime) -> String {
    format!(
        "{stem}_{}.{extension}",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}
