use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{self, SummaryOrder};
use crate::collect::{Collection, Outcome};
use crate::models::CourseType;

const TOP_INSTITUTIONS: usize = 20;

/// `1234567` -> `1,234,567`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Keeps a value inside one markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn outcome_note(collection: &Collection) -> Option<String> {
    match &collection.outcome {
        Outcome::TransportFailed { error } => Some(format!(
            "Partial data: collection stopped after {} page(s): {error}.",
            collection.pages_fetched
        )),
        Outcome::PageCap { pages } => Some(format!(
            "Collection stopped at the {pages}-page limit; later pages were not read."
        )),
        Outcome::Malformed { page, error } => {
            Some(format!("Page {page} could not be read ({error}); treated as the last page."))
        }
        Outcome::Exhausted | Outcome::Cached => None,
    }
}

pub fn build_report(
    course_type: CourseType,
    start: NaiveDate,
    end: NaiveDate,
    collection: &Collection,
) -> String {
    let records = &collection.records;
    let summaries = aggregate::summarize_by_institution(records);
    let totals = aggregate::totals(records);
    let months = aggregate::monthly_enrollment(records);

    let mut output = String::new();

    let _ = writeln!(output, "# Employer Training Fee Report");
    let _ = writeln!(
        output,
        "Generated for {} (courses starting {} to {})",
        course_type.label(),
        start,
        end
    );
    if let Some(note) = outcome_note(collection) {
        let _ = writeln!(output);
        let _ = writeln!(output, "> {note}");
    }

    if collection.is_no_data() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No training rounds matched these conditions.");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Totals");
    let _ = writeln!(output, "- Courses: {}", format_thousands(totals.course_count as u64));
    let _ = writeln!(output, "- Rounds: {}", format_thousands(totals.round_count as u64));
    let _ = writeln!(output, "- Enrollment: {}", format_thousands(totals.enrollment_sum));
    let _ = writeln!(output, "- Total fees: {}", format_thousands(totals.total_fee_sum));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Institutions by Total Fee");
    let _ = writeln!(output, "| No | Institution | Rounds | Enrollment | Total fee |");
    let _ = writeln!(output, "|---:|---|---:|---:|---:|");
    for (index, summary) in aggregate::top_institutions(&summaries, TOP_INSTITUTIONS, SummaryOrder::Fee)
        .iter()
        .enumerate()
    {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            index + 1,
            table_cell(&summary.institution),
            summary.round_count,
            format_thousands(summary.enrollment_sum),
            format_thousands(summary.total_fee_sum)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Enrollment");
    if months.is_empty() {
        let _ = writeln!(output, "No start dates could be read.");
    } else {
        for month in months.iter() {
            let _ = writeln!(
                output,
                "- {}: {}",
                month.month,
                format_thousands(month.enrollment)
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::CourseRecord;

    fn record(institution: &str, start: &str, enrollment: u64, fee: u64) -> CourseRecord {
        CourseRecord::new(
            institution.to_string(),
            "Course".to_string(),
            "1".to_string(),
            start.to_string(),
            enrollment,
            fee,
        )
        .unwrap()
    }

    fn collection(records: Vec<CourseRecord>, outcome: Outcome) -> Collection {
        Collection {
            records,
            pages_fetched: 2,
            skipped_rows: 0,
            outcome,
        }
    }

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
        )
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(750_000), "750,000");
        assert_eq!(format_thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn report_ranks_institutions_by_fee() {
        let (start, end) = window();
        let data = collection(
            vec![
                record("Inst B", "2025-03-04", 3, 100_000),
                record("Inst A", "2025-03-05", 10, 50_000),
                record("Inst A", "2025-04-01", 5, 50_000),
            ],
            Outcome::Exhausted,
        );
        let report = build_report(CourseType::All, start, end, &data);

        assert!(report.contains("# Employer Training Fee Report"));
        assert!(report.contains("- Total fees: 1,050,000"));
        assert!(report.contains("| 1 | Inst A | 2 | 15 | 750,000 |"));
        assert!(report.contains("| 2 | Inst B | 1 | 3 | 300,000 |"));
        assert!(report.contains("- 2025-03: 13"));
        assert!(report.contains("- 2025-04: 5"));
        assert!(!report.contains("> "));
    }

    #[test]
    fn institution_names_cannot_break_the_table() {
        let (start, end) = window();
        let data = collection(
            vec![record("Jobs | Skills\nCenter", "2025-03-04", 2, 10)],
            Outcome::Exhausted,
        );
        let report = build_report(CourseType::All, start, end, &data);
        assert!(report.contains("| 1 | Jobs \\| Skills Center | 1 | 2 | 20 |"));
    }

    #[test]
    fn report_says_when_nothing_matched() {
        let (start, end) = window();
        let report = build_report(
            CourseType::PackageRemote,
            start,
            end,
            &collection(vec![], Outcome::Exhausted),
        );
        assert!(report.contains("package subscription remote"));
        assert!(report.contains("No training rounds matched"));
        assert!(!report.contains("## Totals"));
    }

    #[test]
    fn report_flags_partial_data() {
        let (start, end) = window();
        let data = collection(
            vec![record("Inst A", "2025-03-05", 1, 1)],
            Outcome::TransportFailed {
                error: FetchError::Status {
                    page: 3,
                    status: 500,
                },
            },
        );
        let report = build_report(CourseType::All, start, end, &data);
        assert!(report.contains("> Partial data"));
        assert!(report.contains("HTTP 500"));
        assert!(report.contains("## Totals"));
    }
}
