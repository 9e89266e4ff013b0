use crate::error::RowError;
use crate::models::CourseRecord;
use crate::parse::RawRow;

pub const INSTITUTION: &str = "subTitle";
pub const COURSE_NAME: &str = "title";
pub const ROUND: &str = "trprDegr";
pub const START_DATE: &str = "traStartDate";
pub const ENROLLMENT: &str = "regCourseMan";
pub const FEE_PER_HEAD: &str = "realMan";
pub const COURSE_TYPE: &str = "crseTracseSe";

/// How picky row normalization is.
///
/// `RequireNonZero` reproduces a truthiness check: it also throws away
/// rounds with zero enrollment or a zero fee, which are legitimate values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Strictness {
    /// Only the numeric fields must parse.
    #[default]
    Lenient,
    /// Every field must be non-empty.
    RequireFields,
    /// Every field must be non-empty and both numbers non-zero.
    RequireNonZero,
}

fn text<'a>(row: &'a RawRow, field: &str) -> &'a str {
    row.field(field).map(str::trim).unwrap_or("")
}

fn number(field: &'static str, value: &str) -> Result<u64, RowError> {
    value.parse::<u64>().map_err(|_| RowError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Turns one raw row into a record, or says why it was dropped.
///
/// `expected_course_type` is the requested code when course-type
/// enforcement is on; rows that carry a different code are rejected.
pub fn normalize(
    row: &RawRow,
    strictness: Strictness,
    expected_course_type: Option<&str>,
) -> Result<CourseRecord, RowError> {
    if let Some(expected) = expected_course_type.filter(|code| !code.is_empty()) {
        let found = text(row, COURSE_TYPE);
        if !found.is_empty() && found != expected {
            return Err(RowError::CourseTypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
    }

    let institution = text(row, INSTITUTION);
    let course_name = text(row, COURSE_NAME);
    let round = text(row, ROUND);
    let start_date = text(row, START_DATE);
    let enrollment_raw = text(row, ENROLLMENT);
    let fee_raw = text(row, FEE_PER_HEAD);

    if strictness != Strictness::Lenient {
        for (field, value) in [
            (INSTITUTION, institution),
            (COURSE_NAME, course_name),
            (ROUND, round),
            (START_DATE, start_date),
            (ENROLLMENT, enrollment_raw),
            (FEE_PER_HEAD, fee_raw),
        ] {
            if value.is_empty() {
                return Err(RowError::MissingField { field });
            }
        }
    }

    let enrollment = number(ENROLLMENT, enrollment_raw)?;
    let fee_per_head = number(FEE_PER_HEAD, fee_raw)?;

    if strictness == Strictness::RequireNonZero {
        if enrollment == 0 {
            return Err(RowError::ZeroValue { field: ENROLLMENT });
        }
        if fee_per_head == 0 {
            return Err(RowError::ZeroValue {
                field: FEE_PER_HEAD,
            });
        }
    }

    CourseRecord::new(
        institution.to_string(),
        course_name.to_string(),
        round.to_string(),
        start_date.to_string(),
        enrollment,
        fee_per_head,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row(enrollment: &str, fee: &str) -> RawRow {
        RawRow::from_fields([
            (INSTITUTION, "Inst A"),
            (COURSE_NAME, "Rust Basics"),
            (ROUND, "2"),
            (START_DATE, "2025-03-04"),
            (ENROLLMENT, enrollment),
            (FEE_PER_HEAD, fee),
        ])
    }

    #[test]
    fn derives_total_fee() {
        let record = normalize(&full_row("10", "50000"), Strictness::Lenient, None).unwrap();
        assert_eq!(record.institution, "Inst A");
        assert_eq!(record.enrollment, 10);
        assert_eq!(record.fee_per_head, 50_000);
        assert_eq!(record.total_fee, 500_000);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let row = RawRow::from_fields([
            (INSTITUTION, "  Inst A "),
            (ENROLLMENT, " 7 "),
            (FEE_PER_HEAD, "100"),
        ]);
        let record = normalize(&row, Strictness::Lenient, None).unwrap();
        assert_eq!(record.institution, "Inst A");
        assert_eq!(record.total_fee, 700);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        for (enrollment, fee) in [("ten", "100"), ("10", ""), ("-1", "100"), ("1.5", "100")] {
            let err = normalize(&full_row(enrollment, fee), Strictness::Lenient, None).unwrap_err();
            assert!(matches!(err, RowError::InvalidNumber { .. }), "{err:?}");
        }
    }

    #[test]
    fn overflowing_total_fee_drops_the_row() {
        let row = full_row("18446744073709551615", "2");
        assert_eq!(
            normalize(&row, Strictness::Lenient, None),
            Err(RowError::FeeOverflow {
                enrollment: u64::MAX,
                fee_per_head: 2
            })
        );
    }

    #[test]
    fn missing_numeric_element_fails_coercion() {
        let row = RawRow::from_fields([(INSTITUTION, "Inst A"), (FEE_PER_HEAD, "100")]);
        assert_eq!(
            normalize(&row, Strictness::Lenient, None),
            Err(RowError::InvalidNumber {
                field: ENROLLMENT,
                value: String::new()
            })
        );
    }

    #[test]
    fn lenient_accepts_empty_text_fields() {
        let row = RawRow::from_fields([(ENROLLMENT, "1"), (FEE_PER_HEAD, "2")]);
        let record = normalize(&row, Strictness::Lenient, None).unwrap();
        assert_eq!(record.institution, "");
        assert_eq!(record.total_fee, 2);
    }

    #[test]
    fn require_fields_rejects_empty_text() {
        let row = RawRow::from_fields([
            (INSTITUTION, "Inst A"),
            (COURSE_NAME, ""),
            (ROUND, "2"),
            (START_DATE, "2025-03-04"),
            (ENROLLMENT, "1"),
            (FEE_PER_HEAD, "2"),
        ]);
        assert_eq!(
            normalize(&row, Strictness::RequireFields, None),
            Err(RowError::MissingField { field: COURSE_NAME })
        );
    }

    #[test]
    fn zero_enrollment_survives_unless_non_zero_required() {
        let row = full_row("0", "50000");
        let record = normalize(&row, Strictness::RequireFields, None).unwrap();
        assert_eq!(record.total_fee, 0);
        assert_eq!(
            normalize(&row, Strictness::RequireNonZero, None),
            Err(RowError::ZeroValue { field: ENROLLMENT })
        );
    }

    #[test]
    fn course_type_mismatch_is_rejected_when_enforced() {
        let row = RawRow::from_fields([
            (COURSE_TYPE, "C0041T"),
            (ENROLLMENT, "1"),
            (FEE_PER_HEAD, "1"),
        ]);
        assert!(matches!(
            normalize(&row, Strictness::Lenient, Some("C0041H")),
            Err(RowError::CourseTypeMismatch { .. })
        ));
        assert!(normalize(&row, Strictness::Lenient, Some("C0041T")).is_ok());
        assert!(normalize(&row, Strictness::Lenient, Some("")).is_ok());
        assert!(normalize(&row, Strictness::Lenient, None).is_ok());
    }
}
