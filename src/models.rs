use chrono::NaiveDate;
use serde::Serialize;

use crate::error::RowError;

/// Category filter accepted by the training API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum CourseType {
    All,
    GeneralJob,
    TrainingCard,
    AdvancedTech,
    PackageRemote,
}

impl CourseType {
    pub const ALL: [CourseType; 5] = [
        CourseType::All,
        CourseType::GeneralJob,
        CourseType::TrainingCard,
        CourseType::AdvancedTech,
        CourseType::PackageRemote,
    ];

    /// Value sent as `crseTracseSe`; empty selects every type.
    pub fn code(self) -> &'static str {
        match self {
            CourseType::All => "",
            CourseType::GeneralJob => "C0041T",
            CourseType::TrainingCard => "C0041B",
            CourseType::AdvancedTech => "C0041N",
            CourseType::PackageRemote => "C0041H",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CourseType::All => "all course types",
            CourseType::GeneralJob => "general job training",
            CourseType::TrainingCard => "corporate training card",
            CourseType::AdvancedTech => "high-skill new technology",
            CourseType::PackageRemote => "package subscription remote",
        }
    }

    pub fn from_code(code: &str) -> Option<CourseType> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

/// One accepted course round. `total_fee` is always derived, never read
/// from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRecord {
    pub institution: String,
    pub course_name: String,
    pub round: String,
    pub start_date: String,
    pub enrollment: u64,
    pub fee_per_head: u64,
    pub total_fee: u64,
}

impl CourseRecord {
    /// Fails when `enrollment * fee_per_head` does not fit in a `u64`.
    pub fn new(
        institution: String,
        course_name: String,
        round: String,
        start_date: String,
        enrollment: u64,
        fee_per_head: u64,
    ) -> Result<Self, RowError> {
        let total_fee = enrollment
            .checked_mul(fee_per_head)
            .ok_or(RowError::FeeOverflow {
                enrollment,
                fee_per_head,
            })?;

        Ok(Self {
            institution,
            course_name,
            round,
            start_date,
            enrollment,
            fee_per_head,
            total_fee,
        })
    }

    /// Parses the start date in either `YYYY-MM-DD` or `YYYYMMDD` form.
    pub fn parsed_start_date(&self) -> Option<NaiveDate> {
        let raw = self.start_date.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
            .ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstitutionSummary {
    pub institution: String,
    pub round_count: usize,
    pub enrollment_sum: u64,
    pub total_fee_sum: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    pub course_count: usize,
    pub round_count: usize,
    pub enrollment_sum: u64,
    pub total_fee_sum: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyEnrollment {
    pub month: String,
    pub enrollment: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_fee_is_derived_from_enrollment_and_fee() {
        let record = CourseRecord::new(
            "Inst A".to_string(),
            "Rust Basics".to_string(),
            "3".to_string(),
            "2025-03-04".to_string(),
            10,
            50_000,
        )
        .unwrap();
        assert_eq!(record.total_fee, 500_000);
    }

    #[test]
    fn total_fee_overflow_is_an_error() {
        let result = CourseRecord::new(
            "Inst A".to_string(),
            "Rust Basics".to_string(),
            "1".to_string(),
            "2025-03-04".to_string(),
            u64::MAX / 2,
            3,
        );
        assert_eq!(
            result,
            Err(RowError::FeeOverflow {
                enrollment: u64::MAX / 2,
                fee_per_head: 3
            })
        );
    }

    #[test]
    fn start_date_accepts_both_layouts() {
        let mut record = CourseRecord::new(
            "Inst A".to_string(),
            "Rust Basics".to_string(),
            "1".to_string(),
            "20250304".to_string(),
            1,
            1,
        )
        .unwrap();
        assert_eq!(record.parsed_start_date(), NaiveDate::from_ymd_opt(2025, 3, 4));
        record.start_date = "2025-03-04".to_string();
        assert_eq!(record.parsed_start_date(), NaiveDate::from_ymd_opt(2025, 3, 4));
        record.start_date = "soon".to_string();
        assert_eq!(record.parsed_start_date(), None);
    }

    #[test]
    fn course_type_codes_round_trip() {
        for kind in CourseType::ALL {
            assert_eq!(CourseType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(CourseType::PackageRemote.code(), "C0041H");
        assert_eq!(CourseType::from_code("C9999X"), None);
    }
}
