use chrono::NaiveDate;

use crate::error::PreconditionError;
use crate::models::CourseType;

pub const MAX_SPAN_DAYS: i64 = 365;
pub const PAGE_SIZE: u32 = 100;
pub const SORT_COLUMN: &str = "TRNG_BGDE";
pub const SORT_DIRECTION: &str = "ASC";

/// Request parameters for one collection run. Only `page_number` changes
/// between requests of the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameters {
    pub course_type: String,
    pub start_date: String,
    pub end_date: String,
    pub sort_column: String,
    pub sort_direction: String,
    pub page_size: u32,
    pub page_number: u32,
}

impl QueryParameters {
    /// Every field except the page, as a JSON object. Callers may add
    /// their own entries before serializing it into a key.
    pub fn key_fields(&self) -> serde_json::Value {
        serde_json::json!({
            "course_type": self.course_type,
            "start_date": self.start_date,
            "end_date": self.end_date,
            "sort_column": self.sort_column,
            "sort_direction": self.sort_direction,
            "page_size": self.page_size,
        })
    }

    /// Stable key for memoizing a run: fields in sorted order, page excluded.
    pub fn cache_key(&self) -> String {
        // json! builds a BTreeMap-backed object, so keys serialize sorted.
        self.key_fields().to_string()
    }

    /// Query string pairs for the current page.
    pub fn to_pairs(&self, auth_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("authKey", auth_key.to_string()),
            ("returnType", "XML".to_string()),
            ("outType", "1".to_string()),
            ("pageNum", self.page_number.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("srchTraStDt", self.start_date.clone()),
            ("srchTraEndDt", self.end_date.clone()),
            ("crseTracseSe", self.course_type.clone()),
            ("sort", self.sort_direction.clone()),
            ("sortCol", self.sort_column.clone()),
        ]
    }
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), PreconditionError> {
    if start > end {
        return Err(PreconditionError::StartAfterEnd { start, end });
    }
    let days = (end - start).num_days();
    if days > MAX_SPAN_DAYS {
        return Err(PreconditionError::SpanTooLong {
            days,
            max: MAX_SPAN_DAYS,
        });
    }
    Ok(())
}

pub fn build_query(
    course_type: CourseType,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<QueryParameters, PreconditionError> {
    validate_date_range(start, end)?;

    Ok(QueryParameters {
        course_type: course_type.code().to_string(),
        start_date: compact_date(start),
        end_date: compact_date(end),
        sort_column: SORT_COLUMN.to_string(),
        sort_direction: SORT_DIRECTION.to_string(),
        page_size: PAGE_SIZE,
        page_number: 1,
    })
}

pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
