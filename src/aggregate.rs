use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{CourseRecord, InstitutionSummary, MonthlyEnrollment, Totals};

/// Presentation orderings for institution summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryOrder {
    Name,
    NameDesc,
    #[default]
    Fee,
    Enrollment,
    Rounds,
}

/// Groups records by exact institution name. Groups come out in order of
/// first appearance.
pub fn summarize_by_institution(records: &[CourseRecord]) -> Vec<InstitutionSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<InstitutionSummary> = Vec::new();

    for record in records {
        let slot = *index.entry(record.institution.as_str()).or_insert_with(|| {
            summaries.push(InstitutionSummary {
                institution: record.institution.clone(),
                round_count: 0,
                enrollment_sum: 0,
                total_fee_sum: 0,
            });
            summaries.len() - 1
        });

        let entry = &mut summaries[slot];
        entry.round_count += 1;
        entry.enrollment_sum += record.enrollment;
        entry.total_fee_sum += record.total_fee;
    }

    summaries
}

/// Returns a reordered copy; ties fall back to name.
pub fn order_summaries(
    summaries: &[InstitutionSummary],
    order: SummaryOrder,
) -> Vec<InstitutionSummary> {
    let mut ordered = summaries.to_vec();
    match order {
        SummaryOrder::Name => ordered.sort_by(|a, b| a.institution.cmp(&b.institution)),
        SummaryOrder::NameDesc => ordered.sort_by(|a, b| b.institution.cmp(&a.institution)),
        SummaryOrder::Fee => ordered.sort_by(|a, b| {
            b.total_fee_sum
                .cmp(&a.total_fee_sum)
                .then_with(|| a.institution.cmp(&b.institution))
        }),
        SummaryOrder::Enrollment => ordered.sort_by(|a, b| {
            b.enrollment_sum
                .cmp(&a.enrollment_sum)
                .then_with(|| a.institution.cmp(&b.institution))
        }),
        SummaryOrder::Rounds => ordered.sort_by(|a, b| {
            b.round_count
                .cmp(&a.round_count)
                .then_with(|| a.institution.cmp(&b.institution))
        }),
    }
    ordered
}

pub fn top_institutions(
    summaries: &[InstitutionSummary],
    limit: usize,
    order: SummaryOrder,
) -> Vec<InstitutionSummary> {
    let mut ordered = order_summaries(summaries, order);
    ordered.truncate(limit);
    ordered
}

pub fn totals(records: &[CourseRecord]) -> Totals {
    let courses: HashSet<&str> = records.iter().map(|r| r.course_name.as_str()).collect();
    Totals {
        course_count: courses.len(),
        round_count: records.len(),
        enrollment_sum: records.iter().map(|r| r.enrollment).sum(),
        total_fee_sum: records.iter().map(|r| r.total_fee).sum(),
    }
}

/// Enrollment per start month (`YYYY-MM`), oldest first. Records whose
/// start date does not parse are left out.
pub fn monthly_enrollment(records: &[CourseRecord]) -> Vec<MonthlyEnrollment> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.parsed_start_date() {
            *months.entry(date.format("%Y-%m").to_string()).or_insert(0) += record.enrollment;
        }
    }

    months
        .into_iter()
        .map(|(month, enrollment)| MonthlyEnrollment { month, enrollment })
        .collect()
}
