use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Field, IssueRecord, Priority, Status};

#[derive(Error, Debug, PartialEq)]
#[error("Field `{field}` of issue {id} is not a timestamp: {value:?}")]
pub struct MalformedFieldError {
    pub id: i64,
    pub field: Field,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldPercentage {
    pub field: String,
    pub percentage: String,
}

/// Counts records per lower-cased value of `field`, keyed in first-seen order.
pub fn group_counts(records: &[IssueRecord], field: Field) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for record in records {
        *counts.entry(record.field(field).to_lowercase()).or_insert(0) += 1;
    }
    counts
}

/// Share of `total` for every key, as a two-decimal string. `None` when there
/// is nothing to divide by.
pub fn to_percentages(counts: &IndexMap<String, usize>, total: usize) -> Option<Vec<FieldPercentage>> {
    if total == 0 {
        return None;
    }

    let percentages = counts
        .iter()
        .map(|(field, count)| FieldPercentage {
            field: field.clone(),
            percentage: format!("{:.2}", round_half_up(*count as f64 / total as f64 * 100.0)),
        })
        .collect();
    Some(percentages)
}

// `{:.2}` alone rounds ties to even, 0.625 must become 0.63
fn round_half_up(percentage: f64) -> f64 {
    (percentage * 100.0).round() / 100.0
}

/// Keeps the records whose every predicate field equals the expected value,
/// ignoring case.
pub fn filter_records(records: Vec<IssueRecord>, predicates: &[(Field, &str)]) -> Vec<IssueRecord> {
    records
        .into_iter()
        .filter(|record| matches_all(record, predicates))
        .collect()
}

fn matches_all(record: &IssueRecord, predicates: &[(Field, &str)]) -> bool {
    predicates
        .iter()
        .all(|(field, expected)| record.field(*field).to_lowercase() == expected.to_lowercase())
}

/// Parses `field` of `record` as a timestamp.
///
/// RFC 3339 is tried first; a zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` is read as
/// UTC.
pub fn timestamp(record: &IssueRecord, field: Field) -> Result<DateTime<Utc>, MalformedFieldError> {
    let value = record.field(field);
    DateTime::parse_from_rfc3339(&value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc()))
        .map_err(|_| MalformedFieldError {
            id: record.id,
            field,
            value,
        })
}

// Negative deltas are kept.
pub fn time_deltas(records: &[IssueRecord], start: Field, end: Field) -> Result<Vec<i64>, MalformedFieldError> {
    records
        .iter()
        .map(|record| {
            let started = timestamp(record, start)?;
            let ended = timestamp(record, end)?;
            Ok((ended - started).num_milliseconds())
        })
        .collect()
}

fn high_priority_solved(records: &[IssueRecord]) -> Vec<IssueRecord> {
    filter_records(
        records.to_vec(),
        &[
            (Field::Priority, Priority::High.as_str()),
            (Field::Status, Status::Solved.as_str()),
        ],
    )
}

/// Mean `updated - created` in milliseconds over high priority solved issues.
pub fn average_close_time(records: &[IssueRecord]) -> Result<Option<f64>, MalformedFieldError> {
    let solved = high_priority_solved(records);
    if solved.is_empty() {
        return Ok(None);
    }

    let deltas = time_deltas(&solved, Field::Created, Field::Updated)?;
    let total: i64 = deltas.iter().sum();
    Ok(Some(total as f64 / deltas.len() as f64))
}

/// Record with the latest timestamp in `field`. Ties keep the earliest record.
pub fn max_by_field(records: &[IssueRecord], field: Field) -> Result<Option<&IssueRecord>, MalformedFieldError> {
    let mut max: Option<(DateTime<Utc>, &IssueRecord)> = None;
    for record in records {
        let value = timestamp(record, field)?;
        match max {
            Some((current, _)) if value <= current => {}
            _ => max = Some((value, record)),
        }
    }
    Ok(max.map(|(_, record)| record))
}

/// Satisfaction score of the most recently updated high priority solved issue.
pub fn latest_solved_high_score(records: &[IssueRecord]) -> Result<Option<f64>, MalformedFieldError> {
    let solved = high_priority_solved(records);
    let latest = max_by_field(&solved, Field::Updated)?;
    Ok(latest.and_then(IssueRecord::satisfaction_score))
}

#[derive(Debug, Default, PartialEq)]
pub struct SummaryStats {
    pub by_priority: IndexMap<String, usize>,
    pub by_type: IndexMap<String, usize>,
    pub by_status: IndexMap<String, usize>,
    pub satisfaction_ratings: IndexMap<String, usize>,
}

impl SummaryStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a IssueRecord>) -> Self {
        let mut stats = SummaryStats::default();
        for record in records {
            *stats.by_priority.entry(record.field(Field::Priority).to_lowercase()).or_insert(0) += 1;
            *stats.by_type.entry(record.field(Field::Type).to_lowercase()).or_insert(0) += 1;
            *stats.by_status.entry(record.field(Field::Status).to_lowercase()).or_insert(0) += 1;
            if let Some(score) = record.satisfaction_score() {
                *stats.satisfaction_ratings.entry(score.to_string()).or_insert(0) += 1;
            }
        }
        stats
    }
}
