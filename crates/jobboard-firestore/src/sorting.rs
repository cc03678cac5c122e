//! Listing order applied after a store query.
//!
//! Ordering happens here rather than through the store: Firestore `orderBy`
//! drops documents that lack the ordered field.

use chrono::{DateTime, SecondsFormat, Utc};

use jobboard_models::job::CREATED_AT_FIELD;
use jobboard_models::Job;

use crate::store::StoredDocument;

/// Timestamp written into `created_at` on insert.
pub fn created_at_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn created_at(doc: &StoredDocument) -> Option<DateTime<Utc>> {
    doc.fields
        .get(CREATED_AT_FIELD)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Oldest first; documents without a timestamp come before all others.
pub fn sort_by_insertion(docs: &mut [StoredDocument]) {
    docs.sort_by_cached_key(created_at);
}

/// Ascending `salaryRange.min`; stable, jobs without a range first.
pub fn sort_by_min_salary(jobs: &mut [Job]) {
    jobs.sort_by_key(Job::min_salary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, created_at: Option<&str>) -> StoredDocument {
        let mut fields = jobboard_models::Fields::new();
        if let Some(ts) = created_at {
            fields.insert(CREATED_AT_FIELD.to_string(), json!(ts));
        }
        StoredDocument {
            id: id.to_string(),
            fields,
        }
    }

    #[test]
    fn test_insertion_order_puts_legacy_records_first() {
        let mut docs = vec![
            doc("late", Some("2024-05-02T00:00:00.000000Z")),
            doc("legacy", None),
            doc("early", Some("2024-05-01T00:00:00.000000Z")),
            doc("offset", Some("2024-05-01T12:00:00+10:00")),
        ];
        sort_by_insertion(&mut docs);

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["legacy", "early", "offset", "late"]);
    }

    #[test]
    fn test_min_salary_sort_is_stable() {
        let job = |id: &str, range: serde_json::Value| {
            Job::from_fields(id, serde_json::from_value(json!({ "salaryRange": range })).unwrap())
                .unwrap()
        };
        let mut jobs = vec![
            job("b", json!({"min": 500, "max": 900})),
            job("a", json!({"min": 100, "max": 200})),
            job("c", json!({"min": 500, "max": 600})),
            Job::from_fields("none", Default::default()).unwrap(),
        ];
        sort_by_min_salary(&mut jobs);

        let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["none", "a", "b", "c"]);
    }

    #[test]
    fn test_created_at_now_round_trips() {
        let ts = created_at_now();
        assert!(ts.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
