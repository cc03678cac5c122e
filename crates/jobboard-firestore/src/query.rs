//! Field filters understood by every document store.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use jobboard_models::Fields;

use crate::types::{
    CollectionSelector, CompositeFilter, CompositeOperator, FieldFilter, FieldOperator,
    FieldReference, QueryFilter, StructuredQuery, Value,
};

/// Comparison applied by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl FilterOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Equal => ordering == Ordering::Equal,
            FilterOp::GreaterThanOrEqual => ordering != Ordering::Less,
            FilterOp::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl From<FilterOp> for FieldOperator {
    fn from(op: FilterOp) -> Self {
        match op {
            FilterOp::Equal => FieldOperator::Equal,
            FilterOp::GreaterThanOrEqual => FieldOperator::GreaterThanOrEqual,
            FilterOp::LessThanOrEqual => FieldOperator::LessThanOrEqual,
        }
    }
}

/// One predicate on a (possibly dotted) field path.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: String,
    pub op: FilterOp,
    pub value: JsonValue,
}

/// Conjunction of conditions. An empty query matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.with(path, FilterOp::Equal, value)
    }

    pub fn gte(self, path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.with(path, FilterOp::GreaterThanOrEqual, value)
    }

    pub fn lte(self, path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.with(path, FilterOp::LessThanOrEqual, value)
    }

    fn with(mut self, path: impl Into<String>, op: FilterOp, value: impl Into<JsonValue>) -> Self {
        self.conditions.push(Condition {
            path: path.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Evaluate against a document body.
    ///
    /// A missing field or a value of a different type never matches, the same
    /// way Firestore excludes such documents from range and equality filters.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.conditions.iter().all(|condition| {
            lookup(fields, &condition.path)
                .and_then(|actual| compare(actual, &condition.value))
                .is_some_and(|ordering| condition.op.accepts(ordering))
        })
    }

    /// Build the structured query for a collection.
    pub fn to_structured(&self, collection: &str) -> StructuredQuery {
        let mut filters: Vec<QueryFilter> = self
            .conditions
            .iter()
            .map(|condition| {
                QueryFilter::FieldFilter(FieldFilter {
                    field: FieldReference {
                        field_path: condition.path.clone(),
                    },
                    op: condition.op.into(),
                    value: Value::from_json(&condition.value),
                })
            })
            .collect();

        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(QueryFilter::CompositeFilter(CompositeFilter {
                op: CompositeOperator::And,
                filters,
            })),
        };

        StructuredQuery {
            from: vec![CollectionSelector {
                collection_id: collection.to_string(),
            }],
            filter,
        }
    }
}

fn lookup<'a>(fields: &'a Fields, path: &str) -> Option<&'a JsonValue> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn compare(actual: &JsonValue, expected: &JsonValue) -> Option<Ordering> {
    match (actual, expected) {
        (JsonValue::Number(a), JsonValue::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return Some(a.cmp(&b));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        (JsonValue::Null, JsonValue::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: JsonValue) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(Query::new().matches(&fields(json!({}))));
    }

    #[test]
    fn test_nested_range_conditions() {
        let query = Query::new()
            .gte("salaryRange.min", 60000)
            .lte("salaryRange.max", 80000);

        assert!(query.matches(&fields(json!({"salaryRange": {"min": 60000, "max": 80000}}))));
        assert!(!query.matches(&fields(json!({"salaryRange": {"min": 50000, "max": 80000}}))));
        assert!(!query.matches(&fields(json!({"salaryRange": {"min": 60000}}))));
        assert!(!query.matches(&fields(json!({"title": "no range"}))));
    }

    #[test]
    fn test_type_mismatch_never_matches() {
        let query = Query::new().eq("hr_email", "a@x.com");
        assert!(query.matches(&fields(json!({"hr_email": "a@x.com"}))));
        assert!(!query.matches(&fields(json!({"hr_email": 7}))));
    }

    #[test]
    fn test_mixed_integer_and_float() {
        let query = Query::new().gte("score", 4);
        assert!(query.matches(&fields(json!({"score": 4.5}))));
        assert!(!query.matches(&fields(json!({"score": 3.9}))));
    }

    #[test]
    fn test_single_condition_is_a_bare_field_filter() {
        let structured = Query::new().eq("job_id", "job-1").to_structured("job-applications");
        let value = serde_json::to_value(&structured).unwrap();

        assert_eq!(value["from"], json!([{"collectionId": "job-applications"}]));
        assert_eq!(value["where"]["fieldFilter"]["op"], json!("EQUAL"));
    }

    #[test]
    fn test_several_conditions_are_and_composed() {
        let structured = Query::new()
            .eq("hr_email", "a@x.com")
            .gte("salaryRange.min", 1)
            .to_structured("jobs");
        let value = serde_json::to_value(&structured).unwrap();

        assert_eq!(value["where"]["compositeFilter"]["op"], json!("AND"));
        assert_eq!(
            value["where"]["compositeFilter"]["filters"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn test_no_conditions_omit_where() {
        let value = serde_json::to_value(Query::new().to_structured("jobs")).unwrap();
        assert!(value.get("where").is_none());
    }
}
