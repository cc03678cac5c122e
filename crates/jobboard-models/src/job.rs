//! Job posting models.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::validation::{require, require_email, ValidationError, ValidationResult};
use crate::Fields;

/// Field holding the number of applications submitted for a job.
pub const APPLICATION_COUNT_FIELD: &str = "applicationCount";

/// Field holding the insertion timestamp of a job.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Keys a client may not set when posting a job.
const RESERVED_FIELDS: [&str; 3] = ["_id", APPLICATION_COUNT_FIELD, CREATED_AT_FIELD];

/// Store-assigned identifier of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Salary bounds offered for a job.
///
/// Amounts may arrive as integers, whole-valued floats or numeric strings;
/// they are normalised to integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(deserialize_with = "deserialize_amount")]
    pub min: i64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub max: i64,
    /// Currency and any other attributes the poster supplied.
    #[serde(flatten)]
    pub extra: Fields,
}

impl SalaryRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            extra: Fields::new(),
        }
    }
}

fn amount_from_json(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    amount_from_json(&value)
        .ok_or_else(|| de::Error::custom(format!("invalid salary amount: {value}")))
}

/// A stored range that cannot be read as two amounts counts as no range.
fn deserialize_stored_range<'de, D>(deserializer: D) -> Result<Option<SalaryRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// A job posting as stored.
///
/// Reads are lenient: documents written before validation existed may lack
/// `title` or `hr_email`, in which case those fields are empty, and a
/// malformed `salaryRange` reads as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: JobId,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,

    #[serde(default)]
    pub hr_email: String,

    #[serde(
        rename = "salaryRange",
        default,
        deserialize_with = "deserialize_stored_range",
        skip_serializing_if = "Option::is_none"
    )]
    pub salary_range: Option<SalaryRange>,

    /// Absent until the first application is submitted.
    #[serde(rename = "applicationCount", default, skip_serializing_if = "Option::is_none")]
    pub application_count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Description, requirements, deadline and other free-form attributes.
    #[serde(flatten)]
    pub extra: Fields,
}

impl Job {
    /// Build a job from a stored document body and its identifier.
    pub fn from_fields(id: &str, mut fields: Fields) -> serde_json::Result<Self> {
        fields.insert("_id".to_string(), serde_json::Value::String(id.to_string()));
        serde_json::from_value(serde_json::Value::Object(fields))
    }

    /// Lower salary bound, if the posting has one.
    pub fn min_salary(&self) -> Option<i64> {
        self.salary_range.as_ref().map(|r| r.min)
    }

    /// Upper salary bound, if the posting has one.
    pub fn max_salary(&self) -> Option<i64> {
        self.salary_range.as_ref().map(|r| r.max)
    }
}

/// A job posting submitted by an HR user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,

    #[serde(default)]
    pub hr_email: String,

    #[serde(rename = "salaryRange", default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<SalaryRange>,

    #[serde(flatten)]
    pub extra: Fields,
}

impl NewJob {
    /// Check required fields and the salary range ordering.
    pub fn validate(&self) -> ValidationResult<()> {
        require("title", &self.title)?;
        require_email("hr_email", &self.hr_email)?;

        if let Some(range) = &self.salary_range {
            if range.min > range.max {
                return Err(ValidationError::InvertedSalaryRange {
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }

    /// Convert into a document body, dropping keys owned by the server.
    pub fn into_fields(mut self) -> serde_json::Result<Fields> {
        for key in RESERVED_FIELDS {
            self.extra.remove(key);
        }

        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(fields),
            _ => Ok(Fields::new()),
        }
    }
}
