//! Job application models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::{Job, CREATED_AT_FIELD};
use crate::validation::{require, require_email, ValidationResult};
use crate::Fields;

/// Field holding an application's review status.
pub const STATUS_FIELD: &str = "status";

/// Keys a client may not set when applying: identity, insertion time and the
/// job attributes filled in at listing time.
const RESERVED_FIELDS: [&str; 6] = [
    "_id",
    CREATED_AT_FIELD,
    "title",
    "location",
    "company",
    "company_logo",
];

/// Store-assigned identifier of an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate's application to a job, as stored and listed.
///
/// `title`, `location`, `company` and `company_logo` are never stored; they
/// are copied from the referenced job when listing an applicant's
/// applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    #[serde(rename = "_id")]
    pub id: ApplicationId,

    #[serde(default)]
    pub applicant_email: String,

    /// Weak reference to a job identifier.
    #[serde(default)]
    pub job_id: String,

    /// Free-form review status, e.g. pending, accepted, rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,

    /// Resume link, cover letter and any other submitted fields.
    #[serde(flatten)]
    pub extra: Fields,
}

impl JobApplication {
    /// Build an application from a stored document body and its identifier.
    pub fn from_fields(id: &str, mut fields: Fields) -> serde_json::Result<Self> {
        fields.insert("_id".to_string(), serde_json::Value::String(id.to_string()));
        serde_json::from_value(serde_json::Value::Object(fields))
    }

    /// Copy the job's display attributes onto this application.
    pub fn enrich_from(&mut self, job: &Job) {
        self.title = Some(job.title.clone());
        self.location = job.location.clone();
        self.company = job.company.clone();
        self.company_logo = job.company_logo.clone();
    }
}

/// An application submitted by a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    #[serde(default)]
    pub job_id: String,

    #[serde(default)]
    pub applicant_email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: Fields,
}

impl NewApplication {
    pub fn validate(&self) -> ValidationResult<()> {
        require("job_id", &self.job_id)?;
        require_email("applicant_email", &self.applicant_email)?;
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

/// Body of a status update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

impl StatusUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        require("status", &self.status)
    }
}
