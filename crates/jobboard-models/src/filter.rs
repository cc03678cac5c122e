//! Job listing filter.

use crate::job::Job;

/// Salary window a job's range must fit inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryBounds {
    /// Smallest acceptable `salaryRange.min`.
    pub min: i64,
    /// Largest acceptable `salaryRange.max`.
    pub max: i64,
}

/// Options recognised by the job listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// Exact match on `hr_email`.
    pub owner_email: Option<String>,
    /// Order by `salaryRange.min` ascending instead of insertion order.
    pub sort_by_min_salary: bool,
    /// Case-insensitive substring of `location`.
    pub location_search: Option<String>,
    /// Only set when both bounds were supplied.
    pub salary_bounds: Option<SalaryBounds>,
}

impl JobFilter {
    /// Build the salary window; either bound missing disables it.
    pub fn with_salary_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.salary_bounds = match (min, max) {
            (Some(min), Some(max)) => Some(SalaryBounds { min, max }),
            _ => None,
        };
        self
    }

    /// Whether a job's location contains the search term, ignoring case.
    pub fn matches_location(&self, job: &Job) -> bool {
        let Some(search) = &self.location_search else {
            return true;
        };
        job.location
            .as_deref()
            .is_some_and(|location| location.to_lowercase().contains(&search.to_lowercase()))
    }

    /// Whether a job satisfies every supplied predicate.
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(owner) = &self.owner_email {
            if &job.hr_email != owner {
                return false;
            }
        }

        if let Some(bounds) = self.salary_bounds {
            let within = matches!(
                (job.min_salary(), job.max_salary()),
                (Some(min), Some(max)) if min >= bounds.min && max <= bounds.max
            );
            if !within {
                return false;
            }
        }

        self.matches_location(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(value: serde_json::Value) -> Job {
        Job::from_fields("job", serde_json::from_value(value).unwrap()).unwrap()
    }

    #[test]
    fn test_salary_bounds_need_both_ends() {
        let filter = JobFilter::default().with_salary_bounds(Some(1), None);
        assert_eq!(filter.salary_bounds, None);

        let filter = JobFilter::default().with_salary_bounds(Some(1), Some(2));
        assert_eq!(filter.salary_bounds, Some(SalaryBounds { min: 1, max: 2 }));
    }

    #[test]
    fn test_location_match_ignores_case() {
        let filter = JobFilter {
            location_search: Some("DHAKA".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&job(json!({"location": "Halishahar, Dhaka"}))));
        assert!(!filter.matches(&job(json!({"location": "Chittagong"}))));
        assert!(!filter.matches(&job(json!({}))));
    }

    #[test]
    fn test_salary_window() {
        let filter = JobFilter::default().with_salary_bounds(Some(60000), Some(80000));
        let inside = job(json!({"salaryRange": {"min": 60000, "max": 80000}}));
        let too_high = job(json!({"salaryRange": {"min": 50000, "max": 90000}}));
        let no_range = job(json!({}));

        assert!(filter.matches(&inside));
        assert!(!filter.matches(&too_high));
        assert!(!filter.matches(&no_range));
    }

    #[test]
    fn test_owner_email_is_exact() {
        let filter = JobFilter {
            owner_email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&job(json!({"hr_email": "a@x.com"}))));
        assert!(!filter.matches(&job(json!({"hr_email": "A@x.com"}))));
    }
}
