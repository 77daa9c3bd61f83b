//! tag policy validation
//!
//! [validate] is a pure check. It never mutates the tags and never fails, it returns a
//! (possibly empty) list of [Violation]s. Whether a violation is fatal is up to the caller:
//! the planner treats any violation as fatal, `stackplan validate-tags` reports and exits
//! non-zero.
use crate::naming::TagSet;
use crate::policy::{tag, Policy};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("Missing mandatory tag: {0}")]
    MissingTag(String),
    #[error("Invalid Environment tag: {0}")]
    InvalidEnvironment(String),
    #[error("Invalid DataClassification: {0}")]
    InvalidDataClassification(String),
    #[error("Invalid CreatedDate format: {0}")]
    InvalidCreatedDate(String),
}

/// Checks, in order:
/// 1. mandatory tags are present (one violation per missing key, sorted by key)
/// 2. `Environment` is a valid environment
/// 3. `DataClassification` is a valid classification
/// 4. `CreatedDate` parses with [Policy::date_format]
pub fn validate(policy: &Policy, tags: &TagSet) -> Vec<Violation> {
    let mut violations = vec![];

    let mut missing: Vec<&String> = policy
        .mandatory_tags
        .iter()
        .filter(|key| !tags.contains_key(key.as_str()))
        .collect();
    missing.sort();
    violations.extend(missing.into_iter().cloned().map(Violation::MissingTag));

    if let Some(environment) = tags.get(tag::ENVIRONMENT) {
        if !policy.valid_environments.contains(environment) {
            violations.push(Violation::InvalidEnvironment(environment.clone()));
        }
    }

    if let Some(classification) = tags.get(tag::DATA_CLASSIFICATION) {
        if !policy.valid_data_classifications.contains(classification) {
            violations.push(Violation::InvalidDataClassification(
                classification.clone(),
            ));
        }
    }

    if let Some(created_date) = tags.get(tag::CREATED_DATE) {
        if NaiveDate::parse_from_str(created_date, &policy.date_format).is_err() {
            violations.push(Violation::InvalidCreatedDate(created_date.clone()));
        }
    }

    tracing::debug!(violations = violations.len(), "tags validated");
    violations
}

/// Violations of a single tag set
#[derive(Debug, Clone, PartialEq, Eq, Default, derive_new::new)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_compliant() {
            return f.write_str("All tags are valid");
        }

        f.write_str("Tag validation errors:")?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compliant() -> TagSet {
        [
            ("Environment", "dev"),
            ("Project", "lambda-monorepo"),
            ("Owner", "platform-team"),
            ("CostCenter", "ENG-001"),
            ("ManagedBy", "cdk"),
            ("CreatedDate", "2024-01-15"),
            ("DataClassification", "internal"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn compliant_tags() {
        assert_eq!(validate(&Policy::default(), &compliant()), vec![]);
    }

    #[test]
    fn missing_owner() {
        let mut tags = compliant();
        tags.shift_remove("Owner");

        let violations = validate(&Policy::default(), &tags);

        assert_eq!(violations, vec![Violation::MissingTag("Owner".to_string())]);
        assert!(violations[0].to_string().contains("Owner"));
    }

    #[test]
    fn missing_tags_are_sorted() {
        let violations = validate(&Policy::default(), &TagSet::new());
        let rendered: Vec<String> = violations.iter().map(ToString::to_string).collect();

        assert_eq!(
            rendered,
            [
                "Missing mandatory tag: CostCenter",
                "Missing mandatory tag: CreatedDate",
                "Missing mandatory tag: DataClassification",
                "Missing mandatory tag: Environment",
                "Missing mandatory tag: ManagedBy",
                "Missing mandatory tag: Owner",
                "Missing mandatory tag: Project",
            ]
        );
    }

    #[test]
    fn invalid_classification() {
        let mut tags = compliant();
        tags.insert("DataClassification".to_string(), "top-secret".to_string());

        assert_eq!(
            validate(&Policy::default(), &tags),
            vec![Violation::InvalidDataClassification("top-secret".to_string())]
        );
    }

    #[test]
    fn checks_run_in_order() {
        let mut tags = compliant();
        tags.shift_remove("Project");
        tags.insert("Environment".to_string(), "qa".to_string());
        tags.insert("DataClassification".to_string(), "top-secret".to_string());
        tags.insert("CreatedDate".to_string(), "15/01/2024".to_string());

        assert_eq!(
            validate(&Policy::default(), &tags),
            vec![
                Violation::MissingTag("Project".to_string()),
                Violation::InvalidEnvironment("qa".to_string()),
                Violation::InvalidDataClassification("top-secret".to_string()),
                Violation::InvalidCreatedDate("15/01/2024".to_string()),
            ]
        );
    }

    #[test]
    fn impossible_dates_are_rejected() {
        let mut tags = compliant();
        tags.insert("CreatedDate".to_string(), "2024-02-30".to_string());

        assert_eq!(
            validate(&Policy::default(), &tags),
            vec![Violation::InvalidCreatedDate("2024-02-30".to_string())]
        );
    }

    #[test]
    fn conditional_tags_are_never_mandatory() {
        let mut tags = compliant();
        tags.insert("Environment".to_string(), "prd".to_string());
        tags.shift_remove("AutoShutdown");

        assert!(validate(&Policy::default(), &tags).is_empty());
    }

    #[test]
    fn report_rendering() {
        let report = ValidationReport::new(vec![Violation::InvalidEnvironment("qa".to_string())]);
        assert!(!report.is_compliant());
        assert_eq!(
            report.to_string(),
            "Tag validation errors:\n  - Invalid Environment tag: qa"
        );
        assert_eq!(ValidationReport::default().to_string(), "All tags are valid");
    }
}
