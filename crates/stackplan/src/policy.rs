//! naming and tagging policy data
//!
//! The region table, the mandatory tag keys and the enumerated valid tag values are plain
//! data. A [Policy] is built once at process start (usually [Policy::default]) and handed
//! to every component explicitly.
use crate::config_documents::{Format, LoadError};
use indexmap::{IndexMap, IndexSet};
use std::path::Path;

/// Tag keys
pub mod tag {
    pub const ENVIRONMENT: &str = "Environment";
    pub const PROJECT: &str = "Project";
    pub const OWNER: &str = "Owner";
    pub const COST_CENTER: &str = "CostCenter";
    pub const MANAGED_BY: &str = "ManagedBy";
    pub const CREATED_DATE: &str = "CreatedDate";
    pub const DATA_CLASSIFICATION: &str = "DataClassification";

    // prd only
    pub const SLA: &str = "SLA";
    pub const CRITICALITY_LEVEL: &str = "CriticalityLevel";

    // dev only
    pub const AUTO_SHUTDOWN: &str = "AutoShutdown";
    pub const PURPOSE: &str = "Purpose";
}

pub const PRODUCTION: &str = "prd";
pub const STAGING: &str = "stg";
pub const DEVELOPMENT: &str = "dev";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Long region identifier to short region code
    pub region_codes: IndexMap<String, String>,
    pub mandatory_tags: IndexSet<String>,
    pub valid_environments: IndexSet<String>,
    pub valid_data_classifications: IndexSet<String>,
    /// `strftime` format of the `CreatedDate` tag
    pub date_format: String,
}

impl Default for Policy {
    fn default() -> Self {
        let region_codes = [
            ("us-east-1", "use1"),
            ("us-west-2", "usw2"),
            ("eu-west-1", "euw1"),
            ("eu-central-1", "euc1"),
            ("ap-southeast-1", "apse1"),
        ];
        let mandatory_tags = [
            tag::ENVIRONMENT,
            tag::PROJECT,
            tag::OWNER,
            tag::COST_CENTER,
            tag::MANAGED_BY,
            tag::CREATED_DATE,
            tag::DATA_CLASSIFICATION,
        ];

        Self {
            region_codes: region_codes
                .into_iter()
                .map(|(region, code)| (region.to_string(), code.to_string()))
                .collect(),
            mandatory_tags: mandatory_tags.into_iter().map(String::from).collect(),
            valid_environments: [DEVELOPMENT, STAGING, PRODUCTION]
                .into_iter()
                .map(String::from)
                .collect(),
            valid_data_classifications: ["public", "internal", "confidential", "restricted"]
                .into_iter()
                .map(String::from)
                .collect(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl Policy {
    /// Loads a policy document
    ///
    /// Fields missing from the document keep their [Policy::default] values.
    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        let format = Format::from_path(file_path)?;
        tracing::info!(path=%file_path.display(), ?format, "loading policy document");

        let contents = std::fs::read_to_string(file_path)?;
        Ok(match format {
            Format::Hcl => hcl::from_str(&contents)?,
            Format::Yaml => serde_yaml::from_str(&contents)?,
            Format::Json => serde_json::from_str(&contents)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_policy() {
        let policy = Policy::default();
        assert_eq!(policy.mandatory_tags.len(), 7);
        assert_eq!(policy.region_codes["eu-central-1"], "euc1");
        assert!(policy.valid_environments.contains("stg"));
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let policy: Policy = serde_yaml::from_str(
            "region_codes:\n  sa-east-1: sae1\nvalid_environments: [dev, prd]\n",
        )
        .expect("valid policy");

        assert_eq!(policy.region_codes.len(), 1);
        assert_eq!(policy.valid_environments.len(), 2);
        assert_eq!(policy.mandatory_tags, Policy::default().mandatory_tags);
    }

    #[test]
    fn hcl_policy_document() {
        let policy: Policy = hcl::from_str(
            r#"
            date_format = "%d.%m.%Y"
            valid_data_classifications = ["public", "secret"]
            "#,
        )
        .expect("valid policy");

        assert_eq!(policy.date_format, "%d.%m.%Y");
        assert!(policy.valid_data_classifications.contains("secret"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Policy, _> = serde_yaml::from_str("mandatory_tag: [Owner]");
        assert!(result.is_err());
    }
}
