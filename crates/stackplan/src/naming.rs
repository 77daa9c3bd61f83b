//! resource names and tags
//!
//! Every deployable unit shares the same [IdentityContext]: company code, environment, short
//! region code and the unit's purpose. Names are pure formatting over that context, so the
//! same inputs always produce the same name. Names double as external identifiers and must
//! not drift between runs.
//!
//! | what          | format                                                        |
//! |---------------|---------------------------------------------------------------|
//! | resource name | `{company}-{env}-{region_code}-{service}-{type}-{identifier}` |
//! | stack name    | `{company}-{env}-{purpose}-stack`                             |
//! | parameter     | `/{company}/{env}/{path...}`                                  |
use crate::config::EffectiveConfig;
use crate::policy::{self, tag, Policy};
use chrono::NaiveDate;
use indexmap::IndexMap;

pub const SEPARATOR: &str = "-";

/// Number of leading characters used as region code for unmapped regions
pub const REGION_FALLBACK_LEN: usize = 4;

pub type TagSet = IndexMap<String, String>;

/// How to treat regions missing from [Policy::region_codes]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegionMode {
    /// Use the first [REGION_FALLBACK_LEN] characters of the region
    #[default]
    Fallback,
    /// Reject the region
    Strict,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("Region {0} has no region code")]
    UnmappedRegion(String),
}

/// Short code for `region`
///
/// Unmapped regions fall back to their first four characters. Distinct unmapped regions may
/// share a prefix (`us-south-1`, `us-north-1`), use [RegionMode::Strict] to rule that out.
pub fn region_code(policy: &Policy, region: &str, mode: RegionMode) -> Result<String, NamingError> {
    if let Some(code) = policy.region_codes.get(region) {
        return Ok(code.clone());
    }

    match mode {
        RegionMode::Strict => Err(NamingError::UnmappedRegion(region.to_string())),
        RegionMode::Fallback => {
            let code: String = region.chars().take(REGION_FALLBACK_LEN).collect();
            tracing::warn!(%region, %code, "region has no region code, using prefix");
            Ok(code)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, derive_new::new)]
pub struct IdentityContext {
    pub company_code: String,
    pub environment: String,
    pub region_code: String,
    pub purpose: String,
}

impl IdentityContext {
    pub fn from_config(
        config: &EffectiveConfig,
        purpose: &str,
        policy: &Policy,
        mode: RegionMode,
    ) -> Result<Self, NamingError> {
        Ok(Self {
            company_code: config.company_code(),
            environment: config.environment(),
            region_code: region_code(policy, &config.region(), mode)?,
            purpose: purpose.to_string(),
        })
    }

    pub fn with_purpose(&self, purpose: &str) -> Self {
        Self {
            purpose: purpose.to_string(),
            ..self.clone()
        }
    }

    /// Resource name
    ///
    /// Callers keep `identifier` unique per `service` and `resource_type`, otherwise two
    /// resources end up with the same name.
    pub fn resource_name(&self, service: &str, resource_type: &str, identifier: &str) -> String {
        [
            self.company_code.as_str(),
            &self.environment,
            &self.region_code,
            service,
            resource_type,
            identifier,
        ]
        .join(SEPARATOR)
    }

    pub fn stack_name(&self) -> String {
        [
            self.company_code.as_str(),
            &self.environment,
            &self.purpose,
            "stack",
        ]
        .join(SEPARATOR)
    }

    pub fn parameter_name(&self, path: &[&str]) -> String {
        let mut name = format!("/{}/{}", self.company_code, self.environment);
        for segment in path {
            name.push('/');
            name.push_str(segment);
        }
        name
    }
}

/// Tags for every resource of an environment
///
/// Always contains the mandatory tags. `prd` adds `SLA` and `CriticalityLevel`, `dev` adds
/// `AutoShutdown` and `Purpose`. Any other environment only gets the mandatory tags.
pub fn tag_set(
    config: &EffectiveConfig,
    environment: &str,
    created_date: NaiveDate,
    policy: &Policy,
) -> TagSet {
    let mut tags = TagSet::new();
    let mut add = |key: &str, value: String| {
        tags.insert(key.to_string(), value);
    };

    add(tag::ENVIRONMENT, environment.to_string());
    add(tag::PROJECT, config.project_name());
    add(tag::OWNER, config.owner());
    add(tag::COST_CENTER, config.cost_center());
    add(tag::MANAGED_BY, config.str_or("managed_by", "cdk"));
    add(tag::CREATED_DATE, format_date(created_date, policy));
    add(
        tag::DATA_CLASSIFICATION,
        config.str_or("data_classification", "internal"),
    );

    match environment {
        policy::PRODUCTION => {
            add(tag::SLA, config.str_or("sla", "99.9"));
            add(tag::CRITICALITY_LEVEL, config.str_or("criticality", "high"));
        }
        policy::DEVELOPMENT => {
            add(tag::AUTO_SHUTDOWN, "true".to_string());
            add(tag::PURPOSE, "development".to_string());
        }
        _ => {}
    }

    tags
}

fn format_date(date: NaiveDate, policy: &Policy) -> String {
    use std::fmt::Write;

    let mut formatted = String::new();
    if write!(formatted, "{}", date.format(&policy.date_format)).is_err() {
        tracing::warn!(format=%policy.date_format, "invalid date format, using ISO 8601");
        return date.to_string();
    }
    formatted
}
