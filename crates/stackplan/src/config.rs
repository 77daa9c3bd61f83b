//! effective configuration
//!
//! [resolve] merges a defaults document with an environment-specific override document.
//! The merge is shallow: every key in the overrides replaces the same key in the defaults,
//! keys only present in the defaults pass through unchanged. Nested objects are replaced as a
//! whole, never merged.
//!
//! Once merged, every key in [REQUIRED_KEYS] must be present. Resolution fails closed
//! otherwise, before any naming or tagging happens.
use crate::config_documents::ConfigDocument;
use crate::value::Value;
use indexmap::IndexMap;

pub const COMPANY_CODE: &str = "company_code";
pub const REGION: &str = "region";
pub const ENVIRONMENT: &str = "environment";
pub const PROJECT_NAME: &str = "project_name";
pub const OWNER: &str = "owner";
pub const COST_CENTER: &str = "cost_center";

/// Keys every downstream component dereferences
pub const REQUIRED_KEYS: [&str; 6] = [
    COMPANY_CODE,
    REGION,
    ENVIRONMENT,
    PROJECT_NAME,
    OWNER,
    COST_CENTER,
];

/// Merged configuration, guaranteed to hold all [REQUIRED_KEYS]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct EffectiveConfig {
    values: IndexMap<String, Value>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing configuration: {}", .missing.join(", "))]
pub struct MissingConfiguration {
    pub missing: Vec<String>,
}

pub fn resolve(
    defaults: &ConfigDocument,
    overrides: &ConfigDocument,
) -> Result<EffectiveConfig, MissingConfiguration> {
    let mut values: IndexMap<String, Value> = defaults
        .entries()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for (key, value) in overrides.entries() {
        if let Some(previous) = values.insert(key.clone(), value.clone()) {
            tracing::debug!(%key, %previous, %value, "override");
        }
    }

    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !values.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(MissingConfiguration { missing });
    }

    Ok(EffectiveConfig { values })
}

impl EffectiveConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Value nested in objects, `["lambda", "memory_size"]` reads `lambda.memory_size`
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.values.get(*first)?, |value, key| match value {
                Value::Object(object) => object.get(*key),
                _ => None,
            })
    }

    /// String form of `key`, or `default` when absent
    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .map(ToString::to_string)
            .unwrap_or_else(|| default.to_string())
    }

    /// String form of a key from [REQUIRED_KEYS]
    fn required(&self, key: &'static str) -> String {
        debug_assert!(REQUIRED_KEYS.contains(&key));
        self.str_or(key, "")
    }

    pub fn company_code(&self) -> String {
        self.required(COMPANY_CODE)
    }

    pub fn region(&self) -> String {
        self.required(REGION)
    }

    pub fn environment(&self) -> String {
        self.required(ENVIRONMENT)
    }

    pub fn project_name(&self) -> String {
        self.required(PROJECT_NAME)
    }

    pub fn owner(&self) -> String {
        self.required(OWNER)
    }

    pub fn cost_center(&self) -> String {
        self.required(COST_CENTER)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::config_document;
    use pretty_assertions::assert_eq;

    pub(crate) fn required_defaults() -> ConfigDocument {
        config_document! {
            "company_code" => "acme",
            "region" => "us-east-1",
            "environment" => "dev",
            "project_name" => "lambda-monorepo",
            "owner" => "platform-team",
            "cost_center" => "ENG-001",
        }
    }

    #[test]
    fn disjoint_documents_are_unioned() {
        let defaults = required_defaults();
        let overrides = config_document! {"sla" => "99.95", "memory_size" => 512i64};

        let config = resolve(&defaults, &overrides).expect("valid config");

        assert_eq!(config.len(), defaults.len() + overrides.len());
        for (key, value) in defaults.entries().chain(overrides.entries()) {
            assert_eq!(config.get(key), Some(value));
        }
    }

    #[test]
    fn overrides_win() {
        let overrides = config_document! {"environment" => "prd", "region" => "eu-west-1"};

        let config = resolve(&required_defaults(), &overrides).expect("valid config");

        assert_eq!(config.environment(), "prd");
        assert_eq!(config.region(), "eu-west-1");
        assert_eq!(config.company_code(), "acme");
    }

    #[test]
    fn nested_objects_are_replaced_not_merged() {
        let mut defaults = required_defaults();
        defaults.insert(
            "lambda",
            Value::Object(
                [
                    ("memory_size".to_string(), Value::Integer(256)),
                    ("timeout_seconds".to_string(), Value::Integer(30)),
                ]
                .into_iter()
                .collect(),
            ),
        );
        let overrides = config_document! {
            "lambda" => Value::Object([("memory_size".to_string(), Value::Integer(1024))].into_iter().collect()),
        };

        let config = resolve(&defaults, &overrides).expect("valid config");

        assert_eq!(config.get("lambda"), overrides.get("lambda"));
    }

    #[test]
    fn overrides_alone_may_satisfy_required_keys() {
        let config = resolve(&ConfigDocument::default(), &required_defaults());
        assert!(config.is_ok());
    }

    #[test]
    fn missing_keys_fail_closed() {
        let defaults = config_document! {"company_code" => "acme", "region" => "us-east-1"};

        let err = resolve(&defaults, &config_document! {"owner" => "platform-team"})
            .expect_err("must error");

        assert_eq!(
            err.missing,
            ["environment", "project_name", "cost_center"]
        );
        assert_eq!(
            err.to_string(),
            "Missing configuration: environment, project_name, cost_center"
        );
    }

    #[test]
    fn nested_lookup() {
        let overrides = config_document! {
            "lambda" => Value::Object([("memory_size".to_string(), Value::Integer(1024))].into_iter().collect()),
        };
        let config = resolve(&required_defaults(), &overrides).expect("valid config");

        assert_eq!(
            config.lookup(&["lambda", "memory_size"]),
            Some(&Value::Integer(1024))
        );
        assert_eq!(config.lookup(&["lambda", "timeout_seconds"]), None);
        assert_eq!(config.lookup(&["owner", "name"]), None);
        assert_eq!(config.lookup(&["owner"]), Some(&Value::from("platform-team")));
        assert_eq!(config.lookup(&[]), None);
    }

    #[test]
    fn non_string_values_are_coerced() {
        let overrides = config_document! {"cost_center" => 4711i64};
        let config = resolve(&required_defaults(), &overrides).expect("valid config");
        assert_eq!(config.cost_center(), "4711");
        assert_eq!(config.str_or("sla", "99.9"), "99.9");
    }
}
