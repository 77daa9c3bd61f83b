//! deployment plan
//!
//! [Planner] runs the pipeline on a resolved configuration:
//! 1. derive the shared [IdentityContext] (fails on unmapped regions in strict mode)
//! 2. derive the tag set
//! 3. validate the tag set, any violation is fatal
//! 4. build the stack graph
//!
//! The result is either a complete [DeploymentPlan] or an error, never a partial plan.
use crate::config::{self, EffectiveConfig, MissingConfiguration};
use crate::config_documents::ConfigDocument;
use crate::graph::{DeployUnit, GraphBuilder, GraphError};
use crate::naming::{self, IdentityContext, NamingError, RegionMode};
use crate::policy::Policy;
use crate::topology::StackSpec;
use crate::validate::{self, ValidationReport};
use chrono::NaiveDate;

#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    MissingConfiguration(#[from] MissingConfiguration),
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error("{0}")]
    TagPolicyViolation(ValidationReport),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Ordered units, ready for a provisioning engine
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DeploymentPlan {
    pub environment: String,
    pub region: String,
    pub region_code: String,
    pub units: Vec<DeployUnit>,
}

impl DeploymentPlan {
    pub fn order(&self) -> Vec<&str> {
        self.units.iter().map(|unit| unit.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&DeployUnit> {
        self.units.iter().find(|unit| unit.id == id)
    }
}

pub struct Planner<'p> {
    policy: &'p Policy,
    created_date: NaiveDate,
    region_mode: RegionMode,
}

impl<'p> Planner<'p> {
    /// `created_date` ends up in the `CreatedDate` tag of every unit
    pub fn new(policy: &'p Policy, created_date: NaiveDate) -> Self {
        Self {
            policy,
            created_date,
            region_mode: RegionMode::default(),
        }
    }

    pub fn region_mode(mut self, region_mode: RegionMode) -> Self {
        self.region_mode = region_mode;
        self
    }

    pub fn plan(
        &self,
        config: &EffectiveConfig,
        specs: impl IntoIterator<Item = StackSpec>,
    ) -> Result<DeploymentPlan, PlanError> {
        let environment = config.environment();
        let identity = IdentityContext::from_config(config, "", self.policy, self.region_mode)?;

        let tags = naming::tag_set(config, &environment, self.created_date, self.policy);
        let report = ValidationReport::new(validate::validate(self.policy, &tags));
        if !report.is_compliant() {
            tracing::error!(violations = report.violations.len(), "tag policy violated");
            return Err(PlanError::TagPolicyViolation(report));
        }

        let region_code = identity.region_code.clone();
        let mut builder = GraphBuilder::new(identity, tags).with_config(config.clone());
        builder.declare_all(specs)?;
        let graph = builder.build()?;

        tracing::info!(%environment, units = graph.units().len(), "plan ready");
        Ok(DeploymentPlan {
            environment,
            region: config.region(),
            region_code,
            units: graph.into_units(),
        })
    }

    /// Resolves `defaults` and `overrides`, then plans
    pub fn plan_documents(
        &self,
        defaults: &ConfigDocument,
        overrides: &ConfigDocument,
        specs: impl IntoIterator<Item = StackSpec>,
    ) -> Result<DeploymentPlan, PlanError> {
        let config = config::resolve(defaults, overrides)?;
        self.plan(&config, specs)
    }
}
