//! # stackplan - deployment planning for serverless stacks
//!
//! ## Introduction for developers
//!
//! Read this to understand how `stackplan` works internally.
//!
//! A deployment run resolves configuration once, builds one graph and terminates. Nothing is
//! provisioned here, the output is a plan that a provisioning engine consumes.
//!
//! ### Loading configuration
//!
//! Configuration comes as two documents: defaults and environment-specific overrides. Each is
//! loaded into a [config_documents::ConfigDocument], a flat, ordered map of [value::Value]s.
//! Documents may be written in HCL, YAML or JSON, the format is picked by file extension.
//!
//! ```text
//! config/
//!   defaults.yaml
//!   environments/
//!     dev.yaml
//!     prd.hcl
//! ```
//!
//! HCL documents are evaluated (no variables or functions are available), so expressions
//! like `memory = 256 * 2` are fine. Blocks are not allowed in configuration documents.
//!
//! ### Resolving
//!
//! see [config::resolve]
//!
//! The override document wins on every key collision, the merge is shallow. Afterwards all
//! [config::REQUIRED_KEYS] must be present, otherwise resolution fails with
//! [config::MissingConfiguration].
//!
//! ### Naming and tagging
//!
//! see [naming]
//!
//! All names derive from an [naming::IdentityContext] (company code, environment, region
//! code, purpose). Region codes come from the [policy::Policy] region table. Tags are derived
//! once per environment and checked by [validate::validate] before anything else happens.
//!
//! ### Topology
//!
//! Stacks and their dependencies are declared in a topology document:
//!
//! ```hcl
//! stack "layer" {
//!   kind = "layer"
//! }
//!
//! stack "compute" {
//!   kind       = "compute"
//!   depends_on = ["layer"]
//! }
//! ```
//!
//! see [topology::Topology]. Without a topology document the reference chain
//! [topology::Topology::reference] is used.
//!
//! ### Building the graph
//!
//! see [graph::GraphBuilder]
//!
//! Declared specs are resolved into [graph::DeployUnit]s (names, parameters, tags, and the
//! settings each kind reads from the configuration) and ordered with a single depth-first pass
//! that marks each unit as in progress or done. Reaching a unit that is still in progress means
//! there is a cycle, which is reported with its full path.
//!
//! ### Planning
//!
//! [plan::Planner] ties the steps together. Any error aborts the run, there is no partial
//! plan.
//!
//! ### Authorizer
//!
//! [authorizer] is consulted at request time, not at deployment time. It turns a bearer
//! token into a gateway policy document and collapses every failure into
//! [authorizer::Unauthorized].
//!
pub mod authorizer;
pub mod config;
pub mod config_documents;
pub mod graph;
pub mod naming;
pub mod plan;
pub mod policy;
pub mod topology;
pub mod validate;
pub mod value;
