//! stack graph
//!
//! [GraphBuilder] turns declared [StackSpec]s into [DeployUnit]s and orders them so that
//! every unit comes after all units it depends on.
//!
//! Each unit moves forward through [UnitState] exactly once:
//! - `Declared`: the spec was accepted by [GraphBuilder::declare]
//! - `Resolved`: identity, names and tags are attached
//! - `Ordered`: the unit has its position in the deployment order
//!
//! Building is all-or-nothing, any [GraphError] aborts it. The graph does not assume a
//! fixed shape, the reference chain (`layer` → `compute` → `edge-proxy`) is just one
//! topology among others.
//!
//! A unit whose `purpose` input differs from its kind's default purpose carries that purpose
//! in every resource identifier and parameter path, so several units of one kind can live in
//! the same plan. Units with the default purpose keep the plain names.
//!
//! Unit inputs start from the configuration settings its kind consumes (with their defaults)
//! and are overridden by the inputs declared in the topology.
use crate::config::EffectiveConfig;
use crate::naming::{IdentityContext, TagSet};
use crate::topology::{StackKind, StackSpec};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Input overriding [StackKind::default_purpose]
pub const PURPOSE_INPUT: &str = "purpose";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Declared,
    Resolved,
    Ordered,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Stack {0} is declared more than once")]
    DuplicateStack(String),
    #[error("Stack {stack} depends on unknown stack {dependency}")]
    UnknownDependency { stack: String, dependency: String },
    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
    #[error("Name {name} is used by both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DeployUnit {
    pub id: String,
    pub kind: StackKind,
    pub stack_name: String,
    pub identity: IdentityContext,
    /// logical id → physical resource name
    pub resource_names: IndexMap<String, String>,
    /// logical id → parameter store path
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, String>,
    pub tags: TagSet,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, Value>,
    pub depends_on: Vec<String>,
    #[serde(skip)]
    state: UnitState,
}

impl DeployUnit {
    pub fn state(&self) -> UnitState {
        self.state
    }

    fn advance(&mut self, next: UnitState) {
        debug_assert!(next > self.state, "{:?} -> {:?}", self.state, next);
        tracing::trace!(unit = %self.id, from = ?self.state, to = ?next, "state change");
        self.state = next;
    }
}

#[derive(Debug)]
enum Node {
    Declared(StackSpec),
    Resolved(DeployUnit),
}

pub struct GraphBuilder {
    identity: IdentityContext,
    tags: TagSet,
    config: Option<EffectiveConfig>,
    nodes: Vec<Node>,
}

impl GraphBuilder {
    /// `identity` is shared by all units, only its purpose changes per unit
    pub fn new(identity: IdentityContext, tags: TagSet) -> Self {
        Self {
            identity,
            tags,
            config: None,
            nodes: vec![],
        }
    }

    /// Source of the settings each kind consumes, without it only defaults apply
    pub fn with_config(mut self, config: EffectiveConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn declare(&mut self, spec: StackSpec) -> Result<&mut Self, GraphError> {
        if self.position(&spec.id).is_some() {
            return Err(GraphError::DuplicateStack(spec.id));
        }

        tracing::debug!(stack = %spec.id, kind = %spec.kind, "declared");
        self.nodes.push(Node::Declared(spec));
        Ok(self)
    }

    pub fn declare_all(
        &mut self,
        specs: impl IntoIterator<Item = StackSpec>,
    ) -> Result<&mut Self, GraphError> {
        for spec in specs {
            self.declare(spec)?;
        }
        Ok(self)
    }

    pub fn state(&self, id: &str) -> Option<UnitState> {
        self.position(id).map(|index| match &self.nodes[index] {
            Node::Declared(_) => UnitState::Declared,
            Node::Resolved(unit) => unit.state(),
        })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| match node {
            Node::Declared(spec) => spec.id == id,
            Node::Resolved(unit) => unit.id == id,
        })
    }

    /// Attaches identity, names and tags to every declared unit
    pub fn resolve(&mut self) {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .map(|node| match node {
                Node::Declared(spec) => Node::Resolved(self.resolve_unit(spec)),
                resolved => resolved,
            })
            .collect();
    }

    fn resolve_unit(&self, spec: StackSpec) -> DeployUnit {
        let purpose = spec
            .inputs
            .get(PURPOSE_INPUT)
            .map(ToString::to_string)
            .unwrap_or_else(|| spec.kind.default_purpose().to_string());
        let identity = self.identity.with_purpose(&purpose);
        let qualifier = (purpose != spec.kind.default_purpose()).then_some(purpose.as_str());

        let resource_names = catalogue::resources(spec.kind)
            .iter()
            .map(|resource| {
                let identifier = match qualifier {
                    Some(qualifier) => format!("{}-{qualifier}", resource.identifier),
                    None => resource.identifier.to_string(),
                };
                (
                    resource.logical_id.to_string(),
                    identity.resource_name(resource.service, resource.resource_type, &identifier),
                )
            })
            .collect();

        let parameters = catalogue::parameters(spec.kind)
            .iter()
            .map(|parameter| {
                let mut path: Vec<&str> = qualifier.into_iter().collect();
                path.extend_from_slice(parameter.path);
                (
                    parameter.logical_id.to_string(),
                    identity.parameter_name(&path),
                )
            })
            .collect();

        let mut inputs = self.settings(spec.kind);
        inputs.extend(spec.inputs);

        let mut unit = DeployUnit {
            stack_name: identity.stack_name(),
            id: spec.id,
            kind: spec.kind,
            identity,
            resource_names,
            parameters,
            tags: self.tags.clone(),
            inputs,
            depends_on: spec.depends_on,
            state: UnitState::Declared,
        };
        unit.advance(UnitState::Resolved);
        unit
    }

    fn settings(&self, kind: StackKind) -> IndexMap<String, Value> {
        catalogue::settings(kind)
            .iter()
            .filter_map(|setting| {
                let value = self
                    .config
                    .as_ref()
                    .and_then(|config| config.lookup(setting.path))
                    .cloned()
                    .or_else(|| setting.default.map(Value::Integer))?;
                Some((setting.input.to_string(), value))
            })
            .collect()
    }

    pub fn build(mut self) -> Result<StackGraph, GraphError> {
        self.resolve();

        let units: Vec<DeployUnit> = self
            .nodes
            .into_iter()
            .filter_map(|node| match node {
                Node::Resolved(unit) => Some(unit),
                Node::Declared(_) => None,
            })
            .collect();

        check_dependencies(&units)?;
        let order = order(&units)?;
        check_names(&units)?;

        let mut slots: Vec<Option<DeployUnit>> = units.into_iter().map(Some).collect();
        let units = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .map(|mut unit| {
                unit.advance(UnitState::Ordered);
                unit
            })
            .collect();

        Ok(StackGraph { units })
    }
}

fn check_dependencies(units: &[DeployUnit]) -> Result<(), GraphError> {
    for unit in units {
        for dependency in &unit.depends_on {
            if !units.iter().any(|other| &other.id == dependency) {
                return Err(GraphError::UnknownDependency {
                    stack: unit.id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first post-order over the dependency edges
///
/// Roots and dependencies are visited in declaration order, so independent units keep the
/// order they were declared in. Meeting an in-progress unit again means there is a cycle,
/// it is reported as the path from that unit back to itself.
fn order(units: &[DeployUnit]) -> Result<Vec<usize>, GraphError> {
    let index: HashMap<&str, usize> = units
        .iter()
        .enumerate()
        .map(|(i, unit)| (unit.id.as_str(), i))
        .collect();

    let mut marks = vec![Mark::Unvisited; units.len()];
    let mut order = Vec::with_capacity(units.len());

    for root in 0..units.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        marks[root] = Mark::InProgress;
        let mut stack = vec![(root, 0usize)];

        while let Some(&(current, cursor)) = stack.last() {
            let Some(dependency) = units[current].depends_on.get(cursor) else {
                marks[current] = Mark::Done;
                order.push(current);
                stack.pop();
                continue;
            };

            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let Some(&next) = index.get(dependency.as_str()) else {
                return Err(GraphError::UnknownDependency {
                    stack: units[current].id.clone(),
                    dependency: dependency.clone(),
                });
            };

            match marks[next] {
                Mark::Done => {}
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    stack.push((next, 0));
                }
                Mark::InProgress => {
                    let start = stack.iter().position(|(i, _)| *i == next).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..]
                        .iter()
                        .map(|(i, _)| units[*i].id.clone())
                        .collect();
                    cycle.push(units[next].id.clone());
                    return Err(GraphError::CyclicDependency { cycle });
                }
            }
        }
    }

    tracing::debug!(
        order = ?order.iter().map(|i| units[*i].id.as_str()).collect::<Vec<_>>(),
        "deployment order"
    );
    Ok(order)
}

/// Resource names and parameter paths are external identifiers and must be unique
fn check_names(units: &[DeployUnit]) -> Result<(), GraphError> {
    let mut seen: HashMap<&str, String> = HashMap::new();

    for unit in units {
        let names = unit.resource_names.iter().chain(unit.parameters.iter());
        for (logical_id, name) in names {
            let owner = format!("{}/{}", unit.id, logical_id);
            if let Some(first) = seen.insert(name.as_str(), owner.clone()) {
                return Err(GraphError::NameCollision {
                    name: name.clone(),
                    first,
                    second: owner,
                });
            }
        }
    }

    Ok(())
}

/// Dependency-ordered deployable units
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct StackGraph {
    units: Vec<DeployUnit>,
}

impl StackGraph {
    /// Units in deployment order
    pub fn units(&self) -> &[DeployUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<DeployUnit> {
        self.units
    }

    pub fn order(&self) -> Vec<&str> {
        self.units.iter().map(|unit| unit.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&DeployUnit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Units that directly depend on `id`
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.units
            .iter()
            .filter(|unit| unit.depends_on.iter().any(|dependency| dependency == id))
            .map(|unit| unit.id.as_str())
            .collect()
    }
}

/// Resources and parameters each [StackKind] provisions
mod catalogue {
    use crate::topology::StackKind;

    pub(super) struct Resource {
        pub logical_id: &'static str,
        pub service: &'static str,
        pub resource_type: &'static str,
        pub identifier: &'static str,
    }

    pub(super) struct Parameter {
        pub logical_id: &'static str,
        pub path: &'static [&'static str],
    }

    /// Configuration value copied into the unit's inputs
    pub(super) struct Setting {
        pub input: &'static str,
        pub path: &'static [&'static str],
        pub default: Option<i64>,
    }

    const fn resource(
        logical_id: &'static str,
        service: &'static str,
        resource_type: &'static str,
        identifier: &'static str,
    ) -> Resource {
        Resource {
            logical_id,
            service,
            resource_type,
            identifier,
        }
    }

    const LAYER: &[Resource] = &[resource("CommonLayer", "common", "layer", "utils")];

    const COMPUTE: &[Resource] = &[
        resource("LambdaExecutionRole", "lambda", "role", "execution"),
        resource("AuthorizerFunction", "auth", "fn", "authorizer"),
        resource("ApiGateway", "main", "api", "gateway"),
        resource("ApiHandlerFunction", "api", "fn", "handler"),
    ];

    const EDGE_PROXY: &[Resource] = &[
        resource("TraefikVpc", "traefik", "vpc", "main"),
        resource("TraefikCluster", "traefik", "cluster", "main"),
        resource("TraefikTaskDef", "traefik", "task", "proxy"),
        resource("TraefikLogs", "traefik", "logs", "main"),
        resource("TraefikService", "traefik", "service", "proxy"),
    ];

    const fn setting(
        input: &'static str,
        path: &'static [&'static str],
        default: Option<i64>,
    ) -> Setting {
        Setting {
            input,
            path,
            default,
        }
    }

    const COMPUTE_SETTINGS: &[Setting] = &[
        setting("timeout_seconds", &["lambda", "timeout_seconds"], None),
        setting("memory_size", &["lambda", "memory_size"], None),
        setting("log_retention_days", &["lambda", "log_retention_days"], None),
        setting("allowed_origins", &["security", "allowed_origins"], None),
        setting("throttle_rate_limit", &["api_gateway", "throttle_rate_limit"], None),
        setting("throttle_burst_limit", &["api_gateway", "throttle_burst_limit"], None),
    ];

    const EDGE_PROXY_SETTINGS: &[Setting] = &[
        setting("memory", &["traefik", "memory"], Some(512)),
        setting("cpu", &["traefik", "cpu"], Some(256)),
        setting("desired_count", &["traefik", "desired_count"], Some(2)),
        setting("min_capacity", &["traefik", "min_capacity"], Some(1)),
        setting("max_capacity", &["traefik", "max_capacity"], Some(10)),
        setting("domain_name", &["domain_name"], None),
    ];

    pub(super) fn settings(kind: StackKind) -> &'static [Setting] {
        match kind {
            StackKind::Layer => &[],
            StackKind::Compute => COMPUTE_SETTINGS,
            StackKind::EdgeProxy => EDGE_PROXY_SETTINGS,
        }
    }

    pub(super) fn resources(kind: StackKind) -> &'static [Resource] {
        match kind {
            StackKind::Layer => LAYER,
            StackKind::Compute => COMPUTE,
            StackKind::EdgeProxy => EDGE_PROXY,
        }
    }

    pub(super) fn parameters(kind: StackKind) -> &'static [Parameter] {
        match kind {
            StackKind::Layer => &[Parameter {
                logical_id: "CommonLayerArnParameter",
                path: &["lambda", "layers", "common", "arn"],
            }],
            StackKind::Compute => &[],
            StackKind::EdgeProxy => &[Parameter {
                logical_id: "TraefikUrlParameter",
                path: &["traefik", "url"],
            }],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder() -> GraphBuilder {
        let identity = IdentityContext::new(
            "acme".to_string(),
            "dev".to_string(),
            "use1".to_string(),
            String::new(),
        );
        let tags: TagSet = [("Environment".to_string(), "dev".to_string())]
            .into_iter()
            .collect();
        GraphBuilder::new(identity, tags)
    }

    fn spec(id: &str, kind: StackKind, depends_on: &[&str]) -> StackSpec {
        depends_on
            .iter()
            .fold(StackSpec::new(id.to_string(), kind), |spec, dependency| {
                spec.with_dependency(*dependency)
            })
    }

    fn build(specs: Vec<StackSpec>) -> Result<StackGraph, GraphError> {
        let mut builder = builder();
        builder.declare_all(specs)?;
        builder.build()
    }

    #[test]
    fn chain_is_emitted_in_dependency_order() {
        let graph = build(vec![
            spec("a", StackKind::Layer, &[]),
            spec("b", StackKind::Compute, &["a"]),
            spec("c", StackKind::EdgeProxy, &["b"]),
        ])
        .expect("acyclic");

        assert_eq!(graph.order(), ["a", "b", "c"]);
    }

    #[test]
    fn dependencies_come_first_regardless_of_declaration_order() {
        let graph = build(vec![
            spec("proxy", StackKind::EdgeProxy, &["compute"]),
            spec("compute", StackKind::Compute, &["layer"]),
            spec("layer", StackKind::Layer, &[]),
        ])
        .expect("acyclic");

        assert_eq!(graph.order(), ["layer", "compute", "proxy"]);
    }

    #[test]
    fn independent_units_keep_declaration_order() {
        let graph = build(vec![
            spec("z", StackKind::Layer, &[]),
            spec("compute", StackKind::Compute, &["z", "y"]),
            spec("y", StackKind::EdgeProxy, &[]),
        ])
        .expect("acyclic");

        assert_eq!(graph.order(), ["z", "y", "compute"]);
    }

    #[test]
    fn shared_dependency() {
        let graph = build(vec![
            spec("proxy", StackKind::EdgeProxy, &["compute", "layer"]),
            spec("compute", StackKind::Compute, &["layer"]),
            spec("layer", StackKind::Layer, &[]),
        ])
        .expect("acyclic");

        assert_eq!(graph.order(), ["layer", "compute", "proxy"]);
        assert_eq!(graph.dependents("layer"), ["compute", "proxy"]);
    }

    #[test]
    fn same_kind_with_distinct_purposes() {
        let graph = build(vec![
            spec("layer", StackKind::Layer, &[]),
            spec("api", StackKind::Compute, &["layer"]).with_input("purpose", "api"),
            spec("worker", StackKind::Compute, &["layer"]).with_input("purpose", "worker"),
        ])
        .expect("distinct names");

        let api = graph.get("api").expect("api unit");
        let worker = graph.get("worker").expect("worker unit");
        assert_eq!(api.stack_name, "acme-dev-api-stack");
        assert_eq!(
            api.resource_names["LambdaExecutionRole"],
            "acme-dev-use1-lambda-role-execution-api"
        );
        assert_eq!(
            worker.resource_names["LambdaExecutionRole"],
            "acme-dev-use1-lambda-role-execution-worker"
        );
    }

    #[test]
    fn purpose_qualifies_parameter_paths() {
        let graph = build(vec![
            spec("layer", StackKind::Layer, &[]),
            spec("shared", StackKind::Layer, &[]).with_input("purpose", "shared"),
        ])
        .expect("distinct names");

        assert_eq!(
            graph.get("layer").expect("layer unit").parameters["CommonLayerArnParameter"],
            "/acme/dev/lambda/layers/common/arn"
        );
        assert_eq!(
            graph.get("shared").expect("shared unit").parameters["CommonLayerArnParameter"],
            "/acme/dev/shared/lambda/layers/common/arn"
        );
    }

    #[test]
    fn same_kind_and_purpose_collides() {
        let err = build(vec![
            spec("left", StackKind::Compute, &[]),
            spec("right", StackKind::Compute, &[]).with_input("purpose", "lambda"),
        ])
        .expect_err("collision");

        assert_eq!(
            err,
            GraphError::NameCollision {
                name: "acme-dev-use1-lambda-role-execution".to_string(),
                first: "left/LambdaExecutionRole".to_string(),
                second: "right/LambdaExecutionRole".to_string(),
            }
        );
    }

    fn config(overrides: crate::config_documents::ConfigDocument) -> EffectiveConfig {
        crate::config::resolve(&crate::config::test::required_defaults(), &overrides)
            .expect("valid config")
    }

    fn object(entries: &[(&str, Value)]) -> Value {
        Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        )
    }

    #[test]
    fn settings_come_from_configuration() {
        let config = config(crate::config_document! {
            "lambda" => object(&[("memory_size", Value::Integer(512)), ("timeout_seconds", Value::Integer(30))]),
            "traefik" => object(&[("desired_count", Value::Integer(3))]),
            "domain_name" => "example.com",
        });
        let mut builder = builder().with_config(config);
        builder
            .declare_all(vec![
                spec("layer", StackKind::Layer, &[]),
                spec("compute", StackKind::Compute, &["layer"]),
                spec("proxy", StackKind::EdgeProxy, &["compute"]),
            ])
            .expect("declared");
        let graph = builder.build().expect("acyclic");

        assert!(graph.get("layer").expect("layer unit").inputs.is_empty());

        let compute = &graph.get("compute").expect("compute unit").inputs;
        assert_eq!(
            compute.iter().collect::<Vec<_>>(),
            [
                (&"timeout_seconds".to_string(), &Value::Integer(30)),
                (&"memory_size".to_string(), &Value::Integer(512)),
            ]
        );

        let proxy = &graph.get("proxy").expect("proxy unit").inputs;
        assert_eq!(proxy["memory"], Value::Integer(512));
        assert_eq!(proxy["cpu"], Value::Integer(256));
        assert_eq!(proxy["desired_count"], Value::Integer(3));
        assert_eq!(proxy["min_capacity"], Value::Integer(1));
        assert_eq!(proxy["max_capacity"], Value::Integer(10));
        assert_eq!(proxy["domain_name"], Value::from("example.com"));
    }

    #[test]
    fn topology_inputs_override_settings() {
        let config = config(crate::config_document! {
            "traefik" => object(&[("cpu", Value::Integer(1024))]),
        });
        let mut builder = builder().with_config(config);
        builder
            .declare(spec("proxy", StackKind::EdgeProxy, &[]).with_input("cpu", 2048i64))
            .expect("declared");
        let graph = builder.build().expect("acyclic");

        let proxy = &graph.get("proxy").expect("proxy unit").inputs;
        assert_eq!(proxy["cpu"], Value::Integer(2048));
        assert_eq!(proxy.get_index_of("cpu"), Some(1));
        assert!(!proxy.contains_key("domain_name"));
    }

    #[test]
    fn two_node_cycle() {
        let err = build(vec![
            spec("a", StackKind::Layer, &["b"]),
            spec("b", StackKind::Compute, &["a"]),
        ])
        .expect_err("cyclic");

        assert_eq!(
            err,
            GraphError::CyclicDependency {
                cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()]
            }
        );
        assert_eq!(err.to_string(), "Cyclic dependency: a -> b -> a");
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = build(vec![spec("a", StackKind::Layer, &["a"])]).expect_err("cyclic");
        assert_eq!(
            err,
            GraphError::CyclicDependency {
                cycle: vec!["a".to_string(), "a".to_string()]
            }
        );
    }

    #[test]
    fn cycle_behind_acyclic_prefix() {
        let err = build(vec![
            spec("layer", StackKind::Layer, &[]),
            spec("a", StackKind::Compute, &["layer", "c"]),
            spec("b", StackKind::EdgeProxy, &["a"]),
            spec("c", StackKind::EdgeProxy, &["b"]),
        ])
        .expect_err("cyclic");

        assert_eq!(
            err,
            GraphError::CyclicDependency {
                cycle: ["a", "c", "b", "a"].map(String::from).to_vec()
            }
        );
    }

    #[test]
    fn unknown_dependency() {
        let err = build(vec![spec("a", StackKind::Compute, &["missing"])]).expect_err("unknown");
        assert_eq!(
            err,
            GraphError::UnknownDependency {
                stack: "a".to_string(),
                dependency: "missing".to_string()
            }
        );
    }

    #[test]
    fn duplicate_stack() {
        let mut builder = builder();
        builder
            .declare(spec("a", StackKind::Layer, &[]))
            .expect("first declaration");
        let err = builder
            .declare(spec("a", StackKind::Compute, &[]))
            .err();
        assert_eq!(err, Some(GraphError::DuplicateStack("a".to_string())));
    }

    #[test]
    fn state_moves_forward() {
        let mut builder = builder();
        builder
            .declare(spec("layer", StackKind::Layer, &[]))
            .expect("declared");
        assert_eq!(builder.state("layer"), Some(UnitState::Declared));

        builder.resolve();
        assert_eq!(builder.state("layer"), Some(UnitState::Resolved));
        assert_eq!(builder.state("missing"), None);

        let graph = builder.build().expect("acyclic");
        assert!(graph
            .units()
            .iter()
            .all(|unit| unit.state() == UnitState::Ordered));
    }

    #[test]
    fn units_carry_names_and_tags() {
        let graph = build(vec![
            spec("layer", StackKind::Layer, &[]),
            spec("compute", StackKind::Compute, &["layer"]).with_input("purpose", "api"),
        ])
        .expect("acyclic");

        let layer = graph.get("layer").expect("layer unit");
        assert_eq!(layer.stack_name, "acme-dev-layer-stack");
        assert_eq!(
            layer.resource_names["CommonLayer"],
            "acme-dev-use1-common-layer-utils"
        );
        assert_eq!(
            layer.parameters["CommonLayerArnParameter"],
            "/acme/dev/lambda/layers/common/arn"
        );
        assert_eq!(layer.tags["Environment"], "dev");

        let compute = graph.get("compute").expect("compute unit");
        assert_eq!(compute.stack_name, "acme-dev-api-stack");
        assert_eq!(compute.identity.purpose, "api");
        assert_eq!(
            compute.resource_names["AuthorizerFunction"],
            "acme-dev-use1-auth-fn-authorizer-api"
        );
        assert_eq!(
            compute.resource_names.keys().collect::<Vec<_>>(),
            [
                "LambdaExecutionRole",
                "AuthorizerFunction",
                "ApiGateway",
                "ApiHandlerFunction"
            ]
        );
        assert_eq!(graph.dependents("layer"), ["compute"]);
    }

    #[test]
    fn building_is_deterministic() {
        let specs = || {
            vec![
                spec("layer", StackKind::Layer, &[]),
                spec("compute", StackKind::Compute, &["layer"]),
                spec("edge-proxy", StackKind::EdgeProxy, &["compute"]),
            ]
        };
        assert_eq!(build(specs()), build(specs()));
    }
}
