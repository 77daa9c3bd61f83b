//! stack topology documents
//!
//! A topology declares the deployable units ("stacks") of a deployment, in order, together
//! with the ids of the stacks each one depends on.
//!
//! ```hcl
//! stack "layer" {
//!   kind = "layer"
//! }
//!
//! stack "compute" {
//!   kind       = "compute"
//!   depends_on = ["layer"]
//!   purpose    = "api"
//! }
//! ```
//!
//! - the single block label is the stack id
//! - `kind` is one of [StackKind]
//! - `depends_on` is an optional list of stack ids
//! - every other attribute is an input of the stack and ends up in the plan unchanged
//!
//! YAML and JSON topologies are a list of `{id, kind, depends_on, inputs}` mappings.
//!
//! Parsing does not stop at the first problem, all [Issue]s of a document are collected
//! into [TopologyErrors]. Whether dependencies exist or form a cycle is checked later by the
//! [crate::graph] builder.
use crate::config_documents::{Format, LoadError};
use crate::value::Value;
use hcl::eval::Evaluate;
use hcl_edit::structure::{Body, Structure};
use indexmap::IndexMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StackKind {
    /// Shared code layer
    Layer,
    /// Functions, their role and the api gateway in front of them
    Compute,
    /// Reverse proxy in front of the api gateway
    EdgeProxy,
}

impl StackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackKind::Layer => "layer",
            StackKind::Compute => "compute",
            StackKind::EdgeProxy => "edge-proxy",
        }
    }

    /// Purpose used in the stack name unless overridden by a `purpose` input
    pub fn default_purpose(&self) -> &'static str {
        match self {
            StackKind::Layer => "layer",
            StackKind::Compute => "lambda",
            StackKind::EdgeProxy => "traefik",
        }
    }
}

impl std::fmt::Display for StackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layer" => Ok(StackKind::Layer),
            "compute" => Ok(StackKind::Compute),
            "edge-proxy" => Ok(StackKind::EdgeProxy),
            _ => Err(s.to_string()),
        }
    }
}

/// A declared stack, before any name or tag is attached
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct StackSpec {
    pub id: String,
    pub kind: StackKind,
    #[new(default)]
    pub inputs: IndexMap<String, Value>,
    #[new(default)]
    pub depends_on: Vec<String>,
}

impl StackSpec {
    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.depends_on.push(id.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Topology {
    specs: Vec<StackSpec>,
}

impl Topology {
    /// `layer` → `compute` → `edge-proxy`
    pub fn reference() -> Self {
        Self {
            specs: vec![
                StackSpec::new("layer".to_string(), StackKind::Layer),
                StackSpec::new("compute".to_string(), StackKind::Compute).with_dependency("layer"),
                StackSpec::new("edge-proxy".to_string(), StackKind::EdgeProxy)
                    .with_dependency("compute"),
            ],
        }
    }

    pub fn specs(&self) -> &[StackSpec] {
        &self.specs
    }

    pub fn into_specs(self) -> Vec<StackSpec> {
        self.specs
    }

    fn push(&mut self, spec: StackSpec, e: &mut TopologyErrors) {
        if self.specs.iter().any(|existing| existing.id == spec.id) {
            e.log(Issue::StackIdCollision(spec.id));
            return;
        }

        self.specs.push(spec);
    }
}

impl Topology {
    pub fn from_hcl_body(body: &Body) -> Result<Self, TopologyErrors> {
        let mut topology = Self::default();
        let mut e = TopologyErrors::new();
        let context = hcl::eval::Context::new();

        for (index, structure) in body.iter().enumerate() {
            let block = match structure {
                Structure::Attribute(attribute) => {
                    e.log(Issue::RootAttribute(
                        attribute.key.value().as_str().to_string(),
                    ));
                    continue;
                }
                Structure::Block(block) => block,
            };

            let ident = block.ident.value().as_str();
            if ident != "stack" {
                e.log(Issue::UnknownBlockType(ident.to_string()));
                continue;
            }

            let id = match block.labels.as_slice() {
                [] => {
                    e.log(Issue::StackLabelMissing(index));
                    continue;
                }
                [label] => label.as_str().to_string(),
                [label, ..] => {
                    e.log(Issue::StackTooManyLabels(label.as_str().to_string()));
                    continue;
                }
            };

            for nested in block.body.blocks() {
                e.log(Issue::NestedBlock {
                    stack: id.clone(),
                    ident: nested.ident.value().as_str().to_string(),
                });
            }

            let mut kind = None;
            let mut inputs = IndexMap::new();
            let mut depends_on = vec![];

            for attribute in block.body.attributes() {
                let key = attribute.key.value().as_str();
                let expression: hcl::Expression = attribute.value.clone().into();
                let value = expression
                    .evaluate(&context)
                    .map_err(|errors| errors.to_string())
                    .and_then(|value| Value::try_from(value).map_err(|err| err.to_string()));

                let value = match value {
                    Ok(value) => value,
                    Err(message) => {
                        e.log(Issue::InvalidAttribute {
                            stack: id.clone(),
                            key: key.to_string(),
                            message,
                        });
                        continue;
                    }
                };

                match key {
                    "kind" => kind = Some(parse_kind(&id, &value, &mut e)),
                    "depends_on" => depends_on = parse_depends_on(&id, &value, &mut e),
                    _ => {
                        inputs.insert(key.to_string(), value);
                    }
                }
            }

            let kind = match kind {
                Some(Some(kind)) => kind,
                // unknown kind, already logged
                Some(None) => continue,
                None => {
                    e.log(Issue::KindMissing(id));
                    continue;
                }
            };

            let spec = StackSpec {
                id,
                kind,
                inputs,
                depends_on,
            };
            topology.push(spec, &mut e);
        }

        e.into_result(topology)
    }

    pub fn from_hcl_str(input: &str) -> Result<Self, LoadError> {
        let body = hcl_edit::parser::parse_body(input)?;
        Ok(Self::from_hcl_body(&body)?)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, LoadError> {
        let raw: Vec<RawStackSpec> = serde_yaml::from_str(input)?;
        Ok(Self::from_raw(raw)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, LoadError> {
        let raw: Vec<RawStackSpec> = serde_json::from_str(input)?;
        Ok(Self::from_raw(raw)?)
    }

    fn from_raw(raw: Vec<RawStackSpec>) -> Result<Self, TopologyErrors> {
        let mut topology = Self::default();
        let mut e = TopologyErrors::new();

        for raw_spec in raw {
            let kind = match raw_spec.kind.parse() {
                Ok(kind) => kind,
                Err(kind) => {
                    e.log(Issue::UnknownKind {
                        stack: raw_spec.id,
                        kind,
                    });
                    continue;
                }
            };

            let mut spec = StackSpec::new(raw_spec.id, kind);
            spec.depends_on = raw_spec.depends_on;

            for (key, value) in raw_spec.inputs {
                match Value::try_from(value) {
                    Ok(value) => {
                        spec.inputs.insert(key, value);
                    }
                    Err(err) => e.log(Issue::InvalidAttribute {
                        stack: spec.id.clone(),
                        key,
                        message: err.to_string(),
                    }),
                }
            }

            topology.push(spec, &mut e);
        }

        e.into_result(topology)
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        let format = Format::from_path(file_path)?;
        tracing::info!(path=%file_path.display(), ?format, "loading topology");

        let contents = std::fs::read_to_string(file_path)?;
        match format {
            Format::Hcl => Self::from_hcl_str(&contents),
            Format::Yaml => Self::from_yaml_str(&contents),
            Format::Json => Self::from_json_str(&contents),
        }
    }
}

fn parse_kind(stack: &str, value: &Value, e: &mut TopologyErrors) -> Option<StackKind> {
    match value.as_str().map(str::parse::<StackKind>) {
        Some(Ok(kind)) => Some(kind),
        _ => {
            e.log(Issue::UnknownKind {
                stack: stack.to_string(),
                kind: value.to_string(),
            });
            None
        }
    }
}

fn parse_depends_on(stack: &str, value: &Value, e: &mut TopologyErrors) -> Vec<String> {
    let ids: Option<Vec<String>> = value.as_array().and_then(|array| {
        array
            .iter()
            .map(|element| element.as_str().map(str::to_string))
            .collect()
    });

    ids.unwrap_or_else(|| {
        e.log(Issue::InvalidDependsOn(stack.to_string()));
        vec![]
    })
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStackSpec {
    id: String,
    kind: String,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    inputs: IndexMap<String, serde_json::Value>,
}

#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct TopologyErrors {
    #[new(default)]
    issues: Vec<Issue>,
}

impl TopologyErrors {
    pub fn log(&mut self, issue: Issue) {
        tracing::trace!(?issue, "issue found");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn into_result<T>(self, ok: T) -> Result<T, Self> {
        if self.issues.is_empty() {
            Ok(ok)
        } else {
            Err(self)
        }
    }
}

impl std::error::Error for TopologyErrors {}

impl std::fmt::Display for TopologyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let issues: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        f.write_str(&issues.join("; "))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Issue {
    #[error("attribute `{0}` outside of a stack block")]
    RootAttribute(String),
    #[error("unknown block type `{0}`")]
    UnknownBlockType(String),
    #[error("stack block #{0} has no label")]
    StackLabelMissing(usize),
    #[error("stack block `{0}` has more than one label")]
    StackTooManyLabels(String),
    #[error("stack `{0}` is declared more than once")]
    StackIdCollision(String),
    #[error("stack `{stack}` contains a nested block `{ident}`")]
    NestedBlock { stack: String, ident: String },
    #[error("stack `{0}` has no kind")]
    KindMissing(String),
    #[error("stack `{stack}` has unknown kind `{kind}`")]
    UnknownKind { stack: String, kind: String },
    #[error("stack `{0}`: depends_on must be a list of stack ids")]
    InvalidDependsOn(String),
    #[error("stack `{stack}`: invalid attribute `{key}`: {message}")]
    InvalidAttribute {
        stack: String,
        key: String,
        message: String,
    },
}
