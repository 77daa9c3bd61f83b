//! configuration documents ([ConfigDocument]: key/value entries and path to source file)
//!
//! A document is a flat-ish mapping of keys to [Value]s. Nested objects are kept as opaque
//! values, merging only ever happens on the first level (see [crate::config::resolve]).
//!
//! Supported formats, picked by file extension ([Format]):
//! - `.hcl`: root attributes (`key = value`). Expressions are evaluated without variables,
//!   root blocks are rejected.
//! - `.yaml` / `.yml`
//! - `.json`
//!
//! Entries keep the order in which they appear in the source document. A key may only appear
//! once, in every format.
use crate::value::{Value, ValueError};
use hcl::eval::Evaluate;
use hcl_edit::structure::{Body, Structure};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(Default, Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    source: Source,
    entries: IndexMap<String, Value>,
}

impl ConfigDocument {
    pub fn new(source: impl Into<Source>) -> Self {
        Self {
            source: source.into(),
            entries: Default::default(),
        }
    }

    /// Inserts an entry, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}

impl ConfigDocument {
    pub fn from_hcl_body(body: Body, source: impl Into<Source>) -> Result<Self, LoadError> {
        let mut document = Self::new(source);
        let context = hcl::eval::Context::new();

        for structure in body.into_iter() {
            match structure {
                Structure::Block(block) => {
                    return Err(LoadError::UnexpectedBlock(
                        block.ident.value().as_str().to_string(),
                    ))
                }
                Structure::Attribute(attribute) => {
                    let key = attribute.key.value().as_str().to_string();
                    let expression: hcl::Expression = attribute.value.into();
                    let value = expression.evaluate(&context).map_err(|errors| {
                        LoadError::Evaluation {
                            key: key.clone(),
                            message: errors.to_string(),
                        }
                    })?;
                    let value = Value::try_from(value).map_err(|source| LoadError::InvalidValue {
                        key: key.clone(),
                        source,
                    })?;

                    // hcl_edit already rejects redefined attributes
                    document.insert(key, value);
                }
            }
        }

        Ok(document)
    }

    pub fn from_hcl_str(input: &str, source: impl Into<Source>) -> Result<Self, LoadError> {
        let body = hcl_edit::parser::parse_body(input)?;
        Self::from_hcl_body(body, source)
    }

    pub fn from_yaml_str(input: &str, source: impl Into<Source>) -> Result<Self, LoadError> {
        let root: Root = serde_yaml::from_str(input)?;
        Self::from_root(root, source)
    }

    pub fn from_json_str(input: &str, source: impl Into<Source>) -> Result<Self, LoadError> {
        let root: Root = serde_json::from_str(input)?;
        Self::from_root(root, source)
    }

    fn from_root(root: Root, source: impl Into<Source>) -> Result<Self, LoadError> {
        let mut document = Self::new(source);

        let entries = match root {
            Root::Empty => return Ok(document),
            Root::Entries(entries) => entries,
            Root::Other => return Err(LoadError::NotAMapping),
        };

        for (key, value) in entries {
            let value = Value::try_from(value).map_err(|source| LoadError::InvalidValue {
                key: key.clone(),
                source,
            })?;

            if document.contains_key(&key) {
                return Err(LoadError::DuplicateKey(key));
            }
            document.insert(key, value);
        }

        Ok(document)
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        let format = Format::from_path(file_path)?;
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), ?format, "loading configuration document");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let source = Some(file_path);
        match format {
            Format::Hcl => Self::from_hcl_str(&file_contents, source),
            Format::Yaml => Self::from_yaml_str(&file_contents, source),
            Format::Json => Self::from_json_str(&file_contents, source),
        }
    }

    /// Loads `<stem>.<extension>` from `dir_path`
    ///
    /// Extensions are tried in the order of [Format::EXTENSIONS], the first existing file wins.
    pub fn load_stem(dir_path: &Path, stem: &str) -> Result<Self, LoadError> {
        let file_path = find_stem(dir_path, stem)?;
        Self::load_file(&file_path)
    }
}

fn find_stem(dir_path: &Path, stem: &str) -> Result<PathBuf, LoadError> {
    Format::EXTENSIONS
        .iter()
        .map(|(extension, _)| dir_path.join(format!("{stem}.{extension}")))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| LoadError::NotFound {
            directory: dir_path.to_path_buf(),
            stem: stem.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Hcl,
    Yaml,
    Json,
}

impl Format {
    pub const EXTENSIONS: [(&'static str, Format); 4] = [
        ("hcl", Format::Hcl),
        ("yaml", Format::Yaml),
        ("yml", Format::Yaml),
        ("json", Format::Json),
    ];

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::EXTENSIONS
            .iter()
            .find(|(known, _)| *known == extension)
            .map(|(_, format)| *format)
            .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No document named {stem} found in {}", .directory.display())]
    NotFound { directory: PathBuf, stem: String },
    #[error("Unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl document")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
    #[error("Unable to deserialize hcl document")]
    HclDeserializeFailed(#[from] hcl::Error),
    #[error("Unable to parse yaml document")]
    YamlParseFailed(#[from] serde_yaml::Error),
    #[error("Unable to parse json document")]
    JsonParseFailed(#[from] serde_json::Error),
    #[error("Document root must be a mapping")]
    NotAMapping,
    #[error("Blocks are not allowed in configuration documents (found `{0}`)")]
    UnexpectedBlock(String),
    #[error("Key `{0}` is defined more than once")]
    DuplicateKey(String),
    #[error("Unable to evaluate `{key}`: {message}")]
    Evaluation { key: String, message: String },
    #[error("Invalid value for `{key}`")]
    InvalidValue { key: String, source: ValueError },
    #[error("Invalid topology document")]
    Topology(#[from] crate::topology::TopologyErrors),
}

/// Root of a yaml or json document
///
/// Keeps every entry in source order, duplicates included, so they can be rejected the same
/// way the hcl parser rejects redefined attributes.
enum Root {
    Empty,
    Entries(Vec<(String, serde_json::Value)>),
    Other,
}

impl<'de> serde::Deserialize<'de> for Root {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(RootVisitor)
    }
}

struct RootVisitor;

impl<'de> serde::de::Visitor<'de> for RootVisitor {
    type Value = Root;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a mapping")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Root, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut entries = vec![];
        while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
            entries.push(entry);
        }
        Ok(Root::Entries(entries))
    }

    // an empty yaml file
    fn visit_unit<E>(self) -> Result<Root, E> {
        Ok(Root::Empty)
    }

    fn visit_none<E>(self) -> Result<Root, E> {
        Ok(Root::Empty)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Root, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        while seq.next_element::<serde::de::IgnoredAny>()?.is_some() {}
        Ok(Root::Other)
    }

    fn visit_bool<E>(self, _: bool) -> Result<Root, E> {
        Ok(Root::Other)
    }

    fn visit_i64<E>(self, _: i64) -> Result<Root, E> {
        Ok(Root::Other)
    }

    fn visit_u64<E>(self, _: u64) -> Result<Root, E> {
        Ok(Root::Other)
    }

    fn visit_f64<E>(self, _: f64) -> Result<Root, E> {
        Ok(Root::Other)
    }

    fn visit_str<E>(self, _: &str) -> Result<Root, E> {
        Ok(Root::Other)
    }
}

/// Utility macro to create a [ConfigDocument] without a source
///
/// ```
/// # use stackplan::config_document;
/// let document = config_document! {
///   "company_code" => "acme",
///   "memory_size" => 512i64,
/// };
/// assert_eq!(document.len(), 2);
/// ```
#[macro_export]
macro_rules! config_document {
    { $($key:expr => $value:expr),* $(,)? } => {{
        #[allow(unused_mut)]
        let mut document = $crate::config_documents::ConfigDocument::default();
        $(
            document.insert($key, $value);
        )*
        document
    }};
}

pub type Source = Option<std::path::PathBuf>;
