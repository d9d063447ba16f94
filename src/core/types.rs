//! Operation records, resolved descriptors, and generated code.
//!
//! Records deserialize from YAML or JSON. Argument values stay as
//! `serde_yaml_ng::Value` so mapping order survives the round trip into
//! the emitter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::fmt;

/// Argument keys that carry record control data rather than call arguments.
pub const RESERVED_KEYS: [&str; 4] = ["source", "target", "operation", "options"];

// ============================================================================
// Operation records
// ============================================================================

/// One requested operation, prior to code generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRecord")]
pub struct OperationRecord {
    /// Receiver value name (absent for root constructors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Dotted path, e.g. `cols.upper` or `Optimus.pandas`
    pub operation: String,

    /// Call arguments in document order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arguments: IndexMap<String, Value>,

    /// Explicit result name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "OperationOptions::is_default")]
    pub options: OperationOptions,
}

/// Wire form. Unknown top-level keys are flat-body arguments.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    source: Option<String>,
    operation: String,
    #[serde(default)]
    arguments: IndexMap<String, Value>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    options: Option<OperationOptions>,
    #[serde(default)]
    operation_options: Option<OperationOptions>,
    #[serde(flatten)]
    rest: IndexMap<String, Value>,
}

impl From<RawRecord> for OperationRecord {
    fn from(raw: RawRecord) -> Self {
        let mut arguments = raw.arguments;
        for (key, value) in raw.rest {
            arguments.entry(key).or_insert(value);
        }
        Self {
            source: raw.source,
            operation: raw.operation,
            arguments,
            target: raw.target,
            options: raw.options.or(raw.operation_options).unwrap_or_default(),
        }
    }
}

impl OperationRecord {
    /// Start a record for `operation` with no receiver and no arguments.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            source: None,
            operation: operation.into(),
            arguments: IndexMap::new(),
            target: None,
            options: OperationOptions::default(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn creating_new(mut self) -> Self {
        self.options.creates_new = true;
        self
    }
}

/// Recognized record options. Unrecognized keys are kept but ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationOptions {
    /// Allocate a brand-new result name instead of reusing the receiver's
    #[serde(default)]
    pub creates_new: bool,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl OperationOptions {
    fn is_default(&self) -> bool {
        !self.creates_new && self.extra.is_empty()
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// A formal parameter of a catalogued operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(default, alias = "default")]
    pub has_default: bool,

    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
}

impl Parameter {
    /// A parameter without a default.
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            has_default: false,
            declared_type: None,
        }
    }

    /// A parameter with a default value of the given declared type.
    pub fn optional(name: &str, declared_type: &str) -> Self {
        Self {
            name: name.to_string(),
            has_default: true,
            declared_type: Some(declared_type.to_string()),
        }
    }
}

/// Declared return type tag of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    DataFrame,
    Clusters,
    Connection,
    Dict,
    List,
    Scalar,
    Str,
    Bool,
    Nothing,
    #[default]
    Unknown,
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataFrame => write!(f, "dataframe"),
            Self::Clusters => write!(f, "clusters"),
            Self::Connection => write!(f, "connection"),
            Self::Dict => write!(f, "dict"),
            Self::List => write!(f, "list"),
            Self::Scalar => write!(f, "scalar"),
            Self::Str => write!(f, "str"),
            Self::Bool => write!(f, "bool"),
            Self::Nothing => write!(f, "none"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// What kind of value an operation produces, as far as naming cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReturnCategory {
    NewDataFrame,
    ClusterSet,
    Connection,
    Generic,
}

impl From<ReturnType> for ReturnCategory {
    fn from(returns: ReturnType) -> Self {
        match returns {
            ReturnType::DataFrame => Self::NewDataFrame,
            ReturnType::Clusters => Self::ClusterSet,
            ReturnType::Connection => Self::Connection,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for ReturnCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewDataFrame => write!(f, "new-dataframe"),
            Self::ClusterSet => write!(f, "cluster-set"),
            Self::Connection => write!(f, "connection"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Which namespace an operation path lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootNamespace {
    RootConstructor,
    EngineAccessor,
    DataFrameAccessor,
}

impl fmt::Display for RootNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootConstructor => write!(f, "root"),
            Self::EngineAccessor => write!(f, "engine"),
            Self::DataFrameAccessor => write!(f, "dataframe"),
        }
    }
}

/// Result of resolving an operation path against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    /// The path as requested
    pub path: String,

    /// Callee name emitted into code
    pub name: String,

    pub parameters: Vec<Parameter>,

    /// Accepts an open-ended argument mapping
    pub accepts_overflow: bool,

    pub returns: ReturnType,

    pub return_category: ReturnCategory,

    pub root_namespace: RootNamespace,
}

impl OperationDescriptor {
    /// True if `name` is one of the declared parameters.
    pub fn declares(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }
}

// ============================================================================
// Generated code
// ============================================================================

/// Output of a batch: joined statements plus target names in record order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCode {
    pub code: String,
    pub targets: Vec<String>,
}

impl GeneratedCode {
    /// Targets with a single-element list collapsed to a bare name.
    pub fn updated(&self) -> Updated {
        match self.targets.as_slice() {
            [one] => Updated::One(one.clone()),
            many => Updated::Many(many.to_vec()),
        }
    }

    /// Individual statements, one per record.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.code.lines()
    }

    /// BLAKE3 fingerprint of the code text.
    pub fn fingerprint(&self) -> String {
        crate::provenance::hasher::hash_string(&self.code)
    }
}

/// Targets updated by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Updated {
    One(String),
    Many(Vec<String>),
}

// ============================================================================
// Tests
// ============================================================================
