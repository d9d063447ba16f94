//! Structured errors for resolution, rendering, and batch generation.

use thiserror::Error;

/// An operation path that does not name exactly one catalogued operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("empty operation path")]
    EmptyPath,

    #[error("no namespace matches '{head}' in operation '{path}'")]
    UnknownNamespace { path: String, head: String },

    #[error("'{attribute}' not found while resolving '{path}'")]
    UnknownAttribute { path: String, attribute: String },

    #[error("'{path}' names a namespace, not an operation")]
    NotAnOperation { path: String },

    #[error("'{attribute}' in '{path}' is an operation and has no members")]
    NotANamespace { path: String, attribute: String },
}

/// A value with no stable textual form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReprError {
    #[error("non-finite float {0} has no stable textual form")]
    NonFiniteFloat(f64),

    #[error("tagged value {0} has no stable textual form")]
    Tagged(String),

    #[error("mapping keys must be scalars")]
    NonScalarKey,

    #[error("'{0}' is not a valid identifier reference")]
    InvalidReference(String),
}

/// A batch that could not be compiled. Every variant names the record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("record {index}: {source}")]
    Resolution {
        index: usize,
        #[source]
        source: ResolutionError,
    },

    #[error("record {index}: argument '{argument}': {source}")]
    Serialization {
        index: usize,
        argument: String,
        #[source]
        source: ReprError,
    },

    #[error("record {index}: '{operation}' transforms a dataframe but has no source, target or creates_new")]
    MissingSource { index: usize, operation: String },
}

impl CodegenError {
    /// Index of the offending record within its batch.
    pub fn index(&self) -> usize {
        match self {
            Self::Resolution { index, .. }
            | Self::Serialization { index, .. }
            | Self::MissingSource { index, .. } => *index,
        }
    }
}

/// Failure to load or merge a catalog extension.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("accessor '{name}' is already registered as a {existing} accessor")]
    RootMismatch { name: String, existing: String },

    #[error("'{path}' conflicts with an existing {existing}")]
    Conflict { path: String, existing: &'static str },

    #[error("'{name}' cannot be registered: {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// Failure to read or decode an input document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codegen_error_index() {
        let e = CodegenError::MissingSource {
            index: 3,
            operation: "cols.upper".into(),
        };
        assert_eq!(e.index(), 3);
        assert!(e.to_string().contains("record 3"));
    }

    #[test]
    fn test_resolution_error_display() {
        let e = CodegenError::Resolution {
            index: 0,
            source: ResolutionError::UnknownAttribute {
                path: "cols.nope".into(),
                attribute: "nope".into(),
            },
        };
        assert_eq!(e.to_string(), "record 0: 'nope' not found while resolving 'cols.nope'");
    }
}
