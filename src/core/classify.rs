//! Target naming: choose a strategy from the descriptor's namespace and
//! return category, then derive the result name and receiver.

use super::error::CodegenError;
use super::naming::{allocate, Namespace};
use super::types::{OperationDescriptor, OperationRecord, ReturnCategory, RootNamespace};
use std::fmt;

/// How a record's result gets its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingStrategy {
    /// Reuse the receiver's name unless `creates_new` asks for a fresh `df`
    Transformation,
    /// Explicit target or fresh `clusters`
    Clusters,
    /// Explicit target or the fixed name `result`
    Output,
    /// Explicit target or fresh `df`
    EngineDataFrame,
    /// Explicit target or fresh `conn`
    Connection,
    /// Explicit target or fresh `op`
    Engine,
}

impl NamingStrategy {
    pub fn select(root: RootNamespace, category: ReturnCategory) -> Self {
        use ReturnCategory as C;
        use RootNamespace as R;
        match (root, category) {
            (R::DataFrameAccessor, C::NewDataFrame) => Self::Transformation,
            (R::DataFrameAccessor, C::ClusterSet) => Self::Clusters,
            (R::DataFrameAccessor, _) => Self::Output,
            (R::EngineAccessor, C::NewDataFrame) => Self::EngineDataFrame,
            (R::EngineAccessor, C::Connection) => Self::Connection,
            (R::EngineAccessor, _) | (R::RootConstructor, _) => Self::Engine,
        }
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transformation => write!(f, "dataframe-transformation"),
            Self::Clusters => write!(f, "dataframe-clusters"),
            Self::Output => write!(f, "output"),
            Self::EngineDataFrame => write!(f, "engine-dataframe"),
            Self::Connection => write!(f, "engine-connection"),
            Self::Engine => write!(f, "engine"),
        }
    }
}

/// Where a statement's result goes and what it is called on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub strategy: NamingStrategy,
    pub target: String,
    pub receiver: Option<String>,
}

/// Choose the target name and receiver for the record at `index`.
pub fn place(
    index: usize,
    record: &OperationRecord,
    descriptor: &OperationDescriptor,
    namespace: &Namespace,
) -> Result<Placement, CodegenError> {
    let strategy = NamingStrategy::select(descriptor.root_namespace, descriptor.return_category);
    let explicit = record.target.clone();

    let target = match strategy {
        NamingStrategy::Transformation => {
            if record.options.creates_new {
                allocate("df", namespace)
            } else {
                explicit
                    .or_else(|| record.source.clone())
                    .ok_or_else(|| CodegenError::MissingSource {
                        index,
                        operation: record.operation.clone(),
                    })?
            }
        }
        NamingStrategy::Clusters => explicit.unwrap_or_else(|| allocate("clusters", namespace)),
        NamingStrategy::Output => explicit.unwrap_or_else(|| "result".to_string()),
        NamingStrategy::EngineDataFrame => explicit.unwrap_or_else(|| allocate("df", namespace)),
        NamingStrategy::Connection => explicit.unwrap_or_else(|| allocate("conn", namespace)),
        NamingStrategy::Engine => explicit.unwrap_or_else(|| allocate("op", namespace)),
    };

    let receiver = match descriptor.root_namespace {
        RootNamespace::RootConstructor => None,
        _ => record.source.clone(),
    };

    Ok(Placement {
        strategy,
        target,
        receiver,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;

    fn placed(record: &OperationRecord, namespace: &Namespace) -> Placement {
        let d = Catalog::builtin().unwrap().resolve(&record.operation).unwrap();
        place(0, record, &d, namespace).unwrap()
    }

    #[test]
    fn test_strategy_table() {
        use ReturnCategory as C;
        use RootNamespace as R;
        let cases = [
            (R::DataFrameAccessor, C::NewDataFrame, NamingStrategy::Transformation),
            (R::DataFrameAccessor, C::ClusterSet, NamingStrategy::Clusters),
            (R::DataFrameAccessor, C::Generic, NamingStrategy::Output),
            (R::DataFrameAccessor, C::Connection, NamingStrategy::Output),
            (R::EngineAccessor, C::NewDataFrame, NamingStrategy::EngineDataFrame),
            (R::EngineAccessor, C::Connection, NamingStrategy::Connection),
            (R::EngineAccessor, C::Generic, NamingStrategy::Engine),
            (R::EngineAccessor, C::ClusterSet, NamingStrategy::Engine),
            (R::RootConstructor, C::Generic, NamingStrategy::Engine),
            (R::RootConstructor, C::NewDataFrame, NamingStrategy::Engine),
        ];
        for (root, category, expected) in cases {
            assert_eq!(NamingStrategy::select(root, category), expected, "{root}/{category}");
        }
    }

    #[test]
    fn test_default_names_per_cell() {
        let ns = Namespace::new();
        let cases = [
            (OperationRecord::new("cols.upper").with_source("df"), "df"),
            (OperationRecord::new("string_clustering").with_source("df"), "clusters"),
            (OperationRecord::new("cols.min").with_source("df"), "result"),
            (OperationRecord::new("load.csv").with_source("op"), "df"),
            (OperationRecord::new("connect.mysql").with_source("op"), "conn"),
            (OperationRecord::new("version").with_source("op"), "op"),
            (OperationRecord::new("Optimus"), "op"),
        ];
        for (record, expected) in cases {
            assert_eq!(placed(&record, &ns).target, expected, "{}", record.operation);
        }
    }

    #[test]
    fn test_allocating_cells_avoid_taken_names() {
        let ns = Namespace::from_live(["df", "clusters", "conn", "op"]);
        assert_eq!(placed(&OperationRecord::new("string_clustering").with_source("df"), &ns).target, "clusters2");
        assert_eq!(placed(&OperationRecord::new("load.json").with_source("op"), &ns).target, "df2");
        assert_eq!(placed(&OperationRecord::new("connect.sqlite").with_source("op"), &ns).target, "conn2");
        assert_eq!(placed(&OperationRecord::new("Optimus"), &ns).target, "op2");
        // `result` is fixed and never allocated
        assert_eq!(placed(&OperationRecord::new("cols.max").with_source("df"), &ns).target, "result");
    }

    #[test]
    fn test_explicit_target_wins() {
        let ns = Namespace::new();
        for op in ["string_clustering", "cols.min", "load.csv", "connect.mysql", "version", "Optimus", "cols.upper"] {
            let r = OperationRecord::new(op).with_source("src").with_target("mine");
            assert_eq!(placed(&r, &ns).target, "mine", "{}", op);
        }
    }

    #[test]
    fn test_creates_new_overrides_target() {
        let ns = Namespace::from_live(["df"]);
        let r = OperationRecord::new("cols.lower")
            .with_source("df")
            .with_target("mine")
            .creating_new();
        assert_eq!(placed(&r, &ns).target, "df2");
    }

    #[test]
    fn test_transformation_without_source_fails() {
        let r = OperationRecord::new("cols.upper");
        let d = Catalog::builtin().unwrap().resolve("cols.upper").unwrap();
        let err = place(4, &r, &d, &Namespace::new()).unwrap_err();
        assert_eq!(
            err,
            CodegenError::MissingSource {
                index: 4,
                operation: "cols.upper".into()
            }
        );
    }

    #[test]
    fn test_receiver_absent_for_root_constructor() {
        let ns = Namespace::new();
        let root = placed(&OperationRecord::new("Optimus").with_source("ignored"), &ns);
        assert_eq!(root.receiver, None);
        let engine = placed(&OperationRecord::new("load.csv").with_source("op"), &ns);
        assert_eq!(engine.receiver.as_deref(), Some("op"));
        let bare = placed(&OperationRecord::new("version"), &ns);
        assert_eq!(bare.receiver, None);
    }
}
