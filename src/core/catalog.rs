//! Reflection catalog: a static descriptor table keyed by dotted path.
//!
//! Paths resolve in this order:
//! 1. root constructor families (`Optimus`), whose tail is ignored
//! 2. accessors (`cols`, `rows`, `create`, `load`, `connect`)
//! 3. the top-level dataframe namespace, then the engine namespace
//!
//! The built-in table mirrors the signatures of the engine libraries the
//! generated code targets. It can be extended from YAML at startup.

use super::error::{CatalogError, ResolutionError};
use super::types::{OperationDescriptor, Parameter, ReturnCategory, ReturnType, RootNamespace};
use indexmap::IndexMap;
use serde::Deserialize;

/// Parameter list, overflow flag, and declared return type of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub accepts_overflow: bool,

    #[serde(default)]
    pub returns: ReturnType,
}

/// A named group of operations and nested groups.
#[derive(Debug, Clone, Default)]
struct OperationGroup {
    members: IndexMap<String, Member>,
}

#[derive(Debug, Clone)]
enum Member {
    Operation(Signature),
    Group(OperationGroup),
}

impl OperationGroup {
    fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Insert `signature` at a dotted `name`, creating nested groups on the way.
    /// An existing operation at the same path is replaced.
    fn insert(&mut self, name: &str, signature: Signature) -> Result<(), CatalogError> {
        let segments: Vec<&str> = name.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CatalogError::InvalidName {
                name: name.to_string(),
                reason: "empty path segment",
            });
        }
        let Some((last, parents)) = segments.split_last() else {
            return Err(CatalogError::InvalidName {
                name: name.to_string(),
                reason: "empty path",
            });
        };

        let mut group = self;
        for segment in parents {
            let member = group
                .members
                .entry((*segment).to_string())
                .or_insert_with(|| Member::Group(OperationGroup::default()));
            group = match member {
                Member::Group(g) => g,
                Member::Operation(_) => {
                    return Err(CatalogError::Conflict {
                        path: name.to_string(),
                        existing: "operation",
                    })
                }
            };
        }

        if let Some(Member::Group(_)) = group.members.get(*last) {
            return Err(CatalogError::Conflict {
                path: name.to_string(),
                existing: "namespace",
            });
        }
        group
            .members
            .insert((*last).to_string(), Member::Operation(signature));
        Ok(())
    }

    /// Walk `chain` attribute by attribute down to a single operation.
    fn walk<'a>(
        &'a self,
        path: &str,
        chain: &[&str],
    ) -> Result<(String, &'a Signature), ResolutionError> {
        let mut group = self;
        let mut attrs = chain.iter().peekable();
        while let Some(attr) = attrs.next() {
            match group.members.get(*attr) {
                None => {
                    return Err(ResolutionError::UnknownAttribute {
                        path: path.to_string(),
                        attribute: (*attr).to_string(),
                    })
                }
                Some(Member::Operation(sig)) => {
                    if attrs.peek().is_some() {
                        return Err(ResolutionError::NotANamespace {
                            path: path.to_string(),
                            attribute: (*attr).to_string(),
                        });
                    }
                    return Ok(((*attr).to_string(), sig));
                }
                Some(Member::Group(g)) => group = g,
            }
        }
        Err(ResolutionError::NotAnOperation {
            path: path.to_string(),
        })
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, member) in &self.members {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            match member {
                Member::Operation(_) => out.push(path),
                Member::Group(g) => g.collect_paths(&path, out),
            }
        }
    }
}

/// A root constructor family selecting a backing engine by name.
#[derive(Debug, Clone)]
struct Constructor {
    signature: Signature,
    engines: Vec<String>,
}

#[derive(Debug, Clone)]
struct Accessor {
    root: RootNamespace,
    group: OperationGroup,
}

/// The full descriptor table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    constructors: IndexMap<String, Constructor>,
    accessors: IndexMap<String, Accessor>,
    dataframe: OperationGroup,
    engine: OperationGroup,
}

impl Catalog {
    /// Resolve a dotted operation path to its descriptor.
    pub fn resolve(&self, path: &str) -> Result<OperationDescriptor, ResolutionError> {
        if path.is_empty() {
            return Err(ResolutionError::EmptyPath);
        }
        let parts: Vec<&str> = path.split('.').collect();
        let head = parts[0];

        if let Some(ctor) = self.constructors.get(head) {
            return Ok(describe(
                path,
                head.to_string(),
                &ctor.signature,
                RootNamespace::RootConstructor,
            ));
        }

        if let Some(accessor) = self.accessors.get(head) {
            let (name, sig) = accessor.group.walk(path, &parts[1..])?;
            return Ok(describe(path, name, sig, accessor.root));
        }

        let (group, root) = if self.dataframe.contains(head) {
            (&self.dataframe, RootNamespace::DataFrameAccessor)
        } else if self.engine.contains(head) {
            (&self.engine, RootNamespace::EngineAccessor)
        } else {
            return Err(ResolutionError::UnknownNamespace {
                path: path.to_string(),
                head: head.to_string(),
            });
        };
        let (name, sig) = group.walk(path, &parts)?;
        Ok(describe(path, name, sig, root))
    }

    /// True if `head` names a root constructor family.
    pub fn is_constructor(&self, head: &str) -> bool {
        self.constructors.contains_key(head)
    }

    /// Engines a constructor family can select. Empty for unknown families.
    pub fn engines(&self, family: &str) -> &[String] {
        self.constructors
            .get(family)
            .map(|c| c.engines.as_slice())
            .unwrap_or_default()
    }

    /// Every resolvable path, constructors first, then accessors, then the
    /// dataframe and engine namespaces, each in registration order.
    pub fn operations(&self) -> Vec<String> {
        let mut out: Vec<String> = self.constructors.keys().cloned().collect();
        for (name, accessor) in &self.accessors {
            accessor.group.collect_paths(name, &mut out);
        }
        self.dataframe.collect_paths("", &mut out);
        self.engine.collect_paths("", &mut out);
        out
    }

    /// Register or replace a root constructor family.
    pub fn add_constructor(&mut self, family: &str, signature: Signature, engines: &[&str]) {
        self.constructors.insert(
            family.to_string(),
            Constructor {
                signature,
                engines: engines.iter().map(|e| e.to_string()).collect(),
            },
        );
    }

    /// Register an operation under an accessor, creating the accessor if needed.
    pub fn add_accessor_operation(
        &mut self,
        accessor: &str,
        root: RootNamespace,
        name: &str,
        signature: Signature,
    ) -> Result<(), CatalogError> {
        if root == RootNamespace::RootConstructor {
            return Err(CatalogError::InvalidName {
                name: accessor.to_string(),
                reason: "accessors belong to the engine or dataframe namespace",
            });
        }
        if self.constructors.contains_key(accessor) {
            return Err(CatalogError::Conflict {
                path: accessor.to_string(),
                existing: "root constructor",
            });
        }
        let entry = self
            .accessors
            .entry(accessor.to_string())
            .or_insert_with(|| Accessor {
                root,
                group: OperationGroup::default(),
            });
        if entry.root != root {
            return Err(CatalogError::RootMismatch {
                name: accessor.to_string(),
                existing: entry.root.to_string(),
            });
        }
        entry.group.insert(name, signature)
    }

    /// Register a top-level dataframe operation (dotted names nest).
    pub fn add_dataframe_operation(
        &mut self,
        name: &str,
        signature: Signature,
    ) -> Result<(), CatalogError> {
        self.dataframe.insert(name, signature)
    }

    /// Register a top-level engine operation (dotted names nest).
    pub fn add_engine_operation(
        &mut self,
        name: &str,
        signature: Signature,
    ) -> Result<(), CatalogError> {
        self.engine.insert(name, signature)
    }

    /// Merge operations described by a YAML document into this catalog.
    pub fn extend_from_yaml(&mut self, yaml: &str) -> Result<(), CatalogError> {
        let ext: CatalogExtension = serde_yaml_ng::from_str(yaml)?;
        for (name, spec) in ext.accessors {
            let root = match spec.root {
                AccessorRoot::Engine => RootNamespace::EngineAccessor,
                AccessorRoot::Dataframe => RootNamespace::DataFrameAccessor,
            };
            for (op, sig) in spec.operations {
                self.add_accessor_operation(&name, root, &op, sig)?;
            }
        }
        for (op, sig) in ext.dataframe {
            self.add_dataframe_operation(&op, sig)?;
        }
        for (op, sig) in ext.engine {
            self.add_engine_operation(&op, sig)?;
        }
        Ok(())
    }
}

fn describe(
    path: &str,
    name: String,
    sig: &Signature,
    root_namespace: RootNamespace,
) -> OperationDescriptor {
    let return_category = match root_namespace {
        RootNamespace::RootConstructor => ReturnCategory::Generic,
        _ => ReturnCategory::from(sig.returns),
    };
    OperationDescriptor {
        path: path.to_string(),
        name,
        parameters: sig.parameters.clone(),
        accepts_overflow: sig.accepts_overflow,
        returns: sig.returns,
        return_category,
        root_namespace,
    }
}

// ============================================================================
// YAML extension format
// ============================================================================

#[derive(Debug, Deserialize)]
struct CatalogExtension {
    #[serde(default)]
    accessors: IndexMap<String, AccessorSpec>,
    #[serde(default)]
    dataframe: IndexMap<String, Signature>,
    #[serde(default)]
    engine: IndexMap<String, Signature>,
}

#[derive(Debug, Deserialize)]
struct AccessorSpec {
    root: AccessorRoot,
    #[serde(default)]
    operations: IndexMap<String, Signature>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AccessorRoot {
    Engine,
    Dataframe,
}

// ============================================================================
// Built-in table
// ============================================================================

/// Parse a compact parameter list: `name` is required, `name?type` has a default.
fn params(spec: &[&str]) -> Vec<Parameter> {
    spec.iter()
        .map(|s| match s.split_once('?') {
            Some((name, ty)) => Parameter::optional(name, ty),
            None => Parameter::required(s),
        })
        .collect()
}

fn op(spec: &[&str], returns: ReturnType) -> Signature {
    Signature {
        parameters: params(spec),
        accepts_overflow: false,
        returns,
    }
}

fn open(spec: &[&str], returns: ReturnType) -> Signature {
    Signature {
        parameters: params(spec),
        accepts_overflow: true,
        returns,
    }
}

const ENGINES: [&str; 7] = ["pandas", "dask", "cudf", "dask_cudf", "vaex", "spark", "ibis"];

const UNARY_COLUMN_OPS: [&str; 38] = [
    "upper", "lower", "title", "proper", "trim", "strip_html", "remove_accents",
    "remove_numbers", "remove_white_spaces", "remove_urls", "remove_special_chars",
    "normalize_spaces", "normalize_chars", "word_tokenize", "word_count", "len", "reverse",
    "abs", "exp", "ln", "sqrt", "reciprocal", "floor", "ceil", "sin", "cos", "tan",
    "to_float", "to_boolean", "to_string", "z_score", "modified_z_score", "standard_scaler",
    "max_abs_scaler", "min_max_scaler", "cumsum", "domain", "top_domain",
];

const COLUMN_AGGREGATIONS: [&str; 11] = [
    "min", "max", "mode", "range", "kurtosis", "skew", "mean", "sum", "var", "std", "count_zeros",
];

const DATE_PARTS: [&str; 7] = ["year", "month", "day", "hour", "minute", "second", "weekday"];

const SQL_CONNECTIONS: [&str; 6] = ["mysql", "postgres", "mssql", "redshift", "oracle", "presto"];

impl Catalog {
    /// The built-in descriptor table.
    pub fn builtin() -> Result<Self, CatalogError> {
        use ReturnType::*;
        let mut c = Catalog::default();
        let df = RootNamespace::DataFrameAccessor;
        let engine = RootNamespace::EngineAccessor;

        c.add_constructor(
            "Optimus",
            open(
                &[
                    "engine?str",
                    "memory_limit?str",
                    "n_workers?int",
                    "threads_per_worker?int",
                    "processes?bool",
                    "address?str",
                    "coiled_token?str",
                    "comm?bool",
                    "verbose?bool",
                ],
                Unknown,
            ),
            &ENGINES,
        );

        // -- create / load / connect (engine accessors) --
        c.add_accessor_operation(
            "create",
            engine,
            "dataframe",
            op(&["data?dict", "cols?list", "rows?list", "pdf?object", "n_partitions?int"], DataFrame),
        )?;
        let io = ["storage_options?dict", "conn?object"];
        let with_io = |own: &[&'static str]| -> Vec<&'static str> {
            own.iter().chain(io.iter()).copied().collect()
        };
        c.add_accessor_operation(
            "load",
            engine,
            "csv",
            open(
                &with_io(&[
                    "filepath_or_buffer",
                    "sep?str",
                    "header?bool",
                    "infer_schema?bool",
                    "encoding?str",
                    "n_rows?int",
                    "null_value?str",
                    "quoting?int",
                    "lineterminator?str",
                    "on_bad_lines?str",
                    "cache?bool",
                    "na_filter?bool",
                ]),
                DataFrame,
            ),
        )?;
        c.add_accessor_operation(
            "load",
            engine,
            "json",
            open(&with_io(&["filepath_or_buffer", "multiline?bool", "n_rows?int"]), DataFrame),
        )?;
        c.add_accessor_operation(
            "load",
            engine,
            "parquet",
            open(&with_io(&["filepath_or_buffer", "columns?list", "n_rows?int"]), DataFrame),
        )?;
        c.add_accessor_operation(
            "load",
            engine,
            "excel",
            open(
                &with_io(&[
                    "filepath_or_buffer",
                    "header?int",
                    "sheet_name?int",
                    "merge_sheets?bool",
                    "skiprows?int",
                    "n_rows?int",
                ]),
                DataFrame,
            ),
        )?;
        c.add_accessor_operation(
            "load",
            engine,
            "avro",
            open(&with_io(&["filepath_or_buffer", "n_rows?int"]), DataFrame),
        )?;
        c.add_accessor_operation(
            "load",
            engine,
            "xml",
            op(&["path", "n_rows?int"], DataFrame),
        )?;
        for driver in SQL_CONNECTIONS {
            c.add_accessor_operation(
                "connect",
                engine,
                driver,
                op(
                    &[
                        "host?str",
                        "database?str",
                        "user?str",
                        "password?str",
                        "port?int",
                        "schema?str",
                    ],
                    Connection,
                ),
            )?;
        }
        c.add_accessor_operation(
            "connect",
            engine,
            "sqlite",
            op(&["database?str", "schema?str"], Connection),
        )?;
        c.add_accessor_operation(
            "connect",
            engine,
            "bigquery",
            op(&["project?str", "dataset?str"], Connection),
        )?;
        c.add_accessor_operation(
            "connect",
            engine,
            "s3",
            open(&["endpoint_url?str", "bucket?str", "key?str", "secret?str"], Connection),
        )?;

        // -- cols (dataframe accessor) --
        for name in UNARY_COLUMN_OPS {
            c.add_accessor_operation("cols", df, name, op(&["cols?str", "output_cols?list"], DataFrame))?;
        }
        for name in DATE_PARTS {
            c.add_accessor_operation(
                "cols",
                df,
                name,
                op(&["cols?str", "format?str", "output_cols?list"], DataFrame),
            )?;
        }
        for name in COLUMN_AGGREGATIONS {
            c.add_accessor_operation("cols", df, name, op(&["cols?str", "tidy?bool", "compute?bool"], Scalar))?;
        }
        let cols_ops = vec![
            ("append", op(&["dfs"], DataFrame)),
            ("select", op(&["cols?str", "regex?str", "data_type?str", "invert?bool", "accepts_missing_cols?bool"], DataFrame)),
            ("copy", op(&["cols?str", "output_cols?list", "columns?list"], DataFrame)),
            ("duplicate", op(&["cols?str", "output_cols?list", "columns?list"], DataFrame)),
            ("drop", op(&["cols?str", "regex?str", "data_type?str"], DataFrame)),
            ("keep", op(&["cols?str", "regex?str"], DataFrame)),
            ("rename", op(&["cols?str", "names?list", "func?object"], DataFrame)),
            ("set", op(&["cols?str", "value?object", "where?str", "args?list", "default?object", "eval_value?bool"], DataFrame)),
            ("cast", op(&["cols?str", "data_type?str", "output_cols?list", "columns?list"], DataFrame)),
            ("pattern", op(&["cols?str", "output_cols?list", "mode?int"], DataFrame)),
            ("move", op(&["column", "position", "ref_col?str"], DataFrame)),
            ("sort", op(&["order?str", "cols?str"], DataFrame)),
            ("pad", op(&["cols?str", "width?int", "fillchar?str", "side?str", "output_cols?list"], DataFrame)),
            ("replace", op(&["cols?str", "search?object", "replace_by?object", "search_by?str", "ignore_case?bool", "output_cols?list"], DataFrame)),
            ("fill_na", op(&["cols?str", "value?object", "output_cols?list"], DataFrame)),
            ("round", op(&["cols?str", "decimals?int", "output_cols?list"], DataFrame)),
            ("pow", op(&["cols?str", "power?int", "output_cols?list"], DataFrame)),
            ("mod", op(&["cols?str", "divisor?int", "output_cols?list"], DataFrame)),
            ("log", op(&["cols?str", "base?int", "output_cols?list"], DataFrame)),
            ("to_integer", op(&["cols?str", "default?int", "output_cols?list"], DataFrame)),
            ("format_date", op(&["cols?str", "current_format?str", "output_format?str", "output_cols?list"], DataFrame)),
            ("unnest", op(&["cols?str", "separator?str", "splits?int", "index?int", "output_cols?list", "drop?bool", "mode?str"], DataFrame)),
            ("nest", op(&["cols", "separator?str", "output_col?str", "drop?bool", "shape?str"], DataFrame)),
            ("date_format", open(&["cols?str", "tidy?bool", "compute?bool"], Dict)),
            ("profile", op(&["cols?str", "bins?int", "flush?bool"], Dict)),
            ("quality", op(&["cols?str", "flush?bool", "compute?bool"], Dict)),
            ("frequency", op(&["cols?str", "n?int", "percentage?bool", "total_rows?int", "count_uniques?bool", "compute?bool", "tidy?bool"], Dict)),
            ("hist", op(&["cols?str", "buckets?int", "compute?bool"], Dict)),
            ("names", op(&["col_names?str", "by_data_types?str", "invert?bool", "is_regex?bool"], List)),
            ("data_types", op(&["cols?str"], Dict)),
            ("pattern_counts", op(&["cols?str", "n?int", "mode?int", "flush?bool"], Dict)),
            ("infer_types", op(&["cols?str", "sample?int"], Dict)),
        ];
        for (name, sig) in cols_ops {
            c.add_accessor_operation("cols", df, name, sig)?;
        }
        c.add_accessor_operation(
            "cols",
            df,
            "count_uniques",
            op(&["cols?str", "values?list", "estimate?bool", "tidy?bool", "compute?bool"], Scalar),
        )?;
        c.add_accessor_operation(
            "cols",
            df,
            "unique_values",
            op(&["cols?str", "values?list", "estimate?bool", "tidy?bool", "compute?bool"], List),
        )?;
        c.add_accessor_operation(
            "cols",
            df,
            "correlation",
            op(&["cols?str", "method?str", "tidy?bool"], Dict),
        )?;

        // -- rows (dataframe accessor) --
        let rows_ops = vec![
            ("append", op(&["dfs", "cols_map"], DataFrame)),
            ("apply", op(&["func", "args?list", "output_cols?list"], DataFrame)),
            ("select", op(&["expr?object", "contains?str", "case?bool", "flags?int", "na?bool", "regex?bool"], DataFrame)),
            ("count", op(&["compute?bool"], Scalar)),
            ("to_list", op(&["input_cols"], List)),
            ("sort", op(&["cols?str", "order?str", "cast?bool"], DataFrame)),
            ("reverse", op(&[], DataFrame)),
            ("drop", op(&["where"], DataFrame)),
            ("limit", op(&["count?int"], DataFrame)),
            ("between_index", op(&["cols?str", "lower_bound?int", "upper_bound?int"], DataFrame)),
            ("drop_duplicated", op(&["cols?str", "keep?str", "how?str"], DataFrame)),
            ("drop_missings", op(&["cols?str", "how?str"], DataFrame)),
        ];
        for (name, sig) in rows_ops {
            c.add_accessor_operation("rows", df, name, sig)?;
        }

        // -- top-level dataframe namespace --
        let frame_ops = vec![
            ("repartition", op(&["n?int"], DataFrame)),
            ("sample", op(&["n?int", "random?bool"], DataFrame)),
            ("display", op(&["limit?int", "cols?list", "title?str", "truncate?bool"], Nothing)),
            ("to_dict", op(&["cols?list", "n?int", "orient?str"], Dict)),
            ("profile", op(&["cols?str", "bins?int", "output?str", "flush?bool", "size?bool"], Dict)),
            ("string_clustering", op(&["cols?str", "algorithm?str", "n_size?int"], Clusters)),
            ("mask.null", op(&["cols?str", "how?str"], DataFrame)),
            ("mask.match", op(&["cols?str", "regex?str", "data_type?str"], DataFrame)),
            ("mask.numeric", op(&["cols?str"], DataFrame)),
            ("plot.hist", op(&["cols?str", "buckets?int"], Nothing)),
            ("plot.scatter", op(&["cols?str", "buckets?int"], Nothing)),
            ("save.csv", open(&["filename", "mode?str"], Nothing)),
            ("save.json", open(&["filename", "mode?str"], Nothing)),
            ("save.parquet", open(&["filename", "mode?str"], Nothing)),
        ];
        for (name, sig) in frame_ops {
            c.add_dataframe_operation(name, sig)?;
        }

        // -- top-level engine namespace --
        c.add_engine_operation(
            "dataframe",
            op(&["data?dict", "cols?list", "rows?list", "n_partitions?int"], DataFrame),
        )?;
        c.add_engine_operation("version", op(&[], Str))?;

        Ok(c)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_dataframe_accessor() {
        let c = Catalog::builtin().unwrap();
        let d = c.resolve("cols.upper").unwrap();
        assert_eq!(d.name, "upper");
        assert_eq!(d.root_namespace, RootNamespace::DataFrameAccessor);
        assert_eq!(d.return_category, ReturnCategory::NewDataFrame);
        assert!(!d.accepts_overflow);
        let names: Vec<_> = d.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["cols", "output_cols"]);
    }

    #[test]
    fn test_builtin_registration_errors_propagate() {
        let mut c = Catalog::builtin().unwrap();
        assert!(!c.operations().is_empty());
        // same registration calls the built-in table makes
        let err = c.add_dataframe_operation("mask", op(&[], ReturnType::DataFrame)).unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { existing: "namespace", .. }));
        let err = c.add_engine_operation("version.", op(&[], ReturnType::Str)).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidName { .. }));
    }

    #[test]
    fn test_resolve_engine_accessor_categories() {
        let c = Catalog::builtin().unwrap();
        let load = c.resolve("load.csv").unwrap();
        assert_eq!(load.root_namespace, RootNamespace::EngineAccessor);
        assert_eq!(load.return_category, ReturnCategory::NewDataFrame);
        assert!(load.accepts_overflow);

        let conn = c.resolve("connect.postgres").unwrap();
        assert_eq!(conn.return_category, ReturnCategory::Connection);
    }

    #[test]
    fn test_resolve_root_constructor_ignores_tail() {
        let c = Catalog::builtin().unwrap();
        for path in ["Optimus", "Optimus.pandas", "Optimus.anything.at.all"] {
            let d = c.resolve(path).unwrap();
            assert_eq!(d.root_namespace, RootNamespace::RootConstructor);
            assert_eq!(d.return_category, ReturnCategory::Generic);
            assert_eq!(d.name, "Optimus");
        }
    }

    #[test]
    fn test_resolve_top_level_namespaces() {
        let c = Catalog::builtin().unwrap();
        let clusters = c.resolve("string_clustering").unwrap();
        assert_eq!(clusters.root_namespace, RootNamespace::DataFrameAccessor);
        assert_eq!(clusters.return_category, ReturnCategory::ClusterSet);

        let nested = c.resolve("mask.null").unwrap();
        assert_eq!(nested.name, "null");
        assert_eq!(nested.root_namespace, RootNamespace::DataFrameAccessor);

        let version = c.resolve("version").unwrap();
        assert_eq!(version.root_namespace, RootNamespace::EngineAccessor);
        assert_eq!(version.return_category, ReturnCategory::Generic);
    }

    #[test]
    fn test_resolve_errors() {
        let c = Catalog::builtin().unwrap();
        assert_eq!(c.resolve(""), Err(ResolutionError::EmptyPath));
        assert!(matches!(
            c.resolve("nope.upper"),
            Err(ResolutionError::UnknownNamespace { head, .. }) if head == "nope"
        ));
        assert!(matches!(
            c.resolve("cols.nope"),
            Err(ResolutionError::UnknownAttribute { attribute, .. }) if attribute == "nope"
        ));
        assert!(matches!(c.resolve("cols"), Err(ResolutionError::NotAnOperation { .. })));
        assert!(matches!(c.resolve("mask"), Err(ResolutionError::NotAnOperation { .. })));
        assert!(matches!(
            c.resolve("cols.upper.extra"),
            Err(ResolutionError::NotANamespace { attribute, .. }) if attribute == "upper"
        ));
    }

    #[test]
    fn test_dataframe_namespace_shadows_engine() {
        let mut c = Catalog::builtin().unwrap();
        c.add_engine_operation("sample", op(&[], ReturnType::Str)).unwrap();
        let d = c.resolve("sample").unwrap();
        assert_eq!(d.root_namespace, RootNamespace::DataFrameAccessor);
    }

    #[test]
    fn test_extend_from_yaml() {
        let mut c = Catalog::builtin().unwrap();
        let yaml = r#"
accessors:
  ml:
    root: dataframe
    operations:
      kmeans:
        parameters:
          - {name: cols}
          - {name: n_clusters, default: true, type: int}
        returns: clusters
dataframe:
  "plot.box":
    parameters: [{name: cols}]
    returns: nothing
engine:
  remote_run:
    accepts_overflow: true
"#;
        c.extend_from_yaml(yaml).unwrap();
        let k = c.resolve("ml.kmeans").unwrap();
        assert_eq!(k.return_category, ReturnCategory::ClusterSet);
        assert_eq!(k.parameters[1], Parameter::optional("n_clusters", "int"));
        assert!(c.resolve("plot.box").is_ok());
        assert!(c.resolve("plot.hist").is_ok());
        let r = c.resolve("remote_run").unwrap();
        assert!(r.accepts_overflow);
        assert_eq!(r.return_category, ReturnCategory::Generic);
    }

    #[test]
    fn test_extend_root_mismatch() {
        let mut c = Catalog::builtin().unwrap();
        let yaml = "accessors:\n  cols:\n    root: engine\n    operations:\n      x: {}\n";
        let err = c.extend_from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CatalogError::RootMismatch { .. }));
    }

    #[test]
    fn test_insert_conflicts() {
        let mut c = Catalog::default();
        c.add_dataframe_operation("plot", op(&[], ReturnType::Nothing)).unwrap();
        let err = c
            .add_dataframe_operation("plot.hist", op(&[], ReturnType::Nothing))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { existing: "operation", .. }));

        c.add_dataframe_operation("mask.null", op(&[], ReturnType::DataFrame)).unwrap();
        let err = c.add_dataframe_operation("mask", op(&[], ReturnType::DataFrame)).unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { existing: "namespace", .. }));

        assert!(c.add_dataframe_operation("a..b", op(&[], ReturnType::Nothing)).is_err());
    }

    #[test]
    fn test_operations_listing_resolves() {
        let c = Catalog::builtin().unwrap();
        let ops = c.operations();
        assert_eq!(ops[0], "Optimus");
        assert!(ops.contains(&"cols.upper".to_string()));
        assert!(ops.contains(&"save.csv".to_string()));
        for path in &ops {
            assert!(c.resolve(path).is_ok(), "{} should resolve", path);
        }
    }

    #[test]
    fn test_engines() {
        let c = Catalog::builtin().unwrap();
        assert!(c.engines("Optimus").iter().any(|e| e == "dask_cudf"));
        assert!(c.engines("Nope").is_empty());
        assert!(c.is_constructor("Optimus"));
    }

    #[test]
    fn test_params_spec() {
        let p = params(&["cols", "n?int"]);
        assert_eq!(p, vec![Parameter::required("cols"), Parameter::optional("n", "int")]);
    }
}
