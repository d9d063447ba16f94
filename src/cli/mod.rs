//! CLI subcommands: generate, resolve, catalog, validate, stale.

use crate::core::alias::use_alias;
use crate::core::batch;
use crate::core::catalog::Catalog;
use crate::core::naming::Namespace;
use crate::core::parser;
use crate::core::types::{GeneratedCode, OperationDescriptor, OperationRecord};
use crate::provenance::actionlog::ActionLog;
use crate::provenance::{hasher, stats};
use clap::Subcommand;
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a batch of operation records into code
    Generate {
        /// Batch file (YAML or JSON; one record or a list)
        #[arg(short, long)]
        file: PathBuf,

        /// Names already in use, comma separated
        #[arg(long, value_delimiter = ',')]
        live: Vec<String>,

        /// File of names already in use
        #[arg(long)]
        live_file: Option<PathBuf>,

        /// Catalog extension (YAML)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Write code to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print code, targets and fingerprint as JSON
        #[arg(long)]
        json: bool,

        /// Append the BLAKE3 fingerprint of the code as a comment
        #[arg(long)]
        fingerprint: bool,
    },

    /// Show the descriptor an operation path resolves to
    Resolve {
        /// Dotted operation path, e.g. cols.upper
        path: String,

        /// Catalog extension (YAML)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every resolvable operation path
    Catalog {
        /// Catalog extension (YAML)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Only paths starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Check a batch without generating code
    Validate {
        /// Batch file (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Names already in use, comma separated
        #[arg(long, value_delimiter = ',')]
        live: Vec<String>,

        /// File of names already in use
        #[arg(long)]
        live_file: Option<PathBuf>,

        /// Catalog extension (YAML)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List columns whose cached stats an action log invalidates
    Stale {
        /// Action log file (YAML or JSON list of entries)
        #[arg(short, long)]
        log: PathBuf,

        /// Stat names, comma separated
        #[arg(long, value_delimiter = ',')]
        stats: Vec<String>,

        /// List every transformed column, ignoring freshness marks
        #[arg(long)]
        all: bool,

        /// Also print the log's BLAKE3 hash
        #[arg(long)]
        hash: bool,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Generate {
            file,
            live,
            live_file,
            catalog,
            output,
            json,
            fingerprint,
        } => {
            let opts = GenerateOptions {
                json,
                fingerprint,
            };
            cmd_generate(
                &file,
                &live,
                live_file.as_deref(),
                catalog.as_deref(),
                output.as_deref(),
                &opts,
            )
        }
        Commands::Resolve {
            path,
            catalog,
            json,
        } => cmd_resolve(&path, catalog.as_deref(), json),
        Commands::Catalog { catalog, prefix } => cmd_catalog(catalog.as_deref(), prefix.as_deref()),
        Commands::Validate {
            file,
            live,
            live_file,
            catalog,
        } => cmd_validate(&file, &live, live_file.as_deref(), catalog.as_deref()),
        Commands::Stale {
            log,
            stats,
            all,
            hash,
        } => cmd_stale(&log, &stats, all, hash),
    }
}

/// Output switches for `generate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub json: bool,
    pub fingerprint: bool,
}

/// Built-in catalog, extended from `extension` if given.
fn load_catalog(extension: Option<&Path>) -> Result<Catalog, String> {
    let mut catalog = Catalog::builtin().map_err(|e| format!("built-in catalog: {}", e))?;
    if let Some(path) = extension {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        catalog.extend_from_yaml(&yaml).map_err(|e| format!("{}: {}", path.display(), e))?;
    }
    Ok(catalog)
}

/// Live names from `--live` and `--live-file`, merged.
fn load_live(live: &[String], live_file: Option<&Path>) -> Result<Namespace, String> {
    let mut names: Vec<String> = live.iter().filter(|n| !n.is_empty()).cloned().collect();
    if let Some(path) = live_file {
        let ns = parser::parse_live_file(path).map_err(|e| e.to_string())?;
        names.extend(ns.live().iter().cloned());
    }
    Ok(Namespace::from_live(names))
}

#[derive(Serialize)]
struct GenerateReport<'a> {
    code: &'a str,
    updated: crate::core::types::Updated,
    targets: &'a [String],
    fingerprint: String,
}

/// Format generated code for output.
pub fn render_generated(out: &GeneratedCode, opts: &GenerateOptions) -> Result<String, String> {
    if opts.json {
        let report = GenerateReport {
            code: &out.code,
            updated: out.updated(),
            targets: &out.targets,
            fingerprint: out.fingerprint(),
        };
        return serde_json::to_string_pretty(&report).map_err(|e| format!("JSON serialize error: {}", e));
    }
    let mut text = out.code.clone();
    if opts.fingerprint {
        if !text.is_empty() {
            text.push('\n');
        }
        let _ = write!(text, "# fingerprint: {}", out.fingerprint());
    }
    Ok(text)
}

/// Compile `records` and format the result.
pub fn generate_text(
    records: &[OperationRecord],
    catalog: &Catalog,
    live: &Namespace,
    opts: &GenerateOptions,
) -> Result<String, String> {
    let out = batch::generate(records, catalog, live).map_err(|e| e.to_string())?;
    render_generated(&out, opts)
}

fn cmd_generate(
    file: &Path,
    live: &[String],
    live_file: Option<&Path>,
    catalog: Option<&Path>,
    output: Option<&Path>,
    opts: &GenerateOptions,
) -> Result<(), String> {
    let catalog = load_catalog(catalog)?;
    let live = load_live(live, live_file)?;
    let records = parser::parse_batch_file(file).map_err(|e| e.to_string())?;
    let text = generate_text(&records, &catalog, &live, opts)?;

    match output {
        Some(path) => {
            let mut content = text;
            content.push('\n');
            std::fs::write(path, content)
                .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
            eprintln!("Wrote {} statement(s) to {}", records.len(), path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Human-readable descriptor summary.
pub fn describe(d: &OperationDescriptor) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "path:       {}", d.path);
    let _ = writeln!(text, "callee:     {}", d.name);
    let _ = writeln!(text, "namespace:  {}", d.root_namespace);
    let _ = writeln!(text, "returns:    {} ({})", d.returns, d.return_category);
    let _ = writeln!(text, "overflow:   {}", if d.accepts_overflow { "yes" } else { "no" });
    if d.parameters.is_empty() {
        let _ = write!(text, "parameters: (none)");
    } else {
        let _ = write!(text, "parameters:");
        for p in &d.parameters {
            let ty = p.declared_type.as_deref().unwrap_or("any");
            let marker = if p.has_default { "?" } else { "" };
            let _ = write!(text, "\n  {}{}: {}", p.name, marker, ty);
        }
    }
    text
}

fn cmd_resolve(path: &str, catalog: Option<&Path>, json: bool) -> Result<(), String> {
    let catalog = load_catalog(catalog)?;
    let record = use_alias(OperationRecord::new(path), &catalog);
    let descriptor = catalog.resolve(&record.operation).map_err(|e| e.to_string())?;
    if record.operation != path {
        eprintln!("note: '{}' is an alias of '{}'", path, record.operation);
    }
    if json {
        let text = serde_json::to_string_pretty(&descriptor)
            .map_err(|e| format!("JSON serialize error: {}", e))?;
        println!("{}", text);
    } else {
        println!("{}", describe(&descriptor));
    }
    Ok(())
}

/// Catalog paths, optionally filtered by prefix.
pub fn list_operations(catalog: &Catalog, prefix: Option<&str>) -> Vec<String> {
    catalog
        .operations()
        .into_iter()
        .filter(|p| prefix.is_none_or(|pre| p.starts_with(pre)))
        .collect()
}

fn cmd_catalog(catalog: Option<&Path>, prefix: Option<&str>) -> Result<(), String> {
    let catalog = load_catalog(catalog)?;
    let paths = list_operations(&catalog, prefix);
    for p in &paths {
        println!("{}", p);
    }
    eprintln!("{} operation(s)", paths.len());
    Ok(())
}

fn cmd_validate(
    file: &Path,
    live: &[String],
    live_file: Option<&Path>,
    catalog: Option<&Path>,
) -> Result<(), String> {
    let catalog = load_catalog(catalog)?;
    let live = load_live(live, live_file)?;
    let records = parser::parse_batch_file(file).map_err(|e| e.to_string())?;
    let errors = parser::validate_batch(&records, &catalog, &live);

    if errors.is_empty() {
        println!("OK: {} ({} records)", file.display(), records.len());
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

/// Columns reported by `stale`, sorted.
pub fn stale_report(log: &ActionLog, stat_names: &[String], all: bool) -> Vec<String> {
    let columns = if all {
        stats::transformed_columns(log)
    } else {
        stats::stale_columns(log, stat_names)
    };
    columns.into_iter().collect()
}

/// Parse a stored action log. An empty or malformed document is an empty
/// log, so stale queries over it report nothing.
pub fn parse_log(text: &str) -> ActionLog {
    if text.trim().is_empty() {
        return ActionLog::new();
    }
    serde_yaml_ng::from_str(text).unwrap_or_else(|e| {
        warn!(error = %e, "malformed action log, treating as empty");
        ActionLog::new()
    })
}

fn cmd_stale(path: &Path, stat_names: &[String], all: bool, hash: bool) -> Result<(), String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let log = parse_log(&text);
    if !all && stat_names.is_empty() {
        return Err("--stats is required unless --all is given".to_string());
    }

    for column in stale_report(&log, stat_names, all) {
        println!("{}", column);
    }
    if hash {
        eprintln!("log: {} entries, {}", log.len(), hasher::hash_log(&log));
    }
    Ok(())
}
