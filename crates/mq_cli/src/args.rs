// crates/mq_cli/src/args.rs
//
// Deterministic, offline CLI argument parsing & validation.
// - No networked paths (reject scheme:// input, mirrors the teacher's guard)
// - `--in`/`--measure-registry`/`--form-binding-registry` must exist as local files/dirs
// - `--out` and `--diagnostics` are output paths; only their parent directory must exist

use clap::Parser;
use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Parser)]
#[command(name = "mqscore", about = "Score clinical questionnaire submissions against a measure registry")]
pub struct Args {
    /// Line-delimited JSON file of Canonical Form Submissions.
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Line-delimited JSON output: one MeasurementEvent per line.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// Form Binding id to resolve for every submission (or, if unregistered,
    /// a measure_id to resolve via the item-map store).
    #[arg(long)]
    pub binding: String,

    #[arg(long = "measure-registry", value_name = "DIR")]
    pub measure_registry: PathBuf,

    #[arg(long = "form-binding-registry", value_name = "DIR")]
    pub form_binding_registry: PathBuf,

    /// `form-mappings/<form_id>/<measure_id>.json` root, for item-map mode.
    #[arg(long = "form-mappings", value_name = "DIR")]
    pub form_mappings: Option<PathBuf>,

    /// Line-delimited JSON of per-submission Diagnostics records.
    #[arg(long, value_name = "PATH")]
    pub diagnostics: Option<PathBuf>,

    /// Abort a submission with `UnmappedField` instead of dropping and warning.
    #[arg(long)]
    pub strict: bool,

    /// Use namespaced v5 UUIDs seeded on (measure_id, submission_id, code)
    /// instead of random v4 UUIDs, for byte-reproducible test runs.
    #[arg(long = "deterministic-ids")]
    pub deterministic_ids: bool,

    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
    NotADirectory(String),
    NoParentDirectory(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "path must be local (no scheme): {p}"),
            NotFound(p) => write!(f, "file or directory not found: {p}"),
            NotADirectory(p) => write!(f, "expected a directory: {p}"),
            NoParentDirectory(p) => write!(f, "output path has no parent directory: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

/// Entry point used by main.rs: parse argv, validate and normalize every
/// path-shaped flag, reject anything that looks like a URL.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let mut args = Args::parse();

    ensure_local_file(&args.input, "--in")?;
    ensure_local_dir(&args.measure_registry, "--measure-registry")?;
    ensure_local_dir(&args.form_binding_registry, "--form-binding-registry")?;
    if let Some(dir) = &args.form_mappings {
        ensure_local_dir(dir, "--form-mappings")?;
    }
    ensure_writable_parent(&args.out, "--out")?;
    if let Some(p) = &args.diagnostics {
        ensure_writable_parent(p, "--diagnostics")?;
    }

    args.input = normalize_path(&args.input);
    args.measure_registry = normalize_path(&args.measure_registry);
    args.form_binding_registry = normalize_path(&args.form_binding_registry);
    args.form_mappings = args.form_mappings.as_ref().map(normalize_path);
    args.out = normalize_path(&args.out);
    args.diagnostics = args.diagnostics.as_ref().map(normalize_path);

    Ok(args)
}

fn has_scheme(s: &str) -> bool {
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

fn ensure_local_file(p: &Path, label: &'static str) -> Result<(), CliError> {
    let s = p.to_string_lossy().to_string();
    if has_scheme(&s) {
        return Err(CliError::NonLocalPath(format!("{label} {s}")));
    }
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {s}")))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {s}")));
    }
    Ok(())
}

fn ensure_local_dir(p: &Path, label: &'static str) -> Result<(), CliError> {
    let s = p.to_string_lossy().to_string();
    if has_scheme(&s) {
        return Err(CliError::NonLocalPath(format!("{label} {s}")));
    }
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {s}")))?;
    if !meta.is_dir() {
        return Err(CliError::NotADirectory(format!("{label} {s}")));
    }
    Ok(())
}

/// Output paths need not exist yet, but their parent directory must, and
/// the path itself must not carry a scheme.
fn ensure_writable_parent(p: &Path, label: &'static str) -> Result<(), CliError> {
    let s = p.to_string_lossy().to_string();
    if has_scheme(&s) {
        return Err(CliError::NonLocalPath(format!("{label} {s}")));
    }
    let parent = p.parent().filter(|parent| !parent.as_os_str().is_empty());
    match parent {
        Some(dir) if !fs::metadata(dir).map(|m| m.is_dir()).unwrap_or(false) => {
            Err(CliError::NoParentDirectory(format!("{label} {s}")))
        }
        _ => Ok(()),
    }
}

/// Best-effort normalization to an absolute path; falls back to joining
/// against the current directory when the path does not yet exist.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}
