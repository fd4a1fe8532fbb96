//! Run orchestration: resolve the project, find the units, analyze them in
//! parallel and collect one outcome per unit.

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, info_span, warn};
use walkdir::WalkDir;

use ktc_checker::{CheckerOptions, UnitFile, UnitReport, analyze_unit};
use ktc_common::{Diagnostic, DiagnosticCategory};

use crate::cli::args::CliArgs;
use crate::cli::config::{
    CONFIG_FILE_NAME, load_config, resolve_checker_options, resolve_config_path,
};

pub const UNIT_EXTENSION: &str = ".unit.json";

// =============================================================================
// Results
// =============================================================================

#[derive(Debug)]
pub enum UnitStatus {
    Analyzed(UnitReport),
    /// The unit could not be read or broke an invariant; its analysis stopped.
    Failed(String),
    /// Cancellation was requested before the unit started.
    Cancelled,
}

#[derive(Debug)]
pub struct UnitOutcome {
    pub path: PathBuf,
    pub status: UnitStatus,
}

#[derive(Debug, Default)]
pub struct CheckRunResult {
    pub options: CheckerOptions,
    pub outcomes: Vec<UnitOutcome>,
}

impl CheckRunResult {
    pub fn reports(&self) -> impl Iterator<Item = &UnitReport> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            UnitStatus::Analyzed(report) => Some(report),
            _ => None,
        })
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports().flat_map(|report| report.diagnostics.iter())
    }

    pub fn error_count(&self) -> usize {
        self.count_category(DiagnosticCategory::Error)
    }

    /// Constructor escapes are reported as warnings.
    pub fn warning_count(&self) -> usize {
        self.count_category(DiagnosticCategory::Warning)
    }

    fn count_category(&self, category: DiagnosticCategory) -> usize {
        self.diagnostics()
            .filter(|diag| diag.category == category)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, UnitStatus::Failed(_)))
            .count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, UnitStatus::Cancelled))
            .count()
    }
}

// =============================================================================
// Planning
// =============================================================================

/// What a run will analyze and with which options.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub options: CheckerOptions,
    pub units: Vec<PathBuf>,
}

/// Merge `ktc.json` (if any) with the command line; flags win.
pub fn plan_run(args: &CliArgs, cwd: &Path) -> Result<RunPlan> {
    let config_path = match &args.project {
        Some(project) => Some(resolve_config_path(project, cwd)?),
        None if args.units.is_empty() => {
            let candidate = cwd.join(CONFIG_FILE_NAME);
            candidate.is_file().then_some(candidate)
        }
        None => None,
    };

    let mut options = CheckerOptions::default();
    let mut inputs: Vec<PathBuf> = Vec::new();
    if let Some(path) = &config_path {
        let config = load_config(path)?;
        options = resolve_checker_options(config.compiler_options.as_ref())
            .with_context(|| format!("invalid compilerOptions in {}", path.display()))?;
        let base = path.parent().unwrap_or(cwd);
        if let Some(units) = &config.units {
            inputs.extend(units.iter().map(|unit| base.join(unit)));
        }
    }

    if !args.units.is_empty() {
        inputs = args
            .units
            .iter()
            .map(|unit| if unit.is_absolute() { unit.clone() } else { cwd.join(unit) })
            .collect();
    }

    if args.no_constructor_checks {
        options.check_constructors = false;
    }
    if args.no_callable_references {
        options.check_callable_references = false;
    }
    if let Some(mode) = args.mode {
        options.callable_reference_mode = mode.into();
    }
    if let Some(limit) = args.max_diagnostics {
        options.max_diagnostics_per_unit = limit;
    }

    if inputs.is_empty() {
        bail!("no input units: pass *{} files or a project with \"units\"", UNIT_EXTENSION);
    }

    let mut units = Vec::new();
    let mut seen = FxHashSet::default();
    for input in &inputs {
        for unit in discover_units(input)? {
            if seen.insert(unit.clone()) {
                units.push(unit);
            }
        }
    }
    Ok(RunPlan { options, units })
}

/// A file is taken as-is; a directory is searched recursively for unit files.
pub fn discover_units(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("unit not found: {}", path.display());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry =
            entry.with_context(|| format!("failed to read directory {}", path.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(UNIT_EXTENSION))
        {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

// =============================================================================
// Execution
// =============================================================================

pub fn check(args: &CliArgs, cwd: &Path) -> Result<CheckRunResult> {
    check_with_cancel(args, cwd, Arc::new(AtomicBool::new(false)))
}

/// Like [`check`], but stops starting new units once `cancel` is set.
pub fn check_with_cancel(
    args: &CliArgs,
    cwd: &Path,
    cancel: Arc<AtomicBool>,
) -> Result<CheckRunResult> {
    let plan = plan_run(args, cwd)?;
    let _span = info_span!("check", units = plan.units.len()).entered();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = args.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("failed to start worker threads")?;

    let outcomes = pool.install(|| analyze_units(&plan.units, &plan.options, &cancel));
    info!(
        units = outcomes.len(),
        cancelled = cancel.load(Ordering::Relaxed),
        "check finished"
    );
    Ok(CheckRunResult {
        options: plan.options,
        outcomes,
    })
}

/// Analyze each unit independently; results keep the order of `paths`.
///
/// `cancel` is only consulted before a unit starts.
pub fn analyze_units(
    paths: &[PathBuf],
    options: &CheckerOptions,
    cancel: &AtomicBool,
) -> Vec<UnitOutcome> {
    paths
        .par_iter()
        .map(|path| {
            if cancel.load(Ordering::Relaxed) {
                debug!(path = %path.display(), "skipped after cancellation");
                return UnitOutcome {
                    path: path.clone(),
                    status: UnitStatus::Cancelled,
                };
            }
            let status = match analyze_unit_file(path, options) {
                Ok(report) => UnitStatus::Analyzed(report),
                Err(err) => {
                    warn!(path = %path.display(), error = %format!("{err:#}"), "unit analysis stopped");
                    UnitStatus::Failed(format!("{err:#}"))
                }
            };
            UnitOutcome {
                path: path.clone(),
                status,
            }
        })
        .collect()
}

/// Read, analyze and re-anchor one unit.
///
/// A relative `file` in the unit names a source next to the unit file, so
/// diagnostics are rewritten to that path for the reporter.
pub fn analyze_unit_file(path: &Path, options: &CheckerOptions) -> Result<UnitReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read unit {}", path.display()))?;
    let unit = UnitFile::from_json(&text)
        .with_context(|| format!("failed to load unit {}", path.display()))?;

    let original = unit.file.clone();
    let source = anchored_source(path, &original);
    let mut report = analyze_unit(unit, options)
        .with_context(|| format!("failed to analyze unit {}", path.display()))?;

    if let Some(source) = source {
        report.file = source.clone();
        for diagnostic in &mut report.diagnostics {
            if diagnostic.file == original {
                diagnostic.file = source.clone();
            }
            for related in &mut diagnostic.related_information {
                if related.file == original {
                    related.file = source.clone();
                }
            }
        }
    }
    Ok(report)
}

fn anchored_source(unit_path: &Path, file: &str) -> Option<String> {
    if file.is_empty() || Path::new(file).is_absolute() {
        return None;
    }
    let dir = unit_path.parent()?;
    if dir.as_os_str().is_empty() {
        return None;
    }
    Some(dir.join(file).display().to_string())
}
