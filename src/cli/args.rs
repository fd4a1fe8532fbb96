use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use ktc_checker::CallableReferenceMode;

/// CLI arguments for the ktc binary.
#[derive(Parser, Debug)]
#[command(
    name = "ktc",
    version,
    about = "Callable reference resolution and constructor escape checks over exported compilation units"
)]
pub struct CliArgs {
    /// Path to ktc.json or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    /// How diagnostics are printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Force colored output on or off (defaults to whether stderr is a terminal).
    #[arg(long)]
    pub pretty: Option<bool>,

    // ==================== Checks ====================
    /// Skip the constructor escape checks.
    #[arg(long = "no-constructor-checks")]
    pub no_constructor_checks: bool,

    /// Skip callable reference resolution.
    #[arg(long = "no-callable-references")]
    pub no_callable_references: bool,

    /// How far callable references are resolved.
    #[arg(long, value_enum, ignore_case = true)]
    pub mode: Option<ReferenceMode>,

    /// Maximum diagnostics kept per unit (0 = unlimited).
    #[arg(long = "max-diagnostics")]
    pub max_diagnostics: Option<usize>,

    // ==================== Execution ====================
    /// Worker threads for unit analysis (defaults to the number of CPUs).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Unit files (`*.unit.json`) or directories to search for them.
    #[arg(value_name = "UNIT")]
    pub units: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReferenceMode {
    Shape,
    Resolve,
}

impl From<ReferenceMode> for CallableReferenceMode {
    fn from(mode: ReferenceMode) -> Self {
        match mode {
            ReferenceMode::Shape => CallableReferenceMode::Shape,
            ReferenceMode::Resolve => CallableReferenceMode::Resolve,
        }
    }
}
