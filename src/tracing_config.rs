//! Diagnostic logging for the `ktc` binary.
//!
//! Off unless `KTC_LOG` or `RUST_LOG` holds a filter directive. The layout is
//! picked by `KTC_LOG_FORMAT`: `text` (default), `tree` to follow nested
//! resolution trials, or `json`. Everything is written to stderr, so stdout
//! stays clean for `--format json`.
//!
//! ```bash
//! KTC_LOG="ktc_checker::callable_reference=trace" KTC_LOG_FORMAT=tree ktc unit.unit.json
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Tree,
    Json,
}

/// Logging requested by the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub directive: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// `None` when logging was not asked for. `KTC_LOG` wins over `RUST_LOG`;
    /// an unknown format falls back to text.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let directive = var("KTC_LOG").or_else(|| var("RUST_LOG"))?;
        let format = match var("KTC_LOG_FORMAT")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "tree" => LogFormat::Tree,
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Some(LogSettings { directive, format })
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self.format {
            LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
            LogFormat::Tree => tracing_tree::HierarchicalLayer::new(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true)
                .boxed(),
        }
    }
}

/// Install the global subscriber if the environment asks for logging.
pub fn init_tracing() {
    let Some(settings) = LogSettings::from_vars(|name| std::env::var(name).ok()) else {
        return;
    };
    let filter = EnvFilter::builder().parse_lossy(&settings.directive);
    tracing_subscriber::registry()
        .with(settings.layer().with_filter(filter))
        .init();
}

#[cfg(test)]
#[path = "cli/tests/tracing_config_tests.rs"]
mod tests;
