use anyhow::{Context, Result};
use colored::Colorize;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::Path;

use ktc_checker::UnitReport;
use ktc_common::diagnostics::DiagnosticRelatedInformation;
use ktc_common::{Diagnostic, DiagnosticCategory};

use crate::cli::driver::{CheckRunResult, UnitStatus};

/// Byte offsets of line starts, for offset -> (line, column) lookups.
struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    fn build(source: &str) -> Self {
        let mut starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(offset as u32 + 1);
            }
        }
        LineIndex { starts }
    }

    /// 1-based line and column; the column counts characters, not bytes.
    fn position(&self, source: &str, offset: u32) -> (u32, u32) {
        let offset = offset.min(source.len() as u32);
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let start = self.starts[line] as usize;
        let column = source
            .get(start..offset as usize)
            .map_or(offset as usize - start, |prefix| prefix.chars().count());
        (line as u32 + 1, column as u32 + 1)
    }
}

pub struct Reporter {
    color: bool,
    sources: FxHashMap<String, Option<String>>,
    line_indexes: FxHashMap<String, LineIndex>,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            sources: FxHashMap::default(),
            line_indexes: FxHashMap::default(),
        }
    }

    /// Register source text for `file` instead of reading it from disk.
    pub fn add_source(&mut self, file: &str, contents: String) {
        self.line_indexes.remove(file);
        self.sources.insert(file.to_string(), Some(contents));
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    /// Diagnostics of every analyzed unit, then one line per failed unit and a summary.
    pub fn render_run(&mut self, result: &CheckRunResult) -> String {
        let mut out = String::new();
        for outcome in &result.outcomes {
            match &outcome.status {
                UnitStatus::Analyzed(report) => {
                    out.push_str(&self.render(&report.diagnostics));
                    if report.dropped_diagnostics > 0 {
                        out.push_str(&self.format_note(&format!(
                            "{}: {} more diagnostics not shown",
                            report.file, report.dropped_diagnostics
                        )));
                        out.push('\n');
                    }
                }
                UnitStatus::Failed(error) => {
                    let category = self.format_category(DiagnosticCategory::Error);
                    out.push_str(&format!("{} - {}: {}\n", outcome.path.display(), category, error));
                }
                UnitStatus::Cancelled => {}
            }
        }
        out.push_str(&self.format_summary(result));
        out
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let location = self.format_location(&diagnostic.file, diagnostic.start);
        let category = self.format_category(diagnostic.category);
        let code = self.format_code(diagnostic.code);

        let mut output = String::new();
        if let Some(location) = location {
            output.push_str(&location);
        } else if !diagnostic.file.is_empty() {
            output.push_str(&format!("{}@{}", diagnostic.file, diagnostic.start));
        } else {
            output.push_str("<unknown>");
        }

        output.push_str(" - ");
        output.push_str(&category);
        if !code.is_empty() {
            output.push(' ');
            output.push_str(&code);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if let Some(snippet) =
            self.format_snippet(&diagnostic.file, diagnostic.start, diagnostic.length)
        {
            output.push_str(&snippet);
        }

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
            if let Some(snippet) = self.format_snippet(&related.file, related.start, related.length)
            {
                output.push_str(&snippet);
            }
        }

        output
    }

    /// Source line with the span underlined:
    ///   3     a = 1; doSomething(); b = 2
    ///                ~~~~~~~~~~~~~
    fn format_snippet(&mut self, file: &str, start: u32, length: u32) -> Option<String> {
        if file.is_empty() || length == 0 {
            return None;
        }

        let (line_num, column) = self.position_for(file, start)?;
        let source = self.sources.get(file)?.as_deref()?;
        let line_text = source.lines().nth((line_num - 1) as usize)?;

        let span_chars = source
            .get(start as usize..start.saturating_add(length).min(source.len() as u32) as usize)
            .map_or(length as usize, |text| text.chars().count());

        let mut underline = String::new();
        for (i, ch) in line_text.chars().enumerate() {
            let i = i as u32;
            if i + 1 < column {
                underline.push_str(if ch == '\t' { "    " } else { " " });
            } else if ((i + 1 - column) as usize) < span_chars {
                underline.push_str(if ch == '\t' { "~~~~" } else { "~" });
            } else {
                break;
            }
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let underline = if self.color {
            underline.red().to_string()
        } else {
            underline
        };
        let line_text = line_text.replace('\t', "    ");
        Some(format!("\n  {line_num:>3}   {line_text}\n        {underline}"))
    }

    fn format_related(&mut self, related: &DiagnosticRelatedInformation) -> String {
        let location = self
            .format_location(&related.file, related.start)
            .unwrap_or_else(|| related.file.clone());
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };

        format!("{}: {} - {}", prefix, location, related.message_text)
    }

    fn format_location(&mut self, file: &str, offset: u32) -> Option<String> {
        if file.is_empty() {
            return None;
        }

        let (line, column) = self.position_for(file, offset)?;
        Some(format!("{}:{}:{}", file, line, column))
    }

    fn position_for(&mut self, file: &str, offset: u32) -> Option<(u32, u32)> {
        let source = self
            .sources
            .entry(file.to_string())
            .or_insert_with(|| std::fs::read_to_string(Path::new(file)).ok())
            .as_deref()?;
        let index = self
            .line_indexes
            .entry(file.to_string())
            .or_insert_with(|| LineIndex::build(source));
        Some(index.position(source, offset))
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.label();
        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        if code == 0 {
            return String::new();
        }

        let label = format!("KT{}", code);
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }

    fn format_note(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn format_summary(&self, result: &CheckRunResult) -> String {
        let errors = result.error_count();
        let warnings = result.warning_count();
        let analyzed = result.reports().count();
        let mut summary = format!(
            "Found {} {} and {} {} in {} {}.",
            errors,
            if errors == 1 { "error" } else { "errors" },
            warnings,
            if warnings == 1 { "warning" } else { "warnings" },
            analyzed,
            if analyzed == 1 { "unit" } else { "units" }
        );
        let failed = result.failed_count();
        if failed > 0 {
            summary.push_str(&format!(" {failed} failed."));
        }
        let cancelled = result.cancelled_count();
        if cancelled > 0 {
            summary.push_str(&format!(" {cancelled} cancelled."));
        }
        summary.push('\n');
        if self.color && errors + failed > 0 {
            summary.bold().to_string()
        } else {
            summary
        }
    }
}

// =============================================================================
// JSON output
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonUnit<'a> {
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a UnitReport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRun<'a> {
    units: Vec<JsonUnit<'a>>,
    error_count: usize,
    warning_count: usize,
    failed_units: usize,
    cancelled_units: usize,
}

/// The whole run as one pretty-printed JSON document.
pub fn render_json(result: &CheckRunResult) -> Result<String> {
    let units = result
        .outcomes
        .iter()
        .map(|outcome| {
            let path = outcome.path.display().to_string();
            match &outcome.status {
                UnitStatus::Analyzed(report) => JsonUnit {
                    path,
                    status: "analyzed",
                    error: None,
                    report: Some(report),
                },
                UnitStatus::Failed(error) => JsonUnit {
                    path,
                    status: "failed",
                    error: Some(error),
                    report: None,
                },
                UnitStatus::Cancelled => JsonUnit {
                    path,
                    status: "cancelled",
                    error: None,
                    report: None,
                },
            }
        })
        .collect();
    let run = JsonRun {
        units,
        error_count: result.error_count(),
        warning_count: result.warning_count(),
        failed_units: result.failed_count(),
        cancelled_units: result.cancelled_count(),
    };
    serde_json::to_string_pretty(&run).context("failed to serialize diagnostics")
}
