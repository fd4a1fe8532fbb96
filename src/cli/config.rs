//! `ktc.json` project files.
//!
//! ```json
//! {
//!   "compilerOptions": { "checkConstructors": true, "callableReferenceMode": "resolve" },
//!   "units": ["build/ktc/main.unit.json"]
//! }
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use ktc_checker::{CallableReferenceMode, CheckerOptions};

pub const CONFIG_FILE_NAME: &str = "ktc.json";

/// Custom deserializer for boolean options that accepts both bool and string values.
/// This handles cases where ktc.json contains `"checkConstructors": "true"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => {
            let normalized = s.trim().to_lowercase();
            match normalized.as_str() {
                "true" | "1" | "yes" => Ok(Some(true)),
                "false" | "0" | "no" => Ok(Some(false)),
                _ => Err(Error::custom(format!(
                    "invalid boolean value: '{}'. Expected true, false, 'true', or 'false'",
                    s
                ))),
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct KtcConfig {
    #[serde(default)]
    pub compiler_options: Option<CompilerOptions>,
    /// Unit files, relative to the directory of the config file.
    #[serde(default)]
    pub units: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub check_constructors: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub check_callable_references: Option<bool>,
    #[serde(default)]
    pub callable_reference_mode: Option<String>,
    #[serde(default)]
    pub max_diagnostics_per_unit: Option<usize>,
}

pub fn parse_config(source: &str) -> Result<KtcConfig> {
    let config = serde_json::from_str(source).context("failed to parse ktc.json")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<KtcConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse_config(&source).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// Resolve `-p`: a file is used as-is, a directory must contain `ktc.json`.
pub fn resolve_config_path(project: &Path, cwd: &Path) -> Result<PathBuf> {
    let path = if project.is_absolute() {
        project.to_path_buf()
    } else {
        cwd.join(project)
    };
    if path.is_dir() {
        let candidate = path.join(CONFIG_FILE_NAME);
        if !candidate.is_file() {
            bail!("no {} found in {}", CONFIG_FILE_NAME, path.display());
        }
        return Ok(candidate);
    }
    if !path.is_file() {
        bail!("project file not found: {}", path.display());
    }
    Ok(path)
}

pub fn parse_reference_mode(value: &str) -> Result<CallableReferenceMode> {
    match value.trim().to_lowercase().as_str() {
        "shape" => Ok(CallableReferenceMode::Shape),
        "resolve" => Ok(CallableReferenceMode::Resolve),
        _ => bail!(
            "invalid callableReferenceMode '{}': expected 'shape' or 'resolve'",
            value
        ),
    }
}

/// Checker options from the config's `compilerOptions`, defaults for anything unset.
pub fn resolve_checker_options(options: Option<&CompilerOptions>) -> Result<CheckerOptions> {
    let mut resolved = CheckerOptions::default();
    let Some(options) = options else {
        return Ok(resolved);
    };

    if let Some(value) = options.check_constructors {
        resolved.check_constructors = value;
    }
    if let Some(value) = options.check_callable_references {
        resolved.check_callable_references = value;
    }
    if let Some(mode) = options.callable_reference_mode.as_deref() {
        resolved.callable_reference_mode = parse_reference_mode(mode)?;
    }
    if let Some(limit) = options.max_diagnostics_per_unit {
        resolved.max_diagnostics_per_unit = limit;
    }
    Ok(resolved)
}
