//! Run configuration.
//!
//! [`RunOptions`] is the normalized snapshot every component reads.
//! [`LintelConfig`] is the on-disk `.lintel.jsonc` / `.lintel.json` model
//! that is merged into it.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use jsonc_parser::ParseOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LintelError;

/// Config file names, in lookup order.
pub const CONFIG_FILES: &[&str] = &[".lintel.jsonc", ".lintel.json"];

/// Requested worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobsArgument {
    /// One worker per available core.
    #[default]
    Auto,
    /// An explicit worker count.
    Fixed(usize),
}

impl FromStr for JobsArgument {
    type Err = LintelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            return Ok(Self::Auto);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Self::Fixed(n)),
            _ => Err(LintelError::InvalidJobs(s.to_string())),
        }
    }
}

impl fmt::Display for JobsArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(n) => write!(f, "{n}"),
        }
    }
}

/// The per-run option snapshot, read-only once a run starts.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Code prefixes to report. `None` means the plugins' defaults.
    pub select: Option<Vec<String>>,
    /// Code prefixes added to the selection without replacing defaults.
    pub extend_select: Vec<String>,
    pub ignore: Vec<String>,
    pub extend_ignore: Vec<String>,
    /// Ids of off-by-default plugins to enable.
    pub enable_extensions: Vec<String>,
    /// `(filename glob, codes)` pairs ignored for matching files only.
    pub per_file_ignores: Vec<(String, Vec<String>)>,
    /// Disables every suppression marker.
    pub disable_noqa: bool,
    pub jobs: JobsArgument,
    /// Restricts the run to a diff; forces serial execution.
    pub diff: bool,
    /// Paths to check. Empty means the current directory.
    pub filenames: Vec<String>,
    /// Basename globs a discovered file must match.
    pub filename_patterns: Vec<String>,
    pub exclude: Vec<String>,
    pub extend_exclude: Vec<String>,
    /// Name shown for input read from stdin.
    pub stdin_display_name: String,
    pub max_line_length: usize,
    pub max_doc_length: Option<usize>,
    pub indent_size: usize,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            select: None,
            extend_select: Vec::new(),
            ignore: Vec::new(),
            extend_ignore: Vec::new(),
            enable_extensions: Vec::new(),
            per_file_ignores: Vec::new(),
            disable_noqa: false,
            jobs: JobsArgument::Auto,
            diff: false,
            filenames: Vec::new(),
            filename_patterns: strings(&["*.py"]),
            exclude: strings(&[
                ".svn",
                "CVS",
                ".bzr",
                ".hg",
                ".git",
                "__pycache__",
                ".tox",
                ".nox",
                ".eggs",
                "*.egg",
            ]),
            extend_exclude: Vec::new(),
            stdin_display_name: "stdin".to_string(),
            max_line_length: 79,
            max_doc_length: None,
            indent_size: 4,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default selection.
    pub fn select(mut self, codes: Vec<String>) -> Self {
        self.select = Some(codes);
        self
    }

    pub fn extend_select(mut self, codes: Vec<String>) -> Self {
        self.extend_select = codes;
        self
    }

    pub fn ignore(mut self, codes: Vec<String>) -> Self {
        self.ignore = codes;
        self
    }

    pub fn extend_ignore(mut self, codes: Vec<String>) -> Self {
        self.extend_ignore = codes;
        self
    }

    pub fn enable_extensions(mut self, ids: Vec<String>) -> Self {
        self.enable_extensions = ids;
        self
    }

    /// Adds a per-file ignore entry.
    pub fn per_file_ignore(mut self, pattern: impl Into<String>, codes: Vec<String>) -> Self {
        self.per_file_ignores.push((pattern.into(), codes));
        self
    }

    pub fn disable_noqa(mut self, yes: bool) -> Self {
        self.disable_noqa = yes;
        self
    }

    pub fn jobs(mut self, jobs: JobsArgument) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn diff(mut self, yes: bool) -> Self {
        self.diff = yes;
        self
    }

    pub fn filenames(mut self, filenames: Vec<String>) -> Self {
        self.filenames = filenames;
        self
    }

    pub fn filename_patterns(mut self, patterns: Vec<String>) -> Self {
        self.filename_patterns = patterns;
        self
    }

    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    pub fn extend_exclude(mut self, patterns: Vec<String>) -> Self {
        self.extend_exclude = patterns;
        self
    }

    pub fn stdin_display_name(mut self, name: impl Into<String>) -> Self {
        self.stdin_display_name = name.into();
        self
    }

    pub fn max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }

    pub fn max_doc_length(mut self, length: usize) -> Self {
        self.max_doc_length = Some(length);
        self
    }

    pub fn indent_size(mut self, size: usize) -> Self {
        self.indent_size = size;
        self
    }

    /// `exclude` followed by `extend_exclude`.
    pub fn all_excludes(&self) -> Vec<String> {
        self.exclude
            .iter()
            .chain(&self.extend_exclude)
            .cloned()
            .collect()
    }

    /// Returns the display name for `filename`, mapping `-` to the stdin
    /// display name.
    pub fn display_name<'a>(&'a self, filename: &'a str) -> &'a str {
        if filename == "-" {
            &self.stdin_display_name
        } else {
            filename
        }
    }
}

/// The `jobs` entry of a config file: a number or `"auto"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobsValue {
    Count(usize),
    Text(String),
}

impl TryFrom<&JobsValue> for JobsArgument {
    type Error = LintelError;

    fn try_from(value: &JobsValue) -> Result<Self, Self::Error> {
        match value {
            JobsValue::Count(0) => Err(LintelError::InvalidJobs("0".to_string())),
            JobsValue::Count(n) => Ok(JobsArgument::Fixed(*n)),
            JobsValue::Text(text) => text.parse(),
        }
    }
}

/// Contents of a `.lintel.jsonc` / `.lintel.json` file.
///
/// Every key is optional; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct LintelConfig {
    pub select: Option<Vec<String>>,
    pub extend_select: Vec<String>,
    pub ignore: Option<Vec<String>>,
    pub extend_ignore: Vec<String>,
    pub enable_extensions: Vec<String>,
    /// Filename glob to codes.
    pub per_file_ignores: BTreeMap<String, Vec<String>>,
    pub disable_noqa: Option<bool>,
    pub jobs: Option<JobsValue>,
    /// Basename globs a discovered file must match.
    pub filename: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub extend_exclude: Vec<String>,
    pub max_line_length: Option<usize>,
    pub max_doc_length: Option<usize>,
    pub indent_size: Option<usize>,

    /// Directory containing the config file. Relative exclude patterns are
    /// resolved against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl LintelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file.
    ///
    /// Comments and trailing commas are accepted in both `.lintel.jsonc`
    /// and `.lintel.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LintelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LintelError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_json(&content)?;
        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }

        Ok(config)
    }

    /// Parses configuration from a JSON or JSONC string.
    pub fn from_json(json: &str) -> Result<Self, LintelError> {
        let value = jsonc_parser::parse_to_serde_value(json, &ParseOptions::default())
            .map_err(|e| LintelError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        serde_json::from_value(value)
            .map_err(|e| LintelError::config(format!("Invalid config: {}", e)))
    }

    /// Looks for a config file in `start` and each of its ancestors.
    pub fn discover(start: impl AsRef<Path>) -> Option<PathBuf> {
        start.as_ref().ancestors().find_map(|dir| {
            CONFIG_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Applies the file's values on top of `options`.
    pub fn merge_into(&self, mut options: RunOptions) -> Result<RunOptions, LintelError> {
        if let Some(select) = &self.select {
            options.select = Some(select.clone());
        }
        options.extend_select.extend(self.extend_select.iter().cloned());
        if let Some(ignore) = &self.ignore {
            options.ignore = ignore.clone();
        }
        options.extend_ignore.extend(self.extend_ignore.iter().cloned());
        options
            .enable_extensions
            .extend(self.enable_extensions.iter().cloned());
        options.per_file_ignores.extend(
            self.per_file_ignores
                .iter()
                .map(|(pattern, codes)| (pattern.clone(), codes.clone())),
        );
        if let Some(disable_noqa) = self.disable_noqa {
            options.disable_noqa = disable_noqa;
        }
        if let Some(jobs) = &self.jobs {
            options.jobs = JobsArgument::try_from(jobs)?;
        }
        if let Some(patterns) = &self.filename {
            options.filename_patterns = patterns.clone();
        }
        if let Some(exclude) = &self.exclude {
            options.exclude = self.resolve_patterns(exclude);
        }
        options
            .extend_exclude
            .extend(self.resolve_patterns(&self.extend_exclude));
        if let Some(length) = self.max_line_length {
            options.max_line_length = length;
        }
        if self.max_doc_length.is_some() {
            options.max_doc_length = self.max_doc_length;
        }
        if let Some(size) = self.indent_size {
            options.indent_size = size;
        }

        debug!("Merged config file into run options");
        Ok(options)
    }

    /// Builds run options from this file alone.
    pub fn into_options(self) -> Result<RunOptions, LintelError> {
        self.merge_into(RunOptions::default())
    }

    /// Anchors patterns containing a path separator at the config directory.
    fn resolve_patterns(&self, patterns: &[String]) -> Vec<String> {
        patterns
            .iter()
            .map(|pattern| match &self.base_dir {
                Some(base) if pattern.contains('/') && !Path::new(pattern).is_absolute() => {
                    base.join(pattern).to_string_lossy().into_owned()
                }
                _ => pattern.clone(),
            })
            .collect()
    }
}
