use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::zod::resolver::DEFAULT_MAX_RUN;

/// Predicate deciding which declarations get a schema
pub type NameFilter = Box<dyn Fn(&str) -> bool>;

/// Maps a declaration identifier to its schema constant name
pub type SchemaNamer = Box<dyn Fn(&str) -> String>;

/// `Superman` -> `superman`, `HTTPStatus` -> `hTTPStatus`
pub fn lower_camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `Superman` -> `supermanSchema`
pub fn default_schema_name(name: &str) -> String {
    format!("{}Schema", lower_camel_case(name))
}

/// Options for a single generation run
pub struct GenerateOptions {
    /// TypeScript source holding the declarations
    pub source_text: String,

    /// Upper bound on dependency resolution passes (at least 1)
    pub max_run: usize,

    pub name_filter: NameFilter,

    pub get_schema_name: SchemaNamer,

    /// Copy JSDoc comments onto the generated schemas
    pub keep_comments: bool,

    /// Reject unknown keys on every object schema
    pub strict: bool,
}

impl GenerateOptions {
    pub fn new<S: Into<String>>(source_text: S) -> Self {
        GenerateOptions {
            source_text: source_text.into(),
            max_run: DEFAULT_MAX_RUN,
            name_filter: Box::new(|_: &str| true),
            get_schema_name: Box::new(default_schema_name),
            keep_comments: false,
            strict: false,
        }
    }

    pub fn max_run(mut self, max_run: usize) -> Self {
        self.max_run = max_run.max(1);
        self
    }

    pub fn name_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.name_filter = Box::new(filter);
        self
    }

    pub fn get_schema_name<F>(mut self, namer: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.get_schema_name = Box::new(namer);
        self
    }

    pub fn keep_comments(mut self, keep_comments: bool) -> Self {
        self.keep_comments = keep_comments;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("source_text", &format!("<{} bytes>", self.source_text.len()))
            .field("max_run", &self.max_run)
            .field("keep_comments", &self.keep_comments)
            .field("strict", &self.strict)
            .finish()
    }
}

/// Configuration file for the command line tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Source file with the TypeScript declarations
    #[serde(default)]
    pub input: Option<String>,

    /// Schema file to write; stdout when absent
    #[serde(default)]
    pub output: Option<String>,

    /// Integration test file; derived from `output` when absent
    #[serde(default)]
    pub integration_test_output: Option<String>,

    #[serde(default = "default_max_run")]
    pub max_run: usize,

    /// Regular expression declarations must match to get a schema
    #[serde(default)]
    pub name_filter: Option<String>,

    #[serde(default = "default_schema_name_suffix")]
    pub schema_name_suffix: String,

    #[serde(default)]
    pub keep_comments: bool,

    #[serde(default)]
    pub strict: bool,

    /// Do not write the integration test file
    #[serde(default)]
    pub skip_validation: bool,
}

fn default_max_run() -> usize {
    DEFAULT_MAX_RUN
}

fn default_schema_name_suffix() -> String {
    "Schema".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: None,
            output: None,
            integration_test_output: None,
            max_run: default_max_run(),
            name_filter: None,
            schema_name_suffix: default_schema_name_suffix(),
            keep_comments: false,
            strict: false,
            skip_validation: false,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Where the integration test file goes, next to the schema file by default
    pub fn integration_test_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.integration_test_output {
            return Some(PathBuf::from(path));
        }
        let output = Path::new(self.output.as_ref()?);
        let stem = output.file_stem()?.to_string_lossy();
        Some(output.with_file_name(format!("{}.integration.ts", stem)))
    }

    /// Build the options for one run over `source_text`
    pub fn to_generate_options(&self, source_text: String) -> Result<GenerateOptions, ConfigError> {
        let suffix = self.schema_name_suffix.clone();
        let mut options = GenerateOptions::new(source_text)
            .max_run(self.max_run)
            .keep_comments(self.keep_comments)
            .strict(self.strict)
            .get_schema_name(move |name| format!("{}{}", lower_camel_case(name), suffix));

        if let Some(pattern) = &self.name_filter {
            let filter = Regex::new(pattern)?;
            options = options.name_filter(move |name| filter.is_match(name));
        }

        Ok(options)
    }
}

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid name filter: {0}")]
    InvalidNameFilter(#[from] regex::Error),
}
