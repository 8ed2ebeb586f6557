//! TypeScript to Zod Schema Converter
//!
//! This library turns the type declarations of a TypeScript source file
//! (interfaces, type aliases and enums) into Zod schemas. It includes a parser
//! for the type-level subset of TypeScript, a translator from type nodes to
//! schema expressions, a resolver ordering schemas by their dependencies, and
//! the rendering of the schema file plus a type-checking integration file.
//!
//! ```no_run
//! use ts_to_zod::{generate, GenerateOptions};
//!
//! let output = generate(GenerateOptions::new("export type Name = string;")).unwrap();
//! println!("{}", output.get_zod_schemas_file("./name"));
//! ```

use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod parser;
pub mod zod;

pub use zod::config::{Config, ConfigError, GenerateOptions};
pub use zod::generator::{generate, GenerateError, GenerateOutput};

use zod::writer::{module_reference, TypeScriptWriter};

/// Errors that can occur during the conversion process
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Parse error: {0}")]
    ParseError(#[from] GenerateError),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// What a conversion produced
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Rendered schema file
    pub schemas_file: String,
    /// Files written to disk, schema file first
    pub written: Vec<PathBuf>,
    /// Declarations that could not be generated
    pub errors: Vec<String>,
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

fn file_name(path: &Path) -> Result<String, ConversionError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ConversionError::MissingInput(format!("{} is not a file", path.display())))
}

/// Convert `source_text` as configured by `config`
///
/// The schema file is written to `config.output` together with its
/// integration test file (unless `skip_validation` is set). Without an
/// output path nothing is written and the schema file is only returned.
/// `config.input` is used to compute the import paths of the generated files.
pub fn convert_ts_to_zod(config: &Config, source_text: String) -> Result<Conversion, ConversionError> {
    let input = config
        .input
        .as_deref()
        .filter(|input| *input != "-")
        .map(Path::new);

    let output = generate(config.to_generate_options(source_text)?)?;

    let output_path = match &config.output {
        Some(path) => PathBuf::from(path),
        None => {
            let source_module = input
                .map(|input| module_reference(Path::new(""), input))
                .unwrap_or_else(|| "./source".to_string());
            return Ok(Conversion {
                schemas_file: output.get_zod_schemas_file(&source_module),
                written: Vec::new(),
                errors: output.errors,
            });
        }
    };

    let input = input.ok_or_else(|| {
        ConversionError::MissingInput(
            "a source file path is required to write the generated files".to_string(),
        )
    })?;

    let output_dir = parent_dir(&output_path);
    let schemas_file = output.get_zod_schemas_file(&module_reference(output_dir, input));
    let writer = TypeScriptWriter::new(output_dir, true);
    let mut written = vec![writer.write_file(&file_name(&output_path)?, &schemas_file)?];

    if !config.skip_validation {
        if let Some(integration_path) = config.integration_test_path() {
            let integration_dir = parent_dir(&integration_path);
            let content = output.get_integration_tests_file(
                &module_reference(integration_dir, input),
                &module_reference(integration_dir, &output_path),
            );
            let writer = TypeScriptWriter::new(integration_dir, true);
            written.push(writer.write_file(&file_name(&integration_path)?, &content)?);
        }
    }

    info!("Wrote {} files", written.len());

    Ok(Conversion {
        schemas_file,
        written,
        errors: output.errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HERO: &str = r#"
        export type Name = string;
        export interface Hero { name: Name; friends: Hero[] }
    "#;

    #[test]
    fn test_convert_without_output() {
        let config = Config {
            input: Some("src/hero.ts".to_string()),
            ..Config::default()
        };
        let conversion = convert_ts_to_zod(&config, HERO.to_string()).unwrap();

        assert!(conversion.written.is_empty());
        assert!(conversion.errors.is_empty());
        assert!(conversion
            .schemas_file
            .contains("import { Hero } from \"./src/hero\";"));
    }

    #[test]
    fn test_convert_writes_both_files() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("hero.ts");
        let output = temp_dir.path().join("generated/hero.zod.ts");

        let config = Config {
            input: Some(input.to_string_lossy().into_owned()),
            output: Some(output.to_string_lossy().into_owned()),
            ..Config::default()
        };
        let conversion = convert_ts_to_zod(&config, HERO.to_string()).unwrap();

        assert_eq!(conversion.written.len(), 2);
        let schemas = fs::read_to_string(&output).unwrap();
        assert!(schemas.contains("import { Hero } from \"../hero\";"));

        let integration =
            fs::read_to_string(temp_dir.path().join("generated/hero.zod.integration.ts")).unwrap();
        assert!(integration.contains("import * as spec from \"../hero\";"));
        assert!(integration.contains("import * as generated from \"./hero.zod\";"));
    }

    #[test]
    fn test_skip_validation() {
        let temp_dir = tempdir().unwrap();
        let config = Config {
            input: Some(temp_dir.path().join("hero.ts").to_string_lossy().into_owned()),
            output: Some(temp_dir.path().join("hero.zod.ts").to_string_lossy().into_owned()),
            skip_validation: true,
            ..Config::default()
        };
        let conversion = convert_ts_to_zod(&config, HERO.to_string()).unwrap();

        assert_eq!(conversion.written.len(), 1);
        assert!(!temp_dir.path().join("hero.zod.integration.ts").exists());
    }

    #[test]
    fn test_output_needs_an_input_path() {
        let temp_dir = tempdir().unwrap();
        let config = Config {
            input: Some("-".to_string()),
            output: Some(temp_dir.path().join("hero.zod.ts").to_string_lossy().into_owned()),
            ..Config::default()
        };

        assert!(matches!(
            convert_ts_to_zod(&config, HERO.to_string()),
            Err(ConversionError::MissingInput(_))
        ));
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let result = convert_ts_to_zod(&Config::default(), "interface Broken { name: ; }".to_string());
        assert!(matches!(result, Err(ConversionError::ParseError(_))));
    }
}
