use crate::parser::{parse_source, ParseError};
use crate::zod::config::GenerateOptions;
use crate::zod::emitter::{render_integration_tests_file, render_schemas_file, EmittedSchema};
use crate::zod::expression::RenderOptions;
use crate::zod::resolver::{resolve, DependencyNode, Resolution, ResolutionState};
use crate::zod::translator::SchemaTranslator;
use log::{debug, info, warn};
use thiserror::Error;

/// Errors that stop generation altogether
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Result of one generation run
#[derive(Debug, Clone)]
pub struct GenerateOutput {
    schemas: Vec<EmittedSchema>,
    resolutions: Vec<Resolution>,
    unresolved_groups: Vec<Vec<String>>,
    render_options: RenderOptions,
    /// One entry per unsupported declaration, per unresolved group and per
    /// generated schema whose type cannot be imported
    pub errors: Vec<String>,
}

impl GenerateOutput {
    /// Schema file importing its types from `source_module`
    pub fn get_zod_schemas_file(&self, source_module: &str) -> String {
        render_schemas_file(&self.schemas, source_module, &self.render_options)
    }

    /// Companion file asserting each schema's inferred type against its source type
    pub fn get_integration_tests_file(&self, source_module: &str, schema_module: &str) -> String {
        render_integration_tests_file(&self.schemas, source_module, schema_module)
    }

    /// At least one schema had to be wrapped in `z.lazy`
    pub fn has_circular_dependencies(&self) -> bool {
        self.schemas
            .iter()
            .any(|s| s.state == ResolutionState::LazilyResolved)
    }

    /// Classification of every in-scope declaration, emission order first
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Names of the declarations left out together, one group per error
    pub fn unresolved_groups(&self) -> &[Vec<String>] {
        &self.unresolved_groups
    }

    /// Generated schemas in emission order
    pub fn schemas(&self) -> &[EmittedSchema] {
        &self.schemas
    }
}

/// Generate Zod schemas for the type declarations of `options.source_text`
///
/// Only a source that cannot be parsed is an error; declarations that
/// cannot be generated are reported in [`GenerateOutput::errors`].
pub fn generate(options: GenerateOptions) -> Result<GenerateOutput, GenerateError> {
    let source = parse_source(&options.source_text)?;

    let in_scope: Vec<_> = source
        .declarations
        .iter()
        .filter(|declaration| {
            let keep = (options.name_filter)(declaration.name.as_str());
            if !keep {
                debug!("Skipping {} (filtered out)", declaration.name);
            }
            keep
        })
        .collect();

    let translator = SchemaTranslator::new(&*options.get_schema_name);
    let translated: Vec<_> = in_scope
        .iter()
        .map(|declaration| translator.translate_declaration(declaration))
        .collect();

    let nodes: Vec<DependencyNode<'_>> = translated
        .iter()
        .map(|t| DependencyNode {
            name: &t.name,
            dependencies: &t.dependencies,
            unsupported: &t.unsupported,
        })
        .collect();
    let result = resolve(&nodes, options.max_run);

    let schemas: Vec<EmittedSchema> = result
        .emitted()
        .map(|resolution| {
            let declaration = in_scope[resolution.index];
            let translation = &translated[resolution.index];
            EmittedSchema {
                type_name: declaration.name.clone(),
                schema_name: (options.get_schema_name)(declaration.name.as_str()),
                exported: declaration.exported,
                state: resolution.state,
                schema: translation.schema.clone(),
                doc: declaration.doc.clone(),
                requires_type_import: translation.requires_type_import,
            }
        })
        .collect();

    let mut errors = result.errors;
    for schema in schemas.iter().filter(|s| s.imports_type() && !s.exported) {
        let error = format!(
            "{} must be exported: its schema imports the type from the source module",
            schema.type_name
        );
        warn!("{}", error);
        errors.push(error);
    }

    if errors.is_empty() {
        info!("Generated {} schemas", schemas.len());
    } else {
        warn!(
            "Generated {} schemas with {} errors",
            schemas.len(),
            errors.len()
        );
    }

    Ok(GenerateOutput {
        schemas,
        render_options: RenderOptions {
            strict: options.strict,
            keep_comments: options.keep_comments,
        },
        resolutions: result.resolutions,
        unresolved_groups: result.unresolved_groups,
        errors,
    })
}
