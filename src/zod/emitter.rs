use crate::zod::expression::{RenderOptions, SchemaExpression};
use crate::zod::resolver::ResolutionState;
use std::fmt::Write;

const HEADER: &str = "// Generated by ts-to-zod";

/// A declaration whose schema made it into the output, in emission order
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedSchema {
    pub type_name: String,
    pub schema_name: String,
    pub exported: bool,
    pub state: ResolutionState,
    pub schema: SchemaExpression,
    pub doc: Option<String>,
    /// Enums are referenced by value in `z.nativeEnum`
    pub requires_type_import: bool,
}

impl EmittedSchema {
    fn is_lazy(&self) -> bool {
        self.state == ResolutionState::LazilyResolved
    }

    /// The schema file imports the source type for this schema
    pub fn imports_type(&self) -> bool {
        self.is_lazy() || self.requires_type_import
    }

    /// `export const xSchema = ...;`
    fn render_statement(&self, options: &RenderOptions) -> String {
        let mut statement = String::new();
        if options.keep_comments {
            if let Some(doc) = &self.doc {
                let _ = writeln!(statement, "/**{}*/", doc);
            }
        }

        if self.is_lazy() {
            let lazy = SchemaExpression::lazy(self.schema.clone());
            let _ = write!(
                statement,
                "export const {}: z.ZodSchema<{}> = {};",
                self.schema_name,
                self.type_name,
                lazy.render(options, 0)
            );
        } else {
            let _ = write!(
                statement,
                "export const {} = {};",
                self.schema_name,
                self.schema.render(options, 0)
            );
        }
        statement
    }
}

/// Types the schema file has to import from the source module
fn type_imports(schemas: &[EmittedSchema]) -> Vec<&str> {
    let mut imports: Vec<&str> = Vec::new();
    for schema in schemas {
        if schema.imports_type() && !imports.contains(&schema.type_name.as_str())
        {
            imports.push(&schema.type_name);
        }
    }
    imports
}

pub fn render_schemas_file(
    schemas: &[EmittedSchema],
    source_module: &str,
    options: &RenderOptions,
) -> String {
    let mut content = String::new();
    let _ = writeln!(content, "{}", HEADER);
    let _ = writeln!(content, "import {{ z }} from \"zod\";");

    let imports = type_imports(schemas);
    if !imports.is_empty() {
        let _ = writeln!(
            content,
            "import {{ {} }} from \"{}\";",
            imports.join(", "),
            source_module
        );
    }

    for schema in schemas {
        let _ = writeln!(content);
        let _ = writeln!(content, "{}", schema.render_statement(options));
    }

    content
}

pub fn render_integration_tests_file(
    schemas: &[EmittedSchema],
    source_module: &str,
    schema_module: &str,
) -> String {
    let mut content = String::new();
    let _ = writeln!(content, "{}", HEADER);
    let _ = writeln!(content, "import {{ z }} from \"zod\";");
    let _ = writeln!(content);
    let _ = writeln!(content, "import * as spec from \"{}\";", source_module);
    let _ = writeln!(content, "import * as generated from \"{}\";", schema_module);
    let _ = writeln!(content);
    let _ = writeln!(content, "function expectType<T>(_: T) {{");
    let _ = writeln!(content, "  /* noop */");
    let _ = writeln!(content, "}}");

    for schema in schemas.iter().filter(|s| s.exported) {
        let inferred = format!("{}InferredType", schema.schema_name);
        let _ = writeln!(content);
        let _ = writeln!(
            content,
            "export type {} = z.infer<typeof generated.{}>;",
            inferred, schema.schema_name
        );
        let _ = writeln!(content);
        let _ = writeln!(
            content,
            "expectType<spec.{}>({{}} as {});",
            schema.type_name, inferred
        );
        let _ = writeln!(
            content,
            "expectType<{}>({{}} as spec.{});",
            inferred, schema.type_name
        );
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zod::expression::Argument;

    fn emitted(type_name: &str, exported: bool, state: ResolutionState) -> EmittedSchema {
        EmittedSchema {
            type_name: type_name.to_string(),
            schema_name: format!("{}Schema", type_name.to_lowercase()),
            exported,
            state,
            schema: SchemaExpression::factory("string", vec![]),
            doc: Some(" A documented type ".to_string()),
            requires_type_import: false,
        }
    }

    #[test]
    fn test_schemas_file_layout() {
        let schemas = vec![
            emitted("Name", true, ResolutionState::Resolved),
            emitted("Hero", false, ResolutionState::Resolved),
        ];
        let content = render_schemas_file(&schemas, "./hero", &RenderOptions::default());

        assert_eq!(
            content,
            "// Generated by ts-to-zod\nimport { z } from \"zod\";\n\nexport const nameSchema = z.string();\n\nexport const heroSchema = z.string();\n"
        );
    }

    #[test]
    fn test_lazy_and_enum_imports() {
        let mut vilain = emitted("Vilain", true, ResolutionState::LazilyResolved);
        vilain.schema = SchemaExpression::factory(
            "array",
            vec![Argument::Schema(SchemaExpression::reference("vilainSchema"))],
        );
        let mut color = emitted("Color", true, ResolutionState::Resolved);
        color.requires_type_import = true;

        let content = render_schemas_file(&[color, vilain], "./villains", &RenderOptions::default());

        assert!(content.contains("import { Color, Vilain } from \"./villains\";\n"));
        assert!(content.contains(
            "export const vilainSchema: z.ZodSchema<Vilain> = z.lazy(() => z.array(vilainSchema));"
        ));
    }

    #[test]
    fn test_comments_are_kept_on_request() {
        let schemas = vec![emitted("Name", true, ResolutionState::Resolved)];
        let options = RenderOptions {
            keep_comments: true,
            ..RenderOptions::default()
        };

        let content = render_schemas_file(&schemas, "./hero", &options);
        assert!(content.contains("/** A documented type */\nexport const nameSchema"));

        let content = render_schemas_file(&schemas, "./hero", &RenderOptions::default());
        assert!(!content.contains("A documented type"));
    }

    #[test]
    fn test_integration_file_covers_exported_only() {
        let schemas = vec![
            emitted("Name", true, ResolutionState::Resolved),
            emitted("Hidden", false, ResolutionState::Resolved),
        ];
        let content = render_integration_tests_file(&schemas, "./hero", "./hero.zod");

        assert!(content.contains("import * as spec from \"./hero\";"));
        assert!(content.contains("import * as generated from \"./hero.zod\";"));
        assert!(content.contains(
            "export type nameSchemaInferredType = z.infer<typeof generated.nameSchema>;"
        ));
        assert!(content.contains("expectType<spec.Name>({} as nameSchemaInferredType);"));
        assert!(content.contains("expectType<nameSchemaInferredType>({} as spec.Name);"));
        assert!(!content.contains("Hidden"));
        assert_eq!(content.matches("({} as ").count(), 2);
    }
}
