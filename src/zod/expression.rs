//! Zod schema expression tree
//!
//! A [`SchemaExpression`] is a base construction (`z.string()`, a reference to
//! another generated schema, `z.lazy(...)`) followed by the ordered chain of
//! operations applied to it (`.min(3)`, `.optional()`, `.shape.name`).

use std::fmt::Write;

/// Literal values that can appear as operation arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    /// Kept as written in the source
    Number(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProperty {
    pub name: String,
    pub schema: SchemaExpression,
    /// Raw JSDoc body, rendered only when comments are kept
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Literal(Literal),
    /// Body of a regular expression literal, unescaped
    Regex(String),
    Schema(SchemaExpression),
    /// `[a, b, c]`
    List(Vec<SchemaExpression>),
    /// `{ key: schema }` object shape
    Shape(Vec<ShapeProperty>),
    /// `{ key: true }` mask used by `omit` and `pick`
    KeyMask(Vec<String>),
    /// Bare identifier, e.g. the enum passed to `z.nativeEnum`
    Identifier(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Base {
    /// `z.<factory>(arguments)`
    Factory {
        name: String,
        arguments: Vec<Argument>,
    },
    /// Constant of another generated schema
    Reference(String),
    /// `z.lazy(() => inner)`
    Lazy(Box<SchemaExpression>),
    /// Construct with no Zod counterpart
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `.identifier(arguments)`
    Call {
        identifier: String,
        arguments: Vec<Argument>,
    },
    /// `.identifier`
    Member(String),
}

impl Operation {
    pub fn identifier(&self) -> &str {
        match self {
            Operation::Call { identifier, .. } => identifier,
            Operation::Member(identifier) => identifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaExpression {
    pub base: Base,
    pub operations: Vec<Operation>,
}

/// Rendering switches shared by every expression of a file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderOptions {
    pub strict: bool,
    pub keep_comments: bool,
}

const INDENT: &str = "  ";

impl SchemaExpression {
    pub fn new(base: Base) -> Self {
        SchemaExpression {
            base,
            operations: Vec::new(),
        }
    }

    /// `z.<name>(arguments)`
    pub fn factory(name: &str, arguments: Vec<Argument>) -> Self {
        SchemaExpression::new(Base::Factory {
            name: name.to_string(),
            arguments,
        })
    }

    pub fn reference(name: &str) -> Self {
        SchemaExpression::new(Base::Reference(name.to_string()))
    }

    pub fn unsupported(description: &str) -> Self {
        SchemaExpression::new(Base::Unsupported(description.to_string()))
    }

    pub fn lazy(inner: SchemaExpression) -> Self {
        SchemaExpression::new(Base::Lazy(Box::new(inner)))
    }

    pub fn call(mut self, identifier: &str, arguments: Vec<Argument>) -> Self {
        self.push_call(identifier, arguments);
        self
    }

    pub fn member(mut self, identifier: &str) -> Self {
        self.operations
            .push(Operation::Member(identifier.to_string()));
        self
    }

    pub fn push_call(&mut self, identifier: &str, arguments: Vec<Argument>) {
        self.operations.push(Operation::Call {
            identifier: identifier.to_string(),
            arguments,
        });
    }

    /// Identifiers of the chained operations, in application order
    pub fn operation_names(&self) -> Vec<&str> {
        self.operations.iter().map(Operation::identifier).collect()
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.base, Base::Unsupported(_))
    }

    /// `z.object(...)` without any operation applied yet
    fn is_object_factory(&self) -> bool {
        matches!(&self.base, Base::Factory { name, .. } if name == "object")
    }

    /// Render as TypeScript source starting at the given indentation level
    pub fn render(&self, options: &RenderOptions, level: usize) -> String {
        let mut out = String::new();
        self.write_to(&mut out, options, level);
        out
    }

    fn write_to(&self, out: &mut String, options: &RenderOptions, level: usize) {
        match &self.base {
            Base::Factory { name, arguments } => {
                let _ = write!(out, "z.{}(", name);
                write_arguments(out, arguments, options, level);
                out.push(')');
                if options.strict && self.is_object_factory() {
                    out.push_str(".strict()");
                }
            }
            Base::Reference(name) => out.push_str(name),
            Base::Lazy(inner) => {
                out.push_str("z.lazy(() => ");
                inner.write_to(out, options, level);
                out.push(')');
            }
            // Never emitted: unsupported declarations are filtered out before rendering
            Base::Unsupported(_) => out.push_str("z.any()"),
        }

        for operation in &self.operations {
            match operation {
                Operation::Call {
                    identifier,
                    arguments,
                } => {
                    let _ = write!(out, ".{}(", identifier);
                    write_arguments(out, arguments, options, level);
                    out.push(')');
                    if options.strict && identifier == "extend" {
                        out.push_str(".strict()");
                    }
                }
                Operation::Member(identifier) => {
                    if is_identifier(identifier) {
                        let _ = write!(out, ".{}", identifier);
                    } else {
                        let _ = write!(out, "[{}]", quote(identifier));
                    }
                }
            }
        }
    }
}

fn write_arguments(out: &mut String, arguments: &[Argument], options: &RenderOptions, level: usize) {
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_argument(out, argument, options, level);
    }
}

fn write_argument(out: &mut String, argument: &Argument, options: &RenderOptions, level: usize) {
    match argument {
        Argument::Literal(literal) => out.push_str(&render_literal(literal)),
        Argument::Regex(body) => {
            let _ = write!(out, "/{}/", escape_regex(body));
        }
        Argument::Schema(schema) => schema.write_to(out, options, level),
        Argument::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                item.write_to(out, options, level);
            }
            out.push(']');
        }
        Argument::Shape(properties) => write_shape(out, properties, options, level),
        Argument::KeyMask(keys) => {
            let entries: Vec<String> = keys
                .iter()
                .map(|key| format!("{}: true", property_key(key)))
                .collect();
            let _ = write!(out, "{{ {} }}", entries.join(", "));
        }
        Argument::Identifier(name) => out.push_str(name),
    }
}

fn write_shape(out: &mut String, properties: &[ShapeProperty], options: &RenderOptions, level: usize) {
    if properties.is_empty() {
        out.push_str("{}");
        return;
    }

    let indent = INDENT.repeat(level + 1);
    out.push_str("{\n");
    for property in properties {
        if options.keep_comments {
            if let Some(doc) = &property.doc {
                let _ = writeln!(out, "{}/**{}*/", indent, doc);
            }
        }
        let _ = write!(out, "{}{}: ", indent, property_key(&property.name));
        property.schema.write_to(out, options, level + 1);
        out.push_str(",\n");
    }
    let _ = write!(out, "{}}}", INDENT.repeat(level));
}

pub fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::String(value) => quote(value),
        Literal::Number(value) => value.clone(),
        Literal::Boolean(value) => value.to_string(),
        Literal::Null => "null".to_string(),
    }
}

/// Double-quoted JavaScript string literal
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

/// Escape every `/` that is not already escaped
fn escape_regex(body: &str) -> String {
    let mut escaped = String::with_capacity(body.len());
    let mut backslash = false;
    for c in body.chars() {
        if c == '/' && !backslash {
            escaped.push('\\');
        }
        backslash = c == '\\' && !backslash;
        escaped.push(c);
    }
    escaped
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn test_render_chained_operations() {
        let schema = SchemaExpression::factory("string", vec![])
            .call("min", vec![Argument::Literal(Literal::Number("3".to_string()))])
            .call("email", vec![])
            .call("optional", vec![]);

        assert_eq!(schema.render(&plain(), 0), "z.string().min(3).email().optional()");
        assert_eq!(schema.operation_names(), vec!["min", "email", "optional"]);
    }

    #[test]
    fn test_render_object_shape() {
        let schema = SchemaExpression::factory(
            "object",
            vec![Argument::Shape(vec![
                ShapeProperty {
                    name: "name".to_string(),
                    schema: SchemaExpression::reference("nameSchema"),
                    doc: Some(" The name ".to_string()),
                },
                ShapeProperty {
                    name: "first-name".to_string(),
                    schema: SchemaExpression::factory("string", vec![]),
                    doc: None,
                },
            ])],
        );

        assert_eq!(
            schema.render(&plain(), 0),
            "z.object({\n  name: nameSchema,\n  \"first-name\": z.string(),\n})"
        );

        let options = RenderOptions {
            strict: true,
            keep_comments: true,
        };
        assert_eq!(
            schema.render(&options, 0),
            "z.object({\n  /** The name */\n  name: nameSchema,\n  \"first-name\": z.string(),\n}).strict()"
        );
    }

    #[test]
    fn test_render_nested_shape_indentation() {
        let inner = SchemaExpression::factory(
            "object",
            vec![Argument::Shape(vec![ShapeProperty {
                name: "deep".to_string(),
                schema: SchemaExpression::factory("boolean", vec![]),
                doc: None,
            }])],
        );
        let outer = SchemaExpression::factory(
            "object",
            vec![Argument::Shape(vec![ShapeProperty {
                name: "inner".to_string(),
                schema: inner,
                doc: None,
            }])],
        );

        assert_eq!(
            outer.render(&plain(), 0),
            "z.object({\n  inner: z.object({\n    deep: z.boolean(),\n  }),\n})"
        );
    }

    #[test]
    fn test_render_arguments() {
        let union = SchemaExpression::factory(
            "union",
            vec![Argument::List(vec![
                SchemaExpression::factory(
                    "literal",
                    vec![Argument::Literal(Literal::String("a\"b".to_string()))],
                ),
                SchemaExpression::factory("literal", vec![Argument::Literal(Literal::Boolean(false))]),
            ])],
        );
        assert_eq!(
            union.render(&plain(), 0),
            r#"z.union([z.literal("a\"b"), z.literal(false)])"#
        );

        let omit = SchemaExpression::reference("supermanSchema").call(
            "omit",
            vec![Argument::KeyMask(vec!["age".to_string(), "is-hero".to_string()])],
        );
        assert_eq!(
            omit.render(&plain(), 0),
            r#"supermanSchema.omit({ age: true, "is-hero": true })"#
        );

        let member = SchemaExpression::reference("heroSchema")
            .member("shape")
            .member("secret-name");
        assert_eq!(member.render(&plain(), 0), r#"heroSchema.shape["secret-name"]"#);
    }

    #[test]
    fn test_regex_slashes_are_escaped() {
        let schema = SchemaExpression::factory("string", vec![])
            .call("regex", vec![Argument::Regex(r"^a/b\/c$".to_string())]);
        assert_eq!(schema.render(&plain(), 0), r"z.string().regex(/^a\/b\/c$/)");
    }

    #[test]
    fn test_render_lazy() {
        let schema = SchemaExpression::lazy(SchemaExpression::factory(
            "array",
            vec![Argument::Schema(SchemaExpression::reference("vilainSchema"))],
        ));
        assert_eq!(schema.render(&plain(), 0), "z.lazy(() => z.array(vilainSchema))");
    }
}
