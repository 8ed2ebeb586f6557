use crate::parser::ast::{
    DeclarationBody, KeywordType, LiteralType, TupleElement, TypeDeclaration, TypeMember,
    TypeNode, TypeOperator,
};
use crate::zod::expression::{Argument, Base, Literal, SchemaExpression, ShapeProperty};
use crate::zod::tags::{parse_jsdoc_tags, DefaultValue, JsDocTags};
use log::debug;

/// Structural flags inherited from the surrounding context
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Modifiers {
    pub is_optional: bool,
    pub is_partial: bool,
    pub is_required: bool,
}

/// A declaration translated to its schema, before dependency resolution
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedDeclaration {
    pub name: String,
    pub schema: SchemaExpression,
    /// Declarations referenced by the schema, in first-use order
    pub dependencies: Vec<String>,
    /// Constructs that could not be translated
    pub unsupported: Vec<String>,
    /// The declared type itself must be imported (enums)
    pub requires_type_import: bool,
}

impl TranslatedDeclaration {
    pub fn is_supported(&self) -> bool {
        self.unsupported.is_empty()
    }
}

#[derive(Default)]
struct Context {
    dependencies: Vec<String>,
    unsupported: Vec<String>,
}

impl Context {
    fn depend_on(&mut self, name: &str) {
        if !self.dependencies.iter().any(|d| d == name) {
            self.dependencies.push(name.to_string());
        }
    }

    fn unsupported(&mut self, description: String) -> SchemaExpression {
        let schema = SchemaExpression::unsupported(&description);
        self.unsupported.push(description);
        schema
    }
}

/// Maps TypeScript type nodes onto Zod schema expressions
pub struct SchemaTranslator<'a> {
    get_schema_name: &'a dyn Fn(&str) -> String,
}

impl<'a> SchemaTranslator<'a> {
    pub fn new(get_schema_name: &'a dyn Fn(&str) -> String) -> Self {
        SchemaTranslator { get_schema_name }
    }

    pub fn translate_declaration(&self, declaration: &TypeDeclaration) -> TranslatedDeclaration {
        let tags = declaration
            .doc
            .as_deref()
            .map(parse_jsdoc_tags)
            .unwrap_or_default();
        let mut context = Context::default();
        let mut requires_type_import = false;

        let schema = if !declaration.type_parameters.is_empty() {
            context.unsupported(format!(
                "generic type parameters <{}>",
                declaration.type_parameters.join(", ")
            ))
        } else {
            match &declaration.body {
                DeclarationBody::TypeAlias(node) => {
                    self.translate(node, &tags, Modifiers::default(), &mut context)
                }
                DeclarationBody::Interface { extends, members } => {
                    let schema = self.interface_schema(extends, members, &mut context);
                    self.apply_tags(schema, &tags, Modifiers::default())
                }
                DeclarationBody::Enum(_) => {
                    requires_type_import = true;
                    SchemaExpression::factory(
                        "nativeEnum",
                        vec![Argument::Identifier(declaration.name.clone())],
                    )
                }
            }
        };

        debug!(
            "Translated {} (dependencies: {:?}, unsupported: {:?})",
            declaration.name, context.dependencies, context.unsupported
        );

        TranslatedDeclaration {
            name: declaration.name.clone(),
            schema,
            dependencies: context.dependencies,
            unsupported: context.unsupported,
            requires_type_import,
        }
    }

    fn schema_reference(&self, name: &str, context: &mut Context) -> SchemaExpression {
        context.depend_on(name);
        SchemaExpression::reference(&(self.get_schema_name)(name))
    }

    /// Translate a node, then chain the tag refinements and modifiers
    fn translate(
        &self,
        node: &TypeNode,
        tags: &JsDocTags,
        modifiers: Modifiers,
        context: &mut Context,
    ) -> SchemaExpression {
        match node {
            TypeNode::Parenthesized(inner)
            | TypeNode::Operator {
                operator: TypeOperator::Readonly,
                operand: inner,
            } => self.translate(inner, tags, modifiers, context),
            TypeNode::Reference {
                name,
                type_arguments,
            } if type_arguments.len() == 1 => match name.as_str() {
                "Partial" => self.translate(
                    &type_arguments[0],
                    tags,
                    Modifiers {
                        is_partial: true,
                        ..modifiers
                    },
                    context,
                ),
                "Required" => self.translate(
                    &type_arguments[0],
                    tags,
                    Modifiers {
                        is_required: true,
                        ..modifiers
                    },
                    context,
                ),
                "Readonly" | "NonNullable" => {
                    self.translate(&type_arguments[0], tags, modifiers, context)
                }
                _ => {
                    let schema = self.translate_structure(node, context);
                    self.apply_tags(schema, tags, modifiers)
                }
            },
            TypeNode::Union(members) if members.iter().any(is_nullish) => {
                self.translate_nullish_union(members, tags, modifiers, context)
            }
            _ => {
                let schema = self.translate_structure(node, context);
                self.apply_tags(schema, tags, modifiers)
            }
        }
    }

    /// `T | null | undefined` becomes `T.nullable().optional()`; the
    /// constraint tags refine `T` itself
    fn translate_nullish_union(
        &self,
        members: &[TypeNode],
        tags: &JsDocTags,
        modifiers: Modifiers,
        context: &mut Context,
    ) -> SchemaExpression {
        let remaining: Vec<&TypeNode> = members.iter().filter(|m| !is_nullish(m)).collect();
        if remaining.is_empty() {
            let schema = self.translate_union(members, context);
            return self.apply_tags(schema, tags, modifiers);
        }

        let nullable = members
            .iter()
            .any(|m| *m == TypeNode::Keyword(KeywordType::Null));
        let undefined = members
            .iter()
            .any(|m| *m == TypeNode::Keyword(KeywordType::Undefined));

        let constraints = tags.without_default();
        let mut schema = match remaining.as_slice() {
            [single] => self.translate(single, &constraints, Modifiers::default(), context),
            _ => {
                let owned: Vec<TypeNode> = remaining.iter().map(|m| (*m).clone()).collect();
                let union = self.translate_union(&owned, context);
                self.apply_tags(union, &constraints, Modifiers::default())
            }
        };
        if nullable {
            schema.push_call("nullable", vec![]);
        }

        let modifiers = Modifiers {
            is_optional: modifiers.is_optional || undefined,
            ..modifiers
        };
        self.apply_modifiers(schema, tags.default.as_ref(), modifiers)
    }

    fn translate_union(&self, members: &[TypeNode], context: &mut Context) -> SchemaExpression {
        let options = members
            .iter()
            .map(|m| self.translate(m, &JsDocTags::default(), Modifiers::default(), context))
            .collect();
        SchemaExpression::factory("union", vec![Argument::List(options)])
    }

    fn translate_plain(&self, node: &TypeNode, context: &mut Context) -> SchemaExpression {
        self.translate(node, &JsDocTags::default(), Modifiers::default(), context)
    }

    /// Schema for the shape of a node, without tags or modifiers
    fn translate_structure(&self, node: &TypeNode, context: &mut Context) -> SchemaExpression {
        match node {
            TypeNode::Keyword(keyword) => keyword_schema(*keyword),
            TypeNode::Literal(literal) => SchemaExpression::factory(
                "literal",
                vec![Argument::Literal(literal_argument(literal))],
            ),
            TypeNode::Reference {
                name,
                type_arguments,
            } => self.translate_reference(name, type_arguments, context),
            TypeNode::Array(element) => SchemaExpression::factory(
                "array",
                vec![Argument::Schema(self.translate_plain(element, context))],
            ),
            TypeNode::Tuple(elements) => self.translate_tuple(elements, context),
            TypeNode::Object(members) => self.object_schema(members, context),
            TypeNode::Union(members) => self.translate_union(members, context),
            TypeNode::Intersection(members) => {
                let mut schemas = members.iter().map(|m| self.translate_plain(m, context));
                let mut schema = match schemas.next() {
                    Some(first) => first,
                    None => return SchemaExpression::factory("never", vec![]),
                };
                for other in schemas {
                    schema.push_call("and", vec![Argument::Schema(other)]);
                }
                schema
            }
            TypeNode::Parenthesized(inner) => self.translate_plain(inner, context),
            TypeNode::Function {
                parameters,
                return_type,
            } => {
                let arguments = parameters
                    .iter()
                    .map(|p| {
                        let schema = self.translate_plain(&p.type_node, context);
                        if p.optional {
                            schema.call("optional", vec![])
                        } else {
                            schema
                        }
                    })
                    .map(Argument::Schema)
                    .collect();
                SchemaExpression::factory("function", vec![])
                    .call("args", arguments)
                    .call(
                        "returns",
                        vec![Argument::Schema(self.translate_plain(return_type, context))],
                    )
            }
            TypeNode::IndexedAccess { object, index } => match (&**object, &**index) {
                (
                    TypeNode::Reference {
                        name,
                        type_arguments,
                    },
                    TypeNode::Literal(LiteralType::String(key)),
                ) if type_arguments.is_empty() && !is_builtin(name) => self
                    .schema_reference(name, context)
                    .member("shape")
                    .member(key),
                _ => context.unsupported("indexed access type".to_string()),
            },
            TypeNode::Operator {
                operator: TypeOperator::Readonly,
                operand,
            } => self.translate_plain(operand, context),
            TypeNode::Operator {
                operator: TypeOperator::Keyof,
                ..
            } => context.unsupported("keyof type operator".to_string()),
            TypeNode::Query(name) => context.unsupported(format!("typeof {}", name)),
            TypeNode::Unsupported(description) => context.unsupported(description.clone()),
        }
    }

    fn translate_reference(
        &self,
        name: &str,
        type_arguments: &[TypeNode],
        context: &mut Context,
    ) -> SchemaExpression {
        let schema_of = |index: usize, context: &mut Context| {
            Argument::Schema(self.translate_plain(&type_arguments[index], context))
        };

        match (name, type_arguments.len()) {
            ("Date", 0) => SchemaExpression::factory("date", vec![]),
            ("Array" | "ReadonlyArray", 1) => {
                SchemaExpression::factory("array", vec![schema_of(0, context)])
            }
            ("Promise", 1) => SchemaExpression::factory("promise", vec![schema_of(0, context)]),
            ("Set", 1) => SchemaExpression::factory("set", vec![schema_of(0, context)]),
            ("Record", 2) => SchemaExpression::factory("record", vec![schema_of(1, context)]),
            ("Map", 2) => {
                let key = schema_of(0, context);
                SchemaExpression::factory("map", vec![key, schema_of(1, context)])
            }
            ("Omit" | "Pick", 2) => match string_literal_keys(&type_arguments[1]) {
                Some(keys) => {
                    let target = self.translate_plain(&type_arguments[0], context);
                    target.call(&name.to_lowercase(), vec![Argument::KeyMask(keys)])
                }
                None => context.unsupported(format!("{} with non-literal keys", name)),
            },
            (_, 0) if name.contains('.') => {
                context.unsupported(format!("qualified name {}", name))
            }
            (_, 0) => self.schema_reference(name, context),
            _ => context.unsupported(format!("generic type {}<...>", name)),
        }
    }

    fn translate_tuple(&self, elements: &[TupleElement], context: &mut Context) -> SchemaExpression {
        let mut items = Vec::new();
        let mut rest = None;
        for element in elements {
            if element.rest {
                let item = match &element.type_node {
                    TypeNode::Array(inner) => &**inner,
                    other => other,
                };
                rest = Some(self.translate_plain(item, context));
                continue;
            }
            let schema = self.translate_plain(&element.type_node, context);
            items.push(if element.optional {
                schema.call("optional", vec![])
            } else {
                schema
            });
        }

        let tuple = SchemaExpression::factory("tuple", vec![Argument::List(items)]);
        match rest {
            Some(rest) => tuple.call("rest", vec![Argument::Schema(rest)]),
            None => tuple,
        }
    }

    fn object_schema(&self, members: &[TypeMember], context: &mut Context) -> SchemaExpression {
        let mut properties = Vec::new();
        let mut index_value = None;

        for member in members {
            match member {
                TypeMember::Property(property) => {
                    let tags = property
                        .doc
                        .as_deref()
                        .map(parse_jsdoc_tags)
                        .unwrap_or_default();
                    let modifiers = Modifiers {
                        is_optional: property.optional,
                        ..Modifiers::default()
                    };
                    properties.push(ShapeProperty {
                        name: property.name.clone(),
                        schema: self.translate(&property.type_node, &tags, modifiers, context),
                        doc: property.doc.clone(),
                    });
                }
                TypeMember::Index(signature) => {
                    if index_value.is_some() {
                        debug!("Ignoring extra index signature [{}]", signature.key_name);
                        continue;
                    }
                    let tags = signature
                        .doc
                        .as_deref()
                        .map(parse_jsdoc_tags)
                        .unwrap_or_default();
                    index_value = Some(self.translate(
                        &signature.value_type,
                        &tags,
                        Modifiers::default(),
                        context,
                    ));
                }
            }
        }

        match index_value {
            Some(value) if properties.is_empty() => {
                SchemaExpression::factory("record", vec![Argument::Schema(value)])
            }
            Some(value) => SchemaExpression::factory("object", vec![Argument::Shape(properties)])
                .call("catchall", vec![Argument::Schema(value)]),
            None => SchemaExpression::factory("object", vec![Argument::Shape(properties)]),
        }
    }

    /// `aSchema.extend({ own }).and(bSchema)`
    fn interface_schema(
        &self,
        extends: &[TypeNode],
        members: &[TypeMember],
        context: &mut Context,
    ) -> SchemaExpression {
        let own = self.object_schema(members, context);
        let (first, others) = match extends.split_first() {
            Some(split) => split,
            None => return own,
        };

        let mut schema = self.translate_plain(first, context);
        match own.base {
            Base::Factory { name, arguments } if name == "object" => {
                schema.push_call("extend", arguments);
                schema.operations.extend(own.operations);
            }
            base => schema.push_call(
                "and",
                vec![Argument::Schema(SchemaExpression {
                    base,
                    operations: own.operations,
                })],
            ),
        }
        for other in others {
            let other = self.translate_plain(other, context);
            schema.push_call("and", vec![Argument::Schema(other)]);
        }
        schema
    }

    /// Constraint tags followed by the optionality modifiers
    fn apply_tags(
        &self,
        mut schema: SchemaExpression,
        tags: &JsDocTags,
        modifiers: Modifiers,
    ) -> SchemaExpression {
        let number = |value: &String| vec![Argument::Literal(Literal::Number(value.clone()))];

        if let Some(minimum) = &tags.minimum {
            schema.push_call("min", number(minimum));
        }
        if let Some(maximum) = &tags.maximum {
            schema.push_call("max", number(maximum));
        }
        if let Some(min_length) = &tags.min_length {
            schema.push_call("min", number(min_length));
        }
        if let Some(max_length) = &tags.max_length {
            schema.push_call("max", number(max_length));
        }
        if let Some(format) = tags.format {
            schema.push_call(format.as_str(), vec![]);
        }
        if let Some(pattern) = &tags.pattern {
            schema.push_call("regex", vec![Argument::Regex(pattern.clone())]);
        }

        self.apply_modifiers(schema, tags.default.as_ref(), modifiers)
    }

    fn apply_modifiers(
        &self,
        mut schema: SchemaExpression,
        default: Option<&DefaultValue>,
        modifiers: Modifiers,
    ) -> SchemaExpression {
        if modifiers.is_optional {
            schema.push_call("optional", vec![]);
        }
        if let Some(default) = default {
            schema.push_call("default", vec![Argument::Literal(default_literal(default))]);
        }
        if modifiers.is_partial {
            schema.push_call("partial", vec![]);
        }
        if modifiers.is_required {
            schema.push_call("required", vec![]);
        }
        schema
    }
}

fn is_nullish(node: &TypeNode) -> bool {
    matches!(
        node,
        TypeNode::Keyword(KeywordType::Null) | TypeNode::Keyword(KeywordType::Undefined)
    )
}

fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "Date" | "Array" | "ReadonlyArray" | "Promise" | "Set" | "Map" | "Record"
    )
}

fn keyword_schema(keyword: KeywordType) -> SchemaExpression {
    let name = match keyword {
        KeywordType::String => "string",
        KeywordType::Number => "number",
        KeywordType::Boolean => "boolean",
        KeywordType::BigInt => "bigint",
        KeywordType::Symbol => "symbol",
        KeywordType::Any => "any",
        KeywordType::Unknown => "unknown",
        KeywordType::Never => "never",
        KeywordType::Void => "void",
        KeywordType::Undefined => "undefined",
        KeywordType::Null => "null",
        KeywordType::Object => {
            return SchemaExpression::factory(
                "record",
                vec![Argument::Schema(SchemaExpression::factory("any", vec![]))],
            )
        }
    };
    SchemaExpression::factory(name, vec![])
}

fn literal_argument(literal: &LiteralType) -> Literal {
    match literal {
        LiteralType::String(value) => Literal::String(value.clone()),
        LiteralType::Number(value) => Literal::Number(value.clone()),
        LiteralType::Boolean(value) => Literal::Boolean(*value),
    }
}

fn default_literal(default: &DefaultValue) -> Literal {
    match default {
        DefaultValue::Number(value) => Literal::Number(value.clone()),
        DefaultValue::String(value) => Literal::String(value.clone()),
        DefaultValue::Boolean(value) => Literal::Boolean(*value),
        DefaultValue::Null => Literal::Null,
    }
}

/// Keys of `Omit`/`Pick`: a string literal or a union of them
fn string_literal_keys(node: &TypeNode) -> Option<Vec<String>> {
    match node {
        TypeNode::Literal(LiteralType::String(key)) => Some(vec![key.clone()]),
        TypeNode::Union(members) => members
            .iter()
            .map(|m| match m {
                TypeNode::Literal(LiteralType::String(key)) => Some(key.clone()),
                _ => None,
            })
            .collect(),
        TypeNode::Parenthesized(inner) => string_literal_keys(inner),
        _ => None,
    }
}
