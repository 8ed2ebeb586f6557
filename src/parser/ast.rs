use super::error::Location;

/// All type-level declarations found at the top level of a source unit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub declarations: Vec<TypeDeclaration>,
}

/// Where a declaration sits in the source text
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub exported: bool,
    pub type_parameters: Vec<String>,
    pub body: DeclarationBody,
    /// Raw body of the JSDoc block directly above the declaration
    pub doc: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationBody {
    Interface {
        extends: Vec<TypeNode>,
        members: Vec<TypeMember>,
    },
    TypeAlias(TypeNode),
    Enum(Vec<EnumMember>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub initializer: Option<LiteralType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordType {
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    Any,
    Unknown,
    Never,
    Void,
    Undefined,
    Null,
    Object,
}

impl KeywordType {
    pub fn from_name(name: &str) -> Option<Self> {
        let keyword = match name {
            "string" => KeywordType::String,
            "number" => KeywordType::Number,
            "boolean" => KeywordType::Boolean,
            "bigint" => KeywordType::BigInt,
            "symbol" => KeywordType::Symbol,
            "any" => KeywordType::Any,
            "unknown" => KeywordType::Unknown,
            "never" => KeywordType::Never,
            "void" => KeywordType::Void,
            "undefined" => KeywordType::Undefined,
            "null" => KeywordType::Null,
            "object" => KeywordType::Object,
            _ => return None,
        };
        Some(keyword)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    String(String),
    /// Kept as written so that `1.50` round-trips untouched
    Number(String),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperator {
    Readonly,
    Keyof,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Keyword(KeywordType),
    Literal(LiteralType),
    Reference {
        name: String,
        type_arguments: Vec<TypeNode>,
    },
    Array(Box<TypeNode>),
    Tuple(Vec<TupleElement>),
    Object(Vec<TypeMember>),
    Union(Vec<TypeNode>),
    Intersection(Vec<TypeNode>),
    Parenthesized(Box<TypeNode>),
    Function {
        parameters: Vec<Parameter>,
        return_type: Box<TypeNode>,
    },
    IndexedAccess {
        object: Box<TypeNode>,
        index: Box<TypeNode>,
    },
    Operator {
        operator: TypeOperator,
        operand: Box<TypeNode>,
    },
    /// `typeof value`
    Query(String),
    /// Syntax that was recognised but has no structural model (conditional,
    /// mapped and template types)
    Unsupported(String),
}

impl TypeNode {
    pub fn reference(name: &str) -> Self {
        TypeNode::Reference {
            name: name.to_string(),
            type_arguments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub type_node: TypeNode,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub optional: bool,
    pub rest: bool,
    pub type_node: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeMember {
    Property(PropertySignature),
    Index(IndexSignature),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySignature {
    pub name: String,
    pub optional: bool,
    pub readonly: bool,
    pub type_node: TypeNode,
    pub doc: Option<String>,
}

/// `[key: string]: Value`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSignature {
    pub key_name: String,
    pub key_type: TypeNode,
    pub value_type: TypeNode,
    pub doc: Option<String>,
}

impl SourceFile {
    pub fn new() -> Self {
        SourceFile {
            declarations: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }
}

impl TypeDeclaration {
    pub fn is_enum(&self) -> bool {
        matches!(self.body, DeclarationBody::Enum(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_source_file() {
        let mut source = SourceFile::new();
        source.declarations.push(TypeDeclaration {
            name: "Person".to_string(),
            exported: true,
            type_parameters: Vec::new(),
            body: DeclarationBody::Interface {
                extends: Vec::new(),
                members: vec![TypeMember::Property(PropertySignature {
                    name: "name".to_string(),
                    optional: false,
                    readonly: false,
                    type_node: TypeNode::Keyword(KeywordType::String),
                    doc: None,
                })],
            },
            doc: None,
            span: Span::default(),
        });
        source.declarations.push(TypeDeclaration {
            name: "Role".to_string(),
            exported: false,
            type_parameters: Vec::new(),
            body: DeclarationBody::Enum(vec![EnumMember {
                name: "Admin".to_string(),
                initializer: None,
            }]),
            doc: None,
            span: Span::default(),
        });

        assert!(source.get("Person").is_some());
        assert!(source.get("Missing").is_none());
        assert!(source.get("Role").map(|d| d.is_enum()).unwrap_or(false));
    }

    #[test]
    fn test_keyword_names() {
        assert_eq!(KeywordType::from_name("bigint"), Some(KeywordType::BigInt));
        assert_eq!(KeywordType::from_name("String"), None);
    }
}
