//! Parser module for the TypeScript to Zod generator
//!
//! This module contains the lexer, AST definitions, and parsing logic
//! for reading the type-level declarations of a TypeScript source file.
//! Value-level statements are skipped without being modelled.

pub mod ast;
pub mod error;
mod lexer;


use crate::parser::ast::{
    DeclarationBody, EnumMember, IndexSignature, KeywordType, LiteralType, Parameter,
    PropertySignature, SourceFile, Span, TupleElement, TypeDeclaration, TypeMember, TypeNode,
    TypeOperator,
};

use error::Location;
pub use error::{ParseError, ParseResult};
pub use lexer::{tokenize, Token, TokenWithLocation};

use log::{debug, trace};

/// Parse TypeScript source into the list of its top-level type declarations
///
/// Interfaces, type aliases and enums are parsed fully, together with the
/// JSDoc block directly above each of them and above each property. Every
/// other statement is skipped.
///
/// # Arguments
///
/// * `input` - A string slice containing the TypeScript source
///
/// # Returns
///
/// * `Result<SourceFile, ParseError>` - The declarations in source order, or a
///   ParseError when the source cannot be tokenized or a declaration is malformed
pub fn parse_source(input: &str) -> Result<SourceFile, ParseError> {
    let tokens = tokenize(input)?;

    for (index, token_with_location) in tokens.iter().enumerate() {
        trace!(
            "Token {}: {:?} at {}",
            index,
            token_with_location.token,
            token_with_location.location
        );
    }

    let mut stream = TokenStream::new(tokens);
    parse_tokenized_input(&mut stream)
}

/// Cursor over the token list with arbitrary lookahead.
///
/// Line comments are dropped up front. Block comments stay in the list but are
/// invisible to `peek`/`next`; only `take_doc` and `take_trailing_comment`
/// see them.
struct TokenStream<'a> {
    tokens: Vec<TokenWithLocation<'a>>,
    position: usize,
    last_end: usize,
    last_location: Location,
}

impl<'a> TokenStream<'a> {
    fn new(tokens: Vec<TokenWithLocation<'a>>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.token != Token::Comment)
            .collect();
        TokenStream {
            tokens,
            position: 0,
            last_end: 0,
            last_location: Location::new(1, 1),
        }
    }

    fn index_of(&self, n: usize) -> Option<usize> {
        self.tokens[self.position..]
            .iter()
            .enumerate()
            .filter(|(_, t)| !is_block_comment(&t.token))
            .nth(n)
            .map(|(i, _)| self.position + i)
    }

    fn peek(&self) -> Option<&TokenWithLocation<'a>> {
        self.index_of(0).map(|i| &self.tokens[i])
    }

    fn peek_token(&self, n: usize) -> Option<&Token<'a>> {
        self.index_of(n).map(|i| &self.tokens[i].token)
    }

    fn check(&self, token: &Token<'_>) -> bool {
        self.peek_token(0) == Some(token)
    }

    fn next(&mut self) -> Option<TokenWithLocation<'a>> {
        let index = self.index_of(0)?;
        self.position = index + 1;
        let token = self.tokens[index].clone();
        self.last_end = token.end;
        self.last_location = token.location;
        Some(token)
    }

    fn eat(&mut self, token: &Token<'_>) -> bool {
        if self.check(token) {
            self.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'_>, what: &str) -> ParseResult<TokenWithLocation<'a>> {
        match self.next() {
            Some(found) if found.token == token => Ok(found),
            Some(found) => Err(ParseError::UnexpectedToken(
                format!("Expected {}, found {:?}", what, found.token),
                found.location,
            )),
            None => Err(ParseError::UnexpectedEndOfInput(self.last_location)),
        }
    }

    /// Consume the block comments at the cursor, returning the last doc comment
    fn take_doc(&mut self) -> Option<&'a str> {
        let mut doc = None;
        while let Some(token) = self.tokens.get(self.position) {
            match token.token {
                Token::DocComment(text) => doc = Some(text),
                Token::BlockComment(_) => {}
                _ => break,
            }
            self.position += 1;
        }
        doc
    }

    /// Consume the block comments at the cursor that sit on the line of the
    /// last consumed token, as in `email: string /* @format email */`
    fn take_trailing_comment(&mut self) -> Option<String> {
        let mut bodies = Vec::new();
        while let Some(token) = self.tokens.get(self.position) {
            if token.location.line != self.last_location.line {
                break;
            }
            match token.token {
                Token::DocComment(text) | Token::BlockComment(text) => bodies.push(text),
                _ => break,
            }
            self.position += 1;
        }
        if bodies.is_empty() {
            None
        } else {
            Some(bodies.join("\n"))
        }
    }

    /// True when the next token sits on a later line than the last consumed one
    fn at_new_line(&self) -> bool {
        self.peek()
            .map_or(false, |t| t.location.line > self.last_location.line)
    }
}

fn is_block_comment(token: &Token<'_>) -> bool {
    matches!(token, Token::DocComment(_) | Token::BlockComment(_))
}

fn parse_tokenized_input(tokens: &mut TokenStream<'_>) -> ParseResult<SourceFile> {
    let mut source_file = SourceFile::new();

    loop {
        let doc = tokens.take_doc();
        let (start, location) = match tokens.peek() {
            Some(token) => (token.offset, token.location),
            None => break,
        };

        let mut modifiers = 0;
        let mut exported = false;
        loop {
            match tokens.peek_token(modifiers) {
                Some(Token::Export) => exported = true,
                Some(Token::Default) if exported => {}
                Some(Token::Declare) => {}
                Some(Token::Const) if tokens.peek_token(modifiers + 1) == Some(&Token::Enum) => {}
                _ => break,
            }
            modifiers += 1;
        }

        let names_declaration = matches!(
            tokens.peek_token(modifiers + 1),
            Some(Token::Identifier(_))
        );
        let is_declaration = names_declaration
            && matches!(
                tokens.peek_token(modifiers),
                Some(Token::Interface) | Some(Token::Type) | Some(Token::Enum)
            );
        if !is_declaration {
            skip_statement(tokens);
            continue;
        }

        for _ in 0..modifiers {
            tokens.next();
        }

        let mut declaration = match tokens.peek_token(0) {
            Some(Token::Interface) => parse_interface(tokens)?,
            Some(Token::Type) => parse_type_alias(tokens)?,
            _ => parse_enum(tokens)?,
        };
        declaration.exported = exported;
        declaration.doc = doc.map(str::to_string);
        declaration.span = Span {
            start,
            end: tokens.last_end,
            location,
        };

        debug!(
            "Parsed declaration {} (exported: {}) at {}",
            declaration.name, declaration.exported, location
        );
        source_file.declarations.push(declaration);
    }

    Ok(source_file)
}

fn new_declaration(
    name: String,
    type_parameters: Vec<String>,
    body: DeclarationBody,
) -> TypeDeclaration {
    TypeDeclaration {
        name,
        exported: false,
        type_parameters,
        body,
        doc: None,
        span: Span::default(),
    }
}

fn starts_declaration(tokens: &TokenStream<'_>) -> bool {
    match tokens.peek_token(0) {
        Some(Token::Export)
        | Some(Token::Import)
        | Some(Token::Declare)
        | Some(Token::Interface)
        | Some(Token::Enum) => true,
        Some(Token::Type) => matches!(tokens.peek_token(1), Some(Token::Identifier(_))),
        _ => false,
    }
}

/// Skip one value-level statement.
///
/// Stops after a `;` or a closing `}` at nesting depth zero, or before a
/// declaration keyword that starts a new line.
fn skip_statement(tokens: &mut TokenStream<'_>) {
    let mut depth = 0usize;
    let mut consumed = false;

    while tokens.peek().is_some() {
        if consumed && depth == 0 && tokens.at_new_line() && starts_declaration(tokens) {
            break;
        }
        let token = match tokens.next() {
            Some(token) => token,
            None => break,
        };
        consumed = true;

        match token.token {
            Token::OpenBrace | Token::OpenParen | Token::OpenBracket => depth += 1,
            Token::CloseParen | Token::CloseBracket => depth = depth.saturating_sub(1),
            Token::CloseBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Token::Semicolon if depth == 0 => break,
            _ => {}
        }
    }
}

/// Skip tokens until a `,`, `;` or unmatched closing bracket at depth zero.
/// The delimiter itself is left in place.
fn skip_until_delimiter(tokens: &mut TokenStream<'_>, count_angles: bool) {
    let mut depth = 0usize;

    while let Some(token) = tokens.peek_token(0) {
        match token {
            Token::OpenBrace | Token::OpenParen | Token::OpenBracket => depth += 1,
            Token::LessThan if count_angles => depth += 1,
            Token::GreaterThan if count_angles => depth = depth.saturating_sub(1),
            Token::CloseBrace | Token::CloseParen | Token::CloseBracket => {
                if depth == 0 {
                    return;
                }
                depth -= 1;
            }
            Token::Comma | Token::Semicolon if depth == 0 => return,
            _ => {}
        }
        tokens.next();
    }
}

/// Skip one bracketed group starting at the cursor
fn skip_balanced(tokens: &mut TokenStream<'_>) {
    let mut depth = 0usize;

    while let Some(token) = tokens.next() {
        match token.token {
            Token::OpenBrace | Token::OpenParen | Token::OpenBracket => depth += 1,
            Token::CloseBrace | Token::CloseParen | Token::CloseBracket => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
            _ => {}
        }
        if depth == 0 {
            return;
        }
    }
}

fn keyword_text(token: &Token<'_>) -> Option<&'static str> {
    let text = match token {
        Token::Export => "export",
        Token::Declare => "declare",
        Token::Default => "default",
        Token::Interface => "interface",
        Token::Type => "type",
        Token::Enum => "enum",
        Token::Const => "const",
        Token::Extends => "extends",
        Token::Readonly => "readonly",
        Token::Keyof => "keyof",
        Token::Typeof => "typeof",
        Token::Import => "import",
        Token::Let => "let",
        Token::Var => "var",
        Token::Function => "function",
        Token::Class => "class",
        _ => return None,
    };
    Some(text)
}

fn parse_identifier(tokens: &mut TokenStream<'_>) -> ParseResult<String> {
    match tokens.next() {
        Some(TokenWithLocation {
            token: Token::Identifier(name),
            ..
        }) => Ok(name.to_string()),
        Some(token) => Err(ParseError::MissingIdentifier(
            format!("found {:?}", token.token),
            token.location,
        )),
        None => Err(ParseError::UnexpectedEndOfInput(tokens.last_location)),
    }
}

/// Property, enum member and parameter names may also be keywords or literals
fn parse_member_name(tokens: &mut TokenStream<'_>) -> ParseResult<String> {
    let token = tokens
        .next()
        .ok_or(ParseError::UnexpectedEndOfInput(tokens.last_location))?;
    match token.token {
        Token::Identifier(name) => Ok(name.to_string()),
        Token::StringLiteral(value) => Ok(value),
        Token::NumberLiteral(value) => Ok(value.to_string()),
        ref other => keyword_text(other).map(str::to_string).ok_or_else(|| {
            ParseError::MissingIdentifier(format!("found {:?}", other), token.location)
        }),
    }
}

fn is_member_name(token: Option<&Token<'_>>) -> bool {
    match token {
        Some(Token::Identifier(_)) => true,
        Some(other) => keyword_text(other).is_some(),
        None => false,
    }
}

fn parse_dotted_name(tokens: &mut TokenStream<'_>) -> ParseResult<String> {
    let mut name = parse_identifier(tokens)?;
    while tokens.check(&Token::Dot) && matches!(tokens.peek_token(1), Some(Token::Identifier(_)))
    {
        tokens.next();
        name.push('.');
        name.push_str(&parse_identifier(tokens)?);
    }
    Ok(name)
}

/// `<T, U extends X = Y>`: only the names are kept
fn parse_type_parameters(tokens: &mut TokenStream<'_>) -> ParseResult<Vec<String>> {
    let mut parameters = Vec::new();
    if !tokens.eat(&Token::LessThan) {
        return Ok(parameters);
    }

    loop {
        tokens.eat(&Token::Const);
        parameters.push(parse_identifier(tokens)?);
        if tokens.eat(&Token::Extends) {
            parse_type(tokens)?;
        }
        if tokens.eat(&Token::Equals) {
            parse_type(tokens)?;
        }
        if !tokens.eat(&Token::Comma) {
            tokens.expect(Token::GreaterThan, "'>'")?;
            break;
        }
        if tokens.eat(&Token::GreaterThan) {
            break;
        }
    }

    Ok(parameters)
}

fn parse_interface(tokens: &mut TokenStream<'_>) -> ParseResult<TypeDeclaration> {
    tokens.expect(Token::Interface, "'interface'")?;
    let name = parse_identifier(tokens)?;
    let type_parameters = parse_type_parameters(tokens)?;

    let mut extends = Vec::new();
    if tokens.eat(&Token::Extends) {
        loop {
            extends.push(parse_type_reference(tokens)?);
            if !tokens.eat(&Token::Comma) {
                break;
            }
        }
    }

    let members = parse_object_members(tokens)?;
    debug!("Parsed interface {} with {} members", name, members.len());

    Ok(new_declaration(
        name,
        type_parameters,
        DeclarationBody::Interface { extends, members },
    ))
}

fn parse_type_alias(tokens: &mut TokenStream<'_>) -> ParseResult<TypeDeclaration> {
    tokens.expect(Token::Type, "'type'")?;
    let name = parse_identifier(tokens)?;
    let type_parameters = parse_type_parameters(tokens)?;
    tokens.expect(Token::Equals, "'='")?;
    let type_node = parse_type(tokens)?;
    tokens.eat(&Token::Semicolon);

    Ok(new_declaration(
        name,
        type_parameters,
        DeclarationBody::TypeAlias(type_node),
    ))
}

fn parse_enum(tokens: &mut TokenStream<'_>) -> ParseResult<TypeDeclaration> {
    tokens.expect(Token::Enum, "'enum'")?;
    let name = parse_identifier(tokens)?;
    tokens.expect(Token::OpenBrace, "'{'")?;

    let mut members = Vec::new();
    loop {
        tokens.take_doc();
        if tokens.eat(&Token::CloseBrace) {
            break;
        }

        let member_name = parse_member_name(tokens)?;
        let mut initializer = None;
        if tokens.eat(&Token::Equals) {
            initializer = match (tokens.peek_token(0), tokens.peek_token(1)) {
                (Some(Token::StringLiteral(value)), Some(Token::Comma))
                | (Some(Token::StringLiteral(value)), Some(Token::CloseBrace)) => {
                    Some(LiteralType::String(value.clone()))
                }
                (Some(Token::NumberLiteral(value)), Some(Token::Comma))
                | (Some(Token::NumberLiteral(value)), Some(Token::CloseBrace)) => {
                    Some(LiteralType::Number(value.to_string()))
                }
                _ => None,
            };
            skip_until_delimiter(tokens, false);
        }

        members.push(EnumMember {
            name: member_name,
            initializer,
        });

        if !tokens.eat(&Token::Comma) {
            tokens.expect(Token::CloseBrace, "'}'")?;
            break;
        }
    }

    Ok(new_declaration(name, Vec::new(), DeclarationBody::Enum(members)))
}

/// Parse `{ ... }` members of an interface body or type literal
fn parse_object_members(tokens: &mut TokenStream<'_>) -> ParseResult<Vec<TypeMember>> {
    tokens.expect(Token::OpenBrace, "'{'")?;
    let mut members = Vec::new();

    loop {
        let doc = tokens.take_doc().map(str::to_string);
        if tokens.eat(&Token::CloseBrace) {
            break;
        }
        if tokens.peek().is_none() {
            return Err(ParseError::UnexpectedEndOfInput(tokens.last_location));
        }

        let mut readonly = false;
        if tokens.check(&Token::Readonly)
            && !matches!(
                tokens.peek_token(1),
                Some(Token::Colon)
                    | Some(Token::Question)
                    | Some(Token::OpenParen)
                    | Some(Token::Comma)
                    | Some(Token::Semicolon)
                    | Some(Token::CloseBrace)
            )
        {
            tokens.next();
            readonly = true;
        }

        let is_index_signature = tokens.check(&Token::OpenBracket)
            && matches!(tokens.peek_token(1), Some(Token::Identifier(_)))
            && tokens.peek_token(2) == Some(&Token::Colon);

        if is_index_signature {
            members.push(TypeMember::Index(parse_index_signature(tokens, doc)?));
        } else if matches!(
            tokens.peek_token(0),
            Some(Token::OpenBracket) | Some(Token::OpenParen) | Some(Token::LessThan)
        ) || tokens.peek_token(0) == Some(&Token::Identifier("new"))
            && matches!(
                tokens.peek_token(1),
                Some(Token::OpenParen) | Some(Token::LessThan)
            )
        {
            // computed keys, call and construct signatures
            debug!("Skipping unsupported object member");
            skip_until_delimiter(tokens, true);
        } else {
            let name = parse_member_name(tokens)?;
            let optional = tokens.eat(&Token::Question);
            let type_node = if tokens.check(&Token::OpenParen) || tokens.check(&Token::LessThan) {
                parse_method_signature(tokens)?
            } else if tokens.eat(&Token::Colon) {
                parse_type(tokens)?
            } else {
                TypeNode::Keyword(KeywordType::Any)
            };
            let doc = match (doc, tokens.take_trailing_comment()) {
                (Some(leading), Some(trailing)) => Some(format!("{}\n{}", leading, trailing)),
                (leading, trailing) => leading.or(trailing),
            };

            members.push(TypeMember::Property(PropertySignature {
                name,
                optional,
                readonly,
                type_node,
                doc,
            }));
        }

        while tokens.eat(&Token::Semicolon) || tokens.eat(&Token::Comma) {}
    }

    Ok(members)
}

fn parse_index_signature(
    tokens: &mut TokenStream<'_>,
    doc: Option<String>,
) -> ParseResult<IndexSignature> {
    tokens.expect(Token::OpenBracket, "'['")?;
    let key_name = parse_identifier(tokens)?;
    tokens.expect(Token::Colon, "':'")?;
    let key_type = parse_type(tokens)?;
    tokens.expect(Token::CloseBracket, "']'")?;
    tokens.eat(&Token::Question);
    tokens.expect(Token::Colon, "':'")?;
    let value_type = parse_type(tokens)?;

    Ok(IndexSignature {
        key_name,
        key_type,
        value_type,
        doc,
    })
}

/// `name(a: A): R` inside an object body, modelled as a function-typed property
fn parse_method_signature(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    parse_type_parameters(tokens)?;
    let parameters = parse_parameters(tokens)?;
    let return_type = if tokens.eat(&Token::Colon) {
        parse_type(tokens)?
    } else {
        TypeNode::Keyword(KeywordType::Any)
    };

    Ok(TypeNode::Function {
        parameters,
        return_type: Box::new(return_type),
    })
}

fn parse_parameters(tokens: &mut TokenStream<'_>) -> ParseResult<Vec<Parameter>> {
    tokens.expect(Token::OpenParen, "'('")?;
    let mut parameters = Vec::new();

    loop {
        if tokens.eat(&Token::CloseParen) {
            break;
        }

        let rest = tokens.eat(&Token::Ellipsis);
        let name = if matches!(
            tokens.peek_token(0),
            Some(Token::OpenBrace) | Some(Token::OpenBracket)
        ) {
            skip_balanced(tokens);
            format!("arg{}", parameters.len())
        } else {
            parse_member_name(tokens)?
        };
        let optional = tokens.eat(&Token::Question);
        let type_node = if tokens.eat(&Token::Colon) {
            parse_type(tokens)?
        } else {
            TypeNode::Keyword(KeywordType::Any)
        };
        if tokens.eat(&Token::Equals) {
            skip_until_delimiter(tokens, false);
        }

        parameters.push(Parameter {
            name,
            optional,
            rest,
            type_node,
        });

        if !tokens.eat(&Token::Comma) {
            tokens.expect(Token::CloseParen, "')'")?;
            break;
        }
    }

    Ok(parameters)
}

/// Parse a full type expression, including conditional types
fn parse_type(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    let check_type = parse_union_type(tokens)?;

    if tokens.eat(&Token::Extends) {
        parse_union_type(tokens)?;
        tokens.expect(Token::Question, "'?'")?;
        parse_type(tokens)?;
        tokens.expect(Token::Colon, "':'")?;
        parse_type(tokens)?;
        return Ok(TypeNode::Unsupported("conditional type".to_string()));
    }

    Ok(check_type)
}

fn parse_union_type(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    tokens.eat(&Token::Pipe);
    let mut types = vec![parse_intersection_type(tokens)?];

    while tokens.eat(&Token::Pipe) {
        types.push(parse_intersection_type(tokens)?);
    }

    if types.len() == 1 {
        Ok(types.remove(0))
    } else {
        Ok(TypeNode::Union(types))
    }
}

fn parse_intersection_type(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    tokens.eat(&Token::Ampersand);
    let mut types = vec![parse_postfix_type(tokens)?];

    while tokens.eat(&Token::Ampersand) {
        types.push(parse_postfix_type(tokens)?);
    }

    if types.len() == 1 {
        Ok(types.remove(0))
    } else {
        Ok(TypeNode::Intersection(types))
    }
}

/// Array suffixes and indexed access
fn parse_postfix_type(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    let mut node = parse_primary_type(tokens)?;

    // a bracket on a fresh line opens the next member, not an array suffix
    while tokens.check(&Token::OpenBracket) && !tokens.at_new_line() {
        tokens.next();
        if tokens.eat(&Token::CloseBracket) {
            node = TypeNode::Array(Box::new(node));
        } else {
            let index = parse_type(tokens)?;
            tokens.expect(Token::CloseBracket, "']'")?;
            node = TypeNode::IndexedAccess {
                object: Box::new(node),
                index: Box::new(index),
            };
        }
    }

    Ok(node)
}

fn parse_primary_type(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    let token = tokens
        .peek()
        .cloned()
        .ok_or(ParseError::UnexpectedEndOfInput(tokens.last_location))?;

    match token.token {
        Token::OpenParen => {
            if is_function_type(tokens) {
                parse_function_type(tokens)
            } else {
                tokens.next();
                let inner = parse_type(tokens)?;
                tokens.expect(Token::CloseParen, "')'")?;
                Ok(TypeNode::Parenthesized(Box::new(inner)))
            }
        }
        Token::LessThan => parse_function_type(tokens),
        Token::OpenBrace => {
            if is_mapped_type(tokens) {
                skip_balanced(tokens);
                Ok(TypeNode::Unsupported("mapped type".to_string()))
            } else {
                Ok(TypeNode::Object(parse_object_members(tokens)?))
            }
        }
        Token::OpenBracket => parse_tuple_type(tokens),
        Token::Readonly => parse_type_operator(tokens, TypeOperator::Readonly),
        Token::Keyof => parse_type_operator(tokens, TypeOperator::Keyof),
        Token::Typeof => {
            tokens.next();
            Ok(TypeNode::Query(parse_dotted_name(tokens)?))
        }
        Token::StringLiteral(value) => {
            tokens.next();
            Ok(TypeNode::Literal(LiteralType::String(value)))
        }
        Token::NumberLiteral(value) => {
            tokens.next();
            Ok(TypeNode::Literal(LiteralType::Number(value.to_string())))
        }
        Token::TemplateLiteral(text) => {
            tokens.next();
            if text.contains("${") {
                Ok(TypeNode::Unsupported("template literal type".to_string()))
            } else {
                Ok(TypeNode::Literal(LiteralType::String(text.to_string())))
            }
        }
        Token::Identifier("true") => {
            tokens.next();
            Ok(TypeNode::Literal(LiteralType::Boolean(true)))
        }
        Token::Identifier("false") => {
            tokens.next();
            Ok(TypeNode::Literal(LiteralType::Boolean(false)))
        }
        Token::Identifier("infer") => {
            tokens.next();
            parse_identifier(tokens)?;
            Ok(TypeNode::Unsupported("infer type".to_string()))
        }
        Token::Identifier("new") => {
            tokens.next();
            parse_function_type(tokens)?;
            Ok(TypeNode::Unsupported("constructor type".to_string()))
        }
        Token::Identifier(name) => {
            match KeywordType::from_name(name) {
                Some(keyword) if tokens.peek_token(1) != Some(&Token::Dot) => {
                    tokens.next();
                    Ok(TypeNode::Keyword(keyword))
                }
                _ => parse_type_reference(tokens),
            }
        }
        other => Err(ParseError::UnexpectedToken(
            format!("{:?} in type position", other),
            token.location,
        )),
    }
}

fn parse_type_operator(
    tokens: &mut TokenStream<'_>,
    operator: TypeOperator,
) -> ParseResult<TypeNode> {
    tokens.next();
    let operand = parse_postfix_type(tokens)?;
    Ok(TypeNode::Operator {
        operator,
        operand: Box::new(operand),
    })
}

/// A `(` starts a function type when its matching `)` is followed by `=>`
fn is_function_type(tokens: &TokenStream<'_>) -> bool {
    let mut depth = 0usize;
    let mut n = 0;

    while let Some(token) = tokens.peek_token(n) {
        match token {
            Token::OpenParen => depth += 1,
            Token::CloseParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return tokens.peek_token(n + 1) == Some(&Token::Arrow);
                }
            }
            _ => {}
        }
        n += 1;
    }

    false
}

/// `{ [K in Keys]: ... }`, with optional `readonly`/`+`/`-` modifiers
fn is_mapped_type(tokens: &TokenStream<'_>) -> bool {
    let mut n = 1;
    while matches!(
        tokens.peek_token(n),
        Some(Token::Readonly) | Some(Token::Other('+')) | Some(Token::Other('-'))
    ) {
        n += 1;
    }

    tokens.peek_token(n) == Some(&Token::OpenBracket)
        && matches!(tokens.peek_token(n + 1), Some(Token::Identifier(_)))
        && tokens.peek_token(n + 2) == Some(&Token::Identifier("in"))
}

fn parse_function_type(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    parse_type_parameters(tokens)?;
    let parameters = parse_parameters(tokens)?;
    tokens.expect(Token::Arrow, "'=>'")?;
    let return_type = parse_type(tokens)?;

    Ok(TypeNode::Function {
        parameters,
        return_type: Box::new(return_type),
    })
}

fn parse_tuple_type(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    tokens.expect(Token::OpenBracket, "'['")?;
    let mut elements = Vec::new();

    loop {
        if tokens.eat(&Token::CloseBracket) {
            break;
        }

        let rest = tokens.eat(&Token::Ellipsis);
        let mut optional = false;

        // labelled elements: `[name: string, age?: number]`
        let labelled = is_member_name(tokens.peek_token(0))
            && (tokens.peek_token(1) == Some(&Token::Colon)
                || tokens.peek_token(1) == Some(&Token::Question)
                    && tokens.peek_token(2) == Some(&Token::Colon));
        if labelled {
            tokens.next();
            optional = tokens.eat(&Token::Question);
            tokens.expect(Token::Colon, "':'")?;
        }

        let type_node = parse_type(tokens)?;
        optional |= tokens.eat(&Token::Question);

        elements.push(TupleElement {
            type_node,
            optional,
            rest,
        });

        if !tokens.eat(&Token::Comma) {
            tokens.expect(Token::CloseBracket, "']'")?;
            break;
        }
    }

    Ok(TypeNode::Tuple(elements))
}

fn parse_type_reference(tokens: &mut TokenStream<'_>) -> ParseResult<TypeNode> {
    let name = parse_dotted_name(tokens)?;
    let mut type_arguments = Vec::new();

    if tokens.eat(&Token::LessThan) {
        loop {
            type_arguments.push(parse_type(tokens)?);
            if !tokens.eat(&Token::Comma) {
                tokens.expect(Token::GreaterThan, "'>'")?;
                break;
            }
        }
    }

    Ok(TypeNode::Reference {
        name,
        type_arguments,
    })
}
