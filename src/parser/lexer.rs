use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, multispace0, not_line_ending},
    combinator::{map, not, opt, recognize, value, verify},
    error::Error,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::error::{Location, ParseError};

type LexResult<'a, T> = IResult<&'a str, T, Error<&'a str>>;

#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    Export,
    Declare,
    Default,
    Interface,
    Type,
    Enum,
    Const,
    Extends,
    Readonly,
    Keyof,
    Typeof,
    Import,
    Let,
    Var,
    Function,
    Class,
    Identifier(&'a str),
    StringLiteral(String),
    TemplateLiteral(&'a str),
    NumberLiteral(&'a str),
    /// Body of a `/** ... */` comment, delimiters removed
    DocComment(&'a str),
    /// Body of a plain `/* ... */` comment
    BlockComment(&'a str),
    Comment,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    LessThan,
    GreaterThan,
    Comma,
    Semicolon,
    Colon,
    Question,
    Equals,
    Pipe,
    Ampersand,
    Dot,
    Arrow,
    Ellipsis,
    Other(char),
}

#[derive(Debug, PartialEq, Clone)]
pub struct TokenWithLocation<'a> {
    pub token: Token<'a>,
    pub location: Location,
    /// Byte offset of the first character of the token
    pub offset: usize,
    /// Byte offset just past the last character of the token
    pub end: usize,
}

fn keyword_or_identifier(word: &str) -> Token<'_> {
    match word {
        "export" => Token::Export,
        "declare" => Token::Declare,
        "default" => Token::Default,
        "interface" => Token::Interface,
        "type" => Token::Type,
        "enum" => Token::Enum,
        "const" => Token::Const,
        "extends" => Token::Extends,
        "readonly" => Token::Readonly,
        "keyof" => Token::Keyof,
        "typeof" => Token::Typeof,
        "import" => Token::Import,
        "let" => Token::Let,
        "var" => Token::Var,
        "function" => Token::Function,
        "class" => Token::Class,
        _ => Token::Identifier(word),
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn parse_word(input: &str) -> LexResult<'_, Token<'_>> {
    map(
        recognize(pair(
            take_while1(is_identifier_start),
            take_while(is_identifier_char),
        )),
        keyword_or_identifier,
    )(input)
}

fn string_escape(input: &str) -> LexResult<'_, &str> {
    alt((
        value("\\", tag("\\")),
        value("\"", tag("\"")),
        value("'", tag("'")),
        value("\n", tag("n")),
        value("\r", tag("r")),
        value("\t", tag("t")),
        take(1usize),
    ))(input)
}

fn parse_double_quoted(input: &str) -> LexResult<'_, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(is_not("\\\"\n"), '\\', string_escape)),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

fn parse_single_quoted(input: &str) -> LexResult<'_, String> {
    delimited(
        char('\''),
        map(
            opt(escaped_transform(is_not("\\'\n"), '\\', string_escape)),
            Option::unwrap_or_default,
        ),
        char('\''),
    )(input)
}

fn parse_string_literal(input: &str) -> LexResult<'_, Token<'_>> {
    map(
        alt((parse_double_quoted, parse_single_quoted)),
        Token::StringLiteral,
    )(input)
}

fn parse_template_literal(input: &str) -> LexResult<'_, Token<'_>> {
    map(
        delimited(char('`'), take_until("`"), char('`')),
        Token::TemplateLiteral,
    )(input)
}

fn parse_number_literal(input: &str) -> LexResult<'_, Token<'_>> {
    map(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        Token::NumberLiteral,
    )(input)
}

fn parse_comment(input: &str) -> LexResult<'_, Token<'_>> {
    alt((
        map(
            delimited(tag("/**"), take_until("*/"), tag("*/")),
            Token::DocComment,
        ),
        map(
            delimited(tag("/*"), take_until("*/"), tag("*/")),
            Token::BlockComment,
        ),
        map(preceded(tag("//"), not_line_ending), |_| Token::Comment),
    ))(input)
}

fn parse_symbol(input: &str) -> LexResult<'_, Token<'_>> {
    alt((
        map(tag("=>"), |_| Token::Arrow),
        map(tag("..."), |_| Token::Ellipsis),
        map(char('{'), |_| Token::OpenBrace),
        map(char('}'), |_| Token::CloseBrace),
        map(char('('), |_| Token::OpenParen),
        map(char(')'), |_| Token::CloseParen),
        map(char('['), |_| Token::OpenBracket),
        map(char(']'), |_| Token::CloseBracket),
        map(char('<'), |_| Token::LessThan),
        map(char('>'), |_| Token::GreaterThan),
        map(char(','), |_| Token::Comma),
        map(char(';'), |_| Token::Semicolon),
        map(char(':'), |_| Token::Colon),
        map(char('?'), |_| Token::Question),
        map(char('='), |_| Token::Equals),
        map(char('|'), |_| Token::Pipe),
        map(char('&'), |_| Token::Ampersand),
        map(char('.'), |_| Token::Dot),
        map(
            preceded(
                not(tag("/*")),
                verify(anychar, |c: &char| !matches!(*c, '"' | '\'' | '`')),
            ),
            Token::Other,
        ),
    ))(input)
}

fn parse_token(input: &str) -> LexResult<'_, Token<'_>> {
    alt((
        parse_comment,
        parse_word,
        parse_string_literal,
        parse_template_literal,
        parse_number_literal,
        parse_symbol,
    ))(input)
}

/// Maps byte offsets back to line/column positions
struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex {
            source,
            line_starts,
        }
    }

    fn location(&self, offset: usize) -> Location {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self.source[start..offset].chars().count() + 1;
        Location::new(line + 1, column)
    }
}

fn lexer_error(rest: &str, location: Location) -> ParseError {
    let message = if rest.starts_with("/*") {
        "Unterminated block comment".to_string()
    } else if rest.starts_with('"') || rest.starts_with('\'') {
        "Unterminated string literal".to_string()
    } else if rest.starts_with('`') {
        "Unterminated template literal".to_string()
    } else {
        format!(
            "Unrecognized input near {:?}",
            rest.chars().take(10).collect::<String>()
        )
    };
    ParseError::LexerError(message, location)
}

/// Split TypeScript source into located tokens.
///
/// Whitespace is dropped; comments are kept so that the parser can attach
/// JSDoc blocks to the declarations that follow them.
pub fn tokenize(input: &str) -> Result<Vec<TokenWithLocation<'_>>, ParseError> {
    let index = LineIndex::new(input);
    let mut tokens = Vec::new();
    let mut rest = input;

    loop {
        let (after_whitespace, _) = multispace0::<_, Error<&str>>(rest)?;
        rest = after_whitespace;
        if rest.is_empty() {
            break;
        }

        let offset = input.len() - rest.len();
        let location = index.location(offset);
        match parse_token(rest) {
            Ok((remaining, token)) => {
                tokens.push(TokenWithLocation {
                    token,
                    location,
                    offset,
                    end: input.len() - remaining.len(),
                });
                rest = remaining;
            }
            Err(_) => return Err(lexer_error(rest, location)),
        }
    }

    Ok(tokens)
}
