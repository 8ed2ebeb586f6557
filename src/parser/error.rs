use std::error::Error;
use std::fmt;

/// A 1-based position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Represents all possible errors that can occur while reading TypeScript source
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Error occurred during lexical analysis
    LexerError(String, Location),
    /// Unexpected token encountered
    UnexpectedToken(String, Location),
    /// Expected token not found
    ExpectedToken(String, Location),
    /// Invalid syntax
    InvalidSyntax(String, Location),
    /// Unexpected end of input
    UnexpectedEndOfInput(Location),
    /// Missing identifier
    MissingIdentifier(String, Location),
    /// Tokenization error
    NomError(String, Location),
}

impl ParseError {
    pub fn location(&self) -> Location {
        match self {
            ParseError::LexerError(_, loc) => *loc,
            ParseError::UnexpectedToken(_, loc) => *loc,
            ParseError::ExpectedToken(_, loc) => *loc,
            ParseError::InvalidSyntax(_, loc) => *loc,
            ParseError::UnexpectedEndOfInput(loc) => *loc,
            ParseError::MissingIdentifier(_, loc) => *loc,
            ParseError::NomError(_, loc) => *loc,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParseError::LexerError(msg, _) => format!("Lexer error: {}", msg),
            ParseError::UnexpectedToken(token, _) => format!("Unexpected token: {}", token),
            ParseError::ExpectedToken(token, _) => format!("Expected token: {}", token),
            ParseError::InvalidSyntax(msg, _) => format!("Invalid syntax: {}", msg),
            ParseError::UnexpectedEndOfInput(_) => "Unexpected end of input".to_string(),
            ParseError::MissingIdentifier(msg, _) => format!("Missing identifier: {}", msg),
            ParseError::NomError(msg, _) => format!("Nom error: {}", msg),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = self.location();
        write!(
            f,
            "Error at line {}, column {}: {}",
            loc.line,
            loc.column,
            self.message()
        )
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for ParseError {
    fn from(error: nom::Err<nom::error::Error<&str>>) -> Self {
        match error {
            nom::Err::Incomplete(_) => {
                ParseError::LexerError("Incomplete input".to_string(), Location::default())
            }
            nom::Err::Error(e) | nom::Err::Failure(e) => ParseError::NomError(
                format!("Failed to parse token: {:?}", e.code),
                Location::default(),
            ),
        }
    }
}

impl Error for ParseError {}

/// A Result type specialized for parser operations
pub type ParseResult<T> = Result<T, ParseError>;
