//! JSDoc validation tags
//!
//! Reads `@minimum`, `@maximum`, `@minLength`, `@maxLength`, `@format`,
//! `@pattern` and `@default` out of a doc comment. Malformed values are
//! dropped silently; extraction never fails.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"(?:^|\s)@([A-Za-z]+)").unwrap();
    static ref INTEGER_RE: Regex = Regex::new(r"^[+-]?\d+").unwrap();
}

/// String formats with a dedicated Zod check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Uuid,
    Url,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Uuid => "uuid",
            Format::Url => "url",
        }
    }
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Format::Email),
            "uuid" => Ok(Format::Uuid),
            "url" => Ok(Format::Url),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal carried by a `@default` tag
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

impl DefaultValue {
    /// JSON literals are taken as typed values, anything else as raw text
    fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Number(n)) => DefaultValue::Number(n.to_string()),
            Ok(Value::Bool(b)) => DefaultValue::Boolean(b),
            Ok(Value::String(s)) => DefaultValue::String(s),
            Ok(Value::Null) => DefaultValue::Null,
            _ => DefaultValue::String(text.to_string()),
        }
    }
}

/// Validation constraints recognised in one doc comment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsDocTags {
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub default: Option<DefaultValue>,
    pub min_length: Option<String>,
    pub max_length: Option<String>,
    pub format: Option<Format>,
    pub pattern: Option<String>,
}

impl JsDocTags {
    pub fn is_empty(&self) -> bool {
        *self == JsDocTags::default()
    }

    /// Same tags without the `@default` value
    pub fn without_default(&self) -> JsDocTags {
        JsDocTags {
            default: None,
            ..self.clone()
        }
    }
}

/// `parseInt` semantics: a leading signed integer, trailing text ignored.
/// The digits are kept as text so values past `i64` survive.
fn parse_integer(text: &str) -> Option<String> {
    let matched = INTEGER_RE.find(text)?.as_str();
    let (negative, digits) = match matched.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, matched.trim_start_matches('+')),
    };

    let digits = digits.trim_start_matches('0');
    Some(match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{}", digits),
        (false, false) => digits.to_string(),
    })
}

/// Strip the leading ` * ` decoration from every line of a doc comment body
fn normalize(doc: &str) -> String {
    doc.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the recognised tags from a doc comment body (without `/**` `*/`)
pub fn parse_jsdoc_tags(doc: &str) -> JsDocTags {
    let text = normalize(doc);
    let mut tags = JsDocTags::default();

    let matches: Vec<_> = TAG_RE.captures_iter(&text).collect();
    for (i, captures) in matches.iter().enumerate() {
        let (whole, name) = match (captures.get(0), captures.get(1)) {
            (Some(whole), Some(name)) => (whole, name.as_str()),
            _ => continue,
        };
        let value_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());
        let value = text[whole.end()..value_end].trim();

        apply_tag(&mut tags, name, value);
    }

    tags
}

fn apply_tag(tags: &mut JsDocTags, name: &str, value: &str) {
    match name {
        "minimum" | "maximum" | "minLength" | "maxLength" => {
            let parsed = match parse_integer(value) {
                Some(parsed) => parsed,
                None => {
                    debug!("Dropping @{} tag with non-numeric value {:?}", name, value);
                    return;
                }
            };
            match name {
                "minimum" => tags.minimum = Some(parsed),
                "maximum" => tags.maximum = Some(parsed),
                "minLength" => tags.min_length = Some(parsed),
                _ => tags.max_length = Some(parsed),
            }
        }
        "format" => match value.parse::<Format>() {
            Ok(format) => tags.format = Some(format),
            Err(()) => debug!("Dropping @format tag with unknown format {:?}", value),
        },
        "pattern" => {
            if value.is_empty() {
                debug!("Dropping empty @pattern tag");
            } else {
                tags.pattern = Some(value.to_string());
            }
        }
        "default" => {
            if value.is_empty() {
                debug!("Dropping empty @default tag");
            } else {
                tags.default = Some(DefaultValue::parse(value));
            }
        }
        _ => {}
    }
}
