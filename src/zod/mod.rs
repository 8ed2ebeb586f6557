//! Module for Zod schema generation from TypeScript declarations
//!
//! This module contains the JSDoc tag extraction, the translation of type
//! nodes into schema expressions, the dependency resolution between schemas
//! and the rendering of the generated files.

pub mod tags;
pub mod expression;
pub mod translator;
pub mod resolver;
pub mod emitter;
pub mod generator;
pub mod writer;
pub mod config;

#[cfg(test)]
mod tests;

pub use tags::{parse_jsdoc_tags, JsDocTags};
pub use generator::{generate, GenerateError, GenerateOutput};
pub use resolver::{Resolution, ResolutionState};
pub use writer::TypeScriptWriter;
pub use config::{default_schema_name, Config, ConfigError, GenerateOptions};
