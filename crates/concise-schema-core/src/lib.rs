//! Validate JSON documents against schemas written in a concise DSL.
//!
//! A schema like `{"name":str, ?"age":int(0..120)}` is the compact
//! counterpart of a JSON-Schema document: objects with required,
//! optional, and regex-keyed properties, arrays with size and
//! uniqueness constraints, tuples, ranges, enums, the usual
//! combinators, and `#name ... #` definitions referenced as `@name`
//! with lexical scoping.
//!
//! The crate provides the four moving parts and keeps them decoupled:
//!
//! - [`Json`]: a seven-variant value tree with its own comment-tolerant
//!   parser, compact printer, and aligned pretty printer.
//! - [`Schema`]: the fifteen-variant schema tree, parsed from the DSL,
//!   printable back to it, and exportable to standard JSON Schema via
//!   [`Schema::as_json_schema`].
//! - [`Schema::matches`]: the match engine. Failures come back as a
//!   [`MatchError`] tree borrowing both inputs, renderable as an ASCII
//!   tree or as annotations inline in the pretty-printed document.
//! - [`Reader`]: the byte cursor both parsers share, usable directly to
//!   read several values from one stream.
//!
//! ```
//! use concise_schema_core::{Json, Schema};
//!
//! let schema: Schema = r#"{ "name": str, ?"age": int(0..120) }"#.parse()?;
//! let ok: Json = r#"{"name": "ada", "age": 36}"#.parse()?;
//! assert!(schema.matches(&ok).is_ok());
//!
//! let bad: Json = r#"{"name": "ada", "age": 200}"#.parse()?;
//! let error = schema.matches(&bad).unwrap_err();
//! assert_eq!(error.to_string(), "\
//! . object: bad property `age`
//! `-- int: value (200) > max (120)");
//! # Ok::<(), concise_schema_core::ParseError>(())
//! ```

pub mod error;
mod interop;
pub mod json;
pub mod matcher;
pub mod reader;
pub mod schema;

pub use error::{AccessError, ParseError};
pub use json::Json;
pub use matcher::{MatchError, MatchResult};
pub use reader::Reader;
pub use schema::{Definition, Pattern, PatternProperty, Property, Schema, SchemaNode};
