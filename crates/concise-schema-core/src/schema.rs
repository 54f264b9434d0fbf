//! The schema value tree.
//!
//! A [`Schema`] couples one of the fifteen [`SchemaNode`] variants with
//! the docstrings that preceded it and the `#name ... #` definitions
//! declared in its scope. Schemas are built once by the parser and are
//! read-only afterwards; matching never mutates them.
//!
//! References are stored by name only. The match engine re-resolves
//! `@name` lexically by walking the ancestor chain it maintains while
//! descending, so a schema and everything it references move together
//! as one owned value. The parser still rejects a name that no
//! enclosing scope defines.

use std::collections::BTreeMap;
use std::str::FromStr;

use regex::Regex;

use crate::error::ParseError;
use crate::json::Json;
use crate::reader::Reader;

pub(crate) mod export;
pub(crate) mod parser;
pub(crate) mod print;

/// A schema together with its docstrings and scoped definitions.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub node: SchemaNode,
    /// One entry per `/** ... */` comment preceding the body, in order.
    pub docstrings: Vec<String>,
    /// `#name ... #` definitions of this scope, resolvable from any
    /// schema nested below this one.
    pub definitions: Option<BTreeMap<String, Definition>>,
}

/// The closed set of schema variants.
#[derive(Debug, Clone, Default)]
pub enum SchemaNode {
    #[default]
    Any,
    Null,
    Bool,
    Int {
        min: Option<i64>,
        max: Option<i64>,
    },
    Double {
        min: Option<f64>,
        max: Option<f64>,
    },
    Str {
        pattern: Option<Pattern>,
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    Enum {
        values: Vec<Json>,
    },
    Array {
        items: Box<Schema>,
        min_items: Option<usize>,
        max_items: Option<usize>,
        unique: bool,
    },
    Tuple {
        items: Vec<Schema>,
    },
    Object {
        properties: BTreeMap<String, Property>,
        pattern_properties: Vec<PatternProperty>,
        extensible: bool,
    },
    AllOf {
        items: Vec<Schema>,
    },
    AnyOf {
        items: Vec<Schema>,
    },
    OneOf {
        items: Vec<Schema>,
    },
    Not {
        inner: Box<Schema>,
    },
    Reference {
        name: String,
        extended: bool,
    },
}

impl SchemaNode {
    /// Short tag name, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::Any => "any",
            SchemaNode::Null => "null",
            SchemaNode::Bool => "bool",
            SchemaNode::Int { .. } => "int",
            SchemaNode::Double { .. } => "double",
            SchemaNode::Str { .. } => "str",
            SchemaNode::Enum { .. } => "enum",
            SchemaNode::Array { .. } => "array",
            SchemaNode::Tuple { .. } => "tuple",
            SchemaNode::Object { .. } => "object",
            SchemaNode::AllOf { .. } => "allOf",
            SchemaNode::AnyOf { .. } => "anyOf",
            SchemaNode::OneOf { .. } => "oneOf",
            SchemaNode::Not { .. } => "not",
            SchemaNode::Reference { .. } => "reference",
        }
    }
}

/// A named definition: the declaration index keeps printing stable in
/// textual order while the map itself stays keyed by name.
#[derive(Debug, Clone)]
pub struct Definition {
    pub seq: usize,
    pub schema: Schema,
}

/// One declared object property.
#[derive(Debug, Clone)]
pub struct Property {
    pub schema: Schema,
    /// Only optional properties may carry a default.
    pub default: Option<Json>,
    pub optional: bool,
}

/// An object property keyed by regex instead of a literal name.
#[derive(Debug, Clone)]
pub struct PatternProperty {
    pub pattern: Pattern,
    pub schema: Schema,
}

/// A regex kept alongside its source text.
///
/// The compiled form is anchored on both ends, so a match always covers
/// the whole subject. The source is what gets printed and exported.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn compile(source: &str) -> Result<Pattern, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Pattern {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Full-string match against `subject`.
    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }
}

impl Schema {
    /// Wrap a node with no docstrings and no definitions.
    pub fn new(node: SchemaNode) -> Self {
        Schema {
            node,
            docstrings: Vec::new(),
            definitions: None,
        }
    }

    /// Read one schema from `reader`, leaving trailing input intact.
    pub fn parse(reader: &mut Reader<'_>) -> Result<Schema, ParseError> {
        parser::parse_schema(reader)
    }

    /// Multi-line rendering that the parser accepts back.
    pub fn pretty(&self, tab_size: usize) -> String {
        let mut out = String::new();
        print::pretty_impl(self, &mut out, tab_size, 0, true);
        out
    }

    /// Definitions sorted by declaration order, for printing.
    pub(crate) fn definitions_in_decl_order(&self) -> Vec<(&str, &Definition)> {
        let mut defs: Vec<(&str, &Definition)> = self
            .definitions
            .iter()
            .flat_map(|m| m.iter())
            .map(|(name, def)| (name.as_str(), def))
            .collect();
        defs.sort_by_key(|(_, def)| def.seq);
        defs
    }
}

impl FromStr for Schema {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schema::parse(&mut Reader::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_match_is_anchored() {
        let p = Pattern::compile("A").unwrap();
        assert!(p.is_match("A"));
        assert!(!p.is_match("AAA"));
        assert!(!p.is_match("xA"));
        assert_eq!(p.source(), "A");
    }

    #[test]
    fn pattern_alternation_is_grouped_before_anchoring() {
        let p = Pattern::compile("ab|cd").unwrap();
        assert!(p.is_match("ab"));
        assert!(p.is_match("cd"));
        assert!(!p.is_match("abd"));
    }

    #[test]
    fn bad_pattern_fails_to_compile() {
        assert!(Pattern::compile("(").is_err());
    }

    #[test]
    fn default_schema_is_any() {
        assert!(matches!(Schema::default().node, SchemaNode::Any));
    }
}
