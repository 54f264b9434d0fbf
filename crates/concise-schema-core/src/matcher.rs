//! The match engine.
//!
//! [`Schema::matches`] walks the schema and document trees together and
//! either succeeds or returns a [`MatchError`] tree. Errors are data,
//! not exceptions: an invalid document is the normal outcome here, and
//! matching itself is a pure read-only traversal. Every error node
//! points back into the document and schema it was produced from, so
//! the borrow checker keeps both trees alive for as long as the error
//! tree exists.
//!
//! References resolve lazily: while descending, the engine keeps the
//! chain of ancestor schemas, and `@name` searches it from the
//! innermost scope outward. Scopes above the defining one are cut away
//! while matching the target so lookup stays lexical rather than
//! dynamic.

use std::collections::BTreeMap;
use std::fmt;

use crate::json::Json;
use crate::schema::{Pattern, PatternProperty, Property, Schema, SchemaNode};

pub(crate) mod annotate;

/// `Ok` on match, otherwise the root of the error tree.
pub type MatchResult<'s, 'j> = Result<(), MatchError<'s, 'j>>;

/// One node of the failure tree.
///
/// `json` is the subvalue that violated the schema; `schema` is filled
/// in by the engine as the per-variant validator returns. Composite
/// failures carry their cause in `nested`; `anyOf`/`oneOf` aggregate
/// one entry per failed branch.
#[derive(Debug, Clone)]
pub struct MatchError<'s, 'j> {
    message: String,
    json: &'j Json,
    schema: Option<&'s Schema>,
    nested: Vec<MatchError<'s, 'j>>,
}

impl<'s, 'j> MatchError<'s, 'j> {
    fn new(json: &'j Json, message: impl Into<String>) -> Self {
        MatchError {
            message: message.into(),
            json,
            schema: None,
            nested: Vec::new(),
        }
    }

    fn with_nested(json: &'j Json, message: impl Into<String>, nested: Self) -> Self {
        MatchError {
            message: message.into(),
            json,
            schema: None,
            nested: vec![nested],
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The document subvalue this error is about.
    pub fn json(&self) -> &'j Json {
        self.json
    }

    /// The schema variant that rejected the value.
    pub fn schema(&self) -> Option<&'s Schema> {
        self.schema
    }

    pub fn nested(&self) -> &[MatchError<'s, 'j>] {
        &self.nested
    }
}

/// ASCII tree rendering: the root message prefixed `. `, causes drawn
/// with `|--` and `` `-- `` connectors.
impl fmt::Display for MatchError<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_tree(self, f, 0)
    }
}

fn fmt_tree(error: &MatchError<'_, '_>, f: &mut fmt::Formatter<'_>, offset: usize) -> fmt::Result {
    const TAB: usize = 4;
    if offset == 0 {
        f.write_str(". ")?;
    }
    f.write_str(&error.message)?;
    if let Some((last, rest)) = error.nested.split_last() {
        writeln!(f)?;
        for child in rest {
            write!(f, "{:offset$}|-- ", "")?;
            fmt_tree(child, f, offset + TAB)?;
            writeln!(f)?;
        }
        write!(f, "{:offset$}`-- ", "")?;
        fmt_tree(last, f, offset + TAB)?;
    }
    Ok(())
}

impl Schema {
    /// Match `json` against this schema.
    ///
    /// Read-only on both trees; the same schema may run any number of
    /// concurrent matches. Panics if a reference names a definition no
    /// enclosing scope provides, which the parser makes unrepresentable
    /// for parsed schemas.
    pub fn matches<'s, 'j>(&'s self, json: &'j Json) -> MatchResult<'s, 'j> {
        let mut scopes = Vec::new();
        let result = match_schema(self, json, &mut scopes, false);
        if let Err(error) = &result {
            tracing::debug!(cause = error.message(), "document rejected");
        }
        result
    }
}

fn match_schema<'s, 'j>(
    schema: &'s Schema,
    json: &'j Json,
    scopes: &mut Vec<&'s Schema>,
    allow_extensions: bool,
) -> MatchResult<'s, 'j> {
    scopes.push(schema);
    let mut result = match_node(schema, json, scopes, allow_extensions);
    scopes.pop();
    if let Err(error) = &mut result {
        error.schema = Some(schema);
    }
    result
}

fn match_node<'s, 'j>(
    schema: &'s Schema,
    json: &'j Json,
    scopes: &mut Vec<&'s Schema>,
    allow_extensions: bool,
) -> MatchResult<'s, 'j> {
    match &schema.node {
        SchemaNode::Any => Ok(()),
        SchemaNode::Null => match json {
            Json::Null => Ok(()),
            _ => Err(MatchError::new(json, "null: not a null")),
        },
        SchemaNode::Bool => match json {
            Json::Boolean(_) => Ok(()),
            _ => Err(MatchError::new(json, "bool: not a bool")),
        },
        SchemaNode::Int { min, max } => match_int(json, *min, *max),
        SchemaNode::Double { min, max } => match_double(json, *min, *max),
        SchemaNode::Str {
            pattern,
            min_len,
            max_len,
        } => match_str(json, pattern.as_ref(), *min_len, *max_len),
        SchemaNode::Enum { values } => {
            if values.contains(json) {
                Ok(())
            } else {
                let listed = Json::Array(values.clone());
                Err(MatchError::new(json, format!("enum: not one of {listed}")))
            }
        }
        SchemaNode::Array {
            items,
            min_items,
            max_items,
            unique,
        } => match_array(items, json, scopes, *min_items, *max_items, *unique),
        SchemaNode::Tuple { items } => match_tuple(items, json, scopes),
        SchemaNode::Object {
            properties,
            pattern_properties,
            extensible,
        } => match_object(
            properties,
            pattern_properties,
            json,
            scopes,
            *extensible || allow_extensions,
        ),
        SchemaNode::AllOf { items } => {
            for (i, item) in items.iter().enumerate() {
                if let Err(cause) = match_schema(item, json, scopes, false) {
                    return Err(MatchError::with_nested(
                        json,
                        format!("allOf: schema[{i}] fails"),
                        cause,
                    ));
                }
            }
            Ok(())
        }
        SchemaNode::AnyOf { items } => {
            let mut aggregate = MatchError::new(json, "anyOf: no match");
            for item in items {
                match match_schema(item, json, scopes, false) {
                    Ok(()) => return Ok(()),
                    Err(cause) => aggregate.nested.push(cause),
                }
            }
            Err(aggregate)
        }
        SchemaNode::OneOf { items } => {
            let mut aggregate = MatchError::new(json, "oneOf: no match");
            let mut matched = 0usize;
            for item in items {
                match match_schema(item, json, scopes, false) {
                    Ok(()) => {
                        matched += 1;
                        if matched > 1 {
                            return Err(MatchError::new(json, "oneOf: more than one match"));
                        }
                    }
                    Err(cause) => aggregate.nested.push(cause),
                }
            }
            if matched == 0 {
                Err(aggregate)
            } else {
                Ok(())
            }
        }
        SchemaNode::Not { inner } => match match_schema(inner, json, scopes, false) {
            Ok(()) => Err(MatchError::new(json, "not: matches")),
            Err(_) => Ok(()),
        },
        SchemaNode::Reference { name, extended } => {
            let Some((depth, target)) = resolve(name, scopes) else {
                panic!("unresolved reference `@{name}`");
            };
            // Scopes above the defining one are not lexically visible
            // from the definition site.
            let hidden = scopes.split_off(depth + 1);
            let result = match_schema(target, json, scopes, *extended);
            scopes.extend(hidden);
            result
        }
    }
}

/// Innermost enclosing scope defining `name`, with its stack index.
fn resolve<'s>(name: &str, scopes: &[&'s Schema]) -> Option<(usize, &'s Schema)> {
    scopes.iter().enumerate().rev().find_map(|(depth, &scope)| {
        scope
            .definitions
            .as_ref()
            .and_then(|defs| defs.get(name))
            .map(|def| (depth, &def.schema))
    })
}

fn match_int<'s, 'j>(json: &'j Json, min: Option<i64>, max: Option<i64>) -> MatchResult<'s, 'j> {
    // A double never satisfies `int`, even when integer-valued.
    let Json::Integer(value) = json else {
        return Err(MatchError::new(json, "int: not an integer"));
    };
    if let Some(m) = min {
        if *value < m {
            return Err(MatchError::new(
                json,
                format!("int: value ({value}) < min ({m})"),
            ));
        }
    }
    if let Some(m) = max {
        if *value > m {
            return Err(MatchError::new(
                json,
                format!("int: value ({value}) > max ({m})"),
            ));
        }
    }
    Ok(())
}

fn match_double<'s, 'j>(json: &'j Json, min: Option<f64>, max: Option<f64>) -> MatchResult<'s, 'j> {
    // Integers widen: `double` accepts either number tag.
    let value = match json {
        Json::Integer(i) => *i as f64,
        Json::Double(d) => *d,
        _ => return Err(MatchError::new(json, "double: not a double")),
    };
    if let Some(m) = min {
        if value < m {
            return Err(MatchError::new(
                json,
                format!("double: value ({value}) < min ({m})"),
            ));
        }
    }
    if let Some(m) = max {
        if value > m {
            return Err(MatchError::new(
                json,
                format!("double: value ({value}) > max ({m})"),
            ));
        }
    }
    Ok(())
}

fn match_str<'s, 'j>(
    json: &'j Json,
    pattern: Option<&Pattern>,
    min_len: Option<usize>,
    max_len: Option<usize>,
) -> MatchResult<'s, 'j> {
    let Json::String(s) = json else {
        return Err(MatchError::new(json, "str: not a string"));
    };
    // Lengths are byte counts of the stored representation.
    let len = s.len();
    if let Some(m) = min_len {
        if len < m {
            return Err(MatchError::new(
                json,
                format!("str: length ({len}) < minLength ({m})"),
            ));
        }
    }
    if let Some(m) = max_len {
        if len > m {
            return Err(MatchError::new(
                json,
                format!("str: length ({len}) > maxLength ({m})"),
            ));
        }
    }
    if let Some(p) = pattern {
        if !p.is_match(s) {
            return Err(MatchError::new(json, "str: pattern mismatch"));
        }
    }
    Ok(())
}

fn match_array<'s, 'j>(
    items: &'s Schema,
    json: &'j Json,
    scopes: &mut Vec<&'s Schema>,
    min_items: Option<usize>,
    max_items: Option<usize>,
    unique: bool,
) -> MatchResult<'s, 'j> {
    let Json::Array(elements) = json else {
        return Err(MatchError::new(json, "array: not an array"));
    };
    let size = elements.len();
    if let Some(m) = min_items {
        if size < m {
            return Err(MatchError::new(
                json,
                format!("array: size ({size}) < min items ({m})"),
            ));
        }
    }
    if let Some(m) = max_items {
        if size > m {
            return Err(MatchError::new(
                json,
                format!("array: size ({size}) > max items ({m})"),
            ));
        }
    }
    for (i, element) in elements.iter().enumerate() {
        if let Err(cause) = match_schema(items, element, scopes, false) {
            return Err(MatchError::with_nested(
                json,
                format!("array: bad item [{i}]"),
                cause,
            ));
        }
    }
    if unique {
        let mut sorted = elements.clone();
        sorted.sort();
        if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(MatchError::new(json, "array: items are not unique"));
        }
    }
    Ok(())
}

fn match_tuple<'s, 'j>(
    items: &'s [Schema],
    json: &'j Json,
    scopes: &mut Vec<&'s Schema>,
) -> MatchResult<'s, 'j> {
    let Json::Array(elements) = json else {
        return Err(MatchError::new(json, "tuple: is not an array"));
    };
    if elements.len() != items.len() {
        return Err(MatchError::new(
            json,
            format!("tuple: size of tuple != {}", items.len()),
        ));
    }
    for (i, (item, element)) in items.iter().zip(elements).enumerate() {
        if let Err(cause) = match_schema(item, element, scopes, false) {
            return Err(MatchError::with_nested(
                json,
                format!("tuple: bad element [{i}]"),
                cause,
            ));
        }
    }
    Ok(())
}

fn match_object<'s, 'j>(
    properties: &'s BTreeMap<String, Property>,
    pattern_properties: &'s [PatternProperty],
    json: &'j Json,
    scopes: &mut Vec<&'s Schema>,
    allow_unknown: bool,
) -> MatchResult<'s, 'j> {
    let Json::Object(members) = json else {
        return Err(MatchError::new(json, "object: not an object"));
    };
    for (key, value) in members {
        let mut is_pattern_property = false;
        for pp in pattern_properties {
            if pp.pattern.is_match(key) {
                is_pattern_property = true;
                if let Err(cause) = match_schema(&pp.schema, value, scopes, false) {
                    return Err(MatchError::with_nested(
                        json,
                        format!("object: bad pattern property `{key}`"),
                        cause,
                    ));
                }
            }
        }
        if let Some(prop) = properties.get(key) {
            if let Err(cause) = match_schema(&prop.schema, value, scopes, false) {
                return Err(MatchError::with_nested(
                    json,
                    format!("object: bad property `{key}`"),
                    cause,
                ));
            }
        } else if !is_pattern_property && !allow_unknown {
            return Err(MatchError::new(
                json,
                format!("object: unexpected property `{key}`"),
            ));
        }
    }
    for (key, prop) in properties {
        if !prop.optional && !members.contains_key(key) {
            return Err(MatchError::new(
                json,
                format!("object: no property `{key}`"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(schema: &str, json: &str) -> Result<(), String> {
        let schema: Schema = schema.parse().unwrap();
        let json: Json = json.parse().unwrap();
        schema.matches(&json).map_err(|e| e.message().to_string())
    }

    #[test]
    fn int_rejects_integer_valued_double() {
        assert_eq!(check("int", "1.0"), Err("int: not an integer".into()));
        assert_eq!(check("int", "1"), Ok(()));
    }

    #[test]
    fn double_accepts_integer() {
        assert_eq!(check("double", "1"), Ok(()));
        assert_eq!(check("double(2..)", "1"), Err("double: value (1) < min (2)".into()));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert_eq!(check("int(1..10)", "1"), Ok(()));
        assert_eq!(check("int(1..10)", "10"), Ok(()));
        assert_eq!(check("int(1..10)", "0"), Err("int: value (0) < min (1)".into()));
        assert_eq!(check("int(1..10)", "11"), Err("int: value (11) > max (10)".into()));
        assert_eq!(check("double(1.5..10.0)", "1.5"), Ok(()));
    }

    #[test]
    fn string_length_is_in_bytes() {
        // Two-byte UTF-8 scalar: one char, two bytes.
        assert_eq!(check("str{2}", "\"é\""), Ok(()));
        assert_eq!(check("str{,1}", "\"é\""), Err("str: length (2) > maxLength (1)".into()));
    }

    #[test]
    fn pattern_is_full_anchored() {
        assert_eq!(check("str(\"A\")", "\"AAA\""), Err("str: pattern mismatch".into()));
        assert_eq!(check("str(\"A+\")", "\"AAA\""), Ok(()));
    }

    #[test]
    fn enum_uses_structural_equality() {
        assert_eq!(check("enum(1,\"2\")", "\"2\""), Ok(()));
        assert_eq!(
            check("enum(1,\"2\")", "2"),
            Err("enum: not one of [1,\"2\"]".into())
        );
        // 1 (integer) and 1.0 (double) are different tags.
        assert_eq!(
            check("enum(1)", "1.0"),
            Err("enum: not one of [1]".into())
        );
    }

    #[test]
    fn unique_arrays_compare_structurally() {
        assert_eq!(check("[unique int]", "[1,2,3]"), Ok(()));
        assert_eq!(
            check("[unique int]", "[1,2,1]"),
            Err("array: items are not unique".into())
        );
        // Different tags are never duplicates of each other.
        assert_eq!(check("[unique any]", "[1, 1.0, \"1\"]"), Ok(()));
    }

    #[test]
    fn array_reports_first_bad_index() {
        let schema: Schema = "[int]".parse().unwrap();
        let json: Json = "[1, \"x\", false]".parse().unwrap();
        let error = schema.matches(&json).unwrap_err();
        assert_eq!(error.message(), "array: bad item [1]");
        assert_eq!(error.nested().len(), 1);
        assert_eq!(error.nested()[0].message(), "int: not an integer");
        assert!(std::ptr::eq(error.nested()[0].json(), &json.get_array().unwrap()[1]));
    }

    #[test]
    fn tuple_requires_exact_arity() {
        assert_eq!(check("(int,int)", "[1,2]"), Ok(()));
        assert_eq!(check("(int,int)", "[1]"), Err("tuple: size of tuple != 2".into()));
        assert_eq!(check("(int,int)", "[1,\"x\"]"), Err("tuple: bad element [1]".into()));
    }

    #[test]
    fn object_property_rules() {
        assert_eq!(check("{ \"x\": int }", "{}"), Err("object: no property `x`".into()));
        assert_eq!(check("{ \"x\": int }", "{\"x\": 2}"), Ok(()));
        assert_eq!(check("{}", "{\"z\": 2}"), Err("object: unexpected property `z`".into()));
        assert_eq!(check("extensible {}", "{\"z\": 2}"), Ok(()));
        assert_eq!(check("{ ?\"x\": int }", "{}"), Ok(()));
        // Defaults never participate in matching.
        assert_eq!(check("{ ?\"x\": int = 5 }", "{}"), Ok(()));
        assert_eq!(
            check("{ \"x\": int }", "{\"x\": \"s\"}"),
            Err("object: bad property `x`".into())
        );
    }

    #[test]
    fn pattern_properties_cover_matching_keys() {
        assert_eq!(check("{ re\"dbl_.+\": double }", "{\"dbl_x\": 2}"), Ok(()));
        assert_eq!(
            check("{ re\"dbl_.+\": double }", "{\"other\": 2}"),
            Err("object: unexpected property `other`".into())
        );
        assert_eq!(
            check("{ re\".*\": int }", "{\"a\": 3.14}"),
            Err("object: bad pattern property `a`".into())
        );
        // A declared property must also satisfy matching patterns:
        // "s" passes the declared `str` but fails the `.*` pattern's
        // `double`, and patterns are checked first.
        assert_eq!(
            check("{ \"x\": str, re\".*\": double }", "{\"x\": \"s\"}"),
            Err("object: bad pattern property `x`".into())
        );
    }

    #[test]
    fn combinator_semantics() {
        assert_eq!(check("allOf(int, any)", "1"), Ok(()));
        assert_eq!(check("allOf(str, any)", "1"), Err("allOf: schema[0] fails".into()));
        assert_eq!(check("anyOf(int, str, bool)", "true"), Ok(()));
        assert_eq!(check("anyOf(int, str, bool)", "3.14"), Err("anyOf: no match".into()));
        assert_eq!(check("oneOf(int, str, bool)", "true"), Ok(()));
        assert_eq!(check("oneOf(int, double)", "42"), Err("oneOf: more than one match".into()));
        assert_eq!(check("oneOf(str, bool)", "42"), Err("oneOf: no match".into()));
        assert_eq!(check("not(anyOf(bool, null))", "12345"), Ok(()));
        assert_eq!(check("not(int)", "5"), Err("not: matches".into()));
    }

    #[test]
    fn anyof_aggregates_all_branch_errors() {
        let schema: Schema = "anyOf(int, str)".parse().unwrap();
        let json: Json = "null".parse().unwrap();
        let error = schema.matches(&json).unwrap_err();
        assert_eq!(error.message(), "anyOf: no match");
        let messages: Vec<_> = error.nested().iter().map(MatchError::message).collect();
        assert_eq!(messages, vec!["int: not an integer", "str: not a string"]);
    }

    #[test]
    fn references_resolve_against_enclosing_scopes() {
        assert_eq!(check("#id int# { \"a\": @id }", "{\"a\": 1}"), Ok(()));
        assert_eq!(
            check("#id int# { \"a\": @id }", "{\"a\": \"x\"}"),
            Err("object: bad property `a`".into())
        );
        // Inner definitions shadow outer ones.
        assert_eq!(
            check("#x int# { \"k\": #x str# @x }", "{\"k\": \"s\"}"),
            Ok(())
        );
        assert_eq!(
            check("#x int# { \"k\": #x str# @x }", "{\"k\": 1}"),
            Err("object: bad property `k`".into())
        );
    }

    #[test]
    fn reference_lookup_is_lexical_not_dynamic() {
        // `@f` expands to a schema whose `@g` must see the root `g`
        // (int), not the `g` (str) defined next to the reference site.
        let schema = "#g int# #f { \"v\": @g }# { \"k\": #g str# @f }";
        assert_eq!(check(schema, "{\"k\": {\"v\": 1}}"), Ok(()));
        assert_eq!(
            check(schema, "{\"k\": {\"v\": \"s\"}}"),
            Err("object: bad property `k`".into())
        );
    }

    #[test]
    fn extended_reference_relaxes_object_matching() {
        let schema = "#obj { \"a\": int }# extended @obj";
        assert_eq!(check(schema, "{\"a\": 1, \"extra\": true}"), Ok(()));
        let strict = "#obj { \"a\": int }# @obj";
        assert_eq!(
            check(strict, "{\"a\": 1, \"extra\": true}"),
            Err("object: unexpected property `extra`".into())
        );
        // The relaxation applies to the referenced object only, not to
        // objects nested below it.
        let nested = "#obj { \"a\": { \"b\": int } }# extended @obj";
        assert_eq!(
            check(nested, "{\"a\": {\"b\": 1, \"z\": 2}, \"extra\": true}"),
            Err("object: bad property `a`".into())
        );
    }

    #[test]
    fn error_tree_display() {
        let schema: Schema = "{ \"a\": [int] }".parse().unwrap();
        let json: Json = "{\"a\": [1, null]}".parse().unwrap();
        let error = schema.matches(&json).unwrap_err();
        let rendered = error.to_string();
        assert_eq!(
            rendered,
            ". object: bad property `a`\n`-- array: bad item [1]\n    `-- int: not an integer"
        );
    }

    #[test]
    fn display_shows_sibling_branches() {
        let schema: Schema = "anyOf(int, str)".parse().unwrap();
        let json: Json = "null".parse().unwrap();
        let error = schema.matches(&json).unwrap_err();
        assert_eq!(
            error.to_string(),
            ". anyOf: no match\n|-- int: not an integer\n`-- str: not a string"
        );
    }

    #[test]
    fn errors_are_stamped_with_their_schema() {
        let schema: Schema = "int(1..5)".parse().unwrap();
        let json: Json = "7".parse().unwrap();
        let error = schema.matches(&json).unwrap_err();
        assert!(std::ptr::eq(error.schema().unwrap(), &schema));
    }

    #[test]
    fn matching_is_deterministic_and_read_only() {
        let schema: Schema = "{ \"a\": anyOf(int, str) }".parse().unwrap();
        let json: Json = "{\"a\": null}".parse().unwrap();
        let first = schema.matches(&json).unwrap_err().to_string();
        let second = schema.matches(&json).unwrap_err().to_string();
        assert_eq!(first, second);
    }
}
