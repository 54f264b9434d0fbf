//! Export to the standard JSON-Schema vocabulary.
//!
//! The conversion is one-way: the produced document uses `type`,
//! `properties`, `required`, `patternProperties`, `enum`, the range and
//! length keywords, the combinators, `$ref`, `description` and
//! `definitions`. Nothing reads JSON Schema back in.

use std::collections::BTreeMap;

use crate::json::Json;
use crate::schema::{Schema, SchemaNode};

impl Schema {
    /// Build the equivalent JSON-Schema document as a [`Json`] object.
    ///
    /// Docstrings join into `description`; each definition exports under
    /// `definitions` with an `id` naming it. Regex sources are wrapped
    /// `^...$` to pin down the full-string match semantics.
    pub fn as_json_schema(&self) -> Json {
        let mut obj = match node_to_json_schema(&self.node) {
            Json::Object(obj) => obj,
            other => return other,
        };
        if !self.docstrings.is_empty() {
            obj.insert(
                "description".to_string(),
                Json::String(self.docstrings.join("\n")),
            );
        }
        if let Some(definitions) = &self.definitions {
            let mut defs = BTreeMap::new();
            for (name, def) in definitions {
                let mut exported = match def.schema.as_json_schema() {
                    Json::Object(obj) => obj,
                    other => {
                        defs.insert(name.clone(), other);
                        continue;
                    }
                };
                exported.insert("id".to_string(), Json::String(name.clone()));
                defs.insert(name.clone(), Json::Object(exported));
            }
            obj.insert("definitions".to_string(), Json::Object(defs));
        }
        Json::Object(obj)
    }
}

fn node_to_json_schema(node: &SchemaNode) -> Json {
    let mut obj = BTreeMap::new();
    match node {
        SchemaNode::Any => {}
        SchemaNode::Null => {
            obj.insert("type".to_string(), Json::from("null"));
        }
        SchemaNode::Bool => {
            obj.insert("type".to_string(), Json::from("boolean"));
        }
        SchemaNode::Int { min, max } => {
            obj.insert("type".to_string(), Json::from("integer"));
            if let Some(m) = min {
                obj.insert("minimum".to_string(), Json::Integer(*m));
            }
            if let Some(m) = max {
                obj.insert("maximum".to_string(), Json::Integer(*m));
            }
        }
        SchemaNode::Double { min, max } => {
            obj.insert("type".to_string(), Json::from("number"));
            if let Some(m) = min {
                obj.insert("minimum".to_string(), Json::Double(*m));
            }
            if let Some(m) = max {
                obj.insert("maximum".to_string(), Json::Double(*m));
            }
        }
        SchemaNode::Str {
            pattern,
            min_len,
            max_len,
        } => {
            obj.insert("type".to_string(), Json::from("string"));
            if let Some(p) = pattern {
                obj.insert(
                    "pattern".to_string(),
                    Json::String(format!("^{}$", p.source())),
                );
            }
            if let Some(m) = min_len {
                obj.insert("minLength".to_string(), Json::Integer(*m as i64));
            }
            if let Some(m) = max_len {
                obj.insert("maxLength".to_string(), Json::Integer(*m as i64));
            }
        }
        SchemaNode::Enum { values } => {
            obj.insert("enum".to_string(), Json::Array(values.clone()));
        }
        SchemaNode::Array {
            items,
            min_items,
            max_items,
            unique,
        } => {
            obj.insert("type".to_string(), Json::from("array"));
            obj.insert("items".to_string(), items.as_json_schema());
            if let Some(m) = min_items {
                obj.insert("minItems".to_string(), Json::Integer(*m as i64));
            }
            if let Some(m) = max_items {
                obj.insert("maxItems".to_string(), Json::Integer(*m as i64));
            }
            if *unique {
                obj.insert("uniqueItems".to_string(), Json::Boolean(true));
            }
        }
        SchemaNode::Tuple { items } => {
            obj.insert("type".to_string(), Json::from("array"));
            let exported: Vec<Json> = items.iter().map(Schema::as_json_schema).collect();
            obj.insert("items".to_string(), Json::Array(exported));
            obj.insert("minItems".to_string(), Json::Integer(items.len() as i64));
            obj.insert("maxItems".to_string(), Json::Integer(items.len() as i64));
        }
        SchemaNode::Object {
            properties,
            pattern_properties,
            extensible,
        } => {
            obj.insert("type".to_string(), Json::from("object"));
            obj.insert(
                "additionalProperties".to_string(),
                Json::Boolean(*extensible),
            );
            if !properties.is_empty() {
                let mut props = BTreeMap::new();
                let mut required = Vec::new();
                for (key, prop) in properties {
                    let mut exported = prop.schema.as_json_schema();
                    if let (Some(default), Json::Object(map)) = (&prop.default, &mut exported) {
                        map.insert("default".to_string(), default.clone());
                    }
                    props.insert(key.clone(), exported);
                    if !prop.optional {
                        required.push(Json::String(key.clone()));
                    }
                }
                obj.insert("properties".to_string(), Json::Object(props));
                obj.insert("required".to_string(), Json::Array(required));
            }
            if !pattern_properties.is_empty() {
                let mut props = BTreeMap::new();
                for pp in pattern_properties {
                    props.insert(
                        format!("^{}$", pp.pattern.source()),
                        pp.schema.as_json_schema(),
                    );
                }
                obj.insert("patternProperties".to_string(), Json::Object(props));
            }
        }
        SchemaNode::AllOf { items } => {
            let exported: Vec<Json> = items.iter().map(Schema::as_json_schema).collect();
            obj.insert("allOf".to_string(), Json::Array(exported));
        }
        SchemaNode::AnyOf { items } => {
            let exported: Vec<Json> = items.iter().map(Schema::as_json_schema).collect();
            obj.insert("anyOf".to_string(), Json::Array(exported));
        }
        SchemaNode::OneOf { items } => {
            let exported: Vec<Json> = items.iter().map(Schema::as_json_schema).collect();
            obj.insert("oneOf".to_string(), Json::Array(exported));
        }
        SchemaNode::Not { inner } => {
            obj.insert("not".to_string(), inner.as_json_schema());
        }
        SchemaNode::Reference { name, .. } => {
            obj.insert("$ref".to_string(), Json::String(name.clone()));
        }
    }
    Json::Object(obj)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::json::Json;
    use crate::schema::Schema;

    fn export(src: &str) -> Json {
        src.parse::<Schema>().unwrap().as_json_schema()
    }

    fn json(src: &str) -> Json {
        src.parse().unwrap()
    }

    #[test]
    fn scalar_types() {
        assert_eq!(export("any"), json("{}"));
        assert_eq!(export("null"), json(r#"{"type":"null"}"#));
        assert_eq!(export("bool"), json(r#"{"type":"boolean"}"#));
        assert_eq!(
            export("int(1..10)"),
            json(r#"{"type":"integer","minimum":1,"maximum":10}"#)
        );
        assert_eq!(
            export("double(..2.5)"),
            json(r#"{"type":"number","maximum":2.5}"#)
        );
    }

    #[test]
    fn string_pattern_is_anchored() {
        assert_eq!(
            export("str(\"[A-Z]+\"){1,3}"),
            json(r#"{"type":"string","pattern":"^[A-Z]+$","minLength":1,"maxLength":3}"#)
        );
    }

    #[test]
    fn arrays_and_tuples() {
        assert_eq!(
            export("[unique int]{1,5}"),
            json(
                r#"{"type":"array","items":{"type":"integer"},"minItems":1,"maxItems":5,"uniqueItems":true}"#
            )
        );
        assert_eq!(
            export("(int, str)"),
            json(
                r#"{"type":"array","items":[{"type":"integer"},{"type":"string"}],"minItems":2,"maxItems":2}"#
            )
        );
    }

    #[test]
    fn objects_with_defaults_and_patterns() {
        assert_eq!(
            export(r#"{ "a": int, ?"b": str = "x", re"p": bool }"#),
            json(
                r#"{
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "a": {"type": "integer"},
                        "b": {"type": "string", "default": "x"}
                    },
                    "required": ["a"],
                    "patternProperties": {"^p$": {"type": "boolean"}}
                }"#
            )
        );
        assert_eq!(
            export("extensible {}"),
            json(r#"{"type":"object","additionalProperties":true}"#)
        );
    }

    #[test]
    fn combinators_and_refs() {
        assert_eq!(
            export("oneOf(int, null)"),
            json(r#"{"oneOf":[{"type":"integer"},{"type":"null"}]}"#)
        );
        assert_eq!(export("not(bool)"), json(r#"{"not":{"type":"boolean"}}"#));
        assert_eq!(
            export("#id int# @id"),
            json(r#"{"$ref":"id","definitions":{"id":{"type":"integer","id":"id"}}}"#)
        );
    }

    #[test]
    fn docstrings_become_description() {
        // Built by hand: the description joins with a real newline byte,
        // which a parsed fixture would keep as the two bytes `\` `n`.
        let mut expected = std::collections::BTreeMap::new();
        expected.insert("type".to_string(), Json::from("integer"));
        expected.insert(
            "description".to_string(),
            Json::String("line one\nline two".to_string()),
        );
        assert_eq!(
            export("/**line one*//**line two*/int"),
            Json::Object(expected)
        );
    }

    #[test]
    fn enum_preserves_declaration_order() {
        assert_eq!(export("enum(2, 1)"), json(r#"{"enum":[2,1]}"#));
    }
}
