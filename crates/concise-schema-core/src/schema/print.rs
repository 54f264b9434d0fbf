//! Concise schema printers.
//!
//! `Display` gives the one-line compact form, [`Schema::pretty`] the
//! indented multi-line form. Both render definitions first (in textual
//! declaration order), then docstrings, then the body, and both produce
//! source the parser reads back to an equivalent schema.

use std::fmt::{self, Write as _};

use crate::json::print::indent;
use crate::schema::{Schema, SchemaNode};

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, def) in self.definitions_in_decl_order() {
            write!(f, "#{name} {}#", def.schema)?;
        }
        for doc in &self.docstrings {
            write!(f, "/**{doc}*/")?;
        }
        write_node(f, &self.node)
    }
}

fn write_node(out: &mut dyn fmt::Write, node: &SchemaNode) -> fmt::Result {
    match node {
        SchemaNode::Any => out.write_str("any"),
        SchemaNode::Null => out.write_str("null"),
        SchemaNode::Bool => out.write_str("bool"),
        SchemaNode::Int { min, max } => {
            out.write_str("int")?;
            write_range(out, &min.map(|v| v.to_string()), &max.map(|v| v.to_string()))
        }
        SchemaNode::Double { min, max } => {
            out.write_str("double")?;
            write_range(out, &min.map(|v| v.to_string()), &max.map(|v| v.to_string()))
        }
        SchemaNode::Str {
            pattern,
            min_len,
            max_len,
        } => {
            out.write_str("str")?;
            if let Some(p) = pattern {
                write!(out, "(\"{}\")", p.source())?;
            }
            write_quantifier(out, *min_len, *max_len)
        }
        SchemaNode::Enum { values } => {
            out.write_str("enum(")?;
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write!(out, "{v}")?;
            }
            out.write_str(")")
        }
        SchemaNode::Array {
            items,
            min_items,
            max_items,
            unique,
        } => {
            out.write_str("[")?;
            if *unique {
                out.write_str("unique ")?;
            }
            write!(out, "{items}]")?;
            write_quantifier(out, *min_items, *max_items)
        }
        SchemaNode::Tuple { items } => write_list(out, "", items),
        SchemaNode::Object {
            properties,
            pattern_properties,
            extensible,
        } => {
            if *extensible {
                out.write_str("extensible ")?;
            }
            out.write_str("{")?;
            let mut first = true;
            for (key, prop) in properties {
                if !first {
                    out.write_str(", ")?;
                }
                first = false;
                if prop.optional {
                    out.write_str("?")?;
                }
                write!(out, "\"{key}\":{}", prop.schema)?;
                if let Some(default) = &prop.default {
                    write!(out, "={default}")?;
                }
            }
            for pp in pattern_properties {
                if !first {
                    out.write_str(", ")?;
                }
                first = false;
                write!(out, "re\"{}\":{}", pp.pattern.source(), pp.schema)?;
            }
            out.write_str("}")
        }
        SchemaNode::AllOf { items } => write_list(out, "allOf", items),
        SchemaNode::AnyOf { items } => write_list(out, "anyOf", items),
        SchemaNode::OneOf { items } => write_list(out, "oneOf", items),
        SchemaNode::Not { inner } => write!(out, "not({inner})"),
        SchemaNode::Reference { name, extended } => {
            if *extended {
                out.write_str("extended ")?;
            }
            write!(out, "@{name}")
        }
    }
}

fn write_list(out: &mut dyn fmt::Write, head: &str, items: &[Schema]) -> fmt::Result {
    write!(out, "{head}(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write!(out, "{item}")?;
    }
    out.write_str(")")
}

/// `(min .. max)` with empty slots for missing bounds; nothing at all
/// when the range is unbounded on both ends.
fn write_range(
    out: &mut dyn fmt::Write,
    min: &Option<String>,
    max: &Option<String>,
) -> fmt::Result {
    if min.is_none() && max.is_none() {
        return Ok(());
    }
    out.write_str("(")?;
    if let Some(m) = min {
        out.write_str(m)?;
    }
    out.write_str(" .. ")?;
    if let Some(m) = max {
        out.write_str(m)?;
    }
    out.write_str(")")
}

/// `{n}` when the bounds agree, `{min, max}` with empty slots otherwise.
fn write_quantifier(
    out: &mut dyn fmt::Write,
    min: Option<usize>,
    max: Option<usize>,
) -> fmt::Result {
    if min.is_none() && max.is_none() {
        return Ok(());
    }
    out.write_str("{")?;
    if let Some(m) = min {
        write!(out, "{m}")?;
    }
    if min != max {
        out.write_str(", ")?;
        if let Some(m) = max {
            write!(out, "{m}")?;
        }
    }
    out.write_str("}")
}

// ---------------------------------------------------------------------
// Pretty form
// ---------------------------------------------------------------------

pub(crate) fn pretty_impl(
    schema: &Schema,
    out: &mut String,
    tab_size: usize,
    offset: usize,
    mut first_line_offset: bool,
) {
    for (name, def) in schema.definitions_in_decl_order() {
        if first_line_offset {
            indent(out, offset);
        }
        first_line_offset = true;
        out.push('#');
        out.push_str(name);
        out.push('\n');
        pretty_impl(&def.schema, out, tab_size, offset + tab_size, true);
        out.push('\n');
        indent(out, offset);
        // The comment names the definition being closed; the parser
        // skips it on the way back in.
        out.push_str("#/*");
        out.push_str(name);
        out.push_str("*/\n");
    }
    for doc in &schema.docstrings {
        if first_line_offset {
            indent(out, offset);
        }
        first_line_offset = true;
        out.push_str("/**");
        out.push_str(doc);
        out.push_str("*/\n");
    }
    pretty_node(&schema.node, out, tab_size, offset, first_line_offset);
}

fn pretty_node(
    node: &SchemaNode,
    out: &mut String,
    tab_size: usize,
    offset: usize,
    first_line_offset: bool,
) {
    if first_line_offset {
        indent(out, offset);
    }
    match node {
        SchemaNode::Any
        | SchemaNode::Null
        | SchemaNode::Bool
        | SchemaNode::Int { .. }
        | SchemaNode::Double { .. }
        | SchemaNode::Str { .. }
        | SchemaNode::Enum { .. }
        | SchemaNode::Reference { .. } => {
            let _ = write_node(out, node);
        }
        SchemaNode::AllOf { items } => pretty_list(out, "allOf", items, tab_size, offset),
        SchemaNode::AnyOf { items } => pretty_list(out, "anyOf", items, tab_size, offset),
        SchemaNode::OneOf { items } => pretty_list(out, "oneOf", items, tab_size, offset),
        SchemaNode::Tuple { items } => pretty_list(out, "", items, tab_size, offset),
        SchemaNode::Not { inner } => {
            out.push_str("not(");
            pretty_impl(inner, out, tab_size, offset + tab_size, false);
            out.push(')');
        }
        SchemaNode::Array {
            items,
            min_items,
            max_items,
            unique,
        } => {
            out.push_str("[ ");
            if *unique {
                out.push_str("unique ");
            }
            pretty_impl(items, out, tab_size, offset, false);
            out.push(']');
            let _ = write_quantifier(out, *min_items, *max_items);
        }
        SchemaNode::Object {
            properties,
            pattern_properties,
            extensible,
        } => {
            if *extensible {
                out.push_str("extensible ");
            }
            if properties.is_empty() && pattern_properties.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            let max_key = properties
                .keys()
                .map(String::len)
                .chain(pattern_properties.iter().map(|pp| pp.pattern.source().len()))
                .max()
                .unwrap_or(0);
            let gutter = if pattern_properties.is_empty() { 1 } else { 2 };
            let value_offset = offset + tab_size + gutter + max_key + 4;
            let mut first = true;
            for (key, prop) in properties {
                if !first {
                    out.push_str(",\n");
                }
                first = false;
                indent(out, offset + tab_size);
                if gutter == 2 {
                    out.push(' ');
                }
                out.push(if prop.optional { '?' } else { ' ' });
                out.push('"');
                out.push_str(key);
                out.push('"');
                indent(out, max_key - key.len());
                out.push_str(": ");
                pretty_impl(&prop.schema, out, tab_size, value_offset, false);
                if let Some(default) = &prop.default {
                    let _ = write!(out, " = {default}");
                }
            }
            for pp in pattern_properties {
                if !first {
                    out.push_str(",\n");
                }
                first = false;
                indent(out, offset + tab_size);
                out.push_str("re\"");
                out.push_str(pp.pattern.source());
                out.push('"');
                indent(out, max_key - pp.pattern.source().len());
                out.push_str(": ");
                pretty_impl(&pp.schema, out, tab_size, value_offset, false);
            }
            out.push('\n');
            indent(out, offset);
            out.push('}');
        }
    }
}

fn pretty_list(out: &mut String, head: &str, items: &[Schema], tab_size: usize, offset: usize) {
    out.push_str(head);
    out.push('(');
    if !items.is_empty() {
        out.push('\n');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(",\n");
            }
            pretty_impl(item, out, tab_size, offset + tab_size, true);
        }
        out.push('\n');
        indent(out, offset);
    }
    out.push(')');
}
