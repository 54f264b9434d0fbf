//! Compact and pretty JSON printers.
//!
//! Both are exact inverses of the parser for parser-produced values:
//! string bytes are written through without re-escaping, and numbers
//! print in their shortest round-tripping form. Doubles keep their tag
//! by always carrying a `.` or an exponent.

use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::json::Json;

/// Magnitudes in `[1e-5, 1e5]` print in fixed notation, everything else
/// (zero included) in scientific notation.
const UPPER_FIXED: f64 = 1e5;
const LOWER_FIXED: f64 = 1e-5;

/// Annotation lines attached to individual nodes of a tree being
/// printed, keyed by node identity. Each entry is (relative depth,
/// rendered line).
pub(crate) type Annotations = HashMap<*const Json, Vec<(usize, String)>>;

pub(crate) fn format_double(d: f64) -> String {
    assert!(d.is_finite(), "non-finite double cannot be printed as JSON");
    if d > UPPER_FIXED || d < -UPPER_FIXED || (d < LOWER_FIXED && d > -LOWER_FIXED) {
        format!("{d:e}")
    } else {
        let mut s = format!("{d}");
        if !s.contains('.') {
            s.push_str(".0");
        }
        s
    }
}

/// Single-line form: no spaces, keys in comparison order.
impl fmt::Display for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Json::Array(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
            Json::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Json::Integer(i) => write!(f, "{i}"),
            Json::Null => f.write_str("null"),
            Json::Object(members) => {
                f.write_char('{')?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "\"{key}\":{value}")?;
                }
                f.write_char('}')
            }
            Json::Double(d) => f.write_str(&format_double(*d)),
            Json::String(s) => write!(f, "\"{s}\""),
        }
    }
}

pub(crate) fn indent(out: &mut String, width: usize) {
    out.extend(std::iter::repeat(' ').take(width));
}

/// Pretty printer core, shared with the annotated error renderer.
///
/// `offset` is the column of this value's first character; when
/// `first_line_offset` is unset the caller has already positioned the
/// cursor (a value on the same line as its key). Annotated nodes get a
/// caret bar and their annotation lines directly below the value.
pub(crate) fn pretty_impl(
    json: &Json,
    out: &mut String,
    tab_size: usize,
    offset: usize,
    first_line_offset: bool,
    annotations: Option<&Annotations>,
) {
    if first_line_offset {
        indent(out, offset);
    }
    match json {
        Json::Array(items) => {
            out.push('[');
            if !items.is_empty() {
                out.push('\n');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    pretty_impl(item, out, tab_size, offset + tab_size, true, annotations);
                }
                out.push('\n');
                indent(out, offset);
            }
            out.push(']');
        }
        Json::Object(members) => {
            out.push('{');
            if !members.is_empty() {
                out.push('\n');
                let max_key = members.keys().map(String::len).max().unwrap_or(0);
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    indent(out, offset + tab_size);
                    out.push('"');
                    out.push_str(key);
                    out.push('"');
                    indent(out, max_key - key.len());
                    out.push_str(": ");
                    let value_offset = offset + tab_size + max_key + 4;
                    pretty_impl(value, out, tab_size, value_offset, false, annotations);
                }
                out.push('\n');
                indent(out, offset);
            }
            out.push('}');
        }
        Json::Boolean(_) | Json::Integer(_) | Json::Null | Json::Double(_) | Json::String(_) => {
            // Scalars share the compact form.
            let _ = write!(out, "{json}");
        }
    }
    if let Some(lines) = annotations.and_then(|a| a.get(&(json as *const Json))) {
        let base = lines.first().map(|(depth, _)| *depth).unwrap_or(0);
        out.push('\n');
        indent(out, offset);
        out.push_str("^^^^^^^^\n");
        for (depth, line) in lines {
            indent(out, offset + 2 * tab_size * (depth - base));
            out.push_str(line);
            out.push('\n');
        }
        indent(out, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compact_form_is_dense() {
        let v: Json = "{\"b\": [1, 2.0, null], \"a\": true}".parse().unwrap();
        assert_eq!(v.to_string(), "{\"a\":true,\"b\":[1,2.0,null]}");
    }

    #[test]
    fn double_formatting() {
        assert_eq!(format_double(2.0), "2.0");
        assert_eq!(format_double(3.14), "3.14");
        assert_eq!(format_double(-0.25), "-0.25");
        assert_eq!(format_double(100000.0), "100000.0");
        assert_eq!(format_double(0.00001), "0.00001");
        // Outside the fixed window, scientific with a trimmed mantissa.
        assert_eq!(format_double(1e300), "1e300");
        assert_eq!(format_double(1.5e-7), "1.5e-7");
        assert_eq!(format_double(0.0), "0e0");
    }

    #[test]
    fn double_text_reparses_to_the_same_value() {
        for d in [2.0, 3.14, 1e300, 1.5e-7, 0.1, -99999.25, 1.0000000000000002] {
            let text = format_double(d);
            let back: Json = text.parse().unwrap();
            assert_eq!(back, Json::Double(d), "via {text:?}");
        }
    }

    #[test]
    fn strings_are_not_reescaped() {
        let v: Json = r#""a\"b""#.parse().unwrap();
        assert_eq!(v.to_string(), r#""a\"b""#);
    }

    #[test]
    fn pretty_aligns_object_keys() {
        let v: Json = "{\"a\": 1, \"long\": {\"x\": 2}, \"mid\": [true]}"
            .parse()
            .unwrap();
        let expected = "\
{
  \"a\"   : 1,
  \"long\": {
            \"x\": 2
          },
  \"mid\" : [
            true
          ]
}";
        assert_eq!(v.pretty(2), expected);
    }

    #[test]
    fn pretty_empty_containers_stay_inline() {
        assert_eq!("[]".parse::<Json>().unwrap().pretty(2), "[]");
        assert_eq!("{}".parse::<Json>().unwrap().pretty(2), "{}");
    }

    #[test]
    fn pretty_output_reparses() {
        let v: Json = "{\"a\": [1, {\"b\": 2.5}], \"c\": \"s\"}".parse().unwrap();
        let reparsed: Json = v.pretty(3).parse().unwrap();
        assert_eq!(reparsed, v);
    }
}
