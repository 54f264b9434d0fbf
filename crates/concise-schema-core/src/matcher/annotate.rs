//! Annotated rendering of a match-error tree.
//!
//! [`MatchError::pretty_wordy_print`] pretty-prints the offending
//! document and, under every subvalue that some error points at, emits
//! a caret bar followed by the error messages collected for that node.
//! Each message carries the concise form of the schema variant that
//! produced it, and deeper errors indent further so the causal chain
//! reads top-down.

use crate::json::print::{pretty_impl, Annotations};
use crate::matcher::MatchError;

impl MatchError<'_, '_> {
    /// Render this error's document annotated with the error tree.
    ///
    /// The document and schema the error tree points into must still be
    /// alive, which the lifetimes on [`MatchError`] guarantee.
    pub fn pretty_wordy_print(&self, tab_size: usize) -> String {
        let mut annotations: Annotations = Annotations::new();
        let mut queue: Vec<(usize, &MatchError<'_, '_>)> = vec![(0, self)];
        while let Some((level, error)) = queue.pop() {
            let line = match error.schema {
                Some(schema) => format!("{} //{}", error.message, schema),
                None => error.message.clone(),
            };
            annotations
                .entry(error.json as *const _)
                .or_default()
                .push((level, line));
            for nested in &error.nested {
                queue.push((level + 1, nested));
            }
        }
        let mut out = String::new();
        pretty_impl(self.json, &mut out, tab_size, 0, true, Some(&annotations));
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::json::Json;
    use crate::schema::Schema;

    fn annotated(schema: &str, json: &str) -> String {
        let schema: Schema = schema.parse().unwrap();
        let json: Json = json.parse().unwrap();
        let error = schema.matches(&json).unwrap_err();
        error.pretty_wordy_print(2)
    }

    #[test]
    fn scalar_violation_is_annotated_in_place() {
        let out = annotated("int(1..10)", "42");
        let expected = "\
42
^^^^^^^^
int: value (42) > max (10) //int(1 .. 10)
";
        assert_eq!(out, expected);
    }

    #[test]
    fn nested_violation_annotates_the_subvalue() {
        let out = annotated("{ \"a\": int }", "{\"a\": \"x\"}");
        // The object-level error sits on the object, the int error on
        // the string value inside it.
        assert!(out.contains("object: bad property `a` //{\"a\":int}"));
        assert!(out.contains("int: not an integer //int"));
        assert!(out.contains("^^^^^^^^"));
    }

    #[test]
    fn deeper_errors_indent_relative_to_their_anchor() {
        let out = annotated("anyOf(int, str)", "null");
        let expected = "\
null
^^^^^^^^
anyOf: no match //anyOf(int, str)
    str: not a string //str
    int: not an integer //int
";
        assert_eq!(out, expected);
    }
}
