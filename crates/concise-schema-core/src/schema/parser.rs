//! Recursive-descent parser for the concise schema DSL.
//!
//! Scoping works through an explicit stack of definition frames: every
//! schema production pushes a frame on entry, collects its `#name ... #`
//! definitions into it, and pops it on the way out. `@name` is checked
//! against the stack from the innermost frame outward, so definitions
//! are visible to everything nested below their scope, including later
//! definitions of the same scope. An unresolvable name is a parse
//! error even though resolution happens again at match time.

use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::json::Json;
use crate::reader::Reader;
use crate::schema::{Definition, Pattern, PatternProperty, Property, Schema, SchemaNode};

/// Longest keyword is `extensible`; anything longer can stop scanning.
const MAX_KEYWORD_LEN: usize = 16;

pub(crate) fn parse_schema(reader: &mut Reader<'_>) -> Result<Schema, ParseError> {
    let mut parser = SchemaParser {
        reader,
        scopes: Vec::new(),
    };
    let schema = parser.parse_schema()?;
    tracing::trace!(kind = schema.node.kind(), "parsed schema");
    Ok(schema)
}

struct SchemaParser<'r, 'a> {
    reader: &'r mut Reader<'a>,
    scopes: Vec<BTreeMap<String, Definition>>,
}

impl SchemaParser<'_, '_> {
    fn parse_schema(&mut self) -> Result<Schema, ParseError> {
        self.scopes.push(BTreeMap::new());
        let result = self.parse_docs_defs_and_body();
        let frame = self.scopes.pop().unwrap_or_default();
        let (docstrings, node) = result?;
        Ok(Schema {
            node,
            docstrings,
            definitions: (!frame.is_empty()).then_some(frame),
        })
    }

    fn parse_docs_defs_and_body(&mut self) -> Result<(Vec<String>, SchemaNode), ParseError> {
        let mut docstrings = Vec::new();
        // Docstrings must not vanish into generic comment skipping, so
        // the leading token is read with skipping off.
        let mut c = self.reader.read_non_space_or_fail(false)?;
        loop {
            match c {
                b'/' => self.parse_comment(&mut docstrings)?,
                b'#' => self.parse_definition()?,
                _ => break,
            }
            c = self.reader.read_non_space_or_fail(false)?;
        }
        let node = self.parse_body(c)?;
        Ok((docstrings, node))
    }

    fn parse_body(&mut self, c: u8) -> Result<SchemaNode, ParseError> {
        match c {
            b'{' => self.parse_object(false),
            b'[' => self.parse_array(),
            b'(' => Ok(SchemaNode::Tuple {
                items: self.parse_csv()?,
            }),
            b'@' => self.parse_reference(false),
            _ => self.parse_keyword(c),
        }
    }

    fn parse_keyword(&mut self, first: u8) -> Result<SchemaNode, ParseError> {
        if !first.is_ascii_alphabetic() {
            return Err(ParseError::UnexpectedChar {
                got: first as char,
                pos: self.reader.pos(),
            });
        }
        let mut word = String::new();
        word.push(first as char);
        while word.len() < MAX_KEYWORD_LEN {
            match self.reader.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    word.push(b as char);
                    self.reader.read()?;
                }
                _ => break,
            }
        }
        match word.as_str() {
            "any" => Ok(SchemaNode::Any),
            "null" => Ok(SchemaNode::Null),
            "bool" => Ok(SchemaNode::Bool),
            "int" => self.parse_int(),
            "double" => self.parse_double(),
            "str" => self.parse_str(),
            "enum" => self.parse_enum(),
            "not" => self.parse_not(),
            "allOf" => {
                self.expect_open_paren()?;
                Ok(SchemaNode::AllOf {
                    items: self.parse_csv()?,
                })
            }
            "anyOf" => {
                self.expect_open_paren()?;
                Ok(SchemaNode::AnyOf {
                    items: self.parse_csv()?,
                })
            }
            "oneOf" => {
                self.expect_open_paren()?;
                Ok(SchemaNode::OneOf {
                    items: self.parse_csv()?,
                })
            }
            "extensible" => {
                let c = self.reader.read_non_space_or_fail(true)?;
                self.reader.expect(b'{', c)?;
                self.parse_object(true)
            }
            "extended" => {
                let c = self.reader.read_non_space_or_fail(true)?;
                self.reader.expect(b'@', c)?;
                self.parse_reference(true)
            }
            _ => Err(ParseError::invalid(
                format!("unexpected word `{word}`"),
                self.reader.pos(),
            )),
        }
    }

    // -----------------------------------------------------------------
    // Docstrings and definitions
    // -----------------------------------------------------------------

    /// Called with a `/` consumed. `/** text */` records a docstring,
    /// `/**/` and plain `/* ... */` comments are skipped.
    fn parse_comment(&mut self, docstrings: &mut Vec<String>) -> Result<(), ParseError> {
        let star = self.reader.read()?;
        self.reader.expect(b'*', star)?;
        if self.reader.read()? == b'*' {
            if self.reader.peek() == Some(b'/') {
                self.reader.read()?;
                return Ok(());
            }
            let start = self.reader.pos();
            loop {
                let b = self.reader.read()?;
                if b == b'*' && self.reader.peek() == Some(b'/') {
                    self.reader.read()?;
                    break;
                }
            }
            let text = self.reader.slice(start, self.reader.pos() - 2);
            docstrings.push(text.to_string());
        } else if !self.reader.skip_to_comment_end() {
            return Err(ParseError::UnexpectedEof);
        }
        Ok(())
    }

    /// Called with a `#` consumed: `#name schema #`.
    fn parse_definition(&mut self) -> Result<(), ParseError> {
        let name = self.parse_ident("first symbol of define must be alphabetic ([A-Za-z])")?;
        match self.reader.peek() {
            Some(b) if b.is_ascii_whitespace() => {}
            Some(_) => {
                return Err(ParseError::invalid(
                    "expected space character",
                    self.reader.pos(),
                ))
            }
            None => return Err(ParseError::UnexpectedEof),
        }
        let schema = self.parse_schema()?;
        let c = self.reader.read_non_space_or_fail(true)?;
        self.reader.expect(b'#', c)?;

        let frame = self
            .scopes
            .last_mut()
            .expect("definition parsed outside of a schema scope");
        let seq = frame.len();
        frame.entry(name).or_insert(Definition { seq, schema });
        Ok(())
    }

    fn parse_ident(&mut self, first_char_error: &str) -> Result<String, ParseError> {
        let c = self.reader.read()?;
        if !c.is_ascii_alphabetic() {
            return Err(ParseError::invalid(first_char_error, self.reader.pos()));
        }
        let mut name = String::new();
        name.push(c as char);
        while let Some(b) = self.reader.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                name.push(b as char);
                self.reader.read()?;
            } else {
                break;
            }
        }
        Ok(name)
    }

    fn is_resolvable(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|frame| frame.contains_key(name))
    }

    // -----------------------------------------------------------------
    // Productions
    // -----------------------------------------------------------------

    fn parse_reference(&mut self, extended: bool) -> Result<SchemaNode, ParseError> {
        let name =
            self.parse_ident("first symbol of reference must be alphabetic ([A-Za-z])")?;
        if !self.is_resolvable(&name) {
            return Err(ParseError::invalid(
                format!("bad reference `@{name}`"),
                self.reader.pos(),
            ));
        }
        Ok(SchemaNode::Reference { name, extended })
    }

    fn parse_int(&mut self) -> Result<SchemaNode, ParseError> {
        let mut min = None;
        let mut max = None;
        match self.reader.read_non_space(true)? {
            None => return Ok(SchemaNode::Int { min, max }),
            Some(b'(') => {}
            Some(_) => {
                self.reader.unget();
                return Ok(SchemaNode::Int { min, max });
            }
        }
        let mut c = self.reader.read_non_space_or_fail(true)?;
        if c == b'-' || c.is_ascii_digit() {
            self.reader.unget();
            min = Some(self.read_i64()?);
            c = self.reader.read_non_space_or_fail(true)?;
        }
        if c == b')' {
            return Ok(SchemaNode::Int { min, max });
        }
        self.read_range_dots(c)?;
        c = self.reader.read_non_space_or_fail(true)?;
        if c == b'-' || c.is_ascii_digit() {
            self.reader.unget();
            max = Some(self.read_i64()?);
            c = self.reader.read_non_space_or_fail(true)?;
        }
        self.reader.expect(b')', c)?;
        Ok(SchemaNode::Int { min, max })
    }

    fn parse_double(&mut self) -> Result<SchemaNode, ParseError> {
        let mut min = None;
        let mut max = None;
        match self.reader.read_non_space(true)? {
            None => return Ok(SchemaNode::Double { min, max }),
            Some(b'(') => {}
            Some(_) => {
                self.reader.unget();
                return Ok(SchemaNode::Double { min, max });
            }
        }
        let mut c = self.reader.read_non_space_or_fail(true)?;
        if self.starts_double_bound(c) {
            self.reader.unget();
            min = Some(self.read_f64_bound()?);
            c = self.reader.read_non_space_or_fail(true)?;
        }
        if c == b')' {
            return Ok(SchemaNode::Double { min, max });
        }
        self.read_range_dots(c)?;
        c = self.reader.read_non_space_or_fail(true)?;
        if self.starts_double_bound(c) {
            self.reader.unget();
            max = Some(self.read_f64_bound()?);
            c = self.reader.read_non_space_or_fail(true)?;
        }
        self.reader.expect(b')', c)?;
        Ok(SchemaNode::Double { min, max })
    }

    /// `c` then another `.`: the `..` separating range bounds.
    fn read_range_dots(&mut self, c: u8) -> Result<(), ParseError> {
        self.reader.expect(b'.', c)?;
        let second = self.reader.read_non_space_or_fail(true)?;
        self.reader.expect(b'.', second)
    }

    fn starts_double_bound(&self, c: u8) -> bool {
        c == b'-'
            || c.is_ascii_digit()
            || (c == b'.' && self.reader.peek().is_some_and(|b| b.is_ascii_digit()))
    }

    fn parse_str(&mut self) -> Result<SchemaNode, ParseError> {
        let mut pattern = None;
        let mut c = match self.reader.read_non_space(true)? {
            None => {
                return Ok(SchemaNode::Str {
                    pattern,
                    min_len: None,
                    max_len: None,
                })
            }
            Some(c) => c,
        };
        if c == b'(' {
            let quote = self.reader.read_non_space_or_fail(true)?;
            self.reader.expect(b'"', quote)?;
            let source = self.reader.read_raw_string()?;
            let close = self.reader.read_non_space_or_fail(true)?;
            pattern = Some(Pattern::compile(&source).map_err(|_| {
                ParseError::invalid(format!("bad regex `{source}`"), self.reader.pos())
            })?);
            self.reader.expect(b')', close)?;
            c = match self.reader.read_non_space(true)? {
                None => {
                    return Ok(SchemaNode::Str {
                        pattern,
                        min_len: None,
                        max_len: None,
                    })
                }
                Some(c) => c,
            };
        }
        let (min_len, max_len) = if c == b'{' {
            self.parse_quantifier()?
        } else {
            self.reader.unget();
            (None, None)
        };
        Ok(SchemaNode::Str {
            pattern,
            min_len,
            max_len,
        })
    }

    fn parse_array(&mut self) -> Result<SchemaNode, ParseError> {
        let c = self.reader.read_non_space_or_fail(true)?;
        self.reader.unget();
        let mut unique = false;
        if c == b'u' {
            for expected in *b"unique" {
                if self.reader.read()? != expected {
                    return Err(ParseError::invalid(
                        "bad `unique` keyword",
                        self.reader.pos(),
                    ));
                }
            }
            if !self.reader.read()?.is_ascii_whitespace() {
                return Err(ParseError::invalid(
                    "space character required after `unique` keyword",
                    self.reader.pos(),
                ));
            }
            unique = true;
        }
        let items = Box::new(self.parse_schema()?);
        let c = self.reader.read_non_space_or_fail(true)?;
        self.reader.expect(b']', c)?;
        let (min_items, max_items) = match self.reader.read_non_space(true)? {
            None => (None, None),
            Some(b'{') => self.parse_quantifier()?,
            Some(_) => {
                self.reader.unget();
                (None, None)
            }
        };
        Ok(SchemaNode::Array {
            items,
            min_items,
            max_items,
            unique,
        })
    }

    fn parse_object(&mut self, extensible: bool) -> Result<SchemaNode, ParseError> {
        let mut properties: BTreeMap<String, Property> = BTreeMap::new();
        let mut pattern_properties = Vec::new();
        let mut c = self.reader.read_non_space_or_fail(true)?;
        loop {
            if c == b'}' {
                break;
            }
            let mut optional = false;
            let mut is_regex = false;
            if c == b'?' {
                optional = true;
                c = self.reader.read_non_space_or_fail(true)?;
            } else if c == b'r' {
                let e = self.reader.read()?;
                self.reader.expect(b'e', e)?;
                is_regex = true;
                c = self.reader.read_non_space_or_fail(true)?;
            }
            self.reader.expect(b'"', c)?;
            let key = self.reader.read_raw_string()?;
            c = self.reader.read_non_space_or_fail(true)?;
            self.reader.expect(b':', c)?;
            let schema = self.parse_schema()?;
            c = self.reader.read_non_space_or_fail(true)?;
            let mut default = None;
            if c == b'=' {
                if !optional {
                    return Err(ParseError::invalid(
                        "only optional properties can be defaulted",
                        self.reader.pos(),
                    ));
                }
                default = Some(Json::parse(self.reader)?);
                c = self.reader.read_non_space_or_fail(true)?;
            }
            if is_regex {
                let pattern = Pattern::compile(&key).map_err(|_| {
                    ParseError::invalid(format!("bad regex `{key}`"), self.reader.pos())
                })?;
                pattern_properties.push(PatternProperty { pattern, schema });
            } else {
                properties.entry(key).or_insert(Property {
                    schema,
                    default,
                    optional,
                });
            }
            if c == b',' {
                c = self.reader.read_non_space_or_fail(true)?;
            } else {
                self.reader.expect(b'}', c)?;
            }
        }
        Ok(SchemaNode::Object {
            properties,
            pattern_properties,
            extensible,
        })
    }

    fn parse_enum(&mut self) -> Result<SchemaNode, ParseError> {
        self.expect_open_paren()?;
        let mut values = Vec::new();
        let mut c = self.reader.read_non_space_or_fail(true)?;
        loop {
            if c == b')' {
                break;
            }
            self.reader.unget();
            values.push(Json::parse(self.reader)?);
            c = self.reader.read_non_space_or_fail(true)?;
            if c == b',' {
                c = self.reader.read_non_space_or_fail(true)?;
            } else {
                self.reader.expect(b')', c)?;
            }
        }
        Ok(SchemaNode::Enum { values })
    }

    fn parse_not(&mut self) -> Result<SchemaNode, ParseError> {
        self.expect_open_paren()?;
        let inner = Box::new(self.parse_schema()?);
        let c = self.reader.read_non_space_or_fail(true)?;
        self.reader.expect(b')', c)?;
        Ok(SchemaNode::Not { inner })
    }

    /// Comma-separated schemas up to a closing `)`.
    fn parse_csv(&mut self) -> Result<Vec<Schema>, ParseError> {
        let mut items = Vec::new();
        let mut c = self.reader.read_non_space_or_fail(false)?;
        loop {
            if c == b')' {
                break;
            }
            self.reader.unget();
            items.push(self.parse_schema()?);
            c = self.reader.read_non_space_or_fail(true)?;
            if c == b',' {
                c = self.reader.read_non_space_or_fail(false)?;
            } else {
                self.reader.expect(b')', c)?;
            }
        }
        Ok(items)
    }

    // -----------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------

    fn expect_open_paren(&mut self) -> Result<(), ParseError> {
        let c = self.reader.read_non_space_or_fail(true)?;
        self.reader.expect(b'(', c)
    }

    /// `{min, max}` with either bound optional; `{n}` pins both.
    fn parse_quantifier(&mut self) -> Result<(Option<usize>, Option<usize>), ParseError> {
        let mut min = None;
        let mut max = None;
        let mut c = self.reader.read_non_space_or_fail(true)?;
        if c.is_ascii_digit() {
            self.reader.unget();
            min = Some(self.read_usize()?);
            c = self.reader.read_non_space_or_fail(true)?;
        }
        if c == b'}' {
            max = min;
        } else {
            self.reader.expect(b',', c)?;
            c = self.reader.read_non_space_or_fail(true)?;
            if c.is_ascii_digit() {
                self.reader.unget();
                max = Some(self.read_usize()?);
                c = self.reader.read_non_space_or_fail(true)?;
            }
            self.reader.expect(b'}', c)?;
        }
        Ok((min, max))
    }

    fn read_i64(&mut self) -> Result<i64, ParseError> {
        let mut text = String::new();
        if self.reader.peek() == Some(b'-') {
            text.push('-');
            self.reader.read()?;
        }
        self.push_digits(&mut text)?;
        text.parse()
            .map_err(|_| ParseError::invalid("invalid number", self.reader.pos()))
    }

    fn read_usize(&mut self) -> Result<usize, ParseError> {
        let mut text = String::new();
        self.push_digits(&mut text)?;
        text.parse()
            .map_err(|_| ParseError::invalid("invalid number", self.reader.pos()))
    }

    /// A floating-point range bound. `.` and `e` are only taken when
    /// they continue a number, so `1..2` leaves the dots for the range.
    fn read_f64_bound(&mut self) -> Result<f64, ParseError> {
        let mut text = String::new();
        if self.reader.peek() == Some(b'-') {
            text.push('-');
            self.reader.read()?;
        }
        while self.reader.peek().is_some_and(|b| b.is_ascii_digit()) {
            text.push(self.reader.read()? as char);
        }
        if self.reader.peek() == Some(b'.')
            && self.reader.peek_ahead(1).is_some_and(|b| b.is_ascii_digit())
        {
            text.push(self.reader.read()? as char);
            while self.reader.peek().is_some_and(|b| b.is_ascii_digit()) {
                text.push(self.reader.read()? as char);
            }
        }
        if let Some(e @ (b'e' | b'E')) = self.reader.peek() {
            let exponent_digits = match self.reader.peek_ahead(1) {
                Some(b) if b.is_ascii_digit() => Some(1),
                Some(b'+' | b'-') => self
                    .reader
                    .peek_ahead(2)
                    .filter(u8::is_ascii_digit)
                    .map(|_| 2),
                _ => None,
            };
            if let Some(skip) = exponent_digits {
                text.push(e as char);
                self.reader.read()?;
                for _ in 1..skip {
                    text.push(self.reader.read()? as char);
                }
                while self.reader.peek().is_some_and(|b| b.is_ascii_digit()) {
                    text.push(self.reader.read()? as char);
                }
            }
        }
        text.parse()
            .map_err(|_| ParseError::invalid("invalid number", self.reader.pos()))
    }

    fn push_digits(&mut self, text: &mut String) -> Result<(), ParseError> {
        while self.reader.peek().is_some_and(|b| b.is_ascii_digit()) {
            text.push(self.reader.read()? as char);
        }
        Ok(())
    }
}
