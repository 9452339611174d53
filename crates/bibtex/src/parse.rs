//! Hand-rolled BibTeX parser.
//!
//! Text outside of `@`-entries is junk-tolerated the way classic `bibtex`
//! tolerates it. `@string` definitions accumulate on the [`Parser`] itself so
//! a macro defined in an earlier file is visible to later ones when the same
//! parser instance ingests an ordered file list.

use std::collections::{HashMap, HashSet};

use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{Bibliography, Entry, Field, PersonField};

/// Roles split into person lists unless person parsing is disabled.
pub const DEFAULT_PERSON_ROLES: &[&str] = &["author", "editor"];

/// A reusable BibTeX parser.
///
/// The parser is stateful in exactly one way: `@string` macro definitions
/// persist across [`parse`](Self::parse) calls.
#[derive(Debug)]
pub struct Parser {
    person_roles: Vec<String>,
    macros: HashMap<String, String>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser that splits [`DEFAULT_PERSON_ROLES`] fields into person lists.
    pub fn new() -> Self {
        Self {
            person_roles: DEFAULT_PERSON_ROLES.iter().map(|role| (*role).to_string()).collect(),
            macros: HashMap::new(),
        }
    }

    /// Treat every field as a scalar, skipping person-name splitting entirely.
    ///
    /// This is the fast path for callers that only round-trip entries and
    /// never inspect individual names.
    pub fn without_person_parsing(mut self) -> Self {
        self.person_roles.clear();
        self
    }

    /// Replace the set of roles that get split into person lists.
    pub fn with_person_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.person_roles = roles.into_iter().map(|role| role.into().to_ascii_lowercase()).collect();
        self
    }

    /// Pre-define a `@string` macro, as if it had been parsed from a source.
    pub fn define_macro(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.macros.insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Parse one `.bib` source into a [`Bibliography`].
    ///
    /// # Errors
    ///
    /// Returns an error on malformed syntax, a reference to an undefined
    /// `@string` macro, or a citation key defined twice within this source.
    #[instrument(skip(self, input), fields(input_size = input.len()))]
    pub fn parse(&mut self, input: &str) -> Result<Bibliography> {
        let mut cursor = Cursor::new(input);
        let mut bibliography = Bibliography::default();
        let mut seen = HashSet::new();
        while cursor.seek_at() {
            let kind = cursor.identifier("entry type")?.to_ascii_lowercase();
            match kind.as_str() {
                "comment" => cursor.skip_comment()?,
                "preamble" => bibliography.preambles.push(self.parse_preamble(&mut cursor)?),
                "string" => self.parse_string_macro(&mut cursor)?,
                _ => {
                    let entry = self.parse_entry(&mut cursor, kind)?;
                    if !seen.insert(entry.key.clone()) {
                        exn::bail!(ErrorKind::DuplicateKey(entry.key));
                    }
                    bibliography.entries.push(entry);
                },
            }
        }
        Ok(bibliography)
    }

    fn parse_entry(&self, cursor: &mut Cursor, entry_type: String) -> Result<Entry> {
        let close = cursor.open_body()?;
        let key = cursor.key(close)?;
        let mut persons = Vec::new();
        let mut fields = Vec::new();
        loop {
            cursor.skip_whitespace();
            match cursor.peek() {
                Some(b',') => cursor.eat(),
                Some(byte) if byte == close => {
                    cursor.eat();
                    break;
                },
                Some(_) => exn::bail!(ErrorKind::Syntax {
                    line: cursor.line,
                    expected: "',' or closing delimiter",
                }),
                None => exn::bail!(ErrorKind::UnexpectedEof(cursor.line)),
            }
            cursor.skip_whitespace();
            match cursor.peek() {
                // Trailing comma before the closing delimiter.
                Some(byte) if byte == close => {
                    cursor.eat();
                    break;
                },
                Some(_) => {},
                None => exn::bail!(ErrorKind::UnexpectedEof(cursor.line)),
            }
            let name = cursor.identifier("field name")?.to_ascii_lowercase();
            cursor.expect(b'=', "'='")?;
            let value = self.value(cursor)?;
            if self.person_roles.contains(&name) {
                persons.push(PersonField { role: name, names: split_names(&value) });
            } else {
                fields.push(Field { name, value });
            }
        }
        Ok(Entry { entry_type, key, persons, fields })
    }

    fn parse_preamble(&self, cursor: &mut Cursor) -> Result<String> {
        let close = cursor.open_body()?;
        let value = self.value(cursor)?;
        cursor.expect(close, "closing delimiter")?;
        Ok(value)
    }

    fn parse_string_macro(&mut self, cursor: &mut Cursor) -> Result<()> {
        let close = cursor.open_body()?;
        cursor.skip_whitespace();
        let name = cursor.identifier("macro name")?.to_ascii_lowercase();
        cursor.expect(b'=', "'='")?;
        let value = self.value(cursor)?;
        cursor.skip_whitespace();
        if cursor.peek() == Some(b',') {
            cursor.eat();
        }
        cursor.expect(close, "closing delimiter")?;
        self.macros.insert(name, value);
        Ok(())
    }

    /// One field value: `{...}`, `"..."`, or bare-number parts joined by `#`,
    /// with bare identifiers substituted from the macro table.
    fn value(&self, cursor: &mut Cursor) -> Result<String> {
        let mut value = String::new();
        loop {
            cursor.skip_whitespace();
            match cursor.peek() {
                Some(b'{') => {
                    cursor.eat();
                    value.push_str(&cursor.braced()?);
                },
                Some(b'"') => {
                    cursor.eat();
                    value.push_str(&cursor.quoted()?);
                },
                Some(byte) if byte.is_ascii_digit() => value.push_str(cursor.number()),
                Some(_) => {
                    let line = cursor.line;
                    let name = cursor.identifier("field value")?.to_ascii_lowercase();
                    match self.macros.get(&name) {
                        Some(expansion) => value.push_str(expansion),
                        None => exn::bail!(ErrorKind::UndefinedMacro { name, line }),
                    }
                },
                None => exn::bail!(ErrorKind::UnexpectedEof(cursor.line)),
            }
            cursor.skip_whitespace();
            if cursor.peek() == Some(b'#') {
                cursor.eat();
                continue;
            }
            break;
        }
        Ok(value)
    }
}

/// Splits a person-field value on the word `and` at brace depth zero.
///
/// Whitespace runs within a name collapse to a single space.
pub(crate) fn split_names(value: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0usize;
    for word in value.split_whitespace() {
        if depth == 0 && word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                names.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        depth += word.bytes().filter(|byte| *byte == b'{').count();
        depth = depth.saturating_sub(word.bytes().filter(|byte| *byte == b'}').count());
        current.push(word);
    }
    if !current.is_empty() {
        names.push(current.join(" "));
    }
    names
}

/// Byte cursor over the source text.
///
/// Structural characters in BibTeX are all ASCII, so scanning byte-wise is
/// safe: slices are only ever taken between ASCII delimiter positions, which
/// are always UTF-8 character boundaries.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    /// Advance over one byte, keeping the line count current.
    fn eat(&mut self) {
        if self.peek() == Some(b'\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_whitespace() {
                break;
            }
            self.eat();
        }
    }

    /// Advance to just past the next `@`. Returns `false` at end of input.
    /// Everything skipped over is inter-entry junk.
    fn seek_at(&mut self) -> bool {
        while let Some(byte) = self.peek() {
            self.eat();
            if byte == b'@' {
                return true;
            }
        }
        false
    }

    fn identifier(&mut self, expected: &'static str) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(byte) = self.peek() {
            let accepted =
                byte.is_ascii_alphanumeric() || byte >= 0x80 || matches!(byte, b'_' | b'-' | b':' | b'.' | b'+' | b'/');
            if !accepted {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            exn::bail!(ErrorKind::Syntax { line: self.line, expected });
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(found) if found == byte => {
                self.eat();
                Ok(())
            },
            Some(_) => exn::bail!(ErrorKind::Syntax { line: self.line, expected }),
            None => exn::bail!(ErrorKind::UnexpectedEof(self.line)),
        }
    }

    /// Opening delimiter of an entry body. Returns the matching closer.
    fn open_body(&mut self) -> Result<u8> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => {
                self.eat();
                Ok(b'}')
            },
            Some(b'(') => {
                self.eat();
                Ok(b')')
            },
            Some(_) => exn::bail!(ErrorKind::Syntax { line: self.line, expected: "'{' or '('" }),
            None => exn::bail!(ErrorKind::UnexpectedEof(self.line)),
        }
    }

    /// Citation key: everything up to the first comma, closer, or whitespace.
    fn key(&mut self, close: u8) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == b',' || byte == close || byte.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            exn::bail!(ErrorKind::Syntax { line: self.line, expected: "citation key" });
        }
        Ok(self.src[start..self.pos].to_string())
    }

    /// Balanced braced group, opening brace already consumed. The inner text
    /// is returned verbatim, nested braces included.
    fn braced(&mut self) -> Result<String> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(byte) = self.peek() {
            match byte {
                b'{' => depth += 1,
                b'}' if depth == 0 => {
                    let value = self.src[start..self.pos].to_string();
                    self.eat();
                    return Ok(value);
                },
                b'}' => depth -= 1,
                _ => {},
            }
            self.eat();
        }
        exn::bail!(ErrorKind::UnexpectedEof(self.line));
    }

    /// Quote-delimited value, opening quote already consumed. Braces protect
    /// inner quotes, per the classic grammar.
    fn quoted(&mut self) -> Result<String> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(byte) = self.peek() {
            match byte {
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                b'"' if depth == 0 => {
                    let value = self.src[start..self.pos].to_string();
                    self.eat();
                    return Ok(value);
                },
                _ => {},
            }
            self.eat();
        }
        exn::bail!(ErrorKind::UnexpectedEof(self.line));
    }

    fn number(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// `@comment`: skip a braced group if one follows, otherwise the rest of
    /// the line.
    fn skip_comment(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(b'{') {
            self.eat();
            self.braced()?;
            return Ok(());
        }
        while let Some(byte) = self.peek() {
            self.eat();
            if byte == b'\n' {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(input: &str) -> Bibliography {
        Parser::new().parse(input).unwrap()
    }

    #[test]
    fn test_basic_entry() {
        let bibliography = parse("@article{X1,\n  author = {Doe, J.},\n  title = {T1}\n}\n");
        assert_eq!(bibliography.entries.len(), 1);
        let entry = &bibliography.entries[0];
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.key, "X1");
        assert_eq!(entry.persons("author"), Some(&["Doe, J.".to_string()][..]));
        assert_eq!(entry.field("title"), Some("T1"));
    }

    #[test]
    fn test_field_order_is_declaration_order() {
        let bibliography = parse("@misc{k, year = {2001}, month = {jan}, note = {n}}");
        let names: Vec<_> = bibliography.entries[0].fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, vec!["year", "month", "note"]);
    }

    #[rstest]
    #[case(r#"@misc{k, title = "Quoted"}"#, "Quoted")]
    #[case("@misc{k, title = {Braced {Inner} kept}}", "Braced {Inner} kept")]
    #[case("@misc{k, title = 1984}", "1984")]
    #[case(r#"@misc{k, title = "A" # "B"}"#, "AB")]
    #[case("@misc(k, title = {Parenthesized body})", "Parenthesized body")]
    fn test_value_forms(#[case] input: &str, #[case] expected: &str) {
        let bibliography = parse(input);
        assert_eq!(bibliography.entries[0].field("title"), Some(expected));
    }

    #[test]
    fn test_string_macro_expansion() {
        let input = "@string{jacm = {Journal of the ACM}}\n@article{k, journal = jacm # {, Vol. 1}}";
        let bibliography = parse(input);
        assert_eq!(bibliography.entries[0].field("journal"), Some("Journal of the ACM, Vol. 1"));
    }

    #[test]
    fn test_macros_persist_across_files() {
        let mut parser = Parser::new();
        parser.parse("@string{acm = {ACM}}").unwrap();
        let bibliography = parser.parse("@misc{k, publisher = acm}").unwrap();
        assert_eq!(bibliography.entries[0].field("publisher"), Some("ACM"));
    }

    #[test]
    fn test_undefined_macro_has_line_number() {
        let error = Parser::new().parse("@misc{k,\n  publisher = nope\n}").unwrap_err();
        assert_eq!(*error, ErrorKind::UndefinedMacro { name: "nope".to_string(), line: 2 });
    }

    #[test]
    fn test_junk_between_entries_is_ignored() {
        let input = "This file was generated.\n@misc{a, note = {x}}\nstray text % here\n@misc{b, note = {y}}\n";
        let bibliography = parse(input);
        let keys: Vec<_> = bibliography.entries.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[rstest]
    #[case("@comment{anything {nested} here}@misc{k, note = {x}}")]
    #[case("@comment this runs to end of line\n@misc{k, note = {x}}")]
    fn test_comments_are_skipped(#[case] input: &str) {
        let bibliography = parse(input);
        assert_eq!(bibliography.entries.len(), 1);
        assert!(bibliography.entry("k").is_some());
    }

    #[test]
    fn test_preamble_is_collected() {
        let bibliography = parse("@preamble{ \"\\newcommand{\\noop}[1]{}\" }\n@misc{k, note = {x}}");
        assert_eq!(bibliography.preambles, vec!["\\newcommand{\\noop}[1]{}".to_string()]);
    }

    #[test]
    fn test_duplicate_key_within_file_fails() {
        let error = Parser::new().parse("@misc{k, note = {a}}\n@misc{k, note = {b}}").unwrap_err();
        assert_eq!(*error, ErrorKind::DuplicateKey("k".to_string()));
    }

    #[test]
    fn test_types_and_field_names_are_lowercased_keys_are_not() {
        let bibliography = parse("@ARTICLE{MixedCase, TITLE = {T}}");
        let entry = &bibliography.entries[0];
        assert_eq!(entry.entry_type, "article");
        assert_eq!(entry.key, "MixedCase");
        assert_eq!(entry.field("title"), Some("T"));
        assert!(bibliography.entry("mixedcase").is_none());
    }

    #[test]
    fn test_trailing_comma_is_accepted() {
        let bibliography = parse("@misc{k, note = {x}, }");
        assert_eq!(bibliography.entries[0].field("note"), Some("x"));
    }

    #[test]
    fn test_unterminated_entry_reports_eof() {
        let error = Parser::new().parse("@misc{k, note = {x}").unwrap_err();
        assert!(matches!(*error, ErrorKind::UnexpectedEof(_)));
    }

    #[test]
    fn test_missing_equals_reports_line() {
        let error = Parser::new().parse("@misc{k,\n  note {x}\n}").unwrap_err();
        assert_eq!(*error, ErrorKind::Syntax { line: 2, expected: "'='" });
    }

    #[test]
    fn test_person_splitting_respects_braces() {
        let bibliography = parse("@book{k, author = {Doe, J. and {Barnes and Noble} and Roe, R.}}");
        let names = bibliography.entries[0].persons("author").unwrap();
        assert_eq!(names, &["Doe, J.", "{Barnes and Noble}", "Roe, R."]);
    }

    #[test]
    fn test_person_parsing_can_be_disabled() {
        let mut parser = Parser::new().without_person_parsing();
        let bibliography = parser.parse("@book{k, author = {Doe, J. and Roe, R.}}").unwrap();
        let entry = &bibliography.entries[0];
        assert!(entry.persons.is_empty());
        assert_eq!(entry.field("author"), Some("Doe, J. and Roe, R."));
    }

    #[test]
    fn test_custom_person_roles() {
        let mut parser = Parser::new().with_person_roles(["translator"]);
        let bibliography = parser.parse("@book{k, author = {A and B}, translator = {C and D}}").unwrap();
        let entry = &bibliography.entries[0];
        assert_eq!(entry.field("author"), Some("A and B"));
        assert_eq!(entry.persons("translator"), Some(&["C".to_string(), "D".to_string()][..]));
    }

    #[rstest]
    #[case("Doe, J.", vec!["Doe, J."])]
    #[case("A and B", vec!["A", "B"])]
    #[case("A AND B", vec!["A", "B"])]
    #[case("{Acme and Sons}", vec!["{Acme and Sons}"])]
    #[case("  spaced   out   name  ", vec!["spaced out name"])]
    fn test_split_names(#[case] value: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_names(value), expected);
    }
}
