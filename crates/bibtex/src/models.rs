//! Parsed BibTeX data model.
//!
//! Entries keep their fields in declaration order. Person-role fields (author,
//! editor) are held separately from scalar fields so the writer can emit the
//! person block first, but both blocks preserve the order the roles and fields
//! were declared in the source.

/// One person-role field of an entry, e.g. `author` or `editor`.
///
/// Names appear in declaration order and are re-joined with ` and ` on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonField {
    /// Role name, lowercased (`author`, `editor`, ...).
    pub role: String,
    /// Individual names, split on the word `and` at brace depth zero.
    pub names: Vec<String>,
}

/// One scalar field of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name, lowercased.
    pub name: String,
    /// Field value with delimiters stripped, otherwise verbatim.
    pub value: String,
}

/// A single bibliographic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry type, lowercased (`article`, `book`, ...).
    pub entry_type: String,
    /// Citation key, case-sensitive and taken verbatim from the source.
    pub key: String,
    /// Person-role fields in declaration order.
    pub persons: Vec<PersonField>,
    /// Scalar fields in declaration order.
    pub fields: Vec<Field>,
}

impl Entry {
    /// Look up a scalar field by (case-insensitive) name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.fields.iter().find(|field| field.name == name).map(|field| field.value.as_str())
    }

    /// Look up a person-role field by (case-insensitive) role.
    pub fn persons(&self, role: &str) -> Option<&[String]> {
        let role = role.to_ascii_lowercase();
        self.persons.iter().find(|person| person.role == role).map(|person| person.names.as_slice())
    }
}

/// Everything parsed out of one `.bib` source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bibliography {
    /// `@preamble` values in declaration order.
    pub preambles: Vec<String>,
    /// Entries in declaration order.
    pub entries: Vec<Entry>,
}

impl Bibliography {
    /// Look up an entry by its (case-sensitive) citation key.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.key == key)
    }
}
