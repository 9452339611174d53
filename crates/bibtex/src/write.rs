//! Serialization of parsed entries back to BibTeX text.

use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::Entry;

/// Serializes an [`Entry`] into its textual form.
///
/// The output is deterministic: entry type, key, the person-role fields in
/// role-declaration order, then the scalar fields in declaration order. No
/// whitespace normalization happens beyond the format's own delimiters.
///
/// The `trusted_input` capability decides whether field values are re-checked
/// for brace balance. The trusted writer exists to round-trip [`Parser`]
/// output at full speed and must never be pointed at unreviewed or
/// hand-edited values; use [`Writer::strict`] for those.
///
/// [`Parser`]: crate::Parser
#[derive(Debug, Clone, Copy)]
pub struct Writer {
    trusted_input: bool,
}

impl Writer {
    pub fn new(trusted_input: bool) -> Self {
        Self { trusted_input }
    }

    /// A writer that skips brace-balance validation.
    pub fn trusted() -> Self {
        Self::new(true)
    }

    /// A writer that rejects values with unbalanced braces.
    pub fn strict() -> Self {
        Self::new(false)
    }

    /// Render one entry.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`ErrorKind::UnbalancedBraces`] naming the
    /// first offending field. The trusted writer never fails.
    #[instrument(skip(self, entry), fields(key = %entry.key))]
    pub fn entry_to_string(&self, entry: &Entry) -> Result<String> {
        let mut out = String::new();
        out.push('@');
        out.push_str(&entry.entry_type);
        out.push('{');
        out.push_str(&entry.key);
        for person in &entry.persons {
            let joined = person.names.join(" and ");
            if !self.trusted_input {
                check_braces(&person.role, &joined)?;
            }
            push_field(&mut out, &person.role, &joined);
        }
        for field in &entry.fields {
            if !self.trusted_input {
                check_braces(&field.name, &field.value)?;
            }
            push_field(&mut out, &field.name, &field.value);
        }
        out.push_str("\n}\n");
        Ok(out)
    }
}

fn push_field(out: &mut String, name: &str, value: &str) {
    out.push_str(",\n    ");
    out.push_str(name);
    out.push_str(" = {");
    out.push_str(value);
    out.push('}');
}

fn check_braces(field: &str, value: &str) -> Result<()> {
    let mut depth = 0i64;
    for byte in value.bytes() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    exn::bail!(ErrorKind::UnbalancedBraces(field.to_string()));
                }
            },
            _ => {},
        }
    }
    if depth != 0 {
        exn::bail!(ErrorKind::UnbalancedBraces(field.to_string()));
    }
    Ok(())
}
