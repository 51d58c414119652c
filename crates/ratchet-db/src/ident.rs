use ratchet_common::{Error, Result};

/// Accept only plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`), since table
/// and schema names are formatted into DDL text.
pub(crate) fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(Error::Config(format!("invalid {kind} name: {name:?}")));
    }
    if name.len() > 63 {
        return Err(Error::Config(format!("{kind} name too long: {name:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_identifier;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["_ratchet_version", "public", "Schema_2", "t"] {
            assert!(validate_identifier("table", name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_anything_that_needs_quoting() {
        for name in ["", "1abc", "a-b", "a b", "x;DROP TABLE y", "a\"b", "ä"] {
            assert!(validate_identifier("table", name).is_err(), "{name:?}");
        }
        assert!(validate_identifier("schema", &"a".repeat(64)).is_err());
    }
}
