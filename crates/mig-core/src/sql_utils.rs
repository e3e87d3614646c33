//! SQL identifier helpers shared by SQL emission and the state store.

use crate::error::{CoreError, CoreResult};

/// Quote a SQL identifier, doubling embedded double quotes.
///
/// ```
/// use mig_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Check that `name` is a plain identifier: ASCII letter or `_` first,
/// followed by ASCII alphanumerics or `_`.
///
/// Used for names that are interpolated unquoted, such as the version table.
pub fn validate_identifier(name: &str) -> CoreResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(CoreError::InvalidIdentifier {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        });
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(CoreError::InvalidIdentifier {
            name: name.to_string(),
            reason: "must start with a letter or underscore".to_string(),
        });
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(CoreError::InvalidIdentifier {
            name: name.to_string(),
            reason: format!("contains invalid character '{bad}'"),
        });
    }
    Ok(())
}
