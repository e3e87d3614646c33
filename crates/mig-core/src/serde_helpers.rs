//! Shared serde helper functions.

/// Serde default function that returns `true`.
pub fn default_true() -> bool {
    true
}

/// Predicate for `skip_serializing_if` on boolean fields that default to `false`.
pub fn is_false(value: &bool) -> bool {
    !*value
}

/// Predicate for `skip_serializing_if` on boolean fields that default to `true`.
pub fn is_true(value: &bool) -> bool {
    *value
}
