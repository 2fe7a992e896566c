//! Key normalization shared by the call graph and the prefix tries.

/// Strips whitespace and hyphens from a phone number.
///
/// `"064-123 4567"` and `"0641234567"` normalize to the same string.
pub fn normalize_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Normalizes a trie key: strips whitespace and hyphens, then lowercases
/// anything that is not purely numeric.
pub fn normalize_key(raw: &str) -> String {
    let stripped = normalize_number(raw);
    if is_numeric(&stripped) {
        stripped
    } else {
        stripped.to_lowercase()
    }
}

/// True when `s` is non-empty and made only of decimal digits.
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// A number the exchange accepts on the live path: digits only once normalized.
pub fn is_valid_number(raw: &str) -> bool {
    is_numeric(&normalize_number(raw))
}
