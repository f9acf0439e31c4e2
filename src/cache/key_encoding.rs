//! Key to filename mapping for the disk tier.
//!
//! Keys are percent-encoded so that any string, including ones with path
//! separators or non-ASCII characters, becomes a single path segment. A
//! leading `.` is also escaped so no key lands on `.`, `..` or a hidden file.
//!
//! Uppercase letters are escaped as well. Raw letters in a file name are then
//! always lowercase and escape digits always uppercase, so two keys never
//! share a file on a case-insensitive filesystem.

/// Encodes a key into a filesystem-safe file name.
pub fn encode_key(key: &str) -> String {
    let encoded = urlencoding::encode(key);
    let mut name = String::with_capacity(encoded.len());
    let mut escape_digits = 0;
    for (i, c) in encoded.char_indices() {
        if escape_digits > 0 {
            escape_digits -= 1;
            name.push(c);
        } else if c == '%' {
            escape_digits = 2;
            name.push(c);
        } else if c.is_ascii_uppercase() || (i == 0 && c == '.') {
            name.push_str(&format!("%{:02X}", c as u8));
        } else {
            name.push(c);
        }
    }
    name
}

/// Decodes a file name produced by [`encode_key`].
///
/// Returns `None` for names that are not valid encodings, or that decode to
/// an empty key.
pub fn decode_key(file_name: &str) -> Option<String> {
    // Anything encode_key would have escaped must not appear raw.
    let canonical = file_name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'%'));
    if !canonical || file_name.starts_with('.') {
        return None;
    }

    let decoded = urlencoding::decode(file_name).ok()?;
    if decoded.is_empty() || encode_key(&decoded) != file_name {
        return None;
    }
    Some(decoded.into_owned())
}
