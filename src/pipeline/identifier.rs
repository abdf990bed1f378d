//! Leading-number identifiers in file names.
//!
//! Downloaded songs are named `"<id> <title>.<ext>"`, e.g. `"07 Track Name.mp3"`.

/// Whether a file name marks a hidden file.
pub fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Extract the leading identifier from a file name.
///
/// The name is split on its first whitespace run and the leading token must be
/// plain ASCII digits. Zero padding is allowed (`"007 x"` is `7`); signs are not.
/// Returns `None` for hidden files, names without whitespace, and tokens that
/// are not a non-negative integer fitting in a `u64`.
pub fn parse(file_name: &str) -> Option<u64> {
    if is_hidden(file_name) {
        return None;
    }

    let (token, _rest) = file_name.split_once(char::is_whitespace)?;
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    token.parse().ok()
}
