//! Shared display helpers

/// Preview of user-supplied content for prompt echo.
///
/// Content at or under `max_bytes` is returned unchanged. Longer content is
/// cut at the last UTF-8 character boundary at or before `max_bytes` and an
/// ellipsis is appended, so multi-byte characters are never split.
pub fn preview(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
