//! Text helpers shared by the notification and HTTP layers.

/// Suffix appended by [`truncate_text`] callers that want a visible ellipsis.
pub const DEFAULT_TRUNCATION_SUFFIX: &str = "...";

/// Truncate `text` to at most `max_length` characters, ending with `suffix` when cut.
///
/// Lengths are counted in characters. When `max_length` leaves no room for any
/// of the original text, the result is the first `max_length` characters of
/// `suffix` itself.
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let suffix_length = suffix.chars().count();
    if max_length <= suffix_length {
        return suffix.chars().take(max_length).collect();
    }

    let mut truncated: String = text.chars().take(max_length - suffix_length).collect();
    truncated.push_str(suffix);
    truncated
}

/// Strip surrounding whitespace from caller-supplied text.
pub fn sanitize_input(text: &str) -> String {
    text.trim().to_string()
}
