pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// True when the text has at least one cased letter and no lower-case ones.
pub fn is_all_caps(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// First `max_chars` characters, with `...` appended when something was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if char_len(text) > max_chars {
        out.push_str("...");
    }
    out
}
