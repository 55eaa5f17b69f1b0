//! Tag tokenizers for the two input formats. Spec §6.

pub mod aref;
pub mod embedded;

/// Escapes control characters in a literal text slice, for cost-model views and diagnostics.
/// Grounded on `ne-scoring-gen.cc`'s `escape()`.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\x{:02x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_newlines_and_tabs() {
        assert_eq!(escape("a\nb\tc"), "a\\nb\\tc");
    }

    #[test]
    fn leaves_printable_text_untouched() {
        assert_eq!(escape("Alice Smith"), "Alice Smith");
    }
}
