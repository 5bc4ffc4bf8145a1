/// Canonicalize a word for lexicon matching: trim whitespace, drop ASCII
/// punctuation anywhere in the word, and lowercase. The same function is
/// applied to lexicon keys and lookup keys so casing or punctuation can
/// never cause a missed match.
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .to_lowercase()
}
