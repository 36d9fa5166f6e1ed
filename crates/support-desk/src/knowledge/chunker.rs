//! Paragraph chunking of the flat knowledge source.

/// Split on blank lines (`"\n\n"`), trimming each paragraph and dropping empty ones.
/// Windows line endings are normalised first so `"\r\n\r\n"` also separates paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
