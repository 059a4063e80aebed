/// Collapses every whitespace run to a single space and trims both ends.
///
/// Extractive models return spans copied verbatim from the context, so
/// answers often carry the passage's line breaks and indentation.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
