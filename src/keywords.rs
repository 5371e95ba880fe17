/// Turn free text into search terms: drop all whitespace, split on commas.
///
/// Empty segments are kept, so `""` gives `[""]` and `"a,,b"` gives
/// `["a", "", "b"]`. Use [`has_search_terms`] to tell whether anything is
/// left to search for.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.split(',').map(str::to_string).collect()
}

/// False for empty or all-comma input.
pub fn has_search_terms(keywords: &[String]) -> bool {
    keywords.iter().any(|k| !k.is_empty())
}
