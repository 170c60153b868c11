//! Entity-name normalization applied before any strategy runs.

/// Lowercase, trim, strip leading articles and trailing possessives, and
/// collapse internal whitespace.
pub fn normalize(name: &str) -> String {
    let lowered = name.trim().to_lowercase();

    let mut stripped = lowered.as_str();
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = stripped.strip_prefix(article) {
            stripped = rest;
            break;
        }
    }

    let stripped = stripped
        .strip_suffix("'s")
        .or_else(|| stripped.strip_suffix('\''))
        .unwrap_or(stripped);

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
