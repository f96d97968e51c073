//! Result snippets and HTML escaping for rendered search hits.

/// Characters of context kept before the first matched query term.
pub const SNIPPET_LEAD: usize = 60;

/// Excerpt of `text` around the first query term it contains.
///
/// Terms are tried in query order and matched case-insensitively. Without a
/// match the first `length` characters are returned; otherwise the excerpt
/// starts [`SNIPPET_LEAD`] characters before the match (clamped to the start)
/// and is prefixed with `...` when it does not begin at the start of `text`.
#[must_use]
pub fn build_snippet(text: &str, query: &str, length: usize) -> String {
    let haystack: Vec<char> = text.chars().map(fold_char).collect();

    let position = query
        .split_whitespace()
        .find_map(|term| find_chars(&haystack, &term.chars().map(fold_char).collect::<Vec<_>>()));

    match position {
        None => text.chars().take(length).collect(),
        Some(pos) => {
            let start = pos.saturating_sub(SNIPPET_LEAD);
            let excerpt: String = text.chars().skip(start).take(length).collect();
            if start > 0 {
                format!("...{excerpt}")
            } else {
                excerpt
            }
        }
    }
}

/// Lowercase one char without changing the char count of the text.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Escape `&`, `<`, `>`, `"` and `'` for embedding in HTML text or attributes.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
