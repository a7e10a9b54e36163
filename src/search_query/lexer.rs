//! Byte-level scanners shared by the normalizer and the tree builder.
//!
//! Every delimiter the query language knows is ASCII, so offsets returned here
//! are always valid `str` slice boundaries.

use super::errors::{SearchError, SearchResult};

/// Index of the `"` closing the quote that opens at `start`.
///
/// A backslash always skips the following byte, so `\"` and `\\` never end a
/// quote. Returns `None` when the string ends first.
pub fn get_quote_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the `)` matching the `(` at `start`.
///
/// Quoted spans are skipped whole, so parentheses inside quotes never change the
/// depth. Returns `None` when the parenthesis (or a quote inside it) never closes.
pub fn get_parenthesis_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' => {
                i = get_quote_end(text, i)?;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// `(start, end)` byte ranges (both inclusive) of every top-level quoted span.
pub fn quote_spans(text: &str) -> SearchResult<Vec<(usize, usize)>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => {
                let end = get_quote_end(text, i).ok_or(SearchError::MismatchedQuotes)?;
                spans.push((i, end));
                i = end + 1;
            }
            _ => i += 1,
        }
    }
    Ok(spans)
}

/// Split `text` on every top-level occurrence of `separator`.
///
/// Quoted and parenthesized spans are atomic. Leading and trailing separators and
/// whitespace are dropped first, every segment is trimmed, and an input that ends
/// up empty yields no segments at all.
pub fn split_args(text: &str, separator: &str) -> SearchResult<Vec<String>> {
    let text = trim_separators(text, separator);
    if text.is_empty() {
        return Ok(vec![]);
    }
    if separator.is_empty() {
        return Ok(vec![text.to_string()]);
    }

    let bytes = text.as_bytes();
    let sep = separator.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' => {
                i = get_quote_end(text, i).ok_or(SearchError::MismatchedQuotes)? + 1;
                continue;
            }
            b'(' => {
                i = get_parenthesis_end(text, i).ok_or(SearchError::MismatchedParenthesis)? + 1;
                continue;
            }
            b')' => return Err(SearchError::MismatchedParenthesis),
            _ => {}
        }

        if bytes[i..].starts_with(sep) {
            parts.push(text[start..i].trim().to_string());
            i += sep.len();
            start = i;
        } else {
            i += 1;
        }
    }

    parts.push(text[start..].trim().to_string());
    Ok(parts)
}

fn trim_separators<'a>(text: &'a str, separator: &str) -> &'a str {
    let mut text = text.trim();
    if separator.is_empty() {
        return text;
    }
    loop {
        let before = text.len();
        if let Some(rest) = text.strip_prefix(separator) {
            text = rest.trim();
        }
        if let Some(rest) = text.strip_suffix(separator) {
            text = rest.trim();
        }
        if text.len() == before {
            return text;
        }
    }
}

/// Whether `text` has unescaped whitespace outside quoted and parenthesized spans.
pub fn has_top_level_whitespace(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' => {
                if let Some(end) = get_quote_end(text, i) {
                    i = end + 1;
                    continue;
                }
            }
            b'(' => {
                if let Some(end) = get_parenthesis_end(text, i) {
                    i = end + 1;
                    continue;
                }
            }
            b if b.is_ascii_whitespace() => return true,
            _ => {}
        }
        i += 1;
    }
    false
}

/// Top-level comparison symbols in `text` as `(offset, symbol)` pairs.
///
/// `!=`, `>=` and `<=` are recognised as single symbols only when `extended` is set.
pub fn comparison_symbols(text: &str, extended: bool) -> Vec<(usize, &'static str)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'"' => match get_quote_end(text, i) {
                Some(end) => {
                    i = end + 1;
                    continue;
                }
                None => return found,
            },
            b'(' => match get_parenthesis_end(text, i) {
                Some(end) => {
                    i = end + 1;
                    continue;
                }
                None => return found,
            },
            _ => {}
        }

        let composite = match (bytes[i], bytes.get(i + 1).copied()) {
            (b'!', Some(b'=')) if extended => Some("!="),
            (b'>', Some(b'=')) if extended => Some(">="),
            (b'<', Some(b'=')) if extended => Some("<="),
            _ => None,
        };
        if let Some(symbol) = composite {
            found.push((i, symbol));
            i += 2;
            continue;
        }

        match bytes[i] {
            b'=' => found.push((i, "=")),
            b'<' => found.push((i, "<")),
            b'>' => found.push((i, ">")),
            _ => {}
        }
        i += 1;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_end_skips_escapes() {
        assert_eq!(get_quote_end(r#""abc""#, 0), Some(4));
        assert_eq!(get_quote_end(r#""a\"b" x"#, 0), Some(5));
        assert_eq!(get_quote_end(r#""a\\" x"#, 0), Some(4));
        assert_eq!(get_quote_end(r#""abc"#, 0), None);
        assert_eq!(get_quote_end(r#""abc\""#, 0), None);
    }

    #[test]
    fn parenthesis_end_tracks_depth() {
        assert_eq!(get_parenthesis_end("(a)", 0), Some(2));
        assert_eq!(get_parenthesis_end("(a(b)c) d", 0), Some(6));
        assert_eq!(get_parenthesis_end("f(a, (b)) x", 1), Some(8));
        assert_eq!(get_parenthesis_end("(a(b)", 0), None);
    }

    #[test]
    fn parenthesis_end_ignores_quoted_and_escaped_parens() {
        assert_eq!(get_parenthesis_end(r#"(")" a)"#, 0), Some(6));
        assert_eq!(get_parenthesis_end(r"(\) a)", 0), Some(5));
        assert_eq!(get_parenthesis_end(r#"(")"#, 0), None);
    }

    #[test]
    fn split_keeps_nested_spans_whole() {
        assert_eq!(split_args("func(1,2),3", ",").unwrap(), vec!["func(1,2)", "3"]);
        assert_eq!(
            split_args(r#"a "b c" (d e) f"#, " ").unwrap(),
            vec!["a", r#""b c""#, "(d e)", "f"]
        );
        assert_eq!(
            split_args("x((a,b),(c,d)),y", ",").unwrap(),
            vec!["x((a,b),(c,d))", "y"]
        );
    }

    #[test]
    fn split_trims_and_handles_empty_input() {
        assert_eq!(split_args(" , a , b ,", ",").unwrap(), vec!["a", "b"]);
        assert!(split_args("", ",").unwrap().is_empty());
        assert!(split_args("  ,, ", ",").unwrap().is_empty());
    }

    #[test]
    fn split_supports_multi_char_separators() {
        assert_eq!(split_args("a->b->(c->d)", "->").unwrap(), vec!["a", "b", "(c->d)"]);
        // literal match, not a character class
        assert_eq!(split_args("a-b>c", "->").unwrap(), vec!["a-b>c"]);
    }

    #[test]
    fn split_reports_unbalanced_input() {
        assert_eq!(split_args("as(df", " "), Err(SearchError::MismatchedParenthesis));
        assert_eq!(split_args("a) b", " "), Err(SearchError::MismatchedParenthesis));
        assert_eq!(split_args(r#"a "b"#, " "), Err(SearchError::MismatchedQuotes));
    }

    #[test]
    fn quote_spans_are_found_in_order() {
        assert_eq!(quote_spans(r#"a "b" c "d""#).unwrap(), vec![(2, 4), (8, 10)]);
        assert!(quote_spans(r#"a \"b"#).unwrap().is_empty());
        assert_eq!(quote_spans(r#"as"df"#), Err(SearchError::MismatchedQuotes));
    }

    #[test]
    fn comparison_symbols_at_top_level_only() {
        assert_eq!(comparison_symbols("a=b", true), vec![(1, "=")]);
        assert_eq!(comparison_symbols("a!=b", true), vec![(1, "!=")]);
        assert_eq!(comparison_symbols("a>=b", false), vec![(1, ">"), (2, "=")]);
        assert!(comparison_symbols(r#""a=b""#, true).is_empty());
        assert!(comparison_symbols("f(a=b)", true).is_empty());
        assert!(comparison_symbols(r"a\=b", true).is_empty());
    }

    #[test]
    fn top_level_whitespace() {
        assert!(has_top_level_whitespace("a b"));
        assert!(!has_top_level_whitespace(r"a\ b"));
        assert!(!has_top_level_whitespace("ab"));
        assert!(!has_top_level_whitespace(r#""a b"c"#));
        assert!(!has_top_level_whitespace("f(a b)"));
    }
}
