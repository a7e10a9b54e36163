use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::SearchResult;
use super::lexer::quote_spans;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static SPACED_COMPARISON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(!=|>=|<=|=|<|>)\s*").unwrap());

/// Canonical form of a query: trimmed, whitespace runs collapsed to a single
/// space and no whitespace around comparison symbols.
///
/// Quoted spans are copied through untouched. Fails with `MismatchedQuotes` if
/// a quote never closes.
pub fn normalize(text: &str) -> SearchResult<String> {
    let spans = quote_spans(text)?;

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in spans {
        out.push_str(&squeeze(&text[cursor..start]));
        out.push_str(&text[start..=end]);
        cursor = end + 1;
    }
    out.push_str(&squeeze(&text[cursor..]));

    Ok(out.trim().to_string())
}

/// Normalize an unquoted segment.
fn squeeze(segment: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(segment, " ");
    SPACED_COMPARISON.replace_all(&collapsed, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_query::SearchError;

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(normalize("  a   b\t\tc \n").unwrap(), "a b c");
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize("   ").unwrap(), "");
    }

    #[test]
    fn strips_space_around_comparisons() {
        assert_eq!(normalize("a = b").unwrap(), "a=b");
        assert_eq!(normalize("a  !=  b c >= 1 d<  2").unwrap(), "a!=b c>=1 d<2");
    }

    #[test]
    fn leaves_quoted_spans_alone() {
        assert_eq!(normalize(r#"x   "a   b = c"   y"#).unwrap(), r#"x "a   b = c" y"#);
        assert_eq!(normalize(r#"name = "  spaced  ""#).unwrap(), r#"name="  spaced  ""#);
        assert_eq!(normalize(r#""a \" b"  "c""#).unwrap(), r#""a \" b" "c""#);
    }

    #[test]
    fn rejects_unclosed_quote() {
        assert_eq!(normalize(r#"as"df"#), Err(SearchError::MismatchedQuotes));
        assert_eq!(normalize(r#""ok" "broken"#), Err(SearchError::MismatchedQuotes));
    }
}
