use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use regex::Regex;

/// Match `text` against a wildcard `pattern`.
///
/// `*` matches any run of characters (including none) and `_` exactly one
/// character; everything else is literal. A `floating` match may occur anywhere
/// in `text`, otherwise the whole of `text` has to match. Case folding is up to
/// the caller.
pub fn wildcard_match_str(pattern: &str, text: &str, floating: bool) -> bool {
    if !has_wildcards(pattern) {
        return literal_match(pattern, text, floating);
    }
    match compile(pattern, floating) {
        Some(regex) => regex.is_match(text),
        None => literal_match(pattern, text, floating),
    }
}

/// Wildcard matcher that compiles each pattern once.
///
/// Patterns come from the text of a built query, so the cache is bounded by the
/// query. A parser shares one cache across every row it tests.
#[derive(Debug, Default)]
pub struct PatternCache {
    anchored: RwLock<HashMap<String, Option<Regex>>>,
    floating: RwLock<HashMap<String, Option<Regex>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same result as [`wildcard_match_str`].
    pub fn is_match(&self, pattern: &str, text: &str, floating: bool) -> bool {
        if !has_wildcards(pattern) {
            return literal_match(pattern, text, floating);
        }
        match self.regex(pattern, floating) {
            Some(regex) => regex.is_match(text),
            None => literal_match(pattern, text, floating),
        }
    }

    fn regex(&self, pattern: &str, floating: bool) -> Option<Regex> {
        let cache = if floating { &self.floating } else { &self.anchored };

        if let Some(hit) = cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return hit.clone();
        }

        let compiled = compile(pattern, floating);
        cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pattern.to_string(), compiled.clone());
        compiled
    }

    #[cfg(test)]
    fn compiled_count(&self) -> usize {
        let count = |cache: &RwLock<HashMap<String, Option<Regex>>>| {
            cache.read().unwrap_or_else(PoisonError::into_inner).len()
        };
        count(&self.anchored) + count(&self.floating)
    }
}

fn literal_match(pattern: &str, text: &str, floating: bool) -> bool {
    if floating {
        text.contains(pattern)
    } else {
        text == pattern
    }
}

fn compile(pattern: &str, floating: bool) -> Option<Regex> {
    match Regex::new(&wildcard_to_regex(pattern, floating)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::warn!("wildcard pattern {pattern:?} rejected by regex engine: {e}; comparing literally");
            None
        }
    }
}

pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(|c| c == '*' || c == '_')
}

/// Regex source equivalent to a wildcard pattern.
pub fn wildcard_to_regex(pattern: &str, floating: bool) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)");
    if !floating {
        out.push('^');
    }

    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '_' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }

    if !floating {
        out.push('$');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_patterns() {
        assert!(wildcard_match_str("one two", "1 one two 3", true));
        assert!(!wildcard_match_str("one two", "1 one two 3", false));
        assert!(wildcard_match_str("abc", "abc", false));
        assert!(wildcard_match_str("", "anything", true));
        assert!(!wildcard_match_str("", "anything", false));
    }

    #[test]
    fn star_matches_any_run() {
        assert!(wildcard_match_str("*b", "ab", false));
        assert!(wildcard_match_str("a*", "a", false));
        assert!(!wildcard_match_str("*b", "abc", false));
        assert!(wildcard_match_str("*b", "abc", true));
        assert!(wildcard_match_str("a*c", "a\nb\nc", false));

        for (x, a, y) in [("", "mid", ""), ("pre ", "mid", " post"), ("x", "", "y")] {
            let text = format!("{x}{a}{y}");
            assert!(wildcard_match_str(&format!("*{a}*"), &text, false));
            assert!(wildcard_match_str(&format!("*{a}*"), &text, true));
        }
    }

    #[test]
    fn underscore_matches_one_char() {
        assert!(wildcard_match_str("a_c", "abc", false));
        assert!(wildcard_match_str("a_c", "aéc", false));
        assert!(!wildcard_match_str("a_c", "ac", false));
        assert!(!wildcard_match_str("a_c", "abbc", false));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(wildcard_match_str("a.c*", "a.cd", false));
        assert!(!wildcard_match_str("a.c*", "abcd", false));
        assert!(wildcard_match_str("(x)+[y]*", "(x)+[y]", false));
        assert!(wildcard_match_str("$5?*", "$5? off", false));
    }

    #[test]
    fn cache_compiles_each_pattern_once() {
        let cache = PatternCache::new();
        for text in ["abc", "a-c", "xyz"] {
            assert_eq!(cache.is_match("a_c", text, false), wildcard_match_str("a_c", text, false));
            assert_eq!(cache.is_match("*c", text, true), wildcard_match_str("*c", text, true));
        }
        assert!(cache.is_match("plain", "a plain text", true));
        // "plain" never reaches the regex engine
        assert_eq!(cache.compiled_count(), 2);

        // anchored and floating forms are cached apart
        assert!(cache.is_match("a_c", "xa_cx", true));
        assert_eq!(cache.compiled_count(), 3);
    }

    #[test]
    fn regex_source() {
        assert_eq!(wildcard_to_regex("a*b_", false), "(?s)^a.*b.$");
        assert_eq!(wildcard_to_regex("a.b", true), r"(?s)a\.b");
    }
}
