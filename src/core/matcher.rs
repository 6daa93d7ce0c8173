//! 產品名稱比對
//!
//! `%` 代表任意長度字串，`_` 代表剛好一個字元，不分大小寫，整串比對。
//! 其他字元一律當字面值，`.`、`+`、`(` 之類的 regex 符號不會生效。

use crate::utils::error::{Result, UninstallError};
use regex::{Regex, RegexBuilder};
use std::fmt;

const ANY_SEQUENCE: char = '%';
const ANY_CHAR: char = '_';

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Wildcard(Regex),
}

/// 編譯過的名稱 pattern
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    matcher: Matcher,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = if has_wildcards(pattern) {
            let regex = RegexBuilder::new(&wildcard_to_regex(pattern))
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .map_err(|source| UninstallError::PatternError {
                    pattern: pattern.to_string(),
                    source,
                })?;
            Matcher::Wildcard(regex)
        } else {
            Matcher::Exact(pattern.to_lowercase())
        };

        Ok(Self {
            source: pattern.to_string(),
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        let result = match &self.matcher {
            Matcher::Exact(expected) => name.to_lowercase() == *expected,
            Matcher::Wildcard(regex) => regex.is_match(name),
        };

        if result {
            tracing::debug!("{} match pattern {}", name, self.source);
        } else {
            tracing::debug!("{} don't match pattern {}", name, self.source);
        }

        result
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// 分號分隔的 pattern 清單，空項目直接丟掉
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<NamePattern>,
}

impl PatternSet {
    pub fn parse(text: &str) -> Result<Self> {
        let patterns = text
            .split(';')
            .filter(|entry| !entry.is_empty())
            .map(NamePattern::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamePattern> {
        self.patterns.iter()
    }

    /// 依順序回傳第一個符合的 pattern
    pub fn first_match(&self, name: &str) -> Option<&NamePattern> {
        self.patterns.iter().find(|pattern| pattern.is_match(name))
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.patterns.iter().map(NamePattern::as_str).collect();
        f.write_str(&joined.join(";"))
    }
}

/// 單次比對，pattern 不合法時視為不符合
pub fn matches(name: &str, pattern: &str) -> bool {
    match NamePattern::new(pattern) {
        Ok(compiled) => compiled.is_match(name),
        Err(e) => {
            tracing::warn!("⚠️ Ignoring pattern: {}", e);
            false
        }
    }
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(ANY_SEQUENCE) || pattern.contains(ANY_CHAR)
}

fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("^(?:");

    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            ANY_SEQUENCE | ANY_CHAR => {
                regex.push_str(&regex::escape(&literal));
                literal.clear();
                regex.push_str(if ch == ANY_SEQUENCE { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    regex.push_str(&regex::escape(&literal));
    regex.push_str(")$");
    regex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_ignores_case() {
        assert!(matches("Acme Helper", "acme helper"));
        assert!(matches("ACME HELPER", "Acme Helper"));
        assert!(!matches("Acme Helper 2", "Acme Helper"));
        assert!(!matches("Acme", "Acme Helper"));
    }

    #[test]
    fn test_any_sequence_wildcard() {
        assert!(matches("Foo123Bar", "Foo%Bar"));
        assert!(matches("FooBar", "Foo%Bar"));
        assert!(matches("foo bar", "FOO%BAR"));
        assert!(!matches("Foo123Baz", "Foo%Bar"));
    }

    #[test]
    fn test_single_char_wildcard() {
        assert!(matches("FooXBar", "Foo_Bar"));
        assert!(!matches("FooBar", "Foo_Bar"));
        assert!(!matches("FooXYBar", "Foo_Bar"));
    }

    #[test]
    fn test_match_is_anchored() {
        assert!(!matches("My Acme Tool", "Acme%"));
        assert!(!matches("Acme Tool (x64)", "%Tool"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("Acme 1.0 (x64)", "Acme 1.0 (x64)%"));
        assert!(!matches("Acme 1a0", "Acme 1.0%"));
        assert!(matches("C++ Runtime 2015", "C++ Runtime%"));
        assert!(!matches("CC Runtime 2015", "C++ Runtime%"));
        assert!(matches("Price $5 [beta]", "Price $_ [beta]"));
    }

    #[test]
    fn test_any_sequence_spans_newlines() {
        assert!(matches("Acme\nTool", "Acme%"));
    }

    #[test]
    fn test_pattern_set_discards_empty_entries() {
        let set = PatternSet::parse(";Acme%;;Other App;").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "Acme%;Other App");
        assert!(PatternSet::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_pattern_set_first_match_keeps_order() {
        let set = PatternSet::parse("Acme%;Acme Tool%").unwrap();
        let hit = set.first_match("Acme Tool 1.0").unwrap();
        assert_eq!(hit.as_str(), "Acme%");
        assert!(set.first_match("Other").is_none());
    }
}
