//! Locale-insensitive pattern matching.
//!
//! SQLite's built-in `LIKE` folds case for ASCII only, so a pattern like
//! `%мерло%` misses `Мерло`. Two pieces fix that:
//!
//! - [`rewrite_pattern_operators`] turns `ILIKE` (a dialect habit the model
//!   picks up from PostgreSQL) into plain `LIKE` on the token stream.
//! - [`like_match`] is the comparison the executor registers as the `like()`
//!   scalar override on every catalog connection: both sides are case-folded
//!   across the Latin and Cyrillic alphabets before matching.
//!
//! Folding lowercases, so patterns that are already lowercase match exactly
//! the same rows as before.

use crate::token::{render, tokenize, TokenKind};

/// Case-fold text for comparison: lowercase across alphabets, `ё` → `е`.
pub fn fold_case(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .collect()
}

/// Rewrite case-insensitive pattern operators to the form the engine knows.
///
/// Only `Word` tokens are touched; string literals pass through verbatim.
pub fn rewrite_pattern_operators(sql: &str) -> String {
    let mut tokens = tokenize(sql);
    for token in &mut tokens {
        if token.kind == TokenKind::Word && token.text.eq_ignore_ascii_case("ilike") {
            token.text = "LIKE".to_string();
        }
    }
    render(&tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatItem {
    /// `%` — any run of characters, including empty.
    Any,
    /// `_` — exactly one character.
    One,
    Lit(char),
}

fn compile_pattern(pattern: &str, escape: Option<char>) -> Vec<PatItem> {
    let mut items = Vec::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if Some(c) == escape {
            if let Some(next) = chars.next() {
                items.push(PatItem::Lit(next));
            }
            continue;
        }
        match c {
            '%' => {
                // Collapse runs of %.
                if items.last() != Some(&PatItem::Any) {
                    items.push(PatItem::Any);
                }
            }
            '_' => items.push(PatItem::One),
            other => items.push(PatItem::Lit(other)),
        }
    }
    items
}

/// SQL LIKE with Unicode case folding on both sides.
///
/// `escape` mirrors the optional `ESCAPE` clause; the escape character is
/// applied before folding, matching SQLite's own order of operations.
pub fn like_match(pattern: &str, text: &str, escape: Option<char>) -> bool {
    let items = compile_pattern(&fold_case(pattern), escape.map(fold_escape));
    let text: Vec<char> = fold_case(text).chars().collect();

    // Iterative matcher with backtracking over the last `%`.
    let mut p = 0;
    let mut t = 0;
    let mut star: Option<usize> = None;
    let mut star_t = 0;

    while t < text.len() {
        match items.get(p) {
            Some(PatItem::Lit(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            Some(PatItem::One) => {
                p += 1;
                t += 1;
            }
            Some(PatItem::Any) => {
                star = Some(p);
                star_t = t;
                p += 1;
            }
            _ => match star {
                Some(s) => {
                    p = s + 1;
                    star_t += 1;
                    t = star_t;
                }
                None => return false,
            },
        }
    }

    while items.get(p) == Some(&PatItem::Any) {
        p += 1;
    }
    p == items.len()
}

fn fold_escape(c: char) -> char {
    let mut lower = c.to_lowercase();
    let folded = lower.next().unwrap_or(c);
    if folded == 'ё' {
        'е'
    } else {
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case_latin_and_cyrillic() {
        assert_eq!(fold_case("PINOT Noir"), "pinot noir");
        assert_eq!(fold_case("МЕРЛО"), "мерло");
        assert_eq!(fold_case("Алёнушка"), "аленушка");
    }

    #[test]
    fn test_rewrite_ilike_to_like() {
        assert_eq!(
            rewrite_pattern_operators("SELECT * FROM wines WHERE name ILIKE '%pinot%'"),
            "SELECT * FROM wines WHERE name LIKE '%pinot%'"
        );
        assert_eq!(
            rewrite_pattern_operators("SELECT * FROM wines WHERE NOT name ilike '%x%'"),
            "SELECT * FROM wines WHERE NOT name LIKE '%x%'"
        );
    }

    #[test]
    fn test_rewrite_leaves_literals_alone() {
        let out = rewrite_pattern_operators("SELECT 'they ILIKE wine' AS x");
        assert!(out.contains("'they ILIKE wine'"));
    }

    #[test]
    fn test_like_cyrillic_case_insensitive() {
        assert!(like_match("%мерло%", "Мерло Резерв", None));
        assert!(like_match("%мерло%", "МЕРЛО", None));
        assert!(like_match("%мерло%", "мерло", None));
        assert!(!like_match("%мерло%", "Каберне", None));
    }

    #[test]
    fn test_like_latin_case_insensitive() {
        assert!(like_match("%Pinot%", "pinot noir", None));
        assert!(like_match("%Pinot%", "PINOT", None));
        assert!(!like_match("%Pinot%", "Merlot", None));
    }

    #[test]
    fn test_underscore_matches_exactly_one() {
        assert!(like_match("в_но", "вино", None));
        assert!(!like_match("в_но", "виноград", None));
    }

    #[test]
    fn test_percent_runs_and_anchors() {
        assert!(like_match("крым%", "Крымский полуостров", None));
        assert!(!like_match("крым", "Крымский", None));
        assert!(like_match("%%граф%%", "Винодельня Граф", None));
        assert!(like_match("%", "", None));
    }

    #[test]
    fn test_escape_character() {
        assert!(like_match(r"100\%", "100%", Some('\\')));
        assert!(!like_match(r"100\%", "100 points", Some('\\')));
    }

    #[test]
    fn test_lowercase_pattern_unchanged_behavior() {
        // Already-lowercased patterns match the same rows as ASCII LIKE.
        assert!(like_match("%red%", "a red wine", None));
        assert!(!like_match("%red%", "white wine", None));
    }
}
