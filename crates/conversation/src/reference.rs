//! Position grammar for list references.
//!
//! After the assistant shows a numbered list, users point back into it with
//! positions rather than names: "2", "#3", "позиция 1", "the second one",
//! "второе", "1 и 3", "2-4", "from 2 to 4", "все". This module decides
//! whether a message is such a positional reference and extracts the
//! 1-based positions; anything it does not fully recognize is left to the
//! free-text path.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlgate::fold_case;

/// Numbers above this are treated as data (a vintage year), not a position.
const MAX_POSITION: u32 = 100;

/// A recognized positional reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionReference {
    /// "all", "все" and friends: every entry in the list.
    All,
    /// Explicit 1-based positions, deduplicated, in mention order.
    Positions(Vec<u32>),
}

static DIGIT_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*[-–—]\s*(\d+)").expect("digit range regex"));

static WORD_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:from|с|от)\s+(\d+)\s+(?:to|through|по|до)\s+(\d+)\b")
        .expect("word range regex")
});

/// English ordinal words, first through twentieth.
const EN_ORDINALS: &[(&str, u32)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
    ("thirteenth", 13),
    ("fourteenth", 14),
    ("fifteenth", 15),
    ("sixteenth", 16),
    ("seventeenth", 17),
    ("eighteenth", 18),
    ("nineteenth", 19),
    ("twentieth", 20),
];

/// Russian ordinal stems, longest first so "пятнадцат" wins over "пят".
const RU_ORDINAL_STEMS: &[(&str, u32)] = &[
    ("четырнадцат", 14),
    ("восемнадцат", 18),
    ("девятнадцат", 19),
    ("одиннадцат", 11),
    ("двенадцат", 12),
    ("тринадцат", 13),
    ("пятнадцат", 15),
    ("шестнадцат", 16),
    ("семнадцат", 17),
    ("двадцат", 20),
    ("четверт", 4),
    ("восьм", 8),
    ("девят", 9),
    ("десят", 10),
    ("седьм", 7),
    ("перв", 1),
    ("втор", 2),
    ("трет", 3),
    ("шест", 6),
    ("пят", 5),
];

/// "All of them" markers.
const ALL_WORDS: &[&str] = &["all", "все", "всем", "всех"];

/// Connective words that may appear around positions without making the
/// message free text.
const FILLER_WORDS: &[&str] = &[
    // en
    "and", "or", "the", "of", "them", "one", "ones", "number", "numbers",
    "position", "positions", "item", "items", "option", "options", "wine",
    "wines", "card", "cards", "please", "take", "pick", "choose", "from",
    "to", "through", "on", "for",
    // ru
    "и", "или", "номер", "номера", "позиция", "позиции", "позицию", "пункт",
    "пункты", "вариант", "варианты", "вино", "вина", "вин", "пожалуйста",
    "возьми", "выбери", "давай", "под", "про", "же", "это", "этот", "эту",
    "тот", "ту", "с", "по", "от", "до", "на", "к", "ко",
];

/// Parse a message as a positional reference.
///
/// Returns `None` when the message contains anything the grammar does not
/// cover, so "Мерло 2019" falls through to free-text matching while
/// "первое и третье" does not. Positions are not range-checked here; the
/// resolver rejects out-of-range ones against the actual list.
pub fn parse_position_reference(text: &str) -> Option<PositionReference> {
    let folded = fold_case(text).replace(['#', '№'], " ");

    // (byte offset, positions) pairs, merged by offset at the end so "1, 2-3"
    // comes out in mention order.
    let mut events: Vec<(usize, Vec<u32>)> = Vec::new();
    let mut all = false;

    // Ranges first, blanked out in place so their digits are not re-read;
    // blanking keeps byte offsets valid for the word scan below.
    let mut masked = folded;
    for re in [&WORD_RANGE_RE, &DIGIT_RANGE_RE] {
        let ranges: Vec<(usize, usize, String, String)> = re
            .captures_iter(&masked)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), whole.end(), caps[1].to_string(), caps[2].to_string()))
            })
            .collect();
        for (start, end, lo, hi) in ranges {
            let mut positions = Vec::new();
            push_range(&mut positions, &lo, &hi);
            events.push((start, positions));
            masked.replace_range(start..end, &" ".repeat(end - start));
        }
    }

    let mut words: Vec<(usize, String)> = Vec::new();
    let mut word = String::new();
    let mut word_at = 0;
    for (i, c) in masked.char_indices() {
        if c.is_alphanumeric() {
            if word.is_empty() {
                word_at = i;
            }
            word.push(c);
        } else if !word.is_empty() {
            words.push((word_at, std::mem::take(&mut word)));
        }
    }
    if !word.is_empty() {
        words.push((word_at, word));
    }

    for (at, word) in &words {
        let word = word.as_str();
        if word.chars().all(|c| c.is_ascii_digit()) {
            match word.parse::<u32>() {
                Ok(n) if n <= MAX_POSITION => events.push((*at, vec![n])),
                _ => return None,
            }
            continue;
        }
        if let Some(&(_, n)) = EN_ORDINALS.iter().find(|(w, _)| *w == word) {
            events.push((*at, vec![n]));
            continue;
        }
        if let Some(&(_, n)) = RU_ORDINAL_STEMS.iter().find(|(stem, _)| word.starts_with(stem)) {
            events.push((*at, vec![n]));
            continue;
        }
        if ALL_WORDS.contains(&word) {
            all = true;
            continue;
        }
        if FILLER_WORDS.contains(&word) {
            continue;
        }
        return None;
    }

    events.sort_by_key(|(at, _)| *at);
    let mut positions: Vec<u32> = events.into_iter().flat_map(|(_, p)| p).collect();

    if !positions.is_empty() {
        dedup_in_order(&mut positions);
        Some(PositionReference::Positions(positions))
    } else if all {
        Some(PositionReference::All)
    } else {
        None
    }
}

fn push_range(positions: &mut Vec<u32>, lo: &str, hi: &str) {
    if let (Ok(lo), Ok(hi)) = (lo.parse::<u32>(), hi.parse::<u32>()) {
        if lo <= hi && hi <= MAX_POSITION {
            positions.extend(lo..=hi);
        }
    }
}

fn dedup_in_order(positions: &mut Vec<u32>) {
    let mut seen = Vec::new();
    positions.retain(|p| {
        if seen.contains(p) {
            false
        } else {
            seen.push(*p);
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(text: &str) -> Vec<u32> {
        match parse_position_reference(text) {
            Some(PositionReference::Positions(p)) => p,
            other => panic!("expected positions for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_and_marked_numbers() {
        assert_eq!(positions("2"), vec![2]);
        assert_eq!(positions("#3"), vec![3]);
        assert_eq!(positions("№ 1"), vec![1]);
        assert_eq!(positions("позиция 2"), vec![2]);
        assert_eq!(positions("take number 4 please"), vec![4]);
    }

    #[test]
    fn test_lists_and_ranges() {
        assert_eq!(positions("1, 3"), vec![1, 3]);
        assert_eq!(positions("1 и 3"), vec![1, 3]);
        assert_eq!(positions("2-4"), vec![2, 3, 4]);
        assert_eq!(positions("from 2 to 4"), vec![2, 3, 4]);
        assert_eq!(positions("с 3 по 5"), vec![3, 4, 5]);
        assert_eq!(positions("1, 2-3, 2"), vec![1, 2, 3]);
    }

    #[test]
    fn test_mixed_lists_keep_mention_order() {
        // Ranges are parsed first but must not jump ahead of earlier numbers.
        assert_eq!(positions("1, 2-3"), vec![1, 2, 3]);
        assert_eq!(positions("2-3 и 1"), vec![2, 3, 1]);
        assert_eq!(positions("с 2 по 3 и 1"), vec![2, 3, 1]);
        assert_eq!(positions("third, 1-2"), vec![3, 1, 2]);
    }

    #[test]
    fn test_ordinal_words() {
        assert_eq!(positions("the second one"), vec![2]);
        assert_eq!(positions("first and third"), vec![1, 3]);
        assert_eq!(positions("второе"), vec![2]);
        assert_eq!(positions("первое и третье"), vec![1, 3]);
        assert_eq!(positions("пятнадцатое"), vec![15]);
        assert_eq!(positions("двадцатый"), vec![20]);
    }

    #[test]
    fn test_all_phrases() {
        assert_eq!(
            parse_position_reference("all of them"),
            Some(PositionReference::All)
        );
        assert_eq!(parse_position_reference("все"), Some(PositionReference::All));
        // Digits win over an "all" marker.
        assert_eq!(positions("все 2"), vec![2]);
    }

    #[test]
    fn test_free_text_is_not_positional() {
        assert_eq!(parse_position_reference("Мерло"), None);
        // A year-sized number is data, not a position.
        assert_eq!(parse_position_reference("Мерло 2019"), None);
        assert_eq!(parse_position_reference("pinot noir"), None);
        assert_eq!(parse_position_reference(""), None);
        assert_eq!(parse_position_reference("что посоветуешь?"), None);
    }

    #[test]
    fn test_zero_is_positional_but_invalid_later() {
        // The grammar accepts it; the resolver range-checks it.
        assert_eq!(positions("0"), vec![0]);
    }
}
