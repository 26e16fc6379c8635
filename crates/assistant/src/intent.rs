//! Record intent detection.
//!
//! Messages that attach a like or a note to a wine are handled without the
//! model; everything else goes to the [`crate::Brain`]. Markers are matched
//! in English and Russian on the case-folded text, and the wine reference
//! is the message with marker and filler words stripped out, so "поставь
//! лайк на 2" leaves "2" for the position grammar and "I liked the merlot"
//! leaves "merlot" for text matching.

use once_cell::sync::Lazy;
use records::RecordType;
use regex::Regex;
use sqlgate::fold_case;

/// What a message asks the assistant to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Attach a like or a note to a wine.
    SaveRecord {
        record_type: RecordType,
        /// Note text, when it arrived in the same message.
        content: Option<String>,
        /// What is left of the message to identify the wine.
        reference: Option<String>,
    },
    /// Show the user's own records.
    ListRecords { record_type: Option<RecordType> },
    /// Anything else: ask the model.
    Question,
}

static LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        лайк | нравит | понравил |
        \b(?:i|we)\s+(?:really\s+)?liked?\b |
        \blike\s+(?:it|this|that|the)\b |
        \b(?:put|save|add|leave)\s+a\s+like\b",
    )
    .expect("like intent regex")
});

static NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"заметк|запиши|запомни|\bnote\b").expect("note intent regex"));

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"|«([^»]+)»"#).expect("quoted content regex"));

static LIST_MARKERS: &[(&str, Option<RecordType>)] = &[
    ("my likes", Some(RecordType::Like)),
    ("мои лайки", Some(RecordType::Like)),
    ("my notes", Some(RecordType::Note)),
    ("мои заметки", Some(RecordType::Note)),
    ("my records", None),
    ("мои записи", None),
    ("мои отметки", None),
];

/// Words consumed by the intent itself, matched by prefix on folded words.
const MARKER_STEMS: &[&str] = &[
    "лайк", "нравит", "понравил", "заметк", "запиши", "запомни", "поставь", "сохрани",
    "добавь", "оставь",
];

/// Marker and filler words, matched exactly on folded words. Stripping
/// articles and prepositions here keeps them out of the free-text search.
const MARKER_WORDS: &[&str] = &[
    // en
    "like", "liked", "likes", "note", "notes", "save", "add", "put", "leave", "make",
    "a", "an", "i", "we", "my", "it", "to", "the", "this", "that", "on", "for",
    "really", "please", "wine", "wines",
    // ru
    "мне", "пожалуйста", "на", "к", "ко", "про", "это", "этому", "вино", "вина", "вину",
];

/// Detect the intent of a message.
pub fn detect(text: &str) -> Intent {
    let folded = fold_case(text);

    for (marker, record_type) in LIST_MARKERS {
        if folded.contains(marker) {
            return Intent::ListRecords {
                record_type: *record_type,
            };
        }
    }

    // Note beats like: "запиши заметку — очень понравилось" is a note.
    let record_type = if NOTE_RE.is_match(&folded) {
        RecordType::Note
    } else if LIKE_RE.is_match(&folded) {
        RecordType::Like
    } else {
        return Intent::Question;
    };

    let (head, content) = split_content(text, record_type);
    let reference = strip_markers(&head);

    Intent::SaveRecord {
        record_type,
        content,
        reference,
    }
}

/// Split note text out of the message: everything after the first colon, or
/// a quoted segment. Likes never carry content.
fn split_content(text: &str, record_type: RecordType) -> (String, Option<String>) {
    if record_type != RecordType::Note {
        return (text.to_string(), None);
    }
    if let Some(at) = text.find(':') {
        let content = clean_content(&text[at + 1..]);
        if !content.is_empty() {
            return (text[..at].to_string(), Some(content));
        }
    }
    if let Some(caps) = QUOTED_RE.captures(text) {
        if let (Some(whole), Some(content)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) {
            let head = format!("{} {}", &text[..whole.start()], &text[whole.end()..]);
            return (head, Some(content.as_str().trim().to_string()));
        }
    }
    (text.to_string(), None)
}

fn clean_content(raw: &str) -> String {
    raw.trim()
        .trim_matches(&['"', '«', '»', '\''][..])
        .trim()
        .to_string()
}

/// Remove intent marker words, keeping the rest in original form.
fn strip_markers(text: &str) -> Option<String> {
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter(|word| {
            let folded = fold_case(word.trim_matches(|c: char| !c.is_alphanumeric()));
            if folded.is_empty() {
                return false;
            }
            let is_marker = MARKER_WORDS.contains(&folded.as_str())
                || MARKER_STEMS.iter().any(|stem| folded.starts_with(stem));
            !is_marker
        })
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save(text: &str) -> (RecordType, Option<String>, Option<String>) {
        match detect(text) {
            Intent::SaveRecord {
                record_type,
                content,
                reference,
            } => (record_type, content, reference),
            other => panic!("expected SaveRecord for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_like_markers() {
        let (rt, content, reference) = save("поставь лайк на 2");
        assert_eq!(rt, RecordType::Like);
        assert_eq!(content, None);
        assert_eq!(reference.as_deref(), Some("2"));

        let (rt, _, reference) = save("I really liked the merlot");
        assert_eq!(rt, RecordType::Like);
        assert_eq!(reference.as_deref(), Some("merlot"));

        let (rt, _, reference) = save("мне понравилось второе");
        assert_eq!(rt, RecordType::Like);
        assert_eq!(reference.as_deref(), Some("второе"));
    }

    #[test]
    fn test_like_without_reference() {
        let (rt, content, reference) = save("лайк!");
        assert_eq!(rt, RecordType::Like);
        assert_eq!(content, None);
        assert_eq!(reference, None);
    }

    #[test]
    fn test_note_with_colon_content() {
        let (rt, content, reference) = save("запиши заметку про первое: слишком терпкое");
        assert_eq!(rt, RecordType::Note);
        assert_eq!(content.as_deref(), Some("слишком терпкое"));
        assert_eq!(reference.as_deref(), Some("первое"));
    }

    #[test]
    fn test_note_with_quoted_content() {
        let (rt, content, reference) = save("add a note \"great with steak\" to the pinot");
        assert_eq!(rt, RecordType::Note);
        assert_eq!(content.as_deref(), Some("great with steak"));
        assert_eq!(reference.as_deref(), Some("pinot"));

        let (_, content, _) = save("заметка к мерло: «очень хорош»");
        assert_eq!(content.as_deref(), Some("очень хорош"));
    }

    #[test]
    fn test_note_without_content() {
        let (rt, content, reference) = save("запиши заметку на 3");
        assert_eq!(rt, RecordType::Note);
        assert_eq!(content, None);
        assert_eq!(reference.as_deref(), Some("3"));
    }

    #[test]
    fn test_list_markers() {
        assert_eq!(
            detect("покажи мои лайки"),
            Intent::ListRecords {
                record_type: Some(RecordType::Like)
            }
        );
        assert_eq!(
            detect("show my notes please"),
            Intent::ListRecords {
                record_type: Some(RecordType::Note)
            }
        );
        assert_eq!(
            detect("мои записи"),
            Intent::ListRecords { record_type: None }
        );
    }

    #[test]
    fn test_plain_questions() {
        assert_eq!(detect("какое вино к рыбе?"), Intent::Question);
        assert_eq!(detect("top rated wines from 2020"), Intent::Question);
        // "like" as a comparison word, not an intent.
        assert_eq!(detect("what does merlot taste like?"), Intent::Question);
    }
}
