//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;

/// One request to the model: the user's question plus the catalog schema it
/// may query, and optionally the failure description of a previous attempt.
#[derive(Debug, Clone)]
pub struct BrainRequest<'a> {
    /// The user's message, verbatim.
    pub question: &'a str,
    /// One-line schema summary of the catalog table.
    pub schema: &'a str,
    /// What went wrong with the model's previous SQL, when re-asking.
    pub failure: Option<&'a str>,
}

/// What the model decided to do with a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrainTurn {
    /// A SQL statement to run against the catalog.
    Sql(String),
    /// A direct textual answer.
    Answer(String),
}

/// A trait for turning user questions into answers or catalog queries.
///
/// This trait is object-safe and can be used with `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Answer a question, either with text or with SQL to run.
    async fn reply(&self, request: BrainRequest<'_>) -> Result<BrainTurn, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to answer.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

/// Classify raw model output as SQL or a plain answer.
///
/// SQL is recognized either as a fenced code block whose body starts with
/// `SELECT`/`WITH`, or as a whole reply that starts with one of those
/// keywords. Everything else is an answer.
pub fn classify_reply(text: &str) -> BrainTurn {
    if let Some(sql) = extract_sql(text) {
        BrainTurn::Sql(sql)
    } else {
        BrainTurn::Answer(text.trim().to_string())
    }
}

fn extract_sql(text: &str) -> Option<String> {
    let trimmed = text.trim();

    if let Some(open) = trimmed.find("```") {
        let after = &trimmed[open + 3..];
        let close = after.find("```")?;
        let mut body = after[..close].trim();
        // Drop a language tag right after the fence.
        if let Some(tag) = body.get(..3) {
            let tagged = tag.eq_ignore_ascii_case("sql")
                && body.as_bytes().get(3).is_some_and(|b| b.is_ascii_whitespace());
            if tagged {
                body = body[3..].trim();
            }
        }
        if starts_with_read_keyword(body) {
            return Some(body.to_string());
        }
        return None;
    }

    if starts_with_read_keyword(trimmed) {
        return Some(trimmed.to_string());
    }
    None
}

fn starts_with_read_keyword(text: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or("");
    first.eq_ignore_ascii_case("select") || first.eq_ignore_ascii_case("with")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_select_is_sql() {
        let turn = classify_reply("SELECT * FROM wine_cards_wide LIMIT 5");
        assert_eq!(
            turn,
            BrainTurn::Sql("SELECT * FROM wine_cards_wide LIMIT 5".to_string())
        );
    }

    #[test]
    fn test_fenced_sql_block() {
        let turn = classify_reply("Here you go:\n```sql\nSELECT wine_name\nFROM wines\n```");
        assert_eq!(
            turn,
            BrainTurn::Sql("SELECT wine_name\nFROM wines".to_string())
        );
    }

    #[test]
    fn test_fence_without_language_tag() {
        let turn = classify_reply("```\nWITH t AS (SELECT 1) SELECT * FROM t\n```");
        assert!(matches!(turn, BrainTurn::Sql(sql) if sql.starts_with("WITH")));
    }

    #[test]
    fn test_plain_text_is_answer() {
        let turn = classify_reply("  I can only answer questions about the catalog.  ");
        assert_eq!(
            turn,
            BrainTurn::Answer("I can only answer questions about the catalog.".to_string())
        );
    }

    #[test]
    fn test_fenced_non_sql_is_answer() {
        let turn = classify_reply("```\nnot a query\n```");
        assert!(matches!(turn, BrainTurn::Answer(_)));
    }
}
