//! Statement validation for model-proposed SQL.
//!
//! The gate accepts a statement only when it is a single `SELECT`/`WITH`
//! statement containing none of the deny-listed keywords, and rewrites the
//! token stream so an enforced row limit is always present. All scanning
//! happens on the token stream from [`crate::token`], after comments have
//! been discarded and with string literals kept opaque.

use serde::Serialize;
use thiserror::Error;

use crate::token::{render, tokenize, Token, TokenKind};

/// Keywords that must never appear in a gated statement: data definition,
/// data modification, and engine configuration.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "attach", "detach", "pragma",
    "vacuum", "reindex", "analyze", "replace", "truncate",
];

/// Why the gate rejected a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// No tokens left after stripping comments and whitespace.
    #[error("empty SQL statement")]
    Empty,

    /// The statement does not start with SELECT or WITH.
    #[error("only SELECT/WITH statements are allowed")]
    NotReadStatement,

    /// More than one statement was supplied.
    #[error("only a single SQL statement is allowed")]
    MultipleStatements,

    /// A deny-listed keyword appeared outside literals and comments.
    #[error("forbidden SQL keyword: {keyword}")]
    ForbiddenKeyword { keyword: String },
}

/// A statement that passed the gate, carrying the row limit it was pinned to.
///
/// Immutable once produced; the executor runs exactly this text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStatement {
    sql: String,
    limit: u32,
}

impl ValidatedStatement {
    /// The rewritten statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The row limit in force for this statement.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Validate model-proposed SQL and pin a row limit on it.
///
/// `ceiling` is the maximum row count any statement may request; a missing
/// `LIMIT` clause is appended, a larger one is clamped, a smaller one is
/// kept as-is.
pub fn validate(sql: &str, ceiling: u32) -> Result<ValidatedStatement, ValidationError> {
    let ceiling = ceiling.max(1);
    let mut tokens = tokenize(sql);

    // At most one trailing terminator is tolerated.
    if tokens.last().map(|t| t.kind) == Some(TokenKind::Semicolon) {
        tokens.pop();
    }

    if tokens.is_empty() {
        return Err(ValidationError::Empty);
    }

    if tokens.iter().any(|t| t.kind == TokenKind::Semicolon) {
        return Err(ValidationError::MultipleStatements);
    }

    let first = &tokens[0];
    if !(first.is_word("select") || first.is_word("with")) {
        return Err(ValidationError::NotReadStatement);
    }

    for token in &tokens {
        if token.kind != TokenKind::Word {
            continue;
        }
        for keyword in FORBIDDEN_KEYWORDS {
            if token.text.eq_ignore_ascii_case(keyword) {
                return Err(ValidationError::ForbiddenKeyword {
                    keyword: (*keyword).to_string(),
                });
            }
        }
    }

    let sql = enforce_limit(tokens, ceiling);
    Ok(ValidatedStatement {
        sql,
        limit: ceiling,
    })
}

/// Find the last top-level LIMIT clause and clamp or append the row count.
///
/// Handles `LIMIT n`, `LIMIT n OFFSET m` and the comma form
/// `LIMIT offset, n`. A LIMIT whose operand is not an integer literal
/// cannot be inspected, so the whole statement is wrapped in a bounded
/// outer select instead.
fn enforce_limit(mut tokens: Vec<Token>, ceiling: u32) -> String {
    let mut depth: i32 = 0;
    let mut limit_at: Option<usize> = None;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth -= 1,
            TokenKind::Word if depth == 0 && token.is_word("limit") => limit_at = Some(i),
            _ => {}
        }
    }

    let Some(at) = limit_at else {
        tokens.push(Token {
            kind: TokenKind::Word,
            text: "LIMIT".to_string(),
        });
        tokens.push(Token {
            kind: TokenKind::Number,
            text: ceiling.to_string(),
        });
        return render(&tokens);
    };

    // Locate the token holding the row count.
    let count_at = match tokens.get(at + 1) {
        Some(t) if t.kind == TokenKind::Number => {
            if tokens.get(at + 2).map(|t| t.kind) == Some(TokenKind::Comma) {
                // LIMIT offset, count
                match tokens.get(at + 3) {
                    Some(t) if t.kind == TokenKind::Number => at + 3,
                    _ => return wrap_bounded(&tokens, ceiling),
                }
            } else {
                at + 1
            }
        }
        _ => return wrap_bounded(&tokens, ceiling),
    };

    match tokens[count_at].text.parse::<u64>() {
        Ok(value) if value > u64::from(ceiling) => {
            tokens[count_at].text = ceiling.to_string();
        }
        Ok(_) => {}
        Err(_) => return wrap_bounded(&tokens, ceiling),
    }

    render(&tokens)
}

/// Always-safe envelope for LIMIT shapes the clamp cannot inspect.
fn wrap_bounded(tokens: &[Token], ceiling: u32) -> String {
    format!("SELECT * FROM ( {} ) LIMIT {}", render(tokens), ceiling)
}
