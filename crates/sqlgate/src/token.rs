//! SQL tokenizer.
//!
//! A deliberately small lexer: it only needs to tell words apart from string
//! literals, quoted identifiers, numbers, comments, and punctuation so the
//! validator can scan keywords without being fooled by `'DROP'` inside a
//! literal or `/* DROP */` inside a comment. Comments are dropped during
//! tokenization; everything else keeps its raw text so a statement can be
//! rebuilt after a rewrite.

/// Classification of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: identifier or keyword.
    Word,
    /// Single-quoted string literal, quotes included.
    StringLiteral,
    /// Quoted identifier: `"..."`, `` `...` `` or `[...]`.
    QuotedIdent,
    /// Numeric literal.
    Number,
    /// Statement terminator `;`.
    Semicolon,
    /// Opening parenthesis.
    LParen,
    /// Closing parenthesis.
    RParen,
    /// Comma.
    Comma,
    /// Any other operator or punctuation character.
    Punct,
}

/// A token with its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Case-insensitive word comparison against an ASCII keyword.
    pub fn is_word(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize SQL text, discarding comments.
///
/// Unterminated strings and block comments are consumed to the end of input
/// rather than rejected; the validator decides what to do with the result.
pub fn tokenize(sql: &str) -> Vec<Token> {
    let chars: Vec<char> = sql.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Line comment: -- to end of line.
        if c == '-' && chars.get(i + 1) == Some(&'-') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        // Block comment: /* ... */ (not nested, per SQLite).
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() {
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    i += 2;
                    break;
                }
                i += 1;
            }
            continue;
        }

        // String literal with '' as the escaped quote.
        if c == '\'' {
            let start = i;
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::StringLiteral, text));
            continue;
        }

        // Quoted identifiers: "..." , `...` , [...]
        if c == '"' || c == '`' || c == '[' {
            let close = match c {
                '[' => ']',
                other => other,
            };
            let start = i;
            i += 1;
            while i < chars.len() {
                if chars[i] == close {
                    // "" and `` escape the closing quote; ] does not.
                    if close != ']' && chars.get(i + 1) == Some(&close) {
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::QuotedIdent, text));
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_')
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::Number, text));
            continue;
        }

        // Blob literal x'...': one token, so rebuilding keeps it intact.
        // Hex content has no quote escaping.
        if (c == 'x' || c == 'X') && chars.get(i + 1) == Some(&'\'') {
            let start = i;
            i += 2;
            while i < chars.len() {
                if chars[i] == '\'' {
                    i += 1;
                    break;
                }
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::StringLiteral, text));
            continue;
        }

        if is_word_start(c) {
            let start = i;
            while i < chars.len() && is_word_continue(chars[i]) {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::Word, text));
            continue;
        }

        let kind = match c {
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            _ => TokenKind::Punct,
        };
        tokens.push(Token::new(kind, c.to_string()));
        i += 1;
    }

    tokens
}

/// Rebuild a statement from tokens, space separated.
///
/// Spacing differs from the input but the statement is semantically the
/// same; literals and quoted identifiers are carried verbatim.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&token.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_select() {
        let tokens = tokenize("SELECT name FROM wines WHERE id = 1;");
        assert!(tokens[0].is_word("select"));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_comments_are_dropped() {
        let tokens = tokenize("SELECT 1 -- DROP TABLE wines\n/* DELETE */ + 2");
        assert!(!tokens.iter().any(|t| t.is_word("drop")));
        assert!(!tokens.iter().any(|t| t.is_word("delete")));
        assert_eq!(tokens.len(), 4); // SELECT 1 + 2
    }

    #[test]
    fn test_string_literal_is_opaque() {
        let tokens = tokenize("SELECT 'DROP TABLE; --' AS x");
        let literal = tokens
            .iter()
            .find(|t| t.kind == TokenKind::StringLiteral)
            .unwrap();
        assert_eq!(literal.text, "'DROP TABLE; --'");
        assert!(!tokens.iter().any(|t| t.is_word("drop")));
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Semicolon));
    }

    #[test]
    fn test_escaped_quote_inside_literal() {
        let tokens = tokenize("SELECT 'it''s; fine'");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text, "'it''s; fine'");
    }

    #[test]
    fn test_blob_literal_is_one_token() {
        let tokens = tokenize("SELECT x'ABCD' AS b");
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].text, "x'ABCD'");
        assert_eq!(render(&tokens), "SELECT x'ABCD' AS b");

        let tokens = tokenize("SELECT X'00ff'");
        assert_eq!(tokens[1].text, "X'00ff'");
    }

    #[test]
    fn test_quoted_identifier() {
        assert_eq!(
            kinds(r#"SELECT "weird name" FROM t"#),
            vec![
                TokenKind::Word,
                TokenKind::QuotedIdent,
                TokenKind::Word,
                TokenKind::Word
            ]
        );
    }

    #[test]
    fn test_cyrillic_word_and_literal() {
        let tokens = tokenize("SELECT * FROM wines WHERE region LIKE '%Крым%'");
        let literal = tokens
            .iter()
            .find(|t| t.kind == TokenKind::StringLiteral)
            .unwrap();
        assert_eq!(literal.text, "'%Крым%'");
    }

    #[test]
    fn test_render_round_trip_keeps_meaning() {
        let tokens = tokenize("SELECT count(*) FROM wines");
        assert_eq!(render(&tokens), "SELECT count ( * ) FROM wines");
    }
}
