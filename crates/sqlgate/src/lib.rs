//! Read-only SQL gate for model-generated queries.
//!
//! The language model is an untrusted text source: everything it proposes is
//! tokenized and inspected here before a connection ever sees it. The gate
//! has two halves:
//!
//! - [`validator`] — accepts only a single `SELECT`/`WITH` statement with no
//!   data-definition or data-modification keywords, and pins a row limit on
//!   the statement.
//! - [`collation`] — normalizes case-insensitive pattern operators and
//!   provides the Unicode case-folded `LIKE` comparison the executor
//!   installs on every catalog connection.
//!
//! Keyword scanning runs on a token stream with comments discarded and
//! string literals kept opaque, so nothing can be smuggled inside either.

pub mod collation;
pub mod token;
pub mod validator;

pub use collation::{fold_case, like_match, rewrite_pattern_operators};
pub use token::{tokenize, Token, TokenKind};
pub use validator::{validate, ValidatedStatement, ValidationError};
