//! Token model for the view-DDL dialect.
//!
//! Tokens are flat, but commands expose group-aware navigation over them:
//! `(`, `[` and `{` open nested groups, and sibling stepping skips balanced
//! groups, so `cast ( x ) as F` has the sibling chain `cast ( ) as F` with
//! `x` one level down.

use smol_str::SmolStr;

/// Classification of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A dialect keyword (`select`, `as`, `sum`, ...), matched case-insensitively.
    Keyword,
    /// An identifier, possibly a dotted chain (`t.amount`).
    Identifier,
    /// A string, numeric, or enumeration literal.
    Literal,
    /// Punctuation.
    Sign,
    /// A line or block comment.
    Comment,
}

/// One token of source text with its position metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub col: u32,
}

impl Token {
    /// True for everything except comments.
    pub fn is_code(&self) -> bool {
        self.kind != TokenKind::Comment
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    pub fn is_literal(&self) -> bool {
        self.kind == TokenKind::Literal
    }

    pub fn is_any_keyword_token(&self) -> bool {
        self.kind == TokenKind::Keyword
    }

    /// Case-insensitive keyword test.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Case-insensitive test against a keyword set.
    pub fn is_any_keyword(&self, keywords: &[&str]) -> bool {
        self.kind == TokenKind::Keyword
            && keywords.iter().any(|kw| self.text.eq_ignore_ascii_case(kw))
    }

    pub fn text_equals(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn text_equals_any(&self, texts: &[&str]) -> bool {
        texts.iter().any(|t| self.text == *t)
    }

    pub(crate) fn opens_group(&self) -> bool {
        self.kind == TokenKind::Sign && matches!(self.text.as_str(), "(" | "[" | "{")
    }

    pub(crate) fn closes_group(&self) -> bool {
        self.kind == TokenKind::Sign && matches!(self.text.as_str(), ")" | "]" | "}")
    }
}
