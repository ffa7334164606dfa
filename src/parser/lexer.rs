//! Logos-based lexer for the view-DDL dialect.
//!
//! Fast tokenization using the logos crate. Dotted identifier chains
//! (`t.amount`, `abap.dats`) lex as a single token, mirroring how the
//! dialect treats qualified names; a `.` that follows a bracketed filter
//! segment lexes as its own sign token instead.

use logos::Logos;
use smol_str::SmolStr;

use crate::base::dialect;

use super::token::{Token, TokenKind};

/// Raw logos token enum - mapped to [`TokenKind`] after keyword lookup.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"--[^\n]*")]
    LineComment,

    #[regex(r"//[^\n]*")]
    SlashComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    /// Identifier or keyword, possibly a dotted chain.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*")]
    Word,

    #[regex(r"'[^']*'")]
    StringLiteral,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    NumberLiteral,

    /// Enumeration value in an annotation, e.g. `#NOT_REQUIRED`.
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    EnumLiteral,

    /// Any single punctuation character. The analyzer only ever needs
    /// single-character signs, so multi-character operators split here.
    #[regex(r"[(){}\[\],;:.@=<>+\-*/!?%|&^~]")]
    Sign,
}

/// Tokenize a source text into code and comment tokens.
///
/// Whitespace is dropped; every other token carries its 1-based line and
/// column. Characters the lexer cannot classify are emitted as signs so
/// that tokenization is total.
pub fn tokenize(input: &str) -> Vec<Token> {
    let line_starts = line_starts(input);
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(input);

    while let Some(raw) = lexer.next() {
        let text = lexer.slice();
        let span = lexer.span();
        let (line, col) = line_col(&line_starts, span.start);

        let kind = match raw {
            Ok(RawToken::Whitespace) => continue,
            Ok(RawToken::LineComment | RawToken::SlashComment | RawToken::BlockComment) => {
                TokenKind::Comment
            }
            Ok(RawToken::Word) => {
                if dialect::is_keyword(text) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                }
            }
            Ok(RawToken::StringLiteral | RawToken::NumberLiteral | RawToken::EnumLiteral) => {
                TokenKind::Literal
            }
            Ok(RawToken::Sign) => TokenKind::Sign,
            // unrecognized character: keep it as a sign so lexing is total
            Err(()) => TokenKind::Sign,
        };

        tokens.push(Token {
            kind,
            text: SmolStr::new(text),
            line,
            col,
        });
    }

    tokens
}

fn line_starts(input: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in input.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn line_col(line_starts: &[usize], offset: usize) -> (u32, u32) {
    let line = line_starts.partition_point(|&s| s <= offset) - 1;
    let col = offset - line_starts[line];
    (line as u32 + 1, col as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).iter().map(|t| t.text.to_string()).collect()
    }

    #[test]
    fn test_dotted_identifier_is_one_token() {
        assert_eq!(texts("t.amount as Amount"), vec!["t.amount", "as", "Amount"]);
    }

    #[test]
    fn test_keyword_classification() {
        let toks = tokenize("select from zpartner");
        assert_eq!(toks[0].kind, TokenKind::Keyword);
        assert_eq!(toks[1].kind, TokenKind::Keyword);
        assert_eq!(toks[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_literals_and_signs() {
        let toks = tokenize("@Anno.path: 'Value' [0..1] #FLAG");
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Sign,       // @
                TokenKind::Identifier, // Anno.path
                TokenKind::Sign,       // :
                TokenKind::Literal,    // 'Value'
                TokenKind::Sign,       // [
                TokenKind::Literal,    // 0
                TokenKind::Sign,       // .
                TokenKind::Sign,       // .
                TokenKind::Literal,    // 1
                TokenKind::Sign,       // ]
                TokenKind::Literal,    // #FLAG
            ]
        );
    }

    #[test]
    fn test_comments_are_kept() {
        let toks = tokenize("-- header\nkey id");
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[1].text, "key");
        assert_eq!(toks[1].line, 2);
    }

    #[test]
    fn test_line_and_column_metrics() {
        let toks = tokenize("a\n  bb");
        assert_eq!((toks[0].line, toks[0].col), (1, 1));
        assert_eq!((toks[1].line, toks[1].col), (2, 3));
    }
}
