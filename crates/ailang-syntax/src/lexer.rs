//! Hand-written lexer for the normative source subset (§6.2).
//!
//! Folds `\r\n`/`\r` to `\n` before scanning. BOM passthrough is a
//! documented limitation (§5) -- a leading BOM is lexed as an unexpected
//! character rather than stripped.

use ailang_common::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    // Keywords
    KwLet,
    KwIn,
    KwIf,
    KwThen,
    KwElse,
    KwMatch,
    KwType,
    KwModule,
    KwImport,
    KwExport,
    KwFunc,
    KwTrue,
    KwFalse,
    KwNot,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Arrow,     // ->
    FatArrow,  // =>
    Dot,
    DotDotDot, // ...
    Bang,      // { for effect rows
    Eq,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    AndAnd,
    OrOr,
    Pipe, // | (sum-type alternatives)
    Backslash, // lambda
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer {
    src: Vec<char>,
    pos: usize,
}

fn normalize_newlines(src: &str) -> String {
    src.replace("\r\n", "\n").replace('\r', "\n")
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn byte_offset(&self, char_pos: usize) -> u32 {
        self.src[..char_pos].iter().map(|c| c.len_utf8() as u32).sum()
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, crate::error::ParseError> {
        let mut out = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let start_off = self.byte_offset(start);
            let Some(c) = self.peek() else {
                out.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start_off, start_off),
                });
                break;
            };
            let kind = match c {
                '(' => { self.bump(); TokenKind::LParen }
                ')' => { self.bump(); TokenKind::RParen }
                '{' => { self.bump(); TokenKind::LBrace }
                '}' => { self.bump(); TokenKind::RBrace }
                '[' => { self.bump(); TokenKind::LBracket }
                ']' => { self.bump(); TokenKind::RBracket }
                ',' => { self.bump(); TokenKind::Comma }
                ';' => { self.bump(); TokenKind::Semi }
                ':' => { self.bump(); TokenKind::Colon }
                '\\' => { self.bump(); TokenKind::Backslash }
                '!' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        TokenKind::NotEq
                    } else {
                        TokenKind::Bang
                    }
                }
                '.' => {
                    self.bump();
                    if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                        self.bump();
                        self.bump();
                        TokenKind::DotDotDot
                    } else {
                        TokenKind::Dot
                    }
                }
                '-' => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        TokenKind::Arrow
                    } else {
                        TokenKind::Minus
                    }
                }
                '=' => {
                    self.bump();
                    match self.peek() {
                        Some('>') => { self.bump(); TokenKind::FatArrow }
                        Some('=') => { self.bump(); TokenKind::EqEq }
                        _ => TokenKind::Eq,
                    }
                }
                '<' => {
                    self.bump();
                    if self.peek() == Some('=') { self.bump(); TokenKind::Le } else { TokenKind::Lt }
                }
                '>' => {
                    self.bump();
                    if self.peek() == Some('=') { self.bump(); TokenKind::Ge } else { TokenKind::Gt }
                }
                '+' => {
                    self.bump();
                    if self.peek() == Some('+') { self.bump(); TokenKind::PlusPlus } else { TokenKind::Plus }
                }
                '*' => { self.bump(); TokenKind::Star }
                '/' => { self.bump(); TokenKind::Slash }
                '%' => { self.bump(); TokenKind::Percent }
                '&' => {
                    self.bump();
                    if self.peek() == Some('&') {
                        self.bump();
                        TokenKind::AndAnd
                    } else {
                        return Err(crate::error::ParseError::new(
                            "unexpected character '&'",
                            Span::new(start_off, self.byte_offset(self.pos)),
                        ));
                    }
                }
                '|' => {
                    self.bump();
                    if self.peek() == Some('|') {
                        self.bump();
                        TokenKind::OrOr
                    } else {
                        TokenKind::Pipe
                    }
                }
                '"' => self.lex_string(start_off)?,
                c if c.is_ascii_digit() => self.lex_number(),
                c if c == '_' || c.is_alphabetic() => self.lex_ident_or_keyword(),
                other => {
                    return Err(crate::error::ParseError::new(
                        format!("unexpected character '{other}'"),
                        Span::new(start_off, self.byte_offset(self.pos + 1)),
                    ))
                }
            };
            let end_off = self.byte_offset(self.pos);
            out.push(Token {
                kind,
                span: Span::new(start_off, end_off),
            });
        }
        Ok(out)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text: String = self.src[start..self.pos].iter().collect();
        if is_float {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else {
            TokenKind::Int(text.parse().unwrap_or(0))
        }
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let text: String = self.src[start..self.pos].iter().collect();
        match text.as_str() {
            "let" => TokenKind::KwLet,
            "in" => TokenKind::KwIn,
            "if" => TokenKind::KwIf,
            "then" => TokenKind::KwThen,
            "else" => TokenKind::KwElse,
            "match" => TokenKind::KwMatch,
            "type" => TokenKind::KwType,
            "module" => TokenKind::KwModule,
            "import" => TokenKind::KwImport,
            "export" => TokenKind::KwExport,
            "func" => TokenKind::KwFunc,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            "not" => TokenKind::KwNot,
            _ => TokenKind::Ident(text),
        }
    }

    fn lex_string(&mut self, start_off: u32) -> Result<TokenKind, crate::error::ParseError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(crate::error::ParseError::new(
                        "unterminated string literal",
                        Span::new(start_off, self.byte_offset(self.pos)),
                    ))
                }
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => {
                        return Err(crate::error::ParseError::new(
                            format!("invalid escape sequence: \\{other}"),
                            Span::new(start_off, self.byte_offset(self.pos)),
                        ))
                    }
                    None => {
                        return Err(crate::error::ParseError::new(
                            "unterminated string literal",
                            Span::new(start_off, self.byte_offset(self.pos)),
                        ))
                    }
                },
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::Str(value))
    }
}

pub fn lex(src: &str) -> Result<Vec<Token>, crate::error::ParseError> {
    let normalized = normalize_newlines(src);
    Lexer::new(&normalized).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_arithmetic_expression() {
        let toks = lex("1 + 2 * 3").unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| &t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenKind::Int(1),
                &TokenKind::Plus,
                &TokenKind::Int(2),
                &TokenKind::Star,
                &TokenKind::Int(3),
                &TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_with_escapes() {
        let toks = lex(r#""a\nb""#).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Str("a\nb".to_string()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex(r#""abc"#).unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn line_comment_is_skipped() {
        let toks = lex("1 -- comment\n+ 2").unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| &t.kind).collect();
        assert_eq!(kinds, vec![&TokenKind::Int(1), &TokenKind::Plus, &TokenKind::Int(2), &TokenKind::Eof]);
    }
}
