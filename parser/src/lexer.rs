/// Single-pass O(n) lexer for jsvm source code.
use crate::ast::Span;
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

fn token(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Token {
    Token {
        kind,
        span,
        lexeme: lexeme.into(),
    }
}

impl<'a> Lexer<'a> {
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
        let mut lexer = Lexer {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        };
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'/') => {
                    if self.peek2() == Some(b'/') {
                        // Line comment
                        self.advance();
                        self.advance();
                        while let Some(ch) = self.peek() {
                            if ch == b'\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else if self.peek2() == Some(b'*') {
                        // Block comment
                        let comment_line = self.line;
                        let comment_col = self.col;
                        self.advance();
                        self.advance();
                        let mut closed = false;
                        loop {
                            match self.peek() {
                                None => break,
                                Some(b'*') if self.peek2() == Some(b'/') => {
                                    self.advance();
                                    self.advance();
                                    closed = true;
                                    break;
                                }
                                _ => {
                                    self.advance();
                                }
                            }
                        }
                        if !closed {
                            return Err(ParseError::new(
                                "unterminated block comment",
                                comment_line,
                                comment_col,
                            ));
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments()?;

        let sp = self.span();

        let Some(ch) = self.peek() else {
            return Ok(token(TokenKind::Eof, sp, ""));
        };

        if ch.is_ascii_digit() || (ch == b'.' && self.peek2().is_some_and(|c| c.is_ascii_digit())) {
            return self.lex_number(sp);
        }

        if ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$' {
            return Ok(self.lex_ident(sp));
        }

        if ch == b'"' || ch == b'\'' {
            return self.lex_string(sp, ch);
        }

        // Multi-character operators
        match ch {
            b'=' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    if self.peek() == Some(b'=') {
                        self.advance();
                        return Ok(token(TokenKind::StrictEq, sp, "==="));
                    }
                    return Ok(token(TokenKind::Eq, sp, "=="));
                }
                return Ok(token(TokenKind::Assign, sp, "="));
            }
            b'!' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    if self.peek() == Some(b'=') {
                        self.advance();
                        return Ok(token(TokenKind::StrictNeq, sp, "!=="));
                    }
                    return Ok(token(TokenKind::Neq, sp, "!="));
                }
                return Ok(token(TokenKind::Not, sp, "!"));
            }
            b'<' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    return Ok(token(TokenKind::Le, sp, "<="));
                }
                return Ok(token(TokenKind::Lt, sp, "<"));
            }
            b'>' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    return Ok(token(TokenKind::Ge, sp, ">="));
                }
                return Ok(token(TokenKind::Gt, sp, ">"));
            }
            b'&' => {
                self.advance();
                if self.peek() == Some(b'&') {
                    self.advance();
                    return Ok(token(TokenKind::And, sp, "&&"));
                }
                return Err(ParseError::new("unexpected character `&`", sp.line, sp.col));
            }
            b'|' => {
                self.advance();
                if self.peek() == Some(b'|') {
                    self.advance();
                    return Ok(token(TokenKind::Or, sp, "||"));
                }
                return Err(ParseError::new("unexpected character `|`", sp.line, sp.col));
            }
            _ => {}
        }

        // Single-character tokens
        self.advance();
        let (kind, lexeme) = match ch {
            b'+' => (TokenKind::Plus, "+"),
            b'-' => (TokenKind::Minus, "-"),
            b'*' => (TokenKind::Star, "*"),
            b'/' => (TokenKind::Slash, "/"),
            b'%' => (TokenKind::Percent, "%"),
            b'(' => (TokenKind::LParen, "("),
            b')' => (TokenKind::RParen, ")"),
            b'{' => (TokenKind::LBrace, "{"),
            b'}' => (TokenKind::RBrace, "}"),
            b',' => (TokenKind::Comma, ","),
            b';' => (TokenKind::Semicolon, ";"),
            _ => {
                return Err(ParseError::new(
                    format!("unexpected character `{}`", ch as char),
                    sp.line,
                    sp.col,
                ));
            }
        };
        Ok(token(kind, sp, lexeme))
    }

    fn consume_digits(&mut self, radix: u32) -> usize {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if (ch as char).is_digit(radix) {
                self.advance();
            } else {
                break;
            }
        }
        self.pos - start
    }

    fn lex_number(&mut self, sp: Span) -> Result<Token, ParseError> {
        let start = self.pos;

        // Hex literal: 0x1F
        if self.peek() == Some(b'0') && matches!(self.peek2(), Some(b'x' | b'X')) {
            self.advance();
            self.advance();
            if self.consume_digits(16) == 0 {
                return Err(ParseError::new("expected hex digits after 0x", sp.line, sp.col));
            }
            let lexeme = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
            return Ok(token(TokenKind::Number, sp, lexeme));
        }

        self.consume_digits(10);
        if self.peek() == Some(b'.') {
            self.advance();
            self.consume_digits(10);
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            if self.consume_digits(10) == 0 {
                return Err(ParseError::new("expected exponent digits", sp.line, sp.col));
            }
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') {
            let bad = self.span();
            return Err(ParseError::new(
                "identifier starts immediately after numeric literal",
                bad.line,
                bad.col,
            ));
        }
        let lexeme = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        Ok(token(TokenKind::Number, sp, lexeme))
    }

    fn lex_ident(&mut self, sp: Span) -> Token {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$' {
                self.advance();
            } else {
                break;
            }
        }
        let lexeme = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        let kind = match lexeme.as_str() {
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "undefined" => TokenKind::Undefined,
            _ => TokenKind::Ident,
        };
        token(kind, sp, lexeme)
    }

    fn lex_string(&mut self, sp: Span, quote: u8) -> Result<Token, ParseError> {
        self.advance(); // consume opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        sp.line,
                        sp.col,
                    ));
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.peek() {
                        Some(esc @ (b'"' | b'\'' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' | b'0')) => {
                            value.push('\\');
                            value.push(esc as char);
                            self.advance();
                        }
                        Some(ch) => {
                            let esc_sp = self.span();
                            return Err(ParseError::new(
                                format!("invalid escape sequence `\\{}`", ch as char),
                                esc_sp.line,
                                esc_sp.col,
                            ));
                        }
                        None => {
                            return Err(ParseError::new(
                                "unterminated string literal",
                                sp.line,
                                sp.col,
                            ));
                        }
                    }
                }
                Some(_) => {
                    // Decode full UTF-8 character (may be multi-byte)
                    let rest = &self.source[self.pos..];
                    let width = utf8_width(rest[0]);
                    match rest.get(..width).and_then(|b| std::str::from_utf8(b).ok()) {
                        Some(s) => {
                            value.push_str(s);
                            for _ in 0..width {
                                self.advance();
                            }
                        }
                        None => {
                            let byte_sp = self.span();
                            return Err(ParseError::new(
                                "invalid UTF-8 in string literal",
                                byte_sp.line,
                                byte_sp.col,
                            ));
                        }
                    }
                }
            }
        }
        Ok(token(TokenKind::StringLit, sp, value))
    }
}

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Process escape sequences in a raw string literal value.
///
/// The lexer stores string contents with escapes unprocessed (e.g., `\n` as
/// literal backslash + `n`). Call this function to convert them to their
/// interpreted values (e.g., real newline character).
pub fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('\\') => result.push('\\'),
                Some('/') => result.push('/'),
                Some('b') => result.push('\u{08}'),
                Some('f') => result.push('\u{0C}'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('0') => result.push('\0'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn simple_tokens() {
        assert_eq!(
            kinds("+ - * / %"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn equality_operators() {
        assert_eq!(
            kinds("= == === != !== !"),
            vec![
                TokenKind::Assign,
                TokenKind::Eq,
                TokenKind::StrictEq,
                TokenKind::Neq,
                TokenKind::StrictNeq,
                TokenKind::Not,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("var let const function return if else while"),
            vec![
                TokenKind::Var,
                TokenKind::Let,
                TokenKind::Const,
                TokenKind::Function,
                TokenKind::Return,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn ident_not_keyword() {
        let tokens = Lexer::tokenize("functional $x _y").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].lexeme, "functional");
        assert_eq!(tokens[1].lexeme, "$x");
        assert_eq!(tokens[2].lexeme, "_y");
    }

    #[test]
    fn number_literals() {
        let tokens = Lexer::tokenize("42 3.5 .5 1e3 2E-2 0xff").unwrap();
        let lexemes: Vec<&str> = tokens[..6].iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["42", "3.5", ".5", "1e3", "2E-2", "0xff"]);
        assert!(tokens[..6].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn number_followed_by_ident_is_error() {
        assert!(Lexer::tokenize("3in").is_err());
    }

    #[test]
    fn string_quotes_and_escapes() {
        let tokens = Lexer::tokenize(r#""hello\nworld" 'it\'s'"#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLit);
        assert_eq!(tokens[0].lexeme, r"hello\nworld");
        assert_eq!(tokens[1].lexeme, r"it\'s");
    }

    #[test]
    fn unterminated_string() {
        assert!(Lexer::tokenize(r#""unterminated"#).is_err());
        assert!(Lexer::tokenize("'broken\nline'").is_err());
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 // comment\n2 /* block */ 3"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
        assert!(Lexer::tokenize("/* open").is_err());
    }

    #[test]
    fn string_utf8_multibyte() {
        let tokens = Lexer::tokenize("\"caf\u{e9} \u{4e16}\u{754c}\"").unwrap();
        assert_eq!(tokens[0].lexeme, "caf\u{e9} \u{4e16}\u{754c}");
    }

    #[test]
    fn spans_track_lines() {
        let tokens = Lexer::tokenize("a\n  b").unwrap();
        assert_eq!(tokens[1].span, Span { line: 2, col: 3 });
    }

    #[test]
    fn unescape_basic() {
        assert_eq!(unescape(r"hello\nworld"), "hello\nworld");
        assert_eq!(unescape(r"tab\there"), "tab\there");
        assert_eq!(unescape(r"back\\slash"), "back\\slash");
        assert_eq!(unescape(r#"say\"hi\""#), "say\"hi\"");
        assert_eq!(unescape(r"it\'s"), "it's");
        assert_eq!(unescape("no escapes"), "no escapes");
    }
}
