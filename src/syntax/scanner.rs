//! Go lexer with automatic semicolon insertion.
//!
//! Comments are returned as [`Token::Comment`] tokens. When a comment ends the line after a token
//! that triggers semicolon insertion, the synthetic semicolon (literal `"\n"`) is returned first
//! and the comment on the following call.

use crate::syntax::token::Token;

/// One scanned token: start offset, kind and literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned {
    pub offset: usize,
    pub tok: Token,
    pub lit: String,
}

pub struct Scanner<'a> {
    src: &'a str,
    offset: usize,
    insert_semi: bool,
    errors: Vec<(usize, String)>,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            insert_semi: false,
            errors: Vec::new(),
        }
    }

    /// Errors found since the last call, as `(offset, message)`.
    pub fn take_errors(&mut self) -> Vec<(usize, String)> {
        std::mem::take(&mut self.errors)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.offset + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek_at(0) == Some(byte) {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    fn error(&mut self, offset: usize, message: impl Into<String>) {
        self.errors.push((offset, message.into()));
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_at(0) {
            match b {
                b' ' | b'\t' | b'\r' => self.offset += 1,
                b'\n' if !self.insert_semi => self.offset += 1,
                _ => break,
            }
        }
    }

    pub fn scan(&mut self) -> Scanned {
        self.skip_whitespace();
        let start = self.offset;
        let Some(ch) = self.peek() else {
            if self.insert_semi {
                self.insert_semi = false;
                return self.token(start, Token::Semicolon, "\n");
            }
            return self.token(start, Token::Eof, "");
        };

        let mut insert_semi = false;
        let tok = if is_letter(ch) {
            while self.peek().map_or(false, |c| is_letter(c) || c.is_ascii_digit()) {
                self.bump();
            }
            let word = &self.src[start..self.offset];
            let tok = Token::keyword(word).unwrap_or(Token::Ident);
            insert_semi = matches!(
                tok,
                Token::Ident | Token::Break | Token::Continue | Token::Fallthrough | Token::Return
            );
            tok
        } else if ch.is_ascii_digit()
            || (ch == '.' && self.peek_at(1).map_or(false, |b| b.is_ascii_digit()))
        {
            insert_semi = true;
            self.scan_number()
        } else {
            self.bump();
            match ch {
                '\n' => {
                    self.insert_semi = false;
                    return self.token(start, Token::Semicolon, "\n");
                }
                '"' => {
                    insert_semi = true;
                    self.scan_string(start);
                    Token::String
                }
                '`' => {
                    insert_semi = true;
                    self.scan_raw_string(start);
                    Token::String
                }
                '\'' => {
                    insert_semi = true;
                    self.scan_rune(start);
                    Token::Char
                }
                '/' if matches!(self.peek_at(0), Some(b'/') | Some(b'*')) => {
                    if self.insert_semi && self.comment_ends_line(start) {
                        self.offset = start;
                        self.insert_semi = false;
                        return self.token(start, Token::Semicolon, "\n");
                    }
                    self.scan_comment(start);
                    Token::Comment
                }
                '/' => self.select(b'=', Token::QuoAssign, Token::Quo),
                '+' => {
                    if self.eat(b'+') {
                        insert_semi = true;
                        Token::Inc
                    } else {
                        self.select(b'=', Token::AddAssign, Token::Add)
                    }
                }
                '-' => {
                    if self.eat(b'-') {
                        insert_semi = true;
                        Token::Dec
                    } else {
                        self.select(b'=', Token::SubAssign, Token::Sub)
                    }
                }
                '*' => self.select(b'=', Token::MulAssign, Token::Mul),
                '%' => self.select(b'=', Token::RemAssign, Token::Rem),
                '^' => self.select(b'=', Token::XorAssign, Token::Xor),
                '<' => {
                    if self.eat(b'-') {
                        Token::Arrow
                    } else if self.eat(b'<') {
                        self.select(b'=', Token::ShlAssign, Token::Shl)
                    } else {
                        self.select(b'=', Token::Leq, Token::Lss)
                    }
                }
                '>' => {
                    if self.eat(b'>') {
                        self.select(b'=', Token::ShrAssign, Token::Shr)
                    } else {
                        self.select(b'=', Token::Geq, Token::Gtr)
                    }
                }
                '=' => self.select(b'=', Token::Eql, Token::Assign),
                '!' => self.select(b'=', Token::Neq, Token::Not),
                '&' => {
                    if self.eat(b'^') {
                        self.select(b'=', Token::AndNotAssign, Token::AndNot)
                    } else if self.eat(b'&') {
                        Token::LAnd
                    } else {
                        self.select(b'=', Token::AndAssign, Token::And)
                    }
                }
                '|' => {
                    if self.eat(b'|') {
                        Token::LOr
                    } else {
                        self.select(b'=', Token::OrAssign, Token::Or)
                    }
                }
                ':' => self.select(b'=', Token::Define, Token::Colon),
                '.' => {
                    if self.peek_at(0) == Some(b'.') && self.peek_at(1) == Some(b'.') {
                        self.offset += 2;
                        Token::Ellipsis
                    } else {
                        Token::Period
                    }
                }
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '(' => Token::LParen,
                '[' => Token::LBrack,
                '{' => Token::LBrace,
                ')' => {
                    insert_semi = true;
                    Token::RParen
                }
                ']' => {
                    insert_semi = true;
                    Token::RBrack
                }
                '}' => {
                    insert_semi = true;
                    Token::RBrace
                }
                other => {
                    self.error(start, format!("invalid character {other:?}"));
                    insert_semi = self.insert_semi;
                    Token::Illegal
                }
            }
        };
        self.insert_semi = insert_semi;
        let lit = &self.src[start..self.offset];
        self.token(start, tok, lit)
    }

    fn token(&self, offset: usize, tok: Token, lit: &str) -> Scanned {
        Scanned {
            offset,
            tok,
            lit: lit.to_string(),
        }
    }

    fn select(&mut self, next: u8, matched: Token, otherwise: Token) -> Token {
        if self.eat(next) {
            matched
        } else {
            otherwise
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.offset;
        let mut tok = Token::Int;
        let mut base = 10;
        let mut prefixed = false;
        if self.peek_at(0) == Some(b'0') {
            base = match self.peek_at(1) {
                Some(b'x' | b'X') => 16,
                Some(b'o' | b'O') => 8,
                Some(b'b' | b'B') => 2,
                _ => 10,
            };
            if base != 10 {
                prefixed = true;
                self.offset += 2;
            }
        }

        let mut invalid = None;
        let mut count = self.digits(base, &mut invalid);
        if self.peek_at(0) == Some(b'.') {
            tok = Token::Float;
            if prefixed && base != 16 {
                let message = format!("invalid radix point in {} literal", radix_name(base));
                self.error(self.offset, message);
            }
            self.offset += 1;
            count += self.digits(base, &mut invalid);
        }
        if count == 0 {
            self.error(start, format!("{} literal has no digits", radix_name(base)));
        }

        let exponent: &[u8] = match base {
            16 => b"pP",
            10 => b"eE",
            _ => b"",
        };
        if self.peek_at(0).map_or(false, |b| exponent.contains(&b)) {
            tok = Token::Float;
            self.offset += 1;
            if matches!(self.peek_at(0), Some(b'+' | b'-')) {
                self.offset += 1;
            }
            if self.digits(10, &mut None) == 0 {
                self.error(start, "exponent has no digits");
            }
        } else if base == 16 && tok == Token::Float {
            self.error(start, "hexadecimal mantissa requires a 'p' exponent");
        }

        let tok = self.imaginary(tok);
        if tok == Token::Int && !prefixed && base == 10 {
            let text = &self.src[start..self.offset];
            if text.len() > 1 && text.starts_with('0') {
                base = 8;
                invalid = text
                    .char_indices()
                    .find(|(_, c)| matches!(c, '8' | '9'))
                    .map(|(i, c)| (start + i, c));
            }
        }
        if let Some((at, ch)) = invalid {
            if tok != Token::Imag || prefixed {
                let message = format!("invalid digit {ch:?} in {} literal", radix_name(base));
                self.error(at, message);
            }
        }
        tok
    }

    /// Scans digits and `_` separators, returning the number of digits. The first digit that is
    /// out of range for `base` is recorded in `invalid`.
    fn digits(&mut self, base: u32, invalid: &mut Option<(usize, char)>) -> usize {
        let mut count = 0;
        while let Some(b) = self.peek_at(0) {
            if b == b'_' {
                self.offset += 1;
                continue;
            }
            let ch = b as char;
            let accepted = if base == 16 {
                ch.is_ascii_hexdigit()
            } else {
                ch.is_ascii_digit()
            };
            if !accepted {
                break;
            }
            if invalid.is_none() && ch.to_digit(16).map_or(false, |d| d >= base) {
                *invalid = Some((self.offset, ch));
            }
            count += 1;
            self.offset += 1;
        }
        count
    }

    fn imaginary(&mut self, tok: Token) -> Token {
        if self.eat(b'i') {
            Token::Imag
        } else {
            tok
        }
    }

    fn scan_escape(&mut self) {
        // The backslash is already consumed.
        match self.bump() {
            Some('x') => self.skip_hex(2),
            Some('u') => self.skip_hex(4),
            Some('U') => self.skip_hex(8),
            Some('0'..='7') => {
                for _ in 0..2 {
                    if matches!(self.peek_at(0), Some(b'0'..=b'7')) {
                        self.offset += 1;
                    }
                }
            }
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '\'' | '"') => {}
            Some(other) => {
                let at = self.offset - other.len_utf8() - 1;
                self.error(at, "unknown escape sequence");
            }
            None => {}
        }
    }

    fn skip_hex(&mut self, n: usize) {
        for _ in 0..n {
            if self.peek_at(0).map_or(false, |b| b.is_ascii_hexdigit()) {
                self.offset += 1;
            } else {
                let at = self.offset;
                self.error(at, "illegal character in escape sequence");
                return;
            }
        }
    }

    fn scan_string(&mut self, start: usize) {
        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.error(start, "string literal not terminated");
                    return;
                }
                Some('"') => {
                    self.bump();
                    return;
                }
                Some('\\') => {
                    self.bump();
                    self.scan_escape();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn scan_raw_string(&mut self, start: usize) {
        loop {
            match self.bump() {
                None => {
                    self.error(start, "raw string literal not terminated");
                    return;
                }
                Some('`') => return,
                Some(_) => {}
            }
        }
    }

    fn scan_rune(&mut self, start: usize) {
        let mut count = 0;
        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.error(start, "rune literal not terminated");
                    return;
                }
                Some('\'') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    self.scan_escape();
                    count += 1;
                }
                Some(_) => {
                    self.bump();
                    count += 1;
                }
            }
        }
        if count != 1 {
            self.error(start, "illegal rune literal");
        }
    }

    fn scan_comment(&mut self, start: usize) {
        // The first '/' is consumed.
        if self.eat(b'/') {
            while self.peek_at(0).map_or(false, |b| b != b'\n') {
                self.offset += 1;
            }
            return;
        }
        self.offset += 1;
        match self.src[self.offset..].find("*/") {
            Some(i) => self.offset += i + 2,
            None => {
                self.offset = self.src.len();
                self.error(start, "comment not terminated");
            }
        }
    }

    /// Whether the comments starting at `from` run to the end of the line.
    fn comment_ends_line(&self, from: usize) -> bool {
        let bytes = self.src.as_bytes();
        let mut i = from;
        loop {
            if bytes.get(i) != Some(&b'/') {
                return false;
            }
            match bytes.get(i + 1) {
                Some(b'/') => return true,
                Some(b'*') => {
                    let Some(close) = self.src[i + 2..].find("*/") else {
                        return true;
                    };
                    if self.src[i + 2..i + 2 + close].contains('\n') {
                        return true;
                    }
                    i += close + 4;
                    while matches!(bytes.get(i), Some(b' ' | b'\t' | b'\r')) {
                        i += 1;
                    }
                    match bytes.get(i) {
                        None | Some(b'\n') => return true,
                        Some(b'/') => continue,
                        Some(_) => return false,
                    }
                }
                _ => return false,
            }
        }
    }
}

fn radix_name(base: u32) -> &'static str {
    match base {
        16 => "hexadecimal",
        8 => "octal",
        2 => "binary",
        _ => "decimal",
    }
}

fn is_letter(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}
