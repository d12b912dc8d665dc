//! Go lexical tokens, source positions and the offset-to-line index.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

// ============================================================================
// POSITIONS
// ============================================================================

/// A compact source position: the byte offset plus one. Zero means "no position".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    /// Position of a byte offset; offsets beyond the representable range give [`Pos::NONE`].
    pub fn from_offset(offset: usize) -> Self {
        Pos::try_from_offset(offset).unwrap_or(Pos::NONE)
    }

    pub fn try_from_offset(offset: usize) -> Option<Self> {
        u32::try_from(offset).ok()?.checked_add(1).map(Pos)
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Byte offset into the file, or `None` for an invalid position.
    pub fn offset(self) -> Option<usize> {
        self.is_valid().then(|| self.0 as usize - 1)
    }

    /// Advances a valid position by `n` bytes; invalid positions stay invalid, and so does an
    /// advance past the representable range.
    pub fn add(self, n: usize) -> Pos {
        if !self.is_valid() {
            return self;
        }
        u32::try_from(n)
            .ok()
            .and_then(|n| self.0.checked_add(n))
            .map_or(Pos::NONE, Pos)
    }
}

/// Line start table for one source file. Lines and columns are 1-based; columns count bytes.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            starts,
            len: source.len(),
        }
    }

    /// Line and column of a byte offset. Offsets past the end clamp to the end of the file.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }

    pub fn line(&self, offset: usize) -> usize {
        self.line_col(offset).0
    }
}

// ============================================================================
// CHANNEL DIRECTION
// ============================================================================

/// Direction bits of a channel type. Bidirectional channels carry both bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChanDir(pub u8);

impl ChanDir {
    pub const SEND: ChanDir = ChanDir(1);
    pub const RECV: ChanDir = ChanDir(2);
    pub const BOTH: ChanDir = ChanDir(3);
}

// ============================================================================
// TOKENS
// ============================================================================

macro_rules! tokens {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// The lexical token kinds of Go.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum Token {
            #[default]
            $($variant),*
        }

        impl Token {
            pub const ALL: &'static [Token] = &[$(Token::$variant),*];

            /// Canonical text: the operator symbol, the keyword, or the upper-case class name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Token::$variant => $text),*
                }
            }
        }
    };
}

tokens! {
    Illegal => "ILLEGAL",
    Eof => "EOF",
    Comment => "COMMENT",

    Ident => "IDENT",
    Int => "INT",
    Float => "FLOAT",
    Imag => "IMAG",
    Char => "CHAR",
    String => "STRING",

    Add => "+",
    Sub => "-",
    Mul => "*",
    Quo => "/",
    Rem => "%",
    And => "&",
    Or => "|",
    Xor => "^",
    Shl => "<<",
    Shr => ">>",
    AndNot => "&^",

    AddAssign => "+=",
    SubAssign => "-=",
    MulAssign => "*=",
    QuoAssign => "/=",
    RemAssign => "%=",
    AndAssign => "&=",
    OrAssign => "|=",
    XorAssign => "^=",
    ShlAssign => "<<=",
    ShrAssign => ">>=",
    AndNotAssign => "&^=",

    LAnd => "&&",
    LOr => "||",
    Arrow => "<-",
    Inc => "++",
    Dec => "--",

    Eql => "==",
    Lss => "<",
    Gtr => ">",
    Assign => "=",
    Not => "!",

    Neq => "!=",
    Leq => "<=",
    Geq => ">=",
    Define => ":=",
    Ellipsis => "...",

    LParen => "(",
    LBrack => "[",
    LBrace => "{",
    Comma => ",",
    Period => ".",

    RParen => ")",
    RBrack => "]",
    RBrace => "}",
    Semicolon => ";",
    Colon => ":",

    Break => "break",
    Case => "case",
    Chan => "chan",
    Const => "const",
    Continue => "continue",

    Default => "default",
    Defer => "defer",
    Else => "else",
    Fallthrough => "fallthrough",
    For => "for",

    Func => "func",
    Go => "go",
    Goto => "goto",
    If => "if",
    Import => "import",

    Interface => "interface",
    Map => "map",
    Package => "package",
    Range => "range",
    Return => "return",

    Select => "select",
    Struct => "struct",
    Switch => "switch",
    Type => "type",
    Var => "var",
}

static BY_TEXT: Lazy<HashMap<&'static str, Token>> =
    Lazy::new(|| Token::ALL.iter().map(|t| (t.as_str(), *t)).collect());

impl Token {
    /// Resolves canonical token text back to its kind.
    pub fn lookup(text: &str) -> Option<Token> {
        BY_TEXT.get(text).copied()
    }

    /// Resolves an identifier-shaped word to its keyword, if it is one.
    pub fn keyword(word: &str) -> Option<Token> {
        Token::lookup(word).filter(|t| t.is_keyword())
    }

    pub fn is_keyword(self) -> bool {
        (self as u8) >= (Token::Break as u8)
    }

    pub fn is_literal(self) -> bool {
        (Token::Ident as u8..=Token::String as u8).contains(&(self as u8))
    }

    /// Binary operator precedence; 0 for tokens that are not binary operators.
    pub fn precedence(self) -> u8 {
        match self {
            Token::LOr => 1,
            Token::LAnd => 2,
            Token::Eql | Token::Neq | Token::Lss | Token::Leq | Token::Gtr | Token::Geq => 3,
            Token::Add | Token::Sub | Token::Or | Token::Xor => 4,
            Token::Mul
            | Token::Quo
            | Token::Rem
            | Token::Shl
            | Token::Shr
            | Token::And
            | Token::AndNot => 5,
            _ => 0,
        }
    }

    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::Define
                | Token::AddAssign
                | Token::SubAssign
                | Token::MulAssign
                | Token::QuoAssign
                | Token::RemAssign
                | Token::AndAssign
                | Token::OrAssign
                | Token::XorAssign
                | Token::ShlAssign
                | Token::ShrAssign
                | Token::AndNotAssign
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_covers_every_token() {
        for token in Token::ALL {
            assert_eq!(Token::lookup(token.as_str()), Some(*token));
        }
        assert_eq!(Token::lookup("<<="), Some(Token::ShlAssign));
        assert_eq!(Token::lookup("nope"), None);
    }

    #[test]
    fn test_keyword_classification() {
        assert_eq!(Token::keyword("func"), Some(Token::Func));
        assert_eq!(Token::keyword("main"), None);
        assert_eq!(Token::keyword("STRING"), None);
        assert!(Token::String.is_literal());
        assert!(!Token::Add.is_literal());
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("package main\n\nfunc f() {}\n");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(12), (1, 13));
        assert_eq!(index.line_col(13), (2, 1));
        assert_eq!(index.line_col(14), (3, 1));
        assert_eq!(index.line_col(19), (3, 6));
    }

    #[test]
    fn test_pos_arithmetic() {
        let pos = Pos::from_offset(8);
        assert_eq!(pos.offset(), Some(8));
        assert_eq!(pos.add(4).offset(), Some(12));
        assert!(!Pos::NONE.add(3).is_valid());
    }

    #[test]
    fn test_pos_range_limits() {
        assert_eq!(Pos::try_from_offset(u32::MAX as usize), None);
        assert_eq!(Pos::try_from_offset(7), Some(Pos::from_offset(7)));
        assert!(!Pos::from_offset(u32::MAX as usize).is_valid());
        let last = Pos::from_offset(u32::MAX as usize - 1);
        assert!(last.is_valid());
        assert!(!last.add(1).is_valid());
        assert!(!Pos::from_offset(0).add(usize::MAX).is_valid());
    }
}
