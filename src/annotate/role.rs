//! The semantic role vocabulary.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::diagnostics::DriverError;
use crate::driver_err;

macro_rules! roles {
    ($($variant:ident),* $(,)?) => {
        /// A language-independent tag describing what a node means.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum Role {
            $($variant),*
        }

        impl Role {
            pub const ALL: &'static [Role] = &[$(Role::$variant),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Role::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

roles! {
    // Structure
    File,
    Package,
    Declaration,
    Statement,
    Expression,
    Block,
    Body,
    Scope,
    Incomplete,

    // Names
    Identifier,
    Qualified,
    Name,
    Alias,
    Import,
    Pathname,
    Label,

    // Literals and values
    Literal,
    Primitive,
    Number,
    String,
    Character,
    Value,
    Entry,
    Key,
    List,
    Map,
    Anonymous,

    // Operators
    Operator,
    Binary,
    Unary,
    Left,
    Right,
    Arithmetic,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Bitwise,
    And,
    Or,
    Xor,
    AndNot,
    LeftShift,
    RightShift,
    Boolean,
    Relational,
    Equal,
    Not,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Increment,
    Decrement,
    Negative,
    Positive,
    Dereference,
    TakeAddress,
    Assignment,
    Receive,
    Send,

    // Types
    Type,
    Pointer,
    Array,
    Slice,
    Struct,
    Interface,
    Channel,
    Variadic,

    // Expressions
    Call,
    Callee,
    Argument,
    Positional,
    Index,
    Member,
    Cast,
    Instance,

    // Functions
    Function,
    Receiver,
    Return,
    Variable,
    Constant,

    // Control flow
    If,
    Condition,
    Then,
    Else,
    Switch,
    Case,
    Default,
    Select,
    For,
    Initialization,
    Update,
    Iterator,
    Range,
    Break,
    Continue,
    Goto,
    Fallthrough,
    Defer,
    Async,
    Noop,

    // Comments
    Comment,
    Documentation,
    Annotation,
}

static BY_NAME: Lazy<HashMap<&'static str, Role>> =
    Lazy::new(|| Role::ALL.iter().map(|r| (r.as_str(), *r)).collect());

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BY_NAME
            .get(s)
            .copied()
            .ok_or_else(|| driver_err!(ShapeMismatch, "unknown role {:?}", s))
    }
}
