//! Token kinds of Go source text
//!
//! This enum defines every token the lexer can produce. Trivia (comments)
//! is kept separately from significant tokens so the parser can attach it to
//! the nodes it belongs to.

/// All token kinds of Go source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    LINE_COMMENT = 0,   // // ...
    BLOCK_COMMENT,      // /* ... */

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,              // identifier
    INT,                // 42, 0x2a, 0b101, 0o52
    FLOAT,              // 3.14, 1e9, 0x1p-2
    IMAG,               // 2i
    CHAR,               // 'a'
    STRING,             // "hello" or `raw`

    // =========================================================================
    // OPERATORS AND PUNCTUATION
    // =========================================================================
    PLUS,               // +
    MINUS,              // -
    STAR,               // *
    SLASH,              // /
    PERCENT,            // %
    AMP,                // &
    PIPE,               // |
    CARET,              // ^
    SHL,                // <<
    SHR,                // >>
    AMP_CARET,          // &^
    PLUS_EQ,            // +=
    MINUS_EQ,           // -=
    STAR_EQ,            // *=
    SLASH_EQ,           // /=
    PERCENT_EQ,         // %=
    AMP_EQ,             // &=
    PIPE_EQ,            // |=
    CARET_EQ,           // ^=
    SHL_EQ,             // <<=
    SHR_EQ,             // >>=
    AMP_CARET_EQ,       // &^=
    AMP_AMP,            // &&
    PIPE_PIPE,          // ||
    ARROW,              // <-
    PLUS_PLUS,          // ++
    MINUS_MINUS,        // --
    EQ_EQ,              // ==
    LT,                 // <
    GT,                 // >
    EQ,                 // =
    BANG,               // !
    TILDE,              // ~
    BANG_EQ,            // !=
    LT_EQ,              // <=
    GT_EQ,              // >=
    COLON_EQ,           // :=
    ELLIPSIS,           // ...
    L_PAREN,            // (
    L_BRACKET,          // [
    L_BRACE,            // {
    COMMA,              // ,
    DOT,                // .
    R_PAREN,            // )
    R_BRACKET,          // ]
    R_BRACE,            // }
    SEMICOLON,          // ; written or inserted at a line end
    COLON,              // :

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    BREAK_KW,
    CASE_KW,
    CHAN_KW,
    CONST_KW,
    CONTINUE_KW,
    DEFAULT_KW,
    DEFER_KW,
    ELSE_KW,
    FALLTHROUGH_KW,
    FOR_KW,
    FUNC_KW,
    GO_KW,
    GOTO_KW,
    IF_KW,
    IMPORT_KW,
    INTERFACE_KW,
    MAP_KW,
    PACKAGE_KW,
    RANGE_KW,
    RETURN_KW,
    SELECT_KW,
    STRUCT_KW,
    SWITCH_KW,
    TYPE_KW,
    VAR_KW,

    // =========================================================================
    // SPECIAL
    // =========================================================================
    ERROR,
    EOF,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::LINE_COMMENT | Self::BLOCK_COMMENT)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::INT | Self::FLOAT | Self::IMAG | Self::CHAR | Self::STRING
        )
    }

    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::BREAK_KW as u16) && (self as u16) <= (Self::VAR_KW as u16)
    }

    /// A line ending after this token ends the statement
    pub fn ends_statement(self) -> bool {
        self == Self::IDENT
            || self.is_literal()
            || matches!(
                self,
                Self::BREAK_KW
                    | Self::CONTINUE_KW
                    | Self::FALLTHROUGH_KW
                    | Self::RETURN_KW
                    | Self::PLUS_PLUS
                    | Self::MINUS_MINUS
                    | Self::R_PAREN
                    | Self::R_BRACKET
                    | Self::R_BRACE
            )
    }

    /// Binding power of a binary operator, 0 when the token is not one
    pub fn binary_precedence(self) -> u8 {
        match self {
            Self::PIPE_PIPE => 1,
            Self::AMP_AMP => 2,
            Self::EQ_EQ | Self::BANG_EQ | Self::LT | Self::LT_EQ | Self::GT | Self::GT_EQ => 3,
            Self::PLUS | Self::MINUS | Self::PIPE | Self::CARET => 4,
            Self::STAR
            | Self::SLASH
            | Self::PERCENT
            | Self::SHL
            | Self::SHR
            | Self::AMP
            | Self::AMP_CARET => 5,
            _ => 0,
        }
    }

    /// Assignment operators: `=` and every compound form
    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            Self::EQ
                | Self::PLUS_EQ
                | Self::MINUS_EQ
                | Self::STAR_EQ
                | Self::SLASH_EQ
                | Self::PERCENT_EQ
                | Self::AMP_EQ
                | Self::PIPE_EQ
                | Self::CARET_EQ
                | Self::SHL_EQ
                | Self::SHR_EQ
                | Self::AMP_CARET_EQ
        )
    }

    /// Source spelling of operators, punctuation and keywords
    pub fn text(self) -> &'static str {
        match self {
            Self::PLUS => "+",
            Self::MINUS => "-",
            Self::STAR => "*",
            Self::SLASH => "/",
            Self::PERCENT => "%",
            Self::AMP => "&",
            Self::PIPE => "|",
            Self::CARET => "^",
            Self::SHL => "<<",
            Self::SHR => ">>",
            Self::AMP_CARET => "&^",
            Self::PLUS_EQ => "+=",
            Self::MINUS_EQ => "-=",
            Self::STAR_EQ => "*=",
            Self::SLASH_EQ => "/=",
            Self::PERCENT_EQ => "%=",
            Self::AMP_EQ => "&=",
            Self::PIPE_EQ => "|=",
            Self::CARET_EQ => "^=",
            Self::SHL_EQ => "<<=",
            Self::SHR_EQ => ">>=",
            Self::AMP_CARET_EQ => "&^=",
            Self::AMP_AMP => "&&",
            Self::PIPE_PIPE => "||",
            Self::ARROW => "<-",
            Self::PLUS_PLUS => "++",
            Self::MINUS_MINUS => "--",
            Self::EQ_EQ => "==",
            Self::LT => "<",
            Self::GT => ">",
            Self::EQ => "=",
            Self::BANG => "!",
            Self::TILDE => "~",
            Self::BANG_EQ => "!=",
            Self::LT_EQ => "<=",
            Self::GT_EQ => ">=",
            Self::COLON_EQ => ":=",
            Self::ELLIPSIS => "...",
            Self::L_PAREN => "(",
            Self::L_BRACKET => "[",
            Self::L_BRACE => "{",
            Self::COMMA => ",",
            Self::DOT => ".",
            Self::R_PAREN => ")",
            Self::R_BRACKET => "]",
            Self::R_BRACE => "}",
            Self::SEMICOLON => ";",
            Self::COLON => ":",
            Self::BREAK_KW => "break",
            Self::CASE_KW => "case",
            Self::CHAN_KW => "chan",
            Self::CONST_KW => "const",
            Self::CONTINUE_KW => "continue",
            Self::DEFAULT_KW => "default",
            Self::DEFER_KW => "defer",
            Self::ELSE_KW => "else",
            Self::FALLTHROUGH_KW => "fallthrough",
            Self::FOR_KW => "for",
            Self::FUNC_KW => "func",
            Self::GO_KW => "go",
            Self::GOTO_KW => "goto",
            Self::IF_KW => "if",
            Self::IMPORT_KW => "import",
            Self::INTERFACE_KW => "interface",
            Self::MAP_KW => "map",
            Self::PACKAGE_KW => "package",
            Self::RANGE_KW => "range",
            Self::RETURN_KW => "return",
            Self::SELECT_KW => "select",
            Self::STRUCT_KW => "struct",
            Self::SWITCH_KW => "switch",
            Self::TYPE_KW => "type",
            Self::VAR_KW => "var",
            Self::LINE_COMMENT => "comment",
            Self::BLOCK_COMMENT => "comment",
            Self::IDENT => "identifier",
            Self::INT | Self::FLOAT | Self::IMAG | Self::CHAR | Self::STRING => "literal",
            Self::ERROR => "invalid token",
            Self::EOF => "EOF",
        }
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SEMICOLON => f.write_str("';' or newline"),
            kind if kind.is_keyword() => write!(f, "'{}'", kind.text()),
            Self::IDENT | Self::EOF | Self::ERROR => f.write_str(self.text()),
            kind if kind.is_literal() || kind.is_trivia() => f.write_str(kind.text()),
            kind => write!(f, "'{}'", kind.text()),
        }
    }
}
