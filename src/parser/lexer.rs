//! Logos-based lexer for Go
//!
//! Fast tokenization using the logos crate, followed by Go's automatic
//! semicolon insertion. Comments are split off into their own list so the
//! parser sees only significant tokens.

use super::syntax_kind::SyntaxKind;
use logos::Logos;

/// A significant token with its kind, text, and 0-based byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: usize,
}

impl Token<'_> {
    /// 0-based offset one past the last byte
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// Whether this semicolon was inserted at a line end rather than written
    pub fn is_implicit_semicolon(&self) -> bool {
        self.kind == SyntaxKind::SEMICOLON && self.text != ";"
    }
}

/// A comment with its 0-based byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawComment<'a> {
    pub text: &'a str,
    pub offset: usize,
}

/// Output of [`tokenize`]
#[derive(Debug, Clone, Default)]
pub struct Tokens<'a> {
    pub tokens: Vec<Token<'a>>,
    pub comments: Vec<RawComment<'a>>,
}

/// Lexer wrapping the logos-generated tokenizer.
///
/// Yields significant tokens only; comments are collected into
/// [`Lexer::comments`] as they are passed.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    last: Option<SyntaxKind>,
    comments: Vec<RawComment<'a>>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            last: None,
            comments: Vec::new(),
            finished: false,
        }
    }

    /// Comments seen so far
    pub fn comments(&self) -> &[RawComment<'a>] {
        &self.comments
    }

    pub fn into_comments(self) -> Vec<RawComment<'a>> {
        self.comments
    }

    fn needs_semicolon(&self) -> bool {
        self.last.map(SyntaxKind::ends_statement).unwrap_or(false)
    }

    fn semicolon(&mut self, text: &'a str, offset: usize) -> Token<'a> {
        self.last = Some(SyntaxKind::SEMICOLON);
        Token {
            kind: SyntaxKind::SEMICOLON,
            text,
            offset,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(logos_token) = self.inner.next() else {
                if self.finished {
                    return None;
                }
                self.finished = true;
                if self.needs_semicolon() {
                    let offset = self.inner.source().len();
                    return Some(self.semicolon("", offset));
                }
                return None;
            };
            let text = self.inner.slice();
            let offset = self.inner.span().start;

            let kind = match logos_token {
                Ok(LogosToken::Newline) => {
                    if self.needs_semicolon() {
                        return Some(self.semicolon(text, offset));
                    }
                    continue;
                }
                Ok(LogosToken::LineComment) => {
                    self.comments.push(RawComment { text, offset });
                    continue;
                }
                Ok(LogosToken::BlockComment) => {
                    self.comments.push(RawComment { text, offset });
                    if text.contains('\n') && self.needs_semicolon() {
                        return Some(self.semicolon("\n", offset));
                    }
                    continue;
                }
                Ok(t) => t.into(),
                Err(()) => SyntaxKind::ERROR,
            };

            self.last = Some(kind);
            return Some(Token { kind, text, offset });
        }
    }
}

/// Tokenize an entire string
pub fn tokenize(input: &str) -> Tokens<'_> {
    let mut lexer = Lexer::new(input);
    let tokens: Vec<_> = lexer.by_ref().collect();
    Tokens {
        tokens,
        comments: lexer.into_comments(),
    }
}

/// Consume a block comment after its opening `/*`; unterminated comments are errors
fn block_comment(lex: &mut logos::Lexer<LogosToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_\p{L}][a-zA-Z0-9_\p{L}\p{Nd}]*")]
    Ident,

    #[regex(r"[0-9][0-9_]*")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    #[regex(r"0[oO][0-7_]+")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    #[regex(r"0[xX][0-9a-fA-F_]*(\.[0-9a-fA-F_]*)?[pP][+-]?[0-9_]+")]
    Float,

    #[regex(r"[0-9][0-9_]*i")]
    #[regex(r"0[xX][0-9a-fA-F_]+i")]
    #[regex(r"0[bB][01_]+i")]
    #[regex(r"0[oO][0-7_]+i")]
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?i")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?i")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+i")]
    Imag,

    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    Char,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    #[regex(r"`[^`]*`")]
    String,

    // =========================================================================
    // OPERATORS (longest first)
    // =========================================================================
    #[token("&^=")]
    AmpCaretEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("...")]
    Ellipsis,
    #[token("&^")]
    AmpCaret,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<-")]
    Arrow,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token(":=")]
    ColonEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Newline => SyntaxKind::SEMICOLON,
            LogosToken::LineComment => SyntaxKind::LINE_COMMENT,
            LogosToken::BlockComment => SyntaxKind::BLOCK_COMMENT,
            LogosToken::Ident => SyntaxKind::IDENT,
            LogosToken::Int => SyntaxKind::INT,
            LogosToken::Float => SyntaxKind::FLOAT,
            LogosToken::Imag => SyntaxKind::IMAG,
            LogosToken::Char => SyntaxKind::CHAR,
            LogosToken::String => SyntaxKind::STRING,
            LogosToken::AmpCaretEq => SyntaxKind::AMP_CARET_EQ,
            LogosToken::ShlEq => SyntaxKind::SHL_EQ,
            LogosToken::ShrEq => SyntaxKind::SHR_EQ,
            LogosToken::Ellipsis => SyntaxKind::ELLIPSIS,
            LogosToken::AmpCaret => SyntaxKind::AMP_CARET,
            LogosToken::PlusEq => SyntaxKind::PLUS_EQ,
            LogosToken::MinusEq => SyntaxKind::MINUS_EQ,
            LogosToken::StarEq => SyntaxKind::STAR_EQ,
            LogosToken::SlashEq => SyntaxKind::SLASH_EQ,
            LogosToken::PercentEq => SyntaxKind::PERCENT_EQ,
            LogosToken::AmpEq => SyntaxKind::AMP_EQ,
            LogosToken::PipeEq => SyntaxKind::PIPE_EQ,
            LogosToken::CaretEq => SyntaxKind::CARET_EQ,
            LogosToken::Shl => SyntaxKind::SHL,
            LogosToken::Shr => SyntaxKind::SHR,
            LogosToken::AmpAmp => SyntaxKind::AMP_AMP,
            LogosToken::PipePipe => SyntaxKind::PIPE_PIPE,
            LogosToken::Arrow => SyntaxKind::ARROW,
            LogosToken::PlusPlus => SyntaxKind::PLUS_PLUS,
            LogosToken::MinusMinus => SyntaxKind::MINUS_MINUS,
            LogosToken::EqEq => SyntaxKind::EQ_EQ,
            LogosToken::BangEq => SyntaxKind::BANG_EQ,
            LogosToken::LtEq => SyntaxKind::LT_EQ,
            LogosToken::GtEq => SyntaxKind::GT_EQ,
            LogosToken::ColonEq => SyntaxKind::COLON_EQ,
            LogosToken::Plus => SyntaxKind::PLUS,
            LogosToken::Minus => SyntaxKind::MINUS,
            LogosToken::Star => SyntaxKind::STAR,
            LogosToken::Slash => SyntaxKind::SLASH,
            LogosToken::Percent => SyntaxKind::PERCENT,
            LogosToken::Amp => SyntaxKind::AMP,
            LogosToken::Pipe => SyntaxKind::PIPE,
            LogosToken::Caret => SyntaxKind::CARET,
            LogosToken::Lt => SyntaxKind::LT,
            LogosToken::Gt => SyntaxKind::GT,
            LogosToken::Eq => SyntaxKind::EQ,
            LogosToken::Bang => SyntaxKind::BANG,
            LogosToken::Tilde => SyntaxKind::TILDE,
            LogosToken::LParen => SyntaxKind::L_PAREN,
            LogosToken::RParen => SyntaxKind::R_PAREN,
            LogosToken::LBracket => SyntaxKind::L_BRACKET,
            LogosToken::RBracket => SyntaxKind::R_BRACKET,
            LogosToken::LBrace => SyntaxKind::L_BRACE,
            LogosToken::RBrace => SyntaxKind::R_BRACE,
            LogosToken::Comma => SyntaxKind::COMMA,
            LogosToken::Dot => SyntaxKind::DOT,
            LogosToken::Semicolon => SyntaxKind::SEMICOLON,
            LogosToken::Colon => SyntaxKind::COLON,
            LogosToken::Break => SyntaxKind::BREAK_KW,
            LogosToken::Case => SyntaxKind::CASE_KW,
            LogosToken::Chan => SyntaxKind::CHAN_KW,
            LogosToken::Const => SyntaxKind::CONST_KW,
            LogosToken::Continue => SyntaxKind::CONTINUE_KW,
            LogosToken::Default => SyntaxKind::DEFAULT_KW,
            LogosToken::Defer => SyntaxKind::DEFER_KW,
            LogosToken::Else => SyntaxKind::ELSE_KW,
            LogosToken::Fallthrough => SyntaxKind::FALLTHROUGH_KW,
            LogosToken::For => SyntaxKind::FOR_KW,
            LogosToken::Func => SyntaxKind::FUNC_KW,
            LogosToken::Go => SyntaxKind::GO_KW,
            LogosToken::Goto => SyntaxKind::GOTO_KW,
            LogosToken::If => SyntaxKind::IF_KW,
            LogosToken::Import => SyntaxKind::IMPORT_KW,
            LogosToken::Interface => SyntaxKind::INTERFACE_KW,
            LogosToken::Map => SyntaxKind::MAP_KW,
            LogosToken::Package => SyntaxKind::PACKAGE_KW,
            LogosToken::Range => SyntaxKind::RANGE_KW,
            LogosToken::Return => SyntaxKind::RETURN_KW,
            LogosToken::Select => SyntaxKind::SELECT_KW,
            LogosToken::Struct => SyntaxKind::STRUCT_KW,
            LogosToken::Switch => SyntaxKind::SWITCH_KW,
            LogosToken::Type => SyntaxKind::TYPE_KW,
            LogosToken::Var => SyntaxKind::VAR_KW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        tokenize(input).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_semicolon_inserted_after_identifier() {
        assert_eq!(
            kinds("x\ny"),
            vec![
                SyntaxKind::IDENT,
                SyntaxKind::SEMICOLON,
                SyntaxKind::IDENT,
                SyntaxKind::SEMICOLON
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        assert_eq!(
            kinds("a +\nb"),
            vec![
                SyntaxKind::IDENT,
                SyntaxKind::PLUS,
                SyntaxKind::IDENT,
                SyntaxKind::SEMICOLON
            ]
        );
    }

    #[test]
    fn test_comments_are_collected_separately() {
        let out = tokenize("x := 1 // one\n/* two */ y");
        assert_eq!(out.comments.len(), 2);
        assert_eq!(out.comments[0].text, "// one");
        assert_eq!(out.comments[1].text, "/* two */");
        assert!(out.tokens.iter().all(|t| !t.kind.is_trivia()));
        assert!(out.tokens[3].is_implicit_semicolon());
    }

    #[test]
    fn test_multiline_block_comment_acts_as_newline() {
        assert_eq!(
            kinds("return /*\n*/ x"),
            vec![
                SyntaxKind::RETURN_KW,
                SyntaxKind::SEMICOLON,
                SyntaxKind::IDENT,
                SyntaxKind::SEMICOLON
            ]
        );
    }

    #[test]
    fn test_block_comment_with_stars() {
        let out = tokenize("/** a * b **/ x /* y */");
        assert_eq!(out.comments[0].text, "/** a * b **/");
        assert_eq!(out.comments[1].text, "/* y */");
        assert_eq!(kinds("/** a * b **/ x"), vec![SyntaxKind::IDENT, SyntaxKind::SEMICOLON]);
    }

    #[test]
    fn test_unterminated_block_comment_is_an_error() {
        assert_eq!(kinds("x /* open")[1], SyntaxKind::ERROR);
    }

    #[test]
    fn test_number_literals() {
        let out = tokenize("1 0x1F 1.5 .5 1e9 0x1p-2 2i 1_000");
        let kinds: Vec<_> = out.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::INT,
                SyntaxKind::INT,
                SyntaxKind::FLOAT,
                SyntaxKind::FLOAT,
                SyntaxKind::FLOAT,
                SyntaxKind::FLOAT,
                SyntaxKind::IMAG,
                SyntaxKind::INT,
                SyntaxKind::SEMICOLON
            ]
        );
    }

    #[test]
    fn test_string_forms() {
        let out = tokenize("\"a\\\"b\" `raw\nline` 'x' '\\n'");
        let texts: Vec<_> = out.tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts[0], "\"a\\\"b\"");
        assert_eq!(texts[1], "`raw\nline`");
        assert_eq!(texts[2], "'x'");
        assert_eq!(texts[3], "'\\n'");
    }

    #[test]
    fn test_keywords_win_over_identifiers() {
        assert_eq!(kinds("func")[0], SyntaxKind::FUNC_KW);
        assert_eq!(kinds("funcs")[0], SyntaxKind::IDENT);
    }

    #[test]
    fn test_unicode_identifier() {
        let out = tokenize("größe := 1");
        assert_eq!(out.tokens[0].kind, SyntaxKind::IDENT);
        assert_eq!(out.tokens[0].text, "größe");
    }
}
