//! Recursive-descent parser for Go source files
//!
//! Builds the typed tree of [`crate::syntax::ast`] straight from the token
//! stream. Parsing stops at the first error: a file that does not parse is
//! never rewritten, so there is nothing to gain from recovery.
//!
//! Comments are attached while parsing lists (declarations, specs, fields,
//! statements, clauses, composite elements): comments on the lines before an
//! item become its leading comments, comments on its last line its trailing
//! ones.

use super::lexer::{RawComment, Token, tokenize};
use super::syntax_kind::SyntaxKind;
use crate::base::{LineIndex, NodeId, NodeIdGen, Pos, Span};
use crate::syntax::ast::*;
use thiserror::Error;

/// A syntax error at a position of the parsed buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub pos: Pos,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, pos: Pos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Parse a complete Go source file
pub fn parse_file(input: &str) -> ParseResult<File> {
    Parser::new(input).parse_file()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleMode {
    Basic,
    LabelOk,
    RangeOk,
}

enum Simple {
    Stmt(StmtKind),
    Range {
        lhs: Vec<Expr>,
        op: SyntaxKind,
        x: Expr,
    },
}

enum ParamEntry {
    Named(Ident, Expr),
    Bare(Expr),
}

/// Tokens that can begin a type
fn is_type_start(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::IDENT
            | SyntaxKind::L_BRACKET
            | SyntaxKind::STRUCT_KW
            | SyntaxKind::STAR
            | SyntaxKind::FUNC_KW
            | SyntaxKind::INTERFACE_KW
            | SyntaxKind::MAP_KW
            | SyntaxKind::CHAN_KW
            | SyntaxKind::L_PAREN
            | SyntaxKind::ARROW
    )
}

fn pos_of(token: &Token<'_>) -> Pos {
    Pos::from_offset(token.offset)
}

/// The parser state
struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    comments: Vec<RawComment<'a>>,
    next_comment: usize,
    pos: usize,
    /// 0-based end of the last significant token consumed
    prev_end: usize,
    /// Nesting level of parens/brackets; negative inside control clauses
    expr_lev: i32,
    ids: NodeIdGen,
    lines: LineIndex,
    eof: Token<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let tokens = tokenize(input);
        Self {
            tokens: tokens.tokens,
            comments: tokens.comments,
            next_comment: 0,
            pos: 0,
            prev_end: 0,
            expr_lev: 0,
            ids: NodeIdGen::new(),
            lines: LineIndex::new(input),
            eof: Token {
                kind: SyntaxKind::EOF,
                text: "",
                offset: input.len(),
            },
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn nth(&self, n: usize) -> Token<'a> {
        self.tokens.get(self.pos + n).copied().unwrap_or(self.eof)
    }

    fn current(&self) -> Token<'a> {
        self.nth(0)
    }

    fn peek(&self) -> SyntaxKind {
        self.current().kind
    }

    fn peek_nth(&self, n: usize) -> SyntaxKind {
        self.nth(n).kind
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.peek() == kind
    }

    fn bump(&mut self) -> Token<'a> {
        let token = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        if !matches!(token.kind, SyntaxKind::SEMICOLON | SyntaxKind::EOF) {
            self.prev_end = token.end();
        }
        token
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> ParseResult<Token<'a>> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_expected(&kind.to_string()))
        }
    }

    /// Statements end at `;`, a line end, or right before a closing delimiter
    fn expect_semi(&mut self) -> ParseResult<()> {
        match self.peek() {
            SyntaxKind::SEMICOLON => {
                self.bump();
                Ok(())
            }
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACE | SyntaxKind::EOF => Ok(()),
            _ => Err(self.error_expected("';' or newline")),
        }
    }

    fn error_expected(&self, what: &str) -> SyntaxError {
        let token = self.current();
        let found = match token.kind {
            SyntaxKind::SEMICOLON if token.is_implicit_semicolon() => "newline".to_string(),
            SyntaxKind::IDENT => format!("identifier {}", token.text),
            SyntaxKind::ERROR => format!("invalid token {:?}", token.text),
            kind if kind.is_literal() => format!("literal {}", token.text),
            kind => kind.to_string(),
        };
        SyntaxError::new(format!("expected {what}, found {found}"), pos_of(&token))
    }

    fn error_at_current(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, pos_of(&self.current()))
    }

    fn cur_pos(&self) -> Pos {
        pos_of(&self.current())
    }

    fn end_pos(&self) -> Pos {
        Pos::from_offset(self.prev_end)
    }

    fn line_of(&self, offset: usize) -> usize {
        self.lines.line(Pos::from_offset(offset))
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Pending comments that start before `before`
    fn take_leading(&mut self, before: usize) -> Vec<Comment> {
        let start = self.next_comment;
        while self
            .comments
            .get(self.next_comment)
            .is_some_and(|c| c.offset < before)
        {
            self.next_comment += 1;
        }
        let raw = &self.comments[start..self.next_comment];
        raw.iter()
            .enumerate()
            .map(|(i, c)| {
                let next = raw.get(i + 1).map(|n| n.offset).unwrap_or(before);
                let last_line = self.line_of(c.offset + c.text.len().saturating_sub(1));
                Comment {
                    text: c.text.to_string(),
                    pos: Pos::from_offset(c.offset),
                    blank_after: next <= self.eof.offset && self.line_of(next) > last_line + 1,
                }
            })
            .collect()
    }

    /// Pending comments that start on or before the line of the last consumed token
    fn take_trailing(&mut self) -> Vec<Comment> {
        let line = self.line_of(self.prev_end.saturating_sub(1));
        let mut out = Vec::new();
        while let Some(c) = self.comments.get(self.next_comment).copied() {
            if self.line_of(c.offset) > line {
                break;
            }
            out.push(Comment {
                text: c.text.to_string(),
                pos: Pos::from_offset(c.offset),
                blank_after: false,
            });
            self.next_comment += 1;
        }
        out
    }

    /// A blank line lies between the previous token and the item at `start`
    fn blank_before(&self, leading: &[Comment], start: usize) -> bool {
        let first = leading
            .first()
            .and_then(|c| c.pos.offset())
            .unwrap_or(start);
        self.prev_end > 0 && self.line_of(first) > self.line_of(self.prev_end - 1) + 1
    }

    /// How the list item at `start` (or its first leading comment) sits below the previous token
    fn break_before(&self, leading: &[Comment], start: usize, first: bool) -> LineBreak {
        let at = leading
            .first()
            .and_then(|c| c.pos.offset())
            .unwrap_or(start);
        let prev = self.line_of(self.prev_end.saturating_sub(1));
        match self.line_of(at).saturating_sub(prev) {
            0 => LineBreak::None,
            1 => LineBreak::Line,
            // an empty line right after the opening bracket is not kept
            _ if first => LineBreak::Line,
            _ => LineBreak::Blank,
        }
    }

    /// The current (closing) token starts below the last consumed one
    fn closes_on_later_line(&self) -> bool {
        self.line_of(self.current().offset) > self.line_of(self.prev_end.saturating_sub(1))
    }

    // =========================================================================
    // File and declarations
    // =========================================================================

    fn parse_file(&mut self) -> ParseResult<File> {
        let doc = self.take_leading(self.current().offset);
        self.expect(SyntaxKind::PACKAGE_KW)?;
        let package = self.parse_ident()?;
        self.expect_semi()?;

        let mut decls = Vec::new();
        while !self.at(SyntaxKind::EOF) {
            decls.push(self.parse_decl()?);
            self.expect_semi()?;
        }
        let trailing = self.take_leading(usize::MAX);
        Ok(File {
            doc,
            package,
            decls,
            trailing,
        })
    }

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        let start = self.current().offset;
        let leading = self.take_leading(start);
        let blank_before = self.blank_before(&leading, start);
        let mut decl = match self.peek() {
            SyntaxKind::FUNC_KW => Decl::Func(self.parse_func_decl()?),
            SyntaxKind::IMPORT_KW
            | SyntaxKind::CONST_KW
            | SyntaxKind::TYPE_KW
            | SyntaxKind::VAR_KW => Decl::Gen(self.parse_gen_decl()?),
            _ => return Err(self.error_expected("declaration")),
        };
        let comments = Comments {
            leading,
            trailing: self.take_trailing(),
        };
        match &mut decl {
            Decl::Gen(d) => {
                d.comments = comments;
                d.blank_before = blank_before;
            }
            Decl::Func(d) => {
                d.comments = comments;
                d.blank_before = blank_before;
            }
        }
        Ok(decl)
    }

    fn parse_gen_decl(&mut self) -> ParseResult<GenDecl> {
        let id = self.ids.next_id();
        let keyword_token = self.bump();
        let keyword = match keyword_token.kind {
            SyntaxKind::IMPORT_KW => DeclKeyword::Import,
            SyntaxKind::CONST_KW => DeclKeyword::Const,
            SyntaxKind::TYPE_KW => DeclKeyword::Type,
            _ => DeclKeyword::Var,
        };

        let mut specs = Vec::new();
        let grouped = self.eat(SyntaxKind::L_PAREN);
        if grouped {
            while !self.at(SyntaxKind::R_PAREN) && !self.at(SyntaxKind::EOF) {
                let start = self.current().offset;
                let leading = self.take_leading(start);
                let blank_before = !specs.is_empty() && self.blank_before(&leading, start);
                let mut spec = self.parse_spec(keyword)?;
                let comments = Comments {
                    leading,
                    trailing: self.take_trailing(),
                };
                match &mut spec {
                    Spec::Import(s) => {
                        s.comments = comments;
                        s.blank_before = blank_before;
                    }
                    Spec::Value(s) => {
                        s.comments = comments;
                        s.blank_before = blank_before;
                    }
                    Spec::Type(s) => {
                        s.comments = comments;
                        s.blank_before = blank_before;
                    }
                }
                specs.push(spec);
                self.expect_semi()?;
            }
            self.expect(SyntaxKind::R_PAREN)?;
        } else {
            specs.push(self.parse_spec(keyword)?);
        }

        Ok(GenDecl {
            id,
            span: Span::new(pos_of(&keyword_token), self.end_pos()),
            keyword,
            grouped,
            specs,
            comments: Comments::default(),
            blank_before: false,
        })
    }

    fn parse_spec(&mut self, keyword: DeclKeyword) -> ParseResult<Spec> {
        match keyword {
            DeclKeyword::Import => {
                let name = match self.peek() {
                    SyntaxKind::IDENT => Some(self.parse_ident()?),
                    SyntaxKind::DOT => {
                        let dot = self.bump();
                        Some(Ident::new(".", pos_of(&dot)))
                    }
                    _ => None,
                };
                let path = self.expect(SyntaxKind::STRING)?.text.to_string();
                Ok(Spec::Import(ImportSpec {
                    name,
                    path,
                    comments: Comments::default(),
                    blank_before: false,
                }))
            }
            DeclKeyword::Const | DeclKeyword::Var => {
                let names = self.parse_ident_list()?;
                let ty = if matches!(
                    self.peek(),
                    SyntaxKind::EQ | SyntaxKind::SEMICOLON | SyntaxKind::R_PAREN
                ) {
                    None
                } else {
                    Some(self.parse_type()?)
                };
                let values = if self.eat(SyntaxKind::EQ) {
                    self.parse_expr_list()?
                } else {
                    Vec::new()
                };
                Ok(Spec::Value(ValueSpec {
                    names,
                    ty,
                    values,
                    comments: Comments::default(),
                    blank_before: false,
                }))
            }
            DeclKeyword::Type => {
                let name = self.parse_ident()?;
                let type_params = if self.at(SyntaxKind::L_BRACKET) && self.at_type_params() {
                    Some(self.parse_type_params()?)
                } else {
                    None
                };
                let alias = self.eat(SyntaxKind::EQ);
                let ty = self.parse_type()?;
                Ok(Spec::Type(TypeSpec {
                    name,
                    type_params,
                    alias,
                    ty,
                    comments: Comments::default(),
                    blank_before: false,
                }))
            }
        }
    }

    /// `type T[P any]` as opposed to `type T [N]E`
    fn at_type_params(&self) -> bool {
        self.peek_nth(1) == SyntaxKind::IDENT
            && matches!(
                self.peek_nth(2),
                SyntaxKind::COMMA
                    | SyntaxKind::TILDE
                    | SyntaxKind::IDENT
                    | SyntaxKind::L_BRACKET
                    | SyntaxKind::STRUCT_KW
                    | SyntaxKind::FUNC_KW
                    | SyntaxKind::INTERFACE_KW
                    | SyntaxKind::MAP_KW
                    | SyntaxKind::CHAN_KW
                    | SyntaxKind::ARROW
            )
    }

    fn parse_type_params(&mut self) -> ParseResult<FieldList> {
        self.expect(SyntaxKind::L_BRACKET)?;
        let mut fields = Vec::new();
        while !self.at(SyntaxKind::R_BRACKET) && !self.at(SyntaxKind::EOF) {
            let names = self.parse_ident_list()?;
            let ty = self.parse_constraint()?;
            fields.push(Field {
                names,
                ty,
                tag: None,
                comments: Comments::default(),
                blank_before: false,
            });
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        self.expect(SyntaxKind::R_BRACKET)?;
        Ok(FieldList::new(true, fields))
    }

    /// A type or a union of `~T` terms
    fn parse_constraint(&mut self) -> ParseResult<Expr> {
        let mut x = self.parse_constraint_term()?;
        while self.eat(SyntaxKind::PIPE) {
            let y = self.parse_constraint_term()?;
            x = Expr::Binary {
                op: SyntaxKind::PIPE,
                x: Box::new(x),
                y: Box::new(y),
            };
        }
        Ok(x)
    }

    fn parse_constraint_term(&mut self) -> ParseResult<Expr> {
        if self.eat(SyntaxKind::TILDE) {
            Ok(Expr::Unary {
                op: SyntaxKind::TILDE,
                x: Box::new(self.parse_type()?),
            })
        } else {
            self.parse_type()
        }
    }

    fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        let id = self.ids.next_id();
        let func = self.expect(SyntaxKind::FUNC_KW)?;
        let recv = if self.at(SyntaxKind::L_PAREN) {
            Some(self.parse_parameters()?)
        } else {
            None
        };
        let name = self.parse_ident()?;
        let type_params = if self.at(SyntaxKind::L_BRACKET) {
            Some(self.parse_type_params()?)
        } else {
            None
        };
        let params = self.parse_parameters()?;
        let results = self.parse_results()?;
        let body = if self.at(SyntaxKind::L_BRACE) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(FuncDecl {
            id,
            span: Span::new(pos_of(&func), self.end_pos()),
            recv,
            name,
            ty: FuncType {
                pos: pos_of(&func),
                type_params,
                params,
                results,
            },
            body,
            comments: Comments::default(),
            blank_before: false,
        })
    }

    // =========================================================================
    // Parameters and types
    // =========================================================================

    fn parse_parameters(&mut self) -> ParseResult<FieldList> {
        self.expect(SyntaxKind::L_PAREN)?;
        let mut entries = Vec::new();
        while !self.at(SyntaxKind::R_PAREN) && !self.at(SyntaxKind::EOF) {
            entries.push(self.parse_param_entry()?);
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        let close = self.expect(SyntaxKind::R_PAREN)?;
        let fields = group_params(entries).map_err(|message| SyntaxError::new(message, pos_of(&close)))?;
        Ok(FieldList::new(true, fields))
    }

    fn parse_param_entry(&mut self) -> ParseResult<ParamEntry> {
        match self.peek() {
            SyntaxKind::IDENT => {}
            SyntaxKind::ELLIPSIS => return Ok(ParamEntry::Bare(self.parse_variadic()?)),
            _ => return Ok(ParamEntry::Bare(self.parse_type()?)),
        }

        let ident = self.parse_ident()?;
        match self.peek() {
            SyntaxKind::COMMA | SyntaxKind::R_PAREN => Ok(ParamEntry::Bare(Expr::Ident(ident))),
            SyntaxKind::DOT => {
                self.bump();
                let sel = self.parse_ident()?;
                let mut ty = Expr::Selector {
                    x: Box::new(Expr::Ident(ident)),
                    sel,
                };
                if self.at(SyntaxKind::L_BRACKET) {
                    ty = self.parse_type_args(ty)?;
                }
                Ok(ParamEntry::Bare(ty))
            }
            SyntaxKind::L_BRACKET => {
                if matches!(self.peek_nth(1), SyntaxKind::R_BRACKET | SyntaxKind::ELLIPSIS) {
                    return Ok(ParamEntry::Named(ident, self.parse_type()?));
                }
                // `name [N]T` or the instantiation `T[A, B]`
                self.bump();
                self.expr_lev += 1;
                let mut args = vec![self.parse_expr()?];
                while self.eat(SyntaxKind::COMMA) {
                    if self.at(SyntaxKind::R_BRACKET) {
                        break;
                    }
                    args.push(self.parse_type()?);
                }
                self.expr_lev -= 1;
                self.expect(SyntaxKind::R_BRACKET)?;
                if args.len() == 1 && is_type_start(self.peek()) {
                    let elt = self.parse_type()?;
                    let len = args.pop().map(Box::new);
                    return Ok(ParamEntry::Named(
                        ident,
                        Expr::ArrayType {
                            len,
                            elt: Box::new(elt),
                        },
                    ));
                }
                Ok(ParamEntry::Bare(Expr::Index {
                    x: Box::new(Expr::Ident(ident)),
                    indices: args,
                }))
            }
            SyntaxKind::ELLIPSIS => Ok(ParamEntry::Named(ident, self.parse_variadic()?)),
            _ => Ok(ParamEntry::Named(ident, self.parse_type()?)),
        }
    }

    fn parse_variadic(&mut self) -> ParseResult<Expr> {
        self.expect(SyntaxKind::ELLIPSIS)?;
        Ok(Expr::Ellipsis(Some(Box::new(self.parse_type()?))))
    }

    fn parse_results(&mut self) -> ParseResult<Option<FieldList>> {
        match self.peek() {
            SyntaxKind::L_PAREN => Ok(Some(self.parse_parameters()?)),
            kind if is_type_start(kind) => Ok(Some(FieldList::new(
                false,
                vec![Field::unnamed(self.parse_type()?)],
            ))),
            _ => Ok(None),
        }
    }

    fn parse_signature(&mut self, pos: Pos) -> ParseResult<FuncType> {
        let params = self.parse_parameters()?;
        let results = self.parse_results()?;
        Ok(FuncType {
            pos,
            type_params: None,
            params,
            results,
        })
    }

    fn parse_type(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            SyntaxKind::IDENT => self.parse_type_name(),
            SyntaxKind::L_BRACKET => self.parse_array_type(),
            SyntaxKind::STRUCT_KW => self.parse_struct_type(),
            SyntaxKind::INTERFACE_KW => self.parse_interface_type(),
            SyntaxKind::STAR => {
                self.bump();
                Ok(Expr::Star(Box::new(self.parse_type()?)))
            }
            SyntaxKind::FUNC_KW => {
                let func = self.bump();
                Ok(Expr::FuncType(self.parse_signature(pos_of(&func))?))
            }
            SyntaxKind::MAP_KW => {
                self.bump();
                self.expect(SyntaxKind::L_BRACKET)?;
                let key = self.parse_type()?;
                self.expect(SyntaxKind::R_BRACKET)?;
                let value = self.parse_type()?;
                Ok(Expr::MapType {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            SyntaxKind::CHAN_KW => {
                self.bump();
                let dir = if self.eat(SyntaxKind::ARROW) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(Expr::ChanType {
                    dir,
                    value: Box::new(self.parse_type()?),
                })
            }
            SyntaxKind::ARROW => {
                self.bump();
                self.expect(SyntaxKind::CHAN_KW)?;
                Ok(Expr::ChanType {
                    dir: ChanDir::Recv,
                    value: Box::new(self.parse_type()?),
                })
            }
            SyntaxKind::L_PAREN => {
                self.bump();
                let ty = self.parse_type()?;
                self.expect(SyntaxKind::R_PAREN)?;
                Ok(Expr::Paren(Box::new(ty)))
            }
            _ => Err(self.error_expected("type")),
        }
    }

    fn parse_type_name(&mut self) -> ParseResult<Expr> {
        let mut ty = Expr::Ident(self.parse_ident()?);
        if self.eat(SyntaxKind::DOT) {
            ty = Expr::Selector {
                x: Box::new(ty),
                sel: self.parse_ident()?,
            };
        }
        if self.at(SyntaxKind::L_BRACKET) {
            ty = self.parse_type_args(ty)?;
        }
        Ok(ty)
    }

    fn parse_type_args(&mut self, x: Expr) -> ParseResult<Expr> {
        self.expect(SyntaxKind::L_BRACKET)?;
        self.expr_lev += 1;
        let mut indices = vec![self.parse_type()?];
        while self.eat(SyntaxKind::COMMA) {
            if self.at(SyntaxKind::R_BRACKET) {
                break;
            }
            indices.push(self.parse_type()?);
        }
        self.expr_lev -= 1;
        self.expect(SyntaxKind::R_BRACKET)?;
        Ok(Expr::Index {
            x: Box::new(x),
            indices,
        })
    }

    fn parse_array_type(&mut self) -> ParseResult<Expr> {
        self.expect(SyntaxKind::L_BRACKET)?;
        let len = if self.eat(SyntaxKind::R_BRACKET) {
            None
        } else if self.at(SyntaxKind::ELLIPSIS) && self.peek_nth(1) == SyntaxKind::R_BRACKET {
            self.bump();
            self.bump();
            Some(Box::new(Expr::Ellipsis(None)))
        } else {
            self.expr_lev += 1;
            let len = self.parse_expr()?;
            self.expr_lev -= 1;
            self.expect(SyntaxKind::R_BRACKET)?;
            Some(Box::new(len))
        };
        Ok(Expr::ArrayType {
            len,
            elt: Box::new(self.parse_type()?),
        })
    }

    fn parse_struct_type(&mut self) -> ParseResult<Expr> {
        self.expect(SyntaxKind::STRUCT_KW)?;
        self.expect(SyntaxKind::L_BRACE)?;
        let mut fields = Vec::new();
        while !self.at(SyntaxKind::R_BRACE) && !self.at(SyntaxKind::EOF) {
            let start = self.current().offset;
            let leading = self.take_leading(start);
            let blank_before = !fields.is_empty() && self.blank_before(&leading, start);
            let (names, ty) = match self.peek() {
                SyntaxKind::STAR => (Vec::new(), self.parse_type()?),
                SyntaxKind::IDENT => match self.peek_nth(1) {
                    SyntaxKind::DOT
                    | SyntaxKind::SEMICOLON
                    | SyntaxKind::R_BRACE
                    | SyntaxKind::STRING => (Vec::new(), self.parse_type_name()?),
                    _ => {
                        let names = self.parse_ident_list()?;
                        (names, self.parse_type()?)
                    }
                },
                _ => return Err(self.error_expected("field name or embedded type")),
            };
            let tag = if self.at(SyntaxKind::STRING) {
                Some(self.bump().text.to_string())
            } else {
                None
            };
            let trailing = self.take_trailing();
            fields.push(Field {
                names,
                ty,
                tag,
                comments: Comments { leading, trailing },
                blank_before,
            });
            self.expect_semi()?;
        }
        self.expect(SyntaxKind::R_BRACE)?;
        Ok(Expr::StructType(FieldList::new(true, fields)))
    }

    fn parse_interface_type(&mut self) -> ParseResult<Expr> {
        self.expect(SyntaxKind::INTERFACE_KW)?;
        self.expect(SyntaxKind::L_BRACE)?;
        let mut fields = Vec::new();
        while !self.at(SyntaxKind::R_BRACE) && !self.at(SyntaxKind::EOF) {
            let start = self.current().offset;
            let leading = self.take_leading(start);
            let blank_before = !fields.is_empty() && self.blank_before(&leading, start);
            let mut field =
                if self.at(SyntaxKind::IDENT) && self.peek_nth(1) == SyntaxKind::L_PAREN {
                    let name = self.parse_ident()?;
                    let signature = self.parse_signature(Pos::NONE)?;
                    Field {
                        names: vec![name],
                        ty: Expr::FuncType(signature),
                        tag: None,
                        comments: Comments::default(),
                        blank_before: false,
                    }
                } else {
                    Field::unnamed(self.parse_constraint()?)
                };
            field.comments = Comments {
                leading,
                trailing: self.take_trailing(),
            };
            field.blank_before = blank_before;
            fields.push(field);
            self.expect_semi()?;
        }
        self.expect(SyntaxKind::R_BRACE)?;
        Ok(Expr::InterfaceType(FieldList::new(true, fields)))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        let token = self.expect(SyntaxKind::IDENT)?;
        Ok(Ident::new(token.text, pos_of(&token)))
    }

    fn parse_ident_list(&mut self) -> ParseResult<Vec<Ident>> {
        let mut idents = vec![self.parse_ident()?];
        while self.eat(SyntaxKind::COMMA) {
            idents.push(self.parse_ident()?);
        }
        Ok(idents)
    }

    fn parse_expr_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(SyntaxKind::COMMA) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_binary_expr(1)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut x = self.parse_unary_expr()?;
        loop {
            let op = self.peek();
            let prec = op.binary_precedence();
            if prec == 0 || prec < min_prec {
                return Ok(x);
            }
            self.bump();
            let y = self.parse_binary_expr(prec + 1)?;
            x = Expr::Binary {
                op,
                x: Box::new(x),
                y: Box::new(y),
            };
        }
    }

    fn parse_unary_expr(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            SyntaxKind::PLUS
            | SyntaxKind::MINUS
            | SyntaxKind::BANG
            | SyntaxKind::CARET
            | SyntaxKind::AMP
            | SyntaxKind::TILDE => {
                let op = self.bump().kind;
                Ok(Expr::Unary {
                    op,
                    x: Box::new(self.parse_unary_expr()?),
                })
            }
            SyntaxKind::ARROW => {
                if self.peek_nth(1) == SyntaxKind::CHAN_KW {
                    let ty = self.parse_type()?;
                    return self.parse_primary_suffix(ty);
                }
                self.bump();
                Ok(Expr::Unary {
                    op: SyntaxKind::ARROW,
                    x: Box::new(self.parse_unary_expr()?),
                })
            }
            SyntaxKind::STAR => {
                self.bump();
                Ok(Expr::Star(Box::new(self.parse_unary_expr()?)))
            }
            _ => {
                let x = self.parse_operand()?;
                self.parse_primary_suffix(x)
            }
        }
    }

    fn parse_operand(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            SyntaxKind::IDENT => Ok(Expr::Ident(self.parse_ident()?)),
            SyntaxKind::INT
            | SyntaxKind::FLOAT
            | SyntaxKind::IMAG
            | SyntaxKind::CHAR
            | SyntaxKind::STRING => {
                let token = self.bump();
                Ok(Expr::BasicLit {
                    kind: token.kind,
                    value: token.text.to_string(),
                })
            }
            SyntaxKind::L_PAREN => {
                self.bump();
                self.expr_lev += 1;
                let x = self.parse_expr()?;
                self.expr_lev -= 1;
                self.expect(SyntaxKind::R_PAREN)?;
                Ok(Expr::Paren(Box::new(x)))
            }
            SyntaxKind::FUNC_KW => self.parse_func_type_or_lit(),
            SyntaxKind::L_BRACKET
            | SyntaxKind::STRUCT_KW
            | SyntaxKind::MAP_KW
            | SyntaxKind::CHAN_KW
            | SyntaxKind::INTERFACE_KW => self.parse_type(),
            _ => Err(self.error_expected("expression")),
        }
    }

    fn parse_func_type_or_lit(&mut self) -> ParseResult<Expr> {
        let id = self.ids.next_id();
        let func = self.expect(SyntaxKind::FUNC_KW)?;
        let ty = self.parse_signature(pos_of(&func))?;
        if !self.at(SyntaxKind::L_BRACE) {
            return Ok(Expr::FuncType(ty));
        }
        self.expr_lev += 1;
        let body = self.parse_block()?;
        self.expr_lev -= 1;
        Ok(Expr::FuncLit(FuncLit { id, ty, body }))
    }

    fn parse_primary_suffix(&mut self, mut x: Expr) -> ParseResult<Expr> {
        loop {
            match self.peek() {
                SyntaxKind::DOT => {
                    self.bump();
                    match self.peek() {
                        SyntaxKind::IDENT => {
                            x = Expr::Selector {
                                x: Box::new(x),
                                sel: self.parse_ident()?,
                            };
                        }
                        SyntaxKind::L_PAREN => {
                            self.bump();
                            let ty = if self.eat(SyntaxKind::TYPE_KW) {
                                None
                            } else {
                                Some(Box::new(self.parse_type()?))
                            };
                            self.expect(SyntaxKind::R_PAREN)?;
                            x = Expr::TypeAssert { x: Box::new(x), ty };
                        }
                        _ => return Err(self.error_expected("selector or type assertion")),
                    }
                }
                SyntaxKind::L_BRACKET => x = self.parse_index_or_slice(x)?,
                SyntaxKind::L_PAREN => x = self.parse_call(x)?,
                SyntaxKind::L_BRACE => {
                    let literal = match &x {
                        Expr::Ident(_) | Expr::Selector { .. } | Expr::Index { .. } => {
                            self.expr_lev >= 0
                        }
                        Expr::ArrayType { .. } | Expr::StructType(_) | Expr::MapType { .. } => true,
                        _ => false,
                    };
                    if !literal {
                        return Ok(x);
                    }
                    x = self.parse_composite_lit(Some(x))?;
                }
                _ => return Ok(x),
            }
        }
    }

    fn parse_index_or_slice(&mut self, x: Expr) -> ParseResult<Expr> {
        self.expect(SyntaxKind::L_BRACKET)?;
        self.expr_lev += 1;
        let mut parts: [Option<Expr>; 3] = [None, None, None];
        if !self.at(SyntaxKind::COLON) {
            parts[0] = Some(self.parse_expr()?);
        }
        let mut extra = Vec::new();
        while self.eat(SyntaxKind::COMMA) {
            if self.at(SyntaxKind::R_BRACKET) {
                break;
            }
            extra.push(self.parse_type()?);
        }
        let mut colons = 0;
        while extra.is_empty() && colons < 2 && self.eat(SyntaxKind::COLON) {
            colons += 1;
            if !matches!(self.peek(), SyntaxKind::COLON | SyntaxKind::R_BRACKET) {
                parts[colons] = Some(self.parse_expr()?);
            }
        }
        self.expr_lev -= 1;
        self.expect(SyntaxKind::R_BRACKET)?;

        let [low, high, max] = parts;
        if colons > 0 {
            return Ok(Expr::Slice {
                x: Box::new(x),
                low: low.map(Box::new),
                high: high.map(Box::new),
                max: max.map(Box::new),
                full: colons == 2,
            });
        }
        let Some(first) = low else {
            return Err(self.error_at_current("expected operand in index expression"));
        };
        let mut indices = vec![first];
        indices.extend(extra);
        Ok(Expr::Index {
            x: Box::new(x),
            indices,
        })
    }

    fn parse_call(&mut self, fun: Expr) -> ParseResult<Expr> {
        self.expect(SyntaxKind::L_PAREN)?;
        self.expr_lev += 1;
        let mut args = Vec::new();
        let mut ellipsis = false;
        let mut layout = ListLayout::default();
        while !self.at(SyntaxKind::R_PAREN) && !self.at(SyntaxKind::EOF) {
            layout
                .breaks
                .push(self.break_before(&[], self.current().offset, args.is_empty()));
            args.push(self.parse_expr()?);
            if self.eat(SyntaxKind::ELLIPSIS) {
                ellipsis = true;
            }
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        self.expr_lev -= 1;
        layout.closing = !args.is_empty() && self.closes_on_later_line();
        self.expect(SyntaxKind::R_PAREN)?;
        Ok(Expr::Call {
            fun: Box::new(fun),
            args,
            ellipsis,
            layout,
        })
    }

    fn parse_composite_lit(&mut self, ty: Option<Expr>) -> ParseResult<Expr> {
        self.expect(SyntaxKind::L_BRACE)?;
        let outer = self.expr_lev;
        self.expr_lev = outer.max(0) + 1;
        let mut elts: Vec<Element> = Vec::new();
        let mut layout = ListLayout::default();
        while !self.at(SyntaxKind::R_BRACE) && !self.at(SyntaxKind::EOF) {
            let start = self.current().offset;
            let leading = self.take_leading(start);
            layout
                .breaks
                .push(self.break_before(&leading, start, elts.is_empty()));
            let key_or_value = self.parse_element_value()?;
            let mut element = if self.eat(SyntaxKind::COLON) {
                Element {
                    key: Some(key_or_value),
                    value: self.parse_element_value()?,
                    comments: Comments::default(),
                }
            } else {
                Element {
                    key: None,
                    value: key_or_value,
                    comments: Comments::default(),
                }
            };
            let more = self.eat(SyntaxKind::COMMA);
            element.comments = Comments {
                leading,
                trailing: self.take_trailing(),
            };
            elts.push(element);
            if !more {
                break;
            }
        }
        self.expr_lev = outer;
        layout.closing = !elts.is_empty() && self.closes_on_later_line();
        self.expect(SyntaxKind::R_BRACE)?;
        Ok(Expr::CompositeLit(CompositeLit {
            ty: ty.map(Box::new),
            elts,
            layout,
        }))
    }

    fn parse_element_value(&mut self) -> ParseResult<Expr> {
        if self.at(SyntaxKind::L_BRACE) {
            self.parse_composite_lit(None)
        } else {
            self.parse_expr()
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> ParseResult<Block> {
        let id = self.ids.next_id();
        let lbrace = self.expect(SyntaxKind::L_BRACE)?;
        let stmts = self.parse_stmt_list()?;
        let dangling = self.take_leading(self.current().offset);
        let rbrace = self.expect(SyntaxKind::R_BRACE)?;
        Ok(Block {
            id,
            lbrace: pos_of(&lbrace),
            rbrace: pos_of(&rbrace),
            stmts,
            dangling,
            multiline: self.line_of(lbrace.offset) != self.line_of(rbrace.offset),
        })
    }

    fn parse_stmt_list(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !matches!(
            self.peek(),
            SyntaxKind::R_BRACE | SyntaxKind::CASE_KW | SyntaxKind::DEFAULT_KW | SyntaxKind::EOF
        ) {
            if self.eat(SyntaxKind::SEMICOLON) {
                continue;
            }
            let start = self.current().offset;
            let leading = self.take_leading(start);
            let blank_before = !stmts.is_empty() && self.blank_before(&leading, start);
            let mut stmt = self.parse_stmt()?;
            stmt.comments = Comments {
                leading,
                trailing: self.take_trailing(),
            };
            stmt.blank_before = blank_before;
            stmts.push(stmt);
            self.expect_semi()?;
        }
        Ok(stmts)
    }

    fn stmt(&self, id: NodeId, start: Pos, kind: StmtKind) -> Stmt {
        Stmt {
            id,
            span: Span::new(start, self.end_pos()),
            kind,
            comments: Comments::default(),
            blank_before: false,
        }
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let id = self.ids.next_id();
        let start = self.cur_pos();
        let kind = match self.peek() {
            SyntaxKind::VAR_KW | SyntaxKind::CONST_KW | SyntaxKind::TYPE_KW => {
                StmtKind::Decl(self.parse_gen_decl()?)
            }
            SyntaxKind::GO_KW => {
                self.bump();
                StmtKind::Go(self.parse_expr()?)
            }
            SyntaxKind::DEFER_KW => {
                self.bump();
                StmtKind::Defer(self.parse_expr()?)
            }
            SyntaxKind::RETURN_KW => {
                self.bump();
                let results = if matches!(self.peek(), SyntaxKind::SEMICOLON | SyntaxKind::R_BRACE) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                StmtKind::Return(results)
            }
            SyntaxKind::BREAK_KW
            | SyntaxKind::CONTINUE_KW
            | SyntaxKind::GOTO_KW
            | SyntaxKind::FALLTHROUGH_KW => {
                let op = self.bump().kind;
                let label = if op != SyntaxKind::FALLTHROUGH_KW && self.at(SyntaxKind::IDENT) {
                    Some(self.parse_ident()?)
                } else {
                    None
                };
                StmtKind::Branch { op, label }
            }
            SyntaxKind::L_BRACE => StmtKind::Block(self.parse_block()?),
            SyntaxKind::IF_KW => StmtKind::If(self.parse_if()?),
            SyntaxKind::SWITCH_KW => self.parse_switch()?,
            SyntaxKind::SELECT_KW => {
                self.bump();
                StmtKind::Select(SelectStmt {
                    body: self.parse_clause_body(true)?,
                })
            }
            SyntaxKind::FOR_KW => self.parse_for()?,
            _ => self.parse_simple_kind(SimpleMode::LabelOk)?,
        };
        Ok(self.stmt(id, start, kind))
    }

    fn parse_simple_stmt(&mut self) -> ParseResult<Stmt> {
        let id = self.ids.next_id();
        let start = self.cur_pos();
        let kind = self.parse_simple_kind(SimpleMode::Basic)?;
        Ok(self.stmt(id, start, kind))
    }

    fn parse_simple_kind(&mut self, mode: SimpleMode) -> ParseResult<StmtKind> {
        match self.parse_simple(mode)? {
            Simple::Stmt(kind) => Ok(kind),
            Simple::Range { .. } => Err(self.error_at_current("unexpected range clause")),
        }
    }

    fn parse_simple(&mut self, mode: SimpleMode) -> ParseResult<Simple> {
        let mut lhs = self.parse_expr_list()?;
        let op = self.peek();
        if op == SyntaxKind::COLON_EQ || op.is_assign_op() {
            self.bump();
            if mode == SimpleMode::RangeOk
                && self.at(SyntaxKind::RANGE_KW)
                && matches!(op, SyntaxKind::EQ | SyntaxKind::COLON_EQ)
            {
                self.bump();
                let x = self.parse_expr()?;
                return Ok(Simple::Range { lhs, op, x });
            }
            let rhs = self.parse_expr_list()?;
            return Ok(Simple::Stmt(StmtKind::Assign(AssignStmt { lhs, op, rhs })));
        }

        if lhs.len() > 1 {
            return Err(self.error_expected("':=' or '='"));
        }
        let Some(x) = lhs.pop() else {
            return Err(self.error_expected("expression"));
        };
        let kind = match op {
            SyntaxKind::COLON if mode == SimpleMode::LabelOk => {
                let Expr::Ident(label) = x else {
                    return Err(self.error_at_current("label must be an identifier"));
                };
                self.bump();
                let stmt = if self.at(SyntaxKind::R_BRACE) {
                    let id = self.ids.next_id();
                    self.stmt(id, self.cur_pos(), StmtKind::Empty)
                } else {
                    self.parse_stmt()?
                };
                StmtKind::Labeled {
                    label,
                    stmt: Box::new(stmt),
                }
            }
            SyntaxKind::ARROW => {
                self.bump();
                StmtKind::Send {
                    chan: x,
                    value: self.parse_expr()?,
                }
            }
            SyntaxKind::PLUS_PLUS | SyntaxKind::MINUS_MINUS => {
                self.bump();
                StmtKind::IncDec { x, op }
            }
            _ => StmtKind::Expr(x),
        };
        Ok(Simple::Stmt(kind))
    }

    fn parse_if(&mut self) -> ParseResult<IfStmt> {
        self.expect(SyntaxKind::IF_KW)?;
        let (init, cond) = self.parse_if_header()?;
        let then = self.parse_block()?;
        let else_ = if self.eat(SyntaxKind::ELSE_KW) {
            let id = self.ids.next_id();
            let start = self.cur_pos();
            let kind = match self.peek() {
                SyntaxKind::IF_KW => StmtKind::If(self.parse_if()?),
                SyntaxKind::L_BRACE => StmtKind::Block(self.parse_block()?),
                _ => return Err(self.error_expected("if statement or block")),
            };
            Some(Box::new(self.stmt(id, start, kind)))
        } else {
            None
        };
        Ok(IfStmt {
            init,
            cond,
            then,
            else_,
        })
    }

    fn parse_if_header(&mut self) -> ParseResult<(Option<Box<Stmt>>, Expr)> {
        if self.at(SyntaxKind::L_BRACE) {
            return Err(self.error_at_current("missing condition in if statement"));
        }
        let outer = self.expr_lev;
        self.expr_lev = -1;
        let mut init = None;
        let mut cond = None;
        if !self.at(SyntaxKind::SEMICOLON) {
            cond = Some(self.parse_simple_stmt()?);
        }
        if self.eat(SyntaxKind::SEMICOLON) {
            init = cond.take().map(Box::new);
            if self.at(SyntaxKind::L_BRACE) {
                return Err(self.error_at_current("missing condition in if statement"));
            }
            cond = Some(self.parse_simple_stmt()?);
        }
        self.expr_lev = outer;
        match cond.map(|s| s.kind) {
            Some(StmtKind::Expr(x)) => Ok((init, x)),
            _ => Err(self.error_at_current("expected boolean expression as if condition")),
        }
    }

    fn parse_switch(&mut self) -> ParseResult<StmtKind> {
        self.expect(SyntaxKind::SWITCH_KW)?;
        let outer = self.expr_lev;
        self.expr_lev = -1;
        let mut init = None;
        let mut tag = None;
        if !self.at(SyntaxKind::L_BRACE) {
            if !self.at(SyntaxKind::SEMICOLON) {
                tag = Some(self.parse_simple_stmt()?);
            }
            if self.eat(SyntaxKind::SEMICOLON) {
                init = tag.take().map(Box::new);
                if !self.at(SyntaxKind::L_BRACE) {
                    tag = Some(self.parse_simple_stmt()?);
                }
            }
        }
        self.expr_lev = outer;
        let body = self.parse_clause_body(false)?;

        match tag {
            Some(guard) if is_type_switch_guard(&guard) => Ok(StmtKind::TypeSwitch(TypeSwitchStmt {
                init,
                assign: Box::new(guard),
                body,
            })),
            Some(Stmt {
                kind: StmtKind::Expr(x),
                ..
            }) => Ok(StmtKind::Switch(SwitchStmt {
                init,
                tag: Some(x),
                body,
            })),
            Some(_) => Err(self.error_at_current("switch expression must be an expression")),
            None => Ok(StmtKind::Switch(SwitchStmt {
                init,
                tag: None,
                body,
            })),
        }
    }

    fn parse_clause_body(&mut self, comm: bool) -> ParseResult<ClauseBody> {
        self.expect(SyntaxKind::L_BRACE)?;
        let mut clauses = Vec::new();
        loop {
            let leading = self.take_leading(self.current().offset);
            if !matches!(self.peek(), SyntaxKind::CASE_KW | SyntaxKind::DEFAULT_KW) {
                self.expect(SyntaxKind::R_BRACE)?;
                return Ok(ClauseBody {
                    clauses,
                    dangling: leading,
                });
            }
            let mut clause = self.parse_clause(comm)?;
            clause.comments.leading = leading;
            clauses.push(clause);
        }
    }

    fn parse_clause(&mut self, comm: bool) -> ParseResult<Clause> {
        let id = self.ids.next_id();
        let start = self.cur_pos();
        let head = if self.eat(SyntaxKind::CASE_KW) {
            if comm {
                ClauseHead::Comm(Box::new(self.parse_simple_stmt()?))
            } else {
                ClauseHead::Case(self.parse_expr_list()?)
            }
        } else {
            self.expect(SyntaxKind::DEFAULT_KW)?;
            ClauseHead::Default
        };
        let colon = self.expect(SyntaxKind::COLON)?;
        let trailing = self.take_trailing();
        let body = self.parse_stmt_list()?;
        Ok(Clause {
            id,
            span: Span::new(start, Pos::from_offset(colon.end())),
            colon: pos_of(&colon),
            head,
            body,
            comments: Comments {
                leading: Vec::new(),
                trailing,
            },
        })
    }

    fn parse_for(&mut self) -> ParseResult<StmtKind> {
        self.expect(SyntaxKind::FOR_KW)?;
        let outer = self.expr_lev;
        self.expr_lev = -1;
        let mut init = None;
        let mut cond = None;
        let mut post = None;
        let mut range = None;
        if !self.at(SyntaxKind::L_BRACE) {
            let mut first = None;
            if self.eat(SyntaxKind::RANGE_KW) {
                range = Some((Vec::new(), None, self.parse_expr()?));
            } else if !self.at(SyntaxKind::SEMICOLON) {
                let id = self.ids.next_id();
                let start = self.cur_pos();
                match self.parse_simple(SimpleMode::RangeOk)? {
                    Simple::Range { lhs, op, x } => range = Some((lhs, Some(op), x)),
                    Simple::Stmt(kind) => first = Some(self.stmt(id, start, kind)),
                }
            }
            if range.is_none() && self.eat(SyntaxKind::SEMICOLON) {
                init = first.take().map(Box::new);
                if !self.at(SyntaxKind::SEMICOLON) {
                    first = Some(self.parse_simple_stmt()?);
                }
                self.expect(SyntaxKind::SEMICOLON)?;
                if !self.at(SyntaxKind::L_BRACE) {
                    post = Some(Box::new(self.parse_simple_stmt()?));
                }
            }
            cond = first;
        }
        self.expr_lev = outer;
        let body = self.parse_block()?;

        if let Some((lhs, op, x)) = range {
            let mut targets = lhs.into_iter();
            let key = targets.next();
            let value = targets.next();
            if targets.next().is_some() {
                return Err(self.error_at_current("range clause permits at most two iteration variables"));
            }
            return Ok(StmtKind::Range(RangeStmt {
                key,
                value,
                op,
                x,
                body,
            }));
        }
        let cond = match cond.map(|s| s.kind) {
            None => None,
            Some(StmtKind::Expr(x)) => Some(x),
            Some(_) => return Err(self.error_at_current("expected for loop condition")),
        };
        Ok(StmtKind::For(ForStmt {
            init,
            cond,
            post,
            body,
        }))
    }
}

/// Group `a, b int, c string` into fields the way the reference toolchain does
fn group_params(entries: Vec<ParamEntry>) -> Result<Vec<Field>, &'static str> {
    let named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
    if !named {
        return Ok(entries
            .into_iter()
            .map(|entry| match entry {
                ParamEntry::Bare(ty) | ParamEntry::Named(_, ty) => Field::unnamed(ty),
            })
            .collect());
    }

    let mut fields = Vec::new();
    let mut pending = Vec::new();
    for entry in entries {
        match entry {
            ParamEntry::Named(name, ty) => {
                pending.push(name);
                fields.push(Field {
                    names: std::mem::take(&mut pending),
                    ty,
                    tag: None,
                    comments: Comments::default(),
                    blank_before: false,
                });
            }
            ParamEntry::Bare(Expr::Ident(name)) => pending.push(name),
            ParamEntry::Bare(_) => return Err("mixed named and unnamed parameters"),
        }
    }
    if !pending.is_empty() {
        return Err("mixed named and unnamed parameters");
    }
    Ok(fields)
}

fn is_type_switch_guard(stmt: &Stmt) -> bool {
    let is_guard = |e: &Expr| matches!(e, Expr::TypeAssert { ty: None, .. });
    match &stmt.kind {
        StmtKind::Expr(x) => is_guard(x),
        StmtKind::Assign(assign) => {
            assign.op == SyntaxKind::COLON_EQ
                && assign.lhs.len() == 1
                && assign.rhs.len() == 1
                && is_guard(&assign.rhs[0])
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> File {
        match parse_file(src) {
            Ok(file) => file,
            Err(e) => panic!("parse failed at {:?}: {}", e.pos, e.message),
        }
    }

    fn func_body(file: &File, name: &str) -> Block {
        file.decls
            .iter()
            .find_map(|d| match d {
                Decl::Func(f) if f.name.as_str() == name => f.body.clone(),
                _ => None,
            })
            .expect("function not found")
    }

    #[test]
    fn test_parse_package_clause() {
        let file = parse_ok("package main\n");
        assert_eq!(file.package.as_str(), "main");
        assert!(file.decls.is_empty());
    }

    #[test]
    fn test_parse_imports_grouped_and_single() {
        let file = parse_ok("package main\n\nimport \"fmt\"\n\nimport (\n\tstr \"strings\"\n\t. \"os\"\n)\n");
        let paths: Vec<_> = file.imports().map(|i| i.path_value().to_string()).collect();
        assert_eq!(paths, vec!["fmt", "strings", "os"]);
        let names: Vec<_> = file
            .imports()
            .map(|i| i.name.as_ref().map(|n| n.name.to_string()))
            .collect();
        assert_eq!(names, vec![None, Some("str".to_string()), Some(".".to_string())]);
    }

    #[test]
    fn test_parse_var_group() {
        let file = parse_ok("package main\n\nvar a, b, c = 1, 2, 3\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected a var declaration");
        };
        assert_eq!(decl.keyword, DeclKeyword::Var);
        let names: Vec<_> = decl.value_names().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_results_grouping() {
        let file = parse_ok("package main\n\nfunc f(a, b int, c ...string) (x, _ int, err error) {\n\treturn\n}\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected a function");
        };
        assert_eq!(f.ty.params.fields.len(), 2);
        assert_eq!(f.ty.params.fields[0].names.len(), 2);
        assert!(matches!(f.ty.params.fields[1].ty, Expr::Ellipsis(Some(_))));
        assert_eq!(f.ty.result_count(), 3);
    }

    #[test]
    fn test_parse_unnamed_results() {
        let file = parse_ok("package main\n\nfunc f() (int, error) { return 0, nil }\nfunc g() int { return 1 }\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected a function");
        };
        assert!(!f.ty.results.as_ref().is_some_and(FieldList::is_named));
        assert_eq!(f.ty.result_count(), 2);
        let Decl::Func(g) = &file.decls[1] else {
            panic!("expected a function");
        };
        assert!(g.ty.results.as_ref().is_some_and(|r| !r.delimited));
    }

    #[test]
    fn test_parse_composite_literal_in_control_clause() {
        let body = func_body(
            &parse_ok("package main\n\nfunc f() {\n\tfor _, v := range []int{1, 2} {\n\t\t_ = v\n\t}\n\tif x == (T{}) {\n\t}\n}\n"),
            "f",
        );
        assert!(matches!(body.stmts[0].kind, StmtKind::Range(_)));
        assert!(matches!(body.stmts[1].kind, StmtKind::If(_)));
    }

    #[test]
    fn test_parse_if_else_chain() {
        let body = func_body(
            &parse_ok("package main\n\nfunc f() {\n\tif a := 1; a > 0 {\n\t} else if b := 2; b > 0 {\n\t} else {\n\t}\n}\n"),
            "f",
        );
        let StmtKind::If(outer) = &body.stmts[0].kind else {
            panic!("expected if");
        };
        assert!(outer.init.is_some());
        let Some(else_) = &outer.else_ else {
            panic!("expected else");
        };
        let StmtKind::If(inner) = &else_.kind else {
            panic!("expected else-if");
        };
        assert!(matches!(
            inner.else_.as_deref().map(|s| &s.kind),
            Some(StmtKind::Block(_))
        ));
    }

    #[test]
    fn test_parse_switch_forms() {
        let body = func_body(
            &parse_ok(
                "package main\n\nfunc f(v any) {\n\tswitch x := v.(type) {\n\tcase int, string:\n\t\t_ = x\n\tdefault:\n\t}\n\tswitch {\n\tcase true:\n\t}\n\tselect {\n\tcase v := <-ch:\n\t\t_ = v\n\tcase ch <- 1:\n\t}\n}\n",
            ),
            "f",
        );
        assert!(matches!(body.stmts[0].kind, StmtKind::TypeSwitch(_)));
        assert!(matches!(body.stmts[1].kind, StmtKind::Switch(_)));
        let StmtKind::Select(select) = &body.stmts[2].kind else {
            panic!("expected select");
        };
        assert_eq!(select.body.clauses.len(), 2);
    }

    #[test]
    fn test_parse_for_forms() {
        let body = func_body(
            &parse_ok("package main\n\nfunc f() {\n\tfor i := 0; i < 3; i++ {\n\t}\n\tfor x < 3 {\n\t}\n\tfor {\n\t\tbreak\n\t}\n\tfor range ch {\n\t}\n}\n"),
            "f",
        );
        let StmtKind::For(counted) = &body.stmts[0].kind else {
            panic!("expected counted loop");
        };
        assert!(counted.init.is_some() && counted.cond.is_some() && counted.post.is_some());
        assert!(matches!(body.stmts[1].kind, StmtKind::For(ForStmt { init: None, cond: Some(_), .. })));
        assert!(matches!(body.stmts[3].kind, StmtKind::Range(RangeStmt { key: None, .. })));
    }

    #[test]
    fn test_parse_generics() {
        let file = parse_ok(
            "package main\n\ntype List[T any] struct {\n\titems []T\n}\n\ntype Number interface {\n\t~int | ~float64\n}\n\nfunc Sum[T Number](xs []T) T {\n\tvar s T\n\treturn s\n}\n\ntype Arr [4]int\n",
        );
        let Decl::Gen(list) = &file.decls[0] else {
            panic!("expected type decl");
        };
        let Spec::Type(spec) = &list.specs[0] else {
            panic!("expected type spec");
        };
        assert!(spec.type_params.is_some());
        let Decl::Gen(arr) = &file.decls[3] else {
            panic!("expected type decl");
        };
        let Spec::Type(spec) = &arr.specs[0] else {
            panic!("expected type spec");
        };
        assert!(spec.type_params.is_none());
        assert!(matches!(spec.ty, Expr::ArrayType { len: Some(_), .. }));
    }

    #[test]
    fn test_node_ids_are_unique_and_preorder() {
        let body = func_body(&parse_ok("package main\n\nfunc f() {\n\ta := 1\n\tb := 2\n}\n"), "f");
        assert!(body.id < body.stmts[0].id);
        assert!(body.stmts[0].id < body.stmts[1].id);
    }

    #[test]
    fn test_statement_spans() {
        let src = "package main\n\nfunc f() {\n\tx := 1 + 2\n}\n";
        let body = func_body(&parse_ok(src), "f");
        let span = body.stmts[0].span;
        let text = &src[span.pos.offset().unwrap()..span.end.offset().unwrap()];
        assert_eq!(text, "x := 1 + 2");
    }

    #[test]
    fn test_clause_span_ends_after_colon() {
        let src = "package main\n\nfunc f(x int) {\n\tswitch x {\n\tcase 1, 2:\n\t}\n}\n";
        let body = func_body(&parse_ok(src), "f");
        let StmtKind::Switch(switch) = &body.stmts[0].kind else {
            panic!("expected switch");
        };
        let clause = &switch.body.clauses[0];
        let head = &src[clause.span.pos.offset().unwrap()..clause.colon.offset().unwrap()];
        assert_eq!(head, "case 1, 2");
    }

    #[test]
    fn test_comments_attach_to_statements() {
        let file = parse_ok("// header\n\npackage main\n\nfunc f() {\n\t// lead\n\tx := 1 // trail\n\t_ = x\n\t// dangling\n}\n");
        assert_eq!(file.doc.len(), 1);
        assert!(file.doc[0].blank_after);
        let body = func_body(&file, "f");
        assert_eq!(body.stmts[0].comments.leading[0].text, "// lead");
        assert_eq!(body.stmts[0].comments.trailing[0].text, "// trail");
        assert_eq!(body.dangling[0].text, "// dangling");
    }

    #[test]
    fn test_blank_lines_between_statements() {
        let body = func_body(&parse_ok("package main\n\nfunc f() {\n\ta := 1\n\n\tb := 2\n\tc := 3\n}\n"), "f");
        assert!(!body.stmts[0].blank_before);
        assert!(body.stmts[1].blank_before);
        assert!(!body.stmts[2].blank_before);
    }

    #[test]
    fn test_composite_literal_layout() {
        let file = parse_ok("package main\n\nvar m = map[string]int{\n\t\"a\": 1, \"b\": 2,\n\n\t\"c\": 3,\n}\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected var");
        };
        let Spec::Value(spec) = &decl.specs[0] else {
            panic!("expected value spec");
        };
        let Expr::CompositeLit(lit) = &spec.values[0] else {
            panic!("expected composite literal");
        };
        assert_eq!(
            lit.layout.breaks,
            vec![LineBreak::Line, LineBreak::None, LineBreak::Blank]
        );
        assert!(lit.layout.closing);
    }

    #[test]
    fn test_blank_lines_between_struct_fields() {
        let file = parse_ok("package main\n\ntype T struct {\n\ta int\n\n\tb int\n\tc int\n}\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected type");
        };
        let Spec::Type(spec) = &decl.specs[0] else {
            panic!("expected type spec");
        };
        let Expr::StructType(list) = &spec.ty else {
            panic!("expected struct");
        };
        let blanks: Vec<bool> = list.fields.iter().map(|f| f.blank_before).collect();
        assert_eq!(blanks, vec![false, true, false]);
    }

    #[test]
    fn test_labeled_and_branch_statements() {
        let body = func_body(
            &parse_ok("package main\n\nfunc f() {\nouter:\n\tfor {\n\t\tcontinue outer\n\t}\n\tgoto end\nend:\n}\n"),
            "f",
        );
        assert!(matches!(body.stmts[0].kind, StmtKind::Labeled { .. }));
        assert!(matches!(body.stmts[2].kind, StmtKind::Labeled { ref stmt, .. } if stmt.kind == StmtKind::Empty));
    }

    #[test]
    fn test_func_literal_gets_id() {
        let file = parse_ok("package main\n\nvar f = func() int {\n\treturn 1\n}\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected var");
        };
        let Spec::Value(spec) = &decl.specs[0] else {
            panic!("expected value spec");
        };
        assert!(matches!(&spec.values[0], Expr::FuncLit(lit) if !lit.id.is_synthetic()));
    }

    #[test]
    fn test_error_reports_position() {
        let err = parse_file("package main\n\nfunc f() {\n\tx := \n}\n").unwrap_err();
        assert!(err.pos.is_valid());
        assert!(err.message.starts_with("expected expression"), "{}", err.message);
    }

    #[test]
    fn test_error_on_statement_outside_function() {
        let err = parse_file("package main\n\nx := 1\n").unwrap_err();
        assert!(err.message.contains("declaration"));
    }
}
