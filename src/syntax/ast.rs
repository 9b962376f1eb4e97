//! Typed syntax tree for Go source files.
//!
//! The shapes mirror the language grammar closely: declarations, statements
//! and expressions (types are expressions, as in the reference toolchain).
//! Statements, blocks, clauses and functions carry a [`NodeId`] so later
//! passes can key tables by node identity without holding references.

use crate::base::constants::BLANK;
use crate::base::{NodeId, Pos, Span};
use crate::parser::SyntaxKind;
use smol_str::SmolStr;

// ============================================================================
// LEAVES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: SmolStr,
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: impl Into<SmolStr>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }

    /// An identifier created by the rewriter
    pub fn synthetic(name: impl Into<SmolStr>) -> Self {
        Self::new(name, Pos::NONE)
    }

    pub fn is_blank(&self) -> bool {
        self.name == BLANK
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

/// A comment kept verbatim, including its `//` or `/* */` markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub pos: Pos,
    /// A blank line separates this comment from what follows it
    pub blank_after: bool,
}

/// Comments attached to a node: whole lines before it and the rest of its last line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    pub leading: Vec<Comment>,
    pub trailing: Vec<Comment>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

// ============================================================================
// FILE AND DECLARATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// Comments above the package clause (build constraints live here)
    pub doc: Vec<Comment>,
    pub package: Ident,
    pub decls: Vec<Decl>,
    /// Comments after the last declaration
    pub trailing: Vec<Comment>,
}

impl File {
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            Decl::Gen(gen_decl) => gen_decl
                .specs
                .iter()
                .filter_map(|spec| match spec {
                    Spec::Import(import) => Some(import),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            Decl::Func(_) => Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

impl Decl {
    pub fn blank_before(&self) -> bool {
        match self {
            Decl::Gen(d) => d.blank_before,
            Decl::Func(d) => d.blank_before,
        }
    }

    pub fn blank_before_mut(&mut self) -> &mut bool {
        match self {
            Decl::Gen(d) => &mut d.blank_before,
            Decl::Func(d) => &mut d.blank_before,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKeyword {
    Import,
    Const,
    Type,
    Var,
}

impl DeclKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Const => "const",
            Self::Type => "type",
            Self::Var => "var",
        }
    }
}

/// `import`, `const`, `type` or `var`, single or parenthesized
#[derive(Debug, Clone, PartialEq)]
pub struct GenDecl {
    pub id: NodeId,
    pub span: Span,
    pub keyword: DeclKeyword,
    pub grouped: bool,
    pub specs: Vec<Spec>,
    pub comments: Comments,
    pub blank_before: bool,
}

impl GenDecl {
    /// Declared names of every value spec, left to right
    pub fn value_names(&self) -> impl Iterator<Item = &Ident> {
        self.specs.iter().flat_map(|spec| match spec {
            Spec::Value(value) => value.names.as_slice(),
            _ => &[],
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

impl Spec {
    pub fn comments(&self) -> &Comments {
        match self {
            Spec::Import(s) => &s.comments,
            Spec::Value(s) => &s.comments,
            Spec::Type(s) => &s.comments,
        }
    }

    pub fn blank_before(&self) -> bool {
        match self {
            Spec::Import(s) => s.blank_before,
            Spec::Value(s) => s.blank_before,
            Spec::Type(s) => s.blank_before,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    /// The path literal as written, quotes included
    pub path: String,
    pub comments: Comments,
    pub blank_before: bool,
}

impl ImportSpec {
    /// The import path without quotes
    pub fn path_value(&self) -> &str {
        self.path.trim_matches(|c| c == '"' || c == '`')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    pub comments: Comments,
    pub blank_before: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    pub type_params: Option<FieldList>,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
    pub comments: Comments,
    pub blank_before: bool,
}

/// A function or method declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub id: NodeId,
    pub span: Span,
    pub recv: Option<FieldList>,
    pub name: Ident,
    pub ty: FuncType,
    pub body: Option<Block>,
    pub comments: Comments,
    pub blank_before: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    /// Position of the `func` keyword
    pub pos: Pos,
    pub type_params: Option<FieldList>,
    pub params: FieldList,
    pub results: Option<FieldList>,
}

impl FuncType {
    /// Number of result slots, counting every name of a grouped field
    pub fn result_count(&self) -> usize {
        self.results
            .as_ref()
            .map(|results| results.fields.iter().map(Field::slot_count).sum())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldList {
    /// Written with parentheses (or brackets, for type parameters)
    pub delimited: bool,
    pub fields: Vec<Field>,
}

impl FieldList {
    pub fn new(delimited: bool, fields: Vec<Field>) -> Self {
        Self { delimited, fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any field carries names
    pub fn is_named(&self) -> bool {
        self.fields.iter().any(|f| !f.names.is_empty())
    }

    pub fn names(&self) -> impl Iterator<Item = &Ident> {
        self.fields.iter().flat_map(|f| f.names.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub tag: Option<String>,
    pub comments: Comments,
    /// An empty line separates this field from the previous one
    pub blank_before: bool,
}

impl Field {
    pub fn unnamed(ty: Expr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
            comments: Comments::default(),
            blank_before: false,
        }
    }

    /// Slots this field occupies in a parameter or result list
    pub fn slot_count(&self) -> usize {
        self.names.len().max(1)
    }
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub lbrace: Pos,
    pub rbrace: Pos,
    pub stmts: Vec<Stmt>,
    /// Comments after the last statement
    pub dangling: Vec<Comment>,
    /// Source placed the braces of an empty block on different lines
    pub multiline: bool,
}

impl Block {
    pub fn synthetic(stmts: Vec<Stmt>) -> Self {
        Self {
            id: NodeId::SYNTHETIC,
            lbrace: Pos::NONE,
            rbrace: Pos::NONE,
            stmts,
            dangling: Vec::new(),
            multiline: false,
        }
    }

    pub fn first_stmt(&self) -> Option<&Stmt> {
        self.stmts.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
    pub comments: Comments,
    pub blank_before: bool,
}

impl Stmt {
    pub fn synthetic(kind: StmtKind) -> Self {
        Self {
            id: NodeId::SYNTHETIC,
            span: Span::NONE,
            kind,
            comments: Comments::default(),
            blank_before: false,
        }
    }

    pub fn pos(&self) -> Pos {
        self.span.pos
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Decl(GenDecl),
    Labeled { label: Ident, stmt: Box<Stmt> },
    Expr(Expr),
    Send { chan: Expr, value: Expr },
    IncDec { x: Expr, op: SyntaxKind },
    Assign(AssignStmt),
    Go(Expr),
    Defer(Expr),
    Return(Vec<Expr>),
    Branch { op: SyntaxKind, label: Option<Ident> },
    Block(Block),
    If(IfStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Select(SelectStmt),
    For(ForStmt),
    Range(RangeStmt),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    /// `=`, `:=` or a compound operator
    pub op: SyntaxKind,
    pub rhs: Vec<Expr>,
}

impl AssignStmt {
    /// Plain (`=`) or short (`:=`) assignment
    pub fn is_simple(&self) -> bool {
        matches!(self.op, SyntaxKind::EQ | SyntaxKind::COLON_EQ)
    }

    /// Identifiers on the left-hand side, skipping blanks and non-identifiers
    pub fn target_names(&self) -> impl Iterator<Item = &Ident> {
        self.lhs.iter().filter_map(|e| match e {
            Expr::Ident(ident) if !ident.is_blank() => Some(ident),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either a block or another `if` statement
    pub else_: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub init: Option<Box<Stmt>>,
    pub tag: Option<Expr>,
    pub body: ClauseBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSwitchStmt {
    pub init: Option<Box<Stmt>>,
    /// `x := y.(type)` or `y.(type)`
    pub assign: Box<Stmt>,
    pub body: ClauseBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub body: ClauseBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClauseBody {
    pub clauses: Vec<Clause>,
    pub dangling: Vec<Comment>,
}

/// A `case`/`default` clause of a switch, type switch or select
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub id: NodeId,
    /// From the `case`/`default` keyword to one past the colon
    pub span: Span,
    pub colon: Pos,
    pub head: ClauseHead,
    pub body: Vec<Stmt>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClauseHead {
    Default,
    Case(Vec<Expr>),
    Comm(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    /// `:=` or `=` when key/value are present
    pub op: Option<SyntaxKind>,
    pub x: Expr,
    pub body: Block,
}

// ============================================================================
// EXPRESSIONS AND TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    BasicLit { kind: SyntaxKind, value: String },
    CompositeLit(CompositeLit),
    FuncLit(FuncLit),
    Paren(Box<Expr>),
    Selector { x: Box<Expr>, sel: Ident },
    Index { x: Box<Expr>, indices: Vec<Expr> },
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
        full: bool,
    },
    /// `x.(T)`; `ty` is `None` for `x.(type)`
    TypeAssert { x: Box<Expr>, ty: Option<Box<Expr>> },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
        layout: ListLayout,
    },
    Star(Box<Expr>),
    Unary { op: SyntaxKind, x: Box<Expr> },
    Binary { op: SyntaxKind, x: Box<Expr>, y: Box<Expr> },
    /// `[N]T`, `[...]T` (len is `Ellipsis(None)`) or `[]T` (len is `None`)
    ArrayType { len: Option<Box<Expr>>, elt: Box<Expr> },
    /// `...T` in a parameter list, or the length of `[...]T`
    Ellipsis(Option<Box<Expr>>),
    StructType(FieldList),
    FuncType(FuncType),
    /// Methods are fields named by the method with a `FuncType`
    InterfaceType(FieldList),
    MapType { key: Box<Expr>, value: Box<Expr> },
    ChanType { dir: ChanDir, value: Box<Expr> },
}

impl Expr {
    pub fn ident(name: impl Into<SmolStr>) -> Self {
        Expr::Ident(Ident::synthetic(name))
    }

    pub fn string_lit(value: String) -> Self {
        Expr::BasicLit {
            kind: SyntaxKind::STRING,
            value,
        }
    }

    pub fn int_lit(value: usize) -> Self {
        Expr::BasicLit {
            kind: SyntaxKind::INT,
            value: value.to_string(),
        }
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            fun: Box::new(fun),
            args,
            ellipsis: false,
            layout: ListLayout::default(),
        }
    }

    pub fn selector(x: Expr, sel: impl Into<SmolStr>) -> Self {
        Expr::Selector {
            x: Box::new(x),
            sel: Ident::synthetic(sel),
        }
    }

    /// Identifier or qualified identifier: the forms a type name takes
    pub fn is_type_name(&self) -> bool {
        match self {
            Expr::Ident(_) => true,
            Expr::Selector { x, .. } => matches!(**x, Expr::Ident(_)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLit {
    /// Absent for elided element types inside an outer literal
    pub ty: Option<Box<Expr>>,
    pub elts: Vec<Element>,
    pub layout: ListLayout,
}

/// Where a source line ended inside a list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineBreak {
    #[default]
    None,
    Line,
    /// A line break followed by at least one empty line
    Blank,
}

/// Line breaks of a bracketed list as the source wrote them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListLayout {
    /// Break before each item; items past the end have none
    pub breaks: Vec<LineBreak>,
    /// The closing bracket sat on a line after the last item
    pub closing: bool,
}

impl ListLayout {
    pub fn before(&self, item: usize) -> LineBreak {
        self.breaks.get(item).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub id: NodeId,
    pub ty: FuncType,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}
