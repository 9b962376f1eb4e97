//! Typed constructors for inserted trace calls.
//!
//! One [`TraceCall`] per print primitive; [`TraceBuilder`] lowers them to the
//! statement, deferred statement or package-level declaration shapes the
//! rewriter splices into a tree.

use smol_str::SmolStr;

use crate::base::constants::BLANK;
use crate::base::{NodeId, Pos, Span};
use crate::syntax::ast::*;

use super::config::DisplayOptions;
use super::hygiene::{Namespace, Primitive};

/// A call to one runtime primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceCall {
    /// A source line and its ` [ file:line:col ]` suffix
    Statement { line: String, source: String },
    /// A variable's value, or a marker that the name shadows an earlier one
    Variable { name: SmolStr, shadowed: bool },
    /// Function entry
    Call { signature: String },
    /// Function exit
    Return { signature: String },
}

impl TraceCall {
    pub fn statement(line: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Statement {
            line: line.into(),
            source: source.into(),
        }
    }

    pub fn variable(name: impl Into<SmolStr>) -> Self {
        Self::Variable {
            name: name.into(),
            shadowed: false,
        }
    }

    pub fn shadowed(name: impl Into<SmolStr>) -> Self {
        Self::Variable {
            name: name.into(),
            shadowed: true,
        }
    }

    fn primitive(&self) -> Primitive {
        match self {
            Self::Statement { .. } => Primitive::Statement,
            Self::Variable { .. } => Primitive::Variable,
            Self::Call { .. } => Primitive::Call,
            Self::Return { .. } => Primitive::Return,
        }
    }
}

/// Lowers trace calls to syntax
#[derive(Debug, Clone, Copy)]
pub struct TraceBuilder<'a> {
    namespace: &'a Namespace,
    display: &'a DisplayOptions,
}

impl<'a> TraceBuilder<'a> {
    pub fn new(namespace: &'a Namespace, display: &'a DisplayOptions) -> Self {
        Self { namespace, display }
    }

    fn callee(&self, primitive: Primitive) -> Expr {
        let name = self.namespace.primitive_name(primitive);
        match self.namespace.qualifier() {
            Some(package) => Expr::selector(Expr::ident(package), name),
            None => Expr::ident(name),
        }
    }

    fn flag(value: bool) -> Expr {
        Expr::ident(if value { "true" } else { "false" })
    }

    /// `Println<Kind>_<token>(width, ..., showTimestamp, showTaskID)`
    pub fn call_expr(&self, call: &TraceCall) -> Expr {
        let mut args = vec![Expr::int_lit(self.display.line_width)];
        match call {
            TraceCall::Statement { line, source } => {
                args.push(Expr::string_lit(quote(line)));
                args.push(Expr::string_lit(quote(source)));
            }
            TraceCall::Variable { name, shadowed } => {
                args.push(Expr::string_lit(quote(name)));
                args.push(if *shadowed {
                    Expr::ident("nil")
                } else {
                    Expr::ident(name.clone())
                });
                args.push(Self::flag(*shadowed));
            }
            TraceCall::Call { signature } | TraceCall::Return { signature } => {
                args.push(Expr::string_lit(quote(signature)));
            }
        }
        args.push(Self::flag(self.display.show_timestamp));
        args.push(Self::flag(self.display.show_task_id));
        Expr::call(self.callee(call.primitive()), args)
    }

    /// The call as a statement
    pub fn stmt(&self, call: &TraceCall) -> Stmt {
        Stmt::synthetic(StmtKind::Expr(self.call_expr(call)))
    }

    /// The call run at function exit.
    ///
    /// Variable traces are wrapped in a closure so the value is read at exit,
    /// not when the `defer` statement executes.
    pub fn deferred(&self, call: &TraceCall) -> Stmt {
        let expr = self.call_expr(call);
        let deferred = match call {
            TraceCall::Variable { .. } => Expr::call(
                Expr::FuncLit(FuncLit {
                    id: NodeId::SYNTHETIC,
                    ty: FuncType {
                        pos: Pos::NONE,
                        type_params: None,
                        params: FieldList::new(true, Vec::new()),
                        results: None,
                    },
                    body: Block::synthetic(vec![Stmt::synthetic(StmtKind::Expr(expr))]),
                }),
                Vec::new(),
            ),
            _ => expr,
        };
        Stmt::synthetic(StmtKind::Defer(deferred))
    }

    /// `var _ = func() int { <call>; return 0 }()` for package scope
    pub fn package_decl(&self, call: &TraceCall) -> Decl {
        let body = Block::synthetic(vec![
            self.stmt(call),
            Stmt::synthetic(StmtKind::Return(vec![Expr::int_lit(0)])),
        ]);
        let init = Expr::call(
            Expr::FuncLit(FuncLit {
                id: NodeId::SYNTHETIC,
                ty: FuncType {
                    pos: Pos::NONE,
                    type_params: None,
                    params: FieldList::new(true, Vec::new()),
                    results: Some(FieldList::new(false, vec![Field::unnamed(Expr::ident("int"))])),
                },
                body,
            }),
            Vec::new(),
        );
        Decl::Gen(GenDecl {
            id: NodeId::SYNTHETIC,
            span: Span::NONE,
            keyword: DeclKeyword::Var,
            grouped: false,
            specs: vec![Spec::Value(ValueSpec {
                names: vec![Ident::synthetic(BLANK)],
                ty: None,
                values: vec![init],
                comments: Comments::default(),
                blank_before: false,
            })],
            comments: Comments::default(),
            blank_before: false,
        })
    }
}

/// Quote `s` as a Go interpreted string literal
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() || c == '\u{feff}' => {
                if (c as u32) <= 0xffff {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                } else {
                    out.push_str(&format!("\\U{:08x}", c as u32));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
