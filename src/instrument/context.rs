//! Context discovery: which construct owns each block.
//!
//! One pre-order walk records a [`ConstructDescriptor`] per qualifying
//! construct, keyed by node id:
//!
//! - functions and loops by the first statement of their body (empty bodies
//!   get no entry)
//! - switch/select clauses by the clause itself
//! - if-chain branches by the `then` block, and by the `else` block when the
//!   chain ends in a plain block
//!
//! Ids are unique across statements, blocks and clauses, so one map holds
//! every kind and a key never maps to two descriptors.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::{NodeId, Pos, Span};
use crate::syntax::ast::*;
use crate::syntax::visit::{self, Visitor};

use super::hygiene::Namespace;
use super::normalize::result_names;

/// A function with a non-empty body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionContext {
    /// Receiver and parameter names, blanks removed
    pub params: Vec<SmolStr>,
    /// One name per result slot, synthesized where the source has none
    pub results: Vec<SmolStr>,
    /// From the `func` keyword up to the body's opening brace
    pub signature: Span,
}

/// A counted or range loop with a non-empty body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopContext {
    pub vars: Vec<SmolStr>,
}

/// A `case`/`default` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseContext {
    /// From the clause keyword up to (not including) the colon
    pub label: Span,
}

/// One `if` of a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLevel {
    /// Position of the `if` keyword
    pub pos: Pos,
    /// Names the initializer assigns, blanks removed
    pub names: Vec<SmolStr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Then,
    /// Terminal `else`; `then_close` is the `}` that precedes the `else` keyword
    Else { then_close: Pos },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfChainContext {
    /// Root-to-leaf; the last level owns the block
    pub levels: Vec<ChainLevel>,
    pub branch: Branch,
}

impl IfChainContext {
    /// Number of ancestors above the owning `if`
    pub fn ancestors(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Initializer names in chain order; repeats of a name are marked shadowed
    pub fn variables(&self) -> Vec<(SmolStr, bool)> {
        let mut seen = FxHashSet::default();
        self.levels
            .iter()
            .flat_map(|level| level.names.iter())
            .map(|name| (name.clone(), !seen.insert(name.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructDescriptor {
    Function(FunctionContext),
    Loop(LoopContext),
    Clause(ClauseContext),
    IfChain(IfChainContext),
}

/// Descriptors keyed by node id; read-only once built
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    map: FxHashMap<NodeId, ConstructDescriptor>,
}

impl ContextMap {
    pub fn get(&self, id: NodeId) -> Option<&ConstructDescriptor> {
        self.map.get(&id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn insert(&mut self, id: NodeId, descriptor: ConstructDescriptor) {
        debug_assert!(!self.map.contains_key(&id), "node {id:?} mapped twice");
        self.map.insert(id, descriptor);
    }
}

/// Build the context map of `file`
pub fn discover(file: &File, namespace: &Namespace) -> ContextMap {
    let mut discovery = Discovery {
        namespace,
        contexts: ContextMap::default(),
        ancestors: Vec::new(),
    };
    visit::walk_file(&mut discovery, file);
    discovery.contexts
}

struct Discovery<'a> {
    namespace: &'a Namespace,
    contexts: ContextMap,
    /// One entry per open statement, block or clause; `Some` for `if` statements
    ancestors: Vec<Option<ChainLevel>>,
}

impl Discovery<'_> {
    fn function(&mut self, recv: Option<&FieldList>, ty: &FuncType, body: &Block) {
        let Some(first) = body.first_stmt() else {
            return;
        };
        let params = recv
            .into_iter()
            .chain(std::iter::once(&ty.params))
            .flat_map(FieldList::names)
            .filter(|name| !name.is_blank())
            .map(|name| name.name.clone())
            .collect();
        self.contexts.insert(
            first.id,
            ConstructDescriptor::Function(FunctionContext {
                params,
                results: result_names(ty, self.namespace),
                signature: Span::new(ty.pos, body.lbrace),
            }),
        );
    }

    fn loop_body(&mut self, vars: Vec<SmolStr>, body: &Block) {
        if let Some(first) = body.first_stmt() {
            self.contexts
                .insert(first.id, ConstructDescriptor::Loop(LoopContext { vars }));
        }
    }

    fn if_chain(&mut self, stmt: &Stmt, if_stmt: &IfStmt) -> ChainLevel {
        let mut levels: Vec<ChainLevel> = self
            .ancestors
            .iter()
            .rev()
            .map_while(|frame| frame.clone())
            .collect();
        levels.reverse();
        let level = ChainLevel {
            pos: stmt.pos(),
            names: if_stmt
                .init
                .as_deref()
                .map(assigned_names)
                .unwrap_or_default(),
        };
        levels.push(level.clone());

        if let Some(else_) = &if_stmt.else_
            && let StmtKind::Block(block) = &else_.kind
        {
            self.contexts.insert(
                block.id,
                ConstructDescriptor::IfChain(IfChainContext {
                    levels: levels.clone(),
                    branch: Branch::Else {
                        then_close: if_stmt.then.rbrace,
                    },
                }),
            );
        }
        self.contexts.insert(
            if_stmt.then.id,
            ConstructDescriptor::IfChain(IfChainContext {
                levels,
                branch: Branch::Then,
            }),
        );
        level
    }
}

impl Visitor for Discovery<'_> {
    fn enter_stmt(&mut self, stmt: &Stmt) {
        let frame = match &stmt.kind {
            StmtKind::If(if_stmt) => Some(self.if_chain(stmt, if_stmt)),
            StmtKind::For(for_stmt) => {
                let vars = for_stmt
                    .init
                    .as_deref()
                    .map(assigned_names)
                    .unwrap_or_default();
                self.loop_body(vars, &for_stmt.body);
                None
            }
            StmtKind::Range(range) => {
                let vars = [&range.key, &range.value]
                    .into_iter()
                    .flatten()
                    .filter_map(|x| match x {
                        Expr::Ident(ident) if !ident.is_blank() => Some(ident.name.clone()),
                        _ => None,
                    })
                    .collect();
                self.loop_body(vars, &range.body);
                None
            }
            _ => None,
        };
        self.ancestors.push(frame);
    }

    fn leave_stmt(&mut self, _stmt: &Stmt) {
        self.ancestors.pop();
    }

    fn enter_block(&mut self, _block: &Block) {
        self.ancestors.push(None);
    }

    fn leave_block(&mut self, _block: &Block) {
        self.ancestors.pop();
    }

    fn enter_clause(&mut self, clause: &Clause) {
        self.contexts.insert(
            clause.id,
            ConstructDescriptor::Clause(ClauseContext {
                label: Span::new(clause.span.pos, clause.colon),
            }),
        );
        self.ancestors.push(None);
    }

    fn leave_clause(&mut self, _clause: &Clause) {
        self.ancestors.pop();
    }

    fn visit_func_decl(&mut self, func: &FuncDecl) {
        if let Some(body) = &func.body {
            self.function(func.recv.as_ref(), &func.ty, body);
        }
    }

    fn visit_func_lit(&mut self, func: &FuncLit) {
        self.function(None, &func.ty, &func.body);
    }
}

/// Identifiers assigned by a simple statement, blanks removed
fn assigned_names(stmt: &Stmt) -> Vec<SmolStr> {
    match &stmt.kind {
        StmtKind::Assign(assign) => assign
            .target_names()
            .map(|ident| ident.name.clone())
            .collect(),
        _ => Vec::new(),
    }
}
