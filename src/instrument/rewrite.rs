//! The tree-rewriting pass.
//!
//! A single pre-order pass over a parsed file that splices trace calls into
//! every block, using the read-only [`ContextMap`] built beforehand. Blocks are
//! rebuilt rather than patched: each statement list is taken out of its
//! block, expanded with insertions, and put back.
//!
//! Per block the order is fixed:
//!
//! 1. construct prologue (function entry, loop variables, or if-chain
//!    conditions followed by chain variables)
//! 2. for every direct child: its statement trace, the child itself, then
//!    traces of the variables it binds
//!
//! Clause bodies get the clause label as their prologue.

use smol_str::SmolStr;

use crate::base::constants::TAB_WIDTH;
use crate::base::{NodeId, Pos, Span};
use crate::syntax::SourceText;
use crate::syntax::ast::*;
use crate::syntax::visit::for_each_func_lit_mut;

use super::builder::{TraceBuilder, TraceCall, quote};
use super::config::InstrumentationConfig;
use super::context::{
    Branch, ClauseContext, ConstructDescriptor, ContextMap, FunctionContext, IfChainContext,
    LoopContext,
};
use super::normalize::normalize_results;

/// What one rewrite inserted; merged across files by callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Linkage {
    /// The support library is referenced by the rewritten file
    pub required: bool,
    pub insertions: usize,
}

impl Linkage {
    fn record(&mut self, count: usize) {
        if count > 0 {
            self.insertions += count;
            self.required = true;
        }
    }

    pub fn merge(self, other: Linkage) -> Linkage {
        Linkage {
            required: self.required || other.required,
            insertions: self.insertions + other.insertions,
        }
    }
}

pub struct Rewriter<'a> {
    config: &'a InstrumentationConfig,
    source: &'a SourceText,
    filename: &'a str,
    contexts: &'a ContextMap,
    builder: TraceBuilder<'a>,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        config: &'a InstrumentationConfig,
        source: &'a SourceText,
        filename: &'a str,
        contexts: &'a ContextMap,
    ) -> Self {
        Self {
            config,
            source,
            filename,
            contexts,
            builder: TraceBuilder::new(&config.namespace, &config.display),
        }
    }

    /// Rewrite `file` in place
    pub fn rewrite_file(&self, file: &mut File) -> Linkage {
        let mut linkage = Linkage::default();
        for decl in std::mem::take(&mut file.decls) {
            match decl {
                Decl::Func(mut func) => {
                    if let Some(body) = &mut func.body {
                        self.function(&mut func.ty, body, &mut linkage);
                    }
                    file.decls.push(Decl::Func(func));
                }
                Decl::Gen(decl) if matches!(decl.keyword, DeclKeyword::Var | DeclKeyword::Const) => {
                    self.package_values(decl, &mut file.decls, &mut linkage);
                }
                other => file.decls.push(other),
            }
        }
        if linkage.required
            && let Some(path) = self.config.namespace.import_path()
        {
            add_import(file, &path);
        }
        linkage
    }

    /// A package-level `var`/`const` group: statement trace before, one variable trace per name after
    fn package_values(&self, mut decl: GenDecl, out: &mut Vec<Decl>, linkage: &mut Linkage) {
        self.value_exprs(&mut decl, linkage);
        let categories = self.config.categories;
        if categories.statement {
            let mut trace = self.builder.package_decl(&self.statement_trace(decl.span.pos));
            *trace.blank_before_mut() = std::mem::take(&mut decl.blank_before);
            out.push(trace);
            linkage.record(1);
        }
        let names: Vec<SmolStr> = if categories.variable {
            decl.value_names()
                .filter(|name| !name.is_blank())
                .map(|name| name.name.clone())
                .collect()
        } else {
            Vec::new()
        };
        out.push(Decl::Gen(decl));
        linkage.record(names.len());
        out.extend(
            names
                .into_iter()
                .map(|name| self.builder.package_decl(&TraceCall::variable(name))),
        );
    }

    fn function(&self, ty: &mut FuncType, body: &mut Block, linkage: &mut Linkage) {
        if self.config.categories.call {
            normalize_results(ty, &self.config.namespace);
        }
        self.block(body, linkage);
    }

    fn block(&self, block: &mut Block, linkage: &mut Linkage) {
        let stmts = std::mem::take(&mut block.stmts);
        let mut rebuilt = Vec::with_capacity(stmts.len());
        match stmts.first().and_then(|first| self.contexts.get(first.id)) {
            Some(ConstructDescriptor::Function(ctx)) => self.function_entry(ctx, &mut rebuilt),
            Some(ConstructDescriptor::Loop(ctx)) => self.loop_entry(ctx, &mut rebuilt),
            _ => {}
        }
        if let Some(ConstructDescriptor::IfChain(ctx)) = self.contexts.get(block.id) {
            self.chain_entry(ctx, &mut rebuilt);
        }
        linkage.record(rebuilt.len());
        rebuilt.extend(self.stmt_list(stmts, linkage));
        block.stmts = rebuilt;
    }

    fn stmt_list(&self, stmts: Vec<Stmt>, linkage: &mut Linkage) -> Vec<Stmt> {
        let categories = self.config.categories;
        let mut out = Vec::with_capacity(stmts.len());
        for mut stmt in stmts {
            self.stmt(&mut stmt, linkage);
            if categories.statement && !matches!(stmt.kind, StmtKind::Block(_) | StmtKind::Empty) {
                let mut trace = self.builder.stmt(&self.statement_trace(stmt.pos()));
                trace.blank_before = std::mem::take(&mut stmt.blank_before);
                trace.comments.leading = std::mem::take(&mut stmt.comments.leading);
                out.push(trace);
                linkage.record(1);
            }
            let bound = if categories.variable {
                bound_names(&stmt)
            } else {
                Vec::new()
            };
            linkage.record(bound.len());
            out.push(stmt);
            out.extend(
                bound
                    .into_iter()
                    .map(|name| self.builder.stmt(&TraceCall::variable(name))),
            );
        }
        out
    }

    /// Rewrite what is nested inside `stmt`
    fn stmt(&self, stmt: &mut Stmt, linkage: &mut Linkage) {
        match &mut stmt.kind {
            StmtKind::Decl(decl) => self.value_exprs(decl, linkage),
            StmtKind::Labeled { stmt, .. } => self.stmt(stmt, linkage),
            StmtKind::Expr(x) | StmtKind::Go(x) | StmtKind::Defer(x) => self.expr(x, linkage),
            StmtKind::Send { chan, value } => {
                self.expr(chan, linkage);
                self.expr(value, linkage);
            }
            StmtKind::IncDec { x, .. } => self.expr(x, linkage),
            StmtKind::Assign(assign) => {
                for x in assign.lhs.iter_mut().chain(assign.rhs.iter_mut()) {
                    self.expr(x, linkage);
                }
            }
            StmtKind::Return(results) => {
                for x in results {
                    self.expr(x, linkage);
                }
            }
            StmtKind::Block(block) => self.block(block, linkage),
            StmtKind::If(if_stmt) => {
                if let Some(init) = &mut if_stmt.init {
                    self.stmt(init, linkage);
                }
                self.expr(&mut if_stmt.cond, linkage);
                self.block(&mut if_stmt.then, linkage);
                if let Some(else_) = &mut if_stmt.else_ {
                    self.stmt(else_, linkage);
                }
            }
            StmtKind::Switch(switch) => {
                if let Some(init) = &mut switch.init {
                    self.stmt(init, linkage);
                }
                if let Some(tag) = &mut switch.tag {
                    self.expr(tag, linkage);
                }
                self.clauses(&mut switch.body, linkage);
            }
            StmtKind::TypeSwitch(switch) => {
                if let Some(init) = &mut switch.init {
                    self.stmt(init, linkage);
                }
                self.stmt(&mut switch.assign, linkage);
                self.clauses(&mut switch.body, linkage);
            }
            StmtKind::Select(select) => self.clauses(&mut select.body, linkage),
            StmtKind::For(for_stmt) => {
                if let Some(init) = &mut for_stmt.init {
                    self.stmt(init, linkage);
                }
                if let Some(cond) = &mut for_stmt.cond {
                    self.expr(cond, linkage);
                }
                if let Some(post) = &mut for_stmt.post {
                    self.stmt(post, linkage);
                }
                self.block(&mut for_stmt.body, linkage);
            }
            StmtKind::Range(range) => {
                self.expr(&mut range.x, linkage);
                self.block(&mut range.body, linkage);
            }
            StmtKind::Branch { .. } | StmtKind::Empty => {}
        }
    }

    fn clauses(&self, body: &mut ClauseBody, linkage: &mut Linkage) {
        for clause in &mut body.clauses {
            match &mut clause.head {
                ClauseHead::Default => {}
                ClauseHead::Case(list) => {
                    for x in list {
                        self.expr(x, linkage);
                    }
                }
                ClauseHead::Comm(comm) => self.stmt(comm, linkage),
            }
            let stmts = std::mem::take(&mut clause.body);
            let mut rebuilt = Vec::with_capacity(stmts.len() + 1);
            if self.config.categories.clause
                && let Some(ConstructDescriptor::Clause(ctx)) = self.contexts.get(clause.id)
            {
                rebuilt.push(self.builder.stmt(&self.clause_label(ctx)));
                linkage.record(1);
            }
            // clause bodies get the variable traces of a block body as well
            rebuilt.extend(self.stmt_list(stmts, linkage));
            clause.body = rebuilt;
        }
    }

    fn value_exprs(&self, decl: &mut GenDecl, linkage: &mut Linkage) {
        for spec in &mut decl.specs {
            if let Spec::Value(value) = spec {
                for x in &mut value.values {
                    self.expr(x, linkage);
                }
            }
        }
    }

    fn expr(&self, x: &mut Expr, linkage: &mut Linkage) {
        for_each_func_lit_mut(x, &mut |lit| self.function(&mut lit.ty, &mut lit.body, linkage));
    }

    fn function_entry(&self, ctx: &FunctionContext, out: &mut Vec<Stmt>) {
        if !self.config.categories.call {
            return;
        }
        out.extend(
            ctx.params
                .iter()
                .map(|name| self.builder.stmt(&TraceCall::variable(name.clone()))),
        );
        let signature = squash(self.source.span_text(ctx.signature));
        out.push(self.builder.stmt(&TraceCall::Call {
            signature: signature.clone(),
        }));
        // deferred calls run last-in first-out
        out.extend(
            ctx.results
                .iter()
                .rev()
                .map(|name| self.builder.deferred(&TraceCall::variable(name.clone()))),
        );
        out.push(self.builder.deferred(&TraceCall::Return { signature }));
    }

    fn loop_entry(&self, ctx: &LoopContext, out: &mut Vec<Stmt>) {
        if !self.config.categories.variable {
            return;
        }
        out.extend(
            ctx.vars
                .iter()
                .map(|name| self.builder.stmt(&TraceCall::variable(name.clone()))),
        );
    }

    fn chain_entry(&self, ctx: &IfChainContext, out: &mut Vec<Stmt>) {
        if self.config.categories.statement {
            let conditions = match ctx.branch {
                Branch::Then if ctx.ancestors() == 0 => Vec::new(),
                Branch::Then => ctx.levels.iter().map(|level| level.pos).collect(),
                Branch::Else { then_close } => ctx
                    .levels
                    .iter()
                    .map(|level| level.pos)
                    .chain(std::iter::once(then_close))
                    .collect(),
            };
            out.extend(
                conditions
                    .into_iter()
                    .map(|pos| self.builder.stmt(&self.statement_trace(pos))),
            );
        }
        if self.config.categories.variable {
            out.extend(ctx.variables().into_iter().map(|(name, shadowed)| {
                let call = if shadowed {
                    TraceCall::shadowed(name)
                } else {
                    TraceCall::variable(name)
                };
                self.builder.stmt(&call)
            }));
        }
    }

    fn clause_label(&self, ctx: &ClauseContext) -> TraceCall {
        let line = self.source.fragment_line(ctx.label.pos);
        let indent = &line[..line.len() - line.trim_start().len()];
        let head = squash(self.source.span_text(ctx.label));
        TraceCall::statement(
            format!("{}{head}:", expand_tabs(indent)),
            self.location(ctx.label.pos),
        )
    }

    /// The physical line at `pos` with its location suffix
    fn statement_trace(&self, pos: Pos) -> TraceCall {
        TraceCall::statement(
            expand_tabs(self.source.fragment_line(pos)),
            self.location(pos),
        )
    }

    fn location(&self, pos: Pos) -> String {
        format!(" [ {}:{} ]", self.filename, self.source.line_col(pos))
    }
}

/// Names a statement binds that get a trace right after it
fn bound_names(stmt: &Stmt) -> Vec<SmolStr> {
    match &stmt.kind {
        StmtKind::Decl(decl) if decl.keyword == DeclKeyword::Var => decl
            .value_names()
            .filter(|name| !name.is_blank())
            .map(|name| name.name.clone())
            .collect(),
        StmtKind::Assign(assign) if assign.is_simple() => assign
            .target_names()
            .map(|name| name.name.clone())
            .collect(),
        _ => Vec::new(),
    }
}

/// Import `path` unless the file already does; returns whether an import was added
pub fn add_import(file: &mut File, path: &str) -> bool {
    if file.imports().any(|spec| spec.path_value() == path) {
        return false;
    }
    let spec = Spec::Import(ImportSpec {
        name: None,
        path: quote(path),
        comments: Comments::default(),
        blank_before: false,
    });
    let is_import = |decl: &Decl| matches!(decl, Decl::Gen(g) if g.keyword == DeclKeyword::Import);
    let last_import = file.decls.iter().rposition(is_import);
    let group = file.decls.iter_mut().rev().find_map(|decl| match decl {
        Decl::Gen(g) if g.keyword == DeclKeyword::Import && g.grouped => Some(g),
        _ => None,
    });
    if let Some(group) = group {
        group.specs.push(spec);
        return true;
    }
    let at = last_import.map_or(0, |i| i + 1);
    file.decls.insert(
        at,
        Decl::Gen(GenDecl {
            id: NodeId::SYNTHETIC,
            span: Span::NONE,
            keyword: DeclKeyword::Import,
            grouped: false,
            specs: vec![spec],
            comments: Comments::default(),
            blank_before: last_import.is_none(),
        }),
    );
    if let Some(next) = file.decls.get_mut(at + 1) {
        *next.blank_before_mut() = true;
    }
    true
}

/// Collapse every whitespace run to one space and trim the ends
fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn expand_tabs(text: &str) -> String {
    text.replace('\t', &" ".repeat(TAB_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash() {
        assert_eq!(squash("func (r *T)\n\tf(a int) "), "func (r *T) f(a int)");
        assert_eq!(squash(""), "");
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\t\tx := 1"), "        x := 1");
    }

    #[test]
    fn test_bound_names_skip_blank_and_compound() {
        let file = crate::parser::parse_file(
            "package p\nfunc f() {\n\t_, b := g()\n\tc += 1\n\tvar d, _ int\n\tconst e = 1\n}\n",
        )
        .unwrap();
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected function");
        };
        let names: Vec<Vec<SmolStr>> = func
            .body
            .as_ref()
            .unwrap()
            .stmts
            .iter()
            .map(bound_names)
            .collect();
        assert_eq!(
            names,
            vec![vec![SmolStr::new("b")], vec![], vec![SmolStr::new("d")], vec![]]
        );
    }

    #[test]
    fn test_linkage_merge() {
        let mut a = Linkage::default();
        a.record(0);
        assert!(!a.required);
        a.record(2);
        let merged = a.merge(Linkage::default());
        assert!(merged.required);
        assert_eq!(merged.insertions, 2);
    }
}
