//! Pre-order traversal of Go syntax trees.
//!
//! [`Visitor`] hooks are called in source order. Statements, blocks and
//! clauses get paired enter/leave calls so visitors can keep their own
//! ancestor stack; functions get a single call before their body is walked.

use super::ast::*;

/// Visitor trait for Go syntax nodes.
///
/// Default implementations are no-ops.
pub trait Visitor {
    fn enter_stmt(&mut self, _stmt: &Stmt) {}
    fn leave_stmt(&mut self, _stmt: &Stmt) {}
    fn enter_block(&mut self, _block: &Block) {}
    fn leave_block(&mut self, _block: &Block) {}
    fn enter_clause(&mut self, _clause: &Clause) {}
    fn leave_clause(&mut self, _clause: &Clause) {}
    fn visit_func_decl(&mut self, _func: &FuncDecl) {}
    fn visit_func_lit(&mut self, _func: &FuncLit) {}
}

pub fn walk_file<V: Visitor + ?Sized>(v: &mut V, file: &File) {
    for decl in &file.decls {
        match decl {
            Decl::Gen(gen_decl) => walk_gen_decl(v, gen_decl),
            Decl::Func(func) => {
                v.visit_func_decl(func);
                if let Some(body) = &func.body {
                    walk_block(v, body);
                }
            }
        }
    }
}

pub fn walk_gen_decl<V: Visitor + ?Sized>(v: &mut V, decl: &GenDecl) {
    for spec in &decl.specs {
        if let Spec::Value(value) = spec {
            for x in &value.values {
                walk_expr(v, x);
            }
        }
    }
}

pub fn walk_block<V: Visitor + ?Sized>(v: &mut V, block: &Block) {
    v.enter_block(block);
    for stmt in &block.stmts {
        walk_stmt(v, stmt);
    }
    v.leave_block(block);
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    v.enter_stmt(stmt);
    match &stmt.kind {
        StmtKind::Decl(decl) => walk_gen_decl(v, decl),
        StmtKind::Labeled { stmt, .. } => walk_stmt(v, stmt),
        StmtKind::Expr(x) | StmtKind::Go(x) | StmtKind::Defer(x) => walk_expr(v, x),
        StmtKind::Send { chan, value } => {
            walk_expr(v, chan);
            walk_expr(v, value);
        }
        StmtKind::IncDec { x, .. } => walk_expr(v, x),
        StmtKind::Assign(assign) => {
            for x in assign.lhs.iter().chain(&assign.rhs) {
                walk_expr(v, x);
            }
        }
        StmtKind::Return(results) => {
            for x in results {
                walk_expr(v, x);
            }
        }
        StmtKind::Block(block) => walk_block(v, block),
        StmtKind::If(if_stmt) => {
            if let Some(init) = &if_stmt.init {
                walk_stmt(v, init);
            }
            walk_expr(v, &if_stmt.cond);
            walk_block(v, &if_stmt.then);
            if let Some(else_) = &if_stmt.else_ {
                walk_stmt(v, else_);
            }
        }
        StmtKind::Switch(switch) => {
            if let Some(init) = &switch.init {
                walk_stmt(v, init);
            }
            if let Some(tag) = &switch.tag {
                walk_expr(v, tag);
            }
            walk_clauses(v, &switch.body);
        }
        StmtKind::TypeSwitch(switch) => {
            if let Some(init) = &switch.init {
                walk_stmt(v, init);
            }
            walk_stmt(v, &switch.assign);
            walk_clauses(v, &switch.body);
        }
        StmtKind::Select(select) => walk_clauses(v, &select.body),
        StmtKind::For(for_stmt) => {
            if let Some(init) = &for_stmt.init {
                walk_stmt(v, init);
            }
            if let Some(cond) = &for_stmt.cond {
                walk_expr(v, cond);
            }
            if let Some(post) = &for_stmt.post {
                walk_stmt(v, post);
            }
            walk_block(v, &for_stmt.body);
        }
        StmtKind::Range(range) => {
            walk_expr(v, &range.x);
            walk_block(v, &range.body);
        }
        StmtKind::Branch { .. } | StmtKind::Empty => {}
    }
    v.leave_stmt(stmt);
}

fn walk_clauses<V: Visitor + ?Sized>(v: &mut V, body: &ClauseBody) {
    for clause in &body.clauses {
        v.enter_clause(clause);
        match &clause.head {
            ClauseHead::Default => {}
            ClauseHead::Case(list) => {
                for x in list {
                    walk_expr(v, x);
                }
            }
            ClauseHead::Comm(comm) => walk_stmt(v, comm),
        }
        for stmt in &clause.body {
            walk_stmt(v, stmt);
        }
        v.leave_clause(clause);
    }
}

/// Walk an expression looking for function literals
pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, x: &Expr) {
    match x {
        Expr::FuncLit(lit) => {
            v.visit_func_lit(lit);
            walk_block(v, &lit.body);
        }
        Expr::CompositeLit(lit) => {
            for element in &lit.elts {
                if let Some(key) = &element.key {
                    walk_expr(v, key);
                }
                walk_expr(v, &element.value);
            }
        }
        Expr::Paren(inner) | Expr::Star(inner) => walk_expr(v, inner),
        Expr::Selector { x, .. } | Expr::TypeAssert { x, .. } | Expr::Unary { x, .. } => {
            walk_expr(v, x)
        }
        Expr::Index { x, indices } => {
            walk_expr(v, x);
            for index in indices {
                walk_expr(v, index);
            }
        }
        Expr::Slice {
            x, low, high, max, ..
        } => {
            walk_expr(v, x);
            for bound in [low, high, max].into_iter().flatten() {
                walk_expr(v, bound);
            }
        }
        Expr::Call { fun, args, .. } => {
            walk_expr(v, fun);
            for arg in args {
                walk_expr(v, arg);
            }
        }
        Expr::Binary { x, y, .. } => {
            walk_expr(v, x);
            walk_expr(v, y);
        }
        Expr::Ident(_)
        | Expr::BasicLit { .. }
        | Expr::ArrayType { .. }
        | Expr::Ellipsis(_)
        | Expr::StructType(_)
        | Expr::FuncType(_)
        | Expr::InterfaceType(_)
        | Expr::MapType { .. }
        | Expr::ChanType { .. } => {}
    }
}

/// Call `f` on every outermost function literal inside `x`.
///
/// Literals nested in a literal's body are left to `f`.
pub fn for_each_func_lit_mut(x: &mut Expr, f: &mut dyn FnMut(&mut FuncLit)) {
    match x {
        Expr::FuncLit(lit) => f(lit),
        Expr::CompositeLit(lit) => {
            for element in &mut lit.elts {
                if let Some(key) = &mut element.key {
                    for_each_func_lit_mut(key, f);
                }
                for_each_func_lit_mut(&mut element.value, f);
            }
        }
        Expr::Paren(inner) | Expr::Star(inner) => for_each_func_lit_mut(inner, f),
        Expr::Selector { x, .. } | Expr::TypeAssert { x, .. } | Expr::Unary { x, .. } => {
            for_each_func_lit_mut(x, f)
        }
        Expr::Index { x, indices } => {
            for_each_func_lit_mut(x, f);
            for index in indices {
                for_each_func_lit_mut(index, f);
            }
        }
        Expr::Slice {
            x, low, high, max, ..
        } => {
            for_each_func_lit_mut(x, f);
            for bound in [low, high, max].into_iter().flatten() {
                for_each_func_lit_mut(bound, f);
            }
        }
        Expr::Call { fun, args, .. } => {
            for_each_func_lit_mut(fun, f);
            for arg in args {
                for_each_func_lit_mut(arg, f);
            }
        }
        Expr::Binary { x, y, .. } => {
            for_each_func_lit_mut(x, f);
            for_each_func_lit_mut(y, f);
        }
        Expr::Ident(_)
        | Expr::BasicLit { .. }
        | Expr::ArrayType { .. }
        | Expr::Ellipsis(_)
        | Expr::StructType(_)
        | Expr::FuncType(_)
        | Expr::InterfaceType(_)
        | Expr::MapType { .. }
        | Expr::ChanType { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;

    #[derive(Default)]
    struct Counter {
        stmts: usize,
        blocks: usize,
        clauses: usize,
        funcs: Vec<String>,
        lits: usize,
    }

    impl Visitor for Counter {
        fn enter_stmt(&mut self, _stmt: &Stmt) {
            self.stmts += 1;
        }
        fn enter_block(&mut self, _block: &Block) {
            self.blocks += 1;
        }
        fn enter_clause(&mut self, _clause: &Clause) {
            self.clauses += 1;
        }
        fn visit_func_decl(&mut self, func: &FuncDecl) {
            self.funcs.push(func.name.name.to_string());
        }
        fn visit_func_lit(&mut self, _func: &FuncLit) {
            self.lits += 1;
        }
    }

    #[test]
    fn test_walk_reaches_nested_literals() {
        let file = parse_file(
            "package p\nvar h = func() {}\nfunc f(x int) {\nswitch x {\ncase 1:\ng(func() { return })\n}\n}\n",
        )
        .unwrap();
        let mut counter = Counter::default();
        walk_file(&mut counter, &file);
        assert_eq!(counter.funcs, vec!["f"]);
        assert_eq!(counter.lits, 2);
        assert_eq!(counter.clauses, 1);
        // f body, two literal bodies
        assert_eq!(counter.blocks, 3);
        // switch, call, return
        assert_eq!(counter.stmts, 3);
    }

    #[test]
    fn test_for_each_func_lit_mut_stops_at_outermost() {
        let mut file =
            parse_file("package p\nvar v = run(func() { _ = func() {} }, []any{func() {}})\n").unwrap();
        let Decl::Gen(decl) = &mut file.decls[0] else {
            panic!("expected var decl");
        };
        let Spec::Value(spec) = &mut decl.specs[0] else {
            panic!("expected value spec");
        };
        let mut seen = 0;
        for_each_func_lit_mut(&mut spec.values[0], &mut |lit| {
            seen += 1;
            lit.body.stmts.clear();
        });
        assert_eq!(seen, 2);
    }
}
