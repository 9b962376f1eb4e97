//! Canonical printer for Go syntax trees
//!
//! Prints a tree back to source deterministically: tab indentation, one
//! statement per line, single spaces around binary operators. The layout
//! decisions the source made and the tree remembers are kept: blank lines
//! between items (at most one), line breaks inside composite literals and
//! argument lists, empty blocks whose braces sat on different lines, and
//! attached comments. Struct fields, grouped specs, keyed elements and
//! trailing comments on consecutive lines are aligned in columns.
//!
//! Printing the same tree twice yields the same bytes; printing a freshly
//! parsed tree and parsing the result again is a fixed point.

mod align;

#[cfg(test)]
mod tests;

use crate::parser::{SyntaxError, SyntaxKind, parse_file};
use crate::syntax::ast::*;
use align::{CELL, SECTION, align};

/// Keys up to this width always align with their neighbours
const SMALL_KEY: usize = 40;
/// Neighbouring keys whose width differs by this factor start a new column
const KEY_RATIO: f64 = 2.5;

pub fn print_file(file: &File) -> String {
    let mut printer = Printer::new(0);
    printer.file(file);
    align(&printer.out)
}

/// Parse and reprint `source`
pub fn format_source(source: &str) -> Result<String, SyntaxError> {
    Ok(print_file(&parse_file(source)?))
}

struct Printer {
    out: String,
    level: usize,
}

impl Printer {
    fn new(level: usize) -> Self {
        Self {
            out: String::new(),
            level,
        }
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    fn indent(&mut self) {
        for _ in 0..self.level {
            self.out.push('\t');
        }
    }

    /// End an alignable cell
    fn cell(&mut self) {
        self.out.push(CELL);
    }

    /// Keep the next line out of the columns above it
    fn section(&mut self) {
        self.out.push(SECTION);
    }

    /// Whether anything written since `start` broke the line
    fn spans_lines(&self, start: usize) -> bool {
        self.out[start..].contains('\n')
    }

    /// Break the line inside a bracketed list; the first break indents the rest
    fn list_break(&mut self, brk: LineBreak, indented: &mut bool) {
        if !*indented {
            self.level += 1;
            *indented = true;
        }
        self.newline();
        if brk == LineBreak::Blank {
            self.newline();
        }
    }

    /// Whole-line comments at the current level
    fn leading(&mut self, comments: &[Comment]) {
        for comment in comments {
            self.indent();
            self.write(&comment.text);
            self.newline();
            if comment.blank_after {
                self.newline();
            }
        }
    }

    /// Comments ending the line, aligned with those of neighbouring lines
    fn trailing(&mut self, comments: &[Comment]) {
        for (i, comment) in comments.iter().enumerate() {
            if i == 0 {
                self.cell();
            } else {
                self.write(" ");
            }
            self.write(&comment.text);
        }
    }

    /// Comments followed by more code on the same line
    fn inline_comments(&mut self, comments: &[Comment]) {
        for comment in comments {
            self.write(" ");
            self.write(&comment.text);
        }
    }

    // =========================================================================
    // File and declarations
    // =========================================================================

    fn file(&mut self, file: &File) {
        self.leading(&file.doc);
        self.write("package ");
        self.write(file.package.as_str());
        self.newline();
        let mut spanned = false;
        for (i, decl) in file.decls.iter().enumerate() {
            if i == 0 || decl.blank_before() {
                self.newline();
            }
            if spanned {
                self.section();
            }
            spanned = self.decl(decl);
        }
        if !file.trailing.is_empty() {
            self.newline();
            self.leading(&file.trailing);
        }
    }

    /// A declaration and its comments; returns whether the declaration spanned lines
    fn decl(&mut self, decl: &Decl) -> bool {
        let (comments, start) = match decl {
            Decl::Gen(d) => {
                self.leading(&d.comments.leading);
                let start = self.out.len();
                self.gen_decl(d);
                (&d.comments, start)
            }
            Decl::Func(f) => {
                self.leading(&f.comments.leading);
                let start = self.out.len();
                self.func_decl(f);
                (&f.comments, start)
            }
        };
        let spanned = self.spans_lines(start);
        self.trailing(&comments.trailing);
        self.newline();
        spanned
    }

    fn gen_decl(&mut self, decl: &GenDecl) {
        self.write(decl.keyword.as_str());
        if !decl.grouped && decl.specs.len() == 1 {
            self.write(" ");
            self.spec(&decl.specs[0]);
            return;
        }
        if decl.specs.is_empty() {
            self.write(" ()");
            return;
        }
        self.write(" (");
        self.newline();
        self.level += 1;
        let aligned = decl.specs.len() > 1;
        let keep_type = keep_type_column(&decl.specs);
        let mut spanned = false;
        for (i, spec) in decl.specs.iter().enumerate() {
            if i > 0 && spec.blank_before() {
                self.newline();
            }
            if spanned {
                self.section();
            }
            self.leading(&spec.comments().leading);
            self.indent();
            let start = self.out.len();
            if aligned {
                self.aligned_spec(spec, keep_type[i]);
            } else {
                self.spec(spec);
            }
            spanned = self.spans_lines(start);
            self.trailing(&spec.comments().trailing);
            self.newline();
        }
        self.level -= 1;
        self.indent();
        self.write(")");
    }

    fn spec(&mut self, spec: &Spec) {
        match spec {
            Spec::Import(import) => {
                if let Some(name) = &import.name {
                    self.write(name.as_str());
                    self.write(" ");
                }
                self.write(&import.path);
            }
            Spec::Value(value) => {
                self.idents(&value.names);
                if let Some(ty) = &value.ty {
                    self.write(" ");
                    self.expr(ty);
                }
                if !value.values.is_empty() {
                    self.write(" = ");
                    self.exprs(&value.values);
                }
            }
            Spec::Type(ty) => {
                self.write(ty.name.as_str());
                if let Some(params) = &ty.type_params {
                    self.type_params(params);
                }
                self.write(if ty.alias { " = " } else { " " });
                self.expr(&ty.ty);
            }
        }
    }

    /// A spec of a group, its parts ending cells so the group lines up
    fn aligned_spec(&mut self, spec: &Spec, keep_type: bool) {
        match spec {
            Spec::Import(_) => self.spec(spec),
            Spec::Type(ty) => {
                self.write(ty.name.as_str());
                if let Some(params) = &ty.type_params {
                    self.type_params(params);
                }
                self.cell();
                if ty.alias {
                    self.write("= ");
                }
                self.expr(&ty.ty);
            }
            Spec::Value(value) => {
                // the comment column comes third whatever the spec leaves out
                let mut columns = 3;
                self.idents(&value.names);
                if value.ty.is_some() || keep_type {
                    self.cell();
                    columns -= 1;
                }
                if let Some(ty) = &value.ty {
                    self.expr(ty);
                }
                if !value.values.is_empty() {
                    self.cell();
                    self.write("= ");
                    self.exprs(&value.values);
                    columns -= 1;
                }
                if !value.comments.trailing.is_empty() {
                    for _ in 1..columns {
                        self.cell();
                    }
                }
            }
        }
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.write("func ");
        if let Some(recv) = &func.recv {
            self.params(recv);
            self.write(" ");
        }
        self.write(func.name.as_str());
        if let Some(params) = &func.ty.type_params {
            self.type_params(params);
        }
        self.signature(&func.ty);
        if let Some(body) = &func.body {
            self.write(" ");
            self.block(body);
        }
    }

    // =========================================================================
    // Signatures and fields
    // =========================================================================

    fn signature(&mut self, ty: &FuncType) {
        self.params(&ty.params);
        let Some(results) = &ty.results else {
            return;
        };
        if results.is_empty() {
            return;
        }
        self.write(" ");
        if results.delimited || results.is_named() || results.fields.len() != 1 {
            self.params(results);
        } else {
            self.expr(&results.fields[0].ty);
        }
    }

    fn params(&mut self, list: &FieldList) {
        self.write("(");
        self.inline_fields(list);
        self.write(")");
    }

    fn type_params(&mut self, list: &FieldList) {
        self.write("[");
        self.inline_fields(list);
        self.write("]");
    }

    fn inline_fields(&mut self, list: &FieldList) {
        for (i, field) in list.fields.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.field(field);
        }
    }

    fn field(&mut self, field: &Field) {
        if !field.names.is_empty() {
            self.idents(&field.names);
            self.write(" ");
        }
        self.expr(&field.ty);
        if let Some(tag) = &field.tag {
            self.write(" ");
            self.write(tag);
        }
    }

    fn field_lines(&mut self, list: &FieldList, method_set: bool) {
        self.write("{");
        self.newline();
        self.level += 1;
        let aligned = list.fields.len() > 1;
        let mut spanned = false;
        for (i, field) in list.fields.iter().enumerate() {
            if i > 0 && field.blank_before {
                self.newline();
            }
            if spanned {
                self.section();
            }
            self.leading(&field.comments.leading);
            self.indent();
            let start = self.out.len();
            match (&field.ty, field.names.first()) {
                (Expr::FuncType(sig), Some(name)) if method_set => {
                    self.write(name.as_str());
                    self.signature(sig);
                }
                _ if method_set || !aligned => self.field(field),
                _ => self.struct_field(field),
            }
            spanned = self.spans_lines(start);
            self.trailing(&field.comments.trailing);
            self.newline();
        }
        self.level -= 1;
        self.indent();
        self.write("}");
    }

    /// Names, type and tag in columns; embedded types sit in the name column
    fn struct_field(&mut self, field: &Field) {
        let mut columns = if field.names.is_empty() {
            self.expr(&field.ty);
            2
        } else {
            self.idents(&field.names);
            self.cell();
            self.expr(&field.ty);
            1
        };
        if let Some(tag) = &field.tag {
            for _ in 0..columns {
                self.cell();
            }
            self.write(tag);
            columns = 0;
        }
        if !field.comments.trailing.is_empty() {
            for _ in 1..columns {
                self.cell();
            }
        }
    }

    fn idents(&mut self, idents: &[Ident]) {
        for (i, ident) in idents.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(ident.as_str());
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn block(&mut self, block: &Block) {
        if block.stmts.is_empty() && block.dangling.is_empty() {
            if block.multiline {
                self.write("{");
                self.newline();
                self.indent();
                self.write("}");
            } else {
                self.write("{}");
            }
            return;
        }
        self.write("{");
        self.newline();
        self.level += 1;
        self.stmt_list(&block.stmts);
        self.leading(&block.dangling);
        self.level -= 1;
        self.indent();
        self.write("}");
    }

    fn stmt_list(&mut self, stmts: &[Stmt]) {
        let mut spanned = false;
        for (i, stmt) in stmts.iter().enumerate() {
            if i > 0 && stmt.blank_before {
                self.newline();
            }
            if spanned {
                self.section();
            }
            self.leading(&stmt.comments.leading);
            let start = self.out.len();
            self.stmt_line(stmt);
            spanned = self.spans_lines(start);
            self.trailing(&stmt.comments.trailing);
            self.newline();
        }
    }

    /// A statement on its own line; labels sit one level out
    fn stmt_line(&mut self, stmt: &Stmt) {
        if let StmtKind::Labeled { label, stmt: inner } = &stmt.kind {
            let level = self.level;
            self.level = level.saturating_sub(1);
            self.indent();
            self.level = level;
            self.write(label.as_str());
            self.write(":");
            if inner.kind != StmtKind::Empty {
                self.newline();
                self.stmt_line(inner);
            }
            return;
        }
        self.indent();
        self.stmt(stmt);
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Decl(decl) => self.gen_decl(decl),
            StmtKind::Labeled { label, stmt } => {
                self.write(label.as_str());
                self.write(":");
                if stmt.kind != StmtKind::Empty {
                    self.write(" ");
                    self.stmt(stmt);
                }
            }
            StmtKind::Expr(x) => self.expr(x),
            StmtKind::Send { chan, value } => {
                self.expr(chan);
                self.write(" <- ");
                self.expr(value);
            }
            StmtKind::IncDec { x, op } => {
                self.expr(x);
                self.write(op.text());
            }
            StmtKind::Assign(assign) => {
                self.exprs(&assign.lhs);
                self.write(" ");
                self.write(assign.op.text());
                self.write(" ");
                self.exprs(&assign.rhs);
            }
            StmtKind::Go(call) => {
                self.write("go ");
                self.expr(call);
            }
            StmtKind::Defer(call) => {
                self.write("defer ");
                self.expr(call);
            }
            StmtKind::Return(results) => {
                self.write("return");
                if !results.is_empty() {
                    self.write(" ");
                    self.exprs(results);
                }
            }
            StmtKind::Branch { op, label } => {
                self.write(op.text());
                if let Some(label) = label {
                    self.write(" ");
                    self.write(label.as_str());
                }
            }
            StmtKind::Block(block) => self.block(block),
            StmtKind::If(if_stmt) => self.if_stmt(if_stmt),
            StmtKind::Switch(switch) => {
                self.write("switch ");
                if let Some(init) = &switch.init {
                    self.stmt(init);
                    self.write("; ");
                }
                if let Some(tag) = &switch.tag {
                    self.expr(tag);
                    self.write(" ");
                }
                self.clause_body(&switch.body);
            }
            StmtKind::TypeSwitch(switch) => {
                self.write("switch ");
                if let Some(init) = &switch.init {
                    self.stmt(init);
                    self.write("; ");
                }
                self.stmt(&switch.assign);
                self.write(" ");
                self.clause_body(&switch.body);
            }
            StmtKind::Select(select) => {
                self.write("select ");
                self.clause_body(&select.body);
            }
            StmtKind::For(for_stmt) => {
                self.write("for ");
                if for_stmt.init.is_some() || for_stmt.post.is_some() {
                    if let Some(init) = &for_stmt.init {
                        self.stmt(init);
                    }
                    self.write("; ");
                    if let Some(cond) = &for_stmt.cond {
                        self.expr(cond);
                    }
                    self.write("; ");
                    if let Some(post) = &for_stmt.post {
                        self.stmt(post);
                        self.write(" ");
                    }
                } else if let Some(cond) = &for_stmt.cond {
                    self.expr(cond);
                    self.write(" ");
                }
                self.block(&for_stmt.body);
            }
            StmtKind::Range(range) => {
                self.write("for ");
                if let Some(key) = &range.key {
                    self.expr(key);
                    if let Some(value) = &range.value {
                        self.write(", ");
                        self.expr(value);
                    }
                    self.write(" ");
                    self.write(range.op.unwrap_or(SyntaxKind::COLON_EQ).text());
                    self.write(" ");
                }
                self.write("range ");
                self.expr(&range.x);
                self.write(" ");
                self.block(&range.body);
            }
            StmtKind::Empty => {}
        }
    }

    fn if_stmt(&mut self, if_stmt: &IfStmt) {
        self.write("if ");
        if let Some(init) = &if_stmt.init {
            self.stmt(init);
            self.write("; ");
        }
        self.expr(&if_stmt.cond);
        self.write(" ");
        self.block(&if_stmt.then);
        if let Some(else_) = &if_stmt.else_ {
            self.write(" else ");
            self.stmt(else_);
        }
    }

    fn clause_body(&mut self, body: &ClauseBody) {
        self.write("{");
        self.newline();
        for clause in &body.clauses {
            self.leading(&clause.comments.leading);
            self.indent();
            match &clause.head {
                ClauseHead::Default => self.write("default:"),
                ClauseHead::Case(list) => {
                    self.write("case ");
                    self.exprs(list);
                    self.write(":");
                }
                ClauseHead::Comm(comm) => {
                    self.write("case ");
                    self.stmt(comm);
                    self.write(":");
                }
            }
            self.trailing(&clause.comments.trailing);
            self.newline();
            self.level += 1;
            self.stmt_list(&clause.body);
            self.level -= 1;
        }
        self.leading(&body.dangling);
        self.indent();
        self.write("}");
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn exprs(&mut self, exprs: &[Expr]) {
        for (i, x) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(x);
        }
    }

    fn render(&self, x: &Expr) -> String {
        let mut printer = Printer::new(self.level);
        printer.expr(x);
        printer.out
    }

    fn expr(&mut self, x: &Expr) {
        match x {
            Expr::Ident(ident) => self.write(ident.as_str()),
            Expr::BasicLit { value, .. } => self.write(value),
            Expr::CompositeLit(lit) => self.composite(lit),
            Expr::FuncLit(lit) => {
                self.write("func");
                self.signature(&lit.ty);
                self.write(" ");
                self.block(&lit.body);
            }
            Expr::Paren(inner) => {
                self.write("(");
                self.expr(inner);
                self.write(")");
            }
            Expr::Selector { x, sel } => {
                self.expr(x);
                self.write(".");
                self.write(sel.as_str());
            }
            Expr::Index { x, indices } => {
                self.expr(x);
                self.write("[");
                self.exprs(indices);
                self.write("]");
            }
            Expr::Slice {
                x,
                low,
                high,
                max,
                full,
            } => {
                self.expr(x);
                self.write("[");
                if let Some(low) = low {
                    self.expr(low);
                }
                self.write(":");
                if let Some(high) = high {
                    self.expr(high);
                }
                if *full {
                    self.write(":");
                    if let Some(max) = max {
                        self.expr(max);
                    }
                }
                self.write("]");
            }
            Expr::TypeAssert { x, ty } => {
                self.expr(x);
                self.write(".(");
                match ty {
                    Some(ty) => self.expr(ty),
                    None => self.write("type"),
                }
                self.write(")");
            }
            Expr::Call {
                fun,
                args,
                ellipsis,
                layout,
            } => {
                self.expr(fun);
                self.write("(");
                let mut indented = false;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.write(",");
                    }
                    match layout.before(i) {
                        LineBreak::None if i > 0 => self.write(" "),
                        LineBreak::None => {}
                        brk => {
                            self.list_break(brk, &mut indented);
                            self.indent();
                        }
                    }
                    self.expr(arg);
                }
                if *ellipsis {
                    self.write("...");
                }
                self.close_list(layout.closing, indented, &[], ")");
            }
            Expr::Star(inner) => {
                self.write("*");
                self.expr(inner);
            }
            Expr::Unary { op, x } => {
                let operand = self.render(x);
                self.write(op.text());
                // keep `- -x` from printing as a decrement and `&^x` as and-not
                let glued = match op {
                    SyntaxKind::MINUS | SyntaxKind::ARROW => operand.starts_with('-'),
                    SyntaxKind::PLUS => operand.starts_with('+'),
                    SyntaxKind::AMP => operand.starts_with('^') || operand.starts_with('&'),
                    _ => false,
                };
                if glued {
                    self.write(" ");
                }
                self.write(&operand);
            }
            Expr::Binary { op, x, y } => {
                self.expr(x);
                self.write(" ");
                self.write(op.text());
                self.write(" ");
                self.expr(y);
            }
            Expr::ArrayType { len, elt } => {
                self.write("[");
                if let Some(len) = len {
                    self.expr(len);
                }
                self.write("]");
                self.expr(elt);
            }
            Expr::Ellipsis(elt) => {
                self.write("...");
                if let Some(elt) = elt {
                    self.expr(elt);
                }
            }
            Expr::StructType(fields) => {
                if fields.is_empty() {
                    self.write("struct{}");
                } else {
                    self.write("struct ");
                    self.field_lines(fields, false);
                }
            }
            Expr::FuncType(ty) => {
                self.write("func");
                self.signature(ty);
            }
            Expr::InterfaceType(fields) => {
                if fields.is_empty() {
                    self.write("interface{}");
                } else {
                    self.write("interface ");
                    self.field_lines(fields, true);
                }
            }
            Expr::MapType { key, value } => {
                self.write("map[");
                self.expr(key);
                self.write("]");
                self.expr(value);
            }
            Expr::ChanType { dir, value } => {
                self.write(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.expr(value);
            }
        }
    }

    /// Close a bracketed list, on a line of its own when the source had it there
    fn close_list(
        &mut self,
        own_line: bool,
        indented: bool,
        comments: &[Comment],
        bracket: &str,
    ) {
        if own_line {
            self.write(",");
            self.trailing(comments);
        } else {
            self.inline_comments(comments);
        }
        if indented {
            self.level -= 1;
        }
        if own_line {
            self.newline();
            self.indent();
        }
        self.write(bracket);
    }

    fn composite(&mut self, lit: &CompositeLit) {
        if let Some(ty) = &lit.ty {
            self.expr(ty);
        }
        self.write("{");
        let Some(last) = lit.elts.last() else {
            self.write("}");
            return;
        };
        let mut indented = false;
        let mut keys = KeyColumn::default();
        let mut last_break: Option<usize> = None;
        for (i, element) in lit.elts.iter().enumerate() {
            let brk = match lit.layout.before(i) {
                LineBreak::None if !element.comments.leading.is_empty() => LineBreak::Line,
                brk => brk,
            };
            if i > 0 {
                self.write(",");
                let previous = &lit.elts[i - 1].comments.trailing;
                if brk == LineBreak::None {
                    self.inline_comments(previous);
                } else {
                    self.trailing(previous);
                }
            }
            if brk != LineBreak::None {
                self.list_break(brk, &mut indented);
            }

            let key = element.key.as_ref().map(|key| self.render(key));
            let value = self.render(&element.value);
            let size = match &key {
                _ if value.contains('\n') => 0,
                Some(key) if key.contains('\n') => 0,
                Some(key) => key.chars().count(),
                None => value.chars().count(),
            };
            let new_column = keys.push(size);

            if brk == LineBreak::None {
                if i > 0 {
                    self.write(" ");
                }
            } else {
                // several elements on the previous line break the columns too
                if new_column || last_break.is_none_or(|b| b + 1 < i) {
                    self.section();
                }
                last_break = Some(i);
                self.leading(&element.comments.leading);
                self.indent();
            }
            match key {
                Some(key) if brk != LineBreak::None && size > 0 && lit.elts.len() > 1 => {
                    self.write(&key);
                    self.write(":");
                    self.cell();
                    self.write(&value);
                }
                Some(key) => {
                    self.write(&key);
                    self.write(": ");
                    self.write(&value);
                }
                None => self.write(&value),
            }
        }
        self.close_list(lit.layout.closing, indented, &last.comments.trailing, "}");
    }
}

/// Running widths of the keys of a multi-line literal, deciding where a new
/// key column starts: small keys always share one, larger keys only while
/// they stay within a factor of the geometric mean of the keys before them.
#[derive(Default)]
struct KeyColumn {
    previous: usize,
    log_sum: f64,
    count: usize,
}

impl KeyColumn {
    /// Record the next key width (0 when the element spans lines)
    fn push(&mut self, size: usize) -> bool {
        let mut new_column = true;
        if self.previous > 0 && size > 0 {
            let small = self.previous <= SMALL_KEY && size <= SMALL_KEY;
            new_column = if self.count == 0 || small {
                false
            } else {
                let mean = (self.log_sum / self.count as f64).exp();
                let ratio = size as f64 / mean;
                KEY_RATIO * ratio <= 1.0 || KEY_RATIO <= ratio
            };
        }
        self.previous = size;
        if size > 0 {
            self.log_sum += (size as f64).ln();
            self.count += 1;
        }
        new_column
    }
}

/// Per value spec of a group: whether it keeps an (empty) type column so
/// its `=` lines up with typed neighbours in the same run of initialized specs
fn keep_type_column(specs: &[Spec]) -> Vec<bool> {
    let mut keep = vec![false; specs.len()];
    let mut run: Option<(usize, bool)> = None;
    for (i, spec) in specs.iter().enumerate() {
        let Spec::Value(value) = spec else {
            continue;
        };
        if value.values.is_empty() {
            if let Some((start, true)) = run.take() {
                keep[start..i].fill(true);
            }
        } else if run.is_none() {
            run = Some((i, false));
        }
        if value.ty.is_some()
            && let Some((_, typed)) = &mut run
        {
            *typed = true;
        }
    }
    if let Some((start, true)) = run {
        keep[start..].fill(true);
    }
    keep
}
