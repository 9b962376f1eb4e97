//! Result-signature normalization.
//!
//! Exit traces print every result slot by name, so unnamed and blank results
//! get a synthesized `return_<ordinal>_<token>` name first. The ordinal counts
//! every slot left to right, starting at 1, regardless of how fields group
//! their names.

use smol_str::SmolStr;

use crate::syntax::ast::{FuncType, Ident};

use super::hygiene::Namespace;

/// The name each result slot of `ty` has after normalization
pub fn result_names(ty: &FuncType, namespace: &Namespace) -> Vec<SmolStr> {
    let Some(results) = &ty.results else {
        return Vec::new();
    };
    let mut ordinal = 0;
    let mut names = Vec::with_capacity(ty.result_count());
    for field in &results.fields {
        if field.names.is_empty() {
            ordinal += 1;
            names.push(namespace.result_name(ordinal));
            continue;
        }
        for name in &field.names {
            ordinal += 1;
            names.push(if name.is_blank() {
                namespace.result_name(ordinal)
            } else {
                name.name.clone()
            });
        }
    }
    names
}

/// Rename unnamed and blank result slots of `ty` in place
pub fn normalize_results(ty: &mut FuncType, namespace: &Namespace) {
    let names = result_names(ty, namespace);
    let Some(results) = &mut ty.results else {
        return;
    };
    let mut names = names.into_iter();
    for field in &mut results.fields {
        if field.names.is_empty() {
            if let Some(name) = names.next() {
                field.names.push(Ident::synthetic(name));
            }
            continue;
        }
        for ident in &mut field.names {
            if let Some(name) = names.next() {
                if ident.is_blank() {
                    ident.name = name;
                }
            }
        }
    }
    results.delimited = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ResolutionMode;
    use crate::parser::parse_file;
    use crate::syntax::ast::Decl;
    use crate::syntax::formatter::print_file;

    fn normalized(src: &str) -> String {
        let ns = Namespace::new("tok", ResolutionMode::LooseFiles).unwrap();
        let mut file = parse_file(src).unwrap();
        for decl in &mut file.decls {
            if let Decl::Func(func) = decl {
                normalize_results(&mut func.ty, &ns);
            }
        }
        print_file(&file)
    }

    #[test]
    fn test_unnamed_results_get_ordinals() {
        assert_eq!(
            normalized("package p\nfunc f() (int, error)\n"),
            "package p\n\nfunc f() (return_1_tok int, return_2_tok error)\n"
        );
    }

    #[test]
    fn test_single_bare_result_becomes_parenthesized() {
        assert_eq!(
            normalized("package p\nfunc f() int\n"),
            "package p\n\nfunc f() (return_1_tok int)\n"
        );
    }

    #[test]
    fn test_blank_slots_count_grouped_names() {
        assert_eq!(
            normalized("package p\nfunc f() (a, _ int, _ string)\n"),
            "package p\n\nfunc f() (a, return_2_tok int, return_3_tok string)\n"
        );
    }

    #[test]
    fn test_named_results_untouched() {
        let src = "package p\n\nfunc f() (x int, y int)\n";
        assert_eq!(normalized(src), src);
    }

    #[test]
    fn test_no_results() {
        let src = "package p\n\nfunc f()\n";
        assert_eq!(normalized(src), src);
    }
}
