//! Tests for the canonical Go printer

use super::super::format_source;

fn format(source: &str) -> String {
    format_source(source).unwrap_or_default()
}

/// Assert that formatting produces the expected output
fn assert_format(input: &str, expected: &str) {
    let result = format(input);
    assert_eq!(
        result, expected,
        "\n=== Input ===\n{}\n=== Expected ===\n{}\n=== Got ===\n{}",
        input, expected, result
    );
}

/// Assert that canonical output is a fixed point of formatting
fn assert_stable(input: &str) {
    let once = format(input);
    let twice = format(&once);
    assert_eq!(once, twice, "\n=== Once ===\n{}\n=== Twice ===\n{}", once, twice);
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_format_package_only() {
    assert_format("package   main", "package main\n");
}

#[test]
fn test_format_imports() {
    assert_format(
        "package main\nimport \"fmt\"\nimport (\nf \"fmt\"\n_ \"os\"\n)\n",
        "package main\n\nimport \"fmt\"\nimport (\n\tf \"fmt\"\n\t_ \"os\"\n)\n",
    );
}

#[test]
fn test_format_value_specs() {
    assert_format(
        "package p\nvar a,b int=1,2\nconst (\nX=iota\nY\n)\n",
        "package p\n\nvar a, b int = 1, 2\nconst (\n\tX = iota\n\tY\n)\n",
    );
}

#[test]
fn test_format_type_specs() {
    assert_format(
        "package p\ntype A = int\ntype S struct{}\ntype T struct { x, y int `json:\"x\"`; z string }\n",
        "package p\n\ntype A = int\ntype S struct{}\ntype T struct {\n\tx, y int `json:\"x\"`\n\tz    string\n}\n",
    );
}

#[test]
fn test_format_interface_methods() {
    assert_format(
        "package p\ntype I interface { M(x int) (bool, error); fmt.Stringer }\n",
        "package p\n\ntype I interface {\n\tM(x int) (bool, error)\n\tfmt.Stringer\n}\n",
    );
}

#[test]
fn test_format_function_signatures() {
    assert_format(
        "package p\nfunc (r *T) M(a, b int, c ...string) (n int, err error) { return }\nfunc f() int { return 1 }\nfunc g() (int) { return 1 }\n",
        "package p\n\nfunc (r *T) M(a, b int, c ...string) (n int, err error) {\n\treturn\n}\nfunc f() int {\n\treturn 1\n}\nfunc g() (int) {\n\treturn 1\n}\n",
    );
}

#[test]
fn test_format_generics() {
    assert_format(
        "package p\nfunc Map[T any, U comparable](xs []T) []U { return nil }\ntype Pair[K comparable, V any] struct { k K; v V }\n",
        "package p\n\nfunc Map[T any, U comparable](xs []T) []U {\n\treturn nil\n}\ntype Pair[K comparable, V any] struct {\n\tk K\n\tv V\n}\n",
    );
}

#[test]
fn test_format_keeps_blank_lines_between_decls() {
    assert_format(
        "package p\n\nfunc a() {}\n\n\n\nfunc b() {}\nfunc c() {}\n",
        "package p\n\nfunc a() {}\n\nfunc b() {}\nfunc c() {}\n",
    );
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_format_simple_statements() {
    assert_format(
        "package p\nfunc f() {\nx:=1\nx+=2\nx++\nch<-x\ngo g()\ndefer h(x)\n}\n",
        "package p\n\nfunc f() {\n\tx := 1\n\tx += 2\n\tx++\n\tch <- x\n\tgo g()\n\tdefer h(x)\n}\n",
    );
}

#[test]
fn test_format_if_else_chain() {
    assert_format(
        "package p\nfunc f(x int) {\nif v := x; v > 0 { a() } else if x < 0 { b() } else { c() }\n}\n",
        "package p\n\nfunc f(x int) {\n\tif v := x; v > 0 {\n\t\ta()\n\t} else if x < 0 {\n\t\tb()\n\t} else {\n\t\tc()\n\t}\n}\n",
    );
}

#[test]
fn test_format_switch_and_select() {
    assert_format(
        "package p\nfunc f(x any, ch chan int) {\nswitch x.(type) {\ncase int, string:\nreturn\ndefault:\n}\nselect {\ncase v := <-ch:\n_ = v\n}\n}\n",
        "package p\n\nfunc f(x any, ch chan int) {\n\tswitch x.(type) {\n\tcase int, string:\n\t\treturn\n\tdefault:\n\t}\n\tselect {\n\tcase v := <-ch:\n\t\t_ = v\n\t}\n}\n",
    );
}

#[test]
fn test_format_for_forms() {
    assert_format(
        "package p\nfunc f(xs []int) {\nfor {}\nfor i:=0;i<3;i++ {}\nfor k, v := range xs {}\nfor range xs {}\n}\n",
        "package p\n\nfunc f(xs []int) {\n\tfor {}\n\tfor i := 0; i < 3; i++ {}\n\tfor k, v := range xs {}\n\tfor range xs {}\n}\n",
    );
}

#[test]
fn test_format_labels_outdent() {
    assert_format(
        "package p\nfunc f() {\nouter:\nfor {\nbreak outer\n}\n}\n",
        "package p\n\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n",
    );
}

#[test]
fn test_format_keeps_single_blank_line_between_statements() {
    assert_format(
        "package p\nfunc f() {\na()\n\n\nb()\nc()\n}\n",
        "package p\n\nfunc f() {\n\ta()\n\n\tb()\n\tc()\n}\n",
    );
}

#[test]
fn test_format_multiline_empty_block() {
    assert_format(
        "package p\nfunc f() {\n}\n",
        "package p\n\nfunc f() {\n}\n",
    );
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_format_binary_spacing() {
    assert_format(
        "package p\nvar x = a+b*c-(d/e)\n",
        "package p\n\nvar x = a + b * c - (d / e)\n",
    );
}

#[test]
fn test_format_nested_unary_does_not_merge() {
    assert_format("package p\nvar x = - -y\n", "package p\n\nvar x = - -y\n");
    assert_format("package p\nvar x = -+y\n", "package p\n\nvar x = -+y\n");
}

#[test]
fn test_format_composite_literals() {
    assert_format(
        "package p\nvar a = []int{1,2,3}\nvar m = map[string]int{\n\"a\": 1,\n\"b\": 2}\n",
        "package p\n\nvar a = []int{1, 2, 3}\nvar m = map[string]int{\n\t\"a\": 1,\n\t\"b\": 2}\n",
    );
}

#[test]
fn test_format_keeps_line_breaks_of_literals() {
    assert_format(
        "package p\nvar m = map[string]int{\n\"a\": 1,\n\"bb\": 2,\n}\nvar xs = []int{1, 2,\n3, 4,\n}\n",
        "package p\n\nvar m = map[string]int{\n\t\"a\":  1,\n\t\"bb\": 2,\n}\nvar xs = []int{1, 2,\n\t3, 4,\n}\n",
    );
}

#[test]
fn test_format_long_keys_start_a_new_column() {
    let long = "k".repeat(50);
    let input = format!("package p\nvar m = T{{\na: 1,\nb: 2,\n{long}: 3,\n}}\n");
    assert_format(
        &input,
        &format!("package p\n\nvar m = T{{\n\ta: 1,\n\tb: 2,\n\t{long}: 3,\n}}\n"),
    );
}

#[test]
fn test_format_keeps_line_breaks_of_arguments() {
    assert_format(
        "package p\nfunc f() {\nfmt.Println(\"a\",\nb)\ng(\nx,\ny,\n)\nh(func() {\nreturn\n})\n}\n",
        "package p\n\nfunc f() {\n\tfmt.Println(\"a\",\n\t\tb)\n\tg(\n\t\tx,\n\t\ty,\n\t)\n\th(func() {\n\t\treturn\n\t})\n}\n",
    );
}

#[test]
fn test_format_func_literal_indentation() {
    assert_format(
        "package p\nvar f = func(x int) int {\nreturn x\n}\n",
        "package p\n\nvar f = func(x int) int {\n\treturn x\n}\n",
    );
}

#[test]
fn test_format_types_in_expressions() {
    assert_format(
        "package p\nvar c chan<- int\nvar r <-chan []*T\nvar s = xs[1:2:3]\nvar t, ok = v.(fmt.Stringer)\n",
        "package p\n\nvar c chan<- int\nvar r <-chan []*T\nvar s = xs[1:2:3]\nvar t, ok = v.(fmt.Stringer)\n",
    );
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_format_aligns_struct_fields() {
    assert_format(
        "package p\ntype Config struct {\nName string `json:\"name\"` // the name\nTimeout int // seconds\nio.Reader\n\nVerbose bool\n}\n",
        "package p\n\ntype Config struct {\n\tName    string `json:\"name\"` // the name\n\tTimeout int    // seconds\n\tio.Reader\n\n\tVerbose bool\n}\n",
    );
}

#[test]
fn test_format_field_after_nested_struct_starts_new_columns() {
    assert_format(
        "package p\ntype T struct {\nA int\nLonger struct {\nX int\n}\nB int\n}\n",
        "package p\n\ntype T struct {\n\tA      int\n\tLonger struct {\n\t\tX int\n\t}\n\tB int\n}\n",
    );
}

#[test]
fn test_format_aligns_grouped_specs() {
    assert_format(
        "package p\nconst (\nA = 1 // one\nLong int = 22 // twenty-two\n)\nvar (\nx = 1\nlonger = 2\n)\ntype (\nID int\nName string\n)\n",
        "package p\n\nconst (\n\tA        = 1  // one\n\tLong int = 22 // twenty-two\n)\nvar (\n\tx      = 1\n\tlonger = 2\n)\ntype (\n\tID   int\n\tName string\n)\n",
    );
}

#[test]
fn test_format_aligns_trailing_comments_of_consecutive_lines() {
    assert_format(
        "package p\nfunc f() {\nx := 1 // a\nlonger := 2 // b\n\ny := 3 // c\n}\n",
        "package p\n\nfunc f() {\n\tx := 1      // a\n\tlonger := 2 // b\n\n\ty := 3 // c\n}\n",
    );
}

#[test]
fn test_format_keeps_comments() {
    assert_format(
        "// Package p.\npackage p\n\n// f does it.\nfunc f() {\n// leading\nx := 1 // trailing\n_ = x\n}\n",
        "// Package p.\npackage p\n\n// f does it.\nfunc f() {\n\t// leading\n\tx := 1 // trailing\n\t_ = x\n}\n",
    );
}

#[test]
fn test_format_comments_in_composite_literal() {
    assert_format(
        "package p\nvar xs = []int{1, // one\n2}\n",
        "package p\n\nvar xs = []int{1, // one\n\t2}\n",
    );
}

// ============================================================================
// Stability
// ============================================================================

#[test]
fn test_format_is_idempotent() {
    assert_stable(
        r#"// Command demo.
package main

import (
	"fmt"
	"os"
)

type point struct {
	x, y  int    // coordinates
	label string `json:"label"`
}

var table = map[string]point{
	"origin": {},
	"unit":   {x: 1, y: 1}, // diagonal
}

func (p point) sum() (total int) {
	total = p.x + p.y
	return
}

func main() {
	// walk
	for i, v := range []int{1, 2} {
		switch {
		case v > 1:
			fmt.Println(i)
		default:
		}
	}
	if len(os.Args) > 1 {
		fmt.Println(os.Args[1:])
	} else if x := -1; x < 0 {
		fmt.Println(- -x)
	}
}
"#,
    );
}

#[test]
fn test_format_reports_syntax_errors() {
    assert!(format_source("package p\nfunc {").is_err());
}
