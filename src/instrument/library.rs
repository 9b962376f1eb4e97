//! Generated runtime support library.
//!
//! One Go file per run, rendered from a fixed template. It holds the four
//! print primitives the inserted calls target plus their formatting helpers;
//! every identifier carries the namespace token.

use std::path::PathBuf;

use smol_str::SmolStr;

use crate::base::constants::{GO_MOD, NAMESPACE_PREFIX};

use super::hygiene::Namespace;

const TEMPLATE: &str = r#"// Code generated by xtrace. DO NOT EDIT.

package {{package}}

import (
	"bytes"
	"fmt"
	"os"
	"runtime"
	"runtime/debug"
	"strings"
	"time"
)

func timestamp_{{token}}() string {
	return time.Now().UTC().Format(time.RFC3339)
}

func taskID_{{token}}() string {
	fields := bytes.Fields(debug.Stack())
	if len(fields) < 2 {
		return "?"
	}
	return string(fields[1])
}

func funcName_{{token}}() string {
	pc, _, _, ok := runtime.Caller(3)
	if !ok {
		return "?"
	}
	fn := runtime.FuncForPC(pc)
	if fn == nil {
		return "?"
	}
	name := fn.Name()
	if i := strings.LastIndex(name, "/"); i >= 0 {
		name = name[i+1:]
	}
	return name
}

func prefix_{{token}}(showTimestamp, showTaskID bool) string {
	var b strings.Builder
	if showTimestamp {
		fmt.Fprintf(&b, "%20s ", timestamp_{{token}}())
	}
	if showTaskID {
		fmt.Fprintf(&b, "[%2s] ", taskID_{{token}}())
	}
	b.WriteString(funcName_{{token}}())
	b.WriteString(": ")
	return b.String()
}

func truncate_{{token}}(line string, width int) string {
	if len(line) > width && width > 4 {
		return line[:width-4] + " ..."
	}
	return line
}

// PrintlnStatement_{{token}} prints an executed source line followed by its location.
func PrintlnStatement_{{token}}(width int, line, source string, showTimestamp, showTaskID bool) {
	text := truncate_{{token}}(prefix_{{token}}(showTimestamp, showTaskID)+line, width-len(source))
	if pad := width - len(text) - len(source); pad > 1 {
		text += " " + strings.Repeat("-", pad-1)
	}
	fmt.Fprintln(os.Stderr, text+source)
}

// PrintlnVariable_{{token}} prints a variable's value, or only its name when it shadows an earlier one.
func PrintlnVariable_{{token}}(width int, name string, value any, shadowed, showTimestamp, showTaskID bool) {
	text := prefix_{{token}}(showTimestamp, showTaskID)
	if shadowed {
		text += fmt.Sprintf("[VAR] %s (shadowed)", name)
	} else {
		text += fmt.Sprintf("[VAR] %s=%#v", name, value)
	}
	fmt.Fprintln(os.Stderr, truncate_{{token}}(text, width))
}

// PrintlnCall_{{token}} prints a function entry.
func PrintlnCall_{{token}}(width int, signature string, showTimestamp, showTaskID bool) {
	text := prefix_{{token}}(showTimestamp, showTaskID) + "[CALL] " + signature
	fmt.Fprintln(os.Stderr, truncate_{{token}}(text, width))
}

// PrintlnReturn_{{token}} prints a function exit.
func PrintlnReturn_{{token}}(width int, signature string, showTimestamp, showTaskID bool) {
	text := prefix_{{token}}(showTimestamp, showTaskID) + "[RETURN] " + signature
	fmt.Fprintln(os.Stderr, truncate_{{token}}(text, width))
}
"#;

/// Render the support library for package `package` with identifiers suffixed by `token`
pub fn generate_support_library(package: &str, token: &str) -> String {
    TEMPLATE
        .replace("{{package}}", package)
        .replace("{{token}}", token)
}

/// Manifest making a loose-file output directory a module of its own
pub fn generate_go_mod(token: &str) -> String {
    format!("module {NAMESPACE_PREFIX}_{token}\n\ngo 1.21\n")
}

/// Where the support library goes and what it declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportLibrarySpec {
    pub package: SmolStr,
    pub token: SmolStr,
    /// Relative to the output root
    pub path: PathBuf,
}

impl SupportLibrarySpec {
    pub fn new(namespace: &Namespace) -> Self {
        let file_name = namespace.library_file_name();
        let path = if namespace.mode().is_loose() {
            PathBuf::from(file_name)
        } else {
            PathBuf::from(namespace.library_name().as_str()).join(file_name)
        };
        Self {
            package: namespace.library_package(),
            token: SmolStr::new(namespace.token()),
            path,
        }
    }

    pub fn render(&self) -> String {
        generate_support_library(&self.package, &self.token)
    }

    /// Module manifest to write next to the library, if the output needs one
    pub fn manifest(namespace: &Namespace) -> Option<(PathBuf, String)> {
        namespace
            .mode()
            .is_loose()
            .then(|| (PathBuf::from(GO_MOD), generate_go_mod(namespace.token())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ResolutionMode;
    use crate::parser::parse_file;

    #[test]
    fn test_library_parses_and_declares_primitives() {
        let source = generate_support_library("main", "abcdefgh");
        let file = parse_file(&source).unwrap();
        assert_eq!(file.package.as_str(), "main");
        for name in [
            "PrintlnStatement_abcdefgh",
            "PrintlnVariable_abcdefgh",
            "PrintlnCall_abcdefgh",
            "PrintlnReturn_abcdefgh",
        ] {
            assert!(source.contains(&format!("func {name}(")), "missing {name}");
        }
        assert!(!source.contains("{{"));
    }

    #[test]
    fn test_library_is_deterministic() {
        assert_eq!(
            generate_support_library("xtrace_t", "t"),
            generate_support_library("xtrace_t", "t")
        );
    }

    #[test]
    fn test_go_mod() {
        assert_eq!(generate_go_mod("abc"), "module xtrace_abc\n\ngo 1.21\n");
    }

    #[test]
    fn test_placement_per_mode() {
        let loose = Namespace::new("tok", ResolutionMode::LooseFiles).unwrap();
        let spec = SupportLibrarySpec::new(&loose);
        assert_eq!(spec.path, PathBuf::from("xtrace_tok.go"));
        assert_eq!(spec.package, "main");
        assert!(SupportLibrarySpec::manifest(&loose).is_some());

        let module = Namespace::new("tok", ResolutionMode::ModuleDirectory).unwrap();
        let spec = SupportLibrarySpec::new(&module);
        assert_eq!(spec.path, PathBuf::from("xtrace_tok/xtrace_tok.go"));
        assert_eq!(spec.package, "xtrace_tok");
        assert!(spec.render().starts_with("// Code generated by xtrace. DO NOT EDIT.\n\npackage xtrace_tok\n"));
        assert!(SupportLibrarySpec::manifest(&module).is_none());
    }
}
