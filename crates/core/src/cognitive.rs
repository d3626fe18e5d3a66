//! Cognitive Complexity over tree-sitter syntax trees, per the SonarSource
//! specification: each control-flow break adds 1 plus the current nesting
//! level; logical operator sequences add 1 flat; nesting grows when entering
//! bodies that interrupt the linear reading flow.
//!
//! Covered languages: C and Java. Note the deliberate asymmetry — `switch`
//! increases nesting in Java but not in C.

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::types::FunctionComplexity;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Does a CST-based calculator exist for this extension (with leading dot)?
pub fn supports_ext(ext: &str) -> bool {
    matches!(ext, ".c" | ".h" | ".java")
}

/// Per-function Cognitive Complexity for a file, dispatched by extension.
/// Unsupported languages and parse failures yield an empty list; the file's
/// lexical metrics are unaffected.
pub fn function_complexities(content: &str, ext: &str) -> Vec<FunctionComplexity> {
    let result = match ext {
        ".c" | ".h" => c_function_complexities(content),
        ".java" => java_function_complexities(content),
        _ => return Vec::new(),
    };
    match result {
        Ok(functions) => functions,
        Err(e) => {
            debug!(ext, error = %e, "cognitive complexity parse failed");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// C
// ---------------------------------------------------------------------------

/// Cognitive Complexity for every function definition in a C file.
pub fn c_function_complexities(content: &str) -> Result<Vec<FunctionComplexity>, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .map_err(|e| format!("C grammar unavailable: {e}"))?;
    let tree = parser.parse(content, None).ok_or_else(|| "C parse failed".to_string())?;
    let source = content.as_bytes();

    let mut nodes = Vec::new();
    collect_kind(tree.root_node(), "function_definition", &mut nodes);

    let functions = nodes
        .iter()
        .map(|node| {
            let complexity = match node.child_by_field_name("body") {
                Some(body) => {
                    let mut total = 0;
                    walk_c(body, 0, &mut total);
                    total
                }
                None => 0,
            };
            FunctionComplexity {
                function_name: c_function_name(node, source),
                cognitive_complexity: complexity,
            }
        })
        .collect();
    Ok(functions)
}

/// Descend declarator fields until the identifier (skips pointer declarators).
fn c_function_name(node: &Node, source: &[u8]) -> String {
    let mut decl = node.child_by_field_name("declarator");
    while let Some(d) = decl {
        if d.kind() == "identifier" {
            return d.utf8_text(source).unwrap_or("anonymous").to_string();
        }
        decl = d.child_by_field_name("declarator");
    }
    "anonymous".to_string()
}

fn walk_c(node: Node, nesting: u32, total: &mut u32) {
    let kind = node.kind();

    // Nested function definitions are scoped independently.
    if kind == "function_definition" {
        return;
    }

    match kind {
        "if_statement" => {
            *total += 1 + nesting;
            // The else clause (plain or else-if) adds its own increment.
            if node.child_by_field_name("alternative").is_some() {
                *total += 1 + nesting;
            }
        }
        "for_statement" | "while_statement" | "do_statement" | "case_statement"
        | "conditional_expression" => {
            *total += 1 + nesting;
        }
        // Goto breaks the flow but carries no nesting bonus.
        "goto_statement" => {
            *total += 1;
        }
        "binary_expression" => {
            if let Some(op) = node.child_by_field_name("operator") {
                if matches!(op.kind(), "&&" | "||") {
                    *total += 1;
                }
            }
        }
        _ => {}
    }

    // switch does NOT increase nesting in C.
    let next = match kind {
        "if_statement" | "for_statement" | "while_statement" | "do_statement" => nesting + 1,
        _ => nesting,
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_c(child, next, total);
    }
}

// ---------------------------------------------------------------------------
// Java
// ---------------------------------------------------------------------------

/// Cognitive Complexity for every method and constructor in a Java file.
pub fn java_function_complexities(content: &str) -> Result<Vec<FunctionComplexity>, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| format!("Java grammar unavailable: {e}"))?;
    let tree = parser.parse(content, None).ok_or_else(|| "Java parse failed".to_string())?;
    let source = content.as_bytes();

    let mut nodes = Vec::new();
    collect_kind(tree.root_node(), "method_declaration", &mut nodes);
    collect_kind(tree.root_node(), "constructor_declaration", &mut nodes);
    // Keep source order despite collecting in two passes.
    nodes.sort_by_key(|n| n.start_byte());

    let functions = nodes
        .iter()
        .map(|node| {
            let complexity = match node.child_by_field_name("body") {
                Some(body) => {
                    let mut total = 0;
                    walk_java(body, 0, &mut total);
                    total
                }
                None => 0,
            };
            let name = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or("anonymous")
                .to_string();
            FunctionComplexity { function_name: name, cognitive_complexity: complexity }
        })
        .collect();
    Ok(functions)
}

fn walk_java(node: Node, nesting: u32, total: &mut u32) {
    let kind = node.kind();

    match kind {
        "if_statement" => {
            *total += 1 + nesting;
            if node.child_by_field_name("alternative").is_some() {
                *total += 1 + nesting;
            }
        }
        "for_statement" | "enhanced_for_statement" | "while_statement" | "do_statement"
        | "switch_label" | "catch_clause" | "ternary_expression" => {
            *total += 1 + nesting;
        }
        "binary_expression" => {
            if let Some(op) = node.child_by_field_name("operator") {
                if matches!(op.kind(), "&&" | "||") {
                    *total += 1;
                }
            }
        }
        _ => {}
    }

    // Unlike C, switch IS a nesting construct in Java. Both node spellings are
    // listed because the grammar uses switch_expression for statement position.
    let next = match kind {
        "method_declaration" | "constructor_declaration" | "if_statement" | "for_statement"
        | "enhanced_for_statement" | "while_statement" | "do_statement" | "switch_expression"
        | "switch_statement" | "catch_clause" | "lambda_expression" | "class_declaration" => {
            nesting + 1
        }
        _ => nesting,
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_java(child, next, total);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn collect_kind<'a>(node: Node<'a>, kind: &str, out: &mut Vec<Node<'a>>) {
    if node.kind() == kind {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_kind(child, kind, out);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn c_single(src: &str) -> u32 {
        let functions = c_function_complexities(src).expect("C parse");
        assert_eq!(functions.len(), 1, "expected one function in {src}");
        functions[0].cognitive_complexity
    }

    fn java_single(src: &str) -> u32 {
        let functions = java_function_complexities(src).expect("Java parse");
        assert_eq!(functions.len(), 1, "expected one method in {src}");
        functions[0].cognitive_complexity
    }

    #[test]
    fn test_c_if_else() {
        let src = "int f(int x){ if(x>0){return 1;} else {return 0;} }";
        assert_eq!(c_single(src), 2);
    }

    #[test]
    fn test_c_nested_ifs() {
        let src = "int f(int x){ if(x){ if(x){ if(x){ return 1; } } } return 0; }";
        // 1 + 2 + 3
        assert_eq!(c_single(src), 6);
    }

    #[test]
    fn test_c_else_if_chain() {
        let src = "int f(int x){ if(x==1){return 1;} else if(x==2){return 2;} return 0; }";
        // Outer if (+1) and its else (+1); the chained if sits inside the else
        // clause at nesting 1 (+2).
        assert_eq!(c_single(src), 4);
    }

    #[test]
    fn test_c_goto_has_no_nesting_bonus() {
        let src = "void f(int x){ if(x){ goto done; } done: return; }";
        // if = 1, goto = 1 (flat, despite sitting at nesting 1)
        assert_eq!(c_single(src), 2);
    }

    #[test]
    fn test_c_logical_operators() {
        let src = "int f(int a, int b, int c){ if(a && b || c){ return 1; } return 0; }";
        // if = 1, && = 1, || = 1
        assert_eq!(c_single(src), 3);
    }

    #[test]
    fn test_c_switch_does_not_nest() {
        let src = "int f(int x){ switch(x){ case 1: return 1; case 2: return 2; } return 0; }";
        // Two case labels at nesting 0; switch itself adds nothing.
        assert_eq!(c_single(src), 2);
    }

    #[test]
    fn test_c_ternary() {
        let src = "int f(int x){ return x > 0 ? 1 : 0; }";
        assert_eq!(c_single(src), 1);
    }

    #[test]
    fn test_c_loop_nesting() {
        let src = "void f(int n){ for(int i=0;i<n;i++){ while(n){ n--; } } }";
        // for = 1, while = 1 + 1
        assert_eq!(c_single(src), 3);
    }

    #[test]
    fn test_c_function_names() {
        let src = "int first(void){ return 1; }\nstatic int *second(void){ return 0; }\n";
        let functions = c_function_complexities(src).expect("C parse");
        let names: Vec<&str> = functions.iter().map(|f| f.function_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_java_try_with_two_catches() {
        let src = "class A { void m() { try { run(); } catch (IOException e) { } catch (Exception e) { } } }";
        assert_eq!(java_single(src), 2);
    }

    #[test]
    fn test_java_if_else() {
        let src = "class A { int m(int x) { if (x > 0) { return 1; } else { return 0; } } }";
        assert_eq!(java_single(src), 2);
    }

    #[test]
    fn test_java_switch_nests() {
        let src = "class A { int m(int x) { switch (x) { case 1: return 1; case 2: return 2; } return 0; } }";
        // Each label costs 1 + 1 because switch increases nesting in Java.
        assert_eq!(java_single(src), 4);
    }

    #[test]
    fn test_java_ternary_and_logical() {
        let src = "class A { int m(int a, int b) { return a > 0 && b > 0 ? 1 : 0; } }";
        // ternary = 1, && = 1
        assert_eq!(java_single(src), 2);
    }

    #[test]
    fn test_java_lambda_nests() {
        let src = "class A { boolean flag; void m() { Runnable r = () -> { if (flag) { run(); } }; } }";
        // The if inside the lambda body sits at nesting 1.
        assert_eq!(java_single(src), 2);
    }

    #[test]
    fn test_java_loop_in_loop() {
        let src = "class A { void m(int n) { for (int i = 0; i < n; i++) { while (n > 0) { n--; } } } }";
        // for = 1, while = 1 + 1
        assert_eq!(java_single(src), 3);
    }

    #[test]
    fn test_java_constructor_counted() {
        let src = "class A { A(int x) { if (x > 0) { x = 0; } } }";
        let functions = java_function_complexities(src).expect("Java parse");
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].function_name, "A");
        assert_eq!(functions[0].cognitive_complexity, 1);
    }

    #[test]
    fn test_dispatch_unsupported_ext() {
        assert!(function_complexities("def f(): pass", ".py").is_empty());
        assert!(!supports_ext(".py"));
        assert!(supports_ext(".c"));
        assert!(supports_ext(".java"));
    }

    #[test]
    fn test_empty_source() {
        assert!(c_function_complexities("").expect("C parse").is_empty());
        assert!(java_function_complexities("").expect("Java parse").is_empty());
    }
}
