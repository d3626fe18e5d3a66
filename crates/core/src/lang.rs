//! Language registry and lexical complexity parsers.
//!
//! Cyclomatic complexity is a deliberately lexical heuristic: base 1 plus one
//! per control-keyword regex match. Matches inside string literals and
//! comments are counted; this imprecision is accepted in exchange for working
//! on any input without a language front-end.

use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Parser trait
// ---------------------------------------------------------------------------

/// A language parser computes lexical metrics for one language family.
pub trait LanguageParser: Send + Sync {
    /// Display name of the language (e.g. "Python").
    fn name(&self) -> &'static str;
    /// Cyclomatic complexity: 1 + one per control-pattern match.
    fn compute_complexity(&self, code: &str) -> u32;
    /// Number of function-definition matches; 0 when no pattern is defined.
    fn count_functions(&self, code: &str) -> u32;
}

// ---------------------------------------------------------------------------
// Generic regex parser
// ---------------------------------------------------------------------------

struct RegexParser {
    name: &'static str,
    function_pattern: Option<Regex>,
    control_patterns: Vec<Regex>,
}

impl RegexParser {
    fn new(name: &'static str, function_pattern: Option<&str>, control_patterns: &[&str]) -> Self {
        RegexParser {
            name,
            function_pattern: function_pattern.map(|p| Regex::new(p).unwrap()),
            control_patterns: control_patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
        }
    }
}

impl LanguageParser for RegexParser {
    fn name(&self) -> &'static str {
        self.name
    }

    fn compute_complexity(&self, code: &str) -> u32 {
        let mut complexity = 1;
        for pattern in &self.control_patterns {
            complexity += pattern.find_iter(code).count() as u32;
        }
        complexity
    }

    fn count_functions(&self, code: &str) -> u32 {
        match &self.function_pattern {
            Some(pattern) => pattern.find_iter(code).count() as u32,
            None => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Ada
// ---------------------------------------------------------------------------

/// Ada needs preprocessing: `end if;` is stripped so the closing `if` is not
/// double-counted, and an `if` immediately followed by `;` does not count.
/// The regex crate has no lookahead, so the latter is handled by subtracting
/// `if\s*;` matches from plain `if` matches.
struct AdaParser {
    end_if: Regex,
    if_keyword: Regex,
    if_semicolon: Regex,
    control_patterns: Vec<Regex>,
}

impl AdaParser {
    fn new() -> Self {
        let patterns = [
            r"(?i)\belsif\b",
            r"(?i)\bcase\b",
            r"(?i)\bwhen\b",
            r"(?i)\bloop\b",
            r"(?i)\bwhile\b",
            r"(?i)\bfor\b",
            r"(?i)\bexit\b",
            r"(?i)\bexception\b",
        ];
        AdaParser {
            end_if: Regex::new(r"(?i)end if;").unwrap(),
            if_keyword: Regex::new(r"(?i)\bif\b").unwrap(),
            if_semicolon: Regex::new(r"(?i)\bif\s*;").unwrap(),
            control_patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
        }
    }
}

impl LanguageParser for AdaParser {
    fn name(&self) -> &'static str {
        "Ada"
    }

    fn compute_complexity(&self, code: &str) -> u32 {
        let code = self.end_if.replace_all(code, "");
        let if_count = self.if_keyword.find_iter(&code).count();
        let guarded = self.if_semicolon.find_iter(&code).count();

        let mut complexity = 1 + (if_count.saturating_sub(guarded)) as u32;
        for pattern in &self.control_patterns {
            complexity += pattern.find_iter(&code).count() as u32;
        }
        complexity
    }

    fn count_functions(&self, _code: &str) -> u32 {
        0
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

const JS_CONTROL: &[&str] = &[
    r"\bif\b",
    r"\belse\s+if\b",
    r"\bfor\b",
    r"\bwhile\b",
    r"\bswitch\b",
    r"\bcase\b",
    r"\bcatch\b",
    r"\bthrow\b",
    r"\breturn\b",
    r"&&",
    r"\|\|",
];

const C_CONTROL: &[&str] = &[
    r"\bif\b",
    r"\belse\s+if\b",
    r"\bfor\b",
    r"\bwhile\b",
    r"\bdo\b",
    r"\bswitch\b",
    r"\bcase\b",
    r"\bdefault\b",
    r"\bbreak\b",
    r"\bcontinue\b",
    r"\bgoto\b",
    r"\breturn\b",
    r"&&",
    r"\|\|",
];

/// Maps file extensions (with leading dot) to language parsers.
/// Built once per analysis run; immutable afterwards.
pub struct LanguageRegistry {
    parsers: HashMap<&'static str, Arc<dyn LanguageParser>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut parsers: HashMap<&'static str, Arc<dyn LanguageParser>> = HashMap::new();

        parsers.insert(
            ".py",
            Arc::new(RegexParser::new(
                "Python",
                Some(r"def\s+\w+\s*\(.*?\)\s*:"),
                &[
                    r"\bif\b",
                    r"\belif\b",
                    r"\bfor\b",
                    r"\bwhile\b",
                    r"\btry\b",
                    r"\bexcept\b",
                    r"\breturn\b",
                    r"\band\b",
                    r"\bor\b",
                ],
            )),
        );

        let js_function = r"function\s+\w+\s*\(.*?\)\s*\{";
        parsers.insert(".js", Arc::new(RegexParser::new("JavaScript", Some(js_function), JS_CONTROL)));
        parsers.insert(".ts", Arc::new(RegexParser::new("TypeScript", Some(js_function), JS_CONTROL)));

        let method_function = r"(public|private|protected)?\s+\w+\s+\w+\s*\(.*?\)\s*\{";
        parsers.insert(".java", Arc::new(RegexParser::new("Java", Some(method_function), JS_CONTROL)));
        parsers.insert(
            ".cs",
            Arc::new(RegexParser::new(
                "C#",
                Some(method_function),
                &[
                    r"\bif\b",
                    r"\bfor\b",
                    r"\bwhile\b",
                    r"\bswitch\b",
                    r"\bcase\b",
                    r"\bcatch\b",
                    r"\bthrow\b",
                    r"\breturn\b",
                    r"&&",
                    r"\|\|",
                ],
            )),
        );

        let c: Arc<dyn LanguageParser> =
            Arc::new(RegexParser::new("C", Some(r"\b\w+\s+\w+\s*\(.*?\)\s*\{"), C_CONTROL));
        parsers.insert(".c", Arc::clone(&c));
        parsers.insert(".h", c);

        let cpp: Arc<dyn LanguageParser> =
            Arc::new(RegexParser::new("C++", Some(r"(?:\b\w+\s+)+\w+\s*\(.*?\)\s*\{"), C_CONTROL));
        parsers.insert(".cpp", Arc::clone(&cpp));
        parsers.insert(".hpp", cpp);

        parsers.insert(
            ".go",
            Arc::new(RegexParser::new(
                "Go",
                Some(r"func\s+\w+\s*\(.*?\)\s*\{"),
                &[
                    r"\bif\b",
                    r"\belse\s+if\b",
                    r"\bfor\b",
                    r"\bswitch\b",
                    r"\bcase\b",
                    r"\bselect\b",
                    r"\bgo\b",
                    r"\bdefer\b",
                    r"\breturn\b",
                    r"&&",
                    r"\|\|",
                ],
            )),
        );

        let ada: Arc<dyn LanguageParser> = Arc::new(AdaParser::new());
        parsers.insert(".adb", Arc::clone(&ada));
        parsers.insert(".ads", ada);

        LanguageRegistry { parsers }
    }

    /// Look up the parser for an extension (with leading dot).
    pub fn get(&self, ext: &str) -> Option<&dyn LanguageParser> {
        self.parsers.get(ext).map(|p| p.as_ref())
    }

    pub fn supports(&self, ext: &str) -> bool {
        self.parsers.contains_key(ext)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
