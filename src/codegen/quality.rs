//! 质量启发式：按语言打分，结果限制在 [0, 1]
//!
//! - Python：解析语法树；解析失败直接 0 分；缺 docstring 的 def/async def/class 每个扣 0.1；
//!   没有 try 且超过 100 字符扣 0.1；没有 `->` 且超过 50 字符扣 0.05
//! - JavaScript：`var ` 扣 0.1；`console.log` 扣 0.05；没有 try/catch 扣 0.1
//! - 其它语言：固定 0.5

use rustpython_parser::ast::{self, Constant, ExceptHandler, Expr, Stmt};
use rustpython_parser::Parse;

use super::types::Language;

const UNSUPPORTED_LANGUAGE_SCORE: f64 = 0.5;

pub fn quality_score(code: &str, language: Language) -> f64 {
    match language {
        Language::Python => analyze_python(code),
        Language::JavaScript => analyze_javascript(code),
        Language::TypeScript
        | Language::Go
        | Language::Rust
        | Language::Java
        | Language::Cpp
        | Language::Shell => UNSUPPORTED_LANGUAGE_SCORE,
    }
}

/// 解析 Python 源码；用于质量评分与自修改校验
pub fn parse_python(code: &str) -> Option<Vec<Stmt>> {
    ast::Suite::parse(code, "<generated>").ok()
}

pub fn analyze_python(code: &str) -> f64 {
    let suite = match parse_python(code) {
        Some(suite) => suite,
        None => return 0.0,
    };

    let mut stats = PythonStats::default();
    stats.visit_body(&suite);

    let len = code.chars().count();
    let mut score = 1.0 - 0.1 * stats.undocumented_definitions as f64;
    if !stats.has_try && len > 100 {
        score -= 0.1;
    }
    if !code.contains("->") && len > 50 {
        score -= 0.05;
    }
    score.clamp(0.0, 1.0)
}

pub fn analyze_javascript(code: &str) -> f64 {
    let mut score: f64 = 1.0;
    if code.contains("var ") {
        score -= 0.1;
    }
    if code.contains("console.log") {
        score -= 0.05;
    }
    if !["try", "catch", ".catch"].iter().any(|m| code.contains(m)) {
        score -= 0.1;
    }
    score.clamp(0.0, 1.0)
}

#[derive(Default)]
struct PythonStats {
    undocumented_definitions: usize,
    has_try: bool,
}

impl PythonStats {
    fn visit_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_definition(&mut self, body: &[Stmt]) {
        if !has_docstring(body) {
            self.undocumented_definitions += 1;
        }
        self.visit_body(body);
    }

    fn visit_handlers(&mut self, handlers: &[ExceptHandler]) {
        for handler in handlers {
            let ExceptHandler::ExceptHandler(h) = handler;
            self.visit_body(&h.body);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef(def) => self.visit_definition(&def.body),
            Stmt::AsyncFunctionDef(def) => self.visit_definition(&def.body),
            Stmt::ClassDef(def) => self.visit_definition(&def.body),
            Stmt::Try(t) => {
                self.has_try = true;
                self.visit_body(&t.body);
                self.visit_handlers(&t.handlers);
                self.visit_body(&t.orelse);
                self.visit_body(&t.finalbody);
            }
            Stmt::TryStar(t) => {
                self.has_try = true;
                self.visit_body(&t.body);
                self.visit_handlers(&t.handlers);
                self.visit_body(&t.orelse);
                self.visit_body(&t.finalbody);
            }
            Stmt::If(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            Stmt::For(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            Stmt::AsyncFor(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            Stmt::While(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            Stmt::With(s) => self.visit_body(&s.body),
            Stmt::AsyncWith(s) => self.visit_body(&s.body),
            Stmt::Match(s) => {
                for case in &s.cases {
                    self.visit_body(&case.body);
                }
            }
            _ => {}
        }
    }
}

/// 第一条语句是非空字符串常量即视为有 docstring
fn has_docstring(body: &[Stmt]) -> bool {
    match body.first() {
        Some(Stmt::Expr(expr)) => match expr.value.as_ref() {
            Expr::Constant(c) => matches!(&c.value, Constant::Str(s) if !s.trim().is_empty()),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_python_missing_docstring_short() {
        assert!(approx(analyze_python("def f():\n    pass"), 0.9));
    }

    #[test]
    fn test_python_invalid_is_zero() {
        assert_eq!(analyze_python("def f(:\n  pass"), 0.0);
        assert_eq!(analyze_python("class"), 0.0);
    }

    #[test]
    fn test_python_documented_with_try_and_annotation() {
        let code = r#"def parse(value: str) -> int:
    """Parse an integer, returning zero on failure."""
    try:
        return int(value)
    except ValueError:
        return 0
"#;
        assert!(approx(analyze_python(code), 1.0));
    }

    #[test]
    fn test_python_nested_definitions_counted() {
        let code = "class A:\n    def m(self):\n        def inner():\n            pass\n        return inner\n";
        // 3 个定义均无 docstring；无 try 但 > 50 字符且 <= 100；无 ->
        assert!(code.chars().count() > 50 && code.chars().count() <= 100);
        assert!(approx(analyze_python(code), 1.0 - 0.3 - 0.05));
    }

    #[test]
    fn test_python_long_without_try() {
        let code = format!(
            "def total(items) -> int:\n    \"\"\"Sum items.\"\"\"\n    result = 0\n    for item in items:\n        result += item\n    return result\n{}",
            "# padding to exceed one hundred characters in total length\n"
        );
        assert!(code.len() > 100);
        assert!(approx(analyze_python(&code), 0.9));
    }

    #[test]
    fn test_python_score_clamped() {
        let code: String = (0..15).map(|i| format!("def f{}():\n    pass\n", i)).collect();
        assert_eq!(analyze_python(&code), 0.0);
    }

    #[test]
    fn test_javascript_penalties() {
        assert!(approx(analyze_javascript("var x = 1;\nconsole.log(x);"), 0.75));
        assert!(approx(
            analyze_javascript("try { run(); } catch (e) { report(e); }"),
            1.0
        ));
        assert!(approx(analyze_javascript("fetch(u).catch(handle)"), 1.0));
    }

    #[test]
    fn test_other_languages_fixed() {
        assert_eq!(quality_score("fn main() {}", Language::Rust), 0.5);
        assert_eq!(quality_score("", Language::Go), 0.5);
    }

    #[test]
    fn test_scores_always_in_range() {
        let samples = ["", "x", "def (", "var a; var b; console.log(a)", "\"\"\"doc\"\"\""];
        for code in samples {
            for lang in Language::ALL {
                let s = quality_score(code, lang);
                assert!((0.0..=1.0).contains(&s), "{} {:?} -> {}", code, lang, s);
            }
        }
    }
}
