//! 代码生成集成测试：LLM 路径、库方案路径、模板回退

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use auto_coder::codegen::{
    CodeFormatter, CodeGenerator, CodeType, FormatError, FormatterAdapter, GenerationRequest,
    Language, TemplateStore,
};
use auto_coder::core::CodegenError;
use auto_coder::llm::{TOPIC_CODING, TOPIC_DOCUMENTATION};
use auto_coder::solutions::{
    CatalogSolutionFinder, SolutionCheck, SolutionError, SolutionFinder, SolutionLevel,
};

use common::ScriptedEngine;

const CATALOG: &str = r#"
[[library]]
name = "requests"
description = "HTTP for Humans"
installation = "pip install requests"
url = "https://requests.readthedocs.io"
keywords = ["http", "download"]
pros = ["Simple API", "Widely used"]
code_example = "import requests"
"#;

const ADD_CODE: &str = "def add(a, b) -> int:\n    \"\"\"Add two numbers.\"\"\"\n    return a + b";

fn generator() -> CodeGenerator {
    CodeGenerator::new(TemplateStore::builtin().unwrap(), FormatterAdapter::identity())
}

fn catalog_finder() -> Arc<CatalogSolutionFinder> {
    Arc::new(CatalogSolutionFinder::from_toml_str(CATALOG, 0.5).unwrap())
}

/// 在末尾追加标记，便于确认格式化被调用
struct MarkingFormatter;

#[async_trait]
impl CodeFormatter for MarkingFormatter {
    fn name(&self) -> &str {
        "marking"
    }

    async fn format(&self, code: &str) -> Result<String, FormatError> {
        Ok(format!("{}\n# formatted", code))
    }
}

struct FailingFormatter;

#[async_trait]
impl CodeFormatter for FailingFormatter {
    fn name(&self) -> &str {
        "failing"
    }

    async fn format(&self, _code: &str) -> Result<String, FormatError> {
        Err(FormatError::EmptyCommand)
    }
}

/// 推荐用库却不给候选
struct EmptyRecommendationFinder;

#[async_trait]
impl SolutionFinder for EmptyRecommendationFinder {
    async fn check_before_coding(
        &self,
        _description: &str,
        _level: SolutionLevel,
        _features: &[String],
        _constraints: &[String],
    ) -> Result<SolutionCheck, SolutionError> {
        Ok(SolutionCheck {
            should_use_library: true,
            recommendation: "use something".to_string(),
            ..Default::default()
        })
    }
}

struct BrokenFinder;

#[async_trait]
impl SolutionFinder for BrokenFinder {
    async fn check_before_coding(
        &self,
        _description: &str,
        _level: SolutionLevel,
        _features: &[String],
        _constraints: &[String],
    ) -> Result<SolutionCheck, SolutionError> {
        Err(SolutionError::Lookup("index unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_llm_generation_with_tests_and_docs() {
    let engine = Arc::new(ScriptedEngine::new([
        format!("Here is the code:\n```python\n{}\n```\nDone.", ADD_CODE),
        "```python\ndef test_add():\n    assert add(1, 2) == 3\n```".to_string(),
        "# add\n\nAdds two numbers.".to_string(),
    ]));
    let gen = generator().with_llm(engine.clone());

    let request = GenerationRequest::new("add two numbers", CodeType::Function, Language::Python)
        .with_requirements(["return an int"]);
    let result = gen.generate(&request).await.unwrap();

    assert_eq!(result.code, ADD_CODE);
    assert_eq!(
        result.tests.as_deref(),
        Some("def test_add():\n    assert add(1, 2) == 3")
    );
    assert_eq!(result.documentation.as_deref(), Some("# add\n\nAdds two numbers."));
    assert_eq!(result.quality_score, 1.0);
    assert_eq!(result.description, "add two numbers");
    assert_eq!(
        engine.topics(),
        vec![TOPIC_CODING, TOPIC_CODING, TOPIC_DOCUMENTATION]
    );

    let calls = engine.calls();
    assert!(calls[0].0.starts_with("Generate function code in python."));
    assert!(calls[0].0.contains("- return an int"));
    assert!(calls[1].0.contains(ADD_CODE));
}

#[tokio::test]
async fn test_test_code_type_skips_test_generation() {
    let engine = Arc::new(ScriptedEngine::new([
        "```python\ndef test_sum():\n    assert sum([1]) == 1\n```",
        "docs",
    ]));
    let gen = generator().with_llm(engine.clone());

    let request = GenerationRequest::new("test sum", CodeType::Test, Language::Python);
    let result = gen.generate(&request).await.unwrap();

    assert!(result.tests.is_none());
    assert_eq!(result.documentation.as_deref(), Some("docs"));
    assert_eq!(engine.topics(), vec![TOPIC_CODING, TOPIC_DOCUMENTATION]);
}

#[tokio::test]
async fn test_llm_failure_propagates() {
    let engine = Arc::new(ScriptedEngine::new(Vec::<String>::new()));
    let gen = generator().with_llm(engine);

    let request = GenerationRequest::new("anything", CodeType::Function, Language::Python);
    let err = gen.generate(&request).await.unwrap_err();
    assert!(matches!(err, CodegenError::Llm(_)));
}

#[tokio::test]
async fn test_formatter_applied_to_python_only() {
    let adapter = FormatterAdapter::identity()
        .with_python_formatter(FailingFormatter)
        .with_python_formatter(MarkingFormatter);
    let gen = CodeGenerator::new(TemplateStore::builtin().unwrap(), adapter);

    let engine = Arc::new(ScriptedEngine::new(["```\nx = 1\n```", "```\n```", "d"]));
    let gen = gen.with_llm(engine);
    let request = GenerationRequest::new("x", CodeType::Function, Language::Python);
    assert_eq!(gen.generate(&request).await.unwrap().code, "x = 1\n# formatted");
}

#[tokio::test]
async fn test_non_python_is_not_formatted() {
    let gen = CodeGenerator::new(
        TemplateStore::builtin().unwrap(),
        FormatterAdapter::identity().with_python_formatter(MarkingFormatter),
    );
    let engine = Arc::new(ScriptedEngine::new(["```rust\nlet x = 1;\n```"]));
    let gen = gen.with_llm(engine);

    assert_eq!(gen.optimize("let x=1;", Language::Rust).await.unwrap(), "let x = 1;");
}

#[tokio::test]
async fn test_library_path_without_llm() {
    let gen = generator().with_solution_finder(catalog_finder());
    let request =
        GenerationRequest::new("download a file over http", CodeType::Function, Language::Python);

    let result = gen.generate(&request).await.unwrap();

    assert_eq!(result.quality_score, 0.9);
    assert!(result.tests.is_none());
    assert_eq!(
        result.description,
        "Implementation using requests: download a file over http"
    );
    assert!(result
        .code
        .contains("# Using requests library instead of custom implementation"));
    assert!(result.code.contains("# Installation: pip install requests"));
    assert!(result.code.contains("import requests\n\n# TODO: Implement using requests"));
    assert!(result
        .code
        .contains("# See documentation: https://requests.readthedocs.io"));

    let docs = result.documentation.unwrap();
    assert!(docs.contains("## Implementation using requests"));
    assert!(docs.contains("Simple API, Widely used"));
    assert!(docs.contains("```bash\npip install requests\n```"));
    assert!(docs.contains("### Match Score\n1.00 - Use requests"));
}

#[tokio::test]
async fn test_library_path_with_llm_snippet() {
    let engine = Arc::new(ScriptedEngine::new([
        "```python\nresponse = requests.get(url, timeout=10)\n```",
    ]));
    let gen = generator()
        .with_llm(engine.clone())
        .with_solution_finder(catalog_finder());
    let request =
        GenerationRequest::new("download a file over http", CodeType::Function, Language::Python);

    let result = gen.generate(&request).await.unwrap();

    assert!(result
        .code
        .trim_end()
        .ends_with("# Implementation using requests:\nresponse = requests.get(url, timeout=10)"));
    assert_eq!(result.quality_score, 0.9);
    assert_eq!(engine.topics(), vec![TOPIC_CODING]);
    assert!(engine.calls()[0].0.contains("requests"));
}

#[tokio::test]
async fn test_below_threshold_uses_templates() {
    let gen = generator().with_solution_finder(catalog_finder());
    let request = GenerationRequest::new("parse some json", CodeType::Function, Language::Python);

    let result = gen.generate(&request).await.unwrap();
    assert!(result.code.starts_with("def parse_some_json("));
    assert_eq!(result.quality_score, 0.0);
}

#[tokio::test]
async fn test_recommendation_without_candidates_falls_through() {
    let gen = generator().with_solution_finder(Arc::new(EmptyRecommendationFinder));
    let request = GenerationRequest::new("sort a list", CodeType::Script, Language::Go);

    let result = gen.generate(&request).await.unwrap();
    assert_eq!(result.code, "# TODO: Implement sort a list");
}

#[tokio::test]
async fn test_finder_error_is_absorbed() {
    let gen = generator().with_solution_finder(Arc::new(BrokenFinder));
    let request = GenerationRequest::new("make a widget", CodeType::Class, Language::Python);

    let result = gen.generate(&request).await.unwrap();
    assert!(result.code.contains("class "));
}

#[tokio::test]
async fn test_empty_store_without_llm_yields_todo() {
    let gen = CodeGenerator::new(TemplateStore::empty(), FormatterAdapter::identity());
    let request = GenerationRequest::new("add two numbers", CodeType::Function, Language::Python);

    let result = gen.generate(&request).await.unwrap();

    assert_eq!(result.code, "# TODO: Implement add two numbers");
    assert_eq!(result.quality_score, 0.0);
    assert!(result.tests.is_none());
    assert!(result.documentation.is_none());
}

#[tokio::test]
async fn test_refactor_is_not_formatted() {
    let gen = CodeGenerator::new(
        TemplateStore::builtin().unwrap(),
        FormatterAdapter::identity().with_python_formatter(MarkingFormatter),
    );
    let engine = Arc::new(ScriptedEngine::new([
        "```python\ny = 2\n```",
        "```python\nz = 3\n```",
    ]));
    let gen = gen.with_llm(engine.clone());

    assert_eq!(
        gen.refactor("y=2", Language::Python, &["readability".to_string()])
            .await
            .unwrap(),
        "y = 2"
    );
    assert_eq!(
        gen.optimize("z=3", Language::Python).await.unwrap(),
        "z = 3\n# formatted"
    );
    assert!(engine.calls()[0].0.contains("readability"));
}
