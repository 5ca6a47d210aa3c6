//! 代码生成编排器
//!
//! 顺序：开源方案查找 →（有库）库用法代码 /（有 LLM）LLM 生成 /（都没有）模板回退 →
//! 提取、格式化、质量评分。每个外部调用一个 await 点，内部不并行。

use std::sync::Arc;

use crate::core::CodegenError;
use crate::llm::{LlmEngine, TOPIC_CODING, TOPIC_DOCUMENTATION};
use crate::solutions::{SolutionCandidate, SolutionCheck, SolutionFinder, SolutionLevel};

use super::extract::extract_code;
use super::format::FormatterAdapter;
use super::prompt;
use super::quality::quality_score;
use super::templates::TemplateStore;
use super::types::{CodeType, GeneratedCode, GenerationRequest, Language};

/// 库方案固定质量分
const LIBRARY_QUALITY_SCORE: f64 = 0.9;

const DOCUMENTATION_PENDING: &str = "# Documentation pending";

/// 代码生成器：调用方构造并持有，无全局实例
pub struct CodeGenerator {
    llm: Option<Arc<dyn LlmEngine>>,
    finder: Option<Arc<dyn SolutionFinder>>,
    templates: TemplateStore,
    formatter: FormatterAdapter,
}

impl CodeGenerator {
    pub fn new(templates: TemplateStore, formatter: FormatterAdapter) -> Self {
        Self {
            llm: None,
            finder: None,
            templates,
            formatter,
        }
    }

    /// 使用内置模板库
    pub fn with_builtin_templates(formatter: FormatterAdapter) -> Result<Self, CodegenError> {
        Ok(Self::new(TemplateStore::builtin()?, formatter))
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmEngine>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_solution_finder(mut self, finder: Arc<dyn SolutionFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// 生成代码
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedCode, CodegenError> {
        tracing::info!(
            "Generating {} in {}",
            request.code_type,
            request.language
        );

        if let Some(check) = self.check_for_existing_solution(request).await {
            if check.should_use_library {
                if let Some(best) = check.solutions.first() {
                    tracing::info!("Found open source solution: {}", check.recommendation);
                    return self.generate_library_usage(request, best, &check).await;
                }
                tracing::warn!("Solution finder recommended a library but listed none");
            }
        }

        tracing::info!("No suitable open source solution found, generating custom code");
        match &self.llm {
            Some(llm) => self.generate_with_llm(llm.as_ref(), request).await,
            None => Ok(self.generate_with_templates(request)),
        }
    }

    /// 查询外部方案；查找失败只记录，不影响后续生成
    async fn check_for_existing_solution(&self, request: &GenerationRequest) -> Option<SolutionCheck> {
        let finder = self.finder.as_ref()?;
        let level = SolutionLevel::for_code_type(request.code_type);
        match finder
            .check_before_coding(
                &request.description,
                level,
                &request.requirements,
                &request.constraints,
            )
            .await
        {
            Ok(check) => Some(check),
            Err(e) => {
                tracing::warn!("Solution lookup failed, continuing with custom code: {}", e);
                None
            }
        }
    }

    async fn generate_with_llm(
        &self,
        llm: &dyn LlmEngine,
        request: &GenerationRequest,
    ) -> Result<GeneratedCode, CodegenError> {
        let generation_prompt = prompt::build_generation_prompt(request);
        let (response, _) = llm.query_with_memory(&generation_prompt, TOPIC_CODING).await?;
        let code = extract_code(&response, request.language);
        let code = self.formatter.format(&code, request.language).await;

        let tests = if request.code_type != CodeType::Test {
            self.generate_tests(&code, request).await?
        } else {
            None
        };
        let documentation = self.generate_documentation(&code, request).await?;
        let quality = quality_score(&code, request.language);

        Ok(GeneratedCode {
            tests,
            documentation: Some(documentation),
            quality_score: quality,
            ..GeneratedCode::new(code, request.language, request.description.clone())
        })
    }

    /// 无 LLM 的回退：按 `language_codetype` 取模板填充；没有模板时返回单行 TODO
    pub fn generate_with_templates(&self, request: &GenerationRequest) -> GeneratedCode {
        let code = match self.templates.lookup(request.language, request.code_type) {
            Some(template) => template.render(&template.variables_for(request)),
            None => format!("# TODO: Implement {}", request.description),
        };
        GeneratedCode::new(code, request.language, request.description.clone())
    }

    async fn generate_library_usage(
        &self,
        request: &GenerationRequest,
        library: &SolutionCandidate,
        check: &SolutionCheck,
    ) -> Result<GeneratedCode, CodegenError> {
        let mut code = format!(
            "\n# Using {name} library instead of custom implementation\n# {description}\n# Installation: {installation}\n\n{example}\n\n# Implementation using {name}:\n",
            name = library.name,
            description = library.description,
            installation = library.installation,
            example = check.code_example.as_deref().unwrap_or(""),
        );

        match &self.llm {
            Some(llm) => {
                let usage_prompt = prompt::build_library_usage_prompt(request, library);
                let (response, _) = llm.query_with_memory(&usage_prompt, TOPIC_CODING).await?;
                code.push_str(&extract_code(&response, request.language));
            }
            None => {
                code.push_str(&format!(
                    "\nimport {name}\n\n# TODO: Implement using {name}\n# See documentation: {url}\n",
                    name = library.name,
                    url = library.url
                ));
            }
        }
        let code = self.formatter.format(&code, request.language).await;

        let why = if library.pros.is_empty() {
            "Well-maintained, tested solution".to_string()
        } else {
            library.pros.join(", ")
        };
        let documentation = format!(
            "\n## Implementation using {name}\n\n\
             This implementation uses the open source library '{name}' instead of custom code.\n\n\
             ### Why use this library?\n{why}\n\n\
             ### Installation\n```bash\n{installation}\n```\n\n\
             ### Documentation\n{url}\n\n\
             ### Match Score\n{score:.2} - {recommendation}\n",
            name = library.name,
            why = why,
            installation = library.installation,
            url = library.url,
            score = library.match_score,
            recommendation = check.recommendation,
        );

        Ok(GeneratedCode {
            documentation: Some(documentation),
            quality_score: LIBRARY_QUALITY_SCORE,
            ..GeneratedCode::new(
                code,
                request.language,
                format!("Implementation using {}: {}", library.name, request.description),
            )
        })
    }

    /// 为代码生成测试；无 LLM 时返回 None
    pub async fn generate_tests(
        &self,
        code: &str,
        request: &GenerationRequest,
    ) -> Result<Option<String>, CodegenError> {
        let Some(llm) = &self.llm else {
            return Ok(None);
        };
        let test_prompt = prompt::build_test_prompt(code, request.language);
        let (response, _) = llm.query_with_memory(&test_prompt, TOPIC_CODING).await?;
        Ok(Some(extract_code(&response, request.language)))
    }

    /// 为代码生成文档（保留原始回复）；无 LLM 时返回占位文本
    pub async fn generate_documentation(
        &self,
        code: &str,
        request: &GenerationRequest,
    ) -> Result<String, CodegenError> {
        let Some(llm) = &self.llm else {
            return Ok(DOCUMENTATION_PENDING.to_string());
        };
        let doc_prompt = prompt::build_documentation_prompt(code, request.language);
        let (response, _) = llm
            .query_with_memory(&doc_prompt, TOPIC_DOCUMENTATION)
            .await?;
        Ok(response)
    }

    pub fn quality_score(&self, code: &str, language: Language) -> f64 {
        quality_score(code, language)
    }

    /// 优化代码；无 LLM 时原样返回
    pub async fn optimize(&self, code: &str, language: Language) -> Result<String, CodegenError> {
        let Some(llm) = &self.llm else {
            return Ok(code.to_string());
        };
        let optimize_prompt = prompt::build_optimize_prompt(code, language);
        let (response, _) = llm.query_with_memory(&optimize_prompt, TOPIC_CODING).await?;
        let optimized = extract_code(&response, language);
        Ok(self.formatter.format(&optimized, language).await)
    }

    /// 按目标重构代码（不格式化）；无 LLM 时原样返回
    pub async fn refactor(
        &self,
        code: &str,
        language: Language,
        goals: &[String],
    ) -> Result<String, CodegenError> {
        let Some(llm) = &self.llm else {
            return Ok(code.to_string());
        };
        let refactor_prompt = prompt::build_refactor_prompt(code, language, goals);
        let (response, _) = llm.query_with_memory(&refactor_prompt, TOPIC_CODING).await?;
        Ok(extract_code(&response, language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> CodeGenerator {
        CodeGenerator::with_builtin_templates(FormatterAdapter::identity()).unwrap()
    }

    #[test]
    fn test_template_fallback_fills_function() {
        let request = GenerationRequest::new("add two numbers", CodeType::Function, Language::Python);
        let result = generator().generate_with_templates(&request);
        assert!(result.code.starts_with("def add_two_numbers("));
        assert_eq!(result.quality_score, 0.0);
        assert!(result.tests.is_none());
        assert!(result.documentation.is_none());
    }

    #[test]
    fn test_builtin_generator_has_no_llm() {
        let gen = generator();
        assert!(!gen.has_llm());
        assert!(gen.templates().get("python_function").is_some());
    }

    #[test]
    fn test_invalid_store_is_template_error() {
        use super::super::templates::{CodeTemplate, TemplateError};

        let twice = || CodeTemplate::new("python_function", Language::Python, "pass", &[], "");
        let err: CodegenError = TemplateStore::new(vec![twice(), twice()]).unwrap_err().into();
        assert!(matches!(
            err,
            CodegenError::Template(TemplateError::DuplicateKey(ref key)) if key == "python_function"
        ));
    }

    #[test]
    fn test_unmatched_template_is_single_todo_line() {
        let request = GenerationRequest::new("sort a list", CodeType::Script, Language::Go);
        let result = generator().generate_with_templates(&request);
        assert_eq!(result.code, "# TODO: Implement sort a list");
        assert!(!result.code.contains('\n'));
    }

    #[tokio::test]
    async fn test_passthrough_without_llm() {
        let gen = generator();
        assert_eq!(gen.optimize("x=1", Language::Python).await.unwrap(), "x=1");
        assert_eq!(
            gen.refactor("x=1", Language::Python, &["simplify".to_string()])
                .await
                .unwrap(),
            "x=1"
        );
        let request = GenerationRequest::new("d", CodeType::Function, Language::Python);
        assert_eq!(gen.generate_tests("x", &request).await.unwrap(), None);
        assert_eq!(
            gen.generate_documentation("x", &request).await.unwrap(),
            "# Documentation pending"
        );
    }
}
