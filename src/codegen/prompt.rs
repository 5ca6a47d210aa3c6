//! Prompt 构造：纯函数，无 IO

use super::types::{GenerationRequest, Language};
use crate::solutions::SolutionCandidate;

/// 代码生成 prompt：标题、描述、需求、约束（非空时）、示例（非空时）、结尾要求
pub fn build_generation_prompt(request: &GenerationRequest) -> String {
    let mut parts = vec![
        format!(
            "Generate {} code in {}.",
            request.code_type, request.language
        ),
        format!("Description: {}", request.description),
        "\nRequirements:".to_string(),
    ];
    parts.extend(request.requirements.iter().map(|r| format!("- {}", r)));

    if !request.constraints.is_empty() {
        parts.push("\nConstraints:".to_string());
        parts.extend(request.constraints.iter().map(|c| format!("- {}", c)));
    }

    if !request.examples.is_empty() {
        parts.push("\nExamples for reference:".to_string());
        parts.extend(request.examples.iter().map(|e| format!("```\n{}\n```", e)));
    }

    parts.push("\nGenerate clean, efficient, well-documented code.".to_string());
    parts.push("Include error handling and edge cases.".to_string());
    parts.push("Follow best practices and coding standards.".to_string());
    parts.push(format!("Output the code in {} format.", request.language));

    parts.join("\n")
}

pub fn build_test_prompt(code: &str, language: Language) -> String {
    format!(
        "Generate comprehensive tests for the following {lang} code:\n\n\
         ```{lang}\n{code}\n```\n\n\
         Generate unit tests that:\n\
         - Test normal cases\n\
         - Test edge cases\n\
         - Test error conditions\n\
         - Achieve high code coverage\n\
         - Follow testing best practices for {lang}\n",
        lang = language,
        code = code
    )
}

pub fn build_documentation_prompt(code: &str, language: Language) -> String {
    format!(
        "Generate comprehensive documentation for the following {lang} code:\n\n\
         ```{lang}\n{code}\n```\n\n\
         Include:\n\
         - Overview and purpose\n\
         - Usage examples\n\
         - Parameter descriptions\n\
         - Return value documentation\n\
         - Potential errors/exceptions\n\
         - Performance considerations\n",
        lang = language,
        code = code
    )
}

pub fn build_optimize_prompt(code: &str, language: Language) -> String {
    format!(
        "Optimize the following {lang} code for:\n\
         - Performance\n\
         - Memory usage\n\
         - Readability\n\
         - Best practices\n\n\
         Code:\n```{lang}\n{code}\n```\n\n\
         Generate optimized version:\n",
        lang = language,
        code = code
    )
}

pub fn build_refactor_prompt(code: &str, language: Language, goals: &[String]) -> String {
    let goals = goals
        .iter()
        .map(|g| format!("- {}", g))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Refactor the following {lang} code to achieve these goals:\n{goals}\n\n\
         Code:\n```{lang}\n{code}\n```\n\n\
         Generate refactored version:\n",
        lang = language,
        goals = goals,
        code = code
    )
}

pub fn build_library_usage_prompt(request: &GenerationRequest, library: &SolutionCandidate) -> String {
    format!(
        "Generate {lang} code that uses the '{name}' library\n\
         to implement: {description}\n\n\
         The library provides: {provides}\n\
         Installation: {installation}\n\n\
         Generate clean, production-ready code that properly uses this library:\n",
        lang = request.language,
        name = library.name,
        description = request.description,
        provides = library.description,
        installation = library.installation
    )
}

/// 自修改 prompt：附原始代码与修改要求
pub fn build_modification_prompt(original_code: &str, modification_request: &str) -> String {
    format!(
        "Modify the following code according to the request:\n\n\
         Original Code:\n```python\n{original}\n```\n\n\
         Modification Request:\n{request}\n\n\
         Requirements:\n\
         - Preserve existing functionality unless explicitly changed\n\
         - Maintain code style and conventions\n\
         - Add appropriate error handling\n\
         - Include comments for significant changes\n\
         - Ensure backward compatibility\n\n\
         Generate the complete modified code:\n",
        original = original_code,
        request = modification_request
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::CodeType;

    #[test]
    fn test_generation_prompt_minimal() {
        let request = GenerationRequest::new("add two numbers", CodeType::Function, Language::Python)
            .with_requirements(["handle ints", "handle floats"]);

        let prompt = build_generation_prompt(&request);
        let expected = "Generate function code in python.\n\
                        Description: add two numbers\n\
                        \nRequirements:\n\
                        - handle ints\n\
                        - handle floats\n\
                        \nGenerate clean, efficient, well-documented code.\n\
                        Include error handling and edge cases.\n\
                        Follow best practices and coding standards.\n\
                        Output the code in python format.";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_generation_prompt_sections_in_order() {
        let request = GenerationRequest::new("parse dates", CodeType::Module, Language::Rust)
            .with_requirements(["iso8601"])
            .with_constraints(["no unsafe"])
            .with_examples(["parse(\"2024-01-01\")"]);

        let prompt = build_generation_prompt(&request);
        let req = prompt.find("\nRequirements:").unwrap();
        let cons = prompt.find("\nConstraints:\n- no unsafe").unwrap();
        let ex = prompt.find("\nExamples for reference:\n```\nparse(\"2024-01-01\")\n```").unwrap();
        let tail = prompt.find("Output the code in rust format.").unwrap();
        assert!(req < cons && cons < ex && ex < tail);
        assert!(prompt.starts_with("Generate module code in rust."));
    }

    #[test]
    fn test_refactor_prompt_lists_goals() {
        let prompt = build_refactor_prompt(
            "x = 1",
            Language::Python,
            &["extract helpers".to_string(), "add typing".to_string()],
        );
        assert!(prompt.contains("goals:\n- extract helpers\n- add typing\n\nCode:\n```python\nx = 1\n```"));
    }
}
