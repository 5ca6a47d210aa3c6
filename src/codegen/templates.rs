//! 模板库：`{language}_{code_type}` → 参数化模板
//!
//! 构造时校验：键不重复、模板体中的占位符都在 variables 中声明。构造后只读。

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::types::{CodeType, GenerationRequest, Language};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("duplicate template key: {0}")]
    DuplicateKey(String),

    #[error("template '{template}' uses undeclared placeholder '{placeholder}'")]
    UndeclaredPlaceholder { template: String, placeholder: String },
}

/// 代码模板
#[derive(Debug, Clone)]
pub struct CodeTemplate {
    /// 即查找键，如 python_function
    pub name: String,
    pub language: Language,
    /// 模板体，占位符形如 `{function_name}`
    pub template: String,
    /// 占位符名称（有序）
    pub variables: Vec<String>,
    pub description: String,
}

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

impl CodeTemplate {
    pub fn new(
        name: impl Into<String>,
        language: Language,
        template: impl Into<String>,
        variables: &[&str],
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            language,
            template: template.into(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            description: description.into(),
        }
    }

    fn check_placeholders(&self) -> Result<(), TemplateError> {
        for cap in placeholder_re().captures_iter(&self.template) {
            let name = &cap[1];
            if !self.variables.iter().any(|v| v == name) {
                return Err(TemplateError::UndeclaredPlaceholder {
                    template: self.name.clone(),
                    placeholder: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// 用给定变量替换模板体中声明过的占位符（单遍替换，替换值中的花括号不会被再次解析）
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        placeholder_re()
            .replace_all(&self.template, |cap: &regex::Captures| {
                let name = &cap[1];
                values
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| cap[0].to_string())
            })
            .into_owned()
    }

    /// 按请求为每个声明的占位符取值：description 取请求描述，function_name 由描述派生，其余为 TODO 标记
    pub fn variables_for(&self, request: &GenerationRequest) -> HashMap<String, String> {
        self.variables
            .iter()
            .map(|var| {
                let value = match var.as_str() {
                    "description" => request.description.clone(),
                    "function_name" => function_name_from(&request.description),
                    other => format!("# TODO: {}", other),
                };
                (var.clone(), value)
            })
            .collect()
    }
}

/// 描述 → 函数名：小写、空格转下划线、去掉 `[A-Za-z0-9_]` 以外字符、截断到 30 个字符
pub fn function_name_from(description: &str) -> String {
    description
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(30)
        .collect()
}

pub fn template_key(language: Language, code_type: CodeType) -> String {
    format!("{}_{}", language, code_type)
}

/// 模板库
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: HashMap<String, CodeTemplate>,
}

impl TemplateStore {
    /// 由模板列表构造；键重复或占位符未声明时报错
    pub fn new(templates: Vec<CodeTemplate>) -> Result<Self, TemplateError> {
        let mut map = HashMap::with_capacity(templates.len());
        for template in templates {
            template.check_placeholders()?;
            if map.contains_key(&template.name) {
                return Err(TemplateError::DuplicateKey(template.name));
            }
            map.insert(template.name.clone(), template);
        }
        Ok(Self { templates: map })
    }

    /// 空库：所有查找都落到 TODO 回退
    pub fn empty() -> Self {
        Self::default()
    }

    /// 内置模板
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::new(builtin_templates())
    }

    pub fn lookup(&self, language: Language, code_type: CodeType) -> Option<&CodeTemplate> {
        self.templates.get(&template_key(language, code_type))
    }

    pub fn get(&self, key: &str) -> Option<&CodeTemplate> {
        self.templates.get(key)
    }

    /// 已注册的键（排序后）
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn builtin_templates() -> Vec<CodeTemplate> {
    vec![
        CodeTemplate::new(
            "python_function",
            Language::Python,
            "def {function_name}({parameters}){type_hints}:\n    \"\"\"\n    {description}\n    \n    Args:\n        {args_description}\n    \n    Returns:\n        {return_description}\n    \"\"\"\n    {implementation}\n",
            &[
                "function_name",
                "parameters",
                "type_hints",
                "description",
                "args_description",
                "return_description",
                "implementation",
            ],
            "Template for Python functions",
        ),
        CodeTemplate::new(
            "python_class",
            Language::Python,
            "class {class_name}({base_classes}):\n    \"\"\"\n    {description}\n    \n    Attributes:\n        {attributes_description}\n    \"\"\"\n    \n    def __init__(self, {init_parameters}):\n        \"\"\"Initialize {class_name}\"\"\"\n        {init_implementation}\n    \n    {methods}\n",
            &[
                "class_name",
                "base_classes",
                "description",
                "attributes_description",
                "init_parameters",
                "init_implementation",
                "methods",
            ],
            "Template for Python classes",
        ),
        // 没有 async 代码类型，lookup 永远命中不到这一条，只能按键取
        CodeTemplate::new(
            "python_async",
            Language::Python,
            "async def {function_name}({parameters}){type_hints}:\n    \"\"\"\n    {description}\n    \n    Async function for {purpose}\n    \"\"\"\n    {implementation}\n",
            &[
                "function_name",
                "parameters",
                "type_hints",
                "description",
                "purpose",
                "implementation",
            ],
            "Template for async Python functions",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys() {
        let store = TemplateStore::builtin().unwrap();
        assert_eq!(store.keys(), vec!["python_async", "python_class", "python_function"]);
        assert!(store.lookup(Language::Python, CodeType::Function).is_some());
        assert!(store.lookup(Language::Go, CodeType::Function).is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let t = CodeTemplate::new("go_function", Language::Go, "func {name}() {}", &["name"], "");
        let err = TemplateStore::new(vec![t.clone(), t]).unwrap_err();
        assert_eq!(err, TemplateError::DuplicateKey("go_function".to_string()));
    }

    #[test]
    fn test_undeclared_placeholder_rejected() {
        let t = CodeTemplate::new("go_function", Language::Go, "func {name}() { {body} }", &["name"], "");
        assert!(matches!(
            TemplateStore::new(vec![t]),
            Err(TemplateError::UndeclaredPlaceholder { .. })
        ));
    }

    #[test]
    fn test_function_name_derivation() {
        assert_eq!(function_name_from("Add two numbers"), "add_two_numbers");
        assert_eq!(function_name_from("parse a CSV-file (fast)!"), "parse_a_csvfile_fast");
        let long = function_name_from("compute the rolling average of a very long series");
        assert_eq!(long.len(), 30);
        assert_eq!(long, "compute_the_rolling_average_of");
    }

    #[test]
    fn test_render_fills_every_placeholder() {
        let store = TemplateStore::builtin().unwrap();
        let template = store.lookup(Language::Python, CodeType::Function).unwrap();
        let request = GenerationRequest::new("add two numbers", CodeType::Function, Language::Python);

        let code = template.render(&template.variables_for(&request));
        assert!(code.starts_with("def add_two_numbers(# TODO: parameters)# TODO: type_hints:"));
        assert!(code.contains("    add two numbers\n"));
        assert!(code.contains("# TODO: implementation"));
        assert!(!placeholder_re().is_match(&code));
    }
}
