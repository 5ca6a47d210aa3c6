//! 代码生成的数据模型：语言、代码类型、请求与结果

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 支持的编程语言（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Java,
    Cpp,
    Shell,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Go,
        Language::Rust,
        Language::Java,
        Language::Cpp,
        Language::Shell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Shell => "shell",
        }
    }

    /// 按文件扩展名推断语言
    pub fn from_extension(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "py" => Some(Language::Python),
            "js" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" => Some(Language::TypeScript),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "java" => Some(Language::Java),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
            "sh" | "bash" => Some(Language::Shell),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 代码生成任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    Function,
    Class,
    Module,
    Script,
    Test,
    Refactor,
    Optimization,
    Documentation,
    SelfModification,
}

impl CodeType {
    pub const ALL: [CodeType; 9] = [
        CodeType::Function,
        CodeType::Class,
        CodeType::Module,
        CodeType::Script,
        CodeType::Test,
        CodeType::Refactor,
        CodeType::Optimization,
        CodeType::Documentation,
        CodeType::SelfModification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeType::Function => "function",
            CodeType::Class => "class",
            CodeType::Module => "module",
            CodeType::Script => "script",
            CodeType::Test => "test",
            CodeType::Refactor => "refactor",
            CodeType::Optimization => "optimization",
            CodeType::Documentation => "documentation",
            CodeType::SelfModification => "self_modification",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl FromStr for Language {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.as_str() == lower)
            .ok_or(ParseEnumError {
                kind: "language",
                value: s.to_string(),
            })
    }
}

impl FromStr for CodeType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace('-', "_");
        CodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or(ParseEnumError {
                kind: "code type",
                value: s.to_string(),
            })
    }
}

/// 一次代码生成请求；构造后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub description: String,
    pub code_type: CodeType,
    pub language: Language,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    /// 参考示例；为空表示未提供
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl GenerationRequest {
    pub fn new(description: impl Into<String>, code_type: CodeType, language: Language) -> Self {
        Self {
            description: description.into(),
            code_type,
            language,
            requirements: Vec::new(),
            constraints: Vec::new(),
            examples: Vec::new(),
            context: HashMap::new(),
        }
    }

    pub fn with_requirements<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_constraints<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_examples<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// 生成结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedCode {
    pub code: String,
    pub language: Language,
    pub description: String,
    pub tests: Option<String>,
    pub documentation: Option<String>,
    /// 保留字段，始终为 0
    pub complexity_score: f64,
    /// 质量分，位于 [0, 1]
    pub quality_score: f64,
}

impl GeneratedCode {
    pub fn new(code: impl Into<String>, language: Language, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language,
            description: description.into(),
            tests: None,
            documentation: None,
            complexity_score: 0.0,
            quality_score: 0.0,
        }
    }
}
