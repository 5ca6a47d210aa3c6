//! 代码生成：模板库、Prompt 构造、回复提取、质量启发式、格式化适配与编排器

pub mod extract;
pub mod format;
pub mod generator;
pub mod prompt;
pub mod quality;
pub mod templates;
pub mod types;

pub use extract::extract_code;
pub use format::{CodeFormatter, ExternalFormatter, FormatError, FormatterAdapter};
pub use generator::CodeGenerator;
pub use quality::{analyze_javascript, analyze_python, parse_python, quality_score};
pub use templates::{function_name_from, CodeTemplate, TemplateError, TemplateStore};
pub use types::{CodeType, GeneratedCode, GenerationRequest, Language, ParseEnumError};
