//! Auto Coder - LLM 驱动的代码生成与受限自修改
//!
//! 模块划分：
//! - **codegen**: 生成编排器、模板库、Prompt、代码块提取、质量评分、格式化
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **evolution**: 自修改（白名单、备份、回滚、历史）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）及话题记忆引擎
//! - **memory**: 对话记忆
//! - **observability**: 日志初始化
//! - **solutions**: 开源方案查找（写代码前先找现成的库）

pub mod codegen;
pub mod config;
pub mod core;
pub mod evolution;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod solutions;

pub use codegen::{CodeGenerator, CodeType, GeneratedCode, GenerationRequest, Language};
pub use evolution::SelfModifier;
