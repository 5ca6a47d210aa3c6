//! 错误类型
//!
//! 生成流程与自修改流程各自一套错误；预期内的失败（白名单拦截、校验不通过、缺少 LLM）
//! 都以 `Err` 返回并记录日志，调用方检查返回值即可，不会 panic。

use std::path::PathBuf;

use thiserror::Error;

use crate::codegen::templates::TemplateError;
use crate::llm::LlmError;

/// 代码生成过程中的错误
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// 自修改 / 回滚过程中的错误
#[derive(Error, Debug)]
pub enum ModifyError {
    /// 目标不在白名单内（安全闸门，不是安全边界）
    #[error("Self-modification blocked for safety: {0}")]
    Blocked(PathBuf),

    #[error("Target file not found: {0}")]
    NotFound(PathBuf),

    /// 配置错误：自修改必须有 LLM 引擎
    #[error("LLM engine required for self-modification")]
    MissingLlm,

    #[error("Modification validation failed: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No backup found for {0}")]
    NoBackup(PathBuf),

    #[error("History persistence failed: {0}")]
    History(String),
}

impl ModifyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 是否属于配置类错误（缺少协作方）
    pub fn is_configuration(&self) -> bool {
        matches!(self, ModifyError::MissingLlm)
    }
}
