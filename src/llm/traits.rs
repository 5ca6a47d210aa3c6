//! LLM 抽象
//!
//! 两层：
//! - `LlmClient`：具体后端（OpenAI 兼容 / DeepSeek / Mock），输入消息列表，返回一条完成文本
//! - `LlmEngine`：代码生成侧看到的协作方接口 `query_with_memory(prompt, topic)`，返回文本与元数据

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::memory::Message;

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// LLM 调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
}

/// 单次查询的元数据
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryMetadata {
    /// 话题标签（coding / documentation）
    pub topic: String,
    pub elapsed_ms: u64,
    /// 本次请求携带的历史消息条数（不含本条 prompt）
    pub history_len: usize,
}

/// 代码生成使用的 LLM 引擎：按话题维护记忆，一次调用一个 await 点
#[async_trait]
pub trait LlmEngine: Send + Sync {
    async fn query_with_memory(
        &self,
        prompt: &str,
        topic: &str,
    ) -> Result<(String, QueryMetadata), LlmError>;
}
