//! DeepSeek 后端（OpenAI 兼容协议）
//!
//! - Base URL: https://api.deepseek.com（可被 `llm.base_url` 覆盖）
//! - 模型: 默认 deepseek-chat，可由 `llm.model` 或 `DEEPSEEK_MODEL` 指定

use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

fn api_key() -> Option<String> {
    std::env::var("DEEPSEEK_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// 创建 DeepSeek 客户端；`DEEPSEEK_API_KEY`（或 `OPENAI_API_KEY`）未设置时返回 None
///
/// 模型优先级：参数 → `DEEPSEEK_MODEL` → deepseek-chat
pub fn create_deepseek_client(model: Option<&str>, base_url: Option<&str>) -> Option<OpenAiClient> {
    let api_key = api_key()?;
    let model = model
        .map(String::from)
        .or_else(|| std::env::var("DEEPSEEK_MODEL").ok())
        .unwrap_or_else(|| DEEPSEEK_CHAT.to_string());
    tracing::info!("Using DeepSeek model {}", model);

    Some(OpenAiClient::new(
        Some(base_url.unwrap_or(DEEPSEEK_BASE_URL)),
        &model,
        Some(api_key.as_str()),
    ))
}
