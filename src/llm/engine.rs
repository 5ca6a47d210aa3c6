//! 带记忆的 LLM 引擎
//!
//! 在任意 `LlmClient` 之上实现 `LlmEngine::query_with_memory`：
//! 每个话题（coding / documentation / …）一份短期对话记忆，请求时按
//! system prompt + 历史 + 本次 prompt 组装消息，成功后把这一轮写回记忆。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::llm::{
    create_deepseek_client, LlmClient, LlmEngine, LlmError, MockLlmClient, OpenAiClient,
    QueryMetadata,
};
use crate::memory::{ConversationMemory, Message};

pub const TOPIC_CODING: &str = "coding";
pub const TOPIC_DOCUMENTATION: &str = "documentation";

fn system_prompt(topic: &str) -> &'static str {
    match topic {
        TOPIC_CODING => {
            "You are an expert software engineer. Answer with complete, working code \
             inside a single fenced code block."
        }
        TOPIC_DOCUMENTATION => {
            "You are a technical writer. Produce clear Markdown documentation for the code you are given."
        }
        _ => "You are a helpful programming assistant.",
    }
}

/// 以话题为键的记忆引擎
pub struct MemoryLlmEngine {
    client: Arc<dyn LlmClient>,
    max_turns: usize,
    /// 单次请求超时（秒），0 表示不限时
    timeout_secs: u64,
    memories: Mutex<HashMap<String, ConversationMemory>>,
}

impl MemoryLlmEngine {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            max_turns: 10,
            timeout_secs: 0,
            memories: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn memories(&self) -> MutexGuard<'_, HashMap<String, ConversationMemory>> {
        self.memories.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// 某话题当前保留的轮数
    pub fn memory_len(&self, topic: &str) -> usize {
        self.memories().get(topic).map(|m| m.len()).unwrap_or(0)
    }

    async fn call(&self, messages: &[Message]) -> Result<String, LlmError> {
        let fut = self.client.complete(messages);
        let result = if self.timeout_secs > 0 {
            tokio::time::timeout(Duration::from_secs(self.timeout_secs), fut)
                .await
                .map_err(|_| LlmError::Timeout(self.timeout_secs))?
        } else {
            fut.await
        };
        result.map_err(LlmError::Request)
    }
}

#[async_trait]
impl LlmEngine for MemoryLlmEngine {
    async fn query_with_memory(
        &self,
        prompt: &str,
        topic: &str,
    ) -> Result<(String, QueryMetadata), LlmError> {
        // 锁只在组装消息时持有，不跨 await
        let history: Vec<Message> = self
            .memories()
            .get(topic)
            .map(ConversationMemory::to_messages)
            .unwrap_or_default();

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt(topic)));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(prompt));

        let started = Instant::now();
        let response = self.call(&messages).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (_, _, total_tokens) = self.client.token_usage();
        tracing::debug!(topic, elapsed_ms, total_tokens, "llm query completed");

        {
            let mut memories = self.memories();
            let memory = memories
                .entry(topic.to_string())
                .or_insert_with(|| ConversationMemory::new(self.max_turns));
            memory.record(prompt, response.as_str());
        }

        Ok((
            response,
            QueryMetadata {
                topic: topic.to_string(),
                elapsed_ms,
                history_len: history.len(),
            },
        ))
    }
}

/// 根据配置创建 LLM 引擎；provider = none 时返回 None（走模板回退）
pub fn create_engine_from_config(cfg: &AppConfig) -> Option<Arc<dyn LlmEngine>> {
    let provider = cfg.llm.provider.to_lowercase();
    let client: Arc<dyn LlmClient> = match provider.as_str() {
        "none" | "" => {
            tracing::info!("No LLM provider configured, using template fallback");
            return None;
        }
        "mock" => {
            tracing::info!("Using Mock LLM");
            Arc::new(MockLlmClient::new())
        }
        "deepseek" => {
            match create_deepseek_client(cfg.llm.model.as_deref(), cfg.llm.base_url.as_deref()) {
                Some(client) => Arc::new(client),
                None => {
                    tracing::warn!("provider = deepseek but no API key set, using template fallback");
                    return None;
                }
            }
        }
        "openai" => {
            let api_key = match std::env::var("OPENAI_API_KEY") {
                Ok(key) => key,
                Err(_) => {
                    tracing::warn!("provider = openai but OPENAI_API_KEY is not set, using template fallback");
                    return None;
                }
            };
            let model = cfg
                .llm
                .model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &model,
                Some(api_key.as_str()),
            ))
        }
        other => {
            tracing::warn!("Unknown LLM provider '{}', using template fallback", other);
            return None;
        }
    };

    Some(Arc::new(
        MemoryLlmEngine::new(client)
            .with_max_turns(cfg.llm.max_memory_turns)
            .with_timeout_secs(cfg.llm.timeouts.request),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    struct CountingClient;

    #[async_trait]
    impl LlmClient for CountingClient {
        async fn complete(&self, messages: &[Message]) -> Result<String, String> {
            Ok(format!("{} messages", messages.len()))
        }
    }

    #[tokio::test]
    async fn test_memory_is_per_topic() {
        let engine = MemoryLlmEngine::new(Arc::new(CountingClient));

        let (first, meta) = engine.query_with_memory("a", TOPIC_CODING).await.unwrap();
        assert_eq!(first, "2 messages");
        assert_eq!(meta.history_len, 0);

        let (second, meta) = engine.query_with_memory("b", TOPIC_CODING).await.unwrap();
        assert_eq!(second, "4 messages");
        assert_eq!(meta.history_len, 2);

        let (docs, _) = engine
            .query_with_memory("c", TOPIC_DOCUMENTATION)
            .await
            .unwrap();
        assert_eq!(docs, "2 messages");
        assert_eq!(engine.memory_len(TOPIC_CODING), 2);
    }

    #[tokio::test]
    async fn test_memory_pruned_to_max_turns() {
        let engine = MemoryLlmEngine::new(Arc::new(CountingClient)).with_max_turns(1);
        for prompt in ["a", "b", "c"] {
            engine.query_with_memory(prompt, TOPIC_CODING).await.unwrap();
        }
        assert_eq!(engine.memory_len(TOPIC_CODING), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let engine = MemoryLlmEngine::new(Arc::new(SlowClient)).with_timeout_secs(1);
        let err = engine
            .query_with_memory("x", TOPIC_CODING)
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::Timeout(1));
        assert_eq!(engine.memory_len(TOPIC_CODING), 0);
    }

    #[test]
    fn test_provider_none_disables_engine() {
        let cfg = AppConfig::default();
        assert!(create_engine_from_config(&cfg).is_none());
    }

    #[test]
    fn test_provider_mock() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        assert!(create_engine_from_config(&cfg).is_some());
    }
}
