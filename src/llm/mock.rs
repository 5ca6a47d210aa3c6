//! Mock LLM 客户端（用于测试与离线演示，无需 API）
//!
//! 预置回复按顺序弹出；用完后把最后一条 User 消息包进代码块回显。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// Mock 客户端：先返回预置回复，再回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置按顺序返回的回复
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    fn next_scripted(&self) -> Option<String> {
        self.responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Some(reply) = self.next_scripted() {
            return Ok(reply);
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!("```\n# Echo from Mock\n# {}\n```", last_user.lines().next().unwrap_or("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_then_echo() {
        let client = MockLlmClient::with_responses(["first", "second"]);
        let msgs = vec![Message::user("hello world")];

        assert_eq!(client.complete(&msgs).await.unwrap(), "first");
        assert_eq!(client.complete(&msgs).await.unwrap(), "second");

        let echoed = client.complete(&msgs).await.unwrap();
        assert!(echoed.starts_with("```"));
        assert!(echoed.contains("hello world"));
    }
}
