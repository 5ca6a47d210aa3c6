//! 集成测试共用：按脚本依次回复的 LLM 引擎，并记录收到的 prompt 与话题

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use auto_coder::llm::{LlmEngine, LlmError, QueryMetadata};

pub struct ScriptedEngine {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedEngine {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (prompt, topic)，按调用顺序
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, topic)| topic).collect()
    }
}

#[async_trait]
impl LlmEngine for ScriptedEngine {
    async fn query_with_memory(
        &self,
        prompt: &str,
        topic: &str,
    ) -> Result<(String, QueryMetadata), LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), topic.to_string()));
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => Ok((
                response,
                QueryMetadata {
                    topic: topic.to_string(),
                    ..Default::default()
                },
            )),
            None => Err(LlmError::Request("script exhausted".to_string())),
        }
    }
}
