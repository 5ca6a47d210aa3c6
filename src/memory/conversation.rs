//! 话题记忆
//!
//! 每个话题保留最近 N 轮（prompt, 回复），请求时展开为 user/assistant 消息作为上下文。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// 一轮问答
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub prompt: String,
    pub response: String,
}

/// 最近 max_turns 轮问答；超出时丢弃最旧的一轮
#[derive(Clone, Debug)]
pub struct ConversationMemory {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    pub fn record(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        if self.max_turns == 0 {
            return;
        }
        if self.turns.len() == self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(Turn {
            prompt: prompt.into(),
            response: response.into(),
        });
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// 按时间顺序展开为 user/assistant 消息
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|t| [Message::user(&t.prompt), Message::assistant(&t.response)])
            .collect()
    }

    /// 保留的轮数
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
