//! 记忆层：按话题保存的短期对话记忆（由 LLM 引擎持有）

pub mod conversation;

pub use conversation::{ConversationMemory, Message, Role, Turn};
