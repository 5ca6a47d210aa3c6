//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）以及带话题记忆的引擎

pub mod deepseek;
pub mod engine;
pub mod mock;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use engine::{create_engine_from_config, MemoryLlmEngine, TOPIC_CODING, TOPIC_DOCUMENTATION};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{LlmClient, LlmEngine, LlmError, QueryMetadata};
