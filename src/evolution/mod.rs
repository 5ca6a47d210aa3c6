//! 受限自修改：白名单、备份、LLM 改写与回滚

pub mod history;
pub mod modifier;
pub mod safety;
pub mod types;

pub use history::HistoryFile;
pub use modifier::{validate_modification, SelfModifier};
pub use safety::AllowList;
pub use types::ModificationRecord;
