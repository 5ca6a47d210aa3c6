use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一次成功的自修改记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModificationRecord {
    pub id: String,
    /// 调用方传入的目标路径（回滚时按此精确匹配）
    pub file: PathBuf,
    pub request: String,
    pub timestamp: DateTime<Utc>,
    pub backup: PathBuf,
}

impl ModificationRecord {
    pub fn new(file: impl Into<PathBuf>, request: impl Into<String>, backup: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file: file.into(),
            request: request.into(),
            timestamp: Utc::now(),
            backup: backup.into(),
        }
    }
}
