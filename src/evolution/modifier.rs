//! 受限自修改
//!
//! 流程：白名单 → 文件存在 → 需要 LLM → 读原文、请求修改、提取代码 → 校验 →
//! 写备份 → 覆盖目标 → 追加历史。任一步失败都返回 `Err` 并记录 error 日志，
//! 已写出的备份不会被自动删除。
//!
//! 同一路径上的自修改与回滚按路径串行（每个路径一把异步锁），不同路径互不阻塞。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use crate::codegen::{extract_code, parse_python, prompt, Language};
use crate::config::SelfModifySection;
use crate::core::ModifyError;
use crate::evolution::{AllowList, HistoryFile, ModificationRecord};
use crate::llm::{LlmEngine, TOPIC_CODING};

/// 修改结果至少保留的字符数（trim 后）
const MIN_MODIFIED_LEN: usize = 10;

type PathLock = Arc<tokio::sync::Mutex<()>>;

/// 自修改管理器
pub struct SelfModifier {
    llm: Option<Arc<dyn LlmEngine>>,
    allow_list: AllowList,
    backup_extension: String,
    history: RwLock<Vec<ModificationRecord>>,
    history_file: Option<HistoryFile>,
    file_locks: Mutex<HashMap<PathBuf, PathLock>>,
}

impl SelfModifier {
    pub fn new(llm: Option<Arc<dyn LlmEngine>>) -> Self {
        Self {
            llm,
            allow_list: AllowList::default(),
            backup_extension: "bak".to_string(),
            history: RwLock::new(Vec::new()),
            history_file: None,
            file_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 按配置创建；配置了历史文件时加载已有记录
    pub async fn from_config(
        section: &SelfModifySection,
        llm: Option<Arc<dyn LlmEngine>>,
    ) -> Result<Self, ModifyError> {
        let modifier = Self::new(llm)
            .with_allow_list(AllowList::new(&section.allowed_patterns))
            .with_backup_extension(&section.backup_extension);
        match &section.history_path {
            Some(path) => modifier.with_history_file(HistoryFile::new(path)).await,
            None => Ok(modifier),
        }
    }

    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    pub fn with_backup_extension(mut self, ext: impl Into<String>) -> Self {
        self.backup_extension = ext.into();
        self
    }

    pub async fn with_history_file(mut self, file: HistoryFile) -> Result<Self, ModifyError> {
        let records = file
            .load()
            .await
            .map_err(|e| ModifyError::History(format!("{}: {}", file.path().display(), e)))?;
        self.history = RwLock::new(records);
        self.history_file = Some(file);
        Ok(self)
    }

    pub fn is_safe_to_modify(&self, target: &Path) -> bool {
        self.allow_list.is_allowed(target)
    }

    /// 备份路径：同名文件替换扩展名
    pub fn backup_path(&self, target: &Path) -> PathBuf {
        target.with_extension(&self.backup_extension)
    }

    /// 修改历史（按发生顺序）
    pub async fn history(&self) -> Vec<ModificationRecord> {
        self.history.read().await.clone()
    }

    /// 取（或创建）路径对应的锁；键为规范化路径，无法规范化时用原路径
    async fn path_lock(&self, path: &Path) -> (PathBuf, PathLock) {
        let key = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        let mut locks = self.file_locks.lock().unwrap_or_else(|p| p.into_inner());
        let lock = Arc::clone(locks.entry(key.clone()).or_default());
        (key, lock)
    }

    /// 归还锁；没有其他持有者时从表中移除
    fn release_path_lock(&self, key: &Path, lock: PathLock) {
        drop(lock);
        let mut locks = self.file_locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.file_locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// 按自然语言要求修改白名单内的文件
    pub async fn self_modify(
        &self,
        target: impl AsRef<Path>,
        modification_request: &str,
    ) -> Result<ModificationRecord, ModifyError> {
        let target = target.as_ref();
        tracing::warn!("Self-modification requested for {}", target.display());

        if !self.is_safe_to_modify(target) {
            tracing::error!("Self-modification blocked for safety: {}", target.display());
            return Err(ModifyError::Blocked(target.to_path_buf()));
        }

        if tokio::fs::metadata(target).await.is_err() {
            tracing::error!("Target file {} not found", target.display());
            return Err(ModifyError::NotFound(target.to_path_buf()));
        }

        let Some(llm) = &self.llm else {
            tracing::error!("LLM engine required for self-modification");
            return Err(ModifyError::MissingLlm);
        };

        let backup = self.backup_path(target);
        if backup == target {
            return Err(log_error(ModifyError::Validation(format!(
                "backup path {} would overwrite the target",
                backup.display()
            ))));
        }

        let (key, lock) = self.path_lock(target).await;
        let result = {
            let _guard = lock.lock().await;
            self.modify_locked(llm.as_ref(), target, &backup, modification_request)
                .await
        };
        self.release_path_lock(&key, lock);
        result
    }

    async fn modify_locked(
        &self,
        llm: &dyn LlmEngine,
        target: &Path,
        backup: &Path,
        modification_request: &str,
    ) -> Result<ModificationRecord, ModifyError> {
        let original = tokio::fs::read_to_string(target)
            .await
            .map_err(|e| log_error(ModifyError::io(target, e)))?;

        let modification_prompt = prompt::build_modification_prompt(&original, modification_request);
        let (response, _) = llm
            .query_with_memory(&modification_prompt, TOPIC_CODING)
            .await
            .map_err(|e| log_error(ModifyError::Llm(e)))?;
        let language = Language::from_extension(target).unwrap_or(Language::Python);
        let modified = extract_code(&response, language);

        validate_modification(&original, &modified)
            .map_err(|reason| log_error(ModifyError::Validation(reason)))?;

        tokio::fs::write(backup, &original)
            .await
            .map_err(|e| log_error(ModifyError::io(backup, e)))?;
        tokio::fs::write(target, &modified)
            .await
            .map_err(|e| log_error(ModifyError::io(target, e)))?;

        let record = ModificationRecord::new(target, modification_request, backup);
        {
            let mut history = self.history.write().await;
            history.push(record.clone());
            if let Some(file) = &self.history_file {
                if let Err(e) = file.save(&history).await {
                    tracing::error!("Failed to persist modification history: {}", e);
                }
            }
        }

        tracing::info!("Successfully self-modified {}", target.display());
        Ok(record)
    }

    /// 回滚：从新到旧找该路径的记录，用第一个仍存在的备份覆盖目标；返回所用备份路径
    pub async fn rollback(&self, file_path: impl AsRef<Path>) -> Result<PathBuf, ModifyError> {
        let file_path = file_path.as_ref();

        let (key, lock) = self.path_lock(file_path).await;
        let result = {
            let _guard = lock.lock().await;
            self.rollback_locked(file_path).await
        };
        self.release_path_lock(&key, lock);
        result
    }

    async fn rollback_locked(&self, file_path: &Path) -> Result<PathBuf, ModifyError> {
        let backups: Vec<PathBuf> = self
            .history
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.file == file_path)
            .map(|r| r.backup.clone())
            .collect();

        for backup in backups {
            if tokio::fs::metadata(&backup).await.is_err() {
                continue;
            }
            let content = tokio::fs::read(&backup)
                .await
                .map_err(|e| log_error(ModifyError::io(&backup, e)))?;
            tokio::fs::write(file_path, content)
                .await
                .map_err(|e| log_error(ModifyError::io(file_path, e)))?;
            tracing::info!("Rolled back {} from {}", file_path.display(), backup.display());
            return Ok(backup);
        }

        tracing::error!("No backup found for {}", file_path.display());
        Err(ModifyError::NoBackup(file_path.to_path_buf()))
    }
}

fn log_error(err: ModifyError) -> ModifyError {
    tracing::error!("{}", err);
    err
}

/// 校验修改结果：可解析为 Python、trim 后不少于 10 个字符、与原文不同
pub fn validate_modification(original: &str, modified: &str) -> Result<(), String> {
    if parse_python(modified).is_none() {
        return Err("modified code is not valid Python".to_string());
    }
    if modified.trim().chars().count() < MIN_MODIFIED_LEN {
        return Err("modified code is too short".to_string());
    }
    if original == modified {
        return Err("modified code is identical to the original".to_string());
    }
    Ok(())
}
