//! 开源方案查找：写代码前先看有没有现成的库
//!
//! `SolutionFinder` 是生成器的外部协作方；这里附带一个基于 TOML 目录的关键词实现。

pub mod catalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codegen::CodeType;

pub use catalog::{CatalogEntry, CatalogSolutionFinder};

/// 查找粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionLevel {
    Function,
    Module,
    Package,
}

impl SolutionLevel {
    /// function → Function，class → Module，module/script → Package，其余 → Function
    pub fn for_code_type(code_type: CodeType) -> Self {
        match code_type {
            CodeType::Function => SolutionLevel::Function,
            CodeType::Class => SolutionLevel::Module,
            CodeType::Module | CodeType::Script => SolutionLevel::Package,
            _ => SolutionLevel::Function,
        }
    }
}

/// 候选库
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolutionCandidate {
    pub name: String,
    pub description: String,
    pub installation: String,
    pub url: String,
    pub match_score: f64,
    #[serde(default)]
    pub pros: Vec<String>,
}

/// 查找结果
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolutionCheck {
    pub should_use_library: bool,
    pub recommendation: String,
    /// 按匹配度从高到低
    pub solutions: Vec<SolutionCandidate>,
    pub code_example: Option<String>,
}

#[derive(Error, Debug)]
pub enum SolutionError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("solution lookup failed: {0}")]
    Lookup(String),
}

#[async_trait]
pub trait SolutionFinder: Send + Sync {
    async fn check_before_coding(
        &self,
        description: &str,
        level: SolutionLevel,
        features: &[String],
        constraints: &[String],
    ) -> Result<SolutionCheck, SolutionError>;
}
