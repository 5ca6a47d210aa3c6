//! 自修改白名单
//!
//! 纯谓词：路径从右向左按组件与 glob 模式逐个匹配（模式 `src/core/*.py` 命中
//! `/any/prefix/src/core/x.py`）。这只是防误改的闸门，不是安全控制：
//! 不做规范化、不解析符号链接，调用方不应依赖它隔离不可信输入。

use std::path::{Component, Path};

use glob::Pattern;

/// 白名单（由若干相对 glob 模式组成）
#[derive(Debug, Clone)]
pub struct AllowList {
    /// 每个模式按 `/` 拆成组件
    patterns: Vec<(String, Vec<Pattern>)>,
}

impl AllowList {
    /// 编译模式；无效的模式记录警告后跳过
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref();
            let parts: Result<Vec<Pattern>, _> = raw
                .split('/')
                .filter(|p| !p.is_empty() && *p != ".")
                .map(Pattern::new)
                .collect();
            match parts {
                Ok(parts) if !parts.is_empty() => compiled.push((raw.to_string(), parts)),
                Ok(_) => tracing::warn!("Ignoring empty allow-list pattern '{}'", raw),
                Err(e) => tracing::warn!("Ignoring invalid allow-list pattern '{}': {}", raw, e),
            }
        }
        Self { patterns: compiled }
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(raw, _)| raw.as_str())
    }

    /// 路径是否命中任一模式
    pub fn is_allowed(&self, path: &Path) -> bool {
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        self.patterns.iter().any(|(_, parts)| {
            if parts.len() > components.len() {
                return false;
            }
            let tail = &components[components.len() - parts.len()..];
            parts.iter().zip(tail).all(|(p, c)| p.matches(c))
        })
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(crate::config::default_allowed_patterns())
    }
}
