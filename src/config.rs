//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CODER__*` 覆盖（双下划线表示嵌套，如 `CODER__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub formatter: FormatterSection,
    pub self_modify: SelfModifySection,
    pub solutions: SolutionsSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择、话题记忆轮数与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：none / mock / openai / deepseek；none 时走模板回退
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// 每个话题保留的对话轮数
    pub max_memory_turns: usize,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            model: None,
            base_url: None,
            max_memory_turns: 10,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒），0 表示不限时
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [formatter] 段：Python 主/备格式化命令（argv，代码走 stdin）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatterSection {
    pub enabled: bool,
    pub python_primary: Vec<String>,
    pub python_secondary: Vec<String>,
    /// 单次外部格式化超时（秒），超时视为失败并降级
    pub timeout_secs: u64,
}

impl Default for FormatterSection {
    fn default() -> Self {
        Self {
            enabled: true,
            python_primary: vec!["black".into(), "--quiet".into(), "-".into()],
            python_secondary: vec!["autopep8".into(), "-".into()],
            timeout_secs: 30,
        }
    }
}

/// [self_modify] 段：白名单、备份后缀、历史文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelfModifySection {
    pub allowed_patterns: Vec<String>,
    pub backup_extension: String,
    /// 修改历史 JSON 文件；为 None 时只保存在内存，跨进程无法回滚
    pub history_path: Option<PathBuf>,
}

impl Default for SelfModifySection {
    fn default() -> Self {
        Self {
            allowed_patterns: default_allowed_patterns(),
            backup_extension: "bak".to_string(),
            history_path: Some(PathBuf::from(DEFAULT_HISTORY_PATH)),
        }
    }
}

pub const DEFAULT_HISTORY_PATH: &str = "workspace/modification_history.json";

pub fn default_allowed_patterns() -> Vec<String> {
    vec![
        "osa_*.py".into(),
        "src/core/*.py".into(),
        "src/plugins/*.py".into(),
    ]
}

/// [solutions] 段：开源方案目录与采纳阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolutionsSection {
    pub catalog_path: Option<PathBuf>,
    /// 最佳匹配分数达到该值才建议直接使用库
    pub match_threshold: f64,
}

impl Default for SolutionsSection {
    fn default() -> Self {
        Self {
            catalog_path: None,
            match_threshold: 0.6,
        }
    }
}

/// 从 config 目录加载配置，环境变量 CODER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CODER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CODER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
