//! 格式化适配：委托外部格式化工具，失败逐级降级，永不报错
//!
//! Python：主格式化器 → 备用格式化器 → 原文；其它语言原样返回。

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::Language;
use crate::config::FormatterSection;

/// 外部格式化器默认超时
const DEFAULT_FORMAT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("{0} produced no output")]
    EmptyOutput(String),

    #[error("formatter command is empty")]
    EmptyCommand,
}

/// 格式化工具；输入有问题时可以失败
#[async_trait]
pub trait CodeFormatter: Send + Sync {
    fn name(&self) -> &str;

    async fn format(&self, code: &str) -> Result<String, FormatError>;
}

/// 通过子进程运行的格式化器：代码写入 stdin，从 stdout 读结果
///
/// stdin 在单独的任务里写入，与读取 stdout/stderr 并发，避免管道写满后互相等待；
/// 超时后子进程随 future 一起被丢弃并 kill。
#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ExternalFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(DEFAULT_FORMAT_TIMEOUT_SECS),
        }
    }

    /// 由 argv 构造（第一个元素为程序名）
    pub fn from_argv(argv: &[String]) -> Result<Self, FormatError> {
        let (program, args) = argv.split_first().ok_or(FormatError::EmptyCommand)?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    pub fn black() -> Self {
        Self::new("black", vec!["--quiet".into(), "-".into()])
    }

    pub fn autopep8() -> Self {
        Self::new("autopep8", vec!["-".into()])
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }
}

#[async_trait]
impl CodeFormatter for ExternalFormatter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn format(&self, code: &str) -> Result<String, FormatError> {
        let spawn_err = |source| FormatError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = code.as_bytes().to_vec();
            let program = self.program.clone();
            tokio::spawn(async move {
                // 子进程提前退出时写入会失败，结果由退出码判断
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!(formatter = %program, "stdin write failed: {}", e);
                }
            });
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| FormatError::Timeout {
                program: self.program.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(spawn_err)?;

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let formatted = String::from_utf8_lossy(&output.stdout).to_string();
        if formatted.trim().is_empty() && !code.trim().is_empty() {
            return Err(FormatError::EmptyOutput(self.program.clone()));
        }
        Ok(formatted)
    }
}

/// 格式化适配器：Python 按链依次尝试，其它语言恒等
#[derive(Default)]
pub struct FormatterAdapter {
    python: Vec<Box<dyn CodeFormatter>>,
}

impl FormatterAdapter {
    /// 不做任何格式化
    pub fn identity() -> Self {
        Self::default()
    }

    /// black → autopep8
    pub fn python_default() -> Self {
        Self::identity()
            .with_python_formatter(ExternalFormatter::black())
            .with_python_formatter(ExternalFormatter::autopep8())
    }

    pub fn from_config(section: &FormatterSection) -> Self {
        if !section.enabled {
            return Self::identity();
        }
        let mut adapter = Self::identity();
        for argv in [&section.python_primary, &section.python_secondary] {
            match ExternalFormatter::from_argv(argv) {
                Ok(formatter) => {
                    adapter = adapter
                        .with_python_formatter(formatter.with_timeout_secs(section.timeout_secs))
                }
                Err(e) => tracing::warn!("Skipping python formatter: {}", e),
            }
        }
        adapter
    }

    /// 追加一个 Python 格式化器（排在已有的之后）
    pub fn with_python_formatter(mut self, formatter: impl CodeFormatter + 'static) -> Self {
        self.python.push(Box::new(formatter));
        self
    }

    pub async fn format(&self, code: &str, language: Language) -> String {
        match language {
            Language::Python => self.format_cascade(&self.python, code).await,
            _ => code.to_string(),
        }
    }

    async fn format_cascade(&self, chain: &[Box<dyn CodeFormatter>], code: &str) -> String {
        for formatter in chain {
            match formatter.format(code).await {
                Ok(formatted) => return formatted,
                Err(e) => tracing::debug!(formatter = formatter.name(), "format failed: {}", e),
            }
        }
        code.to_string()
    }
}
