//! 从 LLM 回复中提取代码
//!
//! 优先取第一个 ``` 代码块（语言标记可选）；没有代码块时逐行丢弃带叙述性标记的行。
//! 回退策略是有损的：包含 "this"、"here" 等子串的真实代码行也会被丢掉。

use std::sync::OnceLock;

use regex::Regex;

use super::types::Language;

/// 叙述性标记（小写匹配）
const NARRATIVE_MARKERS: &[&str] = &["here", "this", "the following", "code:", "example:"];

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"(?s)```(?:\w+)?\n(.*?)```").unwrap())
}

/// 提取代码；`_language` 保留给按语言区分的提取策略
pub fn extract_code(response: &str, _language: Language) -> String {
    if let Some(code) = fence_re()
        .captures(response)
        .and_then(|cap| cap.get(1))
    {
        return code.as_str().trim().to_string();
    }

    response
        .split('\n')
        .filter(|line| {
            let lower = line.to_lowercase();
            !NARRATIVE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
