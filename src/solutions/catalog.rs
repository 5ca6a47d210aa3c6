//! 方案目录：从 TOML 加载候选库，按关键词命中率打分
//!
//! ```toml
//! [[library]]
//! name = "requests"
//! description = "HTTP for Humans"
//! installation = "pip install requests"
//! url = "https://requests.readthedocs.io"
//! keywords = ["http", "download"]
//! levels = ["function", "module"]
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::{SolutionCandidate, SolutionCheck, SolutionError, SolutionFinder, SolutionLevel};

/// 出现这些约束时不推荐引入第三方库
const NO_DEPENDENCY_MARKERS: &[&str] = &[
    "no external dependencies",
    "no dependencies",
    "no third-party",
    "standard library only",
    "stdlib only",
];

/// 目录条目
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub installation: String,
    #[serde(default)]
    pub url: String,
    /// 小写匹配；命中比例即匹配分
    pub keywords: Vec<String>,
    /// 适用粒度，为空表示不限
    #[serde(default)]
    pub levels: Vec<SolutionLevel>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub code_example: Option<String>,
}

impl CatalogEntry {
    fn score(&self, haystack: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }
        let hits = self
            .keywords
            .iter()
            .filter(|k| haystack.contains(&k.to_lowercase()))
            .count();
        hits as f64 / self.keywords.len() as f64
    }

    fn applies_to(&self, level: SolutionLevel) -> bool {
        self.levels.is_empty() || self.levels.contains(&level)
    }

    fn to_candidate(&self, match_score: f64) -> SolutionCandidate {
        SolutionCandidate {
            name: self.name.clone(),
            description: self.description.clone(),
            installation: self.installation.clone(),
            url: self.url.clone(),
            match_score,
            pros: self.pros.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogToml {
    #[serde(default)]
    library: Vec<CatalogEntry>,
}

/// 目录查找器
#[derive(Debug, Clone)]
pub struct CatalogSolutionFinder {
    entries: Vec<CatalogEntry>,
    threshold: f64,
    max_results: usize,
}

impl CatalogSolutionFinder {
    pub fn new(entries: Vec<CatalogEntry>, threshold: f64) -> Self {
        Self {
            entries,
            threshold,
            max_results: 3,
        }
    }

    pub fn from_toml_str(content: &str, threshold: f64) -> Result<Self, SolutionError> {
        let parsed: CatalogToml = toml::from_str(content)?;
        Ok(Self::new(parsed.library, threshold))
    }

    pub fn from_path(path: impl AsRef<Path>, threshold: f64) -> Result<Self, SolutionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SolutionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let finder = Self::from_toml_str(&content, threshold)?;
        tracing::info!(
            "Loaded {} catalog entries from {}",
            finder.entries.len(),
            path.display()
        );
        Ok(finder)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rank(&self, haystack: &str, level: SolutionLevel) -> Vec<(f64, &CatalogEntry)> {
        let mut ranked: Vec<(f64, &CatalogEntry)> = self
            .entries
            .iter()
            .filter(|e| e.applies_to(level))
            .map(|e| (e.score(haystack), e))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(self.max_results);
        ranked
    }
}

#[async_trait]
impl SolutionFinder for CatalogSolutionFinder {
    async fn check_before_coding(
        &self,
        description: &str,
        level: SolutionLevel,
        features: &[String],
        constraints: &[String],
    ) -> Result<SolutionCheck, SolutionError> {
        let mut haystack = description.to_lowercase();
        for feature in features {
            haystack.push(' ');
            haystack.push_str(&feature.to_lowercase());
        }

        let ranked = self.rank(&haystack, level);
        let solutions: Vec<SolutionCandidate> = ranked
            .iter()
            .map(|(score, entry)| entry.to_candidate(*score))
            .collect();

        let forbids_dependencies = constraints.iter().any(|c| {
            let lower = c.to_lowercase();
            NO_DEPENDENCY_MARKERS.iter().any(|m| lower.contains(m))
        });

        let (should_use_library, recommendation) = match ranked.first() {
            None => (false, "No matching library found; write custom code".to_string()),
            Some((_, entry)) if forbids_dependencies => (
                false,
                format!("{} matches but constraints forbid external dependencies", entry.name),
            ),
            Some((score, entry)) if *score >= self.threshold => (
                true,
                format!("Use {} instead of writing custom code", entry.name),
            ),
            Some((score, entry)) => (
                false,
                format!(
                    "Best match {} ({:.2}) is below threshold {:.2}; write custom code",
                    entry.name, score, self.threshold
                ),
            ),
        };

        let code_example = ranked.first().and_then(|(_, e)| e.code_example.clone());

        Ok(SolutionCheck {
            should_use_library,
            recommendation,
            solutions,
            code_example,
        })
    }
}
