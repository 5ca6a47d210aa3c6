//! Auto Coder 命令行
//!
//! 入口：加载配置、初始化日志，按子命令构建生成器或自修改管理器。
//! 生成结果写 stdout，日志写 stderr。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use auto_coder::{
    codegen::{CodeGenerator, CodeType, FormatterAdapter, GenerationRequest, Language, TemplateStore},
    config::{load_config, AppConfig},
    evolution::SelfModifier,
    llm::create_engine_from_config,
    observability,
    solutions::CatalogSolutionFinder,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "auto-coder", about = "LLM-backed code generation with template fallback")]
#[command(version)]
struct Cli {
    /// 额外配置文件（覆盖 config/default.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 以 JSON 输出结果
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from a natural-language description
    Generate {
        description: String,

        #[arg(short = 't', long, default_value = "function")]
        code_type: CodeType,

        #[arg(short, long, default_value = "python")]
        language: Language,

        /// Functional requirement (repeatable)
        #[arg(short, long = "requirement")]
        requirements: Vec<String>,

        /// Constraint (repeatable)
        #[arg(long = "constraint")]
        constraints: Vec<String>,

        /// Example input/output (repeatable)
        #[arg(long = "example")]
        examples: Vec<String>,
    },

    /// Optimize an existing source file
    Optimize {
        file: PathBuf,

        /// Defaults to the file extension
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Refactor an existing source file toward the given goals
    Refactor {
        file: PathBuf,

        #[arg(short, long)]
        language: Option<Language>,

        #[arg(short, long = "goal", required = true)]
        goals: Vec<String>,
    },

    /// Ask the LLM to modify an allow-listed file (backup is written first)
    Modify { file: PathBuf, request: String },

    /// Restore a file from its most recent backup
    Rollback { file: PathBuf },

    /// Show recorded self-modifications
    History,

    /// List built-in templates
    Templates,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.clone()).context("Failed to load config")?;

    match cli.command {
        Commands::Generate {
            description,
            code_type,
            language,
            requirements,
            constraints,
            examples,
        } => {
            let generator = build_generator(&cfg)?;
            let request = GenerationRequest::new(description, code_type, language)
                .with_requirements(requirements)
                .with_constraints(constraints)
                .with_examples(examples);
            let result = generator
                .generate(&request)
                .await
                .context("Code generation failed")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.code);
                if let Some(tests) = &result.tests {
                    println!("\n# ---- tests ----\n{}", tests);
                }
                eprintln!("quality score: {:.2}", result.quality_score);
            }
        }
        Commands::Optimize { file, language } => {
            let generator = build_generator(&cfg)?;
            let language = resolve_language(&file, language)?;
            let code = read_source(&file)?;
            let optimized = generator
                .optimize(&code, language)
                .await
                .context("Optimization failed")?;
            println!("{}", optimized);
        }
        Commands::Refactor {
            file,
            language,
            goals,
        } => {
            let generator = build_generator(&cfg)?;
            let language = resolve_language(&file, language)?;
            let code = read_source(&file)?;
            let refactored = generator
                .refactor(&code, language, &goals)
                .await
                .context("Refactoring failed")?;
            println!("{}", refactored);
        }
        Commands::Modify { file, request } => {
            let modifier = build_modifier(&cfg).await?;
            let record = modifier
                .self_modify(&file, &request)
                .await
                .with_context(|| format!("Self-modification of {} failed", file.display()))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!(
                    "Modified {} (backup: {})",
                    record.file.display(),
                    record.backup.display()
                );
            }
        }
        Commands::Rollback { file } => {
            let modifier = build_modifier(&cfg).await?;
            let backup = modifier
                .rollback(&file)
                .await
                .with_context(|| format!("Rollback of {} failed", file.display()))?;
            println!("Restored {} from {}", file.display(), backup.display());
        }
        Commands::History => {
            let modifier = build_modifier(&cfg).await?;
            let history = modifier.history().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No modifications recorded");
            } else {
                for record in history {
                    println!(
                        "{}  {}  {}",
                        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        record.file.display(),
                        record.request
                    );
                }
            }
        }
        Commands::Templates => {
            let store = TemplateStore::builtin().context("Built-in templates are invalid")?;
            for key in store.keys() {
                let description = store
                    .get(key)
                    .map(|t| t.description.as_str())
                    .unwrap_or_default();
                println!("{:<20} {}", key, description);
            }
        }
    }

    Ok(())
}

fn build_generator(cfg: &AppConfig) -> anyhow::Result<CodeGenerator> {
    let mut generator =
        CodeGenerator::with_builtin_templates(FormatterAdapter::from_config(&cfg.formatter))
            .context("Failed to build code generator")?;

    if let Some(llm) = create_engine_from_config(cfg) {
        generator = generator.with_llm(llm);
    }
    if !generator.has_llm() {
        tracing::info!("No LLM configured, using template fallback");
    }

    if let Some(path) = &cfg.solutions.catalog_path {
        let finder = CatalogSolutionFinder::from_path(path, cfg.solutions.match_threshold)
            .with_context(|| format!("Failed to load solution catalog {}", path.display()))?;
        generator = generator.with_solution_finder(Arc::new(finder));
    }

    Ok(generator)
}

async fn build_modifier(cfg: &AppConfig) -> anyhow::Result<SelfModifier> {
    SelfModifier::from_config(&cfg.self_modify, create_engine_from_config(cfg))
        .await
        .context("Failed to initialise self-modifier")
}

fn resolve_language(file: &std::path::Path, language: Option<Language>) -> anyhow::Result<Language> {
    language
        .or_else(|| Language::from_extension(file))
        .with_context(|| format!("Cannot infer language of {}, pass --language", file.display()))
}

fn read_source(file: &std::path::Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}
