use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clausewise_core::{Analyzer, Policy};
use clausewise_runtime::{
    connect, Capability, ContractReview, LlmProvider, ReportRenderer, ReviewOrchestrator,
    RuntimeConfig, RuntimeError,
};

mod extract;

#[derive(Parser, Debug)]
#[command(name = "clausewise")]
#[command(version, about = "Clause-level contract review: categories, risk tiers and an AI narrative")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Review one or more contracts
    Analyze(AnalyzeArgs),

    /// Print the effective keyword policy as YAML
    Policy {
        /// Keyword policy file (YAML or JSON)
        #[arg(long)]
        policy: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Contract files (.pdf, .docx, anything else read as text)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Report format; pdf requires --output
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Keyword policy file (YAML or JSON)
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Runtime configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write audit records to this directory
    #[arg(long)]
    audit_dir: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Provider tokens for the whole run, shared by every file. Overrides
    /// budget.global_max_tokens (default 20000, roughly 70 KB of contract
    /// text). Once spent, remaining files get the fallback narrative.
    #[arg(long, value_name = "TOKENS")]
    token_budget: Option<u32>,

    /// Do not contact the AI provider
    #[arg(long)]
    offline: bool,

    /// Include the trigger evidence behind every label
    #[arg(long)]
    explain: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
    Pdf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(cli.verbose))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Analyze(args) => analyze(args).await,
        Command::Policy { policy } => {
            let policy = load_policy(policy.as_deref())?;
            print!("{}", policy.to_yaml().context("Failed to render policy")?);
            Ok(())
        }
    }
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn load_policy(path: Option<&Path>) -> Result<Policy> {
    match path {
        Some(path) => Policy::from_file(path)
            .with_context(|| format!("Failed to load policy {}", path.display())),
        None => Ok(Policy::default()),
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

fn create_provider(config: &RuntimeConfig) -> Option<Arc<dyn LlmProvider>> {
    match connect(config) {
        Ok(provider) => {
            tracing::info!(provider = provider.name(), model = %config.model, "AI provider ready");
            Some(provider)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Continuing without AI narrative");
            None
        }
    }
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    if args.format == Format::Pdf && args.output.is_none() {
        anyhow::bail!("--format pdf needs --output <PATH>");
    }

    let policy = load_policy(args.policy.as_deref())?;
    let analyzer = Analyzer::with_policy(&policy).context("Invalid keyword policy")?;

    let mut config = load_config(args.config.as_deref())?;
    if args.audit_dir.is_some() {
        config.audit_dir = args.audit_dir.clone();
    }
    if let Some(tokens) = args.token_budget {
        config.budget.global_max_tokens = tokens;
    }

    let mut builder = ReviewOrchestrator::builder().analyzer(analyzer);
    if !args.offline {
        if let Some(provider) = create_provider(&config) {
            builder = builder.provider(provider);
        }
    }
    let orchestrator = builder.config(config).build().await;

    let mut documents = Vec::with_capacity(args.files.len());
    for path in &args.files {
        documents.push((extract::display_name(path), extract::extract_text(path).await));
    }

    let reviews = orchestrator.review_many(documents).await;
    let usage = orchestrator.usage();
    tracing::info!(
        documents = reviews.len(),
        llm_calls = usage.llm_calls,
        tokens = usage.total_tokens,
        cost_usd = usage.estimated_cost,
        "Batch complete"
    );
    let over_budget = budget_exhausted(&reviews);
    if over_budget > 0 {
        tracing::warn!(
            documents = over_budget,
            "Token budget exhausted, raise --token-budget for full narratives"
        );
    }

    let rendered = match args.format {
        Format::Text => render_text(&orchestrator, &reviews, args.explain).into_bytes(),
        Format::Json => render_json(&orchestrator, &reviews, args.explain)?.into_bytes(),
        Format::Pdf => ReportRenderer::default()
            .render_pdf(&reviews)
            .context("Failed to render PDF")?,
    };

    match &args.output {
        Some(path) => tokio::fs::write(path, rendered)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?,
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&rendered)
                .context("Failed to write report")?;
        }
    }
    Ok(())
}

/// Reviews whose narrative was skipped for lack of budget.
fn budget_exhausted(reviews: &[ContractReview]) -> usize {
    reviews
        .iter()
        .filter(|review| {
            matches!(
                review.narrative.failure(),
                Some(RuntimeError::BudgetExceeded(Capability::Narrative))
            )
        })
        .count()
}

fn render_text(orchestrator: &ReviewOrchestrator, reviews: &[ContractReview], explain: bool) -> String {
    let renderer = ReportRenderer::default();
    let mut out = String::new();

    for (index, review) in reviews.iter().enumerate() {
        if index > 0 {
            out.push_str(&"=".repeat(renderer.width()));
            out.push('\n');
        }
        out.push_str(&renderer.render_text(review));

        if explain {
            out.push_str("\nEvidence:\n");
            for explanation in orchestrator.analyzer().explain(&review.text) {
                for evidence in &explanation.evidence {
                    out.push_str(&format!("  {}: {}\n", evidence.pointer, evidence.claim));
                }
            }
        }
    }
    out
}

fn render_json(
    orchestrator: &ReviewOrchestrator,
    reviews: &[ContractReview],
    explain: bool,
) -> Result<String> {
    let mut values = Vec::with_capacity(reviews.len());
    for review in reviews {
        let mut value = serde_json::to_value(review).context("Failed to serialize review")?;
        if explain {
            let explanations = orchestrator.analyzer().explain(&review.text);
            value["explanations"] =
                serde_json::to_value(explanations).context("Failed to serialize evidence")?;
        }
        values.push(value);
    }

    let document = match values.len() {
        1 => values.remove(0),
        _ => serde_json::Value::Array(values),
    };
    let mut json = serde_json::to_string_pretty(&document).context("Failed to render JSON")?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "clausewise", "-vv", "analyze", "a.txt", "b.txt", "--format", "json", "--offline",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.format, Format::Json);
                assert!(args.offline);
                assert!(!args.explain);
            }
            _ => panic!("Expected analyze"),
        }
    }

    #[test]
    fn test_pdf_and_token_budget_flags() {
        let cli = Cli::try_parse_from([
            "clausewise", "analyze", "msa.pdf", "--format", "pdf", "-o", "out.pdf",
            "--token-budget", "100000",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.format, Format::Pdf);
                assert_eq!(args.token_budget, Some(100_000));
            }
            _ => panic!("Expected analyze"),
        }
    }

    #[test]
    fn test_help_states_budget_default() {
        use clap::CommandFactory;
        let mut command = Cli::command();
        let help = command
            .find_subcommand_mut("analyze")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains("--token-budget"));
        assert!(help.contains("default 20000"));
        assert_eq!(RuntimeConfig::default().budget.global_max_tokens, 20_000);
    }

    #[tokio::test]
    async fn test_pdf_needs_output() {
        let cli = Cli::try_parse_from(["clausewise", "analyze", "msa.txt", "--format", "pdf"]).unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("Expected analyze");
        };
        let err = analyze(args).await.unwrap_err();
        assert!(err.to_string().contains("--output"));
    }

    #[tokio::test]
    async fn test_budget_exhaustion_counted() {
        let config = RuntimeConfig {
            budget: clausewise_runtime::config::BudgetConfig { global_max_tokens: 10 },
            ..Default::default()
        };
        let provider: Arc<dyn LlmProvider> = Arc::new(NeverCalled);
        let orchestrator = ReviewOrchestrator::builder()
            .provider(provider)
            .config(config)
            .build()
            .await;
        let reviews = orchestrator
            .review_many([("a.txt", "1. A penalty applies."), ("b.txt", "1. Pay.")])
            .await;
        assert_eq!(budget_exhausted(&reviews), 2);

        let offline = ReviewOrchestrator::builder().build().await;
        let reviews = offline.review_many([("a.txt", "1. Pay.")]).await;
        assert_eq!(budget_exhausted(&reviews), 0);
    }

    struct NeverCalled;

    #[async_trait::async_trait]
    impl LlmProvider for NeverCalled {
        async fn complete(
            &self,
            _messages: Vec<clausewise_runtime::providers::ChatMessage>,
            _config: &clausewise_runtime::providers::CompletionConfig,
        ) -> Result<clausewise_runtime::providers::CompletionResponse, clausewise_runtime::ProviderError>
        {
            panic!("budget check should prevent this call")
        }

        fn name(&self) -> &str {
            "never"
        }
    }

    #[test]
    fn test_analyze_requires_files() {
        assert!(Cli::try_parse_from(["clausewise", "analyze"]).is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(5), "debug");
    }

    #[tokio::test]
    async fn test_offline_json_with_evidence() {
        let orchestrator = ReviewOrchestrator::builder().build().await;
        let reviews = orchestrator
            .review_many([("msa.txt", "Intro\n1. A penalty applies.")])
            .await;

        let json = render_json(&orchestrator, &reviews, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["analysis"]["risk_summary"][0], "High");
        assert_eq!(value["explanations"][0]["evidence"][0]["trigger"], "penalty");

        let text = render_text(&orchestrator, &reviews, true);
        assert!(text.contains("Evidence:\n  clauses[1]"));
    }

    #[test]
    fn test_default_policy_loads() {
        let policy = load_policy(None).unwrap();
        assert!(policy.trigger_count() > 0);
    }
}
