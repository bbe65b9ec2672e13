//! Dossier CLI entrypoint.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use uuid::Uuid;

use dossier::config::Config;
use dossier::constants::PIPELINE_VERSION;
use dossier::pipeline::Pipeline;
use dossier::refine::{
    DEFAULT_ALPHA, DEFAULT_DEDUP_SIMILARITY, DEFAULT_MMR_LAMBDA, DEFAULT_TOP_K_FINAL,
    DEFAULT_TOP_K_PRE_RERANK, RetrievalConfig,
};
use dossier::segment::{
    ChunkingConfig, DEFAULT_MAX_TOKENS, DEFAULT_MIN_TOKENS, DEFAULT_TARGET_TOKENS,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "dossier")]
#[command(version)]
#[command(about = "Extract audit evidence excerpts from a document corpus")]
struct Cli {
    /// Qdrant endpoint URL.
    #[arg(long, global = true)]
    qdrant_url: Option<String>,

    /// Qdrant collection name.
    #[arg(long, global = true)]
    collection: Option<String>,

    /// OpenAI-compatible chat endpoint (continuity oracle, verification).
    #[arg(long, global = true)]
    llm_url: Option<String>,

    /// OpenAI-compatible embeddings endpoint.
    #[arg(long, global = true)]
    embed_url: Option<String>,

    /// Cross-encoder scoring endpoint.
    #[arg(long, global = true)]
    rerank_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read, segment, embed, and index documents
    Ingest(IngestArgs),
    /// Load criteria and export refined evidence rows
    Extract(ExtractArgs),
    /// Ingest then extract in one invocation
    Run(RunArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// Directory of source documents
    #[arg(long)]
    docs: PathBuf,

    /// Staging directory for per-document page records
    #[arg(long)]
    staging: Option<PathBuf>,

    /// Disable the LLM continuity oracle (heading heuristic only)
    #[arg(long)]
    no_oracle: bool,

    #[command(flatten)]
    chunking: ChunkingArgs,
}

#[derive(Args)]
struct ChunkingArgs {
    /// Target chunk size in estimated tokens
    #[arg(long, default_value_t = DEFAULT_TARGET_TOKENS)]
    target_tokens: usize,

    /// Minimum chunk size in estimated tokens
    #[arg(long, default_value_t = DEFAULT_MIN_TOKENS)]
    min_tokens: usize,

    /// Maximum chunk size in estimated tokens
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: usize,
}

#[derive(Args)]
struct ExtractArgs {
    /// Criteria sheet (CSV)
    #[arg(long)]
    criteria: PathBuf,

    /// Output CSV path
    #[arg(long)]
    out: PathBuf,

    /// Verify each surviving excerpt with the generation model
    #[arg(long)]
    verify: bool,

    #[command(flatten)]
    retrieval: RetrievalArgs,
}

#[derive(Args)]
struct RetrievalArgs {
    /// Dense/lexical blend factor for hybrid search
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f32,

    /// Pool size fetched from hybrid search before rescoring
    #[arg(long, default_value_t = DEFAULT_TOP_K_PRE_RERANK)]
    top_k_pre_rerank: usize,

    /// Final excerpt count per criterion
    #[arg(long, default_value_t = DEFAULT_TOP_K_FINAL)]
    top_k_final: usize,

    /// Skip diversity selection and take the reranked top directly
    #[arg(long)]
    no_mmr: bool,

    /// Relevance/diversity trade-off for MMR
    #[arg(long, default_value_t = DEFAULT_MMR_LAMBDA)]
    mmr_lambda: f32,

    /// Cosine similarity at or above which a near-duplicate is dropped
    #[arg(long, default_value_t = DEFAULT_DEDUP_SIMILARITY)]
    dedup_similarity: f32,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    ingest: IngestArgs,

    #[command(flatten)]
    extract: ExtractArgs,
}

impl ChunkingArgs {
    fn to_config(&self) -> ChunkingConfig {
        ChunkingConfig::default()
            .with_target_tokens(self.target_tokens)
            .with_min_tokens(self.min_tokens)
            .with_max_tokens(self.max_tokens)
    }
}

impl RetrievalArgs {
    fn to_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            alpha: self.alpha,
            top_k_pre_rerank: self.top_k_pre_rerank,
            top_k_final: self.top_k_final,
            mmr_lambda: self.mmr_lambda,
            use_mmr: !self.no_mmr,
            dedup_similarity: self.dedup_similarity,
        }
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.qdrant_url {
        config.qdrant_url = url.clone();
    }
    if let Some(name) = &cli.collection {
        config.collection = name.clone();
    }
    if let Some(url) = &cli.llm_url {
        config.llm_url = Some(url.clone());
    }
    if let Some(url) = &cli.embed_url {
        config.embed_url = Some(url.clone());
    }
    if let Some(url) = &cli.rerank_url {
        config.rerank_url = Some(url.clone());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    apply_overrides(&mut config, &cli);

    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, version = PIPELINE_VERSION, "Dossier starting");

    match cli.command {
        Command::Ingest(args) => {
            if let Some(staging) = &args.staging {
                config.staging_dir = staging.clone();
            }
            config.validate()?;
            let pipeline = Pipeline::connect(config).await?;
            pipeline
                .run_ingest(&args.docs, &args.chunking.to_config(), !args.no_oracle)
                .await?;
        }
        Command::Extract(args) => {
            config.validate()?;
            let pipeline = Pipeline::connect(config).await?;
            pipeline
                .run_extract(
                    &args.criteria,
                    &args.out,
                    &args.retrieval.to_config(),
                    args.verify,
                )
                .await?;
        }
        Command::Run(args) => {
            if let Some(staging) = &args.ingest.staging {
                config.staging_dir = staging.clone();
            }
            config.validate()?;
            let pipeline = Pipeline::connect(config).await?;
            pipeline
                .run_ingest(
                    &args.ingest.docs,
                    &args.ingest.chunking.to_config(),
                    !args.ingest.no_oracle,
                )
                .await?;
            pipeline
                .run_extract(
                    &args.extract.criteria,
                    &args.extract.out,
                    &args.extract.retrieval.to_config(),
                    args.extract.verify,
                )
                .await?;
        }
    }

    Ok(())
}
