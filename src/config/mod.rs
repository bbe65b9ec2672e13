//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `DOSSIER_*` environment
//! variables. Endpoints left unset select degraded local modes: no embed URL
//! means stub embeddings, no rerank URL means lexical stub scoring, no LLM
//! URL means the heading heuristic replaces the continuity oracle.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::constants::DEFAULT_EMBEDDING_DIM;

/// Pipeline configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `DOSSIER_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Qdrant collection holding indexed chunks. Default: `dossier_chunks`.
    pub collection: String,

    /// OpenAI-compatible chat endpoint for the continuity oracle and the
    /// support verifier. Unset: the segmenter falls back to the heading
    /// heuristic and verification is unavailable.
    pub llm_url: Option<String>,

    /// Generation model id used for oracle/verifier calls. Default: `llama3.1`.
    pub gen_model: String,

    /// OpenAI-compatible embeddings endpoint. Unset: stub embeddings.
    pub embed_url: Option<String>,

    /// Embedding model id. Default: `nomic-embed-text`.
    pub embed_model: String,

    /// Embedding dimension. Default: `768`.
    pub embed_dim: usize,

    /// Cross-encoder scoring endpoint. Unset: lexical stub scoring.
    pub rerank_url: Option<String>,

    /// Cross-encoder model id. Default: `BAAI/bge-reranker-base`.
    pub rerank_model: String,

    /// Directory for staged per-document chunk records. Default: `./.staging`.
    pub staging_dir: PathBuf,

    /// Output columns for the evidence CSV, comma-separated in the
    /// environment. Default: every known column in standard order.
    pub csv_fields: Vec<String>,
}

/// Default Qdrant URL used when `DOSSIER_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default collection name used when `DOSSIER_COLLECTION` is not set.
pub const DEFAULT_COLLECTION: &str = "dossier_chunks";

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            llm_url: None,
            gen_model: "llama3.1".to_string(),
            embed_url: None,
            embed_model: "nomic-embed-text".to_string(),
            embed_dim: DEFAULT_EMBEDDING_DIM,
            rerank_url: None,
            rerank_model: "BAAI/bge-reranker-base".to_string(),
            staging_dir: PathBuf::from("./.staging"),
            csv_fields: crate::export::default_fields(),
        }
    }
}

impl Config {
    const ENV_QDRANT_URL: &'static str = "DOSSIER_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "DOSSIER_COLLECTION";
    const ENV_LLM_URL: &'static str = "DOSSIER_LLM_URL";
    const ENV_GEN_MODEL: &'static str = "DOSSIER_GEN_MODEL";
    const ENV_EMBED_URL: &'static str = "DOSSIER_EMBED_URL";
    const ENV_EMBED_MODEL: &'static str = "DOSSIER_EMBED_MODEL";
    const ENV_EMBED_DIM: &'static str = "DOSSIER_EMBED_DIM";
    const ENV_RERANK_URL: &'static str = "DOSSIER_RERANK_URL";
    const ENV_RERANK_MODEL: &'static str = "DOSSIER_RERANK_MODEL";
    const ENV_STAGING_DIR: &'static str = "DOSSIER_STAGING_DIR";
    const ENV_CSV_FIELDS: &'static str = "DOSSIER_CSV_FIELDS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection = Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection);
        let llm_url = Self::parse_optional_string_from_env(Self::ENV_LLM_URL);
        let gen_model = Self::parse_string_from_env(Self::ENV_GEN_MODEL, defaults.gen_model);
        let embed_url = Self::parse_optional_string_from_env(Self::ENV_EMBED_URL);
        let embed_model = Self::parse_string_from_env(Self::ENV_EMBED_MODEL, defaults.embed_model);
        let embed_dim = Self::parse_dim_from_env(defaults.embed_dim)?;
        let rerank_url = Self::parse_optional_string_from_env(Self::ENV_RERANK_URL);
        let rerank_model =
            Self::parse_string_from_env(Self::ENV_RERANK_MODEL, defaults.rerank_model);
        let staging_dir = Self::parse_path_from_env(Self::ENV_STAGING_DIR, defaults.staging_dir);
        let csv_fields = Self::parse_fields_from_env(defaults.csv_fields);

        Ok(Self {
            qdrant_url,
            collection,
            llm_url,
            gen_model,
            embed_url,
            embed_model,
            embed_dim,
            rerank_url,
            rerank_model,
            staging_dir,
            csv_fields,
        })
    }

    /// Validates basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::EmptyValue { name: "collection" });
        }

        if self.embed_model.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                name: "embed_model",
            });
        }

        if self.gen_model.trim().is_empty() {
            return Err(ConfigError::EmptyValue { name: "gen_model" });
        }

        if self.embed_dim == 0 {
            return Err(ConfigError::InvalidDimension { dim: 0 });
        }

        if self.staging_dir.exists() && !self.staging_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.staging_dir.clone(),
            });
        }

        if self.csv_fields.is_empty() {
            return Err(ConfigError::EmptyValue { name: "csv_fields" });
        }

        crate::export::validate_fields(&self.csv_fields)
            .map_err(|e| ConfigError::InvalidCsvFields {
                message: e.to_string(),
            })?;

        Ok(())
    }

    fn parse_dim_from_env(default: usize) -> Result<usize, ConfigError> {
        match env::var(Self::ENV_EMBED_DIM) {
            Ok(value) => value.parse().map_err(|e| ConfigError::DimParseError {
                value: value.clone(),
                source: e,
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_fields_from_env(default: Vec<String>) -> Vec<String> {
        match env::var(Self::ENV_CSV_FIELDS) {
            Ok(value) => {
                let fields: Vec<String> = value
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect();
                if fields.is_empty() { default } else { fields }
            }
            Err(_) => default,
        }
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }
}
