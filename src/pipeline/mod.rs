//! End-to-end orchestration: ingest documents into the index, then extract
//! evidence rows per criterion.
//!
//! Failure discipline follows the unit of work. A document that cannot be
//! read, segmented, or indexed is logged and skipped without aborting the
//! ingest run; a criterion whose refinement fails is logged and skipped
//! without aborting the extract run. Bad input schema (criteria sheet,
//! configured CSV columns) aborts before any retrieval work.

pub mod error;


pub use error::PipelineError;

use std::path::Path;
use std::sync::Arc;

use futures_util::future;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::constants::{DEFAULT_EMBED_BATCH, RETRIEVAL_METHOD};
use crate::criteria::{Criterion, load_criteria};
use crate::embedding::{Embedder, HttpEmbedder};
use crate::export::{self, EvidenceRow, RunMeta};
use crate::index::{QdrantIndex, SearchIndex};
use crate::ingest::{list_documents, read_document, stage_pages};
use crate::llm::ChatClient;
use crate::refine::{Candidate, RetrievalConfig, l2_normalize, refine_criterion};
use crate::rerank::{CrossEncoder, HttpCrossEncoder, RerankConfig};
use crate::segment::{
    Chunk, ChunkingConfig, ContinuityJudge, HeadingHeuristic, LlmContinuityJudge, Segmenter,
};
use crate::verify::SupportVerifier;

/// Counters reported by [`Pipeline::run_ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    /// Documents read, segmented, and indexed.
    pub documents: usize,
    /// Chunks upserted into the index.
    pub chunks: usize,
    /// Documents skipped after a per-document failure.
    pub skipped: usize,
}

/// Counters reported by [`Pipeline::run_extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractSummary {
    /// Criteria loaded from the sheet.
    pub criteria: usize,
    /// Evidence rows written.
    pub rows: usize,
    /// Criteria skipped after a refinement failure.
    pub failed: usize,
}

/// Wires configuration and capabilities into the two pipeline commands.
pub struct Pipeline {
    config: Config,
    index: Arc<dyn SearchIndex>,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn CrossEncoder>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        index: Arc<dyn SearchIndex>,
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn CrossEncoder>,
    ) -> Self {
        Self {
            config,
            index,
            embedder,
            reranker,
        }
    }

    /// Builds a pipeline against the configured backends and probes the
    /// index before any command runs.
    ///
    /// Unset endpoints select degraded local modes: stub embeddings, lexical
    /// cross-encoder scoring, heading-heuristic segmentation.
    pub async fn connect(config: Config) -> Result<Self, PipelineError> {
        let index = QdrantIndex::new(&config.qdrant_url, &config.collection, config.embed_dim)?;
        index.health_check().await?;

        let embedder = match &config.embed_url {
            Some(url) => HttpEmbedder::remote(url, &config.embed_model, config.embed_dim)?,
            None => HttpEmbedder::stub(config.embed_dim),
        };

        let rerank_config = RerankConfig {
            model: config.rerank_model.clone(),
            ..Default::default()
        };
        let reranker = match &config.rerank_url {
            Some(url) => HttpCrossEncoder::remote(url, rerank_config)?,
            None => HttpCrossEncoder::stub(rerank_config)?,
        };

        Ok(Self::new(
            config,
            Arc::new(index),
            Arc::new(embedder),
            Arc::new(reranker),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads, segments, stages, embeds, and indexes every document in
    /// `docs_dir`. Per-document failures are skipped with a warning.
    #[instrument(skip(self, chunking), fields(docs_dir = %docs_dir.display()))]
    pub async fn run_ingest(
        &self,
        docs_dir: &Path,
        chunking: &ChunkingConfig,
        use_oracle: bool,
    ) -> Result<IngestSummary, PipelineError> {
        let paths = list_documents(docs_dir)?;
        self.index.ensure_collection().await?;

        let segmenter = Segmenter::new(chunking.clone())?;
        let judge = self.continuity_judge(use_oracle)?;

        let mut summary = IngestSummary::default();
        for path in &paths {
            match self.ingest_document(&segmenter, judge.as_ref(), path).await {
                Ok(count) => {
                    summary.documents += 1;
                    summary.chunks += count;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping document");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            documents = summary.documents,
            chunks = summary.chunks,
            skipped = summary.skipped,
            "Ingest complete"
        );
        Ok(summary)
    }

    /// Loads criteria, refines each concurrently, optionally verifies, and
    /// writes the evidence CSV. Per-criterion failures are skipped with a
    /// warning.
    #[instrument(skip(self, retrieval), fields(criteria_path = %criteria_path.display(), out_path = %out_path.display()))]
    pub async fn run_extract(
        &self,
        criteria_path: &Path,
        out_path: &Path,
        retrieval: &RetrievalConfig,
        verify: bool,
    ) -> Result<ExtractSummary, PipelineError> {
        export::validate_fields(&self.config.csv_fields)?;
        retrieval.validate()?;

        let criteria = load_criteria(criteria_path)?;
        let verifier = self.support_verifier(verify)?;

        let refinements = criteria.iter().map(|criterion| {
            refine_criterion(
                criterion.query_text(),
                retrieval,
                self.index.as_ref(),
                self.embedder.as_ref(),
                self.reranker.as_ref(),
            )
        });
        let outcomes = future::join_all(refinements).await;

        let mut summary = ExtractSummary {
            criteria: criteria.len(),
            ..Default::default()
        };
        let mut rows = Vec::new();
        for (criterion, outcome) in criteria.iter().zip(outcomes) {
            match outcome {
                Ok(candidates) => {
                    rows.extend(
                        candidates
                            .iter()
                            .map(|candidate| evidence_row(criterion, candidate)),
                    );
                }
                Err(e) => {
                    warn!(
                        subcriterion_id = %criterion.subcriterion_id,
                        error = %e,
                        "Skipping criterion"
                    );
                    summary.failed += 1;
                }
            }
        }

        if let Some(verifier) = &verifier {
            annotate_rows(verifier, &mut rows).await;
        }

        summary.rows = rows.len();
        let meta = RunMeta::new(&self.config.embed_model, &self.config.gen_model);
        export::write_rows(out_path, &rows, &self.config.csv_fields, &meta)?;

        info!(
            criteria = summary.criteria,
            rows = summary.rows,
            failed = summary.failed,
            "Extract complete"
        );
        Ok(summary)
    }

    async fn ingest_document(
        &self,
        segmenter: &Segmenter,
        judge: &dyn ContinuityJudge,
        path: &Path,
    ) -> Result<usize, PipelineError> {
        let document = read_document(path)?;
        stage_pages(&self.config.staging_dir, &document)?;

        let chunks = segmenter
            .chunk_document(
                &document.doc_id,
                &document.source_path,
                &document.pages,
                judge,
            )
            .await?;
        if chunks.is_empty() {
            debug!(doc_id = %document.doc_id, "Document produced no chunks");
            return Ok(0);
        }

        self.index_chunks(&chunks).await?;
        Ok(chunks.len())
    }

    async fn index_chunks(&self, chunks: &[Chunk]) -> Result<(), PipelineError> {
        for batch in chunks.chunks(DEFAULT_EMBED_BATCH) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors: Vec<Vec<f32>> = self
                .embedder
                .embed_batch(&texts)
                .await?
                .iter()
                .map(|v| l2_normalize(v))
                .collect();
            self.index.upsert_chunks(batch, &vectors).await?;
        }
        Ok(())
    }

    fn continuity_judge(&self, use_oracle: bool) -> Result<Box<dyn ContinuityJudge>, PipelineError> {
        match &self.config.llm_url {
            Some(url) if use_oracle => {
                let client = ChatClient::new(url, &self.config.gen_model)?;
                Ok(Box::new(LlmContinuityJudge::new(client)))
            }
            _ => {
                debug!("Continuity oracle disabled; using heading heuristic");
                Ok(Box::new(HeadingHeuristic))
            }
        }
    }

    fn support_verifier(&self, verify: bool) -> Result<Option<SupportVerifier>, PipelineError> {
        if !verify {
            return Ok(None);
        }
        match &self.config.llm_url {
            Some(url) => {
                let client = ChatClient::new(url, &self.config.gen_model)?;
                Ok(Some(SupportVerifier::new(client)))
            }
            None => {
                warn!("Verification requested without an LLM endpoint; rows stay unverified");
                Ok(None)
            }
        }
    }
}

/// Submits each row to the verifier. Failures leave the row unverified.
async fn annotate_rows(verifier: &SupportVerifier, rows: &mut [EvidenceRow]) {
    for row in rows.iter_mut() {
        match verifier.verify(&row.subcriterion_label, &row.excerpt).await {
            Ok(verification) => {
                row.verified = Some(verification.supports);
                row.verify_note = Some(verification.note);
            }
            Err(e) => {
                warn!(
                    subcriterion_id = %row.subcriterion_id,
                    error = %e,
                    "Verification failed; row stays unverified"
                );
            }
        }
    }
}

fn evidence_row(criterion: &Criterion, candidate: &Candidate) -> EvidenceRow {
    EvidenceRow {
        criterion_id: criterion.criterion_id.clone(),
        criterion_label: criterion.criterion_label.clone(),
        subcriterion_id: criterion.subcriterion_id.clone(),
        subcriterion_label: criterion.subcriterion_label.clone(),
        doc_id: candidate.doc_id.clone(),
        source_path: candidate.source_path.clone(),
        page: candidate.page,
        char_start: candidate.char_start,
        char_end: candidate.char_end,
        excerpt: candidate.text.clone(),
        retrieval_method: RETRIEVAL_METHOD.to_string(),
        score: candidate.score,
        ce_score: candidate.ce_score,
        verified: None,
        verify_note: None,
    }
}
