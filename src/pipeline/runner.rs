//! Document pipeline and batch runner.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::cancel::{CancelSignal, cancel_pair};
use super::state::DocumentState;
use crate::agents::{
    ClassificationAgent, ResolutionAgent, ResolutionRequest, StandardsAgent, StandardsRules,
    detect_conflicts,
};
use crate::ai::SharedProvider;
use crate::config::{Config, StandardsMode};
use crate::extraction::{SharedExtractor, select_strategy};
use crate::naming::build_document_path;
use crate::storage::{CacheKey, SharedCache};
use crate::taxonomy::SharedTaxonomy;
use crate::types::{
    ClassificationResult, FailureKind, FilerError, RawMetadata, Result, ResultStatus, RunId,
};

/// Read-only handles shared by every document of a run
pub struct PipelineContext {
    pub config: Arc<Config>,
    pub taxonomy: SharedTaxonomy,
    pub provider: SharedProvider,
    pub extractor: SharedExtractor,
    pub cache: Option<SharedCache>,
}

/// One document being processed
struct DocumentInput<'a> {
    path: &'a Path,
    label: String,
    extension: String,
}

// =============================================================================
// Document Pipeline
// =============================================================================

pub struct DocumentPipeline {
    ctx: Arc<PipelineContext>,
}

impl DocumentPipeline {
    pub fn new(ctx: Arc<PipelineContext>) -> Self {
        Self { ctx }
    }

    /// Run one document to a terminal state. Never fails: every error is
    /// captured in the returned result.
    pub async fn process(&self, path: &Path) -> ClassificationResult {
        self.run_document(path).await.0
    }

    /// Like [`process`](Self::process), also returning the failure kind of a
    /// failed document.
    #[instrument(skip(self), fields(document = %path.display()))]
    async fn run_document(&self, path: &Path) -> (ClassificationResult, Option<FailureKind>) {
        let input = DocumentInput {
            path,
            label: path.display().to_string(),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_lowercase(),
        };

        let cache_key = match self.cache_lookup(&input).await {
            Ok(Lookup::Hit(result)) => return (result, None),
            Ok(Lookup::Miss(key)) => key,
            Err(state) => {
                let result = state.into_result(&input.label);
                return (result, Some(FailureKind::ExtractionFailure));
            }
        };

        let mut state = DocumentState::Pending;
        while !state.is_terminal() {
            let from = state.name();
            state = self.step(&input, state).await;
            debug!("{}: {} → {}", input.label, from, state);
        }

        let failure = match &state {
            DocumentState::Failed { kind, .. } => Some(*kind),
            _ => None,
        };
        let result = state.into_result(&input.label);
        info!("{}: {}", input.label, result.status);

        if let (Some(cache), Some(key)) = (&self.ctx.cache, cache_key)
            && let Err(e) = cache.put(&key, &result)
        {
            warn!("Failed to cache result for {}: {}", input.label, e);
        }
        (result, failure)
    }

    async fn step(&self, input: &DocumentInput<'_>, state: DocumentState) -> DocumentState {
        match state {
            DocumentState::Pending => self.extract(input).await,
            DocumentState::Extracted { content } => {
                match ClassificationAgent::classify(
                    self.ctx.provider.as_ref(),
                    &self.ctx.taxonomy,
                    &input.label,
                    &content,
                )
                .await
                {
                    Ok(raw) => DocumentState::Classified { raw },
                    Err(e) => DocumentState::failed(&e),
                }
            }
            DocumentState::Classified { raw } => self.standardize(input, raw).await,
            DocumentState::Standardized {
                raw,
                standardized,
                path,
            } => {
                let flags = detect_conflicts(&raw, &standardized, &self.ctx.config.conflict);
                if flags.is_empty() {
                    let notes = standardized.warnings.clone();
                    DocumentState::Finalized {
                        standardized,
                        path,
                        flags,
                        notes,
                    }
                } else {
                    info!("{}: conflicts flagged: {}", input.label, flags);
                    DocumentState::ConflictPending {
                        raw,
                        standardized,
                        path,
                        flags,
                    }
                }
            }
            DocumentState::ConflictPending {
                raw,
                standardized,
                path,
                flags,
            } => {
                let config = &self.ctx.config;
                let rules = self.rules();
                let request = ResolutionRequest {
                    document: &input.label,
                    extension: &input.extension,
                    raw: &raw,
                    standardized: &standardized,
                    flags: &flags,
                    current: &path,
                };

                match ResolutionAgent::resolve(
                    self.ctx.provider.as_ref(),
                    &rules,
                    &config.naming,
                    request,
                )
                .await
                {
                    Ok(resolution) => DocumentState::Resolved {
                        resolution,
                        warnings: standardized.warnings,
                        flags,
                    },
                    Err(e) if e.kind().is_fatal() => DocumentState::failed(&e),
                    Err(e) => {
                        warn!("{}: {}, keeping standardized metadata", input.label, e);
                        let mut notes = standardized.warnings.clone();
                        let reason = match &e {
                            FilerError::ConflictResolution(msg) => msg.clone(),
                            other => other.to_string(),
                        };
                        notes.push(format!("conflict resolution failed: {}", reason));
                        DocumentState::Finalized {
                            standardized,
                            path,
                            flags,
                            notes,
                        }
                    }
                }
            }
            terminal => terminal,
        }
    }

    async fn extract(&self, input: &DocumentInput<'_>) -> DocumentState {
        let extractor = &self.ctx.extractor;
        let result: Result<_> = async {
            let probe = extractor.probe(input.path).await?;
            let plan = select_strategy(
                probe.size_bytes,
                probe.page_count,
                &self.ctx.config.extraction,
            );
            debug!("{}: sampling plan {}", input.label, plan);
            extractor.extract(input.path, plan).await
        }
        .await;

        match result {
            Ok(content) => DocumentState::Extracted { content },
            Err(e) => DocumentState::failed(&e),
        }
    }

    async fn standardize(&self, input: &DocumentInput<'_>, raw: RawMetadata) -> DocumentState {
        let rules = self.rules();
        let standardized = match self.ctx.config.pipeline.standards {
            StandardsMode::Rules => rules.apply(&raw),
            StandardsMode::Ai => {
                StandardsAgent::standardize(self.ctx.provider.as_ref(), &rules, &input.label, &raw)
                    .await
            }
        };

        let standardized = match standardized {
            Ok(s) => s,
            Err(e) => return DocumentState::failed(&e),
        };

        match build_document_path(
            &standardized.normalized,
            &self.ctx.taxonomy,
            &self.ctx.config.naming,
            &input.extension,
        ) {
            Ok(path) => DocumentState::Standardized {
                raw,
                standardized,
                path,
            },
            Err(e) => DocumentState::failed(&e),
        }
    }

    fn rules(&self) -> StandardsRules<'_> {
        let config = &self.ctx.config;
        StandardsRules::new(
            &self.ctx.taxonomy,
            &config.conflict,
            config.taxonomy.mode,
            config.taxonomy.dry_validation,
        )
    }

    /// Cache hit, or the key to store under once the document finishes.
    ///
    /// Unreadable files fail here so no stage runs for them.
    async fn cache_lookup(
        &self,
        input: &DocumentInput<'_>,
    ) -> std::result::Result<Lookup, DocumentState> {
        let Some(cache) = &self.ctx.cache else {
            return Ok(Lookup::Miss(None));
        };

        let bytes = match tokio::fs::read(input.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(DocumentState::Failed {
                    kind: FailureKind::ExtractionFailure,
                    reason: format!("{}: {}", input.label, e),
                });
            }
        };

        let key = match CacheKey::new(&bytes, &self.ctx.taxonomy, &self.ctx.config) {
            Ok(key) => key,
            Err(e) => {
                warn!("Cache key unavailable for {}: {}", input.label, e);
                return Ok(Lookup::Miss(None));
            }
        };
        match cache.get(&key) {
            Ok(Some(mut result)) => {
                debug!("{}: cache hit {}", input.label, &key.content_hash[..12]);
                result.original = input.label.clone();
                Ok(Lookup::Hit(result))
            }
            Ok(None) => Ok(Lookup::Miss(Some(key))),
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", input.label, e);
                Ok(Lookup::Miss(None))
            }
        }
    }
}

enum Lookup {
    Hit(ClassificationResult),
    Miss(Option<CacheKey>),
}

// =============================================================================
// Batch Runner
// =============================================================================

/// Counts by terminal status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub finalized: usize,
    pub resolved: usize,
    pub failed: usize,
    /// Set when a configuration-level failure (e.g. rejected credentials)
    /// stopped the run; remaining documents were reported as cancelled.
    pub aborted: Option<String>,
}

impl BatchSummary {
    fn record(&mut self, result: &ClassificationResult) {
        self.total += 1;
        match result.status {
            ResultStatus::Finalized => self.finalized += 1,
            ResultStatus::Resolved => self.resolved += 1,
            ResultStatus::Failed => self.failed += 1,
        }
    }
}

pub struct BatchRunner {
    pipeline: Arc<DocumentPipeline>,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(ctx: Arc<PipelineContext>) -> Self {
        let concurrency = ctx.config.pipeline.concurrency.max(1);
        Self {
            pipeline: Arc::new(DocumentPipeline::new(ctx)),
            concurrency,
        }
    }

    /// Process every input with bounded concurrency, handing each result to
    /// `on_result` as soon as it completes (completion order, not input
    /// order). Exactly one result is produced per input, including after
    /// cancellation.
    ///
    /// A configuration-level document failure cancels the rest of the run
    /// and is reported in [`BatchSummary::aborted`].
    pub async fn run<F>(
        &self,
        inputs: Vec<PathBuf>,
        cancel: CancelSignal,
        mut on_result: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(ClassificationResult) -> Result<()>,
    {
        let run_id = RunId::generate();
        info!(
            "Run {}: {} documents, concurrency {}",
            run_id,
            inputs.len(),
            self.concurrency
        );

        let (abort, aborted) = cancel_pair();

        let mut stream = futures::stream::iter(inputs)
            .map(|path| {
                let pipeline = Arc::clone(&self.pipeline);
                let mut cancel = cancel.clone();
                let mut aborted = aborted.clone();
                async move {
                    let cancelled = || {
                        let label = path.display().to_string();
                        (ClassificationResult::failed(label, "cancelled"), None::<FailureKind>)
                    };
                    if cancel.is_cancelled() || aborted.is_cancelled() {
                        return cancelled();
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => cancelled(),
                        _ = aborted.cancelled() => cancelled(),
                        outcome = pipeline.run_document(&path) => outcome,
                    }
                }
            })
            .buffer_unordered(self.concurrency);

        let mut summary = BatchSummary::default();
        while let Some((result, failure)) = stream.next().await {
            if failure.is_some_and(|kind| kind.is_fatal()) && summary.aborted.is_none() {
                error!("Run {} aborted: {}", run_id, result.notes);
                summary.aborted = Some(result.notes.clone());
                abort.cancel();
            }
            summary.record(&result);
            on_result(result)?;
        }

        info!(
            "Run {}: {} finalized, {} resolved, {} failed",
            run_id, summary.finalized, summary.resolved, summary.failed
        );
        Ok(summary)
    }
}
