//! Classify Command
//!
//! Suggest an archival path for every input document and stream one result
//! record per document to stdout.
//!
//! Usage:
//!   docfiler classify PATH... [--strict] [--style compact] [--format csv]
//!   find . -name '*.pdf' | docfiler classify --batch

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::ai::create_provider;
use crate::cli::{CommandContext, open_cache, select_taxonomy};
use crate::config::{
    Config, ExtractionStrategy, NamingStyle, OutputFormat, StandardsMode, ValidationMode,
};
use crate::extraction::FileExtractor;
use crate::files::{collect_inputs, read_batch};
use crate::output::ResultWriter;
use crate::pipeline::{BatchRunner, BatchSummary, PipelineContext, cancel_on_ctrl_c, cancel_pair};
use crate::types::{FilerError, Result};

/// Flag overrides for one classify run (highest configuration priority)
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Files and directories to classify
    pub paths: Vec<PathBuf>,
    /// Also read newline-separated paths from stdin
    pub batch: bool,
    /// Taxonomy name or YAML path
    pub taxonomy: Option<String>,
    pub mode: Option<ValidationMode>,
    /// Shorthand for `--mode strict`
    pub strict: bool,
    /// Report unknown taxonomy values as conflicts instead of failing
    pub dry_validation: bool,
    pub style: Option<NamingStyle>,
    pub quarterly: bool,
    pub strategy: Option<ExtractionStrategy>,
    pub concurrency: Option<usize>,
    pub format: Option<OutputFormat>,
    pub standards: Option<StandardsMode>,
    pub no_cache: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl ClassifyOptions {
    /// Layer the flags over the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(taxonomy) = &self.taxonomy {
            select_taxonomy(&mut config.taxonomy, taxonomy);
        }
        if let Some(mode) = self.mode {
            config.taxonomy.mode = mode;
        }
        if self.strict {
            config.taxonomy.mode = ValidationMode::Strict;
        }
        if self.dry_validation {
            config.taxonomy.dry_validation = true;
        }
        if let Some(style) = self.style {
            config.naming.style = style;
        }
        if self.quarterly {
            config.naming.quarterly = true;
        }
        if let Some(strategy) = self.strategy {
            config.extraction.strategy = strategy;
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.concurrency = concurrency;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(standards) = self.standards {
            config.pipeline.standards = standards;
        }
        if self.no_cache {
            config.pipeline.cache = false;
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
    }
}

/// Path arguments followed by batch lines, expanded into documents
fn gather_inputs<R: BufRead>(paths: &[PathBuf], batch: Option<R>) -> Result<Vec<PathBuf>> {
    let mut args = paths.to_vec();
    if let Some(reader) = batch {
        args.extend(read_batch(reader)?);
    }
    collect_inputs(&args)
}

/// Run a batch. Configuration, credential and taxonomy problems fail here
/// before any document is processed; per-document failures are reported in
/// the output stream instead.
pub fn run(explicit: Option<&Path>, options: ClassifyOptions) -> Result<BatchSummary> {
    let CommandContext { config, taxonomy } = CommandContext::load(explicit, |c| options.apply(c))?;
    let provider = create_provider(&config.llm)?;

    let stdin = options.batch.then(|| io::stdin().lock());
    let inputs = gather_inputs(&options.paths, stdin)?;
    if inputs.is_empty() {
        warn!("No input documents. Pass files or directories, or use --batch");
        return Ok(BatchSummary::default());
    }

    info!(
        "Classifying {} documents with {} ({})",
        inputs.len(),
        provider.name(),
        provider.model()
    );

    let format = config.output.format;
    let cache = open_cache(config.pipeline.cache);
    let ctx = Arc::new(PipelineContext {
        config: Arc::new(config),
        taxonomy,
        provider,
        extractor: FileExtractor::shared(),
        cache,
    });
    let runner = BatchRunner::new(ctx);

    let rt = Runtime::new()?;
    let summary = rt.block_on(async {
        let (handle, signal) = cancel_pair();
        cancel_on_ctrl_c(handle);

        let mut writer = ResultWriter::new(io::stdout().lock(), format);
        runner
            .run(inputs, signal, |result| writer.write(&result))
            .await
    })?;

    if let Some(reason) = &summary.aborted {
        return Err(FilerError::Config(format!("run aborted: {}", reason)));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let options = ClassifyOptions {
            strict: true,
            style: Some(NamingStyle::Compact),
            quarterly: true,
            concurrency: Some(8),
            format: Some(OutputFormat::Tsv),
            no_cache: true,
            model: Some("llama3.1".to_string()),
            provider: Some("ollama".to_string()),
            ..Default::default()
        };
        options.apply(&mut config);

        assert_eq!(config.taxonomy.mode, ValidationMode::Strict);
        assert_eq!(config.naming.style, NamingStyle::Compact);
        assert!(config.naming.quarterly);
        assert_eq!(config.pipeline.concurrency, 8);
        assert_eq!(config.output.format, OutputFormat::Tsv);
        assert!(!config.pipeline.cache);
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model.as_deref(), Some("llama3.1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_wins_over_mode() {
        let mut config = Config::default();
        ClassifyOptions {
            mode: Some(ValidationMode::Flexible),
            strict: true,
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.taxonomy.mode, ValidationMode::Strict);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let mut config = Config::default();
        config.naming.style = NamingStyle::Compact;
        ClassifyOptions::default().apply(&mut config);

        assert_eq!(config.naming.style, NamingStyle::Compact);
        assert_eq!(config.taxonomy.mode, ValidationMode::Flexible);
        assert!(config.pipeline.cache);
    }

    #[test]
    fn test_empty_batch_gathers_nothing() {
        let inputs = gather_inputs(&[], Some("\n# nothing matched\n".as_bytes())).unwrap();
        assert!(inputs.is_empty());
    }

    #[test]
    fn test_batch_lines_follow_path_arguments() {
        let inputs = gather_inputs(
            &[PathBuf::from("a.pdf")],
            Some("b.pdf\na.pdf\n".as_bytes()),
        )
        .unwrap();
        assert_eq!(
            inputs,
            vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("b.pdf"),
                PathBuf::from("a.pdf")
            ]
        );
    }

    #[test]
    fn test_out_of_range_concurrency_fails_validation() {
        let mut config = Config::default();
        ClassifyOptions {
            concurrency: Some(0),
            ..Default::default()
        }
        .apply(&mut config);
        assert!(matches!(config.validate(), Err(FilerError::Config(_))));
    }
}
