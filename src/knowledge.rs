//! The knowledge base facade handed to the advisor layer.
//!
//! Loading happens at most once per [`KnowledgeBase`]: the first query
//! runs the [`ContentSource`] inside a [`OnceLock`], so concurrent first
//! callers wait on the same attempt and see the same outcome. A failed
//! load is remembered and never retried. After that the corpus is
//! read-only and queries only re-run scoring and assembly.

use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    chunking::{Chunk, chunk_text},
    config::KnowledgeConfig,
    context::assemble,
    error::{Error, Result},
    loader::{ContentLoader, ContentSource},
    search::{self, ScoredChunk},
};

/// The loaded corpus and its chunks.
#[derive(Debug)]
pub struct Corpus {
    text: String,
    chunks: Vec<Chunk>,
}

impl Corpus {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

#[derive(Debug)]
enum CorpusState {
    Loaded(Corpus),
    /// Sentinel for a load that was attempted and failed.
    LoadFailed(String),
}

/// Snapshot of the knowledge base lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum KnowledgeStatus {
    Disabled,
    Uninitialized,
    Loaded { chunks: usize, chars: usize },
    LoadFailed { reason: String },
}

pub struct KnowledgeBase {
    config: KnowledgeConfig,
    source: Box<dyn ContentSource>,
    state: OnceLock<CorpusState>,
}

impl KnowledgeBase {
    /// A knowledge base backed by the files named in `config`.
    pub fn new(config: KnowledgeConfig) -> Self {
        let source = Box::new(ContentLoader::new(&config));
        Self::with_source(config, source)
    }

    /// A knowledge base backed by an arbitrary content source.
    pub fn with_source(
        config: KnowledgeConfig,
        source: Box<dyn ContentSource>,
    ) -> Self {
        Self {
            config,
            source,
            state: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Current lifecycle state. Never triggers a load.
    pub fn status(&self) -> KnowledgeStatus {
        if !self.config.enabled {
            return KnowledgeStatus::Disabled;
        }
        match self.state.get() {
            None => KnowledgeStatus::Uninitialized,
            Some(CorpusState::Loaded(corpus)) => KnowledgeStatus::Loaded {
                chunks: corpus.chunks.len(),
                chars: corpus.text.chars().count(),
            },
            Some(CorpusState::LoadFailed(reason)) => {
                KnowledgeStatus::LoadFailed {
                    reason: reason.clone(),
                }
            }
        }
    }

    /// The corpus, loading it on first use.
    pub fn corpus(&self) -> Result<&Corpus> {
        if !self.config.enabled {
            return Err(Error::Unavailable("disabled by configuration".into()));
        }

        match self.state.get_or_init(|| self.initialize()) {
            CorpusState::Loaded(corpus) => Ok(corpus),
            CorpusState::LoadFailed(reason) => {
                Err(Error::Unavailable(reason.clone()))
            }
        }
    }

    fn initialize(&self) -> CorpusState {
        info!(document = %self.config.document_name, "loading standards content");

        match self.source.load() {
            Ok(text) if text.trim().is_empty() => {
                warn!("standards content is empty");
                CorpusState::LoadFailed("content is empty".into())
            }
            Ok(text) => {
                let chunks = chunk_text(&text, self.config.chunking);
                info!(chunks = chunks.len(), "standards content loaded");
                CorpusState::Loaded(Corpus { text, chunks })
            }
            Err(e) => {
                if e.is_critical() {
                    error!(error = %e, "critical error loading standards content");
                } else {
                    warn!(error = %e, "could not load standards content");
                }
                CorpusState::LoadFailed(e.to_string())
            }
        }
    }

    /// Rank chunks for `query`, loading the corpus on first use.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredChunk<'_>>> {
        let corpus = self.corpus()?;
        Ok(search::search(&corpus.chunks, query, limit))
    }

    /// Context for `query`, or the reason none is available.
    pub fn try_relevant_context(
        &self,
        query: &str,
        max_chars: usize,
    ) -> Result<String> {
        let ranked = self.search(query, self.config.max_results)?;
        Ok(assemble(&ranked, &self.config.document_name, max_chars))
    }

    /// Context for `query` under `max_chars`.
    ///
    /// Never fails: when the knowledge base is disabled, could not be
    /// loaded, or nothing matches, the result is an empty string. A
    /// disabled knowledge base performs no I/O at all.
    pub fn get_relevant_context(&self, query: &str, max_chars: usize) -> String {
        if !self.config.enabled {
            return String::new();
        }

        match self.try_relevant_context(query, max_chars) {
            Ok(context) => context,
            Err(e) => {
                debug!(error = %e, "no standards context");
                String::new()
            }
        }
    }
}
