use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    chunking::ChunkingConfig,
    error::{Error, Result},
};

pub const DATA_DIR_ENV_VAR: &str = "AAOIFI_KB_DATA_DIR";
pub const ENABLED_ENV_VAR: &str = "ENABLE_PDF_KNOWLEDGE";

pub const TEXT_FILE_NAME: &str = "AAOIFI-Standards.txt";
pub const PDF_FILE_NAME: &str = "AAOIFI-Standards.pdf";
pub const OVERRIDES_FILE_NAME: &str = "knowledge.json";

pub const DEFAULT_DOCUMENT_NAME: &str = "AAOIFI Standards";
pub const DEFAULT_MAX_PAGES: usize = 50;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 5;
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Directory holding the standards document and its cached text.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The AAOIFI_KB_DATA_DIR environment variable
    /// 3. The current working directory
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var(DATA_DIR_ENV_VAR) {
            PathBuf::from(val)
        } else {
            std::env::current_dir()?
        };

        if !root.is_dir() {
            return Err(Error::DataDir(root));
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn text_path(&self) -> PathBuf {
        self.root.join(TEXT_FILE_NAME)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.root.join(PDF_FILE_NAME)
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.root.join(OVERRIDES_FILE_NAME)
    }
}

/// Optional settings read from `knowledge.json` in the data directory.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Overrides {
    document_name: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    max_pages: Option<usize>,
    max_consecutive_failures: Option<usize>,
    max_results: Option<usize>,
}

/// Everything the knowledge base needs to know up front.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub text_path: PathBuf,
    pub pdf_path: PathBuf,
    /// Name shown in each context block header.
    pub document_name: String,
    pub chunking: ChunkingConfig,
    /// Page cap for PDF extraction.
    pub max_pages: usize,
    /// Consecutive page failures tolerated before extraction stops.
    pub max_consecutive_failures: usize,
    /// Ranked chunks considered when assembling context.
    pub max_results: usize,
    /// When false the knowledge base never loads anything.
    pub enabled: bool,
}

impl KnowledgeConfig {
    /// Defaults for a data directory, enabled, ignoring the environment.
    pub fn new(data_dir: &DataDir) -> Self {
        Self {
            text_path: data_dir.text_path(),
            pdf_path: data_dir.pdf_path(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            chunking: ChunkingConfig::default(),
            max_pages: DEFAULT_MAX_PAGES,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            max_results: DEFAULT_MAX_RESULTS,
            enabled: true,
        }
    }

    /// Defaults, then `knowledge.json` overrides, then the
    /// `ENABLE_PDF_KNOWLEDGE` toggle.
    ///
    /// Invalid settings are rejected here so queries never see them.
    pub fn resolve(data_dir: &DataDir) -> Result<Self> {
        let mut config = Self::new(data_dir);

        let overrides_path = data_dir.overrides_path();
        if overrides_path.is_file() {
            let contents = std::fs::read_to_string(&overrides_path)?;
            let overrides: Overrides = serde_json::from_str(&contents)?;
            config.apply(overrides)?;
        }

        config.enabled = match std::env::var(ENABLED_ENV_VAR) {
            Ok(value) => is_enabled_value(&value),
            Err(_) => true,
        };

        Ok(config)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn apply(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(name) = overrides.document_name {
            self.document_name = name;
        }

        let chunk_size =
            overrides.chunk_size.unwrap_or(self.chunking.chunk_size());
        let overlap = overrides.chunk_overlap.unwrap_or(self.chunking.overlap());
        self.chunking = ChunkingConfig::new(chunk_size, overlap)?;

        if let Some(max_pages) = overrides.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(max_failures) = overrides.max_consecutive_failures {
            if max_failures == 0 {
                return Err(Error::Config(
                    "max_consecutive_failures must be at least 1".into(),
                ));
            }
            self.max_consecutive_failures = max_failures;
        }
        if let Some(max_results) = overrides.max_results {
            self.max_results = max_results;
        }

        Ok(())
    }
}

/// Interpret an `ENABLE_PDF_KNOWLEDGE` value: only `false` (any case)
/// disables.
pub fn is_enabled_value(value: &str) -> bool {
    !value.eq_ignore_ascii_case("false")
}
