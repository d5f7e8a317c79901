//! Corpus loading: the cached text artifact first, PDF pages second.
//!
//! PDF extraction walks pages in order under a page cap. Each page is
//! attempted independently; ordinary failures are counted, and once
//! `max_consecutive_failures` pages fail in a row extraction stops and
//! returns what it has. Critical errors (see [`Error::is_critical`]) are
//! never counted and abort extraction immediately.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use pdf_oxide::PdfDocument;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::{
    config::KnowledgeConfig,
    error::{Error, Result},
};

/// Separator placed between extracted pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--- Page (\d+) ---").expect("page marker pattern is valid")
});

/// Prefix a page's text with its 1-based page marker.
pub fn format_page(number: usize, text: &str) -> String {
    format!("--- Page {number} ---\n{text}")
}

/// Page number of the first marker found in `text`, if any.
///
/// # Examples
///
/// ```
/// use aaoifi_kb::loader::page_marker;
///
/// assert_eq!(page_marker("intro\n--- Page 12 ---\nSukuk"), Some(12));
/// assert_eq!(page_marker("no marker here"), None);
/// ```
pub fn page_marker(text: &str) -> Option<u32> {
    PAGE_MARKER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Anything that can hand out the full corpus text.
///
/// The knowledge base only ever calls this once per process; implementors
/// do not need to cache.
pub trait ContentSource: Send + Sync {
    fn load(&self) -> Result<String>;
}

/// A paged document whose pages can be extracted one at a time.
pub trait PageSource {
    fn page_count(&mut self) -> Result<usize>;

    /// Extract the text of the zero-based page `index`.
    fn page_text(&mut self, index: usize) -> Result<String>;
}

/// A PDF opened with `pdf_oxide`.
pub struct PdfPages {
    document: PdfDocument,
}

impl PdfPages {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingSource(path.to_path_buf()));
        }
        let document = PdfDocument::open(path).map_err(pdf_error)?;
        Ok(Self { document })
    }
}

impl PageSource for PdfPages {
    fn page_count(&mut self) -> Result<usize> {
        self.document.page_count().map_err(pdf_error)
    }

    fn page_text(&mut self, index: usize) -> Result<String> {
        self.document.extract_text(index).map_err(pdf_error)
    }
}

fn pdf_error(error: impl std::fmt::Display) -> Error {
    Error::Pdf(error.to_string())
}

/// Bounds applied while walking pages. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionLimits {
    pub max_pages: Option<usize>,
    pub max_consecutive_failures: Option<usize>,
}

/// Outcome of a page walk.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Marked pages joined by [`PAGE_SEPARATOR`].
    pub text: String,
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages attempted before the cap, the end, or the failure budget.
    pub pages_processed: usize,
    /// Pages that produced non-blank text.
    pub pages_with_text: usize,
    /// Pages whose extraction failed.
    pub failures: usize,
    /// Whether the failure budget cut extraction short.
    pub stopped_early: bool,
}

/// Walk pages in order, collecting marked page text.
///
/// Blank pages are skipped without touching the failure counter; a page
/// with text resets it.
pub fn extract_pages(
    source: &mut impl PageSource,
    limits: ExtractionLimits,
) -> Result<ExtractionReport> {
    extract_pages_with_progress(source, limits, |_, _| {})
}

/// [`extract_pages`], calling `on_page(page, pages_to_process)` before each
/// 1-based page is attempted.
pub fn extract_pages_with_progress(
    source: &mut impl PageSource,
    limits: ExtractionLimits,
    mut on_page: impl FnMut(usize, usize),
) -> Result<ExtractionReport> {
    let total_pages = source.page_count()?;
    let to_process = limits
        .max_pages
        .map_or(total_pages, |cap| total_pages.min(cap));

    let mut report = ExtractionReport {
        total_pages,
        ..Default::default()
    };
    let mut consecutive_failures = 0;

    for index in 0..to_process {
        report.pages_processed = index + 1;
        let page = index + 1;
        on_page(page, to_process);

        match source.page_text(index) {
            Ok(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                let block = format_page(page, &text);
                let separator = if report.text.is_empty() {
                    ""
                } else {
                    PAGE_SEPARATOR
                };
                report.text.try_reserve(separator.len() + block.len())?;
                report.text.push_str(separator);
                report.text.push_str(&block);
                report.pages_with_text += 1;
                consecutive_failures = 0;
            }
            Err(e) if e.is_critical() => {
                error!(page, error = %e, "critical error during extraction");
                return Err(e);
            }
            Err(e) => {
                report.failures += 1;
                consecutive_failures += 1;
                debug!(page, error = %e, "page extraction failed");

                if limits
                    .max_consecutive_failures
                    .is_some_and(|max| consecutive_failures >= max)
                {
                    warn!(
                        failures = consecutive_failures,
                        page, "too many extraction failures, stopping"
                    );
                    report.stopped_early = true;
                    break;
                }
            }
        }
    }

    Ok(report)
}

/// Loads the corpus for a [`KnowledgeConfig`].
#[derive(Debug, Clone)]
pub struct ContentLoader {
    text_path: PathBuf,
    pdf_path: PathBuf,
    limits: ExtractionLimits,
}

impl ContentLoader {
    pub fn new(config: &KnowledgeConfig) -> Self {
        Self {
            text_path: config.text_path.clone(),
            pdf_path: config.pdf_path.clone(),
            limits: ExtractionLimits {
                max_pages: Some(config.max_pages),
                max_consecutive_failures: Some(
                    config.max_consecutive_failures,
                ),
            },
        }
    }

    /// The cached text artifact, if it exists and has content.
    ///
    /// Non-critical read errors (missing file, invalid UTF-8) fall through
    /// to `None` so the caller can try the PDF.
    fn read_text_artifact(&self) -> Result<Option<String>> {
        let path = &self.text_path;
        if !path.is_file() {
            debug!(path = %path.display(), "no cached text file");
            return Ok(None);
        }

        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => {
                info!(path = %path.display(), "loading from text file");
                Ok(Some(content))
            }
            Ok(_) => {
                warn!(
                    path = %path.display(),
                    "text file is empty, falling back to PDF"
                );
                Ok(None)
            }
            Err(e) => {
                let e = Error::from(e);
                if e.is_critical() {
                    return Err(e);
                }
                warn!(
                    path = %path.display(),
                    error = %e,
                    "could not read text file, falling back to PDF"
                );
                Ok(None)
            }
        }
    }

    fn load_pdf(&self) -> Result<String> {
        info!(path = %self.pdf_path.display(), "loading from PDF");
        let mut pages = PdfPages::open(&self.pdf_path)?;
        self.corpus_from_pages(&mut pages)
    }

    fn corpus_from_pages(&self, pages: &mut impl PageSource) -> Result<String> {
        let report = extract_pages(pages, self.limits)?;

        if report.pages_processed < report.total_pages && !report.stopped_early
        {
            warn!(
                processed = report.pages_processed,
                total = report.total_pages,
                "page cap reached, remaining pages skipped"
            );
        }

        if report.text.is_empty() {
            return Err(Error::EmptyCorpus(self.pdf_path.clone()));
        }

        Ok(report.text)
    }
}

impl ContentSource for ContentLoader {
    fn load(&self) -> Result<String> {
        if let Some(text) = self.read_text_artifact()? {
            return Ok(text);
        }
        self.load_pdf()
    }
}
