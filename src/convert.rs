//! One-shot conversion of the standards PDF into the cached text artifact.
//!
//! The knowledge base never runs this; it only reads the file it writes.
//! Unlike the runtime loader there is no failure budget here: failing
//! pages are logged and skipped, and the page cap is optional.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::Result,
    loader::{
        ExtractionLimits,
        PageSource,
        PdfPages,
        extract_pages_with_progress,
    },
};

/// Pages between progress log lines.
const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub output: PathBuf,
    pub total_pages: usize,
    pub pages_processed: usize,
    pub pages_with_text: usize,
    pub failures: usize,
    pub bytes_written: u64,
}

/// Extract `pdf_path` (optionally only its first `max_pages` pages) and
/// write the marked text to `output_path`.
pub fn convert_pdf_to_text(
    pdf_path: &Path,
    output_path: &Path,
    max_pages: Option<usize>,
) -> Result<ConversionReport> {
    info!(
        pdf = %pdf_path.display(),
        output = %output_path.display(),
        "converting PDF to text"
    );
    let mut pages = PdfPages::open(pdf_path)?;
    convert_pages(&mut pages, output_path, max_pages)
}

fn convert_pages(
    pages: &mut impl PageSource,
    output_path: &Path,
    max_pages: Option<usize>,
) -> Result<ConversionReport> {
    let report = extract_pages_with_progress(
        pages,
        ExtractionLimits {
            max_pages,
            max_consecutive_failures: None,
        },
        |page, total| {
            if is_progress_page(page) {
                info!(page, total, "converting pages");
            }
        },
    )?;

    if report.failures > 0 {
        warn!(failures = report.failures, "some pages could not be extracted");
    }
    if report.text.is_empty() {
        warn!("no text extracted, writing an empty file");
    }

    std::fs::write(output_path, &report.text)?;
    let bytes_written = std::fs::metadata(output_path)?.len();

    Ok(ConversionReport {
        output: output_path.to_path_buf(),
        total_pages: report.total_pages,
        pages_processed: report.pages_processed,
        pages_with_text: report.pages_with_text,
        failures: report.failures,
        bytes_written,
    })
}

fn is_progress_page(page: usize) -> bool {
    page % PROGRESS_INTERVAL == 0
}

/// Format a conversion report for terminal output.
pub fn format_human(report: &ConversionReport) {
    println!("Conversion complete");
    println!("  Output file:     {}", report.output.display());
    println!(
        "  File size:       {:.1} MB",
        report.bytes_written as f64 / (1024.0 * 1024.0)
    );
    println!(
        "  Pages processed: {} of {}",
        report.pages_processed, report.total_pages
    );
    if report.failures > 0 {
        println!("  Failed pages:    {}", report.failures);
    }
}
