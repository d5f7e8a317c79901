use rayon::prelude::*;
use serde::Serialize;

use crate::chunking::Chunk;

/// A chunk paired with its relevance to one query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: usize,
}

impl ScoredChunk<'_> {
    pub fn page_label(&self) -> String {
        self.chunk.page_label()
    }
}

/// Lowercase, whitespace-separated query terms. Repeated terms are kept
/// and count once per repetition.
pub fn query_terms(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Sum of case-insensitive substring occurrences of each term in `text`.
///
/// A term inside a longer word still counts ("riba" matches "ribawi").
/// The sum saturates instead of overflowing on pathological queries.
///
/// # Examples
///
/// ```
/// use aaoifi_kb::search::{query_terms, term_frequency};
///
/// let terms = query_terms("Riba gharar");
/// assert_eq!(term_frequency("RIBA and ribawi, no gharar", &terms), 3);
/// ```
pub fn term_frequency(text: &str, terms: &[String]) -> usize {
    let lowered = text.to_lowercase();
    terms
        .iter()
        .map(|term| lowered.matches(term.as_str()).count())
        .fold(0, usize::saturating_add)
}

/// Rank chunks against a query.
///
/// Returns at most `limit` chunks, all with a positive score, highest
/// first. Equal scores keep corpus order.
pub fn search<'a>(
    chunks: &'a [Chunk],
    query: &str,
    limit: usize,
) -> Vec<ScoredChunk<'a>> {
    let terms = query_terms(query);
    if terms.is_empty() || limit == 0 {
        return Vec::new();
    }

    // par_iter + collect keeps input order, so the stable sort below
    // breaks ties by chunk index.
    let mut scored: Vec<ScoredChunk<'a>> = chunks
        .par_iter()
        .filter_map(|chunk| {
            let score = term_frequency(&chunk.text, &terms);
            (score > 0).then_some(ScoredChunk { chunk, score })
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// Serializable view of a search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub rank: usize,
    pub score: usize,
    pub page: String,
    pub chunk_index: usize,
    pub start_offset: usize,
    pub text: String,
}

impl SearchHit {
    pub fn from_ranked(results: &[ScoredChunk<'_>]) -> Vec<Self> {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| SearchHit {
                rank: i + 1,
                score: r.score,
                page: r.page_label(),
                chunk_index: r.chunk.index,
                start_offset: r.chunk.start_offset,
                text: r.chunk.text.clone(),
            })
            .collect()
    }
}

/// Format results for human-readable terminal output.
pub fn format_human(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results found.");
        return;
    }

    for hit in hits {
        println!(
            "{:>3}. [{}] page {} chunk #{} @{}",
            hit.rank, hit.score, hit.page, hit.chunk_index, hit.start_offset
        );
        let preview: String = hit.text.chars().take(120).collect();
        println!("     {}", preview.replace('\n', " "));
    }
    println!("\n{} result(s)", hits.len());
}
