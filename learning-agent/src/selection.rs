//! Next-insight selection.
//!
//! Candidates are ranked by how often they were shown (fewest first), then by
//! how well their title matches a fixed learning-intent query, then by the
//! relevance score the platform already computed. The title index is built
//! from scratch for every call and discarded afterwards.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::schema::InsightCandidate;

/// Query scored against every title.
pub const NEXT_INSIGHT_QUERY: &str = "What is a good next insight to learn to improve understanding?";

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it", "of",
    "on", "or", "the", "to", "what", "with", "your",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no uncompleted insights to choose from")]
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("no documents to index")]
    Empty,
    #[error("titles contain no indexable terms")]
    NoTerms,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// TF-IDF vectors over a small set of titles.
#[derive(Debug)]
pub struct TitleIndex {
    idf: HashMap<String, f64>,
    docs: Vec<HashMap<String, f64>>,
}

impl TitleIndex {
    pub fn build<'a>(titles: impl IntoIterator<Item = &'a str>) -> Result<Self, IndexError> {
        let tokenized: Vec<Vec<String>> = titles.into_iter().map(tokenize).collect();
        if tokenized.is_empty() {
            return Err(IndexError::Empty);
        }

        let mut df: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&String> = Vec::new();
            for t in tokens {
                if !seen.contains(&t) {
                    seen.push(t);
                    *df.entry(t.clone()).or_default() += 1;
                }
            }
        }
        if df.is_empty() {
            return Err(IndexError::NoTerms);
        }

        // Smoothed idf keeps terms present in every title above zero.
        let n = tokenized.len() as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, count)| (term, ((1.0 + n) / (1.0 + count as f64)).ln() + 1.0))
            .collect();

        let docs = tokenized
            .iter()
            .map(|tokens| Self::weigh(tokens, &idf))
            .collect();

        Ok(Self { idf, docs })
    }

    fn weigh(tokens: &[String], idf: &HashMap<String, f64>) -> HashMap<String, f64> {
        let mut tf: HashMap<String, f64> = HashMap::new();
        for t in tokens {
            if idf.contains_key(t) {
                *tf.entry(t.clone()).or_default() += 1.0;
            }
        }
        for (term, weight) in tf.iter_mut() {
            *weight *= idf[term];
        }
        tf
    }

    fn norm(vector: &HashMap<String, f64>) -> f64 {
        vector.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Cosine similarity of `query` against every document, in index order.
    pub fn score(&self, query: &str) -> Vec<f64> {
        let q = Self::weigh(&tokenize(query), &self.idf);
        let q_norm = Self::norm(&q);

        self.docs
            .iter()
            .map(|doc| {
                let d_norm = Self::norm(doc);
                if q_norm == 0.0 || d_norm == 0.0 {
                    return 0.0;
                }
                let dot: f64 = q
                    .iter()
                    .filter_map(|(term, w)| doc.get(term).map(|d| w * d))
                    .sum();
                dot / (q_norm * d_norm)
            })
            .collect()
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Pick the next insight to show. Ties keep input order.
pub fn select_next_insight(candidates: &[InsightCandidate]) -> Result<i64, SelectionError> {
    if candidates.is_empty() {
        return Err(SelectionError::NoCandidates);
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();

    match TitleIndex::build(candidates.iter().map(|c| c.title.as_str())) {
        Ok(index) => {
            let retrieval = index.score(NEXT_INSIGHT_QUERY);
            order.sort_by(|&a, &b| {
                let (ca, cb) = (&candidates[a], &candidates[b]);
                ca.shown()
                    .cmp(&cb.shown())
                    .then_with(|| desc(retrieval[a], retrieval[b]))
                    .then_with(|| desc(ca.relevance(), cb.relevance()))
            });
        }
        Err(e) => {
            warn!(error = %e, "Title index unavailable, ranking without retrieval scores");
            order.sort_by(|&a, &b| {
                let (ca, cb) = (&candidates[a], &candidates[b]);
                ca.shown()
                    .cmp(&cb.shown())
                    .then_with(|| desc(ca.relevance(), cb.relevance()))
            });
        }
    }

    let chosen = &candidates[order[0]];
    debug!(
        insight_id = chosen.insight_id,
        times_shown = chosen.shown(),
        candidates = candidates.len(),
        "Next insight selected"
    );
    Ok(chosen.insight_id)
}
