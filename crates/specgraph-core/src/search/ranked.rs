//! Term-weighted (tf-idf) similarity index for ranked search

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::terms::{cosine, term_counts};
use super::QueryError;
use crate::graph::Graph;
use crate::model::SectionId;

type SparseVector = HashMap<String, f32>;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub id: SectionId,
    pub score: f32,
}

/// L2-normalized tf-idf vectors over `title + text + change type` for every node.
///
/// Built once per loaded graph; rebuild it whenever the graph is replaced.
#[derive(Debug, Clone, Default)]
pub struct TfIdfIndex {
    ids: Vec<SectionId>,
    vectors: Vec<SparseVector>,
    idf: HashMap<String, f32>,
}

impl TfIdfIndex {
    pub fn build(graph: &Graph) -> Self {
        let nodes: Vec<_> = graph.nodes().collect();
        let counts: Vec<SparseVector> = nodes
            .par_iter()
            .map(|n| term_counts(&format!("{} {} {}", n.title, n.text, n.change_type)))
            .collect();

        let mut doc_frequency: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *doc_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        // smooth idf: ln((1 + n) / (1 + df)) + 1
        let n = counts.len() as f32;
        let idf: HashMap<String, f32> = doc_frequency
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0))
            .collect();

        let vectors: Vec<SparseVector> = counts
            .into_par_iter()
            .map(|tf| weigh(tf, &idf))
            .collect();

        tracing::debug!("Built tf-idf index: {} documents, {} terms", vectors.len(), idf.len());
        TfIdfIndex {
            ids: nodes.iter().map(|n| n.id.clone()).collect(),
            vectors,
            idf,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Query vector built with the corpus idf; unknown terms carry no weight.
    pub fn query_vector(&self, query: &str) -> SparseVector {
        let tf = term_counts(query)
            .into_iter()
            .filter(|(term, _)| self.idf.contains_key(term))
            .collect();
        weigh(tf, &self.idf)
    }

    /// Top `limit` nodes by cosine similarity, ties broken by ascending id.
    /// Nodes sharing no term with the query are not returned.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedHit>, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::InvalidQuery);
        }
        let query = self.query_vector(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<RankedHit> = self
            .ids
            .par_iter()
            .zip(self.vectors.par_iter())
            .filter_map(|(id, doc)| {
                let score = cosine(&query, doc);
                (score > 0.0).then(|| RankedHit {
                    id: id.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }
}

fn weigh(tf: SparseVector, idf: &HashMap<String, f32>) -> SparseVector {
    let mut weighted: SparseVector = tf
        .into_iter()
        .map(|(term, count)| {
            let w = count * idf.get(&term).copied().unwrap_or(0.0);
            (term, w)
        })
        .collect();
    let norm = weighted.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for w in weighted.values_mut() {
            *w /= norm;
        }
    }
    weighted
}
