//! Text similarity.
//!
//! Texts are compared as hashed bag-of-words vectors: every whitespace token
//! lands in one of `size` buckets chosen by its SHA-256 digest, and two texts
//! are compared by the cosine of their vectors. Distinct tokens may share a
//! bucket.

use sha2::{Digest, Sha256};

/// Default number of buckets.
pub const DEFAULT_VSM_SIZE: usize = 5000;

fn bucket(token: &str, size: usize) -> usize {
    let digest = Sha256::digest(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % size as u64) as usize
}

/// Hashes `text` into a bag-of-words vector with `size` buckets.
pub fn vectorize(text: &str, size: usize) -> Vec<u32> {
    let mut vector = vec![0u32; size];
    if size == 0 {
        return vector;
    }
    for token in text.split_whitespace() {
        vector[bucket(token, size)] += 1;
    }
    vector
}

fn norm(vector: &[u32]) -> f64 {
    vector.iter().map(|&v| f64::from(v) * f64::from(v)).sum::<f64>().sqrt()
}

fn dot(a: &[u32], b: &[u32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum()
}

/// Cosine similarity of two texts under the default vector size.
///
/// Returns 0.0 (and logs a warning) when either text has no tokens.
pub fn similarity(a: &str, b: &str) -> f64 {
    SimilarityScorer::new(a, DEFAULT_VSM_SIZE).score(b)
}

/// Scores texts against one fixed reference text.
///
/// The reference vector is hashed once and reused for every candidate.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    reference: Vec<u32>,
    reference_norm: f64,
    size: usize,
}

impl SimilarityScorer {
    pub fn new(reference: &str, size: usize) -> Self {
        let reference = vectorize(reference, size);
        let reference_norm = norm(&reference);
        Self { reference, reference_norm, size }
    }

    /// Cosine similarity between the reference and `text`.
    pub fn score(&self, text: &str) -> f64 {
        self.try_score(text).unwrap_or_else(|| {
            tracing::warn!(
                reference_empty = self.reference_norm == 0.0,
                candidate_len = text.len(),
                "Cannot compute similarity for empty text"
            );
            0.0
        })
    }

    /// Cosine similarity to the reference, or `None` when either text has no
    /// tokens.
    pub fn try_score(&self, text: &str) -> Option<f64> {
        let candidate = vectorize(text, self.size);
        let divisor = self.reference_norm * norm(&candidate);
        if divisor == 0.0 {
            return None;
        }
        Some((dot(&self.reference, &candidate) / divisor).min(1.0))
    }
}

/// Edit-based similarity ratio in `0..=100`.
///
/// Computed as `2 * LCS / (len_a + len_b)` over characters, where LCS is the
/// longest common subsequence. Two empty strings are identical.
pub fn fuzzy_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { previous[j + 1].max(current[j]) };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    let lcs = previous[b.len()];

    ((200 * lcs) as f64 / total as f64).round() as u8
}
