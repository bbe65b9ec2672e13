//! Threshold-based near-duplicate suppression.

use super::vector::dot;

/// Greedy order-dependent duplicate filter over L2-normalized `vectors`.
///
/// The first item is always kept. Each later item is dropped when its
/// maximum cosine similarity against the already-kept set reaches
/// `threshold`, so input order decides which near-duplicate survives.
/// Returns kept indices, strictly increasing.
pub fn dedup_by_threshold(vectors: &[Vec<f32>], threshold: f32) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for (i, vector) in vectors.iter().enumerate() {
        if kept.is_empty() {
            kept.push(i);
            continue;
        }
        let max_sim = kept
            .iter()
            .map(|&j| dot(vector, &vectors[j]))
            .fold(f32::NEG_INFINITY, f32::max);
        if max_sim >= threshold {
            continue;
        }
        kept.push(i);
    }
    kept
}
