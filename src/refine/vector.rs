//! Similarity math over embedding vectors.
//!
//! All selection and dedup routines assume L2-normalized inputs so cosine
//! similarity reduces to a dot product. Normalization is applied by the
//! caller, uniformly, before any similarity computation.

use crate::constants::NORM_EPSILON;

/// L2-normalizes a vector. The epsilon keeps zero vectors finite instead of
/// producing NaN.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / (norm + NORM_EPSILON)).collect()
}

/// Dot product. Equals cosine similarity when both inputs are normalized.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity of two raw vectors. Zero-magnitude inputs score 0.0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}
