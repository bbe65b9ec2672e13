//! Maximal-marginal-relevance diversity selection.

use super::vector::dot;

/// Greedily selects up to `k` indices from relevance-ordered, L2-normalized
/// `vectors`, trading relevance to the rank-1 anchor against redundancy with
/// items already chosen.
///
/// Index 0 is always selected first and serves as the relevance anchor. Each
/// round scores every remaining candidate `j` as
/// `lambda * sim(j, anchor) - (1 - lambda) * max(sim(j, s) for selected s)`
/// and takes the highest scorer, breaking ties by earliest original index.
/// Returns indices in selection order.
///
/// `lambda = 1` degenerates to anchor-similarity ranking; `lambda = 0` to
/// farthest-point selection.
pub fn mmr_select(vectors: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    if vectors.is_empty() {
        return Vec::new();
    }
    let take = k.min(vectors.len());
    let mut selected = vec![0usize];
    if take <= 1 {
        return selected;
    }

    let anchor = &vectors[0];
    let mut remaining: Vec<usize> = (1..vectors.len()).collect();

    while selected.len() < take && !remaining.is_empty() {
        let mut best_pos = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, &j) in remaining.iter().enumerate() {
            let relevance = dot(&vectors[j], anchor);
            let redundancy = selected
                .iter()
                .map(|&s| dot(&vectors[j], &vectors[s]))
                .fold(f32::NEG_INFINITY, f32::max);
            let score = lambda * relevance - (1.0 - lambda) * redundancy;
            // Strict comparison keeps the earliest index on ties.
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }
        selected.push(remaining.remove(best_pos));
    }
    selected
}
