//! Similarity primitives used by the index and by ad-hoc ranking.

const LANES: usize = 8;

/// Dot product over equal-length slices, accumulated in independent lanes
/// so the loop vectorizes.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let (ca, cb) = (a.chunks_exact(LANES), b.chunks_exact(LANES));
    let tail: f32 = ca.remainder().iter().zip(cb.remainder()).map(|(x, y)| x * y).sum();
    let mut acc = [0f32; LANES];
    for (x, y) in ca.zip(cb) {
        for ((lane, x), y) in acc.iter_mut().zip(x).zip(y) {
            *lane += x * y;
        }
    }
    acc.iter().sum::<f32>() + tail
}

/// Unit-length copy of `v`. The zero vector stays zero.
#[must_use]
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let norm = dot(v, v).sqrt();
    if norm > 1e-12 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a > 1e-12 && norm_b > 1e-12 {
        dot(a, b) / (norm_a * norm_b)
    } else {
        0.0
    }
}
