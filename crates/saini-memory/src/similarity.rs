//! Cosine similarity and ranking.

/// Added to the norm product so zero-magnitude vectors score 0 instead of NaN.
pub const EPSILON: f64 = 1e-9;

/// Decimal places kept on reported scores.
pub const SCORE_DECIMALS: i32 = 4;

/// Compute cosine similarity between two equal-length vectors.
///
/// `dot(a, b) / (|a| * |b| + EPSILON)`, accumulated in `f64`. Callers must
/// check lengths first; extra components of the longer slice are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt() + EPSILON)
}

/// Round a raw score for display, clamped to [-1, 1].
pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    ((score * factor).round() / factor).clamp(-1.0, 1.0)
}

/// Order scored items by descending score, keeping input order on ties,
/// and keep the first `top_k`.
pub fn rank<T>(mut scored: Vec<(T, f64)>, top_k: usize) -> Vec<(T, f64)> {
    // sort_by is stable; -0.0 and 0.0 compare equal here
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}
