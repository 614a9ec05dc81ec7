//! Embedding vector math shared by the gallery index and the extractors.

/// Scale `v` to unit L2 norm in place. The zero vector is left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine distance `1 - cos(a, b)`, in `[0, 2]`.
///
/// Defined as `1.0` (maximum useful distance) when either vector has zero
/// norm, matching the convention of treating a degenerate embedding as
/// unrelated to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    1.0 - dot / (norm_a * norm_b)
}
