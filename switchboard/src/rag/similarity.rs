/// Cosine similarity of two vectors of equal length.
///
/// Returns 0 when either vector has zero norm, or when the result is not
/// finite (overflowing components).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_self_similarity() {
        for v in [vec![1.0, 0.0], vec![0.3, -2.5, 7.0], vec![1e-3, 1e-3, 1e-3, 1e-3]] {
            assert!((cosine_similarity(&v, &v) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_symmetric() {
        let a = [0.2, 0.9, -0.4];
        let b = [1.5, -0.1, 0.3];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < EPS);
        assert!((cosine_similarity(&[1.0, 2.0], &[-2.0, -4.0]) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_overflow_gives_zero() {
        let huge = [1e20f32, 1e20];
        assert_eq!(cosine_similarity(&huge, &huge), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }
}
