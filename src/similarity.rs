//! Cosine similarity and exact top-k ranking

use rayon::prelude::*;

/// A candidate's position in collection storage and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub distance: f32,
}

/// Compute dot product of two slices
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    dot_f64(a, b) as f32
}

/// Compute the L2 norm of a slice
pub fn norm(a: &[f32]) -> f32 {
    norm_f64(a) as f32
}

// Accumulated in f64: every finite f32 squares and sums without overflow
// or underflow to zero.
fn dot_f64(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum()
}

fn norm_f64(a: &[f32]) -> f64 {
    a.iter().map(|x| *x as f64 * *x as f64).sum::<f64>().sqrt()
}

/// Cosine of the angle between `a` and `b`.
///
/// Returns `None` when the lengths differ, either vector has zero norm, or
/// the ratio is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let denom = norm_f64(a) * norm_f64(b);
    if denom == 0.0 {
        return None;
    }

    let similarity = dot_f64(a, b) / denom;
    if !similarity.is_finite() {
        return None;
    }

    // Clamp to [-1, 1] to handle floating point errors
    Some(similarity.clamp(-1.0, 1.0) as f32)
}

/// Cosine distance (1 - cosine similarity). Undefined similarity maps to
/// `f32::INFINITY` so such candidates rank after every comparable one.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    match cosine_similarity(a, b) {
        Some(similarity) => 1.0 - similarity,
        None => f32::INFINITY,
    }
}

/// Sort candidates ascending by cosine distance to `query`.
///
/// Candidates are `(index, vector)` pairs in storage order. The sort is
/// stable, so equal distances keep their storage order. When there are at
/// least `parallel_threshold` candidates, distances are computed on the
/// rayon pool.
pub fn rank_by_distance(
    query: &[f32],
    candidates: &[(usize, &[f32])],
    parallel_threshold: usize,
) -> Vec<Ranked> {
    let score = |&(index, vector): &(usize, &[f32])| Ranked {
        index,
        distance: cosine_distance(query, vector),
    };

    let mut ranked: Vec<Ranked> = if candidates.len() >= parallel_threshold {
        candidates.par_iter().map(score).collect()
    } else {
        candidates.iter().map(score).collect()
    };

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}

/// Rank candidates and keep the `k` closest.
pub fn top_k(
    query: &[f32],
    candidates: &[(usize, &[f32])],
    k: usize,
    parallel_threshold: usize,
) -> Vec<Ranked> {
    let mut ranked = rank_by_distance(query, candidates, parallel_threshold);
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dot_and_norm() {
        assert_relative_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0, epsilon = 1e-6);
        assert_relative_eq!(norm(&[3.0, 4.0]), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_identical() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(sim, 1.0, epsilon = 1e-6);
        assert_relative_eq!(cosine_distance(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert_relative_eq!(cosine_distance(&[1.0, 0.0], &[0.0, 1.0]), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        assert_relative_eq!(cosine_distance(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_vector_is_infinitely_far() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_distance(&[1.0, 0.0], &[0.0, 0.0]), f32::INFINITY);
    }

    #[test]
    fn test_length_mismatch_is_infinitely_far() {
        assert_eq!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0, 0.0]), f32::INFINITY);
    }

    #[test]
    fn test_large_magnitudes_stay_finite() {
        assert_relative_eq!(cosine_distance(&[1e20, 1e20], &[1.0, 1.0]), 0.0, epsilon = 1e-6);
        assert_relative_eq!(cosine_distance(&[1e20, 1e20], &[1e20, -1e20]), 1.0, epsilon = 1e-6);
        assert_relative_eq!(cosine_distance(&[1e20, 0.0], &[1e20, 0.0]), 0.0, epsilon = 1e-6);
        assert_relative_eq!(cosine_distance(&[f32::MAX, f32::MAX], &[f32::MAX, f32::MAX]), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_opposite_large_vector_is_farthest() {
        let opposite = cosine_distance(&[1.0, 0.0], &[-1e20, 0.0]);
        let orthogonal = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert_relative_eq!(opposite, 2.0, epsilon = 1e-6);
        assert!(orthogonal < opposite);
    }

    #[test]
    fn test_tiny_magnitudes_are_not_zero_vectors() {
        assert_relative_eq!(cosine_distance(&[1e-30, 0.0], &[1.0, 0.0]), 0.0, epsilon = 1e-6);
        assert_relative_eq!(cosine_distance(&[1e-30, 0.0], &[0.0, 1e-30]), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_extreme_magnitudes_rank_self_match_first() {
        let exact = [1.0, 1.0];
        let mixed = [1e20, -1e20];
        let opposite = [-1e20, -1e20];
        let candidates: Vec<(usize, &[f32])> =
            vec![(0, &mixed[..]), (1, &opposite[..]), (2, &exact[..])];

        let ranked = rank_by_distance(&[1e20, 1e20], &candidates, usize::MAX);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert!(ranked.iter().all(|r| r.distance.is_finite()));
    }

    #[test]
    fn test_rank_orders_by_distance() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = [0.9, 0.1];
        let candidates: Vec<(usize, &[f32])> = vec![(0, &a[..]), (1, &b[..]), (2, &c[..])];

        let ranked = rank_by_distance(&[1.0, 0.0], &candidates, usize::MAX);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 2, 1]);
        assert_relative_eq!(ranked[0].distance, 0.0, epsilon = 1e-6);
        assert!(ranked[1].distance > 0.0 && ranked[1].distance < ranked[2].distance);
    }

    #[test]
    fn test_ties_keep_storage_order() {
        let v = [1.0, 1.0];
        let zero = [0.0, 0.0];
        let candidates: Vec<(usize, &[f32])> = vec![(3, &zero[..]), (5, &v[..]), (7, &v[..]), (9, &v[..])];

        let ranked = rank_by_distance(&[1.0, 1.0], &candidates, usize::MAX);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![5, 7, 9, 3]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let vectors: Vec<[f32; 3]> = (0..200)
            .map(|i| [i as f32, (i % 7) as f32, 1.0])
            .collect();
        let candidates: Vec<(usize, &[f32])> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.as_slice()))
            .collect();
        let query = [3.0, 2.0, 1.0];

        let sequential = rank_by_distance(&query, &candidates, usize::MAX);
        let parallel = rank_by_distance(&query, &candidates, 1);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_top_k_truncates() {
        let a = [1.0, 0.0];
        let candidates: Vec<(usize, &[f32])> = vec![(0, &a[..]), (1, &a[..]), (2, &a[..])];
        assert_eq!(top_k(&[1.0, 0.0], &candidates, 2, usize::MAX).len(), 2);
        assert_eq!(top_k(&[1.0, 0.0], &candidates, 10, usize::MAX).len(), 3);
        assert!(top_k(&[1.0, 0.0], &[], 10, usize::MAX).is_empty());
    }
}
