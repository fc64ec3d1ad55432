// core/engine/src/math.rs

//! Vector helpers shared by the similarity models and the ranker

/// Cosine similarity between two vectors
///
/// Returns 0.0 for mismatched dimensions, empty input, or a zero-norm side.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        tracing::warn!(
            "cosine_similarity dimension mismatch: a={}, b={}",
            a.len(),
            b.len()
        );
        return 0.0;
    }
    if a.is_empty() {
        return 0.0;
    }
    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Scale a vector to unit length in place; zero vectors are left untouched
pub fn l2_normalize(v: &mut [f64]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        None
    } else {
        Some(v.iter().sum::<f64>() / v.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator), `None` below two values
pub fn sample_std(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let m = mean(v)?;
    let var = v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (v.len() - 1) as f64;
    Some(var.sqrt())
}

/// Standardize to zero mean and unit sample standard deviation
///
/// A zero or undefined deviation divides by 1, so a constant vector maps
/// to all zeros. Equal elements count as constant even when rounding leaves
/// a residual deviation.
pub fn z_normalize(v: &[f64]) -> Vec<f64> {
    let Some(m) = mean(v) else {
        return Vec::new();
    };
    if v.iter().all(|x| *x == v[0]) {
        return vec![0.0; v.len()];
    }
    let sd = match sample_std(v) {
        Some(sd) if sd != 0.0 && sd.is_finite() => sd,
        _ => 1.0,
    };
    v.iter().map(|x| (x - m) / sd).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < EPS);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < EPS);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < EPS);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_z_normalize_non_constant() {
        let normalized = z_normalize(&[1.0, 2.0, 3.0, 10.0]);
        let m = mean(&normalized).unwrap();
        let sd = sample_std(&normalized).unwrap();
        assert!(m.abs() < EPS);
        assert!((sd - 1.0).abs() < EPS);
    }

    #[test]
    fn test_z_normalize_constant_and_degenerate() {
        assert_eq!(z_normalize(&[4.0, 4.0, 4.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(z_normalize(&[7.5]), vec![0.0]);
        assert!(z_normalize(&[]).is_empty());
    }

    #[test]
    fn test_z_normalize_inexact_constant() {
        // 0.1 has no exact binary form; the mean picks up rounding error
        assert_eq!(z_normalize(&[0.1, 0.1, 0.1]), vec![0.0, 0.0, 0.0]);
        assert_eq!(z_normalize(&[1.0 / 3.0; 7]), vec![0.0; 7]);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < EPS);
        assert!((v[1] - 0.8).abs() < EPS);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }
}
