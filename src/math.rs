pub fn arithmetic_mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population standard deviation (ddof = 0), matching the normalization
/// contract for signature z-scores.
pub fn population_stddev(x: &[f64], mean: f64) -> f64 {
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / x.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arithmetic_mean() {
        let x = vec![1., 2., 3.];
        assert_relative_eq!(arithmetic_mean(&x), 2.0);
    }

    #[test]
    fn test_population_stddev() {
        let x = vec![2., 4., 4., 4., 5., 5., 7., 9.];
        let mean = arithmetic_mean(&x);
        assert_relative_eq!(population_stddev(&x, mean), 2.0);
    }

    #[test]
    fn test_population_stddev_constant() {
        let x = vec![3., 3., 3.];
        assert_relative_eq!(population_stddev(&x, 3.0), 0.0);
    }
}
