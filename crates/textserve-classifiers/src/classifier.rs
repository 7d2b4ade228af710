//! Classifier trait and common helpers

use crate::features::Features;
use textserve_core::{Error, Label, Result};

/// Trait for all fitted classifiers
pub trait Classifier: Send + Sync {
    /// Predict one label per feature row
    fn predict(&self, features: &Features) -> Result<Vec<Label>>;

    /// Whether `predict` can consume sparse features directly.
    ///
    /// Callers densify the input when this returns false.
    fn accepts_sparse(&self) -> bool;

    /// Expected width of the feature rows
    fn n_features(&self) -> usize;

    /// Known classes, in model order
    fn classes(&self) -> &[Label];

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Reject feature matrices whose width does not match the fitted model
pub(crate) fn check_n_features(name: &str, expected: usize, features: &Features) -> Result<()> {
    let actual = features.n_features();
    if actual != expected {
        return Err(Error::prediction(format!(
            "X has {actual} features, but {name} is expecting {expected} features as input"
        )));
    }
    Ok(())
}

/// Index of the first maximum score
pub(crate) fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SparseMatrix;

    #[test]
    fn test_argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[3.0]), 0);
        assert_eq!(argmax(&[-2.0, -1.0]), 1);
    }

    #[test]
    fn test_check_n_features() {
        let features = Features::Sparse(SparseMatrix::from_rows(3, vec![vec![]]));
        assert!(check_n_features("model", 3, &features).is_ok());

        let err = check_n_features("model", 5, &features).unwrap_err();
        assert_eq!(
            err.to_string(),
            "prediction failed: X has 3 features, but model is expecting 5 features as input"
        );
    }
}
